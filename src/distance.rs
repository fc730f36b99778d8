//! Distance and obstruction estimation from RSSI.
//!
//! Converts a per-device stream of signal readings into a distance estimate
//! via a log-distance path-loss model, with an SNR-derived correction, a
//! confidence/margin blend, and a wall-count inference from the deficit
//! between the expected free-space signal and the observed one.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::observation::{percent_to_dbm, Band, SignalQuality};
use crate::stats;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for the distance estimator.
#[derive(Debug, Clone)]
pub struct DistanceEstimatorConfig {
    /// Samples retained per MAC for the weighted moving average.
    pub history_capacity: usize,
    /// Samples from the tail of the history that enter the average.
    pub average_window: usize,
    /// Minimum reported distance in meters.
    pub min_distance_m: f64,
    /// Maximum reported distance in meters.
    pub max_distance_m: f64,
    /// Initial noise-floor estimate in dBm.
    pub initial_noise_floor_dbm: f64,
}

impl Default for DistanceEstimatorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 20,
            average_window: 10,
            min_distance_m: 0.5,
            max_distance_m: 100.0,
            initial_noise_floor_dbm: -95.0,
        }
    }
}

// ---------------------------------------------------------------------------
// DistanceEstimate
// ---------------------------------------------------------------------------

/// One distance estimate, recomputed on every observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceEstimate {
    /// Estimated distance in meters.
    pub distance_m: f64,
    /// Estimate confidence, 0-95.
    pub confidence: f64,
    /// Error margin as a percentage of the distance.
    pub margin_percent: f64,
    /// Inferred wall/obstruction count (0-4).
    pub wall_count: u8,
    /// Environment description.
    pub environment: String,
    /// Signal-to-noise ratio in dB.
    pub snr: f64,
    /// Signal quality label.
    pub quality: SignalQuality,
    /// Stability label for the averaging window.
    pub stability: String,
}

impl Default for DistanceEstimate {
    fn default() -> Self {
        Self {
            distance_m: 0.0,
            confidence: 0.0,
            margin_percent: 80.0,
            wall_count: 0,
            environment: "unknown".to_string(),
            snr: 0.0,
            quality: SignalQuality::VeryWeak,
            stability: "unknown".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Path-loss parameters
// ---------------------------------------------------------------------------

fn path_loss_exponent(band: Band) -> f64 {
    match band {
        Band::Band2_4 | Band::Unknown => 2.8,
        Band::Band5 => 3.2,
        Band::Band6 => 3.5,
    }
}

fn reference_rssi(band: Band) -> f64 {
    match band {
        Band::Band2_4 | Band::Unknown => -30.0,
        Band::Band5 => -35.0,
        Band::Band6 => -38.0,
    }
}

/// Transmit power guess in dBm from vendor/SSID keywords.
fn guess_tx_power(vendor: &str, ssid: &str) -> f64 {
    let hint = format!(
        "{} {}",
        vendor.to_ascii_lowercase(),
        ssid.to_ascii_lowercase()
    );
    const TABLE: &[(&str, f64)] = &[
        ("tp-link", 18.0),
        ("tplink", 18.0),
        ("netgear", 20.0),
        ("asus", 22.0),
        ("cisco", 23.0),
        ("aruba", 23.0),
        ("ubiquiti", 24.0),
        ("unifi", 24.0),
        ("apple", 15.0),
        ("airport", 15.0),
        ("iphone", 12.0),
        ("android", 12.0),
    ];
    for (keyword, dbm) in TABLE {
        if hint.contains(keyword) {
            return *dbm;
        }
    }
    20.0
}

// ---------------------------------------------------------------------------
// Wall estimation
// ---------------------------------------------------------------------------

/// Free-space path loss in dB for a distance (m) and frequency (MHz).
pub fn free_space_path_loss(distance_m: f64, frequency_mhz: f64) -> f64 {
    if distance_m <= 0.0 || frequency_mhz <= 0.0 {
        return 0.0;
    }
    20.0 * distance_m.log10() + 20.0 * frequency_mhz.log10() - 27.55
}

/// Infer a wall count from the deficit between the expected free-space
/// signal at the estimated distance and the actual signal.
///
/// 5/6 GHz counts one fewer apparent wall since its baseline attenuation is
/// already higher.
pub fn estimate_walls(distance_m: f64, actual_rssi: f64, tx_power: f64, band: Band) -> u8 {
    let fspl = free_space_path_loss(distance_m, band.frequency_mhz());
    let expected = tx_power - fspl;
    let deficit = expected - actual_rssi;
    let mut walls: u8 = if deficit < 3.0 {
        0
    } else if deficit < 8.0 {
        1
    } else if deficit < 15.0 {
        2
    } else if deficit < 25.0 {
        3
    } else {
        4
    };
    if walls > 0 && band.frequency_mhz() > 5000.0 {
        walls = walls.saturating_sub(1).max(1);
    }
    walls
}

fn environment_label(wall_count: u8, jitter: f64) -> String {
    match wall_count {
        0 if jitter < 3.0 => "open space / line of sight".to_string(),
        0 => "open space, variable signal".to_string(),
        1 => "light obstruction (one wall or floor)".to_string(),
        2 => "interior walls between".to_string(),
        3 => "several walls or a floor between".to_string(),
        _ => "dense obstruction (multiple walls/floors)".to_string(),
    }
}

// ---------------------------------------------------------------------------
// DistanceEstimator
// ---------------------------------------------------------------------------

/// Stateful RSSI-to-distance estimator.
///
/// Keeps a bounded dBm history per MAC for the weighted moving average and a
/// shared EMA noise-floor estimate fed by weak samples.
#[derive(Debug)]
pub struct DistanceEstimator {
    config: DistanceEstimatorConfig,
    histories: HashMap<String, VecDeque<f64>>,
    noise_floor_dbm: f64,
}

impl DistanceEstimator {
    /// Create a new estimator.
    pub fn new(config: DistanceEstimatorConfig) -> Self {
        let noise_floor_dbm = config.initial_noise_floor_dbm;
        Self {
            config,
            histories: HashMap::new(),
            noise_floor_dbm,
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(DistanceEstimatorConfig::default())
    }

    /// The current noise-floor estimate in dBm.
    pub fn noise_floor_dbm(&self) -> f64 {
        self.noise_floor_dbm
    }

    /// Estimate distance for one observation. Appends to the per-MAC history.
    pub fn estimate(
        &mut self,
        mac: &str,
        signal_percent: f64,
        vendor: &str,
        ssid: &str,
        band: Band,
    ) -> DistanceEstimate {
        let dbm = percent_to_dbm(signal_percent);
        self.push_sample(mac, dbm);
        self.update_noise_floor(dbm);

        let window = self.recent_window(mac);
        let adj_rssi = weighted_average(&window);
        let jitter = stats::std_dev(&window);

        let snr = adj_rssi - self.noise_floor_dbm;
        let n = path_loss_exponent(band);
        let reference = reference_rssi(band);
        let tx_power = guess_tx_power(vendor, ssid);

        let raw = 10f64.powf((reference - adj_rssi) / (10.0 * n));
        let base = raw.clamp(self.config.min_distance_m, self.config.max_distance_m);
        let distance = (base * snr_multiplier(snr))
            .clamp(self.config.min_distance_m, self.config.max_distance_m);

        let (stability_factor, stability_label) = stability_from_jitter(jitter);
        let confidence = compute_confidence(stability_factor, snr, band);
        let margin = margin_for_confidence(confidence);
        let wall_count = estimate_walls(distance, adj_rssi, tx_power, band);

        debug!(
            mac,
            distance_m = distance,
            confidence,
            wall_count,
            "distance estimate"
        );

        DistanceEstimate {
            distance_m: distance,
            confidence,
            margin_percent: margin,
            wall_count,
            environment: environment_label(wall_count, jitter),
            snr,
            quality: SignalQuality::from_dbm(adj_rssi),
            stability: stability_label.to_string(),
        }
    }

    /// Drop the history of MACs the caller no longer tracks.
    pub fn forget(&mut self, mac: &str) {
        self.histories.remove(mac);
    }

    /// Full reset.
    pub fn clear(&mut self) {
        self.histories.clear();
        self.noise_floor_dbm = self.config.initial_noise_floor_dbm;
    }

    fn push_sample(&mut self, mac: &str, dbm: f64) {
        let history = self
            .histories
            .entry(mac.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.config.history_capacity));
        if history.len() >= self.config.history_capacity {
            history.pop_front();
        }
        history.push_back(dbm);
    }

    fn recent_window(&self, mac: &str) -> Vec<f64> {
        match self.histories.get(mac) {
            Some(history) => {
                let skip = history.len().saturating_sub(self.config.average_window);
                history.iter().skip(skip).copied().collect()
            }
            None => Vec::new(),
        }
    }

    fn update_noise_floor(&mut self, dbm: f64) {
        // Only weak samples plausibly approach the floor
        if dbm < self.noise_floor_dbm + 20.0 {
            self.noise_floor_dbm = self.noise_floor_dbm * 0.9 + dbm * 0.1;
        }
    }
}

/// Weighted moving average with newer samples weighted higher (1.0 + 0.2*i).
fn weighted_average(window: &[f64]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut weight_sum = 0.0;
    for (i, &v) in window.iter().enumerate() {
        let w = 1.0 + 0.2 * i as f64;
        sum += v * w;
        weight_sum += w;
    }
    sum / weight_sum
}

fn snr_multiplier(snr: f64) -> f64 {
    if snr >= 40.0 {
        0.9
    } else if snr >= 25.0 {
        1.0
    } else if snr >= 15.0 {
        1.1
    } else if snr >= 10.0 {
        1.2
    } else {
        1.3
    }
}

fn stability_from_jitter(jitter: f64) -> (f64, &'static str) {
    if jitter < 2.0 {
        (0.95, "very stable")
    } else if jitter < 4.0 {
        (0.8, "stable")
    } else if jitter < 6.0 {
        (0.6, "variable")
    } else {
        (0.3, "erratic")
    }
}

fn compute_confidence(stability_factor: f64, snr: f64, band: Band) -> f64 {
    let mut confidence = stability_factor * 60.0;
    if snr >= 30.0 {
        confidence += 25.0;
    } else if snr >= 20.0 {
        confidence += 15.0;
    } else if snr >= 10.0 {
        confidence += 5.0;
    }
    confidence += match band {
        Band::Band2_4 | Band::Unknown => 10.0,
        Band::Band5 => 5.0,
        Band::Band6 => 0.0,
    };
    confidence.min(95.0)
}

fn margin_for_confidence(confidence: f64) -> f64 {
    if confidence >= 80.0 {
        25.0
    } else if confidence >= 60.0 {
        40.0
    } else if confidence >= 40.0 {
        60.0
    } else {
        80.0
    }
}
