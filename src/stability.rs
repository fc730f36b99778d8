//! Per-device signal stability tracking.
//!
//! Each tracked MAC keeps a bounded ring buffer of recent readings. Every
//! sample recomputes jitter (stdev), a rating with score, a short-window
//! trend, and an anomaly flag.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats;

/// Ring buffer capacity per MAC.
pub const HISTORY_SIZE: usize = 60;

/// Samples required before a non-default rating is reported.
pub const MIN_SAMPLES_FOR_RATING: usize = 5;

/// Single-sample delta (dB) that flags an anomaly.
const ANOMALY_DELTA_DB: f64 = 25.0;

/// Distinct MACs sharing one SSID beyond which an anomaly is flagged.
const SHARED_SSID_LIMIT: usize = 3;

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

/// Stability rating derived from jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityRating {
    /// Jitter at or below 1 dB.
    RockSolid,
    /// Jitter at or below 3 dB.
    Stable,
    /// Jitter at or below 6 dB.
    Moderate,
    /// Jitter at or below 10 dB.
    Unstable,
    /// Anything worse.
    Erratic,
    /// Not enough samples yet.
    Unrated,
}

impl StabilityRating {
    fn from_jitter(jitter: f64) -> (Self, f64) {
        if jitter <= 1.0 {
            (StabilityRating::RockSolid, 95.0)
        } else if jitter <= 3.0 {
            (StabilityRating::Stable, 80.0)
        } else if jitter <= 6.0 {
            (StabilityRating::Moderate, 60.0)
        } else if jitter <= 10.0 {
            (StabilityRating::Unstable, 35.0)
        } else {
            (StabilityRating::Erratic, 15.0)
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            StabilityRating::RockSolid => "rock solid",
            StabilityRating::Stable => "stable",
            StabilityRating::Moderate => "moderate",
            StabilityRating::Unstable => "unstable",
            StabilityRating::Erratic => "erratic",
            StabilityRating::Unrated => "unrated",
        }
    }
}

/// Short-window signal trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalTrend {
    /// Mean of the newer half is more than 3 dB above the older half.
    Improving,
    /// Mean of the newer half is more than 3 dB below the older half.
    Declining,
    /// High jitter masks any direction.
    Fluctuating,
    /// No material change.
    Steady,
    /// Not enough samples.
    Unknown,
}

/// Stability metrics for one device at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityMetrics {
    /// Standard deviation of the buffered readings (dB).
    pub jitter: f64,
    /// Rating bucket.
    pub rating: StabilityRating,
    /// Stability score, 0-100.
    pub score: f64,
    /// Short-window trend.
    pub trend: SignalTrend,
    /// Jitter relative to the mean, as a percentage.
    pub volatility_percent: f64,
    /// min/max spread of the buffer (dB).
    pub range: f64,
    /// Anomaly description, if one was detected on this sample.
    pub anomaly: Option<String>,
    /// Number of buffered samples.
    pub sample_count: usize,
}

impl Default for StabilityMetrics {
    fn default() -> Self {
        Self {
            jitter: 0.0,
            rating: StabilityRating::Unrated,
            score: 50.0,
            trend: SignalTrend::Unknown,
            volatility_percent: 0.0,
            range: 0.0,
            anomaly: None,
            sample_count: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// StabilityTracker
// ---------------------------------------------------------------------------

/// Tracks signal stability per MAC.
#[derive(Debug, Default)]
pub struct StabilityTracker {
    histories: HashMap<String, VecDeque<(DateTime<Utc>, f64)>>,
    ssid_members: HashMap<String, HashSet<String>>,
    last_metrics: HashMap<String, StabilityMetrics>,
}

impl StabilityTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reading and recompute metrics for the MAC.
    pub fn record(
        &mut self,
        mac: &str,
        ssid: &str,
        signal_dbm: f64,
        timestamp: DateTime<Utc>,
    ) -> StabilityMetrics {
        let history = self
            .histories
            .entry(mac.to_string())
            .or_insert_with(|| VecDeque::with_capacity(HISTORY_SIZE));
        if history.len() >= HISTORY_SIZE {
            history.pop_front();
        }
        history.push_back((timestamp, signal_dbm));

        if !ssid.trim().is_empty() {
            self.ssid_members
                .entry(ssid.to_string())
                .or_default()
                .insert(mac.to_string());
        }

        let metrics = self.compute(mac, ssid);
        self.last_metrics.insert(mac.to_string(), metrics.clone());
        metrics
    }

    /// Most recent metrics for a MAC, if any.
    pub fn metrics(&self, mac: &str) -> Option<&StabilityMetrics> {
        self.last_metrics.get(mac)
    }

    /// The stability score for a MAC, 50.0 when untracked.
    pub fn score(&self, mac: &str) -> f64 {
        self.last_metrics.get(mac).map(|m| m.score).unwrap_or(50.0)
    }

    /// Drop one MAC's state.
    pub fn forget(&mut self, mac: &str) {
        self.histories.remove(mac);
        self.last_metrics.remove(mac);
        for members in self.ssid_members.values_mut() {
            members.remove(mac);
        }
    }

    /// Full reset.
    pub fn clear(&mut self) {
        self.histories.clear();
        self.ssid_members.clear();
        self.last_metrics.clear();
    }

    fn compute(&self, mac: &str, ssid: &str) -> StabilityMetrics {
        let values: Vec<f64> = match self.histories.get(mac) {
            Some(history) => history.iter().map(|(_, v)| *v).collect(),
            None => return StabilityMetrics::default(),
        };

        if values.len() < MIN_SAMPLES_FOR_RATING {
            return StabilityMetrics {
                sample_count: values.len(),
                ..StabilityMetrics::default()
            };
        }

        let jitter = stats::std_dev(&values);
        let mean = stats::mean(&values);
        let range = stats::range(&values);

        let (rating, mut score) = StabilityRating::from_jitter(jitter);
        if range > 20.0 {
            score -= 15.0;
        } else if range > 10.0 {
            score -= 5.0;
        }
        score = score.max(10.0);

        let volatility = if mean.abs() > f64::EPSILON {
            (jitter / mean.abs()) * 100.0
        } else {
            0.0
        };

        let trend = trend_of(&values, jitter);
        let anomaly = self.detect_anomaly(&values, ssid);

        StabilityMetrics {
            jitter,
            rating,
            score,
            trend,
            volatility_percent: volatility,
            range,
            anomaly,
            sample_count: values.len(),
        }
    }

    fn detect_anomaly(&self, values: &[f64], ssid: &str) -> Option<String> {
        if values.len() >= 2 {
            let delta = (values[values.len() - 1] - values[values.len() - 2]).abs();
            if delta > ANOMALY_DELTA_DB {
                return Some(format!("signal jumped {delta:.0} dB in one sample"));
            }
        }
        if !ssid.trim().is_empty() {
            if let Some(members) = self.ssid_members.get(ssid) {
                if members.len() > SHARED_SSID_LIMIT {
                    return Some(format!(
                        "{} distinct MACs broadcast SSID '{ssid}'",
                        members.len()
                    ));
                }
            }
        }
        None
    }
}

fn trend_of(values: &[f64], jitter: f64) -> SignalTrend {
    let skip = values.len().saturating_sub(10);
    let window = &values[skip..];
    if window.len() < 4 {
        return SignalTrend::Unknown;
    }
    let mid = window.len() / 2;
    let older = stats::mean(&window[..mid]);
    let newer = stats::mean(&window[mid..]);
    let diff = newer - older;
    if diff > 3.0 {
        SignalTrend::Improving
    } else if diff < -3.0 {
        SignalTrend::Declining
    } else if jitter > 10.0 {
        SignalTrend::Fluctuating
    } else {
        SignalTrend::Steady
    }
}
