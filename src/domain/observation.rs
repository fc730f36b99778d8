//! Observation input records and signal-strength conversion.
//!
//! An `Observation` is one sighting of one access point in one scan cycle,
//! handed to the engine by the capture layer. It is ephemeral: the engine
//! summarizes it into longer-lived records and never stores it verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// dBm value corresponding to 0% signal.
pub const SIGNAL_FLOOR_DBM: f64 = -90.0;

/// dBm value corresponding to 100% signal.
pub const SIGNAL_CEILING_DBM: f64 = -30.0;

// ---------------------------------------------------------------------------
// Band
// ---------------------------------------------------------------------------

/// WiFi frequency band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// 2.4 GHz (channels 1-14).
    Band2_4,
    /// 5 GHz (channels 36-177).
    Band5,
    /// 6 GHz (only reported via an explicit band hint from the capture layer).
    Band6,
    /// Band could not be determined.
    Unknown,
}

impl Band {
    /// Infer the band from an 802.11 channel number.
    pub fn from_channel(channel: u16) -> Self {
        match channel {
            1..=14 => Band::Band2_4,
            15..=177 => Band::Band5,
            _ => Band::Unknown,
        }
    }

    /// Parse a free-form band hint from the capture layer ("2.4", "5GHz", ...).
    pub fn from_hint(hint: &str) -> Self {
        let h = hint.to_ascii_lowercase();
        if h.contains("6g") || h.starts_with('6') {
            Band::Band6
        } else if h.contains("5g") || h.starts_with('5') {
            Band::Band5
        } else if h.contains("2.4") || h.starts_with('2') {
            Band::Band2_4
        } else {
            Band::Unknown
        }
    }

    /// Approximate carrier frequency in MHz, used by free-space path loss.
    pub fn frequency_mhz(self) -> f64 {
        match self {
            Band::Band2_4 => 2437.0,
            Band::Band5 => 5500.0,
            Band::Band6 => 6500.0,
            Band::Unknown => 2437.0,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Band::Band2_4 => "2.4GHz",
            Band::Band5 => "5GHz",
            Band::Band6 => "6GHz",
            Band::Unknown => "unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Signal conversion
// ---------------------------------------------------------------------------

/// Convert a signal percentage (0-100) to dBm.
///
/// Linear map between [`SIGNAL_FLOOR_DBM`] (0%) and [`SIGNAL_CEILING_DBM`]
/// (100%), clamped at both ends.
pub fn percent_to_dbm(percent: f64) -> f64 {
    let p = percent.clamp(0.0, 100.0);
    SIGNAL_FLOOR_DBM + (p / 100.0) * (SIGNAL_CEILING_DBM - SIGNAL_FLOOR_DBM)
}

/// Convert a dBm reading to a signal percentage (0-100), clamped.
pub fn dbm_to_percent(dbm: f64) -> f64 {
    let span = SIGNAL_CEILING_DBM - SIGNAL_FLOOR_DBM;
    (((dbm - SIGNAL_FLOOR_DBM) / span) * 100.0).clamp(0.0, 100.0)
}

/// Coarse signal quality label derived from dBm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalQuality {
    /// -30 dBm or better.
    Excellent,
    /// -50 dBm or better.
    VeryGood,
    /// -60 dBm or better.
    Good,
    /// -70 dBm or better.
    Fair,
    /// -80 dBm or better.
    Weak,
    /// Below -80 dBm.
    VeryWeak,
}

impl SignalQuality {
    /// Classify a dBm reading.
    pub fn from_dbm(dbm: f64) -> Self {
        if dbm >= -30.0 {
            SignalQuality::Excellent
        } else if dbm >= -50.0 {
            SignalQuality::VeryGood
        } else if dbm >= -60.0 {
            SignalQuality::Good
        } else if dbm >= -70.0 {
            SignalQuality::Fair
        } else if dbm >= -80.0 {
            SignalQuality::Weak
        } else {
            SignalQuality::VeryWeak
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            SignalQuality::Excellent => "excellent",
            SignalQuality::VeryGood => "very good",
            SignalQuality::Good => "good",
            SignalQuality::Fair => "fair",
            SignalQuality::Weak => "weak",
            SignalQuality::VeryWeak => "very weak",
        }
    }
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// One sighting of one access point, supplied by the capture layer.
///
/// Fields arrive pre-validated syntactically (MAC format, channel range,
/// RSSI bounds). Missing vendor/ssid/band degrade to neutral defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Hardware address of the access point (uppercase, colon-separated).
    pub mac: String,
    /// Broadcast network name. Empty means hidden.
    pub ssid: String,
    /// Signal strength as a percentage (0-100).
    pub signal_percent: f64,
    /// 802.11 channel number.
    pub channel: u16,
    /// Security descriptor string as reported ("WPA2-Personal", "Open", ...).
    pub security: String,
    /// Vendor string if the capture layer resolved one, else empty.
    pub vendor: String,
    /// Band hint from the capture layer, else empty.
    pub band: String,
    /// When the sighting was made.
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    /// Signal strength in dBm.
    pub fn signal_dbm(&self) -> f64 {
        percent_to_dbm(self.signal_percent)
    }

    /// The frequency band, preferring the explicit hint over the channel.
    pub fn resolved_band(&self) -> Band {
        let hinted = Band::from_hint(&self.band);
        if hinted != Band::Unknown {
            hinted
        } else {
            Band::from_channel(self.channel)
        }
    }

    /// Whether this device broadcasts no SSID.
    pub fn is_hidden(&self) -> bool {
        self.ssid.trim().is_empty()
    }

    /// The OUI prefix of the MAC (first three octets), uppercase.
    pub fn oui(&self) -> String {
        oui_prefix(&self.mac)
    }
}

/// Extract the uppercase OUI prefix (first three octets) from a MAC string.
pub fn oui_prefix(mac: &str) -> String {
    let normalized = mac.to_ascii_uppercase().replace('-', ":");
    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() >= 3 {
        format!("{}:{}:{}", parts[0], parts[1], parts[2])
    } else {
        normalized.chars().take(8).collect()
    }
}
