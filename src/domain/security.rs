//! Security descriptor parsing and rating.

use serde::{Deserialize, Serialize};

/// Five-level security rating derived from the reported security string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecurityRating {
    /// Open or WEP.
    Critical,
    /// WPA (TKIP era).
    Weak,
    /// WPA2-Personal.
    Moderate,
    /// WPA2-Enterprise.
    Good,
    /// WPA3.
    Excellent,
}

impl SecurityRating {
    /// Classify a free-form security string as reported by the capture layer.
    pub fn from_descriptor(security: &str) -> Self {
        let s = security.to_ascii_lowercase();
        if s.contains("wpa3") {
            SecurityRating::Excellent
        } else if s.contains("wpa2") && (s.contains("enterprise") || s.contains("802.1x")) {
            SecurityRating::Good
        } else if s.contains("wpa2") {
            SecurityRating::Moderate
        } else if s.contains("wpa") {
            SecurityRating::Weak
        } else {
            // WEP, open, or unreported
            SecurityRating::Critical
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            SecurityRating::Excellent => "excellent",
            SecurityRating::Good => "good",
            SecurityRating::Moderate => "moderate",
            SecurityRating::Weak => "weak",
            SecurityRating::Critical => "critical",
        }
    }
}

/// Numeric strength ranking used by the downgrade detector.
///
/// WPA3 > WPA2-Enterprise > WPA2 > WPA > WEP > open. Unrecognized
/// non-empty strings rank between WEP and WPA.
pub fn security_strength(security: &str) -> u8 {
    let s = security.to_ascii_lowercase();
    if s.contains("wpa3") {
        100
    } else if s.contains("wpa2") && (s.contains("enterprise") || s.contains("802.1x")) {
        90
    } else if s.contains("wpa2") {
        70
    } else if s.contains("wpa") {
        50
    } else if s.contains("wep") {
        20
    } else if is_open(&s) {
        0
    } else {
        30
    }
}

/// Whether a security string describes an open (unencrypted) network.
pub fn is_open(security: &str) -> bool {
    let s = security.trim().to_ascii_lowercase();
    s.is_empty() || s == "open" || s == "none" || s.contains("unsecured")
}

/// Whether a security string is weak enough to matter for impersonation
/// checks (open, WEP, or first-generation WPA).
pub fn is_weak(security: &str) -> bool {
    security_strength(security) <= 50
}
