//! Spoofing/threat alerts.
//!
//! Alerts are identified by deterministic ids derived from the pattern
//! instance, so re-detection updates the existing alert instead of raising a
//! duplicate. Alerts can be dismissed (deactivated) but never hard-deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Threat level of a spoofing alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThreatLevel {
    /// Informational, low likelihood of attack.
    Low,
    /// Pattern worth watching.
    Medium,
    /// Strong indication of an active impersonation attempt.
    High,
    /// Multiple corroborating indicators.
    Critical,
}

impl ThreatLevel {
    /// Numeric severity (1 = lowest, 4 = highest).
    pub fn value(self) -> u8 {
        match self {
            ThreatLevel::Low => 1,
            ThreatLevel::Medium => 2,
            ThreatLevel::High => 3,
            ThreatLevel::Critical => 4,
        }
    }

    /// Display color for presentation layers.
    pub fn color(self) -> &'static str {
        match self {
            ThreatLevel::Low => "yellow",
            ThreatLevel::Medium => "orange",
            ThreatLevel::High => "red",
            ThreatLevel::Critical => "magenta",
        }
    }
}

/// The detection pattern that produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpoofPattern {
    /// One SSID broadcast by more distinct MACs than expected.
    EvilTwin,
    /// A minority of sightings with weaker security than the SSID's majority.
    SecurityDowngrade,
    /// A single-sample signal jump beyond the anomaly threshold.
    SignalAnomaly,
    /// SSID matches a list of frequently-impersonated names.
    CommonTargetSsid,
}

impl SpoofPattern {
    /// Stable identifier fragment used in alert ids.
    pub fn id_fragment(self) -> &'static str {
        match self {
            SpoofPattern::EvilTwin => "evil_twin",
            SpoofPattern::SecurityDowngrade => "downgrade",
            SpoofPattern::SignalAnomaly => "anomaly",
            SpoofPattern::CommonTargetSsid => "target",
        }
    }
}

/// A spoofing/threat alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoofAlert {
    /// Deterministic id for this pattern instance.
    pub id: String,
    /// Which detector raised the alert.
    pub pattern: SpoofPattern,
    /// Severity.
    pub threat_level: ThreatLevel,
    /// The SSID involved (may be empty for per-MAC patterns).
    pub ssid: String,
    /// MACs implicated in the pattern.
    pub macs: Vec<String>,
    /// Human-readable evidence strings.
    pub evidence: Vec<String>,
    /// Whether the alert is still active (false once dismissed).
    pub is_active: bool,
    /// When the pattern was first detected.
    pub created_at: DateTime<Utc>,
    /// When the pattern was last re-detected.
    pub last_updated: DateTime<Utc>,
}

impl SpoofAlert {
    /// Create a new active alert.
    pub fn new(
        id: String,
        pattern: SpoofPattern,
        threat_level: ThreatLevel,
        ssid: String,
        macs: Vec<String>,
        evidence: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            pattern,
            threat_level,
            ssid,
            macs,
            evidence,
            is_active: true,
            created_at: now,
            last_updated: now,
        }
    }

    /// Record a re-detection: refresh involved MACs, severity and evidence.
    pub fn refresh(
        &mut self,
        threat_level: ThreatLevel,
        macs: Vec<String>,
        evidence: Vec<String>,
        now: DateTime<Utc>,
    ) {
        self.threat_level = threat_level;
        self.macs = macs;
        self.evidence = evidence;
        self.last_updated = now;
    }

    /// Deactivate the alert. It stays in the store for audit.
    pub fn dismiss(&mut self) {
        self.is_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threat_level_ordering() {
        assert!(ThreatLevel::Critical > ThreatLevel::High);
        assert!(ThreatLevel::High > ThreatLevel::Medium);
        assert_eq!(ThreatLevel::Low.value(), 1);
        assert_eq!(ThreatLevel::Critical.value(), 4);
    }

    #[test]
    fn refresh_updates_without_touching_created_at() {
        let t0 = Utc::now();
        let mut alert = SpoofAlert::new(
            "evil_twin_CoffeeShop".into(),
            SpoofPattern::EvilTwin,
            ThreatLevel::Low,
            "CoffeeShop".into(),
            vec!["AA:BB:CC:00:00:01".into()],
            vec!["2 MACs".into()],
            t0,
        );
        let t1 = t0 + chrono::Duration::seconds(10);
        alert.refresh(
            ThreatLevel::High,
            vec!["AA:BB:CC:00:00:01".into(), "AA:BB:CC:00:00:02".into()],
            vec!["4 MACs".into()],
            t1,
        );
        assert_eq!(alert.created_at, t0);
        assert_eq!(alert.last_updated, t1);
        assert_eq!(alert.threat_level, ThreatLevel::High);
        assert_eq!(alert.macs.len(), 2);
        assert!(alert.is_active);
    }

    #[test]
    fn dismiss_deactivates() {
        let mut alert = SpoofAlert::new(
            "target_FreeWifi_AA".into(),
            SpoofPattern::CommonTargetSsid,
            ThreatLevel::Medium,
            "Free WiFi".into(),
            vec![],
            vec![],
            Utc::now(),
        );
        alert.dismiss();
        assert!(!alert.is_active);
    }
}
