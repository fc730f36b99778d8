//! Spoof and impersonation detection.
//!
//! Four idempotent checks run per observation: evil-twin (one SSID on too
//! many radios), security downgrade, signal anomaly, and weakly-secured
//! common-target SSIDs. Alerts carry deterministic ids so a repeat finding
//! refreshes the existing alert instead of duplicating it, and dismissal
//! keeps the alert on file as inactive.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::alert::{SpoofAlert, SpoofPattern, ThreatLevel};
use crate::domain::observation::Observation;
use crate::domain::security::{self, SecurityRating};

/// Distinct MACs per SSID before the evil-twin check fires.
const EVIL_TWIN_MIN_MACS: usize = 3;

/// MAC counts above which the evil-twin severity escalates.
const EVIL_TWIN_MEDIUM_MACS: usize = 3;
const EVIL_TWIN_HIGH_MACS: usize = 5;

/// Signal jump (dB) between consecutive samples that flags an anomaly.
const SIGNAL_ANOMALY_DELTA_DB: f64 = 30.0;

/// Per-MAC signal history depth.
const SIGNAL_HISTORY_SIZE: usize = 60;

/// SSIDs that impersonation attacks commonly advertise.
const COMMON_TARGET_SSIDS: [&str; 10] = [
    "free wifi",
    "free_wifi",
    "public wifi",
    "guest",
    "xfinity",
    "xfinitywifi",
    "attwifi",
    "linksys",
    "default",
    "setup",
];

/// Stateful spoof detector. Feed every observation through [`SpoofDetector::inspect`].
pub struct SpoofDetector {
    // SSID -> set of MACs seen broadcasting it
    ssid_macs: HashMap<String, HashSet<String>>,
    // SSID -> MAC -> latest security descriptor
    ssid_security: HashMap<String, HashMap<String, String>>,
    // MAC -> recent signal samples (dBm)
    signal_history: HashMap<String, VecDeque<f64>>,
    alerts: HashMap<String, SpoofAlert>,
}

impl SpoofDetector {
    /// Create an empty detector.
    pub fn new() -> Self {
        Self {
            ssid_macs: HashMap::new(),
            ssid_security: HashMap::new(),
            signal_history: HashMap::new(),
            alerts: HashMap::new(),
        }
    }

    /// Run all checks against one observation.
    pub fn inspect(&mut self, obs: &Observation, now: DateTime<Utc>) {
        let signal_dbm = obs.signal_dbm();
        self.check_signal_anomaly(obs, signal_dbm, now);

        self.signal_history
            .entry(obs.mac.clone())
            .or_insert_with(|| VecDeque::with_capacity(SIGNAL_HISTORY_SIZE))
            .push_back(signal_dbm);
        if let Some(history) = self.signal_history.get_mut(&obs.mac) {
            while history.len() > SIGNAL_HISTORY_SIZE {
                history.pop_front();
            }
        }

        if obs.is_hidden() {
            return;
        }

        self.ssid_macs
            .entry(obs.ssid.clone())
            .or_default()
            .insert(obs.mac.clone());
        self.ssid_security
            .entry(obs.ssid.clone())
            .or_default()
            .insert(obs.mac.clone(), obs.security.clone());

        self.check_evil_twin(obs, now);
        self.check_security_downgrade(obs, now);
        self.check_common_target(obs, now);
    }

    /// Active alerts, newest first.
    pub fn active_alerts(&self) -> Vec<&SpoofAlert> {
        let mut alerts: Vec<&SpoofAlert> =
            self.alerts.values().filter(|a| a.is_active).collect();
        alerts.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        alerts
    }

    /// All alerts on file, dismissed included.
    pub fn alerts(&self) -> impl Iterator<Item = &SpoofAlert> {
        self.alerts.values()
    }

    /// Mark an alert inactive. Returns false when the id is unknown.
    pub fn dismiss(&mut self, alert_id: &str) -> bool {
        match self.alerts.get_mut(alert_id) {
            Some(alert) => {
                alert.dismiss();
                info!(alert_id, "spoof alert dismissed");
                true
            }
            None => false,
        }
    }

    /// Full reset, alerts included.
    pub fn clear(&mut self) {
        self.ssid_macs.clear();
        self.ssid_security.clear();
        self.signal_history.clear();
        self.alerts.clear();
    }

    // -- checks ------------------------------------------------------------

    fn check_evil_twin(&mut self, obs: &Observation, now: DateTime<Utc>) {
        let Some(macs) = self.ssid_macs.get(&obs.ssid) else {
            return;
        };
        if macs.len() < EVIL_TWIN_MIN_MACS {
            return;
        }

        let securities: HashSet<&str> = self
            .ssid_security
            .get(&obs.ssid)
            .map(|by_mac| by_mac.values().map(String::as_str).collect())
            .unwrap_or_default();
        let divergent_security = securities.len() > 1;

        // An unprotected SSID duplicated across radios is a softer target,
        // so the floor severity rises with weak security
        let weak = security::is_weak(&obs.security);
        let threat_level = if divergent_security || macs.len() > EVIL_TWIN_HIGH_MACS {
            ThreatLevel::High
        } else if macs.len() > EVIL_TWIN_MEDIUM_MACS || weak {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        };

        let mut mac_list: Vec<String> = macs.iter().cloned().collect();
        mac_list.sort();
        let evidence = if divergent_security {
            format!(
                "{} radios broadcast '{}' with {} different security configurations",
                mac_list.len(),
                obs.ssid,
                securities.len()
            )
        } else {
            format!("{} radios broadcast '{}'", mac_list.len(), obs.ssid)
        };

        let id = format!("evil_twin_{}", obs.ssid);
        self.raise(
            id,
            SpoofPattern::EvilTwin,
            threat_level,
            &obs.ssid,
            mac_list,
            evidence,
            now,
        );
    }

    fn check_security_downgrade(&mut self, obs: &Observation, now: DateTime<Utc>) {
        let Some(by_mac) = self.ssid_security.get(&obs.ssid) else {
            return;
        };
        if by_mac.len() < 2 {
            return;
        }

        // Majority security variant for this SSID
        let mut variant_counts: HashMap<&str, usize> = HashMap::new();
        for sec in by_mac.values() {
            *variant_counts.entry(sec.as_str()).or_default() += 1;
        }
        let Some((majority, _)) = variant_counts
            .iter()
            .max_by_key(|(variant, count)| (**count, std::cmp::Reverse(*variant)))
            .map(|(variant, count)| (*variant, *count))
        else {
            return;
        };

        let own_strength = security::security_strength(&obs.security);
        let majority_strength = security::security_strength(majority);
        let own_variant_count = variant_counts.get(obs.security.as_str()).copied().unwrap_or(0);

        if own_strength < majority_strength && own_variant_count < EVIL_TWIN_MIN_MACS {
            let threat_level = if SecurityRating::from_descriptor(&obs.security)
                <= SecurityRating::Weak
            {
                ThreatLevel::High
            } else {
                ThreatLevel::Medium
            };
            let id = format!("downgrade_{}_{}", obs.ssid, obs.mac);
            let evidence = format!(
                "'{}' normally advertises {} but {} offers {}",
                obs.ssid, majority, obs.mac, obs.security
            );
            warn!(ssid = %obs.ssid, mac = %obs.mac, "security downgrade detected");
            self.raise(
                id,
                SpoofPattern::SecurityDowngrade,
                threat_level,
                &obs.ssid,
                vec![obs.mac.clone()],
                evidence,
                now,
            );
        }
    }

    fn check_signal_anomaly(&mut self, obs: &Observation, signal_dbm: f64, now: DateTime<Utc>) {
        let Some(previous) = self
            .signal_history
            .get(&obs.mac)
            .and_then(|h| h.back())
            .copied()
        else {
            return;
        };
        let delta = (signal_dbm - previous).abs();
        if delta <= SIGNAL_ANOMALY_DELTA_DB {
            return;
        }

        let id = format!("anomaly_{}_{}", obs.mac, obs.timestamp.timestamp());
        let evidence = format!(
            "{} jumped {:.0} dB between consecutive samples ({:.0} -> {:.0} dBm)",
            obs.mac, delta, previous, signal_dbm
        );
        self.raise(
            id,
            SpoofPattern::SignalAnomaly,
            ThreatLevel::Medium,
            &obs.ssid,
            vec![obs.mac.clone()],
            evidence,
            now,
        );
    }

    fn check_common_target(&mut self, obs: &Observation, now: DateTime<Utc>) {
        let lowered = obs.ssid.to_ascii_lowercase();
        let matched = COMMON_TARGET_SSIDS
            .iter()
            .any(|target| lowered.contains(target));
        if !matched {
            return;
        }
        // Only weakly secured or open impostors are worth an alert
        let open = security::is_open(&obs.security);
        if !open && !security::is_weak(&obs.security) {
            return;
        }

        let threat_level = if open {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        };
        let id = format!("target_{}_{}", obs.ssid, obs.mac);
        let evidence = format!(
            "'{}' matches a commonly impersonated SSID and offers {} security",
            obs.ssid,
            if open { "no" } else { "weak" }
        );
        self.raise(
            id,
            SpoofPattern::CommonTargetSsid,
            threat_level,
            &obs.ssid,
            vec![obs.mac.clone()],
            evidence,
            now,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn raise(
        &mut self,
        id: String,
        pattern: SpoofPattern,
        threat_level: ThreatLevel,
        ssid: &str,
        macs: Vec<String>,
        evidence: String,
        now: DateTime<Utc>,
    ) {
        match self.alerts.get_mut(&id) {
            Some(existing) if existing.is_active => {
                existing.refresh(threat_level, macs, vec![evidence], now);
            }
            Some(_) => {
                // Dismissed alerts stay dismissed
            }
            None => {
                warn!(
                    alert_id = %id,
                    pattern = ?pattern,
                    level = ?threat_level,
                    "spoof alert raised"
                );
                self.alerts.insert(
                    id.clone(),
                    SpoofAlert::new(
                        id,
                        pattern,
                        threat_level,
                        ssid.to_string(),
                        macs,
                        vec![evidence],
                        now,
                    ),
                );
            }
        }
    }
}

impl Default for SpoofDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(mac: &str, ssid: &str, signal: f64, channel: u16, security: &str) -> Observation {
        Observation {
            mac: mac.to_string(),
            ssid: ssid.to_string(),
            signal_percent: signal,
            channel,
            security: security.to_string(),
            vendor: String::new(),
            band: String::new(),
            timestamp: Utc::now(),
        }
    }

    fn inspect(d: &mut SpoofDetector, o: &Observation) {
        d.inspect(o, Utc::now());
    }

    #[test]
    fn two_macs_never_fire_evil_twin() {
        let mut d = SpoofDetector::new();
        inspect(&mut d, &obs("AA:00:00:00:00:01", "HomeNet", 70.0, 6, "WPA2"));
        inspect(&mut d, &obs("AA:00:00:00:00:02", "HomeNet", 68.0, 6, "WPA2"));
        assert!(d.active_alerts().is_empty());
    }

    #[test]
    fn three_macs_fire_evil_twin() {
        let mut d = SpoofDetector::new();
        inspect(&mut d, &obs("AA:00:00:00:00:01", "HomeNet", 70.0, 6, "WPA2"));
        inspect(&mut d, &obs("BB:00:00:00:00:02", "HomeNet", 68.0, 6, "WPA2"));
        inspect(&mut d, &obs("CC:00:00:00:00:03", "HomeNet", 66.0, 11, "WPA2"));
        let alerts = d.active_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].pattern, SpoofPattern::EvilTwin);
        assert_eq!(alerts[0].threat_level, ThreatLevel::Low);
        assert_eq!(alerts[0].macs.len(), 3);
    }

    #[test]
    fn divergent_security_escalates_to_high() {
        let mut d = SpoofDetector::new();
        inspect(&mut d, &obs("AA:00:00:00:00:01", "HomeNet", 70.0, 6, "WPA2"));
        inspect(&mut d, &obs("BB:00:00:00:00:02", "HomeNet", 68.0, 6, "WPA2"));
        inspect(&mut d, &obs("CC:00:00:00:00:03", "HomeNet", 66.0, 11, "Open"));
        let alerts = d.active_alerts();
        let twin = alerts
            .iter()
            .find(|a| a.pattern == SpoofPattern::EvilTwin)
            .unwrap();
        assert_eq!(twin.threat_level, ThreatLevel::High);
    }

    #[test]
    fn repeat_finding_refreshes_instead_of_duplicating() {
        let mut d = SpoofDetector::new();
        for _ in 0..3 {
            inspect(&mut d, &obs("AA:00:00:00:00:01", "HomeNet", 70.0, 6, "WPA2"));
            inspect(&mut d, &obs("BB:00:00:00:00:02", "HomeNet", 68.0, 6, "WPA2"));
            inspect(&mut d, &obs("CC:00:00:00:00:03", "HomeNet", 66.0, 11, "WPA2"));
        }
        assert_eq!(d.active_alerts().len(), 1);
    }

    #[test]
    fn downgrade_flags_minority_weak_radio() {
        let mut d = SpoofDetector::new();
        inspect(&mut d, &obs("AA:00:00:00:00:01", "Office", 70.0, 6, "WPA3"));
        inspect(&mut d, &obs("BB:00:00:00:00:02", "Office", 68.0, 11, "WPA3"));
        inspect(&mut d, &obs("CC:00:00:00:00:03", "Office", 66.0, 1, "Open"));
        let alerts = d.active_alerts();
        let downgrade = alerts
            .iter()
            .find(|a| a.pattern == SpoofPattern::SecurityDowngrade)
            .unwrap();
        assert_eq!(downgrade.threat_level, ThreatLevel::High);
        assert_eq!(downgrade.macs, vec!["CC:00:00:00:00:03".to_string()]);
    }

    #[test]
    fn signal_jump_over_30_db_flags_anomaly() {
        let mut d = SpoofDetector::new();
        // 20% ~ -78 dBm, 90% ~ -36 dBm: a 42 dB jump
        inspect(&mut d, &obs("AA:00:00:00:00:01", "HomeNet", 20.0, 6, "WPA2"));
        inspect(&mut d, &obs("AA:00:00:00:00:01", "HomeNet", 90.0, 6, "WPA2"));
        let alerts = d.active_alerts();
        assert!(alerts
            .iter()
            .any(|a| a.pattern == SpoofPattern::SignalAnomaly));
    }

    #[test]
    fn small_signal_drift_is_quiet() {
        let mut d = SpoofDetector::new();
        inspect(&mut d, &obs("AA:00:00:00:00:01", "HomeNet", 70.0, 6, "WPA2"));
        inspect(&mut d, &obs("AA:00:00:00:00:01", "HomeNet", 60.0, 6, "WPA2"));
        assert!(d.active_alerts().is_empty());
    }

    #[test]
    fn open_common_target_ssid_is_medium() {
        let mut d = SpoofDetector::new();
        inspect(
            &mut d,
            &obs("AA:00:00:00:00:01", "Free WiFi Hotspot", 70.0, 6, "Open"),
        );
        let alerts = d.active_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].pattern, SpoofPattern::CommonTargetSsid);
        assert_eq!(alerts[0].threat_level, ThreatLevel::Medium);
    }

    #[test]
    fn secured_common_target_ssid_is_quiet() {
        let mut d = SpoofDetector::new();
        inspect(
            &mut d,
            &obs("AA:00:00:00:00:01", "xfinitywifi", 70.0, 6, "WPA3"),
        );
        assert!(d.active_alerts().is_empty());
    }

    #[test]
    fn dismissed_alert_stays_dismissed() {
        let mut d = SpoofDetector::new();
        inspect(
            &mut d,
            &obs("AA:00:00:00:00:01", "Free WiFi", 70.0, 6, "Open"),
        );
        let id = d.active_alerts()[0].id.clone();
        assert!(d.dismiss(&id));
        assert!(d.active_alerts().is_empty());
        // A repeat finding must not resurrect it
        inspect(
            &mut d,
            &obs("AA:00:00:00:00:01", "Free WiFi", 70.0, 6, "Open"),
        );
        assert!(d.active_alerts().is_empty());
        assert!(!d.dismiss("no_such_alert"));
    }

    #[test]
    fn clear_drops_everything() {
        let mut d = SpoofDetector::new();
        inspect(
            &mut d,
            &obs("AA:00:00:00:00:01", "Free WiFi", 70.0, 6, "Open"),
        );
        d.clear();
        assert_eq!(d.alerts().count(), 0);
        assert!(d.active_alerts().is_empty());
    }
}
