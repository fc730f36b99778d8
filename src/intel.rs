//! Passive intelligence aggregation.
//!
//! One `NetworkIntelligence` record per MAC, fused from the fingerprinter,
//! distance estimator and stability tracker on every sighting. The three
//! dependencies are mandatory trait objects chosen at construction; neutral
//! implementations exist for callers that want to disable a stage.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::{DistanceEstimate, DistanceEstimator};
use crate::domain::observation::{Band, Observation};
use crate::domain::security::{self, SecurityRating};
use crate::domain::vendor::{VendorInfo, VendorLookup};
use crate::fingerprint::{DeviceCategory, DeviceFingerprinter, Fingerprint};
use crate::stability::{StabilityMetrics, StabilityTracker};
use crate::stats;

/// Signal history retained per record.
pub const MAX_SIGNAL_HISTORY: usize = 100;

/// Co-channel peer count beyond which crowding is noted.
const CHANNEL_CROWDING_LIMIT: usize = 2;

/// Stability-score lead a same-SSID peer needs to mark this device a repeater.
const REPEATER_SCORE_GAP: f64 = 20.0;

const DEFAULT_SSID_MARKERS: &[&str] = &[
    "linksys", "netgear", "dlink", "default", "tp-link", "tplink", "asus", "belkin", "setup",
    "admin",
];

// ---------------------------------------------------------------------------
// Model seams
// ---------------------------------------------------------------------------

/// Distance estimation stage.
pub trait DistanceModel: Send {
    /// Estimate distance for one sighting.
    fn estimate(&mut self, obs: &Observation) -> DistanceEstimate;
    /// Full reset.
    fn clear(&mut self);
}

/// Fingerprinting stage.
pub trait FingerprintModel: Send {
    /// Classify one sighting.
    fn fingerprint(&mut self, obs: &Observation) -> Fingerprint;
    /// Full reset.
    fn clear(&mut self);
}

/// Stability-tracking stage.
pub trait StabilityModel: Send {
    /// Record one sighting and return the updated metrics.
    fn record(&mut self, obs: &Observation) -> StabilityMetrics;
    /// Current stability score for a MAC (50.0 when untracked).
    fn score(&self, mac: &str) -> f64;
    /// Full reset.
    fn clear(&mut self);
}

impl DistanceModel for DistanceEstimator {
    fn estimate(&mut self, obs: &Observation) -> DistanceEstimate {
        DistanceEstimator::estimate(
            self,
            &obs.mac,
            obs.signal_percent,
            &obs.vendor,
            &obs.ssid,
            obs.resolved_band(),
        )
    }

    fn clear(&mut self) {
        DistanceEstimator::clear(self)
    }
}

impl FingerprintModel for DeviceFingerprinter {
    fn fingerprint(&mut self, obs: &Observation) -> Fingerprint {
        DeviceFingerprinter::fingerprint(
            self,
            &obs.mac,
            &obs.ssid,
            &obs.vendor,
            obs.channel,
            obs.signal_percent,
            &obs.security,
        )
    }

    fn clear(&mut self) {
        DeviceFingerprinter::clear(self)
    }
}

impl StabilityModel for StabilityTracker {
    fn record(&mut self, obs: &Observation) -> StabilityMetrics {
        StabilityTracker::record(self, &obs.mac, &obs.ssid, obs.signal_dbm(), obs.timestamp)
    }

    fn score(&self, mac: &str) -> f64 {
        StabilityTracker::score(self, mac)
    }

    fn clear(&mut self) {
        StabilityTracker::clear(self)
    }
}

/// No-op distance stage: every estimate is the default.
#[derive(Debug, Default)]
pub struct NeutralDistance;

impl DistanceModel for NeutralDistance {
    fn estimate(&mut self, _obs: &Observation) -> DistanceEstimate {
        DistanceEstimate::default()
    }

    fn clear(&mut self) {}
}

/// No-op fingerprint stage: every device stays unclassified.
#[derive(Debug, Default)]
pub struct NeutralFingerprint;

impl FingerprintModel for NeutralFingerprint {
    fn fingerprint(&mut self, _obs: &Observation) -> Fingerprint {
        Fingerprint::default()
    }

    fn clear(&mut self) {}
}

/// No-op stability stage: every device reports neutral metrics.
#[derive(Debug, Default)]
pub struct NeutralStability;

impl StabilityModel for NeutralStability {
    fn record(&mut self, _obs: &Observation) -> StabilityMetrics {
        StabilityMetrics::default()
    }

    fn score(&self, _mac: &str) -> f64 {
        50.0
    }

    fn clear(&mut self) {}
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Movement state inferred from recent signal deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementState {
    /// Fewer than five samples; no inference yet.
    Appeared,
    /// Average delta below 2 dB and peak below 5 dB.
    Stationary,
    /// Average delta below 5 dB and peak below 10 dB.
    SlowDrift,
    /// Average delta below 10 dB.
    Moving,
    /// Anything faster.
    FastMoving,
}

impl MovementState {
    /// Label for tags and exports.
    pub fn label(self) -> &'static str {
        match self {
            MovementState::Appeared => "appeared",
            MovementState::Stationary => "stationary",
            MovementState::SlowDrift => "slow drift",
            MovementState::Moving => "moving",
            MovementState::FastMoving => "fast moving",
        }
    }
}

fn classify_movement(history: &[f64]) -> (MovementState, f64) {
    if history.len() < 5 {
        return (MovementState::Appeared, 0.0);
    }
    let skip = history.len().saturating_sub(10);
    let deltas = stats::abs_deltas(&history[skip..]);
    if deltas.is_empty() {
        return (MovementState::Appeared, 0.0);
    }
    let avg = stats::mean(&deltas);
    let max = deltas.iter().cloned().fold(0.0, f64::max);
    if avg < 2.0 && max < 5.0 {
        (MovementState::Stationary, 90.0)
    } else if avg < 5.0 && max < 10.0 {
        (MovementState::SlowDrift, 70.0)
    } else if avg < 10.0 {
        (MovementState::Moving, 60.0)
    } else {
        (MovementState::FastMoving, 50.0)
    }
}

// ---------------------------------------------------------------------------
// NetworkIntelligence
// ---------------------------------------------------------------------------

/// The fused per-device intelligence record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkIntelligence {
    /// Hardware address.
    pub mac: String,
    /// Network name; empty when hidden.
    pub ssid: String,
    /// Vendor name resolved via the lookup service.
    pub vendor: String,
    /// Device classification.
    pub category: DeviceCategory,
    /// Classification icon.
    pub icon: String,
    /// Classification confidence, 0-99.
    pub classification_confidence: f64,
    /// Latest signal percentage.
    pub signal_percent: f64,
    /// Latest signal in dBm.
    pub signal_dbm: f64,
    /// Latest channel.
    pub channel: u16,
    /// Resolved band.
    pub band: Band,
    /// Radio capability guess ("WiFi 4 era" etc.).
    pub capability: String,
    /// Latest distance estimate.
    pub location: DistanceEstimate,
    /// Latest stability metrics.
    pub stability: StabilityMetrics,
    /// Movement state over recent samples.
    pub movement: MovementState,
    /// Movement inference confidence, 0-100.
    pub movement_confidence: f64,
    /// Security rating.
    pub security_rating: SecurityRating,
    /// Raw security descriptor.
    pub security: String,
    /// Spoof-risk score, 0-100.
    pub spoof_risk: f64,
    /// Vulnerability notes.
    pub vulnerabilities: Vec<String>,
    /// Whether the SSID is hidden.
    pub is_hidden: bool,
    /// Shares a 3-octet MAC prefix with another tracked device.
    pub is_multi_bssid: bool,
    /// Member of an inferred mesh group.
    pub is_mesh_member: bool,
    /// Looks like a repeater of a stronger same-SSID device.
    pub is_repeater: bool,
    /// SSID suggests a guest network.
    pub is_guest: bool,
    /// MACs related through SSID or prefix.
    pub related_macs: Vec<String>,
    /// First sighting.
    pub first_seen: DateTime<Utc>,
    /// Most recent sighting.
    pub last_seen: DateTime<Utc>,
    /// Total sightings.
    pub times_seen: u64,
    /// Bounded dBm history.
    pub signal_history: VecDeque<f64>,
    /// Descriptive tag set, rebuilt on every update.
    pub tags: Vec<String>,
}

impl NetworkIntelligence {
    fn new(obs: &Observation) -> Self {
        Self {
            mac: obs.mac.clone(),
            ssid: obs.ssid.clone(),
            vendor: String::new(),
            category: DeviceCategory::Unknown,
            icon: DeviceCategory::Unknown.icon().to_string(),
            classification_confidence: 0.0,
            signal_percent: obs.signal_percent,
            signal_dbm: obs.signal_dbm(),
            channel: obs.channel,
            band: obs.resolved_band(),
            capability: String::new(),
            location: DistanceEstimate::default(),
            stability: StabilityMetrics::default(),
            movement: MovementState::Appeared,
            movement_confidence: 0.0,
            security_rating: SecurityRating::Critical,
            security: obs.security.clone(),
            spoof_risk: 0.0,
            vulnerabilities: Vec::new(),
            is_hidden: obs.is_hidden(),
            is_multi_bssid: false,
            is_mesh_member: false,
            is_repeater: false,
            is_guest: false,
            related_macs: Vec::new(),
            first_seen: obs.timestamp,
            last_seen: obs.timestamp,
            times_seen: 0,
            signal_history: VecDeque::with_capacity(MAX_SIGNAL_HISTORY),
            tags: Vec::new(),
        }
    }

    /// Bare record for tests elsewhere in the crate.
    #[cfg(test)]
    pub(crate) fn sample_for_tests(obs: &Observation) -> Self {
        Self::new(obs)
    }
}

// ---------------------------------------------------------------------------
// IntelAggregator
// ---------------------------------------------------------------------------

/// Owns the per-MAC intelligence records and the three model stages.
pub struct IntelAggregator {
    fingerprinter: Box<dyn FingerprintModel>,
    distance: Box<dyn DistanceModel>,
    stability: Box<dyn StabilityModel>,
    vendor_lookup: std::sync::Arc<dyn VendorLookup>,
    records: HashMap<String, NetworkIntelligence>,
    ssid_index: HashMap<String, HashSet<String>>,
    channel_index: HashMap<u16, HashSet<String>>,
}

impl IntelAggregator {
    /// Create an aggregator with explicit model stages.
    pub fn new(
        fingerprinter: Box<dyn FingerprintModel>,
        distance: Box<dyn DistanceModel>,
        stability: Box<dyn StabilityModel>,
        vendor_lookup: std::sync::Arc<dyn VendorLookup>,
    ) -> Self {
        Self {
            fingerprinter,
            distance,
            stability,
            vendor_lookup,
            records: HashMap::new(),
            ssid_index: HashMap::new(),
            channel_index: HashMap::new(),
        }
    }

    /// Process one observation, creating or updating the MAC's record.
    pub fn process(&mut self, obs: &Observation) -> &NetworkIntelligence {
        let vendor_info = self.vendor_lookup.lookup(&obs.mac);
        let fingerprint = self.fingerprinter.fingerprint(obs);
        let location = self.distance.estimate(obs);
        let stability = self.stability.record(obs);

        let is_new = !self.records.contains_key(&obs.mac);
        if is_new {
            debug!(mac = %obs.mac, ssid = %obs.ssid, "tracking new device");
        }
        self.index_observation(obs);

        let peer_flags = self.derive_relationships(obs, &vendor_info);

        let record = self
            .records
            .entry(obs.mac.clone())
            .or_insert_with(|| NetworkIntelligence::new(obs));

        record.last_seen = obs.timestamp;
        record.times_seen += 1;
        if !obs.ssid.trim().is_empty() {
            record.ssid = obs.ssid.clone();
        }
        record.is_hidden = obs.is_hidden();
        record.signal_percent = obs.signal_percent;
        record.signal_dbm = obs.signal_dbm();
        record.channel = obs.channel;
        record.band = obs.resolved_band();
        record.security = obs.security.clone();
        record.capability = capability_guess(record.band, obs.channel);

        record.vendor = if vendor_info.is_known {
            vendor_info.name.clone()
        } else if !obs.vendor.is_empty() {
            obs.vendor.clone()
        } else {
            "Unknown".to_string()
        };

        record.category = fingerprint.category;
        record.icon = fingerprint.icon.clone();
        record.classification_confidence = fingerprint.confidence;
        record.location = location;
        record.stability = stability;

        if record.signal_history.len() >= MAX_SIGNAL_HISTORY {
            record.signal_history.pop_front();
        }
        record.signal_history.push_back(obs.signal_dbm());

        let history: Vec<f64> = record.signal_history.iter().copied().collect();
        let (movement, movement_confidence) = classify_movement(&history);
        record.movement = movement;
        record.movement_confidence = movement_confidence;

        record.security_rating = SecurityRating::from_descriptor(&obs.security);
        record.is_multi_bssid = peer_flags.multi_bssid;
        record.is_mesh_member = peer_flags.mesh;
        record.is_repeater = peer_flags.repeater;
        record.is_guest = obs.ssid.to_ascii_lowercase().contains("guest");
        record.related_macs = peer_flags.related;

        record.vulnerabilities = vulnerabilities_for(obs, peer_flags.co_channel_peers);
        record.spoof_risk = spoof_risk_for(obs, &vendor_info, &record.vulnerabilities);
        record.tags = build_tags(record);

        record
    }

    /// Read-only access to a record.
    pub fn get(&self, mac: &str) -> Option<&NetworkIntelligence> {
        self.records.get(mac)
    }

    /// All records.
    pub fn records(&self) -> impl Iterator<Item = &NetworkIntelligence> {
        self.records.values()
    }

    /// Tracked device count.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop records whose last sighting is older than `cutoff`.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let stale: Vec<String> = self
            .records
            .iter()
            .filter(|(_, r)| r.last_seen < cutoff)
            .map(|(mac, _)| mac.clone())
            .collect();
        for mac in &stale {
            self.records.remove(mac);
            for members in self.ssid_index.values_mut() {
                members.remove(mac);
            }
            for members in self.channel_index.values_mut() {
                members.remove(mac);
            }
        }
        stale.len()
    }

    /// Full reset, including the model stages.
    pub fn clear(&mut self) {
        self.records.clear();
        self.ssid_index.clear();
        self.channel_index.clear();
        self.fingerprinter.clear();
        self.distance.clear();
        self.stability.clear();
    }

    fn index_observation(&mut self, obs: &Observation) {
        if !obs.ssid.trim().is_empty() {
            self.ssid_index
                .entry(obs.ssid.clone())
                .or_default()
                .insert(obs.mac.clone());
        }
        self.channel_index
            .entry(obs.channel)
            .or_default()
            .insert(obs.mac.clone());
    }

    fn derive_relationships(&self, obs: &Observation, _vendor: &VendorInfo) -> PeerFlags {
        let prefix = obs.oui();
        let mut related: HashSet<String> = HashSet::new();

        let mut multi_bssid = false;
        for mac in self.records.keys() {
            if mac != &obs.mac && crate::domain::oui_prefix(mac) == prefix {
                multi_bssid = true;
                related.insert(mac.clone());
            }
        }

        let mut mesh = false;
        let mut repeater = false;
        if !obs.ssid.trim().is_empty() {
            if let Some(members) = self.ssid_index.get(&obs.ssid) {
                let peers: Vec<&String> = members.iter().filter(|m| *m != &obs.mac).collect();
                if !peers.is_empty() {
                    related.extend(peers.iter().map(|m| (*m).to_string()));

                    // Mesh: all same-SSID members share one OUI prefix
                    let mut prefixes: HashSet<String> = peers
                        .iter()
                        .map(|m| crate::domain::oui_prefix(m))
                        .collect();
                    prefixes.insert(prefix.clone());
                    mesh = prefixes.len() == 1;

                    // Repeater: a same-SSID peer holds a materially higher
                    // stability score than this device
                    let own_score = self.stability.score(&obs.mac);
                    repeater = peers
                        .iter()
                        .any(|m| self.stability.score(m) >= own_score + REPEATER_SCORE_GAP);
                }
            }
        }

        let co_channel_peers = self
            .channel_index
            .get(&obs.channel)
            .map(|m| m.iter().filter(|mac| *mac != &obs.mac).count())
            .unwrap_or(0);

        let mut related: Vec<String> = related.into_iter().collect();
        related.sort();

        PeerFlags {
            multi_bssid,
            mesh,
            repeater,
            related,
            co_channel_peers,
        }
    }
}

struct PeerFlags {
    multi_bssid: bool,
    mesh: bool,
    repeater: bool,
    related: Vec<String>,
    co_channel_peers: usize,
}

fn capability_guess(band: Band, channel: u16) -> String {
    match band {
        Band::Band6 => "WiFi 6E capable".to_string(),
        Band::Band5 if (100..=144).contains(&channel) => "WiFi 5/6, DFS capable".to_string(),
        Band::Band5 => "WiFi 5 or newer".to_string(),
        Band::Band2_4 => "WiFi 4 era or dual-band".to_string(),
        Band::Unknown => "unknown".to_string(),
    }
}

fn vulnerabilities_for(obs: &Observation, co_channel_peers: usize) -> Vec<String> {
    let mut notes = Vec::new();
    let rating = SecurityRating::from_descriptor(&obs.security);
    match rating {
        SecurityRating::Critical => {
            if security::is_open(&obs.security) {
                notes.push("open network: traffic is unencrypted".to_string());
            } else {
                notes.push("WEP is trivially crackable".to_string());
            }
        }
        SecurityRating::Weak => {
            notes.push("WPA(1) is deprecated and attackable".to_string());
        }
        _ => {}
    }
    let ssid_lc = obs.ssid.to_ascii_lowercase();
    if DEFAULT_SSID_MARKERS.iter().any(|m| ssid_lc.contains(m)) {
        notes.push("default-style SSID suggests factory settings".to_string());
    }
    if obs.is_hidden() {
        notes.push("hidden SSID (obscurity, not security)".to_string());
    }
    if co_channel_peers > CHANNEL_CROWDING_LIMIT {
        notes.push(format!(
            "channel {} shared with {} other devices",
            obs.channel, co_channel_peers
        ));
    }
    notes
}

fn spoof_risk_for(obs: &Observation, vendor: &VendorInfo, vulnerabilities: &[String]) -> f64 {
    let mut risk = vendor.spoof_risk_adjustment(&obs.vendor, obs.is_hidden(), obs.signal_dbm());
    if security::is_open(&obs.security) {
        risk += 20.0;
    }
    if vulnerabilities
        .iter()
        .any(|v| v.starts_with("default-style"))
    {
        risk += 10.0;
    }
    risk.min(100.0)
}

fn build_tags(record: &NetworkIntelligence) -> Vec<String> {
    let mut tags = Vec::new();
    if record.category != DeviceCategory::Unknown {
        tags.push(record.category.description().to_string());
    }
    tags.push(record.band.label().to_string());
    match record.security_rating {
        SecurityRating::Excellent => tags.push("wpa3".to_string()),
        SecurityRating::Critical => tags.push("weak-security".to_string()),
        _ => {}
    }
    if record.spoof_risk > 50.0 {
        tags.push("spoof-risk".to_string());
    }
    if record.is_hidden {
        tags.push("hidden".to_string());
    }
    if record.is_mesh_member {
        tags.push("mesh".to_string());
    }
    if record.is_repeater {
        tags.push("repeater".to_string());
    }
    if record.is_guest {
        tags.push("guest".to_string());
    }
    if matches!(
        record.movement,
        MovementState::Moving | MovementState::FastMoving
    ) {
        tags.push("moving".to_string());
    }
    if matches!(
        record.stability.rating,
        crate::stability::StabilityRating::Unstable | crate::stability::StabilityRating::Erratic
    ) {
        tags.push("unstable".to_string());
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vendor::StaticOuiTable;
    use std::sync::Arc;

    fn aggregator() -> IntelAggregator {
        IntelAggregator::new(
            Box::new(DeviceFingerprinter::new().unwrap()),
            Box::new(DistanceEstimator::with_defaults()),
            Box::new(StabilityTracker::new()),
            Arc::new(StaticOuiTable::new()),
        )
    }

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

    #[test]
    fn first_sight_creates_record() {
        let mut agg = aggregator();
        let record = agg.process(&obs("E4:F0:42:00:00:01", "HomeNet", 70.0, 6, "WPA2"));
        assert_eq!(record.times_seen, 1);
        assert_eq!(record.vendor, "eero");
        assert_eq!(record.movement, MovementState::Appeared);
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn repeated_sightings_mutate_same_record() {
        let mut agg = aggregator();
        let mac = "E4:F0:42:00:00:02";
        for _ in 0..10 {
            agg.process(&obs(mac, "HomeNet", 70.0, 6, "WPA2"));
        }
        let record = agg.get(mac).unwrap();
        assert_eq!(record.times_seen, 10);
        assert_eq!(record.movement, MovementState::Stationary);
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn signal_history_is_bounded() {
        let mut agg = aggregator();
        let mac = "AA:BB:CC:00:00:03";
        for _ in 0..(MAX_SIGNAL_HISTORY + 20) {
            agg.process(&obs(mac, "Net", 60.0, 6, "WPA2"));
        }
        assert_eq!(agg.get(mac).unwrap().signal_history.len(), MAX_SIGNAL_HISTORY);
    }

    #[test]
    fn open_network_rated_critical_with_notes() {
        let mut agg = aggregator();
        let record = agg.process(&obs("AA:BB:CC:00:00:04", "Cafe", 50.0, 6, "Open"));
        assert_eq!(record.security_rating, SecurityRating::Critical);
        assert!(record.vulnerabilities.iter().any(|v| v.contains("open")));
    }

    #[test]
    fn default_ssid_noted() {
        let mut agg = aggregator();
        let record = agg.process(&obs("AA:BB:CC:00:00:05", "NETGEAR42", 50.0, 6, "WPA2"));
        assert!(record
            .vulnerabilities
            .iter()
            .any(|v| v.contains("default-style")));
    }

    #[test]
    fn mesh_flags_for_shared_prefix_and_ssid() {
        let mut agg = aggregator();
        agg.process(&obs("E4:F0:42:00:00:10", "MeshNet", 60.0, 1, "WPA2"));
        let second = agg.process(&obs("E4:F0:42:00:00:11", "MeshNet", 55.0, 6, "WPA2"));
        assert!(second.is_mesh_member);
        assert!(second.is_multi_bssid);
        assert!(!second.related_macs.is_empty());
    }

    #[test]
    fn different_prefixes_are_not_mesh() {
        let mut agg = aggregator();
        agg.process(&obs("AA:BB:CC:00:00:20", "TwinNet", 60.0, 1, "WPA2"));
        let second = agg.process(&obs("DD:EE:FF:00:00:21", "TwinNet", 55.0, 6, "WPA2"));
        assert!(!second.is_mesh_member);
    }

    #[test]
    fn guest_ssid_flagged() {
        let mut agg = aggregator();
        let record = agg.process(&obs("AA:BB:CC:00:00:06", "HomeNet-Guest", 50.0, 6, "WPA2"));
        assert!(record.is_guest);
        assert!(record.tags.iter().any(|t| t == "guest"));
    }

    #[test]
    fn channel_crowding_noted() {
        let mut agg = aggregator();
        agg.process(&obs("AA:00:00:00:00:01", "A", 50.0, 6, "WPA2"));
        agg.process(&obs("BB:00:00:00:00:02", "B", 50.0, 6, "WPA2"));
        agg.process(&obs("CC:00:00:00:00:03", "C", 50.0, 6, "WPA2"));
        let record = agg.process(&obs("DD:00:00:00:00:04", "D", 50.0, 6, "WPA2"));
        assert!(record
            .vulnerabilities
            .iter()
            .any(|v| v.contains("channel 6")));
    }

    #[test]
    fn clear_resets_everything() {
        let mut agg = aggregator();
        agg.process(&obs("AA:BB:CC:00:00:07", "Net", 50.0, 6, "WPA2"));
        agg.clear();
        assert!(agg.is_empty());
    }

    #[test]
    fn prune_drops_stale_records() {
        let mut agg = aggregator();
        let mut old = obs("AA:BB:CC:00:00:08", "Old", 50.0, 6, "WPA2");
        old.timestamp = Utc::now() - chrono::Duration::hours(2);
        agg.process(&old);
        agg.process(&obs("AA:BB:CC:00:00:09", "Fresh", 50.0, 6, "WPA2"));

        let dropped = agg.prune_older_than(Utc::now() - chrono::Duration::hours(1));
        assert_eq!(dropped, 1);
        assert!(agg.get("AA:BB:CC:00:00:08").is_none());
        assert!(agg.get("AA:BB:CC:00:00:09").is_some());
    }

    #[test]
    fn neutral_models_degrade_cleanly() {
        let mut agg = IntelAggregator::new(
            Box::new(NeutralFingerprint),
            Box::new(NeutralDistance),
            Box::new(NeutralStability),
            Arc::new(crate::domain::vendor::NullVendorLookup),
        );
        let record = agg.process(&obs("AA:BB:CC:00:00:0A", "Net", 50.0, 6, "WPA2"));
        assert_eq!(record.category, DeviceCategory::Unknown);
        assert_eq!(record.location.confidence, 0.0);
        assert_eq!(record.stability.rating, crate::stability::StabilityRating::Unrated);
    }
}
