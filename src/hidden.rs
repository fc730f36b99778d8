//! Hidden-network classification.
//!
//! Devices that broadcast no SSID get their own profile store. `record`
//! upserts profiles per observation; `analyze` is a batch pass that scores
//! OUI consistency, channel coherence, signal grouping and rogue likelihood,
//! classifies each profile, rebuilds OUI clusters and flags outliers and
//! spoof candidates against the visible population.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::observation::{oui_prefix, Band};
use crate::domain::security;
use crate::domain::vendor::{VendorCategory, VendorInfo, VendorLookup};
use crate::stats;

/// 5 GHz channels commonly used for mesh backhaul links.
pub const BACKHAUL_CHANNELS: [u16; 9] = [36, 40, 44, 48, 149, 153, 157, 161, 165];

/// DFS channel range.
pub const DFS_RANGE: std::ops::RangeInclusive<u16> = 52..=144;

/// Rogue-likelihood score above which a profile is a rogue candidate.
const ROGUE_SCORE_GATE: f64 = 60.0;

/// Strong-signal gate (dBm) for the proximity rogue flag.
const ROGUE_RSSI_GATE: f64 = -45.0;

// ---------------------------------------------------------------------------
// Classification types
// ---------------------------------------------------------------------------

/// What a hidden device most likely is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HiddenClass {
    /// Node of a known mesh system.
    MeshNode,
    /// Single device with a mesh-vendor OUI.
    ExtenderRepeater,
    /// Enterprise infrastructure.
    EnterpriseAp,
    /// Dedicated 5 GHz backhaul link.
    BackhaulLink,
    /// IoT device.
    IotDevice,
    /// Likely rogue access point.
    RogueSuspect,
    /// Hidden counterpart of a visible network (guest/isolated BSS).
    GuestIsolated,
    /// No confident classification.
    Unknown,
}

impl HiddenClass {
    /// Label for exports.
    pub fn label(self) -> &'static str {
        match self {
            HiddenClass::MeshNode => "mesh_node",
            HiddenClass::ExtenderRepeater => "extender_repeater",
            HiddenClass::EnterpriseAp => "enterprise_ap",
            HiddenClass::BackhaulLink => "backhaul_link",
            HiddenClass::IotDevice => "iot_device",
            HiddenClass::RogueSuspect => "rogue_suspect",
            HiddenClass::GuestIsolated => "guest_isolated",
            HiddenClass::Unknown => "unknown",
        }
    }
}

/// Cluster classification for groups of hidden devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HiddenClusterKind {
    /// All members classified as mesh.
    MeshCluster,
    /// All members classified as enterprise.
    EnterpriseCluster,
    /// At least one rogue candidate among the members.
    SuspiciousGroup,
    /// Members resolve to more than one vendor.
    MixedVendor,
    /// No dominant pattern.
    Unknown,
}

/// Profile of one hidden device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenNetworkProfile {
    /// Hardware address.
    pub mac: String,
    /// OUI prefix.
    pub oui: String,
    /// Vendor lookup result.
    pub vendor: VendorInfo,
    /// Latest channel.
    pub channel: u16,
    /// Latest band.
    pub band: Band,
    /// Latest RSSI (dBm).
    pub rssi_dbm: f64,
    /// Latest security descriptor.
    pub security: String,
    /// First sighting.
    pub first_seen: DateTime<Utc>,
    /// Most recent sighting.
    pub last_seen: DateTime<Utc>,
    /// Total sightings.
    pub times_seen: u64,
    /// OUI-consistency sub-score, 0-100.
    pub oui_consistency: f64,
    /// Channel-coherence sub-score, 0-100.
    pub channel_coherence: f64,
    /// Signal-grouping sub-score, 0-100.
    pub signal_grouping: f64,
    /// Rogue-likelihood score, 0-100.
    pub rogue_likelihood: f64,
    /// Classification result.
    pub classification: HiddenClass,
    /// Classification confidence, 0-100.
    pub classification_confidence: f64,
    /// Why the classification was chosen.
    pub classification_reason: String,
    /// Rogue-candidate flag.
    pub is_rogue_candidate: bool,
    /// Evil-twin-of-visible flag.
    pub is_spoof_candidate: bool,
    /// Statistical outlier flag.
    pub is_outlier: bool,
    /// Visible MACs this profile correlates with.
    pub related_visible: Vec<String>,
    /// Cluster membership, if any.
    pub cluster_id: Option<String>,
}

/// One hidden-device cluster, rebuilt per analyze pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenCluster {
    /// Cluster id (`hidden_cluster_N` / `hidden_single_N`).
    pub id: String,
    /// Shared OUI prefix.
    pub oui: String,
    /// Vendor name for the OUI.
    pub vendor: String,
    /// Member MACs.
    pub members: Vec<String>,
    /// Cluster classification.
    pub kind: HiddenClusterKind,
    /// Classification confidence, 0-100.
    pub confidence: f64,
}

/// A visible network, as context for correlation and spoof checks.
#[derive(Debug, Clone)]
pub struct VisibleNetwork {
    /// Hardware address.
    pub mac: String,
    /// Broadcast SSID.
    pub ssid: String,
    /// Channel.
    pub channel: u16,
    /// RSSI (dBm).
    pub rssi_dbm: f64,
}

/// Summary counts for exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenSummary {
    /// Tracked hidden devices.
    pub total: usize,
    /// Classified as mesh nodes or extenders.
    pub mesh: usize,
    /// Classified as enterprise.
    pub enterprise: usize,
    /// Classified as IoT.
    pub iot: usize,
    /// Rogue candidates.
    pub rogue_candidates: usize,
    /// Spoof candidates.
    pub spoof_candidates: usize,
    /// Statistical outliers.
    pub outliers: usize,
    /// Clusters after the last analyze pass.
    pub clusters: usize,
}

// ---------------------------------------------------------------------------
// HiddenNetworkClassifier
// ---------------------------------------------------------------------------

/// Profile store and batch classifier for hidden devices.
pub struct HiddenNetworkClassifier {
    vendor_lookup: std::sync::Arc<dyn VendorLookup>,
    profiles: HashMap<String, HiddenNetworkProfile>,
    oui_index: HashMap<String, HashSet<String>>,
    channel_index: HashMap<u16, HashSet<String>>,
    clusters: Vec<HiddenCluster>,
}

impl HiddenNetworkClassifier {
    /// Create an empty classifier around an injected vendor lookup.
    pub fn new(vendor_lookup: std::sync::Arc<dyn VendorLookup>) -> Self {
        Self {
            vendor_lookup,
            profiles: HashMap::new(),
            oui_index: HashMap::new(),
            channel_index: HashMap::new(),
            clusters: Vec::new(),
        }
    }

    /// Upsert the profile for one hidden-device sighting.
    pub fn record(
        &mut self,
        mac: &str,
        channel: u16,
        band: Band,
        rssi_dbm: f64,
        security: &str,
        timestamp: DateTime<Utc>,
    ) {
        let oui = oui_prefix(mac);
        let vendor = self.vendor_lookup.lookup(mac);

        let profile = self
            .profiles
            .entry(mac.to_string())
            .or_insert_with(|| HiddenNetworkProfile {
                mac: mac.to_string(),
                oui: oui.clone(),
                vendor: vendor.clone(),
                channel,
                band,
                rssi_dbm,
                security: security.to_string(),
                first_seen: timestamp,
                last_seen: timestamp,
                times_seen: 0,
                oui_consistency: 0.0,
                channel_coherence: 0.0,
                signal_grouping: 0.0,
                rogue_likelihood: 0.0,
                classification: HiddenClass::Unknown,
                classification_confidence: 0.0,
                classification_reason: String::new(),
                is_rogue_candidate: false,
                is_spoof_candidate: false,
                is_outlier: false,
                related_visible: Vec::new(),
                cluster_id: None,
            });

        // Migrate the channel index if the device hopped
        if profile.channel != channel {
            if let Some(members) = self.channel_index.get_mut(&profile.channel) {
                members.remove(mac);
            }
        }
        profile.channel = channel;
        profile.band = band;
        profile.rssi_dbm = rssi_dbm;
        profile.security = security.to_string();
        profile.last_seen = timestamp;
        profile.times_seen += 1;

        self.oui_index.entry(oui).or_default().insert(mac.to_string());
        self.channel_index
            .entry(channel)
            .or_default()
            .insert(mac.to_string());
    }

    /// Batch analysis pass. Scores, classifies and clusters every profile
    /// against the current hidden population and the visible networks.
    pub fn analyze(&mut self, visible: &[VisibleNetwork]) {
        let macs: Vec<String> = self.profiles.keys().cloned().collect();

        for mac in &macs {
            self.score_profile(mac);
        }
        for mac in &macs {
            self.classify_profile(mac, visible);
        }
        self.flag_outliers(visible);
        self.flag_spoof_candidates(visible);
        self.rebuild_clusters();

        debug!(
            profiles = self.profiles.len(),
            clusters = self.clusters.len(),
            "hidden analysis pass complete"
        );
    }

    /// Read a profile.
    pub fn profile(&self, mac: &str) -> Option<&HiddenNetworkProfile> {
        self.profiles.get(mac)
    }

    /// Iterate all profiles.
    pub fn profiles(&self) -> impl Iterator<Item = &HiddenNetworkProfile> {
        self.profiles.values()
    }

    /// Clusters from the last analyze pass.
    pub fn clusters(&self) -> &[HiddenCluster] {
        &self.clusters
    }

    /// Summary counts.
    pub fn summary(&self) -> HiddenSummary {
        let mut summary = HiddenSummary {
            total: self.profiles.len(),
            mesh: 0,
            enterprise: 0,
            iot: 0,
            rogue_candidates: 0,
            spoof_candidates: 0,
            outliers: 0,
            clusters: self.clusters.len(),
        };
        for p in self.profiles.values() {
            match p.classification {
                HiddenClass::MeshNode | HiddenClass::ExtenderRepeater => summary.mesh += 1,
                HiddenClass::EnterpriseAp => summary.enterprise += 1,
                HiddenClass::IotDevice => summary.iot += 1,
                _ => {}
            }
            if p.is_rogue_candidate {
                summary.rogue_candidates += 1;
            }
            if p.is_spoof_candidate {
                summary.spoof_candidates += 1;
            }
            if p.is_outlier {
                summary.outliers += 1;
            }
        }
        summary
    }

    /// Drop profiles not seen since `cutoff`.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let stale: Vec<String> = self
            .profiles
            .iter()
            .filter(|(_, p)| p.last_seen < cutoff)
            .map(|(mac, _)| mac.clone())
            .collect();
        for mac in &stale {
            self.profiles.remove(mac);
            for members in self.oui_index.values_mut() {
                members.remove(mac);
            }
            for members in self.channel_index.values_mut() {
                members.remove(mac);
            }
        }
        stale.len()
    }

    /// Full reset.
    pub fn clear(&mut self) {
        self.profiles.clear();
        self.oui_index.clear();
        self.channel_index.clear();
        self.clusters.clear();
    }

    // -- scoring -----------------------------------------------------------

    fn score_profile(&mut self, mac: &str) {
        let Some(profile) = self.profiles.get(mac) else {
            return;
        };
        let oui = profile.oui.clone();
        let group: Vec<&HiddenNetworkProfile> = self
            .oui_index
            .get(&oui)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|m| self.profiles.get(m))
                    .collect()
            })
            .unwrap_or_default();
        let group_size = group.len();

        // OUI consistency
        let mut oui_consistency = if group_size >= 2 {
            (50.0 + group_size as f64 * 10.0).min(100.0)
        } else {
            50.0
        };
        match self.profiles[mac].vendor.category {
            VendorCategory::Mesh => oui_consistency += 20.0,
            VendorCategory::Enterprise => oui_consistency += 15.0,
            _ => {}
        }
        let oui_consistency = oui_consistency.min(100.0);

        // Channel coherence and signal grouping over the OUI group
        let channels: Vec<f64> = group.iter().map(|p| p.channel as f64).collect();
        let rssi: Vec<f64> = group.iter().map(|p| p.rssi_dbm).collect();
        let channel_var = stats::variance(&channels);
        let rssi_var = stats::variance(&rssi);

        let profile = &self.profiles[mac];
        let mut channel_coherence = 100.0 / (1.0 + channel_var);
        if BACKHAUL_CHANNELS.contains(&profile.channel) {
            channel_coherence = (channel_coherence + 10.0).min(100.0);
        }
        let signal_grouping = 100.0 / (1.0 + rssi_var / 100.0);

        let rogue_likelihood = self.rogue_likelihood(mac, channel_var);

        if let Some(profile) = self.profiles.get_mut(mac) {
            profile.oui_consistency = oui_consistency;
            profile.channel_coherence = channel_coherence;
            profile.signal_grouping = signal_grouping;
            profile.rogue_likelihood = rogue_likelihood;
        }
    }

    fn rogue_likelihood(&self, mac: &str, group_channel_var: f64) -> f64 {
        let profile = &self.profiles[mac];
        let vendor = &profile.vendor;

        let oui_contrib = if !vendor.is_known { 80.0 } else { 0.0 };

        let mut channel_contrib: f64 = 0.0;
        if DFS_RANGE.contains(&profile.channel) {
            channel_contrib += 20.0;
        }
        if group_channel_var > 100.0 {
            channel_contrib += 40.0;
        }
        let channel_contrib: f64 = channel_contrib.min(100.0);

        let rssi_contrib = if profile.rssi_dbm > -40.0 {
            60.0
        } else if profile.rssi_dbm > -50.0 {
            30.0
        } else {
            0.0
        };

        let bssid_contrib = if has_degenerate_pattern(&profile.mac) {
            50.0
        } else {
            0.0
        };

        let security_contrib = if security::is_open(&profile.security) {
            70.0
        } else if profile.security.to_ascii_lowercase().contains("wep") {
            50.0
        } else {
            0.0
        };

        let weighted = oui_contrib * 0.25
            + channel_contrib * 0.20
            + rssi_contrib * 0.15
            + bssid_contrib * 0.15
            + security_contrib * 0.10;

        // Vendor-intelligence adjustment is additive on top of the
        // weighted factors
        let adjustment = vendor.rogue_risk_adjustment(true, profile.rssi_dbm, profile.channel);

        (weighted + adjustment).min(100.0)
    }

    // -- classification ----------------------------------------------------

    fn classify_profile(&mut self, mac: &str, visible: &[VisibleNetwork]) {
        let Some(profile) = self.profiles.get(mac) else {
            return;
        };
        let group_size = self
            .oui_index
            .get(&profile.oui)
            .map(|m| m.len())
            .unwrap_or(1);
        let same_channel_hidden = self
            .channel_index
            .get(&profile.channel)
            .map(|m| m.len())
            .unwrap_or(1);

        let vendor_category = profile.vendor.category;
        let channel = profile.channel;
        let band = profile.band;
        let score = profile.rogue_likelihood;
        let rssi = profile.rssi_dbm;
        let oui = profile.oui.clone();

        let mut related_visible: Vec<String> = Vec::new();
        let correlated = visible.iter().find(|v| {
            oui_prefix(&v.mac) == oui && v.channel.abs_diff(channel) <= 4 && v.mac != profile.mac
        });

        let (classification, confidence, reason) = if vendor_category
            == VendorCategory::Enterprise
        {
            (
                HiddenClass::EnterpriseAp,
                75.0,
                format!("enterprise vendor OUI {oui}"),
            )
        } else if vendor_category == VendorCategory::Mesh {
            if group_size >= 2 {
                (
                    HiddenClass::MeshNode,
                    80.0,
                    format!("mesh vendor OUI {oui} with {group_size} hidden peers"),
                )
            } else {
                (
                    HiddenClass::ExtenderRepeater,
                    60.0,
                    format!("single hidden device on mesh vendor OUI {oui}"),
                )
            }
        } else if band == Band::Band5
            && BACKHAUL_CHANNELS.contains(&channel)
            && same_channel_hidden >= 2
        {
            (
                HiddenClass::BackhaulLink,
                70.0,
                format!("{same_channel_hidden} hidden devices on backhaul channel {channel}"),
            )
        } else if vendor_category == VendorCategory::Iot {
            (
                HiddenClass::IotDevice,
                70.0,
                format!("IoT vendor OUI {oui}"),
            )
        } else if score > ROGUE_SCORE_GATE {
            (
                HiddenClass::RogueSuspect,
                score,
                format!("rogue likelihood {score:.0}"),
            )
        } else if let Some(v) = correlated {
            related_visible.push(v.mac.clone());
            (
                HiddenClass::GuestIsolated,
                60.0,
                format!("same OUI and adjacent channel as visible '{}'", v.ssid),
            )
        } else {
            (HiddenClass::Unknown, 30.0, "no dominant evidence".to_string())
        };

        let is_rogue = score > ROGUE_SCORE_GATE
            || (rssi > ROGUE_RSSI_GATE
                && !matches!(
                    vendor_category,
                    VendorCategory::Mesh | VendorCategory::Enterprise
                ));

        if is_rogue {
            warn!(mac, score, "hidden device flagged as rogue candidate");
        }

        if let Some(profile) = self.profiles.get_mut(mac) {
            profile.classification = classification;
            profile.classification_confidence = confidence;
            profile.classification_reason = reason;
            profile.is_rogue_candidate = is_rogue;
            profile.related_visible = related_visible;
        }
    }

    fn flag_outliers(&mut self, visible: &[VisibleNetwork]) {
        let all_rssi: Vec<f64> = self.profiles.values().map(|p| p.rssi_dbm).collect();
        let total_devices = self.profiles.len() + visible.len();

        let (mean, std) = (stats::mean(&all_rssi), stats::std_dev(&all_rssi));
        let visible_channels: HashSet<u16> = visible.iter().map(|v| v.channel).collect();
        let channel_counts: HashMap<u16, usize> = self
            .channel_index
            .iter()
            .map(|(ch, members)| (*ch, members.len()))
            .collect();

        for profile in self.profiles.values_mut() {
            let mut outlier = false;
            if all_rssi.len() >= 3 && std > f64::EPSILON {
                let z = (profile.rssi_dbm - mean).abs() / std;
                outlier = z > 2.0;
            }
            if !outlier && total_devices > 5 {
                let hidden_on_channel = channel_counts.get(&profile.channel).copied().unwrap_or(0);
                let isolated =
                    hidden_on_channel <= 1 && !visible_channels.contains(&profile.channel);
                outlier = isolated;
            }
            profile.is_outlier = outlier;
        }
    }

    fn flag_spoof_candidates(&mut self, visible: &[VisibleNetwork]) {
        for profile in self.profiles.values_mut() {
            let candidate = visible.iter().find(|v| {
                v.channel == profile.channel
                    && (v.rssi_dbm - profile.rssi_dbm).abs() < 10.0
                    && oui_prefix(&v.mac) != profile.oui
            });
            profile.is_spoof_candidate = candidate.is_some();
            if let Some(v) = candidate {
                if !profile.related_visible.contains(&v.mac) {
                    profile.related_visible.push(v.mac.clone());
                }
            }
        }
    }

    // -- clustering --------------------------------------------------------

    fn rebuild_clusters(&mut self) {
        self.clusters.clear();
        for profile in self.profiles.values_mut() {
            profile.cluster_id = None;
        }

        let mut ouis: Vec<&String> = self.oui_index.keys().collect();
        ouis.sort();
        let ouis: Vec<String> = ouis.into_iter().cloned().collect();

        let mut cluster_n = 0;
        let mut single_n = 0;
        for oui in ouis {
            let mut members: Vec<String> = self
                .oui_index
                .get(&oui)
                .map(|m| m.iter().cloned().collect())
                .unwrap_or_default();
            members.retain(|m| self.profiles.contains_key(m));
            if members.is_empty() {
                continue;
            }
            members.sort();

            let id = if members.len() >= 2 {
                cluster_n += 1;
                format!("hidden_cluster_{cluster_n}")
            } else {
                single_n += 1;
                format!("hidden_single_{single_n}")
            };

            let (kind, confidence) = self.classify_cluster(&members);
            let vendor = members
                .first()
                .and_then(|m| self.profiles.get(m))
                .map(|p| p.vendor.name.clone())
                .unwrap_or_default();

            for mac in &members {
                if let Some(profile) = self.profiles.get_mut(mac) {
                    profile.cluster_id = Some(id.clone());
                }
            }

            self.clusters.push(HiddenCluster {
                id,
                oui,
                vendor,
                members,
                kind,
                confidence,
            });
        }
    }

    fn classify_cluster(&self, members: &[String]) -> (HiddenClusterKind, f64) {
        let profiles: Vec<&HiddenNetworkProfile> = members
            .iter()
            .filter_map(|m| self.profiles.get(m))
            .collect();
        if profiles.is_empty() {
            return (HiddenClusterKind::Unknown, 40.0);
        }

        let all_mesh = profiles.iter().all(|p| {
            matches!(
                p.classification,
                HiddenClass::MeshNode | HiddenClass::ExtenderRepeater
            )
        });
        if all_mesh {
            return (HiddenClusterKind::MeshCluster, 85.0);
        }
        let all_enterprise = profiles
            .iter()
            .all(|p| p.classification == HiddenClass::EnterpriseAp);
        if all_enterprise {
            return (HiddenClusterKind::EnterpriseCluster, 80.0);
        }
        if profiles.iter().any(|p| p.is_rogue_candidate) {
            return (HiddenClusterKind::SuspiciousGroup, 70.0);
        }
        let vendor_names: HashSet<&str> =
            profiles.iter().map(|p| p.vendor.name.as_str()).collect();
        if vendor_names.len() > 1 {
            return (HiddenClusterKind::MixedVendor, 50.0);
        }
        (HiddenClusterKind::Unknown, 40.0)
    }
}

/// Degenerate MAC byte patterns (sequential or repeated device bytes) that
/// suggest a synthetic address.
fn has_degenerate_pattern(mac: &str) -> bool {
    let bytes: Vec<u8> = mac
        .split([':', '-'])
        .filter_map(|o| u8::from_str_radix(o, 16).ok())
        .collect();
    if bytes.len() != 6 {
        return false;
    }
    let device = &bytes[3..];
    if device.iter().all(|b| *b == device[0]) {
        return true;
    }
    let sequential = bytes
        .windows(2)
        .all(|w| w[1] == w[0].wrapping_add(1));
    sequential
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vendor::StaticOuiTable;
    use std::sync::Arc;

    fn classifier() -> HiddenNetworkClassifier {
        HiddenNetworkClassifier::new(Arc::new(StaticOuiTable::new()))
    }

    fn record(
        c: &mut HiddenNetworkClassifier,
        mac: &str,
        channel: u16,
        rssi: f64,
        security: &str,
    ) {
        c.record(
            mac,
            channel,
            Band::from_channel(channel),
            rssi,
            security,
            Utc::now(),
        );
    }

    #[test]
    fn mesh_oui_pair_forms_mesh_cluster() {
        let mut c = classifier();
        record(&mut c, "E4:F0:42:00:00:01", 1, -60.0, "WPA2");
        record(&mut c, "E4:F0:42:00:00:02", 6, -62.0, "WPA2");
        c.analyze(&[]);

        for mac in ["E4:F0:42:00:00:01", "E4:F0:42:00:00:02"] {
            let p = c.profile(mac).unwrap();
            assert_eq!(p.classification, HiddenClass::MeshNode);
            assert_eq!(p.classification_confidence, 80.0);
        }
        let clusters = c.clusters();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].kind, HiddenClusterKind::MeshCluster);
        assert_eq!(clusters[0].members.len(), 2);
    }

    #[test]
    fn single_mesh_oui_is_extender() {
        let mut c = classifier();
        record(&mut c, "E4:F0:42:00:00:03", 6, -60.0, "WPA2");
        c.analyze(&[]);
        let p = c.profile("E4:F0:42:00:00:03").unwrap();
        assert_eq!(p.classification, HiddenClass::ExtenderRepeater);
    }

    #[test]
    fn enterprise_oui_wins_over_mesh_rules() {
        let mut c = classifier();
        record(&mut c, "00:18:0A:00:00:04", 116, -65.0, "WPA2-Enterprise");
        c.analyze(&[]);
        let p = c.profile("00:18:0A:00:00:04").unwrap();
        assert_eq!(p.classification, HiddenClass::EnterpriseAp);
        assert_eq!(p.classification_confidence, 75.0);
    }

    #[test]
    fn strong_open_unknown_is_rogue() {
        let mut c = classifier();
        // -30 dBm equivalent, open security, unknown OUI
        record(&mut c, "DE:AD:BE:00:00:05", 6, -30.0, "Open");
        c.analyze(&[]);
        let p = c.profile("DE:AD:BE:00:00:05").unwrap();
        assert!(p.rogue_likelihood > 50.0, "score was {}", p.rogue_likelihood);
        assert!(p.is_rogue_candidate);
        assert_eq!(p.classification, HiddenClass::RogueSuspect);
    }

    #[test]
    fn backhaul_channel_pair_classified() {
        let mut c = classifier();
        // Unknown OUIs, weak signal so the rogue override stays quiet
        record(&mut c, "11:22:33:00:00:06", 149, -70.0, "WPA2");
        record(&mut c, "11:22:33:00:00:07", 149, -72.0, "WPA2");
        c.analyze(&[]);
        let p = c.profile("11:22:33:00:00:06").unwrap();
        assert_eq!(p.classification, HiddenClass::BackhaulLink);
    }

    #[test]
    fn iot_oui_classified() {
        let mut c = classifier();
        record(&mut c, "B4:E6:2D:00:00:08", 6, -70.0, "WPA2");
        c.analyze(&[]);
        let p = c.profile("B4:E6:2D:00:00:08").unwrap();
        assert_eq!(p.classification, HiddenClass::IotDevice);
    }

    #[test]
    fn correlates_with_visible_same_oui() {
        let mut c = classifier();
        record(&mut c, "AA:BB:CC:00:00:09", 8, -72.0, "WPA2");
        let visible = vec![VisibleNetwork {
            mac: "AA:BB:CC:00:00:FF".to_string(),
            ssid: "MainNet".to_string(),
            channel: 6,
            rssi_dbm: -55.0,
            // same OUI, channel within 4
        }];
        c.analyze(&visible);
        let p = c.profile("AA:BB:CC:00:00:09").unwrap();
        assert_eq!(p.classification, HiddenClass::GuestIsolated);
        assert_eq!(p.related_visible, vec!["AA:BB:CC:00:00:FF".to_string()]);
    }

    #[test]
    fn spoof_candidate_against_visible() {
        let mut c = classifier();
        record(&mut c, "DE:AD:00:00:00:0A", 6, -58.0, "Open");
        let visible = vec![VisibleNetwork {
            mac: "AA:BB:CC:00:00:FE".to_string(),
            ssid: "CoffeeShop".to_string(),
            channel: 6,
            rssi_dbm: -55.0,
        }];
        c.analyze(&visible);
        let p = c.profile("DE:AD:00:00:00:0A").unwrap();
        assert!(p.is_spoof_candidate);
    }

    #[test]
    fn rssi_outlier_flagged() {
        let mut c = classifier();
        record(&mut c, "10:10:10:00:00:01", 1, -70.0, "WPA2");
        record(&mut c, "20:20:20:00:00:02", 1, -71.0, "WPA2");
        record(&mut c, "30:30:30:00:00:03", 6, -69.0, "WPA2");
        record(&mut c, "40:40:40:00:00:04", 6, -70.0, "WPA2");
        record(&mut c, "50:50:50:00:00:05", 11, -70.0, "WPA2");
        record(&mut c, "60:60:60:00:00:06", 11, -20.0, "WPA2");
        c.analyze(&[]);
        let p = c.profile("60:60:60:00:00:06").unwrap();
        assert!(p.is_outlier);
        let p = c.profile("30:30:30:00:00:03").unwrap();
        assert!(!p.is_outlier);
    }

    #[test]
    fn summary_counts_align() {
        let mut c = classifier();
        record(&mut c, "E4:F0:42:00:00:01", 1, -60.0, "WPA2");
        record(&mut c, "E4:F0:42:00:00:02", 6, -62.0, "WPA2");
        record(&mut c, "DE:AD:BE:00:00:05", 6, -30.0, "Open");
        c.analyze(&[]);
        let summary = c.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.mesh, 2);
        assert!(summary.rogue_candidates >= 1);
        assert_eq!(summary.clusters, 2);
    }

    #[test]
    fn clear_resets() {
        let mut c = classifier();
        record(&mut c, "E4:F0:42:00:00:01", 1, -60.0, "WPA2");
        c.analyze(&[]);
        c.clear();
        assert_eq!(c.summary().total, 0);
        assert!(c.clusters().is_empty());
    }

    #[test]
    fn degenerate_mac_patterns() {
        assert!(has_degenerate_pattern("AA:BB:CC:11:11:11"));
        assert!(has_degenerate_pattern("00:01:02:03:04:05"));
        assert!(!has_degenerate_pattern("AC:9E:17:45:A1:0C"));
    }
}
