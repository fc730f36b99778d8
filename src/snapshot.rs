//! Export types: radar vectors and full engine snapshots.
//!
//! A radar vector is the flattened, presentation-ready join of a device's
//! intelligence record and its world-graph node. The snapshot bundles
//! everything a consumer needs to render one frame of the radar and its
//! side panels.

use serde::{Deserialize, Serialize};

use crate::domain::alert::SpoofAlert;
use crate::fingerprint::DeviceCategory;
use crate::graph::{EnvironmentClass, GraphCluster, GraphEdge, GraphStatistics, MovementDirection, RelativeVector, WorldNode};
use crate::hidden::{HiddenCluster, HiddenNetworkProfile, HiddenSummary};
use crate::intel::NetworkIntelligence;

/// One device as a polar radar blip with its headline attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarVector {
    /// Hardware address.
    pub mac: String,
    /// Network name; empty when hidden.
    pub ssid: String,
    /// Estimated distance in meters.
    pub distance_m: f64,
    /// Display bearing in degrees.
    pub angle_deg: f64,
    /// Latest RSSI in dBm.
    pub signal_dbm: f64,
    /// Stability score, 0-100.
    pub stability_score: f64,
    /// Spoof-risk score, 0-100.
    pub spoof_risk: f64,
    /// Radial movement classification.
    pub movement_direction: MovementDirection,
    /// Device classification.
    pub node_type: DeviceCategory,
    /// Cluster membership, if any.
    pub cluster_id: Option<String>,
    /// RF environment classification around the device.
    pub environment: EnvironmentClass,
    /// Overall confidence, 0-100.
    pub confidence: f64,
    /// Whether the device is currently visible.
    pub is_visible: bool,
    /// Position relative to the Home Point, zero when none is set.
    pub home_relative: RelativeVector,
}

impl RadarVector {
    /// Join an intelligence record with its graph node.
    pub fn from_parts(intel: &NetworkIntelligence, node: &WorldNode) -> Self {
        Self {
            mac: intel.mac.clone(),
            ssid: intel.ssid.clone(),
            distance_m: node.distance_m,
            angle_deg: node.angle_deg,
            signal_dbm: intel.signal_dbm,
            stability_score: intel.stability.score,
            spoof_risk: intel.spoof_risk,
            movement_direction: node.movement.direction,
            node_type: intel.category,
            cluster_id: node.cluster_id.clone(),
            environment: node.environment.classification,
            confidence: node.confidence_score,
            is_visible: node.is_visible,
            home_relative: node.home_relative,
        }
    }
}

/// One full frame of engine state for consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Per-device intelligence records.
    pub devices: Vec<NetworkIntelligence>,
    /// Polar radar vectors, one per tracked device.
    pub radar: Vec<RadarVector>,
    /// Graph edges from the last relationship pass.
    pub edges: Vec<GraphEdge>,
    /// Graph clusters from the last clustering pass.
    pub clusters: Vec<GraphCluster>,
    /// Active spoofing alerts.
    pub alerts: Vec<SpoofAlert>,
    /// Hidden-device profiles.
    pub hidden_profiles: Vec<HiddenNetworkProfile>,
    /// Hidden-device clusters.
    pub hidden_clusters: Vec<HiddenCluster>,
    /// Hidden-device summary counts.
    pub hidden_summary: HiddenSummary,
    /// Graph-wide counters.
    pub statistics: GraphStatistics,
    /// The Home Point MAC, if one is set.
    pub home_point: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn radar_vector_joins_record_and_node() {
        let now = Utc::now();
        let obs = crate::domain::observation::Observation {
            mac: "AA:BB:CC:00:00:01".into(),
            ssid: "HomeNet".into(),
            signal_percent: 70.0,
            channel: 6,
            security: "WPA2".into(),
            vendor: String::new(),
            band: String::new(),
            timestamp: now,
        };
        let mut intel = NetworkIntelligence::sample_for_tests(&obs);
        intel.spoof_risk = 12.0;
        intel.stability.score = 80.0;

        let mut node = WorldNode::new("AA:BB:CC:00:00:01", now);
        node.distance_m = 4.2;
        node.confidence_score = 65.0;
        node.cluster_id = Some("ssid_HomeNet".into());

        let vector = RadarVector::from_parts(&intel, &node);
        assert_eq!(vector.mac, "AA:BB:CC:00:00:01");
        assert_eq!(vector.distance_m, 4.2);
        assert_eq!(vector.stability_score, 80.0);
        assert_eq!(vector.spoof_risk, 12.0);
        assert_eq!(vector.cluster_id.as_deref(), Some("ssid_HomeNet"));

        // Exported frames must serialize cleanly
        let json = serde_json::to_string(&vector).unwrap();
        assert!(json.contains("\"distance_m\":4.2"));
    }
}
