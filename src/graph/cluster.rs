//! World-graph clusters.

use serde::{Deserialize, Serialize};

use crate::stats;

/// Cluster classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterKind {
    /// One SSID, one vendor, at least two distinct channels.
    Mesh,
    /// Two or more MACs sharing one SSID without mesh evidence.
    SsidGroup,
}

impl ClusterKind {
    /// Label for exports.
    pub fn label(self) -> &'static str {
        match self {
            ClusterKind::Mesh => "mesh",
            ClusterKind::SsidGroup => "ssid_group",
        }
    }
}

/// A group of nodes rebuilt on every clustering pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphCluster {
    /// Deterministic id (`mesh_{ssid}_{vendor}` or `ssid_{ssid}`).
    pub id: String,
    /// Cluster classification.
    pub kind: ClusterKind,
    /// Shared SSID.
    pub ssid: String,
    /// Predominant vendor.
    pub vendor: String,
    /// Member MACs (node ids).
    pub members: Vec<String>,
    /// Cohesion score: max(0, 100 - variance of member RSSI).
    pub cohesion: f64,
    /// Mean member RSSI (dBm).
    pub avg_signal_dbm: f64,
    /// Distinct channels occupied by members.
    pub channels: Vec<u16>,
}

impl GraphCluster {
    /// Build a cluster from its members' signal readings.
    pub fn new(
        id: String,
        kind: ClusterKind,
        ssid: String,
        vendor: String,
        members: Vec<String>,
        member_rssi: &[f64],
        mut channels: Vec<u16>,
    ) -> Self {
        channels.sort_unstable();
        channels.dedup();
        let cohesion = (100.0 - stats::variance(member_rssi)).max(0.0);
        Self {
            id,
            kind,
            ssid,
            vendor,
            members,
            cohesion,
            avg_signal_dbm: stats::mean(member_rssi),
            channels,
        }
    }

    /// Number of member nodes.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cohesion_penalizes_spread() {
        let tight = GraphCluster::new(
            "mesh_Net_eero".into(),
            ClusterKind::Mesh,
            "Net".into(),
            "eero".into(),
            vec!["A".into(), "B".into()],
            &[-60.0, -62.0],
            vec![1, 6],
        );
        let loose = GraphCluster::new(
            "ssid_Net".into(),
            ClusterKind::SsidGroup,
            "Net".into(),
            String::new(),
            vec!["A".into(), "B".into()],
            &[-40.0, -80.0],
            vec![6, 6],
        );
        assert!(tight.cohesion > loose.cohesion);
        assert_eq!(loose.cohesion, 0.0); // variance 400 floors at 0
        assert_eq!(loose.channels, vec![6]);
    }
}
