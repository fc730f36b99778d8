//! World-graph edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relationship type between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Both nodes broadcast the same SSID.
    SameSsid,
    /// Both nodes resolve to the same vendor.
    SameVendor,
    /// Both nodes occupy the same channel.
    Interference,
    /// Presence intervals overlap above the co-presence threshold.
    CoPresence,
}

impl EdgeKind {
    /// Stable identifier fragment used in edge ids.
    pub fn id_fragment(self) -> &'static str {
        match self {
            EdgeKind::SameSsid => "same_ssid",
            EdgeKind::SameVendor => "same_vendor",
            EdgeKind::Interference => "interference",
            EdgeKind::CoPresence => "co_presence",
        }
    }
}

/// A relationship between two nodes, identified by a deterministic id.
///
/// Endpoints are MAC strings (id references into the node map), never
/// direct references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Deterministic id: `{a}_{b}_{kind}` with sorted endpoints.
    pub id: String,
    /// First endpoint MAC (lexicographically smaller).
    pub source: String,
    /// Second endpoint MAC.
    pub target: String,
    /// Relationship type.
    pub kind: EdgeKind,
    /// Strength, 0-1.
    pub weight: f64,
    /// Confidence, 0-100.
    pub confidence: f64,
    /// Number of passes that observed this relationship.
    pub observation_count: u64,
    /// When the relationship was first observed.
    pub first_seen: DateTime<Utc>,
    /// When the relationship was last observed.
    pub last_seen: DateTime<Utc>,
    /// Presence-overlap ratio (co-presence edges only).
    pub co_presence_ratio: f64,
}

impl GraphEdge {
    /// Deterministic edge id for a pair and kind, endpoints sorted.
    pub fn id_for(a: &str, b: &str, kind: EdgeKind) -> String {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        format!("{lo}_{hi}_{}", kind.id_fragment())
    }

    /// Create a fresh edge with a single observation.
    pub fn new(a: &str, b: &str, kind: EdgeKind, weight: f64, confidence: f64, now: DateTime<Utc>) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self {
            id: Self::id_for(a, b, kind),
            source: lo.to_string(),
            target: hi.to_string(),
            kind,
            weight: weight.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 100.0),
            observation_count: 1,
            first_seen: now,
            last_seen: now,
            co_presence_ratio: 0.0,
        }
    }

    /// Refresh the edge on a later relationship pass.
    pub fn refresh(&mut self, weight: f64, confidence: f64, now: DateTime<Utc>) {
        self.observation_count += 1;
        self.weight = weight.clamp(0.0, 1.0);
        self.confidence = confidence.clamp(0.0, 100.0);
        self.last_seen = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_id_is_order_independent() {
        let id1 = GraphEdge::id_for("BB:00:00:00:00:02", "AA:00:00:00:00:01", EdgeKind::SameSsid);
        let id2 = GraphEdge::id_for("AA:00:00:00:00:01", "BB:00:00:00:00:02", EdgeKind::SameSsid);
        assert_eq!(id1, id2);
        assert!(id1.ends_with("same_ssid"));
    }

    #[test]
    fn weight_and_confidence_clamped() {
        let now = Utc::now();
        let mut edge = GraphEdge::new("A", "B", EdgeKind::SameVendor, 1.7, 140.0, now);
        assert_eq!(edge.weight, 1.0);
        assert_eq!(edge.confidence, 100.0);
        edge.refresh(-0.5, -10.0, now);
        assert_eq!(edge.weight, 0.0);
        assert_eq!(edge.confidence, 0.0);
        assert_eq!(edge.observation_count, 2);
    }
}
