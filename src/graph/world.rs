//! The world graph aggregate.
//!
//! Nodes, edges and clusters live in flat maps keyed by stable string ids;
//! every cross-reference is an id lookup. Per-observation work happens in
//! [`WorldGraph::update_node`]; the O(n²) passes (`compute_relationships`,
//! `compute_clusters`) are meant to run once per scan cycle.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::observation::Band;
use crate::domain::vendor::VendorInfo;
use crate::fingerprint::DeviceCategory;
use crate::graph::cluster::{ClusterKind, GraphCluster};
use crate::graph::edge::{EdgeKind, GraphEdge};
use crate::graph::node::{
    EnvironmentClass, MovementDirection, RelativeVector, TemporalPattern, WorldNode,
    MAX_CHANNEL_HISTORY, MAX_PRESENCE_INTERVALS, MAX_RSSI_HISTORY,
};
use crate::stats;
use crate::{EngineError, Result};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for the world graph.
#[derive(Debug, Clone)]
pub struct WorldGraphConfig {
    /// EMA smoothing factor for movement speed.
    pub ema_alpha: f64,
    /// Seconds without a sighting before a node is considered invisible.
    pub visibility_timeout_secs: i64,
    /// Minimum presence-overlap ratio for a co-presence edge.
    pub co_presence_threshold: f64,
    /// Per-sample dB gate for approaching/receding classification.
    pub movement_gate_db: f64,
    /// Z-score beyond which a sample is an anomaly.
    pub anomaly_z: f64,
    /// Smoothed speed beyond which movement itself is an anomaly.
    pub rapid_speed: f64,
    /// Default age for pruning inactive nodes, in seconds.
    pub prune_age_secs: i64,
}

impl Default for WorldGraphConfig {
    fn default() -> Self {
        Self {
            ema_alpha: 0.3,
            visibility_timeout_secs: 30,
            co_presence_threshold: 0.7,
            movement_gate_db: 3.0,
            anomaly_z: 2.0,
            rapid_speed: 10.0,
            prune_age_secs: 3600,
        }
    }
}

/// Per-observation input to [`WorldGraph::update_node`].
#[derive(Debug, Clone)]
pub struct NodeUpdate {
    /// Hardware address.
    pub mac: String,
    /// Network name; empty when hidden.
    pub ssid: String,
    /// Resolved vendor information.
    pub vendor: VendorInfo,
    /// Channel.
    pub channel: u16,
    /// Band.
    pub band: Band,
    /// Signal in dBm.
    pub rssi_dbm: f64,
    /// Device classification from fingerprinting.
    pub node_type: DeviceCategory,
    /// Fingerprint confidence, 0-99.
    pub fingerprint_confidence: f64,
    /// Absolute distance estimate in meters.
    pub distance_m: f64,
    /// Sighting timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Aggregate counters for exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStatistics {
    /// Tracked node count.
    pub node_count: usize,
    /// Edge count after the last relationship pass.
    pub edge_count: usize,
    /// Cluster count after the last clustering pass.
    pub cluster_count: usize,
    /// Nodes currently visible.
    pub visible_count: usize,
    /// Nodes with an empty SSID.
    pub hidden_count: usize,
    /// The Home Point MAC, if one is designated.
    pub home_point: Option<String>,
}

// ---------------------------------------------------------------------------
// WorldGraph
// ---------------------------------------------------------------------------

/// The graph-based world model.
pub struct WorldGraph {
    config: WorldGraphConfig,
    nodes: HashMap<String, WorldNode>,
    edges: HashMap<String, GraphEdge>,
    clusters: HashMap<String, GraphCluster>,
    home_point: Option<String>,
}

impl WorldGraph {
    /// Create an empty graph.
    pub fn new(config: WorldGraphConfig) -> Self {
        Self {
            config,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            clusters: HashMap::new(),
            home_point: None,
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(WorldGraphConfig::default())
    }

    // -- per-observation path ----------------------------------------------

    /// Apply one sighting to the graph.
    pub fn update_node(&mut self, update: NodeUpdate) {
        let now = update.timestamp;
        let visibility_gap = Duration::seconds(self.config.visibility_timeout_secs);

        // Environment inputs need the rest of the population, so gather them
        // before taking a mutable borrow of this node.
        let (co_channel, interference_sum) = self.environment_inputs(&update.mac, update.channel);

        let node = self
            .nodes
            .entry(update.mac.clone())
            .or_insert_with(|| WorldNode::new(&update.mac, now));

        let mut anomalies = Vec::new();

        // Spike/drop detection against lifetime statistics
        if node.lifetime_stats.count() >= 5 {
            let std = node.lifetime_stats.std_dev();
            if std > f64::EPSILON {
                let z = (update.rssi_dbm - node.lifetime_stats.mean()) / std;
                if z > self.config.anomaly_z {
                    anomalies.push(format!("signal spike (z={z:.1})"));
                } else if z < -self.config.anomaly_z {
                    anomalies.push(format!("signal drop (z={z:.1})"));
                }
            }
        }

        // Channel hop tracking
        if node.channel != 0 && node.channel != update.channel {
            if node.channel_history.len() >= MAX_CHANNEL_HISTORY {
                node.channel_history.pop_front();
            }
            node.channel_history.push_back((now, update.channel));
            let recent_hops = node
                .channel_history
                .iter()
                .filter(|(t, _)| (now - *t) <= Duration::seconds(60))
                .count();
            if recent_hops >= 2 {
                anomalies.push(format!("{recent_hops} channel changes inside a minute"));
            }
        }

        // Movement vector from the previous sample
        if let Some(&(prev_t, prev_rssi)) = node.rssi_history.back() {
            let dt = ((now - prev_t).num_milliseconds() as f64 / 1000.0).max(0.001);
            let delta = update.rssi_dbm - prev_rssi;
            let instantaneous = (delta / dt).abs() * 2.0;
            let alpha = self.config.ema_alpha;
            node.movement.speed = alpha * instantaneous + (1.0 - alpha) * node.movement.speed;
            node.movement.direction = if delta > self.config.movement_gate_db {
                MovementDirection::Approaching
            } else if delta < -self.config.movement_gate_db {
                MovementDirection::Receding
            } else {
                MovementDirection::Holding
            };
            if node.movement.speed > self.config.rapid_speed {
                anomalies.push(format!("rapid movement (speed {:.1})", node.movement.speed));
            }
        }

        // History bookkeeping
        if node.rssi_history.len() >= MAX_RSSI_HISTORY {
            node.rssi_history.pop_front();
        }
        node.rssi_history.push_back((now, update.rssi_dbm));
        node.lifetime_stats.push(update.rssi_dbm);

        // Presence intervals, coalesced across short gaps
        match node.presence_intervals.back_mut() {
            Some((_, end)) if now - *end <= visibility_gap => *end = now,
            _ => {
                if node.presence_intervals.len() >= MAX_PRESENCE_INTERVALS {
                    node.presence_intervals.pop_front();
                }
                node.presence_intervals.push_back((now, now));
            }
        }

        // Identity and latest-value fields
        if !update.ssid.trim().is_empty() {
            node.ssid = update.ssid.clone();
        }
        node.vendor = update.vendor.name.clone();
        node.vendor_category = update.vendor.category;
        if update.node_type != DeviceCategory::Unknown || node.node_type == DeviceCategory::Unknown
        {
            node.node_type = update.node_type;
        }
        node.fingerprint_confidence = update.fingerprint_confidence;
        node.channel = update.channel;
        node.band = update.band;
        node.rssi_dbm = update.rssi_dbm;
        node.distance_m = update.distance_m;
        node.last_seen = now;
        node.is_visible = true;

        // Derived signatures
        let values = node.rssi_values();
        let recent = &values[values.len().saturating_sub(5)..];
        node.movement.predicted_rssi = update.rssi_dbm + stats::slope(recent);
        node.movement.confidence = ((values.len() as f64) * 10.0).min(90.0);

        node.temporal = temporal_signature(node, now);
        node.environment = environment_context(
            co_channel,
            interference_sum,
            update.distance_m,
            update.rssi_dbm,
        );
        node.confidence_score = confidence_score(node, now);
        node.anomalies = anomalies;

        if node.lifetime_stats.count() == 1 {
            debug!(mac = %update.mac, "new world node");
        }

        self.refresh_home_relative_for(&update.mac);
    }

    // -- batch passes ------------------------------------------------------

    /// Rebuild relationship edges. Run once per scan cycle.
    pub fn compute_relationships(&mut self, now: DateTime<Utc>) {
        let macs: Vec<String> = self.nodes.keys().cloned().collect();
        let mut fresh: HashMap<String, GraphEdge> = HashMap::new();

        for i in 0..macs.len() {
            for j in (i + 1)..macs.len() {
                let (a, b) = (&macs[i], &macs[j]);
                let (Some(na), Some(nb)) = (self.nodes.get(a), self.nodes.get(b)) else {
                    continue;
                };

                if !na.ssid.is_empty() && na.ssid == nb.ssid {
                    self.upsert_edge(&mut fresh, a, b, EdgeKind::SameSsid, None, now);
                }
                if na.vendor != "Unknown" && !na.vendor.is_empty() && na.vendor == nb.vendor {
                    self.upsert_edge(&mut fresh, a, b, EdgeKind::SameVendor, None, now);
                }
                if na.channel != 0 && na.channel == nb.channel {
                    self.upsert_edge(&mut fresh, a, b, EdgeKind::Interference, None, now);
                }
                let ratio = presence_overlap_ratio(na, nb);
                if ratio >= self.config.co_presence_threshold {
                    self.upsert_edge(&mut fresh, a, b, EdgeKind::CoPresence, Some(ratio), now);
                }
            }
        }

        debug!(edges = fresh.len(), "relationship pass complete");
        self.edges = fresh;
    }

    fn upsert_edge(
        &self,
        fresh: &mut HashMap<String, GraphEdge>,
        a: &str,
        b: &str,
        kind: EdgeKind,
        co_presence_ratio: Option<f64>,
        now: DateTime<Utc>,
    ) {
        let id = GraphEdge::id_for(a, b, kind);
        let mut edge = match self.edges.get(&id) {
            Some(existing) => existing.clone(),
            None => {
                let mut e = GraphEdge::new(a, b, kind, 0.0, 0.0, now);
                e.observation_count = 0;
                e
            }
        };
        let count = (edge.observation_count + 1) as f64;
        let (weight, confidence) = match kind {
            EdgeKind::SameSsid => ((count / 10.0).min(1.0), (count * 10.0).min(100.0)),
            EdgeKind::SameVendor => (0.5, 50.0),
            EdgeKind::Interference => (0.4, 40.0),
            EdgeKind::CoPresence => {
                let ratio = co_presence_ratio.unwrap_or(0.0);
                (ratio, ratio * 100.0)
            }
        };
        edge.refresh(weight, confidence, now);
        if kind == EdgeKind::CoPresence {
            edge.co_presence_ratio = co_presence_ratio.unwrap_or(0.0);
        }
        fresh.insert(id, edge);
    }

    /// Full cluster rebuild. Run once per scan cycle, after the
    /// relationship pass.
    pub fn compute_clusters(&mut self) {
        self.clusters.clear();
        for node in self.nodes.values_mut() {
            node.cluster_id = None;
        }

        let mut by_ssid: HashMap<String, Vec<String>> = HashMap::new();
        for (mac, node) in &self.nodes {
            if !node.ssid.trim().is_empty() {
                by_ssid.entry(node.ssid.clone()).or_default().push(mac.clone());
            }
        }

        for (ssid, mut members) in by_ssid {
            if members.len() < 2 {
                continue;
            }
            members.sort();

            let mut vendors: HashSet<String> = HashSet::new();
            let mut channels: Vec<u16> = Vec::new();
            let mut rssi: Vec<f64> = Vec::new();
            for mac in &members {
                if let Some(node) = self.nodes.get(mac) {
                    if !node.vendor.is_empty() && node.vendor != "Unknown" {
                        vendors.insert(node.vendor.clone());
                    }
                    channels.push(node.channel);
                    rssi.push(node.rssi_dbm);
                }
            }
            let distinct_channels: HashSet<u16> = channels.iter().copied().collect();

            let is_mesh = vendors.len() == 1 && distinct_channels.len() >= 2;
            let cluster = if is_mesh {
                let vendor = vendors.iter().next().cloned().unwrap_or_default();
                let id = format!("mesh_{ssid}_{vendor}");
                for mac in &members {
                    if let Some(node) = self.nodes.get_mut(mac) {
                        node.node_type = DeviceCategory::MeshNode;
                        node.cluster_id = Some(id.clone());
                    }
                }
                GraphCluster::new(id, ClusterKind::Mesh, ssid, vendor, members, &rssi, channels)
            } else {
                let id = format!("ssid_{ssid}");
                for mac in &members {
                    if let Some(node) = self.nodes.get_mut(mac) {
                        node.cluster_id = Some(id.clone());
                    }
                }
                GraphCluster::new(
                    id,
                    ClusterKind::SsidGroup,
                    ssid,
                    String::new(),
                    members,
                    &rssi,
                    channels,
                )
            };
            self.clusters.insert(cluster.id.clone(), cluster);
        }

        debug!(clusters = self.clusters.len(), "cluster pass complete");
    }

    // -- home point --------------------------------------------------------

    /// Designate a tracked device as the Home Point and recompute every
    /// node's relative vector.
    pub fn set_home_point(&mut self, mac: &str) -> Result<()> {
        if !self.nodes.contains_key(mac) {
            return Err(EngineError::UnknownDevice(mac.to_string()));
        }
        info!(mac, "home point set");
        self.home_point = Some(mac.to_string());
        self.recompute_all_relative();
        Ok(())
    }

    /// Clear the Home Point and zero all relative vectors.
    pub fn clear_home_point(&mut self) {
        self.home_point = None;
        for node in self.nodes.values_mut() {
            node.home_relative = RelativeVector::default();
        }
    }

    /// The currently designated Home Point, if any.
    pub fn home_point(&self) -> Option<&str> {
        self.home_point.as_deref()
    }

    fn recompute_all_relative(&mut self) {
        let macs: Vec<String> = self.nodes.keys().cloned().collect();
        for mac in macs {
            self.refresh_home_relative_for(&mac);
        }
    }

    fn refresh_home_relative_for(&mut self, mac: &str) {
        let Some(home_mac) = self.home_point.clone() else {
            return;
        };
        let Some(home) = self.nodes.get(&home_mac) else {
            return;
        };
        let (hx, hy) = polar_to_cartesian(home.distance_m, home.angle_deg);

        if let Some(node) = self.nodes.get_mut(mac) {
            if node.mac == home_mac {
                node.home_relative = RelativeVector::default();
                return;
            }
            let (nx, ny) = polar_to_cartesian(node.distance_m, node.angle_deg);
            let (dx, dy) = (nx - hx, ny - hy);
            let distance = (dx * dx + dy * dy).sqrt();
            let angle = dy.atan2(dx).to_degrees().rem_euclid(360.0);
            node.home_relative = RelativeVector {
                distance_m: distance,
                angle_deg: angle,
                x: dx,
                y: dy,
            };
        }
    }

    // -- maintenance -------------------------------------------------------

    /// Mark nodes invisible when their last sighting is older than the
    /// visibility timeout.
    pub fn update_visibility(&mut self, now: DateTime<Utc>) {
        let timeout = Duration::seconds(self.config.visibility_timeout_secs);
        for node in self.nodes.values_mut() {
            node.is_visible = now - node.last_seen <= timeout;
        }
    }

    /// Drop nodes not seen for `max_age_secs` (and their edges). Returns the
    /// number of nodes removed.
    pub fn prune_older_than(&mut self, max_age_secs: i64, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::seconds(max_age_secs);
        let stale: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.last_seen < cutoff)
            .map(|(mac, _)| mac.clone())
            .collect();
        for mac in &stale {
            self.nodes.remove(mac);
            if self.home_point.as_deref() == Some(mac.as_str()) {
                self.clear_home_point();
            }
        }
        self.edges
            .retain(|_, e| self.nodes.contains_key(&e.source) && self.nodes.contains_key(&e.target));
        if !stale.is_empty() {
            info!(pruned = stale.len(), "pruned inactive nodes");
        }
        stale.len()
    }

    /// Full reset.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.clusters.clear();
        self.home_point = None;
    }

    // -- accessors ---------------------------------------------------------

    /// Look up a node by MAC.
    pub fn node(&self, mac: &str) -> Option<&WorldNode> {
        self.nodes.get(mac)
    }

    /// Iterate all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &WorldNode> {
        self.nodes.values()
    }

    /// Iterate all edges.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    /// Iterate all clusters.
    pub fn clusters(&self) -> impl Iterator<Item = &GraphCluster> {
        self.clusters.values()
    }

    /// Aggregate counters.
    pub fn statistics(&self) -> GraphStatistics {
        GraphStatistics {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            cluster_count: self.clusters.len(),
            visible_count: self.nodes.values().filter(|n| n.is_visible).count(),
            hidden_count: self
                .nodes
                .values()
                .filter(|n| n.ssid.trim().is_empty())
                .count(),
            home_point: self.home_point.clone(),
        }
    }

    fn environment_inputs(&self, mac: &str, channel: u16) -> (usize, f64) {
        let mut co_channel = 0;
        let mut interference_sum = 0.0;
        for (other_mac, other) in &self.nodes {
            if other_mac == mac {
                continue;
            }
            if other.channel == channel {
                co_channel += 1;
            }
            if other.channel.abs_diff(channel) <= 2 {
                interference_sum += ((other.rssi_dbm + 100.0) / 50.0).max(0.0);
            }
        }
        (co_channel, interference_sum)
    }
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

fn polar_to_cartesian(distance: f64, angle_deg: f64) -> (f64, f64) {
    let rad = angle_deg.to_radians();
    (distance * rad.cos(), distance * rad.sin())
}

fn temporal_signature(node: &WorldNode, now: DateTime<Utc>) -> crate::graph::node::TemporalSignature {
    let values = node.rssi_values();
    let n = values.len();
    let variance = stats::variance(&values);
    let recent = &values[n.saturating_sub(5)..];
    let derivative = stats::slope(recent);
    let sessions = node.presence_intervals.len();

    let lifetime = node.lifetime_seconds(now);
    let presence_ratio = if lifetime > 0.0 {
        (node.presence_seconds() / lifetime).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let pattern = if n < 5 {
        TemporalPattern::Unknown
    } else if presence_ratio > 0.9 && variance < 20.0 {
        TemporalPattern::AlwaysOn
    } else if variance < 10.0 && derivative.abs() < 1.0 {
        TemporalPattern::Stationary
    } else if variance > 50.0 || derivative.abs() > 3.0 {
        TemporalPattern::Mobile
    } else if presence_ratio < 0.3 && sessions <= 2 {
        TemporalPattern::Transient
    } else if presence_ratio < 0.6 && sessions > 3 {
        TemporalPattern::Sporadic
    } else if sessions >= 3 && presence_ratio > 0.4 {
        TemporalPattern::Periodic
    } else {
        TemporalPattern::Unknown
    };

    let mut confidence = ((n as f64) * 2.0).min(80.0);
    if pattern != TemporalPattern::Unknown {
        confidence = (confidence + 15.0).min(95.0);
    }

    crate::graph::node::TemporalSignature {
        pattern,
        confidence,
        presence_ratio,
        variance,
        derivative,
        sessions,
    }
}

fn environment_context(
    co_channel: usize,
    interference_sum: f64,
    distance_m: f64,
    rssi_dbm: f64,
) -> crate::graph::node::EnvironmentContext {
    let congestion = if co_channel <= 2 {
        0.0
    } else if co_channel <= 5 {
        25.0 + (co_channel as f64 - 2.0) * 10.0
    } else if co_channel <= 10 {
        55.0 + (co_channel as f64 - 5.0) * 5.0
    } else {
        100.0
    }
    .min(100.0);

    let interference = (interference_sum * 10.0).min(100.0);

    // Expected RSSI under a plain log-distance model (TX 20 dBm, n = 3):
    // anything much below it is attributed to walls at ~3 dB each.
    let d = distance_m.max(0.5);
    let expected = 20.0 - 40.0 - 30.0 * d.log10();
    let attenuation = (expected - rssi_dbm).max(0.0);
    let walls = attenuation / 3.0;
    let wall_density = (walls * 20.0).min(100.0);

    let classification = if interference > 70.0 && congestion > 70.0 {
        EnvironmentClass::Stormy
    } else if congestion > 50.0 {
        EnvironmentClass::Congested
    } else if wall_density > 60.0 {
        EnvironmentClass::Shielded
    } else if congestion < 20.0 && interference < 20.0 {
        EnvironmentClass::Quiet
    } else {
        EnvironmentClass::Normal
    };

    crate::graph::node::EnvironmentContext {
        congestion,
        interference,
        wall_density,
        classification,
    }
}

fn confidence_score(node: &WorldNode, now: DateTime<Utc>) -> f64 {
    let samples = ((node.lifetime_stats.count() as f64) * 2.0).min(100.0);
    let consistency = (100.0 - node.lifetime_stats.variance() * 2.0).max(0.0);
    let age_secs = (now - node.last_seen).num_seconds();
    let recency = if age_secs < 60 {
        100.0
    } else if age_secs < 300 {
        80.0
    } else if age_secs < 900 {
        50.0
    } else {
        20.0
    };
    let fingerprint = node.fingerprint_confidence.clamp(0.0, 100.0);
    (samples + consistency + recency + fingerprint) / 4.0
}

fn presence_overlap_ratio(a: &WorldNode, b: &WorldNode) -> f64 {
    let total_a = a.presence_seconds();
    let total_b = b.presence_seconds();
    let shorter = total_a.min(total_b);
    if shorter <= 0.0 {
        return 0.0;
    }
    let mut overlap = 0.0;
    for (sa, ea) in &a.presence_intervals {
        for (sb, eb) in &b.presence_intervals {
            let start = (*sa).max(*sb);
            let end = (*ea).min(*eb);
            if end > start {
                overlap += (end - start).num_milliseconds() as f64 / 1000.0;
            }
        }
    }
    (overlap / shorter).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vendor::{VendorCategory, VendorInfo};
    use chrono::TimeZone;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn vendor(name: &str) -> VendorInfo {
        VendorInfo {
            name: name.to_string(),
            prefix: "AA:BB:CC".to_string(),
            confidence: 100.0,
            is_known: !name.is_empty() && name != "Unknown",
            is_locally_administered: false,
            category: VendorCategory::Consumer,
        }
    }

    fn update(mac: &str, ssid: &str, rssi: f64, channel: u16, t: DateTime<Utc>) -> NodeUpdate {
        NodeUpdate {
            mac: mac.to_string(),
            ssid: ssid.to_string(),
            vendor: vendor("Acme"),
            channel,
            band: Band::from_channel(channel),
            rssi_dbm: rssi,
            node_type: DeviceCategory::Router,
            fingerprint_confidence: 75.0,
            distance_m: 5.0,
            timestamp: t,
        }
    }

    fn feed(graph: &mut WorldGraph, mac: &str, ssid: &str, rssi: f64, channel: u16, n: usize) {
        let mut t = base_time();
        for _ in 0..n {
            graph.update_node(update(mac, ssid, rssi, channel, t));
            t += Duration::seconds(5);
        }
    }

    #[test]
    fn update_creates_and_tracks_node() {
        let mut graph = WorldGraph::with_defaults();
        feed(&mut graph, "AA:00:00:00:00:01", "Net", -60.0, 6, 3);
        let node = graph.node("AA:00:00:00:00:01").unwrap();
        assert_eq!(node.rssi_history.len(), 3);
        assert_eq!(node.presence_intervals.len(), 1);
        assert!(node.is_visible);
    }

    #[test]
    fn steady_node_classified_stationary_or_always_on() {
        let mut graph = WorldGraph::with_defaults();
        feed(&mut graph, "AA:00:00:00:00:02", "Net", -60.0, 6, 12);
        let node = graph.node("AA:00:00:00:00:02").unwrap();
        assert!(matches!(
            node.temporal.pattern,
            TemporalPattern::AlwaysOn | TemporalPattern::Stationary
        ));
        assert!(node.temporal.confidence > 0.0);
    }

    #[test]
    fn swinging_signal_is_mobile() {
        let mut graph = WorldGraph::with_defaults();
        let mut t = base_time();
        for i in 0..12 {
            let rssi = if i % 2 == 0 { -40.0 } else { -75.0 };
            graph.update_node(update("AA:00:00:00:00:03", "Net", rssi, 6, t));
            t += Duration::seconds(5);
        }
        let node = graph.node("AA:00:00:00:00:03").unwrap();
        assert_eq!(node.temporal.pattern, TemporalPattern::Mobile);
        assert!(node.movement.speed > 0.0);
    }

    #[test]
    fn rising_signal_is_approaching() {
        let mut graph = WorldGraph::with_defaults();
        let mut t = base_time();
        for i in 0..6 {
            graph.update_node(update(
                "AA:00:00:00:00:04",
                "Net",
                -80.0 + (i as f64) * 6.0,
                6,
                t,
            ));
            t += Duration::seconds(5);
        }
        let node = graph.node("AA:00:00:00:00:04").unwrap();
        assert_eq!(node.movement.direction, MovementDirection::Approaching);
        assert!(node.movement.predicted_rssi > node.rssi_dbm);
    }

    #[test]
    fn same_ssid_edge_built() {
        let mut graph = WorldGraph::with_defaults();
        feed(&mut graph, "AA:00:00:00:00:05", "Shared", -60.0, 1, 3);
        feed(&mut graph, "BB:00:00:00:00:06", "Shared", -65.0, 11, 3);
        graph.compute_relationships(base_time());
        let has_ssid_edge = graph
            .edges()
            .any(|e| e.kind == EdgeKind::SameSsid && e.weight > 0.0);
        assert!(has_ssid_edge);
    }

    #[test]
    fn edge_weight_grows_with_passes() {
        let mut graph = WorldGraph::with_defaults();
        feed(&mut graph, "AA:00:00:00:00:07", "Shared", -60.0, 1, 3);
        feed(&mut graph, "BB:00:00:00:00:08", "Shared", -65.0, 11, 3);
        let mut t = base_time();
        let mut weights = Vec::new();
        for _ in 0..3 {
            graph.compute_relationships(t);
            let edge = graph
                .edges()
                .find(|e| e.kind == EdgeKind::SameSsid)
                .unwrap()
                .clone();
            weights.push(edge.weight);
            t += Duration::seconds(10);
        }
        assert!(weights[0] < weights[1] && weights[1] < weights[2]);
        assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
        let edge = graph
            .edges()
            .find(|e| e.kind == EdgeKind::SameSsid)
            .unwrap();
        assert_eq!(edge.observation_count, 3);
    }

    #[test]
    fn co_presence_edge_for_overlapping_nodes() {
        let mut graph = WorldGraph::with_defaults();
        let mut t = base_time();
        for _ in 0..10 {
            graph.update_node(update("AA:00:00:00:00:09", "A", -60.0, 1, t));
            graph.update_node(update("BB:00:00:00:00:0A", "B", -62.0, 11, t));
            t += Duration::seconds(5);
        }
        graph.compute_relationships(t);
        let edge = graph.edges().find(|e| e.kind == EdgeKind::CoPresence);
        assert!(edge.is_some());
        let edge = edge.unwrap();
        assert!(edge.co_presence_ratio >= 0.7);
        assert!((edge.weight - edge.co_presence_ratio).abs() < 1e-9);
    }

    #[test]
    fn mesh_cluster_requires_two_channels() {
        let mut graph = WorldGraph::with_defaults();
        feed(&mut graph, "AA:00:00:00:00:0B", "MeshNet", -60.0, 1, 3);
        feed(&mut graph, "BB:00:00:00:00:0C", "MeshNet", -62.0, 6, 3);
        graph.compute_clusters();
        let cluster = graph.clusters().next().unwrap();
        assert_eq!(cluster.kind, ClusterKind::Mesh);
        assert_eq!(cluster.len(), 2);
        assert_eq!(
            graph.node("AA:00:00:00:00:0B").unwrap().node_type,
            DeviceCategory::MeshNode
        );
    }

    #[test]
    fn single_channel_group_is_not_mesh() {
        let mut graph = WorldGraph::with_defaults();
        feed(&mut graph, "AA:00:00:00:00:0D", "FlatNet", -60.0, 6, 3);
        feed(&mut graph, "BB:00:00:00:00:0E", "FlatNet", -62.0, 6, 3);
        graph.compute_clusters();
        let cluster = graph.clusters().next().unwrap();
        assert_eq!(cluster.kind, ClusterKind::SsidGroup);
    }

    #[test]
    fn home_point_relative_vectors() {
        let mut graph = WorldGraph::with_defaults();
        feed(&mut graph, "AA:00:00:00:00:0F", "Home", -50.0, 6, 3);
        feed(&mut graph, "BB:00:00:00:00:10", "Other", -70.0, 11, 3);

        graph.set_home_point("AA:00:00:00:00:0F").unwrap();
        let home = graph.node("AA:00:00:00:00:0F").unwrap();
        assert_eq!(home.home_relative.distance_m, 0.0);
        let other = graph.node("BB:00:00:00:00:10").unwrap();
        assert!(other.home_relative.distance_m > 0.0);

        graph.clear_home_point();
        let other = graph.node("BB:00:00:00:00:10").unwrap();
        assert_eq!(other.home_relative.distance_m, 0.0);
        assert_eq!(other.home_relative.angle_deg, 0.0);
    }

    #[test]
    fn set_home_point_rejects_unknown_mac() {
        let mut graph = WorldGraph::with_defaults();
        assert!(graph.set_home_point("FF:FF:FF:FF:FF:FF").is_err());
    }

    #[test]
    fn visibility_times_out() {
        let mut graph = WorldGraph::with_defaults();
        feed(&mut graph, "AA:00:00:00:00:11", "Net", -60.0, 6, 2);
        graph.update_visibility(base_time() + Duration::seconds(120));
        assert!(!graph.node("AA:00:00:00:00:11").unwrap().is_visible);
    }

    #[test]
    fn prune_removes_stale_nodes_and_edges() {
        let mut graph = WorldGraph::with_defaults();
        feed(&mut graph, "AA:00:00:00:00:12", "Shared", -60.0, 1, 2);
        feed(&mut graph, "BB:00:00:00:00:13", "Shared", -62.0, 6, 2);
        graph.compute_relationships(base_time());
        assert!(graph.statistics().edge_count > 0);

        let removed = graph.prune_older_than(3600, base_time() + Duration::seconds(7200));
        assert_eq!(removed, 2);
        assert_eq!(graph.statistics().node_count, 0);
        assert_eq!(graph.statistics().edge_count, 0);
    }

    #[test]
    fn clear_zeroes_counts() {
        let mut graph = WorldGraph::with_defaults();
        feed(&mut graph, "AA:00:00:00:00:14", "Net", -60.0, 6, 3);
        graph.compute_relationships(base_time());
        graph.compute_clusters();
        graph.clear();
        let stats = graph.statistics();
        assert_eq!(stats.node_count, 0);
        assert_eq!(stats.edge_count, 0);
        assert_eq!(stats.cluster_count, 0);
    }

    #[test]
    fn congestion_grows_with_co_channel_nodes() {
        let mut graph = WorldGraph::with_defaults();
        for i in 0..6 {
            feed(&mut graph, &format!("AA:00:00:00:00:2{i}"), "N", -60.0, 6, 1);
        }
        // Re-observe the first node so its environment sees the other five
        graph.update_node(update(
            "AA:00:00:00:00:20",
            "N",
            -60.0,
            6,
            base_time() + Duration::seconds(10),
        ));
        let node = graph.node("AA:00:00:00:00:20").unwrap();
        assert!(node.environment.congestion >= 55.0);
        assert!(node.environment.interference > 0.0);
    }
}
