//! World-graph node state.
//!
//! A `WorldNode` is the graph-scoped superset of the per-device intelligence
//! record: bounded RSSI/channel histories, coalesced presence intervals, a
//! temporal signature, a movement vector, an environment context and a
//! Home-Point-relative position. Nodes reference edges and clusters only by
//! string id.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::observation::Band;
use crate::domain::vendor::VendorCategory;
use crate::fingerprint::DeviceCategory;
use crate::stats::RunningStats;

/// RSSI samples retained per node.
pub const MAX_RSSI_HISTORY: usize = 100;

/// Channel changes retained per node.
pub const MAX_CHANNEL_HISTORY: usize = 50;

/// Presence intervals retained per node.
pub const MAX_PRESENCE_INTERVALS: usize = 20;

// ---------------------------------------------------------------------------
// Temporal signature
// ---------------------------------------------------------------------------

/// Classified behavior pattern of a device over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemporalPattern {
    /// Present almost continuously with low variance.
    AlwaysOn,
    /// Low variance, no drift.
    Stationary,
    /// High variance or strong drift.
    Mobile,
    /// Short-lived appearance.
    Transient,
    /// Repeatedly appearing and disappearing.
    Sporadic,
    /// Regular on/off sessions.
    Periodic,
    /// Not enough evidence.
    Unknown,
}

impl TemporalPattern {
    /// Label for exports.
    pub fn label(self) -> &'static str {
        match self {
            TemporalPattern::AlwaysOn => "always on",
            TemporalPattern::Stationary => "stationary",
            TemporalPattern::Mobile => "mobile",
            TemporalPattern::Transient => "transient",
            TemporalPattern::Sporadic => "sporadic",
            TemporalPattern::Periodic => "periodic",
            TemporalPattern::Unknown => "unknown",
        }
    }
}

/// Temporal signature of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalSignature {
    /// Classified pattern.
    pub pattern: TemporalPattern,
    /// Classification confidence, 0-95.
    pub confidence: f64,
    /// Fraction of the node's lifetime it was present, 0-1.
    pub presence_ratio: f64,
    /// RSSI variance over the retained history.
    pub variance: f64,
    /// Recent RSSI derivative (dB per sample).
    pub derivative: f64,
    /// Number of distinct presence sessions.
    pub sessions: usize,
}

impl Default for TemporalSignature {
    fn default() -> Self {
        Self {
            pattern: TemporalPattern::Unknown,
            confidence: 0.0,
            presence_ratio: 0.0,
            variance: 0.0,
            derivative: 0.0,
            sessions: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Movement vector
// ---------------------------------------------------------------------------

/// Radial movement classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementDirection {
    /// Signal rising faster than the gate.
    Approaching,
    /// Signal falling faster than the gate.
    Receding,
    /// Within the gate.
    Holding,
}

impl MovementDirection {
    /// Label for exports.
    pub fn label(self) -> &'static str {
        match self {
            MovementDirection::Approaching => "approaching",
            MovementDirection::Receding => "receding",
            MovementDirection::Holding => "holding",
        }
    }
}

/// EMA-smoothed movement estimate for a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementVector {
    /// Smoothed speed proxy (scaled |dRSSI/dt|).
    pub speed: f64,
    /// Radial direction.
    pub direction: MovementDirection,
    /// One-step linear RSSI prediction (dBm).
    pub predicted_rssi: f64,
    /// Inference confidence, 0-100.
    pub confidence: f64,
}

impl Default for MovementVector {
    fn default() -> Self {
        Self {
            speed: 0.0,
            direction: MovementDirection::Holding,
            predicted_rssi: 0.0,
            confidence: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Environment context
// ---------------------------------------------------------------------------

/// Global environment classification for a node's surroundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentClass {
    /// Little congestion or interference.
    Quiet,
    /// Nothing stands out.
    Normal,
    /// Crowded channel space.
    Congested,
    /// High interference and congestion.
    Stormy,
    /// Heavy obstruction dominates.
    Shielded,
}

impl EnvironmentClass {
    /// Label for exports.
    pub fn label(self) -> &'static str {
        match self {
            EnvironmentClass::Quiet => "quiet",
            EnvironmentClass::Normal => "normal",
            EnvironmentClass::Congested => "congested",
            EnvironmentClass::Stormy => "stormy",
            EnvironmentClass::Shielded => "shielded",
        }
    }
}

/// RF environment scores for a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentContext {
    /// Co-channel congestion score, 0-100.
    pub congestion: f64,
    /// Adjacent-channel interference score, 0-100.
    pub interference: f64,
    /// Obstruction density score, 0-100.
    pub wall_density: f64,
    /// Combined classification.
    pub classification: EnvironmentClass,
}

impl Default for EnvironmentContext {
    fn default() -> Self {
        Self {
            congestion: 0.0,
            interference: 0.0,
            wall_density: 0.0,
            classification: EnvironmentClass::Normal,
        }
    }
}

// ---------------------------------------------------------------------------
// Relative position
// ---------------------------------------------------------------------------

/// Position relative to the Home Point, derived from polar estimates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RelativeVector {
    /// Distance from the Home Point in meters.
    pub distance_m: f64,
    /// Bearing from the Home Point in degrees.
    pub angle_deg: f64,
    /// Cartesian x component (meters).
    pub x: f64,
    /// Cartesian y component (meters).
    pub y: f64,
}

// ---------------------------------------------------------------------------
// WorldNode
// ---------------------------------------------------------------------------

/// One device in the world graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldNode {
    /// Hardware address (node id).
    pub mac: String,
    /// Network name; empty when hidden.
    pub ssid: String,
    /// Vendor name.
    pub vendor: String,
    /// Vendor category.
    pub vendor_category: VendorCategory,
    /// Device classification carried over from fingerprinting.
    pub node_type: DeviceCategory,
    /// Fingerprint confidence, 0-99.
    pub fingerprint_confidence: f64,
    /// Current channel.
    pub channel: u16,
    /// Current band.
    pub band: Band,
    /// Latest RSSI in dBm.
    pub rssi_dbm: f64,
    /// Bounded RSSI history with timestamps.
    pub rssi_history: VecDeque<(DateTime<Utc>, f64)>,
    /// Bounded channel-change history.
    pub channel_history: VecDeque<(DateTime<Utc>, u16)>,
    /// Coalesced presence intervals (start, end).
    pub presence_intervals: VecDeque<(DateTime<Utc>, DateTime<Utc>)>,
    /// Lifetime RSSI statistics.
    #[serde(skip)]
    pub lifetime_stats: RunningStats,
    /// First sighting.
    pub first_seen: DateTime<Utc>,
    /// Most recent sighting.
    pub last_seen: DateTime<Utc>,
    /// Whether the node is currently visible.
    pub is_visible: bool,
    /// Temporal signature.
    pub temporal: TemporalSignature,
    /// Movement vector.
    pub movement: MovementVector,
    /// Environment context.
    pub environment: EnvironmentContext,
    /// Overall node confidence, 0-100.
    pub confidence_score: f64,
    /// Cluster membership by id, if any.
    pub cluster_id: Option<String>,
    /// Absolute distance estimate in meters.
    pub distance_m: f64,
    /// Deterministic display bearing in degrees.
    pub angle_deg: f64,
    /// Position relative to the Home Point (zero when none is set).
    pub home_relative: RelativeVector,
    /// Anomalies noted on the most recent update.
    pub anomalies: Vec<String>,
}

impl WorldNode {
    /// Create a node from its first sighting.
    pub fn new(mac: &str, now: DateTime<Utc>) -> Self {
        Self {
            mac: mac.to_string(),
            ssid: String::new(),
            vendor: String::new(),
            vendor_category: VendorCategory::Unknown,
            node_type: DeviceCategory::Unknown,
            fingerprint_confidence: 0.0,
            channel: 0,
            band: Band::Unknown,
            rssi_dbm: -100.0,
            rssi_history: VecDeque::with_capacity(MAX_RSSI_HISTORY),
            channel_history: VecDeque::with_capacity(MAX_CHANNEL_HISTORY),
            presence_intervals: VecDeque::with_capacity(MAX_PRESENCE_INTERVALS),
            lifetime_stats: RunningStats::new(),
            first_seen: now,
            last_seen: now,
            is_visible: true,
            temporal: TemporalSignature::default(),
            movement: MovementVector::default(),
            environment: EnvironmentContext::default(),
            confidence_score: 0.0,
            cluster_id: None,
            distance_m: 0.0,
            angle_deg: deterministic_angle(mac),
            home_relative: RelativeVector::default(),
            anomalies: Vec::new(),
        }
    }

    /// RSSI values in history order.
    pub fn rssi_values(&self) -> Vec<f64> {
        self.rssi_history.iter().map(|(_, v)| *v).collect()
    }

    /// Total observed presence duration in seconds.
    pub fn presence_seconds(&self) -> f64 {
        self.presence_intervals
            .iter()
            .map(|(start, end)| (*end - *start).num_milliseconds() as f64 / 1000.0)
            .sum()
    }

    /// Lifetime span in seconds since first sighting.
    pub fn lifetime_seconds(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.first_seen).num_milliseconds() as f64 / 1000.0).max(0.0)
    }
}

/// Stable display bearing derived from the MAC bytes.
///
/// Purely presentational: spreads devices around the radar without any
/// claim about true direction.
pub fn deterministic_angle(mac: &str) -> f64 {
    let mut acc: u32 = 0;
    for (i, byte) in mac.bytes().enumerate() {
        acc = acc.wrapping_add((byte as u32).wrapping_mul(31 + i as u32));
    }
    (acc % 360) as f64
}
