//! Passive access-point intelligence fusion.
//!
//! The engine turns raw scan observations (MAC, SSID, signal, channel,
//! security) into fused per-device intelligence: physical distance
//! estimates, device fingerprints, signal-stability ratings, a world graph
//! of relationships and clusters, hidden-network classification, and
//! spoof/impersonation alerts. Everything is passive; nothing here
//! transmits.
//!
//! Data flows in two phases:
//!
//! - **Per observation** ([`FusionEngine::ingest`]): spoof checks, the
//!   fingerprint/distance/stability stages, the intelligence record, the
//!   world-graph node, and the hidden-network profile when the SSID is
//!   empty.
//! - **Per scan cycle** ([`FusionEngine::run_batch_passes`]): visibility
//!   sweep, O(n²) relationship and cluster passes over the graph, and the
//!   hidden-network analysis against the visible population.
//!
//! [`FusionEngine::snapshot`] exports one frame of everything: device
//! records, polar radar vectors, edges, clusters, alerts and summary
//! counters.
//!
//! Module map:
//!
//! - [`domain`]: observations, bands, vendor lookup, security ratings,
//!   alerts
//! - [`distance`]: RSSI path-loss distance estimation
//! - [`fingerprint`]: device classification from vendor, SSID and channel
//! - [`stability`]: per-device signal jitter and trend tracking
//! - [`intel`]: the per-device fusion record and aggregator
//! - [`graph`]: the world graph (nodes, edges, clusters, Home Point)
//! - [`hidden`]: hidden-network profiling and classification
//! - [`spoof`]: evil-twin, downgrade, anomaly and common-target detection
//! - [`snapshot`]: export types
//! - [`clock`], [`stats`]: injected time source and shared statistics

#![warn(missing_docs)]

pub mod clock;
pub mod distance;
pub mod domain;
pub mod fingerprint;
pub mod graph;
pub mod hidden;
pub mod intel;
pub mod snapshot;
pub mod spoof;
pub mod stability;
pub mod stats;

use std::borrow::Cow;
use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::distance::{DistanceEstimator, DistanceEstimatorConfig};
use crate::domain::observation::Observation;
use crate::domain::vendor::{StaticOuiTable, VendorLookup};
use crate::fingerprint::DeviceFingerprinter;
use crate::graph::{NodeUpdate, WorldGraph, WorldGraphConfig};
use crate::hidden::{HiddenNetworkClassifier, VisibleNetwork};
use crate::intel::{IntelAggregator, NetworkIntelligence};
use crate::snapshot::{EngineSnapshot, RadarVector};
use crate::spoof::SpoofDetector;
use crate::stability::StabilityTracker;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A classification pattern failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// An operation referenced a MAC the engine does not track.
    #[error("unknown device: {0}")]
    UnknownDevice(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Top-level engine tunables.
#[derive(Debug, Clone)]
pub struct FusionConfig {
    /// Distance-estimation tunables.
    pub distance: DistanceEstimatorConfig,
    /// World-graph tunables.
    pub graph: WorldGraphConfig,
    /// Default age for [`FusionEngine::prune_older_than`], in seconds.
    pub prune_age_secs: i64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            distance: DistanceEstimatorConfig::default(),
            graph: WorldGraphConfig::default(),
            prune_age_secs: 3600,
        }
    }
}

impl FusionConfig {
    /// Set the distance-estimation tunables.
    pub fn distance(mut self, distance: DistanceEstimatorConfig) -> Self {
        self.distance = distance;
        self
    }

    /// Set the world-graph tunables.
    pub fn graph(mut self, graph: WorldGraphConfig) -> Self {
        self.graph = graph;
        self
    }

    /// Set the default prune age, clamped to at least one minute.
    pub fn prune_age_secs(mut self, secs: i64) -> Self {
        self.prune_age_secs = secs.max(60);
        self
    }
}

// ---------------------------------------------------------------------------
// Platform capabilities
// ---------------------------------------------------------------------------

/// What the capture platform can report, captured once at engine
/// construction. No runtime probing.
#[derive(Debug, Clone, Copy)]
pub struct PlatformCapabilities {
    /// Whether security descriptors are trustworthy.
    pub reports_security: bool,
    /// Whether a band hint accompanies each observation.
    pub reports_band: bool,
    /// Whether vendor strings accompany each observation.
    pub reports_vendor: bool,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self {
            reports_security: true,
            reports_band: true,
            reports_vendor: true,
        }
    }
}

impl PlatformCapabilities {
    /// Strip fields the platform cannot actually report, so downstream
    /// stages never act on fabricated data.
    fn normalize<'a>(&self, obs: &'a Observation) -> Cow<'a, Observation> {
        if self.reports_security && self.reports_band && self.reports_vendor {
            return Cow::Borrowed(obs);
        }
        let mut owned = obs.clone();
        if !self.reports_security {
            owned.security = "unknown".to_string();
        }
        if !self.reports_band {
            owned.band.clear();
        }
        if !self.reports_vendor {
            owned.vendor.clear();
        }
        Cow::Owned(owned)
    }
}

// ---------------------------------------------------------------------------
// FusionEngine
// ---------------------------------------------------------------------------

/// The composition root. Owns every stage; all dependencies are injected
/// at construction.
pub struct FusionEngine {
    config: FusionConfig,
    capabilities: PlatformCapabilities,
    clock: Arc<dyn Clock>,
    vendor_lookup: Arc<dyn VendorLookup>,
    aggregator: IntelAggregator,
    graph: WorldGraph,
    hidden: HiddenNetworkClassifier,
    spoof: SpoofDetector,
}

impl FusionEngine {
    /// Build an engine with explicit dependencies.
    pub fn new(
        config: FusionConfig,
        capabilities: PlatformCapabilities,
        clock: Arc<dyn Clock>,
        vendor_lookup: Arc<dyn VendorLookup>,
    ) -> Result<Self> {
        if config.prune_age_secs <= 0 {
            return Err(EngineError::Config(format!(
                "prune_age_secs must be positive, got {}",
                config.prune_age_secs
            )));
        }

        let aggregator = IntelAggregator::new(
            Box::new(DeviceFingerprinter::new()?),
            Box::new(DistanceEstimator::new(config.distance.clone())),
            Box::new(StabilityTracker::new()),
            Arc::clone(&vendor_lookup),
        );
        let graph = WorldGraph::new(config.graph.clone());
        let hidden = HiddenNetworkClassifier::new(Arc::clone(&vendor_lookup));

        info!(
            reports_security = capabilities.reports_security,
            reports_band = capabilities.reports_band,
            reports_vendor = capabilities.reports_vendor,
            "fusion engine initialized"
        );

        Ok(Self {
            config,
            capabilities,
            clock,
            vendor_lookup,
            aggregator,
            graph,
            hidden,
            spoof: SpoofDetector::new(),
        })
    }

    /// Build an engine with default configuration, the system clock and
    /// the built-in OUI table.
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            FusionConfig::default(),
            PlatformCapabilities::default(),
            Arc::new(SystemClock),
            Arc::new(StaticOuiTable::new()),
        )
    }

    // -- per-observation path ------------------------------------------------

    /// Feed one observation through every per-observation stage and return
    /// the updated intelligence record.
    pub fn ingest(&mut self, obs: &Observation) -> Result<&NetworkIntelligence> {
        let now = self.clock.now();
        let obs = self.capabilities.normalize(obs);

        self.spoof.inspect(&obs, now);

        let vendor = self.vendor_lookup.lookup(&obs.mac);
        let (node_type, fingerprint_confidence, distance_m) = {
            let record = self.aggregator.process(&obs);
            (
                record.category,
                record.classification_confidence,
                record.location.distance_m,
            )
        };

        self.graph.update_node(NodeUpdate {
            mac: obs.mac.clone(),
            ssid: obs.ssid.clone(),
            vendor,
            channel: obs.channel,
            band: obs.resolved_band(),
            rssi_dbm: obs.signal_dbm(),
            node_type,
            fingerprint_confidence,
            distance_m,
            timestamp: obs.timestamp,
        });

        if obs.is_hidden() {
            self.hidden.record(
                &obs.mac,
                obs.channel,
                obs.resolved_band(),
                obs.signal_dbm(),
                &obs.security,
                obs.timestamp,
            );
        }

        self.aggregator
            .get(&obs.mac)
            .ok_or_else(|| EngineError::UnknownDevice(obs.mac.clone()))
    }

    // -- batch path ------------------------------------------------------------

    /// Run the per-cycle passes: visibility sweep, graph relationships and
    /// clusters, and hidden-network analysis.
    pub fn run_batch_passes(&mut self) {
        let now = self.clock.now();
        self.graph.update_visibility(now);
        self.graph.compute_relationships(now);
        self.graph.compute_clusters();

        let visible: Vec<VisibleNetwork> = self
            .aggregator
            .records()
            .filter(|r| !r.is_hidden)
            .map(|r| VisibleNetwork {
                mac: r.mac.clone(),
                ssid: r.ssid.clone(),
                channel: r.channel,
                rssi_dbm: r.signal_dbm,
            })
            .collect();
        self.hidden.analyze(&visible);
    }

    // -- home point ------------------------------------------------------------

    /// Designate a tracked device as the Home Point reference.
    pub fn set_home_point(&mut self, mac: &str) -> Result<()> {
        self.graph.set_home_point(mac)
    }

    /// Remove the Home Point; every relative position resets to zero.
    pub fn clear_home_point(&mut self) {
        self.graph.clear_home_point();
    }

    // -- maintenance -------------------------------------------------------------

    /// Drop every device not seen for `max_age_secs`. Returns the number of
    /// entries removed across all stores.
    pub fn prune_older_than(&mut self, max_age_secs: i64) -> usize {
        let now = self.clock.now();
        let cutoff = now - Duration::seconds(max_age_secs);
        let mut removed = self.aggregator.prune_older_than(cutoff);
        removed += self.hidden.prune_older_than(cutoff);
        removed += self.graph.prune_older_than(max_age_secs, now);
        if removed > 0 {
            info!(removed, max_age_secs, "pruned stale devices");
        }
        removed
    }

    /// Prune with the configured default age.
    pub fn prune(&mut self) -> usize {
        self.prune_older_than(self.config.prune_age_secs)
    }

    /// Full reset of every stage, alerts included.
    pub fn clear(&mut self) {
        self.aggregator.clear();
        self.graph.clear();
        self.hidden.clear();
        self.spoof.clear();
        info!("engine cleared");
    }

    /// Mark a spoof alert inactive. Returns false when the id is unknown.
    pub fn dismiss_alert(&mut self, alert_id: &str) -> bool {
        self.spoof.dismiss(alert_id)
    }

    // -- exports -----------------------------------------------------------------

    /// One polar radar vector per device tracked by both the aggregator and
    /// the graph, sorted by MAC.
    pub fn radar_vectors(&self) -> Vec<RadarVector> {
        let mut vectors: Vec<RadarVector> = self
            .aggregator
            .records()
            .filter_map(|record| {
                self.graph
                    .node(&record.mac)
                    .map(|node| RadarVector::from_parts(record, node))
            })
            .collect();
        vectors.sort_by(|a, b| a.mac.cmp(&b.mac));
        vectors
    }

    /// Export one full frame of engine state.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            devices: self.aggregator.records().cloned().collect(),
            radar: self.radar_vectors(),
            edges: self.graph.edges().cloned().collect(),
            clusters: self.graph.clusters().cloned().collect(),
            alerts: self.spoof.active_alerts().into_iter().cloned().collect(),
            hidden_profiles: self.hidden.profiles().cloned().collect(),
            hidden_clusters: self.hidden.clusters().to_vec(),
            hidden_summary: self.hidden.summary(),
            statistics: self.graph.statistics(),
            home_point: self.graph.home_point().map(String::from),
        }
    }

    // -- component access --------------------------------------------------------

    /// The per-device intelligence store.
    pub fn intel(&self) -> &IntelAggregator {
        &self.aggregator
    }

    /// The world graph.
    pub fn graph(&self) -> &WorldGraph {
        &self.graph
    }

    /// The hidden-network classifier.
    pub fn hidden(&self) -> &HiddenNetworkClassifier {
        &self.hidden
    }

    /// The spoof detector.
    pub fn spoof(&self) -> &SpoofDetector {
        &self.spoof
    }

    /// The capabilities captured at construction.
    pub fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }
}

/// Common imports for engine consumers.
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::domain::alert::{SpoofAlert, SpoofPattern, ThreatLevel};
    pub use crate::domain::observation::{Band, Observation, SignalQuality};
    pub use crate::domain::security::SecurityRating;
    pub use crate::domain::vendor::{
        NullVendorLookup, StaticOuiTable, VendorCategory, VendorInfo, VendorLookup,
    };
    pub use crate::fingerprint::DeviceCategory;
    pub use crate::hidden::{HiddenClass, HiddenSummary};
    pub use crate::intel::{MovementState, NetworkIntelligence};
    pub use crate::snapshot::{EngineSnapshot, RadarVector};
    pub use crate::{
        EngineError, FusionConfig, FusionEngine, PlatformCapabilities, Result,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn engine_with_manual_clock() -> (FusionEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        let engine = FusionEngine::new(
            FusionConfig::default(),
            PlatformCapabilities::default(),
            clock.clone(),
            Arc::new(StaticOuiTable::new()),
        )
        .unwrap();
        (engine, clock)
    }

    fn obs(mac: &str, ssid: &str, signal: f64, channel: u16, at: chrono::DateTime<Utc>) -> Observation {
        Observation {
            mac: mac.to_string(),
            ssid: ssid.to_string(),
            signal_percent: signal,
            channel,
            security: "WPA2".to_string(),
            vendor: String::new(),
            band: String::new(),
            timestamp: at,
        }
    }

    #[test]
    fn ingest_builds_record_and_node() {
        let (mut engine, clock) = engine_with_manual_clock();
        let record = engine
            .ingest(&obs("AA:BB:CC:00:00:01", "HomeNet", 70.0, 6, clock.now()))
            .unwrap();
        assert_eq!(record.ssid, "HomeNet");
        assert!(record.location.distance_m > 0.0);
        assert!(engine.graph().node("AA:BB:CC:00:00:01").is_some());
    }

    #[test]
    fn hidden_observation_lands_in_classifier() {
        let (mut engine, clock) = engine_with_manual_clock();
        engine
            .ingest(&obs("E4:F0:42:00:00:01", "", 60.0, 1, clock.now()))
            .unwrap();
        engine.run_batch_passes();
        assert_eq!(engine.hidden().summary().total, 1);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let (mut engine, clock) = engine_with_manual_clock();
        for i in 1..=3u8 {
            engine
                .ingest(&obs(
                    &format!("AA:BB:CC:00:00:0{i}"),
                    "HomeNet",
                    70.0,
                    6,
                    clock.now(),
                ))
                .unwrap();
        }
        engine.run_batch_passes();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.devices.len(), 3);
        assert_eq!(snapshot.radar.len(), 3);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: EngineSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.devices.len(), 3);
    }

    #[test]
    fn clear_resets_every_stage() {
        let (mut engine, clock) = engine_with_manual_clock();
        engine
            .ingest(&obs("AA:BB:CC:00:00:01", "HomeNet", 70.0, 6, clock.now()))
            .unwrap();
        engine
            .ingest(&obs("E4:F0:42:00:00:02", "", 60.0, 1, clock.now()))
            .unwrap();
        engine.run_batch_passes();
        engine.clear();

        let snapshot = engine.snapshot();
        assert!(snapshot.devices.is_empty());
        assert!(snapshot.radar.is_empty());
        assert!(snapshot.alerts.is_empty());
        assert_eq!(snapshot.hidden_summary.total, 0);
        assert_eq!(snapshot.statistics.node_count, 0);
    }

    #[test]
    fn prune_drops_stale_devices() {
        let (mut engine, clock) = engine_with_manual_clock();
        engine
            .ingest(&obs("AA:BB:CC:00:00:01", "OldNet", 70.0, 6, clock.now()))
            .unwrap();
        clock.advance(chrono::Duration::seconds(7200));
        engine
            .ingest(&obs("AA:BB:CC:00:00:02", "NewNet", 70.0, 11, clock.now()))
            .unwrap();

        let removed = engine.prune_older_than(3600);
        assert!(removed >= 1);
        assert!(engine.intel().get("AA:BB:CC:00:00:01").is_none());
        assert!(engine.intel().get("AA:BB:CC:00:00:02").is_some());
    }

    #[test]
    fn home_point_requires_tracked_device() {
        let (mut engine, clock) = engine_with_manual_clock();
        assert!(matches!(
            engine.set_home_point("00:00:00:00:00:00"),
            Err(EngineError::UnknownDevice(_))
        ));
        engine
            .ingest(&obs("AA:BB:CC:00:00:01", "HomeNet", 70.0, 6, clock.now()))
            .unwrap();
        assert!(engine.set_home_point("AA:BB:CC:00:00:01").is_ok());
        engine.clear_home_point();
        assert!(engine.graph().home_point().is_none());
    }

    #[test]
    fn capability_gaps_strip_untrusted_fields() {
        let caps = PlatformCapabilities {
            reports_security: false,
            reports_band: false,
            reports_vendor: true,
        };
        let mut original = obs(
            "AA:BB:CC:00:00:01",
            "HomeNet",
            70.0,
            6,
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        );
        original.band = "2.4 GHz".to_string();
        let normalized = caps.normalize(&original);
        assert_eq!(normalized.security, "unknown");
        assert!(normalized.band.is_empty());
        assert_eq!(original.security, "WPA2");
        assert_eq!(original.band, "2.4 GHz");
    }

    #[test]
    fn nonpositive_prune_age_rejected() {
        let result = FusionEngine::new(
            FusionConfig {
                prune_age_secs: 0,
                ..FusionConfig::default()
            },
            PlatformCapabilities::default(),
            Arc::new(SystemClock),
            Arc::new(StaticOuiTable::new()),
        );
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
