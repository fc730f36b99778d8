//! The graph-based world model: nodes, edges, clusters and the batch passes
//! that maintain them.

pub mod cluster;
pub mod edge;
pub mod node;
pub mod world;

pub use cluster::{ClusterKind, GraphCluster};
pub use edge::{EdgeKind, GraphEdge};
pub use node::{
    deterministic_angle, EnvironmentClass, EnvironmentContext, MovementDirection, MovementVector,
    RelativeVector, TemporalPattern, TemporalSignature, WorldNode,
};
pub use world::{GraphStatistics, NodeUpdate, WorldGraph, WorldGraphConfig};
