//! Ripple Core — symbol graph store, dependency tracker, and change log

pub mod changes;
pub mod config;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod model;
pub mod symbols;
pub mod tracker;


#[cfg(test)]
pub mod test_utils;

pub use changes::{ChangeLog, ChangeSink, JsonlChangeSink};
pub use config::{EngineConfig, ImpactWeights};
pub use error::{GraphError, Result};
pub use graph::SymbolGraphStore;
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use model::{
    ChangeKind, DependencyEdge, DependencyKind, ImpactLevel, NodeId, SourceSpan, SymbolChange,
    SymbolId, SymbolKind, SymbolNode,
};
pub use symbols::SymbolTable;
pub use tracker::{BatchReport, DependencySpec, DependencyTracker, DependencyView};
