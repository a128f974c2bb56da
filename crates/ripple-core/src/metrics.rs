//! Engine counters exposed through `get_metrics`

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Lock-free counters shared between the tracker and the analyzers.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub total_symbols: AtomicU64,
    pub total_dependencies: AtomicU64,
    pub dependency_updates: AtomicU64,
    pub impact_analyses: AtomicU64,
    pub cross_project_impacts: AtomicU64,
    pub breaking_changes_detected: AtomicU64,
}

/// Point-in-time copy of the counters, for serialization to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_symbols: u64,
    pub total_dependencies: u64,
    pub dependency_updates: u64,
    pub impact_analyses: u64,
    pub cross_project_impacts: u64,
    pub breaking_changes_detected: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_symbols: self.total_symbols.load(Ordering::Relaxed),
            total_dependencies: self.total_dependencies.load(Ordering::Relaxed),
            dependency_updates: self.dependency_updates.load(Ordering::Relaxed),
            impact_analyses: self.impact_analyses.load(Ordering::Relaxed),
            cross_project_impacts: self.cross_project_impacts.load(Ordering::Relaxed),
            breaking_changes_detected: self.breaking_changes_detected.load(Ordering::Relaxed),
        }
    }

    /// Set the symbol/dependency gauges from the store after a mutation.
    pub fn record_graph_size(&self, symbols: usize, dependencies: usize) {
        self.total_symbols.store(symbols as u64, Ordering::Relaxed);
        self.total_dependencies
            .store(dependencies as u64, Ordering::Relaxed);
    }
}
