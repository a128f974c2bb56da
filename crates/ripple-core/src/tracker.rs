//! Ingestion API over the graph store
//!
//! All mutations funnel through [`DependencyTracker`], which serializes
//! writers behind a single `RwLock` so the forward/reverse adjacency views
//! stay consistent, and records every symbol change in the append-only log.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::changes::{ChangeLog, ChangeSink};
use crate::config::EngineConfig;
use crate::error::{GraphError, Result};
use crate::graph::SymbolGraphStore;
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::model::*;

/// Wire format for a dependency submitted by the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencySpec {
    pub source: SymbolId,
    pub target: SymbolId,
    pub kind: DependencyKind,
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default)]
    pub line: Option<u32>,
    /// Coupling strength override; defaults to the kind's weight table.
    #[serde(default)]
    pub strength: Option<f32>,
}

/// Direct neighbors plus a depth-bounded BFS tree of dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyView {
    pub symbol: SymbolId,
    pub direct_dependencies: Vec<SymbolId>,
    pub direct_dependents: Vec<SymbolId>,
    /// `layers[i]` holds symbols first reached at hop distance `i + 1`.
    pub layers: Vec<Vec<SymbolId>>,
    /// The effective depth used (requested depth clamped to the config bound).
    pub depth: usize,
}

/// Outcome of a batch ingestion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub symbols_added: usize,
    pub symbols_updated: usize,
    pub dependencies_added: usize,
    /// Per-item failures; a bad record never aborts the batch.
    pub errors: Vec<String>,
}

/// Owns the graph store and the change log. Cheap to share via `Arc`.
pub struct DependencyTracker {
    store: RwLock<SymbolGraphStore>,
    log: Mutex<ChangeLog>,
    config: EngineConfig,
    metrics: Arc<EngineMetrics>,
}

impl DependencyTracker {
    /// Construct a tracker with validated configuration. Invalid bounds are
    /// fatal here rather than surfacing mid-traversal.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(DependencyTracker {
            store: RwLock::new(SymbolGraphStore::new()),
            log: Mutex::new(ChangeLog::new()),
            config,
            metrics: Arc::new(EngineMetrics::new()),
        })
    }

    /// Attach a persistence sink that receives every recorded change.
    pub fn add_change_sink(&self, sink: Box<dyn ChangeSink>) {
        self.log.lock().expect("change log poisoned").add_sink(sink);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Shared read access to the store for analyzers. Held only for the
    /// duration of one traversal.
    pub fn store(&self) -> RwLockReadGuard<'_, SymbolGraphStore> {
        self.store.read().expect("graph store poisoned")
    }

    /// Access the change log, e.g. to inspect the audit trail.
    pub fn changes(&self) -> MutexGuard<'_, ChangeLog> {
        self.log.lock().expect("change log poisoned")
    }

    /// Upsert a symbol. Resubmitting an existing id is recorded as
    /// "modified", not treated as an error; an identical snapshot is a
    /// no-op that records nothing. Returns `true` when the symbol was new.
    pub fn add_symbol(&self, symbol: SymbolNode) -> Result<bool> {
        let mut store = self.store.write().expect("graph store poisoned");
        if let Some(existing) = store.node(&symbol.id) {
            if *existing == symbol {
                tracing::debug!(symbol = %symbol.id, "unchanged resubmission, skipping");
                return Ok(false);
            }
        }
        let id = symbol.id.clone();
        let (_, old) = store.upsert_symbol(symbol.clone());
        let is_new = old.is_none();
        let (kind, level) = if is_new {
            (ChangeKind::Added, ImpactLevel::Low)
        } else {
            (ChangeKind::Modified, classify_modification(old.as_ref(), &symbol))
        };
        let dependents = store.direct_dependents(&id);
        self.metrics
            .record_graph_size(store.node_count(), store.edge_count());
        drop(store);

        self.log.lock().expect("change log poisoned").record(
            id.clone(),
            kind,
            old,
            Some(symbol),
            level,
            dependents,
        );
        tracing::debug!(symbol = %id, change = %kind, "symbol recorded");
        Ok(is_new)
    }

    /// Remove a symbol, cascading removal of every edge touching it on both
    /// sides. Returns `false` when the symbol was not present.
    pub fn remove_symbol(&self, id: &SymbolId) -> Result<bool> {
        let mut store = self.store.write().expect("graph store poisoned");
        let Some((old, dependents)) = store.remove_symbol(id) else {
            return Ok(false);
        };
        self.metrics
            .record_graph_size(store.node_count(), store.edge_count());
        drop(store);

        let level = if old.is_public || old.is_exported {
            ImpactLevel::Critical
        } else {
            ImpactLevel::High
        };
        self.log.lock().expect("change log poisoned").record(
            id.clone(),
            ChangeKind::Removed,
            Some(old),
            None,
            level,
            dependents,
        );
        tracing::debug!(symbol = %id, "symbol removed");
        Ok(true)
    }

    /// Add a dependency edge. Fails with [`GraphError::SymbolNotFound`] when
    /// either endpoint is absent.
    pub fn add_dependency(&self, spec: DependencySpec) -> Result<bool> {
        let edge = DependencyEdge {
            source: spec.source,
            target: spec.target,
            kind: spec.kind,
            file_path: spec.file_path,
            span: spec.line.map(SourceSpan::line),
            strength: spec
                .strength
                .unwrap_or_else(|| spec.kind.default_strength())
                .clamp(0.0, 1.0),
            is_direct: true,
            created_at: Utc::now(),
        };
        let mut store = self.store.write().expect("graph store poisoned");
        store.add_dependency(edge)?;
        self.metrics
            .record_graph_size(store.node_count(), store.edge_count());
        self.metrics
            .dependency_updates
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(true)
    }

    /// Remove every `source -> target` edge. Returns whether any existed.
    pub fn remove_dependency(&self, source: &SymbolId, target: &SymbolId) -> Result<bool> {
        let mut store = self.store.write().expect("graph store poisoned");
        let removed = store.remove_dependency(source, target);
        if removed {
            self.metrics
                .record_graph_size(store.node_count(), store.edge_count());
            self.metrics
                .dependency_updates
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
        Ok(removed)
    }

    /// Direct neighbors and a depth-bounded dependency tree.
    ///
    /// `depth == 0` returns empty sets by definition; the requested depth is
    /// clamped to `max_analysis_depth`.
    pub fn get_symbol_dependencies(&self, id: &SymbolId, depth: usize) -> Result<DependencyView> {
        let store = self.store();
        if !store.contains(id) {
            return Err(GraphError::SymbolNotFound(id.clone()));
        }
        let depth = depth.min(self.config.max_analysis_depth);
        if depth == 0 {
            return Ok(DependencyView {
                symbol: id.clone(),
                direct_dependencies: Vec::new(),
                direct_dependents: Vec::new(),
                layers: Vec::new(),
                depth: 0,
            });
        }

        let direct_dependencies = store.direct_dependencies(id);
        let direct_dependents = store.direct_dependents(id);

        // Forward BFS collecting one layer per hop, visited-set for cycles.
        let origin = store
            .resolve(id)
            .ok_or_else(|| GraphError::SymbolNotFound(id.clone()))?;
        let mut layers: Vec<Vec<SymbolId>> = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::from([origin]);
        let mut frontier: VecDeque<NodeId> = VecDeque::from([origin]);
        for _ in 0..depth {
            let mut next: Vec<NodeId> = Vec::new();
            for node in frontier.drain(..) {
                for (neighbor, _) in store.outgoing(node) {
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            let mut layer: Vec<SymbolId> = next
                .iter()
                .filter_map(|n| store.node_by_id(*n).map(|s| s.id.clone()))
                .collect();
            layer.sort();
            layers.push(layer);
            frontier.extend(next);
        }

        Ok(DependencyView {
            symbol: id.clone(),
            direct_dependencies,
            direct_dependents,
            layers,
            depth,
        })
    }

    /// Ingest symbols then dependencies in chunks of `batch_processing_size`,
    /// yielding to the runtime between chunks so long imports never starve
    /// concurrent impact queries for more than one chunk boundary.
    pub async fn ingest_batch(
        &self,
        symbols: Vec<SymbolNode>,
        dependencies: Vec<DependencySpec>,
    ) -> BatchReport {
        let chunk = self.config.batch_processing_size;
        let mut report = BatchReport::default();

        for batch in symbols.chunks(chunk) {
            for symbol in batch {
                match self.add_symbol(symbol.clone()) {
                    Ok(true) => report.symbols_added += 1,
                    Ok(false) => report.symbols_updated += 1,
                    Err(e) => report.errors.push(e.to_string()),
                }
            }
            tokio::task::yield_now().await;
        }

        for batch in dependencies.chunks(chunk) {
            for spec in batch {
                match self.add_dependency(spec.clone()) {
                    Ok(_) => report.dependencies_added += 1,
                    Err(e) => report.errors.push(e.to_string()),
                }
            }
            tokio::task::yield_now().await;
        }

        tracing::info!(
            added = report.symbols_added,
            updated = report.symbols_updated,
            dependencies = report.dependencies_added,
            errors = report.errors.len(),
            "batch ingestion complete"
        );
        report
    }
}

/// Severity heuristic for a modification, recorded before any full impact
/// analysis runs.
fn classify_modification(old: Option<&SymbolNode>, new: &SymbolNode) -> ImpactLevel {
    match old {
        Some(old) if old.signature != new.signature => ImpactLevel::High,
        Some(old) if old.file_path != new.file_path => ImpactLevel::Medium,
        _ if new.is_public || new.is_exported => ImpactLevel::Medium,
        _ => ImpactLevel::Low,
    }
}
