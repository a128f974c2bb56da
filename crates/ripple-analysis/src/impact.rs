//! Single-project impact analysis
//!
//! Answers "what breaks if I change symbol X?" with a bounded BFS over the
//! reverse adjacency of the graph: dependents at hop distance 1 are directly
//! affected, everything further out is indirect. Multiply-reachable symbols
//! are counted once, at their minimum discovery depth.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use ripple_core::{ChangeKind, DependencyKind, DependencyTracker, NodeId, SymbolId};

/// A dependent likely to fail to build or run after the change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreakingChange {
    pub symbol: SymbolId,
    /// The dependency kind of the edge the break propagates through.
    pub dependency_kind: DependencyKind,
    /// Hop distance from the changed symbol.
    pub depth: usize,
    /// Owning project, when known (filled in by cross-project analysis).
    pub project: Option<String>,
}

/// Result of a single-project impact query. Computed on demand, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub symbol: SymbolId,
    pub change: ChangeKind,
    /// Dependents at hop distance 1.
    pub directly_affected: Vec<SymbolId>,
    /// Dependents at hop distance > 1.
    pub indirectly_affected: Vec<SymbolId>,
    pub breaking_changes: Vec<BreakingChange>,
    /// Weighted, normalized score in [0, 100).
    pub impact_score: f32,
    /// Deepest BFS layer reached.
    pub analysis_depth: usize,
    pub suggestions: Vec<String>,
    pub warnings: Vec<String>,
    /// Set when a deadline expired mid-traversal and the result is partial.
    pub incomplete: bool,
}

impl ImpactAnalysis {
    fn empty(symbol: SymbolId, change: ChangeKind) -> Self {
        ImpactAnalysis {
            symbol,
            change,
            directly_affected: Vec::new(),
            indirectly_affected: Vec::new(),
            breaking_changes: Vec::new(),
            impact_score: 0.0,
            analysis_depth: 0,
            suggestions: Vec::new(),
            warnings: Vec::new(),
            incomplete: false,
        }
    }

    pub fn total_affected(&self) -> usize {
        self.directly_affected.len() + self.indirectly_affected.len()
    }
}

/// Whether a change of `change` kind breaks a dependent coupled through an
/// edge of `kind`. Total over both enums; adding a variant forces a decision
/// here at compile time.
pub fn is_breaking_change(change: ChangeKind, kind: DependencyKind) -> bool {
    match change {
        ChangeKind::Removed | ChangeKind::Moved | ChangeKind::SignatureChanged => true,
        ChangeKind::Added => false,
        ChangeKind::Modified => match kind {
            DependencyKind::FunctionCall
            | DependencyKind::MethodCall
            | DependencyKind::Inheritance
            | DependencyKind::VariableAccess => true,
            DependencyKind::Import
            | DependencyKind::TypeReference
            | DependencyKind::Annotation
            | DependencyKind::Instantiation
            | DependencyKind::Composition
            | DependencyKind::Aggregation => false,
        },
    }
}

type CacheKey = (SymbolId, ChangeKind, u64);

/// Computes impact analyses over a shared tracker, caching results per graph
/// version. Cache reads take no lock; any mutation bumps the version and
/// thereby orphans stale entries.
pub struct ImpactAnalyzer {
    tracker: Arc<DependencyTracker>,
    cache: DashMap<CacheKey, Arc<ImpactAnalysis>>,
}

impl ImpactAnalyzer {
    pub fn new(tracker: Arc<DependencyTracker>) -> Self {
        ImpactAnalyzer {
            tracker,
            cache: DashMap::new(),
        }
    }

    pub fn tracker(&self) -> &Arc<DependencyTracker> {
        &self.tracker
    }

    /// Analyze the impact of applying `change` to `id`.
    pub fn analyze_symbol_impact(&self, id: &SymbolId, change: ChangeKind) -> Arc<ImpactAnalysis> {
        self.analyze_with_deadline(id, change, None)
    }

    /// Like [`Self::analyze_symbol_impact`] but returns a partial result
    /// flagged `incomplete` if the deadline expires mid-traversal.
    pub fn analyze_with_deadline(
        &self,
        id: &SymbolId,
        change: ChangeKind,
        deadline: Option<Instant>,
    ) -> Arc<ImpactAnalysis> {
        let metrics = self.tracker.metrics();
        metrics.impact_analyses.fetch_add(1, Ordering::Relaxed);

        let store = self.tracker.store();
        let key = (id.clone(), change, store.version());
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(hit.value());
        }

        let Some(origin) = store.resolve(id) else {
            // Missing symbols degrade to an empty result, never a failure.
            let mut result = ImpactAnalysis::empty(id.clone(), change);
            result.warnings.push(format!("Symbol not found: {id}"));
            tracing::debug!(symbol = %id, "impact query for unknown symbol");
            return Arc::new(result);
        };

        let mut result = ImpactAnalysis::empty(id.clone(), change);
        let max_depth = self.tracker.config().max_analysis_depth;
        let check_interval = self.tracker.config().deadline_check_interval;

        let mut visited: HashSet<NodeId> = HashSet::from([origin]);
        let mut broken: HashSet<NodeId> = HashSet::new();
        let mut frontier: VecDeque<NodeId> = VecDeque::from([origin]);
        let mut visited_count = 0usize;

        'bfs: for depth in 1..=max_depth {
            let mut next: Vec<NodeId> = Vec::new();
            for node in frontier.drain(..) {
                for (dependent, edge) in store.incoming(node) {
                    visited_count += 1;
                    if visited_count % check_interval == 0 {
                        if let Some(deadline) = deadline {
                            if Instant::now() >= deadline {
                                result.incomplete = true;
                                result
                                    .warnings
                                    .push("Analysis deadline exceeded; result is partial".into());
                                break 'bfs;
                            }
                        }
                    }
                    if dependent == origin {
                        continue;
                    }
                    // Every traversed edge runs through the breaking table;
                    // the visited set only dedups the affected set and the
                    // queue, so parallel edges all get classified.
                    let breaking = is_breaking_change(change, edge.kind);
                    let first_visit = visited.insert(dependent);
                    if !first_visit && !breaking {
                        continue;
                    }
                    let Some(symbol) = store.node_by_id(dependent) else {
                        continue;
                    };
                    if first_visit {
                        if depth == 1 {
                            result.directly_affected.push(symbol.id.clone());
                        } else {
                            result.indirectly_affected.push(symbol.id.clone());
                        }
                        next.push(dependent);
                    }
                    if breaking && broken.insert(dependent) {
                        result.breaking_changes.push(BreakingChange {
                            symbol: symbol.id.clone(),
                            dependency_kind: edge.kind,
                            depth,
                            project: None,
                        });
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            result.analysis_depth = depth;
            frontier.extend(next);
        }

        result.directly_affected.sort();
        result.indirectly_affected.sort();
        result.breaking_changes.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        result.impact_score = self.score(&result);
        result.suggestions = suggestions_for(&result);

        metrics
            .breaking_changes_detected
            .fetch_add(result.breaking_changes.len() as u64, Ordering::Relaxed);

        let result = Arc::new(result);
        if !result.incomplete {
            self.cache.insert(key, Arc::clone(&result));
        }
        result
    }

    /// Weighted sum of affected counts, squashed into [0, 100).
    fn score(&self, analysis: &ImpactAnalysis) -> f32 {
        let w = self.tracker.config().impact_weights;
        let raw = w.direct * analysis.directly_affected.len() as f32
            + w.indirect * analysis.indirectly_affected.len() as f32
            + w.breaking * analysis.breaking_changes.len() as f32;
        100.0 * raw / (raw + 25.0)
    }
}

fn suggestions_for(analysis: &ImpactAnalysis) -> Vec<String> {
    let mut out = Vec::new();
    let breaking = analysis.breaking_changes.len();
    if breaking == 0 {
        if analysis.total_affected() > 0 {
            out.push("No breaking dependents detected; safe to proceed with review".into());
        }
        return out;
    }
    match analysis.change {
        ChangeKind::Removed | ChangeKind::Moved => out.push(format!(
            "Update or migrate {breaking} dependent call site(s) before removing this symbol"
        )),
        ChangeKind::SignatureChanged => out.push(format!(
            "Review {breaking} call site(s) for the updated signature"
        )),
        ChangeKind::Modified => out.push(format!(
            "Verify behavior of {breaking} tightly coupled dependent(s)"
        )),
        ChangeKind::Added => {}
    }
    if analysis.indirectly_affected.len() > analysis.directly_affected.len() {
        out.push("Most impact is transitive; consider staging the rollout".into());
    }
    out
}
