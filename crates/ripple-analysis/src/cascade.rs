//! Cross-project cascading impact analysis
//!
//! Composes the impact traversal with the boundary registry: discovered
//! symbols are grouped by owning project, boundary kinds gate which
//! crossings are followed, and the aggregate is scored into a compatibility
//! assessment and (over several impacts) a risk summary.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use ripple_core::{ChangeKind, DependencyTracker, ImpactLevel, NodeId, SymbolId};

use crate::boundary::{
    CrossProjectDependency, ProjectBoundaryRegistry, PropagationKind, UNKNOWN_PROJECT,
};
use crate::impact::{is_breaking_change, BreakingChange};
use crate::path::{DependencyPath, PathFinder};

/// How safe the change is for everything downstream of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityAssessment {
    Compatible,
    BackwardCompatible,
    Breaking,
    PotentiallyBreaking,
    /// The origin symbol could not be resolved; retry after the index
    /// settles. Degraded, not erroneous.
    Unknown,
}

/// Result of one cross-project impact query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadingImpact {
    pub id: String,
    pub origin_symbol: SymbolId,
    pub origin_project: String,
    pub change: ChangeKind,
    /// Affected symbols grouped by owning project, sorted for determinism.
    pub affected_projects: BTreeMap<String, Vec<SymbolId>>,
    pub total_affected_symbols: usize,
    /// Deepest BFS layer reached, bounded by the configured maximum.
    pub max_propagation_depth: usize,
    pub compatibility: CompatibilityAssessment,
    /// Breaking changes aggregated globally across all crossed projects.
    pub breaking_changes: Vec<BreakingChange>,
    pub recommendations: Vec<String>,
    pub estimated_effort_hours: f32,
    pub incomplete: bool,
}

/// Aggregate over a batch of cascading impacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub total_projects_affected: usize,
    pub total_symbols_affected: usize,
    /// Longest dependency chains behind the impacts, ranked by length.
    pub critical_paths: Vec<DependencyPath>,
    pub risk_assessment: ImpactLevel,
    pub migration_strategy: String,
    pub rollback_plan: String,
    pub communication_plan: Vec<String>,
}

/// Propagates impact across project boundaries.
pub struct CascadingImpactAnalyzer {
    tracker: Arc<DependencyTracker>,
    registry: Arc<ProjectBoundaryRegistry>,
    paths: PathFinder,
}

impl CascadingImpactAnalyzer {
    pub fn new(tracker: Arc<DependencyTracker>, registry: Arc<ProjectBoundaryRegistry>) -> Self {
        let paths = PathFinder::new(Arc::clone(&tracker));
        CascadingImpactAnalyzer {
            tracker,
            registry,
            paths,
        }
    }

    pub fn registry(&self) -> &Arc<ProjectBoundaryRegistry> {
        &self.registry
    }

    /// Analyze how a change to `symbol_id` in `origin_project` ripples
    /// across project boundaries. External boundaries are only crossed when
    /// `include_external` is set.
    pub fn analyze_cascading_impact(
        &self,
        symbol_id: &SymbolId,
        origin_project: &str,
        change: ChangeKind,
        include_external: bool,
    ) -> CascadingImpact {
        self.analyze_with_deadline(symbol_id, origin_project, change, include_external, None)
    }

    pub fn analyze_with_deadline(
        &self,
        symbol_id: &SymbolId,
        origin_project: &str,
        change: ChangeKind,
        include_external: bool,
        deadline: Option<Instant>,
    ) -> CascadingImpact {
        let metrics = self.tracker.metrics();
        metrics.cross_project_impacts.fetch_add(1, Ordering::Relaxed);

        let store = self.tracker.store();
        let Some(origin) = store.resolve(symbol_id) else {
            tracing::debug!(symbol = %symbol_id, "cascading impact for unknown symbol");
            return CascadingImpact {
                id: "error".to_string(),
                origin_symbol: symbol_id.clone(),
                origin_project: origin_project.to_string(),
                change,
                affected_projects: BTreeMap::new(),
                total_affected_symbols: 0,
                max_propagation_depth: 0,
                compatibility: CompatibilityAssessment::Unknown,
                breaking_changes: Vec::new(),
                recommendations: vec![
                    "Symbol not found in the graph; retry after the index settles".into(),
                ],
                estimated_effort_hours: 0.0,
                incomplete: false,
            };
        };

        let config = self.tracker.config();
        let max_depth = config.max_propagation_depth;
        let check_interval = config.deadline_check_interval;

        let mut affected_projects: BTreeMap<String, Vec<SymbolId>> = BTreeMap::new();
        let mut breaking_changes: Vec<BreakingChange> = Vec::new();
        let mut reached_depth = 0usize;
        let mut incomplete = false;

        let mut visited: HashSet<NodeId> = HashSet::from([origin]);
        let mut broken: HashSet<NodeId> = HashSet::new();
        let mut frontier: VecDeque<NodeId> = VecDeque::from([origin]);
        let mut visited_count = 0usize;

        'bfs: for depth in 1..=max_depth {
            let mut next: Vec<NodeId> = Vec::new();
            for node in frontier.drain(..) {
                let node_project = self.project_of(&store, node, origin_project);
                // Impact crosses boundaries along either coupling direction:
                // dependents break when this symbol changes, and the symbols
                // it touches are the surface it breaks against.
                let neighbors = store.incoming(node).chain(store.outgoing(node));
                for (neighbor, edge) in neighbors {
                    visited_count += 1;
                    if visited_count % check_interval == 0 {
                        if let Some(deadline) = deadline {
                            if Instant::now() >= deadline {
                                incomplete = true;
                                break 'bfs;
                            }
                        }
                    }
                    if neighbor == origin {
                        continue;
                    }
                    // As in the single-project traversal: every edge is
                    // classified, the visited set only dedups membership.
                    let breaking = is_breaking_change(change, edge.kind);
                    let first_visit = !visited.contains(&neighbor);
                    if !first_visit && !breaking {
                        continue;
                    }
                    let Some(symbol) = store.node_by_id(neighbor) else {
                        continue;
                    };
                    let neighbor_project = symbol
                        .project
                        .clone()
                        .unwrap_or_else(|| self.registry.resolve_project(&symbol.file_path));

                    if neighbor_project != node_project {
                        let boundary = self
                            .registry
                            .boundary_linking(&node_project, &neighbor_project);
                        if let Some(boundary) = &boundary {
                            if boundary.kind.is_external() && !include_external {
                                tracing::debug!(
                                    from = %node_project,
                                    to = %neighbor_project,
                                    "skipping external boundary"
                                );
                                continue;
                            }
                        }
                        self.registry.record_cross_dependency(CrossProjectDependency {
                            id: format!("{}->{}", edge.source, edge.target),
                            source_symbol: edge.source.clone(),
                            target_symbol: edge.target.clone(),
                            source_project: node_project.clone(),
                            target_project: neighbor_project.clone(),
                            kind: edge.kind,
                            propagation: if depth == 1 {
                                PropagationKind::Direct
                            } else {
                                PropagationKind::Transitive
                            },
                            version_requirement: boundary
                                .as_ref()
                                .and_then(|b| b.version_constraint.clone()),
                            breaking_risk: breaking,
                        });
                    }

                    if first_visit {
                        visited.insert(neighbor);
                        affected_projects
                            .entry(neighbor_project.clone())
                            .or_default()
                            .push(symbol.id.clone());
                        next.push(neighbor);
                    }
                    if breaking && broken.insert(neighbor) {
                        breaking_changes.push(BreakingChange {
                            symbol: symbol.id.clone(),
                            dependency_kind: edge.kind,
                            depth,
                            project: Some(neighbor_project),
                        });
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            reached_depth = depth;
            frontier.extend(next);
        }
        let version = store.version();
        drop(store);

        for symbols in affected_projects.values_mut() {
            symbols.sort();
        }
        breaking_changes.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let total: usize = affected_projects.values().map(Vec::len).sum();
        let compatibility = assess_compatibility(change, breaking_changes.len());
        let effort = (0.5 * total as f32 + 2.0 * breaking_changes.len() as f32)
            .min(config.max_effort_hours);

        metrics
            .breaking_changes_detected
            .fetch_add(breaking_changes.len() as u64, Ordering::Relaxed);

        let recommendations =
            recommendations_for(compatibility, affected_projects.len(), breaking_changes.len());
        CascadingImpact {
            id: format!("{origin_project}:{symbol_id}:{change}@v{version}"),
            origin_symbol: symbol_id.clone(),
            origin_project: origin_project.to_string(),
            change,
            affected_projects,
            total_affected_symbols: total,
            max_propagation_depth: reached_depth,
            compatibility,
            breaking_changes,
            recommendations,
            estimated_effort_hours: effort,
            incomplete,
        }
    }

    fn project_of(
        &self,
        store: &ripple_core::SymbolGraphStore,
        node: NodeId,
        fallback: &str,
    ) -> String {
        store
            .node_by_id(node)
            .map(|s| {
                s.project
                    .clone()
                    .unwrap_or_else(|| self.registry.resolve_project(&s.file_path))
            })
            .filter(|p| p != UNKNOWN_PROJECT)
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Aggregate a batch of impacts into one summary for release planning.
    pub fn generate_impact_summary(&self, impacts: &[CascadingImpact]) -> ImpactSummary {
        let mut projects: BTreeSet<&String> = BTreeSet::new();
        let mut symbols: BTreeSet<&SymbolId> = BTreeSet::new();
        let mut breaking_projects: BTreeSet<&str> = BTreeSet::new();
        let mut breaking_total = 0usize;

        for impact in impacts {
            for (project, affected) in &impact.affected_projects {
                projects.insert(project);
                symbols.extend(affected.iter());
            }
            breaking_total += impact.breaking_changes.len();
            for b in &impact.breaking_changes {
                if let Some(p) = &b.project {
                    breaking_projects.insert(p.as_str());
                }
            }
        }

        let total_symbols = symbols.len();
        let risk = risk_tier(breaking_projects.len(), breaking_total, total_symbols);

        // Longest chains from each origin to a representative symbol per
        // affected project, ranked by length.
        let mut critical_paths: Vec<DependencyPath> = Vec::new();
        for impact in impacts {
            for affected in impact.affected_projects.values() {
                let Some(representative) = affected.first() else {
                    continue;
                };
                let found = self
                    .paths
                    .find_dependency_path(&impact.origin_symbol, representative)
                    .or_else(|| {
                        self.paths
                            .find_dependency_path(representative, &impact.origin_symbol)
                    });
                if let Some(path) = found {
                    critical_paths.push(path);
                }
            }
        }
        critical_paths.sort_by(|a, b| {
            b.path_length
                .cmp(&a.path_length)
                .then_with(|| a.nodes.cmp(&b.nodes))
        });
        critical_paths.dedup_by(|a, b| a.nodes == b.nodes);
        critical_paths.truncate(5);

        ImpactSummary {
            total_projects_affected: projects.len(),
            total_symbols_affected: total_symbols,
            critical_paths,
            risk_assessment: risk,
            migration_strategy: migration_strategy(risk).to_string(),
            rollback_plan: rollback_plan(risk).to_string(),
            communication_plan: communication_plan(risk),
        }
    }
}

fn recommendations_for(
    compatibility: CompatibilityAssessment,
    projects: usize,
    breaking: usize,
) -> Vec<String> {
    match compatibility {
        CompatibilityAssessment::Compatible => Vec::new(),
        CompatibilityAssessment::BackwardCompatible => {
            vec!["Addition is backward compatible; announce the new surface to dependents".into()]
        }
        CompatibilityAssessment::Breaking => vec![
            format!("{breaking} breaking dependent(s) across {projects} project(s); coordinate the migration before landing"),
            "Consider a deprecation period or compatibility shim".into(),
        ],
        CompatibilityAssessment::PotentiallyBreaking => vec![format!(
            "{breaking} dependent(s) may break; verify call sites in the affected project(s)"
        )],
        CompatibilityAssessment::Unknown => {
            vec!["Symbol not found in the graph; retry after the index settles".into()]
        }
    }
}

/// Compatibility rules, most severe outcomes last so counts decide first.
fn assess_compatibility(change: ChangeKind, breaking: usize) -> CompatibilityAssessment {
    if breaking == 0 {
        return if change == ChangeKind::Added {
            CompatibilityAssessment::BackwardCompatible
        } else {
            CompatibilityAssessment::Compatible
        };
    }
    if breaking >= 10 || change == ChangeKind::Removed {
        return CompatibilityAssessment::Breaking;
    }
    CompatibilityAssessment::PotentiallyBreaking
}

/// Four-tier risk decision table over (projects with breaking impact,
/// breaking count, symbols affected).
fn risk_tier(breaking_projects: usize, breaking_total: usize, total_symbols: usize) -> ImpactLevel {
    if breaking_projects >= 3 || breaking_total > 20 {
        ImpactLevel::Critical
    } else if breaking_total > 0 || total_symbols > 10 {
        ImpactLevel::High
    } else if total_symbols > 0 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    }
}

fn migration_strategy(risk: ImpactLevel) -> &'static str {
    match risk {
        ImpactLevel::Critical => {
            "Coordinate a multi-project migration: freeze dependent releases, land compatibility shims first, then migrate project by project"
        }
        ImpactLevel::High => {
            "Stage the change behind a deprecation window; migrate direct dependents before removing the old surface"
        }
        ImpactLevel::Medium => "Land the change with updated call sites in the same changeset",
        ImpactLevel::Low => "Safe to land directly; no migration needed",
    }
}

fn rollback_plan(risk: ImpactLevel) -> &'static str {
    match risk {
        ImpactLevel::Critical | ImpactLevel::High => {
            "Revert the originating change and re-publish prior versions of every affected project"
        }
        ImpactLevel::Medium => "Revert the originating changeset; dependents are unaffected by the rollback",
        ImpactLevel::Low => "Simple revert of the originating commit",
    }
}

fn communication_plan(risk: ImpactLevel) -> Vec<String> {
    match risk {
        ImpactLevel::Critical => vec![
            "Notify owners of every affected project before landing".into(),
            "Announce the migration timeline and breaking surface".into(),
            "Track per-project migration status until complete".into(),
        ],
        ImpactLevel::High => vec![
            "Notify owners of directly affected projects".into(),
            "Document the breaking surface in the changelog".into(),
        ],
        ImpactLevel::Medium => vec!["Mention the change in the release notes".into()],
        ImpactLevel::Low => Vec::new(),
    }
}
