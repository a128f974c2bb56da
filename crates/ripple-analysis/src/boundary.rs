//! Project boundary registry
//!
//! Tracks declared inter-project dependency boundaries and resolves which
//! project a symbol belongs to from its file path. The project adjacency is
//! kept in symmetric forward/reverse indices, mirroring the symbol graph.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use ripple_core::{DependencyKind, SymbolId};

/// Bucket for symbols whose file path matches no known project layout.
/// Impact is never silently dropped; it lands here instead.
pub const UNKNOWN_PROJECT: &str = "unknown";

/// Coupling tightness of a declared boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    Internal,
    Workspace,
    External,
    Published,
    System,
}

impl BoundaryKind {
    /// External-ish boundaries are only traversed on explicit request.
    pub fn is_external(self) -> bool {
        matches!(
            self,
            BoundaryKind::External | BoundaryKind::Published | BoundaryKind::System
        )
    }
}

/// How a dependency propagates across a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationKind {
    Direct,
    Transitive,
    Runtime,
    BuildTime,
    Optional,
}

/// A declared dependency relationship between two projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectBoundary {
    /// Stable key, `"{source}->{target}"`.
    pub id: String,
    pub source_project: String,
    pub target_project: String,
    pub kind: BoundaryKind,
    /// Symbol names declared as the dependency surface.
    pub dependencies: Vec<String>,
    pub version_constraint: Option<String>,
    pub is_published: bool,
    pub last_updated: DateTime<Utc>,
}

/// A concrete symbol-level dependency observed crossing a boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossProjectDependency {
    /// `"{source_symbol}->{target_symbol}"`.
    pub id: String,
    pub source_symbol: SymbolId,
    pub target_symbol: SymbolId,
    pub source_project: String,
    pub target_project: String,
    pub kind: DependencyKind,
    pub propagation: PropagationKind,
    pub version_requirement: Option<String>,
    /// Whether the current analysis classified this crossing as breaking.
    pub breaking_risk: bool,
}

/// Registry of declared boundaries plus the derived project adjacency graph.
pub struct ProjectBoundaryRegistry {
    boundaries: DashMap<String, ProjectBoundary>,
    forward: DashMap<String, BTreeSet<String>>,
    reverse: DashMap<String, BTreeSet<String>>,
    cross_dependencies: DashMap<String, CrossProjectDependency>,
}

impl std::fmt::Debug for ProjectBoundaryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectBoundaryRegistry")
            .field("boundaries", &self.boundaries.len())
            .field("cross_dependencies", &self.cross_dependencies.len())
            .finish()
    }
}

impl ProjectBoundaryRegistry {
    pub fn new() -> Self {
        ProjectBoundaryRegistry {
            boundaries: DashMap::new(),
            forward: DashMap::new(),
            reverse: DashMap::new(),
            cross_dependencies: DashMap::new(),
        }
    }

    /// Upsert a boundary keyed `"{source}->{target}"` and update the project
    /// adjacency on both sides. Returns `true` when the boundary was new.
    pub fn register_project_boundary(
        &self,
        source_project: &str,
        target_project: &str,
        kind: BoundaryKind,
        dependencies: Vec<String>,
        version_constraint: Option<String>,
    ) -> bool {
        let id = format!("{source_project}->{target_project}");
        let boundary = ProjectBoundary {
            id: id.clone(),
            source_project: source_project.to_string(),
            target_project: target_project.to_string(),
            kind,
            dependencies,
            version_constraint,
            is_published: kind == BoundaryKind::Published,
            last_updated: Utc::now(),
        };
        let is_new = self.boundaries.insert(id, boundary).is_none();
        self.forward
            .entry(source_project.to_string())
            .or_default()
            .insert(target_project.to_string());
        self.reverse
            .entry(target_project.to_string())
            .or_default()
            .insert(source_project.to_string());
        tracing::debug!(
            source = source_project,
            target = target_project,
            ?kind,
            new = is_new,
            "project boundary registered"
        );
        is_new
    }

    /// The boundary declared exactly as `source -> target`.
    pub fn boundary_between(&self, source: &str, target: &str) -> Option<ProjectBoundary> {
        self.boundaries
            .get(&format!("{source}->{target}"))
            .map(|b| b.value().clone())
    }

    /// The boundary linking two projects in either direction.
    pub fn boundary_linking(&self, a: &str, b: &str) -> Option<ProjectBoundary> {
        self.boundary_between(a, b).or_else(|| self.boundary_between(b, a))
    }

    /// Projects that `project` declares dependencies on.
    pub fn downstream_of(&self, project: &str) -> BTreeSet<String> {
        self.forward
            .get(project)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Projects that declare dependencies on `project`.
    pub fn upstream_of(&self, project: &str) -> BTreeSet<String> {
        self.reverse
            .get(project)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Every project named by some boundary.
    pub fn known_projects(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for entry in self.boundaries.iter() {
            out.insert(entry.source_project.clone());
            out.insert(entry.target_project.clone());
        }
        out
    }

    /// Record a symbol-level crossing observed during cascading analysis.
    pub fn record_cross_dependency(&self, dep: CrossProjectDependency) {
        self.cross_dependencies.insert(dep.id.clone(), dep);
    }

    pub fn cross_dependencies(&self) -> Vec<CrossProjectDependency> {
        self.cross_dependencies
            .iter()
            .map(|e| e.value().clone())
            .collect()
    }

    /// Resolve the owning project from a file path.
    ///
    /// Matches common monorepo layouts (`workspace/<p>`, `projects/<p>`,
    /// `packages/<p>`, `apps/<p>`, `libs/<p>`, `crates/<p>`, bare `app/`)
    /// and falls back to any path component naming a known project. Paths
    /// that match nothing bucket into [`UNKNOWN_PROJECT`].
    pub fn resolve_project(&self, path: &Path) -> String {
        let components: Vec<&str> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();

        for (i, component) in components.iter().enumerate() {
            match *component {
                "workspace" | "projects" | "packages" | "apps" | "libs" | "crates" => {
                    if let Some(project) = components.get(i + 1) {
                        // Next component must be a directory, not the file.
                        if i + 2 < components.len() {
                            return (*project).to_string();
                        }
                    }
                }
                "app" => return "app".to_string(),
                _ => {}
            }
        }

        let known = self.known_projects();
        for component in &components {
            if known.contains(*component) {
                return (*component).to_string();
            }
        }

        tracing::warn!(path = %path.display(), "file path matches no known project layout");
        UNKNOWN_PROJECT.to_string()
    }
}

impl Default for ProjectBoundaryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
