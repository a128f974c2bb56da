//! Ripple Analysis — impact analysis, path finding, and cross-project cascade

pub mod boundary;
pub mod cascade;
pub mod impact;
pub mod path;


pub use boundary::{
    BoundaryKind, CrossProjectDependency, ProjectBoundary, ProjectBoundaryRegistry,
    PropagationKind, UNKNOWN_PROJECT,
};
pub use cascade::{
    CascadingImpact, CascadingImpactAnalyzer, CompatibilityAssessment, ImpactSummary,
};
pub use impact::{is_breaking_change, BreakingChange, ImpactAnalysis, ImpactAnalyzer};
pub use path::{DependencyPath, PathFinder};
