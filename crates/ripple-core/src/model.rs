//! Core data structures for the symbol dependency graph

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External identifier for a symbol, assigned by the AST extractor.
///
/// This is the key callers speak; internally symbols are addressed by the
/// arena [`NodeId`] and a side map translates between the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub String);

impl SymbolId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(s: &str) -> Self {
        SymbolId(s.to_string())
    }
}

impl From<String> for SymbolId {
    fn from(s: String) -> Self {
        SymbolId(s)
    }
}

/// Dense arena identifier for a node inside the graph store.
///
/// Wraps a `petgraph` stable index; stays valid across removals of other
/// nodes but is never reused for a different symbol while it is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct NodeId(pub u32);

/// Discriminates what kind of code entity a symbol represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Interface,
    Variable,
    Constant,
    Module,
    TypeAlias,
    Unknown,
}

/// Line/column range of a symbol or dependency site in its source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SourceSpan {
    pub line_start: u32,
    pub line_end: u32,
    pub column_start: u32,
    pub column_end: u32,
}

impl SourceSpan {
    pub fn line(line: u32) -> Self {
        SourceSpan {
            line_start: line,
            line_end: line,
            column_start: 0,
            column_end: 0,
        }
    }
}

/// A single symbol node in the dependency graph.
///
/// Exclusively owned by the graph store; mutated only through the tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolNode {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub file_path: PathBuf,
    pub span: SourceSpan,
    /// Enclosing scope, e.g. `"module"` or a class name.
    pub scope: Option<String>,
    pub signature: Option<String>,
    pub is_public: bool,
    pub is_exported: bool,
    /// Owning project, derived from the file path when not supplied.
    pub project: Option<String>,
}

impl SymbolNode {
    /// Minimal constructor used by ingestion and tests; optional fields
    /// default to empty.
    pub fn new(id: impl Into<SymbolId>, name: &str, kind: SymbolKind, file_path: &str) -> Self {
        SymbolNode {
            id: id.into(),
            name: name.to_string(),
            kind,
            file_path: PathBuf::from(file_path),
            span: SourceSpan::default(),
            scope: None,
            signature: None,
            is_public: false,
            is_exported: false,
            project: None,
        }
    }
}

/// What kind of relationship a dependency edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Import,
    Inheritance,
    FunctionCall,
    MethodCall,
    VariableAccess,
    TypeReference,
    Annotation,
    Instantiation,
    Composition,
    Aggregation,
}

impl DependencyKind {
    /// Coupling weight used when the extractor does not supply an explicit
    /// strength. Inheritance binds hardest, annotations barely at all.
    pub fn default_strength(self) -> f32 {
        match self {
            DependencyKind::Inheritance => 1.0,
            DependencyKind::Composition => 0.9,
            DependencyKind::FunctionCall => 0.8,
            DependencyKind::MethodCall => 0.8,
            DependencyKind::Instantiation => 0.7,
            DependencyKind::TypeReference => 0.6,
            DependencyKind::Aggregation => 0.5,
            DependencyKind::VariableAccess => 0.5,
            DependencyKind::Import => 0.3,
            DependencyKind::Annotation => 0.2,
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyKind::Import => "import",
            DependencyKind::Inheritance => "inheritance",
            DependencyKind::FunctionCall => "function_call",
            DependencyKind::MethodCall => "method_call",
            DependencyKind::VariableAccess => "variable_access",
            DependencyKind::TypeReference => "type_reference",
            DependencyKind::Annotation => "annotation",
            DependencyKind::Instantiation => "instantiation",
            DependencyKind::Composition => "composition",
            DependencyKind::Aggregation => "aggregation",
        };
        f.write_str(s)
    }
}

/// A directed edge meaning "source requires/uses target".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencyEdge {
    pub source: SymbolId,
    pub target: SymbolId,
    pub kind: DependencyKind,
    /// Where in source this relationship is expressed.
    pub file_path: Option<PathBuf>,
    pub span: Option<SourceSpan>,
    /// Coupling strength in [0, 1].
    pub strength: f32,
    pub is_direct: bool,
    pub created_at: DateTime<Utc>,
}

/// What happened to a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
    Moved,
    SignatureChanged,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
            ChangeKind::Moved => "moved",
            ChangeKind::SignatureChanged => "signature_changed",
        };
        f.write_str(s)
    }
}

/// Rough severity of a recorded change, before full impact analysis runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// One entry in the append-only change log. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolChange {
    /// Monotonically increasing sequence number; doubles as the change id.
    pub sequence: u64,
    pub symbol: SymbolId,
    pub kind: ChangeKind,
    pub old_snapshot: Option<SymbolNode>,
    pub new_snapshot: Option<SymbolNode>,
    pub impact_level: ImpactLevel,
    pub timestamp: DateTime<Utc>,
    /// Direct dependents captured at change time, so callers can react even
    /// after the symbol is gone from the graph.
    pub affected_symbols: Vec<SymbolId>,
}
