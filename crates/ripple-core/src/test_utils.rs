//! Test fixtures for the graph engine

use crate::model::{DependencyKind, SymbolId, SymbolKind, SymbolNode};
use crate::tracker::{DependencySpec, DependencyTracker};
use crate::EngineConfig;

/// Tracker with default configuration; panics only in tests.
pub fn tracker() -> DependencyTracker {
    DependencyTracker::new(EngineConfig::default()).unwrap()
}

/// Shorthand for a function symbol living in `file`.
pub fn func(id: &str, file: &str) -> SymbolNode {
    SymbolNode::new(id, id, SymbolKind::Function, file)
}

pub fn dep(source: &str, target: &str, kind: DependencyKind) -> DependencySpec {
    DependencySpec {
        source: SymbolId::from(source),
        target: SymbolId::from(target),
        kind,
        file_path: None,
        line: None,
        strength: None,
    }
}

/// Build a linear call chain `a -> b -> c -> ...` of function symbols.
pub fn chain(t: &DependencyTracker, ids: &[&str]) {
    for id in ids {
        t.add_symbol(func(id, "src/lib.py")).unwrap();
    }
    for pair in ids.windows(2) {
        t.add_dependency(dep(pair[0], pair[1], DependencyKind::FunctionCall))
            .unwrap();
    }
}
