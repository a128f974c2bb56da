//! Error types for the graph engine

use crate::model::SymbolId;
use thiserror::Error;

/// Errors surfaced by graph mutation and query entry points.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A dependency or query referenced a symbol the graph has never seen
    /// (or has since removed). Callers may retry after re-syncing with the
    /// extractor.
    #[error("symbol not found: {0}")]
    SymbolNotFound(SymbolId),

    /// Construction-time configuration was invalid. Fatal; the engine
    /// refuses to start rather than run with nonsense bounds.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
