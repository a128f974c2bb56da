//! Append-only change log and optional persistence sink

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::model::{ChangeKind, ImpactLevel, SymbolChange, SymbolId, SymbolNode};
use chrono::Utc;

/// Receives every recorded change, e.g. for crash-recoverable replay.
/// The engine itself holds no durable state.
pub trait ChangeSink: Send + Sync {
    fn append_change(&self, change: &SymbolChange) -> anyhow::Result<()>;
}

/// Sink writing one JSON object per line.
pub struct JsonlChangeSink {
    path: PathBuf,
}

impl JsonlChangeSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlChangeSink { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChangeSink for JsonlChangeSink {
    fn append_change(&self, change: &SymbolChange) -> anyhow::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(change)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

/// The audit log: immutable entries with a monotone sequence number.
pub struct ChangeLog {
    entries: Vec<SymbolChange>,
    sequence: u64,
    sinks: Vec<Box<dyn ChangeSink>>,
}

impl std::fmt::Debug for ChangeLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeLog")
            .field("entries", &self.entries.len())
            .field("sequence", &self.sequence)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl ChangeLog {
    pub fn new() -> Self {
        ChangeLog {
            entries: Vec::new(),
            sequence: 0,
            sinks: Vec::new(),
        }
    }

    /// Attach a persistence sink. Sink failures are logged, not propagated;
    /// the in-memory log is the source of truth.
    pub fn add_sink(&mut self, sink: Box<dyn ChangeSink>) {
        self.sinks.push(sink);
    }

    /// Record a change and return its sequence number.
    pub fn record(
        &mut self,
        symbol: SymbolId,
        kind: ChangeKind,
        old_snapshot: Option<SymbolNode>,
        new_snapshot: Option<SymbolNode>,
        impact_level: ImpactLevel,
        affected_symbols: Vec<SymbolId>,
    ) -> u64 {
        self.sequence += 1;
        let change = SymbolChange {
            sequence: self.sequence,
            symbol,
            kind,
            old_snapshot,
            new_snapshot,
            impact_level,
            timestamp: Utc::now(),
            affected_symbols,
        };
        for sink in &self.sinks {
            if let Err(e) = sink.append_change(&change) {
                tracing::warn!(sequence = change.sequence, "change sink append failed: {e}");
            }
        }
        self.entries.push(change);
        self.sequence
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Iterate over recorded changes, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SymbolChange> {
        self.entries.iter()
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&SymbolChange> {
        self.entries.last()
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new()
    }
}
