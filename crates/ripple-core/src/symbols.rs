//! Side index from external symbol ids to arena node ids

use crate::model::{NodeId, SymbolId};
use dashmap::DashMap;

/// Symbol table mapping external ids to arena [`NodeId`]s. Thread-safe for
/// concurrent lookup while analyses hold shared read access to the store.
pub struct SymbolTable {
    ids: DashMap<SymbolId, NodeId>,
    /// For fast file lookup: file path -> symbols declared in that file.
    file_symbols: DashMap<String, Vec<SymbolId>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            ids: DashMap::new(),
            file_symbols: DashMap::new(),
        }
    }

    /// Insert a symbol mapping.
    pub fn insert(&self, id: SymbolId, node_id: NodeId, file_path: String) {
        self.ids.insert(id.clone(), node_id);
        let mut entry = self.file_symbols.entry(file_path).or_default();
        if !entry.contains(&id) {
            entry.push(id);
        }
    }

    /// Look up the arena id for an external symbol id.
    pub fn lookup(&self, id: &SymbolId) -> Option<NodeId> {
        self.ids.get(id).map(|r| *r.value())
    }

    /// Drop a symbol mapping, including its file-index entry.
    pub fn remove(&self, id: &SymbolId, file_path: &str) {
        self.ids.remove(id);
        if let Some(mut entry) = self.file_symbols.get_mut(file_path) {
            entry.retain(|s| s != id);
        }
    }

    /// Move a symbol between file-index buckets (for upserts that change the
    /// declaring file).
    pub fn move_file(&self, id: &SymbolId, old_path: &str, new_path: String) {
        if let Some(mut entry) = self.file_symbols.get_mut(old_path) {
            entry.retain(|s| s != id);
        }
        let mut entry = self.file_symbols.entry(new_path).or_default();
        if !entry.contains(id) {
            entry.push(id.clone());
        }
    }

    /// All symbols declared in a file.
    pub fn symbols_in_file(&self, file_path: &str) -> Vec<SymbolId> {
        self.file_symbols
            .get(file_path)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
