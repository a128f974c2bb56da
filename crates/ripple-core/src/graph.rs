//! Graph store using petgraph::StableDiGraph with an external-id side map

use crate::error::GraphError;
use crate::model::*;
use crate::symbols::SymbolTable;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// The symbol dependency graph — a directed multigraph with stable node
/// indices serving as the arena, plus a side map from external symbol ids.
///
/// Forward adjacency (outgoing edges) and reverse adjacency (incoming edges)
/// are two views over the same edge set, so they can never disagree; node
/// removal drops edges on both sides atomically.
pub struct SymbolGraphStore {
    inner: StableDiGraph<SymbolNode, DependencyEdge>,
    symbols: SymbolTable,
    /// Bumped on every mutation; invalidates impact caches keyed by it.
    version: u64,
}

impl std::fmt::Debug for SymbolGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolGraphStore")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .field("version", &self.version)
            .finish()
    }
}

fn to_index(id: NodeId) -> NodeIndex {
    NodeIndex::new(id.0 as usize)
}

fn to_id(idx: NodeIndex) -> NodeId {
    NodeId(idx.index() as u32)
}

impl SymbolGraphStore {
    pub fn new() -> Self {
        SymbolGraphStore {
            inner: StableDiGraph::new(),
            symbols: SymbolTable::new(),
            version: 0,
        }
    }

    /// Current graph version. Monotone; bumped on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Insert or replace a symbol. Returns the arena id and, for a replace,
    /// the previous snapshot.
    pub fn upsert_symbol(&mut self, node: SymbolNode) -> (NodeId, Option<SymbolNode>) {
        self.version += 1;
        if let Some(node_id) = self.resolve(&node.id) {
            let idx = to_index(node_id);
            let old = self.inner[idx].clone();
            if old.file_path != node.file_path {
                self.symbols.move_file(
                    &node.id,
                    &old.file_path.to_string_lossy(),
                    node.file_path.to_string_lossy().to_string(),
                );
            }
            self.inner[idx] = node;
            return (node_id, Some(old));
        }
        let file = node.file_path.to_string_lossy().to_string();
        let id = node.id.clone();
        let idx = self.inner.add_node(node);
        let node_id = to_id(idx);
        self.symbols.insert(id, node_id, file);
        (node_id, None)
    }

    /// Remove a symbol and every edge touching it, in both directions.
    /// Returns the removed snapshot and its direct dependents as captured
    /// before removal.
    pub fn remove_symbol(&mut self, id: &SymbolId) -> Option<(SymbolNode, Vec<SymbolId>)> {
        let node_id = self.resolve(id)?;
        let dependents = self.direct_dependents(id);
        self.version += 1;
        let node = self.inner.remove_node(to_index(node_id))?;
        self.symbols.remove(id, &node.file_path.to_string_lossy());
        Some((node, dependents))
    }

    /// Add a dependency edge. Both endpoints must already be in the graph.
    pub fn add_dependency(&mut self, edge: DependencyEdge) -> Result<(), GraphError> {
        let source = self
            .resolve(&edge.source)
            .ok_or_else(|| GraphError::SymbolNotFound(edge.source.clone()))?;
        let target = self
            .resolve(&edge.target)
            .ok_or_else(|| GraphError::SymbolNotFound(edge.target.clone()))?;
        self.version += 1;
        self.inner.add_edge(to_index(source), to_index(target), edge);
        Ok(())
    }

    /// Remove every edge from `source` to `target`. Returns whether any
    /// edge was removed.
    pub fn remove_dependency(&mut self, source: &SymbolId, target: &SymbolId) -> bool {
        let (Some(src), Some(tgt)) = (self.resolve(source), self.resolve(target)) else {
            return false;
        };
        let edge_ids: Vec<_> = self
            .inner
            .edges_directed(to_index(src), Direction::Outgoing)
            .filter(|e| e.target() == to_index(tgt))
            .map(|e| e.id())
            .collect();
        if edge_ids.is_empty() {
            return false;
        }
        self.version += 1;
        for eid in edge_ids {
            self.inner.remove_edge(eid);
        }
        true
    }

    /// Resolve an external id to its arena id, self-healing stale side-map
    /// entries that point at a since-removed node.
    pub fn resolve(&self, id: &SymbolId) -> Option<NodeId> {
        let node_id = self.symbols.lookup(id)?;
        if self.inner.node_weight(to_index(node_id)).is_none() {
            tracing::warn!(symbol = %id, "dropping stale symbol-table entry for removed node");
            self.symbols.remove(id, "");
            return None;
        }
        Some(node_id)
    }

    pub fn contains(&self, id: &SymbolId) -> bool {
        self.resolve(id).is_some()
    }

    /// Get a symbol by external id.
    pub fn node(&self, id: &SymbolId) -> Option<&SymbolNode> {
        self.inner.node_weight(to_index(self.resolve(id)?))
    }

    /// Get a symbol by arena id.
    pub fn node_by_id(&self, id: NodeId) -> Option<&SymbolNode> {
        self.inner.node_weight(to_index(id))
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over all edges.
    pub fn all_edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.inner
            .edge_indices()
            .filter_map(move |idx| self.inner.edge_weight(idx))
    }

    /// Outgoing edges of a node: what this symbol depends on.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &DependencyEdge)> {
        self.inner
            .edges_directed(to_index(id), Direction::Outgoing)
            .filter_map(move |edge_ref| {
                self.inner
                    .edge_weight(edge_ref.id())
                    .map(|w| (to_id(edge_ref.target()), w))
            })
    }

    /// Incoming edges of a node: who depends on this symbol.
    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &DependencyEdge)> {
        self.inner
            .edges_directed(to_index(id), Direction::Incoming)
            .filter_map(move |edge_ref| {
                self.inner
                    .edge_weight(edge_ref.id())
                    .map(|w| (to_id(edge_ref.source()), w))
            })
    }

    /// Check if a `source -> target` edge of a specific kind exists.
    pub fn has_edge_between(&self, source: &SymbolId, target: &SymbolId, kind: DependencyKind) -> bool {
        let (Some(src), Some(tgt)) = (self.resolve(source), self.resolve(target)) else {
            return false;
        };
        self.outgoing(src).any(|(n, e)| n == tgt && e.kind == kind)
    }

    /// External ids of the symbols `id` directly depends on, sorted and
    /// deduplicated for deterministic output.
    pub fn direct_dependencies(&self, id: &SymbolId) -> Vec<SymbolId> {
        self.neighbor_ids(id, Direction::Outgoing)
    }

    /// External ids of the symbols directly depending on `id`.
    pub fn direct_dependents(&self, id: &SymbolId) -> Vec<SymbolId> {
        self.neighbor_ids(id, Direction::Incoming)
    }

    fn neighbor_ids(&self, id: &SymbolId, dir: Direction) -> Vec<SymbolId> {
        let Some(node_id) = self.resolve(id) else {
            return Vec::new();
        };
        let mut out: Vec<SymbolId> = self
            .inner
            .edges_directed(to_index(node_id), dir)
            .filter_map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                self.inner.node_weight(other).map(|n| n.id.clone())
            })
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// All symbols declared in a file.
    pub fn symbols_in_file(&self, file_path: &str) -> Vec<SymbolId> {
        self.symbols.symbols_in_file(file_path)
    }
}

impl Default for SymbolGraphStore {
    fn default() -> Self {
        Self::new()
    }
}
