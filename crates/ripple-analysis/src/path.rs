//! Shortest dependency path search
//!
//! Fewest hops wins; among equal-length paths the larger product of edge
//! strengths wins; remaining ties fall to lexicographic ordering of the node
//! id sequence so results are deterministic regardless of insertion order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ripple_core::{DependencyKind, DependencyTracker, NodeId, SymbolId};

/// An ordered dependency chain from `source` to `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyPath {
    pub source: SymbolId,
    pub target: SymbolId,
    /// Node sequence including both endpoints.
    pub nodes: Vec<SymbolId>,
    /// Kind of each traversed edge; one entry per hop.
    pub edge_kinds: Vec<DependencyKind>,
    /// Product of edge strengths along the path.
    pub total_strength: f32,
    /// Number of hops.
    pub path_length: usize,
    pub is_cyclic: bool,
}

#[derive(Clone)]
struct Candidate {
    strength: f64,
    nodes: Vec<SymbolId>,
    kinds: Vec<DependencyKind>,
}

impl Candidate {
    /// Preference among equal-length candidates: stronger first, then
    /// lexicographically smaller node sequence.
    fn beats(&self, other: &Candidate) -> bool {
        if self.strength != other.strength {
            return self.strength > other.strength;
        }
        self.nodes < other.nodes
    }
}

/// Shortest-path and cycle queries over the forward adjacency.
pub struct PathFinder {
    tracker: Arc<DependencyTracker>,
}

impl PathFinder {
    pub fn new(tracker: Arc<DependencyTracker>) -> Self {
        PathFinder { tracker }
    }

    /// Find the shortest dependency path from `source` to `target`, or
    /// `None` when either endpoint is unknown or no route exists.
    pub fn find_dependency_path(
        &self,
        source: &SymbolId,
        target: &SymbolId,
    ) -> Option<DependencyPath> {
        let store = self.tracker.store();
        let src = store.resolve(source)?;
        let tgt = store.resolve(target)?;

        if src == tgt {
            // A symbol trivially reaches itself; flagged cyclic by definition.
            return Some(DependencyPath {
                source: source.clone(),
                target: target.clone(),
                nodes: vec![source.clone()],
                edge_kinds: Vec::new(),
                total_strength: 1.0,
                path_length: 0,
                is_cyclic: true,
            });
        }

        let max_hops = self.tracker.config().max_propagation_depth;
        let mut settled: HashSet<NodeId> = HashSet::from([src]);
        let mut frontier: Vec<(NodeId, Candidate)> = vec![(
            src,
            Candidate {
                strength: 1.0,
                nodes: vec![source.clone()],
                kinds: Vec::new(),
            },
        )];

        for _ in 0..max_hops {
            let mut next: HashMap<NodeId, Candidate> = HashMap::new();
            // Whole-layer expansion: every equal-length path to a node is
            // considered before the node is settled, so the tie-break sees
            // all candidates.
            frontier.sort_by(|a, b| a.1.nodes.cmp(&b.1.nodes));
            for (node, cand) in &frontier {
                for (neighbor, edge) in store.outgoing(*node) {
                    if settled.contains(&neighbor) {
                        continue;
                    }
                    let Some(symbol) = store.node_by_id(neighbor) else {
                        continue;
                    };
                    let mut nodes = cand.nodes.clone();
                    nodes.push(symbol.id.clone());
                    let mut kinds = cand.kinds.clone();
                    kinds.push(edge.kind);
                    let candidate = Candidate {
                        strength: cand.strength * f64::from(edge.strength),
                        nodes,
                        kinds,
                    };
                    match next.get(&neighbor) {
                        Some(existing) if !candidate.beats(existing) => {}
                        _ => {
                            next.insert(neighbor, candidate);
                        }
                    }
                }
            }
            if next.is_empty() {
                return None;
            }
            if let Some(cand) = next.get(&tgt) {
                return Some(DependencyPath {
                    source: source.clone(),
                    target: target.clone(),
                    path_length: cand.nodes.len() - 1,
                    total_strength: cand.strength as f32,
                    nodes: cand.nodes.clone(),
                    edge_kinds: cand.kinds.clone(),
                    is_cyclic: false,
                });
            }
            settled.extend(next.keys().copied());
            frontier = next.into_iter().collect();
        }
        None
    }
}
