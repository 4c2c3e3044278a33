//! Back-edge index derived from the forward edges.

use super::arena::Arena;
use super::node::{Node, NodeId};
use crate::algorithms::{AlgorithmPreorder, EdgeVisit, VisitContext, Visitor};
use crate::error::Result;
use crate::schema::{EdgeKind, NodeKind};
use log::debug;

/// Predicate deciding which forward edges are indexed.
///
/// Kept as two bitsets (edge kinds, concrete source kinds) so that a change of
/// selector can be detected by comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeSelector {
    edges: u64,
    sources: u64,
}

impl Default for EdgeSelector {
    fn default() -> Self {
        Self::all()
    }
}

impl EdgeSelector {
    /// Accept every forward edge.
    pub fn all() -> Self {
        Self {
            edges: u64::MAX,
            sources: u64::MAX,
        }
    }

    /// Accept only the listed edge kinds.
    pub fn edges(kinds: &[EdgeKind]) -> Self {
        let edges = kinds.iter().fold(0u64, |mask, k| mask | 1u64 << k.code());
        Self {
            edges,
            sources: u64::MAX,
        }
    }

    /// Restrict to sources that are (or derive from) one of `kinds`.
    pub fn with_source_kinds(mut self, kinds: &[NodeKind]) -> Self {
        self.sources = NodeKind::ALL
            .iter()
            .filter(|concrete| kinds.iter().any(|k| concrete.is_a(*k)))
            .fold(0u64, |mask, k| mask | 1u64 << k.code());
        self
    }

    /// Whether an edge of `kind` leaving a node of `source` is indexed.
    pub fn accepts(&self, source: NodeKind, kind: EdgeKind) -> bool {
        self.edges & (1u64 << kind.code()) != 0 && self.sources & (1u64 << source.code()) != 0
    }
}

/// For every node, the `(edge kind, source)` pairs pointing at it.
#[derive(Debug, Clone)]
pub struct ReverseEdges {
    selector: EdgeSelector,
    entries: Vec<Option<Vec<(EdgeKind, NodeId)>>>,
}

impl ReverseEdges {
    /// Build the index with a full safe-mode walk of the arena, filter ignored.
    pub(crate) fn build(arena: &Arena, selector: EdgeSelector) -> Result<Self> {
        let mut recorder = Recorder {
            index: ReverseEdges {
                selector,
                entries: vec![None; arena.len()],
            },
        };

        let mut preorder = AlgorithmPreorder::new();
        preorder.set_safe_mode(true).set_visit_filtered_edges(true);
        preorder.run(arena, &mut [&mut recorder])?;

        let index = recorder.index;
        debug!(
            "Built reverse edges: {} nodes, {} edges",
            index.node_count(),
            index.edge_count()
        );
        Ok(index)
    }

    /// Selector the index was built with.
    pub fn selector(&self) -> EdgeSelector {
        self.selector
    }

    /// Incoming `(edge kind, source)` pairs of a node, in insertion order.
    pub fn get(&self, id: NodeId) -> &[(EdgeKind, NodeId)] {
        self.entries
            .get(id as usize)
            .and_then(|e| e.as_deref())
            .unwrap_or(&[])
    }

    /// Sources pointing at `id` through one edge kind.
    pub fn sources(&self, id: NodeId, kind: EdgeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.get(id)
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, source)| *source)
    }

    /// Whether the node is registered in the index.
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.entries.get(id as usize), Some(Some(_)))
    }

    /// Registered nodes.
    pub fn node_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Indexed edge instances.
    pub fn edge_count(&self) -> usize {
        self.entries.iter().flatten().map(Vec::len).sum()
    }

    pub(crate) fn insert_node(&mut self, id: NodeId) {
        let slot = id as usize;
        if self.entries.len() <= slot {
            self.entries.resize(slot + 1, None);
        }
        self.entries[slot].get_or_insert_with(Vec::new);
    }

    /// Unregister a node and hand back its incoming pairs.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Vec<(EdgeKind, NodeId)> {
        self.entries
            .get_mut(id as usize)
            .and_then(Option::take)
            .unwrap_or_default()
    }

    pub(crate) fn insert_edge(
        &mut self,
        source_kind: NodeKind,
        source: NodeId,
        kind: EdgeKind,
        target: NodeId,
    ) {
        if !self.selector.accepts(source_kind, kind) {
            return;
        }
        self.insert_node(target);
        if let Some(Some(list)) = self.entries.get_mut(target as usize) {
            list.push((kind, source));
        }
    }

    /// Re-apply the selector to the outgoing edges of a node whose kind changed.
    pub(crate) fn reindex_source(
        &mut self,
        source: NodeId,
        old_kind: NodeKind,
        new_kind: NodeKind,
        edges: &[(EdgeKind, NodeId)],
    ) {
        for &(kind, target) in edges {
            let before = self.selector.accepts(old_kind, kind);
            let after = self.selector.accepts(new_kind, kind);
            if before && !after {
                self.remove_edge(target, kind, source);
            } else if after && !before {
                self.insert_edge(new_kind, source, kind, target);
            }
        }
    }

    /// Remove one `(kind, source)` pair from `target`.
    pub(crate) fn remove_edge(&mut self, target: NodeId, kind: EdgeKind, source: NodeId) {
        if let Some(Some(list)) = self.entries.get_mut(target as usize) {
            if let Some(pos) = list.iter().position(|e| *e == (kind, source)) {
                list.remove(pos);
            }
        }
    }
}

struct Recorder {
    index: ReverseEdges,
}

impl Visitor for Recorder {
    fn visit(&mut self, node: &Node, _ctx: &mut VisitContext<'_>) {
        self.index.insert_node(node.id());
    }

    fn visit_edge(&mut self, edge: &EdgeVisit, ctx: &mut VisitContext<'_>) {
        if let Some(source) = ctx.arena().get_pointer(edge.source) {
            self.index
                .insert_edge(source.kind(), edge.source, edge.kind, edge.target);
        }
    }
}
