//! Consumer contract of the preorder traversal.

use crate::graph::{Arena, Assoc, Node, NodeId};
use crate::schema::EdgeKind;

/// One edge instance as reported to visitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeVisit {
    /// Declared edge kind
    pub kind: EdgeKind,
    /// Node carrying the edge
    pub source: NodeId,
    /// Node the edge points to
    pub target: NodeId,
    /// Data attached to this instance
    pub assoc: Assoc,
}

/// Per-call handle given to every visitor hook.
pub struct VisitContext<'a> {
    arena: &'a Arena,
    depth: usize,
    stop: bool,
}

impl<'a> VisitContext<'a> {
    pub(crate) fn new(arena: &'a Arena, depth: usize) -> Self {
        Self {
            arena,
            depth,
            stop: false,
        }
    }

    /// Arena being traversed.
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Depth of the current node below the node the walk started from.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Detach this visitor from the running traversal.
    ///
    /// The visitor receives no further hooks, `finish_visit` included. When the
    /// last visitor detaches the whole run halts.
    pub fn stop(&mut self) {
        self.stop = true;
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop
    }
}

/// Receives enter/exit callbacks for nodes and edges during a traversal.
///
/// Every hook has an empty default so visitors implement only what they need.
pub trait Visitor {
    /// Called once before the first node.
    fn begin_visit(&mut self, _ctx: &mut VisitContext<'_>) {}

    /// Called when a node is entered, before any of its edges.
    fn visit(&mut self, _node: &Node, _ctx: &mut VisitContext<'_>) {}

    /// Called after every edge of the node has been processed.
    fn visit_end(&mut self, _node: &Node, _ctx: &mut VisitContext<'_>) {}

    /// Called for every edge instance, before the target is (maybe) entered.
    fn visit_edge(&mut self, _edge: &EdgeVisit, _ctx: &mut VisitContext<'_>) {}

    /// Counterpart of [`Visitor::visit_edge`].
    fn visit_end_edge(&mut self, _edge: &EdgeVisit, _ctx: &mut VisitContext<'_>) {}

    /// Called once after the traversal completes.
    fn finish_visit(&mut self, _ctx: &mut VisitContext<'_>) {}
}

/// Collects the ids of visited nodes in visit order.
#[derive(Debug, Default)]
pub struct NodeCollector {
    /// Visited ids
    pub ids: Vec<NodeId>,
}

impl Visitor for NodeCollector {
    fn visit(&mut self, node: &Node, _ctx: &mut VisitContext<'_>) {
        self.ids.push(node.id());
    }
}
