//! Generic preorder traversal over the schema-typed edge set.
//!
//! The walk is depth-first and parent-before-children. Owning edges are
//! followed, cross edges are reported and followed only when enabled for their
//! kind. Several visitors run in lock-step; each may detach itself at any hook
//! and the run halts when none is left.
//!
//! The implementation is iterative (explicit frame stack) to avoid stack
//! overflow on deep ownership chains.

use super::visitor::{EdgeVisit, VisitContext, Visitor};
use crate::error::{AsgError, Result};
use crate::graph::{Arena, EdgeTarget, NodeId};
use crate::schema::{EdgeKind, EDGE_KIND_SLOTS};
use log::{debug, trace, warn};

/// Traversal driver. Configure the modes, then call [`run`](Self::run) or
/// [`run_from`](Self::run_from) with one or more visitors.
#[derive(Debug, Clone)]
pub struct AlgorithmPreorder {
    safe_mode: bool,
    visit_cross_edge_tree: bool,
    visit_special_nodes: bool,
    visit_used_special_only: bool,
    visit_filtered_edges: bool,
    cross_edges: [bool; EDGE_KIND_SLOTS],
    double_visits: Vec<NodeId>,
    visited_count: usize,
}

impl Default for AlgorithmPreorder {
    fn default() -> Self {
        Self {
            safe_mode: false,
            visit_cross_edge_tree: false,
            visit_special_nodes: true,
            visit_used_special_only: false,
            visit_filtered_edges: false,
            cross_edges: [false; EDGE_KIND_SLOTS],
            double_visits: Vec::new(),
            visited_count: 0,
        }
    }
}

impl AlgorithmPreorder {
    /// Driver with default modes: special nodes on, everything else off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip (and report) nodes reached a second time.
    pub fn set_safe_mode(&mut self, on: bool) -> &mut Self {
        self.safe_mode = on;
        self
    }

    /// After a rooted walk, also visit every node reached only through a cross edge.
    pub fn set_visit_cross_edge_tree(&mut self, on: bool) -> &mut Self {
        self.visit_cross_edge_tree = on;
        self
    }

    /// After a rooted walk, visit special nodes the walk did not reach.
    pub fn set_visit_special_nodes(&mut self, on: bool, used_only: bool) -> &mut Self {
        self.visit_special_nodes = on;
        self.visit_used_special_only = used_only;
        self
    }

    /// Ignore the filter for the duration of a run.
    pub fn set_visit_filtered_edges(&mut self, on: bool) -> &mut Self {
        self.visit_filtered_edges = on;
        self
    }

    /// Follow (or stop following) cross edges of one kind.
    pub fn set_cross_edge_to_traversal(&mut self, kind: EdgeKind, on: bool) -> &mut Self {
        self.cross_edges[kind.code() as usize] = on;
        self
    }

    /// Follow (or stop following) every cross edge kind.
    pub fn set_all_cross_edges_to_traversal(&mut self, on: bool) -> &mut Self {
        self.cross_edges = [on; EDGE_KIND_SLOTS];
        self
    }

    /// Whether cross edges of `kind` are followed.
    pub fn is_cross_edge_enabled(&self, kind: EdgeKind) -> bool {
        self.cross_edges[kind.code() as usize]
    }

    /// Nodes skipped by safe mode during the last run, one entry per encounter.
    ///
    /// Empty when the arena was configured not to record double visits.
    pub fn double_visits(&self) -> &[NodeId] {
        &self.double_visits
    }

    /// Number of node visits performed by the last run.
    pub fn visited_count(&self) -> usize {
        self.visited_count
    }

    /// Walk the whole arena: every unfiltered individual node in id order.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::NoVisitor`] if `visitors` is empty.
    pub fn run(&mut self, arena: &Arena, visitors: &mut [&mut dyn Visitor]) -> Result<()> {
        self.execute(arena, None, visitors)
    }

    /// Walk from one start node.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::NoVisitor`] if `visitors` is empty and
    /// [`AsgError::InvalidNodeId`] if `root` does not exist.
    pub fn run_from(
        &mut self,
        arena: &Arena,
        root: NodeId,
        visitors: &mut [&mut dyn Visitor],
    ) -> Result<()> {
        arena.get_ref(root)?;
        self.execute(arena, Some(root), visitors)
    }

    fn execute(
        &mut self,
        arena: &Arena,
        root: Option<NodeId>,
        visitors: &mut [&mut dyn Visitor],
    ) -> Result<()> {
        if visitors.is_empty() {
            return Err(AsgError::NoVisitor);
        }

        let _filter_guard = self
            .visit_filtered_edges
            .then(|| arena.filter().off_guard());

        let modes = Modes {
            safe_mode: self.safe_mode,
            cross_tree: self.visit_cross_edge_tree,
            special_nodes: self.visit_special_nodes,
            used_only: self.visit_special_nodes && self.visit_used_special_only,
            rooted: root.is_some(),
            record_doubles: arena.config().record_double_visits,
        };
        debug!(
            "Starting preorder: root={root:?}, visitors={}, safe_mode={}",
            visitors.len(),
            modes.safe_mode
        );

        let mut run = Run::new(arena, modes, &self.cross_edges, visitors);
        run.begin();
        match root {
            Some(root) => run.rooted(root),
            None => run.unrooted(),
        }
        run.finish();

        self.visited_count = run.visited_count;
        self.double_visits = run.double_visits;
        debug!(
            "Preorder finished: {} visits, {} double visits",
            self.visited_count,
            self.double_visits.len()
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Modes {
    safe_mode: bool,
    cross_tree: bool,
    special_nodes: bool,
    used_only: bool,
    rooted: bool,
    record_doubles: bool,
}

/// Node being expanded: its edge instances and the one currently open.
struct Frame {
    node: NodeId,
    edges: Vec<(EdgeKind, EdgeTarget)>,
    next: usize,
    open_edge: Option<EdgeVisit>,
}

/// State of a single traversal.
struct Run<'a, 'r, 'w> {
    arena: &'a Arena,
    modes: Modes,
    cross_edges: &'a [bool; EDGE_KIND_SLOTS],
    visitors: &'r mut [&'w mut dyn Visitor],
    active: Vec<bool>,
    active_count: usize,
    visited: Vec<bool>,
    deferred: Vec<bool>,
    depth: usize,
    halted: bool,
    visited_count: usize,
    double_visits: Vec<NodeId>,
}

impl<'a, 'r, 'w> Run<'a, 'r, 'w> {
    fn new(
        arena: &'a Arena,
        modes: Modes,
        cross_edges: &'a [bool; EDGE_KIND_SLOTS],
        visitors: &'r mut [&'w mut dyn Visitor],
    ) -> Self {
        let count = visitors.len();
        Self {
            arena,
            modes,
            cross_edges,
            visitors,
            active: vec![true; count],
            active_count: count,
            visited: vec![false; arena.len()],
            deferred: vec![false; arena.len()],
            depth: 0,
            halted: false,
            visited_count: 0,
            double_visits: Vec::new(),
        }
    }

    /// Call `hook` on every attached visitor, then detach the ones that asked to stop.
    fn each(&mut self, mut hook: impl FnMut(&mut dyn Visitor, &mut VisitContext<'a>)) {
        let mut stopped = Vec::new();
        for (index, visitor) in self.visitors.iter_mut().enumerate() {
            if !self.active[index] {
                continue;
            }
            let mut ctx = VisitContext::new(self.arena, self.depth);
            hook(&mut **visitor, &mut ctx);
            if ctx.stop_requested() {
                stopped.push(index);
            }
        }
        for index in stopped {
            if std::mem::replace(&mut self.active[index], false) {
                self.active_count -= 1;
                trace!("Visitor {index} detached");
            }
        }
        if self.active_count == 0 {
            self.halted = true;
        }
    }

    fn begin(&mut self) {
        self.each(|v, ctx| v.begin_visit(ctx));
    }

    fn finish(&mut self) {
        self.depth = 0;
        self.each(|v, ctx| v.finish_visit(ctx));
    }

    fn is_visited(&self, id: NodeId) -> bool {
        self.visited.get(id as usize).copied().unwrap_or(false)
    }

    fn unrooted(&mut self) {
        let arena = self.arena;
        for id in 0..arena.len() as NodeId {
            if self.halted {
                return;
            }
            let Some(node) = arena.get_pointer(id) else {
                continue;
            };
            if node.parent().is_none() && !arena.is_filtered(id) {
                self.traverse(id);
            }
        }
    }

    fn rooted(&mut self, root: NodeId) {
        self.traverse(root);

        let arena = self.arena;
        if self.modes.special_nodes && !self.modes.used_only {
            for id in 0..arena.len() as NodeId {
                if self.halted {
                    return;
                }
                let special = arena
                    .get_pointer(id)
                    .is_some_and(|node| node.kind().is_special());
                if special && !self.is_visited(id) && !arena.is_filtered(id) {
                    self.traverse(id);
                }
            }
        }

        if self.modes.cross_tree || self.modes.used_only {
            // Visiting a deferred node may defer further nodes; sweep until stable.
            loop {
                let mut progressed = false;
                for id in 0..arena.len() as NodeId {
                    if self.halted {
                        return;
                    }
                    if self.deferred[id as usize] && !self.is_visited(id) {
                        self.traverse(id);
                        progressed = true;
                    }
                }
                if !progressed {
                    break;
                }
            }
        }
    }

    /// Enter a node: safe-mode check, mark visited, run `visit` hooks.
    fn enter(&mut self, id: NodeId) -> Option<Frame> {
        let arena = self.arena;
        let node = arena.get_pointer(id)?;

        if self.modes.safe_mode && self.is_visited(id) {
            warn!("Preorder touched node {id} ({}) twice; skipping it", node.kind());
            if self.modes.record_doubles {
                self.double_visits.push(id);
            }
            return None;
        }
        if let Some(flag) = self.visited.get_mut(id as usize) {
            *flag = true;
        }
        self.visited_count += 1;
        trace!("Visiting node {id} ({})", node.kind());

        self.each(|v, ctx| v.visit(node, ctx));
        if self.halted {
            return None;
        }

        Some(Frame {
            node: id,
            edges: node.all_edges().map(|(kind, edge)| (kind, *edge)).collect(),
            next: 0,
            open_edge: None,
        })
    }

    /// Decide whether the target of an edge is entered now; record deferrals.
    fn should_descend(&mut self, kind: EdgeKind, target: NodeId) -> bool {
        let arena = self.arena;
        let Some(node) = arena.get_pointer(target) else {
            return false;
        };
        if arena.is_filtered(target) {
            return false;
        }

        let special = node.kind().is_special();
        let slot = target as usize;
        if kind.is_owning() {
            if self.modes.rooted && self.modes.used_only && special {
                self.deferred[slot] = true;
                return false;
            }
            return true;
        }

        if self.modes.rooted && (self.modes.cross_tree || (self.modes.used_only && special)) {
            self.deferred[slot] = true;
        }
        self.cross_edges[kind.code() as usize]
    }

    fn traverse(&mut self, start: NodeId) {
        let mut stack: Vec<Frame> = Vec::new();
        self.depth = 0;
        if let Some(frame) = self.enter(start) {
            stack.push(frame);
        }

        while !self.halted {
            let depth = stack.len().saturating_sub(1);
            let Some(frame) = stack.last_mut() else {
                break;
            };
            self.depth = depth;

            if let Some(edge) = frame.open_edge.take() {
                self.each(|v, ctx| v.visit_end_edge(&edge, ctx));
                continue;
            }

            if frame.next < frame.edges.len() {
                let (kind, instance) = frame.edges[frame.next];
                frame.next += 1;
                let edge = EdgeVisit {
                    kind,
                    source: frame.node,
                    target: instance.target,
                    assoc: instance.assoc,
                };
                frame.open_edge = Some(edge);

                self.each(|v, ctx| v.visit_edge(&edge, ctx));
                if self.halted {
                    break;
                }
                if self.should_descend(kind, instance.target) {
                    self.depth = depth + 1;
                    if let Some(child) = self.enter(instance.target) {
                        stack.push(child);
                    }
                }
            } else {
                let id = frame.node;
                stack.pop();
                if let Some(node) = self.arena.get_pointer(id) {
                    self.each(|v, ctx| v.visit_end(node, ctx));
                }
            }
        }
    }
}
