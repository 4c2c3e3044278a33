//! Node arena: identity-stable storage, creation, destruction and edges.

use super::filter::{Filter, FilterOffGuard, FilterState};
use super::interning::Interner;
use super::node::{Assoc, EdgeTarget, NamedFields, Node, NodeData, NodeId, PackageData};
use super::reverse::{EdgeSelector, ReverseEdges};
use crate::algorithms::{AlgorithmPreorder, NodeCollector};
use crate::config::ArenaConfig;
use crate::error::{AsgError, Result};
use crate::persistence::RawHeader;
use crate::schema::{EdgeKind, Language, Multiplicity, NodeKind, PackageKind};
use crate::strtable::{Key, StringTable};
use log::{debug, trace, warn};
use std::collections::{HashSet, VecDeque};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Ids below this bound are never handed out by [`Arena::create_node`].
pub const RESERVED_IDS: NodeId = 100;

/// Highest id an arena accepts for an explicit creation or a load.
pub const MAX_NODE_ID: NodeId = 0x03FF_FFFF;

/// Id of the root package singleton.
pub const ROOT_PACKAGE_ID: NodeId = 100;

/// Id of the file-system root singleton.
pub const FILE_SYSTEM_ID: NodeId = 101;

/// Id of the root component singleton.
pub const ROOT_COMPONENT_ID: NodeId = 102;

/// Receives every node right before the arena destroys it.
pub trait DestroyObserver {
    /// Called once per destroyed node, while the node is still intact.
    fn on_destroy_node(&mut self, node: &Node);
}

/// Handle returned by [`Arena::register_destroy_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Owner of every node of one graph.
///
/// Nodes refer to each other by [`NodeId`] only. Freed ids are reused oldest
/// first; the filter, the optional reverse-edge index, the interning caches and
/// the string table are side tables kept consistent by every mutation.
pub struct Arena {
    config: ArenaConfig,
    nodes: Vec<Option<Node>>,
    free_ids: VecDeque<NodeId>,
    filter: Filter,
    reverse: Option<ReverseEdges>,
    strings: StringTable,
    pub(crate) interner: Interner,
    observers: Vec<(ObserverId, Box<dyn DestroyObserver>)>,
    next_observer: u64,
    pub(crate) unknown_headers: Vec<RawHeader>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(ArenaConfig::default())
    }
}

impl Arena {
    /// Create an arena holding only the singleton nodes.
    pub fn new(config: ArenaConfig) -> Self {
        let mut arena = Self::empty(config);

        let root_name = arena.strings.set(&arena.config.root_package_name);
        let mut root = PackageData::default();
        root.named.name = root_name;
        root.package_kind = PackageKind::Root;
        arena.install(ROOT_PACKAGE_ID, NodeData::Package(root));

        let fs_name = arena.strings.set("FileSystem");
        arena.install(FILE_SYSTEM_ID, NodeData::FileSystem(NamedFields { name: fs_name }));

        let system = arena.strings.set("<System>");
        arena.install(ROOT_COMPONENT_ID, NodeData::Component(NamedFields { name: system }));
        arena
            .interner
            .components
            .insert("<System>".to_string(), ROOT_COMPONENT_ID);

        debug!(
            "Created arena: language={}, root package={:?}",
            arena.config.language, arena.config.root_package_name
        );
        arena
    }

    /// Arena without any node, used as the target of a load.
    pub(crate) fn empty(config: ArenaConfig) -> Self {
        Self {
            config,
            nodes: (0..RESERVED_IDS).map(|_| None).collect(),
            free_ids: VecDeque::new(),
            filter: Filter::new(),
            reverse: None,
            strings: StringTable::new(),
            interner: Interner::default(),
            observers: Vec::new(),
            next_observer: 0,
            unknown_headers: Vec::new(),
        }
    }

    /// Configuration the arena was created with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Source language of the graph.
    pub fn language(&self) -> Language {
        self.config.language
    }

    /// Scope separator of the graph's language.
    pub fn scope_separator(&self) -> &'static str {
        self.config.language.scope_separator()
    }

    /// Root package singleton.
    pub fn root_package(&self) -> NodeId {
        ROOT_PACKAGE_ID
    }

    /// File-system root singleton.
    pub fn file_system(&self) -> NodeId {
        FILE_SYSTEM_ID
    }

    /// Root component singleton.
    pub fn root_component(&self) -> NodeId {
        ROOT_COMPONENT_ID
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    /// Number of slots (highest id + 1), empty slots included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the arena has no slot at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of existing nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether a node with this id exists.
    pub fn get_exist(&self, id: NodeId) -> bool {
        self.get_pointer(id).is_some()
    }

    /// Node by id.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if the slot is out of range or empty.
    pub fn get_ref(&self, id: NodeId) -> Result<&Node> {
        self.get_pointer(id).ok_or(AsgError::InvalidNodeId { id })
    }

    /// Node by id, `None` for holes.
    pub fn get_pointer(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize).and_then(Option::as_ref)
    }

    /// Mutable node by id.
    ///
    /// Shared value nodes (interned kinds, comments, components) are keyed by
    /// their content and cannot be borrowed mutably.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if the slot is out of range or empty
    /// and [`AsgError::InvalidNodeKind`] for shared value nodes.
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        let node = self.node_mut(id)?;
        let kind = node.kind();
        if kind.is_interned() || matches!(kind, NodeKind::Comment | NodeKind::Component) {
            return Err(AsgError::InvalidNodeKind {
                kind,
                reason: "shared value node",
            });
        }
        Ok(node)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id as usize)
            .and_then(Option::as_mut)
            .ok_or(AsgError::InvalidNodeId { id })
    }

    /// Existing node without an owner.
    pub fn get_is_individual(&self, id: NodeId) -> bool {
        self.get_pointer(id).is_some_and(|node| node.parent().is_none())
    }

    /// Existing, unfiltered nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.iter_all().filter(|node| !self.filter.get_is_filtered(node.id()))
    }

    /// Existing nodes in id order, filter ignored.
    pub fn iter_all(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().flatten()
    }

    /// Ids that the next creations will reuse, oldest first.
    pub fn free_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.free_ids.iter().copied()
    }

    // ---------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------

    /// Create a node of a directly constructible kind.
    ///
    /// Reuses the oldest freed id if there is one, otherwise appends.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeKind`] for abstract kinds and for kinds
    /// that only an interning factory may create.
    pub fn create_node(&mut self, kind: NodeKind) -> Result<NodeId> {
        if kind.is_abstract() {
            return Err(AsgError::InvalidNodeKind {
                kind,
                reason: "abstract kind",
            });
        }
        if !kind.is_directly_constructible() {
            return Err(AsgError::InvalidNodeKind {
                kind,
                reason: "created through its factory",
            });
        }
        let data = NodeData::new(kind).ok_or(AsgError::InvalidNodeKind {
            kind,
            reason: "abstract kind",
        })?;
        Ok(self.create_with_data(data))
    }

    /// Create a node at an explicit id, bypassing the free list.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeKind`] for abstract kinds,
    /// [`AsgError::InvalidNodeId`] for ids in the reserved region or above
    /// [`MAX_NODE_ID`], [`AsgError::DuplicateNodeId`] if the slot is occupied
    /// and [`AsgError::Corrupt`] if the slots cannot be allocated.
    pub fn create_node_with_id(&mut self, kind: NodeKind, id: NodeId) -> Result<NodeId> {
        let data = NodeData::new(kind).ok_or(AsgError::InvalidNodeKind {
            kind,
            reason: "abstract kind",
        })?;
        self.check_explicit_id(id)?;
        self.free_ids.retain(|&free| free != id);
        self.install(id, data);
        Ok(id)
    }

    /// Validate an id chosen by the caller (or a file) and make room for it.
    pub(crate) fn check_explicit_id(&mut self, id: NodeId) -> Result<()> {
        if !(RESERVED_IDS..=MAX_NODE_ID).contains(&id) {
            return Err(AsgError::InvalidNodeId { id });
        }
        if self.get_exist(id) {
            return Err(AsgError::DuplicateNodeId { id });
        }
        let missing = (id as usize + 1).saturating_sub(self.nodes.len());
        self.nodes.try_reserve_exact(missing).map_err(|_| {
            AsgError::corrupt(format!("cannot allocate {missing} slots for node {id}"))
        })?;
        self.filter.try_reserve(id as usize + 1)
    }

    pub(crate) fn create_with_data(&mut self, data: NodeData) -> NodeId {
        let id = self.next_id();
        self.install(id, data);
        id
    }

    fn next_id(&mut self) -> NodeId {
        while let Some(id) = self.free_ids.pop_front() {
            if !self.get_exist(id) {
                return id;
            }
        }
        self.nodes.len() as NodeId
    }

    /// Put a new node into its slot and register it with the side tables.
    pub(crate) fn install(&mut self, id: NodeId, data: NodeData) {
        let slot = id as usize;
        if self.nodes.len() <= slot {
            self.nodes.resize_with(slot + 1, || None);
        }
        let kind = data.kind();
        self.nodes[slot] = Some(Node::new(id, data));
        self.filter.grow(self.nodes.len());
        self.filter.set_not_filtered(id);
        if let Some(reverse) = self.reverse.as_mut() {
            reverse.insert_node(id);
        }
        debug!("Created node: id={id}, kind={kind}");
    }

    // ---------------------------------------------------------------
    // Edges
    // ---------------------------------------------------------------

    /// Add an edge without association data.
    ///
    /// # Errors
    ///
    /// See [`Arena::add_edge_with`].
    pub fn add_edge(&mut self, source: NodeId, kind: EdgeKind, target: NodeId) -> Result<()> {
        self.add_edge_with(source, kind, target, Assoc::None)
    }

    /// Add an edge instance.
    ///
    /// Single edges are replaced, set edges ignore a duplicate target, list
    /// edges append. Owning edges make `source` the parent of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if either end is missing,
    /// [`AsgError::InvalidEdge`] if the kinds or the association do not fit the
    /// schema or the edge defines an interned value, [`AsgError::AlreadyOwned`]
    /// if an owning edge targets a node that already has a parent.
    pub fn add_edge_with(
        &mut self,
        source: NodeId,
        kind: EdgeKind,
        target: NodeId,
        assoc: Assoc,
    ) -> Result<()> {
        if kind.defines_value() {
            return Err(AsgError::InvalidEdge {
                kind,
                source_id: source,
                target_id: target,
                reason: "defines an interned value",
            });
        }
        self.link(source, kind, target, assoc)
    }

    /// Edge insertion shared with the interning factories.
    pub(crate) fn link(
        &mut self,
        source: NodeId,
        kind: EdgeKind,
        target: NodeId,
        assoc: Assoc,
    ) -> Result<()> {
        let info = kind.info();
        let source_kind = self.get_ref(source)?.kind();
        let target_node = self.get_ref(target)?;
        let invalid = |reason| AsgError::InvalidEdge {
            kind,
            source_id: source,
            target_id: target,
            reason,
        };

        if !source_kind.is_a(info.source) {
            return Err(invalid("source kind does not carry this edge"));
        }
        if !target_node.kind().is_a(info.target) {
            return Err(invalid("target kind does not match"));
        }
        if assoc.kind() != info.assoc {
            return Err(invalid("association kind does not match"));
        }
        if info.owning {
            if let Some(parent) = target_node.parent() {
                return Err(AsgError::AlreadyOwned {
                    id: target,
                    parent,
                });
            }
            if target == source || self.is_ancestor(target, source) {
                return Err(invalid("ownership cycle"));
            }
        }

        let node = self.node_mut(source)?;
        let list = node
            .edges_mut(kind)
            .ok_or_else(|| invalid("source kind does not carry this edge"))?;
        let mut displaced = None;
        match info.multiplicity {
            Multiplicity::One => {
                displaced = list.pop().map(|e| e.target);
                list.push(EdgeTarget { target, assoc });
            }
            Multiplicity::Set => {
                if list.iter().any(|e| e.target == target) {
                    return Ok(());
                }
                list.push(EdgeTarget { target, assoc });
            }
            Multiplicity::List => list.push(EdgeTarget { target, assoc }),
        }

        if info.owning {
            self.node_mut(target)?.set_parent(Some(source));
        }
        if let Some(reverse) = self.reverse.as_mut() {
            if let Some(old) = displaced {
                reverse.remove_edge(old, kind, source);
            }
            reverse.insert_edge(source_kind, source, kind, target);
        }
        trace!("Added edge: {source} -[{kind}]-> {target}");
        Ok(())
    }

    /// Remove the first instance of an edge.
    ///
    /// Returns `false` if no such instance exists.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if `source` does not exist and
    /// [`AsgError::InvalidEdge`] if the edge defines an interned value.
    pub fn remove_edge(&mut self, source: NodeId, kind: EdgeKind, target: NodeId) -> Result<bool> {
        if kind.defines_value() {
            return Err(AsgError::InvalidEdge {
                kind,
                source_id: source,
                target_id: target,
                reason: "defines an interned value",
            });
        }
        let node = self.node_mut(source)?;
        let Some(list) = node.edges_mut(kind) else {
            return Ok(false);
        };
        let Some(pos) = list.iter().position(|e| e.target == target) else {
            return Ok(false);
        };
        list.remove(pos);

        if kind.is_owning() {
            if let Ok(child) = self.node_mut(target) {
                child.set_parent(None);
            }
        }
        if let Some(reverse) = self.reverse.as_mut() {
            reverse.remove_edge(target, kind, source);
        }
        trace!("Removed edge: {source} -[{kind}]-> {target}");
        Ok(true)
    }

    fn is_ancestor(&self, candidate: NodeId, id: NodeId) -> bool {
        let mut current = self.get_pointer(id).and_then(Node::parent);
        while let Some(parent) = current {
            if parent == candidate {
                return true;
            }
            current = self.get_pointer(parent).and_then(Node::parent);
        }
        false
    }

    /// Recompute every parent link from the owning edges.
    pub(crate) fn recompute_parents(&mut self) {
        let links: Vec<(NodeId, NodeId)> = self
            .iter_all()
            .flat_map(|node| {
                node.all_edges()
                    .filter(|(kind, _)| kind.is_owning())
                    .map(move |(_, edge)| (edge.target, node.id()))
            })
            .collect();
        for node in self.nodes.iter_mut().flatten() {
            node.set_parent(None);
        }
        for (child, parent) in links {
            if let Ok(node) = self.node_mut(child) {
                node.set_parent(Some(parent));
            }
        }
    }

    // ---------------------------------------------------------------
    // Destruction and replacement
    // ---------------------------------------------------------------

    /// Destroy a node and everything it owns.
    ///
    /// Every destroyed node is first reported to the destroy observers. Forward
    /// edges of surviving nodes that pointed into the subtree are removed. The
    /// freed ids go to the back of the free list.
    ///
    /// Returns the destroyed ids in preorder.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::ReverseEdgesDisabled`] if the reverse index is off
    /// and [`AsgError::NodeDoesNotExist`] if `id` does not exist.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        if self.reverse.is_none() {
            return Err(AsgError::ReverseEdgesDisabled);
        }
        if !self.get_exist(id) {
            return Err(AsgError::NodeDoesNotExist { id });
        }

        let subtree = self.collect_subtree(id)?;
        debug!("Destroying node {id} with {} owned nodes", subtree.len() - 1);
        self.notify_destroy(&subtree);

        let doomed: HashSet<NodeId> = subtree.iter().copied().collect();
        for &node in &subtree {
            self.release(node, &doomed);
        }
        Ok(subtree)
    }

    /// Destroy exactly one node. Nodes it owned become individuals.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::destroy_node`].
    pub fn destroy_this_node_only(&mut self, id: NodeId) -> Result<()> {
        if self.reverse.is_none() {
            return Err(AsgError::ReverseEdgesDisabled);
        }
        let node = self.get_pointer(id).ok_or(AsgError::NodeDoesNotExist { id })?;
        let children: Vec<NodeId> = node
            .all_edges()
            .filter(|(kind, _)| kind.is_owning())
            .map(|(_, edge)| edge.target)
            .collect();

        debug!("Destroying single node {id}");
        self.notify_destroy(&[id]);
        self.release(id, &HashSet::from([id]));
        for child in children {
            if let Ok(node) = self.node_mut(child) {
                node.set_parent(None);
            }
        }
        Ok(())
    }

    /// Owned subtree of a node in preorder, filter ignored.
    fn collect_subtree(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut collector = NodeCollector::default();
        let mut preorder = AlgorithmPreorder::new();
        preorder
            .set_safe_mode(true)
            .set_visit_special_nodes(false, false)
            .set_visit_filtered_edges(true);
        preorder.run_from(self, id, &mut [&mut collector])?;
        Ok(collector.ids)
    }

    fn notify_destroy(&mut self, ids: &[NodeId]) {
        for &id in ids {
            let Some(node) = self.nodes.get(id as usize).and_then(Option::as_ref) else {
                continue;
            };
            for (_, observer) in self.observers.iter_mut() {
                observer.on_destroy_node(node);
            }
        }
    }

    /// Remove one node from every table. Edges from nodes outside `doomed`
    /// that still point to it are dropped.
    fn release(&mut self, id: NodeId, doomed: &HashSet<NodeId>) {
        let Some(node) = self.nodes.get_mut(id as usize).and_then(Option::take) else {
            return;
        };

        if let Some(parent) = node.parent().filter(|p| !doomed.contains(p)) {
            self.unlink(parent, id);
        }

        if let Some(reverse) = self.reverse.as_mut() {
            for (kind, edge) in node.all_edges() {
                reverse.remove_edge(edge.target, kind, id);
            }
            let incoming = reverse.remove_node(id);
            for (kind, source) in incoming {
                if doomed.contains(&source) {
                    continue;
                }
                if let Some(list) = self
                    .nodes
                    .get_mut(source as usize)
                    .and_then(Option::as_mut)
                    .and_then(|n| n.edges_mut(kind))
                {
                    list.retain(|e| e.target != id);
                }
                if !kind.is_owning() {
                    warn!("Removed dangling edge {source} -[{kind}]-> {id}");
                }
            }
        }

        self.interner.forget(id);
        self.filter.set_not_filtered(id);
        self.free_ids.push_back(id);
        trace!("Released node {id} ({})", node.kind());
    }

    /// Drop every owning edge from `parent` to `child`.
    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        let Some(node) = self.nodes.get_mut(parent as usize).and_then(Option::as_mut) else {
            return;
        };
        let owning: Vec<EdgeKind> = node
            .kind()
            .edge_kinds()
            .iter()
            .copied()
            .filter(|k| k.is_owning())
            .collect();
        for kind in owning {
            if let Some(list) = node.edges_mut(kind) {
                list.retain(|e| e.target != child);
            }
        }
    }

    /// Upgrade a node in place to its more specific kind, keeping id, fields
    /// and edges: `Class` becomes `ClassGeneric`, `Method` becomes `MethodGeneric`.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if the node does not exist and
    /// [`AsgError::ReplaceUnsupported`] for any other kind.
    pub fn replace_node(&mut self, id: NodeId) -> Result<NodeKind> {
        let node = self.node_mut(id)?;
        let data = match node.data() {
            NodeData::Class(fields) => NodeData::ClassGeneric(*fields),
            NodeData::Method(fields) => NodeData::MethodGeneric(*fields),
            _ => {
                return Err(AsgError::ReplaceUnsupported {
                    id,
                    kind: node.kind(),
                })
            }
        };
        let old_kind = node.kind();
        node.upgrade(data);
        let new_kind = node.kind();
        if let Some(reverse) = self.reverse.as_mut() {
            let edges: Vec<(EdgeKind, NodeId)> = self
                .nodes
                .get(id as usize)
                .and_then(Option::as_ref)
                .map(|node| node.all_edges().map(|(kind, e)| (kind, e.target)).collect())
                .unwrap_or_default();
            reverse.reindex_source(id, old_kind, new_kind, &edges);
        }
        debug!("Replaced node {id}: {old_kind} -> {new_kind}");
        Ok(new_kind)
    }

    /// Remove every node and start over with only the singletons.
    ///
    /// Destroy observers are told about every removed node and stay registered.
    pub fn clear(&mut self) {
        let ids: Vec<NodeId> = self.iter_all().map(Node::id).collect();
        self.notify_destroy(&ids);
        let observers = std::mem::take(&mut self.observers);
        let next_observer = self.next_observer;
        *self = Arena::new(self.config.clone());
        self.observers = observers;
        self.next_observer = next_observer;
    }

    /// Replace the whole content with another arena's, keeping observers.
    pub(crate) fn replace_content(&mut self, mut other: Arena) {
        other.observers = std::mem::take(&mut self.observers);
        other.next_observer = self.next_observer;
        *self = other;
    }

    /// Rebuild the free list as the ascending holes above the reserved region.
    pub(crate) fn recompute_free_ids(&mut self) {
        self.free_ids = self
            .nodes
            .iter()
            .enumerate()
            .skip(RESERVED_IDS as usize)
            .filter(|(_, slot)| slot.is_none())
            .map(|(id, _)| id as NodeId)
            .collect();
    }

    // ---------------------------------------------------------------
    // Observers
    // ---------------------------------------------------------------

    /// Register an observer told about every node before it is destroyed.
    pub fn register_destroy_observer(&mut self, observer: Box<dyn DestroyObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Unregister an observer and hand it back.
    pub fn unregister_destroy_observer(
        &mut self,
        id: ObserverId,
    ) -> Option<Box<dyn DestroyObserver>> {
        let pos = self.observers.iter().position(|(oid, _)| *oid == id)?;
        Some(self.observers.remove(pos).1)
    }

    // ---------------------------------------------------------------
    // Filter
    // ---------------------------------------------------------------

    /// The per-node filter.
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Mark one node `Filtered`.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if the node does not exist.
    pub fn set_filtered(&mut self, id: NodeId) -> Result<()> {
        self.get_ref(id)?;
        self.filter.set_filtered(id);
        Ok(())
    }

    /// Mark one node `NotFiltered`.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if the node does not exist.
    pub fn set_not_filtered(&mut self, id: NodeId) -> Result<()> {
        self.get_ref(id)?;
        self.filter.set_not_filtered(id);
        Ok(())
    }

    /// Hide one node while keeping what it owns reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if the node does not exist.
    pub fn set_filtered_this_node_only(&mut self, id: NodeId) -> Result<()> {
        self.get_ref(id)?;
        self.filter.set_filtered_this_node_only(id);
        Ok(())
    }

    /// Show one node again, leaving its neighbours untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if the node does not exist.
    pub fn set_not_filtered_this_node_only(&mut self, id: NodeId) -> Result<()> {
        self.get_ref(id)?;
        self.filter.set_not_filtered_this_node_only(id);
        Ok(())
    }

    /// Reset every node to `NotFiltered`.
    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }

    /// Shorthand for `filter().get_is_filtered(id)`.
    pub fn is_filtered(&self, id: NodeId) -> bool {
        self.filter.get_is_filtered(id)
    }

    /// Switch filtering on.
    pub fn turn_filter_on(&self) {
        self.filter.turn_on();
    }

    /// Switch filtering off.
    pub fn turn_filter_off(&self) {
        self.filter.turn_off();
    }

    /// Switch filtering off until the guard is dropped.
    pub fn filter_off_guard(&self) -> FilterOffGuard<'_> {
        self.filter.off_guard()
    }

    /// Filter a node together with everything it owns.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if the node does not exist.
    pub fn filter_subtree(&mut self, id: NodeId) -> Result<()> {
        for node in self.collect_subtree(id)? {
            self.filter.set_state(node, FilterState::Filtered);
        }
        Ok(())
    }

    /// Make a node, everything it owns and all its owners visible again.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if the node does not exist.
    pub fn unfilter_with_ancestors(&mut self, id: NodeId) -> Result<()> {
        for node in self.collect_subtree(id)? {
            self.filter.set_not_filtered(node);
        }
        let mut current = self.get_ref(id)?.parent();
        while let Some(parent) = current {
            self.filter.set_not_filtered(parent);
            current = self.get_pointer(parent).and_then(Node::parent);
        }
        Ok(())
    }

    /// Write the filter to a standalone file.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::Io`] if the file cannot be written.
    pub fn save_filter<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| AsgError::io(format!("creating filter {}", path.display()), e))?;
        let mut out = BufWriter::new(file);
        self.filter.save(&mut out)?;
        std::io::Write::flush(&mut out)?;
        Ok(())
    }

    /// Load a filter file written by [`Arena::save_filter`].
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::FilterMismatch`] if the file has more entries than
    /// this arena has slots, [`AsgError::Io`] on read failures.
    pub fn load_filter<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| AsgError::io(format!("opening filter {}", path.display()), e))?;
        let len = self.nodes.len();
        self.filter.load(&mut BufReader::new(file), len)
    }

    // ---------------------------------------------------------------
    // Reverse edges
    // ---------------------------------------------------------------

    /// Build (or rebuild) the reverse-edge index.
    ///
    /// Enabling with the selector already in use is a no-op; a different
    /// selector discards the old index.
    ///
    /// # Errors
    ///
    /// Propagates traversal errors.
    pub fn enable_reverse_edges(&mut self, selector: EdgeSelector) -> Result<()> {
        if let Some(current) = &self.reverse {
            if current.selector() == selector {
                return Ok(());
            }
            warn!("Reverse edge selector changed; rebuilding the index");
        }
        let index = ReverseEdges::build(self, selector)?;
        self.reverse = Some(index);
        Ok(())
    }

    /// Drop the reverse-edge index.
    pub fn disable_reverse_edges(&mut self) {
        if self.reverse.take().is_some() {
            debug!("Reverse edges disabled");
        }
    }

    /// Whether the reverse-edge index is maintained.
    pub fn is_reverse_edges_enabled(&self) -> bool {
        self.reverse.is_some()
    }

    /// The reverse-edge index.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::ReverseEdgesDisabled`] if it is not enabled.
    pub fn reverse_edges(&self) -> Result<&ReverseEdges> {
        self.reverse.as_ref().ok_or(AsgError::ReverseEdgesDisabled)
    }

    // ---------------------------------------------------------------
    // Strings
    // ---------------------------------------------------------------

    /// Intern a string.
    pub fn set_string(&mut self, text: &str) -> Key {
        self.strings.set(text)
    }

    /// Resolve a string key.
    pub fn get_string(&self, key: Key) -> &str {
        self.strings.get(key)
    }

    /// The string table.
    pub fn string_table(&self) -> &StringTable {
        &self.strings
    }

    pub(crate) fn set_string_table(&mut self, table: StringTable) {
        self.strings = table;
    }

    /// Move every string reference into `table` and return the previous table.
    ///
    /// Node scalars and textual edge associations are re-keyed.
    pub fn swap_string_table(&mut self, mut table: StringTable) -> StringTable {
        let map = self.strings.remap_into(&mut table);
        let mut remap = |key: &mut Key| {
            if let Some(new) = map.get(*key as usize) {
                *key = *new;
            }
        };
        for node in self.nodes.iter_mut().flatten() {
            node.for_each_key_mut(&mut remap);
        }
        debug!("Swapped string table: {} strings re-keyed", map.len());
        std::mem::replace(&mut self.strings, table)
    }

    /// Name of a `Named` node, empty for other kinds and missing ids.
    pub fn name(&self, id: NodeId) -> &str {
        self.get_pointer(id)
            .and_then(Node::name_key)
            .map(|key| self.strings.get(key))
            .unwrap_or("")
    }

    /// Set the name of a `Named` node.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if the node does not exist and
    /// [`AsgError::InvalidNodeKind`] if it is not `Named`.
    pub fn set_name(&mut self, id: NodeId, name: &str) -> Result<()> {
        let key = self.strings.set(name);
        let node = self.get_mut(id)?;
        let kind = node.kind();
        let named = node.data_mut().named_mut().ok_or(AsgError::InvalidNodeKind {
            kind,
            reason: "not a Named kind",
        })?;
        named.name = key;
        Ok(())
    }
}
