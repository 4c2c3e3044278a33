//! Content-addressed factories for value-like nodes.
//!
//! Two requests for structurally identical values (same simple type kind, same
//! sequence of type formers, same called method, ...) return the same node.

use super::arena::Arena;
use super::node::{Assoc, NamedFields, NodeData, NodeId};
use crate::error::{AsgError, Result};
use crate::schema::{EdgeKind, NodeKind, ParameterKind, PointerKind, SimpleTypeKind};
use log::trace;
use std::collections::HashMap;
use std::hash::Hash;

/// Map from a value's defining content to its canonical node.
#[derive(Debug, Clone)]
pub(crate) struct InternCache<K> {
    map: HashMap<K, NodeId>,
}

impl<K> Default for InternCache<K> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq> InternCache<K> {
    pub(crate) fn get(&self, key: &K) -> Option<NodeId> {
        self.map.get(key).copied()
    }

    /// Register `id` unless the key already has a canonical node.
    pub(crate) fn insert(&mut self, key: K, id: NodeId) {
        self.map.entry(key).or_insert(id);
    }

    pub(crate) fn forget(&mut self, id: NodeId) {
        self.map.retain(|_, v| *v != id);
    }

    /// Drop every entry whose key no longer describes a live value.
    pub(crate) fn retain_keys(&mut self, keep: impl Fn(&K) -> bool) {
        self.map.retain(|k, _| keep(k));
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}

/// Accumulators for values assembled in several calls before lookup.
#[derive(Debug, Clone)]
pub(crate) struct BuildStack<T> {
    frames: Vec<T>,
}

impl<T> Default for BuildStack<T> {
    fn default() -> Self {
        Self { frames: Vec::new() }
    }
}

impl<T> BuildStack<T> {
    fn begin(&mut self, frame: T) {
        self.frames.push(frame);
    }

    fn top(&mut self, what: &'static str) -> Result<&mut T> {
        self.frames
            .last_mut()
            .ok_or(AsgError::EmptyBuildStack { what })
    }

    fn end(&mut self, what: &'static str) -> Result<T> {
        self.frames.pop().ok_or(AsgError::EmptyBuildStack { what })
    }
}

/// Imprint of a function signature former.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct Signature {
    return_type: Option<NodeId>,
    parameters: Vec<(NodeId, ParameterKind)>,
}

/// Every interning cache of one arena.
#[derive(Debug, Clone, Default)]
pub(crate) struct Interner {
    pub(crate) simple_types: InternCache<SimpleTypeKind>,
    pub(crate) pointers: InternCache<PointerKind>,
    pub(crate) arrays: InternCache<()>,
    pub(crate) non_types: InternCache<()>,
    pub(crate) type_refs: InternCache<NodeId>,
    pub(crate) types: InternCache<Vec<NodeId>>,
    pub(crate) signatures: InternCache<Signature>,
    pub(crate) method_calls: InternCache<NodeId>,
    pub(crate) call_imprints: InternCache<String>,
    pub(crate) attribute_accesses: InternCache<NodeId>,
    pub(crate) friendships: InternCache<NodeId>,
    pub(crate) components: InternCache<String>,
    pub(crate) comments: InternCache<String>,
    type_stack: BuildStack<Vec<NodeId>>,
    signature_stack: BuildStack<Signature>,
}

impl Interner {
    /// Drop `id` from every cache, as a canonical node and as part of a key.
    pub(crate) fn forget(&mut self, id: NodeId) {
        self.type_refs.retain_keys(|target| *target != id);
        self.types.retain_keys(|formers| !formers.contains(&id));
        self.signatures.retain_keys(|sig| {
            sig.return_type != Some(id) && sig.parameters.iter().all(|(ty, _)| *ty != id)
        });
        self.method_calls.retain_keys(|method| *method != id);
        self.attribute_accesses.retain_keys(|attribute| *attribute != id);
        self.friendships.retain_keys(|friend| *friend != id);

        self.simple_types.forget(id);
        self.pointers.forget(id);
        self.arrays.forget(id);
        self.non_types.forget(id);
        self.type_refs.forget(id);
        self.types.forget(id);
        self.signatures.forget(id);
        self.method_calls.forget(id);
        self.call_imprints.forget(id);
        self.attribute_accesses.forget(id);
        self.friendships.forget(id);
        self.components.forget(id);
        self.comments.forget(id);
    }

    /// Number of interned values across all caches.
    pub(crate) fn len(&self) -> usize {
        self.simple_types.len()
            + self.pointers.len()
            + self.arrays.len()
            + self.non_types.len()
            + self.type_refs.len()
            + self.types.len()
            + self.signatures.len()
            + self.method_calls.len()
            + self.call_imprints.len()
            + self.attribute_accesses.len()
            + self.friendships.len()
            + self.components.len()
            + self.comments.len()
    }
}

impl Arena {
    /// Canonical `SimpleType` node of a kind.
    pub fn create_simple_type(&mut self, kind: SimpleTypeKind) -> NodeId {
        if let Some(id) = self.interner.simple_types.get(&kind) {
            return id;
        }
        let id = self.create_with_data(NodeData::SimpleType(kind));
        self.interner.simple_types.insert(kind, id);
        id
    }

    /// Canonical pointer former of a kind.
    pub fn create_type_former_pointer(&mut self, kind: PointerKind) -> NodeId {
        if let Some(id) = self.interner.pointers.get(&kind) {
            return id;
        }
        let id = self.create_with_data(NodeData::TypeFormerPointer(kind));
        self.interner.pointers.insert(kind, id);
        id
    }

    /// The array former.
    pub fn create_type_former_array(&mut self) -> NodeId {
        if let Some(id) = self.interner.arrays.get(&()) {
            return id;
        }
        let id = self.create_with_data(NodeData::TypeFormerArray);
        self.interner.arrays.insert((), id);
        id
    }

    /// The non-type former.
    pub fn create_type_former_non_type(&mut self) -> NodeId {
        if let Some(id) = self.interner.non_types.get(&()) {
            return id;
        }
        let id = self.create_with_data(NodeData::TypeFormerNonType);
        self.interner.non_types.insert((), id);
        id
    }

    /// Canonical former referring to a named entity.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if `refers_to` does not exist.
    pub fn create_type_former_type(&mut self, refers_to: NodeId) -> Result<NodeId> {
        if let Some(id) = self.interner.type_refs.get(&refers_to) {
            return Ok(id);
        }
        self.get_ref(refers_to)?;
        let id = self.create_with_data(NodeData::TypeFormerType);
        self.link(id, EdgeKind::TypeFormerTypeRefersTo, refers_to, Assoc::None)?;
        self.interner.type_refs.insert(refers_to, id);
        Ok(id)
    }

    /// Canonical call marker for a resolved method.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] if `method` does not exist and
    /// [`AsgError::InvalidEdge`] if it is not a method.
    pub fn create_method_call(&mut self, method: NodeId) -> Result<NodeId> {
        if let Some(id) = self.interner.method_calls.get(&method) {
            return Ok(id);
        }
        self.expect_kind(method, NodeKind::Method)?;
        let id = self.create_with_data(NodeData::MethodCall { calls: 0 });
        self.link(id, EdgeKind::MethodCallMethod, method, Assoc::None)?;
        self.interner.method_calls.insert(method, id);
        Ok(id)
    }

    /// Canonical call marker for an unresolved callee described by text.
    pub fn create_method_call_imprint(&mut self, imprint: &str) -> NodeId {
        if let Some(id) = self.interner.call_imprints.get(&imprint.to_string()) {
            return id;
        }
        let calls = self.set_string(imprint);
        let id = self.create_with_data(NodeData::MethodCall { calls });
        self.interner.call_imprints.insert(imprint.to_string(), id);
        id
    }

    /// Canonical access marker for an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] / [`AsgError::InvalidNodeKind`] if
    /// `attribute` is not an existing attribute.
    pub fn create_attribute_access(&mut self, attribute: NodeId) -> Result<NodeId> {
        if let Some(id) = self.interner.attribute_accesses.get(&attribute) {
            return Ok(id);
        }
        self.expect_kind(attribute, NodeKind::Attribute)?;
        let id = self.create_with_data(NodeData::AttributeAccess);
        self.link(id, EdgeKind::AttributeAccessAttribute, attribute, Assoc::None)?;
        self.interner.attribute_accesses.insert(attribute, id);
        Ok(id)
    }

    /// Canonical friendship marker for a friend scope.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::InvalidNodeId`] / [`AsgError::InvalidNodeKind`] if
    /// `friend` is not an existing scope.
    pub fn create_friendship(&mut self, friend: NodeId) -> Result<NodeId> {
        if let Some(id) = self.interner.friendships.get(&friend) {
            return Ok(id);
        }
        self.expect_kind(friend, NodeKind::Scope)?;
        let id = self.create_with_data(NodeData::Friendship { grantor: 0 });
        self.link(id, EdgeKind::FriendshipFriend, friend, Assoc::None)?;
        self.interner.friendships.insert(friend, id);
        Ok(id)
    }

    /// Component with the given name, created on first request.
    pub fn create_component(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.interner.components.get(&name.to_string()) {
            return id;
        }
        let key = self.set_string(name);
        let id = self.create_with_data(NodeData::Component(NamedFields { name: key }));
        self.interner.components.insert(name.to_string(), id);
        id
    }

    /// Comment node with the given text, shared between equal texts.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        if let Some(id) = self.interner.comments.get(&text.to_string()) {
            return id;
        }
        let key = self.set_string(text);
        let id = self.create_with_data(NodeData::Comment { text: key });
        self.interner.comments.insert(text.to_string(), id);
        id
    }

    /// Start building a `Type`.
    pub fn begin_type(&mut self) {
        self.interner.type_stack.begin(Vec::new());
    }

    /// Append a type former to the type being built.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::EmptyBuildStack`] without a matching
    /// [`begin_type`](Self::begin_type), and an id/kind error if `former` is
    /// not an existing type former.
    pub fn add_type_former(&mut self, former: NodeId) -> Result<()> {
        self.interner.type_stack.top("type")?;
        self.expect_kind(former, NodeKind::TypeFormer)?;
        self.interner.type_stack.top("type")?.push(former);
        Ok(())
    }

    /// Finish the type being built and return its canonical node.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::EmptyBuildStack`] without a matching
    /// [`begin_type`](Self::begin_type).
    pub fn end_type(&mut self) -> Result<NodeId> {
        let formers = self.interner.type_stack.end("type")?;
        if let Some(id) = self.interner.types.get(&formers) {
            return Ok(id);
        }
        let id = self.create_with_data(NodeData::Type);
        for &former in &formers {
            self.link(id, EdgeKind::TypeHasTypeFormer, former, Assoc::None)?;
        }
        trace!("Interned type {id} with {} formers", formers.len());
        self.interner.types.insert(formers, id);
        Ok(id)
    }

    /// Canonical `Type` for an ordered list of formers.
    ///
    /// # Errors
    ///
    /// Same as [`add_type_former`](Self::add_type_former).
    pub fn create_type(&mut self, formers: &[NodeId]) -> Result<NodeId> {
        self.begin_type();
        for &former in formers {
            if let Err(err) = self.add_type_former(former) {
                self.interner.type_stack.end("type")?;
                return Err(err);
            }
        }
        self.end_type()
    }

    /// Start building a function signature former.
    pub fn begin_type_former_method(&mut self) {
        self.interner.signature_stack.begin(Signature::default());
    }

    /// Set the return type of the signature being built.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::EmptyBuildStack`] without a matching begin, and an
    /// id/kind error if `ty` is not an existing `Type`.
    pub fn set_return_type(&mut self, ty: NodeId) -> Result<()> {
        self.interner.signature_stack.top("method signature")?;
        self.expect_kind(ty, NodeKind::Type)?;
        self.interner.signature_stack.top("method signature")?.return_type = Some(ty);
        Ok(())
    }

    /// Append a parameter type to the signature being built.
    ///
    /// # Errors
    ///
    /// Same as [`set_return_type`](Self::set_return_type).
    pub fn add_parameter_type(&mut self, ty: NodeId, kind: ParameterKind) -> Result<()> {
        self.interner.signature_stack.top("method signature")?;
        self.expect_kind(ty, NodeKind::Type)?;
        self.interner
            .signature_stack
            .top("method signature")?
            .parameters
            .push((ty, kind));
        Ok(())
    }

    /// Finish the signature being built and return its canonical former.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::EmptyBuildStack`] without a matching begin.
    pub fn end_type_former_method(&mut self) -> Result<NodeId> {
        let signature = self.interner.signature_stack.end("method signature")?;
        if let Some(id) = self.interner.signatures.get(&signature) {
            return Ok(id);
        }
        let id = self.create_with_data(NodeData::TypeFormerMethod);
        if let Some(ret) = signature.return_type {
            self.link(id, EdgeKind::TypeFormerMethodHasReturnType, ret, Assoc::None)?;
        }
        for &(ty, kind) in &signature.parameters {
            self.link(
                id,
                EdgeKind::TypeFormerMethodHasParameterType,
                ty,
                Assoc::Parameter(kind),
            )?;
        }
        self.interner.signatures.insert(signature, id);
        Ok(id)
    }

    /// Number of values currently held by the interning caches.
    pub fn interned_count(&self) -> usize {
        self.interner.len()
    }

    /// Rebuild every cache from the nodes, after a load.
    pub(crate) fn rebuild_interning(&mut self) {
        let mut interner = Interner::default();
        for node in self.iter_all() {
            let id = node.id();
            match node.data() {
                NodeData::SimpleType(kind) => interner.simple_types.insert(*kind, id),
                NodeData::TypeFormerPointer(kind) => interner.pointers.insert(*kind, id),
                NodeData::TypeFormerArray => interner.arrays.insert((), id),
                NodeData::TypeFormerNonType => interner.non_types.insert((), id),
                NodeData::TypeFormerType => {
                    if let Some(target) = node.single(EdgeKind::TypeFormerTypeRefersTo) {
                        interner.type_refs.insert(target, id);
                    }
                }
                NodeData::Type => interner
                    .types
                    .insert(node.targets(EdgeKind::TypeHasTypeFormer).collect(), id),
                NodeData::TypeFormerMethod => {
                    let signature = Signature {
                        return_type: node.single(EdgeKind::TypeFormerMethodHasReturnType),
                        parameters: node
                            .edges(EdgeKind::TypeFormerMethodHasParameterType)
                            .iter()
                            .map(|e| match e.assoc {
                                Assoc::Parameter(kind) => (e.target, kind),
                                _ => (e.target, ParameterKind::default()),
                            })
                            .collect(),
                    };
                    interner.signatures.insert(signature, id);
                }
                NodeData::MethodCall { calls } => {
                    match node.single(EdgeKind::MethodCallMethod) {
                        Some(method) => interner.method_calls.insert(method, id),
                        None => interner
                            .call_imprints
                            .insert(self.get_string(*calls).to_string(), id),
                    }
                }
                NodeData::AttributeAccess => {
                    if let Some(attribute) = node.single(EdgeKind::AttributeAccessAttribute) {
                        interner.attribute_accesses.insert(attribute, id);
                    }
                }
                NodeData::Friendship { .. } => {
                    if let Some(friend) = node.single(EdgeKind::FriendshipFriend) {
                        interner.friendships.insert(friend, id);
                    }
                }
                NodeData::Component(named) => interner
                    .components
                    .insert(self.get_string(named.name).to_string(), id),
                NodeData::Comment { text } => interner
                    .comments
                    .insert(self.get_string(*text).to_string(), id),
                _ => {}
            }
        }
        trace!("Rebuilt interning caches: {} values", interner.len());
        self.interner = interner;
    }

    fn expect_kind(&self, id: NodeId, kind: NodeKind) -> Result<()> {
        let actual = self.get_ref(id)?.kind();
        if actual.is_a(kind) {
            Ok(())
        } else {
            Err(AsgError::InvalidNodeKind {
                kind: actual,
                reason: "unexpected kind for this factory",
            })
        }
    }
}
