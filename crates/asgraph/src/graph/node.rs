//! Nodes: a tagged union of per-kind scalar fields plus schema-ordered edges.

use crate::schema::{
    AccessibilityKind, AssocKind, ClassKind, EdgeKind, GenericParameterKind, MethodKind, NodeKind,
    PackageKind, ParameterKind, PointerKind, SimpleTypeKind,
};
use crate::strtable::Key;

/// Identity of a node inside one arena. 0 and 1 are never valid.
pub type NodeId = u32;

/// Fields shared by every kind derived from `Named`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamedFields {
    /// Simple name
    pub name: Key,
}

/// Fields shared by every kind derived from `Member`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberFields {
    /// Declared visibility
    pub accessibility: AccessibilityKind,
    /// `static` modifier
    pub is_static: bool,
    /// Synthesized by the compiler
    pub is_compiler_generated: bool,
    /// Lines of comment attached to the declaration
    pub comment_lines: u32,
    /// Linker-level name
    pub mangled_name: Key,
    /// Human-readable qualified name
    pub demangled_name: Key,
}

/// Fields shared by every kind derived from `Scope`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeFields {
    /// Unnamed scope (anonymous class, lambda)
    pub is_anonymous: bool,
    /// Logical lines of code
    pub lloc: u32,
}

/// Scalars of `Attribute`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeData {
    /// Named part
    pub named: NamedFields,
    /// Member part
    pub member: MemberFields,
}

/// Scalars of `Class` and `ClassGeneric`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassData {
    /// Named part
    pub named: NamedFields,
    /// Member part
    pub member: MemberFields,
    /// Scope part
    pub scope: ScopeFields,
    /// class/struct/interface/...
    pub class_kind: ClassKind,
    /// `abstract` modifier
    pub is_abstract: bool,
}

/// Scalars of `Method` and `MethodGeneric`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodData {
    /// Named part
    pub named: NamedFields,
    /// Member part
    pub member: MemberFields,
    /// Scope part
    pub scope: ScopeFields,
    /// constructor/getter/...
    pub method_kind: MethodKind,
    /// `abstract` modifier
    pub is_abstract: bool,
    /// `virtual` modifier
    pub is_virtual: bool,
    /// Number of statements in the body
    pub num_statements: u32,
}

/// Scalars of `Package`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageData {
    /// Named part
    pub named: NamedFields,
    /// Member part
    pub member: MemberFields,
    /// Scope part
    pub scope: ScopeFields,
    /// package/namespace/module
    pub package_kind: PackageKind,
}

/// Scalars of `Parameter`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParameterData {
    /// Named part
    pub named: NamedFields,
    /// Passing convention
    pub param_kind: ParameterKind,
}

/// Scalars of `GenericParameter`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenericParameterData {
    /// Named part
    pub named: NamedFields,
    /// What the parameter stands for
    pub generic_parameter_kind: GenericParameterKind,
}

/// Scalars of `File`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileData {
    /// Named part
    pub named: NamedFields,
    /// Physical lines
    pub loc: u32,
}

/// Kind-specific scalar state. One variant per concrete kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Comment text
    Comment {
        /// Comment text
        text: Key,
    },
    /// Named component
    Component(NamedFields),
    /// Basic block
    ControlFlowBlock,
    /// Field or variable
    Attribute(AttributeData),
    /// Attribute access marker
    AttributeAccess,
    /// Class-like scope
    Class(ClassData),
    /// Generic class
    ClassGeneric(ClassData),
    /// Friendship marker
    Friendship {
        /// Textual friend declaration used when the friend is unresolved
        grantor: Key,
    },
    /// Generic parameter
    GenericParameter(GenericParameterData),
    /// Method
    Method(MethodData),
    /// Call marker
    MethodCall {
        /// Textual imprint of an unresolved callee
        calls: Key,
    },
    /// Generic method
    MethodGeneric(MethodData),
    /// Package/namespace
    Package(PackageData),
    /// Method parameter
    Parameter(ParameterData),
    /// Source file
    File(FileData),
    /// File system root
    FileSystem(NamedFields),
    /// Directory
    Folder(NamedFields),
    /// Built-in type
    SimpleType(SimpleTypeKind),
    /// Composite type
    Type,
    /// `[]` former
    TypeFormerArray,
    /// Signature former
    TypeFormerMethod,
    /// Non-type former
    TypeFormerNonType,
    /// Pointer former
    TypeFormerPointer(PointerKind),
    /// Named-type former
    TypeFormerType,
}

impl NodeData {
    /// Default-initialized data for a concrete kind, `None` for abstract kinds.
    pub fn new(kind: NodeKind) -> Option<Self> {
        let data = match kind {
            NodeKind::Base
            | NodeKind::Named
            | NodeKind::Member
            | NodeKind::Scope
            | NodeKind::FSEntry
            | NodeKind::TypeFormer => return None,
            NodeKind::Comment => NodeData::Comment { text: 0 },
            NodeKind::Component => NodeData::Component(NamedFields::default()),
            NodeKind::ControlFlowBlock => NodeData::ControlFlowBlock,
            NodeKind::Attribute => NodeData::Attribute(AttributeData::default()),
            NodeKind::AttributeAccess => NodeData::AttributeAccess,
            NodeKind::Class => NodeData::Class(ClassData::default()),
            NodeKind::ClassGeneric => NodeData::ClassGeneric(ClassData::default()),
            NodeKind::Friendship => NodeData::Friendship { grantor: 0 },
            NodeKind::GenericParameter => {
                NodeData::GenericParameter(GenericParameterData::default())
            }
            NodeKind::Method => NodeData::Method(MethodData::default()),
            NodeKind::MethodCall => NodeData::MethodCall { calls: 0 },
            NodeKind::MethodGeneric => NodeData::MethodGeneric(MethodData::default()),
            NodeKind::Package => NodeData::Package(PackageData::default()),
            NodeKind::Parameter => NodeData::Parameter(ParameterData::default()),
            NodeKind::File => NodeData::File(FileData::default()),
            NodeKind::FileSystem => NodeData::FileSystem(NamedFields::default()),
            NodeKind::Folder => NodeData::Folder(NamedFields::default()),
            NodeKind::SimpleType => NodeData::SimpleType(SimpleTypeKind::default()),
            NodeKind::Type => NodeData::Type,
            NodeKind::TypeFormerArray => NodeData::TypeFormerArray,
            NodeKind::TypeFormerMethod => NodeData::TypeFormerMethod,
            NodeKind::TypeFormerNonType => NodeData::TypeFormerNonType,
            NodeKind::TypeFormerPointer => NodeData::TypeFormerPointer(PointerKind::default()),
            NodeKind::TypeFormerType => NodeData::TypeFormerType,
        };
        Some(data)
    }

    /// Concrete kind of this data.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Comment { .. } => NodeKind::Comment,
            NodeData::Component(_) => NodeKind::Component,
            NodeData::ControlFlowBlock => NodeKind::ControlFlowBlock,
            NodeData::Attribute(_) => NodeKind::Attribute,
            NodeData::AttributeAccess => NodeKind::AttributeAccess,
            NodeData::Class(_) => NodeKind::Class,
            NodeData::ClassGeneric(_) => NodeKind::ClassGeneric,
            NodeData::Friendship { .. } => NodeKind::Friendship,
            NodeData::GenericParameter(_) => NodeKind::GenericParameter,
            NodeData::Method(_) => NodeKind::Method,
            NodeData::MethodCall { .. } => NodeKind::MethodCall,
            NodeData::MethodGeneric(_) => NodeKind::MethodGeneric,
            NodeData::Package(_) => NodeKind::Package,
            NodeData::Parameter(_) => NodeKind::Parameter,
            NodeData::File(_) => NodeKind::File,
            NodeData::FileSystem(_) => NodeKind::FileSystem,
            NodeData::Folder(_) => NodeKind::Folder,
            NodeData::SimpleType(_) => NodeKind::SimpleType,
            NodeData::Type => NodeKind::Type,
            NodeData::TypeFormerArray => NodeKind::TypeFormerArray,
            NodeData::TypeFormerMethod => NodeKind::TypeFormerMethod,
            NodeData::TypeFormerNonType => NodeKind::TypeFormerNonType,
            NodeData::TypeFormerPointer(_) => NodeKind::TypeFormerPointer,
            NodeData::TypeFormerType => NodeKind::TypeFormerType,
        }
    }

    /// Upcast to the `Named` part.
    pub fn named(&self) -> Option<&NamedFields> {
        match self {
            NodeData::Component(n) | NodeData::FileSystem(n) | NodeData::Folder(n) => Some(n),
            NodeData::Attribute(d) => Some(&d.named),
            NodeData::Class(d) | NodeData::ClassGeneric(d) => Some(&d.named),
            NodeData::GenericParameter(d) => Some(&d.named),
            NodeData::Method(d) | NodeData::MethodGeneric(d) => Some(&d.named),
            NodeData::Package(d) => Some(&d.named),
            NodeData::Parameter(d) => Some(&d.named),
            NodeData::File(d) => Some(&d.named),
            _ => None,
        }
    }

    /// Mutable upcast to the `Named` part.
    pub fn named_mut(&mut self) -> Option<&mut NamedFields> {
        match self {
            NodeData::Component(n) | NodeData::FileSystem(n) | NodeData::Folder(n) => Some(n),
            NodeData::Attribute(d) => Some(&mut d.named),
            NodeData::Class(d) | NodeData::ClassGeneric(d) => Some(&mut d.named),
            NodeData::GenericParameter(d) => Some(&mut d.named),
            NodeData::Method(d) | NodeData::MethodGeneric(d) => Some(&mut d.named),
            NodeData::Package(d) => Some(&mut d.named),
            NodeData::Parameter(d) => Some(&mut d.named),
            NodeData::File(d) => Some(&mut d.named),
            _ => None,
        }
    }

    /// Upcast to the `Member` part.
    pub fn member(&self) -> Option<&MemberFields> {
        match self {
            NodeData::Attribute(d) => Some(&d.member),
            NodeData::Class(d) | NodeData::ClassGeneric(d) => Some(&d.member),
            NodeData::Method(d) | NodeData::MethodGeneric(d) => Some(&d.member),
            NodeData::Package(d) => Some(&d.member),
            _ => None,
        }
    }

    /// Mutable upcast to the `Member` part.
    pub fn member_mut(&mut self) -> Option<&mut MemberFields> {
        match self {
            NodeData::Attribute(d) => Some(&mut d.member),
            NodeData::Class(d) | NodeData::ClassGeneric(d) => Some(&mut d.member),
            NodeData::Method(d) | NodeData::MethodGeneric(d) => Some(&mut d.member),
            NodeData::Package(d) => Some(&mut d.member),
            _ => None,
        }
    }

    /// Upcast to the `Scope` part.
    pub fn scope(&self) -> Option<&ScopeFields> {
        match self {
            NodeData::Class(d) | NodeData::ClassGeneric(d) => Some(&d.scope),
            NodeData::Method(d) | NodeData::MethodGeneric(d) => Some(&d.scope),
            NodeData::Package(d) => Some(&d.scope),
            _ => None,
        }
    }

    /// Mutable upcast to the `Scope` part.
    pub fn scope_mut(&mut self) -> Option<&mut ScopeFields> {
        match self {
            NodeData::Class(d) | NodeData::ClassGeneric(d) => Some(&mut d.scope),
            NodeData::Method(d) | NodeData::MethodGeneric(d) => Some(&mut d.scope),
            NodeData::Package(d) => Some(&mut d.scope),
            _ => None,
        }
    }

    /// Apply `f` to every string key stored in the scalars.
    pub(crate) fn for_each_key_mut(&mut self, f: &mut dyn FnMut(&mut Key)) {
        if let Some(named) = self.named_mut() {
            f(&mut named.name);
        }
        if let Some(member) = self.member_mut() {
            f(&mut member.mangled_name);
            f(&mut member.demangled_name);
        }
        match self {
            NodeData::Comment { text } => f(text),
            NodeData::Friendship { grantor } => f(grantor),
            NodeData::MethodCall { calls } => f(calls),
            _ => {}
        }
    }
}

/// Source range attached to `Member_IsContainedIn`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// First line
    pub line: u32,
    /// First column
    pub column: u32,
    /// Last line
    pub end_line: u32,
    /// Last column
    pub end_column: u32,
}

/// Data carried by one edge instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Assoc {
    /// No data
    #[default]
    None,
    /// String-table key
    Text(Key),
    /// Source range
    Position(SourcePosition),
    /// Passing convention
    Parameter(ParameterKind),
}

impl Assoc {
    /// Schema association kind of this value.
    pub fn kind(&self) -> AssocKind {
        match self {
            Assoc::None => AssocKind::None,
            Assoc::Text(_) => AssocKind::Text,
            Assoc::Position(_) => AssocKind::Position,
            Assoc::Parameter(_) => AssocKind::ParameterKind,
        }
    }
}

/// One edge instance: the target and its association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeTarget {
    /// Target node
    pub target: NodeId,
    /// Attached data
    pub assoc: Assoc,
}

/// A node stored in the arena.
///
/// Edge lists are kept in the order of [`NodeKind::edge_kinds`], so iterating
/// them yields the declared traversal and serialization order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    data: NodeData,
    edges: Vec<Vec<EdgeTarget>>,
}

impl Node {
    pub(crate) fn new(id: NodeId, data: NodeData) -> Self {
        let edges = vec![Vec::new(); data.kind().edge_kinds().len()];
        Self {
            id,
            parent: None,
            data,
            edges,
        }
    }

    /// Identity in the owning arena.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Concrete kind.
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Shorthand for `kind().is_a(ancestor)`.
    pub fn is_a(&self, ancestor: NodeKind) -> bool {
        self.kind().is_a(ancestor)
    }

    /// Owner through an owning edge, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Scalar fields.
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Mutable scalar fields.
    pub fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }

    /// Name key for `Named` kinds.
    pub fn name_key(&self) -> Option<Key> {
        self.data.named().map(|n| n.name)
    }

    /// Instances of one edge kind. Empty if the kind does not carry it.
    pub fn edges(&self, kind: EdgeKind) -> &[EdgeTarget] {
        self.slot(kind)
            .map(|slot| self.edges[slot].as_slice())
            .unwrap_or(&[])
    }

    /// Target ids of one edge kind.
    pub fn targets(&self, kind: EdgeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.edges(kind).iter().map(|e| e.target)
    }

    /// Target of a single-valued edge.
    pub fn single(&self, kind: EdgeKind) -> Option<NodeId> {
        self.edges(kind).first().map(|e| e.target)
    }

    /// Every edge instance in schema order.
    pub fn all_edges(&self) -> impl Iterator<Item = (EdgeKind, &EdgeTarget)> + '_ {
        self.kind()
            .edge_kinds()
            .iter()
            .zip(self.edges.iter())
            .flat_map(|(&kind, list)| list.iter().map(move |e| (kind, e)))
    }

    /// Number of outgoing edge instances.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub(crate) fn slot(&self, kind: EdgeKind) -> Option<usize> {
        self.kind().edge_kinds().iter().position(|&k| k == kind)
    }

    pub(crate) fn edges_mut(&mut self, kind: EdgeKind) -> Option<&mut Vec<EdgeTarget>> {
        let slot = self.slot(kind)?;
        Some(&mut self.edges[slot])
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn for_each_key_mut(&mut self, f: &mut dyn FnMut(&mut Key)) {
        self.data.for_each_key_mut(f);
        for list in &mut self.edges {
            for edge in list.iter_mut() {
                if let Assoc::Text(key) = &mut edge.assoc {
                    f(key);
                }
            }
        }
    }

    /// Re-tag the node with more specific data of an ancestor-compatible kind,
    /// carrying over every edge list the new kind also has.
    pub(crate) fn upgrade(&mut self, data: NodeData) {
        let new_kinds = data.kind().edge_kinds();
        let mut edges = vec![Vec::new(); new_kinds.len()];
        for (slot, kind) in new_kinds.iter().enumerate() {
            if let Some(old) = self.edges_mut(*kind) {
                edges[slot] = std::mem::take(old);
            }
        }
        self.data = data;
        self.edges = edges;
    }
}
