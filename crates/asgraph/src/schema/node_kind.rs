//! Node kinds and their single-rooted inheritance lattice.

use super::edge_kind::EdgeKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Concrete or abstract variant of a node.
///
/// Every kind except [`NodeKind::Base`] has exactly one immediate ancestor.
/// The discriminant is the wire code; 0 is reserved for the end-of-stream marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum NodeKind {
    /// Root of the lattice
    Base = 1,
    /// Comment text attached to members and files
    Comment = 2,
    /// Compilation unit grouping (library, executable)
    Component = 3,
    /// Basic block of a method body
    ControlFlowBlock = 4,
    /// Anything with a name
    Named = 5,
    /// Field or variable
    Attribute = 6,
    /// Marker for "accesses attribute X"
    AttributeAccess = 7,
    /// Class-like scope
    Class = 8,
    /// Class with generic parameters
    ClassGeneric = 9,
    /// Marker for "grants friendship to X"
    Friendship = 10,
    /// Parameter of a generic class or method
    GenericParameter = 11,
    /// Named program element that lives in a scope
    Member = 12,
    /// Function or method
    Method = 13,
    /// Marker for "calls method X"
    MethodCall = 14,
    /// Method with generic parameters
    MethodGeneric = 15,
    /// Package, namespace or module
    Package = 16,
    /// Formal parameter of a method
    Parameter = 17,
    /// Member that owns other members
    Scope = 18,
    /// File system entry
    FSEntry = 19,
    /// Source file
    File = 20,
    /// Root of the file system tree
    FileSystem = 21,
    /// Directory
    Folder = 22,
    /// Built-in type
    SimpleType = 23,
    /// Type as a sequence of type formers
    Type = 24,
    /// One step of a type description
    TypeFormer = 25,
    /// `[]`
    TypeFormerArray = 26,
    /// Function signature
    TypeFormerMethod = 27,
    /// Non-type template argument
    TypeFormerNonType = 28,
    /// Pointer or reference
    TypeFormerPointer = 29,
    /// Reference to a named type
    TypeFormerType = 30,
}

/// Number of slots needed for tables indexed by kind code.
pub const NODE_KIND_SLOTS: usize = 31;

const ALL_KINDS: [NodeKind; 30] = [
    NodeKind::Base,
    NodeKind::Comment,
    NodeKind::Component,
    NodeKind::ControlFlowBlock,
    NodeKind::Named,
    NodeKind::Attribute,
    NodeKind::AttributeAccess,
    NodeKind::Class,
    NodeKind::ClassGeneric,
    NodeKind::Friendship,
    NodeKind::GenericParameter,
    NodeKind::Member,
    NodeKind::Method,
    NodeKind::MethodCall,
    NodeKind::MethodGeneric,
    NodeKind::Package,
    NodeKind::Parameter,
    NodeKind::Scope,
    NodeKind::FSEntry,
    NodeKind::File,
    NodeKind::FileSystem,
    NodeKind::Folder,
    NodeKind::SimpleType,
    NodeKind::Type,
    NodeKind::TypeFormer,
    NodeKind::TypeFormerArray,
    NodeKind::TypeFormerMethod,
    NodeKind::TypeFormerNonType,
    NodeKind::TypeFormerPointer,
    NodeKind::TypeFormerType,
];

/// Bitset of every kind on the path from a kind up to `Base`, indexed by code.
const ANCESTOR_MASKS: [u64; NODE_KIND_SLOTS] = {
    let mut masks = [0u64; NODE_KIND_SLOTS];
    let mut i = 0;
    while i < ALL_KINDS.len() {
        let kind = ALL_KINDS[i];
        let mut mask = 0u64;
        let mut current = Some(kind);
        while let Some(k) = current {
            mask |= 1u64 << (k as u16);
            current = k.parent();
        }
        masks[kind as usize] = mask;
        i += 1;
    }
    masks
};

impl NodeKind {
    /// Every kind in code order.
    pub const ALL: &'static [NodeKind] = &ALL_KINDS;

    /// Wire code of this kind.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Look up a kind by wire code.
    pub fn from_code(code: u16) -> Option<Self> {
        ALL_KINDS.get((code as usize).checked_sub(1)?).copied()
    }

    /// Immediate ancestor, `None` for `Base`.
    pub const fn parent(self) -> Option<NodeKind> {
        use NodeKind::*;
        match self {
            Base => None,
            Comment | ControlFlowBlock | Named | AttributeAccess | Friendship | MethodCall
            | SimpleType | Type | TypeFormer => Some(Base),
            Component | Member | GenericParameter | Parameter | FSEntry | FileSystem => Some(Named),
            Scope | Attribute => Some(Member),
            Class | Method | Package => Some(Scope),
            ClassGeneric => Some(Class),
            MethodGeneric => Some(Method),
            File | Folder => Some(FSEntry),
            TypeFormerArray | TypeFormerMethod | TypeFormerNonType | TypeFormerPointer
            | TypeFormerType => Some(TypeFormer),
        }
    }

    /// True if `self` equals `ancestor` or derives from it.
    pub fn is_a(self, ancestor: NodeKind) -> bool {
        ANCESTOR_MASKS[self as usize] & (1u64 << ancestor.code()) != 0
    }

    /// Abstract kinds exist only in the lattice and cannot be instantiated.
    pub fn is_abstract(self) -> bool {
        matches!(
            self,
            NodeKind::Base
                | NodeKind::Named
                | NodeKind::Member
                | NodeKind::Scope
                | NodeKind::FSEntry
                | NodeKind::TypeFormer
        )
    }

    /// Value-like kinds that only the interning factories may create.
    pub fn is_interned(self) -> bool {
        matches!(
            self,
            NodeKind::AttributeAccess
                | NodeKind::Friendship
                | NodeKind::MethodCall
                | NodeKind::SimpleType
                | NodeKind::Type
                | NodeKind::TypeFormerArray
                | NodeKind::TypeFormerMethod
                | NodeKind::TypeFormerNonType
                | NodeKind::TypeFormerPointer
                | NodeKind::TypeFormerType
        )
    }

    /// Whether `create_node(kind)` may build this kind without a factory.
    pub fn is_directly_constructible(self) -> bool {
        !self.is_abstract()
            && !self.is_interned()
            && !matches!(
                self,
                NodeKind::Comment | NodeKind::Component | NodeKind::FileSystem
            )
    }

    /// Graph-wide marker kinds that are usually not reachable through ownership.
    pub fn is_special(self) -> bool {
        self.is_interned()
            || matches!(
                self,
                NodeKind::Comment | NodeKind::Component | NodeKind::FileSystem
            )
    }

    /// Edge kinds declared directly on this kind, in declaration order.
    pub fn declared_edges(self) -> &'static [EdgeKind] {
        use EdgeKind::*;
        match self {
            NodeKind::Component => &[ComponentContains, ComponentHasFiles],
            NodeKind::ControlFlowBlock => &[ControlFlowBlockCalls, ControlFlowBlockPred],
            NodeKind::Named => &[NamedDependsOn],
            NodeKind::Member => &[MemberBelongsTo, MemberHasComment, MemberIsContainedIn, MemberUses],
            NodeKind::Scope => &[ScopeHasMember],
            NodeKind::Attribute => &[AttributeCalls, AttributeHasType],
            NodeKind::AttributeAccess => &[AttributeAccessAttribute],
            NodeKind::Class => &[ClassGrantsFriendship, ClassIsSubclass],
            NodeKind::ClassGeneric => &[ClassGenericHasGenericParameter],
            NodeKind::Friendship => &[FriendshipFriend],
            NodeKind::GenericParameter => &[GenericParameterHasParameterConstraint],
            NodeKind::Method => &[
                MethodAccessesAttribute,
                MethodCalls,
                MethodHasControlFlowBlock,
                MethodHasParameter,
                MethodReturns,
                MethodThrows,
            ],
            NodeKind::MethodCall => &[MethodCallMethod],
            NodeKind::MethodGeneric => &[MethodGenericHasGenericParameter],
            NodeKind::Parameter => &[ParameterHasType],
            NodeKind::File => &[FileHasComment, FileIncludes],
            NodeKind::FileSystem => &[FileSystemHasFSEntry],
            NodeKind::Folder => &[FolderContains],
            NodeKind::Type => &[TypeHasTypeFormer],
            NodeKind::TypeFormerMethod => &[TypeFormerMethodHasParameterType, TypeFormerMethodHasReturnType],
            NodeKind::TypeFormerType => &[TypeFormerTypeRefersTo],
            _ => &[],
        }
    }

    /// All edge kinds a node of this kind carries: ancestors first, each in
    /// declaration order. This is the traversal and serialization order.
    pub fn edge_kinds(self) -> &'static [EdgeKind] {
        static TABLE: OnceLock<Vec<Vec<EdgeKind>>> = OnceLock::new();
        let table = TABLE.get_or_init(|| {
            let mut table = vec![Vec::new(); NODE_KIND_SLOTS];
            for &kind in NodeKind::ALL {
                let mut chain = vec![kind];
                while let Some(parent) = chain.last().and_then(|k| k.parent()) {
                    chain.push(parent);
                }
                table[kind as usize] = chain
                    .iter()
                    .rev()
                    .flat_map(|k| k.declared_edges().iter().copied())
                    .collect();
            }
            table
        });
        &table[self as usize]
    }

    /// Kind name as written in dumps and logs.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Base => "Base",
            NodeKind::Comment => "Comment",
            NodeKind::Component => "Component",
            NodeKind::ControlFlowBlock => "ControlFlowBlock",
            NodeKind::Named => "Named",
            NodeKind::Attribute => "Attribute",
            NodeKind::AttributeAccess => "AttributeAccess",
            NodeKind::Class => "Class",
            NodeKind::ClassGeneric => "ClassGeneric",
            NodeKind::Friendship => "Friendship",
            NodeKind::GenericParameter => "GenericParameter",
            NodeKind::Member => "Member",
            NodeKind::Method => "Method",
            NodeKind::MethodCall => "MethodCall",
            NodeKind::MethodGeneric => "MethodGeneric",
            NodeKind::Package => "Package",
            NodeKind::Parameter => "Parameter",
            NodeKind::Scope => "Scope",
            NodeKind::FSEntry => "FSEntry",
            NodeKind::File => "File",
            NodeKind::FileSystem => "FileSystem",
            NodeKind::Folder => "Folder",
            NodeKind::SimpleType => "SimpleType",
            NodeKind::Type => "Type",
            NodeKind::TypeFormer => "TypeFormer",
            NodeKind::TypeFormerArray => "TypeFormerArray",
            NodeKind::TypeFormerMethod => "TypeFormerMethod",
            NodeKind::TypeFormerNonType => "TypeFormerNonType",
            NodeKind::TypeFormerPointer => "TypeFormerPointer",
            NodeKind::TypeFormerType => "TypeFormerType",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
