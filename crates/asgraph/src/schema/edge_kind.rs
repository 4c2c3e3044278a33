//! Edge kinds and the per-kind schema table.

use super::node_kind::NodeKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many targets an edge kind may hold on one source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// At most one target; setting replaces
    One,
    /// Ordered list, duplicates allowed
    List,
    /// Order-irrelevant, duplicates ignored
    Set,
}

/// Type of data attached to each edge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssocKind {
    /// Plain edge
    None,
    /// String-table key
    Text,
    /// Source position range
    Position,
    /// Parameter passing convention
    ParameterKind,
}

/// Schema entry of one edge kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeInfo {
    /// Kind that declares the edge
    pub source: NodeKind,
    /// Required kind (or ancestor) of the target
    pub target: NodeKind,
    /// Ownership edge: the source is the parent of the target
    pub owning: bool,
    /// Target cardinality
    pub multiplicity: Multiplicity,
    /// Association carried per instance
    pub assoc: AssocKind,
}

/// Declared forward relation between two kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum EdgeKind {
    /// Component depends on another component
    ComponentContains = 1,
    /// Files compiled into a component
    ComponentHasFiles = 2,
    /// Methods called from a block
    ControlFlowBlockCalls = 3,
    /// Predecessor blocks
    ControlFlowBlockPred = 4,
    /// Free-form dependency with a textual reason
    NamedDependsOn = 5,
    /// Components the member is part of
    MemberBelongsTo = 6,
    /// Comments attached to the member
    MemberHasComment = 7,
    /// Files the member is declared in, with position
    MemberIsContainedIn = 8,
    /// Types used by the member
    MemberUses = 9,
    /// Members owned by a scope
    ScopeHasMember = 10,
    /// Calls in an attribute initializer
    AttributeCalls = 11,
    /// Declared type of an attribute
    AttributeHasType = 12,
    /// Attribute referenced by an access marker
    AttributeAccessAttribute = 13,
    /// Friendships granted by a class
    ClassGrantsFriendship = 14,
    /// Base types of a class
    ClassIsSubclass = 15,
    /// Generic parameters owned by a generic class
    ClassGenericHasGenericParameter = 16,
    /// Friend scope of a friendship marker
    FriendshipFriend = 17,
    /// Constraints on a generic parameter
    GenericParameterHasParameterConstraint = 18,
    /// Attribute accesses of a method
    MethodAccessesAttribute = 19,
    /// Calls made by a method
    MethodCalls = 20,
    /// Blocks owned by a method
    MethodHasControlFlowBlock = 21,
    /// Parameters owned by a method
    MethodHasParameter = 22,
    /// Return types
    MethodReturns = 23,
    /// Thrown types
    MethodThrows = 24,
    /// Method referenced by a call marker
    MethodCallMethod = 25,
    /// Generic parameters owned by a generic method
    MethodGenericHasGenericParameter = 26,
    /// Declared type of a parameter
    ParameterHasType = 27,
    /// Comments attached to a file
    FileHasComment = 28,
    /// Included files
    FileIncludes = 29,
    /// Top-level entries of the file system
    FileSystemHasFSEntry = 30,
    /// Entries of a folder
    FolderContains = 31,
    /// Type formers of a type, outermost first
    TypeHasTypeFormer = 32,
    /// Parameter types of a signature with passing convention
    TypeFormerMethodHasParameterType = 33,
    /// Return type of a signature
    TypeFormerMethodHasReturnType = 34,
    /// Named entity a type former refers to
    TypeFormerTypeRefersTo = 35,
}

/// Number of slots needed for tables indexed by edge code.
pub const EDGE_KIND_SLOTS: usize = 36;

const ALL_EDGES: [EdgeKind; 35] = [
    EdgeKind::ComponentContains,
    EdgeKind::ComponentHasFiles,
    EdgeKind::ControlFlowBlockCalls,
    EdgeKind::ControlFlowBlockPred,
    EdgeKind::NamedDependsOn,
    EdgeKind::MemberBelongsTo,
    EdgeKind::MemberHasComment,
    EdgeKind::MemberIsContainedIn,
    EdgeKind::MemberUses,
    EdgeKind::ScopeHasMember,
    EdgeKind::AttributeCalls,
    EdgeKind::AttributeHasType,
    EdgeKind::AttributeAccessAttribute,
    EdgeKind::ClassGrantsFriendship,
    EdgeKind::ClassIsSubclass,
    EdgeKind::ClassGenericHasGenericParameter,
    EdgeKind::FriendshipFriend,
    EdgeKind::GenericParameterHasParameterConstraint,
    EdgeKind::MethodAccessesAttribute,
    EdgeKind::MethodCalls,
    EdgeKind::MethodHasControlFlowBlock,
    EdgeKind::MethodHasParameter,
    EdgeKind::MethodReturns,
    EdgeKind::MethodThrows,
    EdgeKind::MethodCallMethod,
    EdgeKind::MethodGenericHasGenericParameter,
    EdgeKind::ParameterHasType,
    EdgeKind::FileHasComment,
    EdgeKind::FileIncludes,
    EdgeKind::FileSystemHasFSEntry,
    EdgeKind::FolderContains,
    EdgeKind::TypeHasTypeFormer,
    EdgeKind::TypeFormerMethodHasParameterType,
    EdgeKind::TypeFormerMethodHasReturnType,
    EdgeKind::TypeFormerTypeRefersTo,
];

impl EdgeKind {
    /// Every edge kind in code order.
    pub const ALL: &'static [EdgeKind] = &ALL_EDGES;

    /// Wire code of this edge kind.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Look up an edge kind by code.
    pub fn from_code(code: u16) -> Option<Self> {
        ALL_EDGES.get((code as usize).checked_sub(1)?).copied()
    }

    /// Schema entry for this edge kind.
    pub fn info(self) -> EdgeInfo {
        use AssocKind as A;
        use Multiplicity::{List, One, Set};
        use NodeKind as N;

        let (source, target, owning, multiplicity, assoc) = match self {
            EdgeKind::ComponentContains => (N::Component, N::Component, false, Set, A::None),
            EdgeKind::ComponentHasFiles => (N::Component, N::File, false, Set, A::None),
            EdgeKind::ControlFlowBlockCalls => (N::ControlFlowBlock, N::Method, false, List, A::None),
            EdgeKind::ControlFlowBlockPred => {
                (N::ControlFlowBlock, N::ControlFlowBlock, false, List, A::None)
            }
            EdgeKind::NamedDependsOn => (N::Named, N::Named, false, List, A::Text),
            EdgeKind::MemberBelongsTo => (N::Member, N::Component, false, Set, A::None),
            EdgeKind::MemberHasComment => (N::Member, N::Comment, false, List, A::None),
            EdgeKind::MemberIsContainedIn => (N::Member, N::File, false, List, A::Position),
            EdgeKind::MemberUses => (N::Member, N::Type, false, Set, A::None),
            EdgeKind::ScopeHasMember => (N::Scope, N::Member, true, List, A::None),
            EdgeKind::AttributeCalls => (N::Attribute, N::MethodCall, false, List, A::None),
            EdgeKind::AttributeHasType => (N::Attribute, N::Type, false, List, A::None),
            EdgeKind::AttributeAccessAttribute => {
                (N::AttributeAccess, N::Attribute, false, One, A::None)
            }
            EdgeKind::ClassGrantsFriendship => (N::Class, N::Friendship, false, List, A::None),
            EdgeKind::ClassIsSubclass => (N::Class, N::Type, false, List, A::None),
            EdgeKind::ClassGenericHasGenericParameter => {
                (N::ClassGeneric, N::GenericParameter, true, List, A::None)
            }
            EdgeKind::FriendshipFriend => (N::Friendship, N::Scope, false, One, A::None),
            EdgeKind::GenericParameterHasParameterConstraint => {
                (N::GenericParameter, N::Type, false, List, A::None)
            }
            EdgeKind::MethodAccessesAttribute => {
                (N::Method, N::AttributeAccess, false, List, A::None)
            }
            EdgeKind::MethodCalls => (N::Method, N::MethodCall, false, List, A::None),
            EdgeKind::MethodHasControlFlowBlock => {
                (N::Method, N::ControlFlowBlock, true, List, A::None)
            }
            EdgeKind::MethodHasParameter => (N::Method, N::Parameter, true, List, A::None),
            EdgeKind::MethodReturns => (N::Method, N::Type, false, List, A::None),
            EdgeKind::MethodThrows => (N::Method, N::Type, false, List, A::None),
            EdgeKind::MethodCallMethod => (N::MethodCall, N::Method, false, One, A::None),
            EdgeKind::MethodGenericHasGenericParameter => {
                (N::MethodGeneric, N::GenericParameter, true, List, A::None)
            }
            EdgeKind::ParameterHasType => (N::Parameter, N::Type, false, One, A::None),
            EdgeKind::FileHasComment => (N::File, N::Comment, false, List, A::None),
            EdgeKind::FileIncludes => (N::File, N::File, false, Set, A::None),
            EdgeKind::FileSystemHasFSEntry => (N::FileSystem, N::FSEntry, true, List, A::None),
            EdgeKind::FolderContains => (N::Folder, N::FSEntry, true, List, A::None),
            EdgeKind::TypeHasTypeFormer => (N::Type, N::TypeFormer, false, List, A::None),
            EdgeKind::TypeFormerMethodHasParameterType => {
                (N::TypeFormerMethod, N::Type, false, List, A::ParameterKind)
            }
            EdgeKind::TypeFormerMethodHasReturnType => {
                (N::TypeFormerMethod, N::Type, false, One, A::None)
            }
            EdgeKind::TypeFormerTypeRefersTo => (N::TypeFormerType, N::Base, false, One, A::None),
        };

        EdgeInfo {
            source,
            target,
            owning,
            multiplicity,
            assoc,
        }
    }

    /// Shorthand for `info().owning`.
    pub fn is_owning(self) -> bool {
        self.info().owning
    }

    /// Whether the edge is part of an interned value's identity. Only the
    /// interning factories set these.
    pub fn defines_value(self) -> bool {
        self.info().source.is_interned()
    }

    /// Edge name in `Source_Relation` form.
    pub fn name(self) -> &'static str {
        match self {
            EdgeKind::ComponentContains => "Component_Contains",
            EdgeKind::ComponentHasFiles => "Component_HasFiles",
            EdgeKind::ControlFlowBlockCalls => "ControlFlowBlock_Calls",
            EdgeKind::ControlFlowBlockPred => "ControlFlowBlock_Pred",
            EdgeKind::NamedDependsOn => "Named_DependsOn",
            EdgeKind::MemberBelongsTo => "Member_BelongsTo",
            EdgeKind::MemberHasComment => "Member_HasComment",
            EdgeKind::MemberIsContainedIn => "Member_IsContainedIn",
            EdgeKind::MemberUses => "Member_Uses",
            EdgeKind::ScopeHasMember => "Scope_HasMember",
            EdgeKind::AttributeCalls => "Attribute_Calls",
            EdgeKind::AttributeHasType => "Attribute_HasType",
            EdgeKind::AttributeAccessAttribute => "AttributeAccess_Attribute",
            EdgeKind::ClassGrantsFriendship => "Class_GrantsFriendship",
            EdgeKind::ClassIsSubclass => "Class_IsSubclass",
            EdgeKind::ClassGenericHasGenericParameter => "ClassGeneric_HasGenericParameter",
            EdgeKind::FriendshipFriend => "Friendship_Friend",
            EdgeKind::GenericParameterHasParameterConstraint => {
                "GenericParameter_HasParameterConstraint"
            }
            EdgeKind::MethodAccessesAttribute => "Method_AccessesAttribute",
            EdgeKind::MethodCalls => "Method_Calls",
            EdgeKind::MethodHasControlFlowBlock => "Method_HasControlFlowBlock",
            EdgeKind::MethodHasParameter => "Method_HasParameter",
            EdgeKind::MethodReturns => "Method_Returns",
            EdgeKind::MethodThrows => "Method_Throws",
            EdgeKind::MethodCallMethod => "MethodCall_Method",
            EdgeKind::MethodGenericHasGenericParameter => "MethodGeneric_HasGenericParameter",
            EdgeKind::ParameterHasType => "Parameter_HasType",
            EdgeKind::FileHasComment => "File_HasComment",
            EdgeKind::FileIncludes => "File_Includes",
            EdgeKind::FileSystemHasFSEntry => "FileSystem_HasFSEntry",
            EdgeKind::FolderContains => "Folder_Contains",
            EdgeKind::TypeHasTypeFormer => "Type_HasTypeFormer",
            EdgeKind::TypeFormerMethodHasParameterType => "TypeFormerMethod_HasParameterType",
            EdgeKind::TypeFormerMethodHasReturnType => "TypeFormerMethod_HasReturnType",
            EdgeKind::TypeFormerTypeRefersTo => "TypeFormerType_RefersTo",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
