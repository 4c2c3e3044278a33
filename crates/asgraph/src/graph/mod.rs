//! Graph storage: nodes, the arena and its side tables.

mod arena;
mod filesystem;
mod filter;
mod interning;
mod node;
mod reverse;

pub use arena::{
    Arena, DestroyObserver, ObserverId, FILE_SYSTEM_ID, MAX_NODE_ID, RESERVED_IDS,
    ROOT_COMPONENT_ID, ROOT_PACKAGE_ID,
};
pub use filter::{Filter, FilterOffGuard, FilterState};
pub use node::{
    Assoc, AttributeData, ClassData, EdgeTarget, FileData, GenericParameterData, MemberFields,
    MethodData, NamedFields, Node, NodeData, NodeId, PackageData, ParameterData, ScopeFields,
    SourcePosition,
};
pub use reverse::{EdgeSelector, ReverseEdges};
