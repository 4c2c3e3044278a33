//! Language-independent node/edge catalogue.
//!
//! The schema is static: the kind lattice, the edge table (source, target,
//! ownership, multiplicity, association) and the scalar enumerations. The arena,
//! the traversal and the codec are all driven by these tables instead of
//! per-kind code.

mod edge_kind;
mod node_kind;
mod values;

pub use edge_kind::{AssocKind, EdgeInfo, EdgeKind, Multiplicity, EDGE_KIND_SLOTS};
pub use node_kind::{NodeKind, NODE_KIND_SLOTS};
pub use values::{
    AccessibilityKind, ClassKind, GenericParameterKind, Language, MethodKind, PackageKind,
    ParameterKind, PointerKind, SimpleTypeKind,
};
