//! # asgraph
//!
//! Storage, traversal and persistence engine for attributed semantic graphs
//! (ASGs) of analyzed source code.
//!
//! ## Core Principles
//!
//! - **Ids, not pointers**: nodes live in an arena and refer to each other by
//!   [`NodeId`]; ids are stable for the lifetime of a node and across save/load
//! - **Schema driven**: one static table per node and edge kind drives edge
//!   validation, traversal order and the binary codec
//! - **Shared values**: types, signatures and other value nodes are interned so
//!   structurally equal values share one node
//! - **Explicit side tables**: filter, reverse edges and string table are owned
//!   by the arena and kept consistent by every mutation
//!
//! ## Architecture
//!
//! ```text
//! Analysis tools (visitors, exporters, mutators)
//!     ↓
//! AlgorithmPreorder (schema-ordered depth-first walk)
//!     ↓
//! Arena (nodes, interning, filter, reverse edges, strings)
//!     ↓
//! Binary persistence (csi/zsi files)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use asgraph::{Arena, ArenaConfig, EdgeKind, Language, NodeKind, SaveOptions};
//!
//! # fn main() -> asgraph::Result<()> {
//! let mut arena = Arena::new(ArenaConfig::for_language(Language::Java));
//!
//! let class = arena.create_node(NodeKind::Class)?;
//! arena.set_name(class, "Main")?;
//! arena.add_edge(arena.root_package(), EdgeKind::ScopeHasMember, class)?;
//!
//! let file = arena.create_file("src/Main.java")?;
//! arena.save("main.csi", SaveOptions::compressed())?;
//! # let _ = file;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod algorithms;
pub mod config;
pub mod error;
pub mod graph;
pub mod persistence;
pub mod schema;
pub mod strtable;

// Re-export main types
pub use algorithms::{AlgorithmPreorder, EdgeVisit, NodeCollector, VisitContext, Visitor};
pub use config::{ArenaConfig, SaveOptions};
pub use error::{AsgError, Result};
pub use graph::{
    Arena, Assoc, DestroyObserver, EdgeSelector, EdgeTarget, Filter, FilterState, Node, NodeData,
    NodeId, ObserverId, ReverseEdges, SourcePosition, FILE_SYSTEM_ID, MAX_NODE_ID, RESERVED_IDS,
    ROOT_COMPONENT_ID, ROOT_PACKAGE_ID,
};
pub use persistence::{HeaderData, PropertyData, RawHeader};
pub use schema::{
    AccessibilityKind, ClassKind, EdgeKind, GenericParameterKind, Language, MethodKind,
    Multiplicity, NodeKind, PackageKind, ParameterKind, PointerKind, SimpleTypeKind,
};
pub use strtable::{Key, StringTable};
