//! Traversal algorithms over the arena.

mod preorder;
mod visitor;

pub use preorder::AlgorithmPreorder;
pub use visitor::{EdgeVisit, NodeCollector, VisitContext, Visitor};
