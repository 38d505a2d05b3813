//! ES-style AST for the jsty abstract interpreter.
//!
//! Parsing is not this workspace's concern: an AST provider (a JS/TS parser
//! binding, or the [`builder::AstBuilder`] in tests and embedders) produces
//! an [`AstArena`] which the evaluator walks. The shape follows the usual
//! ES AST node taxonomy: expression, pattern, and statement kinds with
//! source spans on every node.
//!
//! Nodes live in a single arena and reference each other through
//! [`NodeIndex`] handles. The arena is immutable once handed to an analyser
//! and outlives every function value inferred from it, so handles stay
//! valid for the duration of an analysis.

pub mod arena;
pub mod builder;
pub mod node;
pub mod ops;

pub use arena::{AstArena, Node, NodeIndex};
pub use builder::AstBuilder;
pub use node::{
    ClassData, FunctionData, ImportSpecifier, MethodData, MethodKind, NodeKind, PropertyData,
    VarKind,
};
pub use ops::{AssignOp, BinaryOp, LogicalOp, UnaryOp, UpdateOp};

#[cfg(test)]
#[path = "../tests/arena_tests.rs"]
mod arena_tests;
#[cfg(test)]
#[path = "../tests/builder_tests.rs"]
mod builder_tests;
