//! Type-value lattice and operator semantics for the jsty engine.
//!
//! This crate is a pure algebra over type values: no AST walking, no
//! control flow. It provides:
//! - `types` - the `TypeValue` sum, literal values, object identity,
//!   environments
//! - `subtype` - the lattice ordering (`Unknown` top, `Never` bottom)
//! - `simplify` - union normalisation and widening
//! - `refine` / `refinements` - refinement framework plus the built-in
//!   template-string and numeric-range refinements
//! - `ops` and friends - JS operator, method, and property semantics
//! - `guards` - narrowing by type guard
//! - `deep_clone` - identity-preserving environment forking and merging
//!
//! The evaluator crate drives all of this from syntax.

pub mod deep_clone;
pub mod display;
pub mod equality;
pub mod guards;
pub mod ops;
pub mod ops_array;
pub mod ops_object;
pub mod ops_string;
pub mod refine;
pub mod refinements;
pub mod simplify;
pub mod subtype;
pub mod types;

pub use deep_clone::{BranchClones, fork_env, merge_branches, snapshot_env};
pub use guards::{TypeGuard, apply_guard};
pub use ops::{InvokeFn, OpResult};
pub use ops_array::MethodOutcome;
pub use ops_object::{CompletionItem, CompletionKind};
pub use refine::{Dispatch, Refinement};
pub use refinements::{NumericRange, TemplatePart, TemplateString};
pub use simplify::{union_of, union_with_cap, widen, widen_loop};
pub use subtype::{SubtypeChecker, is_subtype_of};
pub use types::{
    ClassValue, Env, FunctionId, FunctionValue, InstanceValue, LiteralValue, ObjectId,
    ObjectIdGen, ObjectRef, PrimitiveKind, TagSet, Truthiness, TypeValue,
};

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod types_tests;
#[cfg(test)]
#[path = "../tests/simplify_tests.rs"]
mod simplify_tests;
#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod subtype_tests;
#[cfg(test)]
#[path = "../tests/ops_tests.rs"]
mod ops_tests;
#[cfg(test)]
#[path = "../tests/string_methods_tests.rs"]
mod string_methods_tests;
#[cfg(test)]
#[path = "../tests/array_methods_tests.rs"]
mod array_methods_tests;
#[cfg(test)]
#[path = "../tests/refinement_tests.rs"]
mod refinement_tests;
#[cfg(test)]
#[path = "../tests/guards_tests.rs"]
mod guards_tests;
#[cfg(test)]
#[path = "../tests/deep_clone_tests.rs"]
mod deep_clone_tests;
#[cfg(test)]
#[path = "../tests/env_tests.rs"]
mod env_tests;
