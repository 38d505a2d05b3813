//! Centralized budgets and thresholds for the abstract interpreter.
//!
//! This module provides shared constants for loop sampling, union
//! cardinality, fixed-point iteration, and recursion depths used throughout
//! the engine. Centralizing these values:
//! - Prevents duplicate definitions with inconsistent values
//! - Makes it easy to tune budgets for different environments
//! - Documents the rationale for each budget
//!
//! Budgets make termination a property of the input: when a budget is hit
//! the engine widens, it never runs unbounded and it never fails with a
//! diagnostic.

// =============================================================================
// Sampling Budgets
// =============================================================================

/// Default number of concrete iterations to unroll for a loop whose bounds
/// and induction are decidable.
///
/// Three iterations are enough to observe the common accumulate-over-fixed-
/// range shape exactly; anything past the budget falls back to the widening
/// fixed-point. Overridable per function via a `sample` directive and per
/// analysis via `AnalyserOptions::sample_count`.
///
/// # JavaScript example
///
/// ```javascript
/// let s = 0;
/// for (let i = 0; i < 3; i++) s += i; // unrolled exactly: s is 3
/// ```
pub const DEFAULT_LOOP_SAMPLE_COUNT: u32 = 3;

/// Maximum iterations of the widening fixed-point for a single loop.
///
/// Each round joins the types of every variable written in the body with
/// their pre-round types; the join chain is finite because literals widen
/// to their primitives, but pathological refinement towers could otherwise
/// bounce. After this many rounds every mutated variable is widened to its
/// primitive base and the loop exits.
pub const FIXED_POINT_MAX_ITERATIONS: u32 = 8;

// =============================================================================
// Cardinality Limits
// =============================================================================

/// Maximum number of members a union may hold after simplification.
///
/// Distributing operations over unions multiplies member counts; without a
/// cap, a chain of binary operations over literal unions grows
/// combinatorially. Past the cap, members collapse to their primitive bases
/// and the union re-simplifies (all-numeric-literal unions become `number`,
/// and so on). Overridable via `AnalyserOptions::union_cap`.
pub const UNION_CARDINALITY_CAP: usize = 12;

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum depth for expression evaluation.
///
/// Prevents stack overflow when the evaluator recursively descends into
/// deeply nested expressions. Guarded with segmented-stack growth; at this
/// depth the evaluator yields `unknown` for the innermost expression rather
/// than aborting the analysis.
pub const MAX_EVAL_DEPTH: u32 = 500;

/// Maximum depth of abstract call nesting.
///
/// Recursive calls normally short-circuit through the memoisation
/// placeholder; this limit is the backstop for unmemoised (impure)
/// recursion, which yields `unknown` past the limit.
pub const MAX_CALL_DEPTH: u32 = 100;

/// Maximum recursion depth for structural subtype checks.
///
/// Object types can alias themselves through properties; identity checks
/// cut most cycles, and this depth bounds the rest. Past the limit the
/// checker answers `false`, the conservative direction for narrowing.
pub const MAX_SUBTYPE_DEPTH: u32 = 100;

/// Maximum recursion depth for structural equality of type values.
///
/// Equality is identity-first for objects, so this bound is only reached
/// through deep non-aliased structures. Past the limit values compare
/// unequal, which at worst keeps a duplicate union member.
pub const MAX_EQUALITY_DEPTH: u32 = 100;

// =============================================================================
// Capacity Hints
// =============================================================================

/// Pre-allocation size for environment frames.
///
/// Most frames hold a handful of bindings (parameters plus a few locals).
pub const ENV_FRAME_CAPACITY: usize = 8;

/// Red-zone size in bytes for segmented stack growth at evaluator
/// recursion points.
pub const STACK_RED_ZONE: usize = 64 * 1024;

/// Segment size in bytes allocated when the red zone is breached.
pub const STACK_GROWTH: usize = 1024 * 1024;
