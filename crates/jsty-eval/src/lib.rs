//! Abstract evaluator and analyser API for the jsty engine.
//!
//! This crate walks the ES AST over the `jsty-solver` lattice:
//! - `evaluator` - expression dispatch and the four-way outcome signal
//! - `statements` - sequences, conditionals, switch, loops, try
//! - `functions` - calls, memoisation, classes, construction
//! - `destructure` - binding patterns
//! - `narrowing` - test-shape recognition feeding the solver's guards
//! - `modules` - imports/exports through the injected resolver
//! - `collector` - unreachable ranges and per-node type maps
//! - `analyser` - the public five-operation API
//!
//! The evaluator is single-threaded and cooperative: every budget
//! (loop samples, union cardinality, fixed-point rounds, recursion
//! depth) widens instead of failing, so evaluation is total.

pub mod analyser;
pub mod collector;
pub mod context;
pub mod destructure;
pub mod directives;
pub mod evaluator;
pub mod functions;
pub mod modules;
pub mod narrowing;
pub mod statements;

pub use analyser::{Analyser, AnalysisResult, CaseResult, FunctionAnalysis};
pub use collector::{CollectKey, Collector};
pub use context::{
    AnalyserContext, AnalyserOptions, MemoEntry, ModuleRecord, ModuleResolver, ResolvedModule,
};
pub use directives::{Directive, DirectiveSet, MockValue};
pub use evaluator::{EvalOutcome, Evaluator, ExprFlow};
pub use functions::CallArgs;

#[cfg(test)]
mod test_fixtures;

#[cfg(test)]
#[path = "../tests/evaluator_tests.rs"]
mod evaluator_tests;
#[cfg(test)]
#[path = "../tests/narrowing_tests.rs"]
mod narrowing_tests;
#[cfg(test)]
#[path = "../tests/branch_tests.rs"]
mod branch_tests;
#[cfg(test)]
#[path = "../tests/loop_tests.rs"]
mod loop_tests;
#[cfg(test)]
#[path = "../tests/call_tests.rs"]
mod call_tests;
#[cfg(test)]
#[path = "../tests/module_tests.rs"]
mod module_tests;
#[cfg(test)]
#[path = "../tests/collector_tests.rs"]
mod collector_tests;
#[cfg(test)]
#[path = "../tests/directive_tests.rs"]
mod directive_tests;
#[cfg(test)]
#[path = "../tests/destructure_tests.rs"]
mod destructure_tests;
