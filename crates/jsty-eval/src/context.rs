//! Analyser context: options, caches, and per-analysis state.
//!
//! Everything that would be tempting to make a global lives here instead:
//! the object-identity counter, the memoisation table, the module cache,
//! the collector, and the diagnostics sink. One context per analysis
//! guarantees isolation; parallel analyses each own their instance.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::rc::Rc;

use jsty_ast::AstArena;
use jsty_common::Diagnostic;
use jsty_common::limits::{
    DEFAULT_LOOP_SAMPLE_COUNT, FIXED_POINT_MAX_ITERATIONS, UNION_CARDINALITY_CAP,
};
use jsty_solver::ops::OpResult;
use jsty_solver::types::{FunctionId, ObjectIdGen, TypeValue};

use crate::collector::Collector;

/// A module produced by the injected resolver.
pub struct ResolvedModule {
    pub arena: AstArena,
    pub canonical_path: String,
}

/// Module resolution callback. A stub returning `None` for everything is
/// a valid resolver; unresolved imports bind `unknown` and report a
/// diagnostic.
pub trait ModuleResolver {
    fn resolve(&self, import_path: &str, from_dir: &str) -> Option<ResolvedModule>;
}

/// Tuning knobs for one analysis. Defaults come from
/// `jsty_common::limits`.
pub struct AnalyserOptions {
    /// Loop unroll budget for decidable loops.
    pub sample_count: u32,
    /// Maximum union cardinality before literal absorption.
    pub union_cap: usize,
    /// Iteration cap for the loop widening fixed-point.
    pub fixed_point_cap: u32,
    /// Directory of the file under analysis, handed to the resolver.
    pub current_file_directory: String,
    pub module_resolver: Option<Box<dyn ModuleResolver>>,
}

impl Default for AnalyserOptions {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_LOOP_SAMPLE_COUNT,
            union_cap: UNION_CARDINALITY_CAP,
            fixed_point_cap: FIXED_POINT_MAX_ITERATIONS,
            current_file_directory: String::new(),
            module_resolver: None,
        }
    }
}

impl std::fmt::Debug for AnalyserOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyserOptions")
            .field("sample_count", &self.sample_count)
            .field("union_cap", &self.union_cap)
            .field("fixed_point_cap", &self.fixed_point_cap)
            .field("current_file_directory", &self.current_file_directory)
            .field("module_resolver", &self.module_resolver.is_some())
            .finish()
    }
}

/// Memoisation key: function identity plus the canonical rendering of the
/// argument type values. Object ids never appear in the rendering, so
/// structurally equal argument lists share an entry.
pub type MemoKey = (FunctionId, String);

/// A memo entry is either mid-evaluation (recursive calls see the
/// placeholder) or settled.
#[derive(Clone, Debug)]
pub enum MemoEntry {
    InProgress,
    Done(OpResult),
}

/// One registered compilation unit. Module 0 is the unit under analysis;
/// imports append.
pub struct ModuleRecord {
    pub arena: Rc<AstArena>,
    pub canonical_path: String,
    pub directory: String,
}

/// All mutable state of one analysis.
pub struct AnalyserContext {
    pub options: AnalyserOptions,
    pub idgen: ObjectIdGen,
    pub memo: FxHashMap<MemoKey, MemoEntry>,
    /// Canonical module path -> exports, memoised across imports.
    pub module_cache: FxHashMap<String, IndexMap<String, TypeValue>>,
    pub modules: Vec<ModuleRecord>,
    pub collector: Collector,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalyserContext {
    pub fn new(options: AnalyserOptions) -> Self {
        Self {
            options,
            idgen: ObjectIdGen::new(),
            memo: FxHashMap::default(),
            module_cache: FxHashMap::default(),
            modules: Vec::new(),
            collector: Collector::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Register a compilation unit, returning its module id.
    pub fn register_module(
        &mut self,
        arena: AstArena,
        canonical_path: impl Into<String>,
        directory: impl Into<String>,
    ) -> u32 {
        let id = self.modules.len() as u32;
        self.modules.push(ModuleRecord {
            arena: Rc::new(arena),
            canonical_path: canonical_path.into(),
            directory: directory.into(),
        });
        id
    }

    pub fn module(&self, id: u32) -> &ModuleRecord {
        &self.modules[id as usize]
    }

    /// Clear the memoisation and module caches. Collector state is owned
    /// by `analyse` runs and reset there.
    pub fn reset_caches(&mut self) {
        self.memo.clear();
        self.module_cache.clear();
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
