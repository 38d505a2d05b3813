//! Directive data model.
//!
//! Directive comments are extracted by surrounding tooling; the analyser
//! consumes them as data attached to top-level statements. A `case`
//! supplies an argument vector (and optionally an expected result) for
//! one run of a function; `mock` overrides a binding; `pure` enables
//! memoisation; `skip` excludes a function body from analysis; `sample`
//! overrides the loop unroll budget; `returns` asserts the combined
//! result.

use rustc_hash::FxHashMap;

use jsty_ast::NodeIndex;
use jsty_solver::types::TypeValue;

#[derive(Clone, Debug)]
pub enum MockValue {
    /// Replace the binding with this type value.
    Value(TypeValue),
    /// Replace the binding with the default export of a module path.
    Module(String),
}

#[derive(Clone, Debug)]
pub enum Directive {
    Case {
        name: String,
        args: Vec<TypeValue>,
        expected: Option<TypeValue>,
    },
    Mock {
        name: String,
        value: MockValue,
    },
    Pure,
    Skip {
        returns: Option<TypeValue>,
    },
    Sample {
        count: u32,
    },
    Returns {
        expected: TypeValue,
    },
}

/// Directives keyed by the top-level statement they precede.
#[derive(Debug, Default)]
pub struct DirectiveSet {
    by_statement: FxHashMap<NodeIndex, Vec<Directive>>,
}

impl DirectiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, statement: NodeIndex, directive: Directive) {
        self.by_statement.entry(statement).or_default().push(directive);
    }

    pub fn for_statement(&self, statement: NodeIndex) -> &[Directive] {
        self.by_statement
            .get(&statement)
            .map_or(&[], Vec::as_slice)
    }

    pub fn is_pure(&self, statement: NodeIndex) -> bool {
        self.for_statement(statement)
            .iter()
            .any(|d| matches!(d, Directive::Pure))
    }

    pub fn skip(&self, statement: NodeIndex) -> Option<Option<TypeValue>> {
        self.for_statement(statement).iter().find_map(|d| match d {
            Directive::Skip { returns } => Some(returns.clone()),
            _ => None,
        })
    }

    pub fn sample_count(&self, statement: NodeIndex) -> Option<u32> {
        self.for_statement(statement).iter().find_map(|d| match d {
            Directive::Sample { count } => Some(*count),
            _ => None,
        })
    }

    pub fn cases(&self, statement: NodeIndex) -> Vec<&Directive> {
        self.for_statement(statement)
            .iter()
            .filter(|d| matches!(d, Directive::Case { .. }))
            .collect()
    }

    pub fn expected_return(&self, statement: NodeIndex) -> Option<&TypeValue> {
        self.for_statement(statement).iter().find_map(|d| match d {
            Directive::Returns { expected } => Some(expected),
            _ => None,
        })
    }
}
