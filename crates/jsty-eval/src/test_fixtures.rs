//! Shared fixtures for the evaluator test suites.

use jsty_ast::{AstArena, AstBuilder, NodeIndex};
use jsty_solver::types::TypeValue;

use crate::analyser::{Analyser, AnalysisResult, FunctionAnalysis};
use crate::context::AnalyserOptions;
use crate::directives::{Directive, DirectiveSet};

/// Build an arena; the closure returns the program root.
pub(crate) fn build(f: impl FnOnce(&mut AstBuilder) -> NodeIndex) -> AstArena {
    let mut builder = AstBuilder::new();
    let root = f(&mut builder);
    builder.finish(root)
}

pub(crate) fn analyse(arena: AstArena, directives: DirectiveSet) -> (Analyser, AnalysisResult) {
    let mut analyser = Analyser::new(AnalyserOptions::default());
    let result = analyser.analyse(arena, &[], directives);
    (analyser, result)
}

pub(crate) fn analyse_plain(arena: AstArena) -> (Analyser, AnalysisResult) {
    analyse(arena, DirectiveSet::new())
}

pub(crate) fn function_analysis<'r>(
    result: &'r AnalysisResult,
    name: &str,
) -> &'r FunctionAnalysis {
    result
        .functions
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("no analysis for function {name}"))
}

pub(crate) fn case(name: &str, args: Vec<TypeValue>) -> Directive {
    Directive::Case {
        name: name.to_string(),
        args,
        expected: None,
    }
}

/// Attach one `case` per argument vector to a statement.
pub(crate) fn cases_for(
    directives: &mut DirectiveSet,
    stmt: NodeIndex,
    arg_vectors: Vec<Vec<TypeValue>>,
) {
    for (i, args) in arg_vectors.into_iter().enumerate() {
        directives.attach(stmt, case(&format!("case{i}"), args));
    }
}
