//! The public analyser API.
//!
//! Five operations, all total: `analyse` (drive the per-function cases),
//! `call_function` (one invocation), `type_at_position` and
//! `completions_at_position` (editor queries over the collector), and
//! `reset_caches`. Assertion failures and analyser-internal errors are
//! diagnostics in the result, never panics.

use rustc_hash::FxHashMap;
use serde::Serialize;

use jsty_ast::{AstArena, NodeIndex, NodeKind};
use jsty_common::{Diagnostic, LineMap, Position, Span, diagnostic_codes, diagnostics};
use jsty_solver::ops::OpResult;
use jsty_solver::ops_object::{CompletionItem, CompletionKind, completions_of};
use jsty_solver::types::{Env, TypeValue};

use crate::collector::CollectKey;
use crate::context::{AnalyserContext, AnalyserOptions};
use crate::directives::{Directive, DirectiveSet, MockValue};
use crate::evaluator::Evaluator;
use crate::functions::CallArgs;

/// The result of one case run of one function.
#[derive(Clone, Debug, Serialize)]
pub struct CaseResult {
    /// Case name, or `None` for the synthetic abstract run.
    pub name: Option<String>,
    #[serde(serialize_with = "serialize_type")]
    pub value: TypeValue,
    #[serde(serialize_with = "serialize_type")]
    pub throws: TypeValue,
}

#[derive(Clone, Debug, Serialize)]
pub struct FunctionAnalysis {
    pub name: String,
    pub node: NodeIndex,
    pub cases: Vec<CaseResult>,
    /// Union of the case values; precise unions are preserved.
    #[serde(serialize_with = "serialize_type")]
    pub combined_value: TypeValue,
    #[serde(serialize_with = "serialize_type")]
    pub combined_throws: TypeValue,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct AnalysisResult {
    pub functions: Vec<FunctionAnalysis>,
    pub diagnostics: Vec<Diagnostic>,
}

fn serialize_type<S: serde::Serializer>(ty: &TypeValue, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ty.to_string())
}

/// One analyser instance: owns its caches and collector, so independent
/// analyses in parallel workers each construct their own.
pub struct Analyser {
    ctx: AnalyserContext,
    directives: DirectiveSet,
    main_module: u32,
    top_bindings: Vec<(String, TypeValue)>,
}

impl Analyser {
    pub fn new(options: AnalyserOptions) -> Analyser {
        Analyser {
            ctx: AnalyserContext::new(options),
            directives: DirectiveSet::new(),
            main_module: 0,
            top_bindings: Vec::new(),
        }
    }

    /// Analyse one compilation unit: evaluate its top level, then drive
    /// every top-level function through its cases.
    pub fn analyse(
        &mut self,
        arena: AstArena,
        external_env: &[(String, TypeValue)],
        directives: DirectiveSet,
    ) -> AnalysisResult {
        self.ctx.collector.reset();
        self.ctx.diagnostics.clear();
        self.directives = directives;
        let directory = self.ctx.options.current_file_directory.clone();
        self.main_module = self.ctx.register_module(arena, "<main>", directory);

        let env = Env::new();
        for (name, value) in external_env {
            env.bind(name.clone(), value.clone());
        }

        let mut evaluator = Evaluator::new(&mut self.ctx, self.main_module, &self.directives);
        let root = evaluator.arena.root();
        let body = match evaluator.arena.get(root).map(|n| n.kind.clone()) {
            Some(NodeKind::Program { body }) => body,
            _ => {
                evaluator.report_malformed(Span::dummy(), "root is not a program");
                Vec::new()
            }
        };

        // Top-level pass: evaluate statements, apply mocks, collect the
        // functions to case-drive.
        let mut functions: Vec<(String, NodeIndex)> = Vec::new();
        for &stmt in &body {
            let _ = evaluator.eval_stmt(stmt, &env);
            apply_mocks(&mut evaluator, stmt, &env);
            collect_function(&evaluator, stmt, &mut functions);
        }

        // Case pass.
        let mut analyses = Vec::new();
        for (name, node) in functions {
            let analysis = run_cases(&mut evaluator, &name, node, &env);
            analyses.push(analysis);
        }
        evaluator.collect_key = CollectKey::TOP_LEVEL;
        drop(evaluator);

        self.top_bindings = env
            .names()
            .into_iter()
            .map(|name| {
                let value = env.lookup(&name);
                (name, value)
            })
            .collect();

        AnalysisResult {
            functions: analyses,
            diagnostics: self.ctx.diagnostics.clone(),
        }
    }

    /// Drive one invocation of a function type value.
    pub fn call_function(&mut self, function: &TypeValue, args: &[TypeValue]) -> OpResult {
        if self.ctx.modules.is_empty() {
            return OpResult::value(TypeValue::Unknown);
        }
        let module = match function {
            TypeValue::Function(func) => func.id.module,
            _ => self.main_module,
        };
        let mut evaluator = Evaluator::new(&mut self.ctx, module, &self.directives);
        evaluator.call_value(function, &CallArgs::fixed(args.to_vec()), None)
    }

    /// The narrowest recorded node type enclosing the position.
    /// `active_cases` selects which case run answers per function;
    /// unlisted functions answer from their first recorded case.
    pub fn type_at_position(
        &self,
        line_map: &LineMap,
        position: Position,
        active_cases: &FxHashMap<NodeIndex, usize>,
    ) -> Option<TypeValue> {
        let offset = line_map.offset(position);
        let mut keys = vec![CollectKey::TOP_LEVEL];
        for function in self.ctx.collector.recorded_functions() {
            let case_index = active_cases.get(&function).copied().unwrap_or_else(|| {
                self.ctx
                    .collector
                    .case_indices(function)
                    .first()
                    .copied()
                    .unwrap_or(0)
            });
            keys.push(CollectKey::case(function, case_index));
        }
        self.ctx.collector.type_at(offset, keys)
    }

    /// Completion items at a position: the member surface of the
    /// expression there, or the in-scope top-level bindings.
    pub fn completions_at_position(
        &self,
        line_map: &LineMap,
        position: Position,
    ) -> Vec<CompletionItem> {
        let receiver = self.type_at_position(line_map, position, &FxHashMap::default());
        if let Some(receiver) = receiver {
            let members = completions_of(&receiver);
            if !members.is_empty() {
                return members;
            }
        }
        self.top_bindings
            .iter()
            .map(|(name, value)| CompletionItem {
                label: name.clone(),
                kind: CompletionKind::Variable,
                detail: Some(value.to_string()),
            })
            .collect()
    }

    /// Clear the memoisation and module caches.
    pub fn reset_caches(&mut self) {
        self.ctx.reset_caches();
    }

    /// A top-level binding of the last analysed unit, e.g. to hand a
    /// function value back to [`Analyser::call_function`].
    pub fn binding(&self, name: &str) -> Option<TypeValue> {
        self.top_bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value.clone())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.ctx.diagnostics
    }

    /// Unreachable source ranges recorded by the last analysis.
    pub fn unreachable_spans(&self) -> &[Span] {
        self.ctx.collector.unreachable_spans()
    }
}

/// Apply `mock` directives attached to a top-level statement.
fn apply_mocks(evaluator: &mut Evaluator<'_>, stmt: NodeIndex, env: &Env) {
    let mocks: Vec<(String, MockValue)> = evaluator
        .directives
        .for_statement(stmt)
        .iter()
        .filter_map(|directive| match directive {
            Directive::Mock { name, value } => Some((name.clone(), value.clone())),
            _ => None,
        })
        .collect();
    for (name, mock) in mocks {
        let value = match mock {
            MockValue::Value(value) => value,
            MockValue::Module(path) => {
                let span = evaluator.arena.span(stmt);
                match evaluator.module_exports(&path, span) {
                    Some(exports) => exports
                        .get("default")
                        .cloned()
                        .unwrap_or(TypeValue::Unknown),
                    None => TypeValue::Unknown,
                }
            }
        };
        if !env.update(&name, value.clone()) {
            let message = diagnostics::format_message(
                diagnostics::message_template(diagnostic_codes::UNKNOWN_MOCK_TARGET),
                &[&name],
            );
            let span = evaluator.arena.span(stmt);
            let file = evaluator.ctx.module(evaluator.module).canonical_path.clone();
            evaluator.ctx.report(Diagnostic::warning(
                file,
                span,
                message,
                diagnostic_codes::UNKNOWN_MOCK_TARGET,
            ));
            env.bind(name, value);
        }
    }
}

/// Find the function a top-level statement declares, if any (plain or
/// behind `export`).
fn collect_function(
    evaluator: &Evaluator<'_>,
    stmt: NodeIndex,
    out: &mut Vec<(String, NodeIndex)>,
) {
    let Some(node) = evaluator.arena.get(stmt) else {
        return;
    };
    match &node.kind {
        NodeKind::Function(data) => {
            if let Some(name) = &data.name {
                out.push((name.clone(), stmt));
            }
        }
        NodeKind::ExportNamed {
            decl: Some(decl), ..
        } => collect_function(evaluator, *decl, out),
        _ => {}
    }
}

/// Run every case of one function, or a synthetic abstract case when
/// none were supplied.
fn run_cases(
    evaluator: &mut Evaluator<'_>,
    name: &str,
    node: NodeIndex,
    env: &Env,
) -> FunctionAnalysis {
    let function = env.lookup(name);
    let param_count = match &function {
        TypeValue::Function(func) => func.params.len(),
        _ => 0,
    };

    let case_directives: Vec<(String, Vec<TypeValue>, Option<TypeValue>)> = evaluator
        .directives
        .cases(node)
        .iter()
        .filter_map(|directive| match directive {
            Directive::Case {
                name,
                args,
                expected,
            } => Some((name.clone(), args.clone(), expected.clone())),
            _ => None,
        })
        .collect();

    let mut cases = Vec::new();
    if case_directives.is_empty() {
        evaluator.collect_key = CollectKey::case(node, 0);
        let args: Vec<TypeValue> = (0..param_count).map(|_| TypeValue::Unknown).collect();
        let result = evaluator.call_value(&function, &CallArgs::fixed(args), None);
        cases.push(CaseResult {
            name: None,
            value: result.value,
            throws: result.throws,
        });
    } else {
        for (index, (case_name, args, expected)) in case_directives.into_iter().enumerate() {
            evaluator.collect_key = CollectKey::case(node, index);
            if args.len() > param_count {
                report_case_arity(evaluator, node, &case_name, args.len(), param_count);
            }
            let result = evaluator.call_value(&function, &CallArgs::fixed(args), None);
            if let Some(expected) = &expected
                && &result.value != expected
            {
                report_mismatch(evaluator, node, expected, &result.value);
            }
            cases.push(CaseResult {
                name: Some(case_name),
                value: result.value,
                throws: result.throws,
            });
        }
    }
    evaluator.collect_key = CollectKey::TOP_LEVEL;

    let cap = evaluator.ctx.options.union_cap;
    let combined_value =
        jsty_solver::union_with_cap(cases.iter().map(|c| c.value.clone()).collect(), cap);
    let combined_throws =
        jsty_solver::union_with_cap(cases.iter().map(|c| c.throws.clone()).collect(), cap);

    if let Some(expected) = evaluator.directives.expected_return(node).cloned()
        && combined_value != expected
    {
        report_mismatch(evaluator, node, &expected, &combined_value);
    }

    FunctionAnalysis {
        name: name.to_string(),
        node,
        cases,
        combined_value,
        combined_throws,
    }
}

fn report_mismatch(
    evaluator: &mut Evaluator<'_>,
    node: NodeIndex,
    expected: &TypeValue,
    actual: &TypeValue,
) {
    let message = diagnostics::format_message(
        diagnostics::message_template(diagnostic_codes::EXPECTED_TYPE_MISMATCH),
        &[&expected.to_string(), &actual.to_string()],
    );
    let span = evaluator.arena.span(node);
    let file = evaluator.ctx.module(evaluator.module).canonical_path.clone();
    evaluator.ctx.report(Diagnostic::error(
        file,
        span,
        message,
        diagnostic_codes::EXPECTED_TYPE_MISMATCH,
    ));
}

fn report_case_arity(
    evaluator: &mut Evaluator<'_>,
    node: NodeIndex,
    case_name: &str,
    supplied: usize,
    declared: usize,
) {
    let message = diagnostics::format_message(
        diagnostics::message_template(diagnostic_codes::CASE_ARITY_MISMATCH),
        &[case_name, &supplied.to_string(), &declared.to_string()],
    );
    let span = evaluator.arena.span(node);
    let file = evaluator.ctx.module(evaluator.module).canonical_path.clone();
    evaluator.ctx.report(Diagnostic::error(
        file,
        span,
        message,
        diagnostic_codes::CASE_ARITY_MISMATCH,
    ));
}
