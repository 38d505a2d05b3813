//! Imports and exports.
//!
//! Module resolution is an injected callback; evaluation of a resolved
//! module is memoised per canonical path. Import specifiers bind names
//! drawn from the module's exports; a namespace import binds an object of
//! all of them. Failures become diagnostics and bind `unknown`, never
//! aborting the analysis.

use indexmap::IndexMap;

use jsty_ast::{ImportSpecifier, NodeIndex, NodeKind};
use jsty_common::{Diagnostic, Span, diagnostic_codes, diagnostics};
use jsty_solver::types::{Env, ObjectRef, TypeValue};

use crate::evaluator::{EvalOutcome, Evaluator};

impl Evaluator<'_> {
    pub(crate) fn eval_import(
        &mut self,
        specifiers: &[ImportSpecifier],
        source: &str,
        span: Span,
        env: &Env,
    ) -> EvalOutcome {
        let Some(exports) = self.module_exports(source, span) else {
            // Unresolved: bind everything unknown and continue.
            for specifier in specifiers {
                let local = match specifier {
                    ImportSpecifier::Named { local, .. }
                    | ImportSpecifier::Default { local }
                    | ImportSpecifier::Namespace { local } => local,
                };
                env.bind(local.clone(), TypeValue::Unknown);
            }
            return EvalOutcome::Value(TypeValue::undefined());
        };

        for specifier in specifiers {
            match specifier {
                ImportSpecifier::Named { imported, local } => {
                    match exports.get(imported) {
                        Some(value) => env.bind(local.clone(), value.clone()),
                        None => {
                            self.report_unresolved_import(source, imported, span);
                            env.bind(local.clone(), TypeValue::Unknown);
                        }
                    }
                }
                ImportSpecifier::Default { local } => match exports.get("default") {
                    Some(value) => env.bind(local.clone(), value.clone()),
                    None => {
                        self.report_unresolved_import(source, "default", span);
                        env.bind(local.clone(), TypeValue::Unknown);
                    }
                },
                ImportSpecifier::Namespace { local } => {
                    let namespace = ObjectRef::new(&self.ctx.idgen, exports.clone());
                    env.bind(local.clone(), TypeValue::Object(namespace));
                }
            }
        }
        EvalOutcome::Value(TypeValue::undefined())
    }

    /// Resolve and evaluate a module, memoised on its canonical path.
    pub(crate) fn module_exports(
        &mut self,
        source: &str,
        span: Span,
    ) -> Option<IndexMap<String, TypeValue>> {
        let from_dir = self.ctx.module(self.module).directory.clone();
        let resolved = self
            .ctx
            .options
            .module_resolver
            .as_ref()
            .and_then(|resolver| resolver.resolve(source, &from_dir));
        let Some(resolved) = resolved else {
            let message = diagnostics::format_message(
                diagnostics::message_template(diagnostic_codes::UNRESOLVED_MODULE),
                &[source],
            );
            let file = self.ctx.module(self.module).canonical_path.clone();
            self.ctx.report(Diagnostic::error(
                file,
                span,
                message,
                diagnostic_codes::UNRESOLVED_MODULE,
            ));
            return None;
        };

        if let Some(exports) = self.ctx.module_cache.get(&resolved.canonical_path) {
            return Some(exports.clone());
        }

        let canonical = resolved.canonical_path.clone();
        let directory = parent_directory(&canonical);
        let module_id =
            self.ctx
                .register_module(resolved.arena, canonical.clone(), directory);

        // Cycle guard: a module that transitively imports itself sees an
        // empty export map instead of recursing.
        self.ctx
            .module_cache
            .insert(canonical.clone(), IndexMap::new());

        let exports = self.with_module(module_id, |this| {
            let root = this.arena.root();
            let module_env = Env::new();
            let saved_exports = this.exports.take();
            this.exports = Some(IndexMap::new());

            if let Some(NodeKind::Program { body }) =
                this.arena.get(root).map(|n| n.kind.clone())
            {
                let _ = this.eval_stmts(&body, &module_env);
            }

            std::mem::replace(&mut this.exports, saved_exports).unwrap_or_default()
        });

        // Cache only after the module evaluated without poisoning state.
        self.ctx.module_cache.insert(canonical, exports.clone());
        Some(exports)
    }

    fn report_unresolved_import(&mut self, source: &str, name: &str, span: Span) {
        let message = diagnostics::format_message(
            diagnostics::message_template(diagnostic_codes::UNRESOLVED_IMPORT),
            &[source, name],
        );
        let file = self.ctx.module(self.module).canonical_path.clone();
        self.ctx.report(Diagnostic::error(
            file,
            span,
            message,
            diagnostic_codes::UNRESOLVED_IMPORT,
        ));
    }

    pub(crate) fn eval_export_named(
        &mut self,
        specifiers: &[(String, String)],
        decl: Option<NodeIndex>,
        env: &Env,
    ) -> EvalOutcome {
        if let Some(decl) = decl {
            let outcome = self.eval_stmt(decl, env);
            // Export the names the declaration introduced.
            let declared = self.declared_names(decl);
            if let Some(exports) = &mut self.exports {
                for name in declared {
                    let value = env.lookup(&name);
                    exports.insert(name, value);
                }
            }
            return outcome;
        }
        if self.exports.is_some() {
            for (local, exported) in specifiers {
                let value = env.lookup(local);
                if let Some(exports) = &mut self.exports {
                    exports.insert(exported.clone(), value);
                }
            }
        }
        EvalOutcome::Value(TypeValue::undefined())
    }

    pub(crate) fn eval_export_default(&mut self, expr: NodeIndex, env: &Env) -> EvalOutcome {
        let flow = self.eval_expr(expr, env);
        if flow.diverted() {
            return EvalOutcome::Throw {
                value: flow.thrown,
                span: Some(self.arena.span(expr)),
            };
        }
        if let Some(exports) = &mut self.exports {
            exports.insert("default".to_string(), flow.value.clone());
        }
        let span = self.arena.span(expr);
        self.flow_to_outcome(span, flow)
    }

    /// Names a declaration statement introduces, for `export <decl>`.
    fn declared_names(&self, decl: NodeIndex) -> Vec<String> {
        let Some(node) = self.arena.get(decl) else {
            return Vec::new();
        };
        match &node.kind {
            NodeKind::Function(data) => data.name.iter().cloned().collect(),
            NodeKind::Class(data) => data.name.iter().cloned().collect(),
            NodeKind::VarDecl { declarators, .. } => {
                let mut names = Vec::new();
                for &declarator in declarators {
                    if let Some(NodeKind::Declarator { pattern, .. }) =
                        self.arena.get(declarator).map(|n| &n.kind)
                        && let Some(NodeKind::Ident(name)) =
                            self.arena.get(*pattern).map(|n| &n.kind)
                    {
                        names.push(name.clone());
                    }
                }
                names
            }
            _ => Vec::new(),
        }
    }
}

fn parent_directory(path: &str) -> String {
    match path.rfind('/') {
        Some(at) => path[..at].to_string(),
        None => String::new(),
    }
}
