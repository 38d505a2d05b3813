//! Statement evaluation: sequences, conditionals, switch, loops,
//! try/catch/finally.
//!
//! Sequences thread one environment and fold diverted side paths into
//! the branch-sealed accumulator; conditionals fork identity-preserving
//! environment copies and merge them per the branch rules; loops unroll
//! while decidable and within the sample budget, then fall back to the
//! widening fixed-point.

use jsty_ast::{NodeIndex, NodeKind};
use jsty_common::Span;
use jsty_solver::deep_clone::{fork_env, merge_branches};
use jsty_solver::ops;
use jsty_solver::simplify::{union_of, union_with_cap, widen, widen_loop};
use jsty_solver::types::{Env, Truthiness, TypeValue};

use crate::evaluator::{EvalOutcome, Evaluator, ExprFlow};

/// Accumulated effects of already-sealed side paths.
#[derive(Clone, Debug, Default)]
struct SealedAcc {
    returned: Vec<TypeValue>,
    thrown: Vec<TypeValue>,
}

impl SealedAcc {
    fn absorb(&mut self, returned: TypeValue, thrown: TypeValue) {
        if !returned.is_never() {
            self.returned.push(returned);
        }
        if !thrown.is_never() {
            self.thrown.push(thrown);
        }
    }

    fn is_empty(&self) -> bool {
        self.returned.is_empty() && self.thrown.is_empty()
    }

    fn returned(&self) -> TypeValue {
        union_of(self.returned.clone())
    }

    fn thrown(&self) -> TypeValue {
        union_of(self.thrown.clone())
    }
}

impl Evaluator<'_> {
    // ------------------------------------------------------------------
    // Sequences
    // ------------------------------------------------------------------

    /// Evaluate a statement list, threading `env` and folding signals per
    /// the composition rules. Statements after a definite divert are
    /// recorded unreachable.
    pub fn eval_stmts(&mut self, stmts: &[NodeIndex], env: &Env) -> EvalOutcome {
        let mut sealed = SealedAcc::default();
        for (i, &stmt) in stmts.iter().enumerate() {
            let outcome = self.eval_stmt(stmt, env);
            match outcome {
                EvalOutcome::Value(_) => {}
                EvalOutcome::Sealed { returned, thrown } => sealed.absorb(returned, thrown),
                EvalOutcome::Return { value, thrown } => {
                    self.mark_rest_unreachable(&stmts[i + 1..]);
                    return EvalOutcome::Return {
                        value: TypeValue::union2(sealed.returned(), value),
                        thrown: TypeValue::union2(sealed.thrown(), thrown),
                    };
                }
                EvalOutcome::Throw { value, span } => {
                    self.mark_rest_unreachable(&stmts[i + 1..]);
                    let thrown = TypeValue::union2(sealed.thrown(), value);
                    if sealed.returned.is_empty() {
                        return EvalOutcome::Throw {
                            value: thrown,
                            span,
                        };
                    }
                    return EvalOutcome::Return {
                        value: sealed.returned(),
                        thrown,
                    };
                }
                EvalOutcome::Break { returned, thrown } => {
                    self.mark_rest_unreachable(&stmts[i + 1..]);
                    sealed.absorb(returned, thrown);
                    return EvalOutcome::Break {
                        returned: sealed.returned(),
                        thrown: sealed.thrown(),
                    };
                }
                EvalOutcome::Continue { returned, thrown } => {
                    self.mark_rest_unreachable(&stmts[i + 1..]);
                    sealed.absorb(returned, thrown);
                    return EvalOutcome::Continue {
                        returned: sealed.returned(),
                        thrown: sealed.thrown(),
                    };
                }
            }
        }
        if sealed.is_empty() {
            EvalOutcome::Value(TypeValue::undefined())
        } else {
            EvalOutcome::Sealed {
                returned: sealed.returned(),
                thrown: sealed.thrown(),
            }
        }
    }

    fn mark_rest_unreachable(&mut self, rest: &[NodeIndex]) {
        let mut span = Span::dummy();
        for &stmt in rest {
            span = span.merge(self.arena.span(stmt));
        }
        self.record_unreachable(span);
    }

    // ------------------------------------------------------------------
    // Statement dispatch
    // ------------------------------------------------------------------

    pub fn eval_stmt(&mut self, idx: NodeIndex, env: &Env) -> EvalOutcome {
        let Some(node) = self.arena.get(idx) else {
            self.report_malformed(Span::dummy(), "statement handle out of range");
            return EvalOutcome::Value(TypeValue::undefined());
        };
        let span = node.span;
        let kind = node.kind.clone();

        match kind {
            NodeKind::Program { body } | NodeKind::Block { body } => {
                let scope = env.child();
                self.eval_stmts(&body, &scope)
            }
            NodeKind::ExprStmt { expr } => {
                let expr_span = self.arena.span(expr);
                let flow = self.eval_expr(expr, env);
                self.flow_to_outcome(expr_span, flow)
            }
            NodeKind::VarDecl { declarators, .. } => self.eval_var_decl(&declarators, env),
            NodeKind::Function(data) => {
                let function = self.create_function(&data, env, idx);
                if let Some(name) = &data.name {
                    env.bind(name.clone(), function);
                }
                EvalOutcome::Value(TypeValue::undefined())
            }
            NodeKind::Class(data) => {
                let class = self.create_class(&data, env);
                if let Some(name) = &data.name {
                    env.bind(name.clone(), class);
                }
                EvalOutcome::Value(TypeValue::undefined())
            }
            NodeKind::Return { arg } => match arg {
                None => EvalOutcome::ret(TypeValue::undefined()),
                Some(arg) => {
                    let flow = self.eval_expr(arg, env);
                    if flow.diverted() {
                        return EvalOutcome::Throw {
                            value: flow.thrown,
                            span: Some(span),
                        };
                    }
                    EvalOutcome::Return {
                        value: flow.value,
                        thrown: flow.thrown,
                    }
                }
            },
            NodeKind::Throw { arg } => {
                let flow = self.eval_expr(arg, env);
                let value = if flow.diverted() {
                    flow.thrown
                } else {
                    TypeValue::union2(flow.value, flow.thrown)
                };
                EvalOutcome::Throw {
                    value,
                    span: Some(span),
                }
            }
            NodeKind::If {
                test,
                consequent,
                alternate,
            } => self.eval_if(test, consequent, alternate, env),
            NodeKind::Switch {
                discriminant,
                cases,
            } => self.eval_switch(discriminant, &cases, env),
            NodeKind::Try {
                block,
                handler,
                finalizer,
            } => self.eval_try(block, handler, finalizer, env),
            NodeKind::While { test, body } => {
                self.eval_loop(None, Some(test), None, body, false, env)
            }
            NodeKind::DoWhile { body, test } => {
                self.eval_loop(None, Some(test), None, body, true, env)
            }
            NodeKind::For {
                init,
                test,
                update,
                body,
            } => self.eval_loop(init, test, update, body, false, env),
            NodeKind::ForOf { left, right, body } => self.eval_for_of(left, right, body, env),
            NodeKind::ForIn { left, right, body } => self.eval_for_in(left, right, body, env),
            NodeKind::Break => EvalOutcome::Break {
                returned: TypeValue::Never,
                thrown: TypeValue::Never,
            },
            NodeKind::Continue => EvalOutcome::Continue {
                returned: TypeValue::Never,
                thrown: TypeValue::Never,
            },
            NodeKind::ImportDecl { specifiers, source } => {
                self.eval_import(&specifiers, &source, span, env)
            }
            NodeKind::ExportNamed { specifiers, decl } => {
                self.eval_export_named(&specifiers, decl, env)
            }
            NodeKind::ExportDefault { expr } => self.eval_export_default(expr, env),
            NodeKind::Declarator { .. } => {
                self.report_malformed(span, "declarator outside declaration");
                EvalOutcome::Value(TypeValue::undefined())
            }
            _ if kind.is_expression() => {
                // Bare expression in statement position
                let flow = self.eval_expr(idx, env);
                self.flow_to_outcome(span, flow)
            }
            _ => {
                self.report_malformed(span, "node kind is not a statement");
                EvalOutcome::Value(TypeValue::undefined())
            }
        }
    }

    /// Convert an expression flow into a statement signal.
    pub(crate) fn flow_to_outcome(&mut self, span: Span, flow: ExprFlow) -> EvalOutcome {
        if flow.diverted() {
            return EvalOutcome::Throw {
                value: flow.thrown,
                span: Some(span),
            };
        }
        if flow.thrown.is_never() {
            EvalOutcome::Value(flow.value)
        } else {
            EvalOutcome::Sealed {
                returned: TypeValue::Never,
                thrown: flow.thrown,
            }
        }
    }

    fn eval_var_decl(&mut self, declarators: &[NodeIndex], env: &Env) -> EvalOutcome {
        let mut thrown = Vec::new();
        for &decl in declarators {
            let Some(node) = self.arena.get(decl) else {
                self.report_malformed(Span::dummy(), "declarator handle out of range");
                continue;
            };
            let NodeKind::Declarator { pattern, init } = node.kind.clone() else {
                self.report_malformed(node.span, "expected declarator");
                continue;
            };
            let value = match init {
                Some(init) => match self.operand(init, env, &mut thrown) {
                    Some(value) => value,
                    None => {
                        return EvalOutcome::Throw {
                            value: union_of(thrown),
                            span: Some(self.arena.span(init)),
                        };
                    }
                },
                None => TypeValue::undefined(),
            };
            self.bind_pattern(pattern, value, env, true, &mut thrown);
        }
        let thrown = union_of(thrown);
        if thrown.is_never() {
            EvalOutcome::Value(TypeValue::undefined())
        } else {
            EvalOutcome::Sealed {
                returned: TypeValue::Never,
                thrown,
            }
        }
    }

    // ------------------------------------------------------------------
    // Conditionals
    // ------------------------------------------------------------------

    fn eval_if(
        &mut self,
        test: NodeIndex,
        consequent: NodeIndex,
        alternate: Option<NodeIndex>,
        env: &Env,
    ) -> EvalOutcome {
        let test_flow = self.eval_expr(test, env);
        if test_flow.diverted() {
            return EvalOutcome::Throw {
                value: test_flow.thrown,
                span: Some(self.arena.span(test)),
            };
        }
        let mut pre_thrown = test_flow.thrown;

        match test_flow.value.truthiness() {
            Truthiness::True => {
                if let Some(alternate) = alternate {
                    self.record_unreachable(self.arena.span(alternate));
                }
                let outcome = self.eval_stmt(consequent, env);
                prepend_thrown(outcome, &mut pre_thrown)
            }
            Truthiness::False => {
                self.record_unreachable(self.arena.span(consequent));
                let outcome = match alternate {
                    Some(alternate) => self.eval_stmt(alternate, env),
                    None => EvalOutcome::Value(TypeValue::undefined()),
                };
                prepend_thrown(outcome, &mut pre_thrown)
            }
            Truthiness::Unknown => {
                let (true_env, false_env) = self.narrow(test, env);

                let (left_env, left_clones) = fork_env(&true_env, &self.ctx.idgen);
                let left = self.eval_stmt(consequent, &left_env);

                let (right_env, right_clones) = fork_env(&false_env, &self.ctx.idgen);
                let right = match alternate {
                    Some(alternate) => self.eval_stmt(alternate, &right_env),
                    None => EvalOutcome::Value(TypeValue::undefined()),
                };

                let (left_ret, left_thr, left_continues) = left.parts();
                let (right_ret, right_thr, right_continues) = right.parts();

                match (left_continues, right_continues) {
                    (true, true) => merge_branches(
                        env,
                        &left_env,
                        &left_clones,
                        &right_env,
                        &right_clones,
                    ),
                    (true, false) => merge_branches(
                        env,
                        &left_env,
                        &left_clones,
                        &left_env,
                        &left_clones,
                    ),
                    (false, true) => merge_branches(
                        env,
                        &right_env,
                        &right_clones,
                        &right_env,
                        &right_clones,
                    ),
                    (false, false) => {}
                }

                let returned = TypeValue::union2(left_ret, right_ret);
                let thrown = union_of(vec![pre_thrown, left_thr, right_thr]);

                if left_continues || right_continues {
                    if returned.is_never() && thrown.is_never() {
                        EvalOutcome::Value(TypeValue::undefined())
                    } else {
                        EvalOutcome::Sealed { returned, thrown }
                    }
                } else if !returned.is_never() {
                    EvalOutcome::Return {
                        value: returned,
                        thrown,
                    }
                } else {
                    EvalOutcome::Throw {
                        value: thrown,
                        span: None,
                    }
                }
            }
        }
    }

    fn eval_switch(
        &mut self,
        discriminant: NodeIndex,
        cases: &[NodeIndex],
        env: &Env,
    ) -> EvalOutcome {
        let disc_flow = self.eval_expr(discriminant, env);
        if disc_flow.diverted() {
            return EvalOutcome::Throw {
                value: disc_flow.thrown,
                span: Some(self.arena.span(discriminant)),
            };
        }
        let mut pre_thrown = disc_flow.thrown;

        // Collect case data up front.
        let mut case_data: Vec<(Option<NodeIndex>, Vec<NodeIndex>)> = Vec::new();
        for &case in cases {
            match self.arena.get(case).map(|n| n.kind.clone()) {
                Some(NodeKind::SwitchCase { test, body }) => case_data.push((test, body)),
                _ => self.report_malformed(self.arena.span(case), "expected switch case"),
            }
        }

        if disc_flow.value.as_literal().is_some() {
            // Decide the entry point, then fall through honoring break.
            let mut entry: Option<usize> = None;
            let mut decidable = true;
            let mut thrown = Vec::new();
            for (i, (test, _)) in case_data.iter().enumerate() {
                let Some(test) = test else { continue };
                let Some(test_value) = self.operand(*test, env, &mut thrown) else {
                    return EvalOutcome::Throw {
                        value: union_of(thrown),
                        span: Some(self.arena.span(*test)),
                    };
                };
                match ops::binary(
                    jsty_ast::BinaryOp::EqStrict,
                    &disc_flow.value,
                    &test_value,
                ) {
                    TypeValue::Literal(jsty_solver::types::LiteralValue::Boolean(true)) => {
                        entry = Some(i);
                        break;
                    }
                    TypeValue::Literal(jsty_solver::types::LiteralValue::Boolean(false)) => {}
                    _ => {
                        decidable = false;
                        break;
                    }
                }
            }
            pre_thrown = TypeValue::union2(pre_thrown, union_of(thrown));
            if decidable {
                let entry = entry.or_else(|| {
                    case_data.iter().position(|(test, _)| test.is_none())
                });
                let Some(entry) = entry else {
                    // No match, no default
                    return if pre_thrown.is_never() {
                        EvalOutcome::Value(TypeValue::undefined())
                    } else {
                        EvalOutcome::Sealed {
                            returned: TypeValue::Never,
                            thrown: pre_thrown,
                        }
                    };
                };
                let scope = env.child();
                let mut sealed = SealedAcc::default();
                if !pre_thrown.is_never() {
                    sealed.absorb(TypeValue::Never, pre_thrown);
                }
                for (_, body) in case_data.iter().skip(entry) {
                    match self.eval_stmts(body, &scope) {
                        EvalOutcome::Value(_) => {}
                        EvalOutcome::Sealed { returned, thrown } => {
                            sealed.absorb(returned, thrown)
                        }
                        EvalOutcome::Break { returned, thrown } => {
                            sealed.absorb(returned, thrown);
                            break;
                        }
                        diverted => return prepend_sealed(diverted, &sealed),
                    }
                }
                return if sealed.is_empty() {
                    EvalOutcome::Value(TypeValue::undefined())
                } else {
                    EvalOutcome::Sealed {
                        returned: sealed.returned(),
                        thrown: sealed.thrown(),
                    }
                };
            }
        }

        // Abstract discriminant: every case contributes, each evaluated
        // in the current environment.
        let mut sealed = SealedAcc::default();
        if !pre_thrown.is_never() {
            sealed.absorb(TypeValue::Never, pre_thrown);
        }
        for (test, body) in &case_data {
            let mut thrown = Vec::new();
            if let Some(test) = test
                && self.operand(*test, env, &mut thrown).is_none()
            {
                sealed.absorb(TypeValue::Never, union_of(thrown));
                continue;
            }
            sealed.absorb(TypeValue::Never, union_of(thrown));
            let scope = env.child();
            match self.eval_stmts(body, &scope) {
                EvalOutcome::Value(_) => {}
                EvalOutcome::Sealed { returned, thrown }
                | EvalOutcome::Break { returned, thrown }
                | EvalOutcome::Continue { returned, thrown } => sealed.absorb(returned, thrown),
                EvalOutcome::Return { value, thrown } => sealed.absorb(value, thrown),
                EvalOutcome::Throw { value, .. } => sealed.absorb(TypeValue::Never, value),
            }
        }
        if sealed.is_empty() {
            EvalOutcome::Value(TypeValue::undefined())
        } else {
            EvalOutcome::Sealed {
                returned: sealed.returned(),
                thrown: sealed.thrown(),
            }
        }
    }

    // ------------------------------------------------------------------
    // try / catch / finally
    // ------------------------------------------------------------------

    fn eval_try(
        &mut self,
        block: NodeIndex,
        handler: Option<NodeIndex>,
        finalizer: Option<NodeIndex>,
        env: &Env,
    ) -> EvalOutcome {
        let try_outcome = self.eval_stmt(block, env);
        let (try_ret, try_thrown, try_continues) = try_outcome.parts();

        let mut returned = try_ret;
        let mut thrown = try_thrown.clone();
        let mut continues = try_continues;

        if !try_thrown.is_never()
            && let Some(handler) = handler
        {
            let Some(NodeKind::CatchClause { param, body }) =
                self.arena.get(handler).map(|n| n.kind.clone())
            else {
                self.report_malformed(self.arena.span(handler), "expected catch clause");
                return try_outcome;
            };
            // The caught value is exactly what the try block could throw;
            // catching absorbs it from the aggregate.
            let catch_env = env.child();
            let mut catch_thrown = Vec::new();
            if let Some(param) = param {
                self.bind_pattern(param, try_thrown, &catch_env, true, &mut catch_thrown);
            }
            let catch_outcome = self.eval_stmts(
                &match self.arena.get(body).map(|n| n.kind.clone()) {
                    Some(NodeKind::Block { body }) => body,
                    _ => Vec::new(),
                },
                &catch_env,
            );
            let (catch_ret, catch_thr, catch_continues) = catch_outcome.parts();
            returned = TypeValue::union2(returned, catch_ret);
            thrown = TypeValue::union2(union_of(catch_thrown), catch_thr);
            continues = continues || catch_continues;
        }

        if let Some(finalizer) = finalizer {
            let finally_outcome = self.eval_stmt(finalizer, env);
            match &finally_outcome {
                // A diverting finally overrides whatever was pending.
                EvalOutcome::Return { .. }
                | EvalOutcome::Throw { .. }
                | EvalOutcome::Break { .. }
                | EvalOutcome::Continue { .. } => return finally_outcome,
                EvalOutcome::Sealed {
                    returned: fin_ret,
                    thrown: fin_thr,
                } => {
                    returned = TypeValue::union2(returned, fin_ret.clone());
                    thrown = TypeValue::union2(thrown, fin_thr.clone());
                }
                EvalOutcome::Value(_) => {}
            }
        }

        if continues {
            if returned.is_never() && thrown.is_never() {
                EvalOutcome::Value(TypeValue::undefined())
            } else {
                EvalOutcome::Sealed { returned, thrown }
            }
        } else if !returned.is_never() {
            EvalOutcome::Return {
                value: returned,
                thrown,
            }
        } else {
            EvalOutcome::Throw {
                value: thrown,
                span: None,
            }
        }
    }

    // ------------------------------------------------------------------
    // Loops
    // ------------------------------------------------------------------

    /// Shared driver for `for`, `while`, and `do-while`.
    fn eval_loop(
        &mut self,
        init: Option<NodeIndex>,
        test: Option<NodeIndex>,
        update: Option<NodeIndex>,
        body: NodeIndex,
        body_first: bool,
        env: &Env,
    ) -> EvalOutcome {
        let loop_env = env.child();
        let mut sealed = SealedAcc::default();

        if let Some(init) = init {
            match self.eval_stmt(init, &loop_env) {
                EvalOutcome::Value(_) => {}
                EvalOutcome::Sealed { returned, thrown } => sealed.absorb(returned, thrown),
                diverted => return diverted,
            }
        }

        let budget = self.sample_budget();
        let mut iterations: u32 = 0;
        let mut entered = false;

        loop {
            if !(body_first && iterations == 0) {
                match test {
                    None => {}
                    Some(test) => {
                        let flow = self.eval_expr(test, &loop_env);
                        if flow.diverted() {
                            return EvalOutcome::Throw {
                                value: TypeValue::union2(sealed.thrown(), flow.thrown),
                                span: Some(self.arena.span(test)),
                            };
                        }
                        if !flow.thrown.is_never() {
                            sealed.absorb(TypeValue::Never, flow.thrown);
                        }
                        match flow.value.truthiness() {
                            Truthiness::False => {
                                if !entered {
                                    self.record_unreachable(self.arena.span(body));
                                }
                                break;
                            }
                            Truthiness::True => {}
                            Truthiness::Unknown => {
                                let fixed =
                                    self.loop_fixed_point(Some(test), body, update, &loop_env);
                                sealed.absorb(fixed.returned(), fixed.thrown());
                                break;
                            }
                        }
                    }
                }
            }

            if iterations >= budget {
                let fixed = self.loop_fixed_point(test, body, update, &loop_env);
                sealed.absorb(fixed.returned(), fixed.thrown());
                break;
            }

            entered = true;
            match self.eval_stmt(body, &loop_env) {
                EvalOutcome::Value(_) => {}
                EvalOutcome::Sealed { returned, thrown } => sealed.absorb(returned, thrown),
                EvalOutcome::Break { returned, thrown } => {
                    sealed.absorb(returned, thrown);
                    break;
                }
                EvalOutcome::Continue { returned, thrown } => {
                    sealed.absorb(returned, thrown);
                }
                diverted => return prepend_sealed(diverted, &sealed),
            }

            if let Some(update) = update {
                let flow = self.eval_expr(update, &loop_env);
                if flow.diverted() {
                    return EvalOutcome::Throw {
                        value: TypeValue::union2(sealed.thrown(), flow.thrown),
                        span: Some(self.arena.span(update)),
                    };
                }
                if !flow.thrown.is_never() {
                    sealed.absorb(TypeValue::Never, flow.thrown);
                }
            }

            iterations += 1;
            if test.is_none() && !body_first {
                // `for(;;)` without a test never decides: go abstract
                let fixed = self.loop_fixed_point(None, body, update, &loop_env);
                sealed.absorb(fixed.returned(), fixed.thrown());
                break;
            }
        }

        if sealed.is_empty() {
            EvalOutcome::Value(TypeValue::undefined())
        } else {
            EvalOutcome::Sealed {
                returned: sealed.returned(),
                thrown: sealed.thrown(),
            }
        }
    }

    /// Widening fixed-point: repeatedly evaluate the body joining every
    /// mutated binding with its previous type until nothing changes, then
    /// widen the changed bindings in the post-loop environment.
    fn loop_fixed_point(
        &mut self,
        test: Option<NodeIndex>,
        body: NodeIndex,
        update: Option<NodeIndex>,
        loop_env: &Env,
    ) -> SealedAcc {
        let cap = self.ctx.options.fixed_point_cap;
        let mut sealed = SealedAcc::default();
        let mut changed_names: Vec<String> = Vec::new();

        for round in 0..cap {
            let names = loop_env.names();
            let before: Vec<(String, TypeValue)> = names
                .iter()
                .map(|name| (name.clone(), loop_env.lookup(name)))
                .collect();

            if let Some(test) = test {
                let flow = self.eval_expr(test, loop_env);
                if !flow.thrown.is_never() {
                    sealed.absorb(TypeValue::Never, flow.thrown);
                }
            }
            match self.eval_stmt(body, loop_env) {
                EvalOutcome::Value(_) => {}
                EvalOutcome::Sealed { returned, thrown }
                | EvalOutcome::Break { returned, thrown }
                | EvalOutcome::Continue { returned, thrown } => {
                    sealed.absorb(returned, thrown)
                }
                // Abstract iterations may or may not run: divert signals
                // become sealed possibilities.
                EvalOutcome::Return { value, thrown } => sealed.absorb(value, thrown),
                EvalOutcome::Throw { value, .. } => sealed.absorb(TypeValue::Never, value),
            }
            if let Some(update) = update {
                let flow = self.eval_expr(update, loop_env);
                if !flow.thrown.is_never() {
                    sealed.absorb(TypeValue::Never, flow.thrown);
                }
            }

            let mut changed = false;
            let union_cap = self.ctx.options.union_cap;
            for (name, previous) in &before {
                let current = loop_env.lookup(name);
                let joined = union_with_cap(vec![previous.clone(), current], union_cap);
                if &joined != previous {
                    changed = true;
                    if !changed_names.contains(name) {
                        changed_names.push(name.clone());
                    }
                    loop_env.update(name, joined);
                }
            }
            if !changed {
                break;
            }
            if round + 1 == cap {
                tracing::debug!(cap, "loop fixed-point cap hit, widening to primitive bases");
                for name in &changed_names {
                    loop_env.update(name, widen_loop(loop_env.lookup(name)));
                }
            }
        }

        // Post-loop, mutated bindings settle at their widened join.
        for name in &changed_names {
            loop_env.update(name, widen(loop_env.lookup(name)));
        }
        sealed
    }

    fn eval_for_of(
        &mut self,
        left: NodeIndex,
        right: NodeIndex,
        body: NodeIndex,
        env: &Env,
    ) -> EvalOutcome {
        let flow = self.eval_expr(right, env);
        if flow.diverted() {
            return EvalOutcome::Throw {
                value: flow.thrown,
                span: Some(self.arena.span(right)),
            };
        }
        let mut sealed = SealedAcc::default();
        if !flow.thrown.is_never() {
            sealed.absorb(TypeValue::Never, flow.thrown);
        }

        match flow.value {
            TypeValue::Tuple(elems) => {
                for elem in elems {
                    let iter_env = env.child();
                    let mut thrown = Vec::new();
                    self.bind_iteration_target(left, elem, &iter_env, &mut thrown);
                    sealed.absorb(TypeValue::Never, union_of(thrown));
                    match self.eval_stmt(body, &iter_env) {
                        EvalOutcome::Value(_) => {}
                        EvalOutcome::Sealed { returned, thrown } => {
                            sealed.absorb(returned, thrown)
                        }
                        EvalOutcome::Break { returned, thrown } => {
                            sealed.absorb(returned, thrown);
                            break;
                        }
                        EvalOutcome::Continue { returned, thrown } => {
                            sealed.absorb(returned, thrown)
                        }
                        diverted => return prepend_sealed(diverted, &sealed),
                    }
                }
            }
            other => {
                let elem = match &other {
                    TypeValue::Array(elem) => (**elem).clone(),
                    TypeValue::Literal(jsty_solver::types::LiteralValue::String(_))
                    | TypeValue::Primitive(jsty_solver::types::PrimitiveKind::String) => {
                        TypeValue::string()
                    }
                    _ => TypeValue::Unknown,
                };
                self.abstract_iteration(left, elem, body, env, &mut sealed);
            }
        }

        if sealed.is_empty() {
            EvalOutcome::Value(TypeValue::undefined())
        } else {
            EvalOutcome::Sealed {
                returned: sealed.returned(),
                thrown: sealed.thrown(),
            }
        }
    }

    fn eval_for_in(
        &mut self,
        left: NodeIndex,
        right: NodeIndex,
        body: NodeIndex,
        env: &Env,
    ) -> EvalOutcome {
        let flow = self.eval_expr(right, env);
        if flow.diverted() {
            return EvalOutcome::Throw {
                value: flow.thrown,
                span: Some(self.arena.span(right)),
            };
        }
        let mut sealed = SealedAcc::default();
        if !flow.thrown.is_never() {
            sealed.absorb(TypeValue::Never, flow.thrown);
        }

        match flow.value.refined_base() {
            TypeValue::Object(obj) => {
                for key in obj.keys() {
                    let iter_env = env.child();
                    let mut thrown = Vec::new();
                    self.bind_iteration_target(
                        left,
                        TypeValue::string_lit(key),
                        &iter_env,
                        &mut thrown,
                    );
                    sealed.absorb(TypeValue::Never, union_of(thrown));
                    match self.eval_stmt(body, &iter_env) {
                        EvalOutcome::Value(_) => {}
                        EvalOutcome::Sealed { returned, thrown } => {
                            sealed.absorb(returned, thrown)
                        }
                        EvalOutcome::Break { returned, thrown } => {
                            sealed.absorb(returned, thrown);
                            break;
                        }
                        EvalOutcome::Continue { returned, thrown } => {
                            sealed.absorb(returned, thrown)
                        }
                        diverted => return prepend_sealed(diverted, &sealed),
                    }
                }
            }
            _ => {
                self.abstract_iteration(left, TypeValue::string(), body, env, &mut sealed);
            }
        }

        if sealed.is_empty() {
            EvalOutcome::Value(TypeValue::undefined())
        } else {
            EvalOutcome::Sealed {
                returned: sealed.returned(),
                thrown: sealed.thrown(),
            }
        }
    }

    /// One widened iteration for abstract iterables: bind, run the body
    /// once, join mutated bindings with their pre-loop types.
    fn abstract_iteration(
        &mut self,
        left: NodeIndex,
        elem: TypeValue,
        body: NodeIndex,
        env: &Env,
        sealed: &mut SealedAcc,
    ) {
        let names = env.names();
        let before: Vec<(String, TypeValue)> = names
            .iter()
            .map(|name| (name.clone(), env.lookup(name)))
            .collect();

        let iter_env = env.child();
        let mut thrown = Vec::new();
        self.bind_iteration_target(left, elem, &iter_env, &mut thrown);
        sealed.absorb(TypeValue::Never, union_of(thrown));
        match self.eval_stmt(body, &iter_env) {
            EvalOutcome::Value(_) => {}
            EvalOutcome::Sealed { returned, thrown }
            | EvalOutcome::Break { returned, thrown }
            | EvalOutcome::Continue { returned, thrown } => {
                sealed.absorb(returned, thrown)
            }
            EvalOutcome::Return { value, thrown } => sealed.absorb(value, thrown),
            EvalOutcome::Throw { value, .. } => sealed.absorb(TypeValue::Never, value),
        }

        for (name, previous) in &before {
            let current = env.lookup(name);
            let joined = TypeValue::union2(previous.clone(), current);
            if &joined != previous {
                env.update(name, widen(joined));
            }
        }
    }

    /// Bind the left side of `for-of`/`for-in`: a declaration or a bare
    /// pattern.
    fn bind_iteration_target(
        &mut self,
        left: NodeIndex,
        value: TypeValue,
        env: &Env,
        thrown: &mut Vec<TypeValue>,
    ) {
        match self.arena.get(left).map(|n| n.kind.clone()) {
            Some(NodeKind::VarDecl { declarators, .. }) => {
                if let Some(&decl) = declarators.first()
                    && let Some(NodeKind::Declarator { pattern, .. }) =
                        self.arena.get(decl).map(|n| n.kind.clone())
                {
                    self.bind_pattern(pattern, value, env, true, thrown);
                }
            }
            Some(_) => self.bind_pattern(left, value, env, false, thrown),
            None => self.report_malformed(Span::dummy(), "iteration target out of range"),
        }
    }

    /// The loop unroll budget: function-level `sample` directive wins,
    /// then analysis options.
    fn sample_budget(&self) -> u32 {
        self.sample_override
            .unwrap_or(self.ctx.options.sample_count)
    }
}

/// Fold pre-existing sealed effects into a diverting outcome.
fn prepend_sealed(outcome: EvalOutcome, sealed: &SealedAcc) -> EvalOutcome {
    if sealed.is_empty() {
        return outcome;
    }
    match outcome {
        EvalOutcome::Return { value, thrown } => EvalOutcome::Return {
            value: TypeValue::union2(sealed.returned(), value),
            thrown: TypeValue::union2(sealed.thrown(), thrown),
        },
        EvalOutcome::Throw { value, span } => {
            if sealed.returned.is_empty() {
                EvalOutcome::Throw {
                    value: TypeValue::union2(sealed.thrown(), value),
                    span,
                }
            } else {
                EvalOutcome::Return {
                    value: sealed.returned(),
                    thrown: TypeValue::union2(sealed.thrown(), value),
                }
            }
        }
        other => other,
    }
}

/// Merge a pre-branch throw effect into an outcome.
fn prepend_thrown(outcome: EvalOutcome, pre_thrown: &mut TypeValue) -> EvalOutcome {
    if pre_thrown.is_never() {
        return outcome;
    }
    let pre = std::mem::replace(pre_thrown, TypeValue::Never);
    match outcome {
        EvalOutcome::Value(_) => EvalOutcome::Sealed {
            returned: TypeValue::Never,
            thrown: pre,
        },
        EvalOutcome::Sealed { returned, thrown } => EvalOutcome::Sealed {
            returned,
            thrown: TypeValue::union2(pre, thrown),
        },
        EvalOutcome::Return { value, thrown } => EvalOutcome::Return {
            value,
            thrown: TypeValue::union2(pre, thrown),
        },
        EvalOutcome::Throw { value, span } => EvalOutcome::Throw {
            value: TypeValue::union2(pre, value),
            span,
        },
        EvalOutcome::Break { returned, thrown } => EvalOutcome::Break {
            returned,
            thrown: TypeValue::union2(pre, thrown),
        },
        EvalOutcome::Continue { returned, thrown } => EvalOutcome::Continue {
            returned,
            thrown: TypeValue::union2(pre, thrown),
        },
    }
}
