//! The abstract evaluator: expression dispatch and outcome signals.
//!
//! Every statement evaluates to one of the signals in [`EvalOutcome`];
//! expressions evaluate to an [`ExprFlow`], a value paired with the throw
//! effect accumulated while computing it (exactly the `{value, throws}`
//! shape function calls produce). Statement composition, control flow,
//! functions, and modules live in sibling modules as further `impl`
//! blocks on [`Evaluator`].

use std::rc::Rc;

use indexmap::IndexMap;

use jsty_ast::{AstArena, LogicalOp, NodeIndex, NodeKind, UpdateOp};
use jsty_common::limits::{MAX_EVAL_DEPTH, STACK_GROWTH, STACK_RED_ZONE};
use jsty_common::{Diagnostic, Span, diagnostic_codes, diagnostics};
use jsty_solver::guards;
use jsty_solver::ops::{self, OpResult};
use jsty_solver::ops_object;
use jsty_solver::refinements::template::{TemplatePart, TemplateString};
use jsty_solver::simplify::union_of;
use jsty_solver::types::{Env, ObjectRef, Truthiness, TypeValue};

use crate::collector::CollectKey;
use crate::context::AnalyserContext;
use crate::directives::DirectiveSet;

// =============================================================================
// Signals
// =============================================================================

/// Statement-level evaluation signal.
///
/// `Sealed` is the branch-sealed state: some path through an already
/// evaluated conditional diverted (returned or threw) while the current
/// path continues. `Break`/`Continue` are loop-local and consumed by the
/// enclosing loop or switch; they carry any sealed effects accumulated
/// before the jump.
#[derive(Clone, Debug)]
pub enum EvalOutcome {
    /// Evaluated with no control-flow effect.
    Value(TypeValue),
    /// Control definitely leaves the function. `thrown` carries throw
    /// effects possible on sibling paths that were sealed before this
    /// return.
    Return { value: TypeValue, thrown: TypeValue },
    /// Control definitely raises.
    Throw { value: TypeValue, span: Option<Span> },
    /// A side path diverted; this path continues.
    Sealed { returned: TypeValue, thrown: TypeValue },
    Break { returned: TypeValue, thrown: TypeValue },
    Continue { returned: TypeValue, thrown: TypeValue },
}

impl EvalOutcome {
    pub fn ret(value: TypeValue) -> EvalOutcome {
        EvalOutcome::Return {
            value,
            thrown: TypeValue::Never,
        }
    }

    /// Decompose into (returned, thrown, continues).
    pub fn parts(&self) -> (TypeValue, TypeValue, bool) {
        match self {
            EvalOutcome::Value(_) => (TypeValue::Never, TypeValue::Never, true),
            EvalOutcome::Return { value, thrown } => (value.clone(), thrown.clone(), false),
            EvalOutcome::Throw { value, .. } => (TypeValue::Never, value.clone(), false),
            EvalOutcome::Sealed { returned, thrown }
            | EvalOutcome::Break { returned, thrown }
            | EvalOutcome::Continue { returned, thrown } => {
                (returned.clone(), thrown.clone(), true)
            }
        }
    }

    pub fn continues(&self) -> bool {
        self.parts().2
    }
}

/// Expression-level result: the value plus the throw effect accumulated
/// while computing it. A definitely-throwing expression has value
/// `Never`.
#[derive(Clone, Debug)]
pub struct ExprFlow {
    pub value: TypeValue,
    pub thrown: TypeValue,
}

impl ExprFlow {
    pub fn of(value: TypeValue) -> ExprFlow {
        ExprFlow {
            value,
            thrown: TypeValue::Never,
        }
    }

    pub fn throws(thrown: TypeValue) -> ExprFlow {
        ExprFlow {
            value: TypeValue::Never,
            thrown,
        }
    }

    /// Whether evaluation cannot continue past this expression.
    pub fn diverted(&self) -> bool {
        self.value.is_never()
    }
}

impl From<OpResult> for ExprFlow {
    fn from(result: OpResult) -> ExprFlow {
        ExprFlow {
            value: result.value,
            thrown: result.throws,
        }
    }
}

// =============================================================================
// Evaluator
// =============================================================================

pub struct Evaluator<'a> {
    pub(crate) ctx: &'a mut AnalyserContext,
    pub(crate) directives: &'a DirectiveSet,
    pub(crate) arena: Rc<AstArena>,
    pub(crate) module: u32,
    /// The unit under analysis; only its positions feed the collector
    /// and only its statements carry directives.
    pub(crate) main_module: u32,
    pub(crate) depth: u32,
    pub(crate) call_depth: u32,
    /// Loop sampling override of the function currently being evaluated.
    pub(crate) sample_override: Option<u32>,
    pub(crate) collect_key: CollectKey,
    /// Set when an in-progress memo entry answered a recursive call; the
    /// caller iterates to a fixed point.
    pub(crate) placeholder_used: bool,
    /// Export accumulator, present while evaluating an imported module.
    pub(crate) exports: Option<IndexMap<String, TypeValue>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        ctx: &'a mut AnalyserContext,
        module: u32,
        directives: &'a DirectiveSet,
    ) -> Evaluator<'a> {
        let arena = ctx.module(module).arena.clone();
        Evaluator {
            ctx,
            directives,
            arena,
            module,
            main_module: module,
            depth: 0,
            call_depth: 0,
            sample_override: None,
            collect_key: CollectKey::TOP_LEVEL,
            placeholder_used: false,
            exports: None,
        }
    }

    /// Run `f` with the evaluator retargeted at another module's arena.
    pub(crate) fn with_module<R>(
        &mut self,
        module: u32,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved_module = self.module;
        let saved_arena = self.arena.clone();
        self.module = module;
        self.arena = self.ctx.module(module).arena.clone();
        let result = f(self);
        self.module = saved_module;
        self.arena = saved_arena;
        result
    }

    pub(crate) fn report_malformed(&mut self, span: Span, what: &str) {
        let message = diagnostics::format_message(
            diagnostics::message_template(diagnostic_codes::MALFORMED_AST),
            &[what],
        );
        let file = self.ctx.module(self.module).canonical_path.clone();
        self.ctx
            .report(Diagnostic::error(file, span, message, diagnostic_codes::MALFORMED_AST));
    }

    /// Record an observation for editor queries. Only the unit under
    /// analysis has meaningful positions.
    pub(crate) fn record(&mut self, span: Span, ty: &TypeValue) {
        if self.module == self.main_module {
            self.ctx.collector.record_type(self.collect_key, span, ty.clone());
        }
    }

    pub(crate) fn record_unreachable(&mut self, span: Span) {
        if self.module == self.main_module {
            self.ctx.collector.record_unreachable(span);
        }
    }

    // ------------------------------------------------------------------
    // Expression dispatch
    // ------------------------------------------------------------------

    /// Evaluate an expression node. Grows the stack rather than
    /// overflowing on deep trees, and yields `unknown` past the depth
    /// budget.
    pub fn eval_expr(&mut self, idx: NodeIndex, env: &Env) -> ExprFlow {
        if self.depth >= MAX_EVAL_DEPTH {
            return ExprFlow::of(TypeValue::Unknown);
        }
        self.depth += 1;
        let flow = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            self.eval_expr_inner(idx, env)
        });
        self.depth -= 1;

        let span = self.arena.span(idx);
        self.record(span, &flow.value);
        flow
    }

    /// Evaluate a subexpression, pushing its throw effect onto `thrown`.
    /// `None` means evaluation cannot continue (the caller returns the
    /// accumulated throws).
    pub(crate) fn operand(
        &mut self,
        idx: NodeIndex,
        env: &Env,
        thrown: &mut Vec<TypeValue>,
    ) -> Option<TypeValue> {
        let flow = self.eval_expr(idx, env);
        let diverted = flow.diverted();
        thrown.push(flow.thrown);
        if diverted { None } else { Some(flow.value) }
    }

    pub(crate) fn flow_from(thrown: Vec<TypeValue>, value: TypeValue) -> ExprFlow {
        ExprFlow {
            value,
            thrown: union_of(thrown),
        }
    }

    fn eval_expr_inner(&mut self, idx: NodeIndex, env: &Env) -> ExprFlow {
        let Some(node) = self.arena.get(idx) else {
            self.report_malformed(Span::dummy(), "expression handle out of range");
            return ExprFlow::of(TypeValue::Unknown);
        };
        let span = node.span;
        let kind = node.kind.clone();

        match kind {
            NodeKind::NumberLit(n) => ExprFlow::of(TypeValue::number_lit(n)),
            NodeKind::StringLit(s) => ExprFlow::of(TypeValue::string_lit(s)),
            NodeKind::BoolLit(b) => ExprFlow::of(TypeValue::bool_lit(b)),
            NodeKind::NullLit => ExprFlow::of(TypeValue::null()),
            NodeKind::BigIntLit(digits) => ExprFlow::of(TypeValue::Literal(
                jsty_solver::types::LiteralValue::BigInt(digits),
            )),

            NodeKind::Ident(name) => ExprFlow::of(self.lookup_ident(&name, env)),

            NodeKind::TemplateLit { quasis, exprs } => self.eval_template(&quasis, &exprs, env),
            NodeKind::ArrayLit { elements } => self.eval_array_literal(&elements, env),
            NodeKind::ObjectLit { props } => self.eval_object_literal(&props, env),

            NodeKind::Unary { op, arg } => {
                let mut thrown = Vec::new();
                let Some(value) = self.operand(arg, env, &mut thrown) else {
                    return ExprFlow::throws(union_of(thrown));
                };
                Self::flow_from(thrown, ops::unary(op, &value))
            }
            NodeKind::Update { op, prefix, arg } => self.eval_update(op, prefix, arg, env),
            NodeKind::Binary { op, left, right } => self.eval_binary(op, left, right, env),
            NodeKind::Logical { op, left, right } => self.eval_logical(op, left, right, env),
            NodeKind::Assign { op, target, value } => self.eval_assign(op, target, value, env),
            NodeKind::Conditional {
                test,
                consequent,
                alternate,
            } => self.eval_conditional(test, consequent, alternate, env),

            NodeKind::Call {
                callee,
                args,
                optional,
            } => self.eval_call(callee, &args, optional, env),
            NodeKind::New { callee, args } => self.eval_new(callee, &args, env),
            NodeKind::Member {
                object,
                property,
                computed,
                optional,
            } => self.eval_member_read(object, property, computed, optional, env),

            NodeKind::Sequence { exprs } => {
                let mut thrown = Vec::new();
                let mut last = TypeValue::undefined();
                for expr in exprs {
                    match self.operand(expr, env, &mut thrown) {
                        Some(value) => last = value,
                        None => return ExprFlow::throws(union_of(thrown)),
                    }
                }
                Self::flow_from(thrown, last)
            }

            NodeKind::Function(data) => ExprFlow::of(self.create_function(&data, env, idx)),
            NodeKind::Class(data) => ExprFlow::of(self.create_class(&data, env)),

            NodeKind::Await { arg } => {
                let mut thrown = Vec::new();
                let Some(value) = self.operand(arg, env, &mut thrown) else {
                    return ExprFlow::throws(union_of(thrown));
                };
                Self::flow_from(thrown, Self::unwrap_promise(value))
            }

            _ => {
                self.report_malformed(span, "node kind is not an expression");
                ExprFlow::of(TypeValue::Unknown)
            }
        }
    }

    /// Identifier lookup with the intrinsic constants that behave like
    /// literals when not shadowed.
    fn lookup_ident(&mut self, name: &str, env: &Env) -> TypeValue {
        if let Some(value) = env.try_lookup(name) {
            return value;
        }
        match name {
            "undefined" => TypeValue::undefined(),
            "NaN" => TypeValue::number_lit(f64::NAN),
            "Infinity" => TypeValue::number_lit(f64::INFINITY),
            _ => TypeValue::undefined(),
        }
    }

    fn unwrap_promise(value: TypeValue) -> TypeValue {
        match value {
            TypeValue::Promise(inner) => *inner,
            TypeValue::Union(members) => union_of(
                members
                    .iter()
                    .map(|m| Self::unwrap_promise(m.clone()))
                    .collect(),
            ),
            other => other,
        }
    }

    // ------------------------------------------------------------------
    // Literals with structure
    // ------------------------------------------------------------------

    fn eval_template(
        &mut self,
        quasis: &[String],
        exprs: &[NodeIndex],
        env: &Env,
    ) -> ExprFlow {
        let mut thrown = Vec::new();
        let mut parts = Vec::with_capacity(quasis.len() + exprs.len());
        for (i, quasi) in quasis.iter().enumerate() {
            parts.push(TemplatePart::Text(quasi.clone()));
            if let Some(&expr) = exprs.get(i) {
                match self.operand(expr, env, &mut thrown) {
                    Some(value) => parts.push(TemplatePart::Dynamic(value)),
                    None => return ExprFlow::throws(union_of(thrown)),
                }
            }
        }
        Self::flow_from(thrown, TemplateString::build(parts))
    }

    fn eval_array_literal(
        &mut self,
        elements: &[Option<NodeIndex>],
        env: &Env,
    ) -> ExprFlow {
        let mut thrown = Vec::new();
        let mut elems: Vec<TypeValue> = Vec::with_capacity(elements.len());
        let mut widened = false;
        for element in elements {
            let Some(element) = element else {
                // Holes read back as undefined
                elems.push(TypeValue::undefined());
                continue;
            };
            if let Some(NodeKind::Spread { arg }) = self.arena.get(*element).map(|n| &n.kind) {
                let arg = *arg;
                match self.operand(arg, env, &mut thrown) {
                    Some(TypeValue::Tuple(inner)) => elems.extend(inner),
                    Some(TypeValue::Array(inner)) => {
                        elems.push(*inner);
                        widened = true;
                    }
                    Some(other) => {
                        elems.push(other);
                        widened = true;
                    }
                    None => return ExprFlow::throws(union_of(thrown)),
                }
                continue;
            }
            match self.operand(*element, env, &mut thrown) {
                Some(value) => elems.push(value),
                None => return ExprFlow::throws(union_of(thrown)),
            }
        }
        let value = if widened {
            TypeValue::Array(Box::new(union_of(elems)))
        } else {
            TypeValue::Tuple(elems)
        };
        Self::flow_from(thrown, value)
    }

    fn eval_object_literal(&mut self, props: &[NodeIndex], env: &Env) -> ExprFlow {
        let mut thrown = Vec::new();
        let mut map: IndexMap<String, TypeValue> = IndexMap::new();
        for &prop in props {
            let Some(prop_node) = self.arena.get(prop) else {
                self.report_malformed(Span::dummy(), "object property handle out of range");
                continue;
            };
            match prop_node.kind.clone() {
                NodeKind::Property(data) => {
                    let key = match self.property_key(&data, env, &mut thrown) {
                        Ok(Some(key)) => key,
                        Ok(None) => continue, // abstract computed key
                        Err(()) => return ExprFlow::throws(union_of(thrown)),
                    };
                    match self.operand(data.value, env, &mut thrown) {
                        Some(value) => {
                            map.insert(key, value);
                        }
                        None => return ExprFlow::throws(union_of(thrown)),
                    }
                }
                NodeKind::Spread { arg } => {
                    match self.operand(arg, env, &mut thrown) {
                        Some(value) => spread_into(&mut map, &value),
                        None => return ExprFlow::throws(union_of(thrown)),
                    }
                }
                _ => self.report_malformed(prop_node.span, "expected property or spread"),
            }
        }
        let value = TypeValue::Object(ObjectRef::new(&self.ctx.idgen, map));
        Self::flow_from(thrown, value)
    }

    /// Resolve a property key to a fixed name when possible.
    /// `Ok(None)` means an abstract computed key (the property is
    /// dropped from the known shape).
    pub(crate) fn property_key(
        &mut self,
        data: &jsty_ast::PropertyData,
        env: &Env,
        thrown: &mut Vec<TypeValue>,
    ) -> Result<Option<String>, ()> {
        if data.computed {
            let Some(value) = self.operand(data.key, env, thrown) else {
                return Err(());
            };
            return Ok(match &value {
                TypeValue::Literal(lit) => Some(ops::to_js_string(lit)),
                _ => None,
            });
        }
        match self.arena.get(data.key).map(|n| &n.kind) {
            Some(NodeKind::Ident(name)) => Ok(Some(name.clone())),
            Some(NodeKind::StringLit(s)) => Ok(Some(s.clone())),
            Some(NodeKind::NumberLit(n)) => {
                Ok(Some(ops::to_js_string(&jsty_solver::types::LiteralValue::Number(*n))))
            }
            _ => {
                self.report_malformed(self.arena.span(data.key), "unsupported property key");
                Ok(None)
            }
        }
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    fn eval_binary(
        &mut self,
        op: jsty_ast::BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
        env: &Env,
    ) -> ExprFlow {
        use jsty_ast::BinaryOp;

        let mut thrown = Vec::new();
        let Some(lhs) = self.operand(left, env, &mut thrown) else {
            return ExprFlow::throws(union_of(thrown));
        };

        // `instanceof` resolves its right side as a class name when it
        // can; built-in Error identifiers work unbound.
        if op == BinaryOp::Instanceof
            && let Some(class_name) = self.class_name_of(right, env)
        {
            // Still evaluate for effects and recording
            let _ = self.operand(right, env, &mut thrown);
            return Self::flow_from(thrown, ops::instance_of(&lhs, &class_name));
        }

        let Some(rhs) = self.operand(right, env, &mut thrown) else {
            return ExprFlow::throws(union_of(thrown));
        };
        Self::flow_from(thrown, ops::binary(op, &lhs, &rhs))
    }

    /// The class name an expression denotes, for `instanceof` and `new`:
    /// a bound class binding's name, or a built-in Error identifier.
    pub(crate) fn class_name_of(&self, idx: NodeIndex, env: &Env) -> Option<String> {
        let NodeKind::Ident(name) = &self.arena.get(idx)?.kind else {
            return None;
        };
        match env.try_lookup(name) {
            Some(TypeValue::Class(class)) => Some(class.name.clone()),
            Some(_) => None,
            None if jsty_solver::subtype::is_builtin_error_class(name) => Some(name.clone()),
            None => None,
        }
    }

    fn eval_logical(
        &mut self,
        op: LogicalOp,
        left: NodeIndex,
        right: NodeIndex,
        env: &Env,
    ) -> ExprFlow {
        let mut thrown = Vec::new();
        let Some(lhs) = self.operand(left, env, &mut thrown) else {
            return ExprFlow::throws(union_of(thrown));
        };

        let decided = match op {
            LogicalOp::And => match lhs.truthiness() {
                Truthiness::False => Some(lhs.clone()),
                Truthiness::True => None,
                Truthiness::Unknown => None,
            },
            LogicalOp::Or => match lhs.truthiness() {
                Truthiness::True => Some(lhs.clone()),
                Truthiness::False => None,
                Truthiness::Unknown => None,
            },
            LogicalOp::Nullish => match lhs.nullishness() {
                Truthiness::False => Some(lhs.clone()),
                Truthiness::True => None,
                Truthiness::Unknown => None,
            },
        };
        if let Some(value) = decided {
            // Short-circuit: the right side never runs.
            self.record_unreachable(self.arena.span(right));
            return Self::flow_from(thrown, value);
        }

        let short_circuits = match op {
            LogicalOp::And => lhs.truthiness() == Truthiness::True,
            LogicalOp::Or => lhs.truthiness() == Truthiness::False,
            LogicalOp::Nullish => lhs.nullishness() == Truthiness::True,
        };
        let Some(rhs) = self.operand(right, env, &mut thrown) else {
            return ExprFlow::throws(union_of(thrown));
        };
        if short_circuits {
            // The left side is fully consumed; only the right flows out.
            return Self::flow_from(thrown, rhs);
        }

        // Undecided: the result keeps the short-circuit face of the left
        // side beside the right value.
        let idgen = &self.ctx.idgen;
        let kept = match op {
            LogicalOp::And => guards::falsy_part(&lhs, idgen),
            LogicalOp::Or => guards::truthy_part(&lhs, idgen),
            LogicalOp::Nullish => guards::non_nullish_part(&lhs),
        };
        Self::flow_from(thrown, TypeValue::union2(kept, rhs))
    }

    fn eval_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        arg: NodeIndex,
        env: &Env,
    ) -> ExprFlow {
        let mut thrown = Vec::new();
        let Some(old) = self.read_location(arg, env, &mut thrown) else {
            return ExprFlow::throws(union_of(thrown));
        };
        let old_number = match &old {
            TypeValue::Literal(lit) => TypeValue::number_lit(ops::to_js_number(lit)),
            _ => jsty_solver::simplify::widen(old.clone()),
        };
        let step = TypeValue::number_lit(1.0);
        let new = match op {
            UpdateOp::Inc => ops::binary(jsty_ast::BinaryOp::Add, &old_number, &step),
            UpdateOp::Dec => ops::binary(jsty_ast::BinaryOp::Sub, &old_number, &step),
        };
        self.write_location(arg, new.clone(), env, &mut thrown);
        let value = if prefix { new } else { old_number };
        Self::flow_from(thrown, value)
    }

    fn eval_assign(
        &mut self,
        op: jsty_ast::AssignOp,
        target: NodeIndex,
        value: NodeIndex,
        env: &Env,
    ) -> ExprFlow {
        let mut thrown = Vec::new();

        // Destructuring assignment targets route through the pattern
        // binder in update mode.
        if let Some(node) = self.arena.get(target)
            && matches!(
                node.kind,
                NodeKind::ObjectPattern { .. } | NodeKind::ArrayPattern { .. }
            )
            && op == jsty_ast::AssignOp::Assign
        {
            let Some(rhs) = self.operand(value, env, &mut thrown) else {
                return ExprFlow::throws(union_of(thrown));
            };
            self.bind_pattern(target, rhs.clone(), env, false, &mut thrown);
            return Self::flow_from(thrown, rhs);
        }

        let rhs = match op.binary_op() {
            None => {
                let Some(rhs) = self.operand(value, env, &mut thrown) else {
                    return ExprFlow::throws(union_of(thrown));
                };
                rhs
            }
            Some(binary) => {
                let Some(old) = self.read_location(target, env, &mut thrown) else {
                    return ExprFlow::throws(union_of(thrown));
                };
                let Some(operand) = self.operand(value, env, &mut thrown) else {
                    return ExprFlow::throws(union_of(thrown));
                };
                ops::binary(binary, &old, &operand)
            }
        };
        self.write_location(target, rhs.clone(), env, &mut thrown);
        Self::flow_from(thrown, rhs)
    }

    fn eval_conditional(
        &mut self,
        test: NodeIndex,
        consequent: NodeIndex,
        alternate: NodeIndex,
        env: &Env,
    ) -> ExprFlow {
        let mut thrown = Vec::new();
        let Some(test_value) = self.operand(test, env, &mut thrown) else {
            return ExprFlow::throws(union_of(thrown));
        };
        match test_value.truthiness() {
            Truthiness::True => {
                self.record_unreachable(self.arena.span(alternate));
                match self.operand(consequent, env, &mut thrown) {
                    Some(value) => Self::flow_from(thrown, value),
                    None => ExprFlow::throws(union_of(thrown)),
                }
            }
            Truthiness::False => {
                self.record_unreachable(self.arena.span(consequent));
                match self.operand(alternate, env, &mut thrown) {
                    Some(value) => Self::flow_from(thrown, value),
                    None => ExprFlow::throws(union_of(thrown)),
                }
            }
            Truthiness::Unknown => {
                let (true_env, false_env) = self.narrow(test, env);
                let (left_env, left_clones) =
                    jsty_solver::deep_clone::fork_env(&true_env, &self.ctx.idgen);
                let left = self.eval_expr(consequent, &left_env);
                let (right_env, right_clones) =
                    jsty_solver::deep_clone::fork_env(&false_env, &self.ctx.idgen);
                let right = self.eval_expr(alternate, &right_env);
                jsty_solver::deep_clone::merge_branches(
                    env,
                    &left_env,
                    &left_clones,
                    &right_env,
                    &right_clones,
                );
                thrown.push(left.thrown);
                thrown.push(right.thrown);
                let mut values = Vec::new();
                if !left.value.is_never() {
                    values.push(left.value);
                }
                if !right.value.is_never() {
                    values.push(right.value);
                }
                if values.is_empty() {
                    ExprFlow::throws(union_of(thrown))
                } else {
                    Self::flow_from(thrown, union_of(values))
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Assignable locations
    // ------------------------------------------------------------------

    /// Read an identifier or member location.
    pub(crate) fn read_location(
        &mut self,
        idx: NodeIndex,
        env: &Env,
        thrown: &mut Vec<TypeValue>,
    ) -> Option<TypeValue> {
        self.operand(idx, env, thrown)
    }

    /// Write to an identifier or member location; unsupported targets
    /// are reported and dropped.
    pub(crate) fn write_location(
        &mut self,
        idx: NodeIndex,
        value: TypeValue,
        env: &Env,
        thrown: &mut Vec<TypeValue>,
    ) {
        let Some(node) = self.arena.get(idx) else {
            return;
        };
        match node.kind.clone() {
            NodeKind::Ident(name) => {
                if !env.update(&name, value.clone()) {
                    env.bind(name, value);
                }
            }
            NodeKind::Member {
                object,
                property,
                computed,
                ..
            } => {
                let Some(receiver) = self.operand(object, env, thrown) else {
                    return;
                };
                let key = match self.member_key(property, computed, env, thrown) {
                    Some(key) => key,
                    None => return,
                };
                if ops_object::member_write(&receiver, &key, value.clone()) {
                    return;
                }
                // Tuples and arrays are value types: rebuild and store
                // back through the receiver location.
                if let Some(updated) = write_indexed(&receiver, &key, value) {
                    self.write_location(object, updated, env, thrown);
                }
            }
            _ => {
                let span = node.span;
                self.report_malformed(span, "unsupported assignment target");
            }
        }
    }

    /// Evaluate a member key to a type value: a string literal for fixed
    /// names, whatever the index expression yields when computed.
    pub(crate) fn member_key(
        &mut self,
        property: NodeIndex,
        computed: bool,
        env: &Env,
        thrown: &mut Vec<TypeValue>,
    ) -> Option<TypeValue> {
        if computed {
            return self.operand(property, env, thrown);
        }
        match self.arena.get(property).map(|n| &n.kind) {
            Some(NodeKind::Ident(name)) => Some(TypeValue::string_lit(name.clone())),
            Some(NodeKind::StringLit(s)) => Some(TypeValue::string_lit(s.clone())),
            _ => {
                self.report_malformed(self.arena.span(property), "unsupported member name");
                None
            }
        }
    }

    fn eval_member_read(
        &mut self,
        object: NodeIndex,
        property: NodeIndex,
        computed: bool,
        optional: bool,
        env: &Env,
    ) -> ExprFlow {
        let mut thrown = Vec::new();
        let Some(receiver) = self.operand(object, env, &mut thrown) else {
            return ExprFlow::throws(union_of(thrown));
        };
        let Some(key) = self.member_key(property, computed, env, &mut thrown) else {
            return Self::flow_from(thrown, TypeValue::Unknown);
        };
        let access = ops_object::member_access(&receiver, &key, &self.ctx.idgen, optional);
        thrown.push(access.throws);
        if access.value.is_never() {
            ExprFlow::throws(union_of(thrown))
        } else {
            Self::flow_from(thrown, access.value)
        }
    }
}

/// Spread a value's properties into an object literal under construction.
fn spread_into(map: &mut IndexMap<String, TypeValue>, value: &TypeValue) {
    match value.refined_base() {
        TypeValue::Object(obj) => {
            for (key, prop) in obj.0.borrow().props.iter() {
                map.insert(key.clone(), prop.clone());
            }
        }
        TypeValue::Instance(instance) => {
            for (key, prop) in instance.data.0.borrow().props.iter() {
                map.insert(key.clone(), prop.clone());
            }
        }
        // Nullish and primitive spreads contribute nothing; abstract
        // spreads contribute nothing knowable.
        _ => {}
    }
}

/// Rebuild a tuple or array with one element replaced, for value-type
/// member writes.
fn write_indexed(receiver: &TypeValue, key: &TypeValue, value: TypeValue) -> Option<TypeValue> {
    match receiver {
        TypeValue::Tuple(elems) => {
            let i = key.as_number_lit()?;
            if i.fract() != 0.0 || i < 0.0 {
                return None;
            }
            let i = i as usize;
            let mut updated = elems.clone();
            if i < updated.len() {
                updated[i] = value;
            } else {
                // Writing past the end extends, holes read undefined
                while updated.len() < i {
                    updated.push(TypeValue::undefined());
                }
                updated.push(value);
            }
            Some(TypeValue::Tuple(updated))
        }
        TypeValue::Array(elem) => Some(TypeValue::Array(Box::new(TypeValue::union2(
            (**elem).clone(),
            value,
        )))),
        _ => None,
    }
}
