//! Functions, calls, classes, and construction.
//!
//! Calls produce `{value, throws}` pairs. Pure functions memoise on
//! `(function identity, canonical argument rendering)`; a recursive call
//! that meets its own in-progress entry answers `unknown` and the outer
//! call iterates until the cached result stops changing. Async functions
//! wrap their value in `Promise` after all other processing.

use std::rc::Rc;

use indexmap::IndexMap;

use jsty_ast::{ClassData, FunctionData, MethodKind, NodeIndex, NodeKind};
use jsty_common::limits::{FIXED_POINT_MAX_ITERATIONS, MAX_CALL_DEPTH};
use jsty_solver::ops::OpResult;
use jsty_solver::ops_array;
use jsty_solver::ops_object::{self, error_instance, member_access};
use jsty_solver::ops_string;
use jsty_solver::refine::Dispatch;
use jsty_solver::simplify::{union_of, widen};
use jsty_solver::subtype::is_builtin_error_class;
use jsty_solver::types::{
    ClassValue, Env, FunctionId, FunctionValue, InstanceValue, ObjectRef, Truthiness, TypeValue,
};

use crate::context::MemoEntry;
use crate::evaluator::{EvalOutcome, Evaluator, ExprFlow};

/// Evaluated call arguments: the exactly-known prefix, plus the element
/// type of an array spread when one made the tail abstract.
#[derive(Clone, Debug, Default)]
pub struct CallArgs {
    pub fixed: Vec<TypeValue>,
    pub rest_elem: Option<TypeValue>,
}

impl CallArgs {
    pub fn fixed(fixed: Vec<TypeValue>) -> CallArgs {
        CallArgs {
            fixed,
            rest_elem: None,
        }
    }
}

impl Evaluator<'_> {
    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Build a function value capturing the current environment. The
    /// node doubles as the directive anchor for top-level declarations.
    pub(crate) fn create_function(
        &mut self,
        data: &FunctionData,
        env: &Env,
        node: NodeIndex,
    ) -> TypeValue {
        let top_level = self.module == self.main_module;
        let skip = if top_level {
            self.directives.skip(node)
        } else {
            None
        };
        TypeValue::Function(Rc::new(FunctionValue {
            name: data.name.clone(),
            params: data.params.clone(),
            body: data.body,
            closure: env.clone(),
            id: FunctionId {
                module: self.module,
                body: data.body,
            },
            is_async: data.is_async,
            expression_body: data.expression_body,
            is_pure: top_level && self.directives.is_pure(node),
            sample_count: if top_level {
                self.directives.sample_count(node)
            } else {
                None
            },
            skipped: skip.is_some(),
            skip_returns: skip.flatten(),
        }))
    }

    pub(crate) fn create_class(&mut self, data: &ClassData, env: &Env) -> TypeValue {
        let superclass = data.superclass.and_then(|expr| {
            let flow = self.eval_expr(expr, env);
            match flow.value {
                TypeValue::Class(class) => Some(class),
                _ => None,
            }
        });

        let mut constructor = None;
        let mut methods: IndexMap<String, TypeValue> = IndexMap::new();
        for method in &data.methods {
            let Some(NodeKind::Function(function_data)) =
                self.arena.get(method.value).map(|n| n.kind.clone())
            else {
                self.report_malformed(self.arena.span(method.value), "expected method function");
                continue;
            };
            let function = self.create_function(&function_data, env, method.value);
            match method.kind {
                MethodKind::Constructor => {
                    if let TypeValue::Function(f) = function {
                        constructor = Some(f);
                    }
                }
                MethodKind::Method => {
                    methods.insert(method.key.clone(), function);
                }
            }
        }

        TypeValue::Class(Rc::new(ClassValue {
            name: data
                .name
                .clone()
                .unwrap_or_else(|| "<anonymous>".to_string()),
            constructor,
            methods,
            superclass,
        }))
    }

    // ------------------------------------------------------------------
    // Call expressions
    // ------------------------------------------------------------------

    pub(crate) fn eval_call(
        &mut self,
        callee: NodeIndex,
        args: &[NodeIndex],
        optional: bool,
        env: &Env,
    ) -> ExprFlow {
        let mut thrown = Vec::new();

        // Intrinsic statics recognised by shape: Object.keys/values/
        // entries and Array.isArray on the unshadowed globals.
        if let Some(flow) = self.try_intrinsic_static(callee, args, env, &mut thrown) {
            return flow;
        }

        // Method-call form: receiver's built-in tables come first.
        if let Some(NodeKind::Member {
            object,
            property,
            computed,
            optional: member_optional,
        }) = self.arena.get(callee).map(|n| n.kind.clone())
        {
            let Some(receiver) = self.operand(object, env, &mut thrown) else {
                return ExprFlow::throws(union_of(thrown));
            };
            if (optional || member_optional) && receiver.nullishness() == Truthiness::True {
                return Self::flow_from(thrown, TypeValue::undefined());
            }
            let Some(key) = self.member_key(property, computed, env, &mut thrown) else {
                return Self::flow_from(thrown, TypeValue::Unknown);
            };
            if let Some(name) = key.as_string_lit().map(str::to_string) {
                let Some(call_args) = self.eval_call_args(args, env, &mut thrown) else {
                    return ExprFlow::throws(union_of(thrown));
                };
                let receiver = if optional || member_optional {
                    jsty_solver::guards::non_nullish_part(&receiver)
                } else {
                    receiver
                };
                let (result, updated) =
                    self.dispatch_method_on(&receiver, &name, &call_args, env);
                thrown.push(result.throws);
                if let Some(updated) = updated {
                    self.write_location(object, updated, env, &mut thrown);
                }
                if result.value.is_never() {
                    return ExprFlow::throws(union_of(thrown));
                }
                return Self::flow_from(thrown, result.value);
            }
            // Computed abstract method name: read then call.
            let access = member_access(&receiver, &key, &self.ctx.idgen, optional);
            thrown.push(access.throws);
            let Some(call_args) = self.eval_call_args(args, env, &mut thrown) else {
                return ExprFlow::throws(union_of(thrown));
            };
            let result = self.call_value(&access.value, &call_args, Some(receiver));
            thrown.push(result.throws);
            return Self::flow_from(thrown, result.value);
        }

        let Some(callee_value) = self.operand(callee, env, &mut thrown) else {
            return ExprFlow::throws(union_of(thrown));
        };
        if optional && callee_value.nullishness() == Truthiness::True {
            return Self::flow_from(thrown, TypeValue::undefined());
        }
        let Some(call_args) = self.eval_call_args(args, env, &mut thrown) else {
            return ExprFlow::throws(union_of(thrown));
        };
        let result = self.call_value(&callee_value, &call_args, None);
        thrown.push(result.throws);
        if result.value.is_never() {
            return ExprFlow::throws(union_of(thrown));
        }
        Self::flow_from(thrown, result.value)
    }

    /// `Object.keys(x)` and friends, `Array.isArray(x)`: recognised
    /// only when the global identifier is not shadowed.
    fn try_intrinsic_static(
        &mut self,
        callee: NodeIndex,
        args: &[NodeIndex],
        env: &Env,
        thrown: &mut Vec<TypeValue>,
    ) -> Option<ExprFlow> {
        let NodeKind::Member {
            object,
            property,
            computed: false,
            ..
        } = self.arena.get(callee)?.kind.clone()
        else {
            return None;
        };
        let NodeKind::Ident(global) = self.arena.get(object)?.kind.clone() else {
            return None;
        };
        if env.is_bound(&global) {
            return None;
        }
        let NodeKind::Ident(method) = self.arena.get(property)?.kind.clone() else {
            return None;
        };

        match (global.as_str(), method.as_str()) {
            ("Object", "keys" | "values" | "entries") => {
                let method = method.clone();
                let arg = args.first().copied();
                let value = match arg {
                    Some(arg) => match self.operand(arg, env, thrown) {
                        Some(value) => value,
                        None => return Some(ExprFlow::throws(union_of(thrown.clone()))),
                    },
                    None => TypeValue::undefined(),
                };
                let result = ops_object::object_static(&method, &value)
                    .unwrap_or(TypeValue::Unknown);
                Some(Self::flow_from(thrown.clone(), result))
            }
            ("Array", "isArray") => {
                let arg = args.first().copied();
                let value = match arg {
                    Some(arg) => match self.operand(arg, env, thrown) {
                        Some(value) => value,
                        None => return Some(ExprFlow::throws(union_of(thrown.clone()))),
                    },
                    None => TypeValue::undefined(),
                };
                Some(Self::flow_from(thrown.clone(), is_array_answer(&value)))
            }
            _ => None,
        }
    }

    /// Evaluate call arguments, flattening tuple spreads exactly and
    /// degrading to an abstract tail on array spreads.
    pub(crate) fn eval_call_args(
        &mut self,
        args: &[NodeIndex],
        env: &Env,
        thrown: &mut Vec<TypeValue>,
    ) -> Option<CallArgs> {
        let mut call_args = CallArgs::default();
        for &arg in args {
            if let Some(NodeKind::Spread { arg: spread }) =
                self.arena.get(arg).map(|n| n.kind.clone())
            {
                let value = self.operand(spread, env, thrown)?;
                match value {
                    TypeValue::Tuple(elems) => call_args.fixed.extend(elems),
                    TypeValue::Array(elem) => {
                        let merged = match call_args.rest_elem.take() {
                            Some(existing) => TypeValue::union2(existing, *elem),
                            None => *elem,
                        };
                        call_args.rest_elem = Some(merged);
                    }
                    other => {
                        let merged = match call_args.rest_elem.take() {
                            Some(existing) => TypeValue::union2(existing, other),
                            None => other,
                        };
                        call_args.rest_elem = Some(merged);
                    }
                }
                continue;
            }
            let value = self.operand(arg, env, thrown)?;
            if call_args.rest_elem.is_none() {
                call_args.fixed.push(value);
            } else {
                // Positions after an abstract spread stay abstract.
                let merged = TypeValue::union2(
                    call_args.rest_elem.take().unwrap_or(TypeValue::Never),
                    value,
                );
                call_args.rest_elem = Some(merged);
            }
        }
        Some(call_args)
    }

    // ------------------------------------------------------------------
    // Method dispatch
    // ------------------------------------------------------------------

    fn dispatch_method_on(
        &mut self,
        receiver: &TypeValue,
        name: &str,
        args: &CallArgs,
        env: &Env,
    ) -> (OpResult, Option<TypeValue>) {
        if let TypeValue::Union(members) = receiver {
            let members: Vec<TypeValue> = members.iter().cloned().collect();
            let mut values = Vec::new();
            let mut throws = Vec::new();
            for member in &members {
                let (result, _) = self.dispatch_method_on(member, name, args, env);
                values.push(result.value);
                throws.push(result.throws);
            }
            return (
                OpResult {
                    value: union_of(values),
                    throws: union_of(throws),
                },
                None,
            );
        }

        // Refinement method hooks take precedence over the base tables.
        if let TypeValue::Refined(refined) = receiver {
            match refined.refinement.method(refined, name, &args.fixed) {
                Dispatch::Applied(value) => return (OpResult::value(value), None),
                Dispatch::NotApplicable => {
                    return self.dispatch_method_on(&refined.base.clone(), name, args, env);
                }
            }
        }

        match receiver {
            TypeValue::Literal(jsty_solver::types::LiteralValue::String(_))
            | TypeValue::Primitive(jsty_solver::types::PrimitiveKind::String) => {
                match ops_string::string_method(receiver, name, &args.fixed) {
                    Some(value) => (OpResult::value(value), None),
                    None => (self.not_a_function(name), None),
                }
            }
            TypeValue::Tuple(_) | TypeValue::Array(_) => {
                let receiver = receiver.clone();
                let args_fixed = args.fixed.clone();
                // The invoke callback re-enters the evaluator per element.
                let mut invoke = |callee: &TypeValue, cb_args: &[TypeValue]| -> OpResult {
                    self.call_value(callee, &CallArgs::fixed(cb_args.to_vec()), None)
                };
                match ops_array::array_method(&receiver, name, &args_fixed, &mut invoke) {
                    Some(outcome) => (
                        OpResult {
                            value: outcome.value,
                            throws: outcome.throws,
                        },
                        outcome.updated_receiver,
                    ),
                    None => (self.not_a_function(name), None),
                }
            }
            TypeValue::Object(_) | TypeValue::Instance(_) => {
                let access = member_access(
                    receiver,
                    &TypeValue::string_lit(name),
                    &self.ctx.idgen,
                    false,
                );
                match &access.value {
                    TypeValue::Function(_) => {
                        let result =
                            self.call_value(&access.value, args, Some(receiver.clone()));
                        (result, None)
                    }
                    TypeValue::Unknown => (OpResult::value(TypeValue::Unknown), None),
                    _ => (self.not_a_function(name), None),
                }
            }
            TypeValue::Literal(lit) if lit.is_nullish() => {
                let receiver_name = if matches!(lit, jsty_solver::types::LiteralValue::Null) {
                    "null"
                } else {
                    "undefined"
                };
                (
                    OpResult::throws(error_instance(
                        &self.ctx.idgen,
                        "TypeError",
                        TypeValue::string_lit(format!(
                            "Cannot read properties of {receiver_name} (reading '{name}')"
                        )),
                    )),
                    None,
                )
            }
            TypeValue::Unknown => (OpResult::value(TypeValue::Unknown), None),
            _ => (self.not_a_function(name), None),
        }
    }

    fn not_a_function(&mut self, name: &str) -> OpResult {
        OpResult::throws(error_instance(
            &self.ctx.idgen,
            "TypeError",
            TypeValue::string_lit(format!("{name} is not a function")),
        ))
    }

    // ------------------------------------------------------------------
    // Invocation
    // ------------------------------------------------------------------

    /// Call any callee type value.
    pub(crate) fn call_value(
        &mut self,
        callee: &TypeValue,
        args: &CallArgs,
        this: Option<TypeValue>,
    ) -> OpResult {
        match callee {
            TypeValue::Function(func) => self.call_function_value(&func.clone(), args, this),
            TypeValue::Union(members) => {
                let members: Vec<TypeValue> = members.iter().cloned().collect();
                let mut values = Vec::new();
                let mut throws = Vec::new();
                for member in &members {
                    let result = self.call_value(member, args, this.clone());
                    if !result.value.is_never() {
                        values.push(result.value);
                    }
                    throws.push(result.throws);
                }
                OpResult {
                    value: union_of(values),
                    throws: union_of(throws),
                }
            }
            TypeValue::Unknown => OpResult::value(TypeValue::Unknown),
            TypeValue::Class(class) => {
                // Calling a class without `new` throws.
                let name = class.name.clone();
                OpResult::throws(error_instance(
                    &self.ctx.idgen,
                    "TypeError",
                    TypeValue::string_lit(format!(
                        "Class constructor {name} cannot be invoked without 'new'"
                    )),
                ))
            }
            other => OpResult::throws(error_instance(
                &self.ctx.idgen,
                "TypeError",
                TypeValue::string_lit(format!("{other} is not a function")),
            )),
        }
    }

    /// Call a function value: skip handling, memoisation, parameter
    /// binding, body evaluation, async wrapping.
    pub(crate) fn call_function_value(
        &mut self,
        func: &Rc<FunctionValue>,
        args: &CallArgs,
        this: Option<TypeValue>,
    ) -> OpResult {
        if func.skipped {
            let value = func
                .skip_returns
                .clone()
                .unwrap_or(TypeValue::Unknown);
            return OpResult::value(wrap_async(func, value));
        }
        if self.call_depth >= MAX_CALL_DEPTH {
            tracing::debug!(depth = self.call_depth, "call depth limit, yielding unknown");
            return OpResult::value(TypeValue::Unknown);
        }

        if !func.is_pure {
            let mut result = self.invoke_body(func, args, this);
            result.value = wrap_async(func, result.value);
            return result;
        }

        let key = (func.id, render_args(args));
        match self.ctx.memo.get(&key) {
            Some(MemoEntry::Done(result)) => return result.clone(),
            Some(MemoEntry::InProgress) => {
                // Recursion placeholder: the outer activation iterates.
                self.placeholder_used = true;
                return OpResult::value(TypeValue::Unknown);
            }
            None => {}
        }
        self.ctx.memo.insert(key.clone(), MemoEntry::InProgress);

        // The first evaluation decides whether this call is
        // self-recursive at all: only a body that consulted its own
        // in-progress placeholder needs the fixed-point iteration.
        let saved_flag = self.placeholder_used;
        self.placeholder_used = false;
        let mut result = self.invoke_body(func, args, this.clone());
        result.value = wrap_async(func, result.value);
        let recursive = self.placeholder_used;
        self.placeholder_used = saved_flag || recursive;
        self.ctx.memo.insert(key.clone(), MemoEntry::Done(result.clone()));

        if recursive {
            // Re-evaluate against the improving cached approximation
            // (the recursive self now reads the previous round's `Done`
            // entry) until the result stops changing. Convergence is a
            // property of the value, not of which memo branch the
            // recursion happened to hit.
            let mut settled = false;
            for _round in 1..FIXED_POINT_MAX_ITERATIONS {
                let mut attempt = self.invoke_body(func, args, this.clone());
                attempt.value = wrap_async(func, attempt.value);
                settled =
                    attempt.value == result.value && attempt.throws == result.throws;
                self.ctx.memo.insert(key.clone(), MemoEntry::Done(attempt.clone()));
                result = attempt;
                if settled {
                    break;
                }
            }
            if !settled {
                // Budget exhausted without a fixed point: widen to the
                // primitive bases, which is stable under further rounds.
                tracing::debug!(
                    cap = FIXED_POINT_MAX_ITERATIONS,
                    "recursive memo iteration cap hit, widening"
                );
                result.value = widen(result.value);
                result.throws = widen(result.throws);
                self.ctx.memo.insert(key, MemoEntry::Done(result.clone()));
            }
        }
        result
    }

    fn invoke_body(
        &mut self,
        func: &Rc<FunctionValue>,
        args: &CallArgs,
        this: Option<TypeValue>,
    ) -> OpResult {
        self.call_depth += 1;
        let saved_sample = self.sample_override;
        self.sample_override = func.sample_count;

        let call_env = func.closure.child();
        if let Some(this) = this {
            call_env.bind("this", this);
        }

        let mut bind_thrown = Vec::new();
        self.bind_params(func, args, &call_env, &mut bind_thrown);

        let func = func.clone();
        let outcome = self.with_module(func.id.module, |this| {
            if func.expression_body {
                let flow = this.eval_expr(func.body, &call_env);
                if flow.diverted() {
                    EvalOutcome::Throw {
                        value: flow.thrown,
                        span: None,
                    }
                } else {
                    EvalOutcome::Return {
                        value: flow.value,
                        thrown: flow.thrown,
                    }
                }
            } else {
                this.eval_stmt(func.body, &call_env)
            }
        });

        self.sample_override = saved_sample;
        self.call_depth -= 1;

        let mut result = match outcome {
            EvalOutcome::Value(_) => OpResult::value(TypeValue::undefined()),
            EvalOutcome::Return { value, thrown } => OpResult {
                value,
                throws: thrown,
            },
            EvalOutcome::Throw { value, .. } => OpResult::throws(value),
            EvalOutcome::Sealed { returned, thrown }
            | EvalOutcome::Break { returned, thrown }
            | EvalOutcome::Continue { returned, thrown } => OpResult {
                value: TypeValue::union2(returned, TypeValue::undefined()),
                throws: thrown,
            },
        };
        result.throws = TypeValue::union2(union_of(bind_thrown), result.throws);
        result
    }

    fn bind_params(
        &mut self,
        func: &Rc<FunctionValue>,
        args: &CallArgs,
        call_env: &Env,
        thrown: &mut Vec<TypeValue>,
    ) {
        let params = func.params.clone();
        let module = func.id.module;
        self.with_module(module, |this| {
            for (i, &param) in params.iter().enumerate() {
                if let Some(NodeKind::RestElement { arg }) =
                    this.arena.get(param).map(|n| n.kind.clone())
                {
                    let remaining: Vec<TypeValue> =
                        args.fixed.iter().skip(i).cloned().collect();
                    let rest_value = match &args.rest_elem {
                        Some(elem) => {
                            let mut members = remaining;
                            members.push(elem.clone());
                            TypeValue::Array(Box::new(union_of(members)))
                        }
                        None => TypeValue::Tuple(remaining),
                    };
                    this.bind_pattern(arg, rest_value, call_env, true, thrown);
                    break;
                }
                let value = match args.fixed.get(i) {
                    Some(value) => value.clone(),
                    None => match &args.rest_elem {
                        Some(elem) => TypeValue::union2(elem.clone(), TypeValue::undefined()),
                        None => TypeValue::undefined(),
                    },
                };
                this.bind_pattern(param, value, call_env, true, thrown);
            }
        });
    }

    // ------------------------------------------------------------------
    // new-expressions and construction
    // ------------------------------------------------------------------

    pub(crate) fn eval_new(
        &mut self,
        callee: NodeIndex,
        args: &[NodeIndex],
        env: &Env,
    ) -> ExprFlow {
        let mut thrown = Vec::new();

        // Built-in Error constructors work without a binding.
        if let Some(NodeKind::Ident(name)) = self.arena.get(callee).map(|n| n.kind.clone())
            && !env.is_bound(&name)
            && is_builtin_error_class(&name)
        {
            let Some(call_args) = self.eval_call_args(args, env, &mut thrown) else {
                return ExprFlow::throws(union_of(thrown));
            };
            let message = call_args
                .fixed
                .first()
                .cloned()
                .unwrap_or_else(TypeValue::undefined);
            let value = error_instance(&self.ctx.idgen, &name, message);
            return Self::flow_from(thrown, value);
        }

        let Some(callee_value) = self.operand(callee, env, &mut thrown) else {
            return ExprFlow::throws(union_of(thrown));
        };
        let Some(call_args) = self.eval_call_args(args, env, &mut thrown) else {
            return ExprFlow::throws(union_of(thrown));
        };

        let result = match &callee_value {
            TypeValue::Class(class) => self.construct(&class.clone(), &call_args),
            TypeValue::Function(func) => {
                // Constructor-function pattern: a fresh `this` object
                // collects the properties the body assigns.
                let this_obj =
                    TypeValue::Object(ObjectRef::new(&self.ctx.idgen, IndexMap::new()));
                let call = self.call_function_value(&func.clone(), &call_args, Some(this_obj.clone()));
                OpResult {
                    value: this_obj,
                    throws: call.throws,
                }
            }
            TypeValue::Unknown => OpResult::value(TypeValue::Unknown),
            other => OpResult::throws(error_instance(
                &self.ctx.idgen,
                "TypeError",
                TypeValue::string_lit(format!("{other} is not a constructor")),
            )),
        };
        thrown.push(result.throws);
        if result.value.is_never() {
            return ExprFlow::throws(union_of(thrown));
        }
        Self::flow_from(thrown, result.value)
    }

    /// `new C(...)`: methods from the inheritance chain populate the
    /// instance, then the constructor runs against it as `this`.
    pub(crate) fn construct(&mut self, class: &Rc<ClassValue>, args: &CallArgs) -> OpResult {
        let mut props: IndexMap<String, TypeValue> = IndexMap::new();
        collect_methods(class, &mut props);

        let mut ancestry = Vec::new();
        let mut current = class.superclass.clone();
        while let Some(ancestor) = current {
            ancestry.push(ancestor.name.clone());
            current = ancestor.superclass.clone();
        }

        let instance = TypeValue::Instance(InstanceValue {
            class_name: class.name.clone(),
            ancestry,
            data: ObjectRef::new(&self.ctx.idgen, props),
        });

        let mut throws = TypeValue::Never;
        let constructor = class
            .constructor
            .clone()
            .or_else(|| inherited_constructor(class));
        if let Some(ctor) = constructor {
            let call = self.call_function_value(&ctor, args, Some(instance.clone()));
            throws = call.throws;
        }
        OpResult {
            value: instance,
            throws,
        }
    }
}

/// Methods of the whole chain, root first so overrides win.
fn collect_methods(class: &ClassValue, props: &mut IndexMap<String, TypeValue>) {
    if let Some(superclass) = &class.superclass {
        collect_methods(superclass, props);
    }
    for (name, method) in &class.methods {
        props.insert(name.clone(), method.clone());
    }
}

fn inherited_constructor(class: &ClassValue) -> Option<Rc<FunctionValue>> {
    let mut current = class.superclass.clone();
    while let Some(ancestor) = current {
        if let Some(ctor) = &ancestor.constructor {
            return Some(ctor.clone());
        }
        current = ancestor.superclass.clone();
    }
    None
}

fn wrap_async(func: &FunctionValue, value: TypeValue) -> TypeValue {
    if func.is_async && !value.is_never() {
        TypeValue::Promise(Box::new(value))
    } else {
        value
    }
}

/// Canonical memo rendering of an argument list. Object identity never
/// appears in `Display`, so structurally equal arguments share entries.
fn render_args(args: &CallArgs) -> String {
    let mut out = String::new();
    for (i, arg) in args.fixed.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&arg.to_string());
    }
    if let Some(rest) = &args.rest_elem {
        if !args.fixed.is_empty() {
            out.push_str(", ");
        }
        out.push_str("...");
        out.push_str(&rest.to_string());
    }
    out
}

fn is_array_answer(value: &TypeValue) -> TypeValue {
    match value {
        TypeValue::Tuple(_) | TypeValue::Array(_) => TypeValue::bool_lit(true),
        TypeValue::Union(members) => {
            let answers: Vec<TypeValue> = members.iter().map(is_array_answer).collect();
            union_of(answers)
        }
        TypeValue::Refined(refined) => is_array_answer(&refined.base),
        TypeValue::Unknown => TypeValue::boolean(),
        _ => TypeValue::bool_lit(false),
    }
}
