use super::*;
use crate::test_fixtures::{analyse, analyse_plain, cases_for, function_analysis};
use jsty_ast::{AstBuilder, BinaryOp, NodeIndex};
use jsty_solver::types::TypeValue;

/// `function fact(n) { if (n <= 1) return 1; return n * fact(n - 1); }`
fn fact_arena() -> (jsty_ast::AstArena, NodeIndex) {
    let mut b = AstBuilder::new();
    let param = b.ident("n");
    let n1 = b.ident("n");
    let one1 = b.number(1.0);
    let test = b.binary(BinaryOp::Le, n1, one1);
    let one2 = b.number(1.0);
    let ret1 = b.ret(Some(one2));
    let if_stmt = b.if_stmt(test, ret1, None);

    let n2 = b.ident("n");
    let callee = b.ident("fact");
    let n3 = b.ident("n");
    let one3 = b.number(1.0);
    let minus = b.binary(BinaryOp::Sub, n3, one3);
    let rec = b.call(callee, vec![minus]);
    let mul = b.binary(BinaryOp::Mul, n2, rec);
    let ret2 = b.ret(Some(mul));

    let body = b.block(vec![if_stmt, ret2]);
    let f = b.function(Some("fact"), vec![param], body);
    let program = b.program(vec![f]);
    (b.finish(program), f)
}

// =============================================================================
// Plain calls
// =============================================================================

#[test]
fn test_call_binds_parameters_and_defaults() {
    // function greet(name = "world") { return "hi " + name; }
    // const a = greet("you"); const b = greet();
    let mut bd = AstBuilder::new();
    let name_ident = bd.ident("name");
    let world = bd.string("world");
    let param = bd.default_pattern(name_ident, world);
    let hi = bd.string("hi ");
    let name_ref = bd.ident("name");
    let concat = bd.binary(BinaryOp::Add, hi, name_ref);
    let ret = bd.ret(Some(concat));
    let body = bd.block(vec![ret]);
    let f = bd.function(Some("greet"), vec![param], body);

    let callee1 = bd.ident("greet");
    let you = bd.string("you");
    let call1 = bd.call(callee1, vec![you]);
    let decl_a = bd.const_decl("a", call1);
    let callee2 = bd.ident("greet");
    let call2 = bd.call(callee2, vec![]);
    let decl_b = bd.const_decl("b", call2);

    let program = bd.program(vec![f, decl_a, decl_b]);
    let arena = bd.finish(program);

    let (analyser, _) = analyse_plain(arena);
    assert_eq!(analyser.binding("a"), Some(TypeValue::string_lit("hi you")));
    assert_eq!(analyser.binding("b"), Some(TypeValue::string_lit("hi world")));
}

#[test]
fn test_closure_captures_defining_scope() {
    // function make() { let count = 0; return () => count + 1; }
    // const inc = make(); const v = inc();
    let mut bd = AstBuilder::new();
    let zero = bd.number(0.0);
    let decl_count = bd.let_decl("count", zero);
    let count_ref = bd.ident("count");
    let one = bd.number(1.0);
    let add = bd.binary(BinaryOp::Add, count_ref, one);
    let arrow = bd.arrow(vec![], add);
    let ret = bd.ret(Some(arrow));
    let make_body = bd.block(vec![decl_count, ret]);
    let make = bd.function(Some("make"), vec![], make_body);

    let callee = bd.ident("make");
    let call_make = bd.call(callee, vec![]);
    let decl_inc = bd.const_decl("inc", call_make);
    let inc_ref = bd.ident("inc");
    let call_inc = bd.call(inc_ref, vec![]);
    let decl_v = bd.const_decl("v", call_inc);
    let program = bd.program(vec![make, decl_inc, decl_v]);
    let arena = bd.finish(program);

    let (analyser, _) = analyse_plain(arena);
    assert_eq!(analyser.binding("v"), Some(TypeValue::number_lit(1.0)));
}

#[test]
fn test_rest_parameters_collect_a_tuple() {
    // function collect(first, ...rest) { return rest; }
    let mut bd = AstBuilder::new();
    let first = bd.ident("first");
    let rest_ident = bd.ident("rest");
    let rest = bd.rest(rest_ident);
    let rest_ref = bd.ident("rest");
    let ret = bd.ret(Some(rest_ref));
    let body = bd.block(vec![ret]);
    let f = bd.function(Some("collect"), vec![first, rest], body);
    let program = bd.program(vec![f]);
    let arena = bd.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(
        &mut directives,
        f,
        vec![vec![
            TypeValue::number_lit(1.0),
            TypeValue::string_lit("a"),
            TypeValue::string_lit("b"),
        ]],
    );
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "collect");
    assert_eq!(
        analysis.cases[0].value,
        TypeValue::Tuple(vec![
            TypeValue::string_lit("a"),
            TypeValue::string_lit("b")
        ])
    );
}

#[test]
fn test_spread_arguments_flatten_tuples() {
    // function pair(a, b) { return [a, b]; }
    // const v = pair(...[1, 2]);
    let mut bd = AstBuilder::new();
    let pa = bd.ident("a");
    let pb = bd.ident("b");
    let a_ref = bd.ident("a");
    let b_ref = bd.ident("b");
    let tuple = bd.array(vec![Some(a_ref), Some(b_ref)]);
    let ret = bd.ret(Some(tuple));
    let body = bd.block(vec![ret]);
    let f = bd.function(Some("pair"), vec![pa, pb], body);

    let callee = bd.ident("pair");
    let one = bd.number(1.0);
    let two = bd.number(2.0);
    let arg_tuple = bd.array(vec![Some(one), Some(two)]);
    let spread = bd.spread(arg_tuple);
    let call = bd.call(callee, vec![spread]);
    let decl = bd.const_decl("v", call);
    let program = bd.program(vec![f, decl]);
    let arena = bd.finish(program);

    let (analyser, _) = analyse_plain(arena);
    assert_eq!(
        analyser.binding("v"),
        Some(TypeValue::Tuple(vec![
            TypeValue::number_lit(1.0),
            TypeValue::number_lit(2.0)
        ]))
    );
}

// =============================================================================
// Memoisation and recursion
// =============================================================================

#[test]
fn test_pure_recursion_on_literals() {
    let (arena, f) = fact_arena();
    let mut directives = crate::DirectiveSet::new();
    directives.attach(f, crate::Directive::Pure);
    cases_for(&mut directives, f, vec![vec![TypeValue::number_lit(4.0)]]);
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "fact");
    assert_eq!(analysis.cases[0].value, TypeValue::number_lit(24.0));
}

#[test]
fn test_pure_recursion_on_abstract_argument_reaches_fixed_point() {
    let (arena, f) = fact_arena();
    let mut directives = crate::DirectiveSet::new();
    directives.attach(f, crate::Directive::Pure);
    cases_for(&mut directives, f, vec![vec![TypeValue::number()]]);
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "fact");
    // Base case 1 joins with the widened recursive product.
    assert_eq!(
        analysis.cases[0].value,
        TypeValue::union2(TypeValue::number_lit(1.0), TypeValue::number())
    );
}

#[test]
fn test_pure_recursion_keeps_iterating_while_result_grows() {
    // function grow(n) { if (n === 0) return 0; return grow(n - 1) - 0 + 1; }
    //
    // Each round the recursive result gains one more numeric literal
    // (0, then 0|1, then 0|1|2, ...), so no two consecutive rounds
    // agree within the iteration budget. The iteration must keep going
    // past the first re-evaluation and settle by widening, not stop as
    // soon as a round happens to read the cached approximation.
    let mut b = AstBuilder::new();
    let param = b.ident("n");
    let n1 = b.ident("n");
    let zero1 = b.number(0.0);
    let test = b.binary(BinaryOp::EqStrict, n1, zero1);
    let zero2 = b.number(0.0);
    let ret_base = b.ret(Some(zero2));
    let if_stmt = b.if_stmt(test, ret_base, None);

    let callee = b.ident("grow");
    let n2 = b.ident("n");
    let one1 = b.number(1.0);
    let minus = b.binary(BinaryOp::Sub, n2, one1);
    let rec = b.call(callee, vec![minus]);
    let zero3 = b.number(0.0);
    let collapsed = b.binary(BinaryOp::Sub, rec, zero3);
    let one2 = b.number(1.0);
    let stepped = b.binary(BinaryOp::Add, collapsed, one2);
    let ret_step = b.ret(Some(stepped));

    let body = b.block(vec![if_stmt, ret_step]);
    let f = b.function(Some("grow"), vec![param], body);
    let program = b.program(vec![f]);
    let arena = b.finish(program);

    let mut directives = crate::DirectiveSet::new();
    directives.attach(f, crate::Directive::Pure);
    cases_for(&mut directives, f, vec![vec![TypeValue::number()]]);
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "grow");
    // The growing literal chain never settles inside the budget; the
    // cap widens the join to its primitive base.
    assert_eq!(analysis.cases[0].value, TypeValue::number());
    assert_eq!(analysis.cases[0].throws, TypeValue::Never);
}

#[test]
fn test_memoised_results_are_stable() {
    let (arena, f) = fact_arena();
    let mut directives = crate::DirectiveSet::new();
    directives.attach(f, crate::Directive::Pure);
    cases_for(&mut directives, f, vec![vec![TypeValue::number_lit(5.0)]]);
    let (mut analyser, result) = analyse(arena, directives);
    let first = function_analysis(&result, "fact").cases[0].value.clone();

    // Driving the same function again through the public API answers
    // from the memo table with an identical result.
    let function = analyser.binding("fact").expect("fact bound");
    let again = analyser.call_function(&function, &[TypeValue::number_lit(5.0)]);
    assert_eq!(again.value, first);
    assert_eq!(again.value, TypeValue::number_lit(120.0));
}

#[test]
fn test_unpure_recursion_is_depth_bounded() {
    // Without the pure directive recursion has no memo table; the call
    // depth budget widens it to unknown instead of diverging.
    let (arena, f) = fact_arena();
    let mut directives = crate::DirectiveSet::new();
    cases_for(&mut directives, f, vec![vec![TypeValue::number()]]);
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "fact");
    // The result is a join over paths that bottom out at the depth
    // budget; it must exist and must include the literal base case.
    match &analysis.cases[0].value {
        TypeValue::Union(members) => {
            assert!(members.contains(&TypeValue::number_lit(1.0)));
        }
        TypeValue::Unknown | TypeValue::Primitive(_) => {}
        other => panic!("unexpected result shape {other}"),
    }
}

// =============================================================================
// Throw propagation across calls
// =============================================================================

#[test]
fn test_callee_throw_propagates_and_catch_absorbs() {
    // function boom() { throw new RangeError("x"); }
    // function guarded() { try { boom(); } catch (e) { return 0; } return 1; }
    // function raw() { boom(); return 1; }
    let mut bd = AstBuilder::new();
    let ctor = bd.ident("RangeError");
    let msg = bd.string("x");
    let err = bd.new_expr(ctor, vec![msg]);
    let throw_stmt = bd.throw(err);
    let boom_body = bd.block(vec![throw_stmt]);
    let boom = bd.function(Some("boom"), vec![], boom_body);

    let callee1 = bd.ident("boom");
    let call1 = bd.call(callee1, vec![]);
    let try_stmt_expr = bd.expr_stmt(call1);
    let try_block = bd.block(vec![try_stmt_expr]);
    let e_param = bd.ident("e");
    let zero = bd.number(0.0);
    let ret0 = bd.ret(Some(zero));
    let catch_body = bd.block(vec![ret0]);
    let handler = bd.catch(Some(e_param), catch_body);
    let try_stmt = bd.try_stmt(try_block, Some(handler), None);
    let one = bd.number(1.0);
    let ret1 = bd.ret(Some(one));
    let guarded_body = bd.block(vec![try_stmt, ret1]);
    let guarded = bd.function(Some("guarded"), vec![], guarded_body);

    let callee2 = bd.ident("boom");
    let call2 = bd.call(callee2, vec![]);
    let stmt2 = bd.expr_stmt(call2);
    let one2 = bd.number(1.0);
    let ret2 = bd.ret(Some(one2));
    let raw_body = bd.block(vec![stmt2, ret2]);
    let raw = bd.function(Some("raw"), vec![], raw_body);

    let program = bd.program(vec![boom, guarded, raw]);
    let arena = bd.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(&mut directives, boom, vec![vec![]]);
    cases_for(&mut directives, guarded, vec![vec![]]);
    cases_for(&mut directives, raw, vec![vec![]]);
    let (_, result) = analyse(arena, directives);

    let boom_analysis = function_analysis(&result, "boom");
    assert_eq!(boom_analysis.cases[0].value, TypeValue::Never);
    match &boom_analysis.cases[0].throws {
        TypeValue::Instance(instance) => assert_eq!(instance.class_name, "RangeError"),
        other => panic!("expected RangeError, got {other}"),
    }

    // catch absorbs: guarded's aggregate throws is empty
    let guarded_analysis = function_analysis(&result, "guarded");
    assert_eq!(guarded_analysis.cases[0].value, TypeValue::number_lit(0.0));
    assert_eq!(guarded_analysis.cases[0].throws, TypeValue::Never);

    // no handler: the throw rides through
    let raw_analysis = function_analysis(&result, "raw");
    assert_eq!(raw_analysis.cases[0].value, TypeValue::Never);
    match &raw_analysis.cases[0].throws {
        TypeValue::Instance(instance) => assert_eq!(instance.class_name, "RangeError"),
        other => panic!("expected RangeError, got {other}"),
    }
}

#[test]
fn test_catch_binds_thrown_value() {
    // function f() { try { throw new TypeError("bad"); } catch (e) { return e; } }
    let mut bd = AstBuilder::new();
    let ctor = bd.ident("TypeError");
    let msg = bd.string("bad");
    let err = bd.new_expr(ctor, vec![msg]);
    let throw_stmt = bd.throw(err);
    let try_block = bd.block(vec![throw_stmt]);
    let e_param = bd.ident("e");
    let e_ref = bd.ident("e");
    let ret_e = bd.ret(Some(e_ref));
    let catch_body = bd.block(vec![ret_e]);
    let handler = bd.catch(Some(e_param), catch_body);
    let try_stmt = bd.try_stmt(try_block, Some(handler), None);
    let body = bd.block(vec![try_stmt]);
    let f = bd.function(Some("f"), vec![], body);
    let program = bd.program(vec![f]);
    let arena = bd.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(&mut directives, f, vec![vec![]]);
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "f");
    match &analysis.cases[0].value {
        TypeValue::Instance(instance) => {
            assert_eq!(instance.class_name, "TypeError");
            assert_eq!(
                instance.data.get("message"),
                Some(TypeValue::string_lit("bad"))
            );
        }
        other => panic!("expected TypeError instance, got {other}"),
    }
    assert_eq!(analysis.cases[0].throws, TypeValue::Never);
}

#[test]
fn test_finally_override() {
    // function f() { try { return 1; } finally { return 2; } }
    let mut bd = AstBuilder::new();
    let one = bd.number(1.0);
    let ret1 = bd.ret(Some(one));
    let try_block = bd.block(vec![ret1]);
    let two = bd.number(2.0);
    let ret2 = bd.ret(Some(two));
    let finally_block = bd.block(vec![ret2]);
    let try_stmt = bd.try_stmt(try_block, None, Some(finally_block));
    let body = bd.block(vec![try_stmt]);
    let f = bd.function(Some("f"), vec![], body);
    let program = bd.program(vec![f]);
    let arena = bd.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(&mut directives, f, vec![vec![]]);
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "f");
    assert_eq!(analysis.cases[0].value, TypeValue::number_lit(2.0));
}

// =============================================================================
// Classes
// =============================================================================

#[test]
fn test_class_construction_and_method_call() {
    // class Point { constructor(x) { this.x = x; } getX() { return this.x; } }
    // const p = new Point(4); const v = p.getX();
    let mut bd = AstBuilder::new();

    let ctor_param = bd.ident("x");
    let this1 = bd.ident("this");
    let member = bd.member(this1, "x");
    let x_ref = bd.ident("x");
    let assign = bd.assign(member, x_ref);
    let ctor_stmt = bd.expr_stmt(assign);
    let ctor_body = bd.block(vec![ctor_stmt]);
    let ctor_fn = bd.function(None, vec![ctor_param], ctor_body);
    let ctor = bd.constructor(ctor_fn);

    let this2 = bd.ident("this");
    let read = bd.member(this2, "x");
    let ret = bd.ret(Some(read));
    let get_body = bd.block(vec![ret]);
    let get_fn = bd.function(None, vec![], get_body);
    let get_x = bd.method("getX", get_fn);

    let class = bd.class(Some("Point"), None, vec![ctor, get_x]);

    let point_ref = bd.ident("Point");
    let four = bd.number(4.0);
    let new_expr = bd.new_expr(point_ref, vec![four]);
    let decl_p = bd.const_decl("p", new_expr);

    let p_ref = bd.ident("p");
    let method_ref = bd.member(p_ref, "getX");
    let call = bd.call(method_ref, vec![]);
    let decl_v = bd.const_decl("v", call);

    let program = bd.program(vec![class, decl_p, decl_v]);
    let arena = bd.finish(program);

    let (analyser, result) = analyse_plain(arena);
    assert!(result.diagnostics.is_empty());

    match analyser.binding("p") {
        Some(TypeValue::Instance(instance)) => {
            assert_eq!(instance.class_name, "Point");
            assert_eq!(instance.data.get("x"), Some(TypeValue::number_lit(4.0)));
            assert!(matches!(
                instance.data.get("getX"),
                Some(TypeValue::Function(_))
            ));
        }
        other => panic!("expected Point instance, got {other:?}"),
    }
    assert_eq!(analyser.binding("v"), Some(TypeValue::number_lit(4.0)));
}
