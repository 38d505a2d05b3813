use super::*;
use crate::test_fixtures::{analyse, analyse_plain, build, cases_for, function_analysis};
use jsty_ast::BinaryOp;
use jsty_solver::types::TypeValue;

// =============================================================================
// Scenario: subtract
// =============================================================================

#[test]
fn test_subtract_cases_and_combined_policy() {
    // function subtract(a, b) { return a - b; }
    let mut b = jsty_ast::AstBuilder::new();
    let pa = b.ident("a");
    let pb = b.ident("b");
    let left = b.ident("a");
    let right = b.ident("b");
    let sub = b.binary(BinaryOp::Sub, left, right);
    let ret = b.ret(Some(sub));
    let body = b.block(vec![ret]);
    let f = b.function(Some("subtract"), vec![pa, pb], body);
    let program = b.program(vec![f]);
    let arena = b.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(
        &mut directives,
        f,
        vec![
            vec![TypeValue::number_lit(5.0), TypeValue::number_lit(3.0)],
            vec![TypeValue::number(), TypeValue::number()],
        ],
    );

    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "subtract");

    assert_eq!(analysis.cases[0].value, TypeValue::number_lit(2.0));
    assert_eq!(analysis.cases[0].throws, TypeValue::Never);
    assert_eq!(analysis.cases[1].value, TypeValue::number());

    // Policy: the combined result preserves the precise union.
    match &analysis.combined_value {
        TypeValue::Union(members) => {
            assert_eq!(members.len(), 2);
            assert!(members.contains(&TypeValue::number_lit(2.0)));
            assert!(members.contains(&TypeValue::number()));
        }
        other => panic!("expected 2 | number, got {other}"),
    }
    assert_eq!(analysis.combined_throws, TypeValue::Never);
}

// =============================================================================
// Scenario: describe (typeof narrowing)
// =============================================================================

fn describe_arena() -> (jsty_ast::AstArena, jsty_ast::NodeIndex) {
    // function describe(x) { if (typeof x === "number") return x + 1; return x; }
    let mut b = jsty_ast::AstBuilder::new();
    let param = b.ident("x");
    let x1 = b.ident("x");
    let type_of = b.unary(jsty_ast::UnaryOp::TypeOf, x1);
    let tag = b.string("number");
    let test = b.binary(BinaryOp::EqStrict, type_of, tag);
    let x2 = b.ident("x");
    let one = b.number(1.0);
    let add = b.binary(BinaryOp::Add, x2, one);
    let ret_inc = b.ret(Some(add));
    let if_stmt = b.if_stmt(test, ret_inc, None);
    let x3 = b.ident("x");
    let ret_x = b.ret(Some(x3));
    let body = b.block(vec![if_stmt, ret_x]);
    let f = b.function(Some("describe"), vec![param], body);
    let program = b.program(vec![f]);
    (b.finish(program), f)
}

#[test]
fn test_describe_literal_number() {
    let (arena, f) = describe_arena();
    let mut directives = crate::DirectiveSet::new();
    cases_for(&mut directives, f, vec![vec![TypeValue::number_lit(42.0)]]);
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "describe");
    assert_eq!(analysis.cases[0].value, TypeValue::number_lit(43.0));
}

#[test]
fn test_describe_literal_string_passes_through() {
    let (arena, f) = describe_arena();
    let mut directives = crate::DirectiveSet::new();
    cases_for(&mut directives, f, vec![vec![TypeValue::string_lit("hello")]]);
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "describe");
    assert_eq!(analysis.cases[0].value, TypeValue::string_lit("hello"));
}

#[test]
fn test_describe_union_splits_per_branch() {
    let (arena, f) = describe_arena();
    let mut directives = crate::DirectiveSet::new();
    cases_for(
        &mut directives,
        f,
        vec![vec![TypeValue::union2(TypeValue::number(), TypeValue::string())]],
    );
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "describe");
    assert_eq!(
        analysis.cases[0].value,
        TypeValue::union2(TypeValue::number(), TypeValue::string())
    );
}

// =============================================================================
// Scenario: calc (comparison branching)
// =============================================================================

#[test]
fn test_calc() {
    // function calc(a, b) { if (a > b) return a - b; return a + b; }
    let mut b = jsty_ast::AstBuilder::new();
    let pa = b.ident("a");
    let pb = b.ident("b");
    let a1 = b.ident("a");
    let b1 = b.ident("b");
    let test = b.binary(BinaryOp::Gt, a1, b1);
    let a2 = b.ident("a");
    let b2 = b.ident("b");
    let sub = b.binary(BinaryOp::Sub, a2, b2);
    let ret_sub = b.ret(Some(sub));
    let if_stmt = b.if_stmt(test, ret_sub, None);
    let a3 = b.ident("a");
    let b3 = b.ident("b");
    let add = b.binary(BinaryOp::Add, a3, b3);
    let ret_add = b.ret(Some(add));
    let body = b.block(vec![if_stmt, ret_add]);
    let f = b.function(Some("calc"), vec![pa, pb], body);
    let program = b.program(vec![f]);
    let arena = b.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(
        &mut directives,
        f,
        vec![
            vec![TypeValue::number_lit(1.0), TypeValue::number_lit(2.0)],
            vec![TypeValue::number(), TypeValue::number()],
        ],
    );
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "calc");

    // 1 > 2 is false: only the addition path runs
    assert_eq!(analysis.cases[0].value, TypeValue::number_lit(3.0));
    // Abstract comparison: both paths, both number
    assert_eq!(analysis.cases[1].value, TypeValue::number());
}

// =============================================================================
// Scenario: safeSqrt (throw effects)
// =============================================================================

#[test]
fn test_safe_sqrt_throw_effect() {
    // function safeSqrt(x) { if (x < 0) throw new RangeError("neg"); return x; }
    let mut b = jsty_ast::AstBuilder::new();
    let param = b.ident("x");
    let x1 = b.ident("x");
    let zero = b.number(0.0);
    let test = b.binary(BinaryOp::Lt, x1, zero);
    let ctor = b.ident("RangeError");
    let msg = b.string("neg");
    let err = b.new_expr(ctor, vec![msg]);
    let throw_stmt = b.throw(err);
    let if_stmt = b.if_stmt(test, throw_stmt, None);
    let x2 = b.ident("x");
    let ret = b.ret(Some(x2));
    let body = b.block(vec![if_stmt, ret]);
    let f = b.function(Some("safeSqrt"), vec![param], body);
    let program = b.program(vec![f]);
    let arena = b.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(
        &mut directives,
        f,
        vec![
            vec![TypeValue::number_lit(10.0)],
            vec![TypeValue::number_lit(-1.0)],
        ],
    );
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "safeSqrt");

    assert_eq!(analysis.cases[0].value, TypeValue::number_lit(10.0));
    assert_eq!(analysis.cases[0].throws, TypeValue::Never);

    assert_eq!(analysis.cases[1].value, TypeValue::Never);
    match &analysis.cases[1].throws {
        TypeValue::Instance(instance) => {
            assert_eq!(instance.class_name, "RangeError");
            assert_eq!(
                instance.data.get("message"),
                Some(TypeValue::string_lit("neg"))
            );
        }
        other => panic!("expected RangeError instance, got {other}"),
    }
}

// =============================================================================
// Scenario: template strings end to end
// =============================================================================

#[test]
fn test_hex_prefix_template() {
    // function hex(x) { return ("0x" + x).startsWith("0"); }
    let mut b = jsty_ast::AstBuilder::new();
    let param = b.ident("x");
    let prefix = b.string("0x");
    let x = b.ident("x");
    let concat = b.binary(BinaryOp::Add, prefix, x);
    let recv_member = b.member(concat, "startsWith");
    let needle = b.string("0");
    let call = b.call(recv_member, vec![needle]);
    let ret = b.ret(Some(call));
    let body = b.block(vec![ret]);
    let f = b.function(Some("hex"), vec![param], body);
    let program = b.program(vec![f]);
    let arena = b.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(&mut directives, f, vec![vec![TypeValue::string()]]);
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "hex");
    assert_eq!(analysis.cases[0].value, TypeValue::bool_lit(true));
}

// =============================================================================
// Expression plumbing
// =============================================================================

#[test]
fn test_object_literal_and_member_access() {
    // const o = { a: 1, b: "s" }; const v = o.a;
    let arena = build(|b| {
        let one = b.number(1.0);
        let s = b.string("s");
        let pa = b.prop("a", one);
        let pb = b.prop("b", s);
        let obj = b.object(vec![pa, pb]);
        let decl_o = b.const_decl("o", obj);
        let o_ref = b.ident("o");
        let access = b.member(o_ref, "a");
        let decl_v = b.const_decl("v", access);
        b.program(vec![decl_o, decl_v])
    });
    let (analyser, result) = analyse_plain(arena);
    assert!(result.diagnostics.is_empty());
    assert_eq!(analyser.binding("v"), Some(TypeValue::number_lit(1.0)));
}

#[test]
fn test_member_access_on_null_throws() {
    // function f(o) { return o.x; } with o = null
    let mut b = jsty_ast::AstBuilder::new();
    let param = b.ident("o");
    let o = b.ident("o");
    let access = b.member(o, "x");
    let ret = b.ret(Some(access));
    let body = b.block(vec![ret]);
    let f = b.function(Some("f"), vec![param], body);
    let program = b.program(vec![f]);
    let arena = b.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(&mut directives, f, vec![vec![TypeValue::null()]]);
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "f");
    assert_eq!(analysis.cases[0].value, TypeValue::Never);
    match &analysis.cases[0].throws {
        TypeValue::Instance(instance) => assert_eq!(instance.class_name, "TypeError"),
        other => panic!("expected TypeError, got {other}"),
    }
}

#[test]
fn test_optional_chain_suppresses_throw() {
    // function f(o) { return o?.x; } with o = null | {x: 1}
    let mut b = jsty_ast::AstBuilder::new();
    let param = b.ident("o");
    let o = b.ident("o");
    let access = b.optional_member(o, "x");
    let ret = b.ret(Some(access));
    let body = b.block(vec![ret]);
    let f = b.function(Some("f"), vec![param], body);
    let program = b.program(vec![f]);
    let arena = b.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(&mut directives, f, vec![vec![TypeValue::null()]]);
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "f");
    assert_eq!(analysis.cases[0].value, TypeValue::undefined());
    assert_eq!(analysis.cases[0].throws, TypeValue::Never);
}

#[test]
fn test_lazy_union_through_binding() {
    // function twice(a) { return a + a; }
    let mut b = jsty_ast::AstBuilder::new();
    let param = b.ident("a");
    let a1 = b.ident("a");
    let a2 = b.ident("a");
    let add = b.binary(BinaryOp::Add, a1, a2);
    let ret = b.ret(Some(add));
    let body = b.block(vec![ret]);
    let f = b.function(Some("twice"), vec![param], body);
    let program = b.program(vec![f]);
    let arena = b.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(
        &mut directives,
        f,
        vec![vec![TypeValue::union2(
            TypeValue::number_lit(1.0),
            TypeValue::number_lit(2.0),
        )]],
    );
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "twice");
    // Both occurrences are the same runtime value: 2 | 4, no cross terms
    assert_eq!(
        analysis.cases[0].value,
        TypeValue::union2(TypeValue::number_lit(2.0), TypeValue::number_lit(4.0))
    );
}

#[test]
fn test_logical_operators() {
    // const a = 0 || "fallback"; const b = 1 && "then"; const c = null ?? 7;
    let arena = build(|b| {
        let zero = b.number(0.0);
        let fb = b.string("fallback");
        let or = b.logical(jsty_ast::LogicalOp::Or, zero, fb);
        let d1 = b.const_decl("a", or);

        let one = b.number(1.0);
        let then = b.string("then");
        let and = b.logical(jsty_ast::LogicalOp::And, one, then);
        let d2 = b.const_decl("b", and);

        let null = b.null();
        let seven = b.number(7.0);
        let nullish = b.logical(jsty_ast::LogicalOp::Nullish, null, seven);
        let d3 = b.const_decl("c", nullish);
        b.program(vec![d1, d2, d3])
    });
    let (analyser, _) = analyse_plain(arena);
    assert_eq!(analyser.binding("a"), Some(TypeValue::string_lit("fallback")));
    assert_eq!(analyser.binding("b"), Some(TypeValue::string_lit("then")));
    assert_eq!(analyser.binding("c"), Some(TypeValue::number_lit(7.0)));
}

#[test]
fn test_compound_assignment_and_update() {
    // let n = 10; n += 5; n++;
    let arena = build(|b| {
        let ten = b.number(10.0);
        let decl = b.let_decl("n", ten);
        let n1 = b.ident("n");
        let five = b.number(5.0);
        let add = b.compound_assign(jsty_ast::AssignOp::AddAssign, n1, five);
        let s1 = b.expr_stmt(add);
        let n2 = b.ident("n");
        let inc = b.update(jsty_ast::UpdateOp::Inc, false, n2);
        let s2 = b.expr_stmt(inc);
        b.program(vec![decl, s1, s2])
    });
    let (analyser, _) = analyse_plain(arena);
    assert_eq!(analyser.binding("n"), Some(TypeValue::number_lit(16.0)));
}

#[test]
fn test_async_function_wraps_in_promise_and_await_unwraps() {
    // async function p() { return 1; }
    // function q() { return p(); }
    let mut b = jsty_ast::AstBuilder::new();
    let one = b.number(1.0);
    let ret1 = b.ret(Some(one));
    let p_body = b.block(vec![ret1]);
    let p = b.async_function(Some("p"), vec![], p_body);

    let callee = b.ident("p");
    let call = b.call(callee, vec![]);
    let awaited = b.await_expr(call);
    let ret2 = b.ret(Some(awaited));
    let q_body = b.block(vec![ret2]);
    let q = b.function(Some("q"), vec![], q_body);

    let program = b.program(vec![p, q]);
    let arena = b.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(&mut directives, p, vec![vec![]]);
    cases_for(&mut directives, q, vec![vec![]]);
    let (_, result) = analyse(arena, directives);

    let p_analysis = function_analysis(&result, "p");
    assert_eq!(
        p_analysis.cases[0].value,
        TypeValue::Promise(Box::new(TypeValue::number_lit(1.0)))
    );
    let q_analysis = function_analysis(&result, "q");
    assert_eq!(q_analysis.cases[0].value, TypeValue::number_lit(1.0));
}

#[test]
fn test_analysis_result_serialization_shape() {
    // Results serialize with canonical type renderings for host tooling.
    let mut b = jsty_ast::AstBuilder::new();
    let param = b.ident("x");
    let x = b.ident("x");
    let ret = b.ret(Some(x));
    let body = b.block(vec![ret]);
    let f = b.function(Some("id"), vec![param], body);
    let program = b.program(vec![f]);
    let arena = b.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(&mut directives, f, vec![vec![TypeValue::number_lit(7.0)]]);
    let (_, result) = analyse(arena, directives);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["functions"][0]["name"], "id");
    assert_eq!(json["functions"][0]["cases"][0]["value"], "7");
    assert_eq!(json["functions"][0]["cases"][0]["throws"], "never");
}

#[test]
fn test_switch_on_literal_falls_through_to_break() {
    // function pick(k) { let r = 0; switch (k) { case 1: r = 10; case 2: r = 20; break; default: r = 99; } return r; }
    let mut b = jsty_ast::AstBuilder::new();
    let param = b.ident("k");
    let zero = b.number(0.0);
    let decl = b.let_decl("r", zero);

    let k = b.ident("k");
    let one = b.number(1.0);
    let r1 = b.ident("r");
    let ten = b.number(10.0);
    let set10 = b.assign(r1, ten);
    let s10 = b.expr_stmt(set10);
    let case1 = b.case(Some(one), vec![s10]);

    let two = b.number(2.0);
    let r2 = b.ident("r");
    let twenty = b.number(20.0);
    let set20 = b.assign(r2, twenty);
    let s20 = b.expr_stmt(set20);
    let brk = b.brk();
    let case2 = b.case(Some(two), vec![s20, brk]);

    let r3 = b.ident("r");
    let nn = b.number(99.0);
    let set99 = b.assign(r3, nn);
    let s99 = b.expr_stmt(set99);
    let default_case = b.case(None, vec![s99]);

    let switch_stmt = b.switch(k, vec![case1, case2, default_case]);
    let r4 = b.ident("r");
    let ret = b.ret(Some(r4));
    let body = b.block(vec![decl, switch_stmt, ret]);
    let f = b.function(Some("pick"), vec![param], body);
    let program = b.program(vec![f]);
    let arena = b.finish(program);

    let mut directives = crate::DirectiveSet::new();
    cases_for(
        &mut directives,
        f,
        vec![
            vec![TypeValue::number_lit(1.0)],
            vec![TypeValue::number_lit(7.0)],
        ],
    );
    let (_, result) = analyse(arena, directives);
    let analysis = function_analysis(&result, "pick");
    // case 1 falls through into case 2, then breaks before default
    assert_eq!(analysis.cases[0].value, TypeValue::number_lit(20.0));
    // no match: default runs
    assert_eq!(analysis.cases[1].value, TypeValue::number_lit(99.0));
}
