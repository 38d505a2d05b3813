use super::*;
use crate::ops::OpResult;
use crate::ops_array::{array_method, array_property};

fn num(n: f64) -> TypeValue {
    TypeValue::number_lit(n)
}

fn tuple(elems: Vec<TypeValue>) -> TypeValue {
    TypeValue::Tuple(elems)
}

fn nums() -> TypeValue {
    TypeValue::Array(Box::new(TypeValue::number()))
}

/// Callback stub applying `f` to the element argument.
fn with_cb(
    recv: &TypeValue,
    name: &str,
    args: &[TypeValue],
    mut f: impl FnMut(&[TypeValue]) -> TypeValue,
) -> crate::ops_array::MethodOutcome {
    let mut invoke = |_fn_value: &TypeValue, cb_args: &[TypeValue]| OpResult::value(f(cb_args));
    array_method(recv, name, args, &mut invoke).expect("known array method")
}

// =============================================================================
// Tuple Methods (exact)
// =============================================================================

#[test]
fn test_tuple_map_builds_tuple() {
    let recv = tuple(vec![num(1.0), num(2.0), num(3.0)]);
    let out = with_cb(&recv, "map", &[TypeValue::Unknown], |args| {
        crate::ops::binary(jsty_ast::BinaryOp::Mul, &args[0], &num(2.0))
    });
    assert_eq!(out.value, tuple(vec![num(2.0), num(4.0), num(6.0)]));
    assert_eq!(out.throws, TypeValue::Never);
}

#[test]
fn test_tuple_filter_exact_and_widened() {
    let recv = tuple(vec![num(1.0), num(0.0), num(2.0)]);
    let exact = with_cb(&recv, "filter", &[TypeValue::Unknown], |args| {
        crate::ops::binary(jsty_ast::BinaryOp::Gt, &args[0], &num(0.0))
    });
    assert_eq!(exact.value, tuple(vec![num(1.0), num(2.0)]));

    let widened = with_cb(&recv, "filter", &[TypeValue::Unknown], |_| {
        TypeValue::boolean()
    });
    assert_eq!(
        widened.value,
        TypeValue::Array(Box::new(union_of(vec![num(1.0), num(0.0), num(2.0)])))
    );
}

#[test]
fn test_tuple_reduce_folds_from_seed() {
    let recv = tuple(vec![num(1.0), num(2.0), num(3.0)]);
    let out = with_cb(&recv, "reduce", &[TypeValue::Unknown, num(0.0)], |args| {
        crate::ops::binary(jsty_ast::BinaryOp::Add, &args[0], &args[1])
    });
    assert_eq!(out.value, num(6.0));

    // Without a seed the first element seeds the fold
    let out = with_cb(&recv, "reduce", &[TypeValue::Unknown], |args| {
        crate::ops::binary(jsty_ast::BinaryOp::Add, &args[0], &args[1])
    });
    assert_eq!(out.value, num(6.0));
}

#[test]
fn test_tuple_some_every_exact() {
    let recv = tuple(vec![num(1.0), num(2.0)]);
    let some = with_cb(&recv, "some", &[TypeValue::Unknown], |args| {
        crate::ops::binary(jsty_ast::BinaryOp::Gt, &args[0], &num(1.0))
    });
    assert_eq!(some.value, TypeValue::bool_lit(true));

    let every = with_cb(&recv, "every", &[TypeValue::Unknown], |args| {
        crate::ops::binary(jsty_ast::BinaryOp::Gt, &args[0], &num(1.0))
    });
    assert_eq!(every.value, TypeValue::bool_lit(false));

    let undecided = with_cb(&recv, "some", &[TypeValue::Unknown], |_| TypeValue::boolean());
    assert_eq!(undecided.value, TypeValue::boolean());
}

#[test]
fn test_tuple_find() {
    let recv = tuple(vec![num(1.0), num(2.0), num(3.0)]);
    let out = with_cb(&recv, "find", &[TypeValue::Unknown], |args| {
        crate::ops::binary(jsty_ast::BinaryOp::Gt, &args[0], &num(1.0))
    });
    assert_eq!(out.value, num(2.0));

    let missing = with_cb(&recv, "find", &[TypeValue::Unknown], |args| {
        crate::ops::binary(jsty_ast::BinaryOp::Gt, &args[0], &num(9.0))
    });
    assert_eq!(missing.value, TypeValue::undefined());
}

#[test]
fn test_tuple_includes_index_of_join() {
    let recv = tuple(vec![num(1.0), num(2.0)]);
    let mut invoke =
        |_: &TypeValue, _: &[TypeValue]| OpResult::value(TypeValue::Unknown);
    assert_eq!(
        array_method(&recv, "includes", &[num(2.0)], &mut invoke).unwrap().value,
        TypeValue::bool_lit(true)
    );
    assert_eq!(
        array_method(&recv, "indexOf", &[num(2.0)], &mut invoke).unwrap().value,
        num(1.0)
    );
    assert_eq!(
        array_method(&recv, "indexOf", &[num(9.0)], &mut invoke).unwrap().value,
        num(-1.0)
    );
    assert_eq!(
        array_method(&recv, "join", &[TypeValue::string_lit("-")], &mut invoke)
            .unwrap()
            .value,
        TypeValue::string_lit("1-2")
    );
}

#[test]
fn test_tuple_push_reports_exact_length_and_updated_receiver() {
    let recv = tuple(vec![num(1.0)]);
    let mut invoke =
        |_: &TypeValue, _: &[TypeValue]| OpResult::value(TypeValue::Unknown);
    let out = array_method(&recv, "push", &[num(2.0)], &mut invoke).unwrap();
    assert_eq!(out.value, num(2.0));
    assert_eq!(out.updated_receiver, Some(tuple(vec![num(1.0), num(2.0)])));
}

#[test]
fn test_tuple_concat_and_slice() {
    let recv = tuple(vec![num(1.0), num(2.0)]);
    let mut invoke =
        |_: &TypeValue, _: &[TypeValue]| OpResult::value(TypeValue::Unknown);
    assert_eq!(
        array_method(&recv, "concat", &[tuple(vec![num(3.0)])], &mut invoke)
            .unwrap()
            .value,
        tuple(vec![num(1.0), num(2.0), num(3.0)])
    );
    assert_eq!(
        array_method(&recv, "slice", &[num(1.0)], &mut invoke).unwrap().value,
        tuple(vec![num(2.0)])
    );
}

#[test]
fn test_callback_throws_accumulate() {
    let idgen = ObjectIdGen::new();
    let error = crate::ops_object::error_instance(&idgen, "Error", TypeValue::string_lit("boom"));
    let recv = tuple(vec![num(1.0), num(2.0)]);
    let mut invoke = |_: &TypeValue, _: &[TypeValue]| OpResult {
        value: TypeValue::undefined(),
        throws: error.clone(),
    };
    let out = array_method(&recv, "forEach", &[TypeValue::Unknown], &mut invoke).unwrap();
    assert_eq!(out.value, TypeValue::undefined());
    assert_eq!(out.throws, error);
}

// =============================================================================
// Abstract Array Methods (widened)
// =============================================================================

#[test]
fn test_array_map_widens() {
    let out = with_cb(&nums(), "map", &[TypeValue::Unknown], |_| TypeValue::string());
    assert_eq!(out.value, TypeValue::Array(Box::new(TypeValue::string())));
}

#[test]
fn test_array_signatures() {
    let mut invoke =
        |_: &TypeValue, _: &[TypeValue]| OpResult::value(TypeValue::boolean());
    assert_eq!(
        array_method(&nums(), "filter", &[TypeValue::Unknown], &mut invoke)
            .unwrap()
            .value,
        nums()
    );
    assert_eq!(
        array_method(&nums(), "find", &[TypeValue::Unknown], &mut invoke)
            .unwrap()
            .value,
        TypeValue::union2(TypeValue::number(), TypeValue::undefined())
    );
    assert_eq!(
        array_method(&nums(), "some", &[TypeValue::Unknown], &mut invoke)
            .unwrap()
            .value,
        TypeValue::boolean()
    );
    assert_eq!(
        array_method(&nums(), "includes", &[num(1.0)], &mut invoke).unwrap().value,
        TypeValue::boolean()
    );
    assert_eq!(
        array_method(&nums(), "join", &[], &mut invoke).unwrap().value,
        TypeValue::string()
    );
}

#[test]
fn test_array_push_widens_element() {
    let mut invoke =
        |_: &TypeValue, _: &[TypeValue]| OpResult::value(TypeValue::Unknown);
    let out = array_method(&nums(), "push", &[TypeValue::string_lit("x")], &mut invoke).unwrap();
    assert_eq!(out.value, TypeValue::number());
    assert_eq!(
        out.updated_receiver,
        Some(TypeValue::Array(Box::new(union_of(vec![
            TypeValue::number(),
            TypeValue::string_lit("x"),
        ]))))
    );
}

// =============================================================================
// length
// =============================================================================

#[test]
fn test_length_property() {
    let recv = tuple(vec![num(1.0), num(2.0), num(3.0)]);
    assert_eq!(array_property(&recv, "length"), Some(num(3.0)));
    assert_eq!(array_property(&nums(), "length"), Some(TypeValue::number()));
    assert_eq!(array_property(&recv, "size"), None);
}
