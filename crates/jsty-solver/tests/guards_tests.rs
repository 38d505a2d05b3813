use super::*;
use crate::guards::{
    TypeGuard, apply_guard, falsy_part, non_nullish_part, truthy_part,
};
use crate::types::{LiteralValue, ObjectIdGen, ObjectRef, TagSet, TypeValue};

fn num_or_str() -> TypeValue {
    TypeValue::union2(TypeValue::number(), TypeValue::string())
}

// =============================================================================
// typeof Guards
// =============================================================================

#[test]
fn test_typeof_narrows_union_to_exact_tag() {
    let idgen = ObjectIdGen::new();
    let guard = TypeGuard::TypeofTag(TagSet::NUMBER);
    let narrowed = apply_guard(&num_or_str(), &guard, true, &idgen);
    assert_eq!(narrowed, TypeValue::number());
    assert_eq!(narrowed.tag_set(), TagSet::NUMBER);

    let dropped = apply_guard(&num_or_str(), &guard, false, &idgen);
    assert_eq!(dropped, TypeValue::string());
}

#[test]
fn test_typeof_on_unknown_substitutes_primitive() {
    let idgen = ObjectIdGen::new();
    let guard = TypeGuard::TypeofTag(TagSet::STRING);
    assert_eq!(
        apply_guard(&TypeValue::Unknown, &guard, true, &idgen),
        TypeValue::string()
    );
    // The false branch of unknown stays unknown
    assert_eq!(
        apply_guard(&TypeValue::Unknown, &guard, false, &idgen),
        TypeValue::Unknown
    );
}

#[test]
fn test_typeof_object_keeps_null() {
    let idgen = ObjectIdGen::new();
    let obj = TypeValue::Object(ObjectRef::new(&idgen, indexmap::IndexMap::new()));
    let union = union_of(vec![obj.clone(), TypeValue::null(), TypeValue::number()]);
    let guard = TypeGuard::TypeofTag(TagSet::OBJECT);
    let narrowed = apply_guard(&union, &guard, true, &idgen);
    // typeof null === "object": both survive
    assert_eq!(narrowed, union_of(vec![obj, TypeValue::null()]));
}

// =============================================================================
// Literal Equality Guards
// =============================================================================

#[test]
fn test_literal_eq_keeps_matching_member() {
    let idgen = ObjectIdGen::new();
    let union = union_of(vec![
        TypeValue::number_lit(1.0),
        TypeValue::number_lit(2.0),
        TypeValue::string_lit("x"),
    ]);
    let guard = TypeGuard::LiteralEq(LiteralValue::Number(2.0));
    assert_eq!(
        apply_guard(&union, &guard, true, &idgen),
        TypeValue::number_lit(2.0)
    );
    assert_eq!(
        apply_guard(&union, &guard, false, &idgen),
        union_of(vec![TypeValue::number_lit(1.0), TypeValue::string_lit("x")])
    );
}

#[test]
fn test_literal_eq_substitutes_into_abstract() {
    let idgen = ObjectIdGen::new();
    let guard = TypeGuard::LiteralEq(LiteralValue::Number(7.0));
    assert_eq!(
        apply_guard(&TypeValue::number(), &guard, true, &idgen),
        TypeValue::number_lit(7.0)
    );
    // Cannot subtract one literal from the whole primitive
    assert_eq!(
        apply_guard(&TypeValue::number(), &guard, false, &idgen),
        TypeValue::number()
    );
    // Contradiction narrows to never
    assert_eq!(
        apply_guard(&TypeValue::string(), &guard, true, &idgen),
        TypeValue::Never
    );
}

#[test]
fn test_null_and_undefined_guards() {
    let idgen = ObjectIdGen::new();
    let union = union_of(vec![TypeValue::string(), TypeValue::null()]);
    let guard = TypeGuard::LiteralEq(LiteralValue::Null);
    assert_eq!(apply_guard(&union, &guard, true, &idgen), TypeValue::null());
    assert_eq!(apply_guard(&union, &guard, false, &idgen), TypeValue::string());
}

// =============================================================================
// instanceof Guards
// =============================================================================

#[test]
fn test_instanceof_filters_and_substitutes() {
    let idgen = ObjectIdGen::new();
    let range_error =
        crate::ops_object::error_instance(&idgen, "RangeError", TypeValue::string_lit("x"));
    let union = union_of(vec![range_error.clone(), TypeValue::number()]);

    let guard = TypeGuard::InstanceofClass("RangeError".to_string());
    assert_eq!(apply_guard(&union, &guard, true, &idgen), range_error);
    assert_eq!(apply_guard(&union, &guard, false, &idgen), TypeValue::number());

    // Subclass matches a superclass test
    let err_guard = TypeGuard::InstanceofClass("Error".to_string());
    assert_eq!(apply_guard(&union, &err_guard, true, &idgen), range_error);

    // No matching member: substitute a bare instance
    let narrowed = apply_guard(&TypeValue::number(), &err_guard, true, &idgen);
    match &narrowed {
        TypeValue::Instance(instance) => assert_eq!(instance.class_name, "Error"),
        other => panic!("expected instance, got {other}"),
    }
}

// =============================================================================
// Array.isArray Guards
// =============================================================================

#[test]
fn test_is_array_guard() {
    let idgen = ObjectIdGen::new();
    let tuple = TypeValue::Tuple(vec![TypeValue::number_lit(1.0)]);
    let union = union_of(vec![tuple.clone(), TypeValue::string()]);
    let guard = TypeGuard::IsArray;
    assert_eq!(apply_guard(&union, &guard, true, &idgen), tuple);
    assert_eq!(apply_guard(&union, &guard, false, &idgen), TypeValue::string());
    assert_eq!(
        apply_guard(&TypeValue::Unknown, &guard, true, &idgen),
        TypeValue::Array(Box::new(TypeValue::Unknown))
    );
}

// =============================================================================
// Truthiness Guards
// =============================================================================

#[test]
fn test_truthiness_subtracts_falsy_literals() {
    let idgen = ObjectIdGen::new();
    let union = union_of(vec![
        TypeValue::string_lit("x"),
        TypeValue::string_lit(""),
        TypeValue::null(),
        TypeValue::number_lit(0.0),
    ]);
    assert_eq!(truthy_part(&union, &idgen), TypeValue::string_lit("x"));
    assert_eq!(
        falsy_part(&union, &idgen),
        union_of(vec![
            TypeValue::string_lit(""),
            TypeValue::null(),
            TypeValue::number_lit(0.0),
        ])
    );
}

#[test]
fn test_truthiness_faces_of_primitives() {
    let idgen = ObjectIdGen::new();
    assert_eq!(
        falsy_part(&TypeValue::number(), &idgen),
        TypeValue::union2(TypeValue::number_lit(0.0), TypeValue::number_lit(f64::NAN))
    );
    assert_eq!(falsy_part(&TypeValue::string(), &idgen), TypeValue::string_lit(""));
    assert_eq!(
        truthy_part(&TypeValue::boolean(), &idgen),
        TypeValue::bool_lit(true)
    );
    assert_eq!(
        falsy_part(&TypeValue::boolean(), &idgen),
        TypeValue::bool_lit(false)
    );
}

// =============================================================================
// in-Operator and Discriminant Guards
// =============================================================================

#[test]
fn test_has_property_guard() {
    let idgen = ObjectIdGen::new();
    let mut props = indexmap::IndexMap::new();
    props.insert("kind".to_string(), TypeValue::string_lit("circle"));
    let with_kind = TypeValue::Object(ObjectRef::new(&idgen, props));
    let without = TypeValue::Object(ObjectRef::new(&idgen, indexmap::IndexMap::new()));
    let union = union_of(vec![with_kind.clone(), without.clone()]);

    let guard = TypeGuard::HasProperty("kind".to_string());
    assert_eq!(apply_guard(&union, &guard, true, &idgen), with_kind);
    assert_eq!(apply_guard(&union, &guard, false, &idgen), without);
}

#[test]
fn test_discriminant_guard() {
    let idgen = ObjectIdGen::new();
    let mut circle_props = indexmap::IndexMap::new();
    circle_props.insert("kind".to_string(), TypeValue::string_lit("circle"));
    circle_props.insert("radius".to_string(), TypeValue::number());
    let circle = TypeValue::Object(ObjectRef::new(&idgen, circle_props));

    let mut square_props = indexmap::IndexMap::new();
    square_props.insert("kind".to_string(), TypeValue::string_lit("square"));
    let square = TypeValue::Object(ObjectRef::new(&idgen, square_props));

    let union = union_of(vec![circle.clone(), square.clone()]);
    let guard = TypeGuard::PropEq("kind".to_string(), LiteralValue::String("circle".to_string()));
    assert_eq!(apply_guard(&union, &guard, true, &idgen), circle);
    assert_eq!(apply_guard(&union, &guard, false, &idgen), square);
}

// =============================================================================
// Nullish Faces
// =============================================================================

#[test]
fn test_non_nullish_part() {
    let union = union_of(vec![
        TypeValue::string(),
        TypeValue::null(),
        TypeValue::undefined(),
    ]);
    assert_eq!(non_nullish_part(&union), TypeValue::string());
    assert_eq!(non_nullish_part(&TypeValue::null()), TypeValue::Never);
}
