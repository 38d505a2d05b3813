use super::*;
use crate::subtype::{SubtypeChecker, class_extends, is_subtype_of};
use crate::types::{InstanceValue, ObjectIdGen, ObjectRef, TypeValue};

fn instance(idgen: &ObjectIdGen, class_name: &str) -> TypeValue {
    TypeValue::Instance(InstanceValue {
        class_name: class_name.to_string(),
        ancestry: Vec::new(),
        data: ObjectRef::new(idgen, indexmap::IndexMap::new()),
    })
}

// =============================================================================
// Lattice Bounds
// =============================================================================

#[test]
fn test_top_and_bottom() {
    let samples = [
        TypeValue::number_lit(1.0),
        TypeValue::string(),
        TypeValue::Tuple(vec![]),
        TypeValue::Unknown,
        TypeValue::Never,
    ];
    for ty in &samples {
        assert!(is_subtype_of(ty, &TypeValue::Unknown), "{ty} ≤ unknown");
        assert!(is_subtype_of(&TypeValue::Never, ty), "never ≤ {ty}");
    }
    assert!(!is_subtype_of(&TypeValue::Unknown, &TypeValue::number()));
    assert!(!is_subtype_of(&TypeValue::number(), &TypeValue::Never));
}

#[test]
fn test_reflexive() {
    let samples = [
        TypeValue::number_lit(3.0),
        TypeValue::string_lit("x"),
        TypeValue::boolean(),
        TypeValue::Array(Box::new(TypeValue::number())),
        TypeValue::union2(TypeValue::number(), TypeValue::string()),
    ];
    for ty in &samples {
        assert!(is_subtype_of(ty, ty), "{ty} ≤ {ty}");
    }
}

#[test]
fn test_transitive_through_literal_primitive_union() {
    let lit = TypeValue::number_lit(1.0);
    let prim = TypeValue::number();
    let union = TypeValue::union2(TypeValue::number(), TypeValue::string());
    assert!(is_subtype_of(&lit, &prim));
    assert!(is_subtype_of(&prim, &union));
    assert!(is_subtype_of(&lit, &union));
}

// =============================================================================
// Literals and Primitives
// =============================================================================

#[test]
fn test_literal_under_its_primitive() {
    assert!(is_subtype_of(&TypeValue::number_lit(5.0), &TypeValue::number()));
    assert!(is_subtype_of(&TypeValue::string_lit("a"), &TypeValue::string()));
    assert!(!is_subtype_of(&TypeValue::number_lit(5.0), &TypeValue::string()));
    // null is not a member of any primitive
    assert!(!is_subtype_of(&TypeValue::null(), &TypeValue::number()));
}

// =============================================================================
// Objects
// =============================================================================

#[test]
fn test_object_width_subtyping() {
    let idgen = ObjectIdGen::new();
    let mut wide_props = indexmap::IndexMap::new();
    wide_props.insert("a".to_string(), TypeValue::number_lit(1.0));
    wide_props.insert("b".to_string(), TypeValue::string());
    let wide = TypeValue::Object(ObjectRef::new(&idgen, wide_props));

    let mut narrow_props = indexmap::IndexMap::new();
    narrow_props.insert("a".to_string(), TypeValue::number());
    let narrow = TypeValue::Object(ObjectRef::new(&idgen, narrow_props));

    // More properties, each a subtype: wide ≤ narrow
    assert!(is_subtype_of(&wide, &narrow));
    assert!(!is_subtype_of(&narrow, &wide));
}

// =============================================================================
// Tuples and Arrays
// =============================================================================

#[test]
fn test_tuple_subtyping() {
    let t1 = TypeValue::Tuple(vec![TypeValue::number_lit(1.0), TypeValue::string_lit("x")]);
    let t2 = TypeValue::Tuple(vec![TypeValue::number(), TypeValue::string()]);
    assert!(is_subtype_of(&t1, &t2));
    assert!(!is_subtype_of(&t2, &t1));

    // Length must match tuple-to-tuple
    let short = TypeValue::Tuple(vec![TypeValue::number()]);
    assert!(!is_subtype_of(&short, &t2));
}

#[test]
fn test_tuple_under_array() {
    let tuple = TypeValue::Tuple(vec![TypeValue::number_lit(1.0), TypeValue::number_lit(2.0)]);
    let nums = TypeValue::Array(Box::new(TypeValue::number()));
    let strs = TypeValue::Array(Box::new(TypeValue::string()));
    assert!(is_subtype_of(&tuple, &nums));
    assert!(!is_subtype_of(&tuple, &strs));
    assert!(!is_subtype_of(&nums, &tuple));
}

// =============================================================================
// Instances and the Error Hierarchy
// =============================================================================

#[test]
fn test_error_hierarchy() {
    assert!(class_extends("RangeError", "Error"));
    assert!(class_extends("TypeError", "Error"));
    assert!(class_extends("Error", "Error"));
    assert!(!class_extends("Error", "RangeError"));
    assert!(!class_extends("RangeError", "TypeError"));
}

#[test]
fn test_instance_subtyping() {
    let idgen = ObjectIdGen::new();
    let range_error = instance(&idgen, "RangeError");
    let error = instance(&idgen, "Error");
    assert!(is_subtype_of(&range_error, &error));
    assert!(!is_subtype_of(&error, &range_error));
}

// =============================================================================
// Unions
// =============================================================================

#[test]
fn test_union_subtyping_rules() {
    let num_or_str = TypeValue::union2(TypeValue::number(), TypeValue::string());
    let lits = TypeValue::union2(TypeValue::number_lit(1.0), TypeValue::string_lit("a"));

    // Every member ≤ target
    assert!(is_subtype_of(&lits, &num_or_str));
    // Member of the union
    assert!(is_subtype_of(&TypeValue::number(), &num_or_str));
    assert!(!is_subtype_of(&num_or_str, &TypeValue::number()));
}

// =============================================================================
// Refinements
// =============================================================================

#[test]
fn test_literal_under_template_refinement() {
    let template = TemplateString::build(vec![
        TemplatePart::Text("0x".to_string()),
        TemplatePart::Dynamic(TypeValue::string()),
    ]);
    let mut checker = SubtypeChecker::new();
    assert!(checker.is_subtype_of(&TypeValue::string_lit("0xff"), &template));
    assert!(!checker.is_subtype_of(&TypeValue::string_lit("yes"), &template));
    // The refined set is inside its base
    assert!(checker.is_subtype_of(&template, &TypeValue::string()));
}

#[test]
fn test_range_refinement_membership() {
    let range = NumericRange::build(Some(0.0), Some(10.0), true);
    assert!(is_subtype_of(&TypeValue::number_lit(5.0), &range));
    assert!(!is_subtype_of(&TypeValue::number_lit(11.0), &range));
    assert!(!is_subtype_of(&TypeValue::number_lit(2.5), &range));
    assert!(is_subtype_of(&range, &TypeValue::number()));
}
