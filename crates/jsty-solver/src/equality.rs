//! Structural equality of type values.
//!
//! Used by union deduplication and by tests. Objects compare identity
//! first (same id means same object, cheaply equal), then structurally
//! with a depth guard so cyclic property graphs cannot hang deduplication.
//! Functions and classes compare by identity only.

use jsty_common::limits::MAX_EQUALITY_DEPTH;

use crate::types::{InstanceValue, ObjectRef, TypeValue};

pub fn type_values_equal(a: &TypeValue, b: &TypeValue) -> bool {
    equal_at_depth(a, b, 0)
}

fn equal_at_depth(a: &TypeValue, b: &TypeValue, depth: u32) -> bool {
    if depth > MAX_EQUALITY_DEPTH {
        // Conservative: an undecided comparison keeps a duplicate union
        // member at worst.
        return false;
    }
    match (a, b) {
        (TypeValue::Literal(x), TypeValue::Literal(y)) => x == y,
        (TypeValue::Primitive(x), TypeValue::Primitive(y)) => x == y,
        (TypeValue::Refined(x), TypeValue::Refined(y)) => {
            x.refinement.name() == y.refinement.name()
                && x.refinement.meta_render() == y.refinement.meta_render()
                && equal_at_depth(&x.base, &y.base, depth + 1)
        }
        (TypeValue::Object(x), TypeValue::Object(y)) => objects_equal(x, y, depth),
        (TypeValue::Array(x), TypeValue::Array(y)) => equal_at_depth(x, y, depth + 1),
        (TypeValue::Tuple(xs), TypeValue::Tuple(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| equal_at_depth(x, y, depth + 1))
        }
        (TypeValue::Function(x), TypeValue::Function(y)) => x.id == y.id,
        (TypeValue::Class(x), TypeValue::Class(y)) => std::rc::Rc::ptr_eq(x, y),
        (TypeValue::Promise(x), TypeValue::Promise(y)) => equal_at_depth(x, y, depth + 1),
        (TypeValue::Instance(x), TypeValue::Instance(y)) => instances_equal(x, y, depth),
        (TypeValue::Union(xs), TypeValue::Union(ys)) => {
            // Unions are normalised, but member order is not canonical:
            // compare as sets.
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|x| ys.iter().any(|y| equal_at_depth(x, y, depth + 1)))
        }
        (TypeValue::Never, TypeValue::Never) => true,
        (TypeValue::Unknown, TypeValue::Unknown) => true,
        _ => false,
    }
}

fn objects_equal(a: &ObjectRef, b: &ObjectRef, depth: u32) -> bool {
    if a.id() == b.id() {
        return true;
    }
    let a = a.0.borrow();
    let b = b.0.borrow();
    if a.props.len() != b.props.len() {
        return false;
    }
    a.props.iter().all(|(key, value)| {
        b.props
            .get(key)
            .is_some_and(|other| equal_at_depth(value, other, depth + 1))
    })
}

fn instances_equal(a: &InstanceValue, b: &InstanceValue, depth: u32) -> bool {
    a.class_name == b.class_name && objects_equal(&a.data, &b.data, depth)
}

impl PartialEq for TypeValue {
    fn eq(&self, other: &Self) -> bool {
        type_values_equal(self, other)
    }
}
