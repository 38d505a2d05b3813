//! Union normalisation and widening.
//!
//! All unions go through [`union_of`]; nothing else constructs
//! `TypeValue::Union`. The normal form has no nested unions, no `Never`
//! members, no duplicates (by structural equality), collapses singletons,
//! and absorbs to `Unknown` when any member is `Unknown`.
//!
//! Simplification deliberately does *not* absorb a literal into its
//! primitive (`2 | number` stays precise): per-case results exist to be
//! shown, and collapsing early destroys the distinction the cases asked
//! for. Absorption happens only when a union exceeds the cardinality cap.

use std::rc::Rc;

use smallvec::SmallVec;

use jsty_common::limits::UNION_CARDINALITY_CAP;

use crate::equality::type_values_equal;
use crate::types::{LiteralValue, PrimitiveKind, TypeValue};

/// Most unions stay tiny; flatten on the stack.
type MemberBuf = SmallVec<[TypeValue; 4]>;

/// Build the normalised union of `members` under the default cardinality
/// cap.
pub fn union_of(members: Vec<TypeValue>) -> TypeValue {
    union_with_cap(members, UNION_CARDINALITY_CAP)
}

/// Build the normalised union of `members`; past `cap` members, widen
/// literals to their primitive bases and re-simplify, and past that give
/// up to `Unknown`.
pub fn union_with_cap(members: Vec<TypeValue>, cap: usize) -> TypeValue {
    let mut flat = MemberBuf::new();
    for member in members {
        match member {
            TypeValue::Union(inner) => {
                for m in inner.iter() {
                    if push_member(&mut flat, m.clone()) {
                        return TypeValue::Unknown;
                    }
                }
            }
            other => {
                if push_member(&mut flat, other) {
                    return TypeValue::Unknown;
                }
            }
        }
    }

    match flat.len() {
        0 => TypeValue::Never,
        1 => flat.pop().unwrap_or(TypeValue::Never),
        n if n > cap => {
            tracing::trace!(members = n, cap, "union over cardinality cap, widening");
            let widened: Vec<TypeValue> = flat.into_iter().map(widen).collect();
            let rewidened = union_unchecked(widened);
            match rewidened {
                TypeValue::Union(members) if members.len() > cap => TypeValue::Unknown,
                other => other,
            }
        }
        _ => TypeValue::Union(Rc::new(flat.into_vec())),
    }
}

/// Push one non-union member, deduplicating. Returns true when the member
/// absorbs the whole union to `Unknown`.
fn push_member(flat: &mut MemberBuf, member: TypeValue) -> bool {
    match member {
        TypeValue::Unknown => true,
        TypeValue::Never => false,
        other => {
            if !flat.iter().any(|existing| type_values_equal(existing, &other)) {
                flat.push(other);
            }
            false
        }
    }
}

/// Union without the cardinality fallback, for internal re-simplification.
fn union_unchecked(members: Vec<TypeValue>) -> TypeValue {
    let mut flat = MemberBuf::new();
    for member in members {
        match member {
            TypeValue::Union(inner) => {
                for m in inner.iter() {
                    if push_member(&mut flat, m.clone()) {
                        return TypeValue::Unknown;
                    }
                }
            }
            other => {
                if push_member(&mut flat, other) {
                    return TypeValue::Unknown;
                }
            }
        }
    }
    match flat.len() {
        0 => TypeValue::Never,
        1 => flat.pop().unwrap_or(TypeValue::Never),
        _ => TypeValue::Union(Rc::new(flat.into_vec())),
    }
}

/// Widen literals to their primitive bases, recursively through
/// refinements, unions, arrays, tuples, and promises. `null` and
/// `undefined` have no wider primitive and stay as they are; objects keep
/// their shape with widened property types left untouched (property
/// widening is the loop join's business, not general widening).
pub fn widen(ty: TypeValue) -> TypeValue {
    match ty {
        TypeValue::Literal(v) => match v.primitive() {
            Some(kind) => TypeValue::Primitive(kind),
            None => TypeValue::Literal(v),
        },
        TypeValue::Refined(refined) => widen(*refined.base),
        TypeValue::Union(members) => {
            union_unchecked(members.iter().map(|m| widen(m.clone())).collect())
        }
        TypeValue::Array(elem) => TypeValue::Array(Box::new(widen(*elem))),
        TypeValue::Tuple(elems) => TypeValue::Tuple(elems.into_iter().map(widen).collect()),
        TypeValue::Promise(inner) => TypeValue::Promise(Box::new(widen(*inner))),
        other => other,
    }
}

/// Aggressive widening used when a loop fixed-point refuses to converge:
/// in addition to [`widen`], tuples collapse to homogeneous arrays so
/// element-appending loops reach a fixed shape.
pub fn widen_loop(ty: TypeValue) -> TypeValue {
    match ty {
        TypeValue::Tuple(elems) => {
            let elem = union_of(elems.into_iter().map(widen_loop).collect());
            TypeValue::Array(Box::new(elem))
        }
        TypeValue::Array(elem) => TypeValue::Array(Box::new(widen_loop(*elem))),
        TypeValue::Union(members) => {
            union_unchecked(members.iter().map(|m| widen_loop(m.clone())).collect())
        }
        other => widen(other),
    }
}

/// The least common super-primitive of every member, when one exists.
/// Used by diagnostics and by the cap fallback tests.
pub fn common_primitive(ty: &TypeValue) -> Option<PrimitiveKind> {
    let mut found: Option<PrimitiveKind> = None;
    for member in ty.members() {
        let kind = match member {
            TypeValue::Primitive(kind) => *kind,
            TypeValue::Literal(v) => v.primitive()?,
            TypeValue::Refined(refined) => common_primitive(&refined.base)?,
            _ => return None,
        };
        match found {
            None => found = Some(kind),
            Some(prev) if prev == kind => {}
            Some(_) => return None,
        }
    }
    found
}

/// Remove `undefined` from a union, for optional-chain style narrowing.
pub fn without_undefined(ty: &TypeValue) -> TypeValue {
    match ty {
        TypeValue::Union(members) => union_of(
            members
                .iter()
                .filter(|m| !matches!(m, TypeValue::Literal(LiteralValue::Undefined)))
                .cloned()
                .collect(),
        ),
        TypeValue::Literal(LiteralValue::Undefined) => TypeValue::Never,
        other => other.clone(),
    }
}
