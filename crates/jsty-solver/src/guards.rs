//! Type-guard algebra: narrowing a type value under an assumed condition.
//!
//! A `TypeGuard` is the semantic payload of a recognised test expression
//! (`typeof x === "T"`, `x === L`, `x instanceof C`, `Array.isArray(x)`,
//! `"k" in x`, `x.k === L`, bare truthiness). The evaluator's narrowing
//! pass matches AST shapes into guards; this module applies a guard to a
//! type value for the assumed-true and assumed-false branches.

use crate::ops::strict_equals;
use crate::simplify::union_of;
use crate::subtype::literal_member_of;
use crate::types::{
    InstanceValue, LiteralValue, ObjectIdGen, ObjectRef, TagSet, Truthiness, TypeValue,
};

#[derive(Clone, Debug)]
pub enum TypeGuard {
    /// `typeof x === tag`
    TypeofTag(TagSet),
    /// `x === L`
    LiteralEq(LiteralValue),
    /// `x instanceof C`
    InstanceofClass(String),
    /// `Array.isArray(x)`
    IsArray,
    /// Bare `x` in test position
    Truthy,
    /// `"k" in x`
    HasProperty(String),
    /// `x.k === L`: discriminant narrowing
    PropEq(String, LiteralValue),
}

/// Narrow `ty` under `guard`, assumed to hold (`assume = true`) or to
/// fail (`assume = false`).
pub fn apply_guard(
    ty: &TypeValue,
    guard: &TypeGuard,
    assume: bool,
    idgen: &ObjectIdGen,
) -> TypeValue {
    let members: Vec<TypeValue> = ty.members().cloned().collect();
    let narrowed: Vec<TypeValue> = members
        .iter()
        .filter_map(|member| narrow_member(member, guard, assume))
        .collect();

    // Contradictory-looking guards still pin the tested value: an
    // equality against a literal the current type does not mention
    // substitutes that literal, and an instanceof with no matching
    // member substitutes a bare instance of the class.
    if narrowed.is_empty() && assume {
        match guard {
            TypeGuard::LiteralEq(lit) => {
                let admitted = members.iter().any(|m| literal_member_of(lit, m))
                    || matches!(ty, TypeValue::Unknown);
                if admitted {
                    return TypeValue::Literal(lit.clone());
                }
                return TypeValue::Never;
            }
            TypeGuard::InstanceofClass(class_name) => {
                return TypeValue::Instance(InstanceValue {
                    class_name: class_name.clone(),
                    ancestry: Vec::new(),
                    data: ObjectRef::new(idgen, indexmap::IndexMap::new()),
                });
            }
            _ => {}
        }
    }
    union_of(narrowed)
}

/// Narrow a single non-union member; `None` drops it from the branch.
fn narrow_member(member: &TypeValue, guard: &TypeGuard, assume: bool) -> Option<TypeValue> {
    match guard {
        TypeGuard::TypeofTag(tag) => narrow_typeof(member, *tag, assume),
        TypeGuard::LiteralEq(lit) => narrow_literal_eq(member, lit, assume),
        TypeGuard::InstanceofClass(class_name) => {
            let matches = match member {
                TypeValue::Instance(instance) => {
                    instance.is_instance_of(class_name)
                        || crate::subtype::class_extends(&instance.class_name, class_name)
                }
                TypeValue::Unknown => return Some(member.clone()),
                _ => false,
            };
            if matches == assume {
                Some(member.clone())
            } else {
                None
            }
        }
        TypeGuard::IsArray => {
            let arrayish = matches!(member, TypeValue::Array(_) | TypeValue::Tuple(_));
            match (arrayish, assume, member) {
                (_, true, TypeValue::Unknown) => {
                    Some(TypeValue::Array(Box::new(TypeValue::Unknown)))
                }
                (_, false, TypeValue::Unknown) => Some(member.clone()),
                (hit, want, _) if hit == want => Some(member.clone()),
                _ => None,
            }
        }
        TypeGuard::Truthy => narrow_truthy(member, assume),
        TypeGuard::HasProperty(name) => narrow_has_property(member, name, assume),
        TypeGuard::PropEq(name, lit) => narrow_prop_eq(member, name, lit, assume),
    }
}

fn narrow_typeof(member: &TypeValue, tag: TagSet, assume: bool) -> Option<TypeValue> {
    let tags = member.tag_set();
    if assume {
        if tags == tag {
            return Some(member.clone());
        }
        if !tags.intersects(tag) {
            return None;
        }
        // Mixed tags: only `unknown` among non-union members. Substitute
        // the tag's representative where one exists.
        Some(if tag == TagSet::NUMBER {
            TypeValue::number()
        } else if tag == TagSet::STRING {
            TypeValue::string()
        } else if tag == TagSet::BOOLEAN {
            TypeValue::boolean()
        } else if tag == TagSet::BIGINT {
            TypeValue::Primitive(crate::types::PrimitiveKind::BigInt)
        } else if tag == TagSet::SYMBOL {
            TypeValue::Primitive(crate::types::PrimitiveKind::Symbol)
        } else if tag == TagSet::UNDEFINED {
            TypeValue::undefined()
        } else {
            // "object" / "function": no faithful representative; keep.
            member.clone()
        })
    } else {
        if tags == tag {
            return None;
        }
        Some(member.clone())
    }
}

fn narrow_literal_eq(member: &TypeValue, lit: &LiteralValue, assume: bool) -> Option<TypeValue> {
    match member.as_literal() {
        Some(existing) => {
            let equal = strict_equals(existing, lit);
            if equal == assume {
                Some(member.clone())
            } else {
                None
            }
        }
        None => {
            if assume {
                // An abstract member admitting the literal pins to it;
                // the union-level fallback handles full substitution.
                if literal_member_of(lit, member) {
                    Some(TypeValue::Literal(lit.clone()))
                } else {
                    None
                }
            } else {
                // Cannot subtract one literal from an abstract member.
                Some(member.clone())
            }
        }
    }
}

fn narrow_truthy(member: &TypeValue, assume: bool) -> Option<TypeValue> {
    match member.truthiness() {
        Truthiness::True => {
            if assume {
                Some(member.clone())
            } else {
                None
            }
        }
        Truthiness::False => {
            if assume {
                None
            } else {
                Some(member.clone())
            }
        }
        Truthiness::Unknown => {
            if assume {
                // Boolean tightens to `true`; other primitives cannot
                // shed their falsy members without refinement support.
                if matches!(
                    member,
                    TypeValue::Primitive(crate::types::PrimitiveKind::Boolean)
                ) {
                    Some(TypeValue::bool_lit(true))
                } else {
                    Some(member.clone())
                }
            } else {
                Some(falsy_face(member))
            }
        }
    }
}

/// The falsy values an abstract member can take.
fn falsy_face(member: &TypeValue) -> TypeValue {
    match member {
        TypeValue::Primitive(crate::types::PrimitiveKind::Number) => TypeValue::union2(
            TypeValue::number_lit(0.0),
            TypeValue::number_lit(f64::NAN),
        ),
        TypeValue::Primitive(crate::types::PrimitiveKind::String) => TypeValue::string_lit(""),
        TypeValue::Primitive(crate::types::PrimitiveKind::Boolean) => TypeValue::bool_lit(false),
        TypeValue::Unknown => union_of(falsy_literals()),
        other => other.clone(),
    }
}

/// The six falsy singletons this model tracks.
pub fn falsy_literals() -> Vec<TypeValue> {
    vec![
        TypeValue::null(),
        TypeValue::undefined(),
        TypeValue::number_lit(0.0),
        TypeValue::string_lit(""),
        TypeValue::bool_lit(false),
        TypeValue::number_lit(f64::NAN),
    ]
}

fn narrow_has_property(member: &TypeValue, name: &str, assume: bool) -> Option<TypeValue> {
    let decided = match member.refined_base() {
        TypeValue::Object(obj) => Some(obj.has(name)),
        TypeValue::Instance(instance) => Some(instance.data.has(name)),
        TypeValue::Tuple(elems) => Some(
            name.parse::<usize>()
                .map(|i| i < elems.len())
                .unwrap_or(name == "length"),
        ),
        TypeValue::Unknown | TypeValue::Array(_) => None,
        // Primitives have no own properties in this model.
        _ => Some(false),
    };
    match decided {
        Some(has) if has == assume => Some(member.clone()),
        Some(_) => None,
        None => Some(member.clone()),
    }
}

fn narrow_prop_eq(
    member: &TypeValue,
    name: &str,
    lit: &LiteralValue,
    assume: bool,
) -> Option<TypeValue> {
    let prop = match member.refined_base() {
        TypeValue::Object(obj) => obj.get(name),
        TypeValue::Instance(instance) => instance.data.get(name),
        TypeValue::Unknown => return Some(member.clone()),
        _ => None,
    };
    let Some(prop) = prop else {
        // No such property: `x.k` is undefined, equal to the literal only
        // if the literal is undefined.
        let is_undefined_probe = matches!(lit, LiteralValue::Undefined);
        return if is_undefined_probe == assume {
            Some(member.clone())
        } else {
            None
        };
    };
    match prop.as_literal() {
        Some(existing) => {
            let equal = strict_equals(existing, lit);
            if equal == assume {
                Some(member.clone())
            } else {
                None
            }
        }
        None => {
            if assume && !literal_member_of(lit, &prop) {
                return None;
            }
            Some(member.clone())
        }
    }
}

// =============================================================================
// Logical-Operator Faces
// =============================================================================

/// The part of `ty` that survives a truthiness test, for `&&`/`||`
/// result shapes.
pub fn truthy_part(ty: &TypeValue, idgen: &ObjectIdGen) -> TypeValue {
    apply_guard(ty, &TypeGuard::Truthy, true, idgen)
}

pub fn falsy_part(ty: &TypeValue, idgen: &ObjectIdGen) -> TypeValue {
    apply_guard(ty, &TypeGuard::Truthy, false, idgen)
}

/// `ty` minus `null` and `undefined`, for `??` result shapes and
/// optional chains.
pub fn non_nullish_part(ty: &TypeValue) -> TypeValue {
    union_of(
        ty.members()
            .filter(|m| m.nullishness() != Truthiness::True)
            .cloned()
            .collect(),
    )
}

/// The nullish face of `ty`: what `??` would discard.
pub fn nullish_part(ty: &TypeValue) -> TypeValue {
    union_of(
        ty.members()
            .filter_map(|m| match m.nullishness() {
                Truthiness::True => Some(m.clone()),
                Truthiness::False => None,
                Truthiness::Unknown => Some(TypeValue::union2(
                    TypeValue::null(),
                    TypeValue::undefined(),
                )),
            })
            .collect(),
    )
}
