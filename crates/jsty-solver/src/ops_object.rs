//! Member access, `Object.*` statics, error construction, and the
//! completion surface.
//!
//! Member access is where the inferred-exception story starts: reading a
//! property off a nullish receiver contributes a `TypeError` instance to
//! the throw effect instead of raising anything host-side. Optional
//! chaining suppresses that effect and unions `undefined` in.

use serde::Serialize;

use crate::ops::OpResult;
use crate::refine::Dispatch;
use crate::simplify::union_of;
use crate::types::{
    InstanceValue, LiteralValue, ObjectIdGen, ObjectRef, PrimitiveKind, TypeValue,
};

// =============================================================================
// Error Construction
// =============================================================================

/// Build an `Instance` of a built-in Error class with a `message`
/// property.
pub fn error_instance(
    idgen: &ObjectIdGen,
    class_name: &str,
    message: TypeValue,
) -> TypeValue {
    let mut props = indexmap::IndexMap::new();
    props.insert("message".to_string(), message);
    TypeValue::Instance(InstanceValue {
        class_name: class_name.to_string(),
        ancestry: Vec::new(),
        data: ObjectRef::new(idgen, props),
    })
}

fn nullish_access_error(idgen: &ObjectIdGen, key: &TypeValue, receiver: &str) -> TypeValue {
    let key_text = match key.as_string_lit() {
        Some(name) => format!("reading '{name}'"),
        None => "reading".to_string(),
    };
    error_instance(
        idgen,
        "TypeError",
        TypeValue::string_lit(format!(
            "Cannot read properties of {receiver} ({key_text})"
        )),
    )
}

// =============================================================================
// Member Access
// =============================================================================

/// Read `recv[key]` / `recv.key`. The key is a pre-evaluated type value:
/// a string literal for fixed names, a number literal for decided
/// indices, anything else for abstract access. `optional` marks `?.`
/// access, which converts the nullish throw into `undefined`.
pub fn member_access(
    recv: &TypeValue,
    key: &TypeValue,
    idgen: &ObjectIdGen,
    optional: bool,
) -> OpResult {
    if let TypeValue::Union(members) = recv {
        let mut values = Vec::new();
        let mut throws = Vec::new();
        for member in members.iter() {
            let result = member_access(member, key, idgen, optional);
            values.push(result.value);
            throws.push(result.throws);
        }
        return OpResult {
            value: union_of(values),
            throws: union_of(throws),
        };
    }

    // Nullish receivers: the throw effect, or `undefined` under `?.`.
    if let TypeValue::Literal(lit) = recv
        && lit.is_nullish()
    {
        if optional {
            return OpResult::value(TypeValue::undefined());
        }
        let receiver = if matches!(lit, LiteralValue::Null) {
            "null"
        } else {
            "undefined"
        };
        return OpResult::throws(nullish_access_error(idgen, key, receiver));
    }

    // Refinement property hooks come before the base's own surface.
    if let TypeValue::Refined(refined) = recv {
        if let Some(name) = key.as_string_lit()
            && let Dispatch::Applied(value) = refined.refinement.property(refined, name)
        {
            return OpResult::value(value);
        }
        return member_access(&refined.base, key, idgen, optional);
    }

    let value = match recv {
        TypeValue::Object(obj) => read_object(obj, key),
        TypeValue::Instance(instance) => read_object(&instance.data, key),
        TypeValue::Tuple(elems) => read_tuple(elems, key),
        TypeValue::Array(elem) => read_array(elem, key),
        TypeValue::Literal(LiteralValue::String(_))
        | TypeValue::Primitive(PrimitiveKind::String) => read_string(recv, key),
        TypeValue::Unknown => TypeValue::Unknown,
        // Numbers, booleans, functions, classes, promises: no modelled
        // properties.
        _ => TypeValue::undefined(),
    };
    OpResult::value(value)
}

fn read_object(obj: &ObjectRef, key: &TypeValue) -> TypeValue {
    match key.as_string_lit() {
        Some(name) => obj.get(name).unwrap_or_else(TypeValue::undefined),
        None => {
            // Abstract key: any property, or a miss.
            let mut values: Vec<TypeValue> =
                obj.0.borrow().props.values().cloned().collect();
            values.push(TypeValue::undefined());
            union_of(values)
        }
    }
}

fn read_tuple(elems: &[TypeValue], key: &TypeValue) -> TypeValue {
    if let Some(i) = key.as_number_lit() {
        if i.fract() == 0.0 && i >= 0.0 && (i as usize) < elems.len() {
            return elems[i as usize].clone();
        }
        return TypeValue::undefined();
    }
    if key.as_string_lit() == Some("length") {
        return TypeValue::number_lit(elems.len() as f64);
    }
    if key.as_string_lit().is_some() {
        return TypeValue::undefined();
    }
    let mut members = elems.to_vec();
    members.push(TypeValue::undefined());
    union_of(members)
}

fn read_array(elem: &TypeValue, key: &TypeValue) -> TypeValue {
    if key.as_string_lit() == Some("length") {
        return TypeValue::number();
    }
    if key.as_string_lit().is_some() {
        return TypeValue::undefined();
    }
    TypeValue::union2(elem.clone(), TypeValue::undefined())
}

fn read_string(recv: &TypeValue, key: &TypeValue) -> TypeValue {
    if let Some(name) = key.as_string_lit() {
        if let Some(value) = crate::ops_string::string_property(recv, name) {
            return value;
        }
        return TypeValue::undefined();
    }
    crate::ops_string::string_index(recv, key)
}

// =============================================================================
// Property Writes
// =============================================================================

/// Write `recv.key = value` in place. Returns whether a mutable location
/// existed; tuples are value-types and are handled by the evaluator's
/// rebinding path instead.
pub fn member_write(recv: &TypeValue, key: &TypeValue, value: TypeValue) -> bool {
    match recv {
        TypeValue::Object(obj) => {
            if let Some(name) = key.as_string_lit() {
                obj.set(name, value);
                return true;
            }
            false
        }
        TypeValue::Instance(instance) => {
            if let Some(name) = key.as_string_lit() {
                instance.data.set(name, value);
                return true;
            }
            false
        }
        TypeValue::Refined(refined) => member_write(&refined.base, key, value),
        _ => false,
    }
}

// =============================================================================
// Object Statics
// =============================================================================

/// `Object.keys` / `Object.values` / `Object.entries`.
pub fn object_static(name: &str, arg: &TypeValue) -> Option<TypeValue> {
    let known = match arg.refined_base() {
        TypeValue::Object(obj) => Some(obj.clone()),
        TypeValue::Instance(instance) => Some(instance.data.clone()),
        _ => None,
    };
    Some(match name {
        "keys" => match known {
            Some(obj) => TypeValue::Tuple(
                obj.keys().into_iter().map(TypeValue::string_lit).collect(),
            ),
            None => TypeValue::Array(Box::new(TypeValue::string())),
        },
        "values" => match known {
            Some(obj) => {
                TypeValue::Tuple(obj.0.borrow().props.values().cloned().collect())
            }
            None => TypeValue::Array(Box::new(TypeValue::Unknown)),
        },
        "entries" => match known {
            Some(obj) => TypeValue::Tuple(
                obj.0
                    .borrow()
                    .props
                    .iter()
                    .map(|(key, value)| {
                        TypeValue::Tuple(vec![
                            TypeValue::string_lit(key.clone()),
                            value.clone(),
                        ])
                    })
                    .collect(),
            ),
            None => TypeValue::Array(Box::new(TypeValue::Tuple(vec![
                TypeValue::string(),
                TypeValue::Unknown,
            ]))),
        },
        _ => return None,
    })
}

// =============================================================================
// Completions
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CompletionKind {
    Property,
    Method,
    Variable,
}

#[derive(Clone, Debug, Serialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionKind,
    pub detail: Option<String>,
}

/// The property/method surface of a type value, for editor completion.
/// Unions offer only what every member offers.
pub fn completions_of(ty: &TypeValue) -> Vec<CompletionItem> {
    match ty {
        TypeValue::Union(members) => {
            let mut iter = members.iter();
            let mut common = iter.next().map(completions_of).unwrap_or_default();
            for member in iter {
                let labels: Vec<String> = completions_of(member)
                    .into_iter()
                    .map(|item| item.label)
                    .collect();
                common.retain(|item| labels.contains(&item.label));
            }
            common
        }
        TypeValue::Refined(refined) => completions_of(&refined.base),
        TypeValue::Object(obj) => object_completions(obj),
        TypeValue::Instance(instance) => object_completions(&instance.data),
        TypeValue::Literal(LiteralValue::String(_))
        | TypeValue::Primitive(PrimitiveKind::String) => {
            let mut items = vec![CompletionItem {
                label: "length".to_string(),
                kind: CompletionKind::Property,
                detail: Some("number".to_string()),
            }];
            items.extend(crate::ops_string::STRING_METHOD_NAMES.iter().map(|name| {
                CompletionItem {
                    label: (*name).to_string(),
                    kind: CompletionKind::Method,
                    detail: None,
                }
            }));
            items
        }
        TypeValue::Array(_) | TypeValue::Tuple(_) => {
            let mut items = vec![CompletionItem {
                label: "length".to_string(),
                kind: CompletionKind::Property,
                detail: Some("number".to_string()),
            }];
            items.extend(crate::ops_array::ARRAY_METHOD_NAMES.iter().map(|name| {
                CompletionItem {
                    label: (*name).to_string(),
                    kind: CompletionKind::Method,
                    detail: None,
                }
            }));
            items
        }
        _ => Vec::new(),
    }
}

fn object_completions(obj: &ObjectRef) -> Vec<CompletionItem> {
    obj.0
        .borrow()
        .props
        .iter()
        .map(|(key, value)| CompletionItem {
            label: key.clone(),
            kind: if matches!(value, TypeValue::Function(_)) {
                CompletionKind::Method
            } else {
                CompletionKind::Property
            },
            detail: Some(value.to_string()),
        })
        .collect()
}
