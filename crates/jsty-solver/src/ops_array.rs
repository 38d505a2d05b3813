//! Built-in array and tuple methods.
//!
//! On tuples, methods iterate elementwise and stay exact: `map` builds a
//! tuple, `some`/`every` compute the boolean when every callback result is
//! decided, `reduce` folds from the seed, `push` reports the exact new
//! length. On abstract arrays the callback runs once over the element type
//! and the result widens per the JS signature.
//!
//! Methods that mutate their receiver report the updated value through
//! `MethodOutcome::updated_receiver`; the evaluator writes it back when
//! the receiver was an assignable location.

use once_cell::sync::Lazy;

use crate::ops::{InvokeFn, OpResult, strict_equals};
use crate::simplify::union_of;
use crate::types::{Truthiness, TypeValue};

/// Method names recognised on arrays and tuples, for dispatch and
/// completions.
pub static ARRAY_METHOD_NAMES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "map", "filter", "reduce", "find", "some", "every", "forEach", "flatMap", "includes",
        "indexOf", "join", "slice", "concat", "push",
    ]
});

/// Result of an array/tuple method: value, throw effect accumulated from
/// callbacks, and the post-mutation receiver for mutating methods.
#[derive(Clone, Debug)]
pub struct MethodOutcome {
    pub value: TypeValue,
    pub throws: TypeValue,
    pub updated_receiver: Option<TypeValue>,
}

impl MethodOutcome {
    fn value(value: TypeValue) -> MethodOutcome {
        MethodOutcome {
            value,
            throws: TypeValue::Never,
            updated_receiver: None,
        }
    }
}

/// Dispatch an array/tuple method. `None` when the name is not an array
/// method; the receiver must be `Array` or `Tuple`.
pub fn array_method(
    recv: &TypeValue,
    name: &str,
    args: &[TypeValue],
    invoke: &mut InvokeFn,
) -> Option<MethodOutcome> {
    if !ARRAY_METHOD_NAMES.iter().any(|m| *m == name) {
        return None;
    }
    match recv {
        TypeValue::Tuple(elems) => Some(tuple_method(elems, name, args, invoke)),
        TypeValue::Array(elem) => Some(abstract_method(elem, name, args, invoke)),
        _ => None,
    }
}

/// Property reads on arrays and tuples: only `length`.
pub fn array_property(recv: &TypeValue, name: &str) -> Option<TypeValue> {
    if name != "length" {
        return None;
    }
    Some(match recv {
        TypeValue::Tuple(elems) => TypeValue::number_lit(elems.len() as f64),
        TypeValue::Array(_) => TypeValue::number(),
        _ => return None,
    })
}

// =============================================================================
// Tuple Methods (exact)
// =============================================================================

fn tuple_method(
    elems: &[TypeValue],
    name: &str,
    args: &[TypeValue],
    invoke: &mut InvokeFn,
) -> MethodOutcome {
    let elem_union = || union_of(elems.to_vec());
    match name {
        "map" => {
            let mut throws = Vec::new();
            let mut results = Vec::with_capacity(elems.len());
            for (i, elem) in elems.iter().enumerate() {
                let cb = each(args, elem, i, invoke);
                throws.push(cb.throws);
                results.push(cb.value);
            }
            MethodOutcome {
                value: TypeValue::Tuple(results),
                throws: union_of(throws),
                updated_receiver: None,
            }
        }
        "filter" => {
            let mut throws = Vec::new();
            let mut kept = Vec::new();
            let mut exact = true;
            for (i, elem) in elems.iter().enumerate() {
                let cb = each(args, elem, i, invoke);
                throws.push(cb.throws);
                match cb.value.truthiness() {
                    Truthiness::True => kept.push(elem.clone()),
                    Truthiness::False => {}
                    Truthiness::Unknown => exact = false,
                }
            }
            let value = if exact {
                TypeValue::Tuple(kept)
            } else {
                TypeValue::Array(Box::new(elem_union()))
            };
            MethodOutcome {
                value,
                throws: union_of(throws),
                updated_receiver: None,
            }
        }
        "reduce" => {
            let mut throws = Vec::new();
            let mut iter = elems.iter();
            let mut acc = match args.get(1) {
                Some(seed) => seed.clone(),
                None => match iter.next() {
                    Some(first) => first.clone(),
                    None => {
                        // Reducing an empty tuple without a seed throws in
                        // JS; model conservatively as undefined.
                        return MethodOutcome::value(TypeValue::undefined());
                    }
                },
            };
            for (i, elem) in iter.enumerate() {
                let cb = invoke(
                    args.first().unwrap_or(&TypeValue::Unknown),
                    &[acc.clone(), elem.clone(), TypeValue::number_lit(i as f64)],
                );
                throws.push(cb.throws);
                acc = cb.value;
            }
            MethodOutcome {
                value: acc,
                throws: union_of(throws),
                updated_receiver: None,
            }
        }
        "find" => {
            let mut throws = Vec::new();
            let mut undecided = Vec::new();
            let mut found = None;
            for (i, elem) in elems.iter().enumerate() {
                let cb = each(args, elem, i, invoke);
                throws.push(cb.throws);
                match cb.value.truthiness() {
                    Truthiness::True => {
                        found = Some(elem.clone());
                        break;
                    }
                    Truthiness::False => {}
                    Truthiness::Unknown => undecided.push(elem.clone()),
                }
            }
            let value = match found {
                Some(elem) if undecided.is_empty() => elem,
                Some(elem) => {
                    undecided.push(elem);
                    undecided.push(TypeValue::undefined());
                    union_of(undecided)
                }
                None if undecided.is_empty() => TypeValue::undefined(),
                None => {
                    undecided.push(TypeValue::undefined());
                    union_of(undecided)
                }
            };
            MethodOutcome {
                value,
                throws: union_of(throws),
                updated_receiver: None,
            }
        }
        "some" | "every" => {
            let stop_on = name == "some";
            let mut throws = Vec::new();
            let mut undecided = false;
            let mut decided = None;
            for (i, elem) in elems.iter().enumerate() {
                let cb = each(args, elem, i, invoke);
                throws.push(cb.throws);
                match cb.value.truthiness() {
                    Truthiness::True if stop_on => {
                        decided = Some(true);
                        break;
                    }
                    Truthiness::False if !stop_on => {
                        decided = Some(false);
                        break;
                    }
                    Truthiness::Unknown => undecided = true,
                    _ => {}
                }
            }
            let value = match decided {
                Some(answer) => TypeValue::bool_lit(answer),
                None if undecided => TypeValue::boolean(),
                // some: exhausted without a hit; every: no refutation
                None => TypeValue::bool_lit(!stop_on),
            };
            MethodOutcome {
                value,
                throws: union_of(throws),
                updated_receiver: None,
            }
        }
        "forEach" => {
            let mut throws = Vec::new();
            for (i, elem) in elems.iter().enumerate() {
                let cb = each(args, elem, i, invoke);
                throws.push(cb.throws);
            }
            MethodOutcome {
                value: TypeValue::undefined(),
                throws: union_of(throws),
                updated_receiver: None,
            }
        }
        "flatMap" => {
            let mut throws = Vec::new();
            let mut flat: Vec<TypeValue> = Vec::new();
            let mut exact = true;
            for (i, elem) in elems.iter().enumerate() {
                let cb = each(args, elem, i, invoke);
                throws.push(cb.throws);
                match cb.value {
                    TypeValue::Tuple(inner) => flat.extend(inner),
                    TypeValue::Array(inner) => {
                        flat.push(*inner);
                        exact = false;
                    }
                    other => flat.push(other),
                }
            }
            let value = if exact {
                TypeValue::Tuple(flat)
            } else {
                TypeValue::Array(Box::new(union_of(flat)))
            };
            MethodOutcome {
                value,
                throws: union_of(throws),
                updated_receiver: None,
            }
        }
        "includes" => {
            let needle = args.first().cloned().unwrap_or_else(TypeValue::undefined);
            let value = match decide_membership(elems, &needle) {
                Some(answer) => TypeValue::bool_lit(answer),
                None => TypeValue::boolean(),
            };
            MethodOutcome::value(value)
        }
        "indexOf" => {
            let needle = args.first().cloned().unwrap_or_else(TypeValue::undefined);
            let value = match decide_index(elems, &needle) {
                Some(i) => TypeValue::number_lit(i),
                None => TypeValue::number(),
            };
            MethodOutcome::value(value)
        }
        "join" => {
            let sep = match args.first() {
                None => Some(",".to_string()),
                Some(arg) => arg.as_string_lit().map(str::to_string),
            };
            let value = match sep {
                Some(sep) => join_literals(elems, &sep)
                    .map(TypeValue::string_lit)
                    .unwrap_or_else(TypeValue::string),
                None => TypeValue::string(),
            };
            MethodOutcome::value(value)
        }
        "slice" => {
            let len = elems.len() as i64;
            let bounds = (
                slice_arg(args, 0, 0.0),
                slice_arg(args, 1, len as f64),
            );
            let value = match bounds {
                (Some(a), Some(b)) => {
                    let start = resolve_index(a, len);
                    let end = resolve_index(b, len);
                    if start < end {
                        TypeValue::Tuple(elems[start as usize..end as usize].to_vec())
                    } else {
                        TypeValue::Tuple(Vec::new())
                    }
                }
                _ => TypeValue::Array(Box::new(elem_union())),
            };
            MethodOutcome::value(value)
        }
        "concat" => {
            let mut out = elems.to_vec();
            let mut widen = false;
            for arg in args {
                match arg {
                    TypeValue::Tuple(more) => out.extend(more.iter().cloned()),
                    TypeValue::Array(inner) => {
                        out.push((**inner).clone());
                        widen = true;
                    }
                    other => out.push(other.clone()),
                }
            }
            let value = if widen {
                TypeValue::Array(Box::new(union_of(out)))
            } else {
                TypeValue::Tuple(out)
            };
            MethodOutcome::value(value)
        }
        "push" => {
            let mut out = elems.to_vec();
            out.extend(args.iter().cloned());
            let len = out.len() as f64;
            MethodOutcome {
                value: TypeValue::number_lit(len),
                throws: TypeValue::Never,
                updated_receiver: Some(TypeValue::Tuple(out)),
            }
        }
        _ => MethodOutcome::value(TypeValue::Unknown),
    }
}

// =============================================================================
// Abstract Array Methods (one widened iteration)
// =============================================================================

fn abstract_method(
    elem: &TypeValue,
    name: &str,
    args: &[TypeValue],
    invoke: &mut InvokeFn,
) -> MethodOutcome {
    let run_once = |invoke: &mut InvokeFn| -> OpResult {
        invoke(
            args.first().unwrap_or(&TypeValue::Unknown),
            &[elem.clone(), TypeValue::number()],
        )
    };
    match name {
        "map" => {
            let cb = run_once(invoke);
            MethodOutcome {
                value: TypeValue::Array(Box::new(cb.value)),
                throws: cb.throws,
                updated_receiver: None,
            }
        }
        "filter" => {
            let cb = run_once(invoke);
            MethodOutcome {
                value: TypeValue::Array(Box::new(elem.clone())),
                throws: cb.throws,
                updated_receiver: None,
            }
        }
        "reduce" => {
            let acc = match args.get(1) {
                Some(seed) => TypeValue::union2(seed.clone(), elem.clone()),
                None => elem.clone(),
            };
            let cb = invoke(
                args.first().unwrap_or(&TypeValue::Unknown),
                &[acc.clone(), elem.clone(), TypeValue::number()],
            );
            MethodOutcome {
                value: TypeValue::union2(acc, cb.value),
                throws: cb.throws,
                updated_receiver: None,
            }
        }
        "find" => {
            let cb = run_once(invoke);
            MethodOutcome {
                value: TypeValue::union2(elem.clone(), TypeValue::undefined()),
                throws: cb.throws,
                updated_receiver: None,
            }
        }
        "some" | "every" => {
            let cb = run_once(invoke);
            MethodOutcome {
                value: TypeValue::boolean(),
                throws: cb.throws,
                updated_receiver: None,
            }
        }
        "forEach" => {
            let cb = run_once(invoke);
            MethodOutcome {
                value: TypeValue::undefined(),
                throws: cb.throws,
                updated_receiver: None,
            }
        }
        "flatMap" => {
            let cb = run_once(invoke);
            let flattened = match cb.value {
                TypeValue::Array(inner) => *inner,
                TypeValue::Tuple(inner) => union_of(inner),
                other => other,
            };
            MethodOutcome {
                value: TypeValue::Array(Box::new(flattened)),
                throws: cb.throws,
                updated_receiver: None,
            }
        }
        "includes" => MethodOutcome::value(TypeValue::boolean()),
        "indexOf" => MethodOutcome::value(TypeValue::number()),
        "join" => MethodOutcome::value(TypeValue::string()),
        "slice" => MethodOutcome::value(TypeValue::Array(Box::new(elem.clone()))),
        "concat" => {
            let mut members = vec![elem.clone()];
            for arg in args {
                match arg {
                    TypeValue::Tuple(more) => members.extend(more.iter().cloned()),
                    TypeValue::Array(inner) => members.push((**inner).clone()),
                    other => members.push(other.clone()),
                }
            }
            MethodOutcome::value(TypeValue::Array(Box::new(union_of(members))))
        }
        "push" => {
            let mut members = vec![elem.clone()];
            members.extend(args.iter().cloned());
            MethodOutcome {
                value: TypeValue::number(),
                throws: TypeValue::Never,
                updated_receiver: Some(TypeValue::Array(Box::new(union_of(members)))),
            }
        }
        _ => MethodOutcome::value(TypeValue::Unknown),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Invoke the callback argument for one element.
fn each(args: &[TypeValue], elem: &TypeValue, index: usize, invoke: &mut InvokeFn) -> OpResult {
    invoke(
        args.first().unwrap_or(&TypeValue::Unknown),
        &[elem.clone(), TypeValue::number_lit(index as f64)],
    )
}

/// Exact membership when every comparison is decidable.
fn decide_membership(elems: &[TypeValue], needle: &TypeValue) -> Option<bool> {
    let needle = needle.as_literal()?;
    let mut all_decided = true;
    for elem in elems {
        match elem.as_literal() {
            Some(lit) => {
                if strict_equals(lit, needle) {
                    return Some(true);
                }
            }
            None => all_decided = false,
        }
    }
    if all_decided { Some(false) } else { None }
}

fn decide_index(elems: &[TypeValue], needle: &TypeValue) -> Option<f64> {
    let needle = needle.as_literal()?;
    for (i, elem) in elems.iter().enumerate() {
        match elem.as_literal() {
            Some(lit) => {
                if strict_equals(lit, needle) {
                    return Some(i as f64);
                }
            }
            None => return None,
        }
    }
    Some(-1.0)
}

fn join_literals(elems: &[TypeValue], sep: &str) -> Option<String> {
    let mut out = String::new();
    for (i, elem) in elems.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        let lit = elem.as_literal()?;
        // null and undefined join as empty strings
        if !lit.is_nullish() {
            out.push_str(&crate::ops::to_js_string(lit));
        }
    }
    Some(out)
}

fn slice_arg(args: &[TypeValue], i: usize, default: f64) -> Option<f64> {
    match args.get(i) {
        None => Some(default),
        Some(arg) => arg.as_number_lit(),
    }
}

fn resolve_index(i: f64, len: i64) -> i64 {
    let i = i as i64;
    if i < 0 {
        (len + i).max(0)
    } else {
        i.min(len)
    }
}
