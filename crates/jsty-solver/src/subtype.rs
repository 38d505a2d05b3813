//! The subtype relation over type values.
//!
//! `Unknown` is top, `Never` is bottom; literals sit under their
//! primitives, refinements under their bases, object subtyping is
//! width-and-depth structural, instances are nominal against the built-in
//! Error hierarchy.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use jsty_common::limits::MAX_SUBTYPE_DEPTH;

use crate::types::{LiteralValue, TypeValue};

/// The built-in Error classes and their parent, consulted for nominal
/// `Instance` subtyping and for `new`-construction of intrinsic errors.
pub static BUILTIN_ERROR_HIERARCHY: Lazy<FxHashMap<&'static str, &'static str>> =
    Lazy::new(|| {
        let mut map = FxHashMap::default();
        map.insert("TypeError", "Error");
        map.insert("SyntaxError", "Error");
        map.insert("RangeError", "Error");
        map.insert("ReferenceError", "Error");
        map.insert("URIError", "Error");
        map.insert("EvalError", "Error");
        map
    });

/// Whether `name` is one of the built-in Error classes (including the
/// root `Error`).
pub fn is_builtin_error_class(name: &str) -> bool {
    name == "Error" || BUILTIN_ERROR_HIERARCHY.contains_key(name)
}

/// Nominal class compatibility: identical, or `child` descends from
/// `parent` in the built-in Error hierarchy.
pub fn class_extends(child: &str, parent: &str) -> bool {
    if child == parent {
        return true;
    }
    let mut current = child;
    while let Some(&next) = BUILTIN_ERROR_HIERARCHY.get(current) {
        if next == parent {
            return true;
        }
        current = next;
    }
    false
}

/// Subtype query engine. Carries only its recursion depth; answers
/// `false` conservatively past the guard.
#[derive(Debug, Default)]
pub struct SubtypeChecker {
    depth: u32,
}

impl SubtypeChecker {
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    /// Whether every runtime value of `a` is also a value of `b`.
    pub fn is_subtype_of(&mut self, a: &TypeValue, b: &TypeValue) -> bool {
        if self.depth > MAX_SUBTYPE_DEPTH {
            tracing::trace!(depth = self.depth, "subtype recursion limit, answering false");
            return false;
        }
        self.depth += 1;
        let result = self.check(a, b);
        self.depth -= 1;
        result
    }

    fn check(&mut self, a: &TypeValue, b: &TypeValue) -> bool {
        // Top and bottom
        if matches!(b, TypeValue::Unknown) || matches!(a, TypeValue::Never) {
            return true;
        }
        if matches!(a, TypeValue::Unknown) || matches!(b, TypeValue::Never) {
            return false;
        }

        // A union is a subtype iff every member is.
        if let TypeValue::Union(members) = a {
            return members.iter().all(|m| self.is_subtype_of(m, b));
        }

        // A non-union is a subtype of a union iff it is under some
        // member. This must precede the refinement unwrap so a refined
        // value finds its identical member instead of losing its
        // refinement to the base comparison.
        if let TypeValue::Union(members) = b {
            return members.iter().any(|m| self.is_subtype_of(a, m));
        }

        // Refined on the left: same-name refinements compare bases;
        // otherwise the refined set is within its base, so compare the
        // base. The same-name case must run before the generic unwrap so
        // `Refined(number, tpl) ≤ Refined(string, tpl)` cannot hold via an
        // accidental base path.
        if let TypeValue::Refined(ra) = a {
            if let TypeValue::Refined(rb) = b
                && ra.refinement.name() == rb.refinement.name()
                && ra.refinement.meta_render() == rb.refinement.meta_render()
            {
                return self.is_subtype_of(&ra.base, &rb.base);
            }
            return self.is_subtype_of(&ra.base, b);
        }

        // Literal against a refinement: membership via the predicate.
        if let TypeValue::Refined(rb) = b {
            if let TypeValue::Literal(lit) = a {
                return self.is_subtype_of(a, &rb.base) && rb.refinement.check(lit);
            }
            return false;
        }

        match (a, b) {
            (TypeValue::Literal(x), TypeValue::Literal(y)) => x == y,
            (TypeValue::Literal(lit), TypeValue::Primitive(kind)) => {
                lit.primitive() == Some(*kind)
            }
            (TypeValue::Primitive(x), TypeValue::Primitive(y)) => x == y,

            // Width-and-depth: every property required by `b` must exist
            // in `a` with a subtype value.
            (TypeValue::Object(x), TypeValue::Object(y)) => {
                if x.id() == y.id() {
                    return true;
                }
                let yb = y.0.borrow();
                yb.props.iter().all(|(key, required)| {
                    x.get(key)
                        .is_some_and(|found| self.is_subtype_of(&found, required))
                })
            }

            (TypeValue::Array(x), TypeValue::Array(y)) => self.is_subtype_of(x, y),
            (TypeValue::Tuple(xs), TypeValue::Tuple(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().zip(ys).all(|(x, y)| self.is_subtype_of(x, y))
            }
            (TypeValue::Tuple(xs), TypeValue::Array(elem)) => {
                xs.iter().all(|x| self.is_subtype_of(x, elem))
            }

            (TypeValue::Promise(x), TypeValue::Promise(y)) => self.is_subtype_of(x, y),

            (TypeValue::Instance(x), TypeValue::Instance(y)) => {
                class_extends(&x.class_name, &y.class_name) || x.is_instance_of(&y.class_name)
            }

            (TypeValue::Function(x), TypeValue::Function(y)) => x.id == y.id,
            (TypeValue::Class(x), TypeValue::Class(y)) => std::rc::Rc::ptr_eq(x, y),

            _ => false,
        }
    }
}

/// Convenience wrapper for one-shot queries.
pub fn is_subtype_of(a: &TypeValue, b: &TypeValue) -> bool {
    SubtypeChecker::new().is_subtype_of(a, b)
}

/// Whether a literal is a member of the given type value, the membership
/// face of the subtype relation.
pub fn literal_member_of(lit: &LiteralValue, ty: &TypeValue) -> bool {
    is_subtype_of(&TypeValue::Literal(lit.clone()), ty)
}
