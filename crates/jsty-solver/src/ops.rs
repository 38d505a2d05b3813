//! JS operator semantics over the lattice.
//!
//! All operators are pure functions of their operand type values; the
//! evaluator never touches host-language operators on lattice contents.
//! Dispatch order per operand: union distribution first, then the
//! outermost refinement's handler (falling through to its base on
//! `NotApplicable`), then the primitive semantics at the bottom.
//!
//! Union distribution lives here so a single `binary` call is all the
//! evaluator needs; the lazy-union law (`a + a` over `1 | 2` is `2 | 4`,
//! not the cross product) holds because the evaluator evaluates each
//! operand node once and passes the same union value in.

use jsty_ast::{BinaryOp, UnaryOp};

use crate::refine::Dispatch;
use crate::simplify::union_of;
use crate::types::{LiteralValue, PrimitiveKind, TagSet, Truthiness, TypeValue};

/// Value-plus-throw-effect pair produced by operations that can raise:
/// member access on nullish receivers, callback-driven methods, calls.
/// An operation that cannot throw carries `Never`.
#[derive(Clone, Debug)]
pub struct OpResult {
    pub value: TypeValue,
    pub throws: TypeValue,
}

impl OpResult {
    pub fn value(value: TypeValue) -> OpResult {
        OpResult {
            value,
            throws: TypeValue::Never,
        }
    }

    pub fn throws(throws: TypeValue) -> OpResult {
        OpResult {
            value: TypeValue::Never,
            throws,
        }
    }
}

/// Callback used by array methods to run a function type value; the
/// evaluator supplies its own call machinery.
pub type InvokeFn<'a> = dyn FnMut(&TypeValue, &[TypeValue]) -> OpResult + 'a;

// =============================================================================
// Literal Coercions
// =============================================================================

/// JS `String(v)` for a literal.
pub fn to_js_string(lit: &LiteralValue) -> String {
    match lit {
        LiteralValue::Number(n) => crate::display::format_number(*n),
        LiteralValue::String(s) => s.clone(),
        LiteralValue::Boolean(b) => b.to_string(),
        LiteralValue::Null => "null".to_string(),
        LiteralValue::Undefined => "undefined".to_string(),
        LiteralValue::BigInt(digits) => digits.clone(),
    }
}

/// JS `Number(v)` for a literal.
pub fn to_js_number(lit: &LiteralValue) -> f64 {
    match lit {
        LiteralValue::Number(n) => *n,
        LiteralValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        LiteralValue::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        LiteralValue::Null => 0.0,
        LiteralValue::Undefined => f64::NAN,
        LiteralValue::BigInt(digits) => digits.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// JS strict equality (`===`) of two literals.
pub fn strict_equals(a: &LiteralValue, b: &LiteralValue) -> bool {
    match (a, b) {
        // NaN !== NaN; +0 === -0
        (LiteralValue::Number(x), LiteralValue::Number(y)) => x == y,
        (LiteralValue::String(x), LiteralValue::String(y)) => x == y,
        (LiteralValue::Boolean(x), LiteralValue::Boolean(y)) => x == y,
        (LiteralValue::Null, LiteralValue::Null) => true,
        (LiteralValue::Undefined, LiteralValue::Undefined) => true,
        (LiteralValue::BigInt(x), LiteralValue::BigInt(y)) => x == y,
        _ => false,
    }
}

// =============================================================================
// Binary Operators
// =============================================================================

/// Apply a binary operator. Handles union distribution and refinement
/// dispatch; `instanceof` and `in` get the generic treatment here, with
/// the evaluator pre-resolving class identifiers (see `instance_of`).
pub fn binary(op: BinaryOp, left: &TypeValue, right: &TypeValue) -> TypeValue {
    // The same union on both sides means the same runtime value twice
    // (lookups of one binding share the allocation): distribute along the
    // diagonal, not the cross product.
    if let (TypeValue::Union(l), TypeValue::Union(r)) = (left, right)
        && std::rc::Rc::ptr_eq(l, r)
    {
        return union_of(l.iter().map(|m| binary(op, m, m)).collect());
    }
    // Distribute over unions, left then right.
    if let TypeValue::Union(members) = left {
        return union_of(members.iter().map(|m| binary(op, m, right)).collect());
    }
    if let TypeValue::Union(members) = right {
        return union_of(members.iter().map(|m| binary(op, left, m)).collect());
    }

    // Refinement dispatch: outermost handler first, base on fallthrough.
    if let TypeValue::Refined(refined) = left {
        return match refined.refinement.binary_op(refined, op, right, true) {
            Dispatch::Applied(value) => value,
            Dispatch::NotApplicable => binary(op, &refined.base, right),
        };
    }
    if let TypeValue::Refined(refined) = right {
        return match refined.refinement.binary_op(refined, op, left, false) {
            Dispatch::Applied(value) => value,
            Dispatch::NotApplicable => binary(op, left, &refined.base),
        };
    }

    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, left, right)
        }
        BinaryOp::EqStrict => equality(left, right, false),
        BinaryOp::NeqStrict => equality(left, right, true),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => ordering(op, left, right),
        BinaryOp::Instanceof => match right {
            TypeValue::Class(class) => instance_of(left, &class.name),
            _ => TypeValue::boolean(),
        },
        BinaryOp::In => has_property(left, right),
    }
}

fn add(left: &TypeValue, right: &TypeValue) -> TypeValue {
    if let (TypeValue::Literal(a), TypeValue::Literal(b)) = (left, right) {
        // Concrete JS `+`: string concatenation when either side is a
        // string, numeric addition otherwise.
        if matches!(a, LiteralValue::String(_)) || matches!(b, LiteralValue::String(_)) {
            let mut s = to_js_string(a);
            s.push_str(&to_js_string(b));
            return TypeValue::string_lit(s);
        }
        return TypeValue::number_lit(to_js_number(a) + to_js_number(b));
    }

    let stringy =
        left.tag_set() == TagSet::STRING || right.tag_set() == TagSet::STRING;
    if stringy {
        // Build a template so the known runs stay queryable; the template
        // collapses to `string` when nothing fixed is known.
        use crate::refinements::template::{TemplatePart, TemplateString};
        return TemplateString::build(vec![
            TemplatePart::Dynamic(left.clone()),
            TemplatePart::Dynamic(right.clone()),
        ]);
    }

    let numeric =
        left.tag_set() == TagSet::NUMBER && right.tag_set() == TagSet::NUMBER;
    if numeric {
        return TypeValue::number();
    }
    TypeValue::union2(TypeValue::number(), TypeValue::string())
}

fn arithmetic(op: BinaryOp, left: &TypeValue, right: &TypeValue) -> TypeValue {
    if let (TypeValue::Literal(a), TypeValue::Literal(b)) = (left, right) {
        let a = to_js_number(a);
        let b = to_js_number(b);
        let result = match op {
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Mod => a % b,
            _ => unreachable!("arithmetic called with {op:?}"),
        };
        return TypeValue::number_lit(result);
    }
    TypeValue::number()
}

fn equality(left: &TypeValue, right: &TypeValue, negate: bool) -> TypeValue {
    if let (TypeValue::Literal(a), TypeValue::Literal(b)) = (left, right) {
        let eq = strict_equals(a, b);
        return TypeValue::bool_lit(eq != negate);
    }
    TypeValue::boolean()
}

fn ordering(op: BinaryOp, left: &TypeValue, right: &TypeValue) -> TypeValue {
    if let (TypeValue::Literal(a), TypeValue::Literal(b)) = (left, right) {
        // Strings compare lexicographically; everything else through
        // ToNumber, where any NaN makes the comparison false.
        let result = match (a, b) {
            (LiteralValue::String(x), LiteralValue::String(y)) => match op {
                BinaryOp::Lt => x < y,
                BinaryOp::Le => x <= y,
                BinaryOp::Gt => x > y,
                BinaryOp::Ge => x >= y,
                _ => unreachable!(),
            },
            _ => {
                let x = to_js_number(a);
                let y = to_js_number(b);
                match op {
                    BinaryOp::Lt => x < y,
                    BinaryOp::Le => x <= y,
                    BinaryOp::Gt => x > y,
                    BinaryOp::Ge => x >= y,
                    _ => unreachable!(),
                }
            }
        };
        return TypeValue::bool_lit(result);
    }
    TypeValue::boolean()
}

/// `key in value` for a pre-evaluated key and receiver.
fn has_property(key: &TypeValue, value: &TypeValue) -> TypeValue {
    let Some(name) = key.as_string_lit() else {
        return TypeValue::boolean();
    };
    match value.refined_base() {
        TypeValue::Object(obj) => TypeValue::bool_lit(obj.has(name)),
        TypeValue::Instance(instance) => TypeValue::bool_lit(instance.data.has(name)),
        TypeValue::Tuple(elems) => {
            let in_range = name
                .parse::<usize>()
                .map(|i| i < elems.len())
                .unwrap_or(name == "length");
            TypeValue::bool_lit(in_range)
        }
        _ => TypeValue::boolean(),
    }
}

/// `value instanceof ClassName` where the class was resolved by name
/// (built-in Error classes and class identifiers).
pub fn instance_of(value: &TypeValue, class_name: &str) -> TypeValue {
    match value {
        TypeValue::Union(members) => union_of(
            members
                .iter()
                .map(|m| instance_of(m, class_name))
                .collect(),
        ),
        TypeValue::Refined(refined) => instance_of(&refined.base, class_name),
        TypeValue::Instance(instance) => TypeValue::bool_lit(
            instance.is_instance_of(class_name)
                || crate::subtype::class_extends(&instance.class_name, class_name),
        ),
        TypeValue::Unknown => TypeValue::boolean(),
        // Primitives, literals, functions, plain objects: never an
        // instance of a named class in this model.
        _ => TypeValue::bool_lit(false),
    }
}

// =============================================================================
// Unary Operators
// =============================================================================

pub fn unary(op: UnaryOp, value: &TypeValue) -> TypeValue {
    if let TypeValue::Union(members) = value {
        return union_of(members.iter().map(|m| unary(op, m)).collect());
    }
    match op {
        UnaryOp::Not => match value.truthiness() {
            Truthiness::True => TypeValue::bool_lit(false),
            Truthiness::False => TypeValue::bool_lit(true),
            Truthiness::Unknown => TypeValue::boolean(),
        },
        UnaryOp::Neg => match value {
            TypeValue::Literal(lit) => TypeValue::number_lit(-to_js_number(lit)),
            _ => TypeValue::number(),
        },
        UnaryOp::TypeOf => type_of(value),
        UnaryOp::Void => TypeValue::undefined(),
    }
}

/// `typeof` collapse: a single unambiguous tag yields its literal,
/// anything mixed yields `string`.
pub fn type_of(value: &TypeValue) -> TypeValue {
    match value.tag_set().single_tag() {
        Some(tag) => TypeValue::string_lit(tag),
        None => TypeValue::string(),
    }
}

// =============================================================================
// Primitive Classification
// =============================================================================

/// The primitive domain of a non-union value, when it has one.
pub fn primitive_kind(value: &TypeValue) -> Option<PrimitiveKind> {
    match value {
        TypeValue::Primitive(kind) => Some(*kind),
        TypeValue::Literal(lit) => lit.primitive(),
        TypeValue::Refined(refined) => primitive_kind(&refined.base),
        _ => None,
    }
}
