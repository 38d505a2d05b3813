//! Canonical rendering of type values.
//!
//! This is the form memoisation keys, diagnostics, and tests rely on, so
//! it must be deterministic: object property order follows insertion
//! order, union member order follows normalisation order, and object
//! identity ids never appear (structurally equal arguments must share a
//! memo entry).

use std::fmt;

use crate::types::{LiteralValue, TypeValue};

/// Render an `f64` the way JS `String(n)` does for the common cases:
/// integral values print without a fraction, `NaN` and infinities by name.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        // Negative zero prints as "0"
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{}", n as i64);
    }
    format!("{n}")
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Number(n) => write!(f, "{}", format_number(*n)),
            LiteralValue::String(s) => write!(f, "{s:?}"),
            LiteralValue::Boolean(b) => write!(f, "{b}"),
            LiteralValue::Null => write!(f, "null"),
            LiteralValue::Undefined => write!(f, "undefined"),
            LiteralValue::BigInt(digits) => write!(f, "{digits}n"),
        }
    }
}

impl fmt::Display for TypeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeValue::Literal(v) => write!(f, "{v}"),
            TypeValue::Primitive(kind) => write!(f, "{}", kind.as_str()),
            TypeValue::Refined(refined) => {
                write!(f, "{}", refined.refinement.render(&refined.base))
            }
            TypeValue::Object(obj) => {
                let data = obj.0.borrow();
                write!(f, "{{")?;
                for (i, (key, value)) in data.props.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            TypeValue::Array(elem) => {
                if needs_parens(elem) {
                    write!(f, "({elem})[]")
                } else {
                    write!(f, "{elem}[]")
                }
            }
            TypeValue::Tuple(elems) => {
                write!(f, "[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "]")
            }
            TypeValue::Function(func) => match &func.name {
                Some(name) => write!(f, "function {name}"),
                None => write!(f, "function"),
            },
            TypeValue::Class(class) => write!(f, "class {}", class.name),
            TypeValue::Promise(inner) => write!(f, "Promise<{inner}>"),
            TypeValue::Instance(instance) => {
                write!(f, "{}", instance.class_name)?;
                if !instance.data.is_empty() {
                    let data = instance.data.0.borrow();
                    write!(f, " {{")?;
                    for (i, (key, value)) in data.props.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{key}: {value}")?;
                    }
                    write!(f, "}}")?;
                }
                Ok(())
            }
            TypeValue::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            TypeValue::Never => write!(f, "never"),
            TypeValue::Unknown => write!(f, "unknown"),
        }
    }
}

fn needs_parens(ty: &TypeValue) -> bool {
    matches!(ty, TypeValue::Union(_))
}
