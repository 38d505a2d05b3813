//! Built-in string methods.
//!
//! Computed exactly on string literals (JS indexing is in UTF-16 code
//! units, so literal computation goes through UTF-16 buffers), widened per
//! the JS signatures on abstract strings. Template-string refinements get
//! first crack in the dispatch order and land here on fallthrough.

use once_cell::sync::Lazy;

use crate::types::{LiteralValue, TypeValue};

/// Method names recognised on strings, for dispatch and completions.
pub static STRING_METHOD_NAMES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "toUpperCase",
        "toLowerCase",
        "trim",
        "trimStart",
        "trimEnd",
        "charAt",
        "charCodeAt",
        "at",
        "startsWith",
        "endsWith",
        "includes",
        "indexOf",
        "lastIndexOf",
        "slice",
        "substring",
        "split",
        "replace",
        "replaceAll",
        "repeat",
        "padStart",
        "padEnd",
    ]
});

/// JS string length: UTF-16 code units.
pub fn js_length(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Dispatch a string method. `None` when the name is not a string method;
/// the receiver must already be string-based (the caller unwraps
/// refinements and distributes unions).
pub fn string_method(recv: &TypeValue, name: &str, args: &[TypeValue]) -> Option<TypeValue> {
    if !STRING_METHOD_NAMES.iter().any(|m| *m == name) {
        return None;
    }
    let result = match recv.as_string_lit() {
        Some(s) => literal_method(s, name, args).unwrap_or_else(|| abstract_method(name)),
        None => abstract_method(name),
    };
    Some(result)
}

/// Property reads on strings: only `length`.
pub fn string_property(recv: &TypeValue, name: &str) -> Option<TypeValue> {
    if name != "length" {
        return None;
    }
    Some(match recv.as_string_lit() {
        Some(s) => TypeValue::number_lit(js_length(s) as f64),
        None => TypeValue::number(),
    })
}

/// Indexed access `s[i]` on a string.
pub fn string_index(recv: &TypeValue, index: &TypeValue) -> TypeValue {
    if let (Some(s), Some(i)) = (recv.as_string_lit(), index.as_number_lit()) {
        let units: Vec<u16> = s.encode_utf16().collect();
        if i.fract() == 0.0 && i >= 0.0 && (i as usize) < units.len() {
            let unit = units[i as usize];
            return TypeValue::string_lit(String::from_utf16_lossy(&[unit]));
        }
        return TypeValue::undefined();
    }
    TypeValue::union2(TypeValue::string(), TypeValue::undefined())
}

/// The widened result for each method per its JS signature.
fn abstract_method(name: &str) -> TypeValue {
    match name {
        "toUpperCase" | "toLowerCase" | "trim" | "trimStart" | "trimEnd" | "charAt" | "slice"
        | "substring" | "replace" | "replaceAll" | "repeat" | "padStart" | "padEnd" => {
            TypeValue::string()
        }
        "charCodeAt" | "indexOf" | "lastIndexOf" => TypeValue::number(),
        "at" => TypeValue::union2(TypeValue::string(), TypeValue::undefined()),
        "startsWith" | "endsWith" | "includes" => TypeValue::boolean(),
        "split" => TypeValue::Array(Box::new(TypeValue::string())),
        _ => TypeValue::Unknown,
    }
}

/// Exact computation on a literal receiver; `None` when an argument is
/// abstract and the caller should widen instead.
fn literal_method(s: &str, name: &str, args: &[TypeValue]) -> Option<TypeValue> {
    let arg_str = |i: usize| -> Option<&str> { args.get(i).and_then(|a| a.as_string_lit()) };
    let arg_num = |i: usize| -> Option<f64> { args.get(i).and_then(|a| a.as_number_lit()) };

    let units: Vec<u16> = s.encode_utf16().collect();
    let len = units.len() as i64;

    Some(match name {
        "toUpperCase" => TypeValue::string_lit(s.to_uppercase()),
        "toLowerCase" => TypeValue::string_lit(s.to_lowercase()),
        "trim" => TypeValue::string_lit(s.trim()),
        "trimStart" => TypeValue::string_lit(s.trim_start()),
        "trimEnd" => TypeValue::string_lit(s.trim_end()),
        "charAt" => {
            let i = match args.first() {
                None => 0.0,
                Some(arg) => arg.as_number_lit()?,
            };
            if i.fract() == 0.0 && i >= 0.0 && (i as i64) < len {
                TypeValue::string_lit(String::from_utf16_lossy(&units[i as usize..=i as usize]))
            } else {
                TypeValue::string_lit("")
            }
        }
        "charCodeAt" => {
            let i = match args.first() {
                None => 0.0,
                Some(arg) => arg.as_number_lit()?,
            };
            if i.fract() == 0.0 && i >= 0.0 && (i as i64) < len {
                TypeValue::number_lit(f64::from(units[i as usize]))
            } else {
                TypeValue::number_lit(f64::NAN)
            }
        }
        "at" => {
            let i = match args.first() {
                None => 0.0,
                Some(arg) => arg.as_number_lit()?,
            };
            if i.fract() != 0.0 {
                return Some(TypeValue::undefined());
            }
            let idx = if i < 0.0 { len + i as i64 } else { i as i64 };
            if idx >= 0 && idx < len {
                TypeValue::string_lit(String::from_utf16_lossy(
                    &units[idx as usize..=idx as usize],
                ))
            } else {
                TypeValue::undefined()
            }
        }
        "startsWith" => TypeValue::bool_lit(s.starts_with(arg_str(0)?)),
        "endsWith" => TypeValue::bool_lit(s.ends_with(arg_str(0)?)),
        "includes" => TypeValue::bool_lit(s.contains(arg_str(0)?)),
        "indexOf" => {
            let needle: Vec<u16> = arg_str(0)?.encode_utf16().collect();
            TypeValue::number_lit(find_utf16(&units, &needle).map_or(-1.0, |i| i as f64))
        }
        "lastIndexOf" => {
            let needle: Vec<u16> = arg_str(0)?.encode_utf16().collect();
            TypeValue::number_lit(rfind_utf16(&units, &needle).map_or(-1.0, |i| i as f64))
        }
        "slice" => {
            let start = resolve_slice_index(arg_num_or(args, 0, 0.0)?, len);
            let end = resolve_slice_index(arg_num_or(args, 1, len as f64)?, len);
            let (start, end) = (start.min(len), end.min(len));
            if start < end {
                TypeValue::string_lit(String::from_utf16_lossy(
                    &units[start as usize..end as usize],
                ))
            } else {
                TypeValue::string_lit("")
            }
        }
        "substring" => {
            let a = clamp_index(arg_num_or(args, 0, 0.0)?, len);
            let b = clamp_index(arg_num_or(args, 1, len as f64)?, len);
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            TypeValue::string_lit(String::from_utf16_lossy(&units[start as usize..end as usize]))
        }
        "split" => {
            let sep = arg_str(0)?;
            let pieces: Vec<TypeValue> = if sep.is_empty() {
                s.chars().map(|c| TypeValue::string_lit(c.to_string())).collect()
            } else {
                s.split(sep).map(TypeValue::string_lit).collect()
            };
            TypeValue::Tuple(pieces)
        }
        "replace" => {
            let pat = arg_str(0)?;
            let repl = arg_str(1)?;
            TypeValue::string_lit(s.replacen(pat, repl, 1))
        }
        "replaceAll" => {
            let pat = arg_str(0)?;
            let repl = arg_str(1)?;
            TypeValue::string_lit(s.replace(pat, repl))
        }
        "repeat" => {
            let n = arg_num(0)?;
            if n.fract() != 0.0 || n < 0.0 {
                // JS throws a RangeError here; stay total and widen.
                return None;
            }
            TypeValue::string_lit(s.repeat(n as usize))
        }
        "padStart" => {
            let target = arg_num(0)?;
            let pad = match args.get(1) {
                None => " ",
                Some(arg) => arg.as_string_lit()?,
            };
            TypeValue::string_lit(pad_string(s, &units, target, pad, true))
        }
        "padEnd" => {
            let target = arg_num(0)?;
            let pad = match args.get(1) {
                None => " ",
                Some(arg) => arg.as_string_lit()?,
            };
            TypeValue::string_lit(pad_string(s, &units, target, pad, false))
        }
        _ => return None,
    })
}

/// Numeric argument at `i`, defaulting when absent; `None` when present
/// but abstract.
fn arg_num_or(args: &[TypeValue], i: usize, default: f64) -> Option<f64> {
    match args.get(i) {
        None => Some(default),
        Some(arg) => match arg {
            TypeValue::Literal(LiteralValue::Undefined) => Some(default),
            other => other.as_number_lit(),
        },
    }
}

/// `slice`-style index: negative counts from the end, then clamps.
fn resolve_slice_index(i: f64, len: i64) -> i64 {
    let i = i as i64;
    if i < 0 { (len + i).max(0) } else { i.min(len) }
}

/// `substring`-style index: NaN and negatives clamp to 0.
fn clamp_index(i: f64, len: i64) -> i64 {
    if i.is_nan() || i < 0.0 {
        0
    } else {
        (i as i64).min(len)
    }
}

fn find_utf16(haystack: &[u16], needle: &[u16]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn rfind_utf16(haystack: &[u16], needle: &[u16]) -> Option<usize> {
    if needle.is_empty() {
        return Some(haystack.len());
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .rposition(|window| window == needle)
}

fn pad_string(s: &str, units: &[u16], target: f64, pad: &str, at_start: bool) -> String {
    let target = if target.is_nan() || target < 0.0 {
        0
    } else {
        target as usize
    };
    if target <= units.len() || pad.is_empty() {
        return s.to_string();
    }
    let pad_units: Vec<u16> = pad.encode_utf16().collect();
    let mut fill: Vec<u16> = Vec::with_capacity(target - units.len());
    while fill.len() < target - units.len() {
        let take = (target - units.len() - fill.len()).min(pad_units.len());
        fill.extend_from_slice(&pad_units[..take]);
    }
    let filled = String::from_utf16_lossy(&fill);
    if at_start {
        format!("{filled}{s}")
    } else {
        format!("{s}{filled}")
    }
}
