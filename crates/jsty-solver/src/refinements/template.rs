//! Template-string refinement.
//!
//! Tracks a string as an alternating sequence of fixed text runs and
//! abstract parts, which is what `"0x" + x` and template literals with
//! abstract interpolations produce. The fixed runs let prefix/suffix/
//! containment queries and concatenation stay precise long after the
//! string itself stops being a literal.

use std::any::Any;
use std::rc::Rc;

use jsty_ast::BinaryOp;

use crate::ops::to_js_string;
use crate::ops_string::js_length;
use crate::refine::{Dispatch, Refinement};
use crate::refinements::range::NumericRange;
use crate::types::{
    LiteralValue, PrimitiveKind, RefinedValue, Truthiness, TypeValue,
};

/// One part of a template: a known text run or an abstract value.
#[derive(Clone, Debug)]
pub enum TemplatePart {
    Text(String),
    Dynamic(TypeValue),
}

#[derive(Clone, Debug)]
pub struct TemplateString {
    /// Normalised: no empty text runs, no adjacent text runs, no dynamic
    /// parts that are themselves literals or templates.
    pub parts: Vec<TemplatePart>,
}

impl TemplateString {
    /// Build a string type value from parts, applying the collapse rules:
    /// literal dynamic parts become text, nested templates splice, adjacent
    /// text runs merge, an all-text template collapses to a literal, and a
    /// sole bare `string` part collapses to the `string` primitive.
    pub fn build(parts: Vec<TemplatePart>) -> TypeValue {
        let mut normalised: Vec<TemplatePart> = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                TemplatePart::Text(text) => push_text(&mut normalised, &text),
                TemplatePart::Dynamic(value) => push_dynamic(&mut normalised, value),
            }
        }

        let dynamic_count = normalised
            .iter()
            .filter(|p| matches!(p, TemplatePart::Dynamic(_)))
            .count();

        if dynamic_count == 0 {
            let mut text = String::new();
            for part in &normalised {
                if let TemplatePart::Text(t) = part {
                    text.push_str(t);
                }
            }
            return TypeValue::string_lit(text);
        }

        if normalised.len() == 1
            && matches!(
                normalised[0],
                TemplatePart::Dynamic(TypeValue::Primitive(PrimitiveKind::String))
            )
        {
            return TypeValue::string();
        }

        TypeValue::Refined(RefinedValue {
            base: Box::new(TypeValue::string()),
            refinement: Rc::new(TemplateString { parts: normalised }),
        })
    }

    /// The fixed text before the first dynamic part.
    fn fixed_prefix(&self) -> &str {
        match self.parts.first() {
            Some(TemplatePart::Text(t)) => t,
            _ => "",
        }
    }

    /// The fixed text after the last dynamic part.
    fn fixed_suffix(&self) -> &str {
        match self.parts.last() {
            Some(TemplatePart::Text(t)) => t,
            _ => "",
        }
    }

    /// Sum of the fixed text lengths: a lower bound on the string length.
    fn fixed_len(&self) -> usize {
        self.parts
            .iter()
            .map(|p| match p {
                TemplatePart::Text(t) => js_length(t),
                TemplatePart::Dynamic(_) => 0,
            })
            .sum()
    }
}

fn push_text(parts: &mut Vec<TemplatePart>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(TemplatePart::Text(last)) = parts.last_mut() {
        last.push_str(text);
        return;
    }
    parts.push(TemplatePart::Text(text.to_string()));
}

fn push_dynamic(parts: &mut Vec<TemplatePart>, value: TypeValue) {
    match value {
        TypeValue::Literal(lit) => push_text(parts, &to_js_string(&lit)),
        TypeValue::Refined(refined) => {
            // Splice nested templates so concatenation stays flat.
            if let Some(template) = refined.refinement.as_any().downcast_ref::<TemplateString>() {
                for part in &template.parts {
                    match part {
                        TemplatePart::Text(t) => push_text(parts, t),
                        TemplatePart::Dynamic(v) => push_dynamic(parts, v.clone()),
                    }
                }
            } else {
                parts.push(TemplatePart::Dynamic(TypeValue::Refined(refined)));
            }
        }
        other => parts.push(TemplatePart::Dynamic(other)),
    }
}

impl Refinement for TemplateString {
    fn name(&self) -> &'static str {
        "template"
    }

    fn meta_render(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Text(t) => out.push_str(t),
                TemplatePart::Dynamic(v) => {
                    out.push_str("${");
                    out.push_str(&v.to_string());
                    out.push('}');
                }
            }
        }
        out
    }

    fn render(&self, _base: &TypeValue) -> String {
        format!("`{}`", self.meta_render())
    }

    fn check(&self, v: &LiteralValue) -> bool {
        let LiteralValue::String(s) = v else {
            return false;
        };
        // Anchored matching: leading text is a prefix, trailing text a
        // suffix, interior texts appear in order between them. Dynamic
        // parts match any run, including the empty one.
        let mut remaining: &str = s;
        let mut start = 0;
        let mut end = self.parts.len();

        if let Some(TemplatePart::Text(prefix)) = self.parts.first() {
            if !remaining.starts_with(prefix.as_str()) {
                return false;
            }
            remaining = &remaining[prefix.len()..];
            start = 1;
        }
        if end > start
            && let Some(TemplatePart::Text(suffix)) = self.parts.last()
        {
            if !remaining.ends_with(suffix.as_str()) {
                return false;
            }
            remaining = &remaining[..remaining.len() - suffix.len()];
            end -= 1;
        }

        for part in &self.parts[start..end] {
            if let TemplatePart::Text(t) = part {
                match remaining.find(t.as_str()) {
                    Some(at) => remaining = &remaining[at + t.len()..],
                    None => return false,
                }
            }
        }
        true
    }

    fn binary_op(
        &self,
        refined: &RefinedValue,
        op: BinaryOp,
        other: &TypeValue,
        self_on_left: bool,
    ) -> Dispatch {
        if op != BinaryOp::Add {
            return Dispatch::NotApplicable;
        }
        let this = TypeValue::Refined(refined.clone());
        let parts = if self_on_left {
            vec![
                TemplatePart::Dynamic(this),
                TemplatePart::Dynamic(other.clone()),
            ]
        } else {
            vec![
                TemplatePart::Dynamic(other.clone()),
                TemplatePart::Dynamic(this),
            ]
        };
        Dispatch::Applied(TemplateString::build(parts))
    }

    fn method(&self, _refined: &RefinedValue, name: &str, args: &[TypeValue]) -> Dispatch {
        match name {
            "startsWith" => {
                let Some(needle) = args.first().and_then(|a| a.as_string_lit()) else {
                    return Dispatch::NotApplicable;
                };
                let prefix = self.fixed_prefix();
                if prefix.starts_with(needle) {
                    Dispatch::Applied(TypeValue::bool_lit(true))
                } else if needle.starts_with(prefix) {
                    // The needle runs past the known prefix into dynamic
                    // territory: undecidable.
                    Dispatch::NotApplicable
                } else {
                    Dispatch::Applied(TypeValue::bool_lit(false))
                }
            }
            "endsWith" => {
                let Some(needle) = args.first().and_then(|a| a.as_string_lit()) else {
                    return Dispatch::NotApplicable;
                };
                let suffix = self.fixed_suffix();
                if suffix.ends_with(needle) {
                    Dispatch::Applied(TypeValue::bool_lit(true))
                } else if needle.ends_with(suffix) {
                    Dispatch::NotApplicable
                } else {
                    Dispatch::Applied(TypeValue::bool_lit(false))
                }
            }
            "includes" => {
                let Some(needle) = args.first().and_then(|a| a.as_string_lit()) else {
                    return Dispatch::NotApplicable;
                };
                let within_fixed = self.parts.iter().any(|p| match p {
                    TemplatePart::Text(t) => t.contains(needle),
                    TemplatePart::Dynamic(_) => false,
                });
                if within_fixed {
                    Dispatch::Applied(TypeValue::bool_lit(true))
                } else {
                    // A dynamic part could still contain it.
                    Dispatch::NotApplicable
                }
            }
            _ => Dispatch::NotApplicable,
        }
    }

    fn property(&self, _refined: &RefinedValue, name: &str) -> Dispatch {
        if name == "length" {
            let min = self.fixed_len() as f64;
            return Dispatch::Applied(NumericRange::build(Some(min), None, true));
        }
        Dispatch::NotApplicable
    }

    fn truthiness(&self) -> Option<Truthiness> {
        // Any fixed text makes the string non-empty.
        if self.fixed_len() > 0 {
            Some(Truthiness::True)
        } else {
            None
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
