//! Numeric-range refinement.
//!
//! An interval over `number`, optionally integer-constrained. Produced by
//! template-string `length` reads and usable by hosts for bounded inputs.
//! Comparisons against a numeric literal decide when the whole interval
//! sits on one side of the literal.

use std::any::Any;
use std::rc::Rc;

use jsty_ast::BinaryOp;

use crate::display::format_number;
use crate::refine::{Dispatch, Refinement};
use crate::types::{LiteralValue, RefinedValue, Truthiness, TypeValue};

#[derive(Clone, Debug)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub integer: bool,
}

impl NumericRange {
    /// Build a number type value constrained to `[min, max]`. A degenerate
    /// interval collapses to a literal, an inverted one to `never`, and a
    /// fully unconstrained non-integer range to plain `number`.
    pub fn build(min: Option<f64>, max: Option<f64>, integer: bool) -> TypeValue {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return TypeValue::Never;
            }
            if lo == hi {
                return TypeValue::number_lit(lo);
            }
        }
        if min.is_none() && max.is_none() && !integer {
            return TypeValue::number();
        }
        TypeValue::Refined(RefinedValue {
            base: Box::new(TypeValue::number()),
            refinement: Rc::new(NumericRange { min, max, integer }),
        })
    }
}

impl Refinement for NumericRange {
    fn name(&self) -> &'static str {
        "range"
    }

    fn meta_render(&self) -> String {
        let lo = self.min.map(format_number).unwrap_or_default();
        let hi = self.max.map(format_number).unwrap_or_default();
        format!("{lo}..{hi}")
    }

    fn render(&self, _base: &TypeValue) -> String {
        let base = if self.integer { "int" } else { "number" };
        format!("{base}({})", self.meta_render())
    }

    fn check(&self, v: &LiteralValue) -> bool {
        let LiteralValue::Number(n) = v else {
            return false;
        };
        if n.is_nan() {
            return false;
        }
        if self.integer && n.fract() != 0.0 {
            return false;
        }
        if let Some(lo) = self.min
            && *n < lo
        {
            return false;
        }
        if let Some(hi) = self.max
            && *n > hi
        {
            return false;
        }
        true
    }

    fn binary_op(
        &self,
        _refined: &RefinedValue,
        op: BinaryOp,
        other: &TypeValue,
        self_on_left: bool,
    ) -> Dispatch {
        if !op.is_ordering() {
            return Dispatch::NotApplicable;
        }
        let Some(lit) = other.as_number_lit() else {
            return Dispatch::NotApplicable;
        };
        if lit.is_nan() {
            // Every ordering against NaN is false.
            return Dispatch::Applied(TypeValue::bool_lit(false));
        }

        // Normalise to `self <op> lit`.
        let op = if self_on_left { op } else { flip(op) };
        let decided = match op {
            BinaryOp::Lt => self.decide(|hi| hi < lit, |lo| lo >= lit),
            BinaryOp::Le => self.decide(|hi| hi <= lit, |lo| lo > lit),
            BinaryOp::Gt => self.decide_lo(|lo| lo > lit, |hi| hi <= lit),
            BinaryOp::Ge => self.decide_lo(|lo| lo >= lit, |hi| hi < lit),
            _ => None,
        };
        match decided {
            Some(answer) => Dispatch::Applied(TypeValue::bool_lit(answer)),
            None => Dispatch::NotApplicable,
        }
    }

    fn truthiness(&self) -> Option<Truthiness> {
        // The interval excludes zero (and NaN fails the membership check),
        // so every member is truthy.
        let above = self.min.is_some_and(|lo| lo > 0.0);
        let below = self.max.is_some_and(|hi| hi < 0.0);
        if above || below {
            Some(Truthiness::True)
        } else {
            None
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NumericRange {
    /// Decide an upper-bound-first comparison: `yes(max)` proves it for
    /// the whole interval, `no(min)` refutes it.
    fn decide(&self, yes: impl Fn(f64) -> bool, no: impl Fn(f64) -> bool) -> Option<bool> {
        if let Some(hi) = self.max
            && yes(hi)
        {
            return Some(true);
        }
        if let Some(lo) = self.min
            && no(lo)
        {
            return Some(false);
        }
        None
    }

    /// Decide a lower-bound-first comparison: `yes(min)` proves it,
    /// `no(max)` refutes it.
    fn decide_lo(&self, yes: impl Fn(f64) -> bool, no: impl Fn(f64) -> bool) -> Option<bool> {
        if let Some(lo) = self.min
            && yes(lo)
        {
            return Some(true);
        }
        if let Some(hi) = self.max
            && no(hi)
        {
            return Some(false);
        }
        None
    }
}

fn flip(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Lt => BinaryOp::Gt,
        BinaryOp::Le => BinaryOp::Ge,
        BinaryOp::Gt => BinaryOp::Lt,
        BinaryOp::Ge => BinaryOp::Le,
        other => other,
    }
}
