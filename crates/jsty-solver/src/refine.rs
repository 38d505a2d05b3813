//! Refinement framework.
//!
//! A refinement names a subset of a base type value and can override parts
//! of the algebra: binary operators, method calls, property reads, and the
//! membership predicate used by subtyping and narrowing. Handlers receive
//! the full refined value (so they can read their own metadata) and either
//! apply or decline; declining falls through to the refinement's base,
//! layer by layer, down to the primitive semantics.
//!
//! Refinement identity is `(name, rendered metadata)`; two template-string
//! refinements with the same parts are the same refinement.

use std::any::Any;

use jsty_ast::BinaryOp;

use crate::types::{LiteralValue, RefinedValue, Truthiness, TypeValue};

/// Result of offering an operation to a refinement handler.
///
/// `NotApplicable` is a first-class outcome, not an error: it routes
/// dispatch to the next layer down.
#[derive(Clone, Debug)]
pub enum Dispatch {
    Applied(TypeValue),
    NotApplicable,
}

pub trait Refinement: std::fmt::Debug {
    /// Display name; part of refinement identity.
    fn name(&self) -> &'static str;

    /// Canonical rendering of the metadata bag; part of refinement
    /// identity and of the refined value's display form.
    fn meta_render(&self) -> String;

    /// Full display form of a value refined by this refinement.
    fn render(&self, _base: &TypeValue) -> String {
        format!("{}({})", self.name(), self.meta_render())
    }

    /// Membership predicate: whether the concrete value `v` belongs to
    /// the refined subset. Absent knowledge is `false`: refinements
    /// answer for their own subset only.
    fn check(&self, v: &LiteralValue) -> bool;

    /// Binary operator hook. `self_on_left` tells the handler which side
    /// the refined value sits on.
    fn binary_op(
        &self,
        _refined: &RefinedValue,
        _op: BinaryOp,
        _other: &TypeValue,
        _self_on_left: bool,
    ) -> Dispatch {
        Dispatch::NotApplicable
    }

    /// Method call hook.
    fn method(&self, _refined: &RefinedValue, _name: &str, _args: &[TypeValue]) -> Dispatch {
        Dispatch::NotApplicable
    }

    /// Property read hook.
    fn property(&self, _refined: &RefinedValue, _name: &str) -> Dispatch {
        Dispatch::NotApplicable
    }

    /// Truthiness decision, when the refinement can make one.
    fn truthiness(&self) -> Option<Truthiness> {
        None
    }

    /// Downcasting support for refinement-to-refinement operations
    /// (template concatenation).
    fn as_any(&self) -> &dyn Any;
}

/// Truthiness contributed by the outermost refinement, if decided.
pub fn refinement_truthiness(refined: &RefinedValue) -> Option<Truthiness> {
    refined.refinement.truthiness()
}
