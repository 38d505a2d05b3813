//! Narrowing: recognising test-expression shapes and producing the
//! refined environments for the two branches of a conditional.
//!
//! Recognised shapes: `typeof x === "T"`, `x === L`, `x !== L`,
//! `x instanceof C`, `Array.isArray(x)`, `"k" in x`, discriminant tests
//! `x.k === L`, bare truthiness, and `!e` recursively swapping branches.
//! Anything else narrows nothing and both branches see the original
//! environment.

use jsty_ast::{BinaryOp, NodeIndex, NodeKind, UnaryOp};
use jsty_solver::guards::{TypeGuard, apply_guard};
use jsty_solver::types::{Env, LiteralValue, TagSet, TypeValue};

use crate::evaluator::Evaluator;

impl Evaluator<'_> {
    /// Produce `(E_true, E_false)` for a test expression. Recognised
    /// tests rebind the tested name in a fresh child frame; unrecognised
    /// tests return the environment unchanged on both sides.
    pub(crate) fn narrow(&mut self, test: NodeIndex, env: &Env) -> (Env, Env) {
        let Some((name, guard, negated)) = self.recognise_test(test, env) else {
            return (env.clone(), env.clone());
        };
        let current = env.lookup(&name);

        let true_value = apply_guard(&current, &guard, !negated, &self.ctx.idgen);
        let false_value = apply_guard(&current, &guard, negated, &self.ctx.idgen);

        let env_true = env.child();
        env_true.bind(name.clone(), true_value);
        let env_false = env.child();
        env_false.bind(name, false_value);
        (env_true, env_false)
    }

    /// Match a test expression into `(target, guard, negated)`.
    fn recognise_test(
        &self,
        test: NodeIndex,
        env: &Env,
    ) -> Option<(String, TypeGuard, bool)> {
        let kind = self.arena.get(test)?.kind.clone();
        match kind {
            NodeKind::Unary {
                op: UnaryOp::Not,
                arg,
            } => {
                let (name, guard, negated) = self.recognise_test(arg, env)?;
                Some((name, guard, !negated))
            }

            NodeKind::Binary { op, left, right }
                if matches!(op, BinaryOp::EqStrict | BinaryOp::NeqStrict) =>
            {
                let negated = op == BinaryOp::NeqStrict;
                self.recognise_equality(left, right, env)
                    .or_else(|| self.recognise_equality(right, left, env))
                    .map(|(name, guard)| (name, guard, negated))
            }

            NodeKind::Binary {
                op: BinaryOp::Instanceof,
                left,
                right,
            } => {
                let name = self.ident_name(left)?;
                let class_name = self.class_name_of(right, env)?;
                Some((name, TypeGuard::InstanceofClass(class_name), false))
            }

            NodeKind::Binary {
                op: BinaryOp::In,
                left,
                right,
            } => {
                let NodeKind::StringLit(key) = self.arena.get(left)?.kind.clone() else {
                    return None;
                };
                let name = self.ident_name(right)?;
                Some((name, TypeGuard::HasProperty(key), false))
            }

            NodeKind::Call { callee, args, .. } => {
                // Array.isArray(x) with the global unshadowed
                let NodeKind::Member {
                    object,
                    property,
                    computed: false,
                    ..
                } = self.arena.get(callee)?.kind.clone()
                else {
                    return None;
                };
                if self.ident_name(object).as_deref() != Some("Array")
                    || env.is_bound("Array")
                    || self.ident_name(property).as_deref() != Some("isArray")
                {
                    return None;
                }
                let name = self.ident_name(*args.first()?)?;
                Some((name, TypeGuard::IsArray, false))
            }

            NodeKind::Ident(name) => Some((name, TypeGuard::Truthy, false)),

            _ => None,
        }
    }

    /// One side of a strict equality: what does it test, against which
    /// literal?
    fn recognise_equality(
        &self,
        subject: NodeIndex,
        probe: NodeIndex,
        env: &Env,
    ) -> Option<(String, TypeGuard)> {
        let subject_kind = self.arena.get(subject)?.kind.clone();
        match subject_kind {
            // typeof x === "tag"
            NodeKind::Unary {
                op: UnaryOp::TypeOf,
                arg,
            } => {
                let name = self.ident_name(arg)?;
                let NodeKind::StringLit(tag) = self.arena.get(probe)?.kind.clone() else {
                    return None;
                };
                let tag = TagSet::from_tag(&tag)?;
                Some((name, TypeGuard::TypeofTag(tag)))
            }
            // x === L
            NodeKind::Ident(name) => {
                let lit = self.literal_of(probe, env)?;
                Some((name, TypeGuard::LiteralEq(lit)))
            }
            // x.k === L
            NodeKind::Member {
                object,
                property,
                computed: false,
                ..
            } => {
                let name = self.ident_name(object)?;
                let key = self.ident_name(property)?;
                let lit = self.literal_of(probe, env)?;
                Some((name, TypeGuard::PropEq(key, lit)))
            }
            _ => None,
        }
    }

    fn ident_name(&self, idx: NodeIndex) -> Option<String> {
        match &self.arena.get(idx)?.kind {
            NodeKind::Ident(name) => Some(name.clone()),
            _ => None,
        }
    }

    /// A literal the test compares against, when the node is one.
    fn literal_of(&self, idx: NodeIndex, env: &Env) -> Option<LiteralValue> {
        match &self.arena.get(idx)?.kind {
            NodeKind::NumberLit(n) => Some(LiteralValue::Number(*n)),
            NodeKind::StringLit(s) => Some(LiteralValue::String(s.clone())),
            NodeKind::BoolLit(b) => Some(LiteralValue::Boolean(*b)),
            NodeKind::NullLit => Some(LiteralValue::Null),
            NodeKind::Ident(name) if name == "undefined" && !env.is_bound(name) => {
                Some(LiteralValue::Undefined)
            }
            // A const-bound literal also works as an equality probe.
            NodeKind::Ident(name) => match env.try_lookup(name) {
                Some(TypeValue::Literal(lit)) => Some(lit),
                _ => None,
            },
            _ => None,
        }
    }
}
