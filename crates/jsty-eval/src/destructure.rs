//! Binding patterns: identifiers, object/array destructuring, defaults,
//! rest elements.
//!
//! Used by variable declarations, parameters, catch clauses, and
//! destructuring assignment. Reading a field off a nullish value during
//! destructuring contributes the same `TypeError` effect as any other
//! member access.

use indexmap::IndexMap;

use jsty_ast::{NodeIndex, NodeKind};
use jsty_common::Span;
use jsty_solver::ops_object::member_access;
use jsty_solver::simplify::without_undefined;
use jsty_solver::types::{Env, ObjectRef, Truthiness, TypeValue};

use crate::evaluator::Evaluator;

impl Evaluator<'_> {
    /// Bind `value` against a pattern. `declare` binds into the current
    /// frame (declarations, parameters); otherwise existing bindings are
    /// updated (destructuring assignment).
    pub(crate) fn bind_pattern(
        &mut self,
        pattern: NodeIndex,
        value: TypeValue,
        env: &Env,
        declare: bool,
        thrown: &mut Vec<TypeValue>,
    ) {
        let Some(node) = self.arena.get(pattern) else {
            self.report_malformed(Span::dummy(), "pattern handle out of range");
            return;
        };
        let span = node.span;
        match node.kind.clone() {
            NodeKind::Ident(name) => {
                if declare {
                    env.bind(name, value);
                } else if !env.update(&name, value.clone()) {
                    env.bind(name, value);
                }
            }
            NodeKind::AssignPattern { target, default } => {
                let value = self.apply_default(value, default, env, thrown);
                self.bind_pattern(target, value, env, declare, thrown);
            }
            NodeKind::ObjectPattern { props, rest } => {
                self.bind_object_pattern(&props, rest, value, env, declare, thrown);
            }
            NodeKind::ArrayPattern { elements, rest } => {
                self.bind_array_pattern(&elements, rest, value, env, declare, thrown);
            }
            NodeKind::RestElement { arg } => {
                // A bare rest outside its container binds what is left,
                // which is the whole value here.
                self.bind_pattern(arg, value, env, declare, thrown);
            }
            _ => self.report_malformed(span, "node kind is not a binding pattern"),
        }
    }

    /// Default values apply exactly when the bound value is `undefined`.
    fn apply_default(
        &mut self,
        value: TypeValue,
        default: NodeIndex,
        env: &Env,
        thrown: &mut Vec<TypeValue>,
    ) -> TypeValue {
        let is_undefined = match &value {
            TypeValue::Literal(jsty_solver::types::LiteralValue::Undefined) => Truthiness::True,
            TypeValue::Union(members) => {
                if members.iter().any(|m| {
                    matches!(
                        m,
                        TypeValue::Literal(jsty_solver::types::LiteralValue::Undefined)
                    )
                }) {
                    Truthiness::Unknown
                } else {
                    Truthiness::False
                }
            }
            TypeValue::Unknown => Truthiness::Unknown,
            _ => Truthiness::False,
        };
        match is_undefined {
            Truthiness::False => value,
            Truthiness::True => self
                .operand(default, env, thrown)
                .unwrap_or(TypeValue::Never),
            Truthiness::Unknown => {
                let default_value = self
                    .operand(default, env, thrown)
                    .unwrap_or(TypeValue::Never);
                TypeValue::union2(without_undefined(&value), default_value)
            }
        }
    }

    fn bind_object_pattern(
        &mut self,
        props: &[NodeIndex],
        rest: Option<NodeIndex>,
        value: TypeValue,
        env: &Env,
        declare: bool,
        thrown: &mut Vec<TypeValue>,
    ) {
        let mut used_keys: Vec<String> = Vec::new();
        for &prop in props {
            let Some(NodeKind::Property(data)) = self.arena.get(prop).map(|n| n.kind.clone())
            else {
                self.report_malformed(self.arena.span(prop), "expected pattern property");
                continue;
            };
            let key = match self.property_key(&data, env, thrown) {
                Ok(Some(key)) => key,
                Ok(None) => continue,
                Err(()) => return,
            };
            let access = member_access(
                &value,
                &TypeValue::string_lit(key.clone()),
                &self.ctx.idgen,
                false,
            );
            thrown.push(access.throws);
            used_keys.push(key);
            self.bind_pattern(data.value, access.value, env, declare, thrown);
        }

        if let Some(rest) = rest {
            let rest_value = match value.refined_base() {
                TypeValue::Object(obj) => {
                    let remaining: IndexMap<String, TypeValue> = obj
                        .0
                        .borrow()
                        .props
                        .iter()
                        .filter(|(key, _)| !used_keys.contains(key))
                        .map(|(key, prop)| (key.clone(), prop.clone()))
                        .collect();
                    TypeValue::Object(ObjectRef::new(&self.ctx.idgen, remaining))
                }
                _ => TypeValue::Unknown,
            };
            let rest_target = match self.arena.get(rest).map(|n| n.kind.clone()) {
                Some(NodeKind::RestElement { arg }) => arg,
                _ => rest,
            };
            self.bind_pattern(rest_target, rest_value, env, declare, thrown);
        }
    }

    fn bind_array_pattern(
        &mut self,
        elements: &[Option<NodeIndex>],
        rest: Option<NodeIndex>,
        value: TypeValue,
        env: &Env,
        declare: bool,
        thrown: &mut Vec<TypeValue>,
    ) {
        for (i, element) in elements.iter().enumerate() {
            let Some(element) = element else {
                continue; // hole
            };
            let access = member_access(
                &value,
                &TypeValue::number_lit(i as f64),
                &self.ctx.idgen,
                false,
            );
            thrown.push(access.throws);
            self.bind_pattern(*element, access.value, env, declare, thrown);
        }

        if let Some(rest) = rest {
            let rest_value = match &value {
                TypeValue::Tuple(elems) => {
                    let remaining = elems.iter().skip(elements.len()).cloned().collect();
                    TypeValue::Tuple(remaining)
                }
                TypeValue::Array(elem) => TypeValue::Array(elem.clone()),
                _ => TypeValue::Unknown,
            };
            let rest_target = match self.arena.get(rest).map(|n| n.kind.clone()) {
                Some(NodeKind::RestElement { arg }) => arg,
                _ => rest,
            };
            self.bind_pattern(rest_target, rest_value, env, declare, thrown);
        }
    }
}
