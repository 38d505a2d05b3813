use super::*;
use crate::builder::AstBuilder;
use crate::node::NodeKind;
use crate::ops::BinaryOp;
use jsty_common::Span;

#[test]
fn test_build_binary_expression() {
    // a - b
    let mut b = AstBuilder::new();
    let left = b.ident("a");
    let right = b.ident("b");
    let sub = b.binary(BinaryOp::Sub, left, right);
    let stmt = b.expr_stmt(sub);
    let program = b.program(vec![stmt]);
    let arena = b.finish(program);

    assert_eq!(arena.root(), program);
    match arena.kind(sub) {
        NodeKind::Binary { op, left, right } => {
            assert_eq!(*op, BinaryOp::Sub);
            assert_eq!(arena.kind(*left), &NodeKind::Ident("a".to_string()));
            assert_eq!(arena.kind(*right), &NodeKind::Ident("b".to_string()));
        }
        other => panic!("expected binary node, got {other:?}"),
    }
}

#[test]
fn test_build_function_with_spans() {
    // function id(x) { return x; }
    let mut b = AstBuilder::new();
    let param = b.ident("x");
    let arg = b.ident("x");
    let ret = b.ret(Some(arg));
    let body = b.block(vec![ret]);
    let f = b.function(Some("id"), vec![param], body);
    let f = b.at(f, Span::new(0, 27));
    let program = b.program(vec![f]);
    let arena = b.finish(program);

    assert_eq!(arena.span(f), Span::new(0, 27));
    match arena.kind(f) {
        NodeKind::Function(data) => {
            assert_eq!(data.name.as_deref(), Some("id"));
            assert_eq!(data.params.len(), 1);
            assert!(!data.is_arrow);
        }
        other => panic!("expected function node, got {other:?}"),
    }
}

#[test]
fn test_shorthand_pattern_prop_binds_same_name() {
    let mut b = AstBuilder::new();
    let prop = b.pattern_prop("count");
    let pattern = b.object_pattern(vec![prop], None);
    let program = b.program(vec![]);
    let arena = b.finish(program);

    match arena.kind(pattern) {
        NodeKind::ObjectPattern { props, rest } => {
            assert!(rest.is_none());
            match arena.kind(props[0]) {
                NodeKind::Property(data) => {
                    assert!(data.shorthand);
                    assert_eq!(arena.kind(data.key), &NodeKind::Ident("count".to_string()));
                    assert_eq!(
                        arena.kind(data.value),
                        &NodeKind::Ident("count".to_string())
                    );
                }
                other => panic!("expected property, got {other:?}"),
            }
        }
        other => panic!("expected object pattern, got {other:?}"),
    }
}

#[test]
fn test_template_quasi_invariant() {
    // `pre${x}post`
    let mut b = AstBuilder::new();
    let x = b.ident("x");
    let template = b.template(vec!["pre".to_string(), "post".to_string()], vec![x]);
    match b.arena().kind(template) {
        NodeKind::TemplateLit { quasis, exprs } => {
            assert_eq!(quasis.len(), exprs.len() + 1);
        }
        other => panic!("expected template literal, got {other:?}"),
    }
}
