//! Programmatic AST construction.
//!
//! The builder is the AST-provider interface used by embedders and by this
//! workspace's own tests: one method per node kind, handles in, handle out.
//! Spans default to dummy; providers that track source locations call
//! [`AstBuilder::at`] after creating a node.

use jsty_common::Span;

use crate::arena::{AstArena, NodeIndex};
use crate::node::{
    ClassData, FunctionData, ImportSpecifier, MethodData, MethodKind, NodeKind, PropertyData,
    VarKind,
};
use crate::ops::{AssignOp, BinaryOp, LogicalOp, UnaryOp, UpdateOp};

#[derive(Debug, Default)]
pub struct AstBuilder {
    arena: AstArena,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            arena: AstArena::new(),
        }
    }

    fn add(&mut self, kind: NodeKind) -> NodeIndex {
        self.arena.add(kind, Span::dummy())
    }

    /// Attach a span to a freshly created node and pass the handle through.
    pub fn at(&mut self, idx: NodeIndex, span: Span) -> NodeIndex {
        self.arena.set_span(idx, span);
        idx
    }

    /// Finish building: designate the root and hand out the arena.
    pub fn finish(mut self, root: NodeIndex) -> AstArena {
        self.arena.set_root(root);
        self.arena
    }

    /// Access the arena under construction.
    pub fn arena(&self) -> &AstArena {
        &self.arena
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn number(&mut self, value: f64) -> NodeIndex {
        self.add(NodeKind::NumberLit(value))
    }

    pub fn string(&mut self, value: impl Into<String>) -> NodeIndex {
        self.add(NodeKind::StringLit(value.into()))
    }

    pub fn bool(&mut self, value: bool) -> NodeIndex {
        self.add(NodeKind::BoolLit(value))
    }

    pub fn null(&mut self) -> NodeIndex {
        self.add(NodeKind::NullLit)
    }

    pub fn bigint(&mut self, digits: impl Into<String>) -> NodeIndex {
        self.add(NodeKind::BigIntLit(digits.into()))
    }

    pub fn ident(&mut self, name: impl Into<String>) -> NodeIndex {
        self.add(NodeKind::Ident(name.into()))
    }

    pub fn undefined(&mut self) -> NodeIndex {
        self.ident("undefined")
    }

    /// `quasis` must have exactly one more element than `exprs`.
    pub fn template(&mut self, quasis: Vec<String>, exprs: Vec<NodeIndex>) -> NodeIndex {
        debug_assert_eq!(quasis.len(), exprs.len() + 1);
        self.add(NodeKind::TemplateLit { quasis, exprs })
    }

    pub fn array(&mut self, elements: Vec<Option<NodeIndex>>) -> NodeIndex {
        self.add(NodeKind::ArrayLit { elements })
    }

    pub fn object(&mut self, props: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::ObjectLit { props })
    }

    pub fn prop(&mut self, key: impl Into<String>, value: NodeIndex) -> NodeIndex {
        let key = self.ident(key);
        self.add(NodeKind::Property(PropertyData {
            key,
            value,
            computed: false,
            shorthand: false,
        }))
    }

    pub fn computed_prop(&mut self, key: NodeIndex, value: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Property(PropertyData {
            key,
            value,
            computed: true,
            shorthand: false,
        }))
    }

    pub fn spread(&mut self, arg: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Spread { arg })
    }

    pub fn unary(&mut self, op: UnaryOp, arg: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Unary { op, arg })
    }

    pub fn update(&mut self, op: UpdateOp, prefix: bool, arg: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Update { op, prefix, arg })
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Binary { op, left, right })
    }

    pub fn logical(&mut self, op: LogicalOp, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Logical { op, left, right })
    }

    pub fn assign(&mut self, target: NodeIndex, value: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Assign {
            op: AssignOp::Assign,
            target,
            value,
        })
    }

    pub fn compound_assign(
        &mut self,
        op: AssignOp,
        target: NodeIndex,
        value: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::Assign { op, target, value })
    }

    pub fn conditional(
        &mut self,
        test: NodeIndex,
        consequent: NodeIndex,
        alternate: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::Conditional {
            test,
            consequent,
            alternate,
        })
    }

    pub fn call(&mut self, callee: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Call {
            callee,
            args,
            optional: false,
        })
    }

    pub fn optional_call(&mut self, callee: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Call {
            callee,
            args,
            optional: true,
        })
    }

    pub fn new_expr(&mut self, callee: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::New { callee, args })
    }

    pub fn member(&mut self, object: NodeIndex, property: impl Into<String>) -> NodeIndex {
        let property = self.ident(property);
        self.add(NodeKind::Member {
            object,
            property,
            computed: false,
            optional: false,
        })
    }

    pub fn optional_member(&mut self, object: NodeIndex, property: impl Into<String>) -> NodeIndex {
        let property = self.ident(property);
        self.add(NodeKind::Member {
            object,
            property,
            computed: false,
            optional: true,
        })
    }

    pub fn index(&mut self, object: NodeIndex, property: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Member {
            object,
            property,
            computed: true,
            optional: false,
        })
    }

    pub fn sequence(&mut self, exprs: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Sequence { exprs })
    }

    pub fn function(
        &mut self,
        name: Option<&str>,
        params: Vec<NodeIndex>,
        body: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::Function(Box::new(FunctionData {
            name: name.map(str::to_string),
            params,
            body,
            is_async: false,
            is_arrow: false,
            expression_body: false,
        })))
    }

    pub fn async_function(
        &mut self,
        name: Option<&str>,
        params: Vec<NodeIndex>,
        body: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::Function(Box::new(FunctionData {
            name: name.map(str::to_string),
            params,
            body,
            is_async: true,
            is_arrow: false,
            expression_body: false,
        })))
    }

    /// Concise arrow: `params => body-expression`.
    pub fn arrow(&mut self, params: Vec<NodeIndex>, body: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Function(Box::new(FunctionData {
            name: None,
            params,
            body,
            is_async: false,
            is_arrow: true,
            expression_body: true,
        })))
    }

    /// Arrow with a block body.
    pub fn arrow_block(&mut self, params: Vec<NodeIndex>, body: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Function(Box::new(FunctionData {
            name: None,
            params,
            body,
            is_async: false,
            is_arrow: true,
            expression_body: false,
        })))
    }

    pub fn await_expr(&mut self, arg: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Await { arg })
    }

    // ------------------------------------------------------------------
    // Patterns
    // ------------------------------------------------------------------

    pub fn object_pattern(
        &mut self,
        props: Vec<NodeIndex>,
        rest: Option<NodeIndex>,
    ) -> NodeIndex {
        self.add(NodeKind::ObjectPattern { props, rest })
    }

    /// Shorthand `{ name }` pattern property binding `name`.
    pub fn pattern_prop(&mut self, name: impl Into<String>) -> NodeIndex {
        let name = name.into();
        let key = self.ident(name.clone());
        let value = self.ident(name);
        self.add(NodeKind::Property(PropertyData {
            key,
            value,
            computed: false,
            shorthand: true,
        }))
    }

    /// `{ key: <pattern> }` pattern property.
    pub fn pattern_prop_as(&mut self, key: impl Into<String>, value: NodeIndex) -> NodeIndex {
        let key = self.ident(key);
        self.add(NodeKind::Property(PropertyData {
            key,
            value,
            computed: false,
            shorthand: false,
        }))
    }

    pub fn array_pattern(
        &mut self,
        elements: Vec<Option<NodeIndex>>,
        rest: Option<NodeIndex>,
    ) -> NodeIndex {
        self.add(NodeKind::ArrayPattern { elements, rest })
    }

    pub fn default_pattern(&mut self, target: NodeIndex, default: NodeIndex) -> NodeIndex {
        self.add(NodeKind::AssignPattern { target, default })
    }

    pub fn rest(&mut self, arg: NodeIndex) -> NodeIndex {
        self.add(NodeKind::RestElement { arg })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn program(&mut self, body: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Program { body })
    }

    pub fn expr_stmt(&mut self, expr: NodeIndex) -> NodeIndex {
        self.add(NodeKind::ExprStmt { expr })
    }

    pub fn declarator(&mut self, pattern: NodeIndex, init: Option<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Declarator { pattern, init })
    }

    pub fn var_decl(&mut self, kind: VarKind, declarators: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::VarDecl { kind, declarators })
    }

    /// `let name = init;`
    pub fn let_decl(&mut self, name: impl Into<String>, init: NodeIndex) -> NodeIndex {
        let pattern = self.ident(name);
        let declarator = self.declarator(pattern, Some(init));
        self.var_decl(VarKind::Let, vec![declarator])
    }

    /// `const name = init;`
    pub fn const_decl(&mut self, name: impl Into<String>, init: NodeIndex) -> NodeIndex {
        let pattern = self.ident(name);
        let declarator = self.declarator(pattern, Some(init));
        self.var_decl(VarKind::Const, vec![declarator])
    }

    pub fn block(&mut self, body: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Block { body })
    }

    pub fn ret(&mut self, arg: Option<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Return { arg })
    }

    pub fn if_stmt(
        &mut self,
        test: NodeIndex,
        consequent: NodeIndex,
        alternate: Option<NodeIndex>,
    ) -> NodeIndex {
        self.add(NodeKind::If {
            test,
            consequent,
            alternate,
        })
    }

    pub fn switch(&mut self, discriminant: NodeIndex, cases: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Switch {
            discriminant,
            cases,
        })
    }

    pub fn case(&mut self, test: Option<NodeIndex>, body: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::SwitchCase { test, body })
    }

    pub fn throw(&mut self, arg: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Throw { arg })
    }

    pub fn try_stmt(
        &mut self,
        block: NodeIndex,
        handler: Option<NodeIndex>,
        finalizer: Option<NodeIndex>,
    ) -> NodeIndex {
        self.add(NodeKind::Try {
            block,
            handler,
            finalizer,
        })
    }

    pub fn catch(&mut self, param: Option<NodeIndex>, body: NodeIndex) -> NodeIndex {
        self.add(NodeKind::CatchClause { param, body })
    }

    pub fn while_stmt(&mut self, test: NodeIndex, body: NodeIndex) -> NodeIndex {
        self.add(NodeKind::While { test, body })
    }

    pub fn do_while(&mut self, body: NodeIndex, test: NodeIndex) -> NodeIndex {
        self.add(NodeKind::DoWhile { body, test })
    }

    pub fn for_stmt(
        &mut self,
        init: Option<NodeIndex>,
        test: Option<NodeIndex>,
        update: Option<NodeIndex>,
        body: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::For {
            init,
            test,
            update,
            body,
        })
    }

    pub fn for_in(&mut self, left: NodeIndex, right: NodeIndex, body: NodeIndex) -> NodeIndex {
        self.add(NodeKind::ForIn { left, right, body })
    }

    pub fn for_of(&mut self, left: NodeIndex, right: NodeIndex, body: NodeIndex) -> NodeIndex {
        self.add(NodeKind::ForOf { left, right, body })
    }

    pub fn brk(&mut self) -> NodeIndex {
        self.add(NodeKind::Break)
    }

    pub fn cont(&mut self) -> NodeIndex {
        self.add(NodeKind::Continue)
    }

    pub fn class(
        &mut self,
        name: Option<&str>,
        superclass: Option<NodeIndex>,
        methods: Vec<MethodData>,
    ) -> NodeIndex {
        self.add(NodeKind::Class(Box::new(ClassData {
            name: name.map(str::to_string),
            superclass,
            methods,
        })))
    }

    pub fn method(&mut self, key: impl Into<String>, value: NodeIndex) -> MethodData {
        MethodData {
            key: key.into(),
            value,
            kind: MethodKind::Method,
            is_static: false,
        }
    }

    pub fn constructor(&mut self, value: NodeIndex) -> MethodData {
        MethodData {
            key: "constructor".to_string(),
            value,
            kind: MethodKind::Constructor,
            is_static: false,
        }
    }

    pub fn import(
        &mut self,
        specifiers: Vec<ImportSpecifier>,
        source: impl Into<String>,
    ) -> NodeIndex {
        self.add(NodeKind::ImportDecl {
            specifiers,
            source: source.into(),
        })
    }

    pub fn export_named(
        &mut self,
        specifiers: Vec<(String, String)>,
        decl: Option<NodeIndex>,
    ) -> NodeIndex {
        self.add(NodeKind::ExportNamed { specifiers, decl })
    }

    pub fn export_default(&mut self, expr: NodeIndex) -> NodeIndex {
        self.add(NodeKind::ExportDefault { expr })
    }
}
