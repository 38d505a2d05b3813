//! Node kind definitions.
//!
//! One enum covers expressions, patterns, and statements; the evaluator
//! dispatches on kind and reports a malformed-AST diagnostic when a child
//! handle has an unexpected kind, rather than encoding the distinction in
//! the type system. This keeps provider bindings simple: every ES node maps
//! to exactly one variant.

use crate::arena::NodeIndex;
use crate::ops::{AssignOp, BinaryOp, LogicalOp, UnaryOp, UpdateOp};

/// `var` / `let` / `const`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

/// An object-literal property or an object-pattern property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyData {
    /// Key node: an identifier or string literal, or an arbitrary
    /// expression when `computed`.
    pub key: NodeIndex,
    /// Value expression (literal) or sub-pattern (pattern position).
    pub value: NodeIndex,
    pub computed: bool,
    pub shorthand: bool,
}

/// Function expression, declaration, or arrow.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionData {
    /// Declared name; `None` for anonymous expressions and arrows.
    pub name: Option<String>,
    /// Parameter patterns: identifiers, destructuring patterns,
    /// assignment patterns (defaults), or a trailing rest element.
    pub params: Vec<NodeIndex>,
    /// Block body, or a bare expression for concise arrows.
    pub body: NodeIndex,
    pub is_async: bool,
    pub is_arrow: bool,
    /// True when `body` is an expression rather than a block.
    pub expression_body: bool,
}

/// `constructor` vs ordinary method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Method,
}

/// A method definition inside a class body.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodData {
    pub key: String,
    /// The method's function node.
    pub value: NodeIndex,
    pub kind: MethodKind,
    pub is_static: bool,
}

/// A class declaration or expression.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassData {
    pub name: Option<String>,
    pub superclass: Option<NodeIndex>,
    pub methods: Vec<MethodData>,
}

/// One specifier of an import declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum ImportSpecifier {
    /// `import { imported as local } from "..."`
    Named { imported: String, local: String },
    /// `import local from "..."`
    Default { local: String },
    /// `import * as local from "..."`
    Namespace { local: String },
}

/// All node kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------
    NumberLit(f64),
    StringLit(String),
    BoolLit(bool),
    NullLit,
    BigIntLit(String),
    Ident(String),
    /// `quasis.len() == exprs.len() + 1`; quasis are the fixed text runs.
    TemplateLit {
        quasis: Vec<String>,
        exprs: Vec<NodeIndex>,
    },
    /// `None` elements are holes.
    ArrayLit {
        elements: Vec<Option<NodeIndex>>,
    },
    /// Property and spread nodes, in source order.
    ObjectLit {
        props: Vec<NodeIndex>,
    },
    Property(PropertyData),
    Spread {
        arg: NodeIndex,
    },
    Unary {
        op: UnaryOp,
        arg: NodeIndex,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        arg: NodeIndex,
    },
    Binary {
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    },
    Logical {
        op: LogicalOp,
        left: NodeIndex,
        right: NodeIndex,
    },
    Assign {
        op: AssignOp,
        target: NodeIndex,
        value: NodeIndex,
    },
    Conditional {
        test: NodeIndex,
        consequent: NodeIndex,
        alternate: NodeIndex,
    },
    Call {
        callee: NodeIndex,
        args: Vec<NodeIndex>,
        /// `a?.()`
        optional: bool,
    },
    New {
        callee: NodeIndex,
        args: Vec<NodeIndex>,
    },
    Member {
        object: NodeIndex,
        /// Identifier node unless `computed`, then any expression.
        property: NodeIndex,
        computed: bool,
        /// `a?.b` / `a?.[i]`
        optional: bool,
    },
    Sequence {
        exprs: Vec<NodeIndex>,
    },
    Function(Box<FunctionData>),
    Class(Box<ClassData>),
    Await {
        arg: NodeIndex,
    },

    // ------------------------------------------------------------------
    // Patterns
    // ------------------------------------------------------------------
    ObjectPattern {
        props: Vec<NodeIndex>,
        rest: Option<NodeIndex>,
    },
    ArrayPattern {
        elements: Vec<Option<NodeIndex>>,
        rest: Option<NodeIndex>,
    },
    /// `target = default` in a pattern position.
    AssignPattern {
        target: NodeIndex,
        default: NodeIndex,
    },
    RestElement {
        arg: NodeIndex,
    },

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------
    Program {
        body: Vec<NodeIndex>,
    },
    ExprStmt {
        expr: NodeIndex,
    },
    VarDecl {
        kind: VarKind,
        declarators: Vec<NodeIndex>,
    },
    Declarator {
        pattern: NodeIndex,
        init: Option<NodeIndex>,
    },
    Block {
        body: Vec<NodeIndex>,
    },
    Return {
        arg: Option<NodeIndex>,
    },
    If {
        test: NodeIndex,
        consequent: NodeIndex,
        alternate: Option<NodeIndex>,
    },
    Switch {
        discriminant: NodeIndex,
        cases: Vec<NodeIndex>,
    },
    /// `test` is `None` for `default:`.
    SwitchCase {
        test: Option<NodeIndex>,
        body: Vec<NodeIndex>,
    },
    Throw {
        arg: NodeIndex,
    },
    Try {
        block: NodeIndex,
        handler: Option<NodeIndex>,
        finalizer: Option<NodeIndex>,
    },
    CatchClause {
        /// Catch binding pattern; `None` for `catch {}`.
        param: Option<NodeIndex>,
        body: NodeIndex,
    },
    While {
        test: NodeIndex,
        body: NodeIndex,
    },
    DoWhile {
        body: NodeIndex,
        test: NodeIndex,
    },
    For {
        init: Option<NodeIndex>,
        test: Option<NodeIndex>,
        update: Option<NodeIndex>,
        body: NodeIndex,
    },
    /// `left` is a single-declarator `VarDecl` or a bare pattern.
    ForIn {
        left: NodeIndex,
        right: NodeIndex,
        body: NodeIndex,
    },
    ForOf {
        left: NodeIndex,
        right: NodeIndex,
        body: NodeIndex,
    },
    Break,
    Continue,
    ImportDecl {
        specifiers: Vec<ImportSpecifier>,
        source: String,
    },
    /// `export { local as exported, ... }` or `export <decl>`.
    ExportNamed {
        specifiers: Vec<(String, String)>,
        decl: Option<NodeIndex>,
    },
    ExportDefault {
        expr: NodeIndex,
    },
}

impl NodeKind {
    /// Whether this kind can appear in expression position.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::NumberLit(_)
                | NodeKind::StringLit(_)
                | NodeKind::BoolLit(_)
                | NodeKind::NullLit
                | NodeKind::BigIntLit(_)
                | NodeKind::Ident(_)
                | NodeKind::TemplateLit { .. }
                | NodeKind::ArrayLit { .. }
                | NodeKind::ObjectLit { .. }
                | NodeKind::Unary { .. }
                | NodeKind::Update { .. }
                | NodeKind::Binary { .. }
                | NodeKind::Logical { .. }
                | NodeKind::Assign { .. }
                | NodeKind::Conditional { .. }
                | NodeKind::Call { .. }
                | NodeKind::New { .. }
                | NodeKind::Member { .. }
                | NodeKind::Sequence { .. }
                | NodeKind::Function(_)
                | NodeKind::Class(_)
                | NodeKind::Await { .. }
        )
    }

    /// Whether this kind can appear in binding-pattern position.
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            NodeKind::Ident(_)
                | NodeKind::ObjectPattern { .. }
                | NodeKind::ArrayPattern { .. }
                | NodeKind::AssignPattern { .. }
                | NodeKind::RestElement { .. }
        )
    }
}
