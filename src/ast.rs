//! Owned syntax tree shared by the resolver and the interpreter.
//!
//! The parser copies everything it needs out of the borrowed token stream, so
//! a tree can outlive its source buffer; REPL sessions rely on this because a
//! closure declared on one line is still called on later lines.
//!
//! Nodes that reference a binding (`Variable`, `Assign`, `This`, `Super`)
//! carry an [`ExprId`].  The resolver keys its depth table by that id, never
//! by name, so two references to `x` in different scopes resolve separately.

use serde::Serialize;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity of one variable‑reference node.  Unique within the process, so
/// trees parsed at different times (REPL lines) never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A name as written in the source, with the line it appeared on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ident {
    pub name: String,
    pub line: usize,
}

impl Ident {
    pub fn new<S: Into<String>>(name: S, line: usize) -> Self {
        Ident {
            name: name.into(),
            line,
        }
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// `-`
    Negate,
    /// `!`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }
}

/// Short‑circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// Every kind of *expression*.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Literal(LiteralValue),

    /// Prefix operator: `!ready`, `-42`.
    Unary {
        operator: UnaryOp,
        right: Box<Expr>,
        line: usize,
    },

    /// Infix operator: `a + b`, `x <= y`.
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        line: usize,
    },

    Logical {
        left: Box<Expr>,
        operator: LogicalOp,
        right: Box<Expr>,
    },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    Variable {
        id: ExprId,
        name: Ident,
    },

    Assign {
        id: ExprId,
        name: Ident,
        value: Box<Expr>,
    },

    /// `callee(arguments)`; `line` is that of the closing paren.
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        line: usize,
    },

    /// `object.name`
    Get {
        object: Box<Expr>,
        name: Ident,
    },

    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Ident,
        value: Box<Expr>,
    },

    This {
        id: ExprId,
        line: usize,
    },

    /// `super.method`
    Super {
        id: ExprId,
        line: usize,
        method: Ident,
    },
}

impl Expr {
    /// Line of the token that locates this expression, if it has one.
    /// Literals carry no position.
    pub fn line(&self) -> Option<usize> {
        match self {
            Expr::Literal(_) => None,
            Expr::Unary { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Call { line, .. }
            | Expr::This { line, .. }
            | Expr::Super { line, .. } => Some(*line),
            Expr::Logical { left, .. } => left.line(),
            Expr::Grouping(inner) => inner.line(),
            Expr::Variable { name, .. }
            | Expr::Assign { name, .. }
            | Expr::Get { name, .. }
            | Expr::Set { name, .. } => Some(name.line),
        }
    }
}

/// A function or method declaration.  Shared between the tree and every
/// function value created from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Vec<Stmt>,
}

/// Every kind of *statement*.  A program is a `Vec<Stmt>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    Var {
        name: Ident,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// The only loop form; `for` is desugared by the parser.
    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Function(Rc<FunctionDecl>),

    Return {
        line: usize,
        /// Absent ⇒ `nil` (or `this` inside an initializer).
        value: Option<Expr>,
    },

    Class {
        name: Ident,
        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
