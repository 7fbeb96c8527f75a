use std::{
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};

use compact_str::CompactString;

use crate::number::Number;

use super::{IdentName, Params};

#[derive(PartialEq, Debug, Eq, Clone)]
pub struct Ident {
    pub name: IdentName,
}

impl Hash for Ident {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Ident {
    pub fn new(name: &str) -> Self {
        Self {
            name: CompactString::from(name),
        }
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.name)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Literal {
    String(String),
    Number(Number),
    Bool(bool),
    Nil,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
        };
        write!(f, "{}", op)
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let op = match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        };
        write!(f, "{}", op)
    }
}

/// Expression variants. Children are owned (`Box`/`Vec`) so optimization
/// passes can rewrite subtrees in place through `&mut`.
#[derive(PartialEq, Debug, Clone)]
pub enum Expr {
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Literal(Literal),
    Variable(Ident),
    /// Logical and over exactly two operands.
    And(Box<Expr>, Box<Expr>),
    /// Logical or over exactly two operands.
    Or(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Get(Box<Expr>, Ident),
    Set(Box<Expr>, Ident, Box<Expr>),
    Assign(Ident, Box<Expr>),
    This,
    Super(Ident),
}

/// Statement variants. An omitted `else` branch is represented as
/// `Stmt::NoOp` by the external transformer.
#[derive(PartialEq, Debug, Clone)]
pub enum Stmt {
    Expression(Expr),
    Print(Expr),
    Return(Expr),
    Var(Ident, Expr),
    If(Expr, Box<Stmt>, Box<Stmt>),
    While(Expr, Box<Stmt>),
    Block(Vec<Stmt>),
    Function(Ident, Params, Vec<Stmt>),
    Class(Ident),
    NoOp,
}
