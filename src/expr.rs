use std::fmt;

use crate::units::UnitType;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal, SourceLocation),
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Call(FunctionCall),
    Variable(Symbol),
}

impl Expr {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::Literal(_, location) => *location,
            Expr::Unary(op, _) => SourceLocation {
                line: op.line,
                col: op.col,
            },
            Expr::Binary(left, _, _) => left.location(),
            Expr::Call(call) => call.callee.location(),
            Expr::Variable(sym) => sym.location(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Eq, PartialEq, Hash, Clone)]
pub struct Symbol {
    pub name: String,
    pub line: usize,
    pub col: usize,
}

impl Symbol {
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            col: self.col,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub callee: Symbol,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Symbol,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: Symbol,
    pub ty: Type,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIf {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expr,
    pub then_branch: Vec<Stmt>,
    pub else_ifs: Vec<ElseIf>,
    pub else_branch: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl(VariableDeclaration),
    Assign(Symbol, Expr),
    If(IfStatement),
    While(Expr, Vec<Stmt>),
    Return(SourceLocation, Option<Expr>),
    Call(FunctionCall),
    Block(Vec<Stmt>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOpTy {
    Minus,
    Not,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UnaryOp {
    pub ty: UnaryOpTy,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOpTy {
    Or,
    And,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Plus,
    Minus,
    Star,
    Slash,
}

impl fmt::Display for BinaryOpTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOpTy::Or => "||",
            BinaryOpTy::And => "&&",
            BinaryOpTy::Equal => "==",
            BinaryOpTy::NotEqual => "!=",
            BinaryOpTy::Greater => ">",
            BinaryOpTy::GreaterEqual => ">=",
            BinaryOpTy::Less => "<",
            BinaryOpTy::LessEqual => "<=",
            BinaryOpTy::Plus => "+",
            BinaryOpTy::Minus => "-",
            BinaryOpTy::Star => "*",
            BinaryOpTy::Slash => "/",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BinaryOp {
    pub ty: BinaryOpTy,
    pub line: usize,
    pub col: usize,
}

/// Numeric literals carry their unit annotation when one was written.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64, Option<UnitType>),
    Float(f64, Option<UnitType>),
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Unit(UnitType),
    Bool,
    String,
    Void,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit(unit) => write!(f, "{}", unit),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
            Type::Void => write!(f, "void"),
        }
    }
}
