use std::collections::HashMap;
use std::fmt;

use crate::expr::{Expr, Literal, Param, Stmt, Symbol, Type, UnaryOpTy};
use crate::units::{UnitTable, UnitType};

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionStatement {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitDeclaration {
    pub name: Symbol,
    pub unit: UnitType,
}

/// The root of a parsed source file. Bare top-level statements run before
/// `main`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub functions: HashMap<String, FunctionStatement>,
    pub units: HashMap<String, UnitDeclaration>,
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn unit_table(&self) -> UnitTable {
        self.units
            .iter()
            .map(|(name, decl)| (name.clone(), decl.unit.clone()))
            .collect()
    }

    pub fn functions_in_source_order(&self) -> Vec<&FunctionStatement> {
        let mut functions: Vec<&FunctionStatement> = self.functions.values().collect();
        functions.sort_by_key(|func| (func.name.line, func.name.col));
        functions
    }

    pub fn units_in_source_order(&self) -> Vec<&UnitDeclaration> {
        let mut units: Vec<&UnitDeclaration> = self.units.values().collect();
        units.sort_by_key(|decl| (decl.name.line, decl.name.col));
        units
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Program {{")?;
        for decl in self.units_in_source_order() {
            writeln!(f, "  unit {}: {}", decl.name.name, decl.unit)?;
        }
        for func in self.functions_in_source_order() {
            let params: Vec<String> = func
                .params
                .iter()
                .map(|param| format!("{}: {}", param.name.name, param.ty))
                .collect();
            writeln!(
                f,
                "  {}({}) -> {} {{",
                func.name.name,
                params.join(", "),
                func.return_type
            )?;
            write_block(f, &func.body, 2)?;
            writeln!(f, "  }}")?;
        }
        write_block(f, &self.statements, 1)?;
        writeln!(f, "}}")
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, stmts: &[Stmt], depth: usize) -> fmt::Result {
    for stmt in stmts {
        write_stmt(f, stmt, depth)?;
    }
    Ok(())
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    match stmt {
        Stmt::VarDecl(decl) => writeln!(
            f,
            "{}let {}: {} = {}",
            indent, decl.name.name, decl.ty, decl.value
        ),
        Stmt::Assign(sym, value) => writeln!(f, "{}{} = {}", indent, sym.name, value),
        Stmt::If(stmt) => {
            writeln!(f, "{}if {} {{", indent, stmt.condition)?;
            write_block(f, &stmt.then_branch, depth + 1)?;
            for else_if in &stmt.else_ifs {
                writeln!(f, "{}}} else if {} {{", indent, else_if.condition)?;
                write_block(f, &else_if.body, depth + 1)?;
            }
            if let Some(else_branch) = &stmt.else_branch {
                writeln!(f, "{}}} else {{", indent)?;
                write_block(f, else_branch, depth + 1)?;
            }
            writeln!(f, "{}}}", indent)
        }
        Stmt::While(condition, body) => {
            writeln!(f, "{}while {} {{", indent, condition)?;
            write_block(f, body, depth + 1)?;
            writeln!(f, "{}}}", indent)
        }
        Stmt::Return(_, Some(value)) => writeln!(f, "{}return {}", indent, value),
        Stmt::Return(_, None) => writeln!(f, "{}return", indent),
        Stmt::Call(call) => writeln!(f, "{}{}", indent, Expr::Call(call.clone())),
        Stmt::Block(body) => {
            writeln!(f, "{}{{", indent)?;
            write_block(f, body, depth + 1)?;
            writeln!(f, "{}}}", indent)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(literal, _) => match literal {
                Literal::Int(value, Some(unit)) => write!(f, "{} {}", value, unit),
                Literal::Int(value, None) => write!(f, "{}", value),
                Literal::Float(value, Some(unit)) => write!(f, "{} {}", value, unit),
                Literal::Float(value, None) => write!(f, "{}", value),
                Literal::Bool(value) => write!(f, "{}", value),
                Literal::Str(value) => write!(f, "{:?}", value),
            },
            Expr::Unary(op, operand) => match op.ty {
                UnaryOpTy::Minus => write!(f, "(-{})", operand),
                UnaryOpTy::Not => write!(f, "(!{})", operand),
            },
            Expr::Binary(left, op, right) => write!(f, "({} {} {})", left, op.ty, right),
            Expr::Call(call) => {
                let args: Vec<String> = call.args.iter().map(|arg| arg.to_string()).collect();
                write!(f, "{}({})", call.callee.name, args.join(", "))
            }
            Expr::Variable(sym) => write!(f, "{}", sym.name),
        }
    }
}
