//! Static checking of a parsed [`Program`]: scoping of variables and
//! functions, and dimensional consistency of every operation.

use std::collections::HashSet;
use std::fmt;

use crate::builtins;
use crate::expr::{
    BinaryOp, BinaryOpTy, Expr, FunctionCall, Literal, SourceLocation, Stmt, Type, UnaryOpTy,
};
use crate::parser::ast::{FunctionStatement, Program};
use crate::scanner::TokenPosition;
use crate::scope::{CallStack, Scope};
use crate::units::{self, Unit, UnitError, UnitTable, UnitType};

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    VariableRedeclaration {
        name: String,
        location: SourceLocation,
    },
    VariableUndeclared {
        name: String,
        location: SourceLocation,
    },
    FunctionUndeclared {
        name: String,
        location: SourceLocation,
    },
    UnitUndeclared {
        name: String,
        location: SourceLocation,
    },
    RecursiveUnitDefinition {
        name: String,
        location: SourceLocation,
    },
    UnitPowerOverflow {
        name: String,
        location: SourceLocation,
    },
    TypeMismatch {
        expected: Type,
        found: Type,
        location: SourceLocation,
    },
    UnpermittedOperation {
        operation: String,
        operands: Vec<Type>,
        location: SourceLocation,
    },
    WrongNumberOfArguments {
        name: String,
        expected: usize,
        found: usize,
        location: SourceLocation,
    },
    NotValidReturnType {
        function: String,
        expected: Type,
        found: Type,
        location: SourceLocation,
    },
    NotUniqueParameterNames {
        function: String,
        parameter: String,
        location: SourceLocation,
    },
}

impl Error {
    pub fn position(&self) -> TokenPosition {
        let location = match self {
            Error::VariableRedeclaration { location, .. }
            | Error::VariableUndeclared { location, .. }
            | Error::FunctionUndeclared { location, .. }
            | Error::UnitUndeclared { location, .. }
            | Error::RecursiveUnitDefinition { location, .. }
            | Error::UnitPowerOverflow { location, .. }
            | Error::TypeMismatch { location, .. }
            | Error::UnpermittedOperation { location, .. }
            | Error::WrongNumberOfArguments { location, .. }
            | Error::NotValidReturnType { location, .. }
            | Error::NotUniqueParameterNames { location, .. } => location,
        };
        TokenPosition::new(location.line, location.col)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::VariableRedeclaration { name, .. } => write!(f, "'{}' is already declared", name),
            Error::VariableUndeclared { name, .. } => write!(f, "'{}' is not declared", name),
            Error::FunctionUndeclared { name, .. } => {
                write!(f, "function '{}' is not declared", name)
            }
            Error::UnitUndeclared { name, .. } => write!(f, "unit '{}' is not declared", name),
            Error::RecursiveUnitDefinition { name, .. } => {
                write!(f, "unit '{}' is defined in terms of itself", name)
            }
            Error::UnitPowerOverflow { name, .. } => {
                write!(f, "power of unit '{}' is out of range", name)
            }
            Error::TypeMismatch {
                expected, found, ..
            } => write!(f, "expected type {} but found {}", expected, found),
            Error::UnpermittedOperation {
                operation,
                operands,
                ..
            } => match operands.as_slice() {
                [operand] => write!(f, "operation '{}' is not permitted on {}", operation, operand),
                [left, right] => write!(
                    f,
                    "operation '{}' is not permitted between {} and {}",
                    operation, left, right
                ),
                _ => {
                    let operands: Vec<String> = operands.iter().map(|ty| ty.to_string()).collect();
                    write!(
                        f,
                        "operation '{}' is not permitted with ({})",
                        operation,
                        operands.join(", ")
                    )
                }
            },
            Error::WrongNumberOfArguments {
                name,
                expected,
                found,
                ..
            } => write!(
                f,
                "'{}' expects {} arguments but was given {}",
                name, expected, found
            ),
            Error::NotValidReturnType {
                function,
                expected,
                found,
                ..
            } => write!(
                f,
                "'{}' must return {} but returns {}",
                function, expected, found
            ),
            Error::NotUniqueParameterNames {
                function,
                parameter,
                ..
            } => write!(
                f,
                "parameter '{}' of '{}' is declared more than once",
                parameter, function
            ),
        }
    }
}

impl std::error::Error for Error {}

pub fn analyze(program: &Program) -> Result<(), Error> {
    Analyzer::new(program).run()
}

struct CurrentFunction {
    name: String,
    return_type: Type,
}

pub struct Analyzer<'a> {
    program: &'a Program,
    units: UnitTable,
    stack: CallStack<Type>,
    function: Option<CurrentFunction>,
}

impl<'a> Analyzer<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self {
            program,
            units: program.unit_table(),
            stack: CallStack::default(),
            function: None,
        }
    }

    pub fn run(&mut self) -> Result<(), Error> {
        let program = self.program;
        for decl in program.units_in_source_order() {
            let own = UnitType::new(vec![Unit::new(&decl.name.name, 1)]);
            self.check_unit(&own, decl.name.location())?;
        }

        for stmt in &program.statements {
            self.statement(stmt)?;
        }

        for func in program.functions_in_source_order() {
            self.function_statement(func)?;
        }

        if let Some(main) = program.functions.get("main") {
            if !main.params.is_empty() {
                return Err(Error::WrongNumberOfArguments {
                    name: main.name.name.clone(),
                    expected: 0,
                    found: main.params.len(),
                    location: main.name.location(),
                });
            }
        }

        Ok(())
    }

    fn unit_error(err: UnitError, location: SourceLocation) -> Error {
        match err {
            UnitError::Undeclared(name) => Error::UnitUndeclared { name, location },
            UnitError::Recursive(name) => Error::RecursiveUnitDefinition { name, location },
            UnitError::PowerOverflow(name) => Error::UnitPowerOverflow { name, location },
        }
    }

    fn check_unit(&self, unit: &UnitType, location: SourceLocation) -> Result<(), Error> {
        units::expand(unit, &self.units)
            .map(|_| ())
            .map_err(|err| Self::unit_error(err, location))
    }

    fn check_type(&self, ty: &Type, location: SourceLocation) -> Result<(), Error> {
        match ty {
            Type::Unit(unit) => self.check_unit(unit, location),
            _ => Ok(()),
        }
    }

    fn same_type(&self, left: &Type, right: &Type, location: SourceLocation) -> Result<bool, Error> {
        match (left, right) {
            (Type::Unit(l), Type::Unit(r)) => units::equivalent(l, r, &self.units)
                .map_err(|err| Self::unit_error(err, location)),
            (Type::Bool, Type::Bool) | (Type::String, Type::String) | (Type::Void, Type::Void) => {
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn expect_type(&self, expected: &Type, found: Type, location: SourceLocation) -> Result<(), Error> {
        if self.same_type(expected, &found, location)? {
            return Ok(());
        }
        Err(Error::TypeMismatch {
            expected: expected.clone(),
            found,
            location,
        })
    }

    fn function_statement(&mut self, func: &FunctionStatement) -> Result<(), Error> {
        let mut seen = HashSet::new();
        let mut parameters = Scope::new();
        for param in &func.params {
            if !seen.insert(param.name.name.as_str()) {
                return Err(Error::NotUniqueParameterNames {
                    function: func.name.name.clone(),
                    parameter: param.name.name.clone(),
                    location: param.name.location(),
                });
            }
            self.check_type(&param.ty, param.name.location())?;
            parameters.insert(param.name.name.clone(), param.ty.clone());
        }
        self.check_type(&func.return_type, func.name.location())?;

        self.function = Some(CurrentFunction {
            name: func.name.name.clone(),
            return_type: func.return_type.clone(),
        });
        self.stack.enter_call(parameters);
        let result = func.body.iter().try_for_each(|stmt| self.statement(stmt));
        self.stack.exit_call();
        self.function = None;

        result
    }

    fn block(&mut self, stmts: &[Stmt]) -> Result<(), Error> {
        self.stack.current_mut().push_scope();
        let result = stmts.iter().try_for_each(|stmt| self.statement(stmt));
        self.stack.current_mut().pop_scope();
        result
    }

    fn condition(&mut self, condition: &Expr) -> Result<(), Error> {
        let ty = self.expression(condition)?;
        self.expect_type(&Type::Bool, ty, condition.location())
    }

    fn statement(&mut self, stmt: &Stmt) -> Result<(), Error> {
        match stmt {
            Stmt::VarDecl(decl) => {
                if self.stack.current().is_declared(&decl.name.name) {
                    return Err(Error::VariableRedeclaration {
                        name: decl.name.name.clone(),
                        location: decl.name.location(),
                    });
                }
                self.check_type(&decl.ty, decl.name.location())?;
                let value_ty = self.expression(&decl.value)?;
                self.expect_type(&decl.ty, value_ty, decl.value.location())?;
                self.stack
                    .current_mut()
                    .declare(&decl.name.name, decl.ty.clone());
                Ok(())
            }
            Stmt::Assign(sym, value) => {
                let target = match self.stack.current().lookup(&sym.name) {
                    Some(ty) => ty.clone(),
                    None => {
                        return Err(Error::VariableUndeclared {
                            name: sym.name.clone(),
                            location: sym.location(),
                        })
                    }
                };
                let value_ty = self.expression(value)?;
                self.expect_type(&target, value_ty, value.location())
            }
            Stmt::If(stmt) => {
                self.condition(&stmt.condition)?;
                self.block(&stmt.then_branch)?;
                for else_if in &stmt.else_ifs {
                    self.condition(&else_if.condition)?;
                    self.block(&else_if.body)?;
                }
                if let Some(else_branch) = &stmt.else_branch {
                    self.block(else_branch)?;
                }
                Ok(())
            }
            Stmt::While(condition, body) => {
                self.condition(condition)?;
                self.block(body)
            }
            Stmt::Return(location, value) => self.return_statement(*location, value.as_ref()),
            Stmt::Call(call) => self.call(call).map(|_| ()),
            Stmt::Block(body) => self.block(body),
        }
    }

    fn return_statement(&mut self, location: SourceLocation, value: Option<&Expr>) -> Result<(), Error> {
        let found = match value {
            Some(expr) => self.expression(expr)?,
            None => Type::Void,
        };
        let (function, expected) = match &self.function {
            Some(current) => (current.name.clone(), current.return_type.clone()),
            None => (String::new(), Type::Void),
        };

        if self.same_type(&expected, &found, location)? {
            return Ok(());
        }
        Err(Error::NotValidReturnType {
            function,
            expected,
            found,
            location,
        })
    }

    fn call(&mut self, call: &FunctionCall) -> Result<Type, Error> {
        let name = &call.callee.name;
        let location = call.callee.location();

        if let Some(builtin) = builtins::lookup(name) {
            if call.args.len() != builtin.arity {
                return Err(Error::WrongNumberOfArguments {
                    name: name.clone(),
                    expected: builtin.arity,
                    found: call.args.len(),
                    location,
                });
            }
            let arg_types = call
                .args
                .iter()
                .map(|arg| self.expression(arg))
                .collect::<Result<Vec<_>, _>>()?;
            return (builtin.signature)(&self.units, &arg_types, &call.args).ok_or(
                Error::UnpermittedOperation {
                    operation: name.clone(),
                    operands: arg_types,
                    location,
                },
            );
        }

        let program = self.program;
        let func = match program.functions.get(name) {
            Some(func) => func,
            None => {
                return Err(Error::FunctionUndeclared {
                    name: name.clone(),
                    location,
                })
            }
        };
        if call.args.len() != func.params.len() {
            return Err(Error::WrongNumberOfArguments {
                name: name.clone(),
                expected: func.params.len(),
                found: call.args.len(),
                location,
            });
        }
        for (arg, param) in call.args.iter().zip(&func.params) {
            let arg_ty = self.expression(arg)?;
            self.expect_type(&param.ty, arg_ty, arg.location())?;
        }

        Ok(func.return_type.clone())
    }

    pub fn expression(&mut self, expr: &Expr) -> Result<Type, Error> {
        match expr {
            Expr::Literal(literal, location) => match literal {
                Literal::Int(_, unit) | Literal::Float(_, unit) => match unit {
                    Some(unit) => {
                        self.check_unit(unit, *location)?;
                        Ok(Type::Unit(unit.clone()))
                    }
                    None => Ok(Type::Unit(UnitType::dimensionless())),
                },
                Literal::Bool(_) => Ok(Type::Bool),
                Literal::Str(_) => Ok(Type::String),
            },
            Expr::Variable(sym) => match self.stack.current().lookup(&sym.name) {
                Some(ty) => Ok(ty.clone()),
                None => Err(Error::VariableUndeclared {
                    name: sym.name.clone(),
                    location: sym.location(),
                }),
            },
            Expr::Call(call) => self.call(call),
            Expr::Unary(op, operand) => {
                let ty = self.expression(operand)?;
                match (op.ty, ty) {
                    (UnaryOpTy::Minus, Type::Unit(unit)) => Ok(Type::Unit(unit)),
                    (UnaryOpTy::Not, Type::Bool) => Ok(Type::Bool),
                    (op_ty, ty) => Err(Error::UnpermittedOperation {
                        operation: match op_ty {
                            UnaryOpTy::Minus => "-".to_string(),
                            UnaryOpTy::Not => "!".to_string(),
                        },
                        operands: vec![ty],
                        location: SourceLocation {
                            line: op.line,
                            col: op.col,
                        },
                    }),
                }
            }
            Expr::Binary(left, op, right) => {
                let left_ty = self.expression(left)?;
                let right_ty = self.expression(right)?;
                self.binary(*op, left_ty, right_ty)
            }
        }
    }

    fn binary(&self, op: BinaryOp, left: Type, right: Type) -> Result<Type, Error> {
        let location = SourceLocation {
            line: op.line,
            col: op.col,
        };

        let result = match (op.ty, &left, &right) {
            (BinaryOpTy::Plus | BinaryOpTy::Minus, Type::Unit(l), Type::Unit(_))
                if self.same_type(&left, &right, location)? =>
            {
                Some(Type::Unit(l.clone()))
            }
            (BinaryOpTy::Plus, Type::String, Type::String) => Some(Type::String),
            (BinaryOpTy::Star, Type::Unit(l), Type::Unit(r)) => Some(Type::Unit(
                units::multiply(l, r).map_err(|err| Self::unit_error(err, location))?,
            )),
            (BinaryOpTy::Slash, Type::Unit(l), Type::Unit(r)) => Some(Type::Unit(
                units::divide(l, r).map_err(|err| Self::unit_error(err, location))?,
            )),
            (
                BinaryOpTy::Greater
                | BinaryOpTy::GreaterEqual
                | BinaryOpTy::Less
                | BinaryOpTy::LessEqual,
                Type::Unit(_),
                Type::Unit(_),
            ) if self.same_type(&left, &right, location)? => Some(Type::Bool),
            (BinaryOpTy::Equal | BinaryOpTy::NotEqual, Type::Unit(_), Type::Unit(_))
            | (BinaryOpTy::Equal | BinaryOpTy::NotEqual, Type::Bool, Type::Bool)
            | (BinaryOpTy::Equal | BinaryOpTy::NotEqual, Type::String, Type::String)
                if self.same_type(&left, &right, location)? =>
            {
                Some(Type::Bool)
            }
            (BinaryOpTy::Or | BinaryOpTy::And, Type::Bool, Type::Bool) => Some(Type::Bool),
            _ => None,
        };

        result.ok_or(Error::UnpermittedOperation {
            operation: op.ty.to_string(),
            operands: vec![left, right],
            location,
        })
    }
}
