use std::fmt;

use crate::builtins;
use crate::expr::{
    BinaryOp, BinaryOpTy, Expr, FunctionCall, IfStatement, Literal, SourceLocation, Stmt, Type,
    UnaryOp, UnaryOpTy,
};
use crate::parser::ast::{FunctionStatement, Program};
use crate::scanner::TokenPosition;
use crate::scope::{CallStack, Scope};
use crate::value::{self, NativeFunction, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum InterpreterError {
    DivisionByZero {
        location: SourceLocation,
    },
    IntegerOverflow {
        location: SourceLocation,
    },
    MissingReturnValue {
        function: String,
    },
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },
    UndefinedFunction {
        name: String,
        location: SourceLocation,
    },
    Builtin { name: String, message: String },
    Internal(String),
}

impl InterpreterError {
    pub fn position(&self) -> Option<TokenPosition> {
        match self {
            InterpreterError::DivisionByZero { location }
            | InterpreterError::IntegerOverflow { location }
            | InterpreterError::UndefinedVariable { location, .. }
            | InterpreterError::UndefinedFunction { location, .. } => {
                Some(TokenPosition::new(location.line, location.col))
            }
            _ => None,
        }
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InterpreterError::DivisionByZero { .. } => write!(f, "division by zero"),
            InterpreterError::IntegerOverflow { .. } => write!(f, "integer overflow"),
            InterpreterError::MissingReturnValue { function } => {
                write!(f, "'{}' finished without returning a value", function)
            }
            InterpreterError::UndefinedVariable { name, .. } => {
                write!(f, "'{}' is not defined", name)
            }
            InterpreterError::UndefinedFunction { name, .. } => {
                write!(f, "function '{}' is not defined", name)
            }
            InterpreterError::Builtin { name, message } => {
                write!(f, "when calling {}: {}", name, message)
            }
            InterpreterError::Internal(message) => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for InterpreterError {}

/// Outcome of executing a statement: either fall through to the next one or
/// unwind to the enclosing call with a value.
#[derive(Debug, PartialEq)]
enum Flow {
    Normal,
    Return(Value),
}

#[derive(Debug)]
enum Binop {
    Add,
    Sub,
    Mul,
    Div,
}

pub struct Interpreter {
    stack: CallStack<Value>,
    output: Vec<String>,
    echo: bool,
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new(true)
    }
}

impl Interpreter {
    /// With `echo` set, printed values also go to stdout.
    pub fn new(echo: bool) -> Interpreter {
        Interpreter {
            stack: CallStack::default(),
            output: Vec::new(),
            echo,
        }
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn print_val(&mut self, val: &Value) {
        let output = val.to_string();
        if self.echo {
            println!("{}", output);
        }
        self.output.push(output);
    }

    pub fn run(&mut self, program: &Program) -> Result<(), InterpreterError> {
        for stmt in &program.statements {
            if let Flow::Return(_) = self.execute(program, stmt)? {
                return Err(InterpreterError::Internal(
                    "return outside of a function".to_string(),
                ));
            }
        }

        if let Some(main) = program.functions.get("main") {
            self.call_function(program, main, Vec::new())?;
        }
        Ok(())
    }

    fn execute_block(&mut self, program: &Program, stmts: &[Stmt]) -> Result<Flow, InterpreterError> {
        self.stack.current_mut().push_scope();
        let result = self.execute_all(program, stmts);
        self.stack.current_mut().pop_scope();
        result
    }

    fn execute_all(&mut self, program: &Program, stmts: &[Stmt]) -> Result<Flow, InterpreterError> {
        for stmt in stmts {
            if let Flow::Return(val) = self.execute(program, stmt)? {
                return Ok(Flow::Return(val));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute(&mut self, program: &Program, stmt: &Stmt) -> Result<Flow, InterpreterError> {
        match stmt {
            Stmt::VarDecl(decl) => {
                let val = self.evaluate(program, &decl.value)?;
                self.stack.current_mut().declare(&decl.name.name, val);
                Ok(Flow::Normal)
            }
            Stmt::Assign(sym, value) => {
                let val = self.evaluate(program, value)?;
                if self.stack.current_mut().assign(&sym.name, val) {
                    Ok(Flow::Normal)
                } else {
                    Err(InterpreterError::UndefinedVariable {
                        name: sym.name.clone(),
                        location: sym.location(),
                    })
                }
            }
            Stmt::If(if_stmt) => self.execute_if(program, if_stmt),
            Stmt::While(condition, body) => {
                while self.condition(program, condition)? {
                    if let Flow::Return(val) = self.execute_block(program, body)? {
                        return Ok(Flow::Return(val));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return(_, value) => {
                let val = match value {
                    Some(expr) => self.evaluate(program, expr)?,
                    None => Value::Void,
                };
                Ok(Flow::Return(val))
            }
            Stmt::Call(call) => {
                self.call(program, call)?;
                Ok(Flow::Normal)
            }
            Stmt::Block(stmts) => self.execute_block(program, stmts),
        }
    }

    fn execute_if(&mut self, program: &Program, stmt: &IfStatement) -> Result<Flow, InterpreterError> {
        if self.condition(program, &stmt.condition)? {
            return self.execute_block(program, &stmt.then_branch);
        }
        for else_if in &stmt.else_ifs {
            if self.condition(program, &else_if.condition)? {
                return self.execute_block(program, &else_if.body);
            }
        }
        match &stmt.else_branch {
            Some(body) => self.execute_block(program, body),
            None => Ok(Flow::Normal),
        }
    }

    fn condition(&mut self, program: &Program, expr: &Expr) -> Result<bool, InterpreterError> {
        match self.evaluate(program, expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(InterpreterError::Internal(format!(
                "condition evaluated to {:?}",
                value::type_of(&other)
            ))),
        }
    }

    pub fn evaluate(&mut self, program: &Program, expr: &Expr) -> Result<Value, InterpreterError> {
        match expr {
            Expr::Literal(literal, _) => Ok(match literal {
                Literal::Int(n, _) => Value::Int(*n),
                Literal::Float(n, _) => Value::Float(*n),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Str(s) => Value::String(s.clone()),
            }),
            Expr::Variable(sym) => match self.stack.current().lookup(&sym.name) {
                Some(val) => Ok(val.clone()),
                None => Err(InterpreterError::UndefinedVariable {
                    name: sym.name.clone(),
                    location: sym.location(),
                }),
            },
            Expr::Call(call) => self.call(program, call),
            Expr::Unary(op, operand) => {
                let val = self.evaluate(program, operand)?;
                Interpreter::unary(*op, val)
            }
            Expr::Binary(left, op, right) => {
                let left = self.evaluate(program, left)?;
                let right = self.evaluate(program, right)?;
                Interpreter::binary(*op, left, right)
            }
        }
    }

    fn call(&mut self, program: &Program, call: &FunctionCall) -> Result<Value, InterpreterError> {
        let args = call
            .args
            .iter()
            .map(|arg| self.evaluate(program, arg))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(builtin) = builtins::lookup(&call.callee.name) {
            return self.call_native_func(builtin, &args);
        }

        match program.functions.get(&call.callee.name) {
            Some(func) => self.call_function(program, func, args),
            None => Err(InterpreterError::UndefinedFunction {
                name: call.callee.name.clone(),
                location: call.callee.location(),
            }),
        }
    }

    fn call_native_func(
        &mut self,
        native_func: &NativeFunction,
        args: &[Value],
    ) -> Result<Value, InterpreterError> {
        if args.len() != native_func.arity {
            return Err(InterpreterError::Internal(format!(
                "native function {} expected {} arguments but found {}",
                native_func.name,
                native_func.arity,
                args.len()
            )));
        }

        (native_func.func)(self, args).map_err(|message| InterpreterError::Builtin {
            name: native_func.name.to_string(),
            message,
        })
    }

    fn call_function(
        &mut self,
        program: &Program,
        func: &FunctionStatement,
        args: Vec<Value>,
    ) -> Result<Value, InterpreterError> {
        if args.len() != func.params.len() {
            return Err(InterpreterError::Internal(format!(
                "'{}' expected {} arguments but found {}",
                func.name.name,
                func.params.len(),
                args.len()
            )));
        }

        let parameters: Scope<Value> = func
            .params
            .iter()
            .map(|param| param.name.name.clone())
            .zip(args)
            .collect();

        self.stack.enter_call(parameters);
        let result = self.execute_all(program, &func.body);
        self.stack.exit_call();

        match result? {
            Flow::Return(val) => Ok(val),
            Flow::Normal if func.return_type == Type::Void => Ok(Value::Void),
            Flow::Normal => Err(InterpreterError::MissingReturnValue {
                function: func.name.name.clone(),
            }),
        }
    }

    fn unary(op: UnaryOp, val: Value) -> Result<Value, InterpreterError> {
        match (op.ty, val) {
            (UnaryOpTy::Minus, Value::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or(InterpreterError::IntegerOverflow {
                    location: SourceLocation {
                        line: op.line,
                        col: op.col,
                    },
                }),
            (UnaryOpTy::Minus, Value::Float(n)) => Ok(Value::Float(-n)),
            (UnaryOpTy::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (ty, val) => Err(InterpreterError::Internal(format!(
                "invalid operand to unary {:?}: {:?}",
                ty,
                value::type_of(&val)
            ))),
        }
    }

    fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, InterpreterError> {
        match op.ty {
            BinaryOpTy::Plus => match (left, right) {
                (Value::String(l), Value::String(r)) => Ok(Value::String(format!("{}{}", l, r))),
                (left, right) => Interpreter::numeric_binop(Binop::Add, op, &left, &right),
            },
            BinaryOpTy::Minus => Interpreter::numeric_binop(Binop::Sub, op, &left, &right),
            BinaryOpTy::Star => Interpreter::numeric_binop(Binop::Mul, op, &left, &right),
            BinaryOpTy::Slash => Interpreter::numeric_binop(Binop::Div, op, &left, &right),
            BinaryOpTy::Equal => Interpreter::values_equal(op, &left, &right).map(Value::Bool),
            BinaryOpTy::NotEqual => {
                Interpreter::values_equal(op, &left, &right).map(|eq| Value::Bool(!eq))
            }
            BinaryOpTy::Greater
            | BinaryOpTy::GreaterEqual
            | BinaryOpTy::Less
            | BinaryOpTy::LessEqual => {
                let (l, r) = Interpreter::numeric_operands(op, &left, &right)?;
                Ok(Value::Bool(match op.ty {
                    BinaryOpTy::Greater => l > r,
                    BinaryOpTy::GreaterEqual => l >= r,
                    BinaryOpTy::Less => l < r,
                    _ => l <= r,
                }))
            }
            BinaryOpTy::And | BinaryOpTy::Or => match (left, right) {
                (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(if op.ty == BinaryOpTy::And {
                    l && r
                } else {
                    l || r
                })),
                (left, right) => Err(Interpreter::invalid_operands(op, &left, &right)),
            },
        }
    }

    fn invalid_operands(op: BinaryOp, left: &Value, right: &Value) -> InterpreterError {
        InterpreterError::Internal(format!(
            "invalid operands of type {:?} and {:?} for '{}' (line={})",
            value::type_of(left),
            value::type_of(right),
            op.ty,
            op.line
        ))
    }

    fn numeric_operands(
        op: BinaryOp,
        left: &Value,
        right: &Value,
    ) -> Result<(f64, f64), InterpreterError> {
        match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => Ok((l, r)),
            _ => Err(Interpreter::invalid_operands(op, left, right)),
        }
    }

    fn values_equal(op: BinaryOp, left: &Value, right: &Value) -> Result<bool, InterpreterError> {
        match (left, right) {
            (Value::Int(l), Value::Int(r)) => Ok(l == r),
            (Value::Bool(l), Value::Bool(r)) => Ok(l == r),
            (Value::String(l), Value::String(r)) => Ok(l == r),
            _ => Interpreter::numeric_operands(op, left, right).map(|(l, r)| l == r),
        }
    }

    fn numeric_binop(
        binop: Binop,
        op: BinaryOp,
        left: &Value,
        right: &Value,
    ) -> Result<Value, InterpreterError> {
        if let (Value::Int(l), Value::Int(r)) = (left, right) {
            return Interpreter::apply_integer_binop(*l, *r, binop, op).map(Value::Int);
        }
        let (l, r) = Interpreter::numeric_operands(op, left, right)?;
        Ok(Value::Float(Interpreter::apply_numeric_binop(l, r, binop)))
    }

    fn apply_integer_binop(
        left: i64,
        right: i64,
        binop: Binop,
        op: BinaryOp,
    ) -> Result<i64, InterpreterError> {
        let location = SourceLocation {
            line: op.line,
            col: op.col,
        };
        let overflow = InterpreterError::IntegerOverflow { location };
        match binop {
            Binop::Add => left.checked_add(right).ok_or(overflow),
            Binop::Sub => left.checked_sub(right).ok_or(overflow),
            Binop::Mul => left.checked_mul(right).ok_or(overflow),
            Binop::Div if right == 0 => Err(InterpreterError::DivisionByZero { location }),
            Binop::Div => left.checked_div(right).ok_or(overflow),
        }
    }

    fn apply_numeric_binop(left: f64, right: f64, binop: Binop) -> f64 {
        match binop {
            Binop::Add => left + right,
            Binop::Sub => left - right,
            Binop::Mul => left * right,
            Binop::Div => left / right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer;
    use crate::parser;
    use crate::scanner::{CommentFilter, LexerConfig, Scanner};

    fn parse(source: &str) -> Program {
        parser::parse(CommentFilter::new(Scanner::new(
            source,
            LexerConfig::default(),
        )))
        .unwrap()
    }

    fn run(source: &str) -> Result<Vec<String>, InterpreterError> {
        let program = parse(source);
        analyzer::analyze(&program).unwrap();
        let mut interp = Interpreter::new(false);
        interp.run(&program)?;
        Ok(interp.output().to_vec())
    }

    #[test]
    fn prints_arithmetic() {
        assert_eq!(
            run("print(1 + 2 * 3)\nprint(7 / 2)\nprint(7.0 / 2)\nprint(\"a\" + \"b\")").unwrap(),
            vec!["7", "3", "3.5", "ab"]
        );
    }

    #[test]
    fn int_and_float_promote() {
        assert_eq!(
            run("print(1 + 0.5)\nprint(2 == 2.0)\nprint(3 > 2.5)").unwrap(),
            vec!["1.5", "true", "true"]
        );
    }

    #[test]
    fn top_level_statements_run_before_main() {
        assert_eq!(
            run("main() -> void { print(\"main\") }\nprint(\"top\")").unwrap(),
            vec!["top", "main"]
        );
    }

    #[test]
    fn assignment_in_a_block_updates_the_outer_binding() {
        let source = "main() -> void {
            let x: [] = 1
            if true {
                let y: [] = 2
                x = x + y
                {
                    let z: [] = 10
                    z = z * x
                    print(z)
                }
            }
            print(x)
        }";
        assert_eq!(run(source).unwrap(), vec!["30", "3"]);
    }

    #[test]
    fn block_bindings_end_with_the_block() {
        let source = "main() -> void {
            let i: [] = 0
            while i < 2 {
                let square: [] = i * i
                print(square)
                i = i + 1
            }
        }";
        assert_eq!(run(source).unwrap(), vec!["0", "1"]);
    }

    #[test]
    fn while_loops_and_else_if_chains() {
        let source = "main() -> void {
            let i: [] = 0
            while i < 4 {
                if i == 0 { print(\"zero\") }
                else if i == 1 { print(\"one\") }
                else { print(i) }
                i = i + 1
            }
        }";
        assert_eq!(run(source).unwrap(), vec!["zero", "one", "2", "3"]);
    }

    #[test]
    fn return_exits_early() {
        let source = "pick(n: []) -> string {
            while true {
                if n > 0 { return \"positive\" }
                return \"other\"
            }
            return \"unreachable\"
        }
        main() -> void {
            print(pick(1))
            print(pick(-1))
        }";
        assert_eq!(run(source).unwrap(), vec!["positive", "other"]);
    }

    #[test]
    fn recursion_gets_fresh_contexts() {
        let source = "fib(n: []) -> [] {
            if n < 2 { return n }
            return fib(n - 1) + fib(n - 2)
        }
        main() -> void { print(fib(15)) }";
        assert_eq!(run(source).unwrap(), vec!["610"]);
    }

    #[test]
    fn parameters_are_assignable_locally() {
        let source = "dec(n: []) -> [] { n = n - 1 return n }
        main() -> void {
            let n: [] = 5
            print(dec(n))
            print(n)
        }";
        assert_eq!(run(source).unwrap(), vec!["4", "5"]);
    }

    #[test]
    fn logical_operators_evaluate_both_sides() {
        let source = "noisy(b: bool) -> bool { print(b) return b }
        main() -> void {
            print(noisy(false) && noisy(true))
            print(noisy(true) || noisy(false))
        }";
        assert_eq!(
            run(source).unwrap(),
            vec!["false", "true", "false", "true", "false", "true"]
        );
    }

    #[test]
    fn builtins_run() {
        assert_eq!(
            run("print(sqrt(16 [m^2]))\nprint(power(2, 10))\nprint(power(2.0 [m], 2))").unwrap(),
            vec!["4", "1024", "4"]
        );
    }

    #[test]
    fn integer_division_by_zero() {
        let err = run("print(1 / (1 - 1))").unwrap_err();
        assert_eq!(
            err,
            InterpreterError::DivisionByZero {
                location: SourceLocation { line: 1, col: 9 }
            }
        );
        assert_eq!(err.position(), Some(TokenPosition::new(1, 9)));
        assert_eq!(run("print(1.0 / 0)").unwrap(), vec!["inf"]);
    }

    #[test]
    fn integer_overflow() {
        let err = run("print(9223372036854775807 + 1)").unwrap_err();
        assert!(matches!(err, InterpreterError::IntegerOverflow { .. }));
    }

    #[test]
    fn missing_return_value() {
        let err = run("f(b: bool) -> [] { if b { return 1 } }\nprint(f(false))").unwrap_err();
        assert_eq!(
            err,
            InterpreterError::MissingReturnValue {
                function: "f".to_string()
            }
        );
    }

    #[test]
    fn independent_interpreters_share_nothing() {
        let program = parse("let x: [] = 1\nx = x + 1\nprint(x)");
        let mut first = Interpreter::new(false);
        let mut second = Interpreter::new(false);
        first.run(&program).unwrap();
        second.run(&program).unwrap();
        assert_eq!(first.output(), second.output());
        assert_eq!(first.output(), &["2".to_string()]);
    }
}
