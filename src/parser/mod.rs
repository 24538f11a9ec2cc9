pub mod ast;

use std::fmt;

use crate::expr::{
    self, BinaryOp, BinaryOpTy, Expr, FunctionCall, Literal, Param, SourceLocation, Stmt, Symbol,
    Type, UnaryOp, UnaryOpTy,
};
use crate::parser::ast::{FunctionStatement, Program, UnitDeclaration};
use crate::scanner::{self, Token, TokenKind, TokenPosition, TokenSource, TokenValue};
use crate::units::{Unit, UnitType};

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Lexical(scanner::Error),
    TokenMismatch {
        expected: Vec<TokenKind>,
        found: Token,
    },
    FunctionAlreadyDefined {
        name: String,
        location: SourceLocation,
    },
    UnitAlreadyDefined {
        name: String,
        location: SourceLocation,
    },
    ReturnNotInFunc {
        location: SourceLocation,
    },
    InvalidUnitPower {
        location: SourceLocation,
    },
}

impl Error {
    pub fn position(&self) -> TokenPosition {
        match self {
            Error::Lexical(err) => err.position(),
            Error::TokenMismatch { found, .. } => found.position,
            Error::FunctionAlreadyDefined { location, .. }
            | Error::UnitAlreadyDefined { location, .. }
            | Error::ReturnNotInFunc { location }
            | Error::InvalidUnitPower { location } => {
                TokenPosition::new(location.line, location.col)
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Lexical(err) => write!(f, "{}", err),
            Error::TokenMismatch { expected, found } => {
                let expected: Vec<String> =
                    expected.iter().map(|kind| format!("{:?}", kind)).collect();
                if expected.len() == 1 {
                    write!(f, "expected {} but found {}", expected[0], found)
                } else {
                    write!(
                        f,
                        "expected one of {} but found {}",
                        expected.join(", "),
                        found
                    )
                }
            }
            Error::FunctionAlreadyDefined { name, .. } => {
                write!(f, "function '{}' is already defined", name)
            }
            Error::UnitAlreadyDefined { name, .. } => {
                write!(f, "unit '{}' is already defined", name)
            }
            Error::ReturnNotInFunc { .. } => {
                write!(f, "return statement not enclosed in a function")
            }
            Error::InvalidUnitPower { .. } => write!(f, "unit power out of range"),
        }
    }
}

impl std::error::Error for Error {}

impl From<scanner::Error> for Error {
    fn from(err: scanner::Error) -> Self {
        Error::Lexical(err)
    }
}

pub fn parse<S: TokenSource>(source: S) -> Result<Program, Error> {
    Parser::new(source)?.parse()
}

/// Recursive-descent parser holding exactly one token of lookahead.
pub struct Parser<S> {
    source: S,
    current: Token,
    in_fundec: bool,
}

/// What `name(` turns out to be at the top level.
enum Callable {
    Function(FunctionStatement),
    Call(FunctionCall),
}

type Operand<S> = fn(&mut Parser<S>, Option<Symbol>) -> Result<Expr, Error>;

const STATEMENT_START: [TokenKind; 6] = [
    TokenKind::Let,
    TokenKind::If,
    TokenKind::While,
    TokenKind::Return,
    TokenKind::LeftBrace,
    TokenKind::Identifier,
];

impl<S: TokenSource> Parser<S> {
    pub fn new(mut source: S) -> Result<Self, Error> {
        let current = source.next_token()?;
        Ok(Self {
            source,
            current,
            in_fundec: false,
        })
    }

    pub fn parse(mut self) -> Result<Program, Error> {
        let mut program = Program::default();

        while !self.is_at_end() {
            self.top_level(&mut program)?;
        }

        Ok(program)
    }

    fn top_level(&mut self, program: &mut Program) -> Result<(), Error> {
        if self.matches(TokenKind::Unit)? {
            let decl = self.unit_declaration()?;
            if program.units.contains_key(&decl.name.name) {
                return Err(Error::UnitAlreadyDefined {
                    location: decl.name.location(),
                    name: decl.name.name,
                });
            }
            program.units.insert(decl.name.name.clone(), decl);
            return Ok(());
        }

        if self.check(TokenKind::Identifier) {
            let name = self.identifier()?;
            if self.matches(TokenKind::LeftParen)? {
                match self.call_or_function(name)? {
                    Callable::Function(func) => {
                        if program.functions.contains_key(&func.name.name) {
                            return Err(Error::FunctionAlreadyDefined {
                                location: func.name.location(),
                                name: func.name.name,
                            });
                        }
                        program.functions.insert(func.name.name.clone(), func);
                    }
                    Callable::Call(call) => program.statements.push(Stmt::Call(call)),
                }
                return Ok(());
            }
            let stmt = self.identifier_statement(name)?;
            program.statements.push(stmt);
            return Ok(());
        }

        let stmt = self.statement()?;
        program.statements.push(stmt);
        Ok(())
    }

    fn unit_declaration(&mut self) -> Result<UnitDeclaration, Error> {
        let name = self.identifier()?;
        self.consume(TokenKind::Colon)?;
        self.consume(TokenKind::LeftBracket)?;
        let unit = self.unit_type()?;
        Ok(UnitDeclaration { name, unit })
    }

    /// Called with `name(` already consumed. A parameter list is recognised by
    /// `identifier :`; anything else is an argument list.
    fn call_or_function(&mut self, name: Symbol) -> Result<Callable, Error> {
        if self.matches(TokenKind::RightParen)? {
            if self.matches(TokenKind::Arrow)? {
                return Ok(Callable::Function(self.function_rest(name, Vec::new())?));
            }
            return Ok(Callable::Call(FunctionCall {
                callee: name,
                args: Vec::new(),
            }));
        }

        if self.check(TokenKind::Identifier) {
            let first = self.identifier()?;
            if self.matches(TokenKind::Colon)? {
                let ty = self.type_annotation()?;
                let mut params = vec![Param { name: first, ty }];
                while self.matches(TokenKind::Comma)? {
                    params.push(self.parameter()?);
                }
                self.consume(TokenKind::RightParen)?;
                self.consume(TokenKind::Arrow)?;
                return Ok(Callable::Function(self.function_rest(name, params)?));
            }

            let first_arg = self.expression_from(Some(first))?;
            let args = self.arguments_after(first_arg)?;
            return Ok(Callable::Call(FunctionCall { callee: name, args }));
        }

        let args = self.arguments()?;
        Ok(Callable::Call(FunctionCall { callee: name, args }))
    }

    fn parameter(&mut self) -> Result<Param, Error> {
        let name = self.identifier()?;
        self.consume(TokenKind::Colon)?;
        let ty = self.type_annotation()?;
        Ok(Param { name, ty })
    }

    fn function_rest(&mut self, name: Symbol, params: Vec<Param>) -> Result<FunctionStatement, Error> {
        let return_type = self.type_annotation()?;
        self.consume(TokenKind::LeftBrace)?;

        let saved_is_in_fundec = self.in_fundec;
        self.in_fundec = true;
        let body = self.block()?;
        self.in_fundec = saved_is_in_fundec;

        Ok(FunctionStatement {
            name,
            params,
            return_type,
            body,
        })
    }

    fn type_annotation(&mut self) -> Result<Type, Error> {
        let ty = match self.current.kind {
            TokenKind::StringType => Type::String,
            TokenKind::BoolType => Type::Bool,
            TokenKind::VoidType => Type::Void,
            TokenKind::LeftBracket => {
                self.advance()?;
                return Ok(Type::Unit(self.unit_type()?));
            }
            _ => {
                return Err(self.mismatch(&[
                    TokenKind::StringType,
                    TokenKind::BoolType,
                    TokenKind::VoidType,
                    TokenKind::LeftBracket,
                ]))
            }
        };
        self.advance()?;
        Ok(ty)
    }

    /// `[` already consumed; reads `term (* term)* ]` or `]`.
    fn unit_type(&mut self) -> Result<UnitType, Error> {
        let mut units = Vec::new();
        if self.matches(TokenKind::RightBracket)? {
            return Ok(UnitType::new(units));
        }

        loop {
            units.push(self.unit_term()?);
            if !self.matches(TokenKind::Star)? {
                break;
            }
        }
        self.consume(TokenKind::RightBracket)?;

        Ok(UnitType::new(units))
    }

    fn unit_term(&mut self) -> Result<Unit, Error> {
        let name = self.identifier()?;
        if !self.matches(TokenKind::Caret)? {
            return Ok(Unit {
                name: name.name,
                power: 1,
            });
        }

        let negative = self.matches(TokenKind::Minus)?;
        let power_token = self.consume(TokenKind::IntLiteral)?;
        let out_of_range = Error::InvalidUnitPower {
            location: SourceLocation {
                line: power_token.position.row,
                col: power_token.position.column,
            },
        };
        let power = match power_token.value {
            Some(TokenValue::Int(value)) => i32::try_from(value).map_err(|_| out_of_range)?,
            _ => panic!("internal error in parser: integer token without a value"),
        };

        Ok(Unit {
            name: name.name,
            power: if negative { -power } else { power },
        })
    }

    fn statement(&mut self) -> Result<Stmt, Error> {
        match self.current.kind {
            TokenKind::Let => {
                self.advance()?;
                self.var_decl()
            }
            TokenKind::If => {
                self.advance()?;
                self.if_statement()
            }
            TokenKind::While => {
                self.advance()?;
                let condition = self.expression()?;
                self.consume(TokenKind::LeftBrace)?;
                Ok(Stmt::While(condition, self.block()?))
            }
            TokenKind::Return => self.return_statement(),
            TokenKind::LeftBrace => {
                self.advance()?;
                Ok(Stmt::Block(self.block()?))
            }
            TokenKind::Identifier => {
                let name = self.identifier()?;
                self.identifier_statement(name)
            }
            _ => Err(self.mismatch(&STATEMENT_START)),
        }
    }

    fn identifier_statement(&mut self, name: Symbol) -> Result<Stmt, Error> {
        if self.matches(TokenKind::Assign)? {
            let value = self.expression()?;
            return Ok(Stmt::Assign(name, value));
        }
        if self.matches(TokenKind::LeftParen)? {
            let args = self.arguments()?;
            return Ok(Stmt::Call(FunctionCall { callee: name, args }));
        }
        Err(self.mismatch(&[TokenKind::Assign, TokenKind::LeftParen]))
    }

    fn var_decl(&mut self) -> Result<Stmt, Error> {
        let name = self.identifier()?;
        self.consume(TokenKind::Colon)?;
        let ty = self.type_annotation()?;
        self.consume(TokenKind::Assign)?;
        let value = self.expression()?;

        Ok(Stmt::VarDecl(expr::VariableDeclaration { name, ty, value }))
    }

    fn if_statement(&mut self) -> Result<Stmt, Error> {
        let condition = self.expression()?;
        self.consume(TokenKind::LeftBrace)?;
        let then_branch = self.block()?;

        let mut else_ifs = Vec::new();
        let mut else_branch = None;
        while self.matches(TokenKind::Else)? {
            if self.matches(TokenKind::If)? {
                let condition = self.expression()?;
                self.consume(TokenKind::LeftBrace)?;
                let body = self.block()?;
                else_ifs.push(expr::ElseIf { condition, body });
            } else {
                self.consume(TokenKind::LeftBrace)?;
                else_branch = Some(self.block()?);
                break;
            }
        }

        Ok(Stmt::If(expr::IfStatement {
            condition,
            then_branch,
            else_ifs,
            else_branch,
        }))
    }

    fn return_statement(&mut self) -> Result<Stmt, Error> {
        let return_token = self.advance()?;
        let location = SourceLocation {
            line: return_token.position.row,
            col: return_token.position.column,
        };

        if !self.in_fundec {
            return Err(Error::ReturnNotInFunc { location });
        }

        if self.check(TokenKind::RightBrace) {
            return Ok(Stmt::Return(location, None));
        }
        Ok(Stmt::Return(location, Some(self.expression()?)))
    }

    /// `{` already consumed.
    fn block(&mut self) -> Result<Vec<Stmt>, Error> {
        let mut stmts = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.statement()?);
        }

        self.consume(TokenKind::RightBrace)?;

        Ok(stmts)
    }

    fn expression(&mut self) -> Result<Expr, Error> {
        self.expression_from(None)
    }

    /// Parses an expression whose leading identifier, if `seed` is given, has
    /// already been consumed.
    fn expression_from(&mut self, seed: Option<Symbol>) -> Result<Expr, Error> {
        self.logic_or(seed)
    }

    fn binary_level(
        &mut self,
        seed: Option<Symbol>,
        operators: &[TokenKind],
        operand: Operand<S>,
    ) -> Result<Expr, Error> {
        let mut expr = operand(self, seed)?;

        while operators.contains(&self.current.kind) {
            let operator_token = self.advance()?;
            let binop = Self::op_token_to_binop(&operator_token);
            let right = operand(self, None)?;
            expr = Expr::Binary(Box::new(expr), binop, Box::new(right));
        }
        Ok(expr)
    }

    fn logic_or(&mut self, seed: Option<Symbol>) -> Result<Expr, Error> {
        self.binary_level(seed, &[TokenKind::Or], Self::logic_and)
    }

    fn logic_and(&mut self, seed: Option<Symbol>) -> Result<Expr, Error> {
        self.binary_level(seed, &[TokenKind::And], Self::comparison)
    }

    fn comparison(&mut self, seed: Option<Symbol>) -> Result<Expr, Error> {
        self.binary_level(
            seed,
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Equal,
                TokenKind::NotEqual,
            ],
            Self::addition,
        )
    }

    fn addition(&mut self, seed: Option<Symbol>) -> Result<Expr, Error> {
        self.binary_level(
            seed,
            &[TokenKind::Plus, TokenKind::Minus],
            Self::multiplication,
        )
    }

    fn multiplication(&mut self, seed: Option<Symbol>) -> Result<Expr, Error> {
        self.binary_level(seed, &[TokenKind::Star, TokenKind::Slash], Self::unary)
    }

    fn unary(&mut self, seed: Option<Symbol>) -> Result<Expr, Error> {
        if seed.is_none() && (self.check(TokenKind::Minus) || self.check(TokenKind::Not)) {
            let operator_token = self.advance()?;
            let unary_op = Self::op_token_to_unary_op(&operator_token);
            let operand = self.primary(None)?;
            return Ok(Expr::Unary(unary_op, Box::new(operand)));
        }
        self.primary(seed)
    }

    fn primary(&mut self, seed: Option<Symbol>) -> Result<Expr, Error> {
        if let Some(sym) = seed {
            return self.identifier_tail(sym);
        }

        let location = SourceLocation {
            line: self.current.position.row,
            col: self.current.position.column,
        };
        match self.current.kind {
            TokenKind::IntLiteral | TokenKind::FloatLiteral => {
                let token = self.advance()?;
                let unit = if self.matches(TokenKind::LeftBracket)? {
                    Some(self.unit_type()?)
                } else {
                    None
                };
                let literal = match token.value {
                    Some(TokenValue::Int(value)) => Literal::Int(value, unit),
                    Some(TokenValue::Float(value)) => Literal::Float(value, unit),
                    other => panic!(
                        "internal error in parser: when parsing number, found literal {:?}",
                        other
                    ),
                };
                Ok(Expr::Literal(literal, location))
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance()?;
                Ok(Expr::Literal(
                    Literal::Bool(token.kind == TokenKind::True),
                    location,
                ))
            }
            TokenKind::StringLiteral => {
                let token = self.advance()?;
                match token.value {
                    Some(TokenValue::Str(text)) => Ok(Expr::Literal(Literal::Str(text), location)),
                    other => panic!(
                        "internal error in parser: when parsing text, found literal {:?}",
                        other
                    ),
                }
            }
            TokenKind::Identifier => {
                let sym = self.identifier()?;
                self.identifier_tail(sym)
            }
            TokenKind::LeftParen => {
                self.advance()?;
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen)?;
                Ok(expr)
            }
            _ => Err(self.mismatch(&[
                TokenKind::IntLiteral,
                TokenKind::FloatLiteral,
                TokenKind::True,
                TokenKind::False,
                TokenKind::StringLiteral,
                TokenKind::Identifier,
                TokenKind::LeftParen,
            ])),
        }
    }

    fn identifier_tail(&mut self, sym: Symbol) -> Result<Expr, Error> {
        if self.matches(TokenKind::LeftParen)? {
            let args = self.arguments()?;
            return Ok(Expr::Call(FunctionCall { callee: sym, args }));
        }
        Ok(Expr::Variable(sym))
    }

    /// `(` already consumed.
    fn arguments(&mut self) -> Result<Vec<Expr>, Error> {
        if self.matches(TokenKind::RightParen)? {
            return Ok(Vec::new());
        }
        let first = self.expression()?;
        self.arguments_after(first)
    }

    fn arguments_after(&mut self, first: Expr) -> Result<Vec<Expr>, Error> {
        let mut args = vec![first];
        while self.matches(TokenKind::Comma)? {
            args.push(self.expression()?);
        }
        self.consume(TokenKind::RightParen)?;
        Ok(args)
    }

    fn identifier(&mut self) -> Result<Symbol, Error> {
        let token = self.consume(TokenKind::Identifier)?;
        match token.value {
            Some(TokenValue::Str(name)) => Ok(Symbol {
                name,
                line: token.position.row,
                col: token.position.column,
            }),
            other => panic!(
                "internal error in parser: when parsing identifier, found literal {:?}",
                other
            ),
        }
    }

    fn op_token_to_unary_op(tok: &Token) -> UnaryOp {
        let ty = match tok.kind {
            TokenKind::Minus => UnaryOpTy::Minus,
            TokenKind::Not => UnaryOpTy::Not,
            other => panic!("internal error in parser: {:?} is not a unary operator", other),
        };
        UnaryOp {
            ty,
            line: tok.position.row,
            col: tok.position.column,
        }
    }

    fn op_token_to_binop(tok: &Token) -> BinaryOp {
        let ty = match tok.kind {
            TokenKind::Or => BinaryOpTy::Or,
            TokenKind::And => BinaryOpTy::And,
            TokenKind::Equal => BinaryOpTy::Equal,
            TokenKind::NotEqual => BinaryOpTy::NotEqual,
            TokenKind::Greater => BinaryOpTy::Greater,
            TokenKind::GreaterEqual => BinaryOpTy::GreaterEqual,
            TokenKind::Less => BinaryOpTy::Less,
            TokenKind::LessEqual => BinaryOpTy::LessEqual,
            TokenKind::Plus => BinaryOpTy::Plus,
            TokenKind::Minus => BinaryOpTy::Minus,
            TokenKind::Star => BinaryOpTy::Star,
            TokenKind::Slash => BinaryOpTy::Slash,
            other => panic!("internal error in parser: {:?} is not a binary operator", other),
        };
        BinaryOp {
            ty,
            line: tok.position.row,
            col: tok.position.column,
        }
    }

    fn mismatch(&self, expected: &[TokenKind]) -> Error {
        Error::TokenMismatch {
            expected: expected.to_vec(),
            found: self.current.clone(),
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind) {
            return self.advance();
        }
        Err(self.mismatch(&[kind]))
    }

    fn matches(&mut self, kind: TokenKind) -> Result<bool, Error> {
        if self.check(kind) {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Pulls the next token and hands back the one it replaces.
    fn advance(&mut self) -> Result<Token, Error> {
        let next = self.source.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Etx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{CommentFilter, LexerConfig, Scanner};

    fn parse_str(source: &str) -> Result<Program, Error> {
        parse(CommentFilter::new(Scanner::new(
            source,
            LexerConfig::default(),
        )))
    }

    fn units(terms: &[(&str, i32)]) -> UnitType {
        UnitType::new(terms.iter().map(|(n, p)| Unit::new(n, *p)).collect())
    }

    #[test]
    fn variable_declaration() {
        let program = parse_str("let x: bool = true").unwrap();
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::VarDecl(decl) => {
                assert_eq!(decl.name.name, "x");
                assert_eq!(decl.ty, Type::Bool);
                assert!(matches!(decl.value, Expr::Literal(Literal::Bool(true), _)));
            }
            other => panic!("expected a declaration, got {:?}", other),
        }
    }

    #[test]
    fn unit_declaration_and_literal_units() {
        let program =
            parse_str("unit N: [kg*m*s^-2]\nlet f: [N] = 2.5 [kg*m*s^-2]\nlet d: [] = 3 []")
                .unwrap();
        assert_eq!(
            program.units["N"].unit,
            units(&[("kg", 1), ("m", 1), ("s", -2)])
        );
        match &program.statements[0] {
            Stmt::VarDecl(decl) => {
                assert_eq!(decl.ty, Type::Unit(units(&[("N", 1)])));
                assert_eq!(
                    decl.value,
                    Expr::Literal(
                        Literal::Float(2.5, Some(units(&[("kg", 1), ("m", 1), ("s", -2)]))),
                        SourceLocation { line: 2, col: 14 }
                    )
                );
            }
            other => panic!("expected a declaration, got {:?}", other),
        }
        match &program.statements[1] {
            Stmt::VarDecl(decl) => {
                assert_eq!(decl.ty, Type::Unit(UnitType::dimensionless()));
            }
            other => panic!("expected a declaration, got {:?}", other),
        }
    }

    #[test]
    fn precedence_climbs_from_or_to_unary() {
        let program = parse_str("let b: bool = 1 + 2 * -3 > 4 || !true && false").unwrap();
        let Stmt::VarDecl(decl) = &program.statements[0] else {
            panic!("expected a declaration");
        };
        assert_eq!(
            decl.value.to_string(),
            "(((1 + (2 * (-3))) > 4) || ((!true) && false))"
        );
    }

    #[test]
    fn binary_tiers_are_left_associative() {
        let program = parse_str("x = 8 / 4 / 2 - 1 - 1").unwrap();
        let Stmt::Assign(_, value) = &program.statements[0] else {
            panic!("expected an assignment");
        };
        assert_eq!(value.to_string(), "((((8 / 4) / 2) - 1) - 1)");
    }

    #[test]
    fn functions_and_top_level_calls() {
        let source = "
            force(m: [kg], a: [m*s^-2]) -> [kg*m*s^-2] {
                return m * a
            }
            main() -> void {
                print(force(2 [kg], 3 [m*s^-2]))
            }
            print(x, force(y, z))
            print()
        ";
        let program = parse_str(source).unwrap();
        assert_eq!(program.functions.len(), 2);
        let force = &program.functions["force"];
        assert_eq!(force.params.len(), 2);
        assert_eq!(force.params[1].name.name, "a");
        assert!(program.functions["main"].params.is_empty());
        assert_eq!(program.functions["main"].return_type, Type::Void);

        assert_eq!(program.statements.len(), 2);
        match &program.statements[0] {
            Stmt::Call(call) => {
                assert_eq!(call.callee.name, "print");
                assert_eq!(call.args.len(), 2);
                assert_eq!(call.args[1].to_string(), "force(y, z)");
            }
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn call_whose_first_argument_is_an_expression() {
        let program = parse_str("print(a * b + c(1))").unwrap();
        let Stmt::Call(call) = &program.statements[0] else {
            panic!("expected a call");
        };
        assert_eq!(call.args[0].to_string(), "((a * b) + c(1))");
    }

    #[test]
    fn if_else_if_else_and_while() {
        let source = "
            main() -> void {
                let i: [] = 0
                while i < 3 { i = i + 1 }
                if i == 1 { print(1) } else if i == 2 { print(2) } else if i == 3 { print(3) } else { print(0) }
            }
        ";
        let program = parse_str(source).unwrap();
        let body = &program.functions["main"].body;
        assert!(matches!(body[1], Stmt::While(_, _)));
        match &body[2] {
            Stmt::If(stmt) => {
                assert_eq!(stmt.else_ifs.len(), 2);
                assert!(stmt.else_branch.is_some());
            }
            other => panic!("expected an if, got {:?}", other),
        }
    }

    #[test]
    fn bare_return_before_closing_brace() {
        let program = parse_str("f() -> void { return }").unwrap();
        assert!(matches!(
            program.functions["f"].body[0],
            Stmt::Return(_, None)
        ));
    }

    #[test]
    fn duplicate_definitions() {
        let err = parse_str("f() -> void {}\nf() -> void {}").unwrap_err();
        assert_eq!(
            err,
            Error::FunctionAlreadyDefined {
                name: "f".to_string(),
                location: SourceLocation { line: 2, col: 1 },
            }
        );

        let err = parse_str("unit N: [kg]\nunit N: [m]").unwrap_err();
        assert!(matches!(err, Error::UnitAlreadyDefined { ref name, .. } if name == "N"));
    }

    #[test]
    fn return_outside_function() {
        let err = parse_str("return 1").unwrap_err();
        assert_eq!(
            err,
            Error::ReturnNotInFunc {
                location: SourceLocation { line: 1, col: 1 }
            }
        );
        assert_eq!(err.position(), TokenPosition::new(1, 1));
    }

    #[test]
    fn unit_power_beyond_i32() {
        let err = parse_str("unit N: [m^3000000000]").unwrap_err();
        assert_eq!(
            err,
            Error::InvalidUnitPower {
                location: SourceLocation { line: 1, col: 12 }
            }
        );
        assert_eq!(err.position(), TokenPosition::new(1, 12));
    }

    #[test]
    fn missing_token_reports_expected_set_and_position() {
        let err = parse_str("let x bool = true").unwrap_err();
        match err {
            Error::TokenMismatch { expected, found } => {
                assert_eq!(expected, vec![TokenKind::Colon]);
                assert_eq!(found.kind, TokenKind::BoolType);
                assert_eq!(found.position, TokenPosition::new(1, 7));
            }
            other => panic!("expected a token mismatch, got {:?}", other),
        }
    }

    #[test]
    fn semicolons_are_not_terminators() {
        let err = parse_str("x = 1;").unwrap_err();
        assert!(matches!(
            err,
            Error::TokenMismatch { ref found, .. } if found.kind == TokenKind::Unknown
        ));
    }

    #[test]
    fn double_unary_is_rejected() {
        assert!(parse_str("x = --1").is_err());
        assert!(parse_str("x = -(-1)").is_ok());
    }

    #[test]
    fn lexical_errors_surface_through_the_parser() {
        let err = parse_str("let s: string = \"open").unwrap_err();
        assert!(matches!(
            err,
            Error::Lexical(scanner::Error::TextEndingQuoteNotFound { .. })
        ));
    }

    #[test]
    fn comments_are_ignored() {
        let program = parse_str("// header\nlet x: bool = true // trailing").unwrap();
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn reparsing_yields_equal_trees() {
        let source = "unit N: [kg*m*s^-2]\nf(a: [N]) -> [N] { return a * 2 }\nlet x: [N] = f(1 [N])";
        assert_eq!(parse_str(source).unwrap(), parse_str(source).unwrap());
    }
}
