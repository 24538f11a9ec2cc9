use crate::expr::{Expr, Literal, Type, UnaryOpTy};
use crate::interpreter;
use crate::units::{self, UnitTable, UnitType};
use crate::value::{self, NativeFunction, Value};

/*
Arity checking is done by the analyzer prior to running; the interpreter
re-checks it before calling into a builtin.
*/

pub static BUILTINS: [NativeFunction; 3] = [
    NativeFunction {
        arity: 1,
        name: "print",
        signature: print_signature,
        func: print,
    },
    NativeFunction {
        arity: 1,
        name: "sqrt",
        signature: sqrt_signature,
        func: sqrt,
    },
    NativeFunction {
        arity: 2,
        name: "power",
        signature: power_signature,
        func: power,
    },
];

pub fn lookup(name: &str) -> Option<&'static NativeFunction> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

fn print_signature(_units: &UnitTable, args: &[Type], _exprs: &[Expr]) -> Option<Type> {
    match args {
        [Type::Void] => None,
        [_] => Some(Type::Void),
        _ => None,
    }
}

fn sqrt_signature(units: &UnitTable, args: &[Type], _exprs: &[Expr]) -> Option<Type> {
    match args {
        [Type::Unit(unit)] => {
            let expanded = units::expand(unit, units).ok()?;
            units::halve(&expanded).map(Type::Unit)
        }
        _ => None,
    }
}

fn integer_literal(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Literal(Literal::Int(n, _), _) => Some(*n),
        Expr::Unary(op, operand) if op.ty == UnaryOpTy::Minus => {
            integer_literal(operand).map(|n| -n)
        }
        _ => None,
    }
}

fn power_signature(units: &UnitTable, args: &[Type], exprs: &[Expr]) -> Option<Type> {
    let (base, exponent) = match args {
        [Type::Unit(base), Type::Unit(exponent)] => (base, exponent),
        _ => return None,
    };
    if !units::expand(exponent, units).ok()?.is_dimensionless().ok()? {
        return None;
    }
    if units::expand(base, units).ok()?.is_dimensionless().ok()? {
        return Some(Type::Unit(UnitType::dimensionless()));
    }

    let factor = exprs.get(1).and_then(integer_literal)?;
    let factor = i32::try_from(factor).ok()?;
    units::scale(base, factor).ok().map(Type::Unit)
}

pub fn print(interp: &mut interpreter::Interpreter, args: &[Value]) -> Result<Value, String> {
    interp.print_val(&args[0]);
    Ok(Value::Void)
}

pub fn sqrt(_interp: &mut interpreter::Interpreter, args: &[Value]) -> Result<Value, String> {
    match args[0].as_f64() {
        Some(num) => Ok(Value::Float(num.sqrt())),
        None => Err(format!(
            "Invalid call: expected number, got {:?}.",
            value::type_of(&args[0])
        )),
    }
}

pub fn power(_interp: &mut interpreter::Interpreter, args: &[Value]) -> Result<Value, String> {
    match (&args[0], &args[1]) {
        (Value::Int(base), Value::Int(exponent)) if *exponent >= 0 => u32::try_from(*exponent)
            .ok()
            .and_then(|exponent| base.checked_pow(exponent))
            .map(Value::Int)
            .ok_or_else(|| "integer overflow.".to_string()),
        (base, exponent) => match (base.as_f64(), exponent.as_f64()) {
            (Some(base), Some(exponent)) => Ok(Value::Float(base.powf(exponent))),
            _ => Err(format!(
                "Invalid call: expected numbers, got {:?} and {:?}.",
                value::type_of(base),
                value::type_of(exponent)
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{SourceLocation, UnaryOp};
    use crate::units::Unit;

    fn unit(terms: &[(&str, i32)]) -> Type {
        Type::Unit(UnitType::new(
            terms.iter().map(|(n, p)| Unit::new(n, *p)).collect(),
        ))
    }

    fn int(n: i64) -> Expr {
        Expr::Literal(Literal::Int(n, None), SourceLocation { line: 1, col: 1 })
    }

    #[test]
    fn registry_knows_arity() {
        assert_eq!(lookup("print").map(|b| b.arity), Some(1));
        assert_eq!(lookup("sqrt").map(|b| b.arity), Some(1));
        assert_eq!(lookup("power").map(|b| b.arity), Some(2));
        assert!(lookup("clock").is_none());
    }

    #[test]
    fn print_accepts_any_non_void_value() {
        let table = UnitTable::new();
        assert_eq!(print_signature(&table, &[Type::Bool], &[]), Some(Type::Void));
        assert_eq!(print_signature(&table, &[Type::Void], &[]), None);
    }

    #[test]
    fn sqrt_halves_expanded_powers() {
        let mut table = UnitTable::new();
        table.insert(
            "J".to_string(),
            UnitType::new(vec![
                Unit::new("kg", 1),
                Unit::new("m", 2),
                Unit::new("s", -2),
            ]),
        );
        assert_eq!(
            sqrt_signature(&table, &[unit(&[("m", 2), ("s", -2)])], &[]),
            Some(unit(&[("m", 1), ("s", -1)]))
        );
        assert_eq!(sqrt_signature(&table, &[unit(&[("J", 1)])], &[]), None);
        assert_eq!(sqrt_signature(&table, &[Type::String], &[]), None);
    }

    #[test]
    fn power_needs_literal_exponent_for_dimensioned_base() {
        let table = UnitTable::new();
        let args = [unit(&[("m", 1)]), unit(&[])];
        assert_eq!(
            power_signature(&table, &args, &[int(0), int(3)]),
            Some(unit(&[("m", 3)]))
        );

        let negated = Expr::Unary(
            UnaryOp {
                ty: UnaryOpTy::Minus,
                line: 1,
                col: 1,
            },
            Box::new(int(2)),
        );
        assert_eq!(
            power_signature(&table, &args, &[int(0), negated]),
            Some(unit(&[("m", -2)]))
        );

        let variable = Expr::Variable(crate::expr::Symbol {
            name: "n".to_string(),
            line: 1,
            col: 1,
        });
        assert_eq!(power_signature(&table, &args, &[int(0), variable]), None);
        assert_eq!(
            power_signature(&table, &[unit(&[]), unit(&[])], &[int(0), int(0)]),
            Some(unit(&[]))
        );
        assert_eq!(
            power_signature(&table, &[unit(&[]), unit(&[("s", 1)])], &[int(0), int(0)]),
            None
        );
        assert_eq!(
            power_signature(
                &table,
                &[unit(&[("m", 2)]), unit(&[])],
                &[int(0), int(2_000_000_000)]
            ),
            None
        );
    }

    #[test]
    fn runtime_math() {
        let mut interp = interpreter::Interpreter::new(false);
        assert_eq!(sqrt(&mut interp, &[Value::Int(16)]), Ok(Value::Float(4.0)));
        assert_eq!(
            power(&mut interp, &[Value::Int(2), Value::Int(10)]),
            Ok(Value::Int(1024))
        );
        assert_eq!(
            power(&mut interp, &[Value::Int(2), Value::Int(-1)]),
            Ok(Value::Float(0.5))
        );
        assert!(power(&mut interp, &[Value::Int(10), Value::Int(40)]).is_err());
        assert!(sqrt(&mut interp, &[Value::Bool(true)]).is_err());
    }

    #[test]
    fn print_records_output() {
        let mut interp = interpreter::Interpreter::new(false);
        print(&mut interp, &[Value::Float(2.5)]).unwrap();
        print(&mut interp, &[Value::String("hi".to_string())]).unwrap();
        assert_eq!(interp.output(), &["2.5".to_string(), "hi".to_string()]);
    }
}
