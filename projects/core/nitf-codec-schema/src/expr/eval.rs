//! Tree-walking evaluator. Operates only on the fixed symbol set exposed by an
//! [`Environment`]; there is no other way for an expression to observe state.

use super::parser::{BinaryOp, Expr};
use super::{Environment, ExprValue, ExpressionError};
use crate::value::Value;
use core::cmp::Ordering;

pub(super) fn evaluate(expr: &Expr, env: &dyn Environment) -> Result<ExprValue, ExpressionError> {
    match expr {
        Expr::Int(i) => Ok(ExprValue::Int(*i)),
        Expr::Float(v) => Ok(ExprValue::Float(*v)),
        Expr::Str(s) => Ok(ExprValue::Str(s.clone())),
        Expr::LoopIndex(level) => env
            .loop_index(*level)
            .map(|i| ExprValue::Int(i as i64))
            .ok_or(ExpressionError::UnknownLoopIndex(*level)),
        Expr::Field { name, subscripts } => {
            let mut indices = Vec::with_capacity(subscripts.len());
            for subscript in subscripts {
                indices.push(index_value(evaluate(subscript, env)?)?);
            }
            let value = env.field(name, &indices)?;
            from_field_value(value)
        }
        Expr::Neg(inner) => match evaluate(inner, env)? {
            ExprValue::Int(i) => i.checked_neg().map(ExprValue::Int).ok_or(ExpressionError::Overflow),
            ExprValue::Float(v) => Ok(ExprValue::Float(-v)),
            other => Err(wrong_kind("number", &other)),
        },
        Expr::Not(inner) => Ok(ExprValue::Bool(!expect_bool(evaluate(inner, env)?)?)),
        Expr::And(lhs, rhs) => {
            if !expect_bool(evaluate(lhs, env)?)? {
                return Ok(ExprValue::Bool(false));
            }
            Ok(ExprValue::Bool(expect_bool(evaluate(rhs, env)?)?))
        }
        Expr::Or(lhs, rhs) => {
            if expect_bool(evaluate(lhs, env)?)? {
                return Ok(ExprValue::Bool(true));
            }
            Ok(ExprValue::Bool(expect_bool(evaluate(rhs, env)?)?))
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = evaluate(lhs, env)?;
            let rhs = evaluate(rhs, env)?;
            binary(*op, lhs, rhs)
        }
        Expr::Membership {
            negated,
            needle,
            haystack,
        } => {
            let needle = evaluate(needle, env)?;
            let mut found = false;
            for candidate in haystack {
                if equals(&needle, &evaluate(candidate, env)?)? {
                    found = true;
                    break;
                }
            }
            Ok(ExprValue::Bool(found != *negated))
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if expect_bool(evaluate(condition, env)?)? {
                evaluate(then, env)
            } else {
                evaluate(otherwise, env)
            }
        }
    }
}

fn from_field_value(value: Option<&Value>) -> Result<ExprValue, ExpressionError> {
    match value {
        None => Ok(ExprValue::Null),
        Some(Value::Str(s)) => Ok(ExprValue::Str(s.clone())),
        Some(Value::Int(i)) => Ok(ExprValue::Int(*i)),
        Some(Value::Float(v)) => Ok(ExprValue::Float(*v)),
        Some(Value::Bytes(_)) => Err(ExpressionError::WrongKind {
            expected: "scalar",
            found: "bytes",
        }),
    }
}

fn wrong_kind(expected: &'static str, found: &ExprValue) -> ExpressionError {
    ExpressionError::WrongKind {
        expected,
        found: found.kind_name(),
    }
}

fn expect_bool(value: ExprValue) -> Result<bool, ExpressionError> {
    match value {
        ExprValue::Bool(b) => Ok(b),
        other => Err(wrong_kind("boolean", &other)),
    }
}

fn index_value(value: ExprValue) -> Result<usize, ExpressionError> {
    match value {
        ExprValue::Int(i) => usize::try_from(i).map_err(|_| ExpressionError::NegativeResult(i)),
        other => Err(wrong_kind("integer", &other)),
    }
}

/// Equality with no implicit conversions except integer/float widening.
/// Comparing against "no value" is allowed and only matches "no value".
fn equals(lhs: &ExprValue, rhs: &ExprValue) -> Result<bool, ExpressionError> {
    match (lhs, rhs) {
        (ExprValue::Null, ExprValue::Null) => Ok(true),
        (ExprValue::Null, _) | (_, ExprValue::Null) => Ok(false),
        (ExprValue::Str(a), ExprValue::Str(b)) => Ok(a == b),
        (ExprValue::Bool(a), ExprValue::Bool(b)) => Ok(a == b),
        (ExprValue::Int(a), ExprValue::Int(b)) => Ok(a == b),
        (a, b) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => Ok(x == y),
            _ => Err(ExpressionError::WrongKind {
                expected: a.kind_name(),
                found: b.kind_name(),
            }),
        },
    }
}

fn ordering(lhs: &ExprValue, rhs: &ExprValue) -> Result<Ordering, ExpressionError> {
    match (lhs, rhs) {
        (ExprValue::Int(a), ExprValue::Int(b)) => Ok(a.cmp(b)),
        (ExprValue::Str(a), ExprValue::Str(b)) => Ok(a.cmp(b)),
        (a, b) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).ok_or(ExpressionError::WrongKind {
                expected: "comparable number",
                found: "NaN",
            }),
            (None, _) => Err(wrong_kind("number or string", a)),
            (_, None) => Err(wrong_kind("number or string", b)),
        },
    }
}

fn binary(op: BinaryOp, lhs: ExprValue, rhs: ExprValue) -> Result<ExprValue, ExpressionError> {
    match op {
        BinaryOp::Eq => return Ok(ExprValue::Bool(equals(&lhs, &rhs)?)),
        BinaryOp::Ne => return Ok(ExprValue::Bool(!equals(&lhs, &rhs)?)),
        BinaryOp::Lt => return Ok(ExprValue::Bool(ordering(&lhs, &rhs)?.is_lt())),
        BinaryOp::Le => return Ok(ExprValue::Bool(ordering(&lhs, &rhs)?.is_le())),
        BinaryOp::Gt => return Ok(ExprValue::Bool(ordering(&lhs, &rhs)?.is_gt())),
        BinaryOp::Ge => return Ok(ExprValue::Bool(ordering(&lhs, &rhs)?.is_ge())),
        _ => {}
    }

    if let (BinaryOp::Add, ExprValue::Str(a), ExprValue::Str(b)) = (op, &lhs, &rhs) {
        return Ok(ExprValue::Str(format!("{a}{b}")));
    }

    if let (ExprValue::Int(a), ExprValue::Int(b)) = (&lhs, &rhs) {
        return integer_arithmetic(op, *a, *b).map(ExprValue::Int);
    }

    let a = lhs.as_number().ok_or_else(|| wrong_kind("number", &lhs))?;
    let b = rhs.as_number().ok_or_else(|| wrong_kind("number", &rhs))?;
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => {
            return Err(ExpressionError::DivisionByZero)
        }
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => a - b * (a / b).floor(),
        _ => unreachable!("comparison operators handled above"),
    };
    Ok(ExprValue::Float(result))
}

/// Integer arithmetic with floor semantics for `//` and `%`, so the result of
/// `%` takes the sign of the divisor.
fn integer_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<i64, ExpressionError> {
    match op {
        BinaryOp::Add => a.checked_add(b).ok_or(ExpressionError::Overflow),
        BinaryOp::Sub => a.checked_sub(b).ok_or(ExpressionError::Overflow),
        BinaryOp::Mul => a.checked_mul(b).ok_or(ExpressionError::Overflow),
        BinaryOp::FloorDiv | BinaryOp::Mod if b == 0 => Err(ExpressionError::DivisionByZero),
        BinaryOp::FloorDiv => {
            let q = a.checked_div(b).ok_or(ExpressionError::Overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                Ok(q - 1)
            } else {
                Ok(q)
            }
        }
        BinaryOp::Mod => {
            let r = a.checked_rem(b).ok_or(ExpressionError::Overflow)?;
            if r != 0 && ((r < 0) != (b < 0)) {
                Ok(r + b)
            } else {
                Ok(r)
            }
        }
        _ => unreachable!("comparison operators handled by caller"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(7, 2, 3, 1)]
    #[case(-7, 2, -4, 1)]
    #[case(7, -2, -4, -1)]
    #[case(-7, -2, 3, -1)]
    #[case(6, 3, 2, 0)]
    fn floor_division_and_modulo(
        #[case] a: i64,
        #[case] b: i64,
        #[case] quotient: i64,
        #[case] remainder: i64,
    ) {
        assert_eq!(integer_arithmetic(BinaryOp::FloorDiv, a, b).unwrap(), quotient);
        assert_eq!(integer_arithmetic(BinaryOp::Mod, a, b).unwrap(), remainder);
    }

    #[test]
    fn integer_division_by_zero_fails() {
        assert_eq!(
            integer_arithmetic(BinaryOp::FloorDiv, 1, 0),
            Err(ExpressionError::DivisionByZero)
        );
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            integer_arithmetic(BinaryOp::Mul, i64::MAX, 2),
            Err(ExpressionError::Overflow)
        );
    }

    #[test]
    fn equality_with_null_is_defined() {
        assert!(!equals(&ExprValue::Null, &ExprValue::Str("Y".into())).unwrap());
        assert!(equals(&ExprValue::Null, &ExprValue::Null).unwrap());
    }

    #[test]
    fn equality_between_string_and_integer_is_an_error() {
        assert!(matches!(
            equals(&ExprValue::Str("1".into()), &ExprValue::Int(1)),
            Err(ExpressionError::WrongKind { .. })
        ));
    }

    #[test]
    fn mixed_numeric_arithmetic_widens_to_float() {
        assert_eq!(
            binary(BinaryOp::Add, ExprValue::Int(1), ExprValue::Float(0.5)).unwrap(),
            ExprValue::Float(1.5)
        );
    }
}
