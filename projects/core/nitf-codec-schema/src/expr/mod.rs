//! Restricted expression language for conditions, loop counts and field widths.
//!
//! Expressions are compiled once, when a [`RecordSchema`] is built, into a small
//! typed tree. Evaluation can only observe two things:
//!
//! - `f.<name>[..]`: fields decoded earlier in the record (subscripted by loop position)
//! - `i1` .. `iN`: the zero-based position of each enclosing loop, `i1` being the outermost
//!
//! Supported operators are `+ - * // %`, comparisons, `and`/`or`/`not`,
//! `x in (a, b)` / `x not in (..)` and `a if cond else b`. Literals are
//! integers, floats and quoted strings. Nothing else is reachable.
//!
//! Evaluation never coerces between kinds. An undefined field, a subscript out
//! of range or a value of the wrong kind is an [`ExpressionError`].
//!
//! [`RecordSchema`]: crate::schema::RecordSchema

mod eval;
mod lexer;
mod parser;

use crate::value::Value;
use parser::Expr;
use thiserror::Error;

/// Errors produced while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// The expression text is not valid
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// A referenced field has not been decoded (or set) at this point
    #[error("Field `{0}` is not defined")]
    UndefinedField(String),

    /// A subscript points past the stored iterations of a field
    #[error("Field `{field}` has no value at index {indices:?}")]
    IndexOutOfRange { field: String, indices: Vec<usize> },

    /// `iN` names a loop that does not enclose the expression
    #[error("Loop index `i{0}` does not refer to an enclosing loop")]
    UnknownLoopIndex(usize),

    /// An operand or result has the wrong kind
    #[error("Expected a {expected} value, found {found}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },

    /// `//` or `%` with a zero divisor
    #[error("Division by zero")]
    DivisionByZero,

    /// A count, width or subscript evaluated to a negative number
    #[error("Expected a non-negative integer, found {0}")]
    NegativeResult(i64),

    /// Integer arithmetic overflowed
    #[error("Integer overflow")]
    Overflow,
}

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// A field that is present in the record but holds no value
    Null,
}

impl ExprValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExprValue::Int(_) => "integer",
            ExprValue::Float(_) => "float",
            ExprValue::Str(_) => "string",
            ExprValue::Bool(_) => "boolean",
            ExprValue::Null => "no value",
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            ExprValue::Int(i) => Some(*i as f64),
            ExprValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// The symbols an expression may observe.
pub trait Environment {
    /// Returns the value of field `name` at the given zero-based loop position.
    ///
    /// `Ok(None)` means the field exists at that position but holds no value.
    /// A field that has not been decoded yet is [`ExpressionError::UndefinedField`].
    fn field(&self, name: &str, indices: &[usize]) -> Result<Option<&Value>, ExpressionError>;

    /// Returns the zero-based position of the loop at `level` (1 = outermost).
    fn loop_index(&self, level: usize) -> Option<usize>;
}

/// A compiled expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

/// A field referenced by an expression, with the number of subscripts used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldReference<'a> {
    pub name: &'a str,
    pub subscripts: usize,
}

impl Expression {
    /// Compiles `source`.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        Ok(Self {
            source: source.into(),
            root: parser::parse(source)?,
        })
    }

    /// The original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, env: &dyn Environment) -> Result<ExprValue, ExpressionError> {
        eval::evaluate(&self.root, env)
    }

    /// Evaluates a condition. The result must be a boolean.
    pub fn evaluate_bool(&self, env: &dyn Environment) -> Result<bool, ExpressionError> {
        match self.evaluate(env)? {
            ExprValue::Bool(b) => Ok(b),
            other => Err(ExpressionError::WrongKind {
                expected: "boolean",
                found: other.kind_name(),
            }),
        }
    }

    /// Evaluates a count or width. The result must be a non-negative integer.
    pub fn evaluate_count(&self, env: &dyn Environment) -> Result<usize, ExpressionError> {
        match self.evaluate(env)? {
            ExprValue::Int(i) => usize::try_from(i).map_err(|_| ExpressionError::NegativeResult(i)),
            other => Err(ExpressionError::WrongKind {
                expected: "integer",
                found: other.kind_name(),
            }),
        }
    }

    /// All `f.<name>` references, in source order.
    pub fn field_references(&self) -> Vec<FieldReference<'_>> {
        let mut refs = Vec::new();
        self.root.visit(&mut |node| {
            if let Expr::Field { name, subscripts } = node {
                refs.push(FieldReference {
                    name,
                    subscripts: subscripts.len(),
                });
            }
        });
        refs
    }

    /// The deepest loop level referenced through `iN`, or 0 if none.
    pub fn max_loop_level(&self) -> usize {
        let mut max = 0;
        self.root.visit(&mut |node| {
            if let Expr::LoopIndex(level) = node {
                max = max.max(*level);
            }
        });
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Flat environment keyed by (name, indices).
    #[derive(Default)]
    struct MapEnv {
        values: HashMap<(String, Vec<usize>), Option<Value>>,
        loops: Vec<usize>,
    }

    impl MapEnv {
        fn with(mut self, name: &str, indices: &[usize], value: Option<Value>) -> Self {
            self.values.insert((name.into(), indices.to_vec()), value);
            self
        }
    }

    impl Environment for MapEnv {
        fn field(&self, name: &str, indices: &[usize]) -> Result<Option<&Value>, ExpressionError> {
            self.values
                .get(&(name.to_string(), indices.to_vec()))
                .map(Option::as_ref)
                .ok_or_else(|| ExpressionError::UndefinedField(name.into()))
        }

        fn loop_index(&self, level: usize) -> Option<usize> {
            level.checked_sub(1).and_then(|l| self.loops.get(l).copied())
        }
    }

    fn eval(source: &str, env: &MapEnv) -> Result<ExprValue, ExpressionError> {
        Expression::parse(source).unwrap().evaluate(env)
    }

    #[test]
    fn evaluates_jagged_count_expression() {
        let env = MapEnv {
            loops: vec![1],
            ..Default::default()
        }
        .with("nxpts", &[1], Some(Value::Int(3)))
        .with("nypts", &[1], Some(Value::Int(4)));
        let expr = Expression::parse("f.nxpts[i1] * f.nypts[i1]").unwrap();
        assert_eq!(expr.evaluate_count(&env).unwrap(), 12);
    }

    #[test]
    fn evaluates_triangular_count() {
        let env = MapEnv {
            loops: vec![0],
            ..Default::default()
        }
        .with("numopg", &[0], Some(Value::Int(4)));
        let expr = Expression::parse("(f.numopg[i1]+1)*f.numopg[i1] // 2").unwrap();
        assert_eq!(expr.evaluate_count(&env).unwrap(), 10);
    }

    #[test]
    fn and_short_circuits_past_missing_values() {
        let env = MapEnv::default().with("inclic", &[], Some(Value::Str("N".into())));
        assert_eq!(
            eval("f.inclic == 'Y' and f.loctyp == 'R'", &env).unwrap(),
            ExprValue::Bool(false)
        );
    }

    #[test]
    fn conditional_only_evaluates_selected_branch() {
        let env = MapEnv::default()
            .with("inclic", &[], Some(Value::Str("N".into())))
            .with("npar", &[], None);
        let expr = Expression::parse("f.npar if f.inclic == 'Y' else 0").unwrap();
        assert_eq!(expr.evaluate_count(&env).unwrap(), 0);
    }

    #[test]
    fn membership_test() {
        let env = MapEnv::default().with("ic", &[], Some(Value::Str("C3".into())));
        assert_eq!(
            eval("f.ic not in ('NC', 'NM')", &env).unwrap(),
            ExprValue::Bool(true)
        );
        assert_eq!(
            eval("f.ic in ('C3',)", &env).unwrap(),
            ExprValue::Bool(true)
        );
    }

    #[test]
    fn undefined_field_is_an_error() {
        assert_eq!(
            eval("f.missing == 1", &MapEnv::default()),
            Err(ExpressionError::UndefinedField("missing".into()))
        );
    }

    #[test]
    fn null_count_is_wrong_kind() {
        let env = MapEnv::default().with("npar", &[], None);
        let expr = Expression::parse("f.npar").unwrap();
        assert_eq!(
            expr.evaluate_count(&env),
            Err(ExpressionError::WrongKind {
                expected: "integer",
                found: "no value"
            })
        );
    }

    #[test]
    fn negative_count_is_rejected() {
        let env = MapEnv::default().with("npln", &[], Some(Value::Int(0)));
        let expr = Expression::parse("f.npln - 1").unwrap();
        assert_eq!(expr.evaluate_count(&env), Err(ExpressionError::NegativeResult(-1)));
    }

    #[test]
    fn condition_must_be_boolean() {
        let env = MapEnv::default().with("nicom", &[], Some(Value::Int(2)));
        let expr = Expression::parse("f.nicom").unwrap();
        assert!(matches!(
            expr.evaluate_bool(&env),
            Err(ExpressionError::WrongKind { expected: "boolean", .. })
        ));
    }

    #[test]
    fn loop_index_outside_loop_is_an_error() {
        assert_eq!(
            eval("i2 + 1", &MapEnv::default()),
            Err(ExpressionError::UnknownLoopIndex(2))
        );
    }

    #[test]
    fn reports_references_and_loop_levels() {
        let expr = Expression::parse("f.a[i2] + f.b - i1").unwrap();
        assert_eq!(
            expr.field_references(),
            vec![
                FieldReference {
                    name: "a",
                    subscripts: 1
                },
                FieldReference {
                    name: "b",
                    subscripts: 0
                },
            ]
        );
        assert_eq!(expr.max_loop_level(), 2);
    }
}
