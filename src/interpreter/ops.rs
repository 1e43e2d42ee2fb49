//! Binary operators over runtime values.
//!
//! `+` and `-` promote integers to floats when mixed and concatenate
//! strings with numbers and booleans (`-` never applies to strings). `*`
//! and `/` promote the same way; `/` always yields a float, and an integer
//! times a string repeats the string.

use datagen_core::{GenError, Value};

pub fn apply_operator(op: &str, lhs: &Value, rhs: &Value) -> Result<Value, GenError> {
    match op {
        "+" | "-" => additive(op, lhs, rhs),
        "*" | "/" => multiplicative(op, lhs, rhs),
        other => Err(GenError::structural(format!("Unknown operator {other:?}"))),
    }
}

fn incompatible(op: &str, lhs: &Value, rhs: &Value) -> GenError {
    GenError::incompatible(op, lhs.kind_name(), rhs.kind_name())
}

fn additive(op: &str, lhs: &Value, rhs: &Value) -> Result<Value, GenError> {
    let subtract = op == "-";
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(if subtract {
            a.wrapping_sub(*b)
        } else {
            a.wrapping_add(*b)
        })),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (a, b) = (to_f64(lhs), to_f64(rhs));
            Ok(Value::Float(if subtract { a - b } else { a + b }))
        }
        _ if subtract => Err(incompatible(op, lhs, rhs)),
        (Value::Str(a), Value::Str(_) | Value::Int(_) | Value::Float(_) | Value::Bool(_)) => {
            Ok(Value::Str(format!("{a}{rhs}")))
        }
        (Value::Int(_) | Value::Float(_) | Value::Bool(_), Value::Str(b)) => {
            Ok(Value::Str(format!("{lhs}{b}")))
        }
        _ => Err(incompatible(op, lhs, rhs)),
    }
}

fn multiplicative(op: &str, lhs: &Value, rhs: &Value) -> Result<Value, GenError> {
    let divide = op == "/";
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(if divide {
            Value::Float(*a as f64 / *b as f64)
        } else {
            Value::Int(a.wrapping_mul(*b))
        }),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (a, b) = (to_f64(lhs), to_f64(rhs));
            Ok(Value::Float(if divide { a / b } else { a * b }))
        }
        _ if divide => Err(incompatible(op, lhs, rhs)),
        (Value::Int(n), Value::Str(s)) | (Value::Str(s), Value::Int(n)) => repeat(s, *n),
        (Value::Float(n), Value::Str(s)) | (Value::Str(s), Value::Float(n)) => {
            repeat(s, n.trunc() as i64)
        }
        _ => Err(incompatible(op, lhs, rhs)),
    }
}

fn to_f64(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

fn repeat(s: &str, times: i64) -> Result<Value, GenError> {
    let times = usize::try_from(times)
        .map_err(|_| GenError::range("Cannot multiply string by negative number"))?;
    Ok(Value::Str(s.repeat(times)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(op: &str, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Result<Value, GenError> {
        apply_operator(op, &lhs.into(), &rhs.into())
    }

    #[test]
    fn test_numeric_promotion() {
        assert_eq!(apply("+", 2, 3).unwrap(), Value::Int(5));
        assert_eq!(apply("-", 2, 0.5).unwrap(), Value::Float(1.5));
        assert_eq!(apply("*", 1.5, 2).unwrap(), Value::Float(3.0));
        assert_eq!(apply("/", 7, 2).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(apply("+", "n", 1).unwrap(), Value::from("n1"));
        assert_eq!(apply("+", 2.5, "x").unwrap(), Value::from("2.5x"));
        assert_eq!(apply("+", "is ", true).unwrap(), Value::from("is true"));
        assert_eq!(apply("+", false, "!").unwrap(), Value::from("false!"));
    }

    #[test]
    fn test_string_repetition() {
        assert_eq!(apply("*", 3, "ab").unwrap(), Value::from("ababab"));
        assert_eq!(apply("*", "ab", 2.9).unwrap(), Value::from("abab"));

        let err = apply("*", -1, "ab").unwrap_err();
        assert!(matches!(err, GenError::RangeViolation { .. }));
    }

    #[test]
    fn test_incompatible_types() {
        let err = apply("-", "a", 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Incompatible types for operator \"-\": string and integer"
        );

        assert!(matches!(
            apply("/", "a", 2).unwrap_err(),
            GenError::IncompatibleTypes { .. }
        ));
        assert!(matches!(
            apply("+", true, 1).unwrap_err(),
            GenError::IncompatibleTypes { .. }
        ));
        assert!(matches!(
            apply("+", Value::Null, Value::Null).unwrap_err(),
            GenError::IncompatibleTypes { .. }
        ));
    }

    #[test]
    fn test_unknown_operator() {
        assert!(matches!(
            apply("%", 1, 2).unwrap_err(),
            GenError::StructuralMismatch { .. }
        ));
    }
}
