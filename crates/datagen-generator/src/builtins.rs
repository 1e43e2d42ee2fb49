//! Argument validation for builtin field types.
//!
//! | type    | args                                   | default        |
//! |---------|----------------------------------------|----------------|
//! | string  | length                                 | 5              |
//! | integer | min, max (ints, max >= min)            | [1, 10]        |
//! | decimal | min, max (numbers, max >= min)         | [1, 10]        |
//! | date    | min, max (dates), optional format      | [epoch, now]   |
//! | bool    | none                                   |                |
//! | serial  | optional offset                        | 0              |
//! | uniqint | none                                   |                |
//! | uid     | none                                   |                |
//! | dict    | category                               | required       |
//! | enum    | non-empty collection                   | required       |

use crate::generators::sequence::{SerialCounter, UniquePool};
use crate::generators::timestamp::parse_timestamp;
use crate::generators::Builtin;
use chrono::{DateTime, Utc};
use datagen_core::{GenError, Value};

const DEFAULT_STRING_LENGTH: usize = 5;
const DEFAULT_MIN: i64 = 1;
const DEFAULT_MAX: i64 = 10;

/// Map a type name or `$`-prefixed alias to its canonical name.
pub fn canonical_builtin_name(name: &str) -> Option<&'static str> {
    let canonical = match name {
        "integer" | "$int" => "integer",
        "decimal" | "float" | "$float" => "decimal",
        "string" | "$str" => "string",
        "date" | "$date" => "date",
        "bool" | "boolean" | "$bool" => "bool",
        "serial" | "$incr" => "serial",
        "uniqint" | "$uniqint" => "uniqint",
        "uid" | "$uid" => "uid",
        "enum" | "$enum" => "enum",
        "dict" | "$dict" => "dict",
        _ => return None,
    };
    Some(canonical)
}

fn expect_arity(type_name: &str, args: &[Value], allowed: &[usize]) -> Result<(), GenError> {
    if allowed.contains(&args.len()) {
        return Ok(());
    }
    let expected = allowed
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    Err(GenError::arity(format!(
        "Field type `{type_name}` expects {expected} args, but got {}",
        args.len()
    )))
}

fn type_error(type_name: &str, expected: &str, got: &Value) -> GenError {
    GenError::arity(format!(
        "Field type `{type_name}` expected {expected} argument, but got {}",
        got.kind_name()
    ))
}

fn int_arg(type_name: &str, value: &Value) -> Result<i64, GenError> {
    value
        .as_i64()
        .ok_or_else(|| type_error(type_name, "integer", value))
}

fn number_arg(type_name: &str, value: &Value) -> Result<f64, GenError> {
    let number = value
        .as_f64()
        .ok_or_else(|| type_error(type_name, "numeric", value))?;
    if !number.is_finite() {
        return Err(GenError::arity(format!(
            "Field type `{type_name}` expected finite numeric argument, but got {number}"
        )));
    }
    Ok(number)
}

fn date_arg(type_name: &str, value: &Value) -> Result<DateTime<Utc>, GenError> {
    match value {
        Value::Date(date) => Ok(date.time),
        Value::Str(s) => parse_timestamp(s).ok_or_else(|| {
            GenError::arity(format!("Field type `{type_name}` could not parse date {s:?}"))
        }),
        other => Err(type_error(type_name, "date", other)),
    }
}

fn check_bounds<T: PartialOrd + std::fmt::Display>(min: T, max: T) -> Result<(), GenError> {
    if max < min {
        return Err(GenError::range(format!(
            "max {max} cannot be less than min {min}"
        )));
    }
    Ok(())
}

/// Build a validated [`Builtin`] from a type name and its evaluated arguments.
pub fn builtin_from_args(type_name: &str, args: &[Value]) -> Result<Builtin, GenError> {
    let canonical = canonical_builtin_name(type_name)
        .ok_or_else(|| GenError::arity(format!("Invalid field type `{type_name}`")))?;

    match canonical {
        "string" => {
            expect_arity(canonical, args, &[0, 1])?;
            let length = match args.first() {
                Some(arg) => {
                    let length = int_arg(canonical, arg)?;
                    usize::try_from(length).map_err(|_| {
                        GenError::range(format!("String length must not be negative, got {length}"))
                    })?
                }
                None => DEFAULT_STRING_LENGTH,
            };
            Ok(Builtin::Str { length })
        }

        "integer" => {
            expect_arity(canonical, args, &[0, 2])?;
            let (min, max) = match args {
                [min, max] => (int_arg(canonical, min)?, int_arg(canonical, max)?),
                _ => (DEFAULT_MIN, DEFAULT_MAX),
            };
            check_bounds(min, max)?;
            Ok(Builtin::Integer { min, max })
        }

        "decimal" => {
            expect_arity(canonical, args, &[0, 2])?;
            let (min, max) = match args {
                [min, max] => (number_arg(canonical, min)?, number_arg(canonical, max)?),
                _ => (DEFAULT_MIN as f64, DEFAULT_MAX as f64),
            };
            check_bounds(min, max)?;
            if !(max - min).is_finite() {
                return Err(GenError::range(format!(
                    "Range between {min} and {max} is too wide to sample"
                )));
            }
            Ok(Builtin::Decimal { min, max })
        }

        "date" => {
            expect_arity(canonical, args, &[0, 2, 3])?;
            let (min, max, format) = match args {
                [min, max] => (date_arg(canonical, min)?, date_arg(canonical, max)?, None),
                [min, max, format] => {
                    let format = format
                        .as_str()
                        .ok_or_else(|| type_error(canonical, "string format", format))?;
                    (
                        date_arg(canonical, min)?,
                        date_arg(canonical, max)?,
                        Some(format.to_string()),
                    )
                }
                _ => (DateTime::UNIX_EPOCH, Utc::now(), None),
            };
            if max < min {
                return Err(GenError::range(format!(
                    "max {} cannot be before min {}",
                    max.format("%Y-%m-%d"),
                    min.format("%Y-%m-%d")
                )));
            }
            Ok(Builtin::Date { min, max, format })
        }

        "bool" => {
            expect_arity(canonical, args, &[0])?;
            Ok(Builtin::Bool)
        }

        "serial" => {
            expect_arity(canonical, args, &[0, 1])?;
            let offset = match args.first() {
                Some(Value::Int(offset)) => *offset,
                Some(offset @ Value::Float(_)) => number_arg(canonical, offset)?.trunc() as i64,
                Some(other) => return Err(type_error(canonical, "numeric", other)),
                None => 0,
            };
            Ok(Builtin::Serial(SerialCounter::new(offset)))
        }

        "uniqint" => {
            expect_arity(canonical, args, &[0])?;
            Ok(Builtin::UniqueInt(UniquePool::new()))
        }

        "uid" => {
            expect_arity(canonical, args, &[0])?;
            Ok(Builtin::Uid)
        }

        "dict" => {
            if args.is_empty() {
                return Err(requires_arguments(canonical));
            }
            expect_arity(canonical, args, &[1])?;
            match &args[0] {
                Value::Str(category) if !category.is_empty() => {
                    Ok(Builtin::Dict(category.clone()))
                }
                Value::Str(_) => Err(GenError::arity(
                    "Field type `dict` requires a non-empty category",
                )),
                other => Err(type_error(canonical, "string", other)),
            }
        }

        "enum" => {
            if args.is_empty() {
                return Err(requires_arguments(canonical));
            }
            expect_arity(canonical, args, &[1])?;
            match &args[0] {
                Value::Collection(values) if !values.is_empty() => {
                    Ok(Builtin::Enum(values.clone()))
                }
                Value::Collection(_) => Err(GenError::arity(
                    "Field type `enum` requires a non-empty collection",
                )),
                other => Err(type_error(canonical, "collection", other)),
            }
        }

        _ => Err(GenError::arity(format!("Invalid field type `{type_name}`"))),
    }
}

fn requires_arguments(type_name: &str) -> GenError {
    GenError::arity(format!("Field of type `{type_name}` requires arguments"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(canonical_builtin_name("$int"), Some("integer"));
        assert_eq!(canonical_builtin_name("float"), Some("decimal"));
        assert_eq!(canonical_builtin_name("$incr"), Some("serial"));
        assert_eq!(canonical_builtin_name("varchar"), None);
    }

    #[test]
    fn test_defaults() {
        assert!(matches!(
            builtin_from_args("string", &[]).unwrap(),
            Builtin::Str { length: 5 }
        ));
        assert!(matches!(
            builtin_from_args("integer", &[]).unwrap(),
            Builtin::Integer { min: 1, max: 10 }
        ));
        match builtin_from_args("date", &[]).unwrap() {
            Builtin::Date { min, max, format } => {
                assert_eq!(min, DateTime::UNIX_EPOCH);
                assert!(max > min);
                assert!(format.is_none());
            }
            other => panic!("unexpected builtin {other:?}"),
        }
    }

    #[test]
    fn test_integer_bounds() {
        let err = builtin_from_args("integer", &[Value::Int(10), Value::Int(1)]).unwrap_err();
        assert!(matches!(err, GenError::RangeViolation { .. }));
        assert_eq!(err.to_string(), "max 1 cannot be less than min 10");

        let err = builtin_from_args("integer", &[Value::Int(1)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field type `integer` expects 0 or 2 args, but got 1"
        );

        let err = builtin_from_args("integer", &[Value::Int(1), Value::from("x")]).unwrap_err();
        assert!(matches!(err, GenError::ArityOrTypeMismatch { .. }));
    }

    #[test]
    fn test_decimal_accepts_ints_and_floats() {
        match builtin_from_args("decimal", &[Value::Int(1), Value::Float(2.5)]).unwrap() {
            Builtin::Decimal { min, max } => {
                assert_eq!(min, 1.0);
                assert_eq!(max, 2.5);
            }
            other => panic!("unexpected builtin {other:?}"),
        }
    }

    #[test]
    fn test_date_bounds_and_format() {
        let builtin = builtin_from_args(
            "date",
            &[
                Value::from("2017-01-01"),
                Value::from("2017-06-30"),
                Value::from("%Y/%m"),
            ],
        )
        .unwrap();
        assert!(matches!(builtin, Builtin::Date { format: Some(ref f), .. } if f == "%Y/%m"));

        let err = builtin_from_args("date", &[Value::from("2018-01-01"), Value::from("2017-01-01")])
            .unwrap_err();
        assert!(matches!(err, GenError::RangeViolation { .. }));
    }

    #[test]
    fn test_required_arguments() {
        let err = builtin_from_args("dict", &[]).unwrap_err();
        assert_eq!(err.to_string(), "Field of type `dict` requires arguments");

        let err = builtin_from_args("$enum", &[]).unwrap_err();
        assert_eq!(err.to_string(), "Field of type `enum` requires arguments");

        assert!(builtin_from_args("enum", &[Value::Collection(vec![])]).is_err());
        assert!(builtin_from_args("dict", &[Value::from("")]).is_err());
    }

    #[test]
    fn test_zero_arg_types_reject_args() {
        for name in ["bool", "uniqint", "uid"] {
            assert!(builtin_from_args(name, &[Value::Int(1)]).is_err(), "{name}");
        }
    }

    #[test]
    fn test_serial_offset() {
        let builtin = builtin_from_args("serial", &[Value::Int(100)]).unwrap();
        let mut ctx = crate::context::GenContext::new(42);
        assert_eq!(builtin.sample(&mut ctx).unwrap(), Value::Int(100));
        assert_eq!(builtin.sample(&mut ctx).unwrap(), Value::Int(101));
    }

    #[test]
    fn test_decimal_rejects_non_finite_bounds() {
        for args in [
            [Value::Float(f64::NAN), Value::Int(1)],
            [Value::Int(1), Value::Float(f64::INFINITY)],
            [Value::Float(f64::NEG_INFINITY), Value::Int(0)],
        ] {
            let err = builtin_from_args("decimal", &args).unwrap_err();
            assert!(matches!(err, GenError::ArityOrTypeMismatch { .. }), "{args:?}");
        }

        let err = builtin_from_args("decimal", &[Value::Float(-f64::MAX), Value::Float(f64::MAX)])
            .unwrap_err();
        assert!(matches!(err, GenError::RangeViolation { .. }));

        let err = builtin_from_args("serial", &[Value::Float(f64::NAN)]).unwrap_err();
        assert!(matches!(err, GenError::ArityOrTypeMismatch { .. }));
    }
}
