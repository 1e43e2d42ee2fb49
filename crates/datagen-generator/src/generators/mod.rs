//! Individual value generators for the builtin field types.
//!
//! Each [`Builtin`] is a fully validated, ready-to-sample generator. Argument
//! parsing lives in [`crate::builtins`]; this module only draws values.

pub mod numeric;
pub mod sequence;
pub mod string;
pub mod timestamp;
pub mod uuid;

use crate::context::GenContext;
use chrono::{DateTime, Utc};
use datagen_core::{GenError, Value};
use rand::Rng;
use sequence::{SerialCounter, UniquePool};

/// A builtin scalar generator with its validated arguments.
#[derive(Debug)]
pub enum Builtin {
    Integer {
        min: i64,
        max: i64,
    },
    Decimal {
        min: f64,
        max: f64,
    },
    Str {
        length: usize,
    },
    Date {
        min: DateTime<Utc>,
        max: DateTime<Utc>,
        format: Option<String>,
    },
    Bool,
    Serial(SerialCounter),
    UniqueInt(UniquePool),
    Uid,
    Enum(Vec<Value>),
    Dict(String),
}

impl Builtin {
    /// Canonical type name, as accepted by the language.
    pub fn type_name(&self) -> &'static str {
        match self {
            Builtin::Integer { .. } => "integer",
            Builtin::Decimal { .. } => "decimal",
            Builtin::Str { .. } => "string",
            Builtin::Date { .. } => "date",
            Builtin::Bool => "bool",
            Builtin::Serial(_) => "serial",
            Builtin::UniqueInt(_) => "uniqint",
            Builtin::Uid => "uid",
            Builtin::Enum(_) => "enum",
            Builtin::Dict(_) => "dict",
        }
    }

    /// Draw one value. Only an exhausted serial counter fails.
    pub fn sample(&self, ctx: &mut GenContext) -> Result<Value, GenError> {
        let value = match self {
            Builtin::Integer { min, max } => numeric::generate_int_range(ctx.rng(), *min, *max),

            Builtin::Decimal { min, max } => numeric::generate_float_range(ctx.rng(), *min, *max),

            Builtin::Str { length } => string::generate_string(ctx.rng(), *length),

            Builtin::Date { min, max, format } => {
                timestamp::generate_timestamp_range(ctx.rng(), min, max, format.as_deref())
            }

            Builtin::Bool => Value::Bool(ctx.rng().random_bool(0.5)),

            Builtin::Serial(counter) => counter.next_value()?,

            Builtin::UniqueInt(pool) => pool.next_value(ctx.rng()),

            Builtin::Uid => uuid::generate_uid(ctx.rng()),

            Builtin::Enum(values) => {
                if values.is_empty() {
                    Value::Null
                } else {
                    let idx = ctx.rng().random_range(0..values.len());
                    values[idx].clone()
                }
            }

            Builtin::Dict(category) => Value::Str(ctx.dictionary_value(category)),
        };
        Ok(value)
    }
}
