//! Fields: a [`FieldType`] plus cardinality and uniqueness.

use crate::context::GenContext;
use crate::distribution::Distribution;
use crate::generator::GeneratorRef;
use crate::generators::Builtin;
use crate::scope::{DeferredFn, Scope};
use datagen_core::{CountRange, Emitter, GenError, Value};
use std::cell::RefCell;
use std::fmt;
use tracing::debug;

/// Draws attempted before a unique field gives up.
pub const MAX_UNIQUE_ATTEMPTS: usize = 1000;

/// How a single value of a field is produced.
pub enum FieldType {
    /// A constant.
    Literal(Value),

    /// Delegates to a field of another generator (inheritance).
    Reference { source: GeneratorRef, field: String },

    /// Generates a nested entity and yields its primary key.
    Entity(GeneratorRef),

    /// A computed expression, run against the in-progress entity's scope.
    Deferred(DeferredFn),

    Builtin(Builtin),

    Distribution(Distribution),
}

impl FieldType {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Literal(_) => "literal",
            FieldType::Reference { .. } => "reference",
            FieldType::Entity(_) => "entity",
            FieldType::Deferred(_) => "deferred",
            FieldType::Builtin(builtin) => builtin.type_name(),
            FieldType::Distribution(_) => "distribution",
        }
    }

    /// Type name after following reference chains.
    pub fn underlying_type(&self) -> &'static str {
        match self {
            FieldType::Reference { source, field } => match source.field(field) {
                Some(referred) => referred.field_type.underlying_type(),
                None => "reference",
            },
            other => other.type_name(),
        }
    }

    /// Whether values of this type are nested entities, including through
    /// references and distribution intervals.
    pub fn yields_entities(&self) -> bool {
        match self {
            FieldType::Entity(_) => true,
            FieldType::Reference { source, field } => source
                .field(field)
                .is_some_and(|referred| referred.field_type.yields_entities()),
            FieldType::Distribution(distribution) => distribution
                .intervals()
                .iter()
                .any(FieldType::yields_entities),
            _ => false,
        }
    }

    /// Produce exactly one value, ignoring cardinality.
    pub fn generate_single(
        &self,
        parent_id: Option<&Value>,
        emitter: &mut dyn Emitter,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<Value, GenError> {
        match self {
            FieldType::Literal(value) => Ok(value.clone()),

            FieldType::Reference { source, field } => {
                let referred = source.field(field).ok_or_else(|| {
                    GenError::structural(format!(
                        "Entity `{}` has no field `{field}` to reference",
                        source.name()
                    ))
                })?;
                referred
                    .field_type
                    .generate_single(parent_id, emitter, scope, ctx)
            }

            FieldType::Entity(generator) => {
                let entity = generator.one(parent_id.cloned(), emitter, scope, ctx)?;
                Ok(entity
                    .get(generator.primary_key().name())
                    .cloned()
                    .unwrap_or(Value::Null))
            }

            FieldType::Deferred(deferred) => deferred(scope, ctx),

            FieldType::Builtin(builtin) => builtin.sample(ctx),

            FieldType::Distribution(distribution) => {
                distribution.generate(parent_id, emitter, scope, ctx)
            }
        }
    }
}

impl From<Builtin> for FieldType {
    fn from(builtin: Builtin) -> Self {
        FieldType::Builtin(builtin)
    }
}

impl From<Distribution> for FieldType {
    fn from(distribution: Distribution) -> Self {
        FieldType::Distribution(distribution)
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Literal(value) => write!(f, "Literal({value:?})"),
            FieldType::Reference { source, field } => {
                write!(f, "Reference({}.{field})", source.name())
            }
            FieldType::Entity(generator) => write!(f, "Entity({})", generator.name()),
            FieldType::Deferred(_) => f.write_str("Deferred"),
            FieldType::Builtin(builtin) => write!(f, "{builtin:?}"),
            FieldType::Distribution(distribution) => write!(f, "{distribution:?}"),
        }
    }
}

/// A named generatable unit with optional cardinality.
///
/// `count == None` yields one scalar; any `Some` yields a collection, even
/// when the range is `[1, 1]`.
#[derive(Debug)]
pub struct Field {
    pub field_type: FieldType,
    pub count: Option<CountRange>,
    pub unique: bool,
    previous: RefCell<Vec<Value>>,
}

impl Field {
    pub fn new(field_type: FieldType, count: Option<CountRange>, unique: bool) -> Self {
        Self {
            field_type,
            count,
            unique,
            previous: RefCell::new(Vec::new()),
        }
    }

    pub fn scalar(field_type: FieldType) -> Self {
        Self::new(field_type, None, false)
    }

    pub fn is_multi_valued(&self) -> bool {
        self.count.is_some()
    }

    pub fn type_name(&self) -> &'static str {
        self.field_type.type_name()
    }

    pub fn underlying_type(&self) -> &'static str {
        self.field_type.underlying_type()
    }

    pub fn yields_entities(&self) -> bool {
        self.field_type.yields_entities()
    }

    /// Whether `unique` can be honored for this field.
    pub fn uniquable(&self) -> bool {
        !self.is_multi_valued()
            && matches!(
                self.underlying_type(),
                "dict" | "enum" | "string" | "date" | "integer" | "decimal"
            )
    }

    /// Produce the field's value, applying cardinality and uniqueness.
    pub fn generate_value(
        &self,
        parent_id: Option<&Value>,
        emitter: &mut dyn Emitter,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<Value, GenError> {
        let mut result = self.value(parent_id, emitter, scope, ctx)?;

        if self.unique && self.uniquable() {
            let mut attempts = 0;
            while self.previous.borrow().contains(&result) {
                attempts += 1;
                if attempts > MAX_UNIQUE_ATTEMPTS {
                    return Err(GenError::range(format!(
                        "Failed to generate unique value for {:?}",
                        self.underlying_type()
                    )));
                }
                result = self.value(parent_id, emitter, scope, ctx)?;
            }
            self.previous.borrow_mut().push(result.clone());
        }

        Ok(result)
    }

    fn value(
        &self,
        parent_id: Option<&Value>,
        emitter: &mut dyn Emitter,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<Value, GenError> {
        let Some(range) = &self.count else {
            return self
                .field_type
                .generate_single(parent_id, emitter, scope, ctx);
        };

        let count = range.count(ctx.rng());
        debug!(count, field_type = self.type_name(), "Generating multi-valued field");

        let mut values = Vec::new();
        for _ in 0..count {
            values.push(
                self.field_type
                    .generate_single(parent_id, emitter, scope, ctx)?,
            );
        }
        Ok(Value::Collection(values))
    }
}
