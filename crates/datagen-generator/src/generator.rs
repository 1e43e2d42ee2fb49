//! Entity generators: the compiled, reusable form of an entity template.

use crate::builtins::builtin_from_args;
use crate::context::GenContext;
use crate::field::{Field, FieldType};
use crate::field_set::FieldSet;
use crate::primary_key::PrimaryKey;
use crate::scope::{DeferredFn, Scope};
use datagen_core::{CountRange, Emitter, EntityResult, GenError, SharedEntity, Value};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

pub const TYPE_KEY: &str = "$type";
pub const EXTENDS_KEY: &str = "$extends";
pub const PARENT_KEY: &str = "$parent";

static ANONYMOUS_ENTITIES: AtomicU64 = AtomicU64::new(0);

fn anonymous_name() -> String {
    let n = ANONYMOUS_ENTITIES.fetch_add(1, Ordering::Relaxed) + 1;
    format!("$anon{n}")
}

fn is_metadata(name: &str) -> bool {
    name == TYPE_KEY || name == EXTENDS_KEY
}

/// Shared handle to a generator; scopes, fields and child generators all hold one.
pub type GeneratorRef = Rc<Generator>;

/// Produces an unlimited number of [`EntityResult`]s from one template.
///
/// Fields are declared after construction through `&self` (the generator is
/// already registered in its scope by then), so the field set lives behind a
/// `RefCell`. The borrow is only ever held long enough to copy out the
/// `Rc<Field>` handles; generation itself runs without it.
pub struct Generator {
    name: String,
    extends: Option<String>,
    declared_type: String,
    fields: RefCell<FieldSet>,
    /// Names declared on this generator itself, as opposed to inherited ones
    declared: RefCell<HashSet<String>>,
    primary_key: Rc<PrimaryKey>,
    metadata_enabled: bool,
}

impl Generator {
    /// Create a root generator. An empty name yields an anonymous one.
    pub fn new(name: &str, primary_key: PrimaryKey, metadata_enabled: bool) -> GeneratorRef {
        let name = if name.is_empty() {
            anonymous_name()
        } else {
            name.to_string()
        };

        let mut fields = FieldSet::new();
        primary_key.attach(&mut fields);
        if metadata_enabled {
            fields.insert(TYPE_KEY, Field::scalar(FieldType::Literal(Value::from(name.as_str()))));
        }

        debug!(entity = %name, primary_key = %primary_key.name, "Created generator");

        Rc::new(Self {
            declared_type: name.clone(),
            name,
            extends: None,
            fields: RefCell::new(fields),
            declared: RefCell::new(HashSet::new()),
            primary_key: Rc::new(primary_key),
            metadata_enabled,
        })
    }

    /// Create a generator inheriting every field rule of `parent`.
    ///
    /// Without `key_override` the key field draws from the parent's key
    /// generator, so serial and unique sequences stay monotonic across the
    /// whole family. Inherited fields re-run the parent's rule per instance.
    pub fn extend(
        name: &str,
        parent: &GeneratorRef,
        key_override: Option<PrimaryKey>,
        metadata_enabled: bool,
    ) -> GeneratorRef {
        let (name, declared_type) = if name.is_empty() {
            (anonymous_name(), parent.declared_type.clone())
        } else {
            (name.to_string(), name.to_string())
        };

        let mut fields = FieldSet::new();
        let primary_key = match key_override {
            Some(key) => {
                key.attach(&mut fields);
                Rc::new(key)
            }
            None => {
                parent.primary_key.inherit(&mut fields, parent);
                Rc::clone(&parent.primary_key)
            }
        };

        if metadata_enabled {
            fields.insert(
                EXTENDS_KEY,
                Field::scalar(FieldType::Literal(Value::from(parent.declared_type.as_str()))),
            );
            fields.insert(
                TYPE_KEY,
                Field::scalar(FieldType::Literal(Value::from(declared_type.as_str()))),
            );
        }

        for (field_name, field) in parent.fields.borrow().iter() {
            if is_metadata(field_name)
                || field_name == parent.primary_key.name()
                || fields.contains(field_name)
            {
                continue;
            }
            fields.insert(
                field_name,
                Field::new(
                    FieldType::Reference {
                        source: Rc::clone(parent),
                        field: field_name.to_string(),
                    },
                    field.count,
                    field.unique,
                ),
            );
        }

        debug!(entity = %name, parent = %parent.name, "Extended generator");

        Rc::new(Self {
            name,
            extends: Some(parent.declared_type.clone()),
            declared_type,
            fields: RefCell::new(fields),
            declared: RefCell::new(HashSet::new()),
            primary_key,
            metadata_enabled,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name used for `$type` and handed to the emitter.
    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    pub fn metadata_enabled(&self) -> bool {
        self.metadata_enabled
    }

    pub fn field(&self, name: &str) -> Option<Rc<Field>> {
        self.fields.borrow().get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.borrow().contains(name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.borrow().names().map(str::to_string).collect()
    }

    /// Register a builtin field by type name and evaluated arguments.
    pub fn with_field(
        &self,
        name: &str,
        type_name: &str,
        args: &[Value],
        count: Option<CountRange>,
        unique: bool,
    ) -> Result<&Self, GenError> {
        let builtin = builtin_from_args(type_name, args)?;
        Ok(self.with_field_type(name, builtin.into(), count, unique))
    }

    /// Register a field whose values are nested entities from `generator`.
    pub fn with_entity_field(
        &self,
        name: &str,
        generator: GeneratorRef,
        count: Option<CountRange>,
    ) -> &Self {
        self.with_field_type(name, FieldType::Entity(generator), count, false)
    }

    pub fn with_literal_field(&self, name: &str, value: Value) -> &Self {
        self.with_field_type(name, FieldType::Literal(value), None, false)
    }

    /// Register a computed field, evaluated against each in-progress instance.
    pub fn with_deferred_field(&self, name: &str, deferred: DeferredFn) -> &Self {
        self.with_field_type(name, FieldType::Deferred(deferred), None, false)
    }

    /// Register any prepared field type (distributions included).
    pub fn with_field_type(
        &self,
        name: &str,
        field_type: FieldType,
        count: Option<CountRange>,
        unique: bool,
    ) -> &Self {
        if !self.declared.borrow_mut().insert(name.to_string()) {
            warn!(entity = %self.name, field = %name, "already defined field, overriding");
        }
        self.fields
            .borrow_mut()
            .insert(name, Field::new(field_type, count, unique));
        self
    }

    /// Generate `count` instances in sequence and return their primary keys.
    pub fn generate(
        &self,
        count: i64,
        emitter: &mut dyn Emitter,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<Vec<Value>, GenError> {
        if count < 1 {
            return Err(GenError::range(format!(
                "Must generate at least 1 `{}` entity, got {count}",
                self.name
            )));
        }

        info!(entity = %self.name, count, "Generating entities");

        let mut ids = Vec::new();
        for _ in 0..count {
            let entity = self.one(None, emitter, scope, ctx)?;
            ids.push(
                entity
                    .get(self.primary_key.name())
                    .cloned()
                    .unwrap_or(Value::Null),
            );
        }
        Ok(ids)
    }

    /// Generate, emit and return one instance.
    ///
    /// Sibling expressions see the instance's fields through a transient
    /// scope. The key is generated first, then `$parent`, then every other
    /// field in declaration order. A value is only written when its key is
    /// still absent, since nested emitters may already have filled it in.
    /// Nothing is emitted when a field fails.
    pub fn one(
        &self,
        parent_id: Option<Value>,
        emitter: &mut dyn Emitter,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<EntityResult, GenError> {
        let entity: SharedEntity = Rc::new(RefCell::new(EntityResult::new()));
        let transient = Scope::transient(scope, Rc::clone(&entity));
        let fields = self.fields.borrow().snapshot();
        let key_name = self.primary_key.name();

        let key_field = fields
            .iter()
            .find(|(name, _)| name == key_name)
            .map(|(_, field)| Rc::clone(field))
            .ok_or_else(|| {
                GenError::structural(format!(
                    "Entity `{}` has no primary key field `{key_name}`",
                    self.name
                ))
            })?;

        let id = key_field.generate_value(parent_id.as_ref(), emitter, &transient, ctx)?;
        entity.borrow_mut().insert(key_name.to_string(), id.clone());

        if let Some(parent_id) = parent_id {
            entity.borrow_mut().insert(PARENT_KEY.to_string(), parent_id);
        }

        for (name, field) in fields.iter().filter(|(name, _)| name != key_name) {
            let value = if field.yields_entities() {
                let mut nested = emitter.next_emitter(&entity, name, field.is_multi_valued());
                field.generate_value(Some(&id), nested.as_mut(), &transient, ctx)?
            } else {
                field.generate_value(Some(&id), emitter, &transient, ctx)?
            };

            entity.borrow_mut().entry(name.clone()).or_insert(value);
        }

        let result = entity.borrow().clone();
        debug!(entity = %self.name, id = %id, "Generated entity");

        emitter.emit(&result, &self.declared_type)?;
        Ok(result)
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("name", &self.name)
            .field("extends", &self.extends)
            .field("declared_type", &self.declared_type)
            .field("primary_key", &self.primary_key)
            .field("fields", &self.field_names())
            .finish()
    }
}
