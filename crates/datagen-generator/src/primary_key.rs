//! Primary key policy for a family of generators.

use crate::field::{Field, FieldType};
use crate::field_set::FieldSet;
use crate::generator::GeneratorRef;
use crate::generators::sequence::{SerialCounter, UniquePool};
use crate::generators::Builtin;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PRIMARY_KEY_NAME: &str = "$id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryKeyKind {
    /// Monotonic integers starting at zero
    Serial,
    /// Random non-repeating integers
    #[serde(rename = "uniqint")]
    UniqueInt,
    /// 32-character hex ids
    #[default]
    Uid,
}

impl PrimaryKeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryKeyKind::Serial => "serial",
            PrimaryKeyKind::UniqueInt => "uniqint",
            PrimaryKeyKind::Uid => "uid",
        }
    }

    fn builtin(&self) -> Builtin {
        match self {
            PrimaryKeyKind::Serial => Builtin::Serial(SerialCounter::new(0)),
            PrimaryKeyKind::UniqueInt => Builtin::UniqueInt(UniquePool::new()),
            PrimaryKeyKind::Uid => Builtin::Uid,
        }
    }
}

impl FromStr for PrimaryKeyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serial" | "$incr" => Ok(PrimaryKeyKind::Serial),
            "uniqint" | "$uniqint" => Ok(PrimaryKeyKind::UniqueInt),
            "uid" | "$uid" => Ok(PrimaryKeyKind::Uid),
            other => Err(format!(
                "Unsupported primary key type `{other}`, expected serial, uniqint or uid"
            )),
        }
    }
}

impl fmt::Display for PrimaryKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and kind of the key field.
///
/// Shared by reference (`Rc`) across an inheritance chain; only the
/// generator that declares it owns a key field with its own counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub name: String,
    pub kind: PrimaryKeyKind,
}

impl PrimaryKey {
    pub fn new(name: impl Into<String>, kind: PrimaryKeyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install a fresh key field (with its own counter or pool).
    pub fn attach(&self, fields: &mut FieldSet) {
        fields.insert(self.name.clone(), Field::scalar(self.kind.builtin().into()));
    }

    /// Install a key field that draws from `source`'s key generator.
    pub fn inherit(&self, fields: &mut FieldSet, source: &GeneratorRef) {
        fields.insert(
            self.name.clone(),
            Field::scalar(FieldType::Reference {
                source: GeneratorRef::clone(source),
                field: self.name.clone(),
            }),
        );
    }
}

impl Default for PrimaryKey {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_KEY_NAME, PrimaryKeyKind::default())
    }
}
