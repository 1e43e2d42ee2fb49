//! Generation engine for the datagen entity language.
//!
//! This crate turns entity templates into live instance factories. All
//! randomness flows from the single seeded RNG owned by [`GenContext`], so
//! the same seed and the same template always produce the same entities.
//!
//! # Architecture
//!
//! ```text
//! Scope ──registers──▶ Generator
//!                         │
//!                         │ fields: FieldSet (ordered)
//!                         ▼
//!                  ┌──────────────┐
//!                  │    Field     │  count: Option<CountRange>, unique
//!                  │  FieldType   │
//!                  └──────┬───────┘
//!        ┌────────┬───────┼─────────┬────────────┬──────────────┐
//!        ▼        ▼       ▼         ▼            ▼              ▼
//!     Literal Reference Entity  Deferred      Builtin      Distribution
//!                (inheritance) (nested)  (closure over    (scalar)   (over intervals)
//!                                         a Scope)
//! ```
//!
//! # Example
//!
//! ```rust
//! use datagen_core::{DiscardEmitter, Value};
//! use datagen_generator::{GenContext, Generator, PrimaryKey, Scope};
//!
//! let person = Generator::new("Person", PrimaryKey::default(), true);
//! person
//!     .with_field("name", "string", &[Value::Int(5)], None, false)
//!     .unwrap()
//!     .with_field("age", "integer", &[Value::Int(1), Value::Int(10)], None, false)
//!     .unwrap();
//!
//! let mut ctx = GenContext::new(42);
//! let ids = person
//!     .generate(3, &mut DiscardEmitter, &Scope::root(), &mut ctx)
//!     .unwrap();
//! assert_eq!(ids.len(), 3);
//! ```
//!
//! # Builtin field types
//!
//! - `integer` - Random integers in a range
//! - `decimal` - Random floats in a range
//! - `string` - Fixed-length random strings
//! - `date` - Random timestamps in a range, with an optional output format
//! - `bool` - Fair coin
//! - `serial` - Monotonic integers from an offset
//! - `uniqint` - Random non-repeating integers
//! - `uid` - 32-character hex ids
//! - `enum` - One member of a collection
//! - `dict` - A word from a dictionary category

pub mod builtins;
pub mod context;
pub mod dictionary;
pub mod distribution;
pub mod field;
pub mod field_set;
pub mod generator;
pub mod generators;
pub mod primary_key;
pub mod scope;

// Re-exports for convenience
pub use builtins::{builtin_from_args, canonical_builtin_name};
pub use context::GenContext;
pub use dictionary::{DictionaryError, WordDictionary};
pub use distribution::{Distribution, DistributionKind};
pub use field::{Field, FieldType};
pub use field_set::FieldSet;
pub use generator::{Generator, GeneratorRef, EXTENDS_KEY, PARENT_KEY, TYPE_KEY};
pub use generators::Builtin;
pub use primary_key::{PrimaryKey, PrimaryKeyKind, DEFAULT_PRIMARY_KEY_NAME};
pub use scope::{Callable, DeferredFn, Scope, Symbol};
