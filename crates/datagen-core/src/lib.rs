//! Core types for the datagen entity generation language.
//!
//! This crate provides the foundational types shared by the evaluator,
//! the generation engine and the emitters:
//!
//! - [`Node`] - Parse-tree nodes the evaluator walks
//! - [`Value`] - Closed set of runtime values
//! - [`EntityResult`] - One generated record
//! - [`CountRange`] - Field and generation cardinality
//! - [`GenError`] - Error taxonomy
//! - [`Emitter`], [`Dictionary`] - Collaborators implemented elsewhere
//!
//! # Architecture
//!
//! ```text
//! datagen-core (this crate)
//!    │
//!    ├─── datagen-generator  (scope, fields, distributions, generators)
//!    │
//!    ├─── datagen-emit       (implements Emitter for JSON outputs)
//!    │
//!    └─── datagen            (evaluator and CLI)
//! ```

pub mod count_range;
pub mod emitter;
pub mod error;
pub mod node;
pub mod values;

// Re-exports for convenience
pub use count_range::CountRange;
pub use emitter::{DiscardEmitter, Dictionary, Emitter, SharedEntity};
pub use error::GenError;
pub use node::{Location, Node, NodeKind, NodeValue};
pub use values::{DateValue, EntityResult, Value};
