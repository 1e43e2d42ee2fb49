//! Output emitters for generated entities.
//!
//! Every emitter implements [`datagen_core::Emitter`]; the generator never
//! knows which output shape it is feeding.
//!
//! - [`FlatEmitter`] - One JSON array with every entity, nested ones included
//! - [`NestedEmitter`] - Nested entities inlined into their parent, document keyed by type
//! - [`SplitEmitter`] - One JSON array file per declared type
//! - [`BufferEmitter`] - In-memory, for tests and embedding
//!
//! # Example
//!
//! ```ignore
//! use datagen_emit::FlatEmitter;
//!
//! let mut emitter = FlatEmitter::create("entities.json")?;
//! generator.generate(100, &mut emitter, &scope, &mut ctx)?;
//! emitter.finalize()?;
//! ```

pub mod buffer;
pub mod error;
pub mod flat;
pub mod nested;
pub mod split;

/// Default buffer size for file output.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

pub use buffer::BufferEmitter;
pub use error::EmitError;
pub use flat::FlatEmitter;
pub use nested::{NestedDocument, NestedEmitter};
pub use split::SplitEmitter;
