//! datagen library
//!
//! An interpreter for a small language describing entity templates (typed
//! fields, inheritance, cardinality, distributions) and generating any
//! number of synthetic instances from them.
//!
//! # Architecture
//!
//! ```text
//! script (JSON / YAML Node tree)
//!    │
//!    ▼
//! Interpreter ──▶ Evaluator ──declares──▶ Generator (datagen-generator)
//!    │                                      │
//!    └── generation statements ─────────────┤
//!                                           ▼
//!                                   Emitter (datagen-emit)
//! ```
//!
//! # Example
//!
//! ```rust
//! use datagen::{Interpreter, InterpreterConfig};
//! use datagen_core::Node;
//! use datagen_emit::BufferEmitter;
//! use datagen_generator::GenContext;
//!
//! let script = Node::root(vec![
//!     Node::entity(
//!         "Person",
//!         vec![
//!             Node::field("name", Node::builtin("dict", vec![Node::string("first_name")])),
//!             Node::field("age", Node::builtin("integer", vec![Node::int(18), Node::int(90)])),
//!         ],
//!     ),
//!     Node::generation(Node::identifier("Person"), Node::int(3)),
//! ]);
//!
//! let mut emitter = BufferEmitter::new();
//! let mut interpreter = Interpreter::new(InterpreterConfig::default(), GenContext::new(42));
//! interpreter.run(&script, &mut emitter).unwrap();
//!
//! assert_eq!(emitter.of_type("Person").len(), 3);
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Flat JSON array on stdout
//! datagen run people.yaml
//!
//! # One file per entity type, reproducible
//! datagen run people.yaml --format split --output out/ --seed 7
//! ```

pub mod config;
pub mod interpreter;
pub mod output;
pub mod script;

// Re-exports for convenience
pub use config::InterpreterConfig;
pub use interpreter::{
    apply_operator, Evaluated, Evaluator, GenerationReport, Interpreter, Lambda,
};
pub use output::{open_emitter, OutputFormat};
pub use script::{from_json, from_yaml, load_script, ScriptError};
