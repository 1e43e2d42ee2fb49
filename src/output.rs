//! Output shape selection for the CLI.

use anyhow::Context;
use clap::ValueEnum;
use datagen_core::Emitter;
use datagen_emit::{FlatEmitter, NestedEmitter, SplitEmitter, DEFAULT_BUFFER_SIZE};
use std::io::{self, BufWriter};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One JSON array with every entity
    #[default]
    Flat,
    /// Nested entities inlined into their parent
    Nested,
    /// One JSON array file per entity type (requires --output directory)
    Split,
}

/// Open the emitter for `format`, writing to `output` or stdout.
pub fn open_emitter(format: OutputFormat, output: Option<&Path>) -> anyhow::Result<Box<dyn Emitter>> {
    let emitter: Box<dyn Emitter> = match (format, output) {
        (OutputFormat::Flat, Some(path)) => Box::new(
            FlatEmitter::create(path)
                .with_context(|| format!("Failed to open output file {path:?}"))?,
        ),
        (OutputFormat::Flat, None) => Box::new(FlatEmitter::new(stdout())?),
        (OutputFormat::Nested, Some(path)) => Box::new(
            NestedEmitter::create(path)
                .with_context(|| format!("Failed to open output file {path:?}"))?,
        ),
        (OutputFormat::Nested, None) => Box::new(NestedEmitter::new(stdout())),
        (OutputFormat::Split, Some(dir)) => Box::new(
            SplitEmitter::create(dir)
                .with_context(|| format!("Failed to create output directory {dir:?}"))?,
        ),
        (OutputFormat::Split, None) => {
            anyhow::bail!("--format split requires --output <DIR>")
        }
    };
    Ok(emitter)
}

fn stdout() -> BufWriter<io::Stdout> {
    BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagen_core::{EntityResult, Value};
    use tempfile::TempDir;

    #[test]
    fn test_split_requires_directory() {
        let err = open_emitter(OutputFormat::Split, None).err().unwrap();
        assert!(err.to_string().contains("requires --output"));
    }

    #[test]
    fn test_flat_file_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        let mut emitter = open_emitter(OutputFormat::Flat, Some(&path)).unwrap();
        let mut entity = EntityResult::new();
        entity.insert("$id".to_string(), Value::Int(1));
        emitter.emit(&entity, "A").unwrap();
        emitter.finalize().unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, serde_json::json!([{"$id": 1}]));
    }
}
