//! Flat emitter: one JSON array holding every entity, nested ones included.

use crate::error::EmitError;
use crate::DEFAULT_BUFFER_SIZE;
use datagen_core::{Emitter, EntityResult, GenError, SharedEntity};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

const START: &[u8] = b"[\n";
const DELIMITER: &[u8] = b",\n";
const END: &[u8] = b"\n]\n";

struct FlatState {
    writer: Box<dyn Write>,
    first: bool,
    finished: bool,
    written: u64,
}

/// Writes entities as they are emitted, in emission order.
///
/// Nested entities are emitted before the entity that contains them, so a
/// child always precedes its parent in the array. Continuations share the
/// same writer.
#[derive(Clone)]
pub struct FlatEmitter {
    state: Rc<RefCell<FlatState>>,
}

impl FlatEmitter {
    /// Start a JSON array on `writer`.
    pub fn new(writer: impl Write + 'static) -> Result<Self, EmitError> {
        let mut writer: Box<dyn Write> = Box::new(writer);
        writer.write_all(START)?;
        Ok(Self {
            state: Rc::new(RefCell::new(FlatState {
                writer,
                first: true,
                finished: false,
                written: 0,
            })),
        })
    }

    /// Create (or truncate) `path` and write to it through a buffer.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, EmitError> {
        let file = File::create(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Opened flat output");
        Self::new(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file))
    }

    /// Number of entities written so far.
    pub fn written(&self) -> u64 {
        self.state.borrow().written
    }

    fn write_entity(&self, entity: &EntityResult) -> Result<(), EmitError> {
        let mut state = self.state.borrow_mut();
        if state.finished {
            return Err(EmitError::Finalized);
        }
        if state.first {
            state.first = false;
        } else {
            state.writer.write_all(DELIMITER)?;
        }
        serde_json::to_writer_pretty(&mut state.writer, entity)?;
        state.written += 1;
        Ok(())
    }

    fn close(&self) -> Result<(), EmitError> {
        let mut state = self.state.borrow_mut();
        if state.finished {
            return Ok(());
        }
        state.writer.write_all(END)?;
        state.writer.flush()?;
        state.finished = true;
        Ok(())
    }
}

impl Emitter for FlatEmitter {
    fn emit(&mut self, entity: &EntityResult, _declared_type: &str) -> Result<(), GenError> {
        Ok(self.write_entity(entity)?)
    }

    fn next_emitter(&self, _current: &SharedEntity, _field_key: &str, _is_multi_valued: bool) -> Box<dyn Emitter> {
        Box::new(self.clone())
    }

    fn finalize(&mut self) -> Result<(), GenError> {
        Ok(self.close()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagen_core::Value;
    use tempfile::TempDir;

    fn entity(id: i64) -> EntityResult {
        let mut e = EntityResult::new();
        e.insert("$id".to_string(), Value::Int(id));
        e
    }

    #[test]
    fn test_writes_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        let mut emitter = FlatEmitter::create(&path).unwrap();
        let mut nested = emitter.next_emitter(
            &Rc::new(RefCell::new(EntityResult::new())),
            "child",
            false,
        );
        nested.emit(&entity(1), "Child").unwrap();
        emitter.emit(&entity(2), "Parent").unwrap();
        emitter.finalize().unwrap();

        assert_eq!(emitter.written(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        let ids: Vec<i64> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["$id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_empty_output_is_valid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.json");

        let mut emitter = FlatEmitter::create(&path).unwrap();
        emitter.finalize().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }

    #[test]
    fn test_emit_after_finalize_fails() {
        let dir = TempDir::new().unwrap();
        let mut emitter = FlatEmitter::create(dir.path().join("x.json")).unwrap();
        emitter.finalize().unwrap();

        let err = emitter.emit(&entity(1), "X").unwrap_err();
        assert!(matches!(err, GenError::Emit(_)));
    }
}
