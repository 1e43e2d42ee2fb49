//! Nested emitter: nested entities are inlined into their parent.
//!
//! The top-level emitter collects entities into a document keyed by declared
//! type. Continuations handed out by [`Emitter::next_emitter`] point at a
//! field of the in-progress parent entity and write into it directly, so the
//! parent is emitted with its children already in place.

use crate::error::EmitError;
use crate::DEFAULT_BUFFER_SIZE;
use datagen_core::{Emitter, EntityResult, GenError, SharedEntity, Value};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

/// Top-level output: entities grouped by declared type, in first-seen order.
pub type NestedDocument = IndexMap<String, Vec<EntityResult>>;

/// Where an emitted entity goes.
enum Cursor {
    Root {
        document: Rc<RefCell<NestedDocument>>,
        writer: Option<Box<dyn Write>>,
    },
    Field {
        current: SharedEntity,
        key: String,
        is_multi_valued: bool,
    },
}

pub struct NestedEmitter {
    cursor: Cursor,
}

impl NestedEmitter {
    /// Collect entities and write the document to `writer` on finalize.
    pub fn new(writer: impl Write + 'static) -> Self {
        Self {
            cursor: Cursor::Root {
                document: Rc::new(RefCell::new(NestedDocument::new())),
                writer: Some(Box::new(writer)),
            },
        }
    }

    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, EmitError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file)))
    }

    /// Snapshot of the top-level document; empty for continuations.
    pub fn document(&self) -> NestedDocument {
        match &self.cursor {
            Cursor::Root { document, .. } => document.borrow().clone(),
            Cursor::Field { .. } => NestedDocument::new(),
        }
    }

    fn insert(&self, entity: &EntityResult, declared_type: &str) -> Result<(), EmitError> {
        match &self.cursor {
            Cursor::Root { document, .. } => {
                document
                    .borrow_mut()
                    .entry(declared_type.to_string())
                    .or_default()
                    .push(entity.clone());
                Ok(())
            }
            Cursor::Field {
                current,
                key,
                is_multi_valued,
            } => {
                let mut current = current.borrow_mut();
                let nested = Value::Entity(entity.clone());

                if !*is_multi_valued {
                    current.insert(key.clone(), nested);
                    return Ok(());
                }

                match current
                    .entry(key.clone())
                    .or_insert_with(|| Value::Collection(Vec::new()))
                {
                    Value::Collection(items) => {
                        items.push(nested);
                        Ok(())
                    }
                    other => Err(EmitError::Nested {
                        key: key.clone(),
                        reason: format!("expected an entity set, found {}", other.kind_name()),
                    }),
                }
            }
        }
    }
}

impl Emitter for NestedEmitter {
    fn emit(&mut self, entity: &EntityResult, declared_type: &str) -> Result<(), GenError> {
        Ok(self.insert(entity, declared_type)?)
    }

    fn next_emitter(&self, current: &SharedEntity, field_key: &str, is_multi_valued: bool) -> Box<dyn Emitter> {
        Box::new(NestedEmitter {
            cursor: Cursor::Field {
                current: Rc::clone(current),
                key: field_key.to_string(),
                is_multi_valued,
            },
        })
    }

    fn receiver(&self) -> Option<SharedEntity> {
        match &self.cursor {
            Cursor::Field { current, .. } => Some(Rc::clone(current)),
            Cursor::Root { .. } => None,
        }
    }

    fn finalize(&mut self) -> Result<(), GenError> {
        if let Cursor::Root { document, writer } = &mut self.cursor {
            if let Some(mut writer) = writer.take() {
                serde_json::to_writer_pretty(&mut writer, &*document.borrow())
                    .map_err(EmitError::from)?;
                writer.write_all(b"\n").map_err(EmitError::from)?;
                writer.flush().map_err(EmitError::from)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entity(id: i64) -> EntityResult {
        let mut e = EntityResult::new();
        e.insert("$id".to_string(), Value::Int(id));
        e
    }

    #[test]
    fn test_single_valued_field_inlines_entity() {
        let parent: SharedEntity = Rc::new(RefCell::new(entity(1)));
        let root = NestedEmitter::new(std::io::sink());

        let mut child = root.next_emitter(&parent, "address", false);
        child.emit(&entity(10), "Address").unwrap();

        assert_eq!(parent.borrow()["address"], Value::Entity(entity(10)));
        assert!(child.receiver().is_some());
        assert!(root.receiver().is_none());
    }

    #[test]
    fn test_multi_valued_field_collects_entities() {
        let parent: SharedEntity = Rc::new(RefCell::new(entity(1)));
        let root = NestedEmitter::new(std::io::sink());

        let mut child = root.next_emitter(&parent, "pets", true);
        child.emit(&entity(10), "Pet").unwrap();
        child.emit(&entity(11), "Pet").unwrap();

        assert_eq!(
            parent.borrow()["pets"],
            Value::Collection(vec![Value::Entity(entity(10)), Value::Entity(entity(11))])
        );
    }

    #[test]
    fn test_multi_valued_rejects_scalar_slot() {
        let parent: SharedEntity = Rc::new(RefCell::new(entity(1)));
        parent.borrow_mut().insert("pets".to_string(), Value::Int(3));
        let root = NestedEmitter::new(std::io::sink());

        let mut child = root.next_emitter(&parent, "pets", true);
        assert!(child.emit(&entity(10), "Pet").is_err());
    }

    #[test]
    fn test_root_document_written_on_finalize() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested.json");

        let mut root = NestedEmitter::create(&path).unwrap();
        root.emit(&entity(1), "User").unwrap();
        root.emit(&entity(2), "User").unwrap();
        root.emit(&entity(3), "Admin").unwrap();
        assert_eq!(root.document()["User"].len(), 2);
        root.finalize().unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["User"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["Admin"][0]["$id"], 3);
    }
}
