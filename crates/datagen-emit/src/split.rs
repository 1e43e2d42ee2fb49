//! Split emitter: one flat JSON array file per declared type.

use crate::error::EmitError;
use crate::flat::FlatEmitter;
use datagen_core::{Emitter, EntityResult, GenError, SharedEntity};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;

/// Routes each entity to `<dir>/<declared type>.json`, opening files lazily.
#[derive(Clone)]
pub struct SplitEmitter {
    dir: PathBuf,
    emitters: Rc<RefCell<IndexMap<String, FlatEmitter>>>,
}

impl SplitEmitter {
    /// Write into `dir`, creating it if needed.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self, EmitError> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            emitters: Rc::new(RefCell::new(IndexMap::new())),
        })
    }

    pub fn path_for(&self, declared_type: &str) -> PathBuf {
        self.dir.join(format!("{declared_type}.json"))
    }

    /// Declared types seen so far, in first-seen order.
    pub fn types(&self) -> Vec<String> {
        self.emitters.borrow().keys().cloned().collect()
    }

    fn emitter_for(&self, declared_type: &str) -> Result<FlatEmitter, EmitError> {
        let mut emitters = self.emitters.borrow_mut();
        if let Some(emitter) = emitters.get(declared_type) {
            return Ok(emitter.clone());
        }
        let path = self.path_for(declared_type);
        info!(entity = %declared_type, path = %path.display(), "Opening output file");
        let emitter = FlatEmitter::create(&path)?;
        emitters.insert(declared_type.to_string(), emitter.clone());
        Ok(emitter)
    }
}

impl Emitter for SplitEmitter {
    fn emit(&mut self, entity: &EntityResult, declared_type: &str) -> Result<(), GenError> {
        let mut emitter = self.emitter_for(declared_type)?;
        emitter.emit(entity, declared_type)
    }

    fn next_emitter(&self, _current: &SharedEntity, _field_key: &str, _is_multi_valued: bool) -> Box<dyn Emitter> {
        Box::new(self.clone())
    }

    fn finalize(&mut self) -> Result<(), GenError> {
        let emitters: Vec<FlatEmitter> = self.emitters.borrow().values().cloned().collect();
        for mut emitter in emitters {
            emitter.finalize()?;
        }
        Ok(())
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

    fn read_ids(path: &Path) -> Vec<i64> {
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["$id"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_one_file_per_type() {
        let dir = TempDir::new().unwrap();
        let mut emitter = SplitEmitter::create(dir.path().join("out")).unwrap();

        emitter.emit(&entity(1), "User").unwrap();
        let mut nested = emitter.next_emitter(&Rc::new(RefCell::new(EntityResult::new())), "pet", false);
        nested.emit(&entity(2), "Pet").unwrap();
        emitter.emit(&entity(3), "User").unwrap();
        emitter.finalize().unwrap();

        assert_eq!(emitter.types(), vec!["User".to_string(), "Pet".to_string()]);
        assert_eq!(read_ids(&emitter.path_for("User")), vec![1, 3]);
        assert_eq!(read_ids(&emitter.path_for("Pet")), vec![2]);
    }
}
