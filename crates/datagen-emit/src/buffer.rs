//! In-memory emitter.

use datagen_core::{Emitter, EntityResult, GenError, SharedEntity};
use std::cell::RefCell;
use std::rc::Rc;

/// Keeps every emitted entity, with its declared type, in emission order.
///
/// Clones (and continuations) share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferEmitter {
    entities: Rc<RefCell<Vec<(String, EntityResult)>>>,
}

impl BufferEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.borrow().is_empty()
    }

    /// Every entity emitted so far.
    pub fn entities(&self) -> Vec<EntityResult> {
        self.entities
            .borrow()
            .iter()
            .map(|(_, entity)| entity.clone())
            .collect()
    }

    /// Entities emitted with the given declared type.
    pub fn of_type(&self, declared_type: &str) -> Vec<EntityResult> {
        self.entities
            .borrow()
            .iter()
            .filter(|(t, _)| t == declared_type)
            .map(|(_, entity)| entity.clone())
            .collect()
    }

    /// Declared types in emission order, one per entity.
    pub fn types(&self) -> Vec<String> {
        self.entities.borrow().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn clear(&self) {
        self.entities.borrow_mut().clear();
    }
}

impl Emitter for BufferEmitter {
    fn emit(&mut self, entity: &EntityResult, declared_type: &str) -> Result<(), GenError> {
        self.entities
            .borrow_mut()
            .push((declared_type.to_string(), entity.clone()));
        Ok(())
    }

    fn next_emitter(&self, _current: &SharedEntity, _field_key: &str, _is_multi_valued: bool) -> Box<dyn Emitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagen_core::Value;

    #[test]
    fn test_continuations_share_buffer() {
        let mut buffer = BufferEmitter::new();
        let mut child = buffer.next_emitter(&SharedEntity::default(), "k", false);

        let mut e = EntityResult::new();
        e.insert("$id".to_string(), Value::Int(1));

        child.emit(&e, "Child").unwrap();
        buffer.emit(&e, "Parent").unwrap();

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.types(), vec!["Child", "Parent"]);
        assert_eq!(buffer.of_type("Parent").len(), 1);

        buffer.clear();
        assert!(buffer.is_empty());
    }
}
