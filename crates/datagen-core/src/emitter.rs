//! Collaborator traits implemented outside the generation engine.

use crate::error::GenError;
use crate::values::EntityResult;
use rand::RngCore;
use std::cell::RefCell;
use std::rc::Rc;

/// An entity under construction, shared with nested emitters and with the
/// transient scope that exposes its fields to sibling expressions.
pub type SharedEntity = Rc<RefCell<EntityResult>>;

/// Sink for generated entities.
///
/// The generator never knows the output shape. It emits each finished
/// entity and, before generating a nested entity field, asks for the
/// emitter that should receive the nested entities.
pub trait Emitter {
    /// Receive a completed entity of the given declared type.
    fn emit(&mut self, entity: &EntityResult, declared_type: &str) -> Result<(), GenError>;

    /// Continuation for the entities generated under `field_key` of `current`.
    fn next_emitter(
        &self,
        current: &SharedEntity,
        field_key: &str,
        is_multi_valued: bool,
    ) -> Box<dyn Emitter>;

    /// Current accumulation target; only buffering emitters have one.
    fn receiver(&self) -> Option<SharedEntity> {
        None
    }

    /// Flush and close any underlying output.
    fn finalize(&mut self) -> Result<(), GenError> {
        Ok(())
    }
}

/// Word source for `dict` fields.
///
/// Implementations may be shared between pipelines, so they must be
/// thread-safe; the random source is always supplied by the caller.
pub trait Dictionary: Send + Sync {
    /// Pick a word from `category`; an unknown category yields an empty string.
    fn value_from_dictionary(&self, category: &str, rng: &mut dyn RngCore) -> String;
}

/// Emitter that drops everything it receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardEmitter;

impl Emitter for DiscardEmitter {
    fn emit(&mut self, _entity: &EntityResult, _declared_type: &str) -> Result<(), GenError> {
        Ok(())
    }

    fn next_emitter(
        &self,
        _current: &SharedEntity,
        _field_key: &str,
        _is_multi_valued: bool,
    ) -> Box<dyn Emitter> {
        Box::new(DiscardEmitter)
    }
}
