//! Stateful generators: monotonic serials and non-repeating integers.

use datagen_core::{GenError, Value};
use rand::Rng;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

/// Monotonic counter starting at a fixed offset.
///
/// `next` is `None` once the counter has handed out `i64::MAX`.
#[derive(Debug)]
pub struct SerialCounter {
    next: Cell<Option<i64>>,
}

impl SerialCounter {
    pub fn new(offset: i64) -> Self {
        Self {
            next: Cell::new(Some(offset)),
        }
    }

    pub fn next_value(&self) -> Result<Value, GenError> {
        let current = self
            .next
            .get()
            .ok_or_else(|| GenError::range("Serial counter overflowed past the largest integer"))?;
        self.next.set(current.checked_add(1));
        Ok(Value::Int(current))
    }
}

/// Random non-negative integers that never repeat for the lifetime of the pool.
#[derive(Debug, Default)]
pub struct UniquePool {
    used: RefCell<HashSet<i64>>,
}

impl UniquePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_value<R: Rng>(&self, rng: &mut R) -> Value {
        let mut used = self.used.borrow_mut();
        loop {
            let candidate = i64::from(rng.random::<u32>());
            if used.insert(candidate) {
                return Value::Int(candidate);
            }
        }
    }

    pub fn issued(&self) -> usize {
        self.used.borrow().len()
    }
}
