//! Single-write output slots and their pool.
//!
//! An [`OutputSlot`] ferries a value computed in one lifecycle phase into a
//! later phase of the same render pass: `unset -> written -> read`. Slots are
//! pooled; the pool resets contents on release so reuse across unrelated
//! values is an error-free no-op.

use std::any::Any;

use crate::error::{LifecycleError, Result};

/// A pooled, single-write-then-read box.
///
/// Writing twice before a release is rejected; the first value wins. This is
/// the documented policy, so diff logic can rely on a written slot being the
/// value the producing phase intended.
#[derive(Default)]
pub struct OutputSlot {
    value: Option<Box<dyn Any>>,
}

impl OutputSlot {
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Writes the slot. Fails with [`LifecycleError::SlotAlreadyWritten`] if
    /// the slot already holds a value.
    pub fn set<T: Any>(&mut self, value: T) -> Result<()> {
        if self.value.is_some() {
            return Err(LifecycleError::SlotAlreadyWritten);
        }
        self.value = Some(Box::new(value));
        Ok(())
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Reads the slot without consuming it. Returns `None` when unset or when
    /// the stored value is not a `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.as_ref().and_then(|boxed| boxed.downcast_ref())
    }

    /// Consumes the slot's value, leaving it unset.
    pub fn take<T: Any>(&mut self) -> Option<T> {
        match self.value.take() {
            Some(boxed) => match boxed.downcast::<T>() {
                Ok(value) => Some(*value),
                Err(other) => {
                    // Wrong type requested; put the value back untouched.
                    self.value = Some(other);
                    None
                }
            },
            None => None,
        }
    }

    /// Clears the slot back to unset.
    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Bounded free-list of [`OutputSlot`]s.
///
/// `acquire` never fails: past-capacity demand is served by fresh
/// allocations. `release` resets the slot and drops it once the free list is
/// full, so the pool never grows beyond its construction-time capacity.
pub struct OutputPool {
    free: Vec<OutputSlot>,
    capacity: usize,
}

impl OutputPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn acquire(&mut self) -> OutputSlot {
        self.free.pop().unwrap_or_default()
    }

    pub fn release(&mut self, mut slot: OutputSlot) {
        slot.reset();
        if self.free.len() < self.capacity {
            self.free.push(slot);
        }
    }

    #[inline]
    pub fn pooled(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_write_is_rejected_first_value_wins() {
        let mut slot = OutputSlot::new();
        slot.set(41u64).unwrap();
        assert!(matches!(
            slot.set(7u64),
            Err(LifecycleError::SlotAlreadyWritten)
        ));
        assert_eq!(slot.get::<u64>(), Some(&41));
    }

    #[test]
    fn release_resets_before_reuse() {
        let mut pool = OutputPool::new(2);
        let mut slot = pool.acquire();
        slot.set("measured").unwrap();
        pool.release(slot);

        let reused = pool.acquire();
        assert!(!reused.is_set());
        assert_eq!(reused.get::<&str>(), None);
    }

    #[test]
    fn take_with_wrong_type_keeps_value() {
        let mut slot = OutputSlot::new();
        slot.set(3i32).unwrap();
        assert_eq!(slot.take::<u64>(), None);
        assert_eq!(slot.take::<i32>(), Some(3));
        assert!(!slot.is_set());
    }

    #[test]
    fn pool_does_not_grow_past_capacity() {
        let mut pool = OutputPool::new(1);
        pool.release(OutputSlot::new());
        pool.release(OutputSlot::new());
        assert_eq!(pool.pooled(), 1);
    }
}
