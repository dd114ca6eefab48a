//! Mount content recycling.
//!
//! Platform objects produced by `on_create_mount_content` are expensive to
//! build, so unmounted content goes back into a bounded, type-keyed pool and
//! is handed out again on the next mount of the same component type. The pool
//! treats content as opaque: resetting an object before release is the unmount
//! callback's responsibility, not the pool's.
//!
//! All access happens on the UI-owning thread; the single-writer discipline is
//! enforced by confinement, not locking.

use std::any::Any;

use smallvec::SmallVec;

use crate::collections::map::{Entry, HashMap};

/// The unmanaged platform object a mount pass binds to. Opaque to the core.
pub type MountContent = Box<dyn Any>;

/// Fixed-capacity free-list. Releasing past capacity discards the excess;
/// acquiring from an empty list returns `None` and the caller falls back to
/// the content factory.
pub struct RecyclePool<T> {
    free: SmallVec<[T; 4]>,
    capacity: usize,
}

impl<T> RecyclePool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: SmallVec::new(),
            capacity,
        }
    }

    pub fn acquire(&mut self) -> Option<T> {
        self.free.pop()
    }

    /// Returns `false` when the item was discarded because the pool is full.
    pub fn release(&mut self, item: T) -> bool {
        if self.free.len() < self.capacity {
            self.free.push(item);
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn pooled(&self) -> usize {
        self.free.len()
    }

    pub fn is_full(&self) -> bool {
        self.free.len() >= self.capacity
    }
}

/// Type-keyed mount content pools, shared across the whole tree.
///
/// Capacity per mount type is fixed at registration and never grows. The
/// registry is owned by the tree scope and cleared when that scope is torn
/// down.
#[derive(Default)]
pub struct MountContentPool {
    pools: HashMap<&'static str, RecyclePool<MountContent>>,
}

impl MountContentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a mount type with its pool capacity. First registration wins;
    /// the capacity of a mount type cannot change over the tree's lifetime.
    pub fn register(&mut self, mount_type: &'static str, capacity: usize) {
        if let Entry::Vacant(slot) = self.pools.entry(mount_type) {
            slot.insert(RecyclePool::new(capacity));
        }
    }

    pub fn is_registered(&self, mount_type: &'static str) -> bool {
        self.pools.contains_key(mount_type)
    }

    /// Hands out recycled content, or `None` when the free list is empty or
    /// the type was never registered. Callers fall back to
    /// `on_create_mount_content`.
    pub fn acquire(&mut self, mount_type: &'static str) -> Option<MountContent> {
        self.pools.get_mut(mount_type)?.acquire()
    }

    /// Returns content to its type's free list. Excess over capacity is
    /// discarded, as is content of unregistered types.
    pub fn release(&mut self, mount_type: &'static str, content: MountContent) {
        match self.pools.get_mut(mount_type) {
            Some(pool) => {
                if !pool.release(content) {
                    log::debug!("mount pool for {mount_type} full, discarding content");
                }
            }
            None => {
                log::warn!("release for unregistered mount type {mount_type}, discarding");
            }
        }
    }

    /// Optional warm-up for types that declare `can_preallocate`: fills the
    /// free list up to capacity with factory-built content. Purely a
    /// performance hint; correctness never depends on it.
    pub fn preallocate(
        &mut self,
        mount_type: &'static str,
        mut factory: impl FnMut() -> MountContent,
    ) {
        if let Some(pool) = self.pools.get_mut(mount_type) {
            while !pool.is_full() {
                pool.release(factory());
            }
        }
    }

    pub fn pooled(&self, mount_type: &'static str) -> usize {
        self.pools.get(mount_type).map_or(0, RecyclePool::pooled)
    }

    /// Drops every free list; called when the owning tree scope is destroyed.
    pub fn clear(&mut self) {
        self.pools.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(tag: u32) -> MountContent {
        Box::new(tag)
    }

    #[test]
    fn capacity_bound_discards_excess_release() {
        let mut pool = MountContentPool::new();
        pool.register("text", 3);

        for tag in 0..4 {
            pool.release("text", content(tag));
        }
        // K+1 released, exactly K retrievable.
        assert_eq!(pool.pooled("text"), 3);
        let mut seen = 0;
        while pool.acquire("text").is_some() {
            seen += 1;
        }
        assert_eq!(seen, 3);
    }

    #[test]
    fn acquire_on_empty_returns_none() {
        let mut pool = MountContentPool::new();
        pool.register("text", 3);
        assert!(pool.acquire("text").is_none());
        assert!(pool.acquire("unregistered").is_none());
    }

    #[test]
    fn handed_out_content_leaves_the_free_list() {
        let mut pool = MountContentPool::new();
        pool.register("text", 2);
        pool.release("text", content(1));
        let got = pool.acquire("text").unwrap();
        assert_eq!(pool.pooled("text"), 0);
        assert_eq!(*got.downcast_ref::<u32>().unwrap(), 1);
    }

    #[test]
    fn registration_capacity_is_fixed() {
        let mut pool = MountContentPool::new();
        pool.register("text", 1);
        pool.register("text", 10);
        pool.release("text", content(1));
        pool.release("text", content(2));
        assert_eq!(pool.pooled("text"), 1);
    }

    #[test]
    fn preallocate_fills_to_capacity() {
        let mut pool = MountContentPool::new();
        pool.register("text", 3);
        let mut built = 0;
        pool.preallocate("text", || {
            built += 1;
            content(built)
        });
        assert_eq!(built, 3);
        assert_eq!(pool.pooled("text"), 3);
    }
}
