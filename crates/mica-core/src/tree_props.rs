//! Tree-scoped inherited props.
//!
//! A type-keyed side channel visible to descendants. Sharing is by `Rc`;
//! `put` copies the map, so a child augmenting its own view never mutates the
//! parent's map in place.

use std::any::{Any, TypeId};
use std::rc::Rc;

use crate::collections::map::HashMap;

#[derive(Clone, Default)]
pub struct TreeProps {
    inner: Rc<HashMap<TypeId, Rc<dyn Any>>>,
}

impl TreeProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Any>(&self) -> Option<Rc<T>> {
        self.inner
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Copy-on-write insert: returns a new `TreeProps` carrying `value`,
    /// leaving `self` untouched.
    #[must_use]
    pub fn put<T: Any>(&self, value: T) -> Self {
        let mut map = (*self.inner).clone();
        map.insert(TypeId::of::<T>(), Rc::new(value));
        Self {
            inner: Rc::new(map),
        }
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.inner.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Theme(u32);

    #[derive(Debug, PartialEq)]
    struct Depth(usize);

    #[test]
    fn put_never_mutates_the_parent_map() {
        let parent = TreeProps::new().put(Theme(1));
        let child = parent.put(Theme(2)).put(Depth(1));

        assert_eq!(*parent.get::<Theme>().unwrap(), Theme(1));
        assert!(parent.get::<Depth>().is_none());
        assert_eq!(*child.get::<Theme>().unwrap(), Theme(2));
        assert_eq!(*child.get::<Depth>().unwrap(), Depth(1));
    }

    #[test]
    fn clone_shares_until_written() {
        let a = TreeProps::new().put(Theme(7));
        let b = a.clone();
        assert!(Rc::ptr_eq(&a.inner, &b.inner));
        let c = b.put(Depth(0));
        assert!(!Rc::ptr_eq(&a.inner, &c.inner));
    }
}
