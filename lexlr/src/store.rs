//! Arena-style object stores with domain-tagged identities.
//!
//! Every graph structure in this workspace (NFA nodes, DFA states, parser
//! states, productions) lives in an [`IndexedStore`] and is addressed by a
//! small copyable id instead of a reference. Ids are newtypes generated by
//! [`define_id!`], one type per domain, so an id minted for one store cannot
//! be used to index another store's objects.

use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;

/// An identity handle usable as an [`IndexedStore`] index.
///
/// Implementations are zero-cost wrappers around `usize` with a reserved
/// invalid sentinel. Use [`define_id!`] rather than implementing by hand.
pub trait StoreId: Copy + Eq + Ord + fmt::Debug {
    /// The sentinel value; never refers to a stored object.
    const INVALID: Self;
    /// Short domain name used in diagnostics.
    const DOMAIN: &'static str;

    fn from_usize(index: usize) -> Self;
    fn as_usize(self) -> usize;

    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Defines a domain-tagged id type implementing [`StoreId`].
///
/// ```rust
/// use lexlr::store::StoreId;
/// lexlr::define_id!(pub WidgetId, "widget");
/// assert!(!WidgetId::INVALID.is_valid());
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* pub $name:ident, $domain:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $crate::store::StoreId for $name {
            const INVALID: Self = Self(usize::MAX);
            const DOMAIN: &'static str = $domain;

            #[inline]
            fn from_usize(index: usize) -> Self {
                Self(index)
            }

            #[inline]
            fn as_usize(self) -> usize {
                self.0
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                if self.0 == usize::MAX {
                    write!(f, concat!($domain, "(invalid)"))
                } else {
                    write!(f, concat!($domain, "({})"), self.0)
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Debug::fmt(self, f)
            }
        }

        impl From<$name> for usize {
            fn from(id: $name) -> usize {
                use $crate::store::StoreId;
                id.as_usize()
            }
        }
    };
}

/// Failed identity lookup: the id was invalid, out of range, or minted for
/// a different store generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no {domain} with index {index} (store holds {len})")]
pub struct LookupError {
    pub domain: &'static str,
    pub index: usize,
    pub len: usize,
}

/// An append-only arena assigning stable ids in insertion order.
///
/// Objects are never removed; an id stays valid for the lifetime of the
/// store. Lookup with a foreign or invalid id fails with [`LookupError`]
/// rather than yielding a default.
#[derive(Debug, Clone)]
pub struct IndexedStore<I, T> {
    items: Vec<T>,
    _marker: PhantomData<fn(I) -> I>,
}

impl<I, T> Default for IndexedStore<I, T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<I: StoreId, T> IndexedStore<I, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` and returns its freshly assigned id.
    pub fn insert(&mut self, value: T) -> I {
        let id = I::from_usize(self.items.len());
        self.items.push(value);
        id
    }

    pub fn get(&self, id: I) -> Result<&T, LookupError> {
        self.items.get(id.as_usize()).ok_or(LookupError {
            domain: I::DOMAIN,
            index: id.as_usize(),
            len: self.items.len(),
        })
    }

    pub fn get_mut(&mut self, id: I) -> Result<&mut T, LookupError> {
        let len = self.items.len();
        self.items.get_mut(id.as_usize()).ok_or(LookupError {
            domain: I::DOMAIN,
            index: id.as_usize(),
            len,
        })
    }

    pub fn contains(&self, id: I) -> bool {
        id.as_usize() < self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates objects in insertion order together with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_usize(i), item))
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = I> + use<I, T> {
        (0..self.items.len()).map(I::from_usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    define_id!(pub TestId, "test-object");
    define_id!(pub OtherId, "other-object");

    #[test]
    fn insert_assigns_sequential_ids() {
        let mut store = IndexedStore::<TestId, &str>::new();
        let a = store.insert("a");
        let b = store.insert("b");
        assert_eq!(a.as_usize(), 0);
        assert_eq!(b.as_usize(), 1);
        assert_eq!(store.get(a).unwrap(), &"a");
        assert_eq!(store.get(b).unwrap(), &"b");
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut store = IndexedStore::<TestId, u32>::new();
        for n in [7, 3, 9] {
            store.insert(n);
        }
        let collected: Vec<u32> = store.iter().map(|(_, &n)| n).collect();
        assert_eq!(collected, vec![7, 3, 9]);
    }

    #[test]
    fn invalid_id_fails_lookup() {
        let store = IndexedStore::<TestId, u32>::new();
        let err = store.get(TestId::INVALID).unwrap_err();
        assert_eq!(err.domain, "test-object");
        assert_eq!(err.len, 0);
    }

    #[test]
    fn out_of_range_id_fails_lookup() {
        let mut store = IndexedStore::<TestId, u32>::new();
        store.insert(1);
        assert!(store.get(TestId::from_usize(5)).is_err());
        assert!(store.contains(TestId::from_usize(0)));
        assert!(!store.contains(TestId::from_usize(5)));
    }

    #[test]
    fn sentinel_is_never_a_real_id() {
        let mut store = IndexedStore::<TestId, u32>::new();
        let id = store.insert(0);
        assert!(id.is_valid());
        assert!(!TestId::INVALID.is_valid());
    }

    #[test]
    fn debug_format_names_the_domain() {
        assert_eq!(format!("{:?}", TestId::from_usize(3)), "test-object(3)");
        assert_eq!(format!("{:?}", OtherId::INVALID), "other-object(invalid)");
    }
}
