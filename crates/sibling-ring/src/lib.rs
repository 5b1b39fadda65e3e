//! Circular doubly-linked rings addressed by arena handles.
//!
//! This crate provides the sibling ring used by Fibonacci-style heaps: every
//! element sits in exactly one circular list, and a lone element is a ring of
//! itself. Links are stored as handles into an arena rather than as pointers,
//! so no ownership cycle ever exists and detaching a node is a pure relinking
//! of handles.
//!
//! # Circular vs Linear Lists
//!
//! In a circular list:
//! - A single node points to itself (both `next` and `prev`)
//! - There is no head or tail - any node can be the "entry point"
//! - Splicing two rings together is O(1)
//! - Iteration wraps around (must track starting point)
//!
//! # Example
//!
//! ```rust
//! use sibling_ring::{RingLink, RingOps};
//! use slotmap::{DefaultKey, SlotMap};
//!
//! struct Node {
//!     link: RingLink<DefaultKey>,
//!     value: i32,
//! }
//!
//! impl AsRef<RingLink<DefaultKey>> for Node {
//!     fn as_ref(&self) -> &RingLink<DefaultKey> {
//!         &self.link
//!     }
//! }
//!
//! impl AsMut<RingLink<DefaultKey>> for Node {
//!     fn as_mut(&mut self) -> &mut RingLink<DefaultKey> {
//!         &mut self.link
//!     }
//! }
//!
//! let mut arena: SlotMap<DefaultKey, Node> = SlotMap::new();
//! let a = arena.insert_with_key(|k| Node { link: RingLink::single(k), value: 1 });
//! let b = arena.insert_with_key(|k| Node { link: RingLink::single(k), value: 2 });
//!
//! let ops = RingOps::new();
//! ops.insert_after(&mut arena, a, Some(b)).unwrap();
//!
//! assert_eq!(ops.next(&arena, a).unwrap(), b);
//! assert_eq!(ops.next(&arena, b).unwrap(), a);
//! assert_eq!(ops.count(&arena, a).unwrap(), 2);
//! assert_eq!(arena[b].value, 2);
//! ```

use std::fmt;

use slotmap::{Key, SlotMap};

// =============================================================================
// RingLink
// =============================================================================

/// The `next`/`prev` slot a node carries to take part in a ring.
///
/// Both neighbours are always valid handles. A freshly created link is a
/// singleton ring: it points at its own handle in both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RingLink<H> {
    next: H,
    prev: H,
}

impl<H: Copy> RingLink<H> {
    /// Creates the link of a singleton ring owned by `this`.
    #[inline]
    pub fn single(this: H) -> Self {
        RingLink {
            next: this,
            prev: this,
        }
    }

    /// Gets the next handle in the ring.
    #[inline]
    pub fn next(&self) -> H {
        self.next
    }

    /// Gets the previous handle in the ring.
    #[inline]
    pub fn prev(&self) -> H {
        self.prev
    }

    /// Rewrites both neighbours through `f`, e.g. when nodes move to another arena.
    ///
    /// Returns `None` if `f` has no translation for either neighbour.
    pub fn remap<F>(&self, mut f: F) -> Option<Self>
    where
        F: FnMut(H) -> Option<H>,
    {
        Some(RingLink {
            next: f(self.next)?,
            prev: f(self.prev)?,
        })
    }
}

/// Returned when a ring link names a handle the store no longer holds.
///
/// For a correctly maintained ring this never happens; seeing it means the
/// owning data structure has lost track of one of its nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DanglingHandle;

impl fmt::Display for DanglingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ring link refers to a handle that is not in the store")
    }
}

impl std::error::Error for DanglingHandle {}

// =============================================================================
// RingStore
// =============================================================================

/// Storage that holds one [`RingLink`] per handle.
///
/// Implemented for any [`SlotMap`] whose values expose their link through
/// `AsRef`/`AsMut`, which is how heap nodes are stored.
pub trait RingStore {
    /// Handle type used to address nodes.
    type Handle: Copy + Eq + fmt::Debug;

    /// Returns the link of `handle`, or `None` if the store does not hold it.
    fn link(&self, handle: Self::Handle) -> Option<&RingLink<Self::Handle>>;

    /// Mutable counterpart of [`RingStore::link`].
    fn link_mut(&mut self, handle: Self::Handle) -> Option<&mut RingLink<Self::Handle>>;
}

impl<K, N> RingStore for SlotMap<K, N>
where
    K: Key,
    N: AsRef<RingLink<K>> + AsMut<RingLink<K>>,
{
    type Handle = K;

    #[inline]
    fn link(&self, handle: K) -> Option<&RingLink<K>> {
        self.get(handle).map(AsRef::as_ref)
    }

    #[inline]
    fn link_mut(&mut self, handle: K) -> Option<&mut RingLink<K>> {
        self.get_mut(handle).map(AsMut::as_mut)
    }
}

// =============================================================================
// RingOps
// =============================================================================

/// Operations for manipulating rings held in a [`RingStore`].
///
/// All structural operations are O(1); only [`RingOps::count`] and
/// [`RingOps::collect`] walk the ring.
#[derive(Clone, Copy, Debug, Default)]
pub struct RingOps;

impl RingOps {
    /// Creates a new `RingOps`.
    #[inline]
    pub const fn new() -> Self {
        RingOps
    }

    /// Gets the next handle in the ring of `node`.
    #[inline]
    pub fn next<S: RingStore>(&self, store: &S, node: S::Handle) -> Result<S::Handle, DanglingHandle> {
        store.link(node).map(RingLink::next).ok_or(DanglingHandle)
    }

    /// Gets the previous handle in the ring of `node`.
    #[inline]
    pub fn prev<S: RingStore>(&self, store: &S, node: S::Handle) -> Result<S::Handle, DanglingHandle> {
        store.link(node).map(RingLink::prev).ok_or(DanglingHandle)
    }

    /// Returns true iff `node` is its own ring neighbour.
    #[inline]
    pub fn is_single<S: RingStore>(&self, store: &S, node: S::Handle) -> Result<bool, DanglingHandle> {
        Ok(self.next(store, node)? == node)
    }

    /// Resets `node` to a singleton ring without touching any other node.
    ///
    /// Only correct when the former neighbours are being rebuilt as well
    /// (for example when a whole root ring is reassembled from scratch).
    #[inline]
    pub fn make_single<S: RingStore>(&self, store: &mut S, node: S::Handle) -> Result<(), DanglingHandle> {
        *store.link_mut(node).ok_or(DanglingHandle)? = RingLink::single(node);
        Ok(())
    }

    /// Splices the whole ring of `new` in immediately after `node`.
    ///
    /// Both rings keep their internal order:
    ///
    /// ```text
    /// before:  node -> n1 -> ... -> node        new -> m1 -> ... -> mk -> new
    /// after:   node -> new -> m1 -> ... -> mk -> n1 -> ... -> node
    /// ```
    ///
    /// Does nothing when `new` is `None`. `node` and `new` must belong to
    /// different rings.
    pub fn insert_after<S: RingStore>(
        &self,
        store: &mut S,
        node: S::Handle,
        new: Option<S::Handle>,
    ) -> Result<(), DanglingHandle> {
        let Some(new) = new else {
            return Ok(());
        };

        let node_next = self.next(store, node)?;
        let new_last = self.prev(store, new)?;

        store.link_mut(new_last).ok_or(DanglingHandle)?.next = node_next;
        store.link_mut(node_next).ok_or(DanglingHandle)?.prev = new_last;
        store.link_mut(new).ok_or(DanglingHandle)?.prev = node;
        store.link_mut(node).ok_or(DanglingHandle)?.next = new;
        Ok(())
    }

    /// Removes `node` from its ring, reconnecting its neighbours.
    ///
    /// Afterwards `node` is a singleton ring. Only the immediate neighbours
    /// are touched.
    pub fn detach<S: RingStore>(&self, store: &mut S, node: S::Handle) -> Result<(), DanglingHandle> {
        let next = self.next(store, node)?;
        let prev = self.prev(store, node)?;

        if next == node {
            return Ok(());
        }

        store.link_mut(prev).ok_or(DanglingHandle)?.next = next;
        store.link_mut(next).ok_or(DanglingHandle)?.prev = prev;
        self.make_single(store, node)
    }

    /// Counts the number of elements in the ring containing `start`.
    ///
    /// This is O(n) - use sparingly.
    pub fn count<S: RingStore>(&self, store: &S, start: S::Handle) -> Result<usize, DanglingHandle> {
        let mut count = 1;
        let mut current = self.next(store, start)?;

        while current != start {
            count += 1;
            current = self.next(store, current)?;
        }

        Ok(count)
    }

    /// Snapshots the ring containing `start`, in ring order beginning at `start`.
    ///
    /// Callers that restructure the ring while visiting it walk this snapshot
    /// instead of following live links.
    pub fn collect<S: RingStore>(&self, store: &S, start: S::Handle) -> Result<Vec<S::Handle>, DanglingHandle> {
        let mut members = vec![start];
        let mut current = self.next(store, start)?;

        while current != start {
            members.push(current);
            current = self.next(store, current)?;
        }

        Ok(members)
    }

    /// Borrowing walk over the ring containing `start`.
    ///
    /// The walk ends early if a dangling link is met.
    pub fn iter<'a, S: RingStore>(&self, store: &'a S, start: S::Handle) -> RingIter<'a, S> {
        RingIter {
            store,
            start,
            current: Some(start),
        }
    }
}

/// Iterator returned by [`RingOps::iter`].
pub struct RingIter<'a, S: RingStore> {
    store: &'a S,
    start: S::Handle,
    current: Option<S::Handle>,
}

impl<S: RingStore> Iterator for RingIter<'_, S> {
    type Item = S::Handle;

    fn next(&mut self) -> Option<S::Handle> {
        let current = self.current?;
        self.current = self
            .store
            .link(current)
            .map(RingLink::next)
            .filter(|&next| next != self.start);
        Some(current)
    }
}

// =============================================================================
// Tests
// =============================================================================
