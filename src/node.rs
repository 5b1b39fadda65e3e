//! Heap nodes and child management
//!
//! A [`HeapNode`] combines a sibling-ring slot with the parent/child/degree/mark
//! bookkeeping of a Fibonacci tree. Nodes live in a [`NodeArena`] owned by the
//! heap; every reference between nodes is a [`NodeKey`] into that arena, so the
//! arena is the only owner of node storage. Callers only see [`NodeHandle`]s,
//! which pair a key with the id of the heap that issued it.

use crate::traits::HeapError;
use sibling_ring::{RingLink, RingOps};
use slotmap::{new_key_type, SlotMap};
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    /// Generational slot of a node inside one heap's arena.
    pub(crate) struct NodeKey;
}

static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a heap, carried by every handle it issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct HeapId(NonZeroU64);

impl HeapId {
    pub(crate) fn fresh() -> Self {
        HeapId(NonZeroU64::MIN.saturating_add(NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed)))
    }
}

/// Handle to an element of a [`FibonacciHeap`](crate::fibonacci::FibonacciHeap).
///
/// A handle stays valid until its element is extracted, and only for the heap
/// that issued it. Handles that are stale, that come from another heap, or that
/// predate a `merge` of their heap into another one are all reported as
/// [`HeapError::InvalidHandle`]; `merge` returns the replacements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub(crate) key: NodeKey,
    pub(crate) heap: HeapId,
}

/// Arena holding every node of one heap.
pub(crate) type NodeArena<K, V> = SlotMap<NodeKey, HeapNode<K, V>>;

pub(crate) const RING: RingOps = RingOps::new();

#[derive(Debug)]
pub(crate) struct HeapNode<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Number of nodes in the child ring
    pub(crate) degree: usize,
    /// Set when a non-root node has lost a child since it was last linked
    pub(crate) mark: bool,
    pub(crate) parent: Option<NodeKey>,
    /// Entry point into the child ring
    pub(crate) child: Option<NodeKey>,
    pub(crate) link: RingLink<NodeKey>,
}

impl<K, V> HeapNode<K, V> {
    pub(crate) fn new(key: K, value: V, this: NodeKey) -> Self {
        HeapNode {
            key,
            value,
            degree: 0,
            mark: false,
            parent: None,
            child: None,
            link: RingLink::single(this),
        }
    }
}

impl<K, V> AsRef<RingLink<NodeKey>> for HeapNode<K, V> {
    #[inline]
    fn as_ref(&self) -> &RingLink<NodeKey> {
        &self.link
    }
}

impl<K, V> AsMut<RingLink<NodeKey>> for HeapNode<K, V> {
    #[inline]
    fn as_mut(&mut self) -> &mut RingLink<NodeKey> {
        &mut self.link
    }
}

#[inline]
pub(crate) fn node<K, V>(arena: &NodeArena<K, V>, handle: NodeKey) -> Result<&HeapNode<K, V>, HeapError> {
    arena
        .get(handle)
        .ok_or(HeapError::InvariantViolation("node handle is not in the arena"))
}

#[inline]
pub(crate) fn node_mut<K, V>(
    arena: &mut NodeArena<K, V>,
    handle: NodeKey,
) -> Result<&mut HeapNode<K, V>, HeapError> {
    arena
        .get_mut(handle)
        .ok_or(HeapError::InvariantViolation("node handle is not in the arena"))
}

/// Makes `child` a child of `parent`.
///
/// `child` must be a singleton ring. It becomes the sole child ring if
/// `parent` has none, otherwise it is spliced in after the existing child.
pub(crate) fn add_child<K, V>(
    arena: &mut NodeArena<K, V>,
    parent: NodeKey,
    child: NodeKey,
) -> Result<(), HeapError> {
    let first_child = node(arena, parent)?.child;
    match first_child {
        Some(first) => RING.insert_after(arena, first, Some(child))?,
        None => node_mut(arena, parent)?.child = Some(child),
    }

    let c = node_mut(arena, child)?;
    c.parent = Some(parent);
    c.mark = false;

    node_mut(arena, parent)?.degree += 1;
    Ok(())
}

/// Removes `child` from the child ring of `parent`, leaving it a detached singleton.
pub(crate) fn remove_child<K, V>(
    arena: &mut NodeArena<K, V>,
    parent: NodeKey,
    child: NodeKey,
) -> Result<(), HeapError> {
    if node(arena, child)?.parent != Some(parent) {
        return Err(HeapError::InvariantViolation("removed child does not belong to parent"));
    }

    if RING.is_single(&*arena, child)? {
        let p = node_mut(arena, parent)?;
        if p.child != Some(child) {
            return Err(HeapError::InvariantViolation("sole child is not the parent's child pointer"));
        }
        p.child = None;
    } else {
        let next = RING.next(&*arena, child)?;
        let p = node_mut(arena, parent)?;
        if p.child == Some(child) {
            p.child = Some(next);
        }
        RING.detach(arena, child)?;
    }

    let c = node_mut(arena, child)?;
    c.parent = None;
    c.mark = false;

    let p = node_mut(arena, parent)?;
    p.degree = p
        .degree
        .checked_sub(1)
        .ok_or(HeapError::InvariantViolation("parent degree underflow"))?;
    Ok(())
}
