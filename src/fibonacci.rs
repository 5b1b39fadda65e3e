//! Fibonacci Heap implementation
//!
//! A Fibonacci heap is a data structure for priority queue operations with:
//! - O(1) amortized insert, decrease_key, and merge
//! - O(log n) amortized extract_min
//!
//! The structure consists of a collection of heap-ordered trees. Roots are linked
//! in a circular doubly linked list (the root ring) anchored at the minimum.
//!
//! All nodes of one heap live in a `slotmap` arena owned by the heap. Parent,
//! child and sibling links are keys into that arena, so there is no ownership
//! cycle and extracting a node simply removes it from the arena. The
//! [`NodeHandle`]s given out to callers also carry the heap's id, so a handle
//! is only ever resolved against the heap that issued it.

use crate::node::{self, add_child, node_mut, remove_child, HeapId, HeapNode, NodeArena, NodeKey, RING};
use crate::traits::{DecreaseKeyHeap, Heap, HeapError};
use log::trace;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::fmt;

pub use crate::node::NodeHandle;

/// Slack added to `floor(log_φ(n))` when sizing the consolidation bucket table.
pub const DEGREE_MARGIN: usize = 2;

/// Translation from the handles of a merged-in heap to their handles in the
/// receiving heap.
pub type HandleMap = FxHashMap<NodeHandle, NodeHandle>;

/// Upper bound on the degree of any root after consolidating `count` nodes.
pub fn degree_bound(count: usize) -> usize {
    if count < 2 {
        return DEGREE_MARGIN;
    }
    let phi = (1.0 + 5f64.sqrt()) / 2.0;
    ((count as f64).ln() / phi.ln()).floor() as usize + DEGREE_MARGIN
}

/// Fibonacci Heap
///
/// # Example
///
/// ```rust
/// use fibonacci_astar::fibonacci::FibonacciHeap;
///
/// let mut heap = FibonacciHeap::new();
/// let handle = heap.insert(5, "item");
/// heap.insert(3, "other");
/// heap.decrease_key(handle, 1).unwrap();
/// assert_eq!(heap.minimum(), Ok((&1, &"item")));
/// assert_eq!(heap.extract_min(), Ok((1, "item")));
/// ```
pub struct FibonacciHeap<K, V> {
    id: HeapId,
    nodes: NodeArena<K, V>,
    min: Option<NodeKey>,
    len: usize,
    /// Bucket table size used by the last consolidation
    max_degree: usize,
}

impl<K: Ord, V> FibonacciHeap<K, V> {
    /// Creates an empty heap.
    pub fn new() -> Self {
        FibonacciHeap {
            id: HeapId::fresh(),
            nodes: NodeArena::with_key(),
            min: None,
            len: 0,
            max_degree: 0,
        }
    }

    /// Returns true if the heap holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Inserts `value` with priority `key` and returns a handle for `decrease_key`.
    ///
    /// O(1): the new node is spliced into the root ring next to the minimum.
    ///
    /// # Panics
    /// Only if the heap is already corrupt, i.e. its minimum is missing from
    /// the arena. [`validate`](Self::validate) reports that state as
    /// [`HeapError::InvariantViolation`].
    pub fn insert(&mut self, key: K, value: V) -> NodeHandle {
        let fresh = self.nodes.insert_with_key(|k| HeapNode::new(key, value, k));
        if let Err(err) = self.link_root(fresh, true) {
            panic!("root ring of a corrupt heap: {err}");
        }
        self.handle(fresh)
    }

    /// Returns the minimum key and its value.
    ///
    /// # Errors
    /// [`HeapError::EmptyHeap`] if the heap holds no elements.
    pub fn minimum(&self) -> Result<(&K, &V), HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;
        let n = node::node(&self.nodes, min)?;
        Ok((&n.key, &n.value))
    }

    /// Like [`minimum`](Self::minimum) but returns `None` on an empty heap.
    pub fn peek(&self) -> Option<(&K, &V)> {
        self.minimum().ok()
    }

    /// Handle of the current minimum, if any.
    pub fn min_handle(&self) -> Option<NodeHandle> {
        self.min.map(|k| self.handle(k))
    }

    /// Key and value of a live element.
    pub fn get(&self, handle: NodeHandle) -> Option<(&K, &V)> {
        let k = self.resolve(handle).ok()?;
        self.nodes.get(k).map(|n| (&n.key, &n.value))
    }

    /// Current key of a live element.
    pub fn key_of(&self, handle: NodeHandle) -> Option<&K> {
        self.get(handle).map(|(k, _)| k)
    }

    /// Returns true while `handle` refers to an element of this heap.
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Removes every element and invalidates all handles.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.min = None;
        self.len = 0;
    }

    /// Merges `other` into this heap.
    ///
    /// The two root rings are spliced together and the smaller minimum wins.
    /// Since each heap owns its own arena, the nodes of `other` are moved into
    /// this arena. Handles issued by `other` stop resolving; the returned map
    /// translates them into handles valid for this heap.
    pub fn merge(&mut self, mut other: Self) -> Result<HandleMap, HeapError> {
        let mut moved = HandleMap::default();
        let Some(other_min) = other.min else {
            return Ok(moved);
        };

        let drained: Vec<_> = other.nodes.drain().collect();
        let mut rekeyed: FxHashMap<NodeKey, NodeKey> = FxHashMap::default();
        rekeyed.reserve(drained.len());
        for (old, n) in drained {
            let new = self.nodes.insert(n);
            rekeyed.insert(old, new);
        }

        let translate = |k: NodeKey| rekeyed.get(&k).copied();
        for &k in rekeyed.values() {
            let n = node_mut(&mut self.nodes, k)?;
            n.link = n
                .link
                .remap(translate)
                .ok_or(HeapError::InvariantViolation("merged node links outside its heap"))?;
            n.parent = match n.parent {
                Some(p) => Some(translate(p).ok_or(HeapError::InvariantViolation("merged parent outside its heap"))?),
                None => None,
            };
            n.child = match n.child {
                Some(c) => Some(translate(c).ok_or(HeapError::InvariantViolation("merged child outside its heap"))?),
                None => None,
            };
        }

        let other_min = translate(other_min).ok_or(HeapError::InvariantViolation("merged minimum outside its heap"))?;
        match self.min {
            None => self.min = Some(other_min),
            Some(min) => {
                RING.insert_after(&mut self.nodes, min, Some(other_min))?;
                if self.key(other_min)? < self.key(min)? {
                    self.min = Some(other_min);
                }
            }
        }
        self.len += other.len;

        moved.reserve(rekeyed.len());
        for (old, new) in rekeyed {
            moved.insert(other.handle(old), self.handle(new));
        }

        other.min = None;
        other.len = 0;
        Ok(moved)
    }

    /// Removes the minimum element and returns its key and value.
    ///
    /// Runs in three phases: the minimum's children are promoted to roots,
    /// the minimum is excised from the root ring and the remaining roots are
    /// consolidated by degree, then the root ring is rebuilt from the
    /// consolidation buckets.
    ///
    /// # Errors
    /// [`HeapError::EmptyHeap`] if the heap holds no elements.
    pub fn extract_min(&mut self) -> Result<(K, V), HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;

        // Phase 1: promote the children to the root ring
        let first_child = node::node(&self.nodes, min)?.child;
        if let Some(child) = first_child {
            for c in RING.collect(&self.nodes, child)? {
                let n = node_mut(&mut self.nodes, c)?;
                n.parent = None;
                n.mark = false;
            }
            let m = node_mut(&mut self.nodes, min)?;
            m.child = None;
            m.degree = 0;
            RING.insert_after(&mut self.nodes, min, Some(child))?;
        }

        self.len = self
            .len
            .checked_sub(1)
            .ok_or(HeapError::InvariantViolation("element count underflow"))?;

        if RING.is_single(&self.nodes, min)? {
            if self.len != 0 {
                return Err(HeapError::InvariantViolation(
                    "last root extracted while elements remain",
                ));
            }
            self.min = None;
            return self.take(min);
        }

        // Phase 2: excise the minimum, then consolidate what is left
        let start = RING.next(&self.nodes, min)?;
        RING.detach(&mut self.nodes, min)?;
        self.consolidate(start)?;

        self.take(min)
    }

    /// Lowers the key of `handle` to `new_key`.
    ///
    /// A root only updates the minimum. A child whose new key breaks heap
    /// order is cut to the root ring, followed by a cascading cut of its
    /// marked ancestors.
    ///
    /// # Errors
    /// - [`HeapError::InvalidHandle`] if the element is no longer in the heap
    ///   or the handle was issued by another heap
    /// - [`HeapError::InvalidKey`] if `new_key` is greater than the current key;
    ///   the heap is left unchanged
    pub fn decrease_key(&mut self, handle: NodeHandle, new_key: K) -> Result<(), HeapError> {
        let handle = self.resolve(handle)?;
        let n = node_mut(&mut self.nodes, handle)?;
        match new_key.cmp(&n.key) {
            Ordering::Greater => return Err(HeapError::InvalidKey),
            Ordering::Equal => return Ok(()),
            Ordering::Less => n.key = new_key,
        }

        let Some(parent) = n.parent else {
            match self.min {
                Some(min) if self.key(handle)? < self.key(min)? => self.min = Some(handle),
                Some(_) => {}
                None => return Err(HeapError::InvariantViolation("root exists in an empty heap")),
            }
            return Ok(());
        };

        if self.key(handle)? >= self.key(parent)? {
            return Ok(());
        }

        self.cut(handle, parent)?;
        self.cascading_cut(parent)
    }

    /// Removes elements in ascending key order.
    pub fn drain_sorted(&mut self) -> DrainSorted<'_, K, V> {
        DrainSorted { heap: self }
    }

    /// Walks the whole forest and checks every structural invariant.
    ///
    /// Checks ring consistency, parent links, degree counts, marks on roots,
    /// heap order, the minimum pointer and the element count. This is O(n)
    /// and meant for tests and debugging.
    pub fn validate(&self) -> Result<(), HeapError> {
        let Some(min) = self.min else {
            if self.len != 0 || !self.nodes.is_empty() {
                return Err(HeapError::InvariantViolation("empty heap still holds nodes"));
            }
            return Ok(());
        };

        let min_key = self.key(min)?;
        let mut reached = 0;
        let mut pending: Vec<(NodeKey, Option<NodeKey>)> = vec![(min, None)];

        while let Some((first, parent)) = pending.pop() {
            let ring = RING.collect(&self.nodes, first)?;
            if let Some(p) = parent {
                if node::node(&self.nodes, p)?.degree != ring.len() {
                    return Err(HeapError::InvariantViolation("degree differs from child ring size"));
                }
            }

            for h in ring {
                reached += 1;
                let n = node::node(&self.nodes, h)?;

                if RING.prev(&self.nodes, n.link.next())? != h || RING.next(&self.nodes, n.link.prev())? != h {
                    return Err(HeapError::InvariantViolation("ring links are inconsistent"));
                }
                if n.parent != parent {
                    return Err(HeapError::InvariantViolation("node parent does not own its ring"));
                }
                match parent {
                    None => {
                        if n.mark {
                            return Err(HeapError::InvariantViolation("root is marked"));
                        }
                        if n.key < *min_key {
                            return Err(HeapError::InvariantViolation("root key below the minimum"));
                        }
                    }
                    Some(p) => {
                        if n.key < *self.key(p)? {
                            return Err(HeapError::InvariantViolation("child key below parent key"));
                        }
                    }
                }

                match n.child {
                    Some(c) => pending.push((c, Some(h))),
                    None if n.degree != 0 => {
                        return Err(HeapError::InvariantViolation("childless node has a degree"));
                    }
                    None => {}
                }
            }
        }

        if reached != self.len || reached != self.nodes.len() {
            return Err(HeapError::InvariantViolation("element count differs from reachable nodes"));
        }
        Ok(())
    }

    #[inline]
    fn handle(&self, key: NodeKey) -> NodeHandle {
        NodeHandle { key, heap: self.id }
    }

    /// Arena key of a handle issued by this heap for a live element.
    fn resolve(&self, handle: NodeHandle) -> Result<NodeKey, HeapError> {
        if handle.heap != self.id || !self.nodes.contains_key(handle.key) {
            return Err(HeapError::InvalidHandle);
        }
        Ok(handle.key)
    }

    #[inline]
    fn key(&self, handle: NodeKey) -> Result<&K, HeapError> {
        Ok(&node::node(&self.nodes, handle)?.key)
    }

    /// Splices the ring of `handle` into the root ring and updates the minimum.
    ///
    /// `is_new_element` is false when an existing node is re-linked (after a
    /// cut or while rebuilding), so the element count is not touched.
    fn link_root(&mut self, handle: NodeKey, is_new_element: bool) -> Result<(), HeapError> {
        if is_new_element {
            self.len += 1;
        }

        match self.min {
            None => self.min = Some(handle),
            Some(min) => {
                RING.insert_after(&mut self.nodes, min, Some(handle))?;
                if self.key(handle)? < self.key(min)? {
                    self.min = Some(handle);
                }
            }
        }
        Ok(())
    }

    /// Links roots of equal degree until every degree is unique, then rebuilds
    /// the root ring and the minimum from the buckets.
    fn consolidate(&mut self, start: NodeKey) -> Result<(), HeapError> {
        self.max_degree = degree_bound(self.len);
        let mut buckets: Vec<Option<NodeKey>> = vec![None; self.max_degree + 1];

        let roots = RING.collect(&self.nodes, start)?;
        trace!("consolidating {} roots into {} buckets", roots.len(), buckets.len());

        for root in roots {
            let mut x = root;
            let mut d = node::node(&self.nodes, x)?.degree;

            loop {
                if d >= buckets.len() {
                    buckets.resize(d + 1, None);
                }
                let Some(y) = buckets[d].take() else {
                    break;
                };

                // The bucket occupant stays parent unless the incoming root is strictly smaller
                let (parent, child) = if self.key(x)? < self.key(y)? { (x, y) } else { (y, x) };
                RING.detach(&mut self.nodes, child)?;
                add_child(&mut self.nodes, parent, child)?;

                x = parent;
                d += 1;
            }

            buckets[d] = Some(x);
        }

        self.min = None;
        for root in buckets.into_iter().flatten() {
            RING.make_single(&mut self.nodes, root)?;
            self.link_root(root, false)?;
        }
        Ok(())
    }

    /// Cuts `handle` from `parent` and makes it a root.
    fn cut(&mut self, handle: NodeKey, parent: NodeKey) -> Result<(), HeapError> {
        remove_child(&mut self.nodes, parent, handle)?;
        self.link_root(handle, false)
    }

    /// Walks up from `start`, cutting marked ancestors until it reaches a root
    /// or an unmarked node (which is then marked).
    fn cascading_cut(&mut self, start: NodeKey) -> Result<(), HeapError> {
        let mut current = start;

        loop {
            let n = node_mut(&mut self.nodes, current)?;
            let Some(parent) = n.parent else {
                return Ok(());
            };
            if !n.mark {
                n.mark = true;
                return Ok(());
            }

            self.cut(current, parent)?;
            current = parent;
        }
    }

    /// Takes an excised node out of the arena.
    fn take(&mut self, handle: NodeKey) -> Result<(K, V), HeapError> {
        self.nodes
            .remove(handle)
            .map(|n| (n.key, n.value))
            .ok_or(HeapError::InvariantViolation("extracted node is missing from the arena"))
    }
}

impl<K: Ord, V> Default for FibonacciHeap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug, V> fmt::Debug for FibonacciHeap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FibonacciHeap")
            .field("len", &self.len)
            .field("min", &self.peek().map(|(k, _)| k))
            .field("max_degree", &self.max_degree)
            .finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for FibonacciHeap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for FibonacciHeap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut heap = FibonacciHeap::new();
        heap.extend(iter);
        heap
    }
}

/// Iterator returned by [`FibonacciHeap::drain_sorted`].
pub struct DrainSorted<'a, K: Ord, V> {
    heap: &'a mut FibonacciHeap<K, V>,
}

impl<K: Ord, V> Iterator for DrainSorted<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.heap.extract_min().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), Some(self.heap.len()))
    }
}

impl<K: Ord, V> Heap<K, V> for FibonacciHeap<K, V> {
    fn new() -> Self {
        FibonacciHeap::new()
    }

    fn is_empty(&self) -> bool {
        FibonacciHeap::is_empty(self)
    }

    fn len(&self) -> usize {
        FibonacciHeap::len(self)
    }

    fn push(&mut self, key: K, value: V) {
        self.insert(key, value);
    }

    fn peek(&self) -> Option<(&K, &V)> {
        FibonacciHeap::peek(self)
    }

    fn pop(&mut self) -> Option<(K, V)> {
        self.extract_min().ok()
    }

    fn merge(&mut self, other: Self) -> Result<(), HeapError> {
        FibonacciHeap::merge(self, other).map(|_| ())
    }
}

impl<K: Ord, V> DecreaseKeyHeap<K, V> for FibonacciHeap<K, V> {
    type Handle = NodeHandle;

    fn push_with_handle(&mut self, key: K, value: V) -> NodeHandle {
        self.insert(key, value)
    }

    fn decrease_key(&mut self, handle: NodeHandle, new_key: K) -> Result<(), HeapError> {
        FibonacciHeap::decrease_key(self, handle, new_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a heap whose forest has nested trees, by extracting once from
    /// a batch of inserts.
    fn consolidated(keys: &[i32]) -> (FibonacciHeap<i32, i32>, Vec<NodeHandle>) {
        let mut heap = FibonacciHeap::new();
        let handles = keys.iter().map(|&k| heap.insert(k, k)).collect();
        heap.insert(i32::MIN, 0);
        assert_eq!(heap.extract_min().unwrap().0, i32::MIN);
        heap.validate().unwrap();
        (heap, handles)
    }

    #[test]
    fn test_basic_operations() {
        let mut heap = FibonacciHeap::new();
        assert!(heap.is_empty());
        assert_eq!(heap.len(), 0);

        heap.insert(5, "a");
        heap.insert(3, "b");
        heap.insert(7, "c");

        assert_eq!(heap.len(), 3);
        assert_eq!(heap.minimum(), Ok((&3, &"b")));

        assert_eq!(heap.extract_min(), Ok((3, "b")));
        assert_eq!(heap.minimum(), Ok((&5, &"a")));
        heap.validate().unwrap();
    }

    #[test]
    fn test_insert_splices_after_minimum() {
        let (mut heap, _) = consolidated(&[4, 8, 15, 16, 23]);
        let min = heap.min.unwrap();

        let h = heap.insert(42, 42);
        assert_eq!(RING.next(&heap.nodes, min).unwrap(), h.key);
        assert_eq!(heap.nodes[h.key].parent, None);
        assert_eq!(heap.min_handle().map(|m| m.key), Some(min));

        let lower = heap.insert(1, 1);
        assert_eq!(heap.min_handle(), Some(lower));
        assert_eq!(heap.len(), 7);
        heap.validate().unwrap();
    }

    #[test]
    fn test_empty_heap_errors() {
        let mut heap: FibonacciHeap<i32, ()> = FibonacciHeap::new();
        assert_eq!(heap.minimum(), Err(HeapError::EmptyHeap));
        assert_eq!(heap.extract_min(), Err(HeapError::EmptyHeap));
        assert_eq!(heap.peek(), None);
    }

    #[test]
    fn test_extract_sole_root() {
        let mut heap = FibonacciHeap::new();
        let h = heap.insert(1, ());

        assert_eq!(heap.extract_min(), Ok((1, ())));
        assert!(heap.is_empty());
        assert!(!heap.contains(h));
        heap.validate().unwrap();
    }

    #[test]
    fn test_consolidation_bounds_root_count() {
        let (heap, _) = consolidated(&(0..64).collect::<Vec<_>>());

        // 64 nodes consolidate into a single binomial-shaped tree of degree 6
        let min = heap.min.unwrap();
        assert_eq!(RING.count(&heap.nodes, min).unwrap(), 1);
        assert_eq!(heap.nodes[min].degree, 6);
        assert!(heap.max_degree + 1 >= 7);
    }

    #[test]
    fn test_equal_keys_keep_bucket_occupant_as_parent() {
        let mut heap = FibonacciHeap::new();
        heap.insert(0, "min");
        let a = heap.insert(5, "a");
        let b = heap.insert(5, "b");

        // Inserts land right after the minimum, so the root ring is min -> b -> a.
        // `b` is walked first and holds the bucket when `a` arrives.
        heap.extract_min().unwrap();

        assert_eq!(heap.nodes[a.key].parent, Some(b.key));
        assert_eq!(heap.min_handle(), Some(b));
        heap.validate().unwrap();
    }

    #[test]
    fn test_decrease_key() {
        let mut heap = FibonacciHeap::new();
        heap.insert(10, "a");
        let h2 = heap.insert(20, "b");
        let h3 = heap.insert(30, "c");

        assert_eq!(heap.minimum(), Ok((&10, &"a")));

        heap.decrease_key(h2, 5).unwrap();
        assert_eq!(heap.minimum(), Ok((&5, &"b")));

        heap.decrease_key(h3, 1).unwrap();
        assert_eq!(heap.minimum(), Ok((&1, &"c")));
        heap.validate().unwrap();
    }

    #[test]
    fn test_decrease_key_rejects_larger_key() {
        let mut heap = FibonacciHeap::new();
        let h = heap.insert(10, ());

        assert_eq!(heap.decrease_key(h, 11), Err(HeapError::InvalidKey));
        assert_eq!(heap.get(h), Some((&10, &())));
        assert_eq!(heap.decrease_key(h, 10), Ok(()));
    }

    #[test]
    fn test_decrease_key_rejects_larger_key_on_child() {
        // 0..8 consolidates into 0 -> {1, 2 -> {3}, 4 -> {5, 6 -> {7}}}
        let (mut heap, handles) = consolidated(&(0..8).collect::<Vec<_>>());
        let child = handles[7];
        let parent = heap.nodes[child.key].parent.unwrap();
        heap.nodes[child.key].mark = true;

        assert_eq!(heap.decrease_key(child, 100), Err(HeapError::InvalidKey));

        let n = &heap.nodes[child.key];
        assert_eq!(n.key, 7);
        assert_eq!(n.parent, Some(parent));
        assert!(n.mark);
        assert!(!heap.nodes[parent].mark);
        heap.validate().unwrap();
    }

    #[test]
    fn test_decrease_key_on_non_minimum_root() {
        let mut heap = FibonacciHeap::new();
        heap.insert(1, ());
        let h = heap.insert(10, ());

        // A root whose new key is still above the minimum must not be cut
        heap.decrease_key(h, 5).unwrap();
        assert_eq!(heap.minimum(), Ok((&1, &())));
        assert_eq!(heap.key_of(h), Some(&5));
        assert_eq!(heap.nodes[h.key].parent, None);
        heap.validate().unwrap();
    }

    #[test]
    fn test_decrease_key_child_within_heap_order() {
        let (mut heap, handles) = consolidated(&[1, 2, 3, 4]);

        let child = handles
            .iter()
            .copied()
            .find(|&h| heap.nodes[h.key].parent.is_some() && heap.nodes[h.key].key == 4)
            .unwrap();
        let parent = heap.nodes[child.key].parent.unwrap();
        let parent_key = heap.nodes[parent].key;

        heap.decrease_key(child, parent_key).unwrap();
        assert_eq!(heap.nodes[child.key].parent, Some(parent));
        heap.validate().unwrap();
    }

    #[test]
    fn test_cut_marks_parent_then_cascades() {
        // 0..8 consolidates into 0 -> {1, 2 -> {3}, 4 -> {5, 6 -> {7}}}
        let (mut heap, handles) = consolidated(&(0..8).collect::<Vec<_>>());

        let grandchild = handles
            .iter()
            .copied()
            .find(|&h| {
                heap.nodes[h.key]
                    .parent
                    .and_then(|p| heap.nodes[p].parent)
                    .is_some_and(|gp| heap.nodes[gp].parent.is_none())
                    && heap.nodes[heap.nodes[h.key].parent.unwrap()].degree >= 2
            })
            .unwrap();
        let parent = heap.nodes[grandchild.key].parent.unwrap();

        heap.decrease_key(grandchild, -1).unwrap();
        assert!(heap.nodes[parent].mark);
        assert_eq!(heap.nodes[grandchild.key].parent, None);
        assert_eq!(heap.minimum().unwrap().0, &-1);
        heap.validate().unwrap();

        // Cutting a second child from the marked parent cascades it to the root ring
        let sibling = RING.next(&heap.nodes, heap.nodes[parent].child.unwrap()).unwrap();
        heap.decrease_key(heap.handle(sibling), -2).unwrap();
        assert_eq!(heap.nodes[parent].parent, None);
        assert!(!heap.nodes[parent].mark);
        heap.validate().unwrap();

        let keys: Vec<_> = heap.drain_sorted().map(|(k, _)| k).collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn test_extracted_handle_is_invalid() {
        let mut heap = FibonacciHeap::new();
        let h = heap.insert(1, "a");
        heap.insert(2, "b");

        heap.extract_min().unwrap();
        assert_eq!(heap.decrease_key(h, 0), Err(HeapError::InvalidHandle));
        assert_eq!(heap.get(h), None);
    }

    #[test]
    fn test_handle_from_another_heap_is_invalid() {
        let mut a = FibonacciHeap::new();
        let mut b = FibonacciHeap::new();
        let ha = a.insert(10, "a-elem");
        let hb = b.insert(20, "b-elem");

        // Both arenas hand out the same first slot
        assert_eq!(ha.key, hb.key);
        assert_eq!(a.decrease_key(hb, 5), Err(HeapError::InvalidHandle));
        assert_eq!(a.get(hb), None);
        assert_eq!(a.key_of(hb), None);
        assert!(!a.contains(hb));
        assert_eq!(a.minimum(), Ok((&10, &"a-elem")));
        assert_eq!(b.get(hb), Some((&20, &"b-elem")));
    }

    #[test]
    fn test_merged_away_handles_are_invalid() {
        let mut a = FibonacciHeap::new();
        a.insert(10, "a-elem");
        let mut b = FibonacciHeap::new();
        let hb = b.insert(20, "b-elem");

        let moved = a.merge(b).unwrap();
        assert_eq!(a.decrease_key(hb, 5), Err(HeapError::InvalidHandle));
        assert_eq!(a.minimum(), Ok((&10, &"a-elem")));

        let renamed = moved[&hb];
        assert_eq!(renamed.heap, a.id);
        assert_eq!(a.get(renamed), Some((&20, &"b-elem")));
        a.decrease_key(renamed, 5).unwrap();
        assert_eq!(a.minimum(), Ok((&5, &"b-elem")));
        a.validate().unwrap();
    }

    #[test]
    fn test_merge() {
        let mut heap1 = FibonacciHeap::new();
        heap1.insert(5, "a");
        heap1.insert(10, "b");

        let mut heap2 = FibonacciHeap::new();
        heap2.insert(3, "c");
        let d = heap2.insert(7, "d");

        let moved = heap1.merge(heap2).unwrap();
        assert_eq!(heap1.minimum(), Ok((&3, &"c")));
        assert_eq!(heap1.len(), 4);
        assert_eq!(moved.len(), 2);
        heap1.validate().unwrap();

        heap1.decrease_key(moved[&d], 1).unwrap();
        assert_eq!(heap1.minimum(), Ok((&1, &"d")));
    }

    #[test]
    fn test_merge_consolidated_trees() {
        let (mut heap1, _) = consolidated(&[10, 20, 30, 40]);
        let (heap2, _) = consolidated(&[15, 25, 35]);

        heap1.merge(heap2).unwrap();
        heap1.validate().unwrap();

        let keys: Vec<_> = heap1.drain_sorted().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![10, 15, 20, 25, 30, 35, 40]);
    }

    #[test]
    fn test_merge_into_empty() {
        let mut heap1 = FibonacciHeap::new();
        let heap2: FibonacciHeap<_, _> = [(2, 'x'), (1, 'y')].into_iter().collect();

        heap1.merge(heap2).unwrap();
        assert_eq!(heap1.minimum(), Ok((&1, &'y')));
        assert_eq!(heap1.len(), 2);
        heap1.validate().unwrap();
    }

    #[test]
    fn test_degree_bound_grows_logarithmically() {
        assert_eq!(degree_bound(0), DEGREE_MARGIN);
        assert_eq!(degree_bound(1), DEGREE_MARGIN);
        assert_eq!(degree_bound(2), 1 + DEGREE_MARGIN);
        // log_phi(1000) ~= 14.35
        assert_eq!(degree_bound(1000), 14 + DEGREE_MARGIN);
    }

    #[test]
    fn test_clear() {
        let mut heap: FibonacciHeap<_, _> = (0..10).map(|k| (k, k)).collect();
        heap.clear();
        assert!(heap.is_empty());
        assert_eq!(heap.len(), 0);
        heap.validate().unwrap();
    }
}
