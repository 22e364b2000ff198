// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;

use super::{reserve_doubling, AllocationError};

/// Storage backing the entries of an [IndexedHeap].
///
/// Every entry `H` must remember its own position (slot) in the heap,
/// so that [IndexedHeap::modify] and [IndexedHeap::delete] can find it
/// without a linear scan. Entries not in the heap have no slot.
pub trait HeapStore<H> {
    fn slot(&self, h: H) -> Option<usize>;
    fn set_slot(&mut self, h: H, slot: Option<usize>);

    /// Orders two entries; the heap pops the [Ordering::Less] one first.
    fn compare(&self, a: H, b: H) -> Ordering;
}

/// Binary min-heap over small copyable handles, with in-place priority updates.
///
/// The heap itself only stores the handles; priorities and slot positions
/// live in a [HeapStore] passed to every mutating call.
#[derive(Debug, Clone)]
pub struct IndexedHeap<H> {
    entries: Vec<H>,
}

impl<H> Default for IndexedHeap<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H: Copy + PartialEq> IndexedHeap<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries, clearing their slots in `store`.
    pub fn clear<S: HeapStore<H>>(&mut self, store: &mut S) {
        for h in self.entries.drain(..) {
            store.set_slot(h, None);
        }
    }

    /// Returns the minimum entry without removing it.
    pub fn peek(&self) -> Option<H> {
        self.entries.first().copied()
    }

    /// Inserts an entry which must not already be in the heap.
    pub fn add<S: HeapStore<H>>(&mut self, store: &mut S, h: H) -> Result<(), AllocationError> {
        debug_assert!(store.slot(h).is_none(), "entry is already in the heap");
        reserve_doubling(&mut self.entries, 1, "heap")?;

        let idx = self.entries.len();
        self.entries.push(h);
        store.set_slot(h, Some(idx));
        self.sift_up(store, idx);
        Ok(())
    }

    /// Removes and returns the minimum entry.
    pub fn pop<S: HeapStore<H>>(&mut self, store: &mut S) -> Option<H> {
        let last = self.entries.pop()?;
        let top = if self.entries.is_empty() {
            last
        } else {
            let top = std::mem::replace(&mut self.entries[0], last);
            store.set_slot(last, Some(0));
            self.sift_down(store, 0);
            top
        };

        store.set_slot(top, None);
        Some(top)
    }

    /// Restores the heap order after the priority of `h` has changed.
    /// `improved` tells whether it now compares lower than before.
    ///
    /// Returns `false` if `h` is not in the heap.
    pub fn modify<S: HeapStore<H>>(&mut self, store: &mut S, h: H, improved: bool) -> bool {
        match store.slot(h) {
            Some(idx) => {
                debug_assert!(self.entries[idx] == h);
                if improved {
                    self.sift_up(store, idx);
                } else {
                    self.sift_down(store, idx);
                }
                true
            }
            None => false,
        }
    }

    /// Removes `h` from the heap. Returns `false` if it wasn't there.
    pub fn delete<S: HeapStore<H>>(&mut self, store: &mut S, h: H) -> bool {
        let idx = match store.slot(h) {
            Some(idx) => idx,
            None => return false,
        };

        let Some(last) = self.entries.pop() else {
            return false;
        };

        if idx < self.entries.len() {
            self.entries[idx] = last;
            store.set_slot(last, Some(idx));
            let idx = self.sift_up(store, idx);
            self.sift_down(store, idx);
        }

        store.set_slot(h, None);
        true
    }

    /// Walks the heap from the root, looking for an entry for which `f`
    /// returns [Ordering::Equal].
    ///
    /// `f` compares an entry against the search key. Subtrees rooted at an entry
    /// comparing [Ordering::Greater] are pruned, as no descendant can compare lower.
    /// Entries comparing [Ordering::Less] are expanded further.
    pub fn search<F: FnMut(H) -> Ordering>(&self, mut f: F) -> Option<H> {
        let mut pending = Vec::new();
        if !self.entries.is_empty() {
            pending.push(0);
        }

        while let Some(idx) = pending.pop() {
            let h = self.entries[idx];
            match f(h) {
                Ordering::Equal => return Some(h),
                Ordering::Greater => {}
                Ordering::Less => {
                    for child in [2 * idx + 1, 2 * idx + 2] {
                        if child < self.entries.len() {
                            pending.push(child);
                        }
                    }
                }
            }
        }

        None
    }

    /// Checks the heap property and slot bookkeeping of every entry.
    pub fn verify<S: HeapStore<H>>(&self, store: &S) -> bool {
        self.entries.iter().enumerate().all(|(idx, &h)| {
            let slot_ok = store.slot(h) == Some(idx);
            let order_ok = idx == 0 || {
                let parent = self.entries[(idx - 1) / 2];
                store.compare(parent, h) != Ordering::Greater
            };
            slot_ok && order_ok
        })
    }

    fn sift_up<S: HeapStore<H>>(&mut self, store: &mut S, mut idx: usize) -> usize {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if store.compare(self.entries[idx], self.entries[parent]) == Ordering::Less {
                self.swap(store, idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
        idx
    }

    fn sift_down<S: HeapStore<H>>(&mut self, store: &mut S, mut idx: usize) {
        loop {
            let mut smallest = idx;
            for child in [2 * idx + 1, 2 * idx + 2] {
                if child < self.entries.len()
                    && store.compare(self.entries[child], self.entries[smallest]) == Ordering::Less
                {
                    smallest = child;
                }
            }

            if smallest == idx {
                return;
            }
            self.swap(store, idx, smallest);
            idx = smallest;
        }
    }

    fn swap<S: HeapStore<H>>(&mut self, store: &mut S, a: usize, b: usize) {
        self.entries.swap(a, b);
        store.set_slot(self.entries[a], Some(a));
        store.set_slot(self.entries[b], Some(b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Priorities {
        priority: Vec<u32>,
        slots: Vec<Option<usize>>,
    }

    impl Priorities {
        fn with_len(n: usize) -> Self {
            Self {
                priority: vec![0; n],
                slots: vec![None; n],
            }
        }
    }

    impl HeapStore<usize> for Priorities {
        fn slot(&self, h: usize) -> Option<usize> {
            self.slots[h]
        }

        fn set_slot(&mut self, h: usize, slot: Option<usize>) {
            self.slots[h] = slot;
        }

        fn compare(&self, a: usize, b: usize) -> Ordering {
            self.priority[a].cmp(&self.priority[b])
        }
    }

    #[test]
    fn pops_in_order() {
        let mut store = Priorities::with_len(6);
        store.priority = vec![50, 10, 40, 20, 60, 30];
        let mut heap = IndexedHeap::new();
        for h in 0..6 {
            heap.add(&mut store, h).unwrap();
            assert!(heap.verify(&store));
        }

        assert_eq!(heap.peek(), Some(1));
        let mut order = vec![];
        while let Some(h) = heap.pop(&mut store) {
            assert!(heap.verify(&store));
            assert_eq!(store.slot(h), None);
            order.push(h);
        }
        assert_eq!(order, vec![1, 3, 5, 2, 0, 4]);
    }

    #[test]
    fn modify_in_place() {
        let mut store = Priorities::with_len(4);
        store.priority = vec![10, 20, 30, 40];
        let mut heap = IndexedHeap::new();
        for h in 0..4 {
            heap.add(&mut store, h).unwrap();
        }

        store.priority[3] = 5;
        assert!(heap.modify(&mut store, 3, true));
        assert!(heap.verify(&store));
        assert_eq!(heap.peek(), Some(3));

        store.priority[3] = 35;
        assert!(heap.modify(&mut store, 3, false));
        assert!(heap.verify(&store));
        assert_eq!(heap.peek(), Some(0));

        heap.pop(&mut store);
        assert!(!heap.modify(&mut store, 0, true));
    }

    #[test]
    fn delete_by_identity() {
        let mut store = Priorities::with_len(5);
        store.priority = vec![1, 2, 3, 4, 5];
        let mut heap = IndexedHeap::new();
        for h in 0..5 {
            heap.add(&mut store, h).unwrap();
        }

        assert!(heap.delete(&mut store, 1));
        assert!(!heap.delete(&mut store, 1));
        assert!(heap.verify(&store));
        assert_eq!(heap.len(), 4);

        let mut order = vec![];
        while let Some(h) = heap.pop(&mut store) {
            order.push(h);
        }
        assert_eq!(order, vec![0, 2, 3, 4]);
    }

    #[test]
    fn search_prunes_greater_subtrees() {
        let mut store = Priorities::with_len(7);
        store.priority = vec![1, 5, 2, 6, 7, 3, 4];
        let mut heap = IndexedHeap::new();
        for h in 0..7 {
            heap.add(&mut store, h).unwrap();
        }

        let mut visited = 0;
        let found = heap.search(|h| {
            visited += 1;
            store.priority[h].cmp(&3)
        });
        assert_eq!(found, Some(5));
        assert!(visited < 7);

        assert_eq!(heap.search(|h| store.priority[h].cmp(&0)), None);
    }

    #[test]
    fn clear_resets_slots() {
        let mut store = Priorities::with_len(3);
        let mut heap = IndexedHeap::new();
        for h in 0..3 {
            heap.add(&mut store, h).unwrap();
        }
        heap.clear(&mut store);
        assert!(heap.is_empty());
        assert!(store.slots.iter().all(|s| s.is_none()));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u32),
        Pop,
        Modify(usize, u32),
        Delete(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0u32..1000).prop_map(Op::Add),
            2 => Just(Op::Pop),
            2 => (0usize..64, 0u32..1000).prop_map(|(h, p)| Op::Modify(h, p)),
            1 => (0usize..64).prop_map(Op::Delete),
        ]
    }

    proptest! {
        /// Pop always returns the minimum and the heap stays valid after every mutation
        #[test]
        fn random_operations_keep_heap_valid(ops in prop::collection::vec(op(), 1..200)) {
            let mut store = Priorities::default();
            let mut heap = IndexedHeap::new();

            for op in ops {
                match op {
                    Op::Add(p) => {
                        store.priority.push(p);
                        store.slots.push(None);
                        let idx = store.priority.len() - 1;
                        heap.add(&mut store, idx).unwrap();
                    }
                    Op::Pop => {
                        let min = store
                            .slots
                            .iter()
                            .enumerate()
                            .filter(|(_, s)| s.is_some())
                            .map(|(h, _)| store.priority[h])
                            .min();
                        let popped = heap.pop(&mut store).map(|h| store.priority[h]);
                        prop_assert_eq!(popped, min);
                    }
                    Op::Modify(h, p) => {
                        if h < store.priority.len() {
                            let improved = p < store.priority[h];
                            store.priority[h] = p;
                            let in_heap = store.slots[h].is_some();
                            prop_assert_eq!(heap.modify(&mut store, h, improved), in_heap);
                        }
                    }
                    Op::Delete(h) => {
                        if h < store.priority.len() {
                            heap.delete(&mut store, h);
                            prop_assert!(store.slots[h].is_none());
                        }
                    }
                }
                prop_assert!(heap.verify(&store));
            }
        }
    }
}
