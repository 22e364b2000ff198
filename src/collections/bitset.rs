// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::{reserve_doubling, AllocationError};

const WORD_BITS: u64 = u64::BITS as u64;

/// Dense membership set over `u64` ids, one bit per possible id.
///
/// The set grows on [Bitset::mark]; any id beyond the current capacity
/// simply reads as unset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Bitset {
    words: Vec<u64>,
    count: usize,
}

impl Bitset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id`, growing the set if needed.
    pub fn mark(&mut self, id: u64) -> Result<(), AllocationError> {
        let (word, mask) = Self::locate(id)?;
        if word >= self.words.len() {
            self.grow_to(word + 1)?;
        }

        if self.words[word] & mask == 0 {
            self.words[word] |= mask;
            self.count += 1;
        }
        Ok(())
    }

    /// Clears `id`. Ids beyond the capacity are already clear.
    pub fn unmark(&mut self, id: u64) {
        if let Ok((word, mask)) = Self::locate(id) {
            if let Some(w) = self.words.get_mut(word) {
                if *w & mask != 0 {
                    *w &= !mask;
                    self.count -= 1;
                }
            }
        }
    }

    pub fn is_marked(&self, id: u64) -> bool {
        match Self::locate(id) {
            Ok((word, mask)) => self.words.get(word).is_some_and(|&w| w & mask != 0),
            Err(_) => false,
        }
    }

    /// Returns the number of marked ids.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of ids which can be stored without growing.
    pub fn capacity(&self) -> u64 {
        self.words.len() as u64 * WORD_BITS
    }

    /// Iterates over all marked ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.words.iter().enumerate().flat_map(|(idx, &word)| {
            let base = idx as u64 * WORD_BITS;
            (0..WORD_BITS).filter_map(move |bit| {
                if word & (1 << bit) != 0 {
                    Some(base + bit)
                } else {
                    None
                }
            })
        })
    }

    fn locate(id: u64) -> Result<(usize, u64), AllocationError> {
        let word = usize::try_from(id / WORD_BITS).map_err(|_| AllocationError {
            container: "bitset",
            requested: usize::MAX,
        })?;
        Ok((word, 1 << (id % WORD_BITS)))
    }

    fn grow_to(&mut self, words: usize) -> Result<(), AllocationError> {
        let additional = words - self.words.len();
        reserve_doubling(&mut self.words, additional, "bitset")?;
        self.words.resize(words, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmarked_beyond_capacity() {
        let b = Bitset::new();
        assert!(!b.is_marked(0));
        assert!(!b.is_marked(1 << 40));
        assert_eq!(b.capacity(), 0);
    }

    #[test]
    fn growth_leaves_lower_bits_clear() {
        let mut b = Bitset::new();
        b.mark(1000).unwrap();
        assert!(b.is_marked(1000));
        assert!((0..1000).all(|i| !b.is_marked(i)));
        assert!(!b.is_marked(1001));
        assert!(b.capacity() > 1000);
    }

    #[test]
    fn mark_and_unmark() {
        let mut b = Bitset::new();
        b.mark(5).unwrap();
        b.mark(64).unwrap();
        b.mark(5).unwrap();
        assert_eq!(b.count(), 2);

        b.unmark(5);
        assert!(!b.is_marked(5));
        assert_eq!(b.count(), 1);

        b.unmark(5);
        b.unmark(100_000);
        assert_eq!(b.count(), 1);
    }

    #[test]
    fn iter_in_order() {
        let mut b = Bitset::new();
        for id in [300, 3, 64, 63, 0] {
            b.mark(id).unwrap();
        }
        assert_eq!(b.iter().collect::<Vec<_>>(), vec![0, 3, 63, 64, 300]);
    }

    #[test]
    fn count_matches_distinct_marks() {
        let mut b = Bitset::new();
        let ids = [1u64, 7, 7, 129, 4096, 1, 65];
        for &id in &ids {
            b.mark(id).unwrap();
        }
        assert_eq!(b.count(), 5);
        b.unmark(129);
        b.unmark(65);
        assert_eq!(b.count(), 3);
        assert_eq!(b.iter().count(), 3);
    }
}
