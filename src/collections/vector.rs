// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::ops::Deref;

use super::{reserve_doubling, AllocationError};

/// A growable array with fallible, amortized-doubling growth.
///
/// Unlike [Vec::push], running out of memory is reported as an [AllocationError]
/// instead of aborting the process. Once sorted by a key, elements can be
/// looked up with [GrowVec::search_by_key].
#[derive(Debug, Clone, PartialEq)]
pub struct GrowVec<T> {
    items: Vec<T>,
    name: &'static str,
}

impl<T> GrowVec<T> {
    /// Creates an empty vector. `name` identifies it in [AllocationError]s.
    pub fn new(name: &'static str) -> Self {
        Self {
            items: Vec::new(),
            name,
        }
    }

    pub fn with_capacity(name: &'static str, capacity: usize) -> Result<Self, AllocationError> {
        let mut v = Self::new(name);
        v.reserve(capacity)?;
        Ok(v)
    }

    /// Ensures `additional` more elements fit without another allocation.
    pub fn reserve(&mut self, additional: usize) -> Result<(), AllocationError> {
        reserve_doubling(&mut self.items, additional, self.name)
    }

    pub fn push(&mut self, item: T) -> Result<(), AllocationError> {
        self.reserve(1)?;
        self.items.push(item);
        Ok(())
    }

    /// Appends all elements of `items`, growing at most once.
    pub fn extend_from_slice(&mut self, items: &[T]) -> Result<(), AllocationError>
    where
        T: Clone,
    {
        self.reserve(items.len())?;
        self.items.extend_from_slice(items);
        Ok(())
    }

    pub fn sort_by_key<K: Ord, F: FnMut(&T) -> K>(&mut self, f: F) {
        self.items.sort_unstable_by_key(f);
    }

    /// Binary-searches a vector sorted by `f` for an element with the given key.
    pub fn search_by_key<K: Ord, F: FnMut(&T) -> K>(&self, key: &K, f: F) -> Option<&T> {
        self.items
            .binary_search_by_key(key, f)
            .ok()
            .map(|idx| &self.items[idx])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Deref for GrowVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a GrowVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
