// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Growable containers used by the extraction pipeline and the route solver.

mod bitset;
mod heap;
mod vector;

pub use bitset::Bitset;
pub use heap::{HeapStore, IndexedHeap};
pub use vector::GrowVec;

/// Returned when a container can't obtain memory for its next growth step,
/// even after falling back to the smallest sufficient reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("failed to grow {container} to hold {requested} elements")]
pub struct AllocationError {
    pub container: &'static str,
    pub requested: usize,
}

/// Grows `v` so that `additional` more elements fit, doubling the capacity
/// when possible and reserving only what is needed when doubling fails.
pub(crate) fn reserve_doubling<T>(
    v: &mut Vec<T>,
    additional: usize,
    container: &'static str,
) -> Result<(), AllocationError> {
    let required = v.len().saturating_add(additional);
    if required <= v.capacity() {
        return Ok(());
    }

    let doubled = v.capacity().saturating_mul(2).max(required).max(8);
    if v.try_reserve_exact(doubled - v.len()).is_ok() {
        return Ok(());
    }

    v.try_reserve_exact(additional).map_err(|_| AllocationError {
        container,
        requested: required,
    })
}
