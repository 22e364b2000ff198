// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;

use super::Solution;
use crate::collections::{AllocationError, HeapStore, IndexedHeap};
use crate::mesh::{Mesh, NodeHandle};
use crate::Diagnostics;

/// Per-node search state of a single solve.
#[derive(Debug, Clone, Copy)]
struct Label {
    cost: f64,
    distance_m: f64,
    duration_s: f64,
    came_from: Option<NodeHandle>,
    slot: Option<usize>,
    settled: bool,
}

impl Default for Label {
    fn default() -> Self {
        Self {
            cost: f64::INFINITY,
            distance_m: 0.0,
            duration_s: 0.0,
            came_from: None,
            slot: None,
            settled: false,
        }
    }
}

/// Side table of [Labels](Label), indexed by [NodeHandle].
#[derive(Debug, Default)]
struct Labels(Vec<Label>);

impl Labels {
    fn reset(&mut self, len: usize) {
        self.0.clear();
        self.0.resize(len, Label::default());
    }
}

impl HeapStore<NodeHandle> for Labels {
    fn slot(&self, h: NodeHandle) -> Option<usize> {
        self.0[h.0].slot
    }

    fn set_slot(&mut self, h: NodeHandle, slot: Option<usize>) {
        self.0[h.0].slot = slot;
    }

    fn compare(&self, a: NodeHandle, b: NodeHandle) -> Ordering {
        self.0[a.0].cost.total_cmp(&self.0[b.0].cost)
    }
}

/// Single-source, multi-target shortest path search over a [Mesh].
///
/// The mesh is only borrowed; all search state lives in the router,
/// so multiple routers may work on the same mesh.
#[derive(Debug)]
pub struct Router<'m> {
    mesh: &'m Mesh,
    labels: Labels,
    heap: IndexedHeap<NodeHandle>,
}

impl<'m> Router<'m> {
    pub fn new(mesh: &'m Mesh) -> Self {
        Self {
            mesh,
            labels: Labels::default(),
            heap: IndexedHeap::new(),
        }
    }

    /// Uses [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
    /// to find the cheapest paths from waypoint `source` to every other snapped waypoint.
    ///
    /// `snapped` holds the mesh node of every waypoint. Solutions are ordered
    /// by the target waypoint index. Targets without a path are recorded in `diagnostics`.
    pub fn solve(
        &mut self,
        source: usize,
        snapped: &[Option<NodeHandle>],
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Solution>, AllocationError> {
        let Some(start) = snapped.get(source).copied().flatten() else {
            return Ok(vec![]);
        };

        let mut pending: Vec<usize> = (0..snapped.len())
            .filter(|&i| i != source && snapped[i].is_some())
            .collect();
        let mut solutions = Vec::with_capacity(pending.len());

        self.heap.clear(&mut self.labels);
        self.labels.reset(self.mesh.len());
        self.labels.0[start.0].cost = 0.0;
        self.heap.add(&mut self.labels, start)?;

        while let Some(at) = self.heap.pop(&mut self.labels) {
            self.labels.0[at.0].settled = true;

            let mut i = 0;
            while i < pending.len() {
                let target = pending[i];
                if snapped[target] == Some(at) {
                    solutions.push(self.solution(source, target, at));
                    pending.swap_remove(i);
                } else {
                    i += 1;
                }
            }

            if pending.is_empty() {
                break;
            }

            self.relax(at)?;
        }

        for &target in &pending {
            diagnostics.unreachable(source, target);
        }

        solutions.sort_by_key(|s| s.to);
        Ok(solutions)
    }

    fn relax(&mut self, at: NodeHandle) -> Result<(), AllocationError> {
        let mesh = self.mesh;
        let current = self.labels.0[at.0];

        for edge in mesh.edges(at) {
            let next = &mut self.labels.0[edge.to.0];
            let cost = current.cost + edge.cost;
            if next.settled || cost >= next.cost {
                continue;
            }

            next.cost = cost;
            next.distance_m = current.distance_m + edge.distance_m;
            next.duration_s = current.duration_s + edge.duration_s;
            next.came_from = Some(at);

            if next.slot.is_some() {
                self.heap.modify(&mut self.labels, edge.to, true);
            } else {
                self.heap.add(&mut self.labels, edge.to)?;
            }
        }

        Ok(())
    }

    fn solution(&self, from: usize, to: usize, last: NodeHandle) -> Solution {
        let label = self.labels.0[last.0];
        Solution {
            from,
            to,
            path: self.path_to(last),
            distance_m: label.distance_m,
            duration_s: label.duration_s,
            cost: label.cost,
        }
    }

    /// Follows predecessors back to the source, returning the path source-first.
    fn path_to(&self, last: NodeHandle) -> Vec<NodeHandle> {
        let mut hops = 0;
        let mut at = last;
        while let Some(prev) = self.labels.0[at.0].came_from {
            hops += 1;
            at = prev;
        }

        let mut path = vec![last; hops + 1];
        let mut at = last;
        for slot in path.iter_mut().rev() {
            *slot = at;
            at = self.labels.0[at.0].came_from.unwrap_or(at);
        }
        path
    }
}
