//! A binary min-heap of regions keyed by their bound.
//!
//! Only the identifiers of the regions are stored; the region data itself stays in the
//! [`RegionPool`](super::RegionPool).

use std::cmp::Ordering;

use super::RegionId;
use crate::sit_assert_moderate;

#[derive(Debug, Clone, Copy)]
struct Entry {
    region: RegionId,
    beta: f64,
}

/// The open regions of the search, ordered by ascending bound.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    entries: Vec<Entry>,
    peak_len: usize,
}

impl Frontier {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The largest number of regions the frontier has held at once.
    pub fn peak_len(&self) -> usize {
        self.peak_len
    }

    /// Adds a region with bound `beta`.
    ///
    /// The time-complexity of this operation is O(logn)
    pub fn push(&mut self, region: RegionId, beta: f64) {
        self.entries.push(Entry { region, beta });
        self.peak_len = self.peak_len.max(self.entries.len());
        self.sift_up(self.entries.len() - 1);
    }

    /// Returns the region with the smallest bound without removing it.
    pub fn peek_min(&self) -> Option<(RegionId, f64)> {
        self.entries.first().map(|entry| (entry.region, entry.beta))
    }

    /// Removes and returns the region with the smallest bound.
    ///
    /// The time-complexity of this operation is O(logn)
    pub fn pop_min(&mut self) -> Option<RegionId> {
        if self.entries.is_empty() {
            return None;
        }

        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let best = self.entries.pop().map(|entry| entry.region);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        sit_assert_moderate!(self.is_heap());
        best
    }

    /// The regions in the frontier, in no particular order.
    pub fn regions(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.entries.iter().map(|entry| entry.region)
    }

    /// Empties the frontier, returning the regions it contained in no particular order.
    pub fn drain(&mut self) -> impl Iterator<Item = RegionId> + '_ {
        self.entries.drain(..).map(|entry| entry.region)
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        self.entries[a].beta.total_cmp(&self.entries[b].beta)
    }

    fn sift_up(&mut self, position: usize) {
        if position > 0 {
            let parent = (position - 1) / 2;
            if self.compare(position, parent) == Ordering::Less {
                self.entries.swap(position, parent);
                self.sift_up(parent);
            }
        }
    }

    fn sift_down(&mut self, position: usize) {
        let left = 2 * position + 1;
        let right = 2 * position + 2;

        let mut smallest = position;
        if left < self.entries.len() && self.compare(left, smallest) == Ordering::Less {
            smallest = left;
        }
        if right < self.entries.len() && self.compare(right, smallest) == Ordering::Less {
            smallest = right;
        }

        if smallest != position {
            self.entries.swap(position, smallest);
            self.sift_down(smallest);
        }
    }

    fn is_heap(&self) -> bool {
        (1..self.entries.len()).all(|position| {
            self.compare((position - 1) / 2, position) != Ordering::Greater
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Frontier;
    use crate::containers::RegionId;
    use crate::containers::StorageKey;

    fn id(index: usize) -> RegionId {
        RegionId::create_from_index(index)
    }

    // Pushes the bounds in order and checks they come out sorted.
    fn heap_sort_test_helper(bounds: Vec<f64>) {
        let mut frontier = Frontier::default();
        for (index, beta) in bounds.iter().enumerate() {
            frontier.push(id(index), *beta);
        }

        let mut popped = vec![];
        while let Some(region) = frontier.pop_min() {
            popped.push(bounds[region.index()]);
        }

        let mut sorted = bounds.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(popped, sorted);
    }

    #[test]
    fn empty_frontier_pops_nothing() {
        let mut frontier = Frontier::default();
        assert!(frontier.is_empty());
        assert_eq!(frontier.pop_min(), None);
        assert_eq!(frontier.peek_min(), None);
    }

    #[test]
    fn smallest_bound_is_on_top() {
        let mut frontier = Frontier::default();
        frontier.push(id(0), -1.0);
        frontier.push(id(1), -5.0);
        frontier.push(id(2), -3.0);

        assert_eq!(frontier.peek_min(), Some((id(1), -5.0)));
        assert_eq!(frontier.pop_min(), Some(id(1)));
        assert_eq!(frontier.pop_min(), Some(id(2)));
        assert_eq!(frontier.pop_min(), Some(id(0)));
    }

    #[test]
    fn sorts_mixed_bounds() {
        heap_sort_test_helper(vec![3.0, -10.0, 5.0, -2.5, 0.0, f64::NEG_INFINITY, 1.0]);
    }

    #[test]
    fn sorts_duplicates() {
        heap_sort_test_helper(vec![-2.0, -2.0, -1.0, -1.0, -3.0, -3.0, -3.0]);
    }

    #[test]
    fn peak_is_recorded() {
        let mut frontier = Frontier::default();
        frontier.push(id(0), -1.0);
        frontier.push(id(1), -2.0);
        let _ = frontier.pop_min();
        frontier.push(id(2), -3.0);
        let _ = frontier.pop_min();

        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.peak_len(), 2);
    }

    #[test]
    fn drain_returns_every_region() {
        let mut frontier = Frontier::default();
        for index in 0..5 {
            frontier.push(id(index), -(index as f64));
        }

        let mut drained = frontier.drain().collect::<Vec<_>>();
        drained.sort();
        assert_eq!(drained, (0..5).map(id).collect::<Vec<_>>());
        assert!(frontier.is_empty());
    }
}
