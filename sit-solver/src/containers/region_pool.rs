use super::KeyedVec;
use super::StorageKey;
use crate::engine::Region;
use crate::sit_assert_advanced;
use crate::sit_assert_simple;

/// Identifies a [`Region`] stored in a [`RegionPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(usize);

impl StorageKey for RegionId {
    fn index(&self) -> usize {
        self.0
    }

    fn create_from_index(index: usize) -> Self {
        RegionId(index)
    }
}

/// An arena of [`Region`]s which hands out recycled records before allocating new ones.
///
/// A search touches millions of regions but only a small number is alive at any moment, so the
/// coordinate buffers of released regions are reused instead of freed.
#[derive(Debug)]
pub struct RegionPool {
    regions: KeyedVec<RegionId, Region>,
    free: Vec<RegionId>,
    dimension: usize,
    num_recycled: u64,
}

impl RegionPool {
    pub fn new(dimension: usize) -> Self {
        Self {
            regions: KeyedVec::default(),
            free: Vec::new(),
            dimension,
            num_recycled: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns a region spanning `[lb, ub]` which has not been bounded yet.
    pub fn acquire(&mut self, lb: &[f64], ub: &[f64]) -> RegionId {
        sit_assert_simple!(lb.len() == self.dimension && ub.len() == self.dimension);

        let id = match self.free.pop() {
            Some(id) => {
                self.num_recycled += 1;
                id
            }
            None => self.regions.push(Region::new(self.dimension)),
        };
        self.regions[id].reset(lb, ub);
        id
    }

    /// Hands the region back to the pool; `id` must not be used afterwards.
    pub fn release(&mut self, id: RegionId) {
        sit_assert_simple!(id.index() < self.regions.len());
        sit_assert_advanced!(!self.free.contains(&id), "region released twice");
        self.free.push(id);
    }

    pub fn get(&self, id: RegionId) -> &Region {
        &self.regions[id]
    }

    pub fn get_mut(&mut self, id: RegionId) -> &mut Region {
        &mut self.regions[id]
    }

    /// The number of distinct region records ever allocated.
    pub fn num_allocated(&self) -> usize {
        self.regions.len()
    }

    pub fn num_recycled(&self) -> u64 {
        self.num_recycled
    }

    /// The number of regions currently handed out.
    pub fn num_in_use(&self) -> usize {
        self.regions.len() - self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::RegionId;
    use super::RegionPool;
    use crate::containers::StorageKey;

    #[test]
    fn region_ids_keep_every_index() {
        let index = usize::MAX;
        assert_eq!(RegionId::create_from_index(index).index(), index);
    }

    #[test]
    fn released_regions_are_reused() {
        let mut pool = RegionPool::new(2);

        let first = pool.acquire(&[0.0, 0.0], &[1.0, 1.0]);
        pool.release(first);
        let second = pool.acquire(&[2.0, 3.0], &[4.0, 5.0]);

        assert_eq!(first, second);
        assert_eq!(pool.num_allocated(), 1);
        assert_eq!(pool.num_recycled(), 1);
        assert_eq!(pool.get(second).lower_bounds(), &[2.0, 3.0]);
        assert_eq!(pool.get(second).upper_bounds(), &[4.0, 5.0]);
    }

    #[test]
    fn reused_region_forgets_its_bound() {
        let mut pool = RegionPool::new(1);

        let id = pool.acquire(&[0.0], &[1.0]);
        pool.get_mut(id).candidate_mut()[0] = 1.0;
        pool.get_mut(id)
            .record_bound(-3.0, crate::engine::ReferenceCorner::PointsAtUpperBound);
        pool.release(id);

        let id = pool.acquire(&[0.0], &[2.0]);
        assert_eq!(pool.get(id).beta(), f64::INFINITY);
        assert_eq!(
            pool.get(id).reference_corner(),
            crate::engine::ReferenceCorner::None
        );
        assert_eq!(pool.num_in_use(), 1);
    }
}
