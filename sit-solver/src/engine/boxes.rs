use crate::containers::RegionId;
use crate::sit_assert_simple;

/// A hyperrectangle `[lb, ub]` of the non-convex variables.
#[derive(Debug, Clone, PartialEq)]
pub struct PBox {
    pub lb: Box<[f64]>,
    pub ub: Box<[f64]>,
}

impl PBox {
    pub fn new(lb: impl Into<Box<[f64]>>, ub: impl Into<Box<[f64]>>) -> Self {
        let (lb, ub) = (lb.into(), ub.into());
        sit_assert_simple!(lb.len() == ub.len());
        Self { lb, ub }
    }

    pub fn dimension(&self) -> usize {
        self.lb.len()
    }
}

/// Which point of a [`Region`] certifies its bound.
///
/// The branching rule splits a region along the coordinate where this point and the candidate
/// disagree most. The tag is resolved against the region when it is read; it never owns
/// coordinates of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReferenceCorner {
    #[default]
    None,
    PointsAtCandidate,
    PointsAtUpperBound,
    PointsAtLowerBound,
}

/// A box together with the outcome of bounding it.
///
/// Before bounding, `beta` is `+inf` and the reference corner is [`ReferenceCorner::None`].
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    lb: Box<[f64]>,
    ub: Box<[f64]>,
    xk: Box<[f64]>,
    beta: f64,
    yk: ReferenceCorner,
}

impl Region {
    pub fn new(dimension: usize) -> Self {
        Self {
            lb: vec![0.0; dimension].into(),
            ub: vec![0.0; dimension].into(),
            xk: vec![0.0; dimension].into(),
            beta: f64::INFINITY,
            yk: ReferenceCorner::None,
        }
    }

    pub(crate) fn reset(&mut self, lb: &[f64], ub: &[f64]) {
        self.lb.copy_from_slice(lb);
        self.ub.copy_from_slice(ub);
        self.xk.copy_from_slice(lb);
        self.beta = f64::INFINITY;
        self.yk = ReferenceCorner::None;
    }

    pub fn dimension(&self) -> usize {
        self.lb.len()
    }

    pub fn lower_bounds(&self) -> &[f64] {
        &self.lb
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.ub
    }

    /// The candidate point found while bounding.
    pub fn candidate(&self) -> &[f64] {
        &self.xk
    }

    pub fn candidate_mut(&mut self) -> &mut [f64] {
        &mut self.xk
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn reference_corner(&self) -> ReferenceCorner {
        self.yk
    }

    /// The coordinates the reference corner points at, if any.
    pub fn reference_point(&self) -> Option<&[f64]> {
        match self.yk {
            ReferenceCorner::None => None,
            ReferenceCorner::PointsAtCandidate => Some(&self.xk),
            ReferenceCorner::PointsAtUpperBound => Some(&self.ub),
            ReferenceCorner::PointsAtLowerBound => Some(&self.lb),
        }
    }

    pub fn record_bound(&mut self, beta: f64, yk: ReferenceCorner) {
        self.beta = beta;
        self.yk = yk;
    }

    /// Sets the outcome of a bounding step saved in a checkpoint.
    pub(crate) fn restore(&mut self, beta: f64, xk: &[f64], yk: ReferenceCorner) {
        self.xk.copy_from_slice(xk);
        self.beta = beta;
        self.yk = yk;
    }

    pub fn to_pbox(&self) -> PBox {
        PBox::new(self.lb.clone(), self.ub.clone())
    }
}

/// The regions created by the last branching step which still have to be bounded.
///
/// Holds a single region at the start of a search and two after every branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    members: Vec<RegionId>,
}

impl Partition {
    pub fn single(region: RegionId) -> Self {
        Self {
            members: vec![region],
        }
    }

    pub fn pair(first: RegionId, second: RegionId) -> Self {
        Self {
            members: vec![first, second],
        }
    }

    pub fn from_members(members: Vec<RegionId>) -> Self {
        sit_assert_simple!(matches!(members.len(), 1 | 2));
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[RegionId] {
        &self.members
    }

    pub fn take(&mut self) -> Vec<RegionId> {
        std::mem::take(&mut self.members)
    }
}

#[cfg(test)]
mod tests {
    use super::ReferenceCorner;
    use super::Region;

    #[test]
    fn reference_point_resolves_against_the_region() {
        let mut region = Region::new(2);
        region.reset(&[0.0, 1.0], &[2.0, 3.0]);
        region.candidate_mut().copy_from_slice(&[1.5, 2.5]);

        assert_eq!(region.reference_point(), None);

        region.record_bound(-1.0, ReferenceCorner::PointsAtUpperBound);
        assert_eq!(region.reference_point(), Some(&[2.0, 3.0][..]));

        region.record_bound(-1.0, ReferenceCorner::PointsAtLowerBound);
        assert_eq!(region.reference_point(), Some(&[0.0, 1.0][..]));

        region.record_bound(-1.0, ReferenceCorner::PointsAtCandidate);
        assert_eq!(region.reference_point(), Some(&[1.5, 2.5][..]));
    }
}
