use super::Region;

/// Where a region is cut in two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub coordinate: usize,
    pub value: f64,
}

/// Chooses the split of a bounded region.
///
/// The region is cut orthogonally to the coordinate on which the candidate and the reference
/// corner differ most, halfway between the two. When there is no reference corner, or the two
/// points do not differ in a way that shrinks the region, the longest edge is bisected.
pub fn split_region(region: &Region) -> Split {
    let lb = region.lower_bounds();
    let ub = region.upper_bounds();
    let xk = region.candidate();

    if let Some(yk) = region.reference_point() {
        let (coordinate, distance) = yk
            .iter()
            .zip(xk)
            .map(|(y, x)| (y - x).abs())
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (index, distance)| {
                if distance > best.1 {
                    (index, distance)
                } else {
                    best
                }
            });

        if distance > 0.0 && distance.is_finite() {
            let value = (yk[coordinate] + xk[coordinate]) / 2.0;
            if lb[coordinate] < value && value < ub[coordinate] {
                return Split { coordinate, value };
            }
        }
    }

    let coordinate = (0..lb.len())
        .fold(0, |best, index| {
            if ub[index] - lb[index] > ub[best] - lb[best] {
                index
            } else {
                best
            }
        });
    Split {
        coordinate,
        value: (lb[coordinate] + ub[coordinate]) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::split_region;
    use super::Split;
    use crate::engine::ReferenceCorner;
    use crate::engine::Region;

    fn region(lb: &[f64], ub: &[f64], xk: &[f64], yk: ReferenceCorner) -> Region {
        let mut region = Region::new(lb.len());
        region.reset(lb, ub);
        region.candidate_mut().copy_from_slice(xk);
        region.record_bound(-1.0, yk);
        region
    }

    #[test]
    fn splits_where_candidate_and_corner_disagree_most() {
        let region = region(
            &[0.0, 0.0, 0.0],
            &[4.0, 8.0, 2.0],
            &[4.0, 8.0, 0.0],
            ReferenceCorner::PointsAtLowerBound,
        );

        assert_eq!(
            split_region(&region),
            Split {
                coordinate: 1,
                value: 4.0
            }
        );
    }

    #[test]
    fn children_halve_the_parent_along_the_split() {
        let region = region(
            &[1.0, 2.0],
            &[3.0, 10.0],
            &[3.0, 10.0],
            ReferenceCorner::PointsAtLowerBound,
        );

        let split = split_region(&region);
        let parent = region.upper_bounds()[split.coordinate] - region.lower_bounds()[split.coordinate];
        let lower_child = split.value - region.lower_bounds()[split.coordinate];
        let upper_child = region.upper_bounds()[split.coordinate] - split.value;

        assert_eq!(split.coordinate, 1);
        assert_eq!(lower_child, parent / 2.0);
        assert_eq!(upper_child, parent / 2.0);
    }

    #[test]
    fn coinciding_corner_bisects_the_longest_edge() {
        let region = region(
            &[0.0, 0.0],
            &[1.0, 3.0],
            &[1.0, 3.0],
            ReferenceCorner::PointsAtUpperBound,
        );

        assert_eq!(
            split_region(&region),
            Split {
                coordinate: 1,
                value: 1.5
            }
        );
    }

    #[test]
    fn missing_corner_bisects_the_longest_edge() {
        let region = region(&[0.0, 0.0], &[5.0, 3.0], &[1.0, 1.0], ReferenceCorner::None);

        assert_eq!(
            split_region(&region),
            Split {
                coordinate: 0,
                value: 2.5
            }
        );
    }
}
