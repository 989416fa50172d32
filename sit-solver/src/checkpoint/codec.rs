use std::time::Duration;

use super::CheckpointError;
use crate::engine::PBox;
use crate::engine::ReferenceCorner;
use crate::sit_assert_simple;

const TAG_UNDEFINED: u32 = 0;
const TAG_CANDIDATE: u32 = 1;
const TAG_LOWER_BOUND: u32 = 2;
const TAG_UPPER_BOUND: u32 = 3;
const TAG_NULL: u32 = 4;

/// A bounded region as stored in a checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontierRecord {
    pub beta: f64,
    pub region: PBox,
    pub xk: Box<[f64]>,
    pub yk: ReferenceCorner,
}

/// Everything needed to resume a search.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointState {
    /// `-inf` while no incumbent has been found.
    pub optval: f64,
    pub xopt: Vec<f64>,
    /// Seconds spent searching, excluding time spent writing checkpoints.
    pub runtime: f64,
    pub iter: u64,
    pub last_update: u64,
    /// The one or two regions which still have to be bounded.
    pub partition: Vec<PBox>,
    pub frontier: Vec<FrontierRecord>,
}

impl CheckpointState {
    pub fn dimension(&self) -> usize {
        self.xopt.len()
    }

    pub fn encode(&self) -> Vec<u8> {
        let dimension = self.dimension();
        sit_assert_simple!(matches!(self.partition.len(), 1 | 2));

        let mut bytes = Vec::with_capacity(
            8 * (5 + 7 * dimension) + self.frontier.len() * (12 + 24 * dimension),
        );

        put_f64(&mut bytes, self.optval);
        put_slice(&mut bytes, &self.xopt);
        put_f64(&mut bytes, self.runtime);
        put_u64(&mut bytes, self.iter);
        put_u64(&mut bytes, self.last_update);

        let zeros = vec![0.0; dimension];
        let single = (self.partition.len() == 1).then(|| &self.partition[0]);
        let pair = (self.partition.len() == 2).then_some(&self.partition[..]);
        match single {
            Some(region) => put_box(&mut bytes, region),
            None => {
                put_slice(&mut bytes, &zeros);
                put_slice(&mut bytes, &zeros);
            }
        }
        match pair {
            Some(regions) => regions.iter().for_each(|region| put_box(&mut bytes, region)),
            None => (0..4).for_each(|_| put_slice(&mut bytes, &zeros)),
        }
        put_u64(&mut bytes, self.partition.len() as u64);

        put_u64(&mut bytes, self.frontier.len() as u64);
        for record in &self.frontier {
            put_f64(&mut bytes, record.beta);
            put_box(&mut bytes, &record.region);
            put_slice(&mut bytes, &record.xk);
            put_u32(&mut bytes, encode_reference_corner(record.yk));
        }

        bytes
    }

    pub fn decode(bytes: &[u8], dimension: usize) -> Result<Self, CheckpointError> {
        let mut reader = ByteReader { bytes, offset: 0 };

        let optval = reader.read_f64()?;
        let xopt = reader.read_vector(dimension)?.into_vec();
        let runtime = reader.read_f64()?;
        if Duration::try_from_secs_f64(runtime).is_err() {
            return Err(CheckpointError::InvalidRuntime(runtime));
        }
        let iter = reader.read_u64()?;
        let last_update = reader.read_u64()?;

        let single = reader.read_box(dimension)?;
        let first = reader.read_box(dimension)?;
        let second = reader.read_box(dimension)?;
        let partition = match reader.read_u64()? {
            1 => vec![single],
            2 => vec![first, second],
            len => return Err(CheckpointError::InvalidPartition(len)),
        };

        let frontier_len = reader.read_u64()?;
        let mut frontier = Vec::new();
        for _ in 0..frontier_len {
            let beta = reader.read_f64()?;
            let region = reader.read_box(dimension)?;
            let xk = reader.read_vector(dimension)?;
            let yk = decode_reference_corner(reader.read_u32()?)?;
            frontier.push(FrontierRecord {
                beta,
                region,
                xk,
                yk,
            });
        }

        if reader.offset != bytes.len() {
            return Err(CheckpointError::TrailingBytes(bytes.len() - reader.offset));
        }

        Ok(Self {
            optval,
            xopt,
            runtime,
            iter,
            last_update,
            partition,
            frontier,
        })
    }
}

fn encode_reference_corner(yk: ReferenceCorner) -> u32 {
    match yk {
        ReferenceCorner::PointsAtCandidate => TAG_CANDIDATE,
        ReferenceCorner::PointsAtLowerBound => TAG_LOWER_BOUND,
        ReferenceCorner::PointsAtUpperBound => TAG_UPPER_BOUND,
        ReferenceCorner::None => TAG_NULL,
    }
}

fn decode_reference_corner(tag: u32) -> Result<ReferenceCorner, CheckpointError> {
    match tag {
        TAG_CANDIDATE => Ok(ReferenceCorner::PointsAtCandidate),
        TAG_LOWER_BOUND => Ok(ReferenceCorner::PointsAtLowerBound),
        TAG_UPPER_BOUND => Ok(ReferenceCorner::PointsAtUpperBound),
        TAG_NULL => Ok(ReferenceCorner::None),
        TAG_UNDEFINED => Err(CheckpointError::InvalidReferenceCorner(TAG_UNDEFINED)),
        tag => Err(CheckpointError::InvalidReferenceCorner(tag)),
    }
}

fn put_f64(bytes: &mut Vec<u8>, value: f64) {
    bytes.extend_from_slice(&value.to_ne_bytes());
}

fn put_u64(bytes: &mut Vec<u8>, value: u64) {
    bytes.extend_from_slice(&value.to_ne_bytes());
}

fn put_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_ne_bytes());
}

fn put_slice(bytes: &mut Vec<u8>, values: &[f64]) {
    values.iter().for_each(|&value| put_f64(bytes, value));
}

fn put_box(bytes: &mut Vec<u8>, region: &PBox) {
    put_slice(bytes, &region.lb);
    put_slice(bytes, &region.ub);
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl ByteReader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], CheckpointError> {
        let end = self.offset + N;
        let chunk = self
            .bytes
            .get(self.offset..end)
            .ok_or(CheckpointError::Truncated {
                offset: self.offset,
                needed: end - self.bytes.len().min(end),
            })?;
        self.offset = end;

        let mut array = [0; N];
        array.copy_from_slice(chunk);
        Ok(array)
    }

    fn read_f64(&mut self) -> Result<f64, CheckpointError> {
        self.take::<8>().map(f64::from_ne_bytes)
    }

    fn read_u64(&mut self) -> Result<u64, CheckpointError> {
        self.take::<8>().map(u64::from_ne_bytes)
    }

    fn read_u32(&mut self) -> Result<u32, CheckpointError> {
        self.take::<4>().map(u32::from_ne_bytes)
    }

    fn read_vector(&mut self, dimension: usize) -> Result<Box<[f64]>, CheckpointError> {
        (0..dimension).map(|_| self.read_f64()).collect()
    }

    fn read_box(&mut self, dimension: usize) -> Result<PBox, CheckpointError> {
        let lb = self.read_vector(dimension)?;
        let ub = self.read_vector(dimension)?;
        Ok(PBox::new(lb, ub))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::CheckpointState;
    use super::FrontierRecord;
    use crate::checkpoint::CheckpointError;
    use crate::engine::PBox;
    use crate::engine::ReferenceCorner;

    pub(crate) fn record(beta: f64, lb: [f64; 2], ub: [f64; 2], yk: ReferenceCorner) -> FrontierRecord {
        FrontierRecord {
            beta,
            region: PBox::new(lb.to_vec(), ub.to_vec()),
            xk: vec![(lb[0] + ub[0]) / 2.0, ub[1]].into(),
            yk,
        }
    }

    pub(crate) fn sample_state() -> CheckpointState {
        CheckpointState {
            optval: 1.25,
            xopt: vec![0.5, 2.0],
            runtime: 12.5,
            iter: 4711,
            last_update: 4000,
            partition: vec![
                PBox::new(vec![0.0, 0.0], vec![0.5, 1.0]),
                PBox::new(vec![0.5, 0.0], vec![1.0, 1.0]),
            ],
            frontier: vec![
                record(-0.5, [0.0, 1.0], [1.0, 2.0], ReferenceCorner::PointsAtUpperBound),
                record(-0.25, [1.0, 1.0], [2.0, 2.0], ReferenceCorner::PointsAtLowerBound),
                record(-2.0, [2.0, 0.0], [3.0, 1.0], ReferenceCorner::PointsAtCandidate),
                record(-1.0, [3.0, 0.0], [4.0, 1.0], ReferenceCorner::None),
            ],
        }
    }

    fn sort_key(record: &FrontierRecord) -> Vec<u64> {
        std::iter::once(record.beta)
            .chain(record.region.lb.iter().copied())
            .chain(record.region.ub.iter().copied())
            .chain(record.xk.iter().copied())
            .map(f64::to_bits)
            .collect()
    }

    #[test]
    fn decoding_reproduces_the_frontier_as_a_multiset() {
        let state = sample_state();

        let decoded = CheckpointState::decode(&state.encode(), 2).expect("valid checkpoint");

        assert_eq!(decoded.optval, state.optval);
        assert_eq!(decoded.xopt, state.xopt);
        assert_eq!(decoded.runtime, state.runtime);
        assert_eq!(decoded.iter, state.iter);
        assert_eq!(decoded.last_update, state.last_update);
        assert_eq!(decoded.partition, state.partition);

        let mut expected = state.frontier.clone();
        let mut actual = decoded.frontier.clone();
        expected.sort_by_key(sort_key);
        actual.sort_by_key(sort_key);
        assert_eq!(actual, expected);
    }

    #[test]
    fn single_region_partition_survives() {
        let mut state = sample_state();
        state.partition.truncate(1);
        state.frontier.clear();

        let decoded = CheckpointState::decode(&state.encode(), 2).expect("valid checkpoint");
        assert_eq!(decoded.partition, state.partition);
        assert!(decoded.frontier.is_empty());
    }

    #[test]
    fn missing_incumbent_is_kept_as_negative_infinity() {
        let mut state = sample_state();
        state.optval = f64::NEG_INFINITY;

        let decoded = CheckpointState::decode(&state.encode(), 2).expect("valid checkpoint");
        assert_eq!(decoded.optval, f64::NEG_INFINITY);
    }

    #[test]
    fn truncated_checkpoint_is_rejected() {
        let bytes = sample_state().encode();

        let result = CheckpointState::decode(&bytes[..bytes.len() - 3], 2);
        assert!(matches!(result, Err(CheckpointError::Truncated { .. })));
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let bytes = sample_state().encode();

        assert!(CheckpointState::decode(&bytes, 3).is_err());
    }

    #[test]
    fn unknown_reference_corner_tag_is_rejected() {
        let mut state = sample_state();
        state.frontier.truncate(1);
        let mut bytes = state.encode();
        let tag_offset = bytes.len() - 4;
        bytes[tag_offset..].copy_from_slice(&9_u32.to_ne_bytes());

        let result = CheckpointState::decode(&bytes, 2);
        assert!(matches!(
            result,
            Err(CheckpointError::InvalidReferenceCorner(9))
        ));
    }

    #[test]
    fn undefined_reference_corner_tag_is_rejected() {
        let mut state = sample_state();
        state.frontier.truncate(1);
        let mut bytes = state.encode();
        let tag_offset = bytes.len() - 4;
        bytes[tag_offset..].copy_from_slice(&0_u32.to_ne_bytes());

        let result = CheckpointState::decode(&bytes, 2);
        assert!(matches!(
            result,
            Err(CheckpointError::InvalidReferenceCorner(0))
        ));
    }

    #[test]
    fn unrepresentable_runtime_is_rejected() {
        for runtime in [f64::INFINITY, f64::NAN, -1.0, 1e300] {
            let mut state = sample_state();
            state.runtime = runtime;

            let result = CheckpointState::decode(&state.encode(), 2);
            assert!(
                matches!(result, Err(CheckpointError::InvalidRuntime(_))),
                "runtime {runtime} was accepted"
            );
        }
    }
}
