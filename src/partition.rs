use std::fmt;

/// A closed interval `[start, end]` of integers assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: u32,
    pub end: u32,
}

impl Range {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn count(&self) -> u64 {
        u64::from(self.end) - u64::from(self.start) + 1
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Splits `[0, end]` into contiguous, non-overlapping ranges of `end / worker_count + 1`
/// integers each. The last range is clamped to `end`, so it absorbs the remainder and is
/// usually shorter than the rest.
///
/// At most `worker_count` ranges are produced. When `end + 1` is small compared to
/// `worker_count` there are fewer, e.g. `end = 2, worker_count = 10` gives three
/// single-integer ranges.
///
/// `worker_count` must be non-zero.
pub fn partition(end: u32, worker_count: usize) -> Vec<Range> {
    assert!(worker_count > 0, "worker_count must be non-zero");
    let end = u64::from(end);
    let step = end / worker_count as u64 + 1;

    let mut ranges = Vec::with_capacity(worker_count);
    let mut start = 0_u64;
    while start <= end {
        let last = (start + step - 1).min(end);
        // Both bounds are <= end, which came from a u32.
        ranges.push(Range::new(start as u32, last as u32));
        start += step;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn assert_exact_cover(ranges: &[Range], end: u32, worker_count: usize) {
        assert!(!ranges.is_empty());
        assert!(ranges.len() <= worker_count);
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges[ranges.len() - 1].end, end);
        for pair in ranges.windows(2) {
            assert!(pair[0].start <= pair[0].end);
            assert_eq!(u64::from(pair[0].end) + 1, u64::from(pair[1].start));
        }
        let total: u64 = ranges.iter().map(Range::count).sum();
        assert_eq!(total, u64::from(end) + 1);
    }

    #[test]
    fn non_divisible_range_shortens_the_last_chunk() {
        let ranges = partition(25, 4);
        assert_eq!(
            ranges,
            vec![
                Range::new(0, 6),
                Range::new(7, 13),
                Range::new(14, 20),
                Range::new(21, 25),
            ]
        );
        assert_eq!(ranges[3].count(), 5);
    }

    #[test]
    fn two_workers_over_seven_integers() {
        assert_eq!(partition(6, 2), vec![Range::new(0, 3), Range::new(4, 6)]);
    }

    #[test]
    fn full_range_with_ten_workers() {
        let ranges = partition(0xFF_FFFF, 10);
        assert_eq!(ranges.len(), 10);
        assert_eq!(ranges[0], Range::new(0, 1_677_721));
        assert_eq!(ranges[9], Range::new(15_099_498, 16_777_215));
        assert_exact_cover(&ranges, 0xFF_FFFF, 10);
    }

    #[test]
    fn more_workers_than_integers() {
        let ranges = partition(2, 10);
        assert_eq!(
            ranges,
            vec![Range::new(0, 0), Range::new(1, 1), Range::new(2, 2)]
        );
    }

    #[test]
    fn single_worker_takes_everything() {
        assert_eq!(partition(100, 1), vec![Range::new(0, 100)]);
        assert_eq!(partition(0, 1), vec![Range::new(0, 0)]);
    }

    #[test]
    fn upper_bound_of_u32_does_not_overflow() {
        let ranges = partition(u32::MAX, 3);
        assert_exact_cover(&ranges, u32::MAX, 3);
    }

    #[test]
    fn random_pairs_cover_exactly() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let end: u32 = rng.gen_range(0..10_000);
            let worker_count: usize = rng.gen_range(1..64);
            let ranges = partition(end, worker_count);
            assert_exact_cover(&ranges, end, worker_count);
        }
    }
}
