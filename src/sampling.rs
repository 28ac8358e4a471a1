//! Reduce a long GPS trace to a bounded number of evenly spaced points
use crate::gps::Location;

/// Return at most `max_count` points spread evenly over the trace.
///
/// Short traces are returned unchanged. Otherwise the indices are chosen by truncating a linear
/// spacing over `[0, len - 1]`, so the first and last points are always kept when
/// `max_count >= 2`. A `max_count` of 1 keeps only the first point.
pub fn sample_points(points: &[Location], max_count: usize) -> Vec<Location> {
    if points.len() <= max_count {
        return points.to_vec();
    }
    sample_indices(points.len(), max_count)
        .map(|idx| points[idx])
        .collect()
}

fn sample_indices(len: usize, count: usize) -> impl Iterator<Item = usize> {
    let last = len - 1;
    let steps = count.saturating_sub(1).max(1);
    (0..count).map(move |i| i * last / steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(len: usize) -> Vec<Location> {
        (0..len)
            .map(|i| Location::new(i as f64, -(i as f64)))
            .collect()
    }

    #[test]
    fn short_trace_is_unchanged() {
        let points = trace(5);
        assert_eq!(sample_points(&points, 5), points);
        assert_eq!(sample_points(&points, 400), points);
        assert!(sample_points(&[], 10).is_empty());
    }

    #[test]
    fn long_trace_keeps_endpoints_and_order() {
        for &(len, count) in &[(10, 2), (10, 3), (401, 400), (1000, 7), (12345, 400)] {
            let points = trace(len);
            let sampled = sample_points(&points, count);
            assert_eq!(sampled.len(), count);
            assert_eq!(sampled.first(), points.first());
            assert_eq!(sampled.last(), points.last());
            // latitude is the original index so it must never decrease
            assert!(sampled
                .windows(2)
                .all(|w| w[0].latitude() <= w[1].latitude()));
        }
    }

    #[test]
    fn three_points_down_to_two() {
        let points = trace(3);
        assert_eq!(sample_points(&points, 2), vec![points[0], points[2]]);
    }

    #[test]
    fn matches_truncated_linspace() {
        // numpy.linspace(0, 9, 4, dtype=int) -> [0, 3, 6, 9]
        assert_eq!(sample_indices(10, 4).collect::<Vec<_>>(), vec![0, 3, 6, 9]);
        // numpy.linspace(0, 10, 4, dtype=int) -> [0, 3, 6, 10]
        assert_eq!(sample_indices(11, 4).collect::<Vec<_>>(), vec![0, 3, 6, 10]);
    }

    #[test]
    fn degenerate_counts() {
        let points = trace(4);
        assert!(sample_points(&points, 0).is_empty());
        assert_eq!(sample_points(&points, 1), vec![points[0]]);
    }
}
