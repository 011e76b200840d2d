//! 等宽直方图，分箱规则与 numpy.histogram 一致。

use crate::error::{PrepError, Result};

/// `bins + 1` 个等距边界，最后一个边界精确等于 `stop`。
pub fn linspace_edges(start: f64, stop: f64, bins: usize) -> Vec<f64> {
    let step = (stop - start) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| i as f64 * step + start).collect();
    if let Some(last) = edges.last_mut() {
        *last = stop;
    }
    edges
}

/// Count `values` into `bins` equal-width bins spanning `[min, max]`.
///
/// A constant population widens the range to `min - 0.5 ..= max + 0.5`.
/// Bins are half-open except the last one, which also holds `max`.
/// Returns `(counts, edges)`.
pub fn histogram(values: &[f64], bins: usize) -> Result<(Vec<u64>, Vec<f64>)> {
    if bins == 0 {
        return Err(PrepError::config("number of bins must be at least 1"));
    }
    if values.is_empty() {
        return Err(PrepError::config("cannot build a histogram of no values"));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(PrepError::invalid_value(format!(
            "histogram input must be finite, found {}",
            bad
        )));
    }

    let (mut first, mut last) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if first == last {
        first -= 0.5;
        last += 0.5;
    }
    let edges = linspace_edges(first, last, bins);
    let span = last - first;

    let mut counts = vec![0u64; bins];
    for &v in values {
        let mut idx = ((v - first) / span * bins as f64) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        // 浮点误差修正：以实际边界为准
        if idx > 0 && v < edges[idx] {
            idx -= 1;
        }
        if idx != bins - 1 && v >= edges[idx + 1] {
            idx += 1;
        }
        counts[idx] += 1;
    }
    Ok((counts, edges))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_bins() {
        let (counts, edges) = histogram(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(edges, vec![1.0, 1.75, 2.5, 3.25, 4.0]);
        assert_eq!(counts, vec![1, 2, 3, 1]);
    }

    #[test]
    fn max_falls_in_last_bin() {
        let (counts, _) = histogram(&[0.0, 1.0], 10).unwrap();
        assert_eq!(counts[0], 1);
        assert_eq!(counts[9], 1);
        assert_eq!(counts.iter().sum::<u64>(), 2);
    }

    #[test]
    fn value_on_inner_edge_goes_right() {
        let (counts, edges) = histogram(&[0.0, 0.5, 1.0], 2).unwrap();
        assert_eq!(edges, vec![0.0, 0.5, 1.0]);
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn constant_population_is_widened() {
        let (counts, edges) = histogram(&[3.0, 3.0, 3.0], 2).unwrap();
        assert_eq!(edges, vec![2.5, 3.0, 3.5]);
        assert_eq!(counts, vec![0, 3]);
    }

    #[test]
    fn last_edge_is_exact() {
        let edges = linspace_edges(0.1, 0.7, 3);
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[3], 0.7);
        assert_eq!(edges[0], 0.1);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(histogram(&[], 4).is_err());
        assert!(histogram(&[1.0], 0).is_err());
        assert!(matches!(
            histogram(&[1.0, f64::NAN], 4),
            Err(PrepError::InvalidValue { .. })
        ));
        assert!(matches!(
            histogram(&[1.0, f64::INFINITY], 4),
            Err(PrepError::InvalidValue { .. })
        ));
    }
}
