//! Column helpers over sparse numeric series
//!
//! Missing cells (`None`) never poison the whole column: accumulators skip
//! them and report `None` only at the missing position.

/// First present value of a column
pub(crate) fn first_present(values: &[Option<f64>]) -> Option<f64> {
    values.iter().flatten().next().copied()
}

/// Sum of present values
pub(crate) fn sum_present(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().sum()
}

/// Largest present value
pub(crate) fn max_present(values: &[Option<f64>]) -> Option<f64> {
    values.iter().flatten().copied().reduce(f64::max)
}

/// Running total; `None` where the input cell is missing
pub(crate) fn cumsum(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut total = 0.0;
    values
        .iter()
        .map(|v| {
            v.map(|x| {
                total += x;
                total
            })
        })
        .collect()
}

/// Mean of the present values seen so far; `None` where the input cell is missing
pub(crate) fn cumulative_mean(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut total = 0.0;
    let mut count = 0u32;
    values
        .iter()
        .map(|v| {
            v.map(|x| {
                total += x;
                count += 1;
                total / count as f64
            })
        })
        .collect()
}

/// Running maximum over present values; `None` until the first present value
pub(crate) fn running_max(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut max: Option<f64> = None;
    values
        .iter()
        .map(|v| {
            if let Some(x) = v {
                max = Some(max.map_or(*x, |m| m.max(*x)));
            }
            max
        })
        .collect()
}

/// Trailing mean over `width` rows
///
/// `None` until `width` rows have been seen, and wherever the trailing
/// window holds a missing cell.
pub(crate) fn rolling_mean(values: &[Option<f64>], width: usize) -> Vec<Option<f64>> {
    let width = width.max(1);
    (0..values.len())
        .map(|i| {
            if i + 1 < width {
                return None;
            }
            let window = &values[i + 1 - width..=i];
            let sum = window.iter().try_fold(0.0, |acc, v| v.map(|x| acc + x))?;
            Some(sum / width as f64)
        })
        .collect()
}

/// `100 * (value / base - 1)` per row against the first present value
pub(crate) fn pct_change_from_first(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let base = first_present(values).filter(|b| *b != 0.0);
    values
        .iter()
        .map(|v| match (v, base) {
            (Some(x), Some(b)) => Some(100.0 * (x / b - 1.0)),
            _ => None,
        })
        .collect()
}

/// Element-wise ratio; `None` on a missing operand or zero denominator
pub(crate) fn ratio(num: &[Option<f64>], den: &[Option<f64>]) -> Vec<Option<f64>> {
    num.iter()
        .zip(den)
        .map(|(n, d)| match (n, d) {
            (Some(n), Some(d)) if *d != 0.0 => Some(n / d),
            _ => None,
        })
        .collect()
}

/// Smoothing width used for the market comparison chart
pub(crate) fn smoothing_width(rows: usize) -> usize {
    (rows / 1000).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cumsum_skips_missing() {
        let out = cumsum(&[Some(1.0), None, Some(2.0), Some(3.0)]);
        assert_eq!(out, vec![Some(1.0), None, Some(3.0), Some(6.0)]);
    }

    #[test]
    fn test_cumulative_mean() {
        let out = cumulative_mean(&[Some(2.0), Some(4.0), None, Some(6.0)]);
        assert_eq!(out, vec![Some(2.0), Some(3.0), None, Some(4.0)]);
    }

    #[test]
    fn test_running_max() {
        let out = running_max(&[None, Some(5.0), Some(3.0), Some(7.0)]);
        assert_eq!(out, vec![None, Some(5.0), Some(5.0), Some(7.0)]);
        assert_eq!(max_present(&[None, Some(5.0), Some(7.0)]), Some(7.0));
        assert_eq!(max_present(&[None, None]), None);
    }

    #[test]
    fn test_rolling_mean() {
        let values = [Some(1.0), Some(3.0), Some(5.0), None, Some(7.0)];
        let out = rolling_mean(&values, 2);
        assert_eq!(out, vec![None, Some(2.0), Some(4.0), None, None]);
        assert_eq!(rolling_mean(&values, 1), values.to_vec());
    }

    #[test]
    fn test_pct_change_from_first() {
        let out = pct_change_from_first(&[None, Some(200.0), Some(250.0), Some(100.0)]);
        assert_eq!(out, vec![None, Some(0.0), Some(25.0), Some(-50.0)]);
        assert_eq!(pct_change_from_first(&[Some(0.0), Some(1.0)]), vec![None, None]);
    }

    #[test]
    fn test_ratio_guards_zero() {
        let out = ratio(&[Some(1.0), Some(1.0), None], &[Some(4.0), Some(0.0), Some(1.0)]);
        assert_eq!(out, vec![Some(0.25), None, None]);
    }

    #[test]
    fn test_smoothing_width() {
        assert_eq!(smoothing_width(0), 1);
        assert_eq!(smoothing_width(999), 1);
        assert_eq!(smoothing_width(2500), 2);
    }
}
