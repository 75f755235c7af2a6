//! Descriptive statistics and frequency tables

use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of one numeric column
///
/// Quantiles are linearly interpolated between closest ranks and `std` is
/// the sample standard deviation (n - 1). Statistics that are undefined for
/// the sample size are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl Describe {
    /// Describe `values`, ignoring NaN
    pub fn of<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        if count == 0 {
            return Self {
                count,
                mean: None,
                std: None,
                min: None,
                p25: None,
                p50: None,
                p75: None,
                max: None,
            };
        }

        let n = count as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let std = (count > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });

        Self {
            count,
            mean: Some(mean),
            std,
            min: sorted.first().copied(),
            p25: Some(quantile(&sorted, 0.25)),
            p50: Some(quantile(&sorted, 0.50)),
            p75: Some(quantile(&sorted, 0.75)),
            max: sorted.last().copied(),
        }
    }
}

/// Linear-interpolated quantile of a sorted, non-empty slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Occurrences of each distinct value
pub fn value_counts<'a, I>(values: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_describe_quartiles_interpolate() {
        let d = Describe::of([1.0, 2.0, 3.0, 4.0]);

        assert_eq!(d.count, 4);
        assert!(close(d.mean, 2.5));
        assert!(close(d.min, 1.0));
        assert!(close(d.p25, 1.75));
        assert!(close(d.p50, 2.5));
        assert!(close(d.p75, 3.25));
        assert!(close(d.max, 4.0));
        assert!(close(d.std, (5.0f64 / 3.0).sqrt()));
    }

    #[test]
    fn test_describe_single_value_has_no_std() {
        let d = Describe::of([200.0]);

        assert_eq!(d.count, 1);
        assert_eq!(d.std, None);
        assert!(close(d.p75, 200.0));
    }

    #[test]
    fn test_describe_empty_and_nan() {
        let empty = Describe::of(Vec::new());
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);

        let with_nan = Describe::of([f64::NAN, 3.0]);
        assert_eq!(with_nan.count, 1);
    }

    #[test]
    fn test_describe_serialized_keys() {
        let json = serde_json::to_value(Describe::of([1.0])).unwrap();
        for key in ["count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_value_counts() {
        let counts = value_counts(["SU", "S7", "SU"]);
        assert_eq!(counts.get("SU"), Some(&2));
        assert_eq!(counts.get("S7"), Some(&1));
        assert_eq!(counts.len(), 2);
    }
}
