//! Descriptive statistics over a cursor-bounded region.

use super::region::Region;
use super::types::{AnalysisResult, StatisticsRecord};

/// Compute descriptive statistics over the region of the buffer.
///
/// Pure function of the (possibly filtered) buffer and region; fails with
/// `InvalidRegion` when the region lies outside the buffer.
pub fn compute(buffer: &[f64], region: &Region) -> AnalysisResult<StatisticsRecord> {
    let window = region.slice(buffer)?;
    let n = window.len() as f64;

    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &x in window {
        min = min.min(x);
        max = max.max(x);
    }

    Ok(StatisticsRecord {
        mean,
        std_dev: variance.sqrt(),
        min,
        max,
        peak_to_peak: max - min,
        median: median(window),
        sample_count: window.len(),
    })
}

fn median(window: &[f64]) -> f64 {
    let mut sorted = window.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
