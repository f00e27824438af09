//! Insert/response detection.
//!
//! Compares a response window against a baseline window of the same sweep
//! and flags the sweep when the response deviates from the baseline mean
//! beyond a threshold. The two windows must be disjoint: an overlapping
//! pair has no meaningful deviation score and is rejected as an invalid
//! region.

use super::region::Region;
use super::statistics;
use super::types::{AnalysisError, AnalysisResult, InsertCandidate, StatisticsRecord};

/// Compare one sweep's response window against its baseline window.
///
/// The deviation score is `max(|response.max - baseline.mean|,
/// |response.min - baseline.mean|)`, so single-direction excursions in
/// either polarity count. `is_event` is set when the score exceeds
/// `threshold`; the candidate is returned either way so the caller can
/// tabulate all sweeps.
pub fn compare_windows(
    buffer: &[f64],
    baseline_region: &Region,
    response_region: &Region,
    threshold: f64,
    sweep_index: usize,
) -> AnalysisResult<InsertCandidate> {
    if threshold <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "insert threshold must be positive, got {threshold}"
        )));
    }
    if baseline_region.overlaps(response_region) {
        return Err(AnalysisError::InvalidRegion(format!(
            "baseline window [{}, {}] overlaps response window [{}, {}]",
            baseline_region.start(),
            baseline_region.end(),
            response_region.start(),
            response_region.end()
        )));
    }

    let baseline = statistics::compute(buffer, baseline_region)?;
    let response = statistics::compute(buffer, response_region)?;

    let deviation = (response.max - baseline.mean)
        .abs()
        .max((response.min - baseline.mean).abs());

    Ok(InsertCandidate {
        sweep_index,
        deviation,
        threshold,
        is_event: deviation > threshold,
        baseline,
        response,
    })
}

/// Adaptive threshold derived from baseline statistics:
/// `|mean| + factor * std_dev`.
///
/// This reproduces the classic "k sigma above baseline" criterion; pass the
/// result to [`compare_windows`] to get sweep flags relative to each
/// sweep's own noise floor.
pub fn threshold_from_baseline(
    baseline: &StatisticsRecord,
    factor: f64,
) -> AnalysisResult<f64> {
    if factor <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "threshold factor must be positive, got {factor}"
        )));
    }
    Ok(baseline.mean.abs() + factor * baseline.std_dev)
}
