//! Peak and trough detection over a cursor-bounded region.
//!
//! A sample is a candidate extremum when it is strictly greater (peaks) or
//! strictly less (troughs) than both neighbors. Candidates are filtered by
//! height and prominence, then thinned so no two accepted extrema of the
//! same polarity sit closer than the minimum distance; the taller candidate
//! wins, earlier index on ties. Trough height and prominence are evaluated
//! on the negated trace, mirroring peak semantics.

use tracing::debug;

use super::region::Region;
use super::types::{AnalysisError, AnalysisResult, Peak, Polarity};

/// Constraints for peak/trough detection.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakConfig {
    /// Minimum extremum height (on the negated trace for troughs).
    pub min_height: Option<f64>,
    /// Minimum distance between accepted extrema of the same polarity, in
    /// samples. Must be at least 1.
    pub min_distance: usize,
    /// Minimum prominence: vertical drop to the highest base on either side
    /// before a taller sample is encountered.
    pub min_prominence: Option<f64>,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            min_height: None,
            min_distance: 1,
            min_prominence: None,
        }
    }
}

/// Detect peaks and troughs in the region, merged in index order.
///
/// An all-constant or too-short region yields an empty sequence, not an
/// error. Peak indices and times are absolute within the sweep buffer.
pub fn detect(
    buffer: &[f64],
    region: &Region,
    sample_rate: f64,
    config: &PeakConfig,
) -> AnalysisResult<Vec<Peak>> {
    if config.min_distance == 0 {
        return Err(AnalysisError::InvalidParameter(
            "minimum peak distance must be at least 1 sample".into(),
        ));
    }
    if sample_rate <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "sample rate must be positive, got {sample_rate}"
        )));
    }
    let window = region.slice(buffer)?;

    let maxima = detect_one_polarity(window, config);
    let negated: Vec<f64> = window.iter().map(|x| -x).collect();
    let minima = detect_one_polarity(&negated, config);

    let mut result: Vec<Peak> = maxima
        .into_iter()
        .map(|i| make_peak(buffer, region, sample_rate, i, Polarity::Peak))
        .chain(
            minima
                .into_iter()
                .map(|i| make_peak(buffer, region, sample_rate, i, Polarity::Trough)),
        )
        .collect();
    result.sort_by_key(|p| p.index);

    debug!(count = result.len(), "peak detection finished");
    Ok(result)
}

fn make_peak(
    buffer: &[f64],
    region: &Region,
    sample_rate: f64,
    window_index: usize,
    polarity: Polarity,
) -> Peak {
    let index = region.start() + window_index;
    Peak {
        index,
        time_secs: index as f64 / sample_rate,
        value: buffer[index],
        polarity,
    }
}

/// Find maxima in `signal` (troughs are maxima of the negated trace).
/// Returns window-relative indices in ascending order.
fn detect_one_polarity(signal: &[f64], config: &PeakConfig) -> Vec<usize> {
    if signal.len() < 3 {
        return Vec::new();
    }

    let mut candidates: Vec<usize> = (1..signal.len() - 1)
        .filter(|&i| signal[i] > signal[i - 1] && signal[i] > signal[i + 1])
        .collect();

    if let Some(h) = config.min_height {
        candidates.retain(|&i| signal[i] >= h);
    }
    if let Some(p) = config.min_prominence {
        candidates.retain(|&i| prominence(signal, i) >= p);
    }

    // Greedy suppression: taller candidates claim their neighborhood first,
    // earlier index wins a tie.
    let mut by_priority = candidates.clone();
    by_priority.sort_by(|&a, &b| {
        signal[b]
            .partial_cmp(&signal[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut accepted: Vec<usize> = Vec::new();
    for i in by_priority {
        let suppressed = accepted
            .iter()
            .any(|&j| i.abs_diff(j) < config.min_distance);
        if !suppressed {
            accepted.push(i);
        }
    }
    accepted.sort_unstable();
    accepted
}

/// Prominence of the candidate at `i`: vertical drop from the candidate to
/// the higher of the two bases, where each base is the lowest sample between
/// the candidate and the nearest taller sample (or the window edge).
fn prominence(signal: &[f64], i: usize) -> f64 {
    let mut left_base = signal[i];
    for j in (0..i).rev() {
        if signal[j] > signal[i] {
            break;
        }
        left_base = left_base.min(signal[j]);
    }

    let mut right_base = signal[i];
    for &value in &signal[i + 1..] {
        if value > signal[i] {
            break;
        }
        right_base = right_base.min(value);
    }

    signal[i] - left_base.max(right_base)
}
