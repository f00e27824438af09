//! Event kinetics: area under curve, rise time, decay time.

use super::region::Region;
use super::types::AnalysisResult;

/// Area under the curve over the region, by the trapezoidal rule.
///
/// Units are sample-units * seconds.
pub fn area_under_curve(
    buffer: &[f64],
    region: &Region,
    sample_rate: f64,
) -> AnalysisResult<f64> {
    let window = region.slice(buffer)?;
    let dt = 1.0 / sample_rate;
    let area = window
        .windows(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0 * dt)
        .sum();
    Ok(area)
}

/// 10%-90% rise time of the event peaking at `peak_index`, in seconds.
///
/// The baseline is the 10th percentile of the samples before the peak; the
/// rise time is measured between the last upward crossings of the 10% and
/// 90% levels on the rising flank. Returns `None` when the flank never
/// crosses both levels (e.g. the peak sits at the buffer edge).
pub fn rise_time(buffer: &[f64], peak_index: usize, sample_rate: f64) -> Option<f64> {
    if peak_index == 0 || peak_index >= buffer.len() {
        return None;
    }

    let baseline = percentile(&buffer[..peak_index], 10.0);
    let peak_value = buffer[peak_index];
    let span = peak_value - baseline;
    if span <= 0.0 {
        return None;
    }

    let target_low = baseline + span * 0.10;
    let target_high = baseline + span * 0.90;

    let rising = &buffer[..=peak_index];
    let low_idx = last_upward_crossing(rising, target_low)?;
    let high_idx = last_upward_crossing(rising, target_high)?;
    if high_idx > low_idx {
        Some((high_idx - low_idx) as f64 / sample_rate)
    } else {
        None
    }
}

/// Decay time from the peak at `peak_index` down to `1 - decay_fraction` of
/// the peak value, in seconds. `decay_fraction` of 0.632 gives the time
/// constant tau; 0.5 gives the half-life.
pub fn decay_time(
    buffer: &[f64],
    peak_index: usize,
    decay_fraction: f64,
    sample_rate: f64,
) -> Option<f64> {
    if peak_index >= buffer.len().saturating_sub(1) {
        return None;
    }

    let peak_value = buffer[peak_index];
    let target = peak_value * (1.0 - decay_fraction);

    buffer[peak_index..]
        .iter()
        .position(|&v| v < target)
        .map(|offset| offset as f64 / sample_rate)
}

/// Index of the last sample that crosses `target` going upward.
fn last_upward_crossing(signal: &[f64], target: f64) -> Option<usize> {
    (1..signal.len())
        .rev()
        .find(|&i| signal[i - 1] < target && signal[i] >= target)
}

fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        sorted[low]
    } else {
        let frac = rank - low as f64;
        sorted[low] * (1.0 - frac) + sorted[high] * frac
    }
}
