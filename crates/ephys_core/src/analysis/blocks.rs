//! Block detection for single-channel recordings.
//!
//! A block is a sustained interval where the current moves from the
//! baseline (open-channel) level toward 0 past a threshold scaled by
//! `threshold_factor`. Detection runs as an explicit two-state machine over
//! the region: `Outside -> (threshold crossed toward zero) -> Inside ->
//! (re-crossed back toward baseline) -> Outside`. Blocks shorter than the
//! minimum duration are discarded without disturbing the scan; a block
//! still open at the region's end is closed at the boundary.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::region::Region;
use super::types::{AnalysisError, AnalysisResult, Block};

/// How the baseline (open-channel) level is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BaselineMode {
    /// Estimate from the region's amplitude histogram.
    Auto,
    /// Caller-supplied level.
    Manual(f64),
    /// Sample value under cursor 1.
    FromCursor1 {
        /// Cursor 1 time position in seconds.
        time_secs: f64,
    },
}

/// Parameters for block detection.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockConfig {
    /// Baseline resolution mode.
    pub baseline: BaselineMode,
    /// Threshold scale: the detection threshold sits `|baseline| / factor`
    /// closer to zero than the baseline, so a higher factor widens the band
    /// of values counted as blocked.
    pub threshold_factor: f64,
    /// Minimum duration for a retained block, in seconds.
    pub min_block_duration_secs: f64,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            baseline: BaselineMode::Auto,
            threshold_factor: 2.0,
            min_block_duration_secs: 0.001,
        }
    }
}

/// Scan state of the hysteresis machine.
enum ScanState {
    Outside,
    Inside { start: usize },
}

/// Detect block events in one region of one channel.
///
/// Returned blocks carry absolute sample indices and times within the
/// sweep. Finding no blocks is `Ok(vec![])`, not an error.
pub fn detect(
    buffer: &[f64],
    region: &Region,
    sample_rate: f64,
    sweep_index: usize,
    channel: usize,
    config: &BlockConfig,
) -> AnalysisResult<Vec<Block>> {
    if config.threshold_factor <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "threshold factor must be positive, got {}",
            config.threshold_factor
        )));
    }
    if config.min_block_duration_secs <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "minimum block duration must be positive, got {} s",
            config.min_block_duration_secs
        )));
    }
    if sample_rate <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "sample rate must be positive, got {sample_rate}"
        )));
    }
    let window = region.slice(buffer)?;

    let baseline = resolve_baseline(buffer, region, sample_rate, config.baseline)?;
    if baseline == 0.0 {
        return Err(AnalysisError::InvalidParameter(
            "baseline amplitude is zero; blocks are defined as excursions from \
             baseline toward zero"
                .into(),
        ));
    }

    // The threshold sits |baseline|/factor closer to zero than the baseline.
    let threshold = baseline - baseline.signum() * baseline.abs() / config.threshold_factor;
    debug!(baseline, threshold, "block detection thresholds resolved");

    let toward_zero = |value: f64| {
        if baseline < 0.0 {
            value > threshold
        } else {
            value < threshold
        }
    };

    let min_samples = config.min_block_duration_secs * sample_rate;
    let mut blocks = Vec::new();
    let mut state = ScanState::Outside;

    for (i, &value) in window.iter().enumerate() {
        state = match state {
            ScanState::Outside if toward_zero(value) => ScanState::Inside { start: i },
            ScanState::Inside { start } if !toward_zero(value) => {
                // Block spans the consecutive in-block samples [start, i-1].
                push_if_long_enough(
                    &mut blocks,
                    window,
                    region,
                    sample_rate,
                    sweep_index,
                    channel,
                    baseline,
                    start,
                    i - 1,
                    min_samples,
                );
                ScanState::Outside
            }
            other => other,
        };
    }

    // A block still open at the region's end closes at the boundary and is
    // evaluated like any other.
    if let ScanState::Inside { start } = state {
        push_if_long_enough(
            &mut blocks,
            window,
            region,
            sample_rate,
            sweep_index,
            channel,
            baseline,
            start,
            window.len() - 1,
            min_samples,
        );
    }

    debug!(count = blocks.len(), sweep_index, channel, "block detection finished");
    Ok(blocks)
}

#[allow(clippy::too_many_arguments)]
fn push_if_long_enough(
    blocks: &mut Vec<Block>,
    window: &[f64],
    region: &Region,
    sample_rate: f64,
    sweep_index: usize,
    channel: usize,
    baseline: f64,
    start: usize,
    end: usize,
    min_samples: f64,
) {
    let duration_samples = (end - start) as f64;
    if duration_samples < min_samples {
        return;
    }

    let span = &window[start..=end];
    let average = span.iter().sum::<f64>() / span.len() as f64;

    let start_index = region.start() + start;
    let end_index = region.start() + end;
    let start_time_secs = start_index as f64 / sample_rate;
    let end_time_secs = end_index as f64 / sample_rate;

    blocks.push(Block {
        sweep_index,
        channel,
        start_index,
        end_index,
        start_time_secs,
        end_time_secs,
        duration_secs: end_time_secs - start_time_secs,
        average_amplitude: average,
        baseline_amplitude: baseline,
        block_depth: (baseline - average).abs(),
    });
}

/// Resolve the baseline level for the region according to the mode.
pub fn resolve_baseline(
    buffer: &[f64],
    region: &Region,
    sample_rate: f64,
    mode: BaselineMode,
) -> AnalysisResult<f64> {
    match mode {
        BaselineMode::Manual(value) => Ok(value),
        BaselineMode::FromCursor1 { time_secs } => {
            let index = (time_secs * sample_rate).round();
            if index < 0.0 || index as usize >= buffer.len() {
                return Err(AnalysisError::InvalidRegion(format!(
                    "cursor 1 at {time_secs} s is outside the sweep"
                )));
            }
            Ok(buffer[index as usize])
        }
        BaselineMode::Auto => Ok(estimate_baseline(region.slice(buffer)?)),
    }
}

const BASELINE_HISTOGRAM_BINS: usize = 100;

/// Estimate the open-channel level as the mode of a 100-bin histogram over
/// the region, falling back to the median for (near-)constant traces.
fn estimate_baseline(window: &[f64]) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &x in window {
        min = min.min(x);
        max = max.max(x);
    }
    let range = max - min;
    if range <= f64::EPSILON * max.abs().max(1.0) {
        return median(window);
    }

    let bin_width = range / BASELINE_HISTOGRAM_BINS as f64;
    let mut counts = [0usize; BASELINE_HISTOGRAM_BINS];
    for &x in window {
        let bin = (((x - min) / bin_width) as usize).min(BASELINE_HISTOGRAM_BINS - 1);
        counts[bin] += 1;
    }

    let mode_bin = counts
        .iter()
        .enumerate()
        .max_by_key(|(_, &c)| c)
        .map(|(i, _)| i)
        .unwrap_or(0);
    min + (mode_bin as f64 + 0.5) * bin_width
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

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f64 = 10_000.0;

    fn whole(buffer: &[f64]) -> Region {
        Region::new(0, buffer.len() - 1, buffer.len()).unwrap()
    }

    /// Baseline at -0.25 with one excursion to -0.05 spanning `run` samples.
    fn trace_with_run(run: usize) -> Vec<f64> {
        let mut buffer = vec![-0.25; 1000];
        for value in &mut buffer[400..400 + run] {
            *value = -0.05;
        }
        buffer
    }

    #[test]
    fn sustained_run_yields_one_block_with_expected_depth() {
        // threshold = -0.25 + 0.25/2 = -0.125; -0.05 is past it toward zero.
        let buffer = trace_with_run(100); // 10 ms at 10 kHz
        let config = BlockConfig {
            baseline: BaselineMode::Manual(-0.25),
            threshold_factor: 2.0,
            min_block_duration_secs: 0.001,
        };
        let blocks = detect(&buffer, &whole(&buffer), RATE, 0, 0, &config).unwrap();

        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.start_index, 400);
        assert_eq!(block.end_index, 499);
        assert!((block.block_depth - 0.20).abs() < 1e-9, "depth {}", block.block_depth);
        assert!((block.average_amplitude - (-0.05)).abs() < 1e-9);
        assert!((block.duration_secs - 0.0099).abs() < 1e-9);
    }

    #[test]
    fn short_run_is_discarded() {
        let buffer = trace_with_run(5); // 0.5 ms < 1 ms minimum
        let config = BlockConfig {
            baseline: BaselineMode::Manual(-0.25),
            threshold_factor: 2.0,
            min_block_duration_secs: 0.001,
        };
        let blocks = detect(&buffer, &whole(&buffer), RATE, 0, 0, &config).unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn discarded_block_does_not_break_scanning() {
        let mut buffer = vec![-0.25; 1000];
        // Short blip, then a sustained block.
        for value in &mut buffer[100..103] {
            *value = -0.05;
        }
        for value in &mut buffer[500..650] {
            *value = -0.05;
        }
        let config = BlockConfig {
            baseline: BaselineMode::Manual(-0.25),
            threshold_factor: 2.0,
            min_block_duration_secs: 0.001,
        };
        let blocks = detect(&buffer, &whole(&buffer), RATE, 0, 0, &config).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_index, 500);
    }

    #[test]
    fn block_open_at_region_end_is_closed_at_boundary() {
        let mut buffer = vec![-0.25; 1000];
        for value in &mut buffer[900..] {
            *value = -0.05;
        }
        let config = BlockConfig {
            baseline: BaselineMode::Manual(-0.25),
            threshold_factor: 2.0,
            min_block_duration_secs: 0.001,
        };
        let blocks = detect(&buffer, &whole(&buffer), RATE, 0, 0, &config).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].end_index, 999);
    }

    #[test]
    fn positive_baseline_blocks_move_down_toward_zero() {
        let mut buffer = vec![0.25; 1000];
        for value in &mut buffer[200..400] {
            *value = 0.05;
        }
        let config = BlockConfig {
            baseline: BaselineMode::Manual(0.25),
            threshold_factor: 2.0,
            min_block_duration_secs: 0.001,
        };
        let blocks = detect(&buffer, &whole(&buffer), RATE, 0, 0, &config).unwrap();
        assert_eq!(blocks.len(), 1);
        assert!((blocks[0].block_depth - 0.20).abs() < 1e-9);
    }

    #[test]
    fn threshold_factor_scales_the_detection_band() {
        // With factor 2 the threshold is -0.125; a dip to -0.15 stays on the
        // baseline side. With factor 10 the threshold is -0.225 and the same
        // dip is detected.
        let mut buffer = vec![-0.25; 1000];
        for value in &mut buffer[300..500] {
            *value = -0.15;
        }
        let mut config = BlockConfig {
            baseline: BaselineMode::Manual(-0.25),
            threshold_factor: 2.0,
            min_block_duration_secs: 0.001,
        };
        assert!(detect(&buffer, &whole(&buffer), RATE, 0, 0, &config)
            .unwrap()
            .is_empty());

        config.threshold_factor = 10.0;
        assert_eq!(
            detect(&buffer, &whole(&buffer), RATE, 0, 0, &config)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn auto_baseline_is_stable_under_noise() {
        // Deterministic pseudo-noise around -0.25 with a block at -0.05.
        let mut buffer: Vec<f64> = (0..2000)
            .map(|i| -0.25 + 0.004 * ((i * 7919 % 1000) as f64 / 1000.0 - 0.5))
            .collect();
        for value in &mut buffer[800..1000] {
            *value = -0.05;
        }
        let region = whole(&buffer);
        let baseline = resolve_baseline(&buffer, &region, RATE, BaselineMode::Auto).unwrap();
        assert!(
            (baseline - (-0.25)).abs() < 0.01,
            "auto baseline drifted: {baseline}"
        );

        let config = BlockConfig {
            baseline: BaselineMode::Auto,
            threshold_factor: 2.0,
            min_block_duration_secs: 0.001,
        };
        let blocks = detect(&buffer, &region, RATE, 0, 0, &config).unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn cursor_baseline_reads_sample_under_cursor() {
        let mut buffer = vec![-0.25; 1000];
        buffer[100] = -0.30;
        let region = whole(&buffer);
        let baseline = resolve_baseline(
            &buffer,
            &region,
            RATE,
            BaselineMode::FromCursor1 { time_secs: 0.01 },
        )
        .unwrap();
        assert_eq!(baseline, -0.30);
    }

    #[test]
    fn zero_baseline_is_invalid_parameter() {
        let buffer = vec![0.0; 100];
        let config = BlockConfig {
            baseline: BaselineMode::Manual(0.0),
            ..BlockConfig::default()
        };
        let err = detect(&buffer, &whole(&buffer), RATE, 0, 0, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter(_)));
    }

    #[test]
    fn non_positive_parameters_are_rejected() {
        let buffer = vec![-0.25; 100];
        let region = whole(&buffer);

        let config = BlockConfig {
            baseline: BaselineMode::Manual(-0.25),
            threshold_factor: 0.0,
            min_block_duration_secs: 0.001,
        };
        assert!(detect(&buffer, &region, RATE, 0, 0, &config).is_err());

        let config = BlockConfig {
            baseline: BaselineMode::Manual(-0.25),
            threshold_factor: 2.0,
            min_block_duration_secs: 0.0,
        };
        assert!(detect(&buffer, &region, RATE, 0, 0, &config).is_err());
    }
}
