//! Core types for signal analysis.

use serde::{Deserialize, Serialize};

/// Error types for analysis operations.
///
/// Detectors that find nothing return an empty `Vec`, not an error; the
/// variants below are the only synchronous failure paths. No operation
/// mutates state before validation succeeds.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Degenerate or out-of-bounds cursor range.
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// Rejected parameter value (Nyquist violation, non-positive
    /// distance/duration, threshold <= 0, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Type alias for analysis results.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Polarity of a detected extremum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Local maximum.
    Peak,
    /// Local minimum.
    Trough,
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Peak => write!(f, "peak"),
            Polarity::Trough => write!(f, "trough"),
        }
    }
}

/// A detected local extremum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Sample index within the sweep buffer (absolute, not region-relative).
    pub index: usize,
    /// Time of the sample in seconds from sweep start.
    pub time_secs: f64,
    /// Sample value at the extremum.
    pub value: f64,
    /// Whether this is a peak or a trough.
    pub polarity: Polarity,
}

/// Descriptive statistics over one region of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRecord {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Minimum sample value.
    pub min: f64,
    /// Maximum sample value.
    pub max: f64,
    /// Peak-to-peak amplitude (max - min).
    pub peak_to_peak: f64,
    /// Median sample value.
    pub median: f64,
    /// Number of samples in the region.
    pub sample_count: usize,
}

/// One detected block event.
///
/// A block is a sustained interval where the signal moves from the baseline
/// (open-channel) level toward zero past the detection threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Sweep the block was detected in.
    pub sweep_index: usize,
    /// Channel the block was detected in.
    pub channel: usize,
    /// First sample index of the block.
    pub start_index: usize,
    /// Last sample index of the block (inclusive).
    pub end_index: usize,
    /// Block start time in seconds from sweep start.
    pub start_time_secs: f64,
    /// Block end time in seconds from sweep start.
    pub end_time_secs: f64,
    /// Block duration in seconds.
    pub duration_secs: f64,
    /// Mean amplitude over the block's own sample span.
    pub average_amplitude: f64,
    /// Baseline (open-channel) amplitude the detection used.
    pub baseline_amplitude: f64,
    /// |baseline - average| - how far the block sits from baseline.
    pub block_depth: f64,
}

/// Result of comparing a response window against a baseline window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertCandidate {
    /// Sweep the windows were taken from.
    pub sweep_index: usize,
    /// Statistics over the baseline window.
    pub baseline: StatisticsRecord,
    /// Statistics over the response window.
    pub response: StatisticsRecord,
    /// Deviation score: max(|response.max - baseline.mean|,
    /// |response.min - baseline.mean|).
    pub deviation: f64,
    /// Threshold the deviation was compared against.
    pub threshold: f64,
    /// Whether the response deviates from baseline beyond the threshold.
    pub is_event: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_displays_lowercase() {
        assert_eq!(Polarity::Peak.to_string(), "peak");
        assert_eq!(Polarity::Trough.to_string(), "trough");
    }

    #[test]
    fn records_round_trip_through_json() {
        let peak = Peak {
            index: 42,
            time_secs: 0.0042,
            value: -1.25,
            polarity: Polarity::Trough,
        };
        let json = serde_json::to_string(&peak).unwrap();
        let back: Peak = serde_json::from_str(&json).unwrap();
        assert_eq!(back, peak);

        let block = Block {
            sweep_index: 3,
            channel: 0,
            start_index: 100,
            end_index: 250,
            start_time_secs: 0.01,
            end_time_secs: 0.025,
            duration_secs: 0.015,
            average_amplitude: -0.05,
            baseline_amplitude: -0.25,
            block_depth: 0.2,
        };
        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn errors_carry_context() {
        let err = AnalysisError::InvalidParameter("cutoff 5000 Hz >= Nyquist 5000 Hz".into());
        assert!(err.to_string().contains("invalid parameter"));
        assert!(err.to_string().contains("Nyquist"));
    }
}
