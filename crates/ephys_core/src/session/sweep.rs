//! Sweep data model.

use crate::analysis::{AnalysisError, AnalysisResult};

/// One recorded episode of a multichannel time-series file.
///
/// Owns one sample buffer per channel and the file's shared sample rate.
/// Originals are immutable; filtered views are derived per channel by the
/// session's filter state.
#[derive(Debug, Clone)]
pub struct Sweep {
    /// Index of this sweep within its file.
    pub sweep_index: usize,
    /// Sample rate in Hz (constant per file).
    pub sample_rate: f64,
    channels: Vec<Vec<f64>>,
}

impl Sweep {
    /// Create a sweep from per-channel sample buffers.
    ///
    /// All channels must be non-empty and the same length.
    pub fn new(
        sweep_index: usize,
        sample_rate: f64,
        channels: Vec<Vec<f64>>,
    ) -> AnalysisResult<Self> {
        if sample_rate <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        if channels.is_empty() {
            return Err(AnalysisError::InvalidParameter(
                "a sweep needs at least one channel".into(),
            ));
        }
        let len = channels[0].len();
        if len == 0 {
            return Err(AnalysisError::InvalidParameter(
                "channel buffers must not be empty".into(),
            ));
        }
        if channels.iter().any(|c| c.len() != len) {
            return Err(AnalysisError::InvalidParameter(
                "all channels of a sweep must have the same length".into(),
            ));
        }
        Ok(Self {
            sweep_index,
            sample_rate,
            channels,
        })
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Sweeps are never empty; this exists for clippy's benefit.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Sweep duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate
    }

    /// Sample buffer of one channel.
    pub fn samples(&self, channel: usize) -> AnalysisResult<&[f64]> {
        self.channels
            .get(channel)
            .map(|c| c.as_slice())
            .ok_or_else(|| {
                AnalysisError::InvalidParameter(format!(
                    "channel {channel} not available (sweep has {})",
                    self.channels.len()
                ))
            })
    }

    /// Consume the sweep, returning its channel buffers.
    pub(crate) fn into_channels(self) -> Vec<Vec<f64>> {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_exposes_channels() {
        let sweep = Sweep::new(2, 10_000.0, vec![vec![0.0; 100], vec![1.0; 100]]).unwrap();
        assert_eq!(sweep.channel_count(), 2);
        assert_eq!(sweep.len(), 100);
        assert!((sweep.duration_secs() - 0.01).abs() < 1e-12);
        assert_eq!(sweep.samples(1).unwrap()[0], 1.0);
        assert!(sweep.samples(2).is_err());
    }

    #[test]
    fn mismatched_channel_lengths_are_rejected() {
        let err = Sweep::new(0, 10_000.0, vec![vec![0.0; 100], vec![0.0; 50]]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter(_)));
    }

    #[test]
    fn empty_and_invalid_inputs_are_rejected() {
        assert!(Sweep::new(0, 0.0, vec![vec![0.0; 10]]).is_err());
        assert!(Sweep::new(0, 10_000.0, vec![]).is_err());
        assert!(Sweep::new(0, 10_000.0, vec![vec![]]).is_err());
    }
}
