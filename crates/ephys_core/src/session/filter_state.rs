//! Cumulative per-channel filter history.
//!
//! Filters are permanent and cumulative within a session: each successful
//! application appends a descriptor, and the effective buffer is the
//! original with all descriptors replayed in recorded order. There is no
//! undo; removing a filter means reloading the sweep. Later filters operate
//! on the output of earlier ones, so the sequence does not commute.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::filtering;
use crate::analysis::{AnalysisResult, Region};

/// The filter transform of one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FilterKind {
    /// Gaussian low-pass with the -3 dB point at `cutoff_hz`.
    GaussianLowPass {
        /// Cutoff frequency in Hz.
        cutoff_hz: f64,
    },
    /// Butterworth low-pass (cascaded biquad sections).
    ButterworthLowPass {
        /// Cutoff frequency in Hz.
        cutoff_hz: f64,
        /// Filter order.
        order: usize,
    },
    /// Butterworth high-pass (cascaded biquad sections).
    ButterworthHighPass {
        /// Cutoff frequency in Hz.
        cutoff_hz: f64,
        /// Filter order.
        order: usize,
    },
    /// Butterworth band-pass (high-pass then low-pass).
    ButterworthBandPass {
        /// Low cutoff frequency in Hz.
        low_cutoff_hz: f64,
        /// High cutoff frequency in Hz.
        high_cutoff_hz: f64,
        /// Filter order.
        order: usize,
    },
}

/// One applied filter: the transform plus its scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    /// The transform.
    pub kind: FilterKind,
    /// `None` = whole trace; `Some` = only samples inside the region are
    /// replaced.
    pub region: Option<Region>,
}

/// Ordered history of filters applied to one (sweep, channel) pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterState {
    applied: Vec<FilterDescriptor>,
}

impl FilterState {
    /// Create an empty filter history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a filter to the working buffer and record it.
    ///
    /// The transform is validated and run first; the descriptor is appended
    /// only on success, so a rejected call leaves both the buffer and the
    /// history untouched.
    pub fn apply(
        &mut self,
        working: &mut Vec<f64>,
        sample_rate: f64,
        descriptor: FilterDescriptor,
    ) -> AnalysisResult<()> {
        let filtered = run_descriptor(working, sample_rate, &descriptor)?;
        *working = filtered;
        self.applied.push(descriptor);
        debug!(
            total = self.applied.len(),
            ?descriptor,
            "filter applied and recorded"
        );
        Ok(())
    }

    /// Recompute the effective buffer by replaying the history against the
    /// original, unfiltered buffer.
    ///
    /// Replaying the same history twice is deterministic.
    pub fn replay(&self, original: &[f64], sample_rate: f64) -> AnalysisResult<Vec<f64>> {
        let mut buffer = original.to_vec();
        for descriptor in &self.applied {
            buffer = run_descriptor(&buffer, sample_rate, descriptor)?;
        }
        Ok(buffer)
    }

    /// The recorded descriptors in application order.
    pub fn descriptors(&self) -> &[FilterDescriptor] {
        &self.applied
    }

    /// Number of applied filters.
    pub fn len(&self) -> usize {
        self.applied.len()
    }

    /// Whether no filter has been applied yet.
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

fn run_descriptor(
    samples: &[f64],
    sample_rate: f64,
    descriptor: &FilterDescriptor,
) -> AnalysisResult<Vec<f64>> {
    match (descriptor.kind, descriptor.region) {
        (FilterKind::GaussianLowPass { cutoff_hz }, None) => {
            filtering::gaussian_lowpass(samples, sample_rate, cutoff_hz)
        }
        (FilterKind::GaussianLowPass { cutoff_hz }, Some(region)) => {
            filtering::gaussian_lowpass_region(samples, sample_rate, cutoff_hz, &region)
        }
        (kind, None) => run_butterworth(samples, sample_rate, kind),
        (kind, Some(region)) => {
            // IIR filters are causal: run from the buffer start through the
            // region so the filter is warmed up on real samples, then keep
            // only the in-region output.
            region.slice(samples)?;
            let filtered_prefix =
                run_butterworth(&samples[..=region.end()], sample_rate, kind)?;
            let mut out = samples.to_vec();
            out[region.start()..=region.end()]
                .copy_from_slice(&filtered_prefix[region.start()..=region.end()]);
            Ok(out)
        }
    }
}

fn run_butterworth(samples: &[f64], sample_rate: f64, kind: FilterKind) -> AnalysisResult<Vec<f64>> {
    match kind {
        FilterKind::ButterworthLowPass { cutoff_hz, order } => {
            filtering::butterworth_lowpass(samples, sample_rate, cutoff_hz, order)
        }
        FilterKind::ButterworthHighPass { cutoff_hz, order } => {
            filtering::butterworth_highpass(samples, sample_rate, cutoff_hz, order)
        }
        FilterKind::ButterworthBandPass {
            low_cutoff_hz,
            high_cutoff_hz,
            order,
        } => filtering::butterworth_bandpass(
            samples,
            sample_rate,
            low_cutoff_hz,
            high_cutoff_hz,
            order,
        ),
        FilterKind::GaussianLowPass { .. } => unreachable!("handled by run_descriptor"),
    }
}
