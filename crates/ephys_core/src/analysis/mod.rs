//! Signal analysis for sweep buffers.
//!
//! Every function in this module is a stateless service: it consumes a
//! sample buffer, a resolved [`Region`], and a parameter set, and returns
//! result records. The stateful side (cumulative filter history, the
//! measurement ledger, sweep lifecycle) lives in [`crate::session`].
//!
//! # Architecture
//!
//! 1. **Region Model** (`region`): resolve two cursor time positions into
//!    an inclusive, ordered, clamped sample-index range.
//!
//! 2. **Filter Engine** (`filtering`): Gaussian low-pass (the -3 dB sigma
//!    contract) plus Butterworth IIR variants, whole-trace or region-scoped.
//!
//! 3. **Statistics Aggregator** (`statistics`): descriptive statistics over
//!    a region.
//!
//! 4. **Peak/Trough Detector** (`peaks`): local extrema with height,
//!    distance, and prominence constraints.
//!
//! 5. **Block Detector** (`blocks`): hysteresis segmentation of intervals
//!    where the signal leaves baseline toward zero.
//!
//! 6. **Insert Detector** (`inserts`): baseline vs. response window
//!    comparison per sweep.
//!
//! 7. **Kinetics** (`kinetics`): area under curve, rise and decay times.

pub mod blocks;
pub mod filtering;
pub mod inserts;
pub mod kinetics;
pub mod peaks;
mod region;
pub mod statistics;
pub mod types;

// Re-export main types from types module
pub use types::{
    AnalysisError, AnalysisResult, Block, InsertCandidate, Peak, Polarity, StatisticsRecord,
};

// Re-export the region model
pub use region::Region;

// Re-export filtering
pub use filtering::{
    butterworth_bandpass, butterworth_highpass, butterworth_lowpass, gaussian_lowpass,
    gaussian_lowpass_region, gaussian_sigma_samples,
};

// Re-export detectors and their configs
pub use blocks::{resolve_baseline, BaselineMode, BlockConfig};
pub use inserts::{compare_windows, threshold_from_baseline};
pub use peaks::PeakConfig;
