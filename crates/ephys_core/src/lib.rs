//! Ephys Core - Signal analysis engine for electrophysiology recordings
//!
//! This crate contains the analysis logic for multi-sweep, multi-channel
//! time-series recordings with zero UI dependencies. It can be driven by a
//! GUI viewer, a CLI tool, or tests.
//!
//! The engine consumes raw sample buffers, cursor positions, and parameter
//! sets as plain values and returns analysis records (measurements,
//! statistics, peaks, blocks, insert candidates) suitable for tabular
//! display or export by the caller.

pub mod analysis;
pub mod config;
pub mod logging;
pub mod session;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
