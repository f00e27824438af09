//! Cursor-bounded sample regions.
//!
//! Two cursor time positions resolve to an inclusive, ordered, clamped
//! sample-index range. Every region-scoped operation takes a `Region`, so a
//! degenerate or out-of-bounds range can only be produced by bypassing the
//! validating constructors.

use serde::{Deserialize, Serialize};

use super::types::{AnalysisError, AnalysisResult};

/// An inclusive sample-index range `[start, end]` within one sweep buffer.
///
/// Invariant: `start < end` (never degenerate) and both ends were clamped to
/// the buffer the region was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    start: usize,
    end: usize,
}

impl Region {
    /// Resolve two cursor time positions into a region.
    ///
    /// Each cursor converts to the nearest sample via `round(t * rate)`,
    /// clamped to `[0, buffer_len - 1]`; the pair is then ordered. Fails
    /// with `InvalidRegion` when either cursor is absent (disabled in the
    /// caller's UI) or when the resolved range is degenerate.
    pub fn resolve(
        cursor1_secs: Option<f64>,
        cursor2_secs: Option<f64>,
        sample_rate: f64,
        buffer_len: usize,
    ) -> AnalysisResult<Region> {
        let t1 = cursor1_secs
            .ok_or_else(|| AnalysisError::InvalidRegion("cursor 1 is not set".into()))?;
        let t2 = cursor2_secs
            .ok_or_else(|| AnalysisError::InvalidRegion("cursor 2 is not set".into()))?;

        if sample_rate <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        if buffer_len == 0 {
            return Err(AnalysisError::InvalidRegion("buffer is empty".into()));
        }

        let idx1 = time_to_index(t1, sample_rate, buffer_len);
        let idx2 = time_to_index(t2, sample_rate, buffer_len);

        Region::new(idx1.min(idx2), idx1.max(idx2), buffer_len)
    }

    /// Build a region directly from sample indices (ordered, clamped).
    ///
    /// Fails with `InvalidRegion` when the range is degenerate or extends
    /// past the buffer.
    pub fn new(start: usize, end: usize, buffer_len: usize) -> AnalysisResult<Region> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        if end >= buffer_len {
            return Err(AnalysisError::InvalidRegion(format!(
                "region end {end} is outside the buffer (length {buffer_len})"
            )));
        }
        if start == end {
            return Err(AnalysisError::InvalidRegion(format!(
                "region is degenerate (both cursors resolve to sample {start})"
            )));
        }
        Ok(Region { start, end })
    }

    /// First sample index (inclusive).
    pub fn start(&self) -> usize {
        self.start
    }

    /// Last sample index (inclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of samples covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Regions are never empty; this exists for clippy's benefit.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether this region shares any sample with `other`.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The covered slice of `buffer`.
    ///
    /// Fails with `InvalidRegion` if the region was resolved against a
    /// different (shorter) buffer.
    pub fn slice<'a>(&self, buffer: &'a [f64]) -> AnalysisResult<&'a [f64]> {
        if self.end >= buffer.len() {
            return Err(AnalysisError::InvalidRegion(format!(
                "region [{}, {}] is outside the buffer (length {})",
                self.start,
                self.end,
                buffer.len()
            )));
        }
        Ok(&buffer[self.start..=self.end])
    }
}

/// Convert a time position to the nearest sample index, clamped to the buffer.
fn time_to_index(time_secs: f64, sample_rate: f64, buffer_len: usize) -> usize {
    let idx = (time_secs * sample_rate).round();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(buffer_len - 1)
    }
}
