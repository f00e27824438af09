//! Session state: loaded sweeps, per-channel filter history, measurements.
//!
//! The analysis functions in [`crate::analysis`] are stateless; everything
//! that persists between calls lives here. A [`Session`] corresponds to one
//! loaded file: it owns the original sample buffers, the working (filtered)
//! buffer and cumulative [`FilterState`] per (sweep, channel), and the
//! measurement ledger. Loading a new file means dropping the session, which
//! invalidates every derived record at once.
//!
//! Each channel's state sits behind its own `RwLock`, so filter application
//! is serialized against effective-buffer reads of the same channel while
//! detection on other channels or sweeps proceeds concurrently.

mod filter_state;
mod ledger;
mod sweep;

pub use filter_state::{FilterDescriptor, FilterKind, FilterState};
pub use ledger::{Measurement, MeasurementLedger};
pub use sweep::Sweep;

use std::collections::BTreeMap;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::analysis::{
    self, blocks, inserts, peaks, statistics, AnalysisError, AnalysisResult, Block, BlockConfig,
    InsertCandidate, Peak, PeakConfig, Region, StatisticsRecord,
};

/// Which channels a filter call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSelection {
    /// A single channel by index.
    One(usize),
    /// Every channel of the sweep.
    Both,
}

/// Scope of a filter application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterScope {
    /// Filter the entire sweep buffer.
    WholeTrace,
    /// Filter only the samples between the two cursors.
    BetweenCursors {
        /// Cursor 1 time position in seconds.
        cursor1_secs: f64,
        /// Cursor 2 time position in seconds.
        cursor2_secs: f64,
    },
}

/// Per-channel mutable state: the pristine buffer, the working buffer with
/// all filters applied, and the filter history that derives one from the
/// other.
#[derive(Debug)]
struct ChannelState {
    original: Vec<f64>,
    working: Vec<f64>,
    filters: FilterState,
}

/// One loaded sweep with its per-channel filter state.
#[derive(Debug)]
pub struct SweepState {
    /// Index of this sweep within its file.
    pub sweep_index: usize,
    sample_rate: f64,
    channels: Vec<RwLock<ChannelState>>,
}

impl SweepState {
    fn from_sweep(sweep: Sweep) -> Self {
        let sweep_index = sweep.sweep_index;
        let sample_rate = sweep.sample_rate;
        let channels = sweep
            .into_channels()
            .into_iter()
            .map(|original| {
                RwLock::new(ChannelState {
                    working: original.clone(),
                    original,
                    filters: FilterState::new(),
                })
            })
            .collect();
        Self {
            sweep_index,
            sample_rate,
            channels,
        }
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].read().original.len()
    }

    /// Sweep states are never empty; this exists for clippy's benefit.
    pub fn is_empty(&self) -> bool {
        false
    }

    fn channel(&self, channel: usize) -> AnalysisResult<&RwLock<ChannelState>> {
        self.channels.get(channel).ok_or_else(|| {
            AnalysisError::InvalidParameter(format!(
                "channel {channel} not available (sweep has {})",
                self.channels.len()
            ))
        })
    }

    fn selected_channels(&self, selection: ChannelSelection) -> AnalysisResult<Vec<usize>> {
        match selection {
            ChannelSelection::One(channel) => {
                self.channel(channel)?;
                Ok(vec![channel])
            }
            ChannelSelection::Both => Ok((0..self.channels.len()).collect()),
        }
    }
}

/// Analysis session for one loaded file.
#[derive(Debug)]
pub struct Session {
    sample_rate: f64,
    sweeps: BTreeMap<usize, SweepState>,
    ledger: Mutex<MeasurementLedger>,
}

impl Session {
    /// Create an empty session for a file with the given sample rate.
    pub fn new(sample_rate: f64) -> AnalysisResult<Self> {
        if sample_rate <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        Ok(Self {
            sample_rate,
            sweeps: BTreeMap::new(),
            ledger: Mutex::new(MeasurementLedger::new()),
        })
    }

    /// The file's sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Load (or reload) one sweep.
    ///
    /// Reloading an already-present sweep index replaces its buffers and
    /// discards its filter history, matching the sweep lifecycle: derived
    /// analysis state does not survive a reload.
    pub fn load_sweep(&mut self, sweep: Sweep) -> AnalysisResult<()> {
        if (sweep.sample_rate - self.sample_rate).abs() > f64::EPSILON {
            return Err(AnalysisError::InvalidParameter(format!(
                "sweep sample rate {} Hz does not match the session's {} Hz",
                sweep.sample_rate, self.sample_rate
            )));
        }
        let index = sweep.sweep_index;
        self.sweeps.insert(index, SweepState::from_sweep(sweep));
        debug!(sweep_index = index, "sweep loaded");
        Ok(())
    }

    /// Full session reset: drops every sweep, filter history, and the
    /// measurement ledger. Call before loading a different file.
    pub fn clear(&mut self) {
        self.sweeps.clear();
        self.ledger.lock().clear();
        debug!("session cleared");
    }

    /// Indices of the loaded sweeps, ascending.
    pub fn sweep_indices(&self) -> Vec<usize> {
        self.sweeps.keys().copied().collect()
    }

    fn sweep(&self, sweep_index: usize) -> AnalysisResult<&SweepState> {
        self.sweeps.get(&sweep_index).ok_or_else(|| {
            AnalysisError::InvalidParameter(format!("sweep {sweep_index} is not loaded"))
        })
    }

    /// Resolve two cursor time positions into a region of one sweep.
    pub fn resolve_region(
        &self,
        sweep_index: usize,
        cursor1_secs: Option<f64>,
        cursor2_secs: Option<f64>,
    ) -> AnalysisResult<Region> {
        let len = self.sweep(sweep_index)?.len();
        Region::resolve(cursor1_secs, cursor2_secs, self.sample_rate, len)
    }

    /// Apply a filter to the selected channels of one sweep.
    ///
    /// The filter is validated before anything mutates; a rejected call
    /// leaves every channel's working buffer and history untouched.
    pub fn apply_filter(
        &self,
        sweep_index: usize,
        selection: ChannelSelection,
        kind: FilterKind,
        scope: FilterScope,
    ) -> AnalysisResult<()> {
        let sweep = self.sweep(sweep_index)?;
        let region = match scope {
            FilterScope::WholeTrace => None,
            FilterScope::BetweenCursors {
                cursor1_secs,
                cursor2_secs,
            } => Some(Region::resolve(
                Some(cursor1_secs),
                Some(cursor2_secs),
                self.sample_rate,
                sweep.len(),
            )?),
        };
        let descriptor = FilterDescriptor { kind, region };

        for channel in sweep.selected_channels(selection)? {
            let mut state = sweep.channel(channel)?.write();
            let ChannelState {
                working, filters, ..
            } = &mut *state;
            filters.apply(working, self.sample_rate, descriptor)?;
        }
        Ok(())
    }

    /// The effective (filtered) buffer of one channel, as a copy.
    pub fn effective_buffer(
        &self,
        sweep_index: usize,
        channel: usize,
    ) -> AnalysisResult<Vec<f64>> {
        let sweep = self.sweep(sweep_index)?;
        Ok(sweep.channel(channel)?.read().working.clone())
    }

    /// The filter descriptors applied to one channel, in order.
    pub fn filter_history(
        &self,
        sweep_index: usize,
        channel: usize,
    ) -> AnalysisResult<Vec<FilterDescriptor>> {
        let sweep = self.sweep(sweep_index)?;
        Ok(sweep.channel(channel)?.read().filters.descriptors().to_vec())
    }

    /// Descriptive statistics over a region of the effective buffer.
    pub fn statistics(
        &self,
        sweep_index: usize,
        channel: usize,
        region: &Region,
    ) -> AnalysisResult<StatisticsRecord> {
        let sweep = self.sweep(sweep_index)?;
        let state = sweep.channel(channel)?.read();
        statistics::compute(&state.working, region)
    }

    /// Peak/trough detection over a region of the effective buffer.
    pub fn detect_peaks(
        &self,
        sweep_index: usize,
        channel: usize,
        region: &Region,
        config: &PeakConfig,
    ) -> AnalysisResult<Vec<Peak>> {
        let sweep = self.sweep(sweep_index)?;
        let state = sweep.channel(channel)?.read();
        peaks::detect(&state.working, region, self.sample_rate, config)
    }

    /// Block detection over a region of the effective buffer.
    pub fn detect_blocks(
        &self,
        sweep_index: usize,
        channel: usize,
        region: &Region,
        config: &BlockConfig,
    ) -> AnalysisResult<Vec<Block>> {
        let sweep = self.sweep(sweep_index)?;
        let state = sweep.channel(channel)?.read();
        blocks::detect(
            &state.working,
            region,
            self.sample_rate,
            sweep_index,
            channel,
            config,
        )
    }

    /// Block detection over the full trace of every loaded sweep, collected
    /// in sweep order.
    pub fn detect_blocks_all_sweeps(
        &self,
        channel: usize,
        config: &BlockConfig,
    ) -> AnalysisResult<Vec<Block>> {
        let mut all = Vec::new();
        for (&sweep_index, sweep) in &self.sweeps {
            let region = Region::new(0, sweep.len() - 1, sweep.len())?;
            let state = sweep.channel(channel)?.read();
            all.extend(blocks::detect(
                &state.working,
                &region,
                self.sample_rate,
                sweep_index,
                channel,
                config,
            )?);
        }
        Ok(all)
    }

    /// Insert detection across every loaded sweep: each sweep's response
    /// window is compared against its baseline window and the candidate is
    /// reported whether or not it exceeded the threshold.
    pub fn detect_inserts(
        &self,
        channel: usize,
        baseline_region: &Region,
        response_region: &Region,
        threshold: f64,
    ) -> AnalysisResult<Vec<InsertCandidate>> {
        let mut candidates = Vec::new();
        for (&sweep_index, sweep) in &self.sweeps {
            let state = sweep.channel(channel)?.read();
            candidates.push(inserts::compare_windows(
                &state.working,
                baseline_region,
                response_region,
                threshold,
                sweep_index,
            )?);
        }
        Ok(candidates)
    }

    /// Record a cursor-pair measurement for every channel of one sweep.
    ///
    /// Values are read from the effective buffers at the sample nearest
    /// each cursor. Returns the new ledger entries in channel order.
    pub fn add_measurement(
        &self,
        sweep_index: usize,
        cursor1_secs: f64,
        cursor2_secs: f64,
    ) -> AnalysisResult<Vec<Measurement>> {
        let sweep = self.sweep(sweep_index)?;
        let len = sweep.len();
        let idx1 = nearest_sample(cursor1_secs, self.sample_rate, len);
        let idx2 = nearest_sample(cursor2_secs, self.sample_rate, len);

        let mut ledger = self.ledger.lock();
        let mut added = Vec::with_capacity(sweep.channel_count());
        for channel in 0..sweep.channel_count() {
            let state = sweep.channel(channel)?.read();
            let entry = ledger.add(
                channel,
                cursor1_secs,
                state.working[idx1],
                cursor2_secs,
                state.working[idx2],
            );
            added.push(entry.clone());
        }
        Ok(added)
    }

    /// All recorded measurements in insertion order.
    pub fn measurements(&self) -> Vec<Measurement> {
        self.ledger.lock().entries().to_vec()
    }

    /// Resolve a block-detection baseline against one channel's effective
    /// buffer (used by callers that want to preview the auto estimate).
    pub fn resolve_baseline(
        &self,
        sweep_index: usize,
        channel: usize,
        region: &Region,
        mode: analysis::BaselineMode,
    ) -> AnalysisResult<f64> {
        let sweep = self.sweep(sweep_index)?;
        let state = sweep.channel(channel)?.read();
        blocks::resolve_baseline(&state.working, region, self.sample_rate, mode)
    }
}

/// Nearest sample index for a time position, clamped to the buffer.
fn nearest_sample(time_secs: f64, sample_rate: f64, buffer_len: usize) -> usize {
    let idx = (time_secs * sample_rate).round();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(buffer_len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const RATE: f64 = 10_000.0;

    fn session_with_sweep(samples: Vec<f64>) -> Session {
        let mut session = Session::new(RATE).unwrap();
        session
            .load_sweep(Sweep::new(0, RATE, vec![samples.clone(), samples]).unwrap())
            .unwrap();
        session
    }

    fn noisy_trace() -> Vec<f64> {
        (0..2_000)
            .map(|i| {
                let t = i as f64 / RATE;
                (2.0 * PI * 100.0 * t).sin() + 0.3 * (2.0 * PI * 3_000.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn filter_mutates_only_selected_channel() {
        let session = session_with_sweep(noisy_trace());
        session
            .apply_filter(
                0,
                ChannelSelection::One(0),
                FilterKind::GaussianLowPass { cutoff_hz: 500.0 },
                FilterScope::WholeTrace,
            )
            .unwrap();

        let ch0 = session.effective_buffer(0, 0).unwrap();
        let ch1 = session.effective_buffer(0, 1).unwrap();
        assert_ne!(ch0, ch1);
        assert_eq!(session.filter_history(0, 0).unwrap().len(), 1);
        assert!(session.filter_history(0, 1).unwrap().is_empty());
    }

    #[test]
    fn both_channels_selection_filters_everything() {
        let session = session_with_sweep(noisy_trace());
        session
            .apply_filter(
                0,
                ChannelSelection::Both,
                FilterKind::GaussianLowPass { cutoff_hz: 500.0 },
                FilterScope::WholeTrace,
            )
            .unwrap();
        assert_eq!(session.filter_history(0, 0).unwrap().len(), 1);
        assert_eq!(session.filter_history(0, 1).unwrap().len(), 1);
    }

    #[test]
    fn rejected_filter_does_not_touch_state() {
        let trace = noisy_trace();
        let session = session_with_sweep(trace.clone());
        let err = session
            .apply_filter(
                0,
                ChannelSelection::Both,
                FilterKind::GaussianLowPass { cutoff_hz: RATE },
                FilterScope::WholeTrace,
            )
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter(_)));
        assert_eq!(session.effective_buffer(0, 0).unwrap(), trace);
        assert!(session.filter_history(0, 0).unwrap().is_empty());
    }

    #[test]
    fn between_cursors_scope_filters_only_the_region() {
        let trace = noisy_trace();
        let session = session_with_sweep(trace.clone());
        session
            .apply_filter(
                0,
                ChannelSelection::One(0),
                FilterKind::GaussianLowPass { cutoff_hz: 500.0 },
                FilterScope::BetweenCursors {
                    cursor1_secs: 0.05,
                    cursor2_secs: 0.15,
                },
            )
            .unwrap();
        let filtered = session.effective_buffer(0, 0).unwrap();
        assert_eq!(filtered[..500], trace[..500]);
        assert_ne!(filtered[500..1_500], trace[500..1_500]);
        assert_eq!(filtered[1_501..], trace[1_501..]);
    }

    #[test]
    fn reloading_a_sweep_discards_its_filters() {
        let trace = noisy_trace();
        let mut session = session_with_sweep(trace.clone());
        session
            .apply_filter(
                0,
                ChannelSelection::Both,
                FilterKind::GaussianLowPass { cutoff_hz: 500.0 },
                FilterScope::WholeTrace,
            )
            .unwrap();
        assert_ne!(session.effective_buffer(0, 0).unwrap(), trace);

        session
            .load_sweep(Sweep::new(0, RATE, vec![trace.clone(), trace.clone()]).unwrap())
            .unwrap();
        assert_eq!(session.effective_buffer(0, 0).unwrap(), trace);
        assert!(session.filter_history(0, 0).unwrap().is_empty());
    }

    #[test]
    fn sample_rate_mismatch_is_rejected() {
        let mut session = Session::new(RATE).unwrap();
        let sweep = Sweep::new(0, 20_000.0, vec![vec![0.0; 100]]).unwrap();
        assert!(session.load_sweep(sweep).is_err());
    }

    #[test]
    fn detection_reads_the_effective_buffer() {
        // A 3 kHz ripple turns the trace into a comb of tiny local extrema;
        // after low-pass filtering only the 100 Hz structure remains.
        let session = session_with_sweep(noisy_trace());
        let region = session.resolve_region(0, Some(0.02), Some(0.18)).unwrap();
        let config = PeakConfig {
            min_height: Some(0.5),
            min_distance: 10,
            min_prominence: None,
        };

        let before = session.detect_peaks(0, 0, &region, &config).unwrap();
        session
            .apply_filter(
                0,
                ChannelSelection::One(0),
                FilterKind::GaussianLowPass { cutoff_hz: 500.0 },
                FilterScope::WholeTrace,
            )
            .unwrap();
        let after = session.detect_peaks(0, 0, &region, &config).unwrap();

        assert!(after.len() <= before.len());
        assert!(!after.is_empty());
    }

    #[test]
    fn measurements_cover_all_channels_and_clear_with_session() {
        let mut trace = vec![0.0; 1_000];
        trace[100] = 1.5;
        let mut session = Session::new(RATE).unwrap();
        session
            .load_sweep(Sweep::new(0, RATE, vec![trace.clone(), vec![2.0; 1_000]]).unwrap())
            .unwrap();

        let added = session.add_measurement(0, 0.01, 0.05).unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0].value1, 1.5);
        assert_eq!(added[1].value1, 2.0);
        assert_eq!(session.measurements().len(), 2);

        session.clear();
        assert!(session.measurements().is_empty());
        assert!(session.sweep_indices().is_empty());
    }

    #[test]
    fn inserts_scan_sweeps_in_order() {
        let mut session = Session::new(RATE).unwrap();
        let quiet = vec![0.0; 1_000];
        let mut active = vec![0.0; 1_000];
        for value in &mut active[150..180] {
            *value = 2.0;
        }
        session
            .load_sweep(Sweep::new(0, RATE, vec![quiet.clone()]).unwrap())
            .unwrap();
        session
            .load_sweep(Sweep::new(1, RATE, vec![active]).unwrap())
            .unwrap();
        session
            .load_sweep(Sweep::new(2, RATE, vec![quiet]).unwrap())
            .unwrap();

        let baseline = Region::new(0, 99, 1_000).unwrap();
        let response = Region::new(100, 199, 1_000).unwrap();
        let candidates = session
            .detect_inserts(0, &baseline, &response, 1.0)
            .unwrap();

        assert_eq!(candidates.len(), 3);
        let flagged: Vec<usize> = candidates
            .iter()
            .filter(|c| c.is_event)
            .map(|c| c.sweep_index)
            .collect();
        assert_eq!(flagged, vec![1]);
    }

    #[test]
    fn blocks_across_sweeps_carry_their_sweep_index() {
        let mut session = Session::new(RATE).unwrap();
        let baseline_trace = vec![-0.25; 1_000];
        let mut blocked = vec![-0.25; 1_000];
        for value in &mut blocked[400..600] {
            *value = -0.05;
        }
        session
            .load_sweep(Sweep::new(0, RATE, vec![baseline_trace]).unwrap())
            .unwrap();
        session
            .load_sweep(Sweep::new(1, RATE, vec![blocked]).unwrap())
            .unwrap();

        let config = BlockConfig {
            baseline: analysis::BaselineMode::Manual(-0.25),
            threshold_factor: 2.0,
            min_block_duration_secs: 0.001,
        };
        let blocks = session.detect_blocks_all_sweeps(0, &config).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].sweep_index, 1);
    }
}
