//! Append-only ledger of cursor measurements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cursor-pair measurement on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Insertion order within the session (0-based).
    pub sequence: usize,
    /// Channel the values were read from.
    pub channel: usize,
    /// Cursor 1 time position in seconds.
    pub time1_secs: f64,
    /// Sample value under cursor 1.
    pub value1: f64,
    /// Cursor 2 time position in seconds.
    pub time2_secs: f64,
    /// Sample value under cursor 2.
    pub value2: f64,
    /// time2 - time1.
    pub delta_time_secs: f64,
    /// value2 - value1.
    pub delta_value: f64,
    /// delta_value / delta_time (0 when the cursors share a time position).
    pub slope: f64,
    /// Wall-clock insertion time.
    pub recorded_at: DateTime<Utc>,
}

/// Append-only store of measurements.
///
/// Entries are never mutated or individually removed; [`clear`] exists only
/// for the full session reset on file reload.
///
/// [`clear`]: MeasurementLedger::clear
#[derive(Debug, Default)]
pub struct MeasurementLedger {
    entries: Vec<Measurement>,
}

impl MeasurementLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a measurement between two cursor points on one channel.
    pub fn add(
        &mut self,
        channel: usize,
        time1_secs: f64,
        value1: f64,
        time2_secs: f64,
        value2: f64,
    ) -> &Measurement {
        let delta_time_secs = time2_secs - time1_secs;
        let delta_value = value2 - value1;
        let slope = if delta_time_secs != 0.0 {
            delta_value / delta_time_secs
        } else {
            0.0
        };

        self.entries.push(Measurement {
            sequence: self.entries.len(),
            channel,
            time1_secs,
            value1,
            time2_secs,
            value2,
            delta_time_secs,
            delta_value,
            slope,
            recorded_at: Utc::now(),
        });
        self.entries.last().expect("entry was just pushed")
    }

    /// All recorded measurements in insertion order.
    pub fn entries(&self) -> &[Measurement] {
        &self.entries
    }

    /// Number of recorded measurements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all measurements. Only valid as part of a full session reset.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_computes_deltas_and_slope() {
        let mut ledger = MeasurementLedger::new();
        let m = ledger.add(0, 0.1, -0.25, 0.3, -0.05);

        assert_eq!(m.sequence, 0);
        assert!((m.delta_time_secs - 0.2).abs() < 1e-12);
        assert!((m.delta_value - 0.2).abs() < 1e-12);
        assert!((m.slope - 1.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_cursors_have_zero_slope() {
        let mut ledger = MeasurementLedger::new();
        let m = ledger.add(0, 0.1, 1.0, 0.1, 2.0);
        assert_eq!(m.slope, 0.0);
    }

    #[test]
    fn entries_keep_insertion_order() {
        let mut ledger = MeasurementLedger::new();
        ledger.add(0, 0.0, 0.0, 0.1, 1.0);
        ledger.add(1, 0.0, 0.0, 0.2, 2.0);
        ledger.add(0, 0.0, 0.0, 0.3, 3.0);

        let sequences: Vec<usize> = ledger.entries().iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[test]
    fn clear_resets_the_ledger() {
        let mut ledger = MeasurementLedger::new();
        ledger.add(0, 0.0, 0.0, 0.1, 1.0);
        assert_eq!(ledger.len(), 1);
        ledger.clear();
        assert!(ledger.is_empty());
        // Sequence numbering restarts after a full reset.
        assert_eq!(ledger.add(0, 0.0, 0.0, 0.1, 1.0).sequence, 0);
    }
}
