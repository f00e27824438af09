//! Settings struct with per-detector sections.
//!
//! Each section can be stored and updated independently; unknown or missing
//! fields fall back to their defaults so older config files keep loading.

use serde::{Deserialize, Serialize};

use crate::analysis::{BaselineMode, BlockConfig, PeakConfig};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Filter engine settings.
    #[serde(default)]
    pub filter: FilterSettings,

    /// Peak/trough detector settings.
    #[serde(default)]
    pub peaks: PeakSettings,

    /// Block detector settings.
    #[serde(default)]
    pub blocks: BlockSettings,

    /// Insert detector settings.
    #[serde(default)]
    pub inserts: InsertSettings,
}

/// Filter engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Default Gaussian low-pass cutoff in Hz.
    #[serde(default = "default_gaussian_cutoff_hz")]
    pub gaussian_cutoff_hz: f64,

    /// Default Butterworth filter order.
    #[serde(default = "default_butterworth_order")]
    pub butterworth_order: usize,
}

fn default_gaussian_cutoff_hz() -> f64 {
    1_000.0
}

fn default_butterworth_order() -> usize {
    4
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            gaussian_cutoff_hz: default_gaussian_cutoff_hz(),
            butterworth_order: default_butterworth_order(),
        }
    }
}

/// Peak/trough detector parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakSettings {
    /// Minimum absolute extremum amplitude; `None` disables the filter.
    #[serde(default)]
    pub min_height: Option<f64>,

    /// Minimum spacing between reported extrema, in samples.
    #[serde(default = "default_min_distance_samples")]
    pub min_distance_samples: usize,

    /// Minimum prominence; `None` disables the filter.
    #[serde(default)]
    pub min_prominence: Option<f64>,
}

fn default_min_distance_samples() -> usize {
    1
}

impl Default for PeakSettings {
    fn default() -> Self {
        Self {
            min_height: None,
            min_distance_samples: default_min_distance_samples(),
            min_prominence: None,
        }
    }
}

impl From<&PeakSettings> for PeakConfig {
    fn from(settings: &PeakSettings) -> Self {
        Self {
            min_height: settings.min_height,
            min_distance: settings.min_distance_samples,
            min_prominence: settings.min_prominence,
        }
    }
}

/// Block detector parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSettings {
    /// Manual baseline amplitude; `None` selects automatic estimation.
    #[serde(default)]
    pub baseline: Option<f64>,

    /// Threshold divisor; a higher factor widens the band of values
    /// counted as blocked.
    #[serde(default = "default_threshold_factor")]
    pub threshold_factor: f64,

    /// Minimum block duration in seconds.
    #[serde(default = "default_min_block_duration_secs")]
    pub min_block_duration_secs: f64,
}

fn default_threshold_factor() -> f64 {
    2.0
}

fn default_min_block_duration_secs() -> f64 {
    0.001
}

impl Default for BlockSettings {
    fn default() -> Self {
        Self {
            baseline: None,
            threshold_factor: default_threshold_factor(),
            min_block_duration_secs: default_min_block_duration_secs(),
        }
    }
}

impl From<&BlockSettings> for BlockConfig {
    fn from(settings: &BlockSettings) -> Self {
        Self {
            baseline: match settings.baseline {
                Some(value) => BaselineMode::Manual(value),
                None => BaselineMode::Auto,
            },
            threshold_factor: settings.threshold_factor,
            min_block_duration_secs: settings.min_block_duration_secs,
        }
    }
}

/// Insert detector parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertSettings {
    /// Standard-deviation multiple used when deriving the event threshold
    /// from baseline statistics.
    #[serde(default = "default_insert_threshold_factor")]
    pub threshold_factor: f64,
}

fn default_insert_threshold_factor() -> f64 {
    3.0
}

impl Default for InsertSettings {
    fn default() -> Self {
        Self {
            threshold_factor: default_insert_threshold_factor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_loads_with_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.filter.gaussian_cutoff_hz, 1_000.0);
        assert_eq!(settings.peaks.min_distance_samples, 1);
        assert_eq!(settings.blocks.threshold_factor, 2.0);
        assert_eq!(settings.inserts.threshold_factor, 3.0);
    }

    #[test]
    fn partial_section_keeps_other_fields_defaulted() {
        let json = r#"{"blocks": {"baseline": -0.25}}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.blocks.baseline, Some(-0.25));
        assert_eq!(settings.blocks.min_block_duration_secs, 0.001);
    }

    #[test]
    fn sections_convert_into_detector_configs() {
        let mut settings = Settings::default();
        settings.peaks.min_height = Some(0.5);
        settings.blocks.baseline = Some(-0.25);

        let peak_config = PeakConfig::from(&settings.peaks);
        assert_eq!(peak_config.min_height, Some(0.5));

        let block_config = BlockConfig::from(&settings.blocks);
        assert_eq!(block_config.baseline, BaselineMode::Manual(-0.25));

        let auto = BlockConfig::from(&BlockSettings::default());
        assert_eq!(auto.baseline, BaselineMode::Auto);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.filter.butterworth_order, settings.filter.butterworth_order);
    }
}
