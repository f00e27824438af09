//! Configuration for the analysis engine.
//!
//! Settings are organized into logical sections that map to TOML/JSON
//! tables. Every field carries a serde default, so a partial config file
//! (or an empty one) deserializes into the same values as
//! [`Settings::default()`]. Detector parameter structs are built from the
//! matching section via `From` conversions.

mod settings;

pub use settings::{
    BlockSettings, FilterSettings, InsertSettings, PeakSettings, Settings,
};
