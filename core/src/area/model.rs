use crate::color::Rgb;
use crate::prelude::{AreaId, ScreenPoint};
use log::debug;
use std::num::IntErrorKind;
use std::path::PathBuf;

pub const DEFAULT_THRESHOLD: u8 = 30;
pub const DEFAULT_VOLUME: u8 = 50;

/// User-editable 0..=100 setting kept as the text the user typed.
///
/// The text is parsed at the moment of use so edits apply on the next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    raw: String,
}

impl Level {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed value clamped to `0..=100`, or `fallback` when the text is not an integer.
    ///
    /// Integers beyond `i64` still clamp to the nearest bound.
    pub fn value_or(&self, fallback: u8) -> u8 {
        match self.raw.trim().parse::<i64>() {
            Ok(value) => value.clamp(0, 100) as u8,
            Err(err) if *err.kind() == IntErrorKind::PosOverflow => 100,
            Err(err) if *err.kind() == IntErrorKind::NegOverflow => 0,
            Err(err) => {
                debug!("unparsable level {:?} ({}), using {}", self.raw, err, fallback);
                fallback
            }
        }
    }
}

impl From<&str> for Level {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<u8> for Level {
    fn from(value: u8) -> Self {
        Self::new(value.to_string())
    }
}

/// One independently configured monitoring region.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    pub id: AreaId,
    /// Primary pixel ("A").
    pub coordinates: Option<ScreenPoint>,
    /// Condition pixel ("B").
    pub coordinates_condition: Option<ScreenPoint>,
    pub baseline_color: Option<Rgb>,
    pub condition_color: Option<Rgb>,
    pub threshold: Level,
    pub volume: Level,
    pub sound_file: Option<PathBuf>,
    pub use_condition: bool,
    /// Debounce latch: set when an alert fires, cleared once the pixel is back
    /// within threshold. Only the monitor loop writes it.
    pub color_changed: bool,
}

impl Area {
    pub fn new(id: AreaId) -> Self {
        Self {
            id,
            coordinates: None,
            coordinates_condition: None,
            baseline_color: None,
            condition_color: None,
            threshold: Level::from(DEFAULT_THRESHOLD),
            volume: Level::from(DEFAULT_VOLUME),
            sound_file: None,
            use_condition: false,
            color_changed: false,
        }
    }

    pub fn threshold_value(&self) -> u8 {
        self.threshold.value_or(DEFAULT_THRESHOLD)
    }

    pub fn volume_value(&self) -> u8 {
        self.volume.value_or(DEFAULT_VOLUME)
    }

    /// First setting that keeps this area from being monitored, if any.
    pub fn missing_setting(&self) -> Option<&'static str> {
        if self.coordinates.is_none() {
            return Some("select coordinates first");
        }
        if self.sound_file.is_none() {
            return Some("select a sound file first");
        }
        if self.baseline_color.is_none() {
            return Some("capture the baseline color first");
        }
        if self.use_condition {
            if self.coordinates_condition.is_none() {
                return Some("condition enabled but pixel B is not selected");
            }
            if self.condition_color.is_none() {
                return Some("condition enabled but pixel B color is not captured");
            }
        }
        None
    }

    pub fn is_eligible(&self) -> bool {
        self.missing_setting().is_none()
    }
}
