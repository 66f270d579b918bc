use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Session-unique identity of a monitored area.
pub type AreaId = u32;

/// Absolute screen coordinate, stored in layouts as a `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for ScreenPoint {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<ScreenPoint> for [i32; 2] {
    fn from(point: ScreenPoint) -> Self {
        [point.x, point.y]
    }
}

impl fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{} Y:{}", self.x, self.y)
    }
}

/// Common error type for the monitoring core.
#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    #[error("pixel capture failed at {point}: {reason}")]
    Capture { point: ScreenPoint, reason: String },
    #[error("failed to load layout {}: {reason}", path.display())]
    ConfigLoad { path: PathBuf, reason: String },
    #[error("failed to save layout {}: {reason}", path.display())]
    ConfigSave { path: PathBuf, reason: String },
    #[error("cannot remove the last area")]
    LastArea,
    #[error("unknown area {0}")]
    UnknownArea(AreaId),
    #[error("area {area}: {missing}")]
    MissingSetting { area: AreaId, missing: &'static str },
    #[error("settings store {}: {reason}", path.display())]
    Settings { path: PathBuf, reason: String },
}

pub type MonitorResult<T> = Result<T, MonitorError>;
