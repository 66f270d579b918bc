use crate::color::{ColorSampler, Rgb};
use crate::prelude::{MonitorError, MonitorResult, ScreenPoint};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// In-memory screen that answers samples from painted pixels.
///
/// Unpainted coordinates fail like an off-screen capture. Used for scripted
/// replays and for exercising the monitor without a desktop.
#[derive(Debug, Default)]
pub struct VirtualScreen {
    pixels: Mutex<HashMap<ScreenPoint, Rgb>>,
}

impl VirtualScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paint(&self, point: ScreenPoint, color: Rgb) {
        self.pixels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(point, color);
    }

    /// Makes subsequent reads of `point` fail.
    pub fn blank(&self, point: ScreenPoint) {
        self.pixels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&point);
    }
}

impl ColorSampler for VirtualScreen {
    fn sample(&self, point: ScreenPoint) -> MonitorResult<Rgb> {
        self.pixels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&point)
            .copied()
            .ok_or_else(|| MonitorError::Capture {
                point,
                reason: "coordinate is off-screen".into(),
            })
    }
}
