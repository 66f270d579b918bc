use crate::color::Rgb;
use crate::prelude::{MonitorResult, ScreenPoint};
use log::debug;

/// Reads the live color of a single screen coordinate.
///
/// Implementations must not cache: every call is a fresh read.
pub trait ColorSampler: Send + Sync {
    fn sample(&self, point: ScreenPoint) -> MonitorResult<Rgb>;
}

impl<T: ColorSampler + ?Sized> ColorSampler for std::sync::Arc<T> {
    fn sample(&self, point: ScreenPoint) -> MonitorResult<Rgb> {
        (**self).sample(point)
    }
}

/// Best-effort read used by the monitor loop.
///
/// Capture failures are logged at debug level and collapse to `None`; an
/// absent point is simply `None`. The monitor loop reads the primary pixel
/// itself so it can warn once per failing area.
pub fn sample_color_at(sampler: &dyn ColorSampler, point: Option<ScreenPoint>) -> Option<Rgb> {
    let point = point?;
    match sampler.sample(point) {
        Ok(color) => Some(color),
        Err(err) => {
            debug!("{}", err);
            None
        }
    }
}

#[cfg(feature = "capture")]
pub use screen::ScreenSampler;

#[cfg(feature = "capture")]
mod screen {
    use super::ColorSampler;
    use crate::color::Rgb;
    use crate::prelude::{MonitorError, MonitorResult, ScreenPoint};
    use xcap::Monitor;

    /// Samples the real desktop through a 1x1 region capture.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct ScreenSampler;

    impl ScreenSampler {
        pub fn new() -> Self {
            Self
        }
    }

    impl ColorSampler for ScreenSampler {
        fn sample(&self, point: ScreenPoint) -> MonitorResult<Rgb> {
            let fail = |reason: String| MonitorError::Capture { point, reason };

            let monitor = Monitor::from_point(point.x, point.y).map_err(|e| fail(e.to_string()))?;
            let left = monitor.x().map_err(|e| fail(e.to_string()))?;
            let top = monitor.y().map_err(|e| fail(e.to_string()))?;
            let offset_x = u32::try_from(point.x - left).map_err(|e| fail(e.to_string()))?;
            let offset_y = u32::try_from(point.y - top).map_err(|e| fail(e.to_string()))?;

            let image = monitor
                .capture_region(offset_x, offset_y, 1, 1)
                .map_err(|e| fail(e.to_string()))?;
            let pixel = image
                .get_pixel_checked(0, 0)
                .ok_or_else(|| fail("empty capture".into()))?;

            // Alpha is dropped.
            Ok(Rgb::new(pixel[0], pixel[1], pixel[2]))
        }
    }
}
