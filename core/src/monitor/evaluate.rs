use crate::area::Area;
use crate::color::{color_difference, sample_color_at, ColorSampler, Rgb};

/// Outcome of one area's threshold check within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Within threshold with nothing latched.
    Steady,
    /// Still outside threshold after an alert already fired.
    Holding,
    /// Fresh excursion, but the condition pixel did not match.
    Suppressed,
    /// Fresh excursion that raises an alert.
    Fire,
    /// Back within threshold; the latch is released.
    Rearm,
}

/// Classifies a fresh primary reading against the area's baseline and latch.
pub fn judge(sampler: &dyn ColorSampler, area: &Area, current: Rgb) -> Verdict {
    let threshold = area.threshold_value();
    let diff = color_difference(Some(current), area.baseline_color);

    if diff > f64::from(threshold) {
        if area.color_changed {
            Verdict::Holding
        } else if condition_met(sampler, area, threshold) {
            Verdict::Fire
        } else {
            Verdict::Suppressed
        }
    } else if area.color_changed {
        Verdict::Rearm
    } else {
        Verdict::Steady
    }
}

/// Gate for a fresh excursion.
///
/// Always open without condition mode. With it, pixel B must be configured,
/// readable, and within the same threshold as pixel A of its captured color.
pub fn condition_met(sampler: &dyn ColorSampler, area: &Area, threshold: u8) -> bool {
    if !area.use_condition {
        return true;
    }
    let (Some(point), Some(expected)) = (area.coordinates_condition, area.condition_color) else {
        return false;
    };
    match sample_color_at(sampler, Some(point)) {
        Some(seen) => color_difference(Some(seen), Some(expected)) <= f64::from(threshold),
        None => false,
    }
}
