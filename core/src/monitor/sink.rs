use crate::area::Area;
use crate::color::Rgb;
use crate::prelude::AreaId;
use std::sync::Arc;

/// Receiver of monitor side effects.
///
/// Both callbacks run on the monitor thread and must return quickly; slow work
/// such as audio playback has to be handed off.
pub trait MonitorSink: Send {
    /// Fresh reading of an area's primary pixel, sent every successful sample.
    fn on_update(&self, area: AreaId, color: Rgb);

    /// Alert for an area that just left its baseline.
    fn on_fire(&self, area: &Area);
}

impl<T: MonitorSink + Sync + ?Sized> MonitorSink for Arc<T> {
    fn on_update(&self, area: AreaId, color: Rgb) {
        (**self).on_update(area, color)
    }

    fn on_fire(&self, area: &Area) {
        (**self).on_fire(area)
    }
}

impl<A: MonitorSink, B: MonitorSink> MonitorSink for (A, B) {
    fn on_update(&self, area: AreaId, color: Rgb) {
        self.0.on_update(area, color);
        self.1.on_update(area, color);
    }

    fn on_fire(&self, area: &Area) {
        self.0.on_fire(area);
        self.1.on_fire(area);
    }
}

/// Sink built from a pair of closures.
pub struct FnSink<U, F> {
    update: U,
    fire: F,
}

impl<U, F> FnSink<U, F>
where
    U: Fn(AreaId, Rgb) + Send,
    F: Fn(&Area) + Send,
{
    pub fn new(update: U, fire: F) -> Self {
        Self { update, fire }
    }
}

impl<U, F> MonitorSink for FnSink<U, F>
where
    U: Fn(AreaId, Rgb) + Send,
    F: Fn(&Area) + Send,
{
    fn on_update(&self, area: AreaId, color: Rgb) {
        (self.update)(area, color)
    }

    fn on_fire(&self, area: &Area) {
        (self.fire)(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn paired_sinks_both_receive_callbacks() {
        let updates = Arc::new(AtomicUsize::new(0));
        let fires = Arc::new(AtomicUsize::new(0));
        let make = || {
            let updates = updates.clone();
            let fires = fires.clone();
            FnSink::new(
                move |_, _| {
                    updates.fetch_add(1, Ordering::SeqCst);
                },
                move |_| {
                    fires.fetch_add(1, Ordering::SeqCst);
                },
            )
        };
        let sink = (make(), make());
        sink.on_update(0, Rgb::new(1, 1, 1));
        sink.on_fire(&Area::new(0));
        assert_eq!(updates.load(Ordering::SeqCst), 2);
        assert_eq!(fires.load(Ordering::SeqCst), 2);
    }
}
