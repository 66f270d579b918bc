use crate::area::{Area, AreaRegistry};
use crate::color::ColorSampler;
use crate::monitor::evaluate::{judge, Verdict};
use crate::monitor::sink::MonitorSink;
use crate::prelude::{AreaId, MonitorError};
use crate::telemetry::MonitorStats;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// 20 Hz polling.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// What happened to each area during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub sampled: Vec<AreaId>,
    pub skipped: Vec<AreaId>,
    pub fired: Vec<AreaId>,
}

/// Areas whose primary pixel is currently unreadable. Only the first failure
/// of a run is a warning.
#[derive(Default)]
struct CaptureFailures {
    areas: Mutex<HashSet<AreaId>>,
}

impl CaptureFailures {
    fn failed(&self, id: AreaId, err: &MonitorError) {
        let first = match self.areas.lock() {
            Ok(mut areas) => areas.insert(id),
            Err(_) => true,
        };
        if first {
            warn!("area {}: {}", id, err);
        } else {
            debug!("area {}: {}", id, err);
        }
    }

    fn recovered(&self, id: AreaId) {
        let was_failing = match self.areas.lock() {
            Ok(mut areas) => areas.remove(&id),
            Err(_) => false,
        };
        if was_failing {
            info!("area {} readable again", id);
        }
    }
}

/// Coordinates, sound file and baseline are all set. Condition inputs are
/// checked by the evaluation, where a gap suppresses firing instead.
fn monitorable(area: &Area) -> bool {
    area.coordinates.is_some() && area.sound_file.is_some() && area.baseline_color.is_some()
}

/// Polls every area's primary pixel on a background thread and raises alerts.
///
/// `stop` only clears a flag; the thread notices it between areas or at the
/// next tick boundary and exits without touching the registry again.
pub struct PixelMonitor {
    sampler: Arc<dyn ColorSampler>,
    interval: Duration,
    running: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    stats: Arc<MonitorStats>,
    failures: Arc<CaptureFailures>,
}

impl PixelMonitor {
    pub fn new(sampler: Arc<dyn ColorSampler>) -> Self {
        Self {
            sampler,
            interval: DEFAULT_TICK_INTERVAL,
            running: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            stats: Arc::new(MonitorStats::new()),
            failures: Arc::new(CaptureFailures::default()),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> Arc<MonitorStats> {
        self.stats.clone()
    }

    /// Starts polling `registry`. Returns `false` and changes nothing when
    /// already running; otherwise clears every latch first.
    pub fn start<S>(&self, registry: &AreaRegistry, sink: S) -> bool
    where
        S: MonitorSink + 'static,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("monitor already running, start ignored");
            return false;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let epoch = registry.reset_latches();
        let worker = Worker {
            sampler: self.sampler.clone(),
            registry: registry.clone(),
            stats: self.stats.clone(),
            failures: self.failures.clone(),
            running: self.running.clone(),
            generation_counter: self.generation.clone(),
            generation,
            epoch,
        };
        let interval = self.interval;

        let spawned = thread::Builder::new()
            .name("pixel-monitor".into())
            .spawn(move || worker.run(&sink, interval));
        if let Err(err) = spawned {
            warn!("failed to spawn monitor thread: {}", err);
            self.running.store(false, Ordering::SeqCst);
            return false;
        }

        info!(
            "monitoring {} area(s) every {:?}",
            registry.len(),
            interval
        );
        true
    }

    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("monitoring stopped");
        }
    }

    /// Runs a single tick on the calling thread.
    pub fn tick(&self, registry: &AreaRegistry, sink: &dyn MonitorSink) -> TickReport {
        let epoch = registry.latch_epoch();
        run_tick(
            self.sampler.as_ref(),
            registry,
            sink,
            &self.stats,
            &self.failures,
            epoch,
            &|| true,
        )
    }
}

impl Drop for PixelMonitor {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

struct Worker {
    sampler: Arc<dyn ColorSampler>,
    registry: AreaRegistry,
    stats: Arc<MonitorStats>,
    failures: Arc<CaptureFailures>,
    running: Arc<AtomicBool>,
    generation_counter: Arc<AtomicU64>,
    generation: u64,
    epoch: u64,
}

impl Worker {
    fn active(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self.generation_counter.load(Ordering::SeqCst) == self.generation
    }

    fn run(self, sink: &dyn MonitorSink, interval: Duration) {
        let active = || self.active();
        while active() {
            run_tick(
                self.sampler.as_ref(),
                &self.registry,
                sink,
                &self.stats,
                &self.failures,
                self.epoch,
                &active,
            );
            thread::sleep(interval);
        }
        debug!("monitor thread {} exiting", self.generation);
    }
}

fn run_tick(
    sampler: &dyn ColorSampler,
    registry: &AreaRegistry,
    sink: &dyn MonitorSink,
    stats: &MonitorStats,
    failures: &CaptureFailures,
    epoch: u64,
    active: &dyn Fn() -> bool,
) -> TickReport {
    let mut report = TickReport::default();

    for area in registry.snapshot() {
        if !active() {
            return report;
        }

        let Some(point) = area.coordinates.filter(|_| monitorable(&area)) else {
            report.skipped.push(area.id);
            continue;
        };
        let current = match sampler.sample(point) {
            Ok(color) => {
                failures.recovered(area.id);
                color
            }
            Err(err) => {
                failures.failed(area.id, &err);
                stats.record_capture_failure();
                report.skipped.push(area.id);
                continue;
            }
        };
        stats.record_sample();
        report.sampled.push(area.id);
        sink.on_update(area.id, current);

        match judge(sampler, &area, current) {
            Verdict::Fire => {
                if registry.commit_latch(area.id, true, epoch) {
                    let mut fired = area;
                    fired.color_changed = true;
                    stats.record_alert();
                    info!(
                        "area {} changed to {} (baseline {:?}), alert raised",
                        fired.id, current, fired.baseline_color
                    );
                    sink.on_fire(&fired);
                    report.fired.push(fired.id);
                }
            }
            Verdict::Rearm => {
                if registry.commit_latch(area.id, false, epoch) {
                    debug!("area {} back within threshold", area.id);
                }
            }
            Verdict::Suppressed => {
                debug!("area {} changed but condition pixel did not match", area.id);
            }
            Verdict::Steady | Verdict::Holding => {}
        }
    }

    stats.record_tick();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Rgb, VirtualScreen};
    use crate::prelude::ScreenPoint;
    use std::time::Instant;

    const A: ScreenPoint = ScreenPoint::new(10, 10);
    const B: ScreenPoint = ScreenPoint::new(20, 20);

    #[derive(Default)]
    struct Recorder {
        updates: Mutex<Vec<(AreaId, Rgb)>>,
        fires: Mutex<Vec<Area>>,
    }

    impl Recorder {
        fn fire_count(&self) -> usize {
            self.fires.lock().unwrap().len()
        }

        fn update_count(&self) -> usize {
            self.updates.lock().unwrap().len()
        }
    }

    impl MonitorSink for Recorder {
        fn on_update(&self, area: AreaId, color: Rgb) {
            self.updates.lock().unwrap().push((area, color));
        }

        fn on_fire(&self, area: &Area) {
            self.fires.lock().unwrap().push(area.clone());
        }
    }

    fn setup(threshold: &str) -> (Arc<VirtualScreen>, AreaRegistry, PixelMonitor) {
        let screen = Arc::new(VirtualScreen::new());
        let registry = AreaRegistry::new();
        registry.set_coordinates(0, A).unwrap();
        registry.set_sound_file(0, "alert.wav").unwrap();
        registry.set_threshold_text(0, threshold).unwrap();
        registry
            .update(0, |area| area.baseline_color = Some(Rgb::new(100, 100, 100)))
            .unwrap();
        let monitor = PixelMonitor::new(screen.clone());
        (screen, registry, monitor)
    }

    fn add_ready_area(registry: &AreaRegistry, point: ScreenPoint) -> AreaId {
        let id = registry.add_area();
        registry.set_coordinates(id, point).unwrap();
        registry.set_sound_file(id, "alert.wav").unwrap();
        registry
            .update(id, |area| area.baseline_color = Some(Rgb::new(100, 100, 100)))
            .unwrap();
        id
    }

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(3);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn latch_fires_once_per_excursion() {
        let (screen, registry, monitor) = setup("30");
        let sink = Recorder::default();

        screen.paint(A, Rgb::new(140, 100, 100));
        assert_eq!(monitor.tick(&registry, &sink).fired, vec![0]);
        assert!(registry.get(0).unwrap().color_changed);

        assert!(monitor.tick(&registry, &sink).fired.is_empty());

        screen.paint(A, Rgb::new(100, 100, 100));
        monitor.tick(&registry, &sink);
        assert!(!registry.get(0).unwrap().color_changed);

        screen.paint(A, Rgb::new(140, 100, 100));
        assert_eq!(monitor.tick(&registry, &sink).fired, vec![0]);
        assert_eq!(sink.fire_count(), 2);
        assert_eq!(sink.update_count(), 4);
    }

    #[test]
    fn fired_area_carries_sound_settings() {
        let (screen, registry, monitor) = setup("30");
        registry.set_volume_text(0, "80").unwrap();
        let sink = Recorder::default();

        screen.paint(A, Rgb::new(0, 0, 0));
        monitor.tick(&registry, &sink);

        let fires = sink.fires.lock().unwrap();
        assert_eq!(fires.len(), 1);
        assert!(fires[0].color_changed);
        assert_eq!(fires[0].volume_value(), 80);
        assert_eq!(
            fires[0].sound_file.as_deref(),
            Some(std::path::Path::new("alert.wav"))
        );
    }

    #[test]
    fn condition_pixel_gates_firing() {
        let (screen, registry, monitor) = setup("10");
        registry.set_use_condition(0, true).unwrap();
        registry.set_condition_coordinates(0, B).unwrap();
        registry
            .update(0, |area| area.condition_color = Some(Rgb::new(0, 0, 0)))
            .unwrap();
        let sink = Recorder::default();

        screen.paint(A, Rgb::new(140, 100, 100));
        screen.paint(B, Rgb::new(50, 50, 50));
        assert!(monitor.tick(&registry, &sink).fired.is_empty());
        assert!(!registry.get(0).unwrap().color_changed);

        screen.paint(B, Rgb::new(5, 5, 5));
        assert_eq!(monitor.tick(&registry, &sink).fired, vec![0]);
    }

    #[test]
    fn unreadable_condition_pixel_suppresses_without_stopping() {
        let (screen, registry, monitor) = setup("10");
        registry.set_use_condition(0, true).unwrap();
        registry.set_condition_coordinates(0, B).unwrap();
        registry
            .update(0, |area| area.condition_color = Some(Rgb::new(0, 0, 0)))
            .unwrap();
        let sink = Recorder::default();

        screen.paint(A, Rgb::new(140, 100, 100));
        let report = monitor.tick(&registry, &sink);
        assert!(report.fired.is_empty());
        assert_eq!(report.sampled, vec![0]);
    }

    #[test]
    fn primary_capture_failure_skips_area() {
        let (_screen, registry, monitor) = setup("30");
        let sink = Recorder::default();

        let report = monitor.tick(&registry, &sink);
        assert_eq!(report.skipped, vec![0]);
        assert_eq!(sink.update_count(), 0);
        assert_eq!(monitor.stats().snapshot().capture_failures, 1);
        assert_eq!(monitor.stats().snapshot().ticks, 1);
    }

    #[test]
    fn incomplete_areas_are_skipped_without_firing() {
        let screen = Arc::new(VirtualScreen::new());
        let registry = AreaRegistry::new();
        registry.set_coordinates(0, A).unwrap();
        screen.paint(A, Rgb::new(140, 100, 100));
        let monitor = PixelMonitor::new(screen.clone());
        let sink = Recorder::default();

        let report = monitor.tick(&registry, &sink);
        assert_eq!(report.skipped, vec![0]);
        assert!(report.fired.is_empty());
        assert_eq!(sink.update_count(), 0);
        assert!(!registry.get(0).unwrap().color_changed);

        // Sound file alone is not enough: the baseline is still missing.
        registry.set_sound_file(0, "alert.wav").unwrap();
        assert!(monitor.tick(&registry, &sink).fired.is_empty());
        assert_eq!(sink.fire_count(), 0);

        registry
            .update(0, |area| area.baseline_color = Some(Rgb::new(100, 100, 100)))
            .unwrap();
        assert_eq!(monitor.tick(&registry, &sink).fired, vec![0]);
    }

    #[test]
    fn missing_condition_inputs_suppress_instead_of_skipping() {
        let (screen, registry, monitor) = setup("30");
        registry.set_use_condition(0, true).unwrap();
        let sink = Recorder::default();

        screen.paint(A, Rgb::new(140, 100, 100));
        let report = monitor.tick(&registry, &sink);
        assert_eq!(report.sampled, vec![0]);
        assert!(report.fired.is_empty());
        assert_eq!(sink.update_count(), 1);
    }

    #[test]
    fn repeated_capture_failures_are_tracked_until_recovery() {
        let (screen, registry, monitor) = setup("30");
        let sink = Recorder::default();

        monitor.tick(&registry, &sink);
        monitor.tick(&registry, &sink);
        assert!(monitor.failures.areas.lock().unwrap().contains(&0));
        assert_eq!(monitor.stats().snapshot().capture_failures, 2);

        screen.paint(A, Rgb::new(100, 100, 100));
        assert_eq!(monitor.tick(&registry, &sink).sampled, vec![0]);
        assert!(monitor.failures.areas.lock().unwrap().is_empty());
    }

    #[test]
    fn areas_are_processed_in_list_order() {
        let (screen, registry, monitor) = setup("30");
        let c = ScreenPoint::new(30, 30);
        let second = add_ready_area(&registry, c);
        registry.remove_area(0).unwrap();
        let third = add_ready_area(&registry, A);
        screen.paint(A, Rgb::new(1, 1, 1));
        screen.paint(c, Rgb::new(2, 2, 2));

        let sink = Recorder::default();
        monitor.tick(&registry, &sink);
        let order: Vec<AreaId> = sink.updates.lock().unwrap().iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![second, third]);
    }

    #[test]
    fn threshold_edits_apply_on_next_tick() {
        let (screen, registry, monitor) = setup("50");
        let sink = Recorder::default();

        screen.paint(A, Rgb::new(140, 100, 100));
        assert!(monitor.tick(&registry, &sink).fired.is_empty());
        registry.set_threshold_text(0, "20").unwrap();
        assert_eq!(monitor.tick(&registry, &sink).fired, vec![0]);
    }

    #[test]
    fn background_loop_fires_and_stops() {
        let (screen, registry, monitor) = setup("30");
        let monitor = monitor.with_interval(Duration::from_millis(5));
        let sink = Arc::new(Recorder::default());
        screen.paint(A, Rgb::new(140, 100, 100));

        assert!(monitor.start(&registry, sink.clone()));
        assert!(monitor.is_running());
        assert!(wait_for(|| sink.fire_count() == 1));
        assert!(wait_for(|| sink.update_count() > 5));
        assert_eq!(sink.fire_count(), 1);

        monitor.stop();
        assert!(!monitor.is_running());
        thread::sleep(Duration::from_millis(50));
        let settled = sink.update_count();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(sink.update_count(), settled);
    }

    #[test]
    fn second_start_is_a_no_op() {
        let (screen, registry, monitor) = setup("30");
        let monitor = monitor.with_interval(Duration::from_millis(5));
        let sink = Arc::new(Recorder::default());
        screen.paint(A, Rgb::new(140, 100, 100));

        assert!(monitor.start(&registry, sink.clone()));
        assert!(wait_for(|| registry.get(0).unwrap().color_changed));
        assert!(!monitor.start(&registry, sink.clone()));
        assert!(registry.get(0).unwrap().color_changed);
        monitor.stop();
    }

    #[test]
    fn restart_resets_every_latch() {
        let (screen, registry, monitor) = setup("30");
        let monitor = monitor.with_interval(Duration::from_millis(5));
        let second = add_ready_area(&registry, B);
        registry
            .update(second, |area| area.baseline_color = Some(Rgb::new(0, 0, 0)))
            .unwrap();
        screen.paint(A, Rgb::new(140, 100, 100));
        screen.paint(B, Rgb::new(90, 0, 0));

        let sink = Recorder::default();
        monitor.tick(&registry, &sink);
        assert!(registry.snapshot().iter().all(|area| area.color_changed));

        monitor.stop();
        // Blank both pixels so the restarted loop cannot latch again.
        screen.blank(A);
        screen.blank(B);
        assert!(monitor.start(&registry, Recorder::default()));
        assert!(registry.snapshot().iter().all(|area| !area.color_changed));
        monitor.stop();
    }

    #[test]
    fn restart_after_stop_fires_again_for_persisting_change() {
        let (screen, registry, monitor) = setup("30");
        let monitor = monitor.with_interval(Duration::from_millis(5));
        let sink = Arc::new(Recorder::default());
        screen.paint(A, Rgb::new(140, 100, 100));

        assert!(monitor.start(&registry, sink.clone()));
        assert!(wait_for(|| sink.fire_count() == 1));
        monitor.stop();
        assert!(monitor.start(&registry, sink.clone()));
        assert!(wait_for(|| sink.fire_count() == 2));
        monitor.stop();
    }
}
