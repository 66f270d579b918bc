use pixelcore::area::Area;
use pixelcore::color::Rgb;
use pixelcore::monitor::MonitorSink;
use pixelcore::AreaId;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::playback::Playback;

/// Sound to play for one fired area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRequest {
    pub area: AreaId,
    pub path: PathBuf,
    pub volume: u8,
}

/// Fixed pool of playback workers fed by a bounded queue.
pub struct AudioService {
    workers: Vec<JoinHandle<()>>,
}

/// Monitor-side handle; enqueues alerts without ever blocking.
#[derive(Clone)]
pub struct AudioSink {
    tx: mpsc::Sender<AlertRequest>,
    sounds_dir: Option<PathBuf>,
}

impl AudioService {
    /// Spawns `workers` threads (at least one) sharing a queue of `queue` pending alerts.
    pub fn spawn(
        workers: usize,
        queue: usize,
        sounds_dir: Option<PathBuf>,
        playback: Arc<dyn Playback>,
    ) -> (Self, AudioSink) {
        let (tx, rx) = mpsc::channel(queue.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..workers.max(1))
            .filter_map(|index| {
                let rx = rx.clone();
                let playback = playback.clone();
                thread::Builder::new()
                    .name(format!("alert-audio-{}", index))
                    .spawn(move || worker_loop(rx, playback))
                    .map_err(|err| warn!("failed to spawn audio worker {}: {}", index, err))
                    .ok()
            })
            .collect();

        (Self { workers }, AudioSink { tx, sounds_dir })
    }

    /// Waits for queued alerts to finish; returns once every sink is dropped.
    pub fn join(self) {
        for worker in self.workers {
            if worker.join().is_err() {
                warn!("audio worker panicked");
            }
        }
    }
}

fn worker_loop(rx: Arc<Mutex<mpsc::Receiver<AlertRequest>>>, playback: Arc<dyn Playback>) {
    loop {
        let next = rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .blocking_recv();
        let Some(request) = next else {
            break;
        };
        if let Err(err) = playback.play(&request) {
            warn!(
                "area {}: could not play {}: {:#}",
                request.area,
                request.path.display(),
                err
            );
        }
    }
}

impl AudioSink {
    fn resolve(&self, sound: &Path) -> PathBuf {
        match &self.sounds_dir {
            Some(dir) if sound.is_relative() => dir.join(sound),
            _ => sound.to_path_buf(),
        }
    }
}

impl MonitorSink for AudioSink {
    fn on_update(&self, _area: AreaId, _color: Rgb) {}

    fn on_fire(&self, area: &Area) {
        let Some(sound) = area.sound_file.as_deref() else {
            debug!("area {} has no sound file", area.id);
            return;
        };
        let volume = area.volume_value();
        if volume == 0 {
            debug!("area {} is muted", area.id);
            return;
        }

        let request = AlertRequest {
            area: area.id,
            path: self.resolve(sound),
            volume,
        };
        match self.tx.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(request)) => {
                warn!("alert queue full, dropping sound for area {}", request.area)
            }
            Err(TrySendError::Closed(request)) => {
                warn!("audio workers stopped, dropping sound for area {}", request.area)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingPlayback {
        played: Mutex<Vec<AlertRequest>>,
    }

    impl Playback for RecordingPlayback {
        fn play(&self, request: &AlertRequest) -> anyhow::Result<()> {
            self.played.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    /// Blocks the single worker until released.
    struct GatedPlayback {
        gate: Mutex<std_mpsc::Receiver<()>>,
    }

    impl Playback for GatedPlayback {
        fn play(&self, _request: &AlertRequest) -> anyhow::Result<()> {
            let _ = self.gate.lock().unwrap().recv_timeout(Duration::from_secs(5));
            Ok(())
        }
    }

    fn area_with_sound(id: AreaId, sound: Option<&str>, volume: &str) -> Area {
        let mut area = Area::new(id);
        area.sound_file = sound.map(PathBuf::from);
        area.volume = volume.into();
        area
    }

    #[test]
    fn fired_alerts_reach_playback_with_resolved_path() {
        let playback = Arc::new(RecordingPlayback::default());
        let (service, sink) =
            AudioService::spawn(2, 8, Some(PathBuf::from("sounds")), playback.clone());

        sink.on_fire(&area_with_sound(3, Some("ding.wav"), "70"));
        drop(sink);
        service.join();

        let played = playback.played.lock().unwrap();
        assert_eq!(
            *played,
            vec![AlertRequest {
                area: 3,
                path: PathBuf::from("sounds").join("ding.wav"),
                volume: 70,
            }]
        );
    }

    #[test]
    fn muted_and_silent_areas_are_not_queued() {
        let playback = Arc::new(RecordingPlayback::default());
        let (service, sink) = AudioService::spawn(1, 8, None, playback.clone());

        sink.on_fire(&area_with_sound(0, None, "50"));
        sink.on_fire(&area_with_sound(1, Some("a.wav"), "0"));
        sink.on_fire(&area_with_sound(2, Some("b.wav"), "loud"));
        drop(sink);
        service.join();

        let played = playback.played.lock().unwrap();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].area, 2);
        assert_eq!(played[0].volume, 50);
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (release, gate) = std_mpsc::channel();
        let playback = Arc::new(GatedPlayback {
            gate: Mutex::new(gate),
        });
        let (service, sink) = AudioService::spawn(1, 1, None, playback);

        let area = area_with_sound(0, Some("a.wav"), "50");
        for _ in 0..10 {
            sink.on_fire(&area);
        }
        drop(sink);
        for _ in 0..10 {
            let _ = release.send(());
        }
        service.join();
    }
}
