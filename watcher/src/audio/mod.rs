//! Alert sound playback, kept off the monitor thread.
//!
//! The monitor hands each alert to a bounded queue drained by a small pool of
//! worker threads, so a slow decoder or device never delays sampling.

mod playback;
mod service;

#[cfg(feature = "audio")]
pub use playback::RodioPlayback;
pub use playback::{default_playback, volume_gain, LogPlayback, Playback};
pub use service::{AlertRequest, AudioService, AudioSink};
