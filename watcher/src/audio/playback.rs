use super::service::AlertRequest;
use log::info;
use std::sync::Arc;

/// Plays one alert to completion; called from an audio worker thread.
pub trait Playback: Send + Sync {
    fn play(&self, request: &AlertRequest) -> anyhow::Result<()>;
}

/// Linear amplitude for a 0..=100 volume, `None` when muted.
///
/// Full volume plays the file unchanged; lower settings attenuate by
/// `20 * (v - 1)` dB with `v` in 0..=1, so 50 comes out at -10 dB.
pub fn volume_gain(volume: u8) -> Option<f32> {
    if volume == 0 {
        return None;
    }
    let level = f32::from(volume.min(100)) / 100.0;
    Some(10f32.powf(level - 1.0))
}

/// Stand-in used when the crate is built without the `audio` feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPlayback;

impl Playback for LogPlayback {
    fn play(&self, request: &AlertRequest) -> anyhow::Result<()> {
        info!(
            "[ALERT] area {} -> {} (volume {})",
            request.area,
            request.path.display(),
            request.volume
        );
        Ok(())
    }
}

#[cfg(feature = "audio")]
pub use device::RodioPlayback;

#[cfg(feature = "audio")]
mod device {
    use super::{volume_gain, AlertRequest, Playback};
    use anyhow::Context;
    use rodio::{Decoder, OutputStream, Sink};
    use std::fs::File;
    use std::io::BufReader;

    /// Plays WAV/MP3/OGG files on the default output device.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct RodioPlayback;

    impl Playback for RodioPlayback {
        fn play(&self, request: &AlertRequest) -> anyhow::Result<()> {
            let Some(gain) = volume_gain(request.volume) else {
                return Ok(());
            };
            let (_stream, stream_handle) =
                OutputStream::try_default().context("opening default audio output")?;
            let file = File::open(&request.path)
                .with_context(|| format!("opening {}", request.path.display()))?;
            let source = Decoder::new(BufReader::new(file))
                .with_context(|| format!("decoding {}", request.path.display()))?;
            let sink = Sink::try_new(&stream_handle).context("creating playback sink")?;

            sink.set_volume(gain);
            sink.append(source);
            sink.sleep_until_end();
            Ok(())
        }
    }
}

#[cfg(feature = "audio")]
pub fn default_playback() -> Arc<dyn Playback> {
    Arc::new(RodioPlayback)
}

#[cfg(not(feature = "audio"))]
pub fn default_playback() -> Arc<dyn Playback> {
    Arc::new(LogPlayback)
}
