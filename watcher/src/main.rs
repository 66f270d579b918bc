use anyhow::Context;
use audio::{default_playback, AudioService};
use bridge::status::{default_bind_address, StatusBridge};
use clap::Parser;
use log::{info, warn};
use pixelcore::area::AreaRegistry;
use pixelcore::color::ColorSampler;
use pixelcore::settings::SettingsStore;
use scenario::{ScenarioConfig, ScenarioPlayer};
use std::path::PathBuf;
use std::sync::Arc;
use workflow::config::{resolve_layout, WatchConfig};
use workflow::runner::Runner;

mod audio;
mod bridge;
mod scenario;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Sound an alert when watched screen pixels change color")]
struct Args {
    /// Layout JSON to monitor (defaults to the last loaded layout)
    #[arg(long)]
    layout: Option<PathBuf>,
    /// Settings file remembering the last loaded layout
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Load watcher options from YAML instead of the flags below
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,
    /// Stop after this many ticks instead of waiting for Ctrl+C
    #[arg(long)]
    ticks: Option<u32>,
    #[arg(long, default_value_t = 2)]
    workers: usize,
    /// Directory that relative sound paths are resolved against
    #[arg(long)]
    sounds_dir: Option<PathBuf>,
    /// Replay a YAML scenario against a virtual screen instead of the desktop
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Write the loaded layout to this path before monitoring
    #[arg(long)]
    save_as: Option<PathBuf>,
    /// Serve the latest readings on http://127.0.0.1:9000/status
    #[arg(long, default_value_t = false)]
    serve: bool,
}

#[cfg(feature = "capture")]
fn live_sampler() -> anyhow::Result<Arc<dyn ColorSampler>> {
    Ok(Arc::new(pixelcore::color::ScreenSampler::new()))
}

#[cfg(not(feature = "capture"))]
fn live_sampler() -> anyhow::Result<Arc<dyn ColorSampler>> {
    anyhow::bail!("built without the `capture` feature; pass --scenario to replay a scripted screen")
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let watch_config = if let Some(path) = args.config {
        WatchConfig::load(path)?
    } else {
        WatchConfig::from_args(args.interval_ms, args.ticks, args.workers, args.sounds_dir)
    };

    let settings = match args.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::in_working_dir()?,
    };
    let layout = resolve_layout(args.layout, &settings)
        .context("no --layout given and no last loaded layout recorded")?;

    let registry = AreaRegistry::new();
    let count = registry
        .load_from(&layout)
        .with_context(|| format!("loading layout {}", layout.display()))?;
    if let Err(err) = settings.update_last_loaded_file(&layout) {
        warn!("{}", err);
    }
    info!("{} area(s) loaded from {}", count, layout.display());

    if let Some(target) = args.save_as {
        let saved = registry
            .save_to(&target)
            .with_context(|| format!("saving layout {}", target.display()))?;
        println!("Saved {} area(s) to {}", saved, target.display());
    }

    let runner = Runner::new(watch_config.clone());
    let scenario = args.scenario.map(ScenarioConfig::load).transpose()?;
    let mut player = scenario.as_ref().map(ScenarioPlayer::new);
    let sampler: Arc<dyn ColorSampler> = match &player {
        Some(player) => player.screen(),
        None => live_sampler()?,
    };

    let monitor = runner.build_monitor(sampler);
    let bridge = StatusBridge::new(monitor.stats());
    if args.serve {
        bridge.serve(default_bind_address());
    }
    let (audio, audio_sink) = AudioService::spawn(
        watch_config.workers,
        watch_config.queue,
        watch_config.sounds_dir.clone(),
        default_playback(),
    );
    let sink = (bridge.sink(), audio_sink);

    match (scenario, player.as_mut()) {
        (Some(scenario), Some(player)) => {
            if let Some(description) = scenario.description.as_deref() {
                bridge.publish_status(description);
            }
            info!("replaying {} tick(s)", scenario.tick_count());
            let summary = runner.replay(&monitor, &registry, &scenario, player, &sink)?;
            drop(sink);
            audio.join();

            println!(
                "Replay -> ticks {}, samples {}, capture failures {}, alerts {}",
                summary.ticks,
                summary.stats.samples,
                summary.stats.capture_failures,
                summary.stats.alerts
            );
            for (area, alerts) in &summary.alerts {
                println!("  area {}: {} alert(s)", area, alerts);
            }
        }
        _ => {
            bridge.publish_status("Monitoring all areas (Ctrl+C to stop)...");
            runner.run_live(&monitor, &registry, sink)?;
            bridge.publish_status("Stopped");
        }
    }

    Ok(())
}
