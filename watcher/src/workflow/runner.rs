use crate::scenario::{ScenarioConfig, ScenarioPlayer};
use crate::workflow::config::WatchConfig;
use anyhow::Context;
use pixelcore::area::AreaRegistry;
use pixelcore::color::ColorSampler;
use pixelcore::monitor::{MonitorSink, PixelMonitor};
use pixelcore::telemetry::StatsSnapshot;
use pixelcore::AreaId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

/// Outcome of an offline scenario replay.
#[derive(Debug, Clone, Default)]
pub struct ReplaySummary {
    pub ticks: usize,
    pub alerts: BTreeMap<AreaId, usize>,
    pub stats: StatsSnapshot,
}

#[derive(Clone)]
pub struct Runner {
    config: WatchConfig,
}

impl Runner {
    pub fn new(config: WatchConfig) -> Self {
        Self { config }
    }

    pub fn build_monitor(&self, sampler: Arc<dyn ColorSampler>) -> PixelMonitor {
        PixelMonitor::new(sampler).with_interval(self.config.interval())
    }

    /// Ticks `monitor` synchronously through every scenario frame.
    ///
    /// `monitor` must sample the player's screen.
    pub fn replay(
        &self,
        monitor: &PixelMonitor,
        registry: &AreaRegistry,
        scenario: &ScenarioConfig,
        player: &mut ScenarioPlayer,
        sink: &dyn MonitorSink,
    ) -> anyhow::Result<ReplaySummary> {
        registry.check_ready().context("layout is not ready to monitor")?;

        let mut summary = ReplaySummary::default();
        for area in registry.ids() {
            summary.alerts.insert(area, 0);
        }

        for frame in &scenario.frames {
            player.apply(frame);
            for _ in 0..frame.repeat {
                player.refresh();
                let report = monitor.tick(registry, sink);
                for area in report.fired {
                    *summary.alerts.entry(area).or_default() += 1;
                }
                summary.ticks += 1;
            }
        }

        summary.stats = monitor.stats().snapshot();
        Ok(summary)
    }

    /// Monitors on the background thread until Ctrl+C or the configured tick count.
    pub fn run_live<S>(
        &self,
        monitor: &PixelMonitor,
        registry: &AreaRegistry,
        sink: S,
    ) -> anyhow::Result<()>
    where
        S: MonitorSink + 'static,
    {
        registry.check_ready().context("layout is not ready to monitor")?;
        let ticks_before = monitor.stats().snapshot().ticks;
        if !monitor.start(registry, sink) {
            anyhow::bail!("monitor could not be started");
        }

        let waited = match self.config.ticks {
            Some(ticks) => {
                let target = ticks_before + u64::from(ticks);
                while monitor.is_running() && monitor.stats().snapshot().ticks < target {
                    thread::sleep(monitor.interval());
                }
                Ok(())
            }
            None => TokioBuilder::new_current_thread()
                .enable_all()
                .build()
                .context("creating runtime for signal handling")
                .and_then(|runtime| {
                    runtime.block_on(async {
                        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")
                    })
                }),
        };

        monitor.stop();
        waited
    }
}
