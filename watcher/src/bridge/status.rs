use crate::bridge::model::StatusModel;
use log::{debug, info, warn};
use pixelcore::area::Area;
use pixelcore::color::Rgb;
use pixelcore::monitor::MonitorSink;
use pixelcore::telemetry::MonitorStats;
use pixelcore::AreaId;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use tokio::runtime::Builder;
use warp::Filter;

pub fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

/// Holds the latest display state and optionally serves it over HTTP.
#[derive(Clone)]
pub struct StatusBridge {
    state: Arc<RwLock<StatusModel>>,
    stats: Arc<MonitorStats>,
}

/// Display side of the monitor: records every reading and alert.
pub struct DisplaySink {
    state: Arc<RwLock<StatusModel>>,
}

impl StatusBridge {
    pub fn new(stats: Arc<MonitorStats>) -> Self {
        Self {
            state: Arc::new(RwLock::new(StatusModel::new())),
            stats,
        }
    }

    pub fn sink(&self) -> DisplaySink {
        DisplaySink {
            state: self.state.clone(),
        }
    }

    pub fn snapshot(&self) -> StatusModel {
        let mut model = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        model.stats = self.stats.snapshot();
        model
    }

    pub fn publish_status(&self, message: &str) {
        info!("[STATUS] {}", message);
    }

    /// Serves `GET /status` on a dedicated thread.
    pub fn serve(&self, address: SocketAddr) {
        let bridge = self.clone();
        let bridge_filter = warp::any().map(move || bridge.clone());
        let status_route = warp::path("status")
            .and(warp::get())
            .and(bridge_filter)
            .map(|bridge: StatusBridge| warp::reply::json(&bridge.snapshot()));

        let spawned = thread::Builder::new()
            .name("status-bridge".into())
            .spawn(move || {
                let runtime = match Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        warn!("status bridge runtime failed: {}", err);
                        return;
                    }
                };
                runtime.block_on(async move {
                    warp::serve(status_route).run(address).await;
                });
            });
        match spawned {
            Ok(_) => info!("status bridge listening on http://{}/status", address),
            Err(err) => warn!("failed to start status bridge: {}", err),
        }
    }
}

impl MonitorSink for DisplaySink {
    fn on_update(&self, area: AreaId, color: Rgb) {
        debug!("area {} RGB:{} {}", area, color, color.to_hex());
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .record_color(area, color);
    }

    fn on_fire(&self, area: &Area) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .record_alert(area.id);
    }
}
