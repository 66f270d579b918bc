pub mod metrics;

pub use metrics::{MonitorStats, StatsSnapshot};
