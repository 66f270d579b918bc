pub mod engine;
pub mod evaluate;
pub mod sink;

pub use engine::{PixelMonitor, TickReport, DEFAULT_TICK_INTERVAL};
pub use evaluate::{condition_met, judge, Verdict};
pub use sink::{FnSink, MonitorSink};
