//! Core of the PixelWatch alerting tool.
//!
//! Samples single screen pixels, compares them against captured baselines and
//! raises alerts through a sink when an area's color leaves its threshold.
//! Window layout, dialogs and widgets live outside this crate; they drive the
//! [`area::AreaRegistry`] and consume [`monitor::MonitorSink`] callbacks.

pub mod area;
pub mod color;
pub mod layout;
pub mod monitor;
pub mod prelude;
pub mod settings;
pub mod telemetry;

pub use prelude::{AreaId, MonitorError, MonitorResult, ScreenPoint};
