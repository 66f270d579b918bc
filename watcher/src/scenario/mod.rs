pub mod script;

pub use script::{Frame, PixelPaint, ScenarioConfig, ScenarioPlayer};
