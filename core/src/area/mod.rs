pub mod model;
pub mod registry;

pub use model::{Area, Level, DEFAULT_THRESHOLD, DEFAULT_VOLUME};
pub use registry::AreaRegistry;
