pub mod model;
pub mod status;

pub use model::{AreaStatus, StatusModel};
pub use status::{DisplaySink, StatusBridge};
