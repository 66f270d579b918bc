pub mod rgb;
pub mod sampler;
pub mod virtual_screen;

pub use rgb::{color_difference, rgb_to_hex, Rgb};
pub use sampler::{sample_color_at, ColorSampler};
#[cfg(feature = "capture")]
pub use sampler::ScreenSampler;
pub use virtual_screen::VirtualScreen;
