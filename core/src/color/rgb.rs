use serde::{Deserialize, Serialize};
use std::fmt;

/// 8-bit RGB triple, stored in layouts as a `[r, g, b]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Largest absolute per-channel difference to `other`.
    pub fn max_channel_delta(&self, other: &Rgb) -> u8 {
        self.r
            .abs_diff(other.r)
            .max(self.g.abs_diff(other.g))
            .max(self.b.abs_diff(other.b))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(color: Rgb) -> Self {
        [color.r, color.g, color.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

/// Chebyshev distance between two colors over the RGB cube.
///
/// A missing color on either side is infinitely far away, so comparing a
/// reading against an uncaptured baseline always counts as changed.
pub fn color_difference(a: Option<Rgb>, b: Option<Rgb>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => f64::from(a.max_channel_delta(&b)),
        _ => f64::INFINITY,
    }
}

/// Display string for a swatch; black when nothing has been captured.
pub fn rgb_to_hex(color: Option<Rgb>) -> String {
    color.map_or_else(|| "#000000".to_string(), |c| c.to_hex())
}
