use anyhow::Context;
use pixelcore::color::{Rgb, VirtualScreen};
use pixelcore::ScreenPoint;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Scripted screen for offline runs.
///
/// Frames apply in order; a painted pixel keeps its color until a later frame
/// changes it. A `null` color makes the pixel unreadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub description: Option<String>,
    pub seed: u64,
    /// Maximum per-channel noise added to every pixel on every tick.
    pub jitter: u8,
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Ticks this frame is held for.
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    #[serde(default)]
    pub pixels: Vec<PixelPaint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixelPaint {
    pub at: ScreenPoint,
    pub color: Option<Rgb>,
}

fn default_repeat() -> u32 {
    1
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            description: None,
            seed: 0,
            jitter: 0,
            frames: Vec::new(),
        }
    }
}

impl ScenarioConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario {}", path_ref.display()))?;
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn tick_count(&self) -> usize {
        self.frames.iter().map(|frame| frame.repeat as usize).sum()
    }
}

/// Drives a [`VirtualScreen`] through a scenario, one tick at a time.
pub struct ScenarioPlayer {
    screen: Arc<VirtualScreen>,
    pixels: BTreeMap<(i32, i32), Option<Rgb>>,
    jitter: u8,
    rng: StdRng,
}

impl ScenarioPlayer {
    pub fn new(config: &ScenarioConfig) -> Self {
        Self {
            screen: Arc::new(VirtualScreen::new()),
            pixels: BTreeMap::new(),
            jitter: config.jitter,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    pub fn screen(&self) -> Arc<VirtualScreen> {
        self.screen.clone()
    }

    pub fn apply(&mut self, frame: &Frame) {
        for paint in &frame.pixels {
            self.pixels.insert((paint.at.x, paint.at.y), paint.color);
        }
    }

    /// Repaints the screen for the next tick, adding fresh noise.
    pub fn refresh(&mut self) {
        for (&(x, y), color) in &self.pixels {
            let point = ScreenPoint::new(x, y);
            match color {
                Some(color) => {
                    let noisy = jittered(&mut self.rng, *color, self.jitter);
                    self.screen.paint(point, noisy);
                }
                None => self.screen.blank(point),
            }
        }
    }
}

fn jittered(rng: &mut StdRng, color: Rgb, jitter: u8) -> Rgb {
    if jitter == 0 {
        return color;
    }
    let spread = i16::from(jitter);
    let mut channel = |value: u8| {
        let shifted = i16::from(value) + rng.gen_range(-spread..=spread);
        shifted.clamp(0, 255) as u8
    };
    Rgb::new(channel(color.r), channel(color.g), channel(color.b))
}
