//! Flat JSON layout files.
//!
//! ```json
//! { "areas": [ { "coordinates": [10, 20], "threshold": "30", ... } ] }
//! ```
//! Threshold and volume are read as either strings or numbers and written
//! back as the text the user entered.

use crate::area::{Area, Level, DEFAULT_THRESHOLD, DEFAULT_VOLUME};
use crate::color::Rgb;
use crate::prelude::{AreaId, MonitorError, MonitorResult, ScreenPoint};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutFile {
    pub areas: Vec<AreaRecord>,
}

/// Persisted form of an [`Area`]; the latch and id are not stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaRecord {
    #[serde(default)]
    pub coordinates: Option<ScreenPoint>,
    #[serde(default)]
    pub coordinates_condition: Option<ScreenPoint>,
    #[serde(default)]
    pub sound_file: Option<String>,
    #[serde(default, deserialize_with = "level_text")]
    pub threshold: Option<String>,
    #[serde(default, deserialize_with = "level_text")]
    pub volume: Option<String>,
    #[serde(default)]
    pub baseline_color: Option<Rgb>,
    #[serde(default)]
    pub condition_color: Option<Rgb>,
    #[serde(default)]
    pub use_condition: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelValue {
    Text(String),
    Number(serde_json::Number),
}

fn level_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<LevelValue>::deserialize(deserializer)?.map(|value| match value {
            LevelValue::Text(text) => text,
            LevelValue::Number(number) => number.to_string(),
        }),
    )
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.is_empty())
}

impl AreaRecord {
    pub fn from_area(area: &Area) -> Self {
        Self {
            coordinates: area.coordinates,
            coordinates_condition: area.coordinates_condition,
            sound_file: area
                .sound_file
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned()),
            threshold: Some(area.threshold.raw().to_string()),
            volume: Some(area.volume.raw().to_string()),
            baseline_color: area.baseline_color,
            condition_color: area.condition_color,
            use_condition: area.use_condition,
        }
    }

    /// Builds a fresh area; empty threshold/volume/sound entries keep the defaults.
    pub fn into_area(self, id: AreaId) -> Area {
        let mut area = Area::new(id);
        area.coordinates = self.coordinates;
        area.coordinates_condition = self.coordinates_condition;
        area.sound_file = non_empty(self.sound_file).map(PathBuf::from);
        area.threshold = non_empty(self.threshold)
            .map(Level::new)
            .unwrap_or_else(|| Level::from(DEFAULT_THRESHOLD));
        area.volume = non_empty(self.volume)
            .map(Level::new)
            .unwrap_or_else(|| Level::from(DEFAULT_VOLUME));
        area.baseline_color = self.baseline_color;
        area.condition_color = self.condition_color;
        area.use_condition = self.use_condition;
        area
    }
}

impl LayoutFile {
    pub fn from_areas(areas: &[Area]) -> Self {
        Self {
            areas: areas.iter().map(AreaRecord::from_area).collect(),
        }
    }

    pub fn parse(contents: &str) -> Result<Self, String> {
        let layout: LayoutFile = serde_json::from_str(contents).map_err(|e| e.to_string())?;
        if layout.areas.is_empty() {
            return Err("layout contains no areas".into());
        }
        Ok(layout)
    }

    /// Areas numbered from zero in file order.
    pub fn into_areas(self) -> Vec<Area> {
        self.areas
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_area(index as AreaId))
            .collect()
    }

    /// Pretty-printed with a four-space indent.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

pub fn load_layout(path: impl AsRef<Path>) -> MonitorResult<Vec<Area>> {
    let path = path.as_ref();
    let fail = |reason: String| MonitorError::ConfigLoad {
        path: path.to_path_buf(),
        reason,
    };
    let contents = fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
    let layout = LayoutFile::parse(&contents).map_err(fail)?;
    Ok(layout.into_areas())
}

pub fn save_layout(path: impl AsRef<Path>, areas: &[Area]) -> MonitorResult<()> {
    let path = path.as_ref();
    let fail = |reason: String| MonitorError::ConfigSave {
        path: path.to_path_buf(),
        reason,
    };
    let json = LayoutFile::from_areas(areas)
        .to_json()
        .map_err(|e| fail(e.to_string()))?;
    fs::write(path, json).map_err(|e| fail(e.to_string()))
}
