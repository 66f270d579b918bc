use pixelcore::color::{rgb_to_hex, Rgb};
use pixelcore::telemetry::StatsSnapshot;
use pixelcore::AreaId;
use serde::Serialize;

/// Latest reading for one area as shown by the status endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AreaStatus {
    pub id: AreaId,
    pub rgb: Option<Rgb>,
    pub hex: String,
    pub alerts: u64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct StatusModel {
    pub areas: Vec<AreaStatus>,
    pub stats: StatsSnapshot,
}

impl StatusModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `id`, appended on first sight so order follows the monitor.
    pub fn entry_mut(&mut self, id: AreaId) -> &mut AreaStatus {
        let index = match self.areas.iter().position(|status| status.id == id) {
            Some(index) => index,
            None => {
                self.areas.push(AreaStatus {
                    id,
                    rgb: None,
                    hex: rgb_to_hex(None),
                    alerts: 0,
                });
                self.areas.len() - 1
            }
        };
        &mut self.areas[index]
    }

    pub fn record_color(&mut self, id: AreaId, color: Rgb) {
        let entry = self.entry_mut(id);
        entry.rgb = Some(color);
        entry.hex = color.to_hex();
    }

    pub fn record_alert(&mut self, id: AreaId) {
        self.entry_mut(id).alerts += 1;
    }
}
