use crate::area::Area;
use crate::color::{ColorSampler, Rgb};
use crate::layout;
use crate::prelude::{AreaId, MonitorError, MonitorResult, ScreenPoint};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

struct RegistryState {
    areas: Vec<Area>,
    next_id: AreaId,
    /// Bumped whenever latches are reset; latch commits from an older epoch are dropped.
    latch_epoch: u64,
}

/// Shared, ordered list of areas.
///
/// Cloning yields another handle to the same list. Structural changes take
/// the write lock; the monitor loop copies the list once per tick and only
/// writes latch fields back, by id.
#[derive(Clone)]
pub struct AreaRegistry {
    inner: Arc<RwLock<RegistryState>>,
}

impl AreaRegistry {
    /// Registry holding a single default area.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryState {
                areas: vec![Area::new(0)],
                next_id: 1,
                latch_epoch: 0,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_area(&self) -> AreaId {
        let mut state = self.write();
        let id = state.next_id;
        state.next_id += 1;
        state.areas.push(Area::new(id));
        info!("added area {}", id);
        id
    }

    /// Removes an area; the last remaining one cannot be removed.
    pub fn remove_area(&self, id: AreaId) -> MonitorResult<()> {
        let mut state = self.write();
        let index = state
            .areas
            .iter()
            .position(|area| area.id == id)
            .ok_or(MonitorError::UnknownArea(id))?;
        if state.areas.len() <= 1 {
            return Err(MonitorError::LastArea);
        }
        state.areas.remove(index);
        info!("removed area {}", id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.read().areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().areas.is_empty()
    }

    pub fn ids(&self) -> Vec<AreaId> {
        self.read().areas.iter().map(|area| area.id).collect()
    }

    pub fn get(&self, id: AreaId) -> Option<Area> {
        self.read().areas.iter().find(|area| area.id == id).cloned()
    }

    /// Copy of every area in list order.
    pub fn snapshot(&self) -> Vec<Area> {
        self.read().areas.clone()
    }

    /// Edits one area's settings in place.
    ///
    /// `id` and the `color_changed` latch are owned elsewhere and are restored
    /// after `edit` runs.
    pub fn update<R>(&self, id: AreaId, edit: impl FnOnce(&mut Area) -> R) -> MonitorResult<R> {
        let mut state = self.write();
        let area = state
            .areas
            .iter_mut()
            .find(|area| area.id == id)
            .ok_or(MonitorError::UnknownArea(id))?;
        let latched = area.color_changed;
        let result = edit(area);
        area.id = id;
        area.color_changed = latched;
        Ok(result)
    }

    pub fn set_coordinates(&self, id: AreaId, point: ScreenPoint) -> MonitorResult<()> {
        self.update(id, |area| area.coordinates = Some(point))
    }

    pub fn set_condition_coordinates(&self, id: AreaId, point: ScreenPoint) -> MonitorResult<()> {
        self.update(id, |area| area.coordinates_condition = Some(point))
    }

    pub fn set_sound_file(&self, id: AreaId, path: impl Into<PathBuf>) -> MonitorResult<()> {
        let path = path.into();
        self.update(id, |area| area.sound_file = Some(path))
    }

    pub fn set_threshold_text(&self, id: AreaId, text: &str) -> MonitorResult<()> {
        self.update(id, |area| area.threshold = text.into())
    }

    pub fn set_volume_text(&self, id: AreaId, text: &str) -> MonitorResult<()> {
        self.update(id, |area| area.volume = text.into())
    }

    pub fn set_use_condition(&self, id: AreaId, enabled: bool) -> MonitorResult<()> {
        self.update(id, |area| area.use_condition = enabled)
    }

    /// Samples the primary pixel and stores it as the baseline.
    pub fn capture_baseline(&self, id: AreaId, sampler: &dyn ColorSampler) -> MonitorResult<Rgb> {
        let point = self
            .get(id)
            .ok_or(MonitorError::UnknownArea(id))?
            .coordinates
            .ok_or(MonitorError::MissingSetting {
                area: id,
                missing: "select coordinates first",
            })?;
        let color = sampler.sample(point)?;
        self.update(id, |area| area.baseline_color = Some(color))?;
        Ok(color)
    }

    /// Samples the condition pixel and stores it as the required condition color.
    pub fn capture_condition(&self, id: AreaId, sampler: &dyn ColorSampler) -> MonitorResult<Rgb> {
        let point = self
            .get(id)
            .ok_or(MonitorError::UnknownArea(id))?
            .coordinates_condition
            .ok_or(MonitorError::MissingSetting {
                area: id,
                missing: "select pixel B coordinates first",
            })?;
        let color = sampler.sample(point)?;
        self.update(id, |area| area.condition_color = Some(color))?;
        Ok(color)
    }

    /// Replaces every area. Ids are reassigned from zero in list order and
    /// latches start cleared; an empty list leaves one default area.
    pub fn replace_all(&self, mut areas: Vec<Area>) {
        let mut state = self.write();
        if areas.is_empty() {
            areas.push(Area::new(0));
        }
        for (index, area) in areas.iter_mut().enumerate() {
            area.id = index as AreaId;
            area.color_changed = false;
        }
        state.next_id = areas.len() as AreaId;
        state.areas = areas;
    }

    /// Loads a layout file and replaces the current list with it.
    ///
    /// On failure the current list is left untouched.
    pub fn load_from(&self, path: impl AsRef<Path>) -> MonitorResult<usize> {
        let path = path.as_ref();
        let areas = layout::load_layout(path)?;
        let count = areas.len();
        self.replace_all(areas);
        info!("loaded {} area(s) from {}", count, path.display());
        Ok(count)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> MonitorResult<usize> {
        let path = path.as_ref();
        let areas = self.snapshot();
        layout::save_layout(path, &areas)?;
        info!("saved {} area(s) to {}", areas.len(), path.display());
        Ok(areas.len())
    }

    /// Fails on the first area, in list order, that is not ready to monitor.
    pub fn check_ready(&self) -> MonitorResult<()> {
        for area in self.read().areas.iter() {
            if let Some(missing) = area.missing_setting() {
                return Err(MonitorError::MissingSetting {
                    area: area.id,
                    missing,
                });
            }
        }
        Ok(())
    }

    /// Clears every latch and opens a new latch epoch.
    pub(crate) fn reset_latches(&self) -> u64 {
        let mut state = self.write();
        state.latch_epoch += 1;
        for area in state.areas.iter_mut() {
            area.color_changed = false;
        }
        state.latch_epoch
    }

    pub(crate) fn latch_epoch(&self) -> u64 {
        self.read().latch_epoch
    }

    /// Writes an area's latch unless the epoch moved on or the area is gone.
    pub(crate) fn commit_latch(&self, id: AreaId, latched: bool, epoch: u64) -> bool {
        let mut state = self.write();
        if state.latch_epoch != epoch {
            return false;
        }
        match state.areas.iter_mut().find(|area| area.id == id) {
            Some(area) => {
                area.color_changed = latched;
                true
            }
            None => false,
        }
    }
}

impl Default for AreaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
