//! Area registry
//!
//! Owns every committed region and every pending (half-defined) region:
//! - Two-step creation keyed by case-folded name
//! - Overlap and size checks against the committed set
//! - Protection queries for world modification
//! - Persistence of the committed set after each structural change
//!
//! All mutations run under one registry-wide mutex, held across the
//! overlap scan and the persistence write, so no two committed regions can
//! ever overlap. Queries read an immutable snapshot of the committed list
//! that is swapped in after each mutation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::geometry::{Point, Volume};
use super::persistence::{is_storable_name, parse_lines, serialize, AreaStore, FileStore};
use super::region::{name_key, AccessMode, CreateOutcome, NameState, PendingRegion, Region};
use crate::config::AreaConfig;
use crate::error::Result;

/// Default maximum horizontal footprint of a region
pub const DEFAULT_AREA_LIMIT: u64 = 2500;

/// Height the first corner of a tall region is pinned to
pub const WORLD_FLOOR: i32 = 0;

/// Height the second corner of a tall region is pinned to
pub const WORLD_CEILING: i32 = 255;

/// Registry settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Maximum horizontal footprint (width x depth) of a region
    pub protected_area_limit: u64,
    pub world_floor: i32,
    pub world_ceiling: i32,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            protected_area_limit: DEFAULT_AREA_LIMIT,
            world_floor: WORLD_FLOOR,
            world_ceiling: WORLD_CEILING,
        }
    }
}

impl RegistrySettings {
    /// Set the maximum horizontal footprint
    pub fn with_area_limit(mut self, limit: u64) -> Self {
        self.protected_area_limit = limit;
        self
    }

    /// Set the tall-region height bounds
    pub fn with_height_bounds(mut self, floor: i32, ceiling: i32) -> Self {
        self.world_floor = floor;
        self.world_ceiling = ceiling;
        self
    }
}

impl From<&AreaConfig> for RegistrySettings {
    fn from(config: &AreaConfig) -> Self {
        Self {
            protected_area_limit: config.protected_area_limit,
            world_floor: config.world_floor,
            world_ceiling: config.world_ceiling,
        }
    }
}

/// Summary of a load from the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Regions now committed
    pub loaded: usize,
    /// Lines that could not be parsed
    pub malformed: usize,
    /// Records whose name was already loaded
    pub duplicates: usize,
    /// Records overlapping an already loaded region
    pub overlapping: usize,
}

impl LoadReport {
    pub fn skipped(&self) -> usize {
        self.malformed + self.duplicates + self.overlapping
    }
}

/// What a name currently holds
#[derive(Debug, Clone)]
enum Slot {
    Pending(PendingRegion),
    Committed(Arc<Region>),
}

/// State guarded by the registry mutex
#[derive(Debug, Default)]
struct RegistryInner {
    /// One slot per case-folded name; a name is never pending and committed at once
    slots: HashMap<String, Slot>,
    /// Committed regions in commit order
    regions: Vec<Arc<Region>>,
}

impl RegistryInner {
    fn pending_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Pending(_)))
            .count()
    }

    fn first_overlap(&self, volume: &Volume) -> Option<&Arc<Region>> {
        self.regions.iter().find(|r| r.volume().overlaps(volume))
    }
}

/// Registry of protected areas
pub struct AreaRegistry {
    settings: RegistrySettings,
    store: Arc<dyn AreaStore>,
    inner: Mutex<RegistryInner>,
    /// Committed regions as of the last completed mutation
    snapshot: ArcSwap<Vec<Arc<Region>>>,
}

impl AreaRegistry {
    /// Create an empty registry backed by the given store.
    ///
    /// Nothing is read from the store until [`AreaRegistry::load`] is called.
    pub fn new(settings: RegistrySettings, store: Arc<dyn AreaStore>) -> Self {
        Self {
            settings,
            store,
            inner: Mutex::new(RegistryInner::default()),
            snapshot: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Open the file-backed registry described by the configuration and load it
    pub fn open(config: &AreaConfig) -> Result<Self> {
        let store = Arc::new(FileStore::new(&config.data_path));
        let registry = Self::new(RegistrySettings::from(config), store);
        registry.load()?;
        Ok(registry)
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Define a region in two steps.
    ///
    /// The first call for a name records `corner` as one corner of the
    /// region together with its access mode. The second call supplies the
    /// opposite corner and commits the region if it is small enough and does
    /// not overlap any committed region. A rejected second call keeps the
    /// first corner so the player can try another spot, or `reset` it.
    ///
    /// With `tall` set, the first corner drops to the world floor and the
    /// second rises to the world ceiling, claiming the full column.
    ///
    /// Names that could not survive a save and reload are refused with
    /// `InvalidName` before any state changes.
    pub fn create(
        &self,
        name: &str,
        corner: Point,
        group_locked: bool,
        group_id: i32,
        tall: bool,
    ) -> CreateOutcome {
        if !is_storable_name(name) {
            debug!(name = ?name, "Rejected unstorable area name");
            return CreateOutcome::InvalidName;
        }

        let key = name_key(name);
        let mut inner = self.inner.lock();
        let state = &mut *inner;

        let pending = match state.slots.get(&key) {
            Some(Slot::Committed(_)) => {
                debug!(name = %key, "Area name already claimed");
                return CreateOutcome::NameTaken;
            }
            Some(Slot::Pending(pending)) => pending.clone(),
            None => {
                let corner = if tall {
                    corner.with_height(self.settings.world_floor)
                } else {
                    corner
                };
                let pending = PendingRegion {
                    name: name.trim().to_string(),
                    corner,
                    access: AccessMode::from_flag(group_locked),
                    group_id,
                };
                debug!(name = %key, corner = ?corner, tall = tall, "Started area definition");
                state.slots.insert(key, Slot::Pending(pending));
                return CreateOutcome::PendingStarted;
            }
        };

        let corner = if tall {
            corner.with_height(self.settings.world_ceiling)
        } else {
            corner
        };
        let volume = Volume::from_corners(pending.corner, corner);

        if volume.footprint() > self.settings.protected_area_limit {
            debug!(
                name = %key,
                footprint = volume.footprint(),
                limit = self.settings.protected_area_limit,
                "Area too large"
            );
            return CreateOutcome::TooLarge;
        }

        if let Some(existing) = state.first_overlap(&volume) {
            debug!(name = %key, existing = %existing.name(), "Area overlaps existing area");
            return CreateOutcome::Overlaps;
        }

        let region = Arc::new(Region::new(
            pending.name,
            volume,
            pending.access,
            pending.group_id,
        ));
        state.slots.insert(key, Slot::Committed(Arc::clone(&region)));
        state.regions.push(Arc::clone(&region));

        info!(
            name = %region.name(),
            volume = %region.volume(),
            access = ?region.access(),
            "Area created"
        );

        self.publish(state);
        self.persist(state);
        CreateOutcome::Created
    }

    /// Discard a pending definition. Committed regions are untouched.
    pub fn reset(&self, name: &str) -> bool {
        let key = name_key(name);
        let mut inner = self.inner.lock();
        if !matches!(inner.slots.get(&key), Some(Slot::Pending(_))) {
            return false;
        }
        inner.slots.remove(&key);
        debug!(name = %key, "Discarded pending area");
        true
    }

    /// Delete a committed region and persist the change
    pub fn remove(&self, name: &str) -> bool {
        let key = name_key(name);
        let mut inner = self.inner.lock();
        let region = match inner.slots.get(&key) {
            Some(Slot::Committed(region)) => Arc::clone(region),
            _ => return false,
        };

        inner.slots.remove(&key);
        inner.regions.retain(|r| !Arc::ptr_eq(r, &region));

        info!(name = %region.name(), "Area removed");

        self.publish(&inner);
        self.persist(&inner);
        true
    }

    /// Check whether a player may modify the block at `point`.
    ///
    /// Returns the name of the region that forbids it, or `None` when the
    /// point is unprotected or the player is allowed there.
    pub fn query(&self, player_name: &str, player_group_id: i32, point: Point) -> Option<String> {
        let regions = self.snapshot.load();
        let region = regions.iter().find(|r| r.contains(point))?;
        if region.allows(player_name, player_group_id) {
            None
        } else {
            Some(region.name().to_string())
        }
    }

    /// Replace the committed set with the store's contents.
    ///
    /// Malformed lines, duplicate names and records overlapping an earlier
    /// record are skipped with a warning. A pending definition whose name is
    /// loaded as committed is dropped. If the store cannot be read the
    /// registry is left as it was.
    pub fn load(&self) -> Result<LoadReport> {
        let mut inner = self.inner.lock();
        let lines = self.store.load()?;
        let (records, malformed) = parse_lines(&lines);

        let mut report = LoadReport {
            malformed: malformed.len(),
            ..LoadReport::default()
        };
        for bad in &malformed {
            warn!(
                line_number = bad.line_number,
                line = %bad.line,
                error = %bad.error,
                "Skipping malformed area metadata"
            );
        }

        let state = &mut *inner;
        state.slots.retain(|_, slot| matches!(slot, Slot::Pending(_)));
        state.regions.clear();

        for record in records {
            let key = name_key(&record.name);
            if matches!(state.slots.get(&key), Some(Slot::Committed(_))) {
                warn!(name = %record.name, "Skipping duplicate area");
                report.duplicates += 1;
                continue;
            }
            if let Some(existing) = state.first_overlap(&record.volume) {
                warn!(
                    name = %record.name,
                    existing = %existing.name(),
                    "Skipping area overlapping an existing area"
                );
                report.overlapping += 1;
                continue;
            }

            let region = Arc::new(record.into_region());
            if let Some(Slot::Pending(_)) =
                state.slots.insert(key, Slot::Committed(Arc::clone(&region)))
            {
                debug!(name = %region.name(), "Dropped pending area superseded by stored area");
            }
            state.regions.push(region);
        }
        report.loaded = state.regions.len();

        self.publish(state);

        info!(
            loaded = report.loaded,
            skipped = report.skipped(),
            "Area list loaded"
        );
        Ok(report)
    }

    /// Look up a committed region by name
    pub fn get(&self, name: &str) -> Option<Arc<Region>> {
        let key = name_key(name);
        let regions = self.snapshot.load();
        regions.iter().find(|r| r.key() == key).cloned()
    }

    /// All committed regions in commit order
    pub fn regions(&self) -> Vec<Arc<Region>> {
        self.snapshot.load().iter().cloned().collect()
    }

    /// Number of committed regions
    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of definitions waiting for their second corner
    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending_count()
    }

    /// Lifecycle state of a name
    pub fn state_of(&self, name: &str) -> NameState {
        match self.inner.lock().slots.get(&name_key(name)) {
            None => NameState::Absent,
            Some(Slot::Pending(_)) => NameState::Pending,
            Some(Slot::Committed(_)) => NameState::Committed,
        }
    }

    fn publish(&self, inner: &RegistryInner) {
        self.snapshot.store(Arc::new(inner.regions.clone()));
    }

    /// Write the committed set to the store. Failures are logged; the
    /// in-memory state stays authoritative until the next successful write.
    fn persist(&self, inner: &RegistryInner) {
        let lines = serialize(inner.regions.iter().map(Arc::as_ref));
        if let Err(e) = self.store.save(&lines) {
            error!(error = %e, regions = lines.len(), "Failed to save area list");
        }
    }
}

impl fmt::Debug for AreaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AreaRegistry")
            .field("settings", &self.settings)
            .field("regions", &self.len())
            .field("pending", &self.pending_count())
            .finish()
    }
}
