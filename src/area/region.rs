//! Region records
//!
//! - `Region` - a committed, named, immutable protected volume
//! - `PendingRegion` - a definition waiting for its second corner
//! - `CreateOutcome` - the result of one `create` call
//! - `NameState` - where a region name sits in its lifecycle

use std::fmt;

use super::geometry::{Point, Volume};

/// Fold a region or player name into its lookup key
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Who may modify blocks inside a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Only the player whose name matches the region name
    OwnerOnly,
    /// The owner, plus any player in the region's group
    GroupLocked,
}

impl AccessMode {
    pub fn from_flag(group_locked: bool) -> Self {
        if group_locked {
            AccessMode::GroupLocked
        } else {
            AccessMode::OwnerOnly
        }
    }

    pub fn is_group_locked(&self) -> bool {
        matches!(self, AccessMode::GroupLocked)
    }
}

/// A committed protected region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    name: String,
    volume: Volume,
    access: AccessMode,
    group_id: i32,
}

impl Region {
    /// Create a region. The name is stored as given and matched case-insensitively.
    pub fn new(name: impl Into<String>, volume: Volume, access: AccessMode, group_id: i32) -> Self {
        Self {
            name: name.into(),
            volume,
            access,
            group_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-folded lookup key
    pub fn key(&self) -> String {
        name_key(&self.name)
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn group_id(&self) -> i32 {
        self.group_id
    }

    pub fn contains(&self, point: Point) -> bool {
        self.volume.contains(point)
    }

    /// Check whether a player may modify blocks in this region.
    ///
    /// The creator (matched by name, case-insensitively) is always allowed.
    /// For group-locked regions, any player with the recorded group id is too.
    pub fn allows(&self, player_name: &str, player_group_id: i32) -> bool {
        if name_key(player_name) == self.key() {
            return true;
        }
        self.access.is_group_locked() && player_group_id == self.group_id
    }
}

/// A region definition holding its first corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRegion {
    pub name: String,
    pub corner: Point,
    pub access: AccessMode,
    pub group_id: i32,
}

/// Result of a single `create` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// First corner recorded; waiting for the second call
    PendingStarted,
    /// Region committed and persisted
    Created,
    /// A committed region already uses this name
    NameTaken,
    /// The name cannot be stored (empty, or contains a comma or control character)
    InvalidName,
    /// Horizontal footprint exceeds the configured limit
    TooLarge,
    /// Candidate volume overlaps a committed region
    Overlaps,
}

impl CreateOutcome {
    /// Whether the call moved the name forward in its lifecycle
    pub fn is_success(&self) -> bool {
        matches!(self, CreateOutcome::PendingStarted | CreateOutcome::Created)
    }
}

impl fmt::Display for CreateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            CreateOutcome::PendingStarted => {
                "Started setting the area... use the command again to finish setting area."
            }
            CreateOutcome::Created => "Area created!",
            CreateOutcome::NameTaken => "You already have a protected area.",
            CreateOutcome::InvalidName => "That name cannot be used for a protected area.",
            CreateOutcome::TooLarge => "That area is too large to protect.",
            CreateOutcome::Overlaps => "That area overlaps an existing protected area.",
        };
        f.write_str(message)
    }
}

/// Lifecycle state of a region name
///
/// `Absent -> Pending` on the first create call, `Pending -> Committed` on a
/// successful second call, `Pending -> Absent` on reset, `Committed -> Absent`
/// on removal. A rejected second call leaves the name pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameState {
    Absent,
    Pending,
    Committed,
}
