use thiserror::Error;

use crate::domain::{GridPosition, GridSize, WidgetId};

/// Why a profile or placement operation was turned into a no-op.
///
/// The core never fails loudly on these; they exist so callers and tests can
/// tell an accepted operation from a rejected one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("profile name must not be blank")]
    BlankProfileName,
    #[error("a profile named '{0}' already exists")]
    DuplicateProfile(String),
    #[error("no profile named '{0}'")]
    UnknownProfile(String),
    #[error("cannot delete the last remaining profile")]
    LastProfile,
    #[error("widget size {width}x{height} is outside 1..=4 x 1..=50")]
    InvalidSize { width: u32, height: u32 },
    #[error("{size} widget at {position} overlaps widget {existing}")]
    Collision {
        position: GridPosition,
        size: GridSize,
        existing: WidgetId,
    },
    #[error("no widget {0} in profile")]
    UnknownWidget(WidgetId),
    #[error("no widget script labelled '{0}'")]
    UnknownScript(String),
}
