//! Widget placement on the profile grid.
//!
//! A widget covers the half-open cell rectangle
//! `[row, row + height) x [col, col + width)`. Two widgets collide only when
//! their row ranges and their column ranges both intersect.

use std::{collections::BTreeSet, ops::Range};

use shared::{
    domain::{
        GridPosition, GridSize, InteractionMode, Profile, Widget, WidgetId, WidgetScript,
        GRID_COLUMNS, GRID_ROWS,
    },
    error::Rejection,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRect {
    pub rows: Range<u32>,
    pub cols: Range<u32>,
}

impl GridRect {
    pub fn new(position: GridPosition, size: GridSize) -> Self {
        Self {
            rows: position.row..position.row.saturating_add(size.height),
            cols: position.col..position.col.saturating_add(size.width),
        }
    }

    pub fn of(widget: &Widget) -> Self {
        Self::new(widget.position, widget.size)
    }

    pub fn intersects(&self, other: &GridRect) -> bool {
        ranges_overlap(&self.rows, &other.rows) && ranges_overlap(&self.cols, &other.cols)
    }

    pub fn cells(&self) -> impl Iterator<Item = GridPosition> + '_ {
        self.rows
            .clone()
            .flat_map(move |row| self.cols.clone().map(move |col| GridPosition::new(row, col)))
    }
}

fn ranges_overlap(a: &Range<u32>, b: &Range<u32>) -> bool {
    a.start < b.end && b.start < a.end
}

/// First existing widget the candidate rectangle would overlap.
pub fn find_collision<'a>(
    widgets: &'a [Widget],
    position: GridPosition,
    size: GridSize,
) -> Option<&'a Widget> {
    let candidate = GridRect::new(position, size);
    widgets
        .iter()
        .find(|widget| GridRect::of(widget).intersects(&candidate))
}

pub fn can_place(widgets: &[Widget], position: GridPosition, size: GridSize) -> bool {
    find_collision(widgets, position, size).is_none()
}

/// Appends a new widget to `profile` if it fits. The profile is untouched on
/// rejection.
pub fn place(
    profile: &mut Profile,
    script: &WidgetScript,
    position: GridPosition,
    size: GridSize,
) -> Result<WidgetId, Rejection> {
    if !size.is_valid() {
        warn!(
            profile = %profile.name,
            label = %script.label,
            %size,
            "rejected widget with out-of-range size"
        );
        return Err(Rejection::InvalidSize {
            width: size.width,
            height: size.height,
        });
    }

    if let Some(existing) = find_collision(&profile.widgets, position, size) {
        warn!(
            profile = %profile.name,
            label = %script.label,
            %position,
            %size,
            existing = %existing.id,
            "collision detected; widget not added"
        );
        return Err(Rejection::Collision {
            position,
            size,
            existing: existing.id,
        });
    }

    let widget = Widget::new(script.clone(), position, size);
    let id = widget.id;
    profile.widgets.push(widget);
    debug!(profile = %profile.name, label = %script.label, %position, %size, widget_id = %id, "widget placed");
    Ok(id)
}

/// Union of all cells covered by `widgets`.
pub fn occupied_cells(widgets: &[Widget]) -> BTreeSet<GridPosition> {
    widgets
        .iter()
        .flat_map(|widget| GridRect::of(widget).cells().collect::<Vec<_>>())
        .collect()
}

/// Free cells of the selectable 4 x 8 grid, row-major.
pub fn empty_slots(widgets: &[Widget]) -> Vec<GridPosition> {
    let occupied = occupied_cells(widgets);
    (0..GRID_ROWS)
        .flat_map(|row| (0..GRID_COLUMNS).map(move |col| GridPosition::new(row, col)))
        .filter(|cell| !occupied.contains(cell))
        .collect()
}

/// Size a widget gets without asking the user, if any.
pub fn default_size(mode: InteractionMode) -> Option<GridSize> {
    match mode {
        InteractionMode::ButtonTap => Some(GridSize::UNIT),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/grid_tests.rs"]
mod tests;
