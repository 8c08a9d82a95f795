use super::*;
use crate::catalog::WidgetCatalog;
use proptest::prelude::*;

fn script(label: &str) -> &'static WidgetScript {
    WidgetCatalog::builtin()
        .script(label)
        .expect("builtin script")
}

fn size(width: u32, height: u32) -> GridSize {
    GridSize::new(width, height).expect("valid size")
}

#[test]
fn overlap_requires_both_axes() {
    let a = GridRect::new(GridPosition::new(0, 0), size(2, 2));
    let same_rows = GridRect::new(GridPosition::new(0, 2), size(1, 2));
    let same_cols = GridRect::new(GridPosition::new(2, 0), size(2, 1));
    let corner = GridRect::new(GridPosition::new(1, 1), size(1, 1));

    assert!(!a.intersects(&same_rows));
    assert!(!a.intersects(&same_cols));
    assert!(a.intersects(&corner));
}

#[test]
fn copy_then_paste_scenario() {
    let mut profile = Profile::new("Scratch");

    place(&mut profile, script("Copy"), GridPosition::new(0, 0), GridSize::UNIT)
        .expect("copy fits");

    let rejected = place(
        &mut profile,
        script("Paste"),
        GridPosition::new(0, 0),
        GridSize::UNIT,
    );
    assert!(matches!(rejected, Err(Rejection::Collision { .. })));
    assert_eq!(profile.widgets.len(), 1);

    place(&mut profile, script("Paste"), GridPosition::new(0, 1), GridSize::UNIT)
        .expect("paste fits next to copy");
    assert_eq!(profile.widgets.len(), 2);
    assert_eq!(profile.widgets[1].script.label, "Paste");
}

#[test]
fn wide_widget_over_a_filled_row_is_rejected() {
    let mut profile = Profile::new("Editing");
    for (col, label) in ["Copy", "Paste", "Select All"].into_iter().enumerate() {
        place(
            &mut profile,
            script(label),
            GridPosition::new(0, col as u32),
            GridSize::UNIT,
        )
        .expect("row slot");
    }
    let before = profile.clone();

    let rejected = place(
        &mut profile,
        script("Touchpad"),
        GridPosition::new(0, 0),
        size(4, 2),
    );

    assert!(rejected.is_err());
    assert_eq!(profile, before);
    assert!(!can_place(&profile.widgets, GridPosition::new(0, 0), size(4, 2)));
    assert!(can_place(&profile.widgets, GridPosition::new(1, 0), size(4, 2)));
}

#[test]
fn placement_ignores_grid_row_bound() {
    let mut profile = Profile::new("Tall");
    place(
        &mut profile,
        script("Vertical Scroll"),
        GridPosition::new(GRID_ROWS + 3, 0),
        size(1, 10),
    )
    .expect("rows below the selectable grid are allowed");
}

#[test]
fn invalid_size_is_rejected_without_mutation() {
    let mut profile = Profile::new("Bad");
    let rejected = place(
        &mut profile,
        script("Touchpad"),
        GridPosition::new(0, 0),
        GridSize {
            width: 5,
            height: 1,
        },
    );
    assert_eq!(
        rejected,
        Err(Rejection::InvalidSize {
            width: 5,
            height: 1
        })
    );
    assert!(profile.widgets.is_empty());
}

#[test]
fn occupied_cells_cover_every_widget_cell() {
    let mut profile = Profile::new("Navigation");
    place(&mut profile, script("Up"), GridPosition::new(0, 1), GridSize::UNIT).expect("up");
    place(&mut profile, script("Touchpad"), GridPosition::new(2, 0), size(4, 2))
        .expect("touchpad");

    let cells = occupied_cells(&profile.widgets);
    assert_eq!(cells.len(), 9);
    assert!(cells.contains(&GridPosition::new(0, 1)));
    assert!(cells.contains(&GridPosition::new(3, 3)));
    assert!(!cells.contains(&GridPosition::new(1, 0)));

    let slots = empty_slots(&profile.widgets);
    assert_eq!(slots.len(), (GRID_ROWS * GRID_COLUMNS) as usize - 9);
    assert_eq!(slots[0], GridPosition::new(0, 0));
    assert!(!slots.contains(&GridPosition::new(2, 2)));
}

#[test]
fn default_size_only_for_buttons() {
    assert_eq!(default_size(InteractionMode::ButtonTap), Some(GridSize::UNIT));
    assert_eq!(default_size(InteractionMode::DragArea), None);
    assert_eq!(default_size(InteractionMode::TextInput), None);
}

fn placement() -> impl Strategy<Value = (u32, u32, u32, u32)> {
    (0u32..10, 0u32..4, 1u32..=4, 1u32..=4)
}

proptest! {
    #[test]
    fn accepted_placements_never_overlap(steps in prop::collection::vec(placement(), 1..40)) {
        let mut profile = Profile::new("Random");
        let touchpad = script("Touchpad");

        for (row, col, width, height) in steps {
            let before = profile.clone();
            let position = GridPosition::new(row, col);
            let size = GridSize { width, height };
            let fits = can_place(&profile.widgets, position, size);

            match place(&mut profile, touchpad, position, size) {
                Ok(_) => {
                    prop_assert!(fits);
                    prop_assert_eq!(profile.widgets.len(), before.widgets.len() + 1);
                }
                Err(_) => {
                    prop_assert!(!fits);
                    prop_assert_eq!(&profile, &before);
                }
            }

            for (i, a) in profile.widgets.iter().enumerate() {
                for b in &profile.widgets[i + 1..] {
                    prop_assert!(!GridRect::of(a).intersects(&GridRect::of(b)));
                }
            }
        }
    }

    #[test]
    fn occupied_cell_count_matches_total_area(steps in prop::collection::vec(placement(), 1..20)) {
        let mut profile = Profile::new("Area");
        let touchpad = script("Touchpad");
        for (row, col, width, height) in steps {
            let _ = place(&mut profile, touchpad, GridPosition::new(row, col), GridSize { width, height });
        }
        let area: u32 = profile.widgets.iter().map(|w| w.size.width * w.size.height).sum();
        prop_assert_eq!(occupied_cells(&profile.widgets).len(), area as usize);
    }
}
