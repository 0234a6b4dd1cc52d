#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;
use crate::consts::{MAX_ZOOM, MIN_ZOOM, PLACEHOLDER_IMAGE_SIZE};

// =============================================================
// Helpers
// =============================================================

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn no_modifiers() -> Modifiers {
    Modifiers::default()
}

fn shift_modifier() -> Modifiers {
    Modifiers { shift: true, ..Default::default() }
}

fn core_with_image(width: f64, height: f64) -> EngineCore {
    let mut core = EngineCore::new();
    let ticket = core.begin_image_load("photo.jpg", "image/jpeg", None).expect("image mime accepted");
    core.finish_image_load(ticket, width, height).expect("usable size");
    core
}

/// A 400x300 image with one `cat` rectangle at 160,120 80x60.
fn core_with_rect() -> (EngineCore, RectId) {
    let mut core = core_with_image(400.0, 300.0);
    let actions = core.add_annotation("cat");
    let Some(Action::RectangleCreated(rect)) = actions.first() else {
        panic!("expected RectangleCreated, got {actions:?}");
    };
    (core, rect.id)
}

fn click(core: &mut EngineCore, at: Point, modifiers: Modifiers) -> Vec<Action> {
    core.on_pointer_down(at, Button::Primary, modifiers);
    core.on_pointer_up(at, Button::Primary, modifiers)
}

fn drag(core: &mut EngineCore, from: Point, to: Point) -> Vec<Action> {
    core.on_pointer_down(from, Button::Primary, no_modifiers());
    core.on_pointer_move(to, no_modifiers());
    core.on_pointer_up(to, Button::Primary, no_modifiers())
}

fn bounds_of(core: &EngineCore, id: &RectId) -> Bounds {
    core.rectangle(id).map(Rectangle::bounds).expect("rectangle exists")
}

fn has_render_needed(actions: &[Action]) -> bool {
    actions.iter().any(|a| matches!(a, Action::RenderNeeded))
}

fn has_updated(actions: &[Action], id: RectId) -> bool {
    actions.iter().any(|a| matches!(a, Action::RectangleUpdated { id: i, .. } if *i == id))
}

// =============================================================
// EngineCore: defaults
// =============================================================

#[test]
fn core_new_is_empty() {
    let core = EngineCore::new();
    assert!(core.doc.is_empty());
    assert!(core.selection().is_empty());
    assert!(core.gesture.is_idle());
    assert_eq!(core.camera().zoom, 1.0);
    assert_eq!(core.viewport_width, 0.0);
    assert_eq!(core.dpr, 1.0);
}

// =============================================================
// add_annotation
// =============================================================

#[test]
fn add_annotation_centers_a_fifth_of_the_image() {
    let (core, id) = core_with_rect();
    let rect = core.rectangle(&id).expect("added");
    assert!(approx(rect.x, 160.0));
    assert!(approx(rect.y, 120.0));
    assert!(approx(rect.width, 80.0));
    assert!(approx(rect.height, 60.0));
    assert_eq!(rect.rotation, 0.0);
    assert_eq!(rect.label, "cat");
    assert_eq!(rect.name, "");
    assert_eq!(rect.stroke, "black");
    assert!(approx(rect.stroke_width, 0.6));
}

#[test]
fn add_annotation_names_repeats_by_count() {
    let (mut core, _) = core_with_rect();
    core.add_annotation("cat");
    core.add_annotation("dog");
    core.add_annotation("cat");
    let names: Vec<&str> = core.doc.rectangles().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["", "cat 2", "", "cat 3"]);
}

#[test]
fn add_annotation_uses_placeholder_before_load() {
    let mut core = EngineCore::new();
    core.add_annotation("cat");
    let rect = &core.doc.rectangles()[0];
    let side = PLACEHOLDER_IMAGE_SIZE * 0.2;
    assert!(approx(rect.width, side));
    assert!(approx(rect.x, (PLACEHOLDER_IMAGE_SIZE - side) / 2.0));
}

#[test]
fn add_annotation_emits_created_and_render() {
    let mut core = core_with_image(400.0, 300.0);
    let actions = core.add_annotation("cat");
    assert!(matches!(actions.first(), Some(Action::RectangleCreated(r)) if r.label == "cat"));
    assert!(has_render_needed(&actions));
}

#[test]
fn add_annotation_with_empty_label_is_noop() {
    let mut core = core_with_image(400.0, 300.0);
    assert!(core.add_annotation("").is_empty());
    assert!(core.doc.is_empty());
}

#[test]
fn add_annotation_ids_are_unique() {
    let mut core = core_with_image(400.0, 300.0);
    for _ in 0..5 {
        core.add_annotation("cat");
    }
    let mut ids: Vec<RectId> = core.doc.rectangles().iter().map(|r| r.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5);
}

// =============================================================
// commit_transform
// =============================================================

#[test]
fn commit_applies_scale_to_committed_size() {
    let (mut core, id) = core_with_rect();
    let outcome = TransformOutcome { x: 10.0, y: 20.0, scale_x: 2.0, scale_y: 0.5, rotation: 15.0 };
    let actions = core.commit_transform(&id, outcome);
    assert!(has_updated(&actions, id));
    let b = bounds_of(&core, &id);
    assert!(approx(b.width, 160.0));
    assert!(approx(b.height, 30.0));
    assert_eq!((b.x, b.y, b.rotation), (10.0, 20.0, 15.0));
}

#[test]
fn commit_resets_scale_so_identity_changes_nothing() {
    let (mut core, id) = core_with_rect();
    core.commit_transform(&id, TransformOutcome { x: 0.0, y: 0.0, scale_x: 3.0, scale_y: 3.0, rotation: 0.0 });
    let after_first = bounds_of(&core, &id);

    let actions = core.commit_transform(&id, TransformOutcome::identity(after_first));
    assert!(actions.is_empty());
    assert_eq!(bounds_of(&core, &id), after_first);
}

#[test]
fn commit_enforces_size_floor() {
    let (mut core, id) = core_with_rect();
    core.commit_transform(&id, TransformOutcome { x: 0.0, y: 0.0, scale_x: 0.01, scale_y: 0.0, rotation: 0.0 });
    let b = bounds_of(&core, &id);
    assert_eq!(b.width, MIN_RECT_SIZE);
    assert_eq!(b.height, MIN_RECT_SIZE);
}

#[test]
fn commit_with_non_finite_outcome_is_noop() {
    let (mut core, id) = core_with_rect();
    let before = bounds_of(&core, &id);
    let outcome = TransformOutcome { x: f64::NAN, y: 0.0, scale_x: 1.0, scale_y: 1.0, rotation: 0.0 };
    assert!(core.commit_transform(&id, outcome).is_empty());
    let outcome = TransformOutcome { x: 0.0, y: 0.0, scale_x: f64::INFINITY, scale_y: 1.0, rotation: 0.0 };
    assert!(core.commit_transform(&id, outcome).is_empty());
    assert_eq!(bounds_of(&core, &id), before);
}

#[test]
fn update_with_non_finite_field_is_noop() {
    let (mut core, id) = core_with_rect();
    let patch = RectanglePatch { y: Some(f64::NEG_INFINITY), ..RectanglePatch::default() };
    assert!(core.update_rectangle(&id, patch).is_empty());
    assert!(approx(bounds_of(&core, &id).y, 120.0));
}

#[test]
fn commit_unknown_rectangle_is_noop() {
    let (mut core, _) = core_with_rect();
    let outcome = TransformOutcome { x: 0.0, y: 0.0, scale_x: 2.0, scale_y: 2.0, rotation: 0.0 };
    assert!(core.commit_transform(&Uuid::new_v4(), outcome).is_empty());
}

// =============================================================
// Click selection
// =============================================================

#[test]
fn click_on_rectangle_selects_it() {
    let (mut core, id) = core_with_rect();
    let actions = click(&mut core, pt(200.0, 150.0), no_modifiers());
    assert_eq!(actions, vec![Action::SelectionChanged(vec![id])]);
    assert_eq!(core.selection(), vec![id]);
}

#[test]
fn repeated_click_is_idempotent() {
    let (mut core, id) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    let actions = click(&mut core, pt(200.0, 150.0), no_modifiers());
    assert!(actions.is_empty());
    assert_eq!(core.selection(), vec![id]);
}

#[test]
fn shift_click_toggles_membership() {
    let (mut core, a) = core_with_rect();
    let b = core.add_annotation("dog");
    let Some(Action::RectangleCreated(b)) = b.first().cloned() else {
        panic!("expected RectangleCreated");
    };
    core.update_rectangle(&b.id, RectanglePatch { x: Some(0.0), y: Some(0.0), ..RectanglePatch::default() });

    click(&mut core, pt(200.0, 150.0), no_modifiers());
    click(&mut core, pt(10.0, 10.0), shift_modifier());
    assert_eq!(core.selection(), vec![a, b.id]);

    click(&mut core, pt(200.0, 150.0), shift_modifier());
    assert_eq!(core.selection(), vec![b.id]);

    click(&mut core, pt(200.0, 150.0), shift_modifier());
    assert_eq!(core.selection(), vec![b.id, a]);
}

#[test]
fn click_on_image_clears_selection() {
    let (mut core, _) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    let actions = click(&mut core, pt(20.0, 20.0), shift_modifier());
    assert_eq!(actions, vec![Action::SelectionChanged(Vec::new())]);
    assert!(core.selection().is_empty());
}

#[test]
fn click_on_stage_clears_selection() {
    let (mut core, _) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    click(&mut core, pt(-50.0, -50.0), no_modifiers());
    assert!(core.selection().is_empty());
}

#[test]
fn background_target_distinguishes_image_and_stage() {
    let core = core_with_image(400.0, 300.0);
    assert_eq!(core.background_target(pt(10.0, 10.0)), ClickTarget::Image);
    assert_eq!(core.background_target(pt(500.0, 10.0)), ClickTarget::Stage);
    assert_eq!(EngineCore::new().background_target(pt(10.0, 10.0)), ClickTarget::Stage);
}

// =============================================================
// Dragging rectangles
// =============================================================

#[test]
fn drag_moves_rectangle_on_release() {
    let (mut core, id) = core_with_rect();
    core.on_pointer_down(pt(200.0, 150.0), Button::Primary, no_modifiers());
    core.on_pointer_move(pt(210.0, 165.0), no_modifiers());

    assert!(approx(bounds_of(&core, &id).x, 160.0), "store untouched mid-gesture");
    let preview = core.gesture.preview_of(&id).expect("preview");
    assert!(approx(preview.x, 170.0));

    let actions = core.on_pointer_up(pt(210.0, 165.0), Button::Primary, no_modifiers());
    assert!(has_updated(&actions, id));
    let b = bounds_of(&core, &id);
    assert!(approx(b.x, 170.0));
    assert!(approx(b.y, 135.0));
    assert!(approx(b.width, 80.0));
    assert!(core.gesture.is_idle());
}

#[test]
fn drag_moves_the_whole_selection_together() {
    let (mut core, a) = core_with_rect();
    let created = core.add_annotation("dog");
    let Some(Action::RectangleCreated(b)) = created.first().cloned() else {
        panic!("expected RectangleCreated");
    };
    core.update_rectangle(&b.id, RectanglePatch { x: Some(10.0), y: Some(10.0), ..RectanglePatch::default() });
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    click(&mut core, pt(20.0, 20.0), shift_modifier());
    assert_eq!(core.selection(), vec![a, b.id]);

    core.on_pointer_down(pt(20.0, 20.0), Button::Primary, no_modifiers());
    core.on_pointer_move(pt(70.0, 20.0), no_modifiers());
    assert!(approx(core.gesture.preview_of(&a).expect("a previewed").x, 210.0));
    let actions = core.on_pointer_up(pt(70.0, 20.0), Button::Primary, no_modifiers());

    assert!(has_updated(&actions, a));
    assert!(has_updated(&actions, b.id));
    assert_eq!(actions.iter().filter(|action| matches!(action, Action::RenderNeeded)).count(), 1);
    assert!(approx(bounds_of(&core, &a).x, 210.0));
    assert!(approx(bounds_of(&core, &a).y, 120.0));
    assert!(approx(bounds_of(&core, &b.id).x, 60.0));
    assert!(approx(bounds_of(&core, &a).width, 80.0));
    assert_eq!(core.selection(), vec![a, b.id]);
}

#[test]
fn drag_of_unselected_rectangle_moves_only_it() {
    let (mut core, a) = core_with_rect();
    let created = core.add_annotation("dog");
    let Some(Action::RectangleCreated(b)) = created.first().cloned() else {
        panic!("expected RectangleCreated");
    };
    core.update_rectangle(&b.id, RectanglePatch { x: Some(10.0), y: Some(10.0), ..RectanglePatch::default() });
    click(&mut core, pt(20.0, 20.0), no_modifiers());

    drag(&mut core, pt(200.0, 150.0), pt(200.0, 170.0));
    assert!(approx(bounds_of(&core, &a).y, 140.0));
    assert!(approx(bounds_of(&core, &b.id).y, 10.0));
}

#[test]
fn drag_back_to_start_commits_nothing() {
    let (mut core, id) = core_with_rect();
    core.on_pointer_down(pt(200.0, 150.0), Button::Primary, no_modifiers());
    core.on_pointer_move(pt(230.0, 150.0), no_modifiers());
    core.on_pointer_move(pt(200.0, 150.0), no_modifiers());
    let actions = core.on_pointer_up(pt(200.0, 150.0), Button::Primary, no_modifiers());
    assert!(actions.is_empty());
    assert!(approx(bounds_of(&core, &id).x, 160.0));
}

#[test]
fn drag_does_not_change_selection() {
    let (mut core, _) = core_with_rect();
    let actions = drag(&mut core, pt(200.0, 150.0), pt(220.0, 150.0));
    assert!(!actions.iter().any(|a| matches!(a, Action::SelectionChanged(_))));
    assert!(core.selection().is_empty());
}

// =============================================================
// Resizing and rotating
// =============================================================

#[test]
fn resize_handle_grows_rectangle() {
    let (mut core, id) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    drag(&mut core, pt(240.0, 180.0), pt(250.0, 190.0));
    let b = bounds_of(&core, &id);
    assert!(approx(b.x, 160.0));
    assert!(approx(b.width, 90.0));
    assert!(approx(b.height, 70.0));
}

#[test]
fn resize_below_floor_sticks_at_last_valid_box() {
    let (mut core, id) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());

    core.on_pointer_down(pt(240.0, 180.0), Button::Primary, no_modifiers());
    core.on_pointer_move(pt(250.0, 190.0), no_modifiers());
    core.on_pointer_move(pt(100.0, 100.0), no_modifiers());
    let preview = core.gesture.preview_of(&id).expect("preview");
    assert!(approx(preview.width, 90.0));
    assert!(approx(preview.height, 70.0));

    core.on_pointer_up(pt(100.0, 100.0), Button::Primary, no_modifiers());
    let b = bounds_of(&core, &id);
    assert!(approx(b.width, 90.0));
    assert!(approx(b.height, 70.0));
}

#[test]
fn resize_rejected_throughout_commits_nothing() {
    let (mut core, id) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    let before = bounds_of(&core, &id);
    let actions = drag(&mut core, pt(240.0, 180.0), pt(162.0, 122.0));
    assert!(actions.is_empty());
    assert_eq!(bounds_of(&core, &id), before);
}

#[test]
fn handles_are_inert_without_single_selection() {
    let (mut core, id) = core_with_rect();
    // Not selected: the SE corner is just the body.
    drag(&mut core, pt(240.0, 180.0), pt(250.0, 190.0));
    let b = bounds_of(&core, &id);
    assert!(approx(b.width, 80.0));
    assert!(approx(b.x, 170.0));
}

#[test]
fn rotate_handle_pivots_on_center() {
    let (mut core, id) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    drag(&mut core, pt(200.0, 96.0), pt(254.0, 150.0));

    let b = bounds_of(&core, &id);
    assert!(approx(b.rotation, 90.0));
    assert!(approx(b.width, 80.0));
    let center = b.center();
    assert!(approx(center.x, 200.0));
    assert!(approx(center.y, 150.0));
}

// =============================================================
// Pan and zoom
// =============================================================

#[test]
fn background_drag_pans_camera() {
    let (mut core, _) = core_with_rect();
    drag(&mut core, pt(-50.0, -50.0), pt(-40.0, -45.0));
    assert_eq!(core.camera().pan_x, 10.0);
    assert_eq!(core.camera().pan_y, 5.0);
}

#[test]
fn pan_start_clears_selection() {
    let (mut core, id) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    assert_eq!(core.selection(), vec![id]);

    core.on_pointer_down(pt(20.0, 20.0), Button::Primary, no_modifiers());
    let actions = core.on_pointer_move(pt(25.0, 20.0), no_modifiers());
    assert!(actions.contains(&Action::SelectionChanged(Vec::new())));
    assert!(core.selection().is_empty());

    let later = core.on_pointer_move(pt(30.0, 20.0), no_modifiers());
    assert!(!later.iter().any(|a| matches!(a, Action::SelectionChanged(_))));
}

#[test]
fn middle_button_pans_over_rectangle() {
    let (mut core, id) = core_with_rect();
    core.on_pointer_down(pt(200.0, 150.0), Button::Middle, no_modifiers());
    core.on_pointer_move(pt(190.0, 150.0), no_modifiers());
    core.on_pointer_up(pt(190.0, 150.0), Button::Middle, no_modifiers());
    assert_eq!(core.camera().pan_x, -10.0);
    assert!(approx(bounds_of(&core, &id).x, 160.0));
}

#[test]
fn wheel_zooms_about_cursor() {
    let mut core = core_with_image(400.0, 300.0);
    let cursor = pt(120.0, 80.0);
    let before = core.camera().screen_to_world(cursor);
    let actions = core.on_wheel(cursor, WheelDelta { dx: 0.0, dy: -100.0 }, no_modifiers());
    assert!(has_render_needed(&actions));
    assert!(approx(core.camera().zoom, 1.1));
    let after = core.camera().screen_to_world(cursor);
    assert!(approx(before.x, after.x));
    assert!(approx(before.y, after.y));
}

#[test]
fn wheel_zoom_stays_within_bounds() {
    let mut core = EngineCore::new();
    for _ in 0..100 {
        core.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: 1.0 }, no_modifiers());
    }
    assert!(core.camera().zoom >= MIN_ZOOM);
    assert!(core.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: 1.0 }, no_modifiers()).is_empty());

    for _ in 0..100 {
        core.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: -1.0 }, no_modifiers());
    }
    assert!(core.camera().zoom <= MAX_ZOOM);
}

// =============================================================
// Keyboard
// =============================================================

#[test]
fn escape_cancels_gesture_without_commit() {
    let (mut core, id) = core_with_rect();
    core.on_pointer_down(pt(200.0, 150.0), Button::Primary, no_modifiers());
    core.on_pointer_move(pt(260.0, 150.0), no_modifiers());
    let actions = core.on_key_down(Key("Escape".into()), no_modifiers());
    assert!(has_render_needed(&actions));
    assert!(core.gesture.is_idle());

    let up = core.on_pointer_up(pt(260.0, 150.0), Button::Primary, no_modifiers());
    assert!(up.is_empty());
    assert!(approx(bounds_of(&core, &id).x, 160.0));
}

#[test]
fn escape_clears_selection() {
    let (mut core, _) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    core.on_key_down(Key("Escape".into()), no_modifiers());
    assert!(core.selection().is_empty());
}

#[test]
fn delete_key_removes_selected_rectangles() {
    let (mut core, id) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    core.add_annotation("dog");

    let actions = core.on_key_down(Key("Delete".into()), no_modifiers());
    assert!(actions.contains(&Action::RectangleDeleted { id }));
    assert!(core.rectangle(&id).is_none());
    assert_eq!(core.doc.len(), 1);
    assert!(core.selection().is_empty());
}

#[test]
fn delete_key_during_gesture_is_ignored() {
    let (mut core, id) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    core.on_pointer_down(pt(200.0, 150.0), Button::Primary, no_modifiers());
    assert!(core.on_key_down(Key("Backspace".into()), no_modifiers()).is_empty());
    assert!(core.rectangle(&id).is_some());
}

#[test]
fn unknown_key_is_noop() {
    let (mut core, _) = core_with_rect();
    assert!(core.on_key_down(Key("a".into()), no_modifiers()).is_empty());
}

// =============================================================
// Removal and pruning
// =============================================================

#[test]
fn remove_rectangle_prunes_selection() {
    let (mut core, a) = core_with_rect();
    let Some(Action::RectangleCreated(b)) = core.add_annotation("dog").first().cloned() else {
        panic!("expected RectangleCreated");
    };
    core.update_rectangle(&b.id, RectanglePatch { x: Some(0.0), y: Some(0.0), ..RectanglePatch::default() });
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    click(&mut core, pt(10.0, 10.0), shift_modifier());

    let actions = core.remove_rectangle(&a);
    assert!(actions.contains(&Action::SelectionChanged(vec![b.id])));
    assert_eq!(core.selection(), vec![b.id]);
}

#[test]
fn remove_unknown_rectangle_is_noop() {
    let (mut core, _) = core_with_rect();
    assert!(core.remove_rectangle(&Uuid::new_v4()).is_empty());
    assert_eq!(core.doc.len(), 1);
}

#[test]
fn selection_read_excludes_rectangles_removed_from_store() {
    let (mut core, id) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    core.doc.remove_rectangle(&id);
    assert!(core.selection().is_empty());
}

#[test]
fn removing_gesture_target_cancels_gesture() {
    let (mut core, id) = core_with_rect();
    core.on_pointer_down(pt(200.0, 150.0), Button::Primary, no_modifiers());
    core.remove_rectangle(&id);
    assert!(core.gesture.is_idle());
}

#[test]
fn load_store_prunes_selection_and_cancels_gesture() {
    let (mut core, _) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    core.on_pointer_down(pt(200.0, 150.0), Button::Primary, no_modifiers());
    core.load_store(AnnotationStore::new());
    assert!(core.gesture.is_idle());
    assert!(core.ui.selected_ids.is_empty());
}

// =============================================================
// Direct edits
// =============================================================

#[test]
fn update_rectangle_floors_size() {
    let (mut core, id) = core_with_rect();
    let actions = core.update_rectangle(&id, RectanglePatch { width: Some(2.0), ..RectanglePatch::default() });
    assert!(has_updated(&actions, id));
    assert_eq!(bounds_of(&core, &id).width, MIN_RECT_SIZE);
}

#[test]
fn empty_patch_is_noop() {
    let (mut core, id) = core_with_rect();
    assert!(core.update_rectangle(&id, RectanglePatch::default()).is_empty());
}

#[test]
fn update_label_changes_label() {
    let (mut core, id) = core_with_rect();
    let actions = core.update_label(&id, "dog");
    assert!(has_updated(&actions, id));
    assert_eq!(core.rectangle(&id).map(|r| r.label.as_str()), Some("dog"));
}

#[test]
fn update_label_rejects_empty_label() {
    let (mut core, id) = core_with_rect();
    assert!(core.update_label(&id, "").is_empty());
    assert_eq!(core.rectangle(&id).map(|r| r.label.as_str()), Some("cat"));
}

// =============================================================
// Cursor
// =============================================================

#[test]
fn hover_sets_cursor_once() {
    let (mut core, _) = core_with_rect();
    let actions = core.on_pointer_move(pt(200.0, 150.0), no_modifiers());
    assert_eq!(actions, vec![Action::SetCursor("move".into())]);
    assert!(core.on_pointer_move(pt(201.0, 150.0), no_modifiers()).is_empty());
    let away = core.on_pointer_move(pt(-10.0, -10.0), no_modifiers());
    assert_eq!(away, vec![Action::SetCursor("default".into())]);
}

#[test]
fn hover_over_handle_shows_resize_cursor() {
    let (mut core, _) = core_with_rect();
    click(&mut core, pt(200.0, 150.0), no_modifiers());
    let actions = core.on_pointer_move(pt(240.0, 180.0), no_modifiers());
    assert_eq!(actions, vec![Action::SetCursor("nwse-resize".into())]);
}

#[test]
fn hover_cursor_follows_rectangle_rotation() {
    let (mut core, id) = core_with_rect();
    core.update_rectangle(&id, RectanglePatch { rotation: Some(90.0), ..RectanglePatch::default() });
    click(&mut core, pt(130.0, 160.0), no_modifiers());
    assert_eq!(core.selection(), vec![id]);

    // East handle of the turned box sits below its top-left corner.
    let actions = core.on_pointer_move(pt(130.0, 200.0), no_modifiers());
    assert_eq!(actions, vec![Action::SetCursor("ns-resize".into())]);
}

// =============================================================
// Image and export
// =============================================================

#[test]
fn non_image_upload_is_rejected() {
    let mut core = core_with_image(400.0, 300.0);
    let err = core.begin_image_load("notes.txt", "text/plain", None);
    assert!(matches!(err, Err(ImageError::NotAnImage { .. })));
    assert_eq!(core.image.size(), (400.0, 300.0));
}

#[test]
fn stale_image_load_emits_nothing() {
    let mut core = EngineCore::new();
    let first = core.begin_image_load("a.jpg", "image/jpeg", None).expect("accepted");
    let second = core.begin_image_load("b.jpg", "image/jpeg", None).expect("accepted");
    assert!(core.finish_image_load(first, 10.0, 10.0).expect("stale is ok").is_empty());
    assert_eq!(core.finish_image_load(second, 20.0, 20.0).expect("loads"), vec![Action::RenderNeeded]);
}

#[test]
fn export_voc_lists_rectangles_as_boxes() {
    let mut core = core_with_image(400.0, 300.0);
    let mut store = AnnotationStore::new();
    store.add_rectangle(Rectangle {
        id: Uuid::new_v4(),
        x: 10.0,
        y: 20.0,
        width: 30.0,
        height: 40.0,
        rotation: 0.0,
        label: "dog".into(),
        name: String::new(),
        stroke: "black".into(),
        stroke_width: 1.0,
    });
    core.load_store(store);

    let xml = core.export_voc(3);
    assert!(xml.contains("<filename>photo.jpg</filename>"));
    assert!(xml.contains("<width>400</width>"));
    assert!(xml.contains("<name>dog</name>"));
    assert!(xml.contains("<xmin>10</xmin>"));
    assert!(xml.contains("<ymin>20</ymin>"));
    assert!(xml.contains("<xmax>40</xmax>"));
    assert!(xml.contains("<ymax>60</ymax>"));
}

// =============================================================
// Engine wrapper
// =============================================================

#[test]
fn engine_handlers_forward_core_signatures() {
    let down: fn(&mut Engine, Point, Button, Modifiers) -> Vec<Action> = Engine::on_pointer_down;
    let moved: fn(&mut Engine, Point, Modifiers) -> Vec<Action> = Engine::on_pointer_move;
    let up: fn(&mut Engine, Point, Button, Modifiers) -> Vec<Action> = Engine::on_pointer_up;
    let wheel: fn(&mut Engine, Point, WheelDelta, Modifiers) -> Vec<Action> = Engine::on_wheel;
    let key: fn(&mut Engine, Key, Modifiers) -> Vec<Action> = Engine::on_key_down;
    std::hint::black_box((down, moved, up, wheel, key));
}
