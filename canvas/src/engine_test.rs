#![allow(clippy::float_cmp)]

use super::*;
use crate::input::PointerId;

// =============================================================
// Helpers
// =============================================================

const MOUSE: PointerId = PointerId(1);
const FINGER: PointerId = PointerId(2);

fn core() -> EngineCore {
    let mut core = EngineCore::with_seed(42);
    core.set_viewport(Point::new(0.0, 0.0), Size::new(800.0, 600.0));
    core
}

fn ev(pointer: PointerId, x: f64, y: f64, phase: PointerPhase, target: PointerTarget) -> PointerEvent {
    PointerEvent::new(pointer, Point::new(x, y), phase, target)
}

fn down(core: &mut EngineCore, pointer: PointerId, x: f64, y: f64, target: PointerTarget) -> Vec<Action> {
    core.on_pointer(&ev(pointer, x, y, PointerPhase::Down, target))
}

fn move_to(core: &mut EngineCore, pointer: PointerId, x: f64, y: f64) -> Vec<Action> {
    core.on_pointer(&ev(pointer, x, y, PointerPhase::Move, PointerTarget::Board))
}

fn up(core: &mut EngineCore, pointer: PointerId, x: f64, y: f64) -> Vec<Action> {
    core.on_pointer(&ev(pointer, x, y, PointerPhase::Up, PointerTarget::Board))
}

fn cancel(core: &mut EngineCore, pointer: PointerId) -> Vec<Action> {
    core.on_pointer(&ev(pointer, 0.0, 0.0, PointerPhase::Cancel, PointerTarget::Board))
}

fn pos(core: &EngineCore, id: ItemId) -> (f64, f64) {
    let item = core.item(id).unwrap();
    (item.x, item.y)
}

fn created(actions: &[Action]) -> Vec<Item> {
    actions.iter().filter_map(Action::created_item).cloned().collect()
}

fn add(core: &mut EngineCore, content: &str) -> Item {
    created(&core.add_item(content)).remove(0)
}

fn add_all(core: &mut EngineCore, contents: &[&str]) -> Vec<Item> {
    created(&core.add_items(contents.iter().copied()))
}

fn has_render_needed(actions: &[Action]) -> bool {
    actions.iter().any(|a| matches!(a, Action::RenderNeeded))
}

// =============================================================
// Construction
// =============================================================

#[test]
fn core_new_is_idle_and_empty() {
    let core = EngineCore::new();
    assert!(core.gesture().is_none());
    assert!(core.active().is_none());
    assert!(core.items_by_z_order().is_empty());
    assert!(core.is_default_background());
    assert!(!core.has_background_history());
}

// =============================================================
// Uploads
// =============================================================

#[test]
fn add_items_preserves_upload_order() {
    let mut core = core();
    let items = add_all(&mut core, &["a.png", "b.png", "c.png"]);
    let contents: Vec<&str> = items.iter().map(|i| i.content.as_str()).collect();
    assert_eq!(contents, vec!["a.png", "b.png", "c.png"]);
    let order: Vec<ItemId> = core.items_by_z_order().iter().map(|i| i.id).collect();
    assert_eq!(order, items.iter().map(|i| i.id).collect::<Vec<_>>());
}

#[test]
fn add_items_empty_is_noop() {
    let mut core = core();
    assert!(core.add_items(Vec::<String>::new()).is_empty());
    assert!(core.scene.is_empty());
}

#[test]
fn add_item_reports_creation() {
    let mut core = core();
    let actions = core.add_item("a.png");
    assert_eq!(actions.len(), 2);
    let item = actions[0].created_item().unwrap();
    assert_eq!(core.item(item.id), Some(item));
    assert_eq!(actions[1], Action::RenderNeeded);
}

#[test]
fn add_items_renders_once() {
    let mut core = core();
    let actions = core.add_items(["a", "b"]);
    assert_eq!(created(&actions).len(), 2);
    assert_eq!(actions.iter().filter(|a| **a == Action::RenderNeeded).count(), 1);
}

#[test]
fn add_item_uses_policy_width() {
    let mut core = core();
    core.policy.default_width = 180.0;
    assert_eq!(add(&mut core, "a").width, 180.0);
}

#[test]
fn add_item_in_snap_mode_is_untilted() {
    let mut core = core();
    core.set_snap(true);
    assert_eq!(add(&mut core, "a").rotation, 0.0);
}

// =============================================================
// Move gesture
// =============================================================

#[test]
fn drag_moves_by_exact_delta() {
    let mut core = core();
    let item = add(&mut core, "a.png");
    let (x0, y0) = (item.x, item.y);

    down(&mut core, MOUSE, 300.0, 300.0, PointerTarget::Item(item.id));
    move_to(&mut core, MOUSE, 350.0, 270.0);
    up(&mut core, MOUSE, 350.0, 270.0);

    assert_eq!(pos(&core, item.id), (x0 + 50.0, y0 - 30.0));
    assert!(core.gesture().is_none());
}

#[test]
fn drag_computes_from_origin_not_accumulated() {
    let mut core = core();
    let item = add(&mut core, "a.png");
    let (x0, y0) = (item.x, item.y);

    down(&mut core, MOUSE, 100.0, 100.0, PointerTarget::Item(item.id));
    for step in 1..=25 {
        move_to(&mut core, MOUSE, 100.0 + f64::from(step) * 3.0, 100.0);
    }
    move_to(&mut core, MOUSE, 110.0, 95.0);

    assert_eq!(pos(&core, item.id), (x0 + 10.0, y0 - 5.0));
}

#[test]
fn drag_zero_delta_leaves_item_unchanged() {
    let mut core = core();
    let item = add(&mut core, "a.png");

    down(&mut core, MOUSE, 200.0, 200.0, PointerTarget::Item(item.id));
    move_to(&mut core, MOUSE, 200.0, 200.0);
    up(&mut core, MOUSE, 200.0, 200.0);

    let after = core.item(item.id).unwrap();
    assert_eq!((after.x, after.y, after.width), (item.x, item.y, item.width));
}

#[test]
fn drag_uses_board_coordinates() {
    let mut core = core();
    core.set_viewport(Point::new(40.0, 80.0), Size::new(800.0, 600.0));
    let item = add(&mut core, "a.png");
    let (x0, y0) = (item.x, item.y);

    down(&mut core, MOUSE, 140.0, 180.0, PointerTarget::Item(item.id));
    move_to(&mut core, MOUSE, 150.0, 200.0);

    assert_eq!(pos(&core, item.id), (x0 + 10.0, y0 + 20.0));
    assert_eq!(core.gesture().unwrap().anchor, Point::new(100.0, 100.0));
}

#[test]
fn drag_in_snap_mode_lands_on_grid() {
    let mut core = core();
    let item = add(&mut core, "a.png");
    core.set_snap(true);

    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(item.id));
    for (x, y) in [(3.0, 7.0), (33.3, -12.0), (91.0, 64.0)] {
        move_to(&mut core, MOUSE, x, y);
        let (ix, iy) = pos(&core, item.id);
        assert_eq!(ix % 40.0, 0.0);
        assert_eq!(iy % 40.0, 0.0);
    }
}

#[test]
fn move_emits_update_and_render() {
    let mut core = core();
    let item = add(&mut core, "a.png");
    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(item.id));

    let actions = move_to(&mut core, MOUSE, 5.0, 5.0);
    assert!(has_render_needed(&actions));
    assert!(matches!(
        actions[0],
        Action::ItemUpdated { id, fields: ItemPatch { x: Some(_), y: Some(_), width: None, .. } } if id == item.id
    ));
}

// =============================================================
// Resize gesture
// =============================================================

#[test]
fn resize_uses_horizontal_delta_only() {
    let mut core = core();
    let item = add(&mut core, "a.png");

    down(&mut core, MOUSE, 500.0, 500.0, PointerTarget::ResizeHandle(item.id));
    move_to(&mut core, MOUSE, 540.0, 900.0);

    let after = core.item(item.id).unwrap();
    assert_eq!(after.width, 290.0);
    assert_eq!((after.x, after.y), (item.x, item.y));
}

#[test]
fn resize_clamps_at_minimum() {
    let mut core = core();
    let item = add(&mut core, "a.png");

    down(&mut core, MOUSE, 500.0, 500.0, PointerTarget::ResizeHandle(item.id));
    move_to(&mut core, MOUSE, -2000.0, 500.0);

    assert_eq!(core.item(item.id).unwrap().width, 50.0);
}

#[test]
fn resize_in_snap_mode_lands_on_half_pitch() {
    let mut core = core();
    let item = add(&mut core, "a.png");
    core.set_snap(true);

    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::ResizeHandle(item.id));
    for dx in [-300.0, -17.0, 4.0, 71.5] {
        move_to(&mut core, MOUSE, dx, 0.0);
        assert_eq!(core.item(item.id).unwrap().width % 20.0, 0.0);
    }
}

#[test]
fn resize_preserves_aspect_ratio() {
    let mut core = core();
    let item = add(&mut core, "a.png");
    core.report_natural_size(item.id, 400, 300);

    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::ResizeHandle(item.id));
    move_to(&mut core, MOUSE, 150.0, 0.0);

    let after = core.item(item.id).unwrap();
    assert_eq!(after.width, 400.0);
    assert_eq!(after.height(), Some(300.0));
}

#[test]
fn resize_respects_configured_max() {
    let mut core = core();
    core.policy.max_width = Some(300.0);
    let item = add(&mut core, "a.png");

    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::ResizeHandle(item.id));
    move_to(&mut core, MOUSE, 5000.0, 0.0);

    assert_eq!(core.item(item.id).unwrap().width, 300.0);
}

// =============================================================
// Gesture start side effects
// =============================================================

#[test]
fn pointer_down_brings_item_to_front() {
    let mut core = core();
    let a = add(&mut core, "a");
    let b = add(&mut core, "b");

    let actions = down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(a.id));

    assert!(core.item(a.id).unwrap().z_index > core.item(b.id).unwrap().z_index);
    assert_eq!(core.items_by_z_order().last().unwrap().id, a.id);
    assert!(actions.contains(&Action::GestureStarted { id: a.id, mode: GestureMode::Move }));
    let z_index = core.item(a.id).unwrap().z_index;
    assert!(actions.contains(&Action::ItemRaised { id: a.id, z_index }));
}

#[test]
fn pointer_down_activates_item_and_release_keeps_it() {
    let mut core = core();
    let a = add(&mut core, "a");

    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(a.id));
    assert_eq!(core.active(), Some(a.id));
    up(&mut core, MOUSE, 0.0, 0.0);
    assert_eq!(core.active(), Some(a.id));
}

#[test]
fn pointer_down_on_board_clears_active() {
    let mut core = core();
    let a = add(&mut core, "a");
    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(a.id));
    up(&mut core, MOUSE, 0.0, 0.0);

    let actions = down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Board);
    assert!(core.active().is_none());
    assert!(actions.contains(&Action::ActiveChanged(None)));
    assert!(core.gesture().is_none());
}

#[test]
fn pointer_down_on_unknown_item_stays_idle() {
    let mut core = core();
    let actions = down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(ItemId(999)));
    assert!(actions.is_empty());
    assert!(core.gesture().is_none());
}

// =============================================================
// Idle and foreign pointers
// =============================================================

#[test]
fn move_while_idle_is_noop() {
    let mut core = core();
    let item = add(&mut core, "a");
    let actions = move_to(&mut core, MOUSE, 100.0, 100.0);
    assert!(actions.is_empty());
    assert_eq!(pos(&core, item.id), (item.x, item.y));
}

#[test]
fn up_while_idle_is_noop() {
    let mut core = core();
    assert!(up(&mut core, MOUSE, 0.0, 0.0).is_empty());
    assert!(cancel(&mut core, MOUSE).is_empty());
}

#[test]
fn second_pointer_cannot_start_gesture() {
    let mut core = core();
    let a = add(&mut core, "a");
    let b = add(&mut core, "b");

    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(a.id));
    let actions = down(&mut core, FINGER, 0.0, 0.0, PointerTarget::Item(b.id));

    assert!(actions.is_empty());
    let g = core.gesture().unwrap();
    assert_eq!((g.pointer_id, g.item_id), (MOUSE, a.id));
    assert_eq!(core.active(), Some(a.id));
}

#[test]
fn second_pointer_moves_are_ignored() {
    let mut core = core();
    let a = add(&mut core, "a");
    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(a.id));

    assert!(move_to(&mut core, FINGER, 500.0, 500.0).is_empty());
    assert_eq!(pos(&core, a.id), (a.x, a.y));

    assert!(up(&mut core, FINGER, 0.0, 0.0).is_empty());
    assert!(core.gesture().is_some());
}

#[test]
fn same_pointer_down_replaces_stale_gesture() {
    let mut core = core();
    let a = add(&mut core, "a");
    let b = add(&mut core, "b");

    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(a.id));
    let actions = down(&mut core, MOUSE, 10.0, 10.0, PointerTarget::ResizeHandle(b.id));

    assert_eq!(actions[0], Action::GestureEnded { id: a.id });
    let g = core.gesture().unwrap();
    assert_eq!((g.item_id, g.mode), (b.id, GestureMode::Resize));
}

// =============================================================
// Release / cancel
// =============================================================

#[test]
fn up_ends_gesture_without_rollback() {
    let mut core = core();
    let a = add(&mut core, "a");
    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(a.id));
    move_to(&mut core, MOUSE, 25.0, 25.0);

    let actions = up(&mut core, MOUSE, 25.0, 25.0);
    assert_eq!(actions, vec![Action::GestureEnded { id: a.id }]);
    assert_eq!(pos(&core, a.id), (a.x + 25.0, a.y + 25.0));
}

#[test]
fn cancel_keeps_last_applied_position() {
    let mut core = core();
    let a = add(&mut core, "a");
    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(a.id));
    move_to(&mut core, MOUSE, -15.0, 40.0);

    let actions = cancel(&mut core, MOUSE);
    assert_eq!(actions, vec![Action::GestureCancelled { id: a.id }]);
    assert_eq!(pos(&core, a.id), (a.x - 15.0, a.y + 40.0));
    assert!(core.gesture().is_none());

    // Later moves no longer apply.
    move_to(&mut core, MOUSE, 300.0, 300.0);
    assert_eq!(pos(&core, a.id), (a.x - 15.0, a.y + 40.0));
}

// =============================================================
// Stale targets
// =============================================================

#[test]
fn removing_target_mid_gesture_is_noop_until_release() {
    let mut core = core();
    let a = add(&mut core, "a");
    let b = add(&mut core, "b");
    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(a.id));

    let actions = core.remove_item(a.id);
    assert_eq!(actions, vec![Action::ItemDeleted { id: a.id }, Action::ActiveChanged(None), Action::RenderNeeded]);
    assert!(core.active().is_none());

    assert!(move_to(&mut core, MOUSE, 50.0, 50.0).is_empty());
    assert_eq!(pos(&core, b.id), (b.x, b.y));
    assert_eq!(up(&mut core, MOUSE, 50.0, 50.0), vec![Action::GestureEnded { id: a.id }]);
    assert!(core.gesture().is_none());
}

// =============================================================
// Discrete operations
// =============================================================

#[test]
fn adjust_width_applies_delta() {
    let mut core = core();
    let a = add(&mut core, "a");
    assert_eq!(
        core.adjust_width(a.id, 25.0),
        vec![Action::ItemUpdated { id: a.id, fields: ItemPatch::width(275.0) }, Action::RenderNeeded]
    );
    core.adjust_width(a.id, -50.0);
    assert_eq!(core.item(a.id).unwrap().width, 225.0);
}

#[test]
fn adjust_width_clamps_to_minimum() {
    let mut core = core();
    let a = add(&mut core, "a");
    let actions = core.adjust_width(a.id, -10_000.0);
    assert!(actions.contains(&Action::ItemUpdated { id: a.id, fields: ItemPatch::width(50.0) }));
    assert_eq!(core.item(a.id).unwrap().width, 50.0);
}

#[test]
fn adjust_width_unknown_item() {
    let mut core = core();
    assert!(core.adjust_width(ItemId(5), 10.0).is_empty());
}

#[test]
fn adjust_width_during_gesture_does_not_disturb_it() {
    let mut core = core();
    let a = add(&mut core, "a");
    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(a.id));
    core.adjust_width(a.id, 30.0);
    assert_eq!(core.gesture().unwrap().orig_width, 250.0);
    assert_eq!(core.item(a.id).unwrap().width, 280.0);
}

#[test]
fn bring_to_front_is_strictly_above_all() {
    let mut core = core();
    let items = add_all(&mut core, &["a", "b", "c"]);
    let actions = core.bring_to_front(items[1].id);
    let z = core.item(items[1].id).unwrap().z_index;
    assert_eq!(actions, vec![Action::ItemRaised { id: items[1].id, z_index: z }, Action::RenderNeeded]);
    for other in [items[0].id, items[2].id] {
        assert!(z > core.item(other).unwrap().z_index);
    }
}

#[test]
fn remove_inactive_item_keeps_active() {
    let mut core = core();
    let a = add(&mut core, "a");
    let b = add(&mut core, "b");
    down(&mut core, MOUSE, 0.0, 0.0, PointerTarget::Item(a.id));
    up(&mut core, MOUSE, 0.0, 0.0);

    assert_eq!(core.remove_item(b.id), vec![Action::ItemDeleted { id: b.id }, Action::RenderNeeded]);
    assert_eq!(core.active(), Some(a.id));
}

#[test]
fn bring_to_front_unknown_is_empty() {
    let mut core = core();
    assert!(core.bring_to_front(ItemId(9)).is_empty());
}

#[test]
fn remove_item_unknown_is_empty() {
    let mut core = core();
    assert!(core.remove_item(ItemId(1)).is_empty());
}

// =============================================================
// Background
// =============================================================

#[test]
fn set_background_from_item_copies_content() {
    let mut core = core();
    let a = add(&mut core, "photo.png");
    let actions = core.set_background_from_item(a.id);
    assert_eq!(actions, vec![Action::BackgroundChanged(Background::Image("photo.png".into())), Action::RenderNeeded]);

    assert_eq!(core.background(), &Background::Image("photo.png".into()));
    assert!(core.has_background_history());
    assert_eq!(core.item(a.id).unwrap(), &a);
}

#[test]
fn set_background_reports_change() {
    let mut core = core();
    assert_eq!(
        core.set_background("bg.png"),
        vec![Action::BackgroundChanged(Background::Image("bg.png".into())), Action::RenderNeeded]
    );
}

#[test]
fn set_background_from_unknown_item_changes_nothing() {
    let mut core = core();
    assert!(core.set_background_from_item(ItemId(3)).is_empty());
    assert!(core.is_default_background());
    assert!(!core.has_background_history());
}

#[test]
fn reset_background_restores_previous() {
    let mut core = core();
    core.set_background("a.png");
    core.set_background("b.png");
    assert!(core.reset_background().contains(&Action::BackgroundChanged(Background::Image("a.png".into()))));
    assert_eq!(core.background().image(), Some("a.png"));
    assert!(core.reset_background().contains(&Action::BackgroundChanged(Background::Default)));
    assert!(core.is_default_background());
    assert!(core.reset_background().is_empty());
}

#[test]
fn background_survives_item_removal() {
    let mut core = core();
    let a = add(&mut core, "a.png");
    core.set_background_from_item(a.id);
    core.remove_item(a.id);
    assert_eq!(core.background().image(), Some("a.png"));
}

// =============================================================
// Snap mode
// =============================================================

#[test]
fn toggle_snap_flips() {
    let mut core = core();
    assert!(core.toggle_snap());
    assert!(core.ui.snap_enabled);
    assert!(!core.toggle_snap());
}

// =============================================================
// Snapshot
// =============================================================

#[test]
fn snapshot_is_in_paint_order() {
    let mut core = core();
    let items = add_all(&mut core, &["a", "b", "c"]);
    core.bring_to_front(items[0].id);

    let snap = core.snapshot();
    let ids: Vec<ItemId> = snap.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![items[1].id, items[2].id, items[0].id]);
    assert_eq!(snap.board, Size::new(800.0, 600.0));
    assert_eq!(snap.grid_pitch, 40.0);
}

#[test]
fn snapshot_is_isolated_from_later_edits() {
    let mut core = core();
    let a = add(&mut core, "a");
    let snap = core.snapshot();

    core.adjust_width(a.id, 100.0);
    core.set_background("bg.png");
    core.set_snap(true);
    add(&mut core, "b");

    assert_eq!(snap.items.len(), 1);
    assert_eq!(snap.items[0].width, 250.0);
    assert!(snap.background.is_default());
    assert!(!snap.snap_enabled);
}

// =============================================================
// End-to-end
// =============================================================

#[test]
fn upload_then_drag_scenario() {
    let mut core = core();
    let item = add_all(&mut core, &["data:image/png;base64,AAAA"]).remove(0);
    assert!((-3.0..=3.0).contains(&item.rotation));
    assert_eq!(item.width, 250.0);
    assert_eq!(item.z_index, 10);

    down(&mut core, MOUSE, 400.0, 300.0, PointerTarget::Item(item.id));
    move_to(&mut core, MOUSE, 450.0, 270.0);
    up(&mut core, MOUSE, 450.0, 270.0);

    assert_eq!(pos(&core, item.id), (item.x + 50.0, item.y - 30.0));
}
