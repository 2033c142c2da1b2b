use tracing::{debug, trace};

use crate::background::{Background, BackgroundStack};
use crate::input::{
    Gesture, GestureMode, InputState, Policy, PointerEvent, PointerPhase, PointerTarget, UiState, moved_position,
    resized_width,
};
use crate::scene::{Item, ItemId, ItemPatch, NaturalSize, Placement, Scene};
use crate::viewport::{Point, Size, Viewport};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ItemCreated(Item),
    ItemUpdated { id: ItemId, fields: ItemPatch },
    ItemRaised { id: ItemId, z_index: i64 },
    ItemDeleted { id: ItemId },
    BackgroundChanged(Background),
    GestureStarted { id: ItemId, mode: GestureMode },
    GestureEnded { id: ItemId },
    GestureCancelled { id: ItemId },
    ActiveChanged(Option<ItemId>),
    RenderNeeded,
}

impl Action {
    /// The item carried by an `ItemCreated` action.
    #[must_use]
    pub fn created_item(&self) -> Option<&Item> {
        match self {
            Self::ItemCreated(item) => Some(item),
            _ => None,
        }
    }
}

/// Owned copy of everything the export pipeline draws.
///
/// Taken synchronously; later scene edits never reach an existing snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    /// Items in paint order (ascending z-index, ties in insertion order).
    pub items: Vec<Item>,
    pub background: Background,
    /// Grid is drawn when snap mode is on.
    pub snap_enabled: bool,
    pub grid_pitch: f64,
    /// Visible board size in board units.
    pub board: Size,
}

/// Core engine state: scene, background, gesture, and UI flags.
///
/// Every operation is synchronous and completes before returning.
pub struct EngineCore {
    pub scene: Scene,
    pub background: BackgroundStack,
    pub input: InputState,
    pub ui: UiState,
    pub viewport: Viewport,
    pub policy: Policy,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_scene(Scene::new())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with reproducible spawn jitter and tilt.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_scene(Scene::with_seed(seed))
    }

    fn with_scene(scene: Scene) -> Self {
        Self {
            scene,
            background: BackgroundStack::new(),
            input: InputState::Idle,
            ui: UiState::default(),
            viewport: Viewport::default(),
            policy: Policy::default(),
        }
    }

    // --- Viewport ---

    /// Update the board's screen origin and visible size.
    pub fn set_viewport(&mut self, origin: Point, size: Size) {
        self.viewport = Viewport::new(origin, size);
    }

    // --- Items ---

    /// Place one uploaded image on the board.
    pub fn add_item(&mut self, content: impl Into<String>) -> Vec<Action> {
        vec![self.place(content), Action::RenderNeeded]
    }

    /// Place several uploads, preserving their order.
    pub fn add_items<I, S>(&mut self, payloads: I) -> Vec<Action>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut actions: Vec<Action> = payloads.into_iter().map(|p| self.place(p)).collect();
        if !actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    fn place(&mut self, content: impl Into<String>) -> Action {
        let placement = Placement {
            board: self.viewport.size,
            snap: self.ui.snap_enabled,
            width: self.policy.default_width,
        };
        Action::ItemCreated(self.scene.add_item(content, &placement))
    }

    /// Remove an item. Safe while a gesture targets it.
    pub fn remove_item(&mut self, id: ItemId) -> Vec<Action> {
        if self.scene.remove_item(id).is_none() {
            return Vec::new();
        }
        let mut actions = vec![Action::ItemDeleted { id }];
        if self.ui.active_id == Some(id) {
            self.ui.active_id = None;
            actions.push(Action::ActiveChanged(None));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Grow or shrink an item by `delta` units, clamped to the width policy.
    ///
    /// Unknown ids produce no actions.
    pub fn adjust_width(&mut self, id: ItemId, delta: f64) -> Vec<Action> {
        let Some(current) = self.scene.get(id).map(|i| i.width) else {
            return Vec::new();
        };
        let fields = ItemPatch::width(self.policy.clamp_width(current + delta));
        self.scene.update_item(id, &fields);
        vec![Action::ItemUpdated { id, fields }, Action::RenderNeeded]
    }

    /// Raise an item above all others.
    pub fn bring_to_front(&mut self, id: ItemId) -> Vec<Action> {
        match self.scene.reorder_to_front(id) {
            Some(z_index) => vec![Action::ItemRaised { id, z_index }, Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    /// Record the natural pixel size the display layer decoded for an item.
    pub fn report_natural_size(&mut self, id: ItemId, width: u32, height: u32) -> bool {
        self.scene.set_natural_size(id, NaturalSize { width, height })
    }

    // --- Background ---

    pub fn set_background(&mut self, content: impl Into<String>) -> Vec<Action> {
        self.background.set_background(content);
        self.background_changed()
    }

    /// Use an item's image as the background. The item stays on the board.
    pub fn set_background_from_item(&mut self, id: ItemId) -> Vec<Action> {
        let Some(content) = self.scene.get(id).map(|i| i.content.clone()) else {
            return Vec::new();
        };
        self.set_background(content)
    }

    /// Undo the last background change. No-op with an empty history.
    pub fn reset_background(&mut self) -> Vec<Action> {
        if !self.background.reset_background() {
            return Vec::new();
        }
        self.background_changed()
    }

    fn background_changed(&self) -> Vec<Action> {
        vec![Action::BackgroundChanged(self.background.current().clone()), Action::RenderNeeded]
    }

    // --- Snap mode ---

    pub fn set_snap(&mut self, enabled: bool) {
        self.ui.snap_enabled = enabled;
    }

    /// Flip snap mode and return the new value.
    pub fn toggle_snap(&mut self) -> bool {
        self.ui.snap_enabled = !self.ui.snap_enabled;
        self.ui.snap_enabled
    }

    // --- Input events ---

    /// Feed one pointer event through the gesture state machine.
    pub fn on_pointer(&mut self, event: &PointerEvent) -> Vec<Action> {
        match event.phase {
            PointerPhase::Down => self.on_pointer_down(event),
            PointerPhase::Move => self.on_pointer_move(event),
            PointerPhase::Up => self.on_pointer_release(event, false),
            PointerPhase::Cancel => self.on_pointer_release(event, true),
        }
    }

    fn on_pointer_down(&mut self, event: &PointerEvent) -> Vec<Action> {
        let mut actions = Vec::new();

        if let InputState::Dragging(active) = self.input {
            if active.pointer_id != event.pointer_id {
                debug!(pointer = event.pointer_id.0, owner = active.pointer_id.0, "second pointer rejected during gesture");
                return actions;
            }
            // Same pointer pressed again without a release; the old gesture is over.
            self.input = InputState::Idle;
            actions.push(Action::GestureEnded { id: active.item_id });
        }

        let (id, mode) = match event.target {
            PointerTarget::Board => {
                if self.ui.active_id.take().is_some() {
                    actions.push(Action::ActiveChanged(None));
                    actions.push(Action::RenderNeeded);
                }
                return actions;
            }
            PointerTarget::Item(id) => (id, GestureMode::Move),
            PointerTarget::ResizeHandle(id) => (id, GestureMode::Resize),
        };

        let Some(item) = self.scene.get(id) else {
            debug!(item = %id, "pointer down on unknown item ignored");
            return actions;
        };

        self.input = InputState::Dragging(Gesture {
            pointer_id: event.pointer_id,
            mode,
            item_id: id,
            anchor: self.viewport.screen_to_board(event.point),
            orig_x: item.x,
            orig_y: item.y,
            orig_width: item.width,
        });

        if let Some(z_index) = self.scene.reorder_to_front(id) {
            actions.push(Action::ItemRaised { id, z_index });
        }
        self.ui.active_id = Some(id);
        actions.push(Action::GestureStarted { id, mode });
        actions.push(Action::ActiveChanged(Some(id)));
        actions.push(Action::RenderNeeded);
        actions
    }

    fn on_pointer_move(&mut self, event: &PointerEvent) -> Vec<Action> {
        let InputState::Dragging(gesture) = self.input else {
            return Vec::new();
        };
        if gesture.pointer_id != event.pointer_id {
            return Vec::new();
        }

        let delta = self.viewport.screen_to_board(event.point).delta_from(gesture.anchor);
        let snap = self.ui.snap_enabled;
        let patch = match gesture.mode {
            GestureMode::Move => {
                let (x, y) = moved_position(&gesture, delta, &self.policy, snap);
                ItemPatch::position(x, y)
            }
            GestureMode::Resize => ItemPatch::width(resized_width(gesture.orig_width, delta.x, &self.policy, snap)),
        };

        if !self.scene.update_item(gesture.item_id, &patch) {
            trace!(item = %gesture.item_id, "gesture target no longer on board");
            return Vec::new();
        }
        vec![Action::ItemUpdated { id: gesture.item_id, fields: patch }, Action::RenderNeeded]
    }

    fn on_pointer_release(&mut self, event: &PointerEvent, cancelled: bool) -> Vec<Action> {
        let InputState::Dragging(gesture) = self.input else {
            return Vec::new();
        };
        if gesture.pointer_id != event.pointer_id {
            return Vec::new();
        }

        self.input = InputState::Idle;
        let id = gesture.item_id;
        if cancelled {
            vec![Action::GestureCancelled { id }]
        } else {
            vec![Action::GestureEnded { id }]
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.scene.get(id)
    }

    #[must_use]
    pub fn items_by_z_order(&self) -> Vec<&Item> {
        self.scene.items_by_z_order()
    }

    #[must_use]
    pub fn background(&self) -> &Background {
        self.background.current()
    }

    #[must_use]
    pub fn is_default_background(&self) -> bool {
        self.background.is_default()
    }

    #[must_use]
    pub fn has_background_history(&self) -> bool {
        self.background.has_history()
    }

    /// The item whose controls are shown, if any.
    #[must_use]
    pub fn active(&self) -> Option<ItemId> {
        self.ui.active_id
    }

    /// The gesture in progress, if any.
    #[must_use]
    pub fn gesture(&self) -> Option<&Gesture> {
        self.input.gesture()
    }

    /// Copy the drawable state for an export.
    #[must_use]
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            items: self.scene.items_by_z_order().into_iter().cloned().collect(),
            background: self.background.current().clone(),
            snap_enabled: self.ui.snap_enabled,
            grid_pitch: self.policy.grid_pitch,
            board: self.viewport.size,
        }
    }
}
