//! Input model: pointer events, snap policy, and the gesture state machine.
//!
//! This module defines the types consumed by the input engine. A
//! `PointerEvent` carries the logical pointer id, its screen position, its
//! phase, and what the host says is under it. `InputState` is the single
//! active gesture being tracked between pointer-down and pointer-up, carrying
//! the values captured at gesture start so every step is computed from the
//! original position rather than accumulated.
//!
//! The step functions at the bottom are pure so that snapping and clamping can
//! be tested without an engine.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ITEM_WIDTH, GRID_PITCH, MIN_ITEM_WIDTH};
use crate::scene::ItemId;
use crate::viewport::Point;

/// Logical pointer identifier (mouse, pen, or one touch contact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointerId(pub u32);

/// Lifecycle phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// Contact lost or capture revoked by the platform.
    Cancel,
}

/// What the host reports under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum PointerTarget {
    /// Empty board.
    Board,
    /// The body of an item.
    Item(ItemId),
    /// The resize handle of an item.
    ResizeHandle(ItemId),
}

/// A raw pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub pointer_id: PointerId,
    pub point: Point,
    pub phase: PointerPhase,
    pub target: PointerTarget,
}

impl PointerEvent {
    #[must_use]
    pub fn new(pointer_id: PointerId, point: Point, phase: PointerPhase, target: PointerTarget) -> Self {
        Self { pointer_id, point, phase, target }
    }
}

/// What a gesture does to its item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureMode {
    Move,
    Resize,
}

/// Context captured when a gesture starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    /// The pointer that owns this gesture; events from other pointers are ignored.
    pub pointer_id: PointerId,
    /// Fixed for the gesture's lifetime.
    pub mode: GestureMode,
    /// Id of the item being manipulated.
    pub item_id: ItemId,
    /// Board-space pointer position at gesture start.
    pub anchor: Point,
    /// Item x at gesture start.
    pub orig_x: f64,
    /// Item y at gesture start.
    pub orig_y: f64,
    /// Item width at gesture start.
    pub orig_width: f64,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A move or resize gesture owns a pointer.
    Dragging(Gesture),
}

impl InputState {
    /// The active gesture, if any.
    #[must_use]
    pub fn gesture(&self) -> Option<&Gesture> {
        match self {
            Self::Idle => None,
            Self::Dragging(g) => Some(g),
        }
    }
}

/// Persistent UI state visible to the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct UiState {
    /// Grid display and snapping are on.
    pub snap_enabled: bool,
    /// The item whose controls are shown. Set by the last gesture, kept after release.
    pub active_id: Option<ItemId>,
}

/// Sizing and snapping rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Policy {
    /// Position snap pitch in board units.
    pub grid_pitch: f64,
    /// Smallest width any resize produces.
    pub min_width: f64,
    /// Largest width any resize produces. `None` leaves growth unbounded.
    pub max_width: Option<f64>,
    /// Width given to new items.
    pub default_width: f64,
    /// In snap mode, resize widths land on multiples of half the grid pitch.
    pub snap_resize_to_half_pitch: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            grid_pitch: GRID_PITCH,
            min_width: MIN_ITEM_WIDTH,
            max_width: None,
            default_width: DEFAULT_ITEM_WIDTH,
            snap_resize_to_half_pitch: true,
        }
    }
}

impl Policy {
    /// Clamp a width to `[min_width, max_width]`.
    #[must_use]
    pub fn clamp_width(&self, width: f64) -> f64 {
        let floored = if width.is_nan() { self.min_width } else { width.max(self.min_width) };
        match self.max_width {
            Some(max) => floored.min(max.max(self.min_width)),
            None => floored,
        }
    }
}

/// Round `value` to the nearest multiple of `pitch`.
#[must_use]
pub fn snap(value: f64, pitch: f64) -> f64 {
    if pitch <= 0.0 {
        return value;
    }
    (value / pitch).round() * pitch
}

/// Position for a move gesture displaced by `delta` from its anchor.
#[must_use]
pub fn moved_position(gesture: &Gesture, delta: Point, policy: &Policy, snap_enabled: bool) -> (f64, f64) {
    let x = gesture.orig_x + delta.x;
    let y = gesture.orig_y + delta.y;
    if snap_enabled {
        (snap(x, policy.grid_pitch), snap(y, policy.grid_pitch))
    } else {
        (x, y)
    }
}

/// Width for a resize gesture dragged `dx` units horizontally.
///
/// When snapping, the result is the nearest half-pitch multiple inside the
/// policy bounds, so it never falls below the minimum.
#[must_use]
pub fn resized_width(orig_width: f64, dx: f64, policy: &Policy, snap_enabled: bool) -> f64 {
    let width = policy.clamp_width(orig_width + dx);
    if !(snap_enabled && policy.snap_resize_to_half_pitch) {
        return width;
    }

    let step = policy.grid_pitch / 2.0;
    if step <= 0.0 {
        return width;
    }
    let snapped = snap(width, step);
    if snapped < policy.min_width {
        return (policy.min_width / step).ceil() * step;
    }
    if let Some(max) = policy.max_width {
        if snapped > max {
            let lowered = (max / step).floor() * step;
            return if lowered >= policy.min_width { lowered } else { width };
        }
    }
    snapped
}
