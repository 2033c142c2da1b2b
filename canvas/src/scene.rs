//! Scene model: placed items, their properties, and the in-memory store.
//!
//! This module defines the data that describes what is on the board (`Item`,
//! `ItemKind`), a sparse-update type for incremental edits (`ItemPatch`), and
//! the store that owns every live item (`Scene`).
//!
//! Items enter through uploads and are mutated by the input engine. Both the
//! host display and the export pipeline read them in paint order via
//! [`Scene::items_by_z_order`].
//!
//! An item's height is never stored. It is derived from the current width and
//! the natural aspect ratio of its image whenever it is needed, so every resize
//! path preserves the aspect ratio.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ITEM_WIDTH, FALLBACK_SPAWN, MAX_TILT_DEG, SPAWN_JITTER};
use crate::layering::next_z_index;
use crate::viewport::Size;

/// Unique identifier for a placed item, stable for the item's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// The kind of a placed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A raster image.
    #[default]
    Image,
    /// Reserved for text notes. Never created by the engine.
    Text,
}

/// Pixel dimensions of an item's decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalSize {
    pub width: u32,
    pub height: u32,
}

impl NaturalSize {
    /// `height / width`, or `None` for a degenerate image.
    #[must_use]
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(f64::from(self.height) / f64::from(self.width))
    }
}

/// Height of an item drawn `width` units wide with the given `height / width` ratio.
#[must_use]
pub fn derive_height(width: f64, aspect_ratio: f64) -> f64 {
    width * aspect_ratio
}

/// An item placed on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier for this item.
    pub id: ItemId,
    /// Content type.
    pub kind: ItemKind,
    /// Opaque image payload: a data URI, URL or path. Never changes.
    pub content: String,
    /// Left edge in board-local coordinates.
    pub x: f64,
    /// Top edge in board-local coordinates.
    pub y: f64,
    /// Drawn width in board units.
    pub width: f64,
    /// Stacking order; lower values are drawn beneath higher values.
    pub z_index: i64,
    /// Clockwise rotation in degrees around the item's center.
    pub rotation: f64,
    /// Natural image size, once the display layer has decoded it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_size: Option<NaturalSize>,
}

impl Item {
    /// Current drawn height, if the natural aspect ratio is known.
    #[must_use]
    pub fn height(&self) -> Option<f64> {
        self.natural_size
            .and_then(|n| n.aspect_ratio())
            .map(|ratio| derive_height(self.width, ratio))
    }
}

/// Sparse update for an item. Only present fields are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl ItemPatch {
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Self::default() }
    }

    #[must_use]
    pub fn width(width: f64) -> Self {
        Self { width: Some(width), ..Self::default() }
    }

    #[must_use]
    pub fn z_index(z_index: i64) -> Self {
        Self { z_index: Some(z_index), ..Self::default() }
    }

    /// Copy of `item` with this patch applied.
    #[must_use]
    pub fn applied_to(&self, item: &Item) -> Item {
        Item {
            x: self.x.unwrap_or(item.x),
            y: self.y.unwrap_or(item.y),
            width: self.width.unwrap_or(item.width),
            z_index: self.z_index.unwrap_or(item.z_index),
            rotation: self.rotation.unwrap_or(item.rotation),
            ..item.clone()
        }
    }
}

/// Context for placing a newly uploaded item.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    /// Visible board size; may be zero before the host reports it.
    pub board: Size,
    /// Snap mode suppresses the random tilt.
    pub snap: bool,
    /// Initial width.
    pub width: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self { board: Size::default(), snap: false, width: DEFAULT_ITEM_WIDTH }
    }
}

/// Owning store of every item on the board.
///
/// Items keep their insertion order, which breaks ties between equal
/// z-indices when painting.
#[derive(Debug, Clone)]
pub struct Scene {
    items: Vec<Item>,
    next_id: u64,
    rng: StdRng,
}

impl Scene {
    /// Create an empty scene with OS-seeded jitter.
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new(), next_id: 1, rng: StdRng::from_os_rng() }
    }

    /// Create an empty scene whose jitter and tilt are reproducible.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self { items: Vec::new(), next_id: 1, rng: StdRng::seed_from_u64(seed) }
    }

    /// Place a new image item and return a copy of it.
    pub fn add_item(&mut self, content: impl Into<String>, placement: &Placement) -> Item {
        let id = ItemId(self.next_id);
        self.next_id += 1;

        let (x, y) = self.spawn_position(placement);
        let rotation = if placement.snap {
            0.0
        } else {
            self.rng.random_range(-MAX_TILT_DEG..=MAX_TILT_DEG)
        };

        let item = Item {
            id,
            kind: ItemKind::Image,
            content: content.into(),
            x,
            y,
            width: placement.width,
            z_index: next_z_index(self.items.iter().map(|i| i.z_index)),
            rotation,
            natural_size: None,
        };
        self.items.push(item.clone());
        item
    }

    fn spawn_position(&mut self, placement: &Placement) -> (f64, f64) {
        let jx = self.rng.random_range(-SPAWN_JITTER..=SPAWN_JITTER);
        let jy = self.rng.random_range(-SPAWN_JITTER..=SPAWN_JITTER);

        let board = placement.board;
        if !board.is_known() {
            return (FALLBACK_SPAWN + jx, FALLBACK_SPAWN + jy);
        }

        let half = placement.width / 2.0;
        let center = board.center();
        let max_x = (board.width - placement.width).max(0.0);
        let max_y = (board.height - placement.width).max(0.0);
        ((center.x - half + jx).clamp(0.0, max_x), (center.y - half + jy).clamp(0.0, max_y))
    }

    /// Remove an item by id, returning it if it was present.
    pub fn remove_item(&mut self, id: ItemId) -> Option<Item> {
        let idx = self.index_of(id)?;
        Some(self.items.remove(idx))
    }

    /// Apply a patch. Returns false if the item doesn't exist.
    ///
    /// The patched copy replaces the stored item in a single assignment.
    pub fn update_item(&mut self, id: ItemId, patch: &ItemPatch) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.items[idx] = patch.applied_to(&self.items[idx]);
        true
    }

    /// Raise an item above every other item. Returns its new z-index.
    pub fn reorder_to_front(&mut self, id: ItemId) -> Option<i64> {
        let idx = self.index_of(id)?;
        let z_index = next_z_index(self.items.iter().map(|i| i.z_index));
        self.items[idx] = ItemPatch::z_index(z_index).applied_to(&self.items[idx]);
        Some(z_index)
    }

    /// Record the natural pixel size of an item's image.
    pub fn set_natural_size(&mut self, id: ItemId, size: NaturalSize) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.items[idx] = Item { natural_size: Some(size), ..self.items[idx].clone() };
        true
    }

    /// Return a reference to an item by id.
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// All items in ascending z-index; ties keep insertion order.
    #[must_use]
    pub fn items_by_z_order(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.iter().collect();
        items.sort_by_key(|i| i.z_index);
        items
    }

    /// Number of items currently on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the board has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
