//! Shared numeric constants for the canvas crate.

// ── Grid ────────────────────────────────────────────────────────

/// Snap pitch for positions, in board units.
pub const GRID_PITCH: f64 = 40.0;

// ── Items ───────────────────────────────────────────────────────

/// Width given to every freshly uploaded item.
pub const DEFAULT_ITEM_WIDTH: f64 = 250.0;

/// Smallest width any resize path may produce.
pub const MIN_ITEM_WIDTH: f64 = 50.0;

/// Half-range of the spawn jitter applied to each axis.
pub const SPAWN_JITTER: f64 = 20.0;

/// Spawn point used when the board size is not yet known.
pub const FALLBACK_SPAWN: f64 = 200.0;

/// Half-range of the random tilt given to new items, in degrees.
pub const MAX_TILT_DEG: f64 = 3.0;

// ── Layering ────────────────────────────────────────────────────

/// Lowest z-index an item can receive; keeps items above board chrome.
pub const Z_FLOOR: i64 = 10;

// ── Background ──────────────────────────────────────────────────

/// Number of prior backgrounds kept for undo.
pub const BACKGROUND_HISTORY_CAPACITY: usize = 32;
