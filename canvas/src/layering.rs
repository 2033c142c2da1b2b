//! Stacking-order policy.
//!
//! Items are painted in ascending `z_index`. New items and items brought to the
//! front both receive the next free index above everything on the board, never
//! below [`Z_FLOOR`]. Indices are ordering keys only; gaps are expected.

#[cfg(test)]
#[path = "layering_test.rs"]
mod layering_test;

use crate::consts::Z_FLOOR;

/// Next z-index above every value in `existing`.
///
/// Returns [`Z_FLOOR`] when `existing` is empty.
#[must_use]
pub fn next_z_index<I>(existing: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    existing
        .into_iter()
        .max()
        .map_or(Z_FLOOR, |top| top.saturating_add(1).max(Z_FLOOR))
}
