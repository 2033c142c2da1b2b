//! Moodboard: a framed-photo canvas with PNG export.
//!
//! DESIGN
//! ======
//! The [`canvas`] crate owns the board: items, layering, background history,
//! and the pointer gesture state machine. It is synchronous and has no I/O.
//! This crate adds everything that waits on the outside world: loading image
//! payloads, rasterizing a snapshot, and encoding the result.
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `MOODBOARD_*` environment settings |
//! | [`loader`] | payload string to decoded RGBA pixels |
//! | [`compositor`] | paints background, grid, and framed items |
//! | [`export`] | snapshot-owning export jobs |
//! | [`studio`] | host facade tying the engine to exports |

pub mod compositor;
pub mod config;
pub mod export;
pub mod loader;
pub mod studio;

pub use canvas;

/// Install a `tracing` fmt subscriber honoring `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_tracing() -> bool {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).try_init().is_ok()
}
