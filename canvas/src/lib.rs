//! Direct-manipulation engine for the moodboard.
//!
//! This crate is headless: it never touches a rendering surface or performs
//! I/O. It owns the full lifecycle of the board: translating raw pointer events
//! into scene mutations, assigning stacking order, tracking the background and
//! its undo history, and producing owned snapshots for the export pipeline.
//! The host is responsible only for wiring pointer events in and drawing the
//! scene the engine describes.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::EngineCore`] and the actions it emits |
//! | [`scene`] | Placed items, sparse patches, and the owning [`scene::Scene`] |
//! | [`input`] | Pointer event types and the gesture state machine |
//! | [`layering`] | Z-index assignment for new and raised items |
//! | [`background`] | Current background plus bounded undo history |
//! | [`viewport`] | Board origin/size and screen-to-board conversion |
//! | [`consts`] | Shared numeric constants (grid pitch, minimum width, etc.) |

pub mod background;
pub mod consts;
pub mod engine;
pub mod input;
pub mod layering;
pub mod scene;
pub mod viewport;
