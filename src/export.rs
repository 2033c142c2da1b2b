//! Export: render a scene snapshot to a PNG.
//!
//! DESIGN
//! ======
//! An [`ExportJob`] is created synchronously and captures the scene at that
//! moment. Running it never touches live engine state, so gestures may
//! continue while it is in flight and two jobs can run side by side.
//!
//! A job runs in two phases:
//! - decode: the background and every item payload are loaded concurrently,
//!   each under the configured timeout
//! - paint: draws happen strictly in order on the job's own surface
//!
//! Failed decodes never abort the export. A failed background falls back to a
//! flat fill; a failed item is skipped. Both are reported on [`ExportOutput`].

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::sync::Arc;

use canvas::engine::SceneSnapshot;
use canvas::scene::{Item, ItemId};
use chrono::{Local, NaiveDateTime};
use futures::future::join_all;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::compositor::Compositor;
use crate::config::ExportConfig;
use crate::loader::{DecodedImage, ImageLoader, LoadError, load_with_timeout};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("board has no area ({width}x{height})")]
    EmptyBoard { width: f64, height: f64 },
    #[error("could not allocate a {width}x{height} surface")]
    SurfaceAllocation { width: u32, height: u32 },
    #[error("png encoding failed: {0}")]
    Encode(String),
}

/// An item left out of the export.
#[derive(Debug)]
pub struct ItemFailure {
    pub item_id: ItemId,
    pub error: LoadError,
}

#[derive(Debug)]
pub struct ExportOutput {
    /// Encoded PNG bytes.
    pub png: Vec<u8>,
    /// Pixel dimensions of the PNG.
    pub width: u32,
    pub height: u32,
    /// Suggested download name, `<prefix>-ddMMyy-HHmm.png`.
    pub filename: String,
    /// Items skipped because their payload did not decode.
    pub failures: Vec<ItemFailure>,
    /// Set when the background image failed and the fallback fill was used.
    pub background_failure: Option<LoadError>,
}

impl ExportOutput {
    /// True when every layer was drawn as requested.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.background_failure.is_none()
    }
}

// =============================================================================
// JOB
// =============================================================================

pub struct ExportJob {
    id: Uuid,
    snapshot: SceneSnapshot,
    loader: Arc<dyn ImageLoader>,
    config: ExportConfig,
    started_at: NaiveDateTime,
}

impl ExportJob {
    #[must_use]
    pub fn new(snapshot: SceneSnapshot, loader: Arc<dyn ImageLoader>, config: ExportConfig) -> Self {
        Self { id: Uuid::new_v4(), snapshot, loader, config, started_at: Local::now().naive_local() }
    }

    /// Override the timestamp used for the filename.
    #[must_use]
    pub fn started_at(mut self, at: NaiveDateTime) -> Self {
        self.started_at = at;
        self
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn snapshot(&self) -> &SceneSnapshot {
        &self.snapshot
    }

    /// Decode, paint, and encode the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `EmptyBoard` or `SurfaceAllocation` before any decode starts,
    /// and `Encode` if PNG serialization fails. Decode failures are reported
    /// on the output instead.
    pub async fn run(self) -> Result<ExportOutput, ExportError> {
        let span = info_span!("export", export_id = %self.id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(self) -> Result<ExportOutput, ExportError> {
        let Self { snapshot, loader, config, started_at, .. } = self;
        let mut compositor = Compositor::new(snapshot.board, config.scale, config.frame_border)?;
        let (width, height) = compositor.size();
        info!(items = snapshot.items.len(), width, height, "export started");

        // Paint order is ascending z with ties in insertion order.
        let mut items = snapshot.items;
        items.sort_by_key(|item| item.z_index);

        let timeout = config.decode_timeout;
        let background_decode = async {
            match snapshot.background.image() {
                Some(payload) => Some(load_with_timeout(loader.as_ref(), payload, timeout).await),
                None => None,
            }
        };
        let item_decodes = join_all(items.iter().map(|item| load_with_timeout(loader.as_ref(), &item.content, timeout)));
        let (background, decoded) = tokio::join!(background_decode, item_decodes);

        let background_failure = paint_background(&mut compositor, background);
        if snapshot.snap_enabled {
            compositor.draw_grid(snapshot.grid_pitch);
        }
        let failures = paint_items(&mut compositor, &items, decoded);

        let png = compositor.encode_png()?;
        let filename = export_filename(&config.filename_prefix, started_at);
        info!(%filename, bytes = png.len(), skipped = failures.len(), "export finished");

        Ok(ExportOutput { png, width, height, filename, failures, background_failure })
    }
}

fn paint_background(
    compositor: &mut Compositor,
    decoded: Option<Result<DecodedImage, LoadError>>,
) -> Option<LoadError> {
    match decoded {
        None => {
            compositor.draw_default_background();
            None
        }
        Some(result) => match result.and_then(|image| compositor.draw_background_image(&image)) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "background image failed; using fallback fill");
                compositor.draw_fallback_background();
                Some(e)
            }
        },
    }
}

fn paint_items(
    compositor: &mut Compositor,
    items: &[Item],
    decoded: Vec<Result<DecodedImage, LoadError>>,
) -> Vec<ItemFailure> {
    let mut failures = Vec::new();
    for (item, result) in items.iter().zip(decoded) {
        if let Err(e) = result.and_then(|image| compositor.draw_item(item, &image)) {
            warn!(item_id = %item.id, error = %e, "skipping item");
            failures.push(ItemFailure { item_id: item.id, error: e });
        }
    }
    failures
}

/// `<prefix>-ddMMyy-HHmm.png` for the given local time.
#[must_use]
pub fn export_filename(prefix: &str, at: NaiveDateTime) -> String {
    format!("{prefix}-{}.png", at.format("%d%m%y-%H%M"))
}
