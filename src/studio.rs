//! Studio: the host-facing facade over the engine and the export pipeline.
//!
//! Hosts drive the [`EngineCore`] directly for gestures and edits; the studio
//! adds uploads and exports. Exports snapshot the scene synchronously, so an
//! export started before a drag renders the pre-drag positions.

#[cfg(test)]
#[path = "studio_test.rs"]
mod studio_test;

use std::sync::Arc;

use canvas::engine::{Action, EngineCore};
use tracing::debug;

use crate::config::ExportConfig;
use crate::export::{ExportError, ExportJob, ExportOutput};
use crate::loader::{ImageLoader, LoadError, PayloadLoader};

pub struct Studio {
    pub core: EngineCore,
    loader: Arc<dyn ImageLoader>,
    config: ExportConfig,
}

impl Studio {
    /// Studio with the production payload loader.
    ///
    /// # Errors
    ///
    /// Returns `Http` if the loader's HTTP client cannot be built.
    pub fn new(config: ExportConfig) -> Result<Self, LoadError> {
        let loader = PayloadLoader::new(&config)?;
        Ok(Self::with_loader(EngineCore::new(), Arc::new(loader), config))
    }

    /// Studio configured from `MOODBOARD_*` environment variables.
    ///
    /// # Errors
    ///
    /// See [`Studio::new`].
    pub fn from_env() -> Result<Self, LoadError> {
        Self::new(ExportConfig::from_env())
    }

    #[must_use]
    pub fn with_loader(core: EngineCore, loader: Arc<dyn ImageLoader>, config: ExportConfig) -> Self {
        Self { core, loader, config }
    }

    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Add one item per payload, in order. Returns the engine's actions.
    pub fn upload<I, S>(&mut self, payloads: I) -> Vec<Action>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let actions = self.core.add_items(payloads);
        debug!(count = actions.iter().filter_map(Action::created_item).count(), "uploaded");
        actions
    }

    /// Snapshot the scene now; the returned job renders it later.
    #[must_use]
    pub fn begin_export(&self) -> ExportJob {
        ExportJob::new(self.core.snapshot(), Arc::clone(&self.loader), self.config.clone())
    }

    /// Snapshot and render in one step.
    ///
    /// # Errors
    ///
    /// See [`ExportJob::run`].
    pub async fn export(&self) -> Result<ExportOutput, ExportError> {
        self.begin_export().run().await
    }
}
