//! vkv validation layer core
//!
//! Tracks WSI object state (surfaces, swapchains, their images, queues and
//! synchronization primitives) and validates swapchain creation, image
//! acquisition, presentation and release against it. A dispatch shim calls
//! the `pre_call_validate_*` routines before forwarding a call and the
//! `*_record_*` routines around it.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use vkv_core::config::LayerSettings;
use vkv_core::CoreError;

pub mod chain;
pub mod diagnostics;
pub mod driver;
pub mod info;
mod layer;
mod record;
pub mod state;
mod validation;

pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, ObjectRef, Severity, TracingSink};
pub use driver::{AshDriver, DriverQueries, SurfaceCapabilities, SurfaceQuery};
pub use layer::ValidationLayer;
pub use validation::AcquireVariant;

#[derive(Debug, Error)]
pub enum LayerError {
    #[error("a validation layer is already installed in this process")]
    AlreadyInstalled,
    #[error(transparent)]
    Core(#[from] CoreError),
}

// ── Process-wide layer ──────────────────────────────────────

static LAYER: OnceLock<ValidationLayer> = OnceLock::new();

/// Make `layer` the process-wide instance returned by [`global`].
pub fn install(layer: ValidationLayer) -> Result<&'static ValidationLayer, LayerError> {
    LAYER
        .set(layer)
        .map_err(|_| LayerError::AlreadyInstalled)?;
    LAYER.get().ok_or(LayerError::AlreadyInstalled)
}

/// Build and install a layer from a settings file. With no explicit path the
/// usual search order applies and a missing file means defaults; an explicit
/// path must exist and parse.
pub fn install_with_config(
    driver: Arc<dyn DriverQueries>,
    path: Option<&Path>,
) -> Result<&'static ValidationLayer, LayerError> {
    let settings = match path {
        Some(path) => LayerSettings::load(path)?,
        None => LayerSettings::from_environment(),
    };
    vkv_common::logging::init_logging(&settings.logging.level);
    install(ValidationLayer::with_settings(driver, settings))
}

pub fn global() -> Option<&'static ValidationLayer> {
    LAYER.get()
}
