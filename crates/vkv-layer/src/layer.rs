use std::sync::Arc;

use ash::vk;
use tracing::warn;
use vkv_core::config::LayerSettings;

use crate::diagnostics::{Diagnostic, DiagnosticSink, ObjectRef, Severity, TracingSink};
use crate::driver::{DriverQueries, SurfaceCapabilities, SurfaceQuery};
use crate::state::{ObjectStore, PhysicalDeviceState, SurfaceState, SurfaceTarget};

/// Validation and state tracking for one Vulkan instance chain.
///
/// Validation routines (`pre_call_validate_*`) only read the object store
/// and report through the diagnostic sink; record routines
/// (`pre_call_record_*`, `post_call_record_*`) update the store.
pub struct ValidationLayer {
    store: ObjectStore,
    driver: Arc<dyn DriverQueries>,
    sink: Arc<dyn DiagnosticSink>,
    settings: LayerSettings,
}

impl ValidationLayer {
    pub fn new(
        driver: Arc<dyn DriverQueries>,
        sink: Arc<dyn DiagnosticSink>,
        settings: LayerSettings,
    ) -> Self {
        Self {
            store: ObjectStore::new(),
            driver,
            sink,
            settings,
        }
    }

    /// Layer reporting through a [`TracingSink`] configured from `settings`.
    pub fn with_settings(driver: Arc<dyn DriverQueries>, settings: LayerSettings) -> Self {
        let sink = Arc::new(TracingSink::new(settings.validation.clone()));
        Self::new(driver, sink, settings)
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn settings(&self) -> &LayerSettings {
        &self.settings
    }

    pub(crate) fn driver(&self) -> &dyn DriverQueries {
        self.driver.as_ref()
    }

    // ── Diagnostics ─────────────────────────────────────────

    fn report(
        &self,
        severity: Severity,
        objects: &[ObjectRef],
        vuid: &'static str,
        message: String,
    ) -> bool {
        self.sink.report(Diagnostic {
            severity,
            vuid: vuid.into(),
            objects: objects.to_vec(),
            message,
        })
    }

    pub(crate) fn log_error(&self, objects: &[ObjectRef], vuid: &'static str, message: impl Into<String>) -> bool {
        self.report(Severity::Error, objects, vuid, message.into())
    }

    pub(crate) fn log_warning(&self, objects: &[ObjectRef], vuid: &'static str, message: impl Into<String>) -> bool {
        self.report(Severity::Warning, objects, vuid, message.into())
    }

    pub(crate) fn log_performance_warning(
        &self,
        objects: &[ObjectRef],
        vuid: &'static str,
        message: impl Into<String>,
    ) -> bool {
        self.report(Severity::PerformanceWarning, objects, vuid, message.into())
    }

    // ── Capability queries ──────────────────────────────────
    //
    // Each helper prefers the surface's cache and falls back to the driver.
    // A failed query yields `None` and the caller skips the dependent check.

    pub(crate) fn surface_formats(
        &self,
        physical_device: &PhysicalDeviceState,
        surface: &dyn SurfaceTarget,
    ) -> Option<Arc<[vk::SurfaceFormatKHR]>> {
        surface
            .capability_cache()
            .formats_or_query(physical_device.handle, || {
                self.driver.surface_formats(physical_device.handle, surface.surface_handle())
            })
            .map_err(|err| {
                warn!(surface = ?surface.surface_handle(), "surface format query failed: {:?}", err)
            })
            .ok()
    }

    pub(crate) fn surface_present_modes(
        &self,
        physical_device: &PhysicalDeviceState,
        surface: &dyn SurfaceTarget,
    ) -> Option<Arc<[vk::PresentModeKHR]>> {
        surface
            .capability_cache()
            .present_modes_or_query(physical_device.handle, || {
                self.driver
                    .surface_present_modes(physical_device.handle, surface.surface_handle())
            })
            .map_err(|err| {
                warn!(surface = ?surface.surface_handle(), "present mode query failed: {:?}", err)
            })
            .ok()
    }

    /// Base capabilities queried fresh, refreshing the cache. Falls back to
    /// the cached answer if the driver call fails.
    pub(crate) fn current_surface_capabilities(
        &self,
        physical_device: &PhysicalDeviceState,
        surface: &dyn SurfaceTarget,
    ) -> Option<vk::SurfaceCapabilitiesKHR> {
        match self
            .driver
            .surface_capabilities(physical_device.handle, surface.surface_handle())
        {
            Ok(capabilities) => {
                surface
                    .capability_cache()
                    .store_capabilities(physical_device.handle, None, capabilities.into());
                Some(capabilities)
            }
            Err(err) => {
                warn!(
                    surface = ?surface.surface_handle(),
                    "surface capability query failed: {:?}",
                    err
                );
                surface
                    .capability_cache()
                    .capabilities(physical_device.handle, None)
                    .map(|cached| cached.capabilities)
            }
        }
    }

    /// Scaling and compatibility data for one present mode.
    pub(crate) fn present_mode_capabilities(
        &self,
        physical_device: &PhysicalDeviceState,
        surface: &dyn SurfaceTarget,
        present_mode: vk::PresentModeKHR,
    ) -> Option<Arc<SurfaceCapabilities>> {
        surface
            .capability_cache()
            .capabilities_or_query(physical_device.handle, Some(present_mode), || {
                self.driver.surface_capabilities2(
                    physical_device.handle,
                    &SurfaceQuery::for_present_mode(surface.surface_handle(), present_mode),
                )
            })
            .map_err(|err| {
                warn!(
                    surface = ?surface.surface_handle(),
                    present_mode = ?present_mode,
                    "per-present-mode capability query failed: {:?}",
                    err
                )
            })
            .ok()
    }

    /// Uncached capabilities2 query for the shared-present and protected
    /// outputs.
    pub(crate) fn extended_surface_capabilities(
        &self,
        physical_device: &PhysicalDeviceState,
        query: &SurfaceQuery,
    ) -> Option<SurfaceCapabilities> {
        self.driver
            .surface_capabilities2(physical_device.handle, query)
            .map_err(|err| warn!(surface = ?query.surface, "capabilities2 query failed: {:?}", err))
            .ok()
    }

    /// Whether `queue_family_index` can present to `surface`. `None` when the
    /// driver could not tell.
    pub(crate) fn queue_family_supports_surface(
        &self,
        physical_device: &PhysicalDeviceState,
        queue_family_index: u32,
        surface: &SurfaceState,
    ) -> Option<bool> {
        surface
            .cache
            .queue_support_or_query(physical_device.handle, queue_family_index, || {
                self.driver
                    .surface_support(physical_device.handle, queue_family_index, surface.handle)
            })
            .map_err(|err| {
                warn!(
                    surface = ?surface.handle,
                    queue_family_index,
                    "surface support query failed: {:?}",
                    err
                )
            })
            .ok()
    }
}
