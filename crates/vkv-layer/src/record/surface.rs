use std::sync::Arc;

use ash::vk::{self, Handle};
use tracing::debug;

use crate::driver::{SurfaceCapabilities, SurfaceQuery};
use crate::layer::ValidationLayer;
use crate::state::{CapabilityCache, PhysicalDeviceState, SurfaceState};

impl ValidationLayer {
    /// Any `vkCreate*SurfaceKHR`.
    pub fn post_call_record_create_surface(
        &self,
        instance: vk::Instance,
        surface: vk::SurfaceKHR,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        self.store().add(Arc::new(SurfaceState::new(surface, instance)));
        debug!(surface = ?surface, "surface created");
    }

    pub fn pre_call_record_destroy_surface_khr(&self, _instance: vk::Instance, surface: vk::SurfaceKHR) {
        if self.store().remove::<SurfaceState>(surface).is_some() {
            debug!(surface = ?surface, "surface destroyed");
        }
    }

    /// Run `update` on the cache that owns answers for `surface`: the
    /// surface's own, or the physical device's for a surfaceless query.
    fn with_capability_cache(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        update: impl FnOnce(&CapabilityCache),
    ) {
        if surface.is_null() {
            let Some(state) = self.store().get::<PhysicalDeviceState>(physical_device) else {
                return;
            };
            if state.instance_extensions.google_surfaceless_query {
                update(&state.surfaceless);
            }
        } else if let Some(state) = self.store().get::<SurfaceState>(surface) {
            update(&state.cache);
        }
    }

    pub fn post_call_record_get_physical_device_surface_support_khr(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
        supported: bool,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        if let Some(state) = self.store().get::<SurfaceState>(surface) {
            state
                .cache
                .store_queue_support(physical_device, queue_family_index, supported);
        }
    }

    pub fn post_call_record_get_physical_device_surface_capabilities_khr(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        capabilities: &vk::SurfaceCapabilitiesKHR,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        self.with_capability_cache(physical_device, surface, |cache| {
            cache.store_capabilities(physical_device, None, (*capabilities).into());
        });
    }

    /// Per-present-mode answers are only cached when they carry both the
    /// scaling and the compatibility outputs validation reads.
    pub fn post_call_record_get_physical_device_surface_capabilities2_khr(
        &self,
        physical_device: vk::PhysicalDevice,
        query: &SurfaceQuery,
        capabilities: &SurfaceCapabilities,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        self.with_capability_cache(physical_device, query.surface, |cache| match query.present_mode {
            None => {
                cache.store_capabilities(physical_device, None, capabilities.capabilities.into());
            }
            Some(mode) if query.present_scaling && query.compatible_modes => {
                cache.store_capabilities(physical_device, Some(mode), capabilities.clone());
            }
            Some(_) => {}
        });
    }

    /// Partial (`VK_INCOMPLETE`) lists are not cached.
    pub fn post_call_record_get_physical_device_surface_formats_khr(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        formats: &[vk::SurfaceFormatKHR],
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS || formats.is_empty() {
            return;
        }
        self.with_capability_cache(physical_device, surface, |cache| {
            cache.store_formats(physical_device, formats.to_vec());
        });
    }

    pub fn post_call_record_get_physical_device_surface_present_modes_khr(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        present_modes: &[vk::PresentModeKHR],
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS || present_modes.is_empty() {
            return;
        }
        self.with_capability_cache(physical_device, surface, |cache| {
            cache.store_present_modes(physical_device, present_modes.to_vec());
        });
    }
}

