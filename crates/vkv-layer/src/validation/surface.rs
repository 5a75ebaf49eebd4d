use ash::vk;

use crate::diagnostics::ObjectRef;
use crate::layer::ValidationLayer;
use crate::state::{PhysicalDeviceState, SurfaceState};

impl ValidationLayer {
    pub fn pre_call_validate_destroy_surface_khr(&self, instance: vk::Instance, surface: vk::SurfaceKHR) -> bool {
        let Some(surface_state) = self.store().get::<SurfaceState>(surface) else {
            return false;
        };
        match surface_state.swapchain() {
            Some(swapchain) => self.log_error(
                &[ObjectRef::new(instance), ObjectRef::new(surface), ObjectRef::new(swapchain.handle)],
                "VUID-vkDestroySurfaceKHR-surface-01266",
                format!(
                    "vkDestroySurfaceKHR(): surface {:?} still has swapchain {:?} associated with it.",
                    surface, swapchain.handle
                ),
            ),
            None => false,
        }
    }

    pub fn pre_call_validate_get_physical_device_surface_support_khr(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> bool {
        let Some(physical_device_state) = self.store().get::<PhysicalDeviceState>(physical_device) else {
            return false;
        };
        match physical_device_state.queue_family_count() {
            Some(count) if queue_family_index >= count => self.log_error(
                &[ObjectRef::new(physical_device)],
                "VUID-vkGetPhysicalDeviceSurfaceSupportKHR-queueFamilyIndex-01269",
                format!(
                    "vkGetPhysicalDeviceSurfaceSupportKHR(): queueFamilyIndex {queue_family_index} is not less \
                     than the {count} queue families of the physical device."
                ),
            ),
            _ => false,
        }
    }
}
