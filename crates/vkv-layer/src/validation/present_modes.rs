use crate::chain::SwapchainCreateNext;
use crate::diagnostics::ObjectRef;
use crate::info::SwapchainCreateInfo;
use crate::layer::ValidationLayer;
use crate::state::{DeviceState, SurfaceTarget};

impl ValidationLayer {
    /// `presentMode` support, plus the explicit mode set from
    /// `VkSwapchainPresentModesCreateInfoEXT` when one is chained. All checks
    /// accumulate.
    pub(crate) fn validate_swapchain_present_modes_create_info(
        &self,
        device: &DeviceState,
        func_name: &str,
        create_info: &SwapchainCreateInfo,
        surface: &dyn SurfaceTarget,
    ) -> bool {
        let objects = [ObjectRef::new(device.handle)];
        let physical_device = &device.physical_device;
        let mut skip = false;

        let supported = self.surface_present_modes(physical_device, surface);
        if let Some(supported) = &supported {
            if !supported.contains(&create_info.present_mode) {
                skip |= self.log_error(
                    &objects,
                    "VUID-VkSwapchainCreateInfoKHR-presentMode-01281",
                    format!(
                        "{func_name}: pCreateInfo->presentMode {:?} is not supported by the surface \
                         (supported: {:?}).",
                        create_info.present_mode, supported
                    ),
                );
            }
        }

        let Some(modes_info) = create_info.next.find(SwapchainCreateNext::present_modes) else {
            return skip;
        };

        // Compatibility is only queryable through VK_EXT_surface_maintenance1.
        let compatible = if device.extensions.ext_swapchain_maintenance1
            && device.instance_extensions().ext_surface_maintenance1
        {
            self.present_mode_capabilities(physical_device, surface, create_info.present_mode)
        } else {
            None
        };

        for (i, &mode) in modes_info.present_modes.iter().enumerate() {
            if let Some(supported) = &supported {
                if !supported.contains(&mode) {
                    skip |= self.log_error(
                        &objects,
                        "VUID-VkSwapchainPresentModesCreateInfoEXT-None-07762",
                        format!(
                            "{func_name}: VkSwapchainPresentModesCreateInfoEXT::pPresentModes[{i}] ({:?}) is \
                             not supported by the surface.",
                            mode
                        ),
                    );
                }
            }
            if let Some(compatible) = &compatible {
                if !compatible.compatible_present_modes.contains(&mode) {
                    skip |= self.log_error(
                        &objects,
                        "VUID-VkSwapchainPresentModesCreateInfoEXT-pPresentModes-07763",
                        format!(
                            "{func_name}: VkSwapchainPresentModesCreateInfoEXT::pPresentModes[{i}] ({:?}) is \
                             not compatible with pCreateInfo->presentMode {:?} (compatible: {:?}).",
                            mode, create_info.present_mode, compatible.compatible_present_modes
                        ),
                    );
                }
            }
        }

        if !modes_info.present_modes.contains(&create_info.present_mode) {
            skip |= self.log_error(
                &objects,
                "VUID-VkSwapchainPresentModesCreateInfoEXT-presentMode-07764",
                format!(
                    "{func_name}: pCreateInfo->presentMode {:?} is not listed in \
                     VkSwapchainPresentModesCreateInfoEXT::pPresentModes {:?}.",
                    create_info.present_mode, modes_info.present_modes
                ),
            );
        }

        skip
    }
}
