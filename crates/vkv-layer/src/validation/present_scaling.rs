use ash::vk;

use crate::chain::SwapchainCreateNext;
use crate::diagnostics::ObjectRef;
use crate::info::SwapchainCreateInfo;
use crate::layer::ValidationLayer;
use crate::state::{DeviceState, SurfaceTarget};
use crate::validation::{at_most_one_bit, extent_within};

impl ValidationLayer {
    /// `VkSwapchainPresentScalingCreateInfoEXT` against the surface's scaling
    /// capabilities, for the creation mode and every switchable mode. Only
    /// called with VK_EXT_swapchain_maintenance1 enabled.
    pub(crate) fn validate_swapchain_present_scaling_create_info(
        &self,
        device: &DeviceState,
        func_name: &str,
        create_info: &SwapchainCreateInfo,
        surface: &dyn SurfaceTarget,
        capabilities: &vk::SurfaceCapabilitiesKHR,
    ) -> bool {
        let objects = [ObjectRef::new(device.handle)];
        let physical_device = &device.physical_device;
        let extent = create_info.image_extent;
        let mut skip = false;

        let scaling = create_info.next.find(SwapchainCreateNext::present_scaling);

        if scaling.map_or(true, |s| s.scaling_behavior.is_empty())
            && !extent_within(extent, capabilities.min_image_extent, capabilities.max_image_extent)
        {
            skip |= self.log_error(
                &objects,
                "VUID-VkSwapchainCreateInfoKHR-pNext-07781",
                format!(
                    "{func_name}: pCreateInfo->imageExtent ({}, {}) is outside minImageExtent ({}, {}) and \
                     maxImageExtent ({}, {}) and no scaling behavior was requested.",
                    extent.width,
                    extent.height,
                    capabilities.min_image_extent.width,
                    capabilities.min_image_extent.height,
                    capabilities.max_image_extent.width,
                    capabilities.max_image_extent.height
                ),
            );
        }

        let Some(scaling) = scaling else {
            return skip;
        };

        let gravity_x = scaling.present_gravity_x;
        let gravity_y = scaling.present_gravity_y;

        if gravity_x.is_empty() != gravity_y.is_empty() {
            let vuid = if gravity_x.is_empty() {
                "VUID-VkSwapchainPresentScalingCreateInfoEXT-presentGravityX-07765"
            } else {
                "VUID-VkSwapchainPresentScalingCreateInfoEXT-presentGravityX-07766"
            };
            skip |= self.log_error(
                &objects,
                vuid,
                format!(
                    "{func_name}: presentGravityX ({:?}) and presentGravityY ({:?}) must both be zero or \
                     both be non-zero.",
                    gravity_x, gravity_y
                ),
            );
        }

        if !at_most_one_bit(scaling.scaling_behavior.as_raw()) {
            skip |= self.log_error(
                &objects,
                "VUID-VkSwapchainPresentScalingCreateInfoEXT-scalingBehavior-07767",
                format!(
                    "{func_name}: scalingBehavior ({:?}) must not have more than one bit set.",
                    scaling.scaling_behavior
                ),
            );
        }
        if !at_most_one_bit(gravity_x.as_raw()) {
            skip |= self.log_error(
                &objects,
                "VUID-VkSwapchainPresentScalingCreateInfoEXT-presentGravityX-07768",
                format!("{func_name}: presentGravityX ({:?}) must not have more than one bit set.", gravity_x),
            );
        }
        if !at_most_one_bit(gravity_y.as_raw()) {
            skip |= self.log_error(
                &objects,
                "VUID-VkSwapchainPresentScalingCreateInfoEXT-presentGravityY-07769",
                format!("{func_name}: presentGravityY ({:?}) must not have more than one bit set.", gravity_y),
            );
        }

        if let Some(mode_caps) =
            self.present_mode_capabilities(physical_device, surface, create_info.present_mode)
        {
            let supported = &mode_caps.present_scaling;
            let mode = create_info.present_mode;

            if !scaling.scaling_behavior.is_empty()
                && !supported
                    .supported_present_scaling
                    .intersects(scaling.scaling_behavior)
            {
                skip |= self.log_error(
                    &objects,
                    "VUID-VkSwapchainPresentScalingCreateInfoEXT-scalingBehavior-07770",
                    format!(
                        "{func_name}: scalingBehavior ({:?}) is not supported for presentMode {:?} \
                         (supported: {:?}).",
                        scaling.scaling_behavior, mode, supported.supported_present_scaling
                    ),
                );
            }
            if !gravity_x.is_empty() && !supported.supported_present_gravity_x.intersects(gravity_x) {
                skip |= self.log_error(
                    &objects,
                    "VUID-VkSwapchainPresentScalingCreateInfoEXT-presentGravityX-07772",
                    format!(
                        "{func_name}: presentGravityX ({:?}) is not supported for presentMode {:?} \
                         (supported: {:?}).",
                        gravity_x, mode, supported.supported_present_gravity_x
                    ),
                );
            }
            if !gravity_y.is_empty() && !supported.supported_present_gravity_y.intersects(gravity_y) {
                skip |= self.log_error(
                    &objects,
                    "VUID-VkSwapchainPresentScalingCreateInfoEXT-presentGravityY-07774",
                    format!(
                        "{func_name}: presentGravityY ({:?}) is not supported for presentMode {:?} \
                         (supported: {:?}).",
                        gravity_y, mode, supported.supported_present_gravity_y
                    ),
                );
            }

            if !scaling.scaling_behavior.is_empty()
                && !extent_within(
                    extent,
                    supported.min_scaled_image_extent,
                    supported.max_scaled_image_extent,
                )
            {
                skip |= self.log_error(
                    &objects,
                    "VUID-VkSwapchainCreateInfoKHR-pNext-07782",
                    format!(
                        "{func_name}: pCreateInfo->imageExtent ({}, {}) is outside the scaled extent range \
                         ({}, {})..({}, {}) for presentMode {:?}.",
                        extent.width,
                        extent.height,
                        supported.min_scaled_image_extent.width,
                        supported.min_scaled_image_extent.height,
                        supported.max_scaled_image_extent.width,
                        supported.max_scaled_image_extent.height,
                        mode
                    ),
                );
            }
        }

        // The same scaling must hold under every mode the swapchain can switch to.
        if let Some(modes_info) = create_info.next.find(SwapchainCreateNext::present_modes) {
            for &mode in &modes_info.present_modes {
                let Some(mode_caps) = self.present_mode_capabilities(physical_device, surface, mode) else {
                    continue;
                };
                let supported = &mode_caps.present_scaling;
                if !scaling.scaling_behavior.is_empty()
                    && !supported
                        .supported_present_scaling
                        .intersects(scaling.scaling_behavior)
                {
                    skip |= self.log_error(
                        &objects,
                        "VUID-VkSwapchainPresentScalingCreateInfoEXT-scalingBehavior-07771",
                        format!(
                            "{func_name}: scalingBehavior ({:?}) is not supported for switchable present \
                             mode {:?}.",
                            scaling.scaling_behavior, mode
                        ),
                    );
                }
                if !gravity_x.is_empty() && !supported.supported_present_gravity_x.intersects(gravity_x) {
                    skip |= self.log_error(
                        &objects,
                        "VUID-VkSwapchainPresentScalingCreateInfoEXT-presentGravityX-07773",
                        format!(
                            "{func_name}: presentGravityX ({:?}) is not supported for switchable present \
                             mode {:?}.",
                            gravity_x, mode
                        ),
                    );
                }
                if !gravity_y.is_empty() && !supported.supported_present_gravity_y.intersects(gravity_y) {
                    skip |= self.log_error(
                        &objects,
                        "VUID-VkSwapchainPresentScalingCreateInfoEXT-presentGravityY-07775",
                        format!(
                            "{func_name}: presentGravityY ({:?}) is not supported for switchable present \
                             mode {:?}.",
                            gravity_y, mode
                        ),
                    );
                }
            }
        }

        skip
    }
}
