use std::ops::ControlFlow;

use ash::vk::{self, Handle};

use crate::chain::SwapchainCreateNext;
use crate::diagnostics::ObjectRef;
use crate::driver::SurfaceQuery;
use crate::info::{ImageCreateInfo, SwapchainCreateInfo};
use crate::layer::ValidationLayer;
use crate::state::{DeviceState, SurfaceState, SurfaceTarget, SwapchainState};
use crate::validation::{exactly_one_bit, extent_within};

/// `Break` aborts the call, `Continue` carries the accumulated skip flag.
type Verdict = ControlFlow<(), bool>;

const PRE_TRANSFORM_WARNING: &str = "UNASSIGNED-CoreValidation-SwapchainPreTransform";
const EXTENSION_NOT_ENABLED: &str = "UNASSIGNED-CoreValidation-DrawState-ExtensionNotEnabled";

impl ValidationLayer {
    pub fn pre_call_validate_create_swapchain_khr(
        &self,
        device: vk::Device,
        create_info: &SwapchainCreateInfo,
    ) -> bool {
        let Some(device_state) = self.store().get::<DeviceState>(device) else {
            return false;
        };
        let surface = self.store().get::<SurfaceState>(create_info.surface);
        let old_swapchain = self.store().get::<SwapchainState>(create_info.old_swapchain);
        self.validate_create_swapchain(
            &device_state,
            "vkCreateSwapchainKHR()",
            create_info,
            surface.as_deref(),
            old_swapchain.as_deref(),
        )
    }

    pub fn pre_call_validate_create_shared_swapchains_khr(
        &self,
        device: vk::Device,
        create_infos: &[SwapchainCreateInfo],
    ) -> bool {
        let Some(device_state) = self.store().get::<DeviceState>(device) else {
            return false;
        };
        let mut skip = false;
        for (i, create_info) in create_infos.iter().enumerate() {
            let func_name = format!("vkCreateSharedSwapchainsKHR(): pCreateInfos[{i}]");
            let surface = self.store().get::<SurfaceState>(create_info.surface);
            let old_swapchain = self.store().get::<SwapchainState>(create_info.old_swapchain);
            skip |= self.validate_create_swapchain(
                &device_state,
                &func_name,
                create_info,
                surface.as_deref(),
                old_swapchain.as_deref(),
            );
        }
        skip
    }

    pub(crate) fn validate_create_swapchain(
        &self,
        device: &DeviceState,
        func_name: &str,
        create_info: &SwapchainCreateInfo,
        surface: Option<&SurfaceState>,
        old_swapchain: Option<&SwapchainState>,
    ) -> bool {
        let objects = [ObjectRef::new(device.handle)];
        let extent = create_info.image_extent;

        if (extent.width == 0 || extent.height == 0)
            && self.log_error(
                &objects,
                "VUID-VkSwapchainCreateInfoKHR-imageExtent-01689",
                format!(
                    "{func_name}: pCreateInfo->imageExtent = ({}, {}) which is illegal.",
                    extent.width, extent.height
                ),
            )
        {
            return true;
        }

        // Android guarantees every queue family can present. A surfaceless
        // query has no surface to scan.
        if !device.instance_extensions().khr_android_surface {
            if let Some(surface) = surface {
                let supported = device.queue_family_indices.iter().any(|&family| {
                    self.queue_family_supports_surface(&device.physical_device, family, surface)
                        .unwrap_or(true)
                });
                if !supported
                    && self.log_error(
                        &objects,
                        "VUID-VkSwapchainCreateInfoKHR-surface-01270",
                        format!(
                            "{func_name}: pCreateInfo->surface is not supported for presentation by this device."
                        ),
                    )
                {
                    return true;
                }
            }
        }

        if let Some(old) = old_swapchain {
            let old_objects = [ObjectRef::new(device.handle), ObjectRef::new(old.handle)];
            if old.surface() != create_info.surface
                && self.log_error(
                    &old_objects,
                    "VUID-VkSwapchainCreateInfoKHR-oldSwapchain-01933",
                    format!("{func_name}: pCreateInfo->oldSwapchain's surface is not pCreateInfo->surface"),
                )
            {
                return true;
            }
            if old.is_retired()
                && self.log_error(
                    &old_objects,
                    "VUID-VkSwapchainCreateInfoKHR-oldSwapchain-01933",
                    format!("{func_name}: pCreateInfo->oldSwapchain is retired"),
                )
            {
                return true;
            }
        }

        let surfaceless =
            create_info.surface.is_null() && device.instance_extensions().google_surfaceless_query;
        let target: Option<&dyn SurfaceTarget> = match surface {
            Some(surface) => Some(surface),
            None if surfaceless => Some(&*device.physical_device),
            None => None,
        };

        let mut skip = false;
        if let Some(target) = target {
            match self.validate_create_swapchain_surface(device, func_name, create_info, target) {
                ControlFlow::Break(()) => return true,
                ControlFlow::Continue(surface_skip) => skip |= surface_skip,
            }
        }

        match self.validate_create_swapchain_image(device, func_name, create_info) {
            ControlFlow::Break(()) => return true,
            ControlFlow::Continue(image_skip) => skip |= image_skip,
        }

        if create_info
            .flags
            .contains(vk::SwapchainCreateFlagsKHR::SPLIT_INSTANCE_BIND_REGIONS)
            && device.physical_device_count <= 1
        {
            skip |= self.log_error(
                &objects,
                "VUID-VkSwapchainCreateInfoKHR-physicalDeviceCount-01429",
                format!(
                    "{func_name}: VK_SWAPCHAIN_CREATE_SPLIT_INSTANCE_BIND_REGIONS_BIT_KHR requires a device \
                     created with more than one physical device (physicalDeviceCount = {}).",
                    device.physical_device_count
                ),
            );
        }

        skip
    }

    /// Checks against what the surface reports for this physical device.
    fn validate_create_swapchain_surface(
        &self,
        device: &DeviceState,
        func_name: &str,
        create_info: &SwapchainCreateInfo,
        surface: &dyn SurfaceTarget,
    ) -> Verdict {
        let objects = [ObjectRef::new(device.handle)];
        let physical_device = &device.physical_device;
        let extensions = &device.extensions;
        let shared_present = create_info.is_shared_presentable();
        let mut skip = false;

        let Some(capabilities) = self.current_surface_capabilities(physical_device, surface) else {
            return ControlFlow::Continue(false);
        };

        if create_info.pre_transform != capabilities.current_transform {
            skip |= self.log_performance_warning(
                &objects,
                PRE_TRANSFORM_WARNING,
                format!(
                    "{func_name}: pCreateInfo->preTransform ({:?}) doesn't match the currentTransform ({:?}) \
                     returned by vkGetPhysicalDeviceSurfaceCapabilitiesKHR, the presentation engine will \
                     transform the image content as part of the presentation operation.",
                    create_info.pre_transform, capabilities.current_transform
                ),
            );
        }

        if !shared_present && create_info.min_image_count < capabilities.min_image_count {
            let vuid = if extensions.khr_shared_presentable_image {
                "VUID-VkSwapchainCreateInfoKHR-presentMode-02839"
            } else {
                "VUID-VkSwapchainCreateInfoKHR-minImageCount-01271"
            };
            if self.log_error(
                &objects,
                vuid,
                format!(
                    "{func_name}: pCreateInfo->minImageCount {} is less than the surface's minImageCount {}.",
                    create_info.min_image_count, capabilities.min_image_count
                ),
            ) {
                return ControlFlow::Break(());
            }
        }

        if capabilities.max_image_count > 0
            && create_info.min_image_count > capabilities.max_image_count
            && self.log_error(
                &objects,
                "VUID-VkSwapchainCreateInfoKHR-minImageCount-01272",
                format!(
                    "{func_name}: pCreateInfo->minImageCount {} is greater than the surface's maxImageCount {}.",
                    create_info.min_image_count, capabilities.max_image_count
                ),
            )
        {
            return ControlFlow::Break(());
        }

        if (!exactly_one_bit(create_info.pre_transform.as_raw())
            || !capabilities
                .supported_transforms
                .contains(create_info.pre_transform))
            && self.log_error(
                &objects,
                "VUID-VkSwapchainCreateInfoKHR-preTransform-01279",
                format!(
                    "{func_name}: pCreateInfo->preTransform ({:?}) is not exactly one of the supported \
                     transforms {:?}.",
                    create_info.pre_transform, capabilities.supported_transforms
                ),
            )
        {
            return ControlFlow::Break(());
        }

        if (!exactly_one_bit(create_info.composite_alpha.as_raw())
            || !capabilities
                .supported_composite_alpha
                .contains(create_info.composite_alpha))
            && self.log_error(
                &objects,
                "VUID-VkSwapchainCreateInfoKHR-compositeAlpha-01280",
                format!(
                    "{func_name}: pCreateInfo->compositeAlpha ({:?}) is not exactly one of the supported \
                     composite alpha modes {:?}.",
                    create_info.composite_alpha, capabilities.supported_composite_alpha
                ),
            )
        {
            return ControlFlow::Break(());
        }

        if create_info.image_array_layers > capabilities.max_image_array_layers
            && self.log_error(
                &objects,
                "VUID-VkSwapchainCreateInfoKHR-imageArrayLayers-01275",
                format!(
                    "{func_name}: pCreateInfo->imageArrayLayers {} exceeds the surface's \
                     maxImageArrayLayers {}.",
                    create_info.image_array_layers, capabilities.max_image_array_layers
                ),
            )
        {
            return ControlFlow::Break(());
        }

        // Shared presentable images are checked against the shared usage set below.
        if !shared_present
            && !capabilities
                .supported_usage_flags
                .contains(create_info.image_usage)
        {
            let vuid = if extensions.khr_shared_presentable_image {
                "VUID-VkSwapchainCreateInfoKHR-presentMode-01427"
            } else {
                "VUID-VkSwapchainCreateInfoKHR-imageUsage-01276"
            };
            if self.log_error(
                &objects,
                vuid,
                format!(
                    "{func_name}: pCreateInfo->imageUsage {:?} is not a subset of supportedUsageFlags {:?}.",
                    create_info.image_usage, capabilities.supported_usage_flags
                ),
            ) {
                return ControlFlow::Break(());
            }
        }

        if create_info.flags.contains(vk::SwapchainCreateFlagsKHR::PROTECTED) {
            let instance_extensions = device.instance_extensions();
            let supports_protected = if instance_extensions.khr_surface_protected_capabilities {
                let query = SurfaceQuery {
                    protected: true,
                    ..SurfaceQuery::new(surface.surface_handle())
                };
                self.extended_surface_capabilities(physical_device, &query)
                    .map_or(true, |caps| caps.supports_protected)
            } else {
                false
            };
            if !supports_protected
                && self.log_error(
                    &objects,
                    "VUID-VkSwapchainCreateInfoKHR-flags-03187",
                    format!(
                        "{func_name}: pCreateInfo->flags contains VK_SWAPCHAIN_CREATE_PROTECTED_BIT_KHR but the \
                         surface does not report supportsProtected."
                    ),
                )
            {
                return ControlFlow::Break(());
            }
        }

        if let Some(formats) = self.surface_formats(physical_device, surface) {
            let mut found_format = false;
            let mut found_pair = false;
            for format in formats.iter() {
                if format.format == create_info.image_format {
                    found_format = true;
                    if format.color_space == create_info.image_color_space {
                        found_pair = true;
                        break;
                    }
                }
            }
            if !found_pair {
                let message = if found_format {
                    format!(
                        "{func_name}: pCreateInfo->imageColorSpace {:?} is not supported together with \
                         pCreateInfo->imageFormat {:?} by the surface.",
                        create_info.image_color_space, create_info.image_format
                    )
                } else {
                    format!(
                        "{func_name}: pCreateInfo->imageFormat {:?} is not supported by the surface.",
                        create_info.image_format
                    )
                };
                if self.log_error(&objects, "VUID-VkSwapchainCreateInfoKHR-imageFormat-01273", message) {
                    return ControlFlow::Break(());
                }
            }
        }

        // VK_EXT_swapchain_maintenance1 moves the extent check into the scaling validator.
        if !extensions.ext_swapchain_maintenance1
            && !extent_within(
                create_info.image_extent,
                capabilities.min_image_extent,
                capabilities.max_image_extent,
            )
        {
            skip |= self.log_error(
                &objects,
                "VUID-VkSwapchainCreateInfoKHR-imageExtent-01274",
                format!(
                    "{func_name}: pCreateInfo->imageExtent ({}, {}) is outside the surface's bounds: \
                     currentExtent = ({}, {}), minImageExtent = ({}, {}), maxImageExtent = ({}, {}).",
                    create_info.image_extent.width,
                    create_info.image_extent.height,
                    capabilities.current_extent.width,
                    capabilities.current_extent.height,
                    capabilities.min_image_extent.width,
                    capabilities.min_image_extent.height,
                    capabilities.max_image_extent.width,
                    capabilities.max_image_extent.height
                ),
            );
        }

        if shared_present {
            if !extensions.khr_shared_presentable_image {
                if self.log_error(
                    &objects,
                    EXTENSION_NOT_ENABLED,
                    format!(
                        "{func_name}: pCreateInfo->presentMode {:?} requires VK_KHR_shared_presentable_image.",
                        create_info.present_mode
                    ),
                ) {
                    return ControlFlow::Break(());
                }
            } else if create_info.min_image_count != 1 {
                if self.log_error(
                    &objects,
                    "VUID-VkSwapchainCreateInfoKHR-minImageCount-01383",
                    format!(
                        "{func_name}: pCreateInfo->minImageCount must be 1 for present mode {:?}, got {}.",
                        create_info.present_mode, create_info.min_image_count
                    ),
                ) {
                    return ControlFlow::Break(());
                }
            }

            if extensions.khr_shared_presentable_image
                && device.instance_extensions().khr_get_surface_capabilities2
            {
                let query = SurfaceQuery {
                    shared_present: true,
                    ..SurfaceQuery::new(surface.surface_handle())
                };
                if let Some(shared) = self.extended_surface_capabilities(physical_device, &query) {
                    if !shared
                        .shared_present_supported_usage
                        .contains(create_info.image_usage)
                    {
                        skip |= self.log_error(
                            &objects,
                            "VUID-VkSwapchainCreateInfoKHR-imageUsage-01384",
                            format!(
                                "{func_name}: pCreateInfo->imageUsage {:?} is not a subset of \
                                 sharedPresentSupportedUsageFlags {:?}.",
                                create_info.image_usage, shared.shared_present_supported_usage
                            ),
                        );
                    }
                }
            }
        }

        skip |= self.validate_swapchain_present_modes_create_info(device, func_name, create_info, surface);

        if extensions.ext_swapchain_maintenance1 {
            skip |= self.validate_swapchain_present_scaling_create_info(
                device,
                func_name,
                create_info,
                surface,
                &capabilities,
            );
        }

        ControlFlow::Continue(skip)
    }

    /// Checks on the image every swapchain image is implicitly created with.
    fn validate_create_swapchain_image(
        &self,
        device: &DeviceState,
        func_name: &str,
        create_info: &SwapchainCreateInfo,
    ) -> Verdict {
        let objects = [ObjectRef::new(device.handle)];
        let physical_device = &device.physical_device;
        let mut skip = false;

        if create_info.image_sharing_mode == vk::SharingMode::CONCURRENT {
            if let Some(indices) = &create_info.queue_family_indices {
                let family_count = physical_device.queue_family_count();
                for (i, &index) in indices.iter().enumerate() {
                    let out_of_range = index == vk::QUEUE_FAMILY_IGNORED
                        || family_count.is_some_and(|count| index >= count);
                    if out_of_range
                        && self.log_error(
                            &objects,
                            "VUID-VkSwapchainCreateInfoKHR-imageSharingMode-01428",
                            format!(
                                "{func_name}: pCreateInfo->pQueueFamilyIndices[{i}] ({index}) is not a valid \
                                 queue family index for this physical device."
                            ),
                        )
                    {
                        return ControlFlow::Break(());
                    }
                }
            }
        }

        let mutable_format = create_info
            .flags
            .contains(vk::SwapchainCreateFlagsKHR::MUTABLE_FORMAT);

        if !mutable_format {
            let features = self
                .driver()
                .format_properties(physical_device.handle, create_info.image_format)
                .optimal_tiling_features;
            if let Some(missing) = missing_usage_feature(create_info.image_usage, features) {
                if self.log_error(
                    &objects,
                    "VUID-VkSwapchainCreateInfoKHR-imageFormat-01778",
                    format!(
                        "{func_name}: pCreateInfo->imageUsage contains {:?} but format {:?} does not support \
                         it with optimal tiling (features {:?}).",
                        missing, create_info.image_format, features
                    ),
                ) {
                    return ControlFlow::Break(());
                }
            }
        }

        let format_list = create_info.next.find(SwapchainCreateNext::image_format_list);
        if mutable_format {
            let lists_own_format = format_list
                .is_some_and(|list| list.view_formats.contains(&create_info.image_format));
            if !lists_own_format {
                skip |= self.log_error(
                    &objects,
                    "VUID-VkSwapchainCreateInfoKHR-flags-03168",
                    format!(
                        "{func_name}: VK_SWAPCHAIN_CREATE_MUTABLE_FORMAT_BIT_KHR requires a \
                         VkImageFormatListCreateInfo whose pViewFormats includes imageFormat {:?}.",
                        create_info.image_format
                    ),
                );
            }
        } else if let Some(list) = format_list {
            let foreign = list
                .view_formats
                .iter()
                .any(|&format| format != create_info.image_format);
            if foreign {
                skip |= self.log_error(
                    &objects,
                    "VUID-VkSwapchainCreateInfoKHR-pNext-04099",
                    format!(
                        "{func_name}: without VK_SWAPCHAIN_CREATE_MUTABLE_FORMAT_BIT_KHR the \
                         VkImageFormatListCreateInfo may only list imageFormat {:?}, got {:?}.",
                        create_info.image_format, list.view_formats
                    ),
                );
            }
        }

        let image_info = ImageCreateInfo::for_swapchain(create_info);
        match self
            .driver()
            .image_format_properties(physical_device.handle, &image_info)
        {
            Err(err) => {
                if self.log_error(
                    &objects,
                    "VUID-VkSwapchainCreateInfoKHR-imageFormat-01778",
                    format!(
                        "{func_name}: vkGetPhysicalDeviceImageFormatProperties() returned {:?} for the \
                         swapchain's implied image parameters.",
                        err
                    ),
                ) {
                    return ControlFlow::Break(());
                }
            }
            Ok(properties) => {
                if create_info.image_array_layers > properties.max_array_layers
                    && self.log_error(
                        &objects,
                        "VUID-VkSwapchainCreateInfoKHR-imageFormat-01778",
                        format!(
                            "{func_name}: pCreateInfo->imageArrayLayers {} exceeds maxArrayLayers {} for \
                             the implied image.",
                            create_info.image_array_layers, properties.max_array_layers
                        ),
                    )
                {
                    return ControlFlow::Break(());
                }
                let extent = create_info.image_extent;
                if (extent.width > properties.max_extent.width
                    || extent.height > properties.max_extent.height)
                    && self.log_error(
                        &objects,
                        "VUID-VkSwapchainCreateInfoKHR-imageFormat-01778",
                        format!(
                            "{func_name}: pCreateInfo->imageExtent ({}, {}) exceeds maxExtent ({}, {}) for \
                             the implied image.",
                            extent.width,
                            extent.height,
                            properties.max_extent.width,
                            properties.max_extent.height
                        ),
                    )
                {
                    return ControlFlow::Break(());
                }
            }
        }

        ControlFlow::Continue(skip)
    }
}

/// First requested usage bit the format features cannot back.
fn missing_usage_feature(
    usage: vk::ImageUsageFlags,
    features: vk::FormatFeatureFlags,
) -> Option<vk::ImageUsageFlags> {
    const REQUIRED: [(vk::ImageUsageFlags, vk::FormatFeatureFlags); 6] = [
        (vk::ImageUsageFlags::SAMPLED, vk::FormatFeatureFlags::SAMPLED_IMAGE),
        (vk::ImageUsageFlags::STORAGE, vk::FormatFeatureFlags::STORAGE_IMAGE),
        (vk::ImageUsageFlags::COLOR_ATTACHMENT, vk::FormatFeatureFlags::COLOR_ATTACHMENT),
        (
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
        ),
        (vk::ImageUsageFlags::TRANSFER_SRC, vk::FormatFeatureFlags::TRANSFER_SRC),
        (vk::ImageUsageFlags::TRANSFER_DST, vk::FormatFeatureFlags::TRANSFER_DST),
    ];

    REQUIRED
        .iter()
        .find(|(bit, feature)| usage.contains(*bit) && !features.contains(*feature))
        .map(|(bit, _)| *bit)
        .or_else(|| {
            let attachment =
                vk::FormatFeatureFlags::COLOR_ATTACHMENT | vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;
            (usage.contains(vk::ImageUsageFlags::INPUT_ATTACHMENT) && !features.intersects(attachment))
                .then_some(vk::ImageUsageFlags::INPUT_ATTACHMENT)
        })
}
