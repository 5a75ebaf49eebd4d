//! Read-only queries the layer issues to the next element of the call chain.

use ash::prelude::VkResult;
use ash::vk;
use dashmap::DashMap;

use crate::info::ImageCreateInfo;

/// What to ask `vkGetPhysicalDeviceSurfaceCapabilities2KHR` for. Each flag
/// chains one output structure; callers only set flags whose extension is
/// enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceQuery {
    pub surface: vk::SurfaceKHR,
    /// Chained as `VkSurfacePresentModeEXT`.
    pub present_mode: Option<vk::PresentModeKHR>,
    pub shared_present: bool,
    pub protected: bool,
    pub present_scaling: bool,
    pub compatible_modes: bool,
}

impl SurfaceQuery {
    pub fn new(surface: vk::SurfaceKHR) -> Self {
        Self {
            surface,
            ..Default::default()
        }
    }

    /// The per-present-mode query used for scaling and compatibility data.
    pub fn for_present_mode(surface: vk::SurfaceKHR, mode: vk::PresentModeKHR) -> Self {
        Self {
            surface,
            present_mode: Some(mode),
            present_scaling: true,
            compatible_modes: true,
            ..Default::default()
        }
    }
}

/// `VkSurfacePresentScalingCapabilitiesEXT`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentScalingCapabilities {
    pub supported_present_scaling: vk::PresentScalingFlagsEXT,
    pub supported_present_gravity_x: vk::PresentGravityFlagsEXT,
    pub supported_present_gravity_y: vk::PresentGravityFlagsEXT,
    pub min_scaled_image_extent: vk::Extent2D,
    pub max_scaled_image_extent: vk::Extent2D,
}

/// Result of a capabilities query, base capabilities plus whichever chained
/// outputs were requested.
#[derive(Debug, Clone, Default)]
pub struct SurfaceCapabilities {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub shared_present_supported_usage: vk::ImageUsageFlags,
    pub supports_protected: bool,
    pub present_scaling: PresentScalingCapabilities,
    pub compatible_present_modes: Vec<vk::PresentModeKHR>,
}

impl From<vk::SurfaceCapabilitiesKHR> for SurfaceCapabilities {
    fn from(capabilities: vk::SurfaceCapabilitiesKHR) -> Self {
        Self {
            capabilities,
            ..Default::default()
        }
    }
}

/// Driver entry points consulted during validation. None of them change
/// driver state.
pub trait DriverQueries: Send + Sync {
    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;

    fn surface_capabilities2(
        &self,
        physical_device: vk::PhysicalDevice,
        query: &SurfaceQuery,
    ) -> VkResult<SurfaceCapabilities>;

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;

    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;

    fn format_properties(
        &self,
        physical_device: vk::PhysicalDevice,
        format: vk::Format,
    ) -> vk::FormatProperties;

    fn image_format_properties(
        &self,
        physical_device: vk::PhysicalDevice,
        info: &ImageCreateInfo,
    ) -> VkResult<vk::ImageFormatProperties>;

    /// Number of images the driver created for `swapchain`.
    fn swapchain_image_count(
        &self,
        device: vk::Device,
        swapchain: vk::SwapchainKHR,
    ) -> VkResult<u32>;
}

// ── ash implementation ──────────────────────────────────────

/// [`DriverQueries`] over ash function tables loaded from the next layer.
pub struct AshDriver {
    instance: ash::Instance,
    surface: ash::khr::surface::Instance,
    surface_capabilities2: Option<ash::khr::get_surface_capabilities2::Instance>,
    swapchain_fns: DashMap<vk::Device, ash::khr::swapchain::Device>,
}

impl AshDriver {
    /// `has_capabilities2` must reflect whether
    /// VK_KHR_get_surface_capabilities2 was enabled on `instance`.
    pub fn new(entry: &ash::Entry, instance: ash::Instance, has_capabilities2: bool) -> Self {
        let surface = ash::khr::surface::Instance::new(entry, &instance);
        let surface_capabilities2 = has_capabilities2
            .then(|| ash::khr::get_surface_capabilities2::Instance::new(entry, &instance));
        Self {
            instance,
            surface,
            surface_capabilities2,
            swapchain_fns: DashMap::new(),
        }
    }

    /// Load VK_KHR_swapchain entry points for a newly created device.
    pub fn register_device(&self, device: &ash::Device) {
        self.swapchain_fns.insert(
            device.handle(),
            ash::khr::swapchain::Device::new(&self.instance, device),
        );
    }

    pub fn unregister_device(&self, device: vk::Device) {
        self.swapchain_fns.remove(&device);
    }

    fn query_capabilities2(
        &self,
        fns: &ash::khr::get_surface_capabilities2::Instance,
        physical_device: vk::PhysicalDevice,
        query: &SurfaceQuery,
        compatible_modes: Option<&mut [vk::PresentModeKHR]>,
    ) -> VkResult<(SurfaceCapabilities, u32)> {
        let mut mode_info = vk::SurfacePresentModeEXT::default();
        let mut info = vk::PhysicalDeviceSurfaceInfo2KHR::default().surface(query.surface);
        if let Some(mode) = query.present_mode {
            mode_info = mode_info.present_mode(mode);
            info = info.push_next(&mut mode_info);
        }

        let mut shared = vk::SharedPresentSurfaceCapabilitiesKHR::default();
        let mut protected = vk::SurfaceProtectedCapabilitiesKHR::default();
        let mut scaling = vk::SurfacePresentScalingCapabilitiesEXT::default();
        let mut compat = vk::SurfacePresentModeCompatibilityEXT::default();
        if let Some(buffer) = compatible_modes {
            compat = compat.present_modes(buffer);
        }

        let mut caps2 = vk::SurfaceCapabilities2KHR::default();
        if query.shared_present {
            caps2 = caps2.push_next(&mut shared);
        }
        if query.protected {
            caps2 = caps2.push_next(&mut protected);
        }
        if query.present_scaling {
            caps2 = caps2.push_next(&mut scaling);
        }
        if query.compatible_modes {
            caps2 = caps2.push_next(&mut compat);
        }

        unsafe { fns.get_physical_device_surface_capabilities2(physical_device, &info, &mut caps2)? };
        let base = caps2.surface_capabilities;

        let capabilities = SurfaceCapabilities {
            capabilities: base,
            shared_present_supported_usage: shared.shared_present_supported_usage_flags,
            supports_protected: protected.supports_protected == vk::TRUE,
            present_scaling: PresentScalingCapabilities {
                supported_present_scaling: scaling.supported_present_scaling,
                supported_present_gravity_x: scaling.supported_present_gravity_x,
                supported_present_gravity_y: scaling.supported_present_gravity_y,
                min_scaled_image_extent: scaling.min_scaled_image_extent,
                max_scaled_image_extent: scaling.max_scaled_image_extent,
            },
            compatible_present_modes: Vec::new(),
        };
        Ok((capabilities, compat.present_mode_count))
    }
}

impl DriverQueries for AshDriver {
    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        unsafe {
            self.surface
                .get_physical_device_surface_support(physical_device, queue_family_index, surface)
        }
    }

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface
                .get_physical_device_surface_capabilities(physical_device, surface)
        }
    }

    fn surface_capabilities2(
        &self,
        physical_device: vk::PhysicalDevice,
        query: &SurfaceQuery,
    ) -> VkResult<SurfaceCapabilities> {
        let Some(fns) = self.surface_capabilities2.as_ref() else {
            return Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT);
        };

        let (mut capabilities, mode_count) =
            self.query_capabilities2(fns, physical_device, query, None)?;
        if query.compatible_modes && mode_count > 0 {
            let mut modes = vec![vk::PresentModeKHR::default(); mode_count as usize];
            let (refreshed, written) =
                self.query_capabilities2(fns, physical_device, query, Some(&mut modes))?;
            modes.truncate(written as usize);
            capabilities = refreshed;
            capabilities.compatible_present_modes = modes;
        }
        Ok(capabilities)
    }

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.surface
                .get_physical_device_surface_formats(physical_device, surface)
        }
    }

    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface
                .get_physical_device_surface_present_modes(physical_device, surface)
        }
    }

    fn format_properties(
        &self,
        physical_device: vk::PhysicalDevice,
        format: vk::Format,
    ) -> vk::FormatProperties {
        unsafe {
            self.instance
                .get_physical_device_format_properties(physical_device, format)
        }
    }

    fn image_format_properties(
        &self,
        physical_device: vk::PhysicalDevice,
        info: &ImageCreateInfo,
    ) -> VkResult<vk::ImageFormatProperties> {
        unsafe {
            self.instance.get_physical_device_image_format_properties(
                physical_device,
                info.format,
                info.image_type,
                info.tiling,
                info.usage,
                info.flags,
            )
        }
    }

    fn swapchain_image_count(
        &self,
        device: vk::Device,
        swapchain: vk::SwapchainKHR,
    ) -> VkResult<u32> {
        let fns = self
            .swapchain_fns
            .get(&device)
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)?;
        let images = unsafe { fns.get_swapchain_images(swapchain)? };
        Ok(images.len() as u32)
    }
}
