//! Owned, typed forms of the create and submit structures the layer inspects.
//!
//! The dispatch shim converts the raw Vulkan structures into these before
//! calling into the layer, so validation never touches application memory.

use ash::vk;

use crate::chain::{Chain, PresentNext, SwapchainCreateNext};

/// Instance extensions that change WSI validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceExtensions {
    pub khr_get_surface_capabilities2: bool,
    pub khr_surface_protected_capabilities: bool,
    pub google_surfaceless_query: bool,
    pub khr_android_surface: bool,
    pub ext_surface_maintenance1: bool,
}

/// Device extensions that change WSI validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceExtensions {
    pub khr_shared_presentable_image: bool,
    pub ext_swapchain_maintenance1: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceFeatures {
    pub present_id: bool,
    pub present_wait: bool,
    pub swapchain_maintenance1: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCreateInfo {
    /// Families named by `pQueueCreateInfos`.
    pub queue_family_indices: Vec<u32>,
    /// `VkDeviceGroupDeviceCreateInfo::physicalDeviceCount`, zero when absent.
    pub physical_device_count: u32,
    pub extensions: DeviceExtensions,
    pub features: DeviceFeatures,
}

/// `VkSwapchainCreateInfoKHR`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapchainCreateInfo {
    pub flags: vk::SwapchainCreateFlagsKHR,
    pub surface: vk::SurfaceKHR,
    pub min_image_count: u32,
    pub image_format: vk::Format,
    pub image_color_space: vk::ColorSpaceKHR,
    pub image_extent: vk::Extent2D,
    pub image_array_layers: u32,
    pub image_usage: vk::ImageUsageFlags,
    pub image_sharing_mode: vk::SharingMode,
    pub queue_family_indices: Option<Vec<u32>>,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
    pub present_mode: vk::PresentModeKHR,
    pub old_swapchain: vk::SwapchainKHR,
    pub next: Chain<SwapchainCreateNext>,
}

impl Default for SwapchainCreateInfo {
    fn default() -> Self {
        Self {
            flags: vk::SwapchainCreateFlagsKHR::empty(),
            surface: vk::SurfaceKHR::null(),
            min_image_count: 2,
            image_format: vk::Format::B8G8R8A8_UNORM,
            image_color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            image_sharing_mode: vk::SharingMode::EXCLUSIVE,
            queue_family_indices: None,
            pre_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: vk::PresentModeKHR::FIFO,
            old_swapchain: vk::SwapchainKHR::null(),
            next: Chain::new(),
        }
    }
}

impl SwapchainCreateInfo {
    pub fn is_shared_presentable(&self) -> bool {
        is_shared_present_mode(self.present_mode)
    }
}

pub fn is_shared_present_mode(mode: vk::PresentModeKHR) -> bool {
    mode == vk::PresentModeKHR::SHARED_DEMAND_REFRESH
        || mode == vk::PresentModeKHR::SHARED_CONTINUOUS_REFRESH
}

/// `VkImageCreateInfo`, as far as the layer needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCreateInfo {
    pub flags: vk::ImageCreateFlags,
    pub image_type: vk::ImageType,
    pub format: vk::Format,
    pub extent: vk::Extent3D,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub samples: vk::SampleCountFlags,
    pub tiling: vk::ImageTiling,
    pub usage: vk::ImageUsageFlags,
    pub sharing_mode: vk::SharingMode,
    pub queue_family_indices: Vec<u32>,
    pub initial_layout: vk::ImageLayout,
}

impl ImageCreateInfo {
    /// The image every swapchain image is implicitly created with.
    pub fn for_swapchain(info: &SwapchainCreateInfo) -> Self {
        let mut flags = vk::ImageCreateFlags::empty();
        if info
            .flags
            .contains(vk::SwapchainCreateFlagsKHR::SPLIT_INSTANCE_BIND_REGIONS)
        {
            flags |= vk::ImageCreateFlags::SPLIT_INSTANCE_BIND_REGIONS;
        }
        if info.flags.contains(vk::SwapchainCreateFlagsKHR::PROTECTED) {
            flags |= vk::ImageCreateFlags::PROTECTED;
        }
        if info.flags.contains(vk::SwapchainCreateFlagsKHR::MUTABLE_FORMAT) {
            flags |= vk::ImageCreateFlags::MUTABLE_FORMAT | vk::ImageCreateFlags::EXTENDED_USAGE;
        }

        let queue_family_indices = if info.image_sharing_mode == vk::SharingMode::CONCURRENT {
            info.queue_family_indices.clone().unwrap_or_default()
        } else {
            Vec::new()
        };

        Self {
            flags,
            image_type: vk::ImageType::TYPE_2D,
            format: info.image_format,
            extent: vk::Extent3D {
                width: info.image_extent.width,
                height: info.image_extent.height,
                depth: 1,
            },
            mip_levels: 1,
            array_layers: info.image_array_layers,
            samples: vk::SampleCountFlags::TYPE_1,
            tiling: vk::ImageTiling::OPTIMAL,
            usage: info.image_usage,
            sharing_mode: info.image_sharing_mode,
            queue_family_indices,
            initial_layout: vk::ImageLayout::UNDEFINED,
        }
    }
}

/// `VkAcquireNextImageInfoKHR`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireNextImageInfo {
    pub swapchain: vk::SwapchainKHR,
    pub timeout: u64,
    pub semaphore: vk::Semaphore,
    pub fence: vk::Fence,
    pub device_mask: u32,
}

/// One swapchain/image pair of a present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainPresent {
    pub swapchain: vk::SwapchainKHR,
    pub image_index: u32,
}

/// `VkPresentInfoKHR`
#[derive(Debug, Clone, Default)]
pub struct PresentInfo {
    pub wait_semaphores: Vec<vk::Semaphore>,
    pub swapchains: Vec<SwapchainPresent>,
    pub next: Chain<PresentNext>,
}

/// `VkReleaseSwapchainImagesInfoEXT`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseSwapchainImagesInfo {
    pub swapchain: vk::SwapchainKHR,
    pub image_indices: Vec<u32>,
}

/// Layout change applied by a submission to a range of array layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutTransition {
    pub image: vk::Image,
    pub base_array_layer: u32,
    /// `vk::REMAINING_ARRAY_LAYERS` covers every layer from the base.
    pub layer_count: u32,
    pub new_layout: vk::ImageLayout,
}

/// What the layer keeps from one `VkSubmitInfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitInfo {
    pub wait_semaphores: Vec<vk::Semaphore>,
    pub signal_semaphores: Vec<vk::Semaphore>,
    /// Images referenced by the submitted command buffers.
    pub images: Vec<vk::Image>,
    pub layout_transitions: Vec<LayoutTransition>,
}

/// `VkSemaphoreCreateInfo` with its `VkSemaphoreTypeCreateInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemaphoreCreateInfo {
    pub semaphore_type: vk::SemaphoreType,
}

impl Default for SemaphoreCreateInfo {
    fn default() -> Self {
        Self {
            semaphore_type: vk::SemaphoreType::BINARY,
        }
    }
}
