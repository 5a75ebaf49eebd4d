//! Shared fixture: a scripted driver and a layer with one instance, physical
//! device, device, queue and surface already recorded.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use parking_lot::Mutex;
use vkv_core::config::LayerSettings;
use vkv_layer::info::{
    DeviceCreateInfo, DeviceExtensions, ImageCreateInfo, InstanceExtensions, LayoutTransition, PresentInfo,
    SemaphoreCreateInfo, SubmitInfo, SwapchainCreateInfo, SwapchainPresent,
};
use vkv_layer::state::SwapchainState;
use vkv_layer::{CollectingSink, DriverQueries, SurfaceCapabilities, SurfaceQuery, ValidationLayer};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

/// Driver whose every answer is set by the test.
pub struct MockDriver {
    pub surface_support: Mutex<VkResult<bool>>,
    pub capabilities: Mutex<vk::SurfaceCapabilitiesKHR>,
    /// Per-present-mode answers. Modes without an entry report the base
    /// capabilities, no scaling support and only themselves as compatible.
    pub mode_capabilities: Mutex<HashMap<vk::PresentModeKHR, SurfaceCapabilities>>,
    pub shared_present_usage: Mutex<vk::ImageUsageFlags>,
    pub supports_protected: Mutex<bool>,
    pub formats: Mutex<Vec<vk::SurfaceFormatKHR>>,
    pub present_modes: Mutex<Vec<vk::PresentModeKHR>>,
    pub format_features: Mutex<vk::FormatFeatureFlags>,
    pub image_format_properties: Mutex<VkResult<vk::ImageFormatProperties>>,
    pub swapchain_image_count: Mutex<u32>,
    /// Every capabilities2 query issued, in order.
    pub capabilities2_queries: Mutex<Vec<SurfaceQuery>>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            surface_support: Mutex::new(Ok(true)),
            capabilities: Mutex::new(vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: vk::Extent2D {
                    width: WIDTH,
                    height: HEIGHT,
                },
                min_image_extent: vk::Extent2D { width: 1, height: 1 },
                max_image_extent: vk::Extent2D {
                    width: 4096,
                    height: 4096,
                },
                max_image_array_layers: 2,
                supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY
                    | vk::SurfaceTransformFlagsKHR::ROTATE_90,
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE
                    | vk::CompositeAlphaFlagsKHR::INHERIT,
                supported_usage_flags: vk::ImageUsageFlags::COLOR_ATTACHMENT
                    | vk::ImageUsageFlags::TRANSFER_SRC
                    | vk::ImageUsageFlags::TRANSFER_DST,
            }),
            mode_capabilities: Mutex::new(HashMap::new()),
            shared_present_usage: Mutex::new(vk::ImageUsageFlags::COLOR_ATTACHMENT),
            supports_protected: Mutex::new(false),
            formats: Mutex::new(vec![
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                vk::SurfaceFormatKHR {
                    format: vk::Format::R8G8B8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ]),
            present_modes: Mutex::new(vec![
                vk::PresentModeKHR::FIFO,
                vk::PresentModeKHR::MAILBOX,
                vk::PresentModeKHR::IMMEDIATE,
            ]),
            format_features: Mutex::new(
                vk::FormatFeatureFlags::COLOR_ATTACHMENT
                    | vk::FormatFeatureFlags::SAMPLED_IMAGE
                    | vk::FormatFeatureFlags::TRANSFER_SRC
                    | vk::FormatFeatureFlags::TRANSFER_DST,
            ),
            image_format_properties: Mutex::new(Ok(vk::ImageFormatProperties {
                max_extent: vk::Extent3D {
                    width: 8192,
                    height: 8192,
                    depth: 1,
                },
                max_mip_levels: 1,
                max_array_layers: 16,
                sample_counts: vk::SampleCountFlags::TYPE_1,
                max_resource_size: 1 << 32,
            })),
            swapchain_image_count: Mutex::new(3),
            capabilities2_queries: Mutex::new(Vec::new()),
        }
    }
}

impl MockDriver {
    pub fn set_mode_capabilities(&self, mode: vk::PresentModeKHR, capabilities: SurfaceCapabilities) {
        self.mode_capabilities.lock().insert(mode, capabilities);
    }

    pub fn protected_queries(&self) -> usize {
        self.capabilities2_queries
            .lock()
            .iter()
            .filter(|query| query.protected)
            .count()
    }
}

impl DriverQueries for MockDriver {
    fn surface_support(
        &self,
        _physical_device: vk::PhysicalDevice,
        _queue_family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        *self.surface_support.lock()
    }

    fn surface_capabilities(
        &self,
        _physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        Ok(*self.capabilities.lock())
    }

    fn surface_capabilities2(
        &self,
        _physical_device: vk::PhysicalDevice,
        query: &SurfaceQuery,
    ) -> VkResult<SurfaceCapabilities> {
        self.capabilities2_queries.lock().push(*query);
        let base = *self.capabilities.lock();
        if let Some(mode) = query.present_mode {
            if let Some(configured) = self.mode_capabilities.lock().get(&mode) {
                return Ok(configured.clone());
            }
            return Ok(SurfaceCapabilities {
                compatible_present_modes: vec![mode],
                ..SurfaceCapabilities::from(base)
            });
        }
        Ok(SurfaceCapabilities {
            shared_present_supported_usage: *self.shared_present_usage.lock(),
            supports_protected: *self.supports_protected.lock(),
            ..SurfaceCapabilities::from(base)
        })
    }

    fn surface_formats(
        &self,
        _physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        Ok(self.formats.lock().clone())
    }

    fn surface_present_modes(
        &self,
        _physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        Ok(self.present_modes.lock().clone())
    }

    fn format_properties(&self, _physical_device: vk::PhysicalDevice, _format: vk::Format) -> vk::FormatProperties {
        vk::FormatProperties {
            optimal_tiling_features: *self.format_features.lock(),
            ..Default::default()
        }
    }

    fn image_format_properties(
        &self,
        _physical_device: vk::PhysicalDevice,
        _info: &ImageCreateInfo,
    ) -> VkResult<vk::ImageFormatProperties> {
        *self.image_format_properties.lock()
    }

    fn swapchain_image_count(&self, _device: vk::Device, _swapchain: vk::SwapchainKHR) -> VkResult<u32> {
        Ok(*self.swapchain_image_count.lock())
    }
}

// ── Fixture ─────────────────────────────────────────────────

pub struct FixtureConfig {
    pub instance_extensions: InstanceExtensions,
    pub device: DeviceCreateInfo,
    /// Keep validating after an error instead of aborting at the first one.
    pub accumulate: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            instance_extensions: InstanceExtensions::default(),
            device: DeviceCreateInfo {
                queue_family_indices: vec![0],
                physical_device_count: 1,
                extensions: DeviceExtensions::default(),
                features: Default::default(),
            },
            accumulate: false,
        }
    }
}

pub struct Fixture {
    pub layer: ValidationLayer,
    pub driver: Arc<MockDriver>,
    pub sink: Arc<CollectingSink>,
    pub instance: vk::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device: vk::Device,
    pub queue: vk::Queue,
    pub surface: vk::SurfaceKHR,
    next_handle: AtomicU64,
}

pub fn fixture() -> Fixture {
    Fixture::new(FixtureConfig::default())
}

/// Default fixture whose sink lets every check run.
pub fn accumulating_fixture() -> Fixture {
    Fixture::new(FixtureConfig {
        accumulate: true,
        ..Default::default()
    })
}

impl Fixture {
    pub fn new(config: FixtureConfig) -> Self {
        let driver = Arc::new(MockDriver::default());
        let sink = Arc::new(if config.accumulate {
            CollectingSink::accumulating()
        } else {
            CollectingSink::new()
        });
        let layer = ValidationLayer::new(driver.clone(), sink.clone(), LayerSettings::default());

        let instance = vk::Instance::from_raw(0x1000);
        let physical_device = vk::PhysicalDevice::from_raw(0x2000);
        let device = vk::Device::from_raw(0x3000);
        let queue = vk::Queue::from_raw(0x4000);
        let surface = vk::SurfaceKHR::from_raw(0x5000);

        layer.post_call_record_create_instance(instance, config.instance_extensions, vk::Result::SUCCESS);
        layer.post_call_record_enumerate_physical_devices(instance, &[physical_device], vk::Result::SUCCESS);
        layer.post_call_record_get_physical_device_queue_family_properties(
            physical_device,
            &[
                vk::QueueFamilyProperties {
                    queue_flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
                    queue_count: 1,
                    ..Default::default()
                },
                vk::QueueFamilyProperties {
                    queue_flags: vk::QueueFlags::TRANSFER,
                    queue_count: 1,
                    ..Default::default()
                },
            ],
        );
        layer.post_call_record_create_device(physical_device, &config.device, device, vk::Result::SUCCESS);
        layer.post_call_record_get_device_queue(device, 0, 0, queue);
        layer.post_call_record_create_surface(instance, surface, vk::Result::SUCCESS);

        Self {
            layer,
            driver,
            sink,
            instance,
            physical_device,
            device,
            queue,
            surface,
            next_handle: AtomicU64::new(0x10_000),
        }
    }

    pub fn next_raw(&self) -> u64 {
        self.next_handle.fetch_add(0x10, Ordering::Relaxed)
    }

    /// A create info that passes every check against the default driver.
    pub fn swapchain_info(&self) -> SwapchainCreateInfo {
        SwapchainCreateInfo {
            surface: self.surface,
            image_extent: vk::Extent2D {
                width: WIDTH,
                height: HEIGHT,
            },
            ..Default::default()
        }
    }

    /// Record a successful creation and retrieval of all images.
    pub fn create_swapchain(&self, create_info: &SwapchainCreateInfo) -> vk::SwapchainKHR {
        let swapchain = vk::SwapchainKHR::from_raw(self.next_raw());
        self.layer
            .post_call_record_create_swapchain_khr(self.device, create_info, swapchain, vk::Result::SUCCESS);
        let count = *self.driver.swapchain_image_count.lock();
        self.layer
            .post_call_record_get_swapchain_images_khr(self.device, swapchain, count, None, vk::Result::SUCCESS);
        let images: Vec<vk::Image> = (0..count)
            .map(|_| vk::Image::from_raw(self.next_raw()))
            .collect();
        self.layer.post_call_record_get_swapchain_images_khr(
            self.device,
            swapchain,
            count,
            Some(&images),
            vk::Result::SUCCESS,
        );
        swapchain
    }

    pub fn default_swapchain(&self) -> vk::SwapchainKHR {
        self.create_swapchain(&self.swapchain_info())
    }

    /// Record a successful acquire of `index` with no sync objects.
    pub fn acquire(&self, swapchain: vk::SwapchainKHR, index: u32) {
        self.layer.post_call_record_acquire_next_image_khr(
            self.device,
            swapchain,
            u64::MAX,
            vk::Semaphore::null(),
            vk::Fence::null(),
            index,
            vk::Result::SUCCESS,
        );
    }

    pub fn semaphore(&self, semaphore_type: vk::SemaphoreType) -> vk::Semaphore {
        let semaphore = vk::Semaphore::from_raw(self.next_raw());
        self.layer.post_call_record_create_semaphore(
            self.device,
            &SemaphoreCreateInfo {
                semaphore_type,
                ..Default::default()
            },
            semaphore,
            vk::Result::SUCCESS,
        );
        semaphore
    }

    pub fn fence(&self, flags: vk::FenceCreateFlags) -> vk::Fence {
        let fence = vk::Fence::from_raw(self.next_raw());
        self.layer
            .post_call_record_create_fence(self.device, flags, fence, vk::Result::SUCCESS);
        fence
    }

    /// Handle of the image bound to slot `index` of `swapchain`.
    pub fn swapchain_image(&self, swapchain: vk::SwapchainKHR, index: u32) -> vk::Image {
        self.layer
            .store()
            .get::<SwapchainState>(swapchain)
            .and_then(|state| state.image(index))
            .and_then(|slot| slot.image)
            .map(|image| image.handle)
            .expect("swapchain image was retrieved")
    }

    /// Record a submission that moves every layer of `image` to `layout`.
    pub fn transition(&self, image: vk::Image, layout: vk::ImageLayout) {
        let submit = SubmitInfo {
            layout_transitions: vec![LayoutTransition {
                image,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
                new_layout: layout,
            }],
            ..Default::default()
        };
        self.layer
            .post_call_record_queue_submit(self.queue, &[submit], vk::Fence::null(), vk::Result::SUCCESS);
    }

    pub fn validate_create(&self, create_info: &SwapchainCreateInfo) -> bool {
        self.layer
            .pre_call_validate_create_swapchain_khr(self.device, create_info)
    }
}

pub fn present_info(swapchain: vk::SwapchainKHR, image_index: u32) -> PresentInfo {
    PresentInfo {
        swapchains: vec![SwapchainPresent {
            swapchain,
            image_index,
        }],
        ..Default::default()
    }
}

/// Scaling capabilities answer for one present mode.
pub fn scaling_capabilities(
    base: vk::SurfaceCapabilitiesKHR,
    scaling: vk::PresentScalingFlagsEXT,
    gravity_x: vk::PresentGravityFlagsEXT,
    gravity_y: vk::PresentGravityFlagsEXT,
    compatible: Vec<vk::PresentModeKHR>,
) -> SurfaceCapabilities {
    SurfaceCapabilities {
        present_scaling: vkv_layer::driver::PresentScalingCapabilities {
            supported_present_scaling: scaling,
            supported_present_gravity_x: gravity_x,
            supported_present_gravity_y: gravity_y,
            min_scaled_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_scaled_image_extent: vk::Extent2D {
                width: 2048,
                height: 2048,
            },
        },
        compatible_present_modes: compatible,
        ..SurfaceCapabilities::from(base)
    }
}
