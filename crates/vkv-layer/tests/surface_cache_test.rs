//! Integration test: surface capability caching
//!
//! Application-issued surface queries populate the per-surface cache, and
//! validation reads cached answers before asking the driver.

mod common;

use ash::vk;
use common::{fixture, scaling_capabilities, Fixture, FixtureConfig};
use vkv_layer::info::{InstanceExtensions, SwapchainCreateInfo};
use vkv_layer::state::{PhysicalDeviceState, SurfaceState};
use vkv_layer::{SurfaceCapabilities, SurfaceQuery};

fn surface_state(fx: &Fixture) -> std::sync::Arc<SurfaceState> {
    fx.layer
        .store()
        .get::<SurfaceState>(fx.surface)
        .expect("surface tracked")
}

#[test]
fn test_recorded_formats_are_used_for_validation() {
    let fx = fixture();
    let recorded = [vk::SurfaceFormatKHR {
        format: vk::Format::R16G16B16A16_SFLOAT,
        color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
    }];
    fx.layer.post_call_record_get_physical_device_surface_formats_khr(
        fx.physical_device,
        fx.surface,
        &recorded,
        vk::Result::SUCCESS,
    );

    let cached = surface_state(&fx)
        .cache
        .formats(fx.physical_device)
        .expect("formats cached");
    assert_eq!(&cached[..], &recorded[..]);

    // The driver would accept B8G8R8A8_UNORM, but the cached answer wins.
    assert!(fx.validate_create(&fx.swapchain_info()));
    assert!(fx
        .sink
        .contains("VUID-VkSwapchainCreateInfoKHR-imageFormat-01273"));
}

#[test]
fn test_incomplete_lists_are_not_cached() {
    let fx = fixture();
    let modes = [vk::PresentModeKHR::FIFO];
    fx.layer.post_call_record_get_physical_device_surface_present_modes_khr(
        fx.physical_device,
        fx.surface,
        &modes,
        vk::Result::INCOMPLETE,
    );
    fx.layer.post_call_record_get_physical_device_surface_present_modes_khr(
        fx.physical_device,
        fx.surface,
        &[],
        vk::Result::SUCCESS,
    );

    assert!(surface_state(&fx)
        .cache
        .present_modes(fx.physical_device)
        .is_none());
}

#[test]
fn test_recorded_queue_support_is_used_for_validation() {
    let fx = fixture();
    fx.layer.post_call_record_get_physical_device_surface_support_khr(
        fx.physical_device,
        0,
        fx.surface,
        false,
        vk::Result::SUCCESS,
    );
    assert_eq!(
        surface_state(&fx).cache.queue_support(fx.physical_device, 0),
        Some(false)
    );

    assert!(fx.validate_create(&fx.swapchain_info()));
    assert_eq!(fx.sink.vuids(), ["VUID-VkSwapchainCreateInfoKHR-surface-01270"]);
}

#[test]
fn test_capabilities_record_replaces_cached_answer() {
    let fx = fixture();
    let base = *fx.driver.capabilities.lock();
    let narrowed = vk::SurfaceCapabilitiesKHR {
        max_image_count: 3,
        ..base
    };
    fx.layer.post_call_record_get_physical_device_surface_capabilities_khr(
        fx.physical_device,
        fx.surface,
        &narrowed,
        vk::Result::SUCCESS,
    );

    let cached = surface_state(&fx)
        .cache
        .capabilities(fx.physical_device, None)
        .expect("capabilities cached");
    assert_eq!(cached.capabilities.max_image_count, 3);

    fx.layer.post_call_record_get_physical_device_surface_capabilities_khr(
        fx.physical_device,
        fx.surface,
        &base,
        vk::Result::ERROR_SURFACE_LOST_KHR,
    );
    let still = surface_state(&fx)
        .cache
        .capabilities(fx.physical_device, None)
        .expect("capabilities cached");
    assert_eq!(still.capabilities.max_image_count, 3);
}

#[test]
fn test_per_mode_answer_needs_both_outputs() {
    let fx = fixture();
    let base = *fx.driver.capabilities.lock();
    let answer = scaling_capabilities(
        base,
        vk::PresentScalingFlagsEXT::STRETCH,
        vk::PresentGravityFlagsEXT::MIN,
        vk::PresentGravityFlagsEXT::MIN,
        vec![vk::PresentModeKHR::MAILBOX],
    );

    let scaling_only = SurfaceQuery {
        present_scaling: true,
        compatible_modes: false,
        ..SurfaceQuery::for_present_mode(fx.surface, vk::PresentModeKHR::MAILBOX)
    };
    fx.layer.post_call_record_get_physical_device_surface_capabilities2_khr(
        fx.physical_device,
        &scaling_only,
        &answer,
        vk::Result::SUCCESS,
    );
    assert!(surface_state(&fx)
        .cache
        .capabilities(fx.physical_device, Some(vk::PresentModeKHR::MAILBOX))
        .is_none());

    let full = SurfaceQuery::for_present_mode(fx.surface, vk::PresentModeKHR::MAILBOX);
    fx.layer.post_call_record_get_physical_device_surface_capabilities2_khr(
        fx.physical_device,
        &full,
        &answer,
        vk::Result::SUCCESS,
    );
    let cached = surface_state(&fx)
        .cache
        .capabilities(fx.physical_device, Some(vk::PresentModeKHR::MAILBOX))
        .expect("per-mode answer cached");
    assert_eq!(cached.compatible_present_modes, [vk::PresentModeKHR::MAILBOX]);
}

#[test]
fn test_capabilities2_without_mode_stores_base_answer() {
    let fx = fixture();
    let base = *fx.driver.capabilities.lock();
    let answer = SurfaceCapabilities::from(vk::SurfaceCapabilitiesKHR {
        min_image_count: 4,
        ..base
    });
    fx.layer.post_call_record_get_physical_device_surface_capabilities2_khr(
        fx.physical_device,
        &SurfaceQuery::new(fx.surface),
        &answer,
        vk::Result::SUCCESS,
    );

    let cached = surface_state(&fx)
        .cache
        .capabilities(fx.physical_device, None)
        .expect("capabilities cached");
    assert_eq!(cached.capabilities.min_image_count, 4);
}

#[test]
fn test_surfaceless_queries_cache_on_physical_device() {
    let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::SHARED_DEMAND_REFRESH];

    let plain = fixture();
    plain.layer.post_call_record_get_physical_device_surface_present_modes_khr(
        plain.physical_device,
        vk::SurfaceKHR::null(),
        &modes,
        vk::Result::SUCCESS,
    );
    let physical_device = plain
        .layer
        .store()
        .get::<PhysicalDeviceState>(plain.physical_device)
        .expect("physical device tracked");
    assert!(physical_device.surfaceless.present_modes(plain.physical_device).is_none());

    let fx = surfaceless_fixture();
    fx.layer.post_call_record_get_physical_device_surface_present_modes_khr(
        fx.physical_device,
        vk::SurfaceKHR::null(),
        &modes,
        vk::Result::SUCCESS,
    );
    let physical_device = fx
        .layer
        .store()
        .get::<PhysicalDeviceState>(fx.physical_device)
        .expect("physical device tracked");
    let cached = physical_device
        .surfaceless
        .present_modes(fx.physical_device)
        .expect("surfaceless modes cached");
    assert_eq!(&cached[..], &modes[..]);
    assert!(surface_state(&fx).cache.present_modes(fx.physical_device).is_none());
}

fn surfaceless_fixture() -> Fixture {
    Fixture::new(FixtureConfig {
        instance_extensions: InstanceExtensions {
            google_surfaceless_query: true,
            ..Default::default()
        },
        ..Default::default()
    })
}

#[test]
fn test_surfaceless_creation_reads_physical_device_cache() {
    let fx = surfaceless_fixture();
    fx.layer.post_call_record_get_physical_device_surface_formats_khr(
        fx.physical_device,
        vk::SurfaceKHR::null(),
        &[vk::SurfaceFormatKHR {
            format: vk::Format::R16G16B16A16_SFLOAT,
            color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        }],
        vk::Result::SUCCESS,
    );
    *fx.driver.surface_support.lock() = Ok(false);

    let info = SwapchainCreateInfo {
        surface: vk::SurfaceKHR::null(),
        ..fx.swapchain_info()
    };
    assert!(fx.validate_create(&info));
    assert!(fx
        .sink
        .contains("VUID-VkSwapchainCreateInfoKHR-imageFormat-01273"));
    assert!(!fx.sink.contains("VUID-VkSwapchainCreateInfoKHR-surface-01270"));
}

#[test]
fn test_null_surface_without_surfaceless_query_skips_surface_checks() {
    let fx = fixture();
    fx.layer.post_call_record_get_physical_device_surface_formats_khr(
        fx.physical_device,
        vk::SurfaceKHR::null(),
        &[vk::SurfaceFormatKHR {
            format: vk::Format::R16G16B16A16_SFLOAT,
            color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        }],
        vk::Result::SUCCESS,
    );

    let info = SwapchainCreateInfo {
        surface: vk::SurfaceKHR::null(),
        ..fx.swapchain_info()
    };
    assert!(!fx.validate_create(&info));
    assert!(fx.sink.is_empty(), "{:?}", fx.sink.vuids());
}

#[test]
fn test_validation_populates_cache_from_driver() {
    let fx = fixture();
    assert!(!fx.validate_create(&fx.swapchain_info()));

    let surface = surface_state(&fx);
    assert!(surface.cache.formats(fx.physical_device).is_some());
    assert!(surface.cache.present_modes(fx.physical_device).is_some());
    assert_eq!(surface.cache.queue_support(fx.physical_device, 0), Some(true));
}
