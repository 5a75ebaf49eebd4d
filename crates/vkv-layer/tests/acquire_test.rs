//! Integration test: image acquisition
//!
//! Covers both acquire entry points: sync object rules, retired
//! swapchains, the infinite-timeout guarantee and the device mask.

mod common;

use ash::vk;
use common::{fixture, Fixture, FixtureConfig};
use vkv_layer::chain::{SwapchainCreateNext, SwapchainPresentModesCreateInfo};
use vkv_layer::info::{AcquireNextImageInfo, DeviceCreateInfo, DeviceExtensions, SwapchainCreateInfo};
use vkv_layer::SurfaceCapabilities;

const BLOCKING: &str = "VUID-vkAcquireNextImageKHR-surface-07783";
const RETIRED: &str = "VUID-vkAcquireNextImageKHR-swapchain-01285";

fn validate_acquire(fx: &Fixture, swapchain: vk::SwapchainKHR, semaphore: vk::Semaphore, fence: vk::Fence) -> bool {
    fx.layer
        .pre_call_validate_acquire_next_image_khr(fx.device, swapchain, u64::MAX, semaphore, fence)
}

#[test]
fn test_acquire_with_fresh_sync_objects_passes() {
    let fx = fixture();
    let swapchain = fx.default_swapchain();
    let semaphore = fx.semaphore(vk::SemaphoreType::BINARY);
    let fence = fx.fence(vk::FenceCreateFlags::empty());

    assert!(!validate_acquire(&fx, swapchain, semaphore, fence));
    assert!(fx.sink.is_empty(), "unexpected diagnostics: {:?}", fx.sink.vuids());
}

#[test]
fn test_semaphore_and_fence_both_null() {
    let fx = fixture();
    let swapchain = fx.default_swapchain();

    assert!(validate_acquire(&fx, swapchain, vk::Semaphore::null(), vk::Fence::null()));
    assert_eq!(fx.sink.vuids(), ["VUID-vkAcquireNextImageKHR-semaphore-01780"]);
}

#[test]
fn test_timeline_semaphore_is_rejected() {
    let fx = fixture();
    let swapchain = fx.default_swapchain();
    let semaphore = fx.semaphore(vk::SemaphoreType::TIMELINE);

    assert!(validate_acquire(&fx, swapchain, semaphore, vk::Fence::null()));
    assert_eq!(fx.sink.vuids(), ["VUID-vkAcquireNextImageKHR-semaphore-03265"]);
}

#[test]
fn test_semaphore_with_pending_signal_is_rejected() {
    let fx = fixture();
    let swapchain = fx.default_swapchain();
    let semaphore = fx.semaphore(vk::SemaphoreType::BINARY);

    fx.layer.post_call_record_acquire_next_image_khr(
        fx.device,
        swapchain,
        u64::MAX,
        semaphore,
        vk::Fence::null(),
        0,
        vk::Result::SUCCESS,
    );
    assert!(validate_acquire(&fx, swapchain, semaphore, vk::Fence::null()));
    assert_eq!(fx.sink.vuids(), ["VUID-vkAcquireNextImageKHR-semaphore-01286"]);
}

#[test]
fn test_imported_semaphore_is_not_tracked() {
    let fx = fixture();
    let swapchain = fx.default_swapchain();
    let semaphore = fx.semaphore(vk::SemaphoreType::BINARY);
    fx.layer
        .post_call_record_import_semaphore(fx.device, semaphore, false, vk::Result::SUCCESS);
    fx.acquire(swapchain, 0);
    fx.layer.post_call_record_acquire_next_image_khr(
        fx.device,
        swapchain,
        0,
        semaphore,
        vk::Fence::null(),
        1,
        vk::Result::SUCCESS,
    );

    fx.sink.clear();
    assert!(!fx.layer.pre_call_validate_acquire_next_image_khr(
        fx.device,
        swapchain,
        0,
        semaphore,
        vk::Fence::null()
    ));
}

#[test]
fn test_fence_must_be_unsignaled_and_idle() {
    let fx = fixture();
    let swapchain = fx.default_swapchain();

    let signaled = fx.fence(vk::FenceCreateFlags::SIGNALED);
    assert!(validate_acquire(&fx, swapchain, vk::Semaphore::null(), signaled));
    assert_eq!(fx.sink.vuids(), ["VUID-vkAcquireNextImageKHR-fence-01287"]);

    fx.sink.clear();
    fx.layer
        .post_call_record_reset_fences(fx.device, &[signaled], vk::Result::SUCCESS);
    assert!(!validate_acquire(&fx, swapchain, vk::Semaphore::null(), signaled));

    fx.layer.post_call_record_acquire_next_image_khr(
        fx.device,
        swapchain,
        u64::MAX,
        vk::Semaphore::null(),
        signaled,
        0,
        vk::Result::SUCCESS,
    );
    assert!(validate_acquire(&fx, swapchain, vk::Semaphore::null(), signaled));
    assert_eq!(fx.sink.vuids(), ["VUID-vkAcquireNextImageKHR-fence-01287"]);
}

#[test]
fn test_infinite_timeout_respects_image_slack() {
    // N = 3 images, M = 2: one image may be held while blocking.
    let fx = fixture();
    let swapchain = fx.default_swapchain();
    let fence = fx.fence(vk::FenceCreateFlags::empty());

    fx.acquire(swapchain, 0);
    assert!(!validate_acquire(&fx, swapchain, vk::Semaphore::null(), fence));
    assert!(!fx.sink.contains(BLOCKING));

    fx.acquire(swapchain, 1);
    assert!(validate_acquire(&fx, swapchain, vk::Semaphore::null(), fence));
    assert_eq!(fx.sink.vuids(), [BLOCKING]);

    // A finite timeout may legitimately fail instead of blocking.
    fx.sink.clear();
    assert!(!fx
        .layer
        .pre_call_validate_acquire_next_image_khr(fx.device, swapchain, 1_000_000, vk::Semaphore::null(), fence));
}

#[test]
fn test_slack_uses_current_min_image_count() {
    let fx = fixture();
    let base = *fx.driver.capabilities.lock();
    fx.layer.post_call_record_get_physical_device_surface_capabilities_khr(
        fx.physical_device,
        fx.surface,
        &vk::SurfaceCapabilitiesKHR {
            min_image_count: 1,
            ..base
        },
        vk::Result::SUCCESS,
    );
    let swapchain = fx.default_swapchain();
    let fence = fx.fence(vk::FenceCreateFlags::empty());

    // The stale answer would allow two held images; the surface now says one.
    fx.acquire(swapchain, 0);
    fx.acquire(swapchain, 1);
    assert!(validate_acquire(&fx, swapchain, vk::Semaphore::null(), fence));
    assert_eq!(fx.sink.vuids(), [BLOCKING]);
}

#[test]
fn test_slack_uses_largest_min_image_count_of_switchable_modes() {
    let fx = fixture();
    let base = *fx.driver.capabilities.lock();
    fx.driver.set_mode_capabilities(
        vk::PresentModeKHR::MAILBOX,
        SurfaceCapabilities::from(vk::SurfaceCapabilitiesKHR {
            min_image_count: 3,
            ..base
        }),
    );
    let mut info = fx.swapchain_info();
    info.next
        .push(SwapchainCreateNext::PresentModes(SwapchainPresentModesCreateInfo {
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
        }));
    let swapchain = fx.create_swapchain(&info);
    let fence = fx.fence(vk::FenceCreateFlags::empty());

    fx.acquire(swapchain, 0);
    assert!(validate_acquire(&fx, swapchain, vk::Semaphore::null(), fence));
    assert_eq!(fx.sink.vuids(), [BLOCKING]);
}

#[test]
fn test_fewer_images_than_min_count_skips_slack_check() {
    let fx = fixture();
    *fx.driver.swapchain_image_count.lock() = 1;
    let swapchain = fx.default_swapchain();
    let fence = fx.fence(vk::FenceCreateFlags::empty());

    fx.acquire(swapchain, 0);
    assert!(!validate_acquire(&fx, swapchain, vk::Semaphore::null(), fence));
}

#[test]
fn test_retirement_is_permanent() {
    let fx = fixture();
    let old = fx.default_swapchain();
    let fence = fx.fence(vk::FenceCreateFlags::empty());
    fx.create_swapchain(&SwapchainCreateInfo {
        old_swapchain: old,
        ..fx.swapchain_info()
    });

    for _ in 0..5 {
        fx.sink.clear();
        assert!(validate_acquire(&fx, old, vk::Semaphore::null(), fence));
        assert_eq!(fx.sink.vuids(), [RETIRED]);

        fx.sink.clear();
        fx.layer
            .pre_call_validate_wait_for_present_khr(fx.device, old, 1, u64::MAX);
        assert!(fx.sink.contains("VUID-vkWaitForPresentKHR-swapchain-04997"));
    }
}

#[test]
fn test_failed_creation_still_retires_old_swapchain() {
    let fx = fixture();
    let old = fx.default_swapchain();
    let fence = fx.fence(vk::FenceCreateFlags::empty());
    fx.layer.post_call_record_create_swapchain_khr(
        fx.device,
        &SwapchainCreateInfo {
            old_swapchain: old,
            ..fx.swapchain_info()
        },
        vk::SwapchainKHR::null(),
        vk::Result::ERROR_NATIVE_WINDOW_IN_USE_KHR,
    );

    assert!(validate_acquire(&fx, old, vk::Semaphore::null(), fence));
    assert_eq!(fx.sink.vuids(), [RETIRED]);
}

#[test]
fn test_acquire2_uses_its_own_vuids() {
    let fx = fixture();
    let old = fx.default_swapchain();
    fx.create_swapchain(&SwapchainCreateInfo {
        old_swapchain: old,
        ..fx.swapchain_info()
    });

    let info = AcquireNextImageInfo {
        swapchain: old,
        timeout: 0,
        semaphore: vk::Semaphore::null(),
        fence: vk::Fence::null(),
        device_mask: 1,
    };
    assert!(fx.layer.pre_call_validate_acquire_next_image2_khr(fx.device, &info));
    assert_eq!(
        fx.sink.vuids(),
        [
            "VUID-VkAcquireNextImageInfoKHR-semaphore-01782",
            "VUID-VkAcquireNextImageInfoKHR-swapchain-01675",
        ]
    );
}

#[test]
fn test_device_mask_rules() {
    let fx = fixture();
    let swapchain = fx.default_swapchain();
    let fence = fx.fence(vk::FenceCreateFlags::empty());
    let info = AcquireNextImageInfo {
        swapchain,
        timeout: 0,
        semaphore: vk::Semaphore::null(),
        fence,
        device_mask: 0b10,
    };

    assert!(fx.layer.pre_call_validate_acquire_next_image2_khr(fx.device, &info));
    assert_eq!(fx.sink.vuids(), ["VUID-VkAcquireNextImageInfoKHR-deviceMask-01290"]);

    fx.sink.clear();
    let zero = AcquireNextImageInfo {
        device_mask: 0,
        ..info
    };
    assert!(fx.layer.pre_call_validate_acquire_next_image2_khr(fx.device, &zero));
    assert_eq!(fx.sink.vuids(), ["VUID-VkAcquireNextImageInfoKHR-deviceMask-01291"]);
}

#[test]
fn test_device_group_mask() {
    let fx = Fixture::new(FixtureConfig {
        device: DeviceCreateInfo {
            queue_family_indices: vec![0],
            physical_device_count: 2,
            extensions: DeviceExtensions::default(),
            features: Default::default(),
        },
        ..Default::default()
    });
    let swapchain = fx.default_swapchain();
    let info = AcquireNextImageInfo {
        swapchain,
        timeout: 0,
        semaphore: vk::Semaphore::null(),
        fence: fx.fence(vk::FenceCreateFlags::empty()),
        device_mask: 0b11,
    };

    assert!(!fx.layer.pre_call_validate_acquire_next_image2_khr(fx.device, &info));
    assert!(fx.sink.is_empty());
}

#[test]
fn test_destroyed_swapchain_is_forgotten() {
    let fx = fixture();
    let swapchain = fx.default_swapchain();
    let fence = fx.fence(vk::FenceCreateFlags::empty());
    fx.layer.pre_call_record_destroy_swapchain_khr(fx.device, swapchain);

    assert!(!validate_acquire(&fx, swapchain, vk::Semaphore::null(), fence));
    assert!(fx.sink.is_empty());
}
