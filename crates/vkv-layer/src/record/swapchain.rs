use std::sync::Arc;

use ash::vk;
use tracing::{debug, warn};

use crate::chain::PresentNext;
use crate::info::{AcquireNextImageInfo, PresentInfo, ReleaseSwapchainImagesInfo, SwapchainCreateInfo};
use crate::layer::ValidationLayer;
use crate::record::succeeded;
use crate::state::{FenceState, ImageState, SemaphoreState, SurfaceState, SwapchainState};

impl ValidationLayer {
    pub fn post_call_record_create_swapchain_khr(
        &self,
        device: vk::Device,
        create_info: &SwapchainCreateInfo,
        swapchain: vk::SwapchainKHR,
        result: vk::Result,
    ) {
        self.record_create_swapchain(device, create_info, swapchain, result);
    }

    /// Every entry succeeds or fails together.
    pub fn post_call_record_create_shared_swapchains_khr(
        &self,
        device: vk::Device,
        create_infos: &[SwapchainCreateInfo],
        swapchains: &[vk::SwapchainKHR],
        result: vk::Result,
    ) {
        for (index, create_info) in create_infos.iter().enumerate() {
            let swapchain = swapchains
                .get(index)
                .copied()
                .unwrap_or_else(vk::SwapchainKHR::null);
            self.record_create_swapchain(device, create_info, swapchain, result);
        }
    }

    fn record_create_swapchain(
        &self,
        device: vk::Device,
        create_info: &SwapchainCreateInfo,
        swapchain: vk::SwapchainKHR,
        result: vk::Result,
    ) {
        let surface = self.store().get::<SurfaceState>(create_info.surface);

        // The old swapchain is retired whether or not creation succeeded.
        if let Some(old) = self.store().get::<SwapchainState>(create_info.old_swapchain) {
            old.retire();
        }

        if result != vk::Result::SUCCESS {
            if let Some(surface) = &surface {
                surface.clear_swapchain();
            }
            return;
        }

        let image_count = self
            .driver()
            .swapchain_image_count(device, swapchain)
            .unwrap_or_else(|err| {
                warn!(swapchain = ?swapchain, "swapchain image count query failed: {:?}", err);
                0
            });
        let state = Arc::new(SwapchainState::new(swapchain, device, create_info.clone(), image_count));
        if let Some(surface) = &surface {
            surface.set_swapchain(&state);
        }
        self.store().add(state);
        debug!(
            swapchain = ?swapchain,
            surface = ?create_info.surface,
            image_count,
            present_mode = ?create_info.present_mode,
            "swapchain created"
        );
    }

    /// Evict the swapchain and its presentable images.
    pub fn pre_call_record_destroy_swapchain_khr(&self, _device: vk::Device, swapchain: vk::SwapchainKHR) {
        let Some(state) = self.store().remove::<SwapchainState>(swapchain) else {
            return;
        };
        state.retire();
        for image in state.take_images() {
            self.store().remove::<ImageState>(image.handle);
        }
        if let Some(surface) = self.store().get::<SurfaceState>(state.surface()) {
            surface.detach_swapchain(swapchain);
        }
        debug!(swapchain = ?swapchain, "swapchain destroyed");
    }

    /// `images` is `None` for the count-only form of the call.
    pub fn post_call_record_get_swapchain_images_khr(
        &self,
        _device: vk::Device,
        swapchain: vk::SwapchainKHR,
        count: u32,
        images: Option<&[vk::Image]>,
        result: vk::Result,
    ) {
        if !succeeded(result) {
            return;
        }
        let Some(state) = self.store().get::<SwapchainState>(swapchain) else {
            return;
        };
        let Some(images) = images else {
            state.set_reported_image_count(count);
            return;
        };
        for (index, &image) in images.iter().enumerate().take(count as usize) {
            let index = index as u32;
            if state
                .image(index)
                .and_then(|slot| slot.image)
                .is_some_and(|bound| bound.handle == image)
            {
                continue;
            }
            let image_state = Arc::new(ImageState::for_swapchain(
                image,
                state.image_create_info.clone(),
                swapchain,
                index,
            ));
            self.store().add(Arc::clone(&image_state));
            state.bind_image(index, image_state);
        }
    }

    pub fn post_call_record_acquire_next_image_khr(
        &self,
        _device: vk::Device,
        swapchain: vk::SwapchainKHR,
        _timeout: u64,
        semaphore: vk::Semaphore,
        fence: vk::Fence,
        image_index: u32,
        result: vk::Result,
    ) {
        self.record_acquire_next_image(swapchain, semaphore, fence, image_index, result);
    }

    pub fn post_call_record_acquire_next_image2_khr(
        &self,
        _device: vk::Device,
        acquire_info: &AcquireNextImageInfo,
        image_index: u32,
        result: vk::Result,
    ) {
        self.record_acquire_next_image(
            acquire_info.swapchain,
            acquire_info.semaphore,
            acquire_info.fence,
            image_index,
            result,
        );
    }

    fn record_acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        semaphore: vk::Semaphore,
        fence: vk::Fence,
        image_index: u32,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS && result != vk::Result::SUBOPTIMAL_KHR {
            return;
        }
        if let Some(fence) = self.store().get::<FenceState>(fence) {
            fence.submit();
        }
        if let Some(semaphore) = self.store().get::<SemaphoreState>(semaphore) {
            semaphore.signal();
        }
        let Some(state) = self.store().get::<SwapchainState>(swapchain) else {
            return;
        };
        if !state.acquire_image(image_index) {
            warn!(swapchain = ?swapchain, image_index, "acquired image was already tracked as acquired");
        }
    }

    /// `results` is `pPresentInfo->pResults` when the application passed it.
    pub fn post_call_record_queue_present_khr(
        &self,
        _queue: vk::Queue,
        present_info: &PresentInfo,
        results: Option<&[vk::Result]>,
        result: vk::Result,
    ) {
        if result == vk::Result::ERROR_OUT_OF_HOST_MEMORY
            || result == vk::Result::ERROR_OUT_OF_DEVICE_MEMORY
            || result == vk::Result::ERROR_DEVICE_LOST
        {
            return;
        }

        for &semaphore in &present_info.wait_semaphores {
            if let Some(semaphore) = self.store().get::<SemaphoreState>(semaphore) {
                semaphore.wait();
            }
        }

        let present_ids = present_info.next.find(PresentNext::ids);
        let present_fences = present_info.next.find(PresentNext::fences);

        for (index, entry) in present_info.swapchains.iter().enumerate() {
            let local = results
                .and_then(|results| results.get(index).copied())
                .unwrap_or(result);
            if local != vk::Result::SUCCESS && local != vk::Result::SUBOPTIMAL_KHR {
                continue;
            }
            let Some(state) = self.store().get::<SwapchainState>(entry.swapchain) else {
                continue;
            };
            // Shared presentable images stay with the application.
            if !state.is_shared_presentable() {
                state.release_image(entry.image_index);
            }
            if let Some(present_id) = present_ids.and_then(|ids| ids.present_ids.get(index).copied()) {
                if present_id != 0 {
                    state.update_present_id(present_id);
                }
            }
            if let Some(fence) = present_fences
                .and_then(|fences| fences.fences.get(index).copied())
                .and_then(|fence| self.store().get::<FenceState>(fence))
            {
                fence.submit();
            }
        }
    }

    pub fn post_call_record_release_swapchain_images_ext(
        &self,
        _device: vk::Device,
        release_info: &ReleaseSwapchainImagesInfo,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        let Some(state) = self.store().get::<SwapchainState>(release_info.swapchain) else {
            return;
        };
        for &index in &release_info.image_indices {
            state.release_image(index);
        }
        debug!(
            swapchain = ?release_info.swapchain,
            count = release_info.image_indices.len(),
            "swapchain images released"
        );
    }
}
