use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::info::{SemaphoreCreateInfo, SubmitInfo};
use crate::layer::ValidationLayer;
use crate::state::{FenceState, ImageState, QueueState, SemaphoreState, Submission};

impl ValidationLayer {
    // ── Semaphores ──────────────────────────────────────────

    pub fn post_call_record_create_semaphore(
        &self,
        _device: vk::Device,
        create_info: &SemaphoreCreateInfo,
        semaphore: vk::Semaphore,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        self.store()
            .add(Arc::new(SemaphoreState::new(semaphore, create_info.semaphore_type)));
        debug!(
            semaphore = ?semaphore,
            semaphore_type = ?create_info.semaphore_type,
            "semaphore created"
        );
    }

    /// Any `vkImportSemaphore*` entry point.
    pub fn post_call_record_import_semaphore(
        &self,
        _device: vk::Device,
        semaphore: vk::Semaphore,
        temporary: bool,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        if let Some(state) = self.store().get::<SemaphoreState>(semaphore) {
            state.import(temporary);
        }
    }

    pub fn pre_call_record_destroy_semaphore(&self, _device: vk::Device, semaphore: vk::Semaphore) {
        if self.store().remove::<SemaphoreState>(semaphore).is_some() {
            debug!(semaphore = ?semaphore, "semaphore destroyed");
        }
    }

    // ── Fences ──────────────────────────────────────────────

    pub fn post_call_record_create_fence(
        &self,
        _device: vk::Device,
        flags: vk::FenceCreateFlags,
        fence: vk::Fence,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        self.store().add(Arc::new(FenceState::new(fence, flags)));
        debug!(fence = ?fence, flags = ?flags, "fence created");
    }

    /// Any `vkImportFence*` entry point.
    pub fn post_call_record_import_fence(
        &self,
        _device: vk::Device,
        fence: vk::Fence,
        temporary: bool,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        if let Some(state) = self.store().get::<FenceState>(fence) {
            state.import(temporary);
        }
    }

    pub fn post_call_record_reset_fences(&self, _device: vk::Device, fences: &[vk::Fence], result: vk::Result) {
        if result != vk::Result::SUCCESS {
            return;
        }
        for &fence in fences {
            if let Some(state) = self.store().get::<FenceState>(fence) {
                state.reset();
            }
        }
    }

    /// With `wait_all` false the layer cannot tell which fence signaled, so
    /// only a single-fence wait retires anything.
    pub fn post_call_record_wait_for_fences(
        &self,
        device: vk::Device,
        fences: &[vk::Fence],
        wait_all: bool,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS || (!wait_all && fences.len() != 1) {
            return;
        }
        for &fence in fences {
            self.retire_fence(device, fence);
        }
    }

    pub fn post_call_record_get_fence_status(&self, device: vk::Device, fence: vk::Fence, result: vk::Result) {
        if result == vk::Result::SUCCESS {
            self.retire_fence(device, fence);
        }
    }

    pub fn pre_call_record_destroy_fence(&self, _device: vk::Device, fence: vk::Fence) {
        if self.store().remove::<FenceState>(fence).is_some() {
            debug!(fence = ?fence, "fence destroyed");
        }
    }

    /// The host observed `fence` signaled: it and everything submitted before
    /// it on the same queue has completed.
    fn retire_fence(&self, device: vk::Device, fence: vk::Fence) {
        let Some(state) = self.store().get::<FenceState>(fence) else {
            return;
        };
        for queue in self.store().snapshot::<QueueState>() {
            if queue.device == device && queue.retire_through(fence) {
                break;
            }
        }
        state.retire();
    }

    // ── Queue submission ────────────────────────────────────

    pub fn post_call_record_queue_submit(
        &self,
        queue: vk::Queue,
        submits: &[SubmitInfo],
        fence: vk::Fence,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        let Some(queue_state) = self.store().get::<QueueState>(queue) else {
            return;
        };

        let mut images = Vec::new();
        for submit in submits {
            for &semaphore in &submit.wait_semaphores {
                if let Some(state) = self.store().get::<SemaphoreState>(semaphore) {
                    state.wait();
                }
            }
            for &semaphore in &submit.signal_semaphores {
                if let Some(state) = self.store().get::<SemaphoreState>(semaphore) {
                    state.signal();
                }
            }
            for transition in &submit.layout_transitions {
                if let Some(image) = self.store().get::<ImageState>(transition.image) {
                    image.set_layout(
                        transition.base_array_layer,
                        transition.layer_count,
                        transition.new_layout,
                    );
                }
            }
            images.extend(
                submit
                    .images
                    .iter()
                    .filter_map(|&image| self.store().get::<ImageState>(image)),
            );
        }

        let fence = self.store().get::<FenceState>(fence);
        if let Some(fence) = &fence {
            fence.submit();
        }
        debug!(
            queue = ?queue,
            submits = submits.len(),
            images = images.len(),
            "queue submission recorded"
        );
        queue_state.enqueue(Submission { fence, images });
    }

    pub fn post_call_record_queue_wait_idle(&self, queue: vk::Queue, result: vk::Result) {
        if result != vk::Result::SUCCESS {
            return;
        }
        if let Some(state) = self.store().get::<QueueState>(queue) {
            state.retire_all();
        }
    }

    pub fn post_call_record_device_wait_idle(&self, device: vk::Device, result: vk::Result) {
        if result != vk::Result::SUCCESS {
            return;
        }
        for queue in self.store().snapshot::<QueueState>() {
            if queue.device == device {
                queue.retire_all();
            }
        }
    }
}
