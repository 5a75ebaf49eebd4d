use ash::vk::{self, Handle};

use crate::diagnostics::ObjectRef;
use crate::info::AcquireNextImageInfo;
use crate::layer::ValidationLayer;
use crate::state::{DeviceState, FenceState, SemaphoreState, SurfaceState, SwapchainState, SyncScope};

/// Which acquire entry point is being validated. Only selects diagnostic
/// strings; the rules are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireVariant {
    /// `vkAcquireNextImageKHR`
    Khr,
    /// `vkAcquireNextImage2KHR`
    Khr2,
}

struct AcquireVuids {
    func_name: &'static str,
    null_sync: &'static str,
    semaphore_type: &'static str,
    semaphore_signaled: &'static str,
    fence: &'static str,
    retired: &'static str,
    blocking: &'static str,
}

const KHR_VUIDS: AcquireVuids = AcquireVuids {
    func_name: "vkAcquireNextImageKHR()",
    null_sync: "VUID-vkAcquireNextImageKHR-semaphore-01780",
    semaphore_type: "VUID-vkAcquireNextImageKHR-semaphore-03265",
    semaphore_signaled: "VUID-vkAcquireNextImageKHR-semaphore-01286",
    fence: "VUID-vkAcquireNextImageKHR-fence-01287",
    retired: "VUID-vkAcquireNextImageKHR-swapchain-01285",
    blocking: "VUID-vkAcquireNextImageKHR-surface-07783",
};

const KHR2_VUIDS: AcquireVuids = AcquireVuids {
    func_name: "vkAcquireNextImage2KHR()",
    null_sync: "VUID-VkAcquireNextImageInfoKHR-semaphore-01782",
    semaphore_type: "VUID-VkAcquireNextImageInfoKHR-semaphore-03266",
    semaphore_signaled: "VUID-VkAcquireNextImageInfoKHR-semaphore-01288",
    fence: "VUID-VkAcquireNextImageInfoKHR-fence-01289",
    retired: "VUID-VkAcquireNextImageInfoKHR-swapchain-01675",
    blocking: "VUID-vkAcquireNextImage2KHR-surface-07784",
};

impl AcquireVariant {
    fn vuids(self) -> &'static AcquireVuids {
        match self {
            AcquireVariant::Khr => &KHR_VUIDS,
            AcquireVariant::Khr2 => &KHR2_VUIDS,
        }
    }
}

impl ValidationLayer {
    pub fn pre_call_validate_acquire_next_image_khr(
        &self,
        device: vk::Device,
        swapchain: vk::SwapchainKHR,
        timeout: u64,
        semaphore: vk::Semaphore,
        fence: vk::Fence,
    ) -> bool {
        self.validate_acquire_next_image(device, AcquireVariant::Khr, swapchain, timeout, semaphore, fence)
    }

    pub fn pre_call_validate_acquire_next_image2_khr(
        &self,
        device: vk::Device,
        acquire_info: &AcquireNextImageInfo,
    ) -> bool {
        let mut skip = self.validate_acquire_next_image(
            device,
            AcquireVariant::Khr2,
            acquire_info.swapchain,
            acquire_info.timeout,
            acquire_info.semaphore,
            acquire_info.fence,
        );

        let physical_device_count = self
            .store()
            .get::<DeviceState>(device)
            .map_or(1, |state| state.physical_device_count);
        let objects = [ObjectRef::new(acquire_info.swapchain)];
        let valid_mask = if physical_device_count >= 32 {
            u32::MAX
        } else {
            (1u32 << physical_device_count) - 1
        };

        if acquire_info.device_mask & !valid_mask != 0 {
            skip |= self.log_error(
                &objects,
                "VUID-VkAcquireNextImageInfoKHR-deviceMask-01290",
                format!(
                    "vkAcquireNextImage2KHR(): deviceMask 0x{:x} names physical devices that do not exist \
                     (device has {}).",
                    acquire_info.device_mask, physical_device_count
                ),
            );
        }
        if acquire_info.device_mask == 0 {
            skip |= self.log_error(
                &objects,
                "VUID-VkAcquireNextImageInfoKHR-deviceMask-01291",
                "vkAcquireNextImage2KHR(): deviceMask must not be zero.",
            );
        }

        skip
    }

    /// Rules shared by both acquire entry points.
    pub(crate) fn validate_acquire_next_image(
        &self,
        device: vk::Device,
        variant: AcquireVariant,
        swapchain: vk::SwapchainKHR,
        timeout: u64,
        semaphore: vk::Semaphore,
        fence: vk::Fence,
    ) -> bool {
        let vuids = variant.vuids();
        let func_name = vuids.func_name;
        let mut skip = false;

        if semaphore.is_null() && fence.is_null() {
            skip |= self.log_error(
                &[ObjectRef::new(device)],
                vuids.null_sync,
                format!("{func_name}: semaphore and fence are both VK_NULL_HANDLE."),
            );
        }

        if let Some(semaphore_state) = self.store().get::<SemaphoreState>(semaphore) {
            let objects = [ObjectRef::new(semaphore)];
            if !semaphore_state.is_binary() {
                skip |= self.log_error(
                    &objects,
                    vuids.semaphore_type,
                    format!("{func_name}: semaphore {:?} is not a VK_SEMAPHORE_TYPE_BINARY semaphore.", semaphore),
                );
            } else if semaphore_state.scope() == SyncScope::Internal && !semaphore_state.can_be_signaled() {
                // Pending waits are not tracked precisely, so this may miss a
                // semaphore whose wait has not actually executed yet.
                skip |= self.log_error(
                    &objects,
                    vuids.semaphore_signaled,
                    format!(
                        "{func_name}: semaphore {:?} is already signaled or has a pending signal operation.",
                        semaphore
                    ),
                );
            }
        }

        if let Some(fence_state) = self.store().get::<FenceState>(fence) {
            skip |= self.validate_fence_for_submit(&fence_state, vuids.fence, vuids.fence, func_name);
        }

        let Some(swapchain_state) = self.store().get::<SwapchainState>(swapchain) else {
            return skip;
        };
        let objects = [ObjectRef::new(swapchain)];

        if swapchain_state.is_retired() {
            skip |= self.log_error(
                &objects,
                vuids.retired,
                format!(
                    "{func_name}: swapchain {:?} has been retired and can no longer acquire images.",
                    swapchain
                ),
            );
        }

        if timeout == u64::MAX {
            if let Some(min_image_count) = self.acquire_min_image_count(device, &swapchain_state) {
                let image_count = swapchain_state.image_count();
                let acquired = swapchain_state.acquired_images();
                if let Some(slack) = image_count.checked_sub(min_image_count) {
                    if acquired > slack {
                        skip |= self.log_error(
                            &objects,
                            vuids.blocking,
                            format!(
                                "{func_name}: application has already acquired {acquired} of {image_count} \
                                 images (minImageCount {min_image_count}) and is calling with an infinite \
                                 timeout, which may never return."
                            ),
                        );
                    }
                }
            }
        }

        skip
    }

    /// `minImageCount` that bounds how many images may be held at once. With
    /// switchable present modes this is the largest over all of them.
    fn acquire_min_image_count(&self, device: vk::Device, swapchain: &SwapchainState) -> Option<u32> {
        let device_state = self.store().get::<DeviceState>(device)?;
        let surface = self.store().get::<SurfaceState>(swapchain.surface())?;
        let physical_device = &device_state.physical_device;

        if swapchain.present_modes.is_empty() {
            return self
                .current_surface_capabilities(physical_device, &*surface)
                .map(|caps| caps.min_image_count);
        }

        swapchain
            .present_modes
            .iter()
            .filter_map(|&mode| self.present_mode_capabilities(physical_device, &*surface, mode))
            .map(|caps| caps.capabilities.min_image_count)
            .max()
    }
}
