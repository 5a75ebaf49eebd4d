use std::sync::Arc;

use ash::vk;

use crate::chain::PresentNext;
use crate::diagnostics::ObjectRef;
use crate::info::{PresentInfo, SwapchainPresent};
use crate::layer::ValidationLayer;
use crate::state::{DeviceState, FenceState, QueueState, SemaphoreState, SurfaceState, SwapchainState};

const INVALID_IMAGE: &str = "UNASSIGNED-CoreValidation-DrawState-SwapchainInvalidImage";

/// Transforms that swap the width and height seen by the presentation engine.
const ROTATED_TRANSFORMS: vk::SurfaceTransformFlagsKHR = vk::SurfaceTransformFlagsKHR::from_raw(
    vk::SurfaceTransformFlagsKHR::ROTATE_90.as_raw()
        | vk::SurfaceTransformFlagsKHR::ROTATE_270.as_raw()
        | vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR_ROTATE_90.as_raw()
        | vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR_ROTATE_270.as_raw(),
);

impl ValidationLayer {
    /// Each swapchain of the batch and each chained structure is checked
    /// independently; nothing here short-circuits.
    pub fn pre_call_validate_queue_present_khr(&self, queue: vk::Queue, present_info: &PresentInfo) -> bool {
        let mut skip = false;
        let queue_state = self.store().get::<QueueState>(queue);
        let device = queue_state
            .as_ref()
            .and_then(|state| self.store().get::<DeviceState>(state.device));

        for (i, &semaphore) in present_info.wait_semaphores.iter().enumerate() {
            if let Some(semaphore_state) = self.store().get::<SemaphoreState>(semaphore) {
                skip |= self.validate_present_wait_semaphore(queue, i, &semaphore_state);
            }
        }

        let swapchains: Vec<Option<Arc<SwapchainState>>> = present_info
            .swapchains
            .iter()
            .map(|present| self.store().get::<SwapchainState>(present.swapchain))
            .collect();

        for (i, (present, swapchain)) in present_info.swapchains.iter().zip(&swapchains).enumerate() {
            if let Some(swapchain) = swapchain {
                skip |= self.validate_present_swapchain(
                    queue,
                    queue_state.as_deref(),
                    device.as_deref(),
                    present_info,
                    i,
                    present,
                    swapchain,
                );
            }
        }

        let swapchain_count = present_info.swapchains.len();
        let queue_objects = [ObjectRef::new(queue)];

        if let Some(regions) = present_info.next.find(PresentNext::regions) {
            if regions.regions.len() != swapchain_count {
                skip |= self.log_error(
                    &queue_objects,
                    "VUID-VkPresentRegionsKHR-swapchainCount-01260",
                    format!(
                        "vkQueuePresentKHR(): VkPresentRegionsKHR::swapchainCount is {} but \
                         pPresentInfo->swapchainCount is {swapchain_count}.",
                        regions.regions.len()
                    ),
                );
            }
            for (i, (region, swapchain)) in regions.regions.iter().zip(&swapchains).enumerate() {
                let (Some(rectangles), Some(swapchain)) = (&region.rectangles, swapchain) else {
                    continue;
                };
                let create_info = &swapchain.create_info;
                let mut extent = create_info.image_extent;
                if create_info.pre_transform.intersects(ROTATED_TRANSFORMS) {
                    std::mem::swap(&mut extent.width, &mut extent.height);
                }
                let objects = [ObjectRef::new(swapchain.handle)];
                for (j, rect) in rectangles.iter().enumerate() {
                    let right = i64::from(rect.offset.x) + i64::from(rect.extent.width);
                    let bottom = i64::from(rect.offset.y) + i64::from(rect.extent.height);
                    if right > i64::from(extent.width) {
                        skip |= self.log_error(
                            &objects,
                            "VUID-VkRectLayerKHR-offset-04864",
                            format!(
                                "vkQueuePresentKHR(): pRegions[{i}].pRectangles[{j}] spans x to {right}, past \
                                 the image width {} as seen after preTransform.",
                                extent.width
                            ),
                        );
                    }
                    if bottom > i64::from(extent.height) {
                        skip |= self.log_error(
                            &objects,
                            "VUID-VkRectLayerKHR-offset-04864",
                            format!(
                                "vkQueuePresentKHR(): pRegions[{i}].pRectangles[{j}] spans y to {bottom}, past \
                                 the image height {} as seen after preTransform.",
                                extent.height
                            ),
                        );
                    }
                    if rect.layer > create_info.image_array_layers {
                        skip |= self.log_error(
                            &objects,
                            "VUID-VkRectLayerKHR-layer-01262",
                            format!(
                                "vkQueuePresentKHR(): pRegions[{i}].pRectangles[{j}].layer {} exceeds \
                                 imageArrayLayers {}.",
                                rect.layer, create_info.image_array_layers
                            ),
                        );
                    }
                }
            }
        }

        if let Some(times) = present_info.next.find(PresentNext::times) {
            if times.times.len() != swapchain_count {
                skip |= self.log_error(
                    &queue_objects,
                    "VUID-VkPresentTimesInfoGOOGLE-swapchainCount-01247",
                    format!(
                        "vkQueuePresentKHR(): VkPresentTimesInfoGOOGLE::swapchainCount is {} but \
                         pPresentInfo->swapchainCount is {swapchain_count}.",
                        times.times.len()
                    ),
                );
            }
        }

        if let Some(ids) = present_info.next.find(PresentNext::ids) {
            let present_id_enabled = device.as_ref().is_some_and(|d| d.features.present_id);
            if !present_id_enabled {
                for (i, &present_id) in ids.present_ids.iter().enumerate() {
                    if present_id != 0 {
                        skip |= self.log_error(
                            &queue_objects,
                            "VUID-VkPresentInfoKHR-pNext-06235",
                            format!(
                                "vkQueuePresentKHR(): VkPresentIdKHR::pPresentIds[{i}] is {present_id} but the \
                                 presentId feature is not enabled."
                            ),
                        );
                    }
                }
            }
            if ids.present_ids.len() != swapchain_count {
                skip |= self.log_error(
                    &queue_objects,
                    "VUID-VkPresentIdKHR-swapchainCount-04998",
                    format!(
                        "vkQueuePresentKHR(): VkPresentIdKHR::swapchainCount is {} but \
                         pPresentInfo->swapchainCount is {swapchain_count}.",
                        ids.present_ids.len()
                    ),
                );
            }
            for (i, (&present_id, swapchain)) in ids.present_ids.iter().zip(&swapchains).enumerate() {
                let Some(swapchain) = swapchain else {
                    continue;
                };
                let max_present_id = swapchain.max_present_id();
                if present_id != 0 && present_id <= max_present_id {
                    skip |= self.log_error(
                        &[ObjectRef::new(swapchain.handle)],
                        "VUID-VkPresentIdKHR-presentIds-04999",
                        format!(
                            "vkQueuePresentKHR(): VkPresentIdKHR::pPresentIds[{i}] is {present_id}, which is \
                             not greater than the largest presentId {max_present_id} already used with this \
                             swapchain."
                        ),
                    );
                }
            }
        }

        let maintenance1 = device.as_ref().is_some_and(|d| d.extensions.ext_swapchain_maintenance1);

        if let Some(fences) = present_info.next.find(PresentNext::fences).filter(|_| maintenance1) {
            if fences.fences.len() != swapchain_count {
                skip |= self.log_error(
                    &queue_objects,
                    "VUID-VkSwapchainPresentFenceInfoEXT-swapchainCount-07757",
                    format!(
                        "vkQueuePresentKHR(): VkSwapchainPresentFenceInfoEXT::swapchainCount is {} but \
                         pPresentInfo->swapchainCount is {swapchain_count}.",
                        fences.fences.len()
                    ),
                );
            }
            for &fence in &fences.fences {
                if let Some(fence_state) = self.store().get::<FenceState>(fence) {
                    skip |= self.validate_fence_for_submit(
                        &fence_state,
                        "VUID-VkSwapchainPresentFenceInfoEXT-pFences-07759",
                        "VUID-VkSwapchainPresentFenceInfoEXT-pFences-07759",
                        "vkQueuePresentKHR()",
                    );
                }
            }
        }

        if let Some(modes) = present_info.next.find(PresentNext::modes).filter(|_| maintenance1) {
            if modes.present_modes.len() != swapchain_count {
                skip |= self.log_error(
                    &queue_objects,
                    "VUID-VkSwapchainPresentModeInfoEXT-swapchainCount-07760",
                    format!(
                        "vkQueuePresentKHR(): VkSwapchainPresentModeInfoEXT::swapchainCount is {} but \
                         pPresentInfo->swapchainCount is {swapchain_count}.",
                        modes.present_modes.len()
                    ),
                );
            }
            for (i, (&mode, swapchain)) in modes.present_modes.iter().zip(&swapchains).enumerate() {
                let Some(swapchain) = swapchain else {
                    continue;
                };
                if !swapchain.present_modes.contains(&mode) {
                    skip |= self.log_error(
                        &[ObjectRef::new(swapchain.handle)],
                        "VUID-VkSwapchainPresentModeInfoEXT-pPresentModes-07761",
                        format!(
                            "vkQueuePresentKHR(): VkSwapchainPresentModeInfoEXT::pPresentModes[{i}] ({:?}) is \
                             not one of the present modes the swapchain was created with ({:?}).",
                            mode, swapchain.present_modes
                        ),
                    );
                }
            }
        }

        skip
    }

    #[allow(clippy::too_many_arguments)]
    fn validate_present_swapchain(
        &self,
        queue: vk::Queue,
        queue_state: Option<&QueueState>,
        device: Option<&DeviceState>,
        present_info: &PresentInfo,
        i: usize,
        present: &SwapchainPresent,
        swapchain: &SwapchainState,
    ) -> bool {
        let mut skip = false;
        let objects = [ObjectRef::new(present.swapchain)];
        let shared_extension = device.is_some_and(|d| d.extensions.khr_shared_presentable_image);

        skip |= self.validate_present_image(queue, i, present, swapchain, shared_extension);

        if let Some(display) = present_info.next.find(PresentNext::display) {
            let src = display.src_rect;
            let image_extent = swapchain.create_info.image_extent;
            let right = i64::from(src.offset.x) + i64::from(src.extent.width);
            let bottom = i64::from(src.offset.y) + i64::from(src.extent.height);
            if src.offset.x < 0
                || src.offset.y < 0
                || right > i64::from(image_extent.width)
                || bottom > i64::from(image_extent.height)
            {
                skip |= self.log_error(
                    &objects,
                    "VUID-VkDisplayPresentInfoKHR-srcRect-01257",
                    format!(
                        "vkQueuePresentKHR(): VkDisplayPresentInfoKHR::srcRect (offset ({}, {}), extent ({}, {})) \
                         is not contained in the swapchain image extent ({}, {}).",
                        src.offset.x,
                        src.offset.y,
                        src.extent.width,
                        src.extent.height,
                        image_extent.width,
                        image_extent.height
                    ),
                );
            }
        }

        // Android guarantees every queue family can present.
        if let (Some(queue_state), Some(device)) = (queue_state, device) {
            if !device.instance_extensions().khr_android_surface {
                if let Some(surface) = self.store().get::<SurfaceState>(swapchain.surface()) {
                    let supported = self.queue_family_supports_surface(
                        &device.physical_device,
                        queue_state.queue_family_index,
                        &surface,
                    );
                    if supported == Some(false) {
                        skip |= self.log_error(
                            &[ObjectRef::new(queue), ObjectRef::new(present.swapchain)],
                            "VUID-vkQueuePresentKHR-pSwapchains-01292",
                            format!(
                                "vkQueuePresentKHR(): pSwapchains[{i}] cannot be presented from queue family \
                                 {} of this queue.",
                                queue_state.queue_family_index
                            ),
                        );
                    }
                }
            }
        }

        skip
    }

    /// Index range, acquisition and layout of the presented image.
    fn validate_present_image(
        &self,
        queue: vk::Queue,
        i: usize,
        present: &SwapchainPresent,
        swapchain: &SwapchainState,
        shared_extension: bool,
    ) -> bool {
        let mut skip = false;
        let objects = [ObjectRef::new(present.swapchain)];
        let index = present.image_index;

        let Some(slot) = swapchain.image(index) else {
            return self.log_error(
                &objects,
                INVALID_IMAGE,
                format!(
                    "vkQueuePresentKHR(): pImageIndices[{i}] = {index} is out of range for swapchain {:?} \
                     with {} images.",
                    present.swapchain,
                    swapchain.image_count()
                ),
            );
        };

        if !slot.acquired {
            let vuid = if shared_extension {
                "VUID-VkPresentInfoKHR-pImageIndices-01430"
            } else {
                "VUID-VkPresentInfoKHR-pImageIndices-01296"
            };
            return self.log_error(
                &objects,
                vuid,
                format!(
                    "vkQueuePresentKHR(): pImageIndices[{i}] = {index} was not acquired from swapchain {:?}.",
                    present.swapchain
                ),
            );
        }

        if let Some(image) = &slot.image {
            for layout in image.find_layouts() {
                let shared_layout_ok =
                    shared_extension && layout == vk::ImageLayout::SHARED_PRESENT_KHR;
                if layout != vk::ImageLayout::PRESENT_SRC_KHR && !shared_layout_ok {
                    let vuid = if shared_extension {
                        "VUID-VkPresentInfoKHR-pImageIndices-01430"
                    } else {
                        "VUID-VkPresentInfoKHR-pImageIndices-01296"
                    };
                    skip |= self.log_error(
                        &[ObjectRef::new(queue), ObjectRef::new(image.handle)],
                        vuid,
                        format!(
                            "vkQueuePresentKHR(): pImageIndices[{i}] = {index} is in layout {:?}; images must \
                             be in VK_IMAGE_LAYOUT_PRESENT_SRC_KHR{} when presented.",
                            layout,
                            if shared_extension {
                                " or VK_IMAGE_LAYOUT_SHARED_PRESENT_KHR"
                            } else {
                                ""
                            }
                        ),
                    );
                }
            }
        }

        skip
    }
}
