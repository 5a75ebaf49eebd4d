use ash::vk;

use crate::diagnostics::ObjectRef;
use crate::info::ReleaseSwapchainImagesInfo;
use crate::layer::ValidationLayer;
use crate::state::{DeviceState, SwapchainState};

impl ValidationLayer {
    pub fn pre_call_validate_release_swapchain_images_ext(
        &self,
        device: vk::Device,
        release_info: &ReleaseSwapchainImagesInfo,
    ) -> bool {
        let mut skip = false;

        let maintenance1 = self
            .store()
            .get::<DeviceState>(device)
            .is_some_and(|state| state.features.swapchain_maintenance1);
        if !maintenance1 {
            skip |= self.log_error(
                &[ObjectRef::new(device)],
                "VUID-vkReleaseSwapchainImagesEXT-swapchainMaintenance1-07800",
                "vkReleaseSwapchainImagesEXT(): the swapchainMaintenance1 feature is not enabled.",
            );
        }

        let Some(swapchain) = self.store().get::<SwapchainState>(release_info.swapchain) else {
            return skip;
        };
        let objects = [ObjectRef::new(release_info.swapchain)];
        let image_count = swapchain.image_count();

        for (i, &index) in release_info.image_indices.iter().enumerate() {
            let acquired = swapchain.image(index).is_some_and(|slot| slot.acquired);
            if !acquired {
                skip |= self.log_error(
                    &objects,
                    "VUID-VkReleaseSwapchainImagesInfoEXT-pImageIndices-07785",
                    format!(
                        "vkReleaseSwapchainImagesEXT(): pReleaseInfo->pImageIndices[{i}] ({index}) is not an \
                         acquired image of the swapchain ({image_count} images)."
                    ),
                );
            }
        }

        for (i, &index) in release_info.image_indices.iter().enumerate() {
            let in_use = swapchain
                .image(index)
                .and_then(|slot| slot.image)
                .is_some_and(|image| image.in_use());
            if in_use {
                skip |= self.log_error(
                    &objects,
                    "VUID-VkReleaseSwapchainImagesInfoEXT-pImageIndices-07786",
                    format!(
                        "vkReleaseSwapchainImagesEXT(): image at pReleaseInfo->pImageIndices[{i}] ({index}) \
                         is still in use by the device."
                    ),
                );
            }
        }

        skip
    }
}
