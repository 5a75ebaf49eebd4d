use ash::vk;

use crate::diagnostics::ObjectRef;
use crate::layer::ValidationLayer;
use crate::state::SwapchainState;

const PRIOR_COUNT: &str = "UNASSIGNED-CoreValidation-SwapchainPriorCount";
const INVALID_COUNT: &str = "UNASSIGNED-CoreValidation-SwapchainInvalidCount";

impl ValidationLayer {
    pub fn pre_call_validate_destroy_swapchain_khr(&self, device: vk::Device, swapchain: vk::SwapchainKHR) -> bool {
        let Some(swapchain_state) = self.store().get::<SwapchainState>(swapchain) else {
            return false;
        };
        let mut skip = false;
        for (index, slot) in swapchain_state.images().iter().enumerate() {
            let Some(image) = &slot.image else {
                continue;
            };
            if image.in_use() {
                skip |= self.log_error(
                    &[ObjectRef::new(device), ObjectRef::new(swapchain), ObjectRef::new(image.handle)],
                    "VUID-vkDestroySwapchainKHR-swapchain-01282",
                    format!(
                        "vkDestroySwapchainKHR(): image {index} of swapchain {:?} is still in use by a \
                         pending submission.",
                        swapchain
                    ),
                );
            }
        }
        skip
    }

    /// `requested` is `*pSwapchainImageCount` when an output array was
    /// passed, `None` for a count-only query.
    pub fn pre_call_validate_get_swapchain_images_khr(
        &self,
        device: vk::Device,
        swapchain: vk::SwapchainKHR,
        requested: Option<u32>,
    ) -> bool {
        let Some(requested) = requested else {
            return false;
        };
        let Some(swapchain_state) = self.store().get::<SwapchainState>(swapchain) else {
            return false;
        };
        let objects = [ObjectRef::new(device), ObjectRef::new(swapchain)];
        let reported = swapchain_state.reported_image_count();
        if reported == 0 {
            return self.log_warning(
                &objects,
                PRIOR_COUNT,
                "vkGetSwapchainImagesKHR(): called with non-NULL pSwapchainImages but no prior count query \
                 has been seen for this swapchain.",
            );
        }
        if requested > reported {
            return self.log_warning(
                &objects,
                INVALID_COUNT,
                format!(
                    "vkGetSwapchainImagesKHR(): pSwapchainImageCount is {requested}, which is greater than the \
                     {reported} returned by the previous count query."
                ),
            );
        }
        false
    }
}
