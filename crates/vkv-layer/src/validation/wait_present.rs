use ash::vk;

use crate::diagnostics::ObjectRef;
use crate::layer::ValidationLayer;
use crate::state::{DeviceState, SwapchainState};

impl ValidationLayer {
    pub fn pre_call_validate_wait_for_present_khr(
        &self,
        device: vk::Device,
        swapchain: vk::SwapchainKHR,
        present_id: u64,
        _timeout: u64,
    ) -> bool {
        let mut skip = false;

        let present_wait = self
            .store()
            .get::<DeviceState>(device)
            .is_some_and(|state| state.features.present_wait);
        if !present_wait {
            skip |= self.log_error(
                &[ObjectRef::new(device)],
                "VUID-vkWaitForPresentKHR-presentWait-06234",
                "vkWaitForPresentKHR(): the presentWait feature is not enabled.",
            );
        }

        if let Some(swapchain_state) = self.store().get::<SwapchainState>(swapchain) {
            if swapchain_state.is_retired() {
                skip |= self.log_error(
                    &[ObjectRef::new(swapchain)],
                    "VUID-vkWaitForPresentKHR-swapchain-04997",
                    format!(
                        "vkWaitForPresentKHR(): called on retired swapchain {:?} (presentId {present_id}).",
                        swapchain
                    ),
                );
            }
        }

        skip
    }
}
