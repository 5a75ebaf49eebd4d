use ash::vk;

use crate::diagnostics::ObjectRef;
use crate::layer::ValidationLayer;
use crate::state::{FenceState, FenceStatus, SemaphoreState, SyncScope};

impl ValidationLayer {
    /// A fence handed to an operation that will signal it must be unsignaled
    /// and not already owned by another pending operation. Imported fences
    /// are not tracked.
    pub(crate) fn validate_fence_for_submit(
        &self,
        fence: &FenceState,
        inflight_vuid: &'static str,
        retired_vuid: &'static str,
        func_name: &str,
    ) -> bool {
        if fence.scope() != SyncScope::Internal {
            return false;
        }
        let objects = [ObjectRef::new(fence.handle)];
        match fence.status() {
            FenceStatus::InFlight => self.log_error(
                &objects,
                inflight_vuid,
                format!("{func_name}: fence {:?} is already in use by another submission.", fence.handle),
            ),
            FenceStatus::Retired => self.log_error(
                &objects,
                retired_vuid,
                format!(
                    "{func_name}: fence {:?} is submitted in signaled state. Fences must be reset before \
                     being submitted.",
                    fence.handle
                ),
            ),
            FenceStatus::Unsignaled => false,
        }
    }

    /// Wait semaphores of a present.
    pub(crate) fn validate_present_wait_semaphore(
        &self,
        queue: vk::Queue,
        index: usize,
        semaphore: &SemaphoreState,
    ) -> bool {
        let objects = [ObjectRef::new(queue), ObjectRef::new(semaphore.handle)];
        if !semaphore.is_binary() {
            return self.log_error(
                &objects,
                "VUID-vkQueuePresentKHR-pWaitSemaphores-03267",
                format!(
                    "vkQueuePresentKHR(): pWaitSemaphores[{index}] ({:?}) is not a VK_SEMAPHORE_TYPE_BINARY \
                     semaphore.",
                    semaphore.handle
                ),
            );
        }
        if semaphore.scope() == SyncScope::Internal && !semaphore.can_be_waited() {
            return self.log_error(
                &objects,
                "VUID-vkQueuePresentKHR-pWaitSemaphores-03268",
                format!(
                    "vkQueuePresentKHR(): queue {:?} is waiting on pWaitSemaphores[{index}] ({:?}) that has \
                     no way to be signaled.",
                    queue, semaphore.handle
                ),
            );
        }
        false
    }
}
