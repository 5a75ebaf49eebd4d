//! `pre_call_record_*` / `post_call_record_*` routines.
//!
//! These keep the object store in step with the driver. They never fail:
//! state that is missing (because the creating call was never recorded)
//! turns the update into a no-op.

mod device;
mod surface;
mod swapchain;
mod sync;

use ash::vk;

/// Results after which the driver has produced its outputs.
pub(crate) fn succeeded(result: vk::Result) -> bool {
    result == vk::Result::SUCCESS || result == vk::Result::INCOMPLETE
}
