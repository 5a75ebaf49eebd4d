//! `pre_call_validate_*` routines.
//!
//! Every routine returns `true` when the call should be skipped. Checks that
//! make the remaining ones meaningless return as soon as the sink asks to
//! abort; independent checks fold into a running `skip` flag.

mod acquire;
mod create_swapchain;
mod present;
mod present_modes;
mod present_scaling;
mod release;
mod surface;
mod swapchain;
mod sync;
mod wait_present;

use ash::vk;

pub use acquire::AcquireVariant;

/// At most one bit set.
pub(crate) fn at_most_one_bit(bits: u32) -> bool {
    bits.count_ones() <= 1
}

pub(crate) fn exactly_one_bit(bits: u32) -> bool {
    bits.count_ones() == 1
}

pub(crate) fn extent_within(extent: vk::Extent2D, min: vk::Extent2D, max: vk::Extent2D) -> bool {
    extent.width >= min.width
        && extent.width <= max.width
        && extent.height >= min.height
        && extent.height <= max.height
}
