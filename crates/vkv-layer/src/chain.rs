//! Extension structures attached to a call.
//!
//! Each entry point that accepts a `pNext` chain gets its own closed enum of
//! the structures this layer understands. A [`Chain`] keeps them in the
//! order the application linked them, and lookups return the first match.

use ash::vk;

/// Ordered set of extension structures for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain<T>(Vec<T>);

impl<T> Chain<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append `entry`, builder style.
    pub fn with(mut self, entry: T) -> Self {
        self.0.push(entry);
        self
    }

    pub fn push(&mut self, entry: T) {
        self.0.push(entry);
    }

    /// First entry accepted by `select`, e.g.
    /// `chain.find(SwapchainCreateNext::present_modes)`.
    pub fn find<'a, U>(&'a self, select: fn(&'a T) -> Option<&'a U>) -> Option<&'a U> {
        self.0.iter().find_map(select)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for Chain<T> {
    fn from(entries: Vec<T>) -> Self {
        Self(entries)
    }
}

/// Generates one `Option<&Payload>` accessor per variant.
macro_rules! chain_accessors {
    ($chain:ident { $($variant:ident($payload:ty) => $accessor:ident),+ $(,)? }) => {
        impl $chain {
            $(
                pub fn $accessor(&self) -> Option<&$payload> {
                    match self {
                        $chain::$variant(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            )+
        }
    };
}

// VkSwapchainCreateInfoKHR chain

/// `VkSwapchainPresentModesCreateInfoEXT`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapchainPresentModesCreateInfo {
    pub present_modes: Vec<vk::PresentModeKHR>,
}

/// `VkSwapchainPresentScalingCreateInfoEXT`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapchainPresentScalingCreateInfo {
    pub scaling_behavior: vk::PresentScalingFlagsEXT,
    pub present_gravity_x: vk::PresentGravityFlagsEXT,
    pub present_gravity_y: vk::PresentGravityFlagsEXT,
}

/// `VkImageFormatListCreateInfo`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFormatListCreateInfo {
    pub view_formats: Vec<vk::Format>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapchainCreateNext {
    PresentModes(SwapchainPresentModesCreateInfo),
    PresentScaling(SwapchainPresentScalingCreateInfo),
    ImageFormatList(ImageFormatListCreateInfo),
}

chain_accessors!(SwapchainCreateNext {
    PresentModes(SwapchainPresentModesCreateInfo) => present_modes,
    PresentScaling(SwapchainPresentScalingCreateInfo) => present_scaling,
    ImageFormatList(ImageFormatListCreateInfo) => image_format_list,
});

// VkPresentInfoKHR chain

/// One swapchain's entry in `VkPresentRegionsKHR`. `None` means the whole
/// image changed.
#[derive(Debug, Clone, Default)]
pub struct PresentRegion {
    pub rectangles: Option<Vec<vk::RectLayerKHR>>,
}

/// `VkPresentRegionsKHR`
#[derive(Debug, Clone, Default)]
pub struct PresentRegions {
    pub regions: Vec<PresentRegion>,
}

/// `VkPresentTimesInfoGOOGLE`
#[derive(Debug, Clone, Default)]
pub struct PresentTimesInfo {
    pub times: Vec<vk::PresentTimeGOOGLE>,
}

/// `VkPresentIdKHR`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentIdInfo {
    pub present_ids: Vec<u64>,
}

/// `VkSwapchainPresentFenceInfoEXT`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapchainPresentFenceInfo {
    pub fences: Vec<vk::Fence>,
}

/// `VkSwapchainPresentModeInfoEXT`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapchainPresentModeInfo {
    pub present_modes: Vec<vk::PresentModeKHR>,
}

/// `VkDisplayPresentInfoKHR`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayPresentInfo {
    pub src_rect: vk::Rect2D,
    pub dst_rect: vk::Rect2D,
    pub persistent: bool,
}

#[derive(Debug, Clone)]
pub enum PresentNext {
    Regions(PresentRegions),
    Times(PresentTimesInfo),
    Ids(PresentIdInfo),
    Fences(SwapchainPresentFenceInfo),
    Modes(SwapchainPresentModeInfo),
    Display(DisplayPresentInfo),
}

chain_accessors!(PresentNext {
    Regions(PresentRegions) => regions,
    Times(PresentTimesInfo) => times,
    Ids(PresentIdInfo) => ids,
    Fences(SwapchainPresentFenceInfo) => fences,
    Modes(SwapchainPresentModeInfo) => modes,
    Display(DisplayPresentInfo) => display,
});
