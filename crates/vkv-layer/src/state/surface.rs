use std::sync::{Arc, Weak};

use ash::vk;
use parking_lot::RwLock;

use crate::state::{CapabilityCache, PhysicalDeviceState, SwapchainState};

/// What capability queries are answered for: a live surface, or the physical
/// device itself for VK_GOOGLE_surfaceless_query.
pub trait SurfaceTarget {
    /// `VK_NULL_HANDLE` for a surfaceless query.
    fn surface_handle(&self) -> vk::SurfaceKHR;
    fn capability_cache(&self) -> &CapabilityCache;
}

pub struct SurfaceState {
    pub handle: vk::SurfaceKHR,
    pub instance: vk::Instance,
    swapchain: RwLock<Weak<SwapchainState>>,
    pub cache: CapabilityCache,
}

impl SurfaceState {
    pub fn new(handle: vk::SurfaceKHR, instance: vk::Instance) -> Self {
        Self {
            handle,
            instance,
            swapchain: RwLock::new(Weak::new()),
            cache: CapabilityCache::new(),
        }
    }

    /// The swapchain currently presenting to this surface, if it is alive.
    pub fn swapchain(&self) -> Option<Arc<SwapchainState>> {
        self.swapchain.read().upgrade()
    }

    pub fn set_swapchain(&self, swapchain: &Arc<SwapchainState>) {
        *self.swapchain.write() = Arc::downgrade(swapchain);
    }

    pub fn clear_swapchain(&self) {
        *self.swapchain.write() = Weak::new();
    }

    /// Drop the association only if it still points at `swapchain`.
    pub fn detach_swapchain(&self, swapchain: vk::SwapchainKHR) {
        let mut current = self.swapchain.write();
        if current
            .upgrade()
            .is_some_and(|state| state.handle == swapchain)
        {
            *current = Weak::new();
        }
    }
}

impl SurfaceTarget for SurfaceState {
    fn surface_handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    fn capability_cache(&self) -> &CapabilityCache {
        &self.cache
    }
}

impl SurfaceTarget for PhysicalDeviceState {
    fn surface_handle(&self) -> vk::SurfaceKHR {
        vk::SurfaceKHR::null()
    }

    fn capability_cache(&self) -> &CapabilityCache {
        &self.surfaceless
    }
}
