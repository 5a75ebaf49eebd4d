//! Tracked object state.
//!
//! [`ObjectStore`] owns one [`StateMap`] per object kind. Records are handed
//! out as `Arc`s, so a destroyed object's record outlives its map entry for
//! as long as a validation call still holds it.

mod capability_cache;
mod device;
mod image;
mod queue;
mod surface;
mod swapchain;
mod sync;

use std::hash::Hash;
use std::sync::Arc;

use ash::vk::{self, Handle};
use vkv_core::StateMap;

pub use capability_cache::{CapabilityCache, CapabilityKey};
pub use device::{DeviceState, InstanceState, PhysicalDeviceState};
pub use image::{ImageState, LayoutMap};
pub use queue::{QueueState, Submission, MAX_PENDING_SUBMISSIONS};
pub use surface::{SurfaceState, SurfaceTarget};
pub use swapchain::{SwapchainImage, SwapchainState};
pub use sync::{FenceState, FenceStatus, SemaphoreState, SyncScope};

/// A state record kind stored in the [`ObjectStore`].
pub trait Tracked: Sized {
    type Handle: Handle + Copy + Eq + Hash;

    fn handle(&self) -> Self::Handle;

    fn state_map(store: &ObjectStore) -> &StateMap<Self::Handle, Self>;
}

macro_rules! tracked {
    ($($state:ty => $handle:ty, $field:ident;)+) => {
        /// Registry of every object the layer tracks.
        #[derive(Default)]
        pub struct ObjectStore {
            $($field: StateMap<$handle, $state>,)+
        }

        $(
            impl Tracked for $state {
                type Handle = $handle;

                fn handle(&self) -> $handle {
                    self.handle
                }

                fn state_map(store: &ObjectStore) -> &StateMap<$handle, $state> {
                    &store.$field
                }
            }
        )+
    };
}

tracked! {
    InstanceState => vk::Instance, instances;
    PhysicalDeviceState => vk::PhysicalDevice, physical_devices;
    DeviceState => vk::Device, devices;
    SurfaceState => vk::SurfaceKHR, surfaces;
    SwapchainState => vk::SwapchainKHR, swapchains;
    ImageState => vk::Image, images;
    QueueState => vk::Queue, queues;
    SemaphoreState => vk::Semaphore, semaphores;
    FenceState => vk::Fence, fences;
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the record for `handle`. Null and unknown handles yield `None`.
    pub fn get<T: Tracked>(&self, handle: T::Handle) -> Option<Arc<T>> {
        T::state_map(self).get(handle)
    }

    /// Register `state` under its own handle, returning whatever it replaced.
    pub fn add<T: Tracked>(&self, state: Arc<T>) -> Option<Arc<T>> {
        T::state_map(self).insert(state.handle(), state)
    }

    /// Evict the record for `handle` from the key space.
    pub fn remove<T: Tracked>(&self, handle: T::Handle) -> Option<Arc<T>> {
        T::state_map(self).remove(handle)
    }

    pub fn contains<T: Tracked>(&self, handle: T::Handle) -> bool {
        T::state_map(self).contains(handle)
    }

    pub fn snapshot<T: Tracked>(&self) -> Vec<Arc<T>> {
        T::state_map(self).snapshot()
    }

    pub fn retain<T: Tracked>(&self, keep: impl FnMut(&T) -> bool) {
        T::state_map(self).retain(keep)
    }

    pub fn count<T: Tracked>(&self) -> usize {
        T::state_map(self).len()
    }
}
