use std::sync::Arc;

use ash::vk;
use parking_lot::RwLock;

use crate::info::{DeviceCreateInfo, DeviceExtensions, DeviceFeatures, InstanceExtensions};
use crate::state::CapabilityCache;

pub struct InstanceState {
    pub handle: vk::Instance,
    pub extensions: InstanceExtensions,
}

impl InstanceState {
    pub fn new(handle: vk::Instance, extensions: InstanceExtensions) -> Self {
        Self { handle, extensions }
    }
}

pub struct PhysicalDeviceState {
    pub handle: vk::PhysicalDevice,
    pub instance: vk::Instance,
    pub instance_extensions: InstanceExtensions,
    queue_families: RwLock<Option<Vec<vk::QueueFamilyProperties>>>,
    /// Results of queries made with a null surface under
    /// VK_GOOGLE_surfaceless_query.
    pub surfaceless: CapabilityCache,
}

impl PhysicalDeviceState {
    pub fn new(
        handle: vk::PhysicalDevice,
        instance: vk::Instance,
        instance_extensions: InstanceExtensions,
    ) -> Self {
        Self {
            handle,
            instance,
            instance_extensions,
            queue_families: RwLock::new(None),
            surfaceless: CapabilityCache::new(),
        }
    }

    pub fn set_queue_families(&self, families: Vec<vk::QueueFamilyProperties>) {
        *self.queue_families.write() = Some(families);
    }

    /// Number of queue families, if the application has queried them.
    pub fn queue_family_count(&self) -> Option<u32> {
        self.queue_families
            .read()
            .as_ref()
            .map(|families| families.len() as u32)
    }
}

pub struct DeviceState {
    pub handle: vk::Device,
    pub physical_device: Arc<PhysicalDeviceState>,
    /// Sorted, deduplicated families the device was created with.
    pub queue_family_indices: Vec<u32>,
    pub physical_device_count: u32,
    pub extensions: DeviceExtensions,
    pub features: DeviceFeatures,
}

impl DeviceState {
    pub fn new(
        handle: vk::Device,
        physical_device: Arc<PhysicalDeviceState>,
        info: &DeviceCreateInfo,
    ) -> Self {
        let mut queue_family_indices = info.queue_family_indices.clone();
        queue_family_indices.sort_unstable();
        queue_family_indices.dedup();
        Self {
            handle,
            physical_device,
            queue_family_indices,
            physical_device_count: info.physical_device_count.max(1),
            extensions: info.extensions,
            features: info.features,
        }
    }

    pub fn instance_extensions(&self) -> &InstanceExtensions {
        &self.physical_device.instance_extensions
    }
}
