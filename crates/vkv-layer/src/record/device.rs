use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::info::{DeviceCreateInfo, InstanceExtensions};
use crate::layer::ValidationLayer;
use crate::record::succeeded;
use crate::state::{DeviceState, InstanceState, PhysicalDeviceState, QueueState, SurfaceState, SwapchainState};

impl ValidationLayer {
    pub fn post_call_record_create_instance(
        &self,
        instance: vk::Instance,
        extensions: InstanceExtensions,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        self.store().add(Arc::new(InstanceState::new(instance, extensions)));
        debug!(instance = ?instance, ?extensions, "instance created");
    }

    /// Drop the instance and everything that hangs off it.
    pub fn pre_call_record_destroy_instance(&self, instance: vk::Instance) {
        if self.store().remove::<InstanceState>(instance).is_none() {
            return;
        }
        self.store()
            .retain::<PhysicalDeviceState>(|state| state.instance != instance);
        self.store().retain::<SurfaceState>(|state| state.instance != instance);
        debug!(instance = ?instance, "instance destroyed");
    }

    pub fn post_call_record_enumerate_physical_devices(
        &self,
        instance: vk::Instance,
        physical_devices: &[vk::PhysicalDevice],
        result: vk::Result,
    ) {
        if !succeeded(result) {
            return;
        }
        let Some(instance_state) = self.store().get::<InstanceState>(instance) else {
            return;
        };
        for &physical_device in physical_devices {
            if self.store().contains::<PhysicalDeviceState>(physical_device) {
                continue;
            }
            self.store().add(Arc::new(PhysicalDeviceState::new(
                physical_device,
                instance,
                instance_state.extensions,
            )));
            debug!(physical_device = ?physical_device, "physical device tracked");
        }
    }

    /// Only a complete answer replaces the known family table.
    pub fn post_call_record_get_physical_device_queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
        families: &[vk::QueueFamilyProperties],
    ) {
        if families.is_empty() {
            return;
        }
        if let Some(state) = self.store().get::<PhysicalDeviceState>(physical_device) {
            state.set_queue_families(families.to_vec());
        }
    }

    pub fn post_call_record_create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        create_info: &DeviceCreateInfo,
        device: vk::Device,
        result: vk::Result,
    ) {
        if result != vk::Result::SUCCESS {
            return;
        }
        let Some(physical_device_state) = self.store().get::<PhysicalDeviceState>(physical_device) else {
            return;
        };
        self.store()
            .add(Arc::new(DeviceState::new(device, physical_device_state, create_info)));
        debug!(device = ?device, physical_device = ?physical_device, "device created");
    }

    pub fn pre_call_record_destroy_device(&self, device: vk::Device) {
        if self.store().remove::<DeviceState>(device).is_none() {
            return;
        }
        for swapchain in self.store().snapshot::<SwapchainState>() {
            if swapchain.device == device {
                self.pre_call_record_destroy_swapchain_khr(device, swapchain.handle);
            }
        }
        self.store().retain::<QueueState>(|queue| queue.device != device);
        debug!(device = ?device, "device destroyed");
    }

    pub fn post_call_record_get_device_queue(
        &self,
        device: vk::Device,
        queue_family_index: u32,
        queue_index: u32,
        queue: vk::Queue,
    ) {
        if self.store().contains::<QueueState>(queue) || !self.store().contains::<DeviceState>(device) {
            return;
        }
        self.store().add(Arc::new(QueueState::new(
            queue,
            device,
            queue_family_index,
            queue_index,
        )));
        debug!(queue = ?queue, queue_family_index, queue_index, "queue tracked");
    }
}
