use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use ash::prelude::VkResult;
use ash::vk;
use parking_lot::RwLock;

use crate::driver::SurfaceCapabilities;

/// Capabilities are keyed by physical device and, for per-present-mode
/// queries, the mode that was chained into the query.
pub type CapabilityKey = (vk::PhysicalDevice, Option<vk::PresentModeKHR>);

/// Memoized surface query results for one surface (or, for surfaceless
/// queries, one physical device).
///
/// Values are immutable once stored. A newer answer replaces the `Arc`, so
/// readers holding the previous one keep a consistent view.
#[derive(Default)]
pub struct CapabilityCache {
    capabilities: RwLock<HashMap<CapabilityKey, Arc<SurfaceCapabilities>>>,
    formats: RwLock<HashMap<vk::PhysicalDevice, Arc<[vk::SurfaceFormatKHR]>>>,
    present_modes: RwLock<HashMap<vk::PhysicalDevice, Arc<[vk::PresentModeKHR]>>>,
    queue_support: RwLock<HashMap<(vk::PhysicalDevice, u32), bool>>,
}

fn get_or_query<K, V>(
    map: &RwLock<HashMap<K, Arc<V>>>,
    key: K,
    query: impl FnOnce() -> VkResult<Arc<V>>,
) -> VkResult<Arc<V>>
where
    K: Eq + Hash,
    V: ?Sized,
{
    if let Some(cached) = map.read().get(&key) {
        return Ok(Arc::clone(cached));
    }
    let value = query()?;
    map.write().insert(key, Arc::clone(&value));
    Ok(value)
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        present_mode: Option<vk::PresentModeKHR>,
    ) -> Option<Arc<SurfaceCapabilities>> {
        self.capabilities
            .read()
            .get(&(physical_device, present_mode))
            .cloned()
    }

    pub fn store_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        present_mode: Option<vk::PresentModeKHR>,
        capabilities: SurfaceCapabilities,
    ) -> Arc<SurfaceCapabilities> {
        let capabilities = Arc::new(capabilities);
        self.capabilities
            .write()
            .insert((physical_device, present_mode), Arc::clone(&capabilities));
        capabilities
    }

    pub fn capabilities_or_query(
        &self,
        physical_device: vk::PhysicalDevice,
        present_mode: Option<vk::PresentModeKHR>,
        query: impl FnOnce() -> VkResult<SurfaceCapabilities>,
    ) -> VkResult<Arc<SurfaceCapabilities>> {
        get_or_query(&self.capabilities, (physical_device, present_mode), || {
            query().map(Arc::new)
        })
    }

    pub fn formats(&self, physical_device: vk::PhysicalDevice) -> Option<Arc<[vk::SurfaceFormatKHR]>> {
        self.formats.read().get(&physical_device).cloned()
    }

    pub fn store_formats(&self, physical_device: vk::PhysicalDevice, formats: Vec<vk::SurfaceFormatKHR>) {
        self.formats.write().insert(physical_device, formats.into());
    }

    pub fn formats_or_query(
        &self,
        physical_device: vk::PhysicalDevice,
        query: impl FnOnce() -> VkResult<Vec<vk::SurfaceFormatKHR>>,
    ) -> VkResult<Arc<[vk::SurfaceFormatKHR]>> {
        get_or_query(&self.formats, physical_device, || query().map(Into::into))
    }

    pub fn present_modes(&self, physical_device: vk::PhysicalDevice) -> Option<Arc<[vk::PresentModeKHR]>> {
        self.present_modes.read().get(&physical_device).cloned()
    }

    pub fn store_present_modes(&self, physical_device: vk::PhysicalDevice, modes: Vec<vk::PresentModeKHR>) {
        self.present_modes.write().insert(physical_device, modes.into());
    }

    pub fn present_modes_or_query(
        &self,
        physical_device: vk::PhysicalDevice,
        query: impl FnOnce() -> VkResult<Vec<vk::PresentModeKHR>>,
    ) -> VkResult<Arc<[vk::PresentModeKHR]>> {
        get_or_query(&self.present_modes, physical_device, || query().map(Into::into))
    }

    pub fn queue_support(&self, physical_device: vk::PhysicalDevice, queue_family_index: u32) -> Option<bool> {
        self.queue_support
            .read()
            .get(&(physical_device, queue_family_index))
            .copied()
    }

    pub fn store_queue_support(&self, physical_device: vk::PhysicalDevice, queue_family_index: u32, supported: bool) {
        self.queue_support
            .write()
            .insert((physical_device, queue_family_index), supported);
    }

    pub fn queue_support_or_query(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        query: impl FnOnce() -> VkResult<bool>,
    ) -> VkResult<bool> {
        if let Some(supported) = self.queue_support(physical_device, queue_family_index) {
            return Ok(supported);
        }
        let supported = query()?;
        self.store_queue_support(physical_device, queue_family_index, supported);
        Ok(supported)
    }
}
