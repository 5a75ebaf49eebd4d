use std::sync::atomic::{AtomicU32, Ordering};

use ash::vk;
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::info::ImageCreateInfo;

/// Tracked layout per array layer. `None` until a layout is first observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutMap {
    layers: Vec<Option<vk::ImageLayout>>,
}

impl LayoutMap {
    pub fn new(array_layers: u32) -> Self {
        Self {
            layers: vec![None; array_layers as usize],
        }
    }

    /// Record `layout` for `layer_count` layers starting at `base`.
    /// `vk::REMAINING_ARRAY_LAYERS` runs to the last layer.
    pub fn set(&mut self, base: u32, layer_count: u32, layout: vk::ImageLayout) {
        let start = (base as usize).min(self.layers.len());
        let end = if layer_count == vk::REMAINING_ARRAY_LAYERS {
            self.layers.len()
        } else {
            start.saturating_add(layer_count as usize).min(self.layers.len())
        };
        for slot in &mut self.layers[start..end] {
            *slot = Some(layout);
        }
    }

    pub fn layer(&self, layer: u32) -> Option<vk::ImageLayout> {
        self.layers.get(layer as usize).copied().flatten()
    }

    /// Distinct layouts currently tracked, in layer order.
    pub fn distinct(&self) -> SmallVec<[vk::ImageLayout; 2]> {
        let mut layouts = SmallVec::new();
        for layout in self.layers.iter().flatten() {
            if !layouts.contains(layout) {
                layouts.push(*layout);
            }
        }
        layouts
    }
}

pub struct ImageState {
    pub handle: vk::Image,
    pub create_info: ImageCreateInfo,
    /// Owning swapchain and image index for presentable images.
    pub swapchain: Option<(vk::SwapchainKHR, u32)>,
    layouts: RwLock<LayoutMap>,
    in_use: AtomicU32,
}

impl ImageState {
    pub fn new(handle: vk::Image, create_info: ImageCreateInfo) -> Self {
        let layouts = LayoutMap::new(create_info.array_layers);
        Self {
            handle,
            create_info,
            swapchain: None,
            layouts: RwLock::new(layouts),
            in_use: AtomicU32::new(0),
        }
    }

    pub fn for_swapchain(
        handle: vk::Image,
        create_info: ImageCreateInfo,
        swapchain: vk::SwapchainKHR,
        index: u32,
    ) -> Self {
        Self {
            swapchain: Some((swapchain, index)),
            ..Self::new(handle, create_info)
        }
    }

    /// Layouts tracked across the image's subresources. Empty when nothing
    /// has been observed yet.
    pub fn find_layouts(&self) -> SmallVec<[vk::ImageLayout; 2]> {
        self.layouts.read().distinct()
    }

    pub fn set_layout(&self, base_layer: u32, layer_count: u32, layout: vk::ImageLayout) {
        self.layouts.write().set(base_layer, layer_count, layout);
    }

    pub fn set_all_layouts(&self, layout: vk::ImageLayout) {
        self.set_layout(0, vk::REMAINING_ARRAY_LAYERS, layout);
    }

    pub fn layouts(&self) -> LayoutMap {
        self.layouts.read().clone()
    }

    /// True while a submission referencing the image has not retired.
    pub fn in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire) > 0
    }

    pub fn begin_use(&self) {
        self.in_use.fetch_add(1, Ordering::AcqRel);
    }

    pub fn end_use(&self) {
        let _ = self
            .in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| count.checked_sub(1));
    }
}
