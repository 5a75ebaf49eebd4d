use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use ash::vk;
use parking_lot::RwLock;

use crate::chain::SwapchainCreateNext;
use crate::info::{ImageCreateInfo, SwapchainCreateInfo};
use crate::state::ImageState;

/// One image slot of a swapchain, indexed by the driver's image index.
#[derive(Clone, Default)]
pub struct SwapchainImage {
    /// Set once the application has retrieved the image.
    pub image: Option<Arc<ImageState>>,
    pub acquired: bool,
}

pub struct SwapchainState {
    pub handle: vk::SwapchainKHR,
    pub device: vk::Device,
    pub create_info: SwapchainCreateInfo,
    pub image_create_info: ImageCreateInfo,
    /// Modes the swapchain may switch between, from
    /// `VkSwapchainPresentModesCreateInfoEXT`. Empty when none were given.
    pub present_modes: Vec<vk::PresentModeKHR>,
    retired: AtomicBool,
    images: RwLock<Vec<SwapchainImage>>,
    acquired_images: AtomicU32,
    max_present_id: AtomicU64,
    reported_image_count: AtomicU32,
}

impl SwapchainState {
    pub fn new(
        handle: vk::SwapchainKHR,
        device: vk::Device,
        create_info: SwapchainCreateInfo,
        image_count: u32,
    ) -> Self {
        let image_create_info = ImageCreateInfo::for_swapchain(&create_info);
        let present_modes = create_info
            .next
            .find(SwapchainCreateNext::present_modes)
            .map(|info| info.present_modes.clone())
            .unwrap_or_default();
        Self {
            handle,
            device,
            create_info,
            image_create_info,
            present_modes,
            retired: AtomicBool::new(false),
            images: RwLock::new(vec![SwapchainImage::default(); image_count as usize]),
            acquired_images: AtomicU32::new(0),
            max_present_id: AtomicU64::new(0),
            reported_image_count: AtomicU32::new(0),
        }
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.create_info.surface
    }

    pub fn is_shared_presentable(&self) -> bool {
        self.create_info.is_shared_presentable()
    }

    /// Retirement is permanent.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    pub fn image_count(&self) -> u32 {
        self.images.read().len() as u32
    }

    pub fn acquired_images(&self) -> u32 {
        self.acquired_images.load(Ordering::Acquire)
    }

    pub fn image(&self, index: u32) -> Option<SwapchainImage> {
        self.images.read().get(index as usize).cloned()
    }

    pub fn images(&self) -> Vec<SwapchainImage> {
        self.images.read().clone()
    }

    /// Mark `index` acquired. Returns false if it is out of range or already
    /// acquired.
    pub fn acquire_image(&self, index: u32) -> bool {
        let mut images = self.images.write();
        match images.get_mut(index as usize) {
            Some(slot) if !slot.acquired => {
                slot.acquired = true;
                self.acquired_images.fetch_add(1, Ordering::AcqRel);
                true
            }
            _ => false,
        }
    }

    /// Return `index` to the presentation engine, by present or release.
    pub fn release_image(&self, index: u32) -> bool {
        let mut images = self.images.write();
        match images.get_mut(index as usize) {
            Some(slot) if slot.acquired => {
                slot.acquired = false;
                self.acquired_images.fetch_sub(1, Ordering::AcqRel);
                true
            }
            _ => false,
        }
    }

    /// Attach the image the application retrieved for slot `index`, growing
    /// the slot list if the driver reports more images than expected.
    pub fn bind_image(&self, index: u32, image: Arc<ImageState>) {
        let mut images = self.images.write();
        let index = index as usize;
        if index >= images.len() {
            images.resize(index + 1, SwapchainImage::default());
        }
        images[index].image = Some(image);
    }

    /// Take every bound image record out of the slots.
    pub fn take_images(&self) -> Vec<Arc<ImageState>> {
        self.images
            .write()
            .iter_mut()
            .filter_map(|slot| slot.image.take())
            .collect()
    }

    pub fn max_present_id(&self) -> u64 {
        self.max_present_id.load(Ordering::Acquire)
    }

    pub fn update_present_id(&self, present_id: u64) {
        self.max_present_id.fetch_max(present_id, Ordering::AcqRel);
    }

    /// Count the application was given by a `vkGetSwapchainImagesKHR` call
    /// without an output array. Zero if it never asked.
    pub fn reported_image_count(&self) -> u32 {
        self.reported_image_count.load(Ordering::Acquire)
    }

    pub fn set_reported_image_count(&self, count: u32) {
        self.reported_image_count.store(count, Ordering::Release);
    }
}
