use std::collections::VecDeque;
use std::sync::Arc;

use ash::vk;
use parking_lot::Mutex;
use tracing::debug;

use crate::state::{FenceState, ImageState};

/// Submissions kept per queue. Anything older is assumed complete; its fence
/// stays in flight until the host observes it.
pub const MAX_PENDING_SUBMISSIONS: usize = 64;

/// Work submitted to a queue that has not been observed to complete.
pub struct Submission {
    pub fence: Option<Arc<FenceState>>,
    pub images: Vec<Arc<ImageState>>,
}

impl Submission {
    fn release_images(&self) {
        for image in &self.images {
            image.end_use();
        }
    }

    fn retire(self) {
        self.release_images();
        if let Some(fence) = &self.fence {
            fence.retire();
        }
    }
}

pub struct QueueState {
    pub handle: vk::Queue,
    pub device: vk::Device,
    pub queue_family_index: u32,
    pub queue_index: u32,
    pending: Mutex<VecDeque<Submission>>,
}

impl QueueState {
    pub fn new(handle: vk::Queue, device: vk::Device, queue_family_index: u32, queue_index: u32) -> Self {
        Self {
            handle,
            device,
            queue_family_index,
            queue_index,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue `submission`, marking its images in use. Past
    /// [`MAX_PENDING_SUBMISSIONS`] the oldest entry is dropped.
    pub fn enqueue(&self, submission: Submission) {
        for image in &submission.images {
            image.begin_use();
        }
        let evicted = {
            let mut pending = self.pending.lock();
            pending.push_back(submission);
            if pending.len() > MAX_PENDING_SUBMISSIONS {
                pending.pop_front()
            } else {
                None
            }
        };
        if let Some(oldest) = evicted {
            debug!(queue = ?self.handle, "oldest pending submission assumed complete");
            oldest.release_images();
        }
    }

    /// Retire every submission up to and including the one that signals
    /// `fence`. Returns false if no pending submission carries the fence.
    pub fn retire_through(&self, fence: vk::Fence) -> bool {
        let mut pending = self.pending.lock();
        let Some(position) = pending
            .iter()
            .position(|s| s.fence.as_ref().is_some_and(|f| f.handle == fence))
        else {
            return false;
        };
        let retired: Vec<Submission> = pending.drain(..=position).collect();
        drop(pending);
        for submission in retired {
            submission.retire();
        }
        true
    }

    pub fn retire_all(&self) {
        let retired: Vec<Submission> = self.pending.lock().drain(..).collect();
        for submission in retired {
            submission.retire();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}
