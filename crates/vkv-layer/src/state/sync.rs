use ash::vk;
use parking_lot::Mutex;

/// Who owns a synchronization payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncScope {
    Internal,
    /// Imported until the next wait (semaphore) or reset (fence).
    ExternalTemporary,
    ExternalPermanent,
}

#[derive(Debug, Clone, Copy)]
struct SemaphoreInner {
    scope: SyncScope,
    /// Signaled, or a signal operation is pending.
    signaled: bool,
}

/// Binary semaphore signal tracking is approximate: the layer cannot see when
/// a pending wait actually completes, so `signaled` follows the order calls
/// were recorded in rather than execution on the device.
pub struct SemaphoreState {
    pub handle: vk::Semaphore,
    pub semaphore_type: vk::SemaphoreType,
    inner: Mutex<SemaphoreInner>,
}

impl SemaphoreState {
    pub fn new(handle: vk::Semaphore, semaphore_type: vk::SemaphoreType) -> Self {
        Self {
            handle,
            semaphore_type,
            inner: Mutex::new(SemaphoreInner {
                scope: SyncScope::Internal,
                signaled: false,
            }),
        }
    }

    pub fn is_binary(&self) -> bool {
        self.semaphore_type == vk::SemaphoreType::BINARY
    }

    pub fn scope(&self) -> SyncScope {
        self.inner.lock().scope
    }

    /// True if a new signal operation may be queued.
    pub fn can_be_signaled(&self) -> bool {
        !self.inner.lock().signaled
    }

    /// True if a wait would find a signal to consume.
    pub fn can_be_waited(&self) -> bool {
        self.inner.lock().signaled
    }

    pub fn signal(&self) {
        self.inner.lock().signaled = true;
    }

    /// Consume the payload. A temporary import reverts to the internal one.
    pub fn wait(&self) {
        let mut inner = self.inner.lock();
        inner.signaled = false;
        if inner.scope == SyncScope::ExternalTemporary {
            inner.scope = SyncScope::Internal;
        }
    }

    pub fn import(&self, temporary: bool) {
        let mut inner = self.inner.lock();
        if inner.scope != SyncScope::ExternalPermanent {
            inner.scope = if temporary {
                SyncScope::ExternalTemporary
            } else {
                SyncScope::ExternalPermanent
            };
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    Unsignaled,
    /// Submitted and waiting for the device to signal it.
    InFlight,
    /// Signaled, observed by the host or created signaled.
    Retired,
}

#[derive(Debug, Clone, Copy)]
struct FenceInner {
    status: FenceStatus,
    scope: SyncScope,
}

pub struct FenceState {
    pub handle: vk::Fence,
    inner: Mutex<FenceInner>,
}

impl FenceState {
    pub fn new(handle: vk::Fence, flags: vk::FenceCreateFlags) -> Self {
        let status = if flags.contains(vk::FenceCreateFlags::SIGNALED) {
            FenceStatus::Retired
        } else {
            FenceStatus::Unsignaled
        };
        Self {
            handle,
            inner: Mutex::new(FenceInner {
                status,
                scope: SyncScope::Internal,
            }),
        }
    }

    pub fn status(&self) -> FenceStatus {
        self.inner.lock().status
    }

    pub fn scope(&self) -> SyncScope {
        self.inner.lock().scope
    }

    pub fn submit(&self) {
        self.inner.lock().status = FenceStatus::InFlight;
    }

    pub fn retire(&self) {
        self.inner.lock().status = FenceStatus::Retired;
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        if inner.scope == SyncScope::ExternalTemporary {
            inner.scope = SyncScope::Internal;
        }
        inner.status = FenceStatus::Unsignaled;
    }

    pub fn import(&self, temporary: bool) {
        let mut inner = self.inner.lock();
        if inner.scope != SyncScope::ExternalPermanent {
            inner.scope = if temporary {
                SyncScope::ExternalTemporary
            } else {
                SyncScope::ExternalPermanent
            };
        }
    }
}
