use std::hash::Hash;
use std::sync::Arc;

use ash::vk::Handle;
use dashmap::DashMap;

/// Handle-keyed registry of shared state records for one object kind.
///
/// Lookups hand out `Arc` clones, so a record removed from the map stays
/// alive for every caller still holding it, while a new object reusing the
/// same handle value starts from a fresh record.
pub struct StateMap<H, T> {
    entries: DashMap<H, Arc<T>>,
}

impl<H, T> StateMap<H, T>
where
    H: Handle + Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Register the record for `handle`, returning the record it replaced.
    pub fn insert(&self, handle: H, state: Arc<T>) -> Option<Arc<T>> {
        if handle.as_raw() == 0 {
            return None;
        }
        self.entries.insert(handle, state)
    }

    /// Look up the record for `handle`. Null and unknown handles yield `None`.
    pub fn get(&self, handle: H) -> Option<Arc<T>> {
        if handle.as_raw() == 0 {
            return None;
        }
        self.entries.get(&handle).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove the record for `handle` from the key space.
    pub fn remove(&self, handle: H) -> Option<Arc<T>> {
        self.entries.remove(&handle).map(|(_, state)| state)
    }

    pub fn contains(&self, handle: H) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Clone out every live record. Ordering is unspecified.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Drop every record for which `keep` returns false.
    pub fn retain(&self, mut keep: impl FnMut(&T) -> bool) {
        self.entries.retain(|_, state| keep(state));
    }

    /// Return number of live records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H, T> Default for StateMap<H, T>
where
    H: Handle + Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
