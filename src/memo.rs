
use std::sync::RwLock;

/// A lazily computed value, tagged with the version of the owner it was computed from
///
/// The owner bumps its version on every mutation, which makes any cached value stale
/// without having to touch the cache at each mutation site.  The next read recomputes it.
///
/// The lock is only there so that an owner shared across threads, as [par_count] shares the
/// enumerator, can still fill its cache through `&self`.  Owners are not otherwise synchronized.
///
/// [par_count]: crate::RestrictedPermutations::par_count
#[derive(Debug)]
pub(crate) struct Memo<T> {
    slot: RwLock<Option<(u64, T)>>,
}

impl<T: Clone> Memo<T> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Returns the cached value if it was computed at `version`, otherwise calls `compute`
    /// and caches its result
    pub fn get_or_compute<F: FnOnce() -> T>(&self, version: u64, compute: F) -> T {

        //A poisoned lock only means another reader panicked mid-compute; the slot is
        // still either empty or a complete value
        {
            let slot = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some((stamp, value)) = slot.as_ref() {
                if *stamp == version {
                    return value.clone();
                }
            }
        }

        let value = compute();
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some((version, value.clone()));
        value
    }

    /// True if a value computed at `version` is currently cached
    pub fn is_fresh(&self, version: u64) -> bool {
        let slot = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        matches!(slot.as_ref(), Some((stamp, _)) if *stamp == version)
    }
}

impl<T: Clone> Clone for Memo<T> {
    fn clone(&self) -> Self {
        let slot = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            slot: RwLock::new(slot.clone()),
        }
    }
}
