//! Expiry sweep.

use converter_common::Timestamp;

use crate::memory::InMemoryStore;

impl InMemoryStore {
    /// Delete every entry expired at `now`, returning how many were removed.
    ///
    /// Holds the write lock for the whole scan. Unexpired and eternal entries
    /// are never touched.
    pub fn sweep_expired(&self, now: Timestamp) -> usize {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|_, entry| !entry.is_expired_at(now));
        before - items.len()
    }
}
