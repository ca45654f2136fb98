use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;

use crate::{db_types::UserTable, plume_api::errors::UserStoreError, UserSink};

/// A sink that keeps the "persisted" table in memory. Clones share the same storage, so a test can keep one handle
/// and inspect what the store wrote through the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    users: Arc<Mutex<UserTable>>,
    writes: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: UserTable) -> Self {
        Self { users: Arc::new(Mutex::new(users)), writes: Arc::default() }
    }

    /// The last table handed to `persist` (or the seed table if nothing was written yet).
    pub fn contents(&self) -> UserTable {
        self.users.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl UserSink for MemorySink {
    async fn load(&self) -> Result<UserTable, UserStoreError> {
        Ok(self.contents())
    }

    async fn persist(&self, users: &UserTable) -> Result<(), UserStoreError> {
        *self.users.lock() = users.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
