use crate::{db_types::UserTable, plume_api::errors::UserStoreError};

/// The `UserSink` trait defines where the user table is loaded from and written back to.
///
/// The in-memory table held by [`crate::UserStore`] is authoritative for the life of the process. The sink only sees
/// whole-table snapshots: one `load` at startup, and one `persist` after every accepted change. Calls to `persist` are
/// serialized by the store, so implementations do not need their own locking.
#[allow(async_fn_in_trait)]
pub trait UserSink {
    /// Reads the stored table. A sink that has never been written to returns an empty table. Any other failure is
    /// fatal to server startup.
    async fn load(&self) -> Result<UserTable, UserStoreError>;

    /// Replaces the stored table with `users`.
    async fn persist(&self, users: &UserTable) -> Result<(), UserStoreError>;
}
