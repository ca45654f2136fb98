//! The authoritative, in-memory user table and its write-through persistence.

use std::fmt::Debug;

use log::*;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::{
    db_types::{User, UserTable},
    plume_api::errors::UserStoreError,
    UserSink,
};

/// Holds every user record in memory and writes the whole table through to a [`UserSink`] after each change.
///
/// Reads never wait on the sink. Writes are serialized: the snapshot handed to the sink is taken while holding the
/// write lock, so a later write always includes everything an earlier one did.
pub struct UserStore<S> {
    users: RwLock<UserTable>,
    sink: S,
    write_lock: Mutex<()>,
}

impl<S: Debug> Debug for UserStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserStore ({} users, {:?})", self.users.read().len(), self.sink)
    }
}

impl<S> UserStore<S>
where S: UserSink
{
    /// Loads the table from `sink`. Records must have a non-empty password hash; a record with no `username` field
    /// takes its key as the username.
    pub async fn load(sink: S) -> Result<Self, UserStoreError> {
        let table = sink.load().await?;
        let users = validate_table(table)?;
        info!("👥️ User store ready with {} users", users.len());
        Ok(Self { users: RwLock::new(users), sink, write_lock: Mutex::new(()) })
    }

    pub fn lookup(&self, username: &str) -> Option<User> {
        self.users.read().get(username).cloned()
    }

    pub fn exists(&self, username: &str) -> bool {
        self.users.read().contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    pub fn snapshot(&self) -> UserTable {
        self.users.read().clone()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Adds a new user and persists the table. Fails with [`UserStoreError::UsernameTaken`] if the username is
    /// already present. If the sink write fails, the user is removed again and the sink's error is returned.
    pub async fn insert(&self, user: User) -> Result<(), UserStoreError> {
        let _guard = self.write_lock.lock().await;
        let username = user.username.clone();
        let snapshot = {
            let mut users = self.users.write();
            if users.contains_key(&username) {
                return Err(UserStoreError::UsernameTaken(username));
            }
            users.insert(username.clone(), user);
            users.clone()
        };
        if let Err(e) = self.sink.persist(&snapshot).await {
            error!("👥️ Could not persist new user {username}. Rolling back. {e}");
            self.users.write().remove(&username);
            return Err(e);
        }
        debug!("👥️ Added user {username}");
        Ok(())
    }

    /// Removes a user and persists the table. Tokens already issued to the user are left alone; they become zombies
    /// and are turned away by the dispatcher.
    pub async fn remove(&self, username: &str) -> Result<Option<User>, UserStoreError> {
        let _guard = self.write_lock.lock().await;
        let (removed, snapshot) = {
            let mut users = self.users.write();
            let removed = users.remove(username);
            (removed, users.clone())
        };
        let Some(user) = removed else {
            return Ok(None);
        };
        if let Err(e) = self.sink.persist(&snapshot).await {
            error!("👥️ Could not persist removal of user {username}. Rolling back. {e}");
            self.users.write().insert(username.to_string(), user);
            return Err(e);
        }
        info!("👥️ Removed user {username}");
        Ok(Some(user))
    }
}

fn validate_table(table: UserTable) -> Result<UserTable, UserStoreError> {
    table
        .into_iter()
        .map(|(key, mut user)| {
            if key.is_empty() {
                return Err(UserStoreError::InvalidRecord(key, "empty username".into()));
            }
            if user.password.is_empty() {
                return Err(UserStoreError::InvalidRecord(key, "missing password hash".into()));
            }
            if user.username != key {
                if !user.username.is_empty() {
                    warn!("👥️ User record '{key}' carries username '{}'. Using the key.", user.username);
                }
                user.username = key.clone();
            }
            Ok((key, user))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use mockall::mock;

    use super::*;
    use crate::MemorySink;

    mock! {
        pub FailingSink {}
        impl UserSink for FailingSink {
            async fn load(&self) -> Result<UserTable, UserStoreError>;
            async fn persist(&self, users: &UserTable) -> Result<(), UserStoreError>;
        }
    }

    fn seeded() -> UserTable {
        let mut users = UserTable::new();
        users.insert("bob".into(), User::new("bob", "$hash$bob"));
        users
    }

    #[tokio::test]
    async fn insert_then_lookup() {
        let sink = MemorySink::new();
        let store = UserStore::load(sink.clone()).await.unwrap();
        assert!(store.is_empty());
        store.insert(User::new("alice", "$hash$alice")).await.unwrap();
        assert!(store.exists("alice"));
        assert_eq!(store.lookup("alice").unwrap().password, "$hash$alice");
        assert_eq!(sink.write_count(), 1);
        assert_eq!(sink.contents(), store.snapshot());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected_without_a_write() {
        let sink = MemorySink::with_users(seeded());
        let store = UserStore::load(sink.clone()).await.unwrap();
        let err = store.insert(User::new("bob", "$other")).await.unwrap_err();
        assert!(matches!(err, UserStoreError::UsernameTaken(ref u) if u == "bob"));
        assert_eq!(store.lookup("bob").unwrap().password, "$hash$bob");
        assert_eq!(sink.write_count(), 0);
    }

    #[tokio::test]
    async fn remove_persists() {
        let sink = MemorySink::with_users(seeded());
        let store = UserStore::load(sink.clone()).await.unwrap();
        assert!(store.remove("bob").await.unwrap().is_some());
        assert!(store.remove("bob").await.unwrap().is_none());
        assert!(!store.exists("bob"));
        assert!(sink.contents().is_empty());
        assert_eq!(sink.write_count(), 1);
    }

    #[tokio::test]
    async fn failed_write_rolls_back_insert() {
        let _ = env_logger::try_init().ok();
        let mut sink = MockFailingSink::new();
        sink.expect_load().returning(|| Ok(UserTable::new()));
        sink.expect_persist()
            .returning(|_| Err(UserStoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))));
        let store = UserStore::load(sink).await.unwrap();
        let err = store.insert(User::new("alice", "$hash")).await.unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(!store.exists("alice"));
    }

    #[tokio::test]
    async fn records_without_a_hash_are_fatal() {
        let mut users = seeded();
        users.insert("mallory".into(), User::new("mallory", ""));
        let err = UserStore::load(MemorySink::with_users(users)).await.unwrap_err();
        assert!(matches!(err, UserStoreError::InvalidRecord(ref k, _) if k == "mallory"));
    }

    #[tokio::test]
    async fn missing_username_takes_the_key() {
        let mut users = UserTable::new();
        users.insert("carol".into(), User::new("", "$hash$carol"));
        let store = UserStore::load(MemorySink::with_users(users)).await.unwrap();
        assert_eq!(store.lookup("carol").unwrap().username, "carol");
    }
}
