use plume_engine::{db_types::User, JsonFileSink, UserStore, UserStoreError};
use serde_json::json;
use tempfile::tempdir;

#[tokio::test]
async fn users_round_trip_through_the_file() {
    let _ = env_logger::try_init().ok();
    let dir = tempdir().unwrap();
    let path = dir.path().join("data").join("users.json");

    let store = UserStore::load(JsonFileSink::new(&path)).await.expect("a missing file is an empty table");
    assert!(store.is_empty());
    let profile = json!({"email": "alice@example.com", "tags": ["a", "b"]}).as_object().cloned().unwrap();
    store.insert(User::new("alice", "$argon2id$fake").with_profile(profile)).await.unwrap();
    store.insert(User::new("bob", "$argon2id$other")).await.unwrap();
    assert!(!dir.path().join("data").join("users.json.tmp").exists());

    let reloaded = UserStore::load(JsonFileSink::new(&path)).await.unwrap();
    assert_eq!(reloaded.snapshot(), store.snapshot());
    assert_eq!(reloaded.lookup("alice").unwrap().profile["email"], "alice@example.com");
}

#[tokio::test]
async fn duplicate_insert_does_not_touch_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("users.json");
    let store = UserStore::load(JsonFileSink::new(&path)).await.unwrap();
    store.insert(User::new("alice", "$hash$1")).await.unwrap();
    let before = std::fs::read_to_string(&path).unwrap();
    let err = store.insert(User::new("alice", "$hash$2")).await.unwrap_err();
    assert!(matches!(err, UserStoreError::UsernameTaken(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn hand_written_files_are_accepted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("users.json");
    std::fs::write(&path, r#"{"dave": {"password": "$hash$dave", "role": "admin"}}"#).unwrap();
    let store = UserStore::load(JsonFileSink::new(&path)).await.unwrap();
    let dave = store.lookup("dave").unwrap();
    assert_eq!(dave.username, "dave");
    assert_eq!(dave.profile["role"], "admin");
}

#[tokio::test]
async fn corrupt_files_are_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("users.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();
    let err = UserStore::load(JsonFileSink::new(&path)).await.unwrap_err();
    assert!(matches!(err, UserStoreError::Deserialization(_)));
    let err = UserStore::load(JsonFileSink::new(dir.path())).await.unwrap_err();
    assert!(matches!(err, UserStoreError::NotAFile(_)));
}
