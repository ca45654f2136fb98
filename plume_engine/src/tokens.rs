//! Volatile session tokens. Nothing here survives a restart.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use log::*;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::db_types::TokenInfo;

/// Maps opaque token strings to the user they were issued to and when.
///
/// Tokens are random v4 UUIDs (122 bits of entropy), so collisions are not checked for. A token is never refreshed by
/// use: it lives exactly until [`TokenTable::revoke_expired`] sees it at or past its TTL.
#[derive(Debug, Default)]
pub struct TokenTable {
    tokens: RwLock<HashMap<String, TokenInfo>>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, username: &str) -> String {
        self.issue_at(username, Utc::now())
    }

    /// Issues a token with an explicit issue time.
    pub fn issue_at(&self, username: &str, issued_at: DateTime<Utc>) -> String {
        let token = Uuid::new_v4().to_string();
        let info = TokenInfo { username: username.to_string(), issued_at };
        self.tokens.write().insert(token.clone(), info);
        trace!("🎟️ Issued token for {username}");
        token
    }

    pub fn resolve(&self, token: &str) -> Option<TokenInfo> {
        self.tokens.read().get(token).cloned()
    }

    /// Drops every token for which `now - issued_at >= ttl` and returns how many went.
    pub fn revoke_expired(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let mut tokens = self.tokens.write();
        let before = tokens.len();
        tokens.retain(|_, info| !info.is_expired(now, ttl));
        before - tokens.len()
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn issued_tokens_resolve() {
        let table = TokenTable::new();
        let token = table.issue("alice");
        let info = table.resolve(&token).expect("token should resolve");
        assert_eq!(info.username, "alice");
        assert!(table.resolve("not-a-token").is_none());
    }

    #[test]
    fn tokens_are_distinct() {
        let table = TokenTable::new();
        let tokens = (0..1000).map(|_| table.issue("alice")).collect::<HashSet<_>>();
        assert_eq!(tokens.len(), 1000);
        assert_eq!(table.len(), 1000);
    }

    #[test]
    fn resolve_does_not_refresh() {
        let table = TokenTable::new();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let token = table.issue_at("alice", t0);
        let _ = table.resolve(&token);
        assert_eq!(table.resolve(&token).unwrap().issued_at, t0);
    }

    #[test]
    fn sweep_boundary() {
        let table = TokenTable::new();
        let ttl = Duration::minutes(15);
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let token = table.issue_at("alice", t0);
        assert_eq!(table.revoke_expired(t0 + ttl - Duration::seconds(1), ttl), 0);
        assert!(table.resolve(&token).is_some());
        assert_eq!(table.revoke_expired(t0 + ttl, ttl), 1);
        assert!(table.resolve(&token).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn sweep_only_takes_old_tokens() {
        let table = TokenTable::new();
        let ttl = Duration::minutes(15);
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let old = table.issue_at("alice", t0);
        let fresh = table.issue_at("bob", t0 + Duration::minutes(10));
        assert_eq!(table.revoke_expired(t0 + Duration::minutes(20), ttl), 1);
        assert!(table.resolve(&old).is_none());
        assert!(table.resolve(&fresh).is_some());
    }
}
