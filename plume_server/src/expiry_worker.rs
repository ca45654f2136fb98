use std::sync::Arc;

use chrono::{Duration, Utc};
use log::*;
use plume_engine::TokenTable;
use tokio::task::JoinHandle;

/// Starts the token expiry worker. It runs until the returned handle is aborted; do not await it.
pub fn start_expiry_worker(tokens: Arc<TokenTable>, ttl: Duration, period: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        info!("🕰️ Token expiry worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running token expiry job");
            let revoked = tokens.revoke_expired(Utc::now(), ttl);
            if revoked > 0 {
                info!("🕰️ {revoked} expired tokens revoked");
            }
        }
    })
}
