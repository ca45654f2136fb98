use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm,
    Argon2,
    Params,
    Version,
};
use log::*;

use crate::plume_api::errors::PasswordError;

/// Hashes and checks passwords. Hashes are opaque strings as far as the rest of the engine is concerned.
///
/// Both methods are CPU-bound; the auth RPCs call them from the blocking thread pool.
pub trait CredentialVerifier: Send + Sync + 'static {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;
    /// Returns true if `password` matches `hash`. A malformed hash never matches.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id with a random salt per hash, producing PHC strings (`$argon2id$v=19$...`).
#[derive(Clone)]
pub struct Argon2Verifier {
    argon2: Argon2<'static>,
}

impl Default for Argon2Verifier {
    fn default() -> Self {
        Self { argon2: Argon2::default() }
    }
}

impl Argon2Verifier {
    /// Use custom cost parameters, e.g. cheaper ones in tests.
    pub fn with_params(params: Params) -> Self {
        Self { argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) }
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(e) => {
                warn!("🔑️ Stored password hash could not be parsed. {e}");
                return false;
            },
        };
        self.argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    }
}
