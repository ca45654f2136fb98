mod password;

pub use password::{Argon2Verifier, CredentialVerifier};
