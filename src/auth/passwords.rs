//! Salted PBKDF2-SHA512 password digests.
//!
//! Stored form is `saltHex:derivedKeyHex`. The KDF is keyed on the hex
//! representation of the salt, which keeps digests interoperable with rows
//! written by earlier deployments of the portal.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;

const SALT_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 10_000;
const DERIVED_KEY_LEN: usize = 64;
const SEPARATOR: char = ':';

#[derive(Debug, Clone, Default)]
pub struct PasswordService;

impl PasswordService {
    pub fn new() -> Self {
        Self
    }

    /// Derives a fresh digest. A new random salt is drawn on every call, so
    /// hashing the same password twice yields two different digests.
    pub fn hash(&self, password: &str) -> String {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = hex::encode(salt_bytes);
        let key = derive_key(password, &salt);
        format!("{salt}{SEPARATOR}{key}")
    }

    /// Checks `password` against a stored digest. Malformed digests verify
    /// false; this never fails.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        let Some((salt, stored_key)) = digest.split_once(SEPARATOR) else {
            return false;
        };
        if salt.is_empty() || stored_key.is_empty() || stored_key.contains(SEPARATOR) {
            return false;
        }

        let candidate = derive_key(password, salt);
        constant_time_eq(candidate.as_bytes(), stored_key.as_bytes())
    }
}

fn derive_key(password: &str, salt: &str) -> String {
    let mut key = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut key);
    hex::encode(key)
}

/// Constant-time comparison to avoid timing side-channels.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}
