//! Salted password hashes in the `pbkdf2_sha256$<iterations>$<salt>$<hash>` format.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const ALGORITHM: &str = "pbkdf2_sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

#[cfg(not(test))]
const ITERATIONS: u32 = 260_000;
#[cfg(test)]
const ITERATIONS: u32 = 1_000;

/// Stored in place of a hash for accounts that cannot log in with a password.
pub const UNUSABLE_PASSWORD: &str = "!";

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let derived = derive(password.as_bytes(), &salt, ITERATIONS);
    format!(
        "{}${}${}${}",
        ALGORITHM,
        ITERATIONS,
        STANDARD.encode(salt),
        STANDARD.encode(derived)
    )
}

/// Check a password against a stored hash. Unusable or malformed hashes never match.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let parts: Vec<&str> = encoded.split('$').collect();
    let [algorithm, iterations, salt, expected] = parts.as_slice() else {
        return false;
    };
    if *algorithm != ALGORITHM {
        return false;
    }

    let (Ok(iterations), Ok(salt), Ok(expected)) = (
        iterations.parse::<u32>(),
        STANDARD.decode(salt),
        STANDARD.decode(expected),
    ) else {
        return false;
    };
    if iterations == 0 {
        return false;
    }

    let derived = derive(password.as_bytes(), &salt, iterations);
    derived[..].ct_eq(&expected[..]).into()
}

fn derive(password: &[u8], salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    out
}
