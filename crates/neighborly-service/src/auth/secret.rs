//! Login codes and session tokens.
//!
//! Neither is stored in the clear: login codes are kept as the SHA-256 of
//! `email:code` and session tokens as the SHA-256 of the token, both hex
//! encoded. Randomness comes from the operating system.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Number of digits in a login code.
pub const LOGIN_CODE_DIGITS: usize = 6;

const SESSION_TOKEN_BYTES: usize = 32;

/// ## Summary
/// Generates a six digit numeric login code, zero padded.
#[must_use]
pub fn generate_login_code() -> String {
    let value = OsRng.next_u32() % 1_000_000;
    format!("{value:06}")
}

/// Hash under which a login code is stored. Binding the email means a code
/// issued to one address never matches another.
#[must_use]
pub fn hash_login_code(email: &str, code: &str) -> String {
    sha256_hex(format!("{email}:{}", code.trim()).as_bytes())
}

/// ## Summary
/// Generates an opaque session token: 32 random bytes, URL-safe base64.
#[must_use]
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[must_use]
pub fn hash_session_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

fn sha256_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}
