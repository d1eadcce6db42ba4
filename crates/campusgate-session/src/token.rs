//! Session token generation
//!
//! Tokens carry 256 bits from the operating system's CSPRNG, encoded as
//! URL-safe base64 without padding (43 characters).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use campusgate_core::{Error, Result};
use rand::TryRngCore;
use rand::rngs::OsRng;

const TOKEN_BYTES: usize = 32;

/// Generate an unguessable session token
pub fn generate_secure_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::TokenGeneration(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
