//! Webhook authentication: a shared bearer secret.
//!
//! The platform is configured to attach the secret to every delivery.
//! Tokens are compared through fixed-length SHA-256 digests so the
//! comparison does not leak the match position.

use axum::http::{HeaderMap, header};
use sha2::{Digest as _, Sha256};

use crate::error::Error;

/// Webhook credential, shared between Tally and the delivery configuration.
#[derive(Clone)]
pub struct AuthConfig {
  pub secret: String,
}

fn digest(s: &str) -> [u8; 32] {
  Sha256::digest(s.as_bytes()).into()
}

/// Check the `Authorization: Bearer …` header against the configured secret.
pub fn verify_bearer(headers: &HeaderMap, auth: &AuthConfig) -> Result<(), Error> {
  let presented = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .ok_or(Error::Unauthorized)?;

  if digest(presented) == digest(&auth.secret) {
    Ok(())
  } else {
    Err(Error::Unauthorized)
  }
}
