// Identity token payload decoding
//
// Claims are read WITHOUT verifying the signature. Tokens reach the manager
// either straight from the identity service over TLS or from a trusted
// seeding process; signature checks belong to the identity service and the
// resource servers. The claims are only used to key the cache and to decide
// when a token must be replaced.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, Validation};

use super::error::AuthError;
use super::types::IdentityClaims;

/// Seconds subtracted from a token's expiry so in-flight calls still succeed
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// Decode the payload of `token` without signature or claim validation
pub fn decode_claims(token: &str) -> Result<IdentityClaims, AuthError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(&[]),
        &validation,
    )?;
    Ok(data.claims)
}

/// Check whether `token` can still be used at `now` (UNIX seconds)
///
/// Undecodable tokens and tokens without an `exp` claim are never usable.
pub fn is_usable_at(token: &str, now: i64) -> bool {
    match decode_claims(token) {
        Ok(IdentityClaims { exp: Some(exp), .. }) => now + EXPIRY_BUFFER_SECS < exp,
        Ok(_) => false,
        Err(e) => {
            tracing::debug!("Cached token could not be decoded: {}", e);
            false
        }
    }
}

/// Check whether `token` can be used right now
pub fn is_usable(token: &str) -> bool {
    is_usable_at(token, Utc::now().timestamp())
}
