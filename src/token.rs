//! Access token inspection
//!
//! Tokens are compact `header.payload.signature` strings. The client never
//! verifies signatures; it only reads the `exp` claim to decide whether a
//! token is still worth sending.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Utc};

use taskman_protocol::Claims;

/// Tokens expiring within this window are treated as already expired.
pub const EXPIRY_MARGIN_MS: i64 = 300_000;

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode the payload segment of a compact token.
///
/// The segment is base64url; it is mapped onto the standard alphabet before
/// decoding and padding is optional. Returns `None` on any failure.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    let standard: String = payload
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let bytes = PAYLOAD_ENGINE.decode(standard.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Expiry of a token in milliseconds since the epoch, if it has one.
pub fn expires_at_ms(token: &str) -> Option<i64> {
    let exp = decode_claims(token)?.exp?;
    if !exp.is_finite() || exp <= 0.0 {
        return None;
    }
    Some((exp * 1000.0) as i64)
}

/// Expiry of a token as a timestamp, for display.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(expires_at_ms(token)?)
}

/// True when the token is absent, unreadable, has no `exp`, or expires within
/// five minutes of `now`.
pub fn is_expired_or_expiring_soon_at(token: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(token) = token else {
        return true;
    };
    match expires_at_ms(token) {
        Some(exp_ms) => exp_ms - now.timestamp_millis() < EXPIRY_MARGIN_MS,
        None => true,
    }
}

pub fn is_expired_or_expiring_soon(token: Option<&str>) -> bool {
    is_expired_or_expiring_soon_at(token, Utc::now())
}

/// True when the token carries an `exp` strictly in the future (no margin).
pub fn is_unexpired_at(token: &str, now: DateTime<Utc>) -> bool {
    expires_at_ms(token).is_some_and(|exp_ms| exp_ms > now.timestamp_millis())
}
