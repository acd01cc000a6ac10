use fleetdesk_core::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{RoleName, UserId};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: the user this token was issued to.
    pub sub: UserId,
    /// Username snapshot at issue time.
    pub username: String,
    /// Role snapshot at issue time.
    pub role: RoleName,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Credential verification failures.
///
/// The three variants stay distinguishable so callers can report an
/// actionable 401; they never collapse into a generic error before the
/// transport layer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// No bearer token was presented, or the header was malformed.
    #[error("missing bearer token")]
    Missing,

    /// Signature, format, or algorithm verification failed.
    #[error("invalid bearer token")]
    Invalid,

    /// The token was well-formed but its expiry claim is in the past.
    #[error("bearer token has expired")]
    Expired,
}

impl From<TokenError> for AppError {
    fn from(value: TokenError) -> Self {
        AppError::Unauthorized(value.to_string())
    }
}
