//! HS256 access-token codec.
//!
//! One process-wide symmetric secret signs and verifies every token. The
//! accepted algorithm is pinned to HS256, so tokens that arrive with a
//! different `alg` header (including `none`) fail verification regardless
//! of their signature.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use fleetdesk_application::TokenCodec;
use fleetdesk_core::{AppError, AppResult};
use fleetdesk_domain::{AccessTokenClaims, TokenError};

/// Token codec backed by `jsonwebtoken` with an HS256 shared secret.
#[derive(Clone)]
pub struct Hs256TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Hs256TokenCodec {
    /// Creates a codec from the process-wide signing secret.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(&self, claims: &AccessTokenClaims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|error| AppError::Internal(format!("failed to sign access token: {error}")))
    }

    fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| match error.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
