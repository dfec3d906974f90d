//! Stateless signed tokens: the 8-hour session credential and the
//! single-purpose 15-minute password-reset credential.
//!
//! The process-wide signing secret is the sole trust root. There is no
//! revocation list; a session token stays valid until natural expiry, which
//! is why the authorization engine re-checks live identity state on every
//! request instead of trusting token claims beyond the identity id.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const RESET_PURPOSE: &str = "reset";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, expired and malformed all collapse here. Callers must
    /// never learn which one it was, since that would be a verification
    /// oracle.
    #[error("Invalid token")]
    Invalid,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Claims carried by a session token. Only the identity id is trusted as
/// authorization input; the admin flag is a routing hint re-validated against
/// the live record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity id.
    pub sub: String,

    /// Admin flag at issuance time.
    pub adm: bool,

    pub iat: i64,

    pub exp: i64,
}

/// Claims carried by a password-reset token. The purpose marker is what
/// keeps a session token from being replayed as a reset credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResetClaims {
    sub: String,

    purpose: String,

    iat: i64,

    exp: i64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    session_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &str, session_ttl: Duration, reset_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: a token is good at exp-1s and rejected at exp+1s.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            session_ttl,
            reset_ttl,
        }
    }

    pub fn issue_session(&self, identity_id: &str, is_admin: bool) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: identity_id.to_string(),
            adm: is_admin,
            iat: now.timestamp(),
            exp: (now + self.session_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Invalid)?;
        Ok(data.claims)
    }

    pub fn issue_reset_token(&self, identity_id: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = ResetClaims {
            sub: identity_id.to_string(),
            purpose: RESET_PURPOSE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.reset_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies a reset token and returns the identity id it was issued for.
    /// Signature, expiry and the purpose marker must all hold.
    pub fn verify_reset_token(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<ResetClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        if data.claims.purpose != RESET_PURPOSE {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims.sub)
    }
}
