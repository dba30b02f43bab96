//! Bearer-token issue/decode.
//!
//! Tokens are HS256 JWTs: three dot-separated URL-safe segments with the
//! signature verified over header+payload before any claim is trusted.
//! Decoding is tolerant (any malformed or tampered input yields `None`) and
//! deliberately does NOT check expiry; that comparison belongs to the
//! session verifier so the codec stays a pure wire concern.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::models::Role;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct TokenClaims {
    sub: String,
    exp: i64,
    iat: i64,
    /// Advisory only; the verifier always re-reads the role from the store.
    role: String,
    /// Advisory only, carried for client convenience.
    email: String,
}

/// Decoded token payload. Only `subject_id` and `exp` are authoritative
/// inputs to verification; `role` is advisory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    pub subject_id: i32,
    pub exp: i64,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is the verifier's job; keep `exp` required but unchecked here.
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(
        &self,
        subject_id: i32,
        role: Role,
        email: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let expires_at = now + ttl;

        let claims = TokenClaims {
            sub: subject_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            role: role.as_str().to_string(),
            email: email.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Tolerant decode: wrong segment count, bad signature, undecodable
    /// segments or missing claims all yield `None`.
    pub fn decode(&self, token: &str) -> Option<TokenPayload> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).ok()?;
        let subject_id = data.claims.sub.parse::<i32>().ok()?;
        Some(TokenPayload {
            subject_id,
            exp: data.claims.exp,
            role: data.claims.role,
        })
    }
}
