//! JWT issuance and verification
//!
//! Tokens are signed with HS256 over a server-held secret and carry the
//! subject user id plus issued-at and expiry claims. Verification returns a
//! tagged result distinguishing an elapsed expiry from every other defect, so
//! callers can surface the two as distinct error codes.

use anyhow::Result;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret used for both signing and verification
    pub secret: String,
    /// Token lifetime in seconds (default: 1 hour)
    pub ttl_secs: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: signing secret, required
    /// - `JWT_TTL_SECS`: token lifetime in seconds (default: 3600)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let ttl_secs = std::env::var("JWT_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);

        Ok(JwtConfig { secret, ttl_secs })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the user id the token was issued for
    pub sub: i64,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Verification failure kinds
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Signature checked out but the expiry has elapsed
    #[error("token expired")]
    Expired,
    /// Malformed token, bad signature, or otherwise unusable claims
    #[error("token invalid")]
    Invalid,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: &JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // No grace window: the expiry instant is the boundary.
        validation.leeway = 0;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            ttl_secs: config.ttl_secs,
        }
    }

    /// Issue a token whose subject is the given user id
    pub fn issue(&self, user_id: i64) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + self.ttl_secs,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }

    /// Token lifetime in seconds
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn service(secret: &str) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: secret.to_string(),
            ttl_secs: 3600,
        })
    }

    fn encode_with(secret: &str, claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    #[serial]
    fn test_jwt_config_from_env() {
        unsafe {
            std::env::set_var("JWT_SECRET", "env-secret");
            std::env::remove_var("JWT_TTL_SECS");
        }

        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.secret, "env-secret");
        assert_eq!(config.ttl_secs, 3600);

        unsafe {
            std::env::set_var("JWT_TTL_SECS", "60");
        }
        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.ttl_secs, 60);

        unsafe {
            std::env::remove_var("JWT_SECRET");
            std::env::remove_var("JWT_TTL_SECS");
        }
    }

    #[test]
    #[serial]
    fn test_jwt_config_missing_secret() {
        unsafe {
            std::env::remove_var("JWT_SECRET");
        }
        assert!(JwtConfig::from_env().is_err());
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let svc = service("test-secret");
        let token = svc.issue(42).unwrap();

        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);

        // Tokens stay usable until expiry, any number of times.
        let again = svc.verify(&token).unwrap();
        assert_eq!(again.sub, 42);
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service("test-secret");
        let now = now_secs();
        let token = encode_with(
            "test-secret",
            &Claims {
                sub: 42,
                iat: now - 7200,
                exp: now - 3600,
            },
        );

        assert_eq!(svc.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let svc = service("test-secret");
        let token = svc.issue(42).unwrap();

        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert_eq!(svc.verify(&tampered), Err(TokenError::Invalid));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = service("secret-one");
        let verifier = service("secret-two");
        let token = issuer.issue(42).unwrap();

        assert_eq!(verifier.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let svc = service("test-secret");
        assert_eq!(svc.verify("not.a.jwt"), Err(TokenError::Invalid));
        assert_eq!(svc.verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn test_expired_with_bad_signature_is_invalid() {
        // The signature is checked before the expiry claim is trusted.
        let svc = service("test-secret");
        let now = now_secs();
        let token = encode_with(
            "another-secret",
            &Claims {
                sub: 42,
                iat: now - 7200,
                exp: now - 3600,
            },
        );

        assert_eq!(svc.verify(&token), Err(TokenError::Invalid));
    }
}
