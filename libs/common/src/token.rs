//! JWT service for token generation, validation, and revocation
//!
//! Tokens are signed with HS256 when `JWT_SECRET` is set, otherwise with
//! RS256 using PEM keys. Access tokens carry the identity the access policy
//! needs (role and verification flags); refresh tokens only carry the
//! subject. Revoked tokens are kept in a [`KeyValueStore`] until they expire.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::cache::KeyValueStore;
use crate::models::{Principal, Role, User};

/// Signing material for tokens
#[derive(Debug, Clone)]
pub enum JwtKeys {
    /// Shared secret (HS256)
    Secret(String),
    /// PEM keys (RS256); services that only validate omit the private key
    Rsa {
        private_key: Option<String>,
        public_key: String,
    },
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub keys: JwtKeys,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

/// Read a PEM value, or the file it points to
fn read_key(value: String) -> Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value);
    }

    let pem = std::fs::read_to_string(&value)
        .map_err(|e| anyhow::anyhow!("Failed to read key file {}: {}", value, e))?;
    Ok(pem.trim().to_string())
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Shared HS256 secret; takes precedence over the RSA keys
    /// - `JWT_PRIVATE_KEY`: RS256 private key (PEM or path), optional for validating services
    /// - `JWT_PUBLIC_KEY`: RS256 public key (PEM or path)
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let keys = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => JwtKeys::Secret(secret),
            _ => {
                let public_key = std::env::var("JWT_PUBLIC_KEY").map_err(|_| {
                    anyhow::anyhow!("Either JWT_SECRET or JWT_PUBLIC_KEY must be set")
                })?;
                let private_key = std::env::var("JWT_PRIVATE_KEY")
                    .ok()
                    .map(read_key)
                    .transpose()?;

                JwtKeys::Rsa {
                    private_key,
                    public_key: read_key(public_key)?,
                }
            }
        };

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604800);

        Ok(JwtConfig {
            keys,
            access_token_expiry,
            refresh_token_expiry,
        })
    }

    /// HS256 configuration with default expiries
    pub fn with_secret(secret: impl Into<String>) -> Self {
        JwtConfig {
            keys: JwtKeys::Secret(secret.into()),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        }
    }
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Unique token ID
    pub jti: Uuid,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub face_verified: bool,
    #[serde(default)]
    pub otp_verified: bool,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    pub token_type: TokenType,
}

impl Claims {
    /// Identity carried by an access token
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.sub,
            email: self.email.clone(),
            role: self.role,
            verified: self.verified,
            is_face_verified: self.face_verified,
            is_otp_verified: self.otp_verified,
        }
    }
}

fn now_seconds() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs())
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    algorithm: Algorithm,
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let (algorithm, encoding_key, decoding_key) = match &config.keys {
            JwtKeys::Secret(secret) => (
                Algorithm::HS256,
                Some(EncodingKey::from_secret(secret.as_bytes())),
                DecodingKey::from_secret(secret.as_bytes()),
            ),
            JwtKeys::Rsa {
                private_key,
                public_key,
            } => (
                Algorithm::RS256,
                private_key
                    .as_ref()
                    .map(|pem| EncodingKey::from_rsa_pem(pem.as_bytes()))
                    .transpose()?,
                DecodingKey::from_rsa_pem(public_key.as_bytes())?,
            ),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(JwtService {
            algorithm,
            encoding_key,
            decoding_key,
            validation,
            config,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        let key = self
            .encoding_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("This service has no signing key configured"))?;
        Ok(encode(&Header::new(self.algorithm), claims, key)?)
    }

    /// Generate an access token carrying the user's role and verification flags
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let now = now_seconds()?;
        self.sign(&Claims {
            sub: user.id,
            jti: Uuid::new_v4(),
            email: user.email.clone(),
            role: user.role,
            verified: user.verified,
            face_verified: user.is_face_verified,
            otp_verified: user.is_otp_verified,
            iat: now,
            exp: now + self.config.access_token_expiry,
            token_type: TokenType::Access,
        })
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user: &User) -> Result<String> {
        let now = now_seconds()?;
        self.sign(&Claims {
            sub: user.id,
            jti: Uuid::new_v4(),
            email: String::new(),
            role: None,
            verified: false,
            face_verified: false,
            otp_verified: false,
            iat: now,
            exp: now + self.config.refresh_token_expiry,
            token_type: TokenType::Refresh,
        })
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Check if a token has been revoked
    pub async fn is_revoked(&self, store: &dyn KeyValueStore, token: &str) -> Result<bool> {
        let result = store.get(&revocation_key(token)).await?;
        Ok(result.is_some())
    }

    /// Revoke a token for the rest of its lifetime
    pub async fn revoke(&self, store: &dyn KeyValueStore, claims: &Claims, token: &str) -> Result<()> {
        let remaining = claims.exp.saturating_sub(now_seconds()?);
        if remaining == 0 {
            return Ok(());
        }
        store.set(&revocation_key(token), "1", Some(remaining)).await
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }
}

fn revocation_key(token: &str) -> String {
    format!("revoked_token:{}", token)
}
