use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a gateway-issued access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: u64,       // user id, as reported by the users service
    pub email: String, // user email at issue time
    pub iat: i64,      // issued at (unix seconds)
    pub exp: i64,      // expiration (unix seconds)
}

/// Issues and verifies HS256 access tokens.
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: i64,
}

impl AuthManager {
    pub fn new(secret: &str, token_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_secs,
        }
    }

    /// Issue a token for a verified user identity.
    pub fn issue(&self, id: u64, email: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.token_ttl_secs);

        let claims = Claims {
            id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to encode JWT token")
    }

    /// Verify a token and return its claims.
    ///
    /// Signature and expiry failures are not distinguished here; the HTTP
    /// layer reports both as "Invalid or expired token".
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: a token is invalid the second its window ends
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}
