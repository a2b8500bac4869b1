use std::time::Duration;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

/// Signs and verifies HS256 bearer tokens whose subject is a user id.
///
/// Access tokens and password-reset tokens use separate instances with separate
/// secrets, so one kind never verifies as the other.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn generate_token(&self, user_id: i64) -> anyhow::Result<String> {
        let exp = (chrono::Utc::now() + chrono::Duration::from_std(self.ttl)?).timestamp() as usize;
        let claims = Claims { sub: user_id.to_string(), exp };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify_token(&self, token: &str) -> anyhow::Result<i64> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims.sub.parse()?)
    }
}
