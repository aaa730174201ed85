use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}

/// The caller identity a valid bearer token resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenIdentity {
    pub user_id: Uuid,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Signs and checks HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> jsonwebtoken::errors::Result<String> {
        let now = Utc::now();
        let exp = now + self.ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
    }

    /// `None` for anything that is not a well-formed, unexpired token we signed.
    pub fn verify(&self, token: &str) -> Option<TokenIdentity> {
        let token_data = match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "JWT decode error");
                return None;
            }
        };

        let claims = token_data.claims;
        Some(TokenIdentity {
            user_id: Uuid::parse_str(&claims.sub).ok()?,
            jti: Uuid::parse_str(&claims.jti).ok()?,
            expires_at: Utc.timestamp_opt(claims.exp as i64, 0).single()?,
        })
    }
}
