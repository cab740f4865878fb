use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Session token payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

/// Signs and verifies session tokens with the process-wide secret. Rotating
/// the secret invalidates every outstanding token.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
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

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Decodes a token and returns its subject. Malformed tokens, bad
    /// signatures, expiry, and a missing subject all fail the same way.
    pub fn verify(&self, token: &str) -> anyhow::Result<Uuid> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SessionKeys {
        SessionKeys::new("test-secret", Duration::days(7))
    }

    #[test]
    fn issue_then_verify_returns_subject() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("issue");
        assert_eq!(keys.verify(&token).expect("verify"), user_id);
    }

    #[test]
    fn rejects_garbage() {
        assert!(keys().verify("not-a-token").is_err());
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = keys().issue(Uuid::new_v4()).expect("issue");
        let other = SessionKeys::new("other-secret", Duration::days(7));
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let expired = SessionKeys::new("test-secret", Duration::minutes(-5));
        let token = expired.issue(Uuid::new_v4()).expect("issue");
        assert!(expired.verify(&token).is_err());
    }

    #[test]
    fn rejects_token_without_subject() {
        #[derive(Serialize)]
        struct NoSub {
            iat: usize,
            exp: usize,
        }
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let token = encode(
            &Header::default(),
            &NoSub {
                iat: now,
                exp: now + 600,
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .expect("encode");
        assert!(keys().verify(&token).is_err());
    }
}
