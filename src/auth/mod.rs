use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::types::Identity;

/// Session token claims issued by the identity provider
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(identity: &Identity, expiry_hours: u64) -> Result<Self, JwtError> {
        let now = Utc::now();
        let expires_at = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| JwtError::TokenGeneration(format!("expiry of {} hours is out of range", expiry_hours)))?;

        Ok(Self {
            sub: identity.as_str().to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Token has no subject")]
    MissingSubject,

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Checks signature and expiry of identity-provider tokens. Who the
/// subject is stays the provider's business.
#[derive(Clone)]
pub struct IdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn new(secret: &str) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Identity, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

        let subject = token_data.claims.sub.trim();
        if subject.is_empty() {
            return Err(JwtError::MissingSubject);
        }
        Ok(Identity::new(subject))
    }
}

pub fn generate_jwt(secret: &str, claims: &Claims) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_tokens_it_can_decode() {
        let identity = Identity::new("user_2abc");
        let token = generate_jwt("secret", &Claims::new(&identity, 1).unwrap()).unwrap();
        let verifier = IdentityVerifier::new("secret").unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), identity);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = generate_jwt("secret", &Claims::new(&Identity::new("u"), 1).unwrap()).unwrap();
        let verifier = IdentityVerifier::new("other").unwrap();
        assert!(matches!(verifier.verify(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn rejects_expired_tokens() {
        let claims = Claims {
            sub: "u".to_string(),
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
        };
        let token = generate_jwt("secret", &claims).unwrap();
        let verifier = IdentityVerifier::new("secret").unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn rejects_blank_subject() {
        let token = generate_jwt("secret", &Claims::new(&Identity::new("  "), 1).unwrap()).unwrap();
        let verifier = IdentityVerifier::new("secret").unwrap();
        assert!(matches!(verifier.verify(&token), Err(JwtError::MissingSubject)));
    }

    #[test]
    fn out_of_range_expiry_is_an_error() {
        let identity = Identity::new("user_1");
        assert!(matches!(Claims::new(&identity, u64::MAX), Err(JwtError::TokenGeneration(_))));
        assert!(matches!(
            Claims::new(&identity, i64::MAX as u64),
            Err(JwtError::TokenGeneration(_))
        ));

        let year = Claims::new(&identity, 24 * 365).unwrap();
        assert_eq!(year.exp - year.iat, 24 * 365 * 3600);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(IdentityVerifier::new(""), Err(JwtError::InvalidSecret)));
    }
}
