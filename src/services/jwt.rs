use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtService;

impl JwtService {
    pub fn generate_access_token(
        user_id: &ObjectId,
        name: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let expiry = Config::jwt_expiry();
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: user_id.to_hex(),
            name: name.to_string(),
            exp: now + expiry,
            iat: now,
        };

        let secret = Config::jwt_secret();
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let secret = Config::jwt_secret();

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_back_to_the_same_claims() {
        let user_id = ObjectId::new();
        let token = JwtService::generate_access_token(&user_id, "Dana").unwrap();
        let claims = JwtService::verify_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_hex());
        assert_eq!(claims.name, "Dana");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert!(JwtService::verify_token("not-a-token").is_err());
    }
}
