use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Token issuance lives in the auth collaborator; this service only ever
/// verifies what it is handed.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenType;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn mint(secret: &str, exp_offset: i64) -> String {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
        let claims = Claims {
            user_id: 1000,
            sub: "student1".into(),
            role: 3,
            exp: (now + exp_offset) as usize,
            jti: "test".into(),
            token_type: TokenType::Access,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn verifies_a_valid_token() {
        let token = mint("secret", 900);
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 1000);
        assert_eq!(claims.role, 3);
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let token = mint("secret", 900);
        assert!(verify_token(&token, "other").is_err());
        let expired = mint("secret", -900);
        assert!(verify_token(&expired, "secret").is_err());
    }
}
