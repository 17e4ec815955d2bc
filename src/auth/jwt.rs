use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Claims issued by the identity provider. This service only verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub employee_id: u64,
    pub role: u8, // role id
    pub exp: usize,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("access token required".to_string());
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(token_type: TokenType, exp: usize, secret: &str) -> String {
        let claims = Claims {
            sub: "aiko".into(),
            employee_id: 1000,
            role: 2,
            exp,
            token_type,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn accepts_access_tokens() {
        let claims = verify_token(&token(TokenType::Access, far_future(), "s"), "s").unwrap();
        assert_eq!(claims.employee_id, 1000);
    }

    #[test]
    fn rejects_refresh_tokens_and_wrong_secrets() {
        assert!(verify_token(&token(TokenType::Refresh, far_future(), "s"), "s").is_err());
        assert!(verify_token(&token(TokenType::Access, far_future(), "s"), "other").is_err());
    }

    #[test]
    fn rejects_expired_tokens() {
        assert!(verify_token(&token(TokenType::Access, 1, "s"), "s").is_err());
    }
}
