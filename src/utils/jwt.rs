use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    admin_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, admin_token_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            admin_token_expires_in,
        }
    }

    pub fn generate_admin_token(&self) -> AppResult<String> {
        self.generate_token("admin", ADMIN_ROLE)
    }

    fn generate_token(&self, sub: &str, role: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.admin_token_expires_in);

        let claims = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    /// 校验签名与过期时间
    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    /// 签名有效但角色不是 admin -> Forbidden
    pub fn verify_admin_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.role != ADMIN_ROLE {
            return Err(AppError::Forbidden);
        }

        Ok(claims)
    }

    pub fn get_admin_token_expires_in(&self) -> i64 {
        self.admin_token_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_token_round_trip() {
        let jwt = JwtService::new("secret", 60);
        let token = jwt.generate_admin_token().unwrap();
        let claims = jwt.verify_admin_token(&token).unwrap();
        assert_eq!(claims.role, ADMIN_ROLE);
        assert_eq!(claims.sub, "admin");
    }

    #[test]
    fn test_wrong_role_is_forbidden() {
        let jwt = JwtService::new("secret", 60);
        let token = jwt.generate_token("guest", "viewer").unwrap();
        assert!(matches!(
            jwt.verify_admin_token(&token),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = JwtService::new("secret", 60).generate_admin_token().unwrap();
        let other = JwtService::new("other", 60);
        assert!(matches!(
            other.verify_admin_token(&token),
            Err(AppError::JwtError(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // 超过默认 60s leeway
        let jwt = JwtService::new("secret", -3600);
        let token = jwt.generate_admin_token().unwrap();
        assert!(matches!(
            jwt.verify_admin_token(&token),
            Err(AppError::JwtError(_))
        ));
    }
}
