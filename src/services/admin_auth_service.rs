use crate::error::{AppError, AppResult};
use crate::models::AdminLoginResponse;
use crate::utils::{AdminCredentials, JwtService, LoginThrottle};

#[derive(Clone)]
pub struct AdminAuthService {
    jwt_service: JwtService,
    credentials: AdminCredentials,
    throttle: LoginThrottle,
}

impl AdminAuthService {
    pub fn new(
        jwt_service: JwtService,
        credentials: AdminCredentials,
        throttle: LoginThrottle,
    ) -> Self {
        Self {
            jwt_service,
            credentials,
            throttle,
        }
    }

    /// 管理员登录，按客户端地址限制失败次数
    pub fn login(&self, client: &str, password: &str) -> AppResult<AdminLoginResponse> {
        self.throttle.check(client)?;

        if !self.credentials.is_configured() {
            log::error!("Admin login attempted but no admin password is configured");
            return Err(AppError::AuthError("Admin login is not configured".into()));
        }

        if !self.credentials.verify(password) {
            self.throttle.record_failure(client);
            log::warn!("Failed admin login from {client}");
            return Err(AppError::AuthError("Invalid password".into()));
        }

        self.throttle.clear(client);
        log::info!("Admin logged in from {client}");

        Ok(AdminLoginResponse {
            token: self.jwt_service.generate_admin_token()?,
            expires_in: self.jwt_service.get_admin_token_expires_in(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ADMIN_ROLE;
    use std::time::Duration;

    fn service(max_attempts: usize) -> AdminAuthService {
        AdminAuthService::new(
            JwtService::new("test-secret", 3600),
            AdminCredentials::new(Some("letmein".into()), None),
            LoginThrottle::new(max_attempts, Duration::from_secs(900)),
        )
    }

    #[test]
    fn test_login_issues_admin_token() {
        let svc = service(5);
        let resp = svc.login("10.0.0.1", "letmein").unwrap();
        assert_eq!(resp.expires_in, 3600);

        let claims = JwtService::new("test-secret", 3600)
            .verify_admin_token(&resp.token)
            .unwrap();
        assert_eq!(claims.role, ADMIN_ROLE);
    }

    #[test]
    fn test_throttle_after_repeated_failures() {
        let svc = service(3);
        for _ in 0..3 {
            assert!(matches!(
                svc.login("10.0.0.1", "wrong"),
                Err(AppError::AuthError(_))
            ));
        }
        // 密码正确也被拒绝
        assert!(matches!(
            svc.login("10.0.0.1", "letmein"),
            Err(AppError::RateLimited { .. })
        ));
        // 其它地址不受影响
        assert!(svc.login("10.0.0.2", "letmein").is_ok());
    }

    #[test]
    fn test_success_clears_failures() {
        let svc = service(3);
        svc.login("10.0.0.1", "wrong").unwrap_err();
        svc.login("10.0.0.1", "wrong").unwrap_err();
        svc.login("10.0.0.1", "letmein").unwrap();
        svc.login("10.0.0.1", "wrong").unwrap_err();
        svc.login("10.0.0.1", "wrong").unwrap_err();
        assert!(svc.login("10.0.0.1", "letmein").is_ok());
    }

    #[test]
    fn test_unconfigured_password_rejects() {
        let svc = AdminAuthService::new(
            JwtService::new("s", 60),
            AdminCredentials::new(None, None),
            LoginThrottle::new(5, Duration::from_secs(60)),
        );
        assert!(matches!(svc.login("ip", ""), Err(AppError::AuthError(_))));
    }
}
