use crate::config::Config;
use crate::external::TwilioService;
use crate::services::*;
use crate::utils::{AdminCredentials, JwtService, LoginThrottle};
use actix_web::web;
use sea_orm::DatabaseConnection;
use std::time::Duration;

/// 进程内共享的服务集合，main 与集成测试共用同一套装配
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: JwtService,
    pub spin_service: SpinService,
    pub redemption_service: RedemptionService,
    pub prize_catalog_service: PrizeCatalogService,
    pub admin_auth_service: AdminAuthService,
    pub analytics_service: AnalyticsService,
}

impl AppState {
    pub fn new(pool: DatabaseConnection, config: &Config) -> Self {
        let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.admin_token_expires_in);

        let credentials = AdminCredentials::from_config(&config.admin);
        if !credentials.is_configured() {
            log::warn!("No admin password configured, admin login is disabled");
        }
        let throttle = LoginThrottle::new(
            config.admin.login_max_attempts,
            Duration::from_secs(config.admin.login_window_secs),
        );

        let spin_service = SpinService::new(
            pool.clone(),
            config.wheel.spin_policy(),
            CodeIssuer::new(config.wheel.code_length, config.wheel.code_max_attempts),
            TwilioService::new(config.twilio.clone()),
        );

        Self {
            admin_auth_service: AdminAuthService::new(jwt_service.clone(), credentials, throttle),
            jwt_service,
            spin_service,
            redemption_service: RedemptionService::new(pool.clone()),
            prize_catalog_service: PrizeCatalogService::new(pool.clone()),
            analytics_service: AnalyticsService::new(pool),
        }
    }

    /// 注册为 actix app_data
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.spin_service.clone()))
            .app_data(web::Data::new(self.redemption_service.clone()))
            .app_data(web::Data::new(self.prize_catalog_service.clone()))
            .app_data(web::Data::new(self.admin_auth_service.clone()))
            .app_data(web::Data::new(self.analytics_service.clone()));
    }
}
