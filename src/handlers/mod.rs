pub mod admin;
pub mod spin;

pub use admin::admin_config;
pub use spin::wheel_config;

use crate::error::AppError;
use actix_web::web;

/// `/api` 下的全部路由
pub fn api_config(cfg: &mut web::ServiceConfig) {
    // 请求体解析失败统一返回 400 + 错误包装
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .configure(wheel_config)
    .configure(admin_config);
}
