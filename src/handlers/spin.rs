use crate::models::*;
use crate::services::{PrizeCatalogService, SpinService};
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/spin",
    tag = "wheel",
    request_body = SpinRequest,
    responses(
        (status = 200, description = "抽奖结果 (new / existing_active / already_redeemed / expired / cooldown)", body = SpinResult),
        (status = 400, description = "参数错误"),
        (status = 409, description = "手机号与设备指纹属于不同参与者"),
        (status = 503, description = "没有可抽取的奖品")
    )
)]
/// 转盘抽奖：同一参与者在有效码存在时重复请求返回相同结果
pub async fn spin(
    service: web::Data<SpinService>,
    payload: web::Json<SpinRequest>,
) -> Result<HttpResponse> {
    match service.spin(payload.into_inner()).await {
        Ok(result) => Ok(ApiResponse::ok(result)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/status",
    tag = "wheel",
    request_body = StatusRequest,
    responses(
        (status = 200, description = "当前状态 (只读)", body = SpinResult),
        (status = 400, description = "phone 与 device_fingerprint 均未提供")
    )
)]
/// 查询参与者当前状态，不抽奖也不写库
pub async fn status(
    service: web::Data<SpinService>,
    payload: web::Json<StatusRequest>,
) -> Result<HttpResponse> {
    match service.status(payload.into_inner()).await {
        Ok(result) => Ok(ApiResponse::ok(result)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/prizes",
    tag = "wheel",
    responses(
        (status = 200, description = "启用奖品列表 (转盘扇区顺序)", body = [PrizeResponse])
    )
)]
pub async fn list_prizes(service: web::Data<PrizeCatalogService>) -> Result<HttpResponse> {
    match service.list_active().await {
        Ok(list) => Ok(ApiResponse::ok(list)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "wheel",
    responses(
        (status = 200, description = "服务正常")
    )
)]
pub async fn health() -> HttpResponse {
    ApiResponse::ok(serde_json::json!({ "status": "ok" }))
}

/// 路由配置
pub fn wheel_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/spin", web::post().to(spin))
        .route("/status", web::post().to(status))
        .route("/prizes", web::get().to(list_prizes))
        .route("/health", web::get().to(health));
}
