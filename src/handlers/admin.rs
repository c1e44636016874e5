use crate::middlewares::get_admin_subject;
use crate::models::*;
use crate::services::{
    AdminAuthService, AnalyticsService, PrizeCatalogService, RedemptionService,
};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

/// 登录限流按客户端地址计数
fn client_address(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[utoipa::path(
    post,
    path = "/admin/login",
    tag = "admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "登录成功", body = AdminLoginResponse),
        (status = 401, description = "密码错误"),
        (status = 429, description = "失败次数过多")
    )
)]
pub async fn login(
    service: web::Data<AdminAuthService>,
    req: HttpRequest,
    payload: web::Json<AdminLoginRequest>,
) -> Result<HttpResponse> {
    let client = client_address(&req);
    match service.login(&client, &payload.password) {
        Ok(resp) => Ok(ApiResponse::ok(resp)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/redeem",
    tag = "admin",
    request_body = RedeemRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "核销结果 (redeemed / already_redeemed / expired / invalid)", body = RedeemResponse),
        (status = 401, description = "未授权")
    )
)]
/// 核销兑换码，并发请求中只有一个会成功
pub async fn redeem(
    service: web::Data<RedemptionService>,
    req: HttpRequest,
    payload: web::Json<RedeemRequest>,
) -> Result<HttpResponse> {
    let redeemed_by = get_admin_subject(&req).unwrap_or_else(|| "admin".to_string());
    match service.redeem(&payload.code, &redeemed_by).await {
        Ok(resp) => Ok(ApiResponse::ok(resp)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/prizes",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "全部奖品 (包含停用)", body = [AdminPrizeResponse]),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_prizes(service: web::Data<PrizeCatalogService>) -> Result<HttpResponse> {
    match service.list_all().await {
        Ok(list) => Ok(ApiResponse::ok(list)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/prizes",
    tag = "admin",
    request_body = ReplacePrizesRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "目录已替换", body = ReplacePrizesResponse),
        (status = 400, description = "目录不合法 (例如没有可抽取的奖品)"),
        (status = 404, description = "奖品 id 不存在"),
        (status = 401, description = "未授权")
    )
)]
/// 整体替换奖品目录；缺失的奖品只停用不删除
pub async fn replace_prizes(
    service: web::Data<PrizeCatalogService>,
    payload: web::Json<ReplacePrizesRequest>,
) -> Result<HttpResponse> {
    match service.replace_catalog(payload.into_inner()).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            summary,
            "Prize catalog updated".to_string(),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/prizes/{id}",
    tag = "admin",
    params(
        ("id" = i32, Path, description = "奖品 id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已删除"),
        (status = 404, description = "奖品不存在"),
        (status = 409, description = "奖品已被抽奖记录或兑换码引用"),
        (status = 401, description = "未授权")
    )
)]
pub async fn delete_prize(
    service: web::Data<PrizeCatalogService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    match service.delete_prize(id).await {
        Ok(()) => Ok(ApiResponse::ok(serde_json::json!({ "deleted": id }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/analytics",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "统计数据", body = AnalyticsResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn analytics(service: web::Data<AnalyticsService>) -> Result<HttpResponse> {
    match service.analytics().await {
        Ok(report) => Ok(ApiResponse::ok(report)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/redemptions",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "兑换历史", body = PaginatedResponse<RedemptionRecord>),
        (status = 401, description = "未授权")
    )
)]
pub async fn redemptions(
    service: web::Data<AnalyticsService>,
    query: web::Query<RedemptionQuery>,
) -> Result<HttpResponse> {
    match service.redemptions(&query.into_inner()).await {
        Ok(page) => Ok(ApiResponse::ok(page)),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/login", web::post().to(login))
            .route("/redeem", web::post().to(redeem))
            .route("/prizes", web::get().to(get_prizes))
            .route("/prizes", web::put().to(replace_prizes))
            .route("/prizes/{id}", web::delete().to(delete_prize))
            .route("/analytics", web::get().to(analytics))
            .route("/redemptions", web::get().to(redemptions)),
    );
}
