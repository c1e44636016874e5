use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::entities::CodeStatus;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::spin::spin,
        handlers::spin::status,
        handlers::spin::list_prizes,
        handlers::spin::health,
        handlers::admin::login,
        handlers::admin::redeem,
        handlers::admin::get_prizes,
        handlers::admin::replace_prizes,
        handlers::admin::delete_prize,
        handlers::admin::analytics,
        handlers::admin::redemptions,
    ),
    components(
        schemas(
            SpinRequest,
            StatusRequest,
            SpinOutcome,
            SpinResult,
            PrizeResponse,
            AdminPrizeResponse,
            PrizeInput,
            ReplacePrizesRequest,
            ReplacePrizesResponse,
            RedeemRequest,
            RedemptionOutcome,
            RedeemResponse,
            RedemptionRecord,
            RedemptionQuery,
            AdminLoginRequest,
            AdminLoginResponse,
            AnalyticsTotals,
            PrizeStats,
            RecentRedemption,
            AnalyticsResponse,
            CodeStatus,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "wheel", description = "Spin the wheel API"),
        (name = "admin", description = "Staff redemption and prize management API"),
    ),
    info(
        title = "Spin Wheel Backend API",
        version = "1.0.0",
        description = "Promotional prize wheel REST API documentation"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_wheel_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/spin", "/status", "/prizes", "/admin/redeem", "/admin/prizes/{id}"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
