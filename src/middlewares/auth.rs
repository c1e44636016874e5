use crate::error::AppError;
use crate::utils::{Claims, JwtService};
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// 需要管理员令牌的路径配置
struct ProtectedPaths {
    prefix_paths: Vec<&'static str>,
    // 前缀下仍然公开的路径
    excluded_paths: Vec<&'static str>,
}

impl ProtectedPaths {
    fn new() -> Self {
        Self {
            prefix_paths: vec!["/api/admin/"],
            excluded_paths: vec!["/api/admin/login"],
        }
    }

    fn requires_admin(&self, path: &str) -> bool {
        if self.excluded_paths.contains(&path) {
            return false;
        }

        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            protected_paths: ProtectedPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    protected_paths: ProtectedPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        if !self.protected_paths.requires_admin(req.path()) {
            return Box::pin(self.service.call(req));
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        let Some(token) = token else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        // 无效 / 过期 -> 401，角色不符 -> 403
        match self.jwt_service.verify_admin_token(token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                Box::pin(self.service.call(req))
            }
            Err(error) => Box::pin(async move { Err(error.into()) }),
        }
    }
}

/// 获取当前管理员标识（中间件鉴权后注入）
pub fn get_admin_subject(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<Claims>().map(|c| c.sub.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        HttpResponse::Ok().body(get_admin_subject(&req).unwrap_or_default())
    }

    #[actix_web::test]
    async fn test_requires_admin() {
        let paths = ProtectedPaths::new();
        assert!(paths.requires_admin("/api/admin/prizes"));
        assert!(paths.requires_admin("/api/admin/prizes/3"));
        assert!(!paths.requires_admin("/api/admin/login"));
        assert!(!paths.requires_admin("/api/spin"));
        assert!(!paths.requires_admin("/api/prizes"));
    }

    #[actix_web::test]
    async fn test_guards_admin_routes() {
        let jwt = JwtService::new("secret", 60);
        let token = jwt.generate_admin_token().unwrap();
        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt.clone()))
                .route("/api/admin/whoami", web::get().to(whoami))
                .route("/api/prizes", web::get().to(whoami)),
        )
        .await;

        let open = test::TestRequest::get().uri("/api/prizes").to_request();
        assert_eq!(test::call_service(&app, open).await.status(), StatusCode::OK);

        let missing = test::TestRequest::get().uri("/api/admin/whoami").to_request();
        let err = test::try_call_service(&app, missing).await.unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        );

        let forged = test::TestRequest::get()
            .uri("/api/admin/whoami")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let err = test::try_call_service(&app, forged).await.unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        );

        let ok = test::TestRequest::get()
            .uri("/api/admin/whoami")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = test::call_and_read_body(&app, ok).await;
        assert_eq!(body, "admin");
    }
}
