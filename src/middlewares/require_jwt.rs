/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <token>` 中的访问令牌，并把对应的用户写入请求扩展。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * use actix_web::web;
 * use crate::middlewares::RequireJWT;
 *
 * web::scope("/api/v1/classes")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_classes));
 * ```
 *
 * 处理程序中通过 `RequireJWT::extract_user_claims(&req)` 或
 * `RequireJWT::extract_user_id(&req)` 取得当前用户。
 *
 * ## 认证流程
 *
 * 1. 提取并校验令牌签名、有效期与类型
 * 2. 按令牌查询缓存中的用户，未命中时从存储读取
 * 3. 用户不存在或状态不是 active 时返回 401
 *
 * 令牌签发不在本服务内，这里只做校验。
 */

use crate::cache::{ObjectCache, traits};
use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::models::users::entities::{User, UserStatus};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, error, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

fn user_cache_key(token: &str) -> String {
    format!("user:{token}")
}

// 提取请求头中的 Bearer token
fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// 提取并验证 JWT access token，返回当前用户
async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<User, String> {
    let token = bearer_token(req)
        .ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let claims = JwtUtils::verify_access_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid JWT token".to_string()
    })?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone());

    // 优先使用缓存中的用户
    if let Some(ref cache) = cache
        && let Some(user) = traits::get_json::<User>(cache.as_ref(), &user_cache_key(token)).await
    {
        return Ok(user);
    }

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not found in app data");
            "Authentication backend unavailable".to_string()
        })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| "Invalid user ID in JWT".to_string())?;

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|_| "Failed to retrieve user from storage".to_string())?
        .ok_or_else(|| "User not found".to_string())?;

    if user.status != UserStatus::Active {
        return Err("User is not active".to_string());
    }

    if let Some(cache) = cache {
        traits::insert_json(
            cache.as_ref(),
            user_cache_key(token),
            &user,
            AppConfig::get().cache.default_ttl,
        )
        .await;
    }

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 预检请求直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(
                    req.into_response(HttpResponse::NoContent().finish().map_into_right_body())
                );
            }

            match extract_and_validate_jwt(&req).await {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 辅助函数：从请求中提取用户信息
impl RequireJWT {
    /// 从请求扩展中提取当前用户
    /// 此函数应该在应用了RequireJWT中间件的路由处理程序中使用
    pub fn extract_user_claims(req: &actix_web::HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    /// 从请求扩展中提取用户ID
    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::models::users::requests::UpdateUserRequest;
    use crate::services::classes::test_support::student as seed_student;
    use crate::storage::sea_orm_storage::test_support as db;
    use actix_web::{App, HttpRequest, test};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match RequireJWT::extract_user_claims(&req) {
            Some(user) => HttpResponse::Ok().json(serde_json::json!({ "id": user.id })),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    fn token_for(user: &User) -> String {
        JwtUtils::generate_access_token(user.id, &user.role.to_string()).unwrap()
    }

    async fn backends() -> (Arc<dyn Storage>, Arc<dyn ObjectCache>) {
        let storage: Arc<dyn Storage> = Arc::new(db::memory_storage().await);
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::new(100, 300));
        (storage, cache)
    }

    macro_rules! jwt_app {
        ($storage:expr, $cache:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($storage.clone()))
                    .app_data(web::Data::new($cache.clone()))
                    .service(
                        web::scope("/api")
                            .wrap(RequireJWT)
                            .route("/whoami", web::get().to(whoami)),
                    ),
            )
            .await
        };
    }

    macro_rules! get_whoami {
        ($app:expr, $token:expr) => {{
            let token: Option<&str> = $token;
            let mut req = test::TestRequest::get().uri("/api/whoami");
            if let Some(token) = token {
                req = req.insert_header((AUTHORIZATION_HEADER, format!("{BEARER_PREFIX}{token}")));
            }
            let resp = test::call_service(&$app, req.to_request()).await;
            let status = resp.status();
            let body: serde_json::Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    #[actix_web::test]
    async fn test_missing_or_malformed_header_is_unauthorized() {
        let (storage, cache) = backends().await;
        let app = jwt_app!(storage, cache);

        let (status, body) = get_whoami!(app, None);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], ErrorCode::Unauthorized as i32);

        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header((AUTHORIZATION_HEADER, "Basic abc"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_invalid_tokens_are_unauthorized() {
        let (storage, cache) = backends().await;
        let student = seed_student(&storage, "Ada Lovelace").await;
        let app = jwt_app!(storage, cache);

        let (status, _) = get_whoami!(app, Some("not-a-jwt"));
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let foreign = JwtUtils::generate_with_secret(
            "some-other-secret",
            student.id,
            "student",
            chrono::Duration::minutes(5),
        )
        .unwrap();
        let (status, _) = get_whoami!(app, Some(foreign.as_str()));
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let expired = JwtUtils::generate_with_secret(
            &AppConfig::get().jwt.secret,
            student.id,
            "student",
            chrono::Duration::minutes(-10),
        )
        .unwrap();
        let (status, _) = get_whoami!(app, Some(expired.as_str()));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_valid_token_attaches_user() {
        let (storage, cache) = backends().await;
        let student = seed_student(&storage, "Ada Lovelace").await;
        let app = jwt_app!(storage, cache);

        let token = token_for(&student);
        let (status, body) = get_whoami!(app, Some(token.as_str()));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], student.id);
    }

    #[actix_web::test]
    async fn test_unknown_or_suspended_user_is_unauthorized() {
        let (storage, cache) = backends().await;
        let student = seed_student(&storage, "Ada Lovelace").await;
        let app = jwt_app!(storage, cache);

        let ghost = JwtUtils::generate_access_token(9999, "student").unwrap();
        let (status, _) = get_whoami!(app, Some(ghost.as_str()));
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        storage
            .update_user(
                student.id,
                UpdateUserRequest {
                    status: Some(UserStatus::Suspended),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let token = token_for(&student);
        let (status, body) = get_whoami!(app, Some(token.as_str()));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], ErrorCode::Unauthorized as i32);
    }

    #[actix_web::test]
    async fn test_verified_user_served_from_cache() {
        let (storage, cache) = backends().await;
        let student = seed_student(&storage, "Ada Lovelace").await;
        let token = token_for(&student);
        let app = jwt_app!(storage, cache);

        let (status, _) = get_whoami!(app, Some(token.as_str()));
        assert_eq!(status, StatusCode::OK);
        assert!(
            traits::get_json::<User>(cache.as_ref(), &user_cache_key(&token))
                .await
                .is_some()
        );

        // 缓存有效期内即使用户已删除，同一令牌仍按缓存放行
        assert!(storage.delete_user(student.id).await.unwrap());
        let (status, body) = get_whoami!(app, Some(token.as_str()));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], student.id);
    }
}
