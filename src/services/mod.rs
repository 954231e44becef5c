pub mod classes;
pub mod dashboard;
pub mod enrollments;
pub mod subjects;
pub mod users;

pub use classes::ClassService;
pub use dashboard::DashboardService;
pub use enrollments::EnrollmentService;
pub use subjects::SubjectService;
pub use users::UserService;

use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use tracing::error;

use crate::middlewares::RequireJWT;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

// 优先使用注入的存储，否则从 app_data 中读取
pub(crate) fn resolve_storage(
    injected: &Option<Arc<dyn Storage>>,
    request: &HttpRequest,
) -> Result<Arc<dyn Storage>, HttpResponse> {
    if let Some(storage) = injected {
        return Ok(storage.clone());
    }
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not found in app data");
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "Storage is not configured",
            ))
        })
}

// 当前登录用户，由 RequireJWT 写入
pub(crate) fn current_user(request: &HttpRequest) -> Result<User, HttpResponse> {
    RequireJWT::extract_user_claims(request).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user",
        ))
    })
}

pub(crate) fn internal_error(code: ErrorCode, message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(code, message))
}

/// 把 `Result<T, HttpResponse>` 中的错误响应直接返回
#[macro_export]
macro_rules! try_response {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(resp) => return Ok(resp),
        }
    };
}

#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::{HttpMessage, HttpRequest, HttpResponse, test::TestRequest};
    use serde_json::Value;

    use crate::models::users::entities::User;

    /// 构造一个已通过 RequireJWT 的请求
    pub fn request_as(user: &User) -> HttpRequest {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(user.clone());
        req
    }

    pub async fn body_json(resp: HttpResponse) -> Value {
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
