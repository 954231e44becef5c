use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{UserService, check_identity_fields};
use crate::models::users::requests::{UpdateProfileRequest, UpdateUserRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, internal_error};
use crate::try_response;

pub async fn update_user(
    service: &UserService,
    request: &HttpRequest,
    user_id: i64,
    mut update_data: UpdateUserRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    if let Some(email) = update_data.email.as_mut() {
        *email = email.trim().to_lowercase();
    }
    try_response!(
        check_identity_fields(
            &storage,
            Some(user_id),
            update_data.name.as_deref(),
            update_data.email.as_deref()
        )
        .await
    );

    match storage.update_user(user_id, update_data).await {
        Ok(Some(user)) => {
            info!("User {} updated", user.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(user, "User updated successfully")))
        }
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::UserNotFound, "User not found"))),
        Err(e) => {
            error!("Failed to update user {}: {}", user_id, e);
            Ok(internal_error(
                ErrorCode::UserUpdateFailed,
                "Failed to update user",
            ))
        }
    }
}

// 只允许修改展示信息，角色和状态由管理员维护
pub async fn update_profile(
    service: &UserService,
    request: &HttpRequest,
    update_data: UpdateProfileRequest,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    update_user(service, request, user.id, update_data.into()).await
}
