use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::UserService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, internal_error};
use crate::try_response;

pub async fn delete_user(
    service: &UserService,
    request: &HttpRequest,
    user_id: i64,
) -> ActixResult<HttpResponse> {
    let current = try_response!(current_user(request));
    if current.id == user_id {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::CanNotDeleteCurrentUser,
            "You cannot delete your own account",
        )));
    }

    let storage = try_response!(service.get_storage(request));

    match storage.delete_user(user_id).await {
        Ok(true) => {
            info!("User {} deleted by {}", user_id, current.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::UserNotFound, "User not found"))),
        Err(e) => {
            error!("Failed to delete user {}: {}", user_id, e);
            Ok(internal_error(
                ErrorCode::UserDeleteFailed,
                "Failed to delete user",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::request_as;
    use crate::services::users::test_support::users;
    use actix_web::http::StatusCode;

    #[tokio::test]
    async fn test_admin_cannot_delete_self() {
        let (storage, admin, teacher) = users().await;
        let service = UserService::with_storage(storage);

        let resp = service.delete_user(&request_as(&admin), admin.id).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = service.delete_user(&request_as(&admin), teacher.id).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = service.delete_user(&request_as(&admin), teacher.id).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
