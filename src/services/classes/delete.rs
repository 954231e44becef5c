use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{ClassService, check_class_manage_permission, load_class};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, internal_error};
use crate::try_response;

pub async fn delete_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let class = try_response!(load_class(&storage, class_id).await);
    try_response!(check_class_manage_permission(&user, &class));

    match storage.delete_class(class_id).await {
        Ok(true) => {
            info!("Class {} deleted by {}", class_id, user.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Class deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ClassNotFound,
            "Class not found",
        ))),
        Err(e) => {
            error!("Failed to delete class {}: {}", class_id, e);
            Ok(internal_error(
                ErrorCode::ClassDeleteFailed,
                "Failed to delete class",
            ))
        }
    }
}
