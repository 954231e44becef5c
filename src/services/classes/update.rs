use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::create::check_subject_exists;
use super::{ClassService, check_class_manage_permission, load_class};
use crate::models::classes::entities::{Capacity, ClassOffering};
use crate::models::classes::requests::UpdateClassRequest;
use crate::models::classes::responses::ClassOfferingResponse;
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, internal_error};
use crate::storage::Storage;
use crate::try_response;
use crate::utils::validate::{validate_class_name, validate_schedules};

pub async fn update_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
    update_data: UpdateClassRequest,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let class = try_response!(load_class(&storage, class_id).await);
    try_response!(check_class_manage_permission(&user, &class));

    try_response!(validate_update(&class, &update_data));
    if let Some(teacher_id) = update_data.teacher_id {
        try_response!(check_teacher_reassignment(&user, &class, teacher_id, &storage).await);
    }
    if let Some(subject_id) = update_data.subject_id {
        try_response!(check_subject_exists(&storage, subject_id).await);
    }

    match storage.update_class(class_id, update_data).await {
        Ok(Some(class)) => {
            info!("Class {} updated by {}", class.id, user.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                ClassOfferingResponse::new(class, true),
                "Class updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ClassNotFound,
            "Class not found",
        ))),
        Err(e) => {
            error!("Failed to update class {}: {}", class_id, e);
            Ok(internal_error(
                ErrorCode::ClassUpdateFailed,
                "Failed to update class",
            ))
        }
    }
}

fn bad_request(msg: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::ClassInvalid, msg))
}

fn validate_update(class: &ClassOffering, update: &UpdateClassRequest) -> Result<(), HttpResponse> {
    if let Some(name) = &update.name {
        validate_class_name(name).map_err(bad_request)?;
    }
    if let Some(schedules) = &update.schedules {
        validate_schedules(schedules).map_err(bad_request)?;
    }
    // 容量不能低于当前已加入人数
    if let Some(Capacity::Limited(n)) = update.capacity
        && i64::from(n) < class.enrolled_count
    {
        return Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::ClassInvalid,
            format!(
                "Capacity {n} is below the {} students already enrolled",
                class.enrolled_count
            ),
        )));
    }
    Ok(())
}

// 只有管理员可以更换班级教师，且新教师必须是教师角色
async fn check_teacher_reassignment(
    user: &User,
    class: &ClassOffering,
    teacher_id: i64,
    storage: &Arc<dyn Storage>,
) -> Result<(), HttpResponse> {
    if teacher_id == class.teacher_id {
        return Ok(());
    }
    if !user.is_admin() {
        return Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::ClassPermissionDenied,
            "Only admins can reassign a class to another teacher",
        )));
    }
    match storage.get_user_by_id(teacher_id).await {
        Ok(Some(teacher)) if teacher.role == UserRole::Teacher => Ok(()),
        Ok(Some(_)) => Err(bad_request("Classes can only be assigned to teachers")),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "Teacher not found",
        ))),
        Err(e) => {
            error!("Failed to get user by id: {}", e);
            Err(internal_error(
                ErrorCode::InternalServerError,
                "Internal server error while fetching user",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::classes::test_support::fixture;
    use crate::services::test_support::{body_json, request_as};
    use actix_web::http::StatusCode;

    fn update(json: &str) -> UpdateClassRequest {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_owner_updates_class() {
        let fx = fixture().await;
        let service = ClassService::with_storage(fx.storage.clone());

        let resp = service
            .update_class(
                &request_as(&fx.teacher),
                fx.class.id,
                update(r#"{"name":"Algebra II","capacity":null,"status":"inactive"}"#),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["name"], "Algebra II");
        assert!(body["data"]["capacity"].is_null());
        assert_eq!(body["data"]["can_join"], false);
    }

    #[tokio::test]
    async fn test_capacity_cannot_drop_below_enrollment() {
        let fx = fixture().await;
        let service = ClassService::with_storage(fx.storage.clone());
        fx.storage
            .create_enrollment(fx.class.id, fx.student.id)
            .await
            .unwrap();

        let resp = service
            .update_class(&request_as(&fx.teacher), fx.class.id, update(r#"{"capacity":0}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = service
            .update_class(&request_as(&fx.teacher), fx.class.id, update(r#"{"capacity":1}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_teacher_cannot_reassign_or_edit_foreign_class() {
        let fx = fixture().await;
        let service = ClassService::with_storage(fx.storage.clone());

        let reassign = format!(r#"{{"teacher_id":{}}}"#, fx.other_teacher.id);
        let resp = service
            .update_class(&request_as(&fx.teacher), fx.class.id, update(&reassign))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = service
            .update_class(
                &request_as(&fx.other_teacher),
                fx.class.id,
                update(r#"{"name":"Hijacked"}"#),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = service
            .update_class(&request_as(&fx.admin), fx.class.id, update(&reassign))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["teacher_id"], fx.other_teacher.id);
    }

    #[tokio::test]
    async fn test_rejects_short_name() {
        let fx = fixture().await;
        let service = ClassService::with_storage(fx.storage.clone());
        let resp = service
            .update_class(&request_as(&fx.admin), fx.class.id, update(r#"{"name":"A"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
