use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::ClassService;
use super::invite_code::issue_invite_code;
use crate::models::classes::requests::CreateClassRequest;
use crate::models::classes::responses::ClassOfferingResponse;
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, internal_error};
use crate::storage::Storage;
use crate::try_response;
use crate::utils::validate::{validate_class_name, validate_schedules};

pub async fn create_class(
    service: &ClassService,
    request: &HttpRequest,
    mut class_data: CreateClassRequest,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    // 权限校验，并确定班级教师
    let teacher_id = try_response!(resolve_teacher(&user, &class_data, &storage).await);
    class_data.teacher_id = Some(teacher_id);

    try_response!(validate_class_data(&class_data));
    try_response!(check_subject_exists(&storage, class_data.subject_id).await);

    let code = try_response!(issue_invite_code(&storage).await);

    match storage.create_class(class_data, code).await {
        Ok(class) => {
            info!(
                "Class {} ({}) created by {} for teacher {}",
                class.id, class.name, user.id, teacher_id
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                ClassOfferingResponse::new(class, true),
                "Class created successfully",
            )))
        }
        Err(e) => {
            error!("Class creation failed: {}", e);
            Ok(internal_error(
                ErrorCode::ClassCreationFailed,
                "Class creation failed",
            ))
        }
    }
}

/// 权限校验辅助函数
///
/// 管理员必须指定一名教师；教师只能为自己创建班级。
async fn resolve_teacher(
    user: &User,
    class_data: &CreateClassRequest,
    storage: &Arc<dyn Storage>,
) -> Result<i64, HttpResponse> {
    match user.role {
        UserRole::Admin => {
            let Some(teacher_id) = class_data.teacher_id else {
                return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::ClassInvalid,
                    "teacher_id is required when an admin creates a class",
                )));
            };
            match storage.get_user_by_id(teacher_id).await {
                Ok(Some(teacher)) if teacher.role == UserRole::Teacher => Ok(teacher_id),
                Ok(Some(_)) => Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::ClassPermissionDenied,
                    "Admin can only create classes for teachers",
                ))),
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
        UserRole::Teacher => match class_data.teacher_id {
            None => Ok(user.id),
            Some(id) if id == user.id => Ok(id),
            Some(_) => Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::ClassPermissionDenied,
                "You do not have permission to create a class for another teacher",
            ))),
        },
        UserRole::Student => Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::ClassPermissionDenied,
            "You do not have permission to create a class",
        ))),
    }
}

fn validate_class_data(class_data: &CreateClassRequest) -> Result<(), HttpResponse> {
    if let Err(msg) = validate_class_name(&class_data.name) {
        return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ClassInvalid,
            msg,
        )));
    }
    if let Err(msg) = validate_schedules(&class_data.schedules) {
        return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ClassInvalid,
            msg,
        )));
    }
    Ok(())
}

pub(super) async fn check_subject_exists(
    storage: &Arc<dyn Storage>,
    subject_id: i64,
) -> Result<(), HttpResponse> {
    match storage.get_subject_by_id(subject_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubjectNotFound,
            "Subject not found",
        ))),
        Err(e) => {
            error!("Failed to get subject {}: {}", subject_id, e);
            Err(internal_error(
                ErrorCode::InternalServerError,
                "Internal server error while fetching subject",
            ))
        }
    }
}
