use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{ClassService, can_manage};
use crate::models::classes::entities::ClassStatus;
use crate::models::classes::requests::{ClassListQuery, ClassQueryParams};
use crate::models::classes::responses::ClassOfferingListResponse;
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, internal_error};
use crate::try_response;

pub async fn list_classes(
    service: &ClassService,
    request: &HttpRequest,
    query: ClassQueryParams,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let list_query = scope_query(&user, query);

    match storage.list_classes_with_pagination(list_query).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ClassOfferingListResponse::new(list, |class| can_manage(&user, class)),
            "Classes retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to list classes: {}", e);
            Ok(internal_error(
                ErrorCode::InternalServerError,
                "Failed to list classes",
            ))
        }
    }
}

// 管理员查看全部；教师只看自己的班级；学生只看开放加入的班级
fn scope_query(user: &User, query: ClassQueryParams) -> ClassListQuery {
    let mut list_query = ClassListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        teacher_id: None,
        subject_id: query.subject_id,
        status: query.status,
        search: query.search,
    };
    match user.role {
        UserRole::Admin => {}
        UserRole::Teacher => list_query.teacher_id = Some(user.id),
        UserRole::Student => list_query.status = Some(ClassStatus::Active),
    }
    list_query
}
