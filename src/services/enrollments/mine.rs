use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::EnrollmentService;
use crate::models::classes::requests::{ClassListQuery, ClassQueryParams};
use crate::models::classes::responses::ClassOfferingListResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, internal_error};
use crate::try_response;

pub async fn list_my_classes(
    service: &EnrollmentService,
    request: &HttpRequest,
    query: ClassQueryParams,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let list_query = ClassListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        teacher_id: None,
        subject_id: query.subject_id,
        status: query.status,
        search: query.search,
    };

    match storage
        .list_student_classes_with_pagination(user.id, list_query)
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ClassOfferingListResponse::new(list, |_| false),
            "Enrolled classes retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to list classes of student {}: {}", user.id, e);
            Ok(internal_error(
                ErrorCode::InternalServerError,
                "Failed to list enrolled classes",
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

    #[tokio::test]
    async fn test_lists_joined_classes_with_schedules() {
        let fx = fixture().await;
        let service = EnrollmentService::with_storage(fx.storage.clone());

        let empty = body_json(
            service
                .list_my_classes(&request_as(&fx.student), serde_json::from_str("{}").unwrap())
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(empty["data"]["pagination"]["total"], 0);

        fx.storage
            .create_enrollment(fx.class.id, fx.student.id)
            .await
            .unwrap();
        let resp = service
            .list_my_classes(&request_as(&fx.student), serde_json::from_str("{}").unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["pagination"]["total"], 1);
        let item = &body["data"]["items"][0];
        assert_eq!(item["id"], fx.class.id);
        assert_eq!(item["enrolled_count"], 1);
        assert!(item["schedules"].is_array());
        assert!(item.get("invite_code").is_none());
    }
}
