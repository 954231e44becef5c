use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::EnrollmentService;
use crate::models::enrollments::requests::{EnrollmentListParams, EnrollmentQuery};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::classes::{check_class_manage_permission, load_class};
use crate::services::{current_user, internal_error};
use crate::try_response;

pub async fn list_class_enrollments(
    service: &EnrollmentService,
    request: &HttpRequest,
    class_id: i64,
    query: EnrollmentListParams,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let class = try_response!(load_class(&storage, class_id).await);
    try_response!(check_class_manage_permission(&user, &class));

    let query = EnrollmentQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        search: query.search,
    };

    match storage
        .list_class_enrollments_with_pagination(class_id, query)
        .await
    {
        Ok(roster) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            roster,
            "Class roster retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to list roster of class {}: {}", class_id, e);
            Ok(internal_error(
                ErrorCode::InternalServerError,
                "Failed to list class roster",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::classes::test_support::{fixture, student};
    use crate::services::test_support::{body_json, request_as};
    use actix_web::http::StatusCode;

    fn params(json: &str) -> EnrollmentListParams {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_roster_for_owner_with_search() {
        let fx = fixture().await;
        let other = student(&fx.storage, "Alan Turing").await;
        for id in [fx.student.id, other.id] {
            fx.storage.create_enrollment(fx.class.id, id).await.unwrap();
        }
        let service = EnrollmentService::with_storage(fx.storage.clone());

        let resp = service
            .list_class_enrollments(&request_as(&fx.teacher), fx.class.id, params("{}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["pagination"]["total"], 2);

        let resp = service
            .list_class_enrollments(
                &request_as(&fx.admin),
                fx.class.id,
                params(r#"{"search":"turing"}"#),
            )
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["items"][0]["student"]["id"], other.id);
        assert_eq!(body["data"]["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn test_roster_hidden_from_students_and_other_teachers() {
        let fx = fixture().await;
        let service = EnrollmentService::with_storage(fx.storage.clone());
        for user in [&fx.student, &fx.other_teacher] {
            let resp = service
                .list_class_enrollments(&request_as(user), fx.class.id, params("{}"))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        }
    }
}
