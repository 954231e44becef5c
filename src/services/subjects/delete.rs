use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::SubjectService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;
use crate::try_response;

pub async fn delete_subject(
    service: &SubjectService,
    request: &HttpRequest,
    subject_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    // 仍有班级使用的课程不能删除
    match storage.count_classes_by_subject(subject_id).await {
        Ok(0) => {}
        Ok(count) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::SubjectInUse,
                format!("Subject is used by {count} class(es)"),
            )));
        }
        Err(e) => {
            error!("Failed to count classes of subject {}: {}", subject_id, e);
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                "Failed to delete subject",
            ));
        }
    }

    match storage.delete_subject(subject_id).await {
        Ok(true) => {
            info!("Subject {} deleted", subject_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Subject deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubjectNotFound,
            "Subject not found",
        ))),
        Err(e) => {
            error!("Failed to delete subject {}: {}", subject_id, e);
            Ok(internal_error(
                ErrorCode::InternalServerError,
                "Failed to delete subject",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::subjects::test_support::subjects;
    use crate::services::test_support::{body_json, request_as};
    use crate::models::classes::requests::CreateClassRequest;
    use actix_web::http::StatusCode;

    #[tokio::test]
    async fn test_subject_in_use_cannot_be_deleted() {
        let (storage, admin, teacher, subject) = subjects().await;
        let req: CreateClassRequest = serde_json::from_str(&format!(
            r#"{{"teacher_id":{},"subject_id":{},"name":"Algebra I"}}"#,
            teacher.id, subject.id
        ))
        .unwrap();
        let class = storage.create_class(req, "ABC123".to_string()).await.unwrap();
        let service = SubjectService::with_storage(storage.clone());

        let resp = service
            .delete_subject(&request_as(&admin), subject.id)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::SubjectInUse as i32);

        storage.delete_class(class.id).await.unwrap();
        let resp = service
            .delete_subject(&request_as(&admin), subject.id)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
