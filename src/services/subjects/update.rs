use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{SubjectService, subject_code_taken, validate_subject_fields};
use crate::models::subjects::requests::UpdateSubjectRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;
use crate::try_response;

pub async fn update_subject(
    service: &SubjectService,
    request: &HttpRequest,
    subject_id: i64,
    mut update_data: UpdateSubjectRequest,
) -> ActixResult<HttpResponse> {
    if let Some(code) = update_data.code.as_mut() {
        *code = code.trim().to_uppercase();
    }
    try_response!(validate_subject_fields(
        update_data.name.as_deref(),
        update_data.code.as_deref(),
        update_data.description.as_deref(),
        update_data.department.as_deref(),
    ));

    let storage = try_response!(service.get_storage(request));

    if let Some(code) = update_data.code.as_deref() {
        match storage.get_subject_by_code(code).await {
            Ok(Some(existing)) if existing.id != subject_id => return Ok(subject_code_taken()),
            Ok(_) => {}
            Err(e) => {
                error!("Failed to look up subject code: {}", e);
                return Ok(internal_error(
                    ErrorCode::InternalServerError,
                    "Failed to check subject code",
                ));
            }
        }
    }

    match storage.update_subject(subject_id, update_data).await {
        Ok(Some(subject)) => {
            info!("Subject {} updated", subject.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                subject,
                "Subject updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubjectNotFound,
            "Subject not found",
        ))),
        Err(e) => {
            error!("Failed to update subject {}: {}", subject_id, e);
            Ok(internal_error(
                ErrorCode::InternalServerError,
                "Failed to update subject",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::subjects::test_support::subjects;
    use crate::services::test_support::{body_json, request_as};
    use actix_web::http::StatusCode;

    #[tokio::test]
    async fn test_update_keeps_own_code_and_checks_missing() {
        let (storage, admin, _, subject) = subjects().await;
        let service = SubjectService::with_storage(storage);

        let update: UpdateSubjectRequest =
            serde_json::from_str(r#"{"code":"MATH101","name":"Pure Mathematics"}"#).unwrap();
        let resp = service
            .update_subject(&request_as(&admin), subject.id, update)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["name"], "Pure Mathematics");

        let update: UpdateSubjectRequest = serde_json::from_str(r#"{"name":"Ghost"}"#).unwrap();
        let resp = service
            .update_subject(&request_as(&admin), 4242, update)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
