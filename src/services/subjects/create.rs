use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{SubjectService, subject_code_taken, validate_subject_fields};
use crate::models::subjects::requests::CreateSubjectRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;
use crate::try_response;

pub async fn create_subject(
    service: &SubjectService,
    request: &HttpRequest,
    mut subject_data: CreateSubjectRequest,
) -> ActixResult<HttpResponse> {
    subject_data.code = subject_data.code.trim().to_uppercase();
    try_response!(validate_subject_fields(
        Some(subject_data.name.as_str()),
        Some(subject_data.code.as_str()),
        Some(subject_data.description.as_str()),
        Some(subject_data.department.as_str()),
    ));

    let storage = try_response!(service.get_storage(request));

    match storage.get_subject_by_code(&subject_data.code).await {
        Ok(Some(_)) => return Ok(subject_code_taken()),
        Ok(None) => {}
        Err(e) => {
            error!("Failed to look up subject code: {}", e);
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                "Failed to check subject code",
            ));
        }
    }

    match storage.create_subject(subject_data).await {
        Ok(subject) => {
            info!("Subject {} ({}) created", subject.id, subject.code);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                subject,
                "Subject created successfully",
            )))
        }
        Err(e) => {
            error!("Subject creation failed: {}", e);
            Ok(internal_error(
                ErrorCode::InternalServerError,
                "Subject creation failed",
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

    fn create(json: &str) -> CreateSubjectRequest {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_code_case_insensitively() {
        let (storage, admin, _, _) = subjects().await;
        let service = SubjectService::with_storage(storage);

        let resp = service
            .create_subject(
                &request_as(&admin),
                create(r#"{"name":"Calculus","code":"math101","description":"Limits and series","department":"Science"}"#),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = service
            .create_subject(
                &request_as(&admin),
                create(r#"{"name":"Calculus","code":"math-201","description":"Limits and series","department":"Science"}"#),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["code"], "MATH-201");
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let (storage, admin, _, _) = subjects().await;
        let service = SubjectService::with_storage(storage);

        let resp = service
            .create_subject(
                &request_as(&admin),
                create(r#"{"name":"Calculus","code":"M1","description":"Limits and series","department":"Science"}"#),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::SubjectInvalid as i32);
        assert_eq!(body["message"], "Subject code must be at least 5 characters");
    }
}
