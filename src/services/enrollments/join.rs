use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::EnrollmentService;
use super::admission;
use crate::middlewares::RequireJWT;
use crate::models::ApiResponse;
use crate::models::enrollments::requests::JoinClassRequest;
use crate::services::classes::load_class;
use crate::try_response;

pub async fn join_class(
    service: &EnrollmentService,
    request: &HttpRequest,
    class_id: i64,
    join_data: JoinClassRequest,
) -> ActixResult<HttpResponse> {
    let student_id = RequireJWT::extract_user_id(request);
    let storage = try_response!(service.get_storage(request));

    let class = try_response!(load_class(&storage, class_id).await);

    match admission::admit(storage.as_ref(), &join_data.invite_code, &class, student_id).await {
        Ok(enrollment) => Ok(HttpResponse::Created().json(ApiResponse::success(
            enrollment,
            "Class joined successfully",
        ))),
        Err(e) => {
            info!(
                "Join attempt on class {} by {:?} rejected: {:?}",
                class_id, student_id, e
            );
            Ok(HttpResponse::build(e.status_code())
                .json(ApiResponse::error_empty(e.error_code(), e.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;
    use crate::services::classes::test_support::{fixture, student};
    use crate::services::test_support::{body_json, request_as};
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;

    fn join(code: &str) -> JoinClassRequest {
        JoinClassRequest {
            invite_code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn test_join_then_duplicate() {
        let fx = fixture().await;
        let service = EnrollmentService::with_storage(fx.storage.clone());

        let resp = service
            .join_class(&request_as(&fx.student), fx.class.id, join("abc-123"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["student_id"], fx.student.id);
        assert_eq!(body["data"]["class_id"], fx.class.id);

        let resp = service
            .join_class(&request_as(&fx.student), fx.class.id, join("ABC123"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::ClassAlreadyJoined as i32);
    }

    #[tokio::test]
    async fn test_join_error_envelopes() {
        let fx = fixture().await;
        let service = EnrollmentService::with_storage(fx.storage.clone());

        let resp = service
            .join_class(&request_as(&fx.student), fx.class.id, join("AB"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::ClassInviteCodeInvalid as i32);

        let resp = service
            .join_class(&request_as(&fx.student), fx.class.id, join("ABC124"))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::ClassInviteCodeMismatch as i32);
        assert_eq!(body["message"], "Invite code does not match this class");

        let anonymous = TestRequest::default().to_http_request();
        let resp = service
            .join_class(&anonymous, fx.class.id, join("ABC123"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = service
            .join_class(&request_as(&fx.student), 4242, join("ABC123"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_join_full_class() {
        let fx = fixture().await;
        let service = EnrollmentService::with_storage(fx.storage.clone());
        // 容量为 2
        for name in ["Alan Turing", "Barbara Liskov"] {
            let student = student(&fx.storage, name).await;
            fx.storage
                .create_enrollment(fx.class.id, student.id)
                .await
                .unwrap();
        }

        let resp = service
            .join_class(&request_as(&fx.student), fx.class.id, join("ABC123"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::ClassFull as i32);
    }
}
