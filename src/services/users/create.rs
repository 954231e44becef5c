use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{UserService, check_identity_fields};
use crate::models::users::requests::CreateUserRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;
use crate::try_response;

pub async fn create_user(
    service: &UserService,
    request: &HttpRequest,
    mut user_data: CreateUserRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    user_data.name = user_data.name.trim().to_string();
    user_data.email = user_data.email.trim().to_lowercase();
    try_response!(
        check_identity_fields(
            &storage,
            None,
            Some(user_data.name.as_str()),
            Some(user_data.email.as_str())
        )
        .await
    );

    match storage.create_user(user_data).await {
        Ok(user) => {
            info!("User {} ({}) created as {}", user.id, user.email, user.role);
            Ok(HttpResponse::Created().json(ApiResponse::success(user, "User created successfully")))
        }
        Err(e) => {
            error!("User creation failed: {}", e);
            Ok(internal_error(
                ErrorCode::UserCreationFailed,
                "User creation failed",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{body_json, request_as};
    use crate::services::users::test_support::users;
    use actix_web::http::StatusCode;

    fn create(json: &str) -> CreateUserRequest {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_create_normalizes_email_and_rejects_duplicates() {
        let (storage, admin, _) = users().await;
        let service = UserService::with_storage(storage);

        let resp = service
            .create_user(
                &request_as(&admin),
                create(r#"{"name":"Katherine Johnson","email":" K.Johnson@School.edu ","role":"teacher","department":"Physics"}"#),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["email"], "k.johnson@school.edu");
        assert_eq!(body["data"]["status"], "active");

        let resp = service
            .create_user(
                &request_as(&admin),
                create(r#"{"name":"Kath Johnson","email":"k.johnson@school.edu","role":"student"}"#),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::UserEmailAlreadyExists as i32);
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let (storage, admin, _) = users().await;
        let service = UserService::with_storage(storage);

        let resp = service
            .create_user(
                &request_as(&admin),
                create(r#"{"name":"K","email":"k@school.edu","role":"student"}"#),
            )
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::UserNameInvalid as i32);

        let resp = service
            .create_user(
                &request_as(&admin),
                create(r#"{"name":"Kay Jay","email":"not-an-email","role":"student"}"#),
            )
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::UserEmailInvalid as i32);
    }
}
