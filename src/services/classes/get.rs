use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ClassService, can_manage, load_class};
use crate::models::ApiResponse;
use crate::models::classes::responses::ClassOfferingResponse;
use crate::services::current_user;
use crate::try_response;

pub async fn get_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let class = try_response!(load_class(&storage, class_id).await);
    let reveal = can_manage(&user, &class);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        ClassOfferingResponse::new(class, reveal),
        "Class information retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::classes::test_support::fixture;
    use crate::services::test_support::{body_json, request_as};
    use actix_web::http::StatusCode;

    #[tokio::test]
    async fn test_invite_code_visible_to_owner_and_admin_only() {
        let fx = fixture().await;
        let service = ClassService::with_storage(fx.storage.clone());

        for (user, visible) in [
            (&fx.teacher, true),
            (&fx.admin, true),
            (&fx.other_teacher, false),
            (&fx.student, false),
        ] {
            let resp = service
                .get_class(&request_as(user), fx.class.id)
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let body = body_json(resp).await;
            assert_eq!(body["data"]["invite_code"].is_string(), visible, "{}", user.name);
            assert_eq!(body["data"]["enrolled_count"], 0);
            assert_eq!(body["data"]["can_join"], true);
        }
    }

    #[tokio::test]
    async fn test_missing_class_is_not_found() {
        let fx = fixture().await;
        let service = ClassService::with_storage(fx.storage.clone());
        let resp = service
            .get_class(&request_as(&fx.student), 4242)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
