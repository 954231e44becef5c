use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::EnrollmentService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::classes::{can_manage, load_class};
use crate::services::{current_user, internal_error};
use crate::try_response;

pub async fn remove_enrollment(
    service: &EnrollmentService,
    request: &HttpRequest,
    class_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let class = try_response!(load_class(&storage, class_id).await);

    // 管理员、班级教师或学生本人
    if !can_manage(&user, &class) && user.id != student_id {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::ClassPermissionDenied,
            "You do not have permission to remove this student",
        )));
    }

    match storage.delete_enrollment(class_id, student_id).await {
        Ok(true) => {
            info!(
                "Student {} removed from class {} by {}",
                student_id, class_id, user.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Student removed from class successfully",
            )))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::EnrollmentNotFound,
            "Student is not enrolled in this class",
        ))),
        Err(e) => {
            error!(
                "Failed to remove student {} from class {}: {}",
                student_id, class_id, e
            );
            Ok(internal_error(
                ErrorCode::InternalServerError,
                "Failed to remove student from class",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::classes::test_support::{fixture, student};
    use crate::services::test_support::request_as;
    use actix_web::http::StatusCode;

    #[tokio::test]
    async fn test_student_can_leave_but_not_remove_others() {
        let fx = fixture().await;
        let other = student(&fx.storage, "Alan Turing").await;
        for id in [fx.student.id, other.id] {
            fx.storage.create_enrollment(fx.class.id, id).await.unwrap();
        }
        let service = EnrollmentService::with_storage(fx.storage.clone());

        let resp = service
            .remove_enrollment(&request_as(&fx.student), fx.class.id, other.id)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = service
            .remove_enrollment(&request_as(&fx.student), fx.class.id, fx.student.id)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = service
            .remove_enrollment(&request_as(&fx.teacher), fx.class.id, other.id)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let class = fx.storage.get_class_by_id(fx.class.id).await.unwrap().unwrap();
        assert_eq!(class.enrolled_count, 0);
    }

    #[tokio::test]
    async fn test_removing_missing_enrollment() {
        let fx = fixture().await;
        let service = EnrollmentService::with_storage(fx.storage.clone());
        let resp = service
            .remove_enrollment(&request_as(&fx.admin), fx.class.id, fx.student.id)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
