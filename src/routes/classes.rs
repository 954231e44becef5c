use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::classes::requests::{ClassQueryParams, CreateClassRequest, UpdateClassRequest};
use crate::models::enrollments::requests::{EnrollmentListParams, JoinClassRequest};
use crate::models::users::entities::UserRole;
use crate::services::{ClassService, EnrollmentService};
use crate::utils::{SafeClassIdI64, SafeStudentIdI64};

// 懒加载的全局 CLASS_SERVICE 实例
static CLASS_SERVICE: Lazy<ClassService> = Lazy::new(ClassService::new_lazy);
static ENROLLMENT_SERVICE: Lazy<EnrollmentService> = Lazy::new(EnrollmentService::new_lazy);

// HTTP处理程序
pub async fn list_classes(
    req: HttpRequest,
    query: web::Query<ClassQueryParams>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.list_classes(&req, query.into_inner()).await
}

pub async fn create_class(
    req: HttpRequest,
    class_data: web::Json<CreateClassRequest>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE
        .create_class(&req, class_data.into_inner())
        .await
}

pub async fn get_class(req: HttpRequest, class_id: SafeClassIdI64) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.get_class(&req, class_id.0).await
}

pub async fn update_class(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    update_data: web::Json<UpdateClassRequest>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE
        .update_class(&req, class_id.0, update_data.into_inner())
        .await
}

pub async fn delete_class(req: HttpRequest, class_id: SafeClassIdI64) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.delete_class(&req, class_id.0).await
}

pub async fn regenerate_invite_code(
    req: HttpRequest,
    class_id: SafeClassIdI64,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.regenerate_invite_code(&req, class_id.0).await
}

pub async fn join_class(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    join_data: web::Json<JoinClassRequest>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .join_class(&req, class_id.0, join_data.into_inner())
        .await
}

pub async fn list_class_enrollments(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    query: web::Query<EnrollmentListParams>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .list_class_enrollments(&req, class_id.0, query.into_inner())
        .await
}

pub async fn remove_enrollment(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .remove_enrollment(&req, class_id.0, student_id.0)
        .await
}

// 配置路由
pub fn configure_classes_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes")
            .wrap(middlewares::RequireJWT)
            .service(
                // 管理员查看全部班级，教师查看自己的班级，学生查看可加入的班级
                web::resource("").route(web::get().to(list_classes)).route(
                    web::post()
                        .to(create_class)
                        // 教师创建自己的班级，管理员可以创建指定教师的班级
                        .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                ),
            )
            .service(
                web::resource("/{class_id}")
                    .route(web::get().to(get_class))
                    .route(
                        web::put()
                            .to(update_class)
                            // 教师更新自己班级，管理员可以更新所有班级
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                    )
                    .route(
                        web::delete()
                            .to(delete_class)
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                    ),
            )
            .service(
                web::resource("/{class_id}/invite-code").route(
                    web::post()
                        .to(regenerate_invite_code)
                        .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                ),
            )
            .service(
                web::resource("/{class_id}/enrollments")
                    .route(
                        web::post()
                            .to(join_class)
                            // 限制尝试频率，防止枚举邀请码
                            .wrap(middlewares::RateLimit::enrollment())
                            .wrap(middlewares::RequireRole::new_any(UserRole::student_roles())),
                    )
                    .route(
                        web::get()
                            .to(list_class_enrollments)
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                    ),
            )
            .service(
                // 教师、管理员或学生本人
                web::resource("/{class_id}/enrollments/{student_id}")
                    .route(web::delete().to(remove_enrollment)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;
    use crate::models::users::entities::User;
    use crate::services::classes::test_support::fixture;
    use crate::utils::jwt::JwtUtils;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    fn bearer(user: &User) -> (&'static str, String) {
        let token = JwtUtils::generate_access_token(user.id, &user.role.to_string()).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    macro_rules! classes_app {
        ($storage:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($storage.clone()))
                    .configure(configure_classes_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_join_route_requires_token_and_student_role() {
        let fx = fixture().await;
        let app = classes_app!(fx.storage);
        let uri = format!("/api/v1/classes/{}/enrollments", fx.class.id);
        let payload = serde_json::json!({ "invite_code": "abc-123" });

        let anonymous = test::TestRequest::post()
            .uri(&uri)
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, anonymous).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let as_teacher = test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&fx.teacher))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, as_teacher).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::Forbidden as i32);

        let as_student = test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&fx.student))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, as_student).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert!(resp.headers().contains_key("x-ratelimit-remaining"));
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["student_id"], fx.student.id);
    }

    #[actix_web::test]
    async fn test_teacher_routes_reject_students() {
        let fx = fixture().await;
        let app = classes_app!(fx.storage);

        let create = test::TestRequest::post()
            .uri("/api/v1/classes")
            .insert_header(bearer(&fx.student))
            .set_json(serde_json::json!({ "subject_id": fx.subject.id, "name": "Geometry" }))
            .to_request();
        let resp = test::call_service(&app, create).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let roster = test::TestRequest::get()
            .uri(&format!("/api/v1/classes/{}/enrollments", fx.class.id))
            .insert_header(bearer(&fx.student))
            .to_request();
        let resp = test::call_service(&app, roster).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let regenerate = test::TestRequest::post()
            .uri(&format!("/api/v1/classes/{}/invite-code", fx.class.id))
            .insert_header(bearer(&fx.student))
            .to_request();
        let resp = test::call_service(&app, regenerate).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let as_owner = test::TestRequest::get()
            .uri(&format!("/api/v1/classes/{}/enrollments", fx.class.id))
            .insert_header(bearer(&fx.teacher))
            .to_request();
        let resp = test::call_service(&app, as_owner).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_invalid_class_id_in_path() {
        let fx = fixture().await;
        let app = classes_app!(fx.storage);

        let req = test::TestRequest::get()
            .uri("/api/v1/classes/abc")
            .insert_header(bearer(&fx.student))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::BadRequest as i32);
    }
}
