use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info, warn};

use super::{ClassService, check_class_manage_permission, load_class};
use crate::config::AppConfig;
use crate::models::classes::responses::InviteCodeResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, internal_error};
use crate::storage::Storage;
use crate::try_response;
use crate::utils::invite_code;

pub async fn regenerate_invite_code(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let class = try_response!(load_class(&storage, class_id).await);
    try_response!(check_class_manage_permission(&user, &class));

    let code = try_response!(issue_invite_code(&storage).await);

    match storage.update_class_invite_code(class_id, code).await {
        Ok(Some(class)) => {
            info!("Invite code of class {} regenerated by {}", class.id, user.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                InviteCodeResponse {
                    class_id: class.id,
                    invite_code: class.invite_code,
                },
                "Invite code regenerated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ClassNotFound,
            "Class not found",
        ))),
        Err(e) => {
            error!("Failed to update invite code of class {}: {}", class_id, e);
            Ok(internal_error(
                ErrorCode::ClassUpdateFailed,
                "Failed to regenerate invite code",
            ))
        }
    }
}

/// 按配置生成新邀请码
pub(crate) async fn issue_invite_code(storage: &Arc<dyn Storage>) -> Result<String, HttpResponse> {
    let config = &AppConfig::get().classes;
    generate_invite_code(
        storage.as_ref(),
        config.unique_invite_codes,
        config.invite_code_attempts,
    )
    .await
}

// 非去重模式直接返回随机码；去重模式下最多尝试 attempts 次
async fn generate_invite_code(
    storage: &dyn Storage,
    unique: bool,
    attempts: u32,
) -> Result<String, HttpResponse> {
    if !unique {
        return Ok(invite_code::generate());
    }

    for _ in 0..attempts.max(1) {
        let code = invite_code::generate();
        match storage.class_invite_code_exists(&code).await {
            Ok(false) => return Ok(code),
            Ok(true) => continue,
            Err(e) => {
                error!("Failed to check invite code uniqueness: {}", e);
                return Err(internal_error(
                    ErrorCode::ClassInviteCodeGenerationFailed,
                    "Failed to generate invite code",
                ));
            }
        }
    }

    warn!("No free invite code found after {} attempts", attempts);
    Err(internal_error(
        ErrorCode::ClassInviteCodeGenerationFailed,
        "Failed to generate a unique invite code",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::classes::test_support::fixture;
    use crate::services::test_support::{body_json, request_as};
    use actix_web::http::StatusCode;

    #[tokio::test]
    async fn test_unique_mode_avoids_existing_codes() {
        let fx = fixture().await;
        for _ in 0..20 {
            let code = generate_invite_code(fx.storage.as_ref(), true, 8)
                .await
                .unwrap();
            assert_ne!(code, fx.class.invite_code);
            assert!(invite_code::is_well_formed(&code));
        }
    }

    #[tokio::test]
    async fn test_owner_regenerates_code() {
        let fx = fixture().await;
        let service = ClassService::with_storage(fx.storage.clone());

        let resp = service
            .regenerate_invite_code(&request_as(&fx.teacher), fx.class.id)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let code = body["data"]["invite_code"].as_str().unwrap().to_string();

        let stored = fx.storage.get_class_by_id(fx.class.id).await.unwrap().unwrap();
        assert_eq!(stored.invite_code, code);
    }

    #[tokio::test]
    async fn test_other_teacher_cannot_regenerate() {
        let fx = fixture().await;
        let service = ClassService::with_storage(fx.storage.clone());

        let resp = service
            .regenerate_invite_code(&request_as(&fx.other_teacher), fx.class.id)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::ClassPermissionDenied as i32);
    }
}
