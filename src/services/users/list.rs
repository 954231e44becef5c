use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::UserService;
use crate::models::users::requests::{UserListParams, UserListQuery};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;
use crate::try_response;

pub async fn list_users(
    service: &UserService,
    request: &HttpRequest,
    query: UserListParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    let list_query = UserListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        role: query.role,
        status: query.status,
        department: query.department,
        search: query.search,
    };

    match storage.list_users_with_pagination(list_query).await {
        Ok(users) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            users,
            "Users retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to list users: {}", e);
            Ok(internal_error(
                ErrorCode::InternalServerError,
                "Failed to list users",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{body_json, request_as};
    use crate::services::users::test_support::users;

    #[tokio::test]
    async fn test_faculty_list_filters_by_role() {
        let (storage, admin, teacher) = users().await;
        let service = UserService::with_storage(storage);

        let query: UserListParams = serde_json::from_str(r#"{"role":"teacher"}"#).unwrap();
        let body = body_json(service.list_users(&request_as(&admin), query).await.unwrap()).await;
        assert_eq!(body["data"]["pagination"]["total"], 1);
        assert_eq!(body["data"]["items"][0]["id"], teacher.id);
    }
}
