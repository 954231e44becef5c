use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::SubjectService;
use crate::models::subjects::requests::{SubjectListQuery, SubjectQueryParams};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;
use crate::try_response;

pub async fn list_subjects(
    service: &SubjectService,
    request: &HttpRequest,
    query: SubjectQueryParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    let list_query = SubjectListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        department: query.department,
        search: query.search,
    };

    match storage.list_subjects_with_pagination(list_query).await {
        Ok(subjects) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            subjects,
            "Subjects retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to list subjects: {}", e);
            Ok(internal_error(
                ErrorCode::InternalServerError,
                "Failed to list subjects",
            ))
        }
    }
}
