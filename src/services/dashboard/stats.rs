use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::DashboardService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;
use crate::try_response;

pub async fn get_stats(
    service: &DashboardService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.get_dashboard_stats().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            stats,
            "Dashboard statistics retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to get dashboard statistics: {}", e);
            Ok(internal_error(
                ErrorCode::InternalServerError,
                "Failed to get dashboard statistics",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::classes::test_support::fixture;
    use crate::services::test_support::{body_json, request_as};
    use actix_web::http::StatusCode;

    #[tokio::test]
    async fn test_stats_envelope() {
        let fx = fixture().await;
        fx.storage
            .create_enrollment(fx.class.id, fx.student.id)
            .await
            .unwrap();
        let service = DashboardService::with_storage(fx.storage.clone());

        let resp = service.get_stats(&request_as(&fx.admin)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["users"]["teacher"], 2);
        assert_eq!(body["data"]["users"]["student"], 1);
        assert_eq!(body["data"]["classes"]["active"], 1);
        assert_eq!(body["data"]["enrollments"], 1);
    }
}
