pub mod admission;
pub mod join;
pub mod list;
pub mod mine;
pub mod remove;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::classes::requests::ClassQueryParams;
use crate::models::enrollments::requests::{EnrollmentListParams, JoinClassRequest};
use crate::storage::Storage;

pub struct EnrollmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl EnrollmentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        super::resolve_storage(&self.storage, request)
    }

    // 学生通过邀请码加入班级
    pub async fn join_class(
        &self,
        request: &HttpRequest,
        class_id: i64,
        join_data: JoinClassRequest,
    ) -> ActixResult<HttpResponse> {
        join::join_class(self, request, class_id, join_data).await
    }

    // 班级学生名单
    pub async fn list_class_enrollments(
        &self,
        request: &HttpRequest,
        class_id: i64,
        query: EnrollmentListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_class_enrollments(self, request, class_id, query).await
    }

    // 将学生移出班级
    pub async fn remove_enrollment(
        &self,
        request: &HttpRequest,
        class_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        remove::remove_enrollment(self, request, class_id, student_id).await
    }

    // 当前学生已加入的班级
    pub async fn list_my_classes(
        &self,
        request: &HttpRequest,
        query: ClassQueryParams,
    ) -> ActixResult<HttpResponse> {
        mine::list_my_classes(self, request, query).await
    }
}
