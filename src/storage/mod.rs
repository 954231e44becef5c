use std::sync::Arc;

use crate::models::{
    classes::{
        entities::ClassOffering,
        requests::{ClassListQuery, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
    dashboard::responses::DashboardStats,
    enrollments::{
        entities::{Enrollment, EnrollmentOutcome},
        requests::EnrollmentQuery,
        responses::RosterResponse,
    },
    subjects::{
        entities::Subject,
        requests::{CreateSubjectRequest, SubjectListQuery, UpdateSubjectRequest},
        responses::SubjectListResponse,
    },
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 统计用户总数
    async fn count_users(&self) -> Result<u64>;

    /// 课程管理方法
    async fn create_subject(&self, subject: CreateSubjectRequest) -> Result<Subject>;
    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>>;
    async fn get_subject_by_code(&self, code: &str) -> Result<Option<Subject>>;
    async fn list_subjects_with_pagination(
        &self,
        query: SubjectListQuery,
    ) -> Result<SubjectListResponse>;
    async fn update_subject(
        &self,
        id: i64,
        update: UpdateSubjectRequest,
    ) -> Result<Option<Subject>>;
    async fn delete_subject(&self, id: i64) -> Result<bool>;
    // 统计使用该课程的班级数量
    async fn count_classes_by_subject(&self, subject_id: i64) -> Result<u64>;

    /// 班级管理方法
    // 创建班级，teacher_id 必须已由服务层确定
    async fn create_class(
        &self,
        class: CreateClassRequest,
        invite_code: String,
    ) -> Result<ClassOffering>;
    // 通过ID获取班级信息（含已加入人数）
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<ClassOffering>>;
    // 列出班级
    async fn list_classes_with_pagination(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse>;
    // 更新班级信息
    async fn update_class(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<ClassOffering>>;
    // 更新班级邀请码
    async fn update_class_invite_code(
        &self,
        class_id: i64,
        invite_code: String,
    ) -> Result<Option<ClassOffering>>;
    // 邀请码是否已被任一班级使用
    async fn class_invite_code_exists(&self, invite_code: &str) -> Result<bool>;
    // 删除班级
    async fn delete_class(&self, class_id: i64) -> Result<bool>;

    /// 选课管理方法
    // 写入选课记录，事务内复查班级状态与容量
    async fn create_enrollment(&self, class_id: i64, student_id: i64)
    -> Result<EnrollmentOutcome>;
    async fn get_enrollment(&self, class_id: i64, student_id: i64) -> Result<Option<Enrollment>>;
    // 分页列出班级学生名单
    async fn list_class_enrollments_with_pagination(
        &self,
        class_id: i64,
        query: EnrollmentQuery,
    ) -> Result<RosterResponse>;
    // 分页列出学生已加入的班级
    async fn list_student_classes_with_pagination(
        &self,
        student_id: i64,
        query: ClassListQuery,
    ) -> Result<ClassListResponse>;
    async fn delete_enrollment(&self, class_id: i64, student_id: i64) -> Result<bool>;

    /// 统计
    async fn get_dashboard_stats(&self) -> Result<DashboardStats>;
}

/// 创建存储实例
pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
