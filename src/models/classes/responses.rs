use super::entities::{Capacity, ClassOffering, ClassSchedule, ClassStatus};
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

// 班级详情响应
//
// 邀请码仅对班级教师与管理员可见
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassOfferingResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub subject_id: i64,
    pub teacher_id: i64,
    #[ts(type = "number | null")]
    pub capacity: Capacity,
    pub status: ClassStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
    pub banner_url: Option<String>,
    pub schedules: Vec<ClassSchedule>,
    pub enrolled_count: i64,
    // 当前是否可以加入
    pub can_join: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ClassOfferingResponse {
    pub fn new(class: ClassOffering, reveal_invite_code: bool) -> Self {
        let can_join = crate::services::enrollments::admission::can_join(&class);
        Self {
            id: class.id,
            name: class.name,
            description: class.description,
            subject_id: class.subject_id,
            teacher_id: class.teacher_id,
            capacity: class.capacity,
            status: class.status,
            invite_code: reveal_invite_code.then_some(class.invite_code),
            banner_url: class.banner_url,
            schedules: class.schedules,
            enrolled_count: class.enrolled_count,
            can_join,
            created_at: class.created_at,
            updated_at: class.updated_at,
        }
    }
}

// 班级列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassListResponse {
    pub pagination: PaginationInfo,
    pub items: Vec<ClassOffering>,
}

// 面向前端的班级列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassOfferingListResponse {
    pub pagination: PaginationInfo,
    pub items: Vec<ClassOfferingResponse>,
}

impl ClassOfferingListResponse {
    pub fn new(list: ClassListResponse, reveal: impl Fn(&ClassOffering) -> bool) -> Self {
        Self {
            pagination: list.pagination,
            items: list
                .items
                .into_iter()
                .map(|class| {
                    let show = reveal(&class);
                    ClassOfferingResponse::new(class, show)
                })
                .collect(),
        }
    }
}

// 重新生成邀请码响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct InviteCodeResponse {
    pub class_id: i64,
    pub invite_code: String,
}
