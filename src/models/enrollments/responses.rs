use serde::Serialize;
use ts_rs::TS;

use crate::models::{PaginationInfo, users::entities::User};

// 班级名单中的一名学生
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct EnrolledStudent {
    pub enrollment_id: i64,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
    pub student: User,
}

/// 班级学生名单响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct RosterResponse {
    pub pagination: PaginationInfo,
    pub items: Vec<EnrolledStudent>,
}
