use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 选课记录，创建后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct Enrollment {
    pub id: i64,
    pub class_id: i64,
    pub student_id: i64,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
}

/// 存储层写入选课记录的结果
///
/// 写入时在事务内重新检查班级状态和容量，未通过时不会写入。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    Created(Enrollment),
    ClassNotFound,
    ClassInactive,
    ClassFull,
    AlreadyEnrolled,
}
