use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Default, Serialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct UserRoleCounts {
    pub admin: i64,
    pub teacher: i64,
    pub student: i64,
}

#[derive(Debug, Default, Serialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct ClassStatusCounts {
    pub active: i64,
    pub inactive: i64,
}

// 管理员仪表盘统计
#[derive(Debug, Default, Serialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct DashboardStats {
    pub users: UserRoleCounts,
    pub subjects: i64,
    pub classes: ClassStatusCounts,
    pub enrollments: i64,
}
