use super::entities::{Capacity, ClassSchedule, ClassStatus};
use crate::models::common::{PaginationQuery, deserialize_optional_i64};
use serde::{Deserialize, Deserializer};
use ts_rs::TS;

// 班级查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[ts(type = "number | null")]
    pub subject_id: Option<i64>,
    pub status: Option<ClassStatus>,
}

// 创建班级请求
//
// # teacher_id 字段说明
// - **教师创建**：可选字段，不填写则自动使用当前登录教师的 ID
// - **管理员创建**：必填字段，用于指定负责该班级的教师
//
// # capacity 字段说明
// - 缺省或 null：不限人数
// - 非负整数：人数上限
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct CreateClassRequest {
    pub teacher_id: Option<i64>,
    pub subject_id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    #[ts(type = "number | null")]
    pub capacity: Capacity,
    #[serde(default)]
    pub status: ClassStatus,
    pub banner_url: Option<String>,
    #[serde(default)]
    pub schedules: Vec<ClassSchedule>,
}

// 更新班级请求
//
// capacity: 缺省表示不修改，null 表示改为不限人数
// description / banner_url: 缺省表示不修改，null 表示清空
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[ts(type = "string | null")]
    pub description: Option<Option<String>>,
    pub subject_id: Option<i64>,
    pub teacher_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[ts(type = "number | null")]
    pub capacity: Option<Capacity>,
    pub status: Option<ClassStatus>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[ts(type = "string | null")]
    pub banner_url: Option<Option<String>>,
    pub schedules: Option<Vec<ClassSchedule>>,
}

// 字段出现即为 Some，即使值为 null
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// 班级列表查询参数（用于存储层）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub teacher_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub status: Option<ClassStatus>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_capacity_absent_vs_null() {
        let absent: UpdateClassRequest = serde_json::from_str(r#"{"name":"Algebra I"}"#).unwrap();
        assert_eq!(absent.capacity, None);

        let null: UpdateClassRequest = serde_json::from_str(r#"{"capacity":null}"#).unwrap();
        assert_eq!(null.capacity, Some(Capacity::Unlimited));

        let limited: UpdateClassRequest = serde_json::from_str(r#"{"capacity":25}"#).unwrap();
        assert_eq!(limited.capacity, Some(Capacity::Limited(25)));
    }

    #[test]
    fn test_create_defaults() {
        let req: CreateClassRequest =
            serde_json::from_str(r#"{"subject_id":1,"name":"Physics A"}"#).unwrap();
        assert_eq!(req.capacity, Capacity::Unlimited);
        assert_eq!(req.status, ClassStatus::Active);
        assert!(req.schedules.is_empty());
        assert!(req.teacher_id.is_none());
    }
}
