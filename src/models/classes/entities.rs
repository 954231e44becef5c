use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 班级容量
///
/// 序列化为 `null`（不限）或非负整数。`Limited(0)` 表示不接受任何学生。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capacity {
    #[default]
    Unlimited,
    Limited(u32),
}

impl Capacity {
    /// 从数据库列值构造；负数按 0 处理
    pub fn from_column(value: Option<i64>) -> Self {
        match value {
            None => Capacity::Unlimited,
            Some(n) => Capacity::Limited(n.clamp(0, u32::MAX as i64) as u32),
        }
    }

    pub fn to_column(self) -> Option<i64> {
        match self {
            Capacity::Unlimited => None,
            Capacity::Limited(n) => Some(n as i64),
        }
    }

    /// 在已有 `enrolled` 名学生的情况下是否还有空位
    pub fn has_room_for(self, enrolled: i64) -> bool {
        match self {
            Capacity::Unlimited => true,
            Capacity::Limited(n) => enrolled < n as i64,
        }
    }
}

impl Serialize for Capacity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Capacity::Unlimited => serializer.serialize_none(),
            Capacity::Limited(n) => serializer.serialize_some(n),
        }
    }
}

impl<'de> Deserialize<'de> for Capacity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Option::<i64>::deserialize(deserializer)? {
            None => Ok(Capacity::Unlimited),
            Some(n) if n < 0 => Err(serde::de::Error::custom(format!(
                "班级容量不能为负数: {n}"
            ))),
            Some(n) => u32::try_from(n)
                .map(Capacity::Limited)
                .map_err(|_| serde::de::Error::custom(format!("班级容量过大: {n}"))),
        }
    }
}

// 班级状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "class.ts")]
pub enum ClassStatus {
    #[default]
    Active, // 开放加入
    Inactive, // 停止加入
}

impl<'de> Deserialize<'de> for ClassStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<ClassStatus>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的班级状态: '{s}'. 支持的状态: active, inactive"
            ))
        })
    }
}

impl std::fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassStatus::Active => write!(f, "active"),
            ClassStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for ClassStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ClassStatus::Active),
            "inactive" => Ok(ClassStatus::Inactive),
            _ => Err(format!("Invalid class status: {s}")),
        }
    }
}

// 上课时间
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassSchedule {
    // 星期，如 "Monday"
    pub day: String,
    // HH:MM
    pub start_time: String,
    // HH:MM
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "class.ts")]
pub struct ClassOffering {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub subject_id: i64,
    pub teacher_id: i64,
    #[ts(type = "number | null")]
    pub capacity: Capacity,
    pub status: ClassStatus,
    // 规范化后的邀请码（6 位大写字母数字）
    pub invite_code: String,
    pub banner_url: Option<String>,
    pub schedules: Vec<ClassSchedule>,
    // 当前已加入的学生数（查询时统计）
    pub enrolled_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ClassOffering {
    pub fn is_accepting_enrollment(&self) -> bool {
        self.status == ClassStatus::Active
    }

    pub fn has_room(&self) -> bool {
        self.capacity.has_room_for(self.enrolled_count)
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.teacher_id == user_id
    }
}
