//! 班级实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub subject_id: i64,
    pub teacher_id: i64,
    // NULL 表示不限人数
    pub capacity: Option<i64>,
    pub status: String,
    pub invite_code: String,
    pub banner_url: Option<String>,
    // JSON 数组
    pub schedules: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::TeacherId",
        to = "super::users::Column::Id"
    )]
    Teacher,
    #[sea_orm(
        belongs_to = "super::subjects::Entity",
        from = "Column::SubjectId",
        to = "super::subjects::Column::Id"
    )]
    Subject,
    #[sea_orm(has_many = "super::enrollments::Entity")]
    Enrollments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::subjects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl Related<super::enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型，enrolled_count 由调用方统计
impl Model {
    pub fn into_class_offering(
        self,
        enrolled_count: i64,
    ) -> crate::models::classes::entities::ClassOffering {
        use crate::models::classes::entities::{Capacity, ClassOffering, ClassStatus};
        use chrono::{DateTime, Utc};

        ClassOffering {
            id: self.id,
            name: self.name,
            description: self.description,
            subject_id: self.subject_id,
            teacher_id: self.teacher_id,
            capacity: Capacity::from_column(self.capacity),
            status: self
                .status
                .parse::<ClassStatus>()
                .unwrap_or(ClassStatus::Inactive),
            invite_code: self.invite_code,
            banner_url: self.banner_url,
            schedules: serde_json::from_str(&self.schedules).unwrap_or_default(),
            enrolled_count,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
