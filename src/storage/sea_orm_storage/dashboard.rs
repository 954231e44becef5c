//! 统计查询

use super::SeaOrmStorage;
use crate::entity::classes::{Column as ClassColumn, Entity as Classes};
use crate::entity::enrollments::Entity as Enrollments;
use crate::entity::subjects::Entity as Subjects;
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{ClassroomError, Result};
use crate::models::{
    classes::entities::ClassStatus,
    dashboard::responses::{ClassStatusCounts, DashboardStats, UserRoleCounts},
    users::entities::UserRole,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QuerySelect};

impl SeaOrmStorage {
    pub async fn get_dashboard_stats_impl(&self) -> Result<DashboardStats> {
        let mut stats = DashboardStats::default();

        let roles = Users::find()
            .select_only()
            .column(UserColumn::Role)
            .column_as(UserColumn::Id.count(), "count")
            .group_by(UserColumn::Role)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("统计用户失败: {e}")))?;
        let mut users = UserRoleCounts::default();
        for (role, count) in roles {
            match role.parse::<UserRole>() {
                Ok(UserRole::Admin) => users.admin = count,
                Ok(UserRole::Teacher) => users.teacher = count,
                Ok(UserRole::Student) => users.student = count,
                Err(_) => {}
            }
        }
        stats.users = users;

        let statuses = Classes::find()
            .select_only()
            .column(ClassColumn::Status)
            .column_as(ClassColumn::Id.count(), "count")
            .group_by(ClassColumn::Status)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("统计班级失败: {e}")))?;
        let mut classes = ClassStatusCounts::default();
        for (status, count) in statuses {
            match status.parse::<ClassStatus>() {
                Ok(ClassStatus::Active) => classes.active = count,
                Ok(ClassStatus::Inactive) => classes.inactive = count,
                Err(_) => {}
            }
        }
        stats.classes = classes;

        stats.subjects = Subjects::find()
            .count(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("统计课程失败: {e}")))?
            as i64;
        stats.enrollments = Enrollments::find()
            .count(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("统计选课失败: {e}")))?
            as i64;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{class, memory_storage, subject, user};
    use crate::models::users::entities::UserRole;

    #[tokio::test]
    async fn test_dashboard_counts() {
        let storage = memory_storage().await;
        user(&storage, "Root Admin", UserRole::Admin).await;
        let teacher = user(&storage, "Ada Lovelace", UserRole::Teacher).await;
        let student = user(&storage, "Grace Hopper", UserRole::Student).await;
        user(&storage, "Alan Turing", UserRole::Student).await;
        let math = subject(&storage, "MTH-101").await;
        let algebra = class(&storage, teacher.id, math.id, "null", "ABC123").await;
        storage
            .create_enrollment_impl(algebra.id, student.id)
            .await
            .unwrap();

        let stats = storage.get_dashboard_stats_impl().await.unwrap();
        assert_eq!(stats.users.admin, 1);
        assert_eq!(stats.users.teacher, 1);
        assert_eq!(stats.users.student, 2);
        assert_eq!(stats.subjects, 1);
        assert_eq!(stats.classes.active, 1);
        assert_eq!(stats.classes.inactive, 0);
        assert_eq!(stats.enrollments, 1);
    }
}
