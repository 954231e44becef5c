//! 选课存储操作

use super::SeaOrmStorage;
use super::classes::count_enrolled;
use crate::entity::classes::{Column as ClassColumn, Entity as Classes};
use crate::entity::enrollments::{ActiveModel, Column, Entity as Enrollments};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{ClassroomError, Result};
use crate::models::{
    PaginationInfo,
    classes::{
        entities::{Capacity, ClassStatus},
        requests::ClassListQuery,
        responses::ClassListResponse,
    },
    enrollments::{
        entities::{Enrollment, EnrollmentOutcome},
        requests::EnrollmentQuery,
        responses::{EnrolledStudent, RosterResponse},
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbBackend, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr, TransactionTrait,
};

impl SeaOrmStorage {
    /// 写入选课记录
    ///
    /// 在事务内重新读取班级并统计人数，状态或容量不满足时不写入；
    /// (class_id, student_id) 唯一索引拦截重复加入。
    pub async fn create_enrollment_impl(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> Result<EnrollmentOutcome> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ClassroomError::database_operation(format!("开启事务失败: {e}")))?;

        // SQLite 没有行锁：先执行一次空写拿到写锁，之后的读取都在写锁下进行，
        // 否则并发事务会在升级为写事务时得到 SQLITE_BUSY
        let mut class_query = Classes::find_by_id(class_id);
        if self.db.get_database_backend() == DbBackend::Sqlite {
            Classes::update_many()
                .col_expr(ClassColumn::UpdatedAt, Expr::col(ClassColumn::UpdatedAt).into())
                .filter(ClassColumn::Id.eq(class_id))
                .exec(&txn)
                .await
                .map_err(|e| ClassroomError::database_operation(format!("锁定班级失败: {e}")))?;
        } else {
            class_query = class_query.lock_exclusive();
        }
        let Some(class) = class_query
            .one(&txn)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询班级失败: {e}")))?
        else {
            return Ok(EnrollmentOutcome::ClassNotFound);
        };

        if class.status.parse::<ClassStatus>() != Ok(ClassStatus::Active) {
            return Ok(EnrollmentOutcome::ClassInactive);
        }

        let existing = Enrollments::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&txn)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询选课记录失败: {e}")))?;
        if existing.is_some() {
            return Ok(EnrollmentOutcome::AlreadyEnrolled);
        }

        let enrolled = count_enrolled(&txn, class_id).await?;
        if !Capacity::from_column(class.capacity).has_room_for(enrolled) {
            return Ok(EnrollmentOutcome::ClassFull);
        }

        let model = ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
            enrolled_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let inserted = match model.insert(&txn).await {
            Ok(inserted) => inserted,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Ok(EnrollmentOutcome::AlreadyEnrolled);
            }
            Err(e) => {
                return Err(ClassroomError::database_operation(format!(
                    "写入选课记录失败: {e}"
                )));
            }
        };

        txn.commit()
            .await
            .map_err(|e| ClassroomError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(EnrollmentOutcome::Created(inserted.into_enrollment()))
    }

    pub async fn get_enrollment_impl(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> Result<Option<Enrollment>> {
        let result = Enrollments::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询选课记录失败: {e}")))?;

        Ok(result.map(|m| m.into_enrollment()))
    }

    /// 分页列出班级学生名单
    pub async fn list_class_enrollments_with_pagination_impl(
        &self,
        class_id: i64,
        query: EnrollmentQuery,
    ) -> Result<RosterResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Enrollments::find()
            .find_also_related(Users)
            .filter(Column::ClassId.eq(class_id));

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(UserColumn::Name.contains(&escaped))
                    .add(UserColumn::Email.contains(&escaped)),
            );
        }

        let paginator = select
            .order_by_asc(Column::EnrolledAt)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询名单总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询名单页数失败: {e}")))?;

        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询班级名单失败: {e}")))?;

        let items = rows
            .into_iter()
            .filter_map(|(enrollment, student)| {
                student.map(|student| EnrolledStudent {
                    enrollment_id: enrollment.id,
                    enrolled_at: chrono::DateTime::<chrono::Utc>::from_timestamp(
                        enrollment.enrolled_at,
                        0,
                    )
                    .unwrap_or_default(),
                    student: student.into_user(),
                })
            })
            .collect();

        Ok(RosterResponse {
            items,
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 分页列出学生已加入的班级
    pub async fn list_student_classes_with_pagination_impl(
        &self,
        student_id: i64,
        query: ClassListQuery,
    ) -> Result<ClassListResponse> {
        let select = Classes::find()
            .join(
                JoinType::InnerJoin,
                crate::entity::classes::Relation::Enrollments.def(),
            )
            .filter(Column::StudentId.eq(student_id));
        self.paginate_classes(select, query).await
    }

    pub async fn delete_enrollment_impl(&self, class_id: i64, student_id: i64) -> Result<bool> {
        let result = Enrollments::delete_many()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::StudentId.eq(student_id))
            .exec(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("移除选课记录失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{
        class, file_storage, memory_storage, remove_file_storage, subject, user,
    };
    use super::*;
    use crate::models::classes::requests::UpdateClassRequest;
    use crate::models::users::entities::UserRole;

    #[tokio::test]
    async fn test_enrollment_created_and_counted() {
        let storage = memory_storage().await;
        let teacher = user(&storage, "Ada Lovelace", UserRole::Teacher).await;
        let student = user(&storage, "Grace Hopper", UserRole::Student).await;
        let math = subject(&storage, "MTH-101").await;
        let offering = class(&storage, teacher.id, math.id, "30", "ABC123").await;

        let outcome = storage
            .create_enrollment_impl(offering.id, student.id)
            .await
            .unwrap();
        let EnrollmentOutcome::Created(enrollment) = outcome else {
            panic!("expected enrollment, got {outcome:?}");
        };
        assert_eq!(enrollment.class_id, offering.id);
        assert_eq!(enrollment.student_id, student.id);

        let refreshed = storage
            .get_class_by_id_impl(offering.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.enrolled_count, 1);
        assert!(
            storage
                .get_enrollment_impl(offering.id, student.id)
                .await
                .unwrap()
                .is_some()
        );
    }

    /// 多个学生同时加入同一班级，返回每个请求的结果
    async fn join_concurrently(
        storage: &SeaOrmStorage,
        class_id: i64,
        students: usize,
    ) -> Vec<Result<EnrollmentOutcome>> {
        let mut ids = Vec::with_capacity(students);
        for i in 0..students {
            ids.push(user(storage, &format!("Student {i}"), UserRole::Student).await.id);
        }

        let handles: Vec<_> = ids
            .into_iter()
            .map(|student_id| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.create_enrollment_impl(class_id, student_id).await })
            })
            .collect();

        let mut results = Vec::with_capacity(students);
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_on_file_database_all_succeed() {
        let (storage, path) = file_storage("concurrent-joins", 8).await;
        let teacher = user(&storage, "Ada Lovelace", UserRole::Teacher).await;
        let math = subject(&storage, "MTH-101").await;
        let offering = class(&storage, teacher.id, math.id, "100", "ABC123").await;

        let results = join_concurrently(&storage, offering.id, 16).await;
        let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert!(errors.is_empty(), "joins failed: {errors:?}");
        assert!(
            results
                .iter()
                .all(|r| matches!(r, Ok(EnrollmentOutcome::Created(_))))
        );

        let refreshed = storage
            .get_class_by_id_impl(offering.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.enrolled_count, 16);
        remove_file_storage(&path);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_never_exceed_capacity() {
        let (storage, path) = file_storage("concurrent-capacity", 8).await;
        let teacher = user(&storage, "Ada Lovelace", UserRole::Teacher).await;
        let math = subject(&storage, "MTH-101").await;
        let offering = class(&storage, teacher.id, math.id, "5", "ABC123").await;

        let results = join_concurrently(&storage, offering.id, 16).await;
        let created = results
            .iter()
            .filter(|r| matches!(r, Ok(EnrollmentOutcome::Created(_))))
            .count();
        let full = results
            .iter()
            .filter(|r| matches!(r, Ok(EnrollmentOutcome::ClassFull)))
            .count();
        assert_eq!(created, 5);
        assert_eq!(full, 11);

        let refreshed = storage
            .get_class_by_id_impl(offering.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.enrolled_count, 5);
        remove_file_storage(&path);
    }

    #[tokio::test]
    async fn test_duplicate_enrollment_rejected() {
        let storage = memory_storage().await;
        let teacher = user(&storage, "Ada Lovelace", UserRole::Teacher).await;
        let student = user(&storage, "Grace Hopper", UserRole::Student).await;
        let math = subject(&storage, "MTH-101").await;
        let offering = class(&storage, teacher.id, math.id, "null", "ABC123").await;

        storage
            .create_enrollment_impl(offering.id, student.id)
            .await
            .unwrap();
        let again = storage
            .create_enrollment_impl(offering.id, student.id)
            .await
            .unwrap();
        assert_eq!(again, EnrollmentOutcome::AlreadyEnrolled);
    }

    #[tokio::test]
    async fn test_guard_refuses_full_and_inactive_classes() {
        let storage = memory_storage().await;
        let teacher = user(&storage, "Ada Lovelace", UserRole::Teacher).await;
        let first = user(&storage, "Grace Hopper", UserRole::Student).await;
        let second = user(&storage, "Katherine Johnson", UserRole::Student).await;
        let math = subject(&storage, "MTH-101").await;

        let single_seat = class(&storage, teacher.id, math.id, "1", "ABC123").await;
        assert!(matches!(
            storage
                .create_enrollment_impl(single_seat.id, first.id)
                .await
                .unwrap(),
            EnrollmentOutcome::Created(_)
        ));
        assert_eq!(
            storage
                .create_enrollment_impl(single_seat.id, second.id)
                .await
                .unwrap(),
            EnrollmentOutcome::ClassFull
        );

        let no_seats = class(&storage, teacher.id, math.id, "0", "DEF456").await;
        assert_eq!(
            storage
                .create_enrollment_impl(no_seats.id, first.id)
                .await
                .unwrap(),
            EnrollmentOutcome::ClassFull
        );

        let closed = class(&storage, teacher.id, math.id, "null", "XYZ789").await;
        let update: UpdateClassRequest = serde_json::from_str(r#"{"status":"inactive"}"#).unwrap();
        storage.update_class_impl(closed.id, update).await.unwrap();
        assert_eq!(
            storage
                .create_enrollment_impl(closed.id, first.id)
                .await
                .unwrap(),
            EnrollmentOutcome::ClassInactive
        );

        assert_eq!(
            storage.create_enrollment_impl(9999, first.id).await.unwrap(),
            EnrollmentOutcome::ClassNotFound
        );
    }

    #[tokio::test]
    async fn test_roster_and_student_classes() {
        let storage = memory_storage().await;
        let teacher = user(&storage, "Ada Lovelace", UserRole::Teacher).await;
        let grace = user(&storage, "Grace Hopper", UserRole::Student).await;
        let kat = user(&storage, "Katherine Johnson", UserRole::Student).await;
        let math = subject(&storage, "MTH-101").await;
        let algebra = class(&storage, teacher.id, math.id, "null", "ABC123").await;
        let geometry = class(&storage, teacher.id, math.id, "null", "DEF456").await;

        storage.create_enrollment_impl(algebra.id, grace.id).await.unwrap();
        storage.create_enrollment_impl(algebra.id, kat.id).await.unwrap();
        storage.create_enrollment_impl(geometry.id, grace.id).await.unwrap();

        let roster = storage
            .list_class_enrollments_with_pagination_impl(algebra.id, EnrollmentQuery::default())
            .await
            .unwrap();
        assert_eq!(roster.pagination.total, 2);
        assert_eq!(roster.items.len(), 2);

        let searched = storage
            .list_class_enrollments_with_pagination_impl(
                algebra.id,
                EnrollmentQuery {
                    search: Some("katherine".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(searched.items.len(), 1);
        assert_eq!(searched.items[0].student.id, kat.id);

        let mine = storage
            .list_student_classes_with_pagination_impl(grace.id, ClassListQuery::default())
            .await
            .unwrap();
        assert_eq!(mine.pagination.total, 2);
        let algebra_row = mine.items.iter().find(|c| c.id == algebra.id).unwrap();
        assert_eq!(algebra_row.enrolled_count, 2);

        assert!(storage.delete_enrollment_impl(algebra.id, kat.id).await.unwrap());
        assert!(!storage.delete_enrollment_impl(algebra.id, kat.id).await.unwrap());
    }
}
