//! 班级存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::classes::{ActiveModel, Column, Entity as Classes, Model as ClassModel};
use crate::entity::enrollments::{Column as EnrollmentColumn, Entity as Enrollments};
use crate::errors::{ClassroomError, Result};
use crate::models::{
    PaginationInfo,
    classes::{
        entities::ClassOffering,
        requests::{ClassListQuery, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};

/// 统计单个班级的已加入人数
pub(super) async fn count_enrolled<C: ConnectionTrait>(db: &C, class_id: i64) -> Result<i64> {
    let count = Enrollments::find()
        .filter(EnrollmentColumn::ClassId.eq(class_id))
        .count(db)
        .await
        .map_err(|e| ClassroomError::database_operation(format!("统计班级人数失败: {e}")))?;
    Ok(count as i64)
}

impl SeaOrmStorage {
    /// 批量统计班级已加入人数
    async fn enrolled_counts(&self, class_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        if class_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Enrollments::find()
            .select_only()
            .column(EnrollmentColumn::ClassId)
            .column_as(EnrollmentColumn::Id.count(), "count")
            .filter(EnrollmentColumn::ClassId.is_in(class_ids.iter().copied()))
            .group_by(EnrollmentColumn::ClassId)
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("统计班级人数失败: {e}")))?;

        Ok(rows.into_iter().collect())
    }

    async fn with_counts(&self, models: Vec<ClassModel>) -> Result<Vec<ClassOffering>> {
        let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
        let counts = self.enrolled_counts(&ids).await?;
        Ok(models
            .into_iter()
            .map(|m| {
                let enrolled = counts.get(&m.id).copied().unwrap_or(0);
                m.into_class_offering(enrolled)
            })
            .collect())
    }

    /// 对班级查询应用筛选、排序并分页
    pub(super) async fn paginate_classes(
        &self,
        mut select: Select<Classes>,
        query: ClassListQuery,
    ) -> Result<ClassListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        // 教师筛选
        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        // 课程筛选
        if let Some(subject_id) = query.subject_id {
            select = select.filter(Column::SubjectId.eq(subject_id));
        }

        // 状态筛选
        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(Column::Name.contains(&escaped));
        }

        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询班级总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询班级页数失败: {e}")))?;

        let classes = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询班级列表失败: {e}")))?;

        Ok(ClassListResponse {
            items: self.with_counts(classes).await?,
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 创建班级
    pub async fn create_class_impl(
        &self,
        req: CreateClassRequest,
        invite_code: String,
    ) -> Result<ClassOffering> {
        let now = chrono::Utc::now().timestamp();

        // teacher_id 必须由服务层确保已设置
        let teacher_id = req.teacher_id.ok_or_else(|| {
            ClassroomError::validation("teacher_id must be set before calling create_class")
        })?;
        let schedules = serde_json::to_string(&req.schedules)?;

        let model = ActiveModel {
            name: Set(req.name),
            description: Set(req.description),
            subject_id: Set(req.subject_id),
            teacher_id: Set(teacher_id),
            capacity: Set(req.capacity.to_column()),
            status: Set(req.status.to_string()),
            invite_code: Set(invite_code),
            banner_url: Set(req.banner_url),
            schedules: Set(schedules),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("创建班级失败: {e}")))?;

        Ok(result.into_class_offering(0))
    }

    /// 通过 ID 获取班级
    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<ClassOffering>> {
        let result = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询班级失败: {e}")))?;

        match result {
            Some(model) => {
                let enrolled = count_enrolled(&self.db, model.id).await?;
                Ok(Some(model.into_class_offering(enrolled)))
            }
            None => Ok(None),
        }
    }

    /// 分页列出班级
    pub async fn list_classes_with_pagination_impl(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse> {
        self.paginate_classes(Classes::find(), query).await
    }

    /// 更新班级信息
    pub async fn update_class_impl(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<ClassOffering>> {
        // 先检查班级是否存在
        if Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询班级失败: {e}")))?
            .is_none()
        {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(class_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(subject_id) = update.subject_id {
            model.subject_id = Set(subject_id);
        }
        if let Some(teacher_id) = update.teacher_id {
            model.teacher_id = Set(teacher_id);
        }
        if let Some(capacity) = update.capacity {
            model.capacity = Set(capacity.to_column());
        }
        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }
        if let Some(banner_url) = update.banner_url {
            model.banner_url = Set(banner_url);
        }
        if let Some(schedules) = update.schedules {
            model.schedules = Set(serde_json::to_string(&schedules)?);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("更新班级失败: {e}")))?;

        self.get_class_by_id_impl(class_id).await
    }

    /// 替换班级邀请码
    pub async fn update_class_invite_code_impl(
        &self,
        class_id: i64,
        invite_code: String,
    ) -> Result<Option<ClassOffering>> {
        let result = Classes::update_many()
            .col_expr(
                Column::InviteCode,
                sea_orm::sea_query::Expr::value(invite_code),
            )
            .col_expr(
                Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(Column::Id.eq(class_id))
            .exec(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("更新邀请码失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_class_by_id_impl(class_id).await
    }

    pub async fn class_invite_code_exists_impl(&self, invite_code: &str) -> Result<bool> {
        let count = Classes::find()
            .filter(Column::InviteCode.eq(invite_code))
            .count(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("查询邀请码失败: {e}")))?;
        Ok(count > 0)
    }

    /// 删除班级
    pub async fn delete_class_impl(&self, class_id: i64) -> Result<bool> {
        let result = Classes::delete_by_id(class_id)
            .exec(&self.db)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("删除班级失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
