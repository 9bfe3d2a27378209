use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    DayTemplate, DayTemplateItem, Member, NewDayTemplateData, NewDayTemplateItem, NewMemberData,
    NewTaskData, NewWeekTemplateData, Task, TaskOverride, UpdateTaskData, WeekOverride,
    WeekTemplate,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

// Re-export domain modules
pub mod tasks;
pub mod members;
pub mod templates;
pub mod overrides;

// Traits are defined in this module and implemented in respective domain modules

/// Domain-specific trait for task operations
#[async_trait]
pub trait TaskRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError>;
    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError>;
    /// Tasks of a family ordered by creation; deactivated ones only on request.
    async fn find_tasks(&self, family_id: Uuid, include_inactive: bool) -> Result<Vec<Task>, CoreError>;
    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError>;
    /// Soft delete: the row stays so existing references keep resolving.
    async fn deactivate_task(&self, id: Uuid) -> Result<Task, CoreError>;
}

/// Domain-specific trait for member lookups
#[async_trait]
pub trait MemberRepository {
    async fn add_member(&self, data: NewMemberData) -> Result<Member, CoreError>;
    async fn find_member_by_id(&self, id: Uuid) -> Result<Option<Member>, CoreError>;
    async fn find_members(&self, family_id: Uuid) -> Result<Vec<Member>, CoreError>;
}

/// Domain-specific trait for day and week templates
#[async_trait]
pub trait TemplateRepository {
    async fn add_day_template(&self, data: NewDayTemplateData) -> Result<DayTemplate, CoreError>;
    async fn add_day_template_item(&self, day_template_id: Uuid, item: NewDayTemplateItem) -> Result<DayTemplateItem, CoreError>;
    async fn remove_day_template_item(&self, item_id: Uuid) -> Result<(), CoreError>;
    async fn find_day_template_by_id(&self, id: Uuid) -> Result<Option<DayTemplate>, CoreError>;
    async fn find_day_templates(&self, family_id: Uuid) -> Result<Vec<DayTemplate>, CoreError>;
    async fn add_week_template(&self, data: NewWeekTemplateData) -> Result<WeekTemplate, CoreError>;
    async fn set_week_template_day(&self, week_template_id: Uuid, day_of_week: u8, day_template_id: Uuid) -> Result<WeekTemplate, CoreError>;
    async fn clear_week_template_day(&self, week_template_id: Uuid, day_of_week: u8) -> Result<WeekTemplate, CoreError>;
    async fn find_week_template_by_id(&self, id: Uuid) -> Result<Option<WeekTemplate>, CoreError>;
    async fn find_week_templates(&self, family_id: Uuid) -> Result<Vec<WeekTemplate>, CoreError>;
}

/// Domain-specific trait for the per-week override batches
#[async_trait]
pub trait OverrideRepository {
    async fn find_week_override(&self, family_id: Uuid, week_start: NaiveDate) -> Result<Option<WeekOverride>, CoreError>;
    /// Persists `overrides` in the given order, either after the existing
    /// ones or replacing them, in one transaction.
    async fn save_task_overrides(&self, family_id: Uuid, week_start: NaiveDate, overrides: &[TaskOverride], replace_existing: bool) -> Result<WeekOverride, CoreError>;
    /// Drops the week's overrides. Returns whether anything was stored.
    async fn clear_week_override(&self, family_id: Uuid, week_start: NaiveDate) -> Result<bool, CoreError>;
}

/// Everything the resolution engine reads, composed from the domain traits
#[async_trait]
pub trait ScheduleStore:
    TaskRepository +
    MemberRepository +
    TemplateRepository +
    OverrideRepository +
    Send +
    Sync
{
    // This trait automatically composes all domain-specific repositories
    // Individual domain operations are defined in their respective traits
}

/// SQLite implementation of the repository pattern
#[derive(Clone)]
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl ScheduleStore for SqliteRepository {}
