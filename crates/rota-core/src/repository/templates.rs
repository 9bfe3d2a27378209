use crate::calendar;
use crate::error::CoreError;
use crate::models::{
    DayTemplate, DayTemplateItem, NewDayTemplateData, NewDayTemplateItem, NewWeekTemplateData,
    Task, WeekTemplate, WeekTemplateDay,
};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

#[async_trait]
impl super::TemplateRepository for SqliteRepository {
    async fn add_day_template(&self, data: NewDayTemplateData) -> Result<DayTemplate, CoreError> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("Day template name cannot be empty".to_string()));
        }

        let mut tx = self.pool().begin().await?;
        let template: DayTemplate = sqlx::query_as(
            r#"INSERT INTO day_templates (id, family_id, name, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *"#,
        )
        .bind(Uuid::now_v7())
        .bind(data.family_id)
        .bind(name)
        .bind(&data.description)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(template)
    }

    async fn add_day_template_item(
        &self,
        day_template_id: Uuid,
        item: NewDayTemplateItem,
    ) -> Result<DayTemplateItem, CoreError> {
        if let Some(duration) = item.override_duration {
            if duration <= 0 {
                return Err(CoreError::InvalidInput(format!(
                    "Override duration must be positive, got {}",
                    duration
                )));
            }
        }

        let mut tx = self.pool().begin().await?;

        let template: Option<DayTemplate> = sqlx::query_as("SELECT * FROM day_templates WHERE id = $1")
            .bind(day_template_id)
            .fetch_optional(&mut *tx)
            .await?;
        let template = template.ok_or_else(|| {
            CoreError::NotFound(format!("Day template with id {} not found", day_template_id))
        })?;

        let task: Option<Task> = sqlx::query_as("SELECT * FROM tasks WHERE id = $1 AND family_id = $2")
            .bind(item.task_id)
            .bind(template.family_id)
            .fetch_optional(&mut *tx)
            .await?;
        if task.is_none() {
            return Err(CoreError::NotFound(format!("Task with id {} not found", item.task_id)));
        }

        if let Some(member_id) = item.member_id {
            let exists: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM members WHERE id = $1 AND family_id = $2")
                    .bind(member_id)
                    .bind(template.family_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if exists.is_none() {
                return Err(CoreError::NotFound(format!("Member with id {} not found", member_id)));
            }
        }

        let (next_position,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM day_template_items WHERE day_template_id = $1",
        )
        .bind(day_template_id)
        .fetch_one(&mut *tx)
        .await?;

        let saved: DayTemplateItem = sqlx::query_as(
            r#"INSERT INTO day_template_items (id, day_template_id, position, task_id, member_id, override_time, override_duration)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *"#,
        )
        .bind(Uuid::now_v7())
        .bind(day_template_id)
        .bind(next_position)
        .bind(item.task_id)
        .bind(item.member_id)
        .bind(item.override_time)
        .bind(item.override_duration)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn remove_day_template_item(&self, item_id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM day_template_items WHERE id = $1")
            .bind(item_id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Day template item with id {} not found", item_id)));
        }
        Ok(())
    }

    async fn find_day_template_by_id(&self, id: Uuid) -> Result<Option<DayTemplate>, CoreError> {
        let template: Option<DayTemplate> = sqlx::query_as("SELECT * FROM day_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        match template {
            Some(mut template) => {
                template.items = sqlx::query_as(
                    "SELECT * FROM day_template_items WHERE day_template_id = $1 ORDER BY position",
                )
                .bind(id)
                .fetch_all(self.pool())
                .await?;
                Ok(Some(template))
            }
            None => Ok(None),
        }
    }

    async fn find_day_templates(&self, family_id: Uuid) -> Result<Vec<DayTemplate>, CoreError> {
        let mut templates: Vec<DayTemplate> =
            sqlx::query_as("SELECT * FROM day_templates WHERE family_id = $1 ORDER BY created_at, id")
                .bind(family_id)
                .fetch_all(self.pool())
                .await?;

        let items: Vec<DayTemplateItem> = sqlx::query_as(
            r#"SELECT i.* FROM day_template_items i
            JOIN day_templates d ON d.id = i.day_template_id
            WHERE d.family_id = $1
            ORDER BY i.day_template_id, i.position"#,
        )
        .bind(family_id)
        .fetch_all(self.pool())
        .await?;

        for item in items {
            if let Some(template) = templates.iter_mut().find(|t| t.id == item.day_template_id) {
                template.items.push(item);
            }
        }
        Ok(templates)
    }

    async fn add_week_template(&self, data: NewWeekTemplateData) -> Result<WeekTemplate, CoreError> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("Week template name cannot be empty".to_string()));
        }

        let mut tx = self.pool().begin().await?;

        // At most one default per family.
        if data.is_default {
            sqlx::query("UPDATE week_templates SET is_default = FALSE WHERE family_id = $1")
                .bind(data.family_id)
                .execute(&mut *tx)
                .await?;
        }

        let template: WeekTemplate = sqlx::query_as(
            r#"INSERT INTO week_templates (id, family_id, name, is_default, apply_rule, priority, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *"#,
        )
        .bind(Uuid::now_v7())
        .bind(data.family_id)
        .bind(name)
        .bind(data.is_default)
        .bind(data.apply_rule)
        .bind(data.priority)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(template)
    }

    async fn set_week_template_day(
        &self,
        week_template_id: Uuid,
        day_of_week: u8,
        day_template_id: Uuid,
    ) -> Result<WeekTemplate, CoreError> {
        check_day_of_week(day_of_week)?;

        let mut tx = self.pool().begin().await?;
        let template = fetch_week_template(&mut tx, week_template_id).await?;

        let day_template: Option<DayTemplate> =
            sqlx::query_as("SELECT * FROM day_templates WHERE id = $1 AND family_id = $2")
                .bind(day_template_id)
                .bind(template.family_id)
                .fetch_optional(&mut *tx)
                .await?;
        if day_template.is_none() {
            return Err(CoreError::NotFound(format!("Day template with id {} not found", day_template_id)));
        }

        sqlx::query(
            r#"INSERT INTO week_template_days (week_template_id, day_of_week, day_template_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (week_template_id, day_of_week) DO UPDATE SET day_template_id = excluded.day_template_id"#,
        )
        .bind(week_template_id)
        .bind(day_of_week)
        .bind(day_template_id)
        .execute(&mut *tx)
        .await?;

        let updated = with_days(&mut tx, template).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn clear_week_template_day(&self, week_template_id: Uuid, day_of_week: u8) -> Result<WeekTemplate, CoreError> {
        check_day_of_week(day_of_week)?;

        let mut tx = self.pool().begin().await?;
        let template = fetch_week_template(&mut tx, week_template_id).await?;

        sqlx::query("DELETE FROM week_template_days WHERE week_template_id = $1 AND day_of_week = $2")
            .bind(week_template_id)
            .bind(day_of_week)
            .execute(&mut *tx)
            .await?;

        let updated = with_days(&mut tx, template).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn find_week_template_by_id(&self, id: Uuid) -> Result<Option<WeekTemplate>, CoreError> {
        let mut tx = self.pool().begin().await?;
        let template: Option<WeekTemplate> = sqlx::query_as("SELECT * FROM week_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let result = match template {
            Some(template) => Some(with_days(&mut tx, template).await?),
            None => None,
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn find_week_templates(&self, family_id: Uuid) -> Result<Vec<WeekTemplate>, CoreError> {
        let mut templates: Vec<WeekTemplate> =
            sqlx::query_as("SELECT * FROM week_templates WHERE family_id = $1 ORDER BY created_at, id")
                .bind(family_id)
                .fetch_all(self.pool())
                .await?;

        let days: Vec<WeekTemplateDay> = sqlx::query_as(
            r#"SELECT d.* FROM week_template_days d
            JOIN week_templates w ON w.id = d.week_template_id
            WHERE w.family_id = $1
            ORDER BY d.week_template_id, d.day_of_week"#,
        )
        .bind(family_id)
        .fetch_all(self.pool())
        .await?;

        for day in days {
            if let Some(template) = templates.iter_mut().find(|t| t.id == day.week_template_id) {
                template.days.push(day);
            }
        }
        Ok(templates)
    }
}

fn check_day_of_week(day_of_week: u8) -> Result<(), CoreError> {
    if calendar::weekday_from_day_of_week(day_of_week).is_none() {
        return Err(CoreError::InvalidInput(format!(
            "Day of week must be between 0 (Sunday) and 6 (Saturday), got {}",
            day_of_week
        )));
    }
    Ok(())
}

async fn fetch_week_template(
    tx: &mut Transaction<'_, Sqlite>,
    id: Uuid,
) -> Result<WeekTemplate, CoreError> {
    let template: Option<WeekTemplate> = sqlx::query_as("SELECT * FROM week_templates WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    template.ok_or_else(|| CoreError::NotFound(format!("Week template with id {} not found", id)))
}

async fn with_days(
    tx: &mut Transaction<'_, Sqlite>,
    mut template: WeekTemplate,
) -> Result<WeekTemplate, CoreError> {
    template.days = sqlx::query_as(
        "SELECT * FROM week_template_days WHERE week_template_id = $1 ORDER BY day_of_week",
    )
    .bind(template.id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(template)
}
