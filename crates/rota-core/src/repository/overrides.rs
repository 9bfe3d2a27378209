use crate::error::CoreError;
use crate::models::{TaskOverride, WeekOverride};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

const TASK_OVERRIDE_COLUMNS: &str = "assigned_date, task_id, action, original_member_id, new_member_id, override_time, override_duration";

#[async_trait]
impl super::OverrideRepository for SqliteRepository {
    async fn find_week_override(&self, family_id: Uuid, week_start: NaiveDate) -> Result<Option<WeekOverride>, CoreError> {
        let mut tx = self.pool().begin().await?;
        let week = Self::load_week_override(&mut tx, family_id, week_start).await?;
        tx.commit().await?;
        Ok(week)
    }

    async fn save_task_overrides(
        &self,
        family_id: Uuid,
        week_start: NaiveDate,
        overrides: &[TaskOverride],
        replace_existing: bool,
    ) -> Result<WeekOverride, CoreError> {
        let mut tx = self.pool().begin().await?;
        let now = Utc::now();

        sqlx::query(
            r#"INSERT INTO week_overrides (family_id, week_start_date, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (family_id, week_start_date) DO UPDATE SET updated_at = excluded.updated_at"#,
        )
        .bind(family_id)
        .bind(week_start)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if replace_existing {
            sqlx::query("DELETE FROM task_overrides WHERE family_id = $1 AND week_start_date = $2")
                .bind(family_id)
                .bind(week_start)
                .execute(&mut *tx)
                .await?;
        }

        let (mut position,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM task_overrides WHERE family_id = $1 AND week_start_date = $2",
        )
        .bind(family_id)
        .bind(week_start)
        .fetch_one(&mut *tx)
        .await?;

        for task_override in overrides {
            sqlx::query(
                r#"INSERT INTO task_overrides (family_id, week_start_date, position, assigned_date, task_id, action,
                    original_member_id, new_member_id, override_time, override_duration)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
            )
            .bind(family_id)
            .bind(week_start)
            .bind(position)
            .bind(task_override.assigned_date)
            .bind(task_override.task_id)
            .bind(task_override.action)
            .bind(task_override.original_member_id)
            .bind(task_override.new_member_id)
            .bind(task_override.override_time)
            .bind(task_override.override_duration)
            .execute(&mut *tx)
            .await?;
            position += 1;
        }

        let saved = Self::load_week_override(&mut tx, family_id, week_start)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Overrides for week {} not found", week_start)))?;

        tx.commit().await?;
        tracing::debug!(
            %family_id,
            %week_start,
            added = overrides.len(),
            total = saved.task_overrides.len(),
            replace_existing,
            "saved week overrides"
        );
        Ok(saved)
    }

    async fn clear_week_override(&self, family_id: Uuid, week_start: NaiveDate) -> Result<bool, CoreError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM task_overrides WHERE family_id = $1 AND week_start_date = $2")
            .bind(family_id)
            .bind(week_start)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM week_overrides WHERE family_id = $1 AND week_start_date = $2")
            .bind(family_id)
            .bind(week_start)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

impl SqliteRepository {
    async fn load_week_override<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        family_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<Option<WeekOverride>, CoreError> {
        let header: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT updated_at FROM week_overrides WHERE family_id = $1 AND week_start_date = $2",
        )
        .bind(family_id)
        .bind(week_start)
        .fetch_optional(&mut **tx)
        .await?;

        let Some((updated_at,)) = header else {
            return Ok(None);
        };

        let task_overrides: Vec<TaskOverride> = sqlx::query_as(&format!(
            "SELECT {} FROM task_overrides WHERE family_id = $1 AND week_start_date = $2 ORDER BY position",
            TASK_OVERRIDE_COLUMNS
        ))
        .bind(family_id)
        .bind(week_start)
        .fetch_all(&mut **tx)
        .await?;

        Ok(Some(WeekOverride {
            family_id,
            week_start_date: week_start,
            task_overrides,
            updated_at,
        }))
    }
}
