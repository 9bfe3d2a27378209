use crate::error::CoreError;
use crate::models::{NewTaskData, Task, UpdateTaskData};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

#[async_trait]
impl super::TaskRepository for SqliteRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError> {
        validate_task_fields(Some(&data.name), Some(data.default_duration))?;

        let now = Utc::now();
        let task = Task {
            id: Uuid::now_v7(),
            family_id: data.family_id,
            name: data.name.trim().to_string(),
            icon: data.icon,
            color: data.color,
            default_start_time: data.default_start_time,
            default_duration: data.default_duration,
            active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO tasks (id, family_id, name, icon, color, default_start_time, default_duration, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(task.id)
        .bind(task.family_id)
        .bind(&task.name)
        .bind(&task.icon)
        .bind(&task.color)
        .bind(task.default_start_time)
        .bind(task.default_duration)
        .bind(task.active)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(self.pool())
        .await?;

        Ok(task)
    }

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError> {
        let task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(task)
    }

    async fn find_tasks(&self, family_id: Uuid, include_inactive: bool) -> Result<Vec<Task>, CoreError> {
        let tasks = if include_inactive {
            sqlx::query_as("SELECT * FROM tasks WHERE family_id = $1 ORDER BY created_at, id")
                .bind(family_id)
                .fetch_all(self.pool())
                .await?
        } else {
            sqlx::query_as("SELECT * FROM tasks WHERE family_id = $1 AND active = TRUE ORDER BY created_at, id")
                .bind(family_id)
                .fetch_all(self.pool())
                .await?
        };
        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError> {
        validate_task_fields(data.name.as_deref(), data.default_duration)?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(name) = &data.name {
            qb.push(", name = ");
            qb.push_bind(name.trim().to_string());
        }
        if let Some(icon) = &data.icon {
            qb.push(", icon = ");
            qb.push_bind(icon.clone());
        }
        if let Some(color) = &data.color {
            qb.push(", color = ");
            qb.push_bind(color.clone());
        }
        if let Some(start) = data.default_start_time {
            qb.push(", default_start_time = ");
            qb.push_bind(start);
        }
        if let Some(duration) = data.default_duration {
            qb.push(", default_duration = ");
            qb.push_bind(duration);
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let result = qb.build().execute(self.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Task with id {} not found", id)));
        }

        let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(task)
    }

    async fn deactivate_task(&self, id: Uuid) -> Result<Task, CoreError> {
        let mut tx = self.pool().begin().await?;
        let task: Task = sqlx::query_as(
            r#"UPDATE tasks
            SET active = FALSE, updated_at = $1
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Task with id {} not found", id)))?;
        tx.commit().await?;
        Ok(task)
    }
}

fn validate_task_fields(name: Option<&str>, duration: Option<i32>) -> Result<(), CoreError> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(CoreError::InvalidInput("Task name cannot be empty".to_string()));
        }
    }
    if let Some(duration) = duration {
        if duration <= 0 {
            return Err(CoreError::InvalidInput(format!(
                "Default duration must be a positive number of minutes, got {}",
                duration
            )));
        }
    }
    Ok(())
}
