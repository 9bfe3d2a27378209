use crate::error::CoreError;
use crate::models::{Member, NewMemberData};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl super::MemberRepository for SqliteRepository {
    async fn add_member(&self, data: NewMemberData) -> Result<Member, CoreError> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("Member name cannot be empty".to_string()));
        }

        let mut tx = self.pool().begin().await?;
        let member: Member = sqlx::query_as(
            r#"INSERT INTO members (id, family_id, name, is_virtual, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *"#,
        )
        .bind(Uuid::now_v7())
        .bind(data.family_id)
        .bind(name)
        .bind(data.is_virtual)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(member)
    }

    async fn find_member_by_id(&self, id: Uuid) -> Result<Option<Member>, CoreError> {
        let member = sqlx::query_as("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(member)
    }

    async fn find_members(&self, family_id: Uuid) -> Result<Vec<Member>, CoreError> {
        let members = sqlx::query_as("SELECT * FROM members WHERE family_id = $1 ORDER BY created_at, id")
            .bind(family_id)
            .fetch_all(self.pool())
            .await?;
        Ok(members)
    }
}
