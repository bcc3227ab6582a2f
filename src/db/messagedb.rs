// db/messagedb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::messagemodel::*;

#[async_trait]
pub trait MessageExt {
    async fn create_message(
        &self,
        message: NewMessage,
        now: DateTime<Utc>,
    ) -> Result<Message, Error>;

    /// All messages of a job, oldest first.
    async fn get_job_messages(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<Message>, Error>;
}

#[async_trait]
impl MessageExt for DBClient {
    async fn create_message(
        &self,
        message: NewMessage,
        now: DateTime<Utc>,
    ) -> Result<Message, Error> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO job_messages (job_id, sender_id, recipient_id, body, sender_role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, job_id, sender_id, recipient_id, body, sender_role, created_at
            "#
        )
        .bind(message.job_id)
        .bind(message.sender_id)
        .bind(message.recipient_id)
        .bind(message.body)
        .bind(message.sender_role)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_job_messages(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, job_id, sender_id, recipient_id, body, sender_role, created_at
            FROM job_messages
            WHERE job_id = $1
            ORDER BY created_at ASC, seq ASC
            "#
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }
}
