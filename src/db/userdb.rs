// db/userdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::User;

#[async_trait]
pub trait UserExt {
    async fn get_provider_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, Error>;

    /// Fails with `RowNotFound` when the user is gone.
    async fn increment_services_used(
        &self,
        user_id: Uuid,
    ) -> Result<(), Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_provider_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, role, services_used, created_at
            FROM users
            WHERE LOWER(email) = LOWER($1) AND role = 'provider'::user_role
            "#
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn increment_services_used(
        &self,
        user_id: Uuid,
    ) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET services_used = COALESCE(services_used, 0) + 1
            WHERE id = $1
            "#
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }

        Ok(())
    }
}
