// db/catalogdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::servicemodel::Service;

#[async_trait]
pub trait CatalogExt {
    async fn get_service(
        &self,
        service_id: Uuid,
    ) -> Result<Option<Service>, Error>;

    /// Fails with `RowNotFound` when the service is gone.
    async fn set_service_availability(
        &self,
        service_id: Uuid,
        availability: &str,
    ) -> Result<(), Error>;
}

#[async_trait]
impl CatalogExt for DBClient {
    async fn get_service(
        &self,
        service_id: Uuid,
    ) -> Result<Option<Service>, Error> {
        sqlx::query_as::<_, Service>(
            r#"
            SELECT id, name, category, rate_per_hour, availability,
                   ratings_sum, reviews, rating
            FROM services
            WHERE id = $1
            "#
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_service_availability(
        &self,
        service_id: Uuid,
        availability: &str,
    ) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE services
            SET availability = $2
            WHERE id = $1
            "#
        )
        .bind(service_id)
        .bind(availability)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }

        Ok(())
    }
}
