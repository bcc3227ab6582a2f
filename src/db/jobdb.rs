// db/jobdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{jobmodel::*, servicemodel::Service};

const JOB_COLUMNS: &str = r#"
    id, requester_id, provider_id, service_id, description, preferred_time,
    status, rate_per_hour, visit_fee, start_time, end_time, billable_minutes,
    total_price, cancel_reason, rating, version, created_at, updated_at
"#;

#[async_trait]
pub trait JobExt {
    async fn create_job(
        &self,
        job: NewJob,
        now: DateTime<Utc>,
    ) -> Result<Job, Error>;

    async fn get_job_by_id(
        &self,
        job_id: Uuid,
    ) -> Result<Option<Job>, Error>;

    /// Persists every mutable field of `job` if the stored row is still at
    /// `expected_version`. Returns `None` when the row moved on (or is gone).
    async fn update_job(
        &self,
        job: &Job,
        expected_version: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Job>, Error>;

    /// Stores `rating` on the job and folds it into the job's service
    /// aggregate as one unit: either both rows change or neither does.
    /// Returns `None` when the job is no longer at `expected_version`.
    async fn rate_job(
        &self,
        job_id: Uuid,
        expected_version: i32,
        rating: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<RatedJob>, Error>;

    async fn get_jobs_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<Job>, Error>;

    async fn get_jobs_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<Job>, Error>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(
        &self,
        job: NewJob,
        now: DateTime<Utc>,
    ) -> Result<Job, Error> {
        let query = format!(
            r#"
            INSERT INTO jobs
            (requester_id, provider_id, service_id, description, preferred_time,
             status, rate_per_hour, visit_fee, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'requested'::job_status, $6, $7, $8, $8)
            RETURNING {JOB_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Job>(&query)
            .bind(job.requester_id)
            .bind(job.provider_id)
            .bind(job.service_id)
            .bind(job.description)
            .bind(job.preferred_time)
            .bind(job.rate_per_hour)
            .bind(job.visit_fee)
            .bind(now)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_job_by_id(
        &self,
        job_id: Uuid,
    ) -> Result<Option<Job>, Error> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");

        sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_job(
        &self,
        job: &Job,
        expected_version: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Job>, Error> {
        let query = format!(
            r#"
            UPDATE jobs
            SET provider_id = $3,
                status = $4,
                start_time = $5,
                end_time = $6,
                billable_minutes = $7,
                total_price = $8,
                cancel_reason = $9,
                rating = $10,
                version = version + 1,
                updated_at = $11
            WHERE id = $1 AND version = $2
            RETURNING {JOB_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Job>(&query)
            .bind(job.id)
            .bind(expected_version)
            .bind(job.provider_id)
            .bind(job.status)
            .bind(job.start_time)
            .bind(job.end_time)
            .bind(job.billable_minutes)
            .bind(&job.total_price)
            .bind(&job.cancel_reason)
            .bind(job.rating)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
    }

    async fn rate_job(
        &self,
        job_id: Uuid,
        expected_version: i32,
        rating: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<RatedJob>, Error> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            UPDATE jobs
            SET rating = $3,
                version = version + 1,
                updated_at = $4
            WHERE id = $1 AND version = $2
            RETURNING {JOB_COLUMNS}
            "#
        );

        let job = sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .bind(expected_version)
            .bind(rating)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(job) = job else {
            tx.rollback().await?;
            return Ok(None);
        };

        let service = match job.service_id {
            // Right-hand sides see the pre-update row, so the mean uses the new totals.
            Some(service_id) => {
                sqlx::query_as::<_, Service>(
                    r#"
                    UPDATE services
                    SET ratings_sum = ratings_sum + $2,
                        reviews = reviews + 1,
                        rating = (ratings_sum + $2)::DOUBLE PRECISION / (reviews + 1)
                    WHERE id = $1
                    RETURNING id, name, category, rate_per_hour, availability,
                              ratings_sum, reviews, rating
                    "#
                )
                .bind(service_id)
                .bind(i64::from(rating))
                .fetch_optional(&mut *tx)
                .await?
            }
            None => None,
        };

        tx.commit().await?;

        Ok(Some(RatedJob { job, service }))
    }

    async fn get_jobs_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<Job>, Error> {
        let query = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE requester_id = $1 ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Job>(&query)
            .bind(requester_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_jobs_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<Job>, Error> {
        let query = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE provider_id = $1 ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Job>(&query)
            .bind(provider_id)
            .fetch_all(&self.pool)
            .await
    }
}
