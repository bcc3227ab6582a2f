use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::servicemodel::Service;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Requested,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Requested => "requested",
            JobStatus::Accepted => "accepted",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, JobStatus::Requested | JobStatus::Accepted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub description: String,
    pub preferred_time: String,
    pub status: JobStatus,
    pub rate_per_hour: BigDecimal,
    pub visit_fee: BigDecimal,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub billable_minutes: i32,
    pub total_price: BigDecimal,
    pub cancel_reason: Option<String>,
    pub rating: Option<i32>,
    // Bumped on every persisted transition; updates compare-and-swap on it.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_requester(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id
    }

    pub fn is_provider(&self, user_id: Uuid) -> bool {
        self.provider_id == Some(user_id)
    }
}

/// Fields fixed when a requester opens a job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub requester_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub description: String,
    pub preferred_time: String,
    pub rate_per_hour: BigDecimal,
    pub visit_fee: BigDecimal,
}

/// A job whose rating was stored, with the service aggregate it was folded
/// into. `service` is `None` when the job has no service or it left the catalog.
#[derive(Debug, Clone)]
pub struct RatedJob {
    pub job: Job,
    pub service: Option<Service>,
}
