// service/job_service.rs
use std::sync::Arc;

use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{catalogdb::CatalogExt, jobdb::JobExt, userdb::UserExt, Store},
    models::{
        jobmodel::*,
        usermodel::{Caller, UserRole},
    },
    service::{
        billing::{compute_billing, is_whole_cents},
        clock::Clock,
        error::ServiceError,
        rating::{validate_rating, RatingAggregator},
        side_effects::{SideEffect, SideEffectPublisher},
    },
};

/// What a requester supplies when opening a job.
#[derive(Debug, Clone, Default)]
pub struct JobRequest {
    pub provider_email: Option<String>,
    pub service_id: Option<Uuid>,
    pub description: String,
    pub preferred_time: Option<String>,
    pub rate_per_hour: Option<BigDecimal>,
    pub visit_fee: Option<BigDecimal>,
}

/// Drives a job from request to completion and rating.
///
/// Each transition reads the job, checks the caller and the current status,
/// and writes the result back with a compare-and-swap on the job version, so
/// of two racing transitions only one lands and the other gets `StaleJob`.
/// Availability and usage-counter updates are queued after the write and
/// cannot fail the transition.
#[derive(Debug, Clone)]
pub struct JobService {
    store: Arc<dyn Store>,
    ratings: RatingAggregator,
    side_effects: SideEffectPublisher,
    clock: Arc<dyn Clock>,
    default_rate_per_hour: BigDecimal,
}

impl JobService {
    pub fn new(
        store: Arc<dyn Store>,
        ratings: RatingAggregator,
        side_effects: SideEffectPublisher,
        clock: Arc<dyn Clock>,
        default_rate_per_hour: BigDecimal,
    ) -> Self {
        Self {
            store,
            ratings,
            side_effects,
            clock,
            default_rate_per_hour,
        }
    }

    pub async fn request(
        &self,
        caller: Caller,
        request: JobRequest,
    ) -> Result<Job, ServiceError> {
        let description = request.description.trim().to_string();
        if description.is_empty() {
            return Err(ServiceError::Validation("Job description is required".to_string()));
        }

        let zero = BigDecimal::from(0);
        if let Some(rate) = &request.rate_per_hour {
            if *rate < zero {
                return Err(ServiceError::Validation("Hourly rate cannot be negative".to_string()));
            }
            if !is_whole_cents(rate) {
                return Err(ServiceError::Validation(
                    "Hourly rate cannot have more than 2 decimal places".to_string(),
                ));
            }
        }
        let visit_fee = request.visit_fee.unwrap_or_else(|| zero.clone());
        if visit_fee < zero {
            return Err(ServiceError::Validation("Visit fee cannot be negative".to_string()));
        }
        if !is_whole_cents(&visit_fee) {
            return Err(ServiceError::Validation(
                "Visit fee cannot have more than 2 decimal places".to_string(),
            ));
        }

        let service = match request.service_id {
            Some(service_id) => Some(
                self.store
                    .get_service(service_id)
                    .await?
                    .ok_or(ServiceError::ServiceNotFound(service_id))?,
            ),
            None => None,
        };

        // An unknown contact leaves the job open for matching.
        let provider = match request.provider_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => self.store.get_provider_by_email(email).await?,
            _ => None,
        };

        let rate_per_hour = request
            .rate_per_hour
            .or_else(|| service.as_ref().map(|s| s.rate_per_hour.clone()))
            .unwrap_or_else(|| self.default_rate_per_hour.clone());

        let job = self
            .store
            .create_job(
                NewJob {
                    requester_id: caller.id,
                    provider_id: provider.map(|p| p.id),
                    service_id: service.map(|s| s.id),
                    description,
                    preferred_time: request
                        .preferred_time
                        .map(|t| t.trim().to_string())
                        .unwrap_or_default(),
                    rate_per_hour,
                    visit_fee,
                },
                self.clock.now(),
            )
            .await?;

        tracing::info!("Job {} requested by {}", job.id, caller.id);
        Ok(job)
    }

    pub async fn accept(&self, job_id: Uuid, caller: Caller) -> Result<Job, ServiceError> {
        let mut job = self.load(job_id).await?;

        if caller.role != UserRole::Provider {
            return Err(ServiceError::Forbidden("Only providers can accept jobs".to_string()));
        }
        if job.provider_id.is_some_and(|provider_id| provider_id != caller.id) {
            return Err(ServiceError::Forbidden(
                "This job was requested from another provider".to_string(),
            ));
        }
        if job.status != JobStatus::Requested {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let version = job.version;
        job.provider_id = Some(caller.id);
        job.status = JobStatus::Accepted;
        let job = self.commit(job, version).await?;

        self.side_effects.set_busy(job.service_id);
        Ok(job)
    }

    pub async fn start(&self, job_id: Uuid, caller: Caller) -> Result<Job, ServiceError> {
        let mut job = self.load(job_id).await?;
        self.ensure_provider(&job, caller)?;

        match job.status {
            JobStatus::Accepted => {}
            // Already running: the first start instant stands.
            JobStatus::InProgress => {
                self.side_effects.set_busy(job.service_id);
                return Ok(job);
            }
            status => return Err(ServiceError::InvalidJobStatus(job_id, status)),
        }

        let version = job.version;
        if job.start_time.is_none() {
            job.start_time = Some(self.clock.now());
        }
        job.status = JobStatus::InProgress;
        let job = self.commit(job, version).await?;

        self.side_effects.set_busy(job.service_id);
        Ok(job)
    }

    pub async fn end(&self, job_id: Uuid, caller: Caller) -> Result<Job, ServiceError> {
        let mut job = self.load(job_id).await?;
        self.ensure_provider(&job, caller)?;

        let Some(start_time) = job.start_time else {
            return Err(ServiceError::InvalidState("Job has not been started yet".to_string()));
        };
        if job.status != JobStatus::InProgress {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let end_time = self.clock.now().max(start_time);
        let billing = compute_billing(start_time, end_time, &job.rate_per_hour, &job.visit_fee);

        let version = job.version;
        job.end_time = Some(end_time);
        job.billable_minutes = billing.billable_minutes;
        job.total_price = billing.total_price;
        job.status = JobStatus::Completed;
        let job = self.commit(job, version).await?;

        tracing::info!(
            "Job {} billed {} minutes, total {}",
            job.id,
            job.billable_minutes,
            job.total_price
        );

        self.side_effects.set_available(job.service_id);
        self.side_effects.publish(SideEffect::IncrementServicesUsed(job.requester_id));
        Ok(job)
    }

    pub async fn cancel(
        &self,
        job_id: Uuid,
        caller: Caller,
        reason: Option<String>,
    ) -> Result<Job, ServiceError> {
        let mut job = self.load(job_id).await?;

        if !job.is_requester(caller.id) && !job.is_provider(caller.id) {
            return Err(ServiceError::Forbidden("Not authorized to cancel this job".to_string()));
        }
        if !job.status.is_cancellable() {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let was_accepted = job.status == JobStatus::Accepted;
        let version = job.version;
        job.status = JobStatus::Cancelled;
        job.cancel_reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let job = self.commit(job, version).await?;

        if was_accepted {
            self.side_effects.set_available(job.service_id);
        }
        Ok(job)
    }

    pub async fn rate(&self, job_id: Uuid, caller: Caller, value: i32) -> Result<Job, ServiceError> {
        let job = self.load(job_id).await?;

        if !job.is_requester(caller.id) {
            return Err(ServiceError::Forbidden("Not authorized to rate this job".to_string()));
        }
        if job.status != JobStatus::Completed {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }
        if job.rating.is_some() {
            return Err(ServiceError::AlreadyRated(job_id));
        }
        validate_rating(value)?;

        // The job rating and the service aggregate land together or not at all.
        let rated = self
            .ratings
            .rate_job(job_id, job.version, value, self.clock.now())
            .await
            .map_err(|e| {
                tracing::error!("Rating job {} failed, nothing recorded: {}", job_id, e);
                e
            })?;

        match rated {
            Some(job) => {
                tracing::info!("Job {} rated {}", job.id, value);
                Ok(job)
            }
            None => Err(self.lost_race(job_id).await),
        }
    }

    /// A job, visible to its two participants only.
    pub async fn get_job(&self, job_id: Uuid, caller: Caller) -> Result<Job, ServiceError> {
        let job = self.load(job_id).await?;
        if !job.is_requester(caller.id) && !job.is_provider(caller.id) {
            return Err(ServiceError::Forbidden("Not authorized to view this job".to_string()));
        }
        Ok(job)
    }

    pub async fn list_for_requester(&self, caller: Caller) -> Result<Vec<Job>, ServiceError> {
        Ok(self.store.get_jobs_for_requester(caller.id).await?)
    }

    pub async fn list_for_provider(&self, caller: Caller) -> Result<Vec<Job>, ServiceError> {
        Ok(self.store.get_jobs_for_provider(caller.id).await?)
    }

    async fn load(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.store
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    fn ensure_provider(&self, job: &Job, caller: Caller) -> Result<(), ServiceError> {
        if !job.is_provider(caller.id) {
            return Err(ServiceError::Forbidden(
                "Only the job's provider can do this".to_string(),
            ));
        }
        Ok(())
    }

    async fn commit(&self, job: Job, expected_version: i32) -> Result<Job, ServiceError> {
        let job_id = job.id;
        match self.store.update_job(&job, expected_version, self.clock.now()).await? {
            Some(saved) => {
                tracing::info!("Job {} is now {}", saved.id, saved.status.to_str());
                Ok(saved)
            }
            None => Err(self.lost_race(job_id).await),
        }
    }

    /// Explains a versioned write that matched no row.
    async fn lost_race(&self, job_id: Uuid) -> ServiceError {
        match self.store.get_job_by_id(job_id).await {
            Ok(Some(_)) => {
                tracing::debug!("Job {} changed underneath a transition", job_id);
                ServiceError::StaleJob(job_id)
            }
            Ok(None) => ServiceError::JobNotFound(job_id),
            Err(e) => ServiceError::Database(e),
        }
    }
}
