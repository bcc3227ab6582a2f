use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::HttpError,
    models::jobmodel::*,
    service::job_service::JobRequest,
    utils::decimal::{decimal_from_f64, BigDecimalHelpers},
};

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobDto {
    #[validate(email(message = "Provider email is invalid"))]
    pub provider_email: Option<String>,

    pub service_id: Option<Uuid>,

    #[validate(length(min = 1, max = 2000, message = "Description must be between 1 and 2000 characters"))]
    pub description: String,

    #[validate(length(max = 200, message = "Preferred time must be at most 200 characters"))]
    pub preferred_time: Option<String>,

    #[validate(range(min = 0.0, message = "Hourly rate must be positive"))]
    pub rate_per_hour: Option<f64>,

    #[validate(range(min = 0.0, message = "Visit fee must be positive"))]
    pub visit_fee: Option<f64>,
}

impl CreateJobDto {
    pub fn into_request(self) -> Result<JobRequest, HttpError> {
        let rate_per_hour = self
            .rate_per_hour
            .map(|rate| decimal_from_f64(rate).ok_or_else(|| HttpError::bad_request("Hourly rate is invalid")))
            .transpose()?;
        let visit_fee = self
            .visit_fee
            .map(|fee| decimal_from_f64(fee).ok_or_else(|| HttpError::bad_request("Visit fee is invalid")))
            .transpose()?;

        Ok(JobRequest {
            provider_email: self.provider_email,
            service_id: self.service_id,
            description: self.description,
            preferred_time: self.preferred_time,
            rate_per_hour,
            visit_fee,
        })
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct CancelJobDto {
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RateJobDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be a number between 1 and 5"))]
    pub rating: i32,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SendMessageDto {
    // Emptiness is checked after the participant check.
    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponseDto {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub description: String,
    pub preferred_time: String,
    pub status: JobStatus,
    pub rate_per_hour: f64,
    pub visit_fee: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub billable_minutes: i32,
    pub total_price: f64,
    pub cancel_reason: Option<String>,
    pub rating: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobResponseDto {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            requester_id: job.requester_id,
            provider_id: job.provider_id,
            service_id: job.service_id,
            description: job.description,
            preferred_time: job.preferred_time,
            status: job.status,
            rate_per_hour: job.rate_per_hour.to_f64_or_zero(),
            visit_fee: job.visit_fee.to_f64_or_zero(),
            start_time: job.start_time,
            end_time: job.end_time,
            billable_minutes: job.billable_minutes,
            total_price: job.total_price.to_f64_or_zero(),
            cancel_reason: job.cancel_reason,
            rating: job.rating,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

impl JobResponseDto {
    pub fn from_jobs(jobs: Vec<Job>) -> Vec<Self> {
        jobs.into_iter().map(Self::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_job_reads_camel_case_and_validates() {
        let dto: CreateJobDto = serde_json::from_value(serde_json::json!({
            "providerEmail": "not-an-email",
            "description": "Fix the fridge",
            "ratePerHour": 40.5
        }))
        .unwrap();

        assert!(dto.validate().is_err());
    }

    #[test]
    fn create_job_converts_money_exactly() {
        let dto: CreateJobDto = serde_json::from_value(serde_json::json!({
            "providerEmail": "pro@fix.example",
            "description": "Fix the fridge",
            "ratePerHour": 40.1,
            "visitFee": 15
        }))
        .unwrap();
        assert!(dto.validate().is_ok());

        let request = dto.into_request().unwrap();

        assert_eq!(request.rate_per_hour.unwrap().to_string(), "40.1");
        assert_eq!(request.visit_fee.unwrap().to_string(), "15");
    }

    #[test]
    fn rating_range_is_enforced() {
        assert!(RateJobDto { rating: 0 }.validate().is_err());
        assert!(RateJobDto { rating: 6 }.validate().is_err());
        assert!(RateJobDto { rating: 3 }.validate().is_ok());
    }

    #[test]
    fn negative_fee_is_rejected() {
        let dto = CreateJobDto {
            provider_email: None,
            service_id: None,
            description: "Hang a door".to_string(),
            preferred_time: None,
            rate_per_hour: None,
            visit_fee: Some(-5.0),
        };

        assert!(dto.validate().is_err());
    }
}
