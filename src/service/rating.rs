// service/rating.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::{jobdb::JobExt, Store},
    models::jobmodel::Job,
    service::error::ServiceError,
};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub fn validate_rating(value: i32) -> Result<(), ServiceError> {
    if !(MIN_RATING..=MAX_RATING).contains(&value) {
        return Err(ServiceError::Validation(format!(
            "Rating must be a whole number between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(())
}

/// Keeps each service's running rating (sum, count, mean) in step with the
/// ratings left on its completed jobs.
#[derive(Debug, Clone)]
pub struct RatingAggregator {
    store: Arc<dyn Store>,
}

impl RatingAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Records `value` on the job and adds it to the service aggregate in one
    /// write. Returns `None` if the job is no longer at `expected_version`.
    /// Jobs without a service, or whose service has left the catalog, only
    /// get the job-side write.
    pub async fn rate_job(
        &self,
        job_id: Uuid,
        expected_version: i32,
        value: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Job>, ServiceError> {
        validate_rating(value)?;

        let Some(rated) = self.store.rate_job(job_id, expected_version, value, now).await? else {
            return Ok(None);
        };

        match (&rated.service, rated.job.service_id) {
            (Some(service), _) => tracing::info!(
                "Service {} rating now {:.2} over {} reviews",
                service.id,
                service.rating,
                service.reviews
            ),
            (None, Some(service_id)) => {
                tracing::warn!("Rated job references missing service {}", service_id)
            }
            (None, None) => {}
        }

        Ok(Some(rated.job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{catalogdb::CatalogExt, memory::MemoryStore},
        models::{
            jobmodel::NewJob,
            servicemodel::{Service, AVAILABILITY_AVAILABLE},
        },
    };
    use sqlx::types::BigDecimal;

    async fn aggregator_with_service() -> (RatingAggregator, Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::new_v4();
        store
            .insert_service(Service {
                id,
                name: "Fix-It Felix".to_string(),
                category: "General Handyman".to_string(),
                rate_per_hour: BigDecimal::from(45),
                availability: AVAILABILITY_AVAILABLE.to_string(),
                ratings_sum: 0,
                reviews: 0,
                rating: 0.0,
            })
            .await;
        (RatingAggregator::new(store.clone()), store, id)
    }

    async fn job_for(store: &MemoryStore, service_id: Option<Uuid>) -> Job {
        store
            .create_job(
                NewJob {
                    requester_id: Uuid::new_v4(),
                    provider_id: None,
                    service_id,
                    description: "Loose shelf".to_string(),
                    preferred_time: String::new(),
                    rate_per_hour: BigDecimal::from(45),
                    visit_fee: BigDecimal::from(0),
                },
                Utc::now(),
            )
            .await
            .unwrap()
    }

    async fn service_of(store: &MemoryStore, id: Uuid) -> Service {
        store.get_service(id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn each_rating_bumps_count_by_one() {
        let (aggregator, store, id) = aggregator_with_service().await;

        let first = job_for(&store, Some(id)).await;
        let rated = aggregator.rate_job(first.id, first.version, 5, Utc::now()).await.unwrap().unwrap();
        assert_eq!(rated.rating, Some(5));
        let after_first = service_of(&store, id).await;
        assert_eq!((after_first.reviews, after_first.ratings_sum, after_first.rating), (1, 5, 5.0));

        let second = job_for(&store, Some(id)).await;
        aggregator.rate_job(second.id, second.version, 2, Utc::now()).await.unwrap().unwrap();
        let after_second = service_of(&store, id).await;
        assert_eq!(after_second.reviews, after_first.reviews + 1);
        assert_eq!(after_second.rating, 3.5);
    }

    #[tokio::test]
    async fn missing_service_only_rates_the_job() {
        let (aggregator, store, id) = aggregator_with_service().await;

        let unlinked = job_for(&store, None).await;
        let rated = aggregator.rate_job(unlinked.id, unlinked.version, 4, Utc::now()).await.unwrap();
        assert_eq!(rated.and_then(|j| j.rating), Some(4));

        let orphaned = job_for(&store, Some(Uuid::new_v4())).await;
        let rated = aggregator.rate_job(orphaned.id, orphaned.version, 4, Utc::now()).await.unwrap();
        assert_eq!(rated.and_then(|j| j.rating), Some(4));

        assert_eq!(service_of(&store, id).await.reviews, 0);
    }

    #[tokio::test]
    async fn out_of_range_values_are_rejected_without_writing() {
        let (aggregator, store, id) = aggregator_with_service().await;
        let job = job_for(&store, Some(id)).await;

        for value in [0, 6, -1] {
            let err = aggregator.rate_job(job.id, job.version, value, Utc::now()).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }

        assert_eq!(store.get_job_by_id(job.id).await.unwrap().unwrap().rating, None);
        assert_eq!(service_of(&store, id).await.reviews, 0);
    }

    #[tokio::test]
    async fn outdated_version_writes_nothing() {
        let (aggregator, store, id) = aggregator_with_service().await;
        let job = job_for(&store, Some(id)).await;

        let rated = aggregator.rate_job(job.id, job.version + 1, 3, Utc::now()).await.unwrap();

        assert!(rated.is_none());
        assert_eq!(service_of(&store, id).await.reviews, 0);
    }

    #[tokio::test]
    async fn concurrent_ratings_are_all_counted() {
        let (aggregator, store, id) = aggregator_with_service().await;

        let mut handles = Vec::new();
        for i in 0..20 {
            let job = job_for(&store, Some(id)).await;
            let aggregator = aggregator.clone();
            handles.push(tokio::spawn(async move {
                aggregator.rate_job(job.id, job.version, 1 + i % 5, Utc::now()).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }

        let service = service_of(&store, id).await;
        assert_eq!(service.reviews, 20);
        assert_eq!(service.ratings_sum, 60);
        assert_eq!(service.rating, 3.0);
    }
}
