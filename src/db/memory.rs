// db/memory.rs
use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{types::BigDecimal, Error};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{catalogdb::CatalogExt, jobdb::JobExt, messagedb::MessageExt, userdb::UserExt};
use crate::models::{
    jobmodel::*,
    messagemodel::*,
    servicemodel::Service,
    usermodel::{User, UserRole},
};

/// Process-local store used when no database is configured.
///
/// A single mutex guards all tables, so each trait call is atomic with
/// respect to every other call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    #[cfg(test)]
    fail_service_ratings: AtomicBool,
}

#[derive(Debug, Default)]
struct Tables {
    jobs: HashMap<Uuid, Job>,
    messages: Vec<Message>,
    services: HashMap<Uuid, Service>,
    users: HashMap<Uuid, User>,
}

/// Catalog and user records loaded into a fresh in-memory store.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_service(&self, service: Service) {
        self.tables.lock().await.services.insert(service.id, service);
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.lock().await.users.insert(user.id, user);
    }

    pub async fn seed(&self, seed: SeedData) {
        let mut tables = self.tables.lock().await;
        for service in seed.services {
            tables.services.insert(service.id, service);
        }
        for user in seed.users {
            tables.users.insert(user.id, user);
        }
    }

    pub async fn load_seed_file(&self, path: &str) -> anyhow::Result<usize> {
        let raw = tokio::fs::read_to_string(path).await?;
        let seed: SeedData = serde_json::from_str(&raw)?;
        let count = seed.services.len() + seed.users.len();
        self.seed(seed).await;
        Ok(count)
    }

    /// Makes every service-aggregate write fail until switched back off.
    #[cfg(test)]
    pub fn fail_service_ratings(&self, fail: bool) {
        self.fail_service_ratings.store(fail, Ordering::SeqCst);
    }

    fn check_service_rating_write(&self) -> Result<(), Error> {
        #[cfg(test)]
        {
            if self.fail_service_ratings.load(Ordering::SeqCst) {
                return Err(Error::PoolTimedOut);
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub async fn get_user(&self, user_id: Uuid) -> Option<User> {
        self.tables.lock().await.users.get(&user_id).cloned()
    }
}

fn newest_first(mut jobs: Vec<Job>) -> Vec<Job> {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    jobs
}

#[async_trait]
impl JobExt for MemoryStore {
    async fn create_job(
        &self,
        job: NewJob,
        now: DateTime<Utc>,
    ) -> Result<Job, Error> {
        let job = Job {
            id: Uuid::new_v4(),
            requester_id: job.requester_id,
            provider_id: job.provider_id,
            service_id: job.service_id,
            description: job.description,
            preferred_time: job.preferred_time,
            status: JobStatus::Requested,
            rate_per_hour: job.rate_per_hour,
            visit_fee: job.visit_fee,
            start_time: None,
            end_time: None,
            billable_minutes: 0,
            total_price: BigDecimal::from(0),
            cancel_reason: None,
            rating: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        self.tables.lock().await.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job_by_id(
        &self,
        job_id: Uuid,
    ) -> Result<Option<Job>, Error> {
        Ok(self.tables.lock().await.jobs.get(&job_id).cloned())
    }

    async fn update_job(
        &self,
        job: &Job,
        expected_version: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Job>, Error> {
        let mut tables = self.tables.lock().await;
        let stored = match tables.jobs.get_mut(&job.id) {
            Some(stored) if stored.version == expected_version => stored,
            _ => return Ok(None),
        };

        stored.provider_id = job.provider_id;
        stored.status = job.status;
        stored.start_time = job.start_time;
        stored.end_time = job.end_time;
        stored.billable_minutes = job.billable_minutes;
        stored.total_price = job.total_price.clone();
        stored.cancel_reason = job.cancel_reason.clone();
        stored.rating = job.rating;
        stored.version = expected_version + 1;
        stored.updated_at = now;

        Ok(Some(stored.clone()))
    }

    async fn rate_job(
        &self,
        job_id: Uuid,
        expected_version: i32,
        rating: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<RatedJob>, Error> {
        let mut tables = self.tables.lock().await;
        let Some(mut job) = tables
            .jobs
            .get(&job_id)
            .filter(|stored| stored.version == expected_version)
            .cloned()
        else {
            return Ok(None);
        };

        job.rating = Some(rating);
        job.version = expected_version + 1;
        job.updated_at = now;

        let service = match job.service_id {
            Some(service_id) => {
                self.check_service_rating_write()?;
                tables.services.get(&service_id).cloned().map(|mut service| {
                    service.record_rating(rating);
                    service
                })
            }
            None => None,
        };

        // Nothing is written until both rows are ready.
        if let Some(service) = &service {
            tables.services.insert(service.id, service.clone());
        }
        tables.jobs.insert(job.id, job.clone());

        Ok(Some(RatedJob { job, service }))
    }

    async fn get_jobs_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<Job>, Error> {
        let tables = self.tables.lock().await;
        let jobs = tables
            .jobs
            .values()
            .filter(|job| job.requester_id == requester_id)
            .cloned()
            .collect();
        Ok(newest_first(jobs))
    }

    async fn get_jobs_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<Job>, Error> {
        let tables = self.tables.lock().await;
        let jobs = tables
            .jobs
            .values()
            .filter(|job| job.provider_id == Some(provider_id))
            .cloned()
            .collect();
        Ok(newest_first(jobs))
    }
}

#[async_trait]
impl MessageExt for MemoryStore {
    async fn create_message(
        &self,
        message: NewMessage,
        now: DateTime<Utc>,
    ) -> Result<Message, Error> {
        let message = Message {
            id: Uuid::new_v4(),
            job_id: message.job_id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            body: message.body,
            sender_role: message.sender_role,
            created_at: now,
        };

        self.tables.lock().await.messages.push(message.clone());
        Ok(message)
    }

    async fn get_job_messages(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<Message>, Error> {
        let tables = self.tables.lock().await;
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.job_id == job_id)
            .cloned()
            .collect();
        // Stable, so equal timestamps keep insertion order.
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }
}

#[async_trait]
impl CatalogExt for MemoryStore {
    async fn get_service(
        &self,
        service_id: Uuid,
    ) -> Result<Option<Service>, Error> {
        Ok(self.tables.lock().await.services.get(&service_id).cloned())
    }

    async fn set_service_availability(
        &self,
        service_id: Uuid,
        availability: &str,
    ) -> Result<(), Error> {
        let mut tables = self.tables.lock().await;
        let service = tables.services.get_mut(&service_id).ok_or(Error::RowNotFound)?;
        service.availability = availability.to_string();
        Ok(())
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_provider_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, Error> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.role == UserRole::Provider && u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn increment_services_used(
        &self,
        user_id: Uuid,
    ) -> Result<(), Error> {
        let mut tables = self.tables.lock().await;
        let user = tables.users.get_mut(&user_id).ok_or(Error::RowNotFound)?;
        user.services_used += 1;
        Ok(())
    }
}
