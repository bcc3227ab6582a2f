// service/chat_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{jobdb::JobExt, messagedb::MessageExt, Store},
    models::{jobmodel::Job, messagemodel::*},
    service::{clock::Clock, error::ServiceError},
};

/// True iff `caller_id` is one of the job's two participants.
pub fn can_access(job: &Job, caller_id: Uuid) -> bool {
    job.is_requester(caller_id) || job.is_provider(caller_id)
}

/// The sender role and recipient for a message `caller_id` writes on `job`,
/// derived only from the participants stored on the job.
///
/// `Ok(None)` means the caller is the requester but nobody has taken the job
/// yet, so there is no one to write to.
pub fn route_message(job: &Job, caller_id: Uuid) -> Result<Option<(SenderRole, Uuid)>, ServiceError> {
    if job.is_requester(caller_id) {
        return Ok(job.provider_id.map(|provider_id| (SenderRole::Requester, provider_id)));
    }
    if job.is_provider(caller_id) {
        return Ok(Some((SenderRole::Provider, job.requester_id)));
    }
    Err(ServiceError::Forbidden(
        "Not authorized to send messages for this job".to_string(),
    ))
}

#[derive(Debug, Clone)]
pub struct ChatService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl ChatService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn send(
        &self,
        job_id: Uuid,
        caller_id: Uuid,
        text: &str,
    ) -> Result<Message, ServiceError> {
        let job = self.load(job_id).await?;

        let (sender_role, recipient_id) = route_message(&job, caller_id)?.ok_or_else(|| {
            ServiceError::InvalidState("No provider has been assigned to this job yet".to_string())
        })?;

        let body = text.trim();
        if body.is_empty() {
            return Err(ServiceError::Validation("Message text is required".to_string()));
        }

        let message = self
            .store
            .create_message(
                NewMessage {
                    job_id: job.id,
                    sender_id: caller_id,
                    recipient_id,
                    body: body.to_string(),
                    sender_role,
                },
                self.clock.now(),
            )
            .await?;

        tracing::debug!("Message {} on job {} from {:?}", message.id, job.id, sender_role);
        Ok(message)
    }

    /// Every message on the job, oldest first. Each call re-reads the store.
    pub async fn list(&self, job_id: Uuid, caller_id: Uuid) -> Result<Vec<Message>, ServiceError> {
        let job = self.load(job_id).await?;

        if !can_access(&job, caller_id) {
            return Err(ServiceError::Forbidden("Not authorized to view this chat".to_string()));
        }

        Ok(self.store.get_job_messages(job.id).await?)
    }

    async fn load(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.store
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }
}
