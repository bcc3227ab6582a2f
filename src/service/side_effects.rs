// service/side_effects.rs
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::{
    db::{catalogdb::CatalogExt, userdb::UserExt, Store},
    models::servicemodel::{AVAILABILITY_AVAILABLE, AVAILABILITY_BUSY},
};

/// Advisory writes that follow a committed job transition.
///
/// They are applied after the transition has been persisted and never report
/// back to it: a failure is logged and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    MarkServiceBusy(Uuid),
    MarkServiceAvailable(Uuid),
    IncrementServicesUsed(Uuid),
}

#[derive(Debug)]
enum Command {
    Apply(SideEffect),
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Clone)]
pub struct SideEffectPublisher {
    tx: mpsc::UnboundedSender<Command>,
}

pub struct SideEffectWorker {
    store: Arc<dyn Store>,
    rx: mpsc::UnboundedReceiver<Command>,
}

impl SideEffectPublisher {
    pub fn new(store: Arc<dyn Store>) -> (Self, SideEffectWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, SideEffectWorker { store, rx })
    }

    pub fn publish(&self, effect: SideEffect) {
        if self.tx.send(Command::Apply(effect)).is_err() {
            tracing::warn!("Side-effect worker is gone, dropping {:?}", effect);
        }
    }

    pub fn set_busy(&self, service_id: Option<Uuid>) {
        if let Some(service_id) = service_id {
            self.publish(SideEffect::MarkServiceBusy(service_id));
        }
    }

    pub fn set_available(&self, service_id: Option<Uuid>) {
        if let Some(service_id) = service_id {
            self.publish(SideEffect::MarkServiceAvailable(service_id));
        }
    }

    /// Resolves once every effect published before this call has been applied.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

impl SideEffectWorker {
    /// Drains the queue until every publisher has been dropped.
    pub async fn run(mut self) {
        tracing::info!("Side-effect worker started");

        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Apply(effect) => self.apply(effect).await,
                Command::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }

        tracing::info!("Side-effect worker stopped");
    }

    async fn apply(&self, effect: SideEffect) {
        let result = match effect {
            SideEffect::MarkServiceBusy(service_id) => {
                self.store.set_service_availability(service_id, AVAILABILITY_BUSY).await
            }
            SideEffect::MarkServiceAvailable(service_id) => {
                self.store.set_service_availability(service_id, AVAILABILITY_AVAILABLE).await
            }
            SideEffect::IncrementServicesUsed(user_id) => {
                self.store.increment_services_used(user_id).await
            }
        };

        match result {
            Ok(()) => tracing::debug!("Applied {:?}", effect),
            Err(e) => tracing::warn!("Failed to apply {:?}: {}", effect, e),
        }
    }
}
