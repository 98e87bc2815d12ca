//! User sign-up with an offline path

use super::local_today;
use crate::connectivity::ConnectivityObserver;
use crate::queue::OfflineMutationQueue;
use crate::store::DocumentStore;
use crate::{ClientError, ClientResult};
use chrono::FixedOffset;
use shared::document::{FieldMap, ToFields};
use shared::models::pending::PendingUser;
use shared::models::user::{self, UserRegistration};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    /// Stored remotely under this document id
    Created { id: String },
    /// Waiting in the offline queue
    Queued(PendingUser),
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn DocumentStore>,
    observer: Arc<ConnectivityObserver>,
    queue: Arc<OfflineMutationQueue>,
    offset: FixedOffset,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        observer: Arc<ConnectivityObserver>,
        queue: Arc<OfflineMutationQueue>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            observer,
            queue,
            offset,
        }
    }

    /// Validate and create the account, or queue it when offline
    pub async fn register_user(
        &self,
        registration: &UserRegistration,
    ) -> ClientResult<RegistrationOutcome> {
        registration.check(local_today(self.offset))?;
        let fields = registration.to_fields();

        if !self.observer.is_connected() {
            return self.queue_registration(fields);
        }

        match self.store.create(user::COLLECTION, fields.clone()).await {
            Ok(doc) => {
                tracing::info!(user_id = %doc.id(), "User registered");
                Ok(RegistrationOutcome::Created {
                    id: doc.id().to_string(),
                })
            }
            Err(e) if e.is_network() => {
                tracing::warn!(error = %e, "Registration failed, queueing");
                self.queue_registration(fields)
            }
            Err(e) => Err(e),
        }
    }

    fn queue_registration(
        &self,
        fields: FieldMap,
    ) -> ClientResult<RegistrationOutcome> {
        let pending = self
            .queue
            .enqueue_registration(fields)
            .map_err(ClientError::from)?;
        Ok(RegistrationOutcome::Queued(pending))
    }
}
