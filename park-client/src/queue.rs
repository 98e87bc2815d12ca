//! Offline mutation queue
//!
//! Capacity edits and user registrations made while disconnected are kept in
//! one ordered list under `pendingMutations` and replayed on the reconnect
//! edge. Capacity edits coalesce per lot (last write wins). An entry leaves
//! the queue only after its own remote write succeeded; failures stay queued
//! until the next reconnect.

use crate::local::{LocalStore, StorageResult, keys};
use crate::store::DocumentStore;
use crate::ClientResult;
use futures::future::join_all;
use parking_lot::Mutex;
use shared::document::{FieldMap, ToFields};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::pending::{PendingUpdate, PendingUser, QueuedMutation};
use shared::models::{parking_lot as lot_model, user};

/// Outcome of one replay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub failed: usize,
}

impl ReplayReport {
    pub fn is_empty(&self) -> bool {
        self.applied == 0 && self.failed == 0
    }

    /// `SyncReplayFailed` when any entry is still queued after the pass
    pub fn outcome(&self) -> AppResult<()> {
        if self.failed == 0 {
            return Ok(());
        }
        Err(AppError::new(ErrorCode::SyncReplayFailed)
            .with_detail("failed", self.failed)
            .with_detail("applied", self.applied))
    }
}

/// Durable, coalescing queue of offline writes
pub struct OfflineMutationQueue {
    local: LocalStore,
    /// In-memory mirror of `pendingMutations`; persisted inside the lock
    entries: Mutex<Vec<QueuedMutation>>,
}

impl OfflineMutationQueue {
    /// Load the persisted queue
    ///
    /// An unreadable queue is logged and replaced by an empty one.
    pub fn open(local: LocalStore) -> Self {
        let entries = match local.get::<Vec<QueuedMutation>>(keys::PENDING_MUTATIONS) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                tracing::error!(error = %e, "Offline queue unreadable, starting empty");
                Vec::new()
            }
        };
        if !entries.is_empty() {
            tracing::info!(count = entries.len(), "Loaded offline queue");
        }
        Self {
            local,
            entries: Mutex::new(entries),
        }
    }

    /// Apply `f` to a copy of the queue and persist it; memory is updated only
    /// when the write succeeded
    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<QueuedMutation>) -> R) -> StorageResult<R> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        let result = f(&mut next);
        self.local.put(keys::PENDING_MUTATIONS, &next)?;
        *entries = next;
        Ok(result)
    }

    /// Queue a capacity edit, replacing any edit already queued for the lot
    pub fn enqueue_capacity_edit(
        &self,
        lot_id: &str,
        available_spots: u32,
        available_ev_spots: u32,
    ) -> StorageResult<()> {
        let update = PendingUpdate::new(lot_id, available_spots, available_ev_spots);
        self.mutate(|entries| {
            entries.retain(|e| e.lot_id() != Some(lot_id));
            entries.push(QueuedMutation::CapacityEdit(update));
        })?;
        tracing::info!(lot_id, available_spots, available_ev_spots, "Queued capacity edit");
        Ok(())
    }

    /// Queue a registration payload
    pub fn enqueue_registration(&self, fields: FieldMap) -> StorageResult<PendingUser> {
        let pending = PendingUser::new(fields);
        let entry = QueuedMutation::Registration(pending.clone());
        self.mutate(|entries| entries.push(entry))?;
        tracing::info!(queue_id = %pending.queue_id, "Queued user registration");
        Ok(pending)
    }

    /// All entries in insertion order
    pub fn list_queued(&self) -> Vec<QueuedMutation> {
        self.entries.lock().clone()
    }

    pub fn pending_updates(&self) -> Vec<PendingUpdate> {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| match e {
                QueuedMutation::CapacityEdit(update) => Some(update.clone()),
                QueuedMutation::Registration(_) => None,
            })
            .collect()
    }

    pub fn pending_users(&self) -> Vec<PendingUser> {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| match e {
                QueuedMutation::Registration(user) => Some(user.clone()),
                QueuedMutation::CapacityEdit(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop the queued edit for `lot_id`; true when one was removed
    pub fn dequeue(&self, lot_id: &str) -> StorageResult<bool> {
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| e.lot_id() != Some(lot_id));
            entries.len() != before
        })
    }

    /// Drop a queued registration by its queue id; true when one was removed
    pub fn dequeue_registration(&self, pending: &PendingUser) -> StorageResult<bool> {
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| {
                !matches!(e, QueuedMutation::Registration(u) if u.queue_id == pending.queue_id)
            });
            entries.len() != before
        })
    }

    /// Remove exactly `entry`; a newer edit queued for the same lot while the
    /// replay was in flight stays
    fn remove_replayed(&self, entry: &QueuedMutation) -> StorageResult<()> {
        self.mutate(|entries| {
            if let Some(pos) = entries.iter().position(|e| e == entry) {
                entries.remove(pos);
            }
        })
    }

    async fn write(store: &dyn DocumentStore, entry: &QueuedMutation) -> ClientResult<()> {
        match entry {
            QueuedMutation::CapacityEdit(update) => {
                store
                    .patch(lot_model::COLLECTION, &update.lot_id, update.to_fields())
                    .await?;
            }
            QueuedMutation::Registration(pending) => {
                store.create(user::COLLECTION, pending.fields.clone()).await?;
            }
        }
        Ok(())
    }

    async fn replay_one(&self, store: &dyn DocumentStore, entry: QueuedMutation) -> bool {
        match Self::write(store, &entry).await {
            Ok(()) => {
                if let Err(e) = self.remove_replayed(&entry) {
                    tracing::error!(kind = entry.kind(), error = %e, "Replayed entry could not be dequeued");
                }
                tracing::debug!(kind = entry.kind(), lot_id = ?entry.lot_id(), "Replayed queued mutation");
                true
            }
            Err(e) => {
                tracing::warn!(
                    kind = entry.kind(),
                    lot_id = ?entry.lot_id(),
                    error = %e,
                    "Replay failed, entry stays queued"
                );
                false
            }
        }
    }

    /// Write every queued entry concurrently
    ///
    /// Each entry is dequeued after its own success; one failure never
    /// blocks the others.
    pub async fn replay_all(&self, store: &dyn DocumentStore) -> ReplayReport {
        let snapshot = self.list_queued();
        if snapshot.is_empty() {
            return ReplayReport::default();
        }

        tracing::info!(count = snapshot.len(), "Replaying offline queue");
        let results = join_all(snapshot.into_iter().map(|entry| self.replay_one(store, entry))).await;

        let applied = results.iter().filter(|ok| **ok).count();
        let report = ReplayReport {
            applied,
            failed: results.len() - applied,
        };
        tracing::info!(applied = report.applied, failed = report.failed, "Offline queue replayed");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CallCounts, InMemoryStore};
    use shared::document::field;

    fn queue() -> OfflineMutationQueue {
        OfflineMutationQueue::open(LocalStore::open_in_memory().unwrap())
    }

    fn seed_lot(store: &InMemoryStore, id: &str) {
        store.insert(
            lot_model::COLLECTION,
            id,
            FieldMap::from([field(lot_model::fields::AVAILABLE_SPOTS, 10u32)]),
        );
    }

    #[test]
    fn test_capacity_edits_coalesce_per_lot() {
        let queue = queue();
        queue.enqueue_capacity_edit("lot-1", 5, 1).unwrap();
        queue.enqueue_capacity_edit("lot-2", 8, 0).unwrap();
        queue.enqueue_capacity_edit("lot-1", 3, 2).unwrap();

        let updates = queue.pending_updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].lot_id, "lot-2");
        assert_eq!(updates[1], PendingUpdate::new("lot-1", 3, 2));
    }

    #[test]
    fn test_order_is_kept_across_kinds() {
        let queue = queue();
        queue.enqueue_capacity_edit("lot-1", 5, 1).unwrap();
        let user = queue
            .enqueue_registration(FieldMap::from([field("email", "a@b.co")]))
            .unwrap();
        queue.enqueue_capacity_edit("lot-2", 1, 1).unwrap();

        let kinds: Vec<_> = queue.list_queued().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, ["capacity_edit", "registration", "capacity_edit"]);

        assert!(queue.dequeue_registration(&user).unwrap());
        assert!(!queue.dequeue_registration(&user).unwrap());
        assert!(queue.dequeue("lot-1").unwrap());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_queue_is_durable() {
        let local = LocalStore::open_in_memory().unwrap();
        {
            let queue = OfflineMutationQueue::open(local.clone());
            queue.enqueue_capacity_edit("lot-1", 5, 1).unwrap();
            queue.enqueue_registration(FieldMap::new()).unwrap();
        }
        let reopened = OfflineMutationQueue::open(local);
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_registrations_never_coalesce() {
        let queue = queue();
        let fields = FieldMap::from([field("email", "same@b.co")]);
        queue.enqueue_registration(fields.clone()).unwrap();
        queue.enqueue_registration(fields).unwrap();
        assert_eq!(queue.pending_users().len(), 2);
    }

    #[tokio::test]
    async fn test_replay_keeps_failures() {
        let store = InMemoryStore::new();
        seed_lot(&store, "lot-1");
        seed_lot(&store, "lot-2");
        store.fail_patches_for("lot-2");

        let queue = queue();
        queue.enqueue_capacity_edit("lot-1", 4, 0).unwrap();
        queue.enqueue_capacity_edit("lot-2", 6, 0).unwrap();
        queue
            .enqueue_registration(FieldMap::from([field("email", "a@b.co")]))
            .unwrap();

        let report = queue.replay_all(&store).await;
        assert_eq!(report, ReplayReport { applied: 2, failed: 1 });
        assert_eq!(report.outcome().unwrap_err().code, ErrorCode::SyncReplayFailed);

        let left = queue.list_queued();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].lot_id(), Some("lot-2"));
        assert_eq!(store.documents(user::COLLECTION).len(), 1);
        let lot = store.get(lot_model::COLLECTION, "lot-1").await.unwrap();
        assert_eq!(lot.count(lot_model::fields::AVAILABLE_SPOTS).unwrap(), 4);

        store.clear_failures();
        let report = queue.replay_all(&store).await;
        assert_eq!(report, ReplayReport { applied: 1, failed: 0 });
        assert!(report.outcome().is_ok());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_replay_of_empty_queue_is_silent() {
        let store = InMemoryStore::new();
        assert!(queue().replay_all(&store).await.is_empty());
        assert_eq!(store.calls(), CallCounts::default());
    }

    #[tokio::test]
    async fn test_newer_edit_survives_inflight_replay() {
        let queue = queue();
        queue.enqueue_capacity_edit("lot-1", 4, 0).unwrap();
        let replayed = queue.list_queued().remove(0);

        queue.enqueue_capacity_edit("lot-1", 9, 9).unwrap();
        queue.remove_replayed(&replayed).unwrap();

        assert_eq!(queue.pending_updates(), vec![PendingUpdate::new("lot-1", 9, 9)]);
    }
}
