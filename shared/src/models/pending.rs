//! Mutations queued while offline

use super::parking_lot;
use crate::document::{FieldMap, ToFields, field};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A capacity edit waiting to be written to `parkingLots/{lot_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub lot_id: String,
    pub available_spots: u32,
    pub available_ev_spots: u32,
}

impl PendingUpdate {
    pub fn new(lot_id: impl Into<String>, available_spots: u32, available_ev_spots: u32) -> Self {
        Self {
            lot_id: lot_id.into(),
            available_spots,
            available_ev_spots,
        }
    }

    /// Fields touched by the patch
    pub fn field_mask() -> [&'static str; 2] {
        [
            parking_lot::fields::AVAILABLE_SPOTS,
            parking_lot::fields::AVAILABLE_EV_SPOTS,
        ]
    }
}

impl ToFields for PendingUpdate {
    fn to_fields(&self) -> FieldMap {
        FieldMap::from([
            field(parking_lot::fields::AVAILABLE_SPOTS, self.available_spots),
            field(parking_lot::fields::AVAILABLE_EV_SPOTS, self.available_ev_spots),
        ])
    }
}

/// A user registration waiting to be created in `users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUser {
    /// Local identity of the queued entry
    pub queue_id: Uuid,
    pub fields: FieldMap,
    pub queued_at: DateTime<Utc>,
}

impl PendingUser {
    pub fn new(fields: FieldMap) -> Self {
        Self {
            queue_id: Uuid::new_v4(),
            fields,
            queued_at: Utc::now(),
        }
    }
}

/// One entry of the offline queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueuedMutation {
    CapacityEdit(PendingUpdate),
    Registration(PendingUser),
}

impl QueuedMutation {
    /// Lot id for capacity edits
    pub fn lot_id(&self) -> Option<&str> {
        match self {
            Self::CapacityEdit(update) => Some(&update.lot_id),
            Self::Registration(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CapacityEdit(_) => "capacity_edit",
            Self::Registration(_) => "registration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentValue;

    #[test]
    fn test_capacity_edit_fields_match_mask() {
        let update = PendingUpdate::new("lot-1", 4, 1);
        let fields = update.to_fields();
        let mask = PendingUpdate::field_mask();
        assert_eq!(fields.len(), mask.len());
        assert!(mask.iter().all(|name| fields.contains_key(*name)));
        assert_eq!(fields["availableSpots"], DocumentValue::Integer(4));
    }

    #[test]
    fn test_queue_entries_serialize_with_kind_tag() {
        let entries = vec![
            QueuedMutation::CapacityEdit(PendingUpdate::new("lot-1", 4, 1)),
            QueuedMutation::Registration(PendingUser::new(FieldMap::from([field(
                "email",
                "a@b.co",
            )]))),
        ];
        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json[0]["kind"], "capacity_edit");
        assert_eq!(json[0]["lot_id"], "lot-1");
        assert_eq!(json[1]["kind"], "registration");

        let back: Vec<QueuedMutation> = serde_json::from_value(json).unwrap();
        assert_eq!(back, entries);
        assert_eq!(back[0].lot_id(), Some("lot-1"));
        assert_eq!(back[1].lot_id(), None);
    }

    #[test]
    fn test_pending_users_get_distinct_ids() {
        let a = PendingUser::new(FieldMap::new());
        let b = PendingUser::new(FieldMap::new());
        assert_ne!(a.queue_id, b.queue_id);
    }
}
