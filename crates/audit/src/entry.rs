use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktrail_core::{ChangeLogId, ItemId, UserId};

use crate::action::ChangeAction;
use crate::deriver::PendingChange;

/// One immutable audit record.
///
/// Append-only: records are never updated or deleted. When the referenced
/// item or user is later removed, the store nulls the reference but the
/// record and its snapshot fields (`item_name`, delta, remarks) persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: ChangeLogId,
    /// Referenced item; `None` on DELETE records and after the item is gone.
    pub item: Option<ItemId>,
    /// The item's name at event time, kept so the record outlives the item.
    pub item_name: String,
    /// Acting principal; nulled by the store if the user is later deleted.
    pub user: Option<UserId>,
    pub action: ChangeAction,
    /// Signed quantity delta; for DELETE, the negation of the final quantity.
    pub quantity_changed: i64,
    pub timestamp: DateTime<Utc>,
    pub remarks: Option<String>,
}

impl ChangeLogEntry {
    /// Stamp a derived change with the acting principal and event time.
    pub fn record(change: PendingChange, user: UserId, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: ChangeLogId::new(),
            item: change.item,
            item_name: change.item_name,
            user: Some(user),
            action: change.action,
            quantity_changed: change.quantity_changed,
            timestamp,
            remarks: Some(change.remarks),
        }
    }
}
