use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktrail_core::{CategoryId, DomainError, DomainResult, ItemId, Price, UserId};

/// An inventory item: the authoritative current state of one stocked good.
///
/// `managed_by` and `date_added` are fixed at creation. `version` is the
/// optimistic-concurrency token checked by the store on update/delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub price: Price,
    pub category: Option<CategoryId>,
    pub date_added: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub managed_by: UserId,
    pub version: u64,
}

/// Input for creating an item. Quantity defaults to 0 when unspecified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: String,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub price: Price,
    pub category: Option<CategoryId>,
}

/// Partial update for an item.
///
/// `None` leaves a field unchanged; `Some(None)` clears a nullable field.
/// Ownership (`managed_by`) and `date_added` are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub quantity: Option<i64>,
    pub price: Option<Price>,
    pub category: Option<Option<CategoryId>>,
}

/// Field values of an item at a point in time, for before/after comparison.
///
/// Only the fields the change deriver reads: classification is driven by
/// quantity alone, plus the name snapshot stored on every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub name: String,
    pub quantity: i64,
}

impl InventoryItem {
    pub fn create(
        id: ItemId,
        draft: ItemDraft,
        managed_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            description: draft.description,
            quantity: draft.quantity.unwrap_or(0),
            price: draft.price,
            category: draft.category,
            date_added: now,
            last_updated: now,
            managed_by,
            version: 1,
        })
    }

    /// Apply a patch, refreshing `last_updated` and bumping the version.
    ///
    /// An empty patch is still a mutation: it gets an UPDATE audit record,
    /// so the version moves even when no field changes.
    pub fn apply(&mut self, patch: ItemPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("item name cannot be empty"));
            }
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        self.last_updated = now;
        self.version += 1;
        Ok(())
    }

    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            name: self.name.clone(),
            quantity: self.quantity,
        }
    }
}
