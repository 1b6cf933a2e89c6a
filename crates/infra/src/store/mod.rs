//! Storage abstraction for the catalog and the audit trail.
//!
//! One store owns both: every mutating item method takes the already-derived
//! audit record and applies mutation + append atomically, so an item change
//! can never be observed without its record (or vice versa).

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stocktrail_audit::{ChangeLogEntry, LogFilter, TimestampOrder};
use stocktrail_catalog::{Category, InventoryItem};
use stocktrail_core::{CategoryId, ChangeLogId, ItemId, UserId};

pub use memory::InMemoryStore;

/// A registered account. Credentials live with the external identity
/// provider; this record exists for ownership and display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub date_joined: DateTime<Utc>,
}

/// Input for registering an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
}

/// An item joined with the display names its representation carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub item: InventoryItem,
    pub category_name: Option<String>,
    pub managed_by_username: String,
}

/// An audit record joined with the acting user's name, when the user still
/// exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogView {
    pub entry: ChangeLogEntry,
    pub user_username: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness rule was violated (e.g. username, category name).
    #[error("duplicate {field}: '{value}' already exists")]
    Duplicate { field: &'static str, value: String },

    #[error("not found")]
    NotFound,

    /// The row changed under the caller (stale version).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Catalog + audit storage.
///
/// Mutating item methods are atomic over both tables. `expected_version` is
/// the version read by the caller before deriving the change; a mismatch
/// means a concurrent mutation won and the whole operation is rejected.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    // Users
    async fn insert_user(&self, user: UserRecord) -> Result<(), StoreError>;
    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;
    /// Deletes the account, cascades to the items it manages, and nulls the
    /// `user` (and removed items') references on audit records. The records
    /// themselves survive.
    async fn delete_user(&self, id: UserId) -> Result<(), StoreError>;

    // Categories
    async fn insert_category(&self, category: Category) -> Result<(), StoreError>;
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn update_category(&self, category: Category) -> Result<(), StoreError>;
    /// Deletes the category and nullifies the `category` reference of its
    /// items. Never cascades to the items.
    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError>;

    // Items (each mutation carries its derived audit record)
    async fn insert_item(
        &self,
        item: InventoryItem,
        log: ChangeLogEntry,
    ) -> Result<(), StoreError>;
    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError>;
    async fn get_item_view(&self, id: ItemId) -> Result<Option<ItemView>, StoreError>;
    async fn list_item_views(&self) -> Result<Vec<ItemView>, StoreError>;
    async fn list_item_views_below(&self, threshold: i64) -> Result<Vec<ItemView>, StoreError>;
    async fn update_item(
        &self,
        item: InventoryItem,
        expected_version: u64,
        log: ChangeLogEntry,
    ) -> Result<(), StoreError>;
    /// Removes the item and appends its DELETE record; prior records for the
    /// item get their reference nulled in the same step.
    async fn delete_item(
        &self,
        id: ItemId,
        expected_version: u64,
        log: ChangeLogEntry,
    ) -> Result<(), StoreError>;

    // Audit trail (read-only: append happens through the item methods)
    async fn list_logs(
        &self,
        filter: LogFilter,
        order: TimestampOrder,
    ) -> Result<Vec<LogView>, StoreError>;
    async fn get_log(&self, id: ChangeLogId) -> Result<Option<LogView>, StoreError>;
}
