//! Service layer: orchestrates catalog mutations and the audit trail.
//!
//! Each item operation is one read-derive-write sequence: load the current
//! row, compute the change record from before/after snapshots, and hand the
//! mutation plus its record to the store as a single atomic step guarded by
//! the version read at load time.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use stocktrail_audit::{derive, ChangeLogEntry, ItemChange, LogFilter, TimestampOrder};
use stocktrail_auth::{authorize_owner, AuthzError, Principal};
use stocktrail_catalog::{
    Category, CategoryDraft, CategoryPatch, InventoryItem, ItemDraft, ItemPatch,
};
use stocktrail_core::{CategoryId, ChangeLogId, DomainError, ItemId, UserId};

use crate::store::{InventoryStore, ItemView, LogView, NewUser, StoreError, UserRecord};

/// Default threshold for the low-stock listing.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Store(String),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate { field, value } => ServiceError::Domain(
                DomainError::validation(format!("{field} '{value}' already exists")),
            ),
            StoreError::NotFound => ServiceError::Domain(DomainError::NotFound),
            StoreError::Conflict(msg) => ServiceError::Domain(DomainError::conflict(msg)),
            StoreError::Backend(msg) => ServiceError::Store(msg),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(_: AuthzError) -> Self {
        ServiceError::Domain(DomainError::Unauthorized)
    }
}

/// Account registration and lifecycle.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn InventoryStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: NewUser) -> Result<UserRecord, ServiceError> {
        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::validation("username cannot be empty").into());
        }
        let user = UserRecord {
            id: UserId::new(),
            username,
            email: input.email,
            date_joined: Utc::now(),
        };
        self.store.insert_user(user.clone()).await?;
        tracing::info!(user = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn get(&self, id: UserId) -> Result<UserRecord, ServiceError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(ServiceError::Domain(DomainError::NotFound))
    }

    pub async fn list(&self) -> Result<Vec<UserRecord>, ServiceError> {
        Ok(self.store.list_users().await?)
    }

    /// Deletes the account; the store cascades to the user's items and nulls
    /// their references on audit records.
    pub async fn delete(&self, id: UserId) -> Result<(), ServiceError> {
        self.store.delete_user(id).await?;
        tracing::info!(user = %id, "user deleted; managed items cascaded");
        Ok(())
    }
}

/// Category CRUD. No audit records: the trail tracks items only.
#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn InventoryStore>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, draft: CategoryDraft) -> Result<Category, ServiceError> {
        let category = Category::create(CategoryId::new(), draft)?;
        self.store.insert_category(category.clone()).await?;
        Ok(category)
    }

    pub async fn get(&self, id: CategoryId) -> Result<Category, ServiceError> {
        self.store
            .get_category(id)
            .await?
            .ok_or(ServiceError::Domain(DomainError::NotFound))
    }

    pub async fn list(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn update(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, ServiceError> {
        let mut category = self.get(id).await?;
        category.apply(patch)?;
        self.store.update_category(category.clone()).await?;
        Ok(category)
    }

    pub async fn delete(&self, id: CategoryId) -> Result<(), ServiceError> {
        self.store.delete_category(id).await?;
        tracing::info!(category = %id, "category deleted; item references nulled");
        Ok(())
    }
}

/// Inventory item operations: the one place audit records are produced.
#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn InventoryStore>,
}

impl ItemService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    async fn ensure_category_exists(&self, id: CategoryId) -> Result<(), ServiceError> {
        if self.store.get_category(id).await?.is_none() {
            return Err(DomainError::validation(format!("category {id} does not exist")).into());
        }
        Ok(())
    }

    pub async fn create(
        &self,
        draft: ItemDraft,
        principal: &Principal,
    ) -> Result<ItemView, ServiceError> {
        if let Some(category) = draft.category {
            self.ensure_category_exists(category).await?;
        }
        // A token can outlive its account; ownership must reference a live row.
        if self.store.get_user(principal.user_id).await?.is_none() {
            return Err(DomainError::Unauthorized.into());
        }

        let now = Utc::now();
        let item = InventoryItem::create(ItemId::new(), draft, principal.user_id, now)?;
        let change = derive(item.id, ItemChange::Created {
            after: &item.snapshot(),
        });
        let entry = ChangeLogEntry::record(change, principal.user_id, now);
        let id = item.id;

        self.store.insert_item(item, entry).await?;
        tracing::info!(item = %id, user = %principal.user_id, "inventory item created");

        self.store
            .get_item_view(id)
            .await?
            .ok_or(ServiceError::Domain(DomainError::NotFound))
    }

    pub async fn update(
        &self,
        id: ItemId,
        patch: ItemPatch,
        principal: &Principal,
    ) -> Result<ItemView, ServiceError> {
        let before = self
            .store
            .get_item(id)
            .await?
            .ok_or(ServiceError::Domain(DomainError::NotFound))?;
        authorize_owner(principal, before.managed_by)?;

        if let Some(Some(category)) = patch.category {
            self.ensure_category_exists(category).await?;
        }

        let before_snapshot = before.snapshot();
        let expected_version = before.version;
        let mut after = before;
        let now = Utc::now();
        after.apply(patch, now)?;

        let change = derive(id, ItemChange::Updated {
            before: &before_snapshot,
            after: &after.snapshot(),
        });
        let entry = ChangeLogEntry::record(change, principal.user_id, now);
        let action = entry.action;

        self.store.update_item(after, expected_version, entry).await?;
        tracing::info!(item = %id, user = %principal.user_id, %action, "inventory item updated");

        self.store
            .get_item_view(id)
            .await?
            .ok_or(ServiceError::Domain(DomainError::NotFound))
    }

    pub async fn delete(&self, id: ItemId, principal: &Principal) -> Result<(), ServiceError> {
        let before = self
            .store
            .get_item(id)
            .await?
            .ok_or(ServiceError::Domain(DomainError::NotFound))?;
        authorize_owner(principal, before.managed_by)?;

        let change = derive(id, ItemChange::Deleted {
            before: &before.snapshot(),
        });
        let entry = ChangeLogEntry::record(change, principal.user_id, Utc::now());

        self.store.delete_item(id, before.version, entry).await?;
        tracing::info!(item = %id, user = %principal.user_id, "inventory item deleted");
        Ok(())
    }

    pub async fn get(&self, id: ItemId) -> Result<ItemView, ServiceError> {
        self.store
            .get_item_view(id)
            .await?
            .ok_or(ServiceError::Domain(DomainError::NotFound))
    }

    pub async fn list(&self) -> Result<Vec<ItemView>, ServiceError> {
        Ok(self.store.list_item_views().await?)
    }

    pub async fn list_low_stock(&self, threshold: i64) -> Result<Vec<ItemView>, ServiceError> {
        Ok(self.store.list_item_views_below(threshold).await?)
    }
}

/// Read-only access to the audit trail.
#[derive(Clone)]
pub struct LogQueryService {
    store: Arc<dyn InventoryStore>,
}

impl LogQueryService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        filter: LogFilter,
        order: TimestampOrder,
    ) -> Result<Vec<LogView>, ServiceError> {
        Ok(self.store.list_logs(filter, order).await?)
    }

    pub async fn get(&self, id: ChangeLogId) -> Result<LogView, ServiceError> {
        self.store
            .get_log(id)
            .await?
            .ok_or(ServiceError::Domain(DomainError::NotFound))
    }
}

/// The full service set over one store.
#[derive(Clone)]
pub struct AppServices {
    pub users: UserService,
    pub categories: CategoryService,
    pub items: ItemService,
    pub logs: LogQueryService,
}

impl AppServices {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            users: UserService::new(store.clone()),
            categories: CategoryService::new(store.clone()),
            items: ItemService::new(store.clone()),
            logs: LogQueryService::new(store),
        }
    }
}
