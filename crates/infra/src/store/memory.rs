//! In-memory store for dev/test.
//!
//! One `RwLock` over the whole state: every mutating method takes the write
//! guard exactly once, which both serializes writers and makes the item
//! mutation and its audit append a single atomic step.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use stocktrail_audit::{ChangeLogEntry, LogFilter, TimestampOrder};
use stocktrail_catalog::{Category, InventoryItem};
use stocktrail_core::{CategoryId, ChangeLogId, ItemId, UserId};

use super::{InventoryStore, ItemView, LogView, StoreError, UserRecord};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, UserRecord>,
    categories: HashMap<CategoryId, Category>,
    items: HashMap<ItemId, InventoryItem>,
    logs: Vec<ChangeLogEntry>,
}

impl State {
    fn item_view(&self, item: &InventoryItem) -> ItemView {
        ItemView {
            item: item.clone(),
            category_name: item
                .category
                .and_then(|id| self.categories.get(&id))
                .map(|c| c.name.clone()),
            managed_by_username: self
                .users
                .get(&item.managed_by)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
        }
    }

    fn log_view(&self, entry: &ChangeLogEntry) -> LogView {
        LogView {
            entry: entry.clone(),
            user_username: entry
                .user
                .and_then(|id| self.users.get(&id))
                .map(|u| u.username.clone()),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("state lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("state lock poisoned".to_string()))
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn insert_user(&self, user: UserRecord) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate {
                field: "username",
                value: user.username,
            });
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let state = self.read()?;
        let mut users: Vec<_> = state.users.values().cloned().collect();
        users.sort_by_key(|u| (u.date_joined, *u.id.as_uuid()));
        Ok(users)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.users.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }

        // Cascade: the user's items go away; their audit records stay with
        // references nulled.
        let removed: HashSet<ItemId> = state
            .items
            .values()
            .filter(|i| i.managed_by == id)
            .map(|i| i.id)
            .collect();
        state.items.retain(|_, i| i.managed_by != id);

        for entry in &mut state.logs {
            if entry.user == Some(id) {
                entry.user = None;
            }
            if let Some(item) = entry.item {
                if removed.contains(&item) {
                    entry.item = None;
                }
            }
        }
        Ok(())
    }

    async fn insert_category(&self, category: Category) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.categories.values().any(|c| c.name == category.name) {
            return Err(StoreError::Duplicate {
                field: "category name",
                value: category.name,
            });
        }
        state.categories.insert(category.id, category);
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let state = self.read()?;
        let mut categories: Vec<_> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn update_category(&self, category: Category) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.categories.contains_key(&category.id) {
            return Err(StoreError::NotFound);
        }
        if state
            .categories
            .values()
            .any(|c| c.id != category.id && c.name == category.name)
        {
            return Err(StoreError::Duplicate {
                field: "category name",
                value: category.name,
            });
        }
        state.categories.insert(category.id, category);
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.categories.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        for item in state.items.values_mut() {
            if item.category == Some(id) {
                item.category = None;
            }
        }
        Ok(())
    }

    async fn insert_item(
        &self,
        item: InventoryItem,
        log: ChangeLogEntry,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.items.contains_key(&item.id) {
            return Err(StoreError::Conflict(format!("item {} already exists", item.id)));
        }
        state.items.insert(item.id, item);
        state.logs.push(log);
        Ok(())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    async fn get_item_view(&self, id: ItemId) -> Result<Option<ItemView>, StoreError> {
        let state = self.read()?;
        Ok(state.items.get(&id).map(|i| state.item_view(i)))
    }

    async fn list_item_views(&self) -> Result<Vec<ItemView>, StoreError> {
        let state = self.read()?;
        let mut items: Vec<_> = state.items.values().collect();
        items.sort_by_key(|i| (i.date_added, *i.id.as_uuid()));
        Ok(items.into_iter().map(|i| state.item_view(i)).collect())
    }

    async fn list_item_views_below(&self, threshold: i64) -> Result<Vec<ItemView>, StoreError> {
        let state = self.read()?;
        let mut items: Vec<_> = state
            .items
            .values()
            .filter(|i| i.quantity < threshold)
            .collect();
        items.sort_by_key(|i| (i.date_added, *i.id.as_uuid()));
        Ok(items.into_iter().map(|i| state.item_view(i)).collect())
    }

    async fn update_item(
        &self,
        item: InventoryItem,
        expected_version: u64,
        log: ChangeLogEntry,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let current = state.items.get_mut(&item.id).ok_or(StoreError::NotFound)?;
        if current.version != expected_version {
            return Err(StoreError::Conflict(format!(
                "item {} was modified concurrently",
                item.id
            )));
        }
        *current = item;
        state.logs.push(log);
        Ok(())
    }

    async fn delete_item(
        &self,
        id: ItemId,
        expected_version: u64,
        log: ChangeLogEntry,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let current = state.items.get(&id).ok_or(StoreError::NotFound)?;
        if current.version != expected_version {
            return Err(StoreError::Conflict(format!(
                "item {id} was modified concurrently"
            )));
        }
        state.items.remove(&id);

        // Earlier records for this item lose their reference; the snapshot
        // fields keep them meaningful.
        for entry in &mut state.logs {
            if entry.item == Some(id) {
                entry.item = None;
            }
        }
        state.logs.push(log);
        Ok(())
    }

    async fn list_logs(
        &self,
        filter: LogFilter,
        order: TimestampOrder,
    ) -> Result<Vec<LogView>, StoreError> {
        let state = self.read()?;
        let mut entries: Vec<_> = state.logs.iter().filter(|e| filter.matches(e)).collect();
        entries.sort_by_key(|e| (e.timestamp, *e.id.as_uuid()));
        if order == TimestampOrder::Desc {
            entries.reverse();
        }
        Ok(entries.into_iter().map(|e| state.log_view(e)).collect())
    }

    async fn get_log(&self, id: ChangeLogId) -> Result<Option<LogView>, StoreError> {
        let state = self.read()?;
        Ok(state
            .logs
            .iter()
            .find(|e| e.id == id)
            .map(|e| state.log_view(e)))
    }
}
