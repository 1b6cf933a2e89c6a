//! Postgres-backed store (feature `postgres`).
//!
//! One sqlx transaction per mutating operation; the version column is the
//! compare-and-swap guard against lost updates. Cascade and nullify rules
//! live in the schema's foreign keys, mirroring the in-memory rules.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use stocktrail_audit::{ChangeAction, ChangeLogEntry, LogFilter, TimestampOrder};
use stocktrail_catalog::{Category, InventoryItem};
use stocktrail_core::{CategoryId, ChangeLogId, ItemId, Price, UserId};

use super::{InventoryStore, ItemView, LogView, StoreError, UserRecord};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT,
        date_joined TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS categories (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT
    )",
    "CREATE TABLE IF NOT EXISTS items (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        quantity BIGINT NOT NULL,
        price_cents BIGINT NOT NULL,
        category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
        date_added TIMESTAMPTZ NOT NULL,
        last_updated TIMESTAMPTZ NOT NULL,
        managed_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        version BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS change_logs (
        id UUID PRIMARY KEY,
        item_id UUID REFERENCES items(id) ON DELETE SET NULL,
        item_name TEXT NOT NULL,
        user_id UUID REFERENCES users(id) ON DELETE SET NULL,
        action TEXT NOT NULL,
        quantity_changed BIGINT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        remarks TEXT
    )",
];

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        Ok(())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

fn unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, StoreError> {
    Ok(UserRecord {
        id: UserId::from_uuid(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        date_joined: row.try_get("date_joined")?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category, StoreError> {
    Ok(Category {
        id: CategoryId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<InventoryItem, StoreError> {
    let price = Price::from_cents(row.try_get::<i64, _>("price_cents")?)
        .map_err(|e| StoreError::Backend(format!("corrupt price column: {e}")))?;
    Ok(InventoryItem {
        id: ItemId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        quantity: row.try_get("quantity")?,
        price,
        category: row
            .try_get::<Option<Uuid>, _>("category_id")?
            .map(CategoryId::from_uuid),
        date_added: row.try_get("date_added")?,
        last_updated: row.try_get("last_updated")?,
        managed_by: UserId::from_uuid(row.try_get("managed_by")?),
        version: row.try_get::<i64, _>("version")? as u64,
    })
}

fn item_view_from_row(row: &PgRow) -> Result<ItemView, StoreError> {
    Ok(ItemView {
        item: item_from_row(row)?,
        category_name: row.try_get("category_name")?,
        managed_by_username: row.try_get("managed_by_username")?,
    })
}

fn log_view_from_row(row: &PgRow) -> Result<LogView, StoreError> {
    let action: String = row.try_get("action")?;
    let action: ChangeAction = action
        .parse()
        .map_err(|_| StoreError::Backend(format!("corrupt action column: '{action}'")))?;
    Ok(LogView {
        entry: ChangeLogEntry {
            id: ChangeLogId::from_uuid(row.try_get("id")?),
            item: row
                .try_get::<Option<Uuid>, _>("item_id")?
                .map(ItemId::from_uuid),
            item_name: row.try_get("item_name")?,
            user: row
                .try_get::<Option<Uuid>, _>("user_id")?
                .map(UserId::from_uuid),
            action,
            quantity_changed: row.try_get("quantity_changed")?,
            timestamp: row.try_get("timestamp")?,
            remarks: row.try_get("remarks")?,
        },
        user_username: row.try_get("user_username")?,
    })
}

const ITEM_VIEW_SELECT: &str = "SELECT i.id, i.name, i.description, i.quantity, i.price_cents, \
     i.category_id, i.date_added, i.last_updated, i.managed_by, i.version, \
     c.name AS category_name, u.username AS managed_by_username \
     FROM items i \
     LEFT JOIN categories c ON c.id = i.category_id \
     JOIN users u ON u.id = i.managed_by";

const LOG_VIEW_SELECT: &str = "SELECT l.id, l.item_id, l.item_name, l.user_id, l.action, \
     l.quantity_changed, l.timestamp, l.remarks, u.username AS user_username \
     FROM change_logs l \
     LEFT JOIN users u ON u.id = l.user_id";

async fn append_log(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    log: &ChangeLogEntry,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO change_logs \
         (id, item_id, item_name, user_id, action, quantity_changed, timestamp, remarks) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(Uuid::from(log.id))
    .bind(log.item.map(Uuid::from))
    .bind(&log.item_name)
    .bind(log.user.map(Uuid::from))
    .bind(log.action.as_str())
    .bind(log.quantity_changed)
    .bind(log.timestamp)
    .bind(&log.remarks)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Distinguish "row gone" from "row moved on" after a guarded write matched
/// nothing.
async fn stale_or_missing(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    id: ItemId,
) -> StoreError {
    let exists = sqlx::query("SELECT 1 FROM items WHERE id = $1")
        .bind(Uuid::from(id))
        .fetch_optional(&mut **tx)
        .await;
    match exists {
        Ok(Some(_)) => StoreError::Conflict(format!("item {id} was modified concurrently")),
        Ok(None) => StoreError::NotFound,
        Err(e) => e.into(),
    }
}

#[async_trait]
impl InventoryStore for PostgresStore {
    async fn insert_user(&self, user: UserRecord) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (id, username, email, date_joined) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::from(user.id))
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.date_joined)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    StoreError::Duplicate {
                        field: "username",
                        value: user.username.clone(),
                    }
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query("SELECT id, username, email, date_joined FROM users WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, username, email, date_joined FROM users ORDER BY date_joined, id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        // Items cascade, audit references null out via the schema's FK rules.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_category(&self, category: Category) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
            .bind(Uuid::from(category.id))
            .bind(&category.name)
            .bind(&category.description)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    StoreError::Duplicate {
                        field: "category name",
                        value: category.name.clone(),
                    }
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query("SELECT id, name, description FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn update_category(&self, category: Category) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE categories SET name = $1, description = $2 WHERE id = $3")
            .bind(&category.name)
            .bind(&category.description)
            .bind(Uuid::from(category.id))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    StoreError::Duplicate {
                        field: "category name",
                        value: category.name.clone(),
                    }
                } else {
                    e.into()
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        // Items keep existing; their category_id nulls out via the FK rule.
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_item(
        &self,
        item: InventoryItem,
        log: ChangeLogEntry,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO items \
             (id, name, description, quantity, price_cents, category_id, \
              date_added, last_updated, managed_by, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(Uuid::from(item.id))
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.price.cents())
        .bind(item.category.map(Uuid::from))
        .bind(item.date_added)
        .bind(item.last_updated)
        .bind(Uuid::from(item.managed_by))
        .bind(item.version as i64)
        .execute(&mut *tx)
        .await?;
        append_log(&mut tx, &log).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, description, quantity, price_cents, category_id, \
             date_added, last_updated, managed_by, version FROM items WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn get_item_view(&self, id: ItemId) -> Result<Option<ItemView>, StoreError> {
        let sql = format!("{ITEM_VIEW_SELECT} WHERE i.id = $1");
        let row = sqlx::query(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(item_view_from_row).transpose()
    }

    async fn list_item_views(&self) -> Result<Vec<ItemView>, StoreError> {
        let sql = format!("{ITEM_VIEW_SELECT} ORDER BY i.date_added, i.id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(item_view_from_row).collect()
    }

    async fn list_item_views_below(&self, threshold: i64) -> Result<Vec<ItemView>, StoreError> {
        let sql = format!("{ITEM_VIEW_SELECT} WHERE i.quantity < $1 ORDER BY i.date_added, i.id");
        let rows = sqlx::query(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(item_view_from_row).collect()
    }

    async fn update_item(
        &self,
        item: InventoryItem,
        expected_version: u64,
        log: ChangeLogEntry,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE items SET name = $1, description = $2, quantity = $3, price_cents = $4, \
             category_id = $5, last_updated = $6, version = $7 \
             WHERE id = $8 AND version = $9",
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.price.cents())
        .bind(item.category.map(Uuid::from))
        .bind(item.last_updated)
        .bind(item.version as i64)
        .bind(Uuid::from(item.id))
        .bind(expected_version as i64)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let err = stale_or_missing(&mut tx, item.id).await;
            tx.rollback().await.ok();
            return Err(err);
        }

        append_log(&mut tx, &log).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_item(
        &self,
        id: ItemId,
        expected_version: u64,
        log: ChangeLogEntry,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND version = $2")
            .bind(Uuid::from(id))
            .bind(expected_version as i64)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            let err = stale_or_missing(&mut tx, id).await;
            tx.rollback().await.ok();
            return Err(err);
        }

        // Prior records for the item null out via the FK rule; the DELETE
        // record is appended with no item reference at all.
        append_log(&mut tx, &log).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_logs(
        &self,
        filter: LogFilter,
        order: TimestampOrder,
    ) -> Result<Vec<LogView>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("{LOG_VIEW_SELECT} WHERE 1 = 1"));
        if let Some(item) = filter.item {
            qb.push(" AND l.item_id = ").push_bind(Uuid::from(item));
        }
        if let Some(user) = filter.user {
            qb.push(" AND l.user_id = ").push_bind(Uuid::from(user));
        }
        if let Some(action) = filter.action {
            qb.push(" AND l.action = ").push_bind(action.as_str());
        }
        qb.push(match order {
            TimestampOrder::Asc => " ORDER BY l.timestamp ASC, l.id ASC",
            TimestampOrder::Desc => " ORDER BY l.timestamp DESC, l.id DESC",
        });

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(log_view_from_row).collect()
    }

    async fn get_log(&self, id: ChangeLogId) -> Result<Option<LogView>, StoreError> {
        let sql = format!("{LOG_VIEW_SELECT} WHERE l.id = $1");
        let row = sqlx::query(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(log_view_from_row).transpose()
    }
}
