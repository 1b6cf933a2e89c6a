//! `stocktrail-catalog` — catalog entities: categories and inventory items.
//!
//! The catalog is the authoritative current state. Audit records are derived
//! from it by `stocktrail-audit`; storage rules (uniqueness, cascade,
//! nullify-on-delete) live in `stocktrail-infra`.

pub mod category;
pub mod item;

pub use category::{Category, CategoryDraft, CategoryPatch};
pub use item::{InventoryItem, ItemDraft, ItemPatch, ItemSnapshot};
