use serde::{Deserialize, Deserializer};
use serde_json::json;

use stocktrail_catalog::{Category, CategoryDraft, CategoryPatch, ItemDraft, ItemPatch};
use stocktrail_core::{CategoryId, Price};
use stocktrail_infra::{ItemView, LogView, NewUser, UserRecord};

// -------------------------
// Request DTOs
// -------------------------

/// Distinguishes an absent field from an explicit `null` (which clears the
/// field) in PATCH bodies.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    pub price: Price,
    #[serde(default)]
    pub category: Option<CategoryId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<CategoryId>>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            username: req.username,
            email: req.email,
        }
    }
}

impl From<CreateCategoryRequest> for CategoryDraft {
    fn from(req: CreateCategoryRequest) -> Self {
        CategoryDraft {
            name: req.name,
            description: req.description,
        }
    }
}

impl From<UpdateCategoryRequest> for CategoryPatch {
    fn from(req: UpdateCategoryRequest) -> Self {
        CategoryPatch {
            name: req.name,
            description: req.description,
        }
    }
}

impl From<CreateItemRequest> for ItemDraft {
    fn from(req: CreateItemRequest) -> Self {
        ItemDraft {
            name: req.name,
            description: req.description,
            quantity: req.quantity,
            price: req.price,
            category: req.category,
        }
    }
}

impl From<UpdateItemRequest> for ItemPatch {
    fn from(req: UpdateItemRequest) -> Self {
        ItemPatch {
            name: req.name,
            description: req.description,
            quantity: req.quantity,
            price: req.price,
            category: req.category,
        }
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn user_to_json(user: &UserRecord) -> serde_json::Value {
    json!({
        "id": user.id.to_string(),
        "username": user.username,
        "email": user.email,
        "date_joined": user.date_joined.to_rfc3339(),
    })
}

pub fn category_to_json(category: &Category) -> serde_json::Value {
    json!({
        "id": category.id.to_string(),
        "name": category.name,
        "description": category.description,
    })
}

pub fn item_to_json(view: &ItemView) -> serde_json::Value {
    json!({
        "id": view.item.id.to_string(),
        "name": view.item.name,
        "description": view.item.description,
        "quantity": view.item.quantity,
        "price": view.item.price.to_string(),
        "category": view.item.category.map(|c| c.to_string()),
        "category_name": view.category_name,
        "date_added": view.item.date_added.to_rfc3339(),
        "last_updated": view.item.last_updated.to_rfc3339(),
        "managed_by": view.item.managed_by.to_string(),
        "managed_by_username": view.managed_by_username,
    })
}

pub fn log_to_json(view: &LogView) -> serde_json::Value {
    json!({
        "id": view.entry.id.to_string(),
        "item": view.entry.item.map(|i| i.to_string()),
        "item_name": view.entry.item_name,
        "user": view.entry.user.map(|u| u.to_string()),
        "user_username": view.user_username,
        "action": view.entry.action.as_str(),
        "quantity_changed": view.entry.quantity_changed,
        "timestamp": view.entry.timestamp.to_rfc3339(),
        "remarks": view.entry.remarks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_body_distinguishes_absent_from_null() {
        let req: UpdateItemRequest = serde_json::from_str(r#"{"quantity": 3}"#).unwrap();
        assert_eq!(req.quantity, Some(3));
        assert_eq!(req.description, None);

        let req: UpdateItemRequest =
            serde_json::from_str(r#"{"description": null, "category": null}"#).unwrap();
        assert_eq!(req.description, Some(None));
        assert_eq!(req.category, Some(None));
    }

    #[test]
    fn create_item_requires_name_and_price() {
        assert!(serde_json::from_str::<CreateItemRequest>(r#"{"name": "Widget"}"#).is_err());
        assert!(serde_json::from_str::<CreateItemRequest>(r#"{"price": "1.00"}"#).is_err());

        let req: CreateItemRequest =
            serde_json::from_str(r#"{"name": "Widget", "price": "1.50"}"#).unwrap();
        assert_eq!(req.price.cents(), 150);
        assert_eq!(req.quantity, None);
    }
}
