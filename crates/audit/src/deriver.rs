//! Change-event derivation.
//!
//! Given before/after snapshots of one item, classify what business event
//! occurred and produce the record content for it. Pure: no clock, no IDs,
//! no I/O. The service stamps principal and timestamp and persists.

use stocktrail_catalog::ItemSnapshot;
use stocktrail_core::ItemId;

use crate::action::ChangeAction;

/// A catalog mutation described by its surrounding snapshots.
#[derive(Debug, Copy, Clone)]
pub enum ItemChange<'a> {
    Created { after: &'a ItemSnapshot },
    Updated {
        before: &'a ItemSnapshot,
        after: &'a ItemSnapshot,
    },
    Deleted { before: &'a ItemSnapshot },
}

/// Record content derived from an [`ItemChange`], not yet stamped with the
/// acting principal or timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    /// `None` for deletions: the record must stand on its own once the row
    /// is gone.
    pub item: Option<ItemId>,
    pub item_name: String,
    pub action: ChangeAction,
    pub quantity_changed: i64,
    pub remarks: String,
}

/// Derive the single audit record for one mutation of `item_id`.
///
/// Classification looks at quantity alone: any update that leaves quantity
/// untouched is a generic UPDATE no matter which other fields changed.
pub fn derive(item_id: ItemId, change: ItemChange<'_>) -> PendingChange {
    match change {
        ItemChange::Created { after } => PendingChange {
            item: Some(item_id),
            item_name: after.name.clone(),
            action: ChangeAction::Create,
            quantity_changed: after.quantity,
            remarks: "Initial creation".to_string(),
        },
        ItemChange::Updated { before, after } => {
            if before.quantity == after.quantity {
                PendingChange {
                    item: Some(item_id),
                    item_name: after.name.clone(),
                    action: ChangeAction::Update,
                    quantity_changed: 0,
                    remarks: "Item details updated".to_string(),
                }
            } else {
                let action = if after.quantity > before.quantity {
                    ChangeAction::Restock
                } else {
                    ChangeAction::Sale
                };
                PendingChange {
                    item: Some(item_id),
                    item_name: after.name.clone(),
                    action,
                    quantity_changed: after.quantity - before.quantity,
                    remarks: format!(
                        "Quantity updated from {} to {}",
                        before.quantity, after.quantity
                    ),
                }
            }
        }
        ItemChange::Deleted { before } => PendingChange {
            item: None,
            item_name: before.name.clone(),
            action: ChangeAction::Delete,
            quantity_changed: -before.quantity,
            remarks: format!("Item '{}' deleted", before.name),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snap(name: &str, quantity: i64) -> ItemSnapshot {
        ItemSnapshot {
            name: name.to_string(),
            quantity,
        }
    }

    #[test]
    fn creation_records_initial_quantity() {
        let after = snap("Widget", 20);
        let change = derive(ItemId::new(), ItemChange::Created { after: &after });

        assert_eq!(change.action, ChangeAction::Create);
        assert_eq!(change.quantity_changed, 20);
        assert_eq!(change.item_name, "Widget");
        assert_eq!(change.remarks, "Initial creation");
        assert!(change.item.is_some());
    }

    #[test]
    fn quantity_increase_is_a_restock() {
        let before = snap("Widget", 5);
        let after = snap("Widget", 12);
        let change = derive(
            ItemId::new(),
            ItemChange::Updated {
                before: &before,
                after: &after,
            },
        );

        assert_eq!(change.action, ChangeAction::Restock);
        assert_eq!(change.quantity_changed, 7);
        assert_eq!(change.remarks, "Quantity updated from 5 to 12");
    }

    #[test]
    fn quantity_decrease_is_a_sale() {
        let before = snap("Widget", 20);
        let after = snap("Widget", 15);
        let change = derive(
            ItemId::new(),
            ItemChange::Updated {
                before: &before,
                after: &after,
            },
        );

        assert_eq!(change.action, ChangeAction::Sale);
        assert_eq!(change.quantity_changed, -5);
        assert_eq!(change.remarks, "Quantity updated from 20 to 15");
    }

    #[test]
    fn unchanged_quantity_is_a_generic_update_even_if_renamed() {
        let before = snap("Widget", 15);
        let after = snap("Premium Widget", 15);
        let change = derive(
            ItemId::new(),
            ItemChange::Updated {
                before: &before,
                after: &after,
            },
        );

        assert_eq!(change.action, ChangeAction::Update);
        assert_eq!(change.quantity_changed, 0);
        assert_eq!(change.remarks, "Item details updated");
    }

    #[test]
    fn deletion_negates_quantity_and_drops_the_item_ref() {
        let before = snap("Widget", 15);
        let change = derive(ItemId::new(), ItemChange::Deleted { before: &before });

        assert_eq!(change.action, ChangeAction::Delete);
        assert_eq!(change.quantity_changed, -15);
        assert_eq!(change.item, None);
        assert_eq!(change.item_name, "Widget");
        assert_eq!(change.remarks, "Item 'Widget' deleted");
    }

    proptest! {
        #[test]
        fn update_classification_matches_quantity_ordering(
            before_qty in -1_000_000i64..1_000_000,
            after_qty in -1_000_000i64..1_000_000,
        ) {
            let before = snap("Widget", before_qty);
            let after = snap("Widget", after_qty);
            let change = derive(
                ItemId::new(),
                ItemChange::Updated { before: &before, after: &after },
            );

            prop_assert_eq!(change.quantity_changed, after_qty - before_qty);
            match change.action {
                ChangeAction::Restock => prop_assert!(change.quantity_changed > 0),
                ChangeAction::Sale => prop_assert!(change.quantity_changed < 0),
                ChangeAction::Update => prop_assert_eq!(change.quantity_changed, 0),
                other => prop_assert!(false, "unexpected action {:?}", other),
            }
        }

        #[test]
        fn deletion_delta_always_negates_the_final_quantity(qty in -1_000_000i64..1_000_000) {
            let before = snap("Widget", qty);
            let change = derive(ItemId::new(), ItemChange::Deleted { before: &before });
            prop_assert_eq!(change.quantity_changed, -qty);
            prop_assert_eq!(change.item, None);
        }
    }
}
