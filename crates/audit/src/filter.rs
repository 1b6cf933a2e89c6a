use stocktrail_core::{ItemId, UserId};

use crate::action::ChangeAction;
use crate::entry::ChangeLogEntry;

/// Filter for audit-trail queries. All present fields must match.
///
/// The item filter compares against the record's current reference, so
/// records whose item has since been deleted (reference nulled) only match
/// an unfiltered query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub item: Option<ItemId>,
    pub user: Option<UserId>,
    pub action: Option<ChangeAction>,
}

impl LogFilter {
    pub fn matches(&self, entry: &ChangeLogEntry) -> bool {
        if let Some(item) = self.item {
            if entry.item != Some(item) {
                return false;
            }
        }
        if let Some(user) = self.user {
            if entry.user != Some(user) {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        true
    }
}

/// Sort direction for the timestamp ordering of log listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampOrder {
    #[default]
    Asc,
    Desc,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use stocktrail_core::ChangeLogId;

    use super::*;

    fn entry(item: Option<ItemId>, user: Option<UserId>, action: ChangeAction) -> ChangeLogEntry {
        ChangeLogEntry {
            id: ChangeLogId::new(),
            item,
            item_name: "Widget".to_string(),
            user,
            action,
            quantity_changed: 0,
            timestamp: Utc::now(),
            remarks: None,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let e = entry(None, None, ChangeAction::Delete);
        assert!(LogFilter::default().matches(&e));
    }

    #[test]
    fn item_filter_skips_records_with_nulled_reference() {
        let item = ItemId::new();
        let filter = LogFilter {
            item: Some(item),
            ..Default::default()
        };

        assert!(filter.matches(&entry(Some(item), None, ChangeAction::Create)));
        assert!(!filter.matches(&entry(None, None, ChangeAction::Delete)));
        assert!(!filter.matches(&entry(Some(ItemId::new()), None, ChangeAction::Create)));
    }

    #[test]
    fn filters_combine_conjunctively() {
        let item = ItemId::new();
        let user = UserId::new();
        let filter = LogFilter {
            item: Some(item),
            user: Some(user),
            action: Some(ChangeAction::Sale),
        };

        assert!(filter.matches(&entry(Some(item), Some(user), ChangeAction::Sale)));
        assert!(!filter.matches(&entry(Some(item), Some(user), ChangeAction::Restock)));
        assert!(!filter.matches(&entry(Some(item), Some(UserId::new()), ChangeAction::Sale)));
    }
}
