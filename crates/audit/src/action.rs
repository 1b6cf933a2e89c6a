use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stocktrail_core::DomainError;

/// The kind of business event an audit record describes.
///
/// Always derived from a before/after comparison; never client-supplied.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Update,
    Restock,
    Sale,
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Update => "UPDATE",
            ChangeAction::Restock => "RESTOCK",
            ChangeAction::Sale => "SALE",
            ChangeAction::Delete => "DELETE",
        }
    }
}

impl core::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(ChangeAction::Create),
            "UPDATE" => Ok(ChangeAction::Update),
            "RESTOCK" => Ok(ChangeAction::Restock),
            "SALE" => Ok(ChangeAction::Sale),
            "DELETE" => Ok(ChangeAction::Delete),
            _ => Err(DomainError::validation(format!(
                "unknown action '{s}': expected one of CREATE, UPDATE, RESTOCK, SALE, DELETE"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for action in [
            ChangeAction::Create,
            ChangeAction::Update,
            ChangeAction::Restock,
            ChangeAction::Sale,
            ChangeAction::Delete,
        ] {
            assert_eq!(action.as_str().parse::<ChangeAction>().unwrap(), action);
        }
        assert!("restock".parse::<ChangeAction>().is_err());
    }

    #[test]
    fn serializes_as_uppercase_tag() {
        assert_eq!(
            serde_json::to_string(&ChangeAction::Restock).unwrap(),
            "\"RESTOCK\""
        );
    }
}
