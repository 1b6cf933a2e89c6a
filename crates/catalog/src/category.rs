use serde::{Deserialize, Serialize};

use stocktrail_core::{CategoryId, DomainError, DomainResult};

/// A catalog category.
///
/// Name uniqueness is enforced by the store; deleting a category nullifies
/// the `category` reference on its items (never cascades).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update for a category.
///
/// `None` leaves a field unchanged; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl Category {
    pub fn create(id: CategoryId, draft: CategoryDraft) -> DomainResult<Self> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            description: draft.description,
        })
    }

    pub fn apply(&mut self, patch: CategoryPatch) -> DomainResult<()> {
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("category name cannot be empty"));
            }
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_trims_and_validates_name() {
        let cat = Category::create(
            CategoryId::new(),
            CategoryDraft {
                name: "  Hardware ".to_string(),
                description: None,
            },
        )
        .unwrap();
        assert_eq!(cat.name, "Hardware");

        let result = Category::create(
            CategoryId::new(),
            CategoryDraft {
                name: "   ".to_string(),
                description: None,
            },
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn patch_clears_description_only_when_explicit() {
        let mut cat = Category::create(
            CategoryId::new(),
            CategoryDraft {
                name: "Tools".to_string(),
                description: Some("hand tools".to_string()),
            },
        )
        .unwrap();

        cat.apply(CategoryPatch {
            name: Some("Power Tools".to_string()),
            description: None,
        })
        .unwrap();
        assert_eq!(cat.name, "Power Tools");
        assert_eq!(cat.description.as_deref(), Some("hand tools"));

        cat.apply(CategoryPatch {
            name: None,
            description: Some(None),
        })
        .unwrap();
        assert_eq!(cat.description, None);
    }
}
