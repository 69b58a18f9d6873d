//! Ownership of assets and transactions.
//!
//! An asset belongs either to a single user or to a family group. The two
//! cases are a proper sum type here instead of the class-name-plus-id pair
//! the database rows use, so a mistyped kind string cannot survive past the
//! row conversion.

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Who owns an asset or transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OwnerRef {
    User(String),
    Family(String),
}

impl OwnerRef {
    /// Discriminant stored in the `owner_kind` column.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            OwnerRef::User(_) => "user",
            OwnerRef::Family(_) => "family",
        }
    }

    /// Identifier stored in the `owner_id` column.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            OwnerRef::User(id) | OwnerRef::Family(id) => id,
        }
    }

    /// Rebuilds the owner from its stored columns.
    pub fn from_columns(kind: &str, id: &str) -> Result<Self, EngineError> {
        match kind {
            "user" => Ok(OwnerRef::User(id.to_string())),
            "family" => Ok(OwnerRef::Family(id.to_string())),
            other => Err(EngineError::InvalidId(format!(
                "invalid owner kind: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_columns() {
        let owner = OwnerRef::Family("fam-1".to_string());
        let rebuilt = OwnerRef::from_columns(owner.kind(), owner.id()).unwrap();
        assert_eq!(owner, rebuilt);
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(OwnerRef::from_columns("team", "x").is_err());
    }
}
