//! Users table (minimal entity).
//!
//! The web tier handles signup; the engine only needs to look users up (by id
//! or by phone number for the WhatsApp bot) and to remember their primary
//! asset.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub primary_asset_id: Option<Uuid>,
}

/// Normalizes a phone number for matching: digits only, Indonesian local
/// prefix `08…` rewritten to `628…`.
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if let Some(rest) = digits.strip_prefix("08") {
        return format!("628{rest}");
    }
    digits
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub primary_asset_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id.clone()),
            name: ActiveValue::Set(user.name.clone()),
            phone: ActiveValue::Set(user.phone.clone()),
            primary_asset_id: ActiveValue::Set(
                user.primary_asset_id.map(|id| id.to_string()),
            ),
        }
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            phone: model.phone,
            primary_asset_id: model
                .primary_asset_id
                .map(|id| {
                    Uuid::parse_str(&id)
                        .map_err(|_| EngineError::InvalidId(format!("invalid asset id: {id}")))
                })
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_and_rewrites_prefix() {
        assert_eq!(normalize_phone("+62 812-3456-7890"), "6281234567890");
        assert_eq!(normalize_phone("081234567890"), "6281234567890");
        assert_eq!(normalize_phone("6281234567890"), "6281234567890");
    }
}
