//! Transaction primitives.
//!
//! A `Transaction` is a single income or expense event. The ledger operations
//! in [`crate::ops`] keep the owning asset's running balance consistent with
//! the set of transactions referencing it.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, OwnerRef, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Effect of an amount of this kind on an asset balance.
    #[must_use]
    pub const fn signed_delta(self, amount_minor: i64) -> i64 {
        match self {
            Self::Income => amount_minor,
            Self::Expense => -amount_minor,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidId(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner: OwnerRef,
    pub asset_id: Uuid,
    pub kind: TransactionKind,
    pub category: String,
    /// Non-negative amount in minor units; the sign comes from `kind`.
    pub amount_minor: i64,
    pub currency: Currency,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    pub created_by: String,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner: OwnerRef,
        asset_id: Uuid,
        kind: TransactionKind,
        category: String,
        amount_minor: i64,
        currency: Currency,
        date: DateTime<Utc>,
        note: Option<String>,
        created_by: String,
    ) -> ResultEngine<Self> {
        if amount_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            asset_id,
            kind,
            category,
            amount_minor,
            currency,
            date,
            note,
            created_by,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_kind: String,
    pub owner_id: String,
    pub asset_id: String,
    pub kind: String,
    pub category: String,
    pub amount_minor: i64,
    pub currency: String,
    pub date: DateTimeUtc,
    pub note: Option<String>,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assets::Entity",
        from = "Column::AssetId",
        to = "super::assets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Assets,
}

impl Related<super::assets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            owner_kind: ActiveValue::Set(tx.owner.kind().to_string()),
            owner_id: ActiveValue::Set(tx.owner.id().to_string()),
            asset_id: ActiveValue::Set(tx.asset_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            category: ActiveValue::Set(tx.category.clone()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            date: ActiveValue::Set(tx.date),
            note: ActiveValue::Set(tx.note.clone()),
            created_by: ActiveValue::Set(tx.created_by.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::TransactionNotFound(model.id.clone()))?,
            owner: OwnerRef::from_columns(&model.owner_kind, &model.owner_id)?,
            asset_id: Uuid::parse_str(&model.asset_id)
                .map_err(|_| EngineError::AssetNotFound(model.asset_id.clone()))?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            category: model.category,
            amount_minor: model.amount_minor,
            currency: Currency::try_from(model.currency.as_str())?,
            date: model.date,
            note: model.note,
            created_by: model.created_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_delta_follows_kind() {
        assert_eq!(TransactionKind::Income.signed_delta(500), 500);
        assert_eq!(TransactionKind::Expense.signed_delta(500), -500);
    }

    #[test]
    fn rejects_negative_amount() {
        let err = Transaction::new(
            OwnerRef::User("u1".to_string()),
            Uuid::new_v4(),
            TransactionKind::Expense,
            "Makanan".to_string(),
            -1,
            Currency::Jpy,
            Utc::now(),
            None,
            "u1".to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}
