//! The module contains the `Asset` struct and its database entity.
//!
//! An asset is a named store of money: a bank account, an e-money wallet, an
//! investment pot or plain cash. Its `balance_minor` column is the
//! authoritative running total maintained by the ledger operations.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{Currency, EngineError, OwnerRef, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Savings,
    EMoney,
    Investment,
    Cash,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Savings => "tabungan",
            Self::EMoney => "e-money",
            Self::Investment => "investasi",
            Self::Cash => "cash",
        }
    }
}

impl TryFrom<&str> for AssetKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "tabungan" => Ok(Self::Savings),
            "e-money" => Ok(Self::EMoney),
            "investasi" => Ok(Self::Investment),
            "cash" => Ok(Self::Cash),
            other => Err(EngineError::InvalidId(format!(
                "invalid asset kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Stable identifier, generated once and persisted so the asset can be
    /// renamed without breaking references.
    pub id: Uuid,
    pub owner: OwnerRef,
    /// ISO-3166 alpha-2 country the asset lives in ("JP", "ID").
    pub country: String,
    pub name: String,
    pub kind: AssetKind,
    pub currency: Currency,
    /// Authoritative running balance in minor units.
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    pub fn new(
        owner: OwnerRef,
        country: String,
        name: String,
        kind: AssetKind,
        currency: Currency,
        balance_minor: i64,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if balance_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "initial balance must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            country,
            name,
            kind,
            currency,
            balance_minor,
            created_at,
        })
    }
}

/// Folds an asset name for matching: NFKC (so full-width input like
/// `ＰａｙＰａｙ` equals `PayPay`), then lowercased and trimmed.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().nfkc().collect::<String>().to_lowercase()
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_kind: String,
    pub owner_id: String,
    pub country: String,
    pub name: String,
    pub kind: String,
    pub currency: String,
    pub balance_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Asset> for ActiveModel {
    fn from(asset: &Asset) -> Self {
        Self {
            id: ActiveValue::Set(asset.id.to_string()),
            owner_kind: ActiveValue::Set(asset.owner.kind().to_string()),
            owner_id: ActiveValue::Set(asset.owner.id().to_string()),
            country: ActiveValue::Set(asset.country.clone()),
            name: ActiveValue::Set(asset.name.clone()),
            kind: ActiveValue::Set(asset.kind.as_str().to_string()),
            currency: ActiveValue::Set(asset.currency.code().to_string()),
            balance_minor: ActiveValue::Set(asset.balance_minor),
            created_at: ActiveValue::Set(asset.created_at),
        }
    }
}

impl TryFrom<Model> for Asset {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::AssetNotFound(model.id.clone()))?,
            owner: OwnerRef::from_columns(&model.owner_kind, &model.owner_id)?,
            country: model.country,
            name: model.name,
            kind: AssetKind::try_from(model.kind.as_str())?,
            currency: Currency::try_from(model.currency.as_str())?,
            balance_minor: model.balance_minor,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_width_and_case() {
        assert_eq!(normalize_name("ＰａｙＰａｙ"), "paypay");
        assert_eq!(normalize_name("  BCA "), "bca");
    }

    #[test]
    fn rejects_negative_initial_balance() {
        let err = Asset::new(
            OwnerRef::User("u1".to_string()),
            "JP".to_string(),
            "PayPay".to_string(),
            AssetKind::EMoney,
            Currency::Jpy,
            -1,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}
