//! Asset operations: create, lookup, rename, manual balance correction,
//! delete.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    Asset, AssetKind, Currency, EngineError, OwnerRef, ResultEngine, assets,
    assets::normalize_name, transactions,
};

use super::{Engine, normalize_required_name, with_tx};

/// Input for [`Engine::new_asset`].
#[derive(Clone, Debug)]
pub struct NewAsset {
    pub owner: OwnerRef,
    pub country: String,
    pub name: String,
    pub kind: AssetKind,
    pub currency: Currency,
    pub balance_minor: i64,
}

impl Engine {
    /// Create a new asset for an owner.
    ///
    /// The name must be unique per owner, compared after NFKC folding so a
    /// full-width rendering of an existing name is rejected too.
    pub async fn new_asset(&self, cmd: NewAsset) -> ResultEngine<Asset> {
        let name = normalize_required_name(&cmd.name, "asset")?;
        let asset = Asset::new(
            cmd.owner,
            cmd.country,
            name,
            cmd.kind,
            cmd.currency,
            cmd.balance_minor,
            Utc::now(),
        )?;

        // The uniqueness scan and the insert are one unit of work.
        let wanted = normalize_name(&asset.name);
        with_tx!(self, |db_tx| {
            let result: ResultEngine<()> = async {
                let existing = assets_for_owner_on(&db_tx, &asset.owner).await?;
                if existing.iter().any(|a| normalize_name(&a.name) == wanted) {
                    return Err(EngineError::ExistingKey(asset.name.clone()));
                }
                assets::ActiveModel::from(&asset).insert(&db_tx).await?;
                Ok(())
            }
            .await;
            result
        })?;
        Ok(asset)
    }

    /// Return an asset owned by `owner`.
    pub async fn asset(&self, asset_id: Uuid, owner: &OwnerRef) -> ResultEngine<Asset> {
        let model = require_asset(self.database(), asset_id).await?;
        let asset = Asset::try_from(model)?;
        if asset.owner != *owner {
            return Err(EngineError::AssetNotFound(asset_id.to_string()));
        }
        Ok(asset)
    }

    /// All assets of an owner, oldest first.
    pub async fn assets_for_owner(&self, owner: &OwnerRef) -> ResultEngine<Vec<Asset>> {
        assets_for_owner_on(self.database(), owner).await
    }

    /// Find an owner's asset by name, NFKC- and case-insensitively.
    ///
    /// The folding cannot be expressed in SQL, so the owner's assets are
    /// loaded and compared here; owners have a handful of assets at most.
    pub async fn find_asset_by_name(
        &self,
        owner: &OwnerRef,
        name: &str,
    ) -> ResultEngine<Option<Asset>> {
        let wanted = normalize_name(name);
        let assets = self.assets_for_owner(owner).await?;
        Ok(assets
            .into_iter()
            .find(|a| normalize_name(&a.name) == wanted))
    }

    /// First asset of an owner held in `currency`, if any.
    pub async fn find_asset_by_currency(
        &self,
        owner: &OwnerRef,
        currency: Currency,
    ) -> ResultEngine<Option<Asset>> {
        let assets = self.assets_for_owner(owner).await?;
        Ok(assets.into_iter().find(|a| a.currency == currency))
    }

    /// Rename an asset.
    ///
    /// The new name obeys the same per-owner NFKC uniqueness as
    /// [`Engine::new_asset`]. Renaming an asset to a folding of its own name
    /// is allowed.
    pub async fn rename_asset(
        &self,
        asset_id: Uuid,
        owner: &OwnerRef,
        name: &str,
    ) -> ResultEngine<Asset> {
        let name = normalize_required_name(name, "asset")?;
        let mut asset = self.asset(asset_id, owner).await?;

        let wanted = normalize_name(&name);
        let existing = self.assets_for_owner(owner).await?;
        if existing
            .iter()
            .any(|a| a.id != asset_id && normalize_name(&a.name) == wanted)
        {
            return Err(EngineError::ExistingKey(name));
        }

        assets::ActiveModel {
            id: ActiveValue::Set(asset_id.to_string()),
            name: ActiveValue::Set(name.clone()),
            ..Default::default()
        }
        .update(self.database())
        .await?;

        asset.name = name;
        Ok(asset)
    }

    /// Manually correct an asset's balance.
    ///
    /// This is the one path that intentionally breaks the ledger invariant:
    /// the human asserts the real-world balance and the ledger takes it at
    /// face value.
    pub async fn set_asset_balance(
        &self,
        asset_id: Uuid,
        owner: &OwnerRef,
        balance_minor: i64,
    ) -> ResultEngine<Asset> {
        if balance_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "balance must be >= 0".to_string(),
            ));
        }
        let mut asset = self.asset(asset_id, owner).await?;

        assets::ActiveModel {
            id: ActiveValue::Set(asset_id.to_string()),
            balance_minor: ActiveValue::Set(balance_minor),
            ..Default::default()
        }
        .update(self.database())
        .await?;

        asset.balance_minor = balance_minor;
        Ok(asset)
    }

    /// Delete an asset together with every transaction referencing it.
    pub async fn delete_asset(&self, asset_id: Uuid, owner: &OwnerRef) -> ResultEngine<()> {
        self.asset(asset_id, owner).await?;

        with_tx!(self, |db_tx| {
            let result: ResultEngine<()> = async {
                transactions::Entity::delete_many()
                    .filter(transactions::Column::AssetId.eq(asset_id.to_string()))
                    .exec(&db_tx)
                    .await?;
                assets::Entity::delete_by_id(asset_id.to_string())
                    .exec(&db_tx)
                    .await?;
                Ok(())
            }
            .await;
            result
        })
    }

    /// Total balance per currency across an owner's assets.
    pub async fn balance_totals(&self, owner: &OwnerRef) -> ResultEngine<Vec<(Currency, i64)>> {
        let assets = self.assets_for_owner(owner).await?;
        let mut totals: Vec<(Currency, i64)> = Vec::new();
        for asset in assets {
            match totals.iter_mut().find(|(c, _)| *c == asset.currency) {
                Some((_, sum)) => *sum += asset.balance_minor,
                None => totals.push((asset.currency, asset.balance_minor)),
            }
        }
        Ok(totals)
    }
}

async fn assets_for_owner_on<C: ConnectionTrait>(
    conn: &C,
    owner: &OwnerRef,
) -> ResultEngine<Vec<Asset>> {
    let models = assets::Entity::find()
        .filter(assets::Column::OwnerKind.eq(owner.kind()))
        .filter(assets::Column::OwnerId.eq(owner.id()))
        .order_by_asc(assets::Column::CreatedAt)
        .all(conn)
        .await?;
    models.into_iter().map(Asset::try_from).collect()
}

pub(super) async fn require_asset<C: ConnectionTrait>(
    conn: &C,
    asset_id: Uuid,
) -> ResultEngine<assets::Model> {
    assets::Entity::find_by_id(asset_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::AssetNotFound(asset_id.to_string()))
}
