//! Ledger mutations: record, update and delete transactions while keeping the
//! owning asset's running balance in step.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    EngineError, Money, OwnerRef, ResultEngine, Transaction, TransactionKind, assets, transactions,
};

use super::{Engine, assets::require_asset, normalize_optional_text, normalize_required_name,
    with_tx};

/// Input for [`Engine::record_income`] and [`Engine::record_expense`].
#[derive(Clone, Debug)]
pub struct RecordTransaction {
    pub asset_id: Uuid,
    pub category: String,
    /// Non-negative amount in minor units of the asset's currency.
    pub amount_minor: i64,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    pub created_by: String,
}

/// Input for [`Engine::update_transaction`]. Every field is written; pass the
/// current value for anything that should stay unchanged.
#[derive(Clone, Debug)]
pub struct UpdateTransaction {
    /// Move the transaction to another asset of the same owner.
    pub asset_id: Option<Uuid>,
    pub category: String,
    pub amount_minor: i64,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
}

impl Engine {
    /// Record an income: insert the row and raise the asset balance, in one
    /// database transaction.
    pub async fn record_income(
        &self,
        owner: &OwnerRef,
        cmd: RecordTransaction,
    ) -> ResultEngine<Transaction> {
        self.record(owner, TransactionKind::Income, cmd).await
    }

    /// Record an expense.
    ///
    /// The sufficiency check re-reads the asset row inside the same write
    /// transaction that lowers the balance, so `amount == balance` succeeds
    /// and one minor unit more fails without touching anything.
    pub async fn record_expense(
        &self,
        owner: &OwnerRef,
        cmd: RecordTransaction,
    ) -> ResultEngine<Transaction> {
        self.record(owner, TransactionKind::Expense, cmd).await
    }

    async fn record(
        &self,
        owner: &OwnerRef,
        kind: TransactionKind,
        cmd: RecordTransaction,
    ) -> ResultEngine<Transaction> {
        if cmd.amount_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be >= 0".to_string(),
            ));
        }
        let category = normalize_required_name(&cmd.category, "category")?;
        let note = normalize_optional_text(cmd.note.as_deref());

        with_tx!(self, |db_tx| {
            let result: ResultEngine<Transaction> = async {
                let asset = require_asset(&db_tx, cmd.asset_id).await?;
                let asset = crate::Asset::try_from(asset)?;
                if asset.owner != *owner {
                    return Err(EngineError::AssetNotFound(cmd.asset_id.to_string()));
                }

                if kind == TransactionKind::Expense && cmd.amount_minor > asset.balance_minor {
                    return Err(EngineError::InsufficientBalance(format!(
                        "asset {} holds {} minor units, expense of {} requested",
                        asset.name, asset.balance_minor, cmd.amount_minor
                    )));
                }

                let tx = Transaction::new(
                    asset.owner.clone(),
                    asset.id,
                    kind,
                    category,
                    cmd.amount_minor,
                    asset.currency,
                    cmd.date,
                    note,
                    cmd.created_by,
                )?;
                transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

                apply_delta(&db_tx, asset.id, kind.signed_delta(cmd.amount_minor)).await?;
                Ok(tx)
            }
            .await;
            result
        })
    }

    /// Rewrite a transaction as one unit of work: the old amount's effect is
    /// reversed on the old asset and the new amount applied to the (possibly
    /// different) new asset.
    ///
    /// Sufficiency is not re-checked here; an edit is a correction of the
    /// past, and the ledger already reflected the old value.
    pub async fn update_transaction(
        &self,
        tx_id: Uuid,
        owner: &OwnerRef,
        cmd: UpdateTransaction,
    ) -> ResultEngine<Transaction> {
        if cmd.amount_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be >= 0".to_string(),
            ));
        }
        let category = normalize_required_name(&cmd.category, "category")?;
        let note = normalize_optional_text(cmd.note.as_deref());

        with_tx!(self, |db_tx| {
            let result: ResultEngine<Transaction> = async {
                let mut tx = require_transaction(&db_tx, tx_id, owner).await?;

                let new_asset_id = cmd.asset_id.unwrap_or(tx.asset_id);
                if new_asset_id != tx.asset_id {
                    let target = crate::Asset::try_from(
                        require_asset(&db_tx, new_asset_id).await?,
                    )?;
                    if target.owner != *owner {
                        return Err(EngineError::AssetNotFound(new_asset_id.to_string()));
                    }
                    if target.currency != tx.currency {
                        return Err(EngineError::CurrencyMismatch(format!(
                            "transaction is in {}, asset {} holds {}",
                            tx.currency, target.name, target.currency
                        )));
                    }
                }

                apply_delta(&db_tx, tx.asset_id, -tx.kind.signed_delta(tx.amount_minor))
                    .await?;
                apply_delta(&db_tx, new_asset_id, tx.kind.signed_delta(cmd.amount_minor))
                    .await?;

                tx.asset_id = new_asset_id;
                tx.category = category;
                tx.amount_minor = cmd.amount_minor;
                tx.date = cmd.date;
                tx.note = note;

                transactions::ActiveModel {
                    id: ActiveValue::Set(tx_id.to_string()),
                    asset_id: ActiveValue::Set(tx.asset_id.to_string()),
                    category: ActiveValue::Set(tx.category.clone()),
                    amount_minor: ActiveValue::Set(tx.amount_minor),
                    date: ActiveValue::Set(tx.date),
                    note: ActiveValue::Set(tx.note.clone()),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;

                Ok(tx)
            }
            .await;
            result
        })
    }

    /// Delete a transaction, reversing its effect on the asset balance first.
    pub async fn delete_transaction(&self, tx_id: Uuid, owner: &OwnerRef) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result: ResultEngine<()> = async {
                let tx = require_transaction(&db_tx, tx_id, owner).await?;

                apply_delta(&db_tx, tx.asset_id, -tx.kind.signed_delta(tx.amount_minor))
                    .await?;
                transactions::Entity::delete_by_id(tx_id.to_string())
                    .exec(&db_tx)
                    .await?;
                Ok(())
            }
            .await;
            result
        })
    }

    /// Return a transaction owned by `owner`.
    pub async fn transaction(&self, tx_id: Uuid, owner: &OwnerRef) -> ResultEngine<Transaction> {
        require_transaction(self.database(), tx_id, owner).await
    }

    /// An owner's transactions, newest first, optionally bounded.
    pub async fn list_transactions(
        &self,
        owner: &OwnerRef,
        since: Option<DateTime<Utc>>,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<Transaction>> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::OwnerKind.eq(owner.kind()))
            .filter(transactions::Column::OwnerId.eq(owner.id()))
            .order_by_desc(transactions::Column::Date);
        if let Some(since) = since {
            query = query.filter(transactions::Column::Date.gte(since));
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let models = query.all(self.database()).await?;
        models.into_iter().map(Transaction::try_from).collect()
    }

    /// Sum of the signed deltas of every transaction referencing an asset.
    ///
    /// The stored balance of an asset that never had a manual correction is
    /// its opening balance plus this sum.
    pub async fn recompute_balance(&self, asset_id: Uuid) -> ResultEngine<i64> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::AssetId.eq(asset_id.to_string()))
            .all(self.database())
            .await?;
        let mut sum = 0i64;
        for model in models {
            let tx = Transaction::try_from(model)?;
            sum += tx.kind.signed_delta(tx.amount_minor);
        }
        Ok(sum)
    }
}

async fn require_transaction<C: ConnectionTrait>(
    conn: &C,
    tx_id: Uuid,
    owner: &OwnerRef,
) -> ResultEngine<Transaction> {
    let model = transactions::Entity::find_by_id(tx_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::TransactionNotFound(tx_id.to_string()))?;
    let tx = Transaction::try_from(model)?;
    if tx.owner != *owner {
        return Err(EngineError::TransactionNotFound(tx_id.to_string()));
    }
    Ok(tx)
}

async fn apply_delta<C: ConnectionTrait>(
    conn: &C,
    asset_id: Uuid,
    delta_minor: i64,
) -> ResultEngine<()> {
    let model = require_asset(conn, asset_id).await?;
    let balance = Money::new(model.balance_minor)
        .checked_add(Money::new(delta_minor))
        .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
    assets::ActiveModel {
        id: ActiveValue::Set(model.id),
        balance_minor: ActiveValue::Set(balance.minor()),
        ..Default::default()
    }
    .update(conn)
    .await?;
    Ok(())
}
