//! Ledger routes for the web frontend.
//!
//! Income and expense get their own entry points so an expense can never be
//! smuggled in as a negative income.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use engine::{OwnerRef, RecordTransaction, Transaction, UpdateTransaction, User};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

#[derive(Deserialize)]
pub struct ListQuery {
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct RecordBody {
    pub asset_id: Uuid,
    pub category: String,
    pub amount_minor: i64,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBody {
    pub asset_id: Option<Uuid>,
    pub category: String,
    pub amount_minor: i64,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
}

pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Transaction>>, ServerError> {
    let owner = OwnerRef::User(user.id);
    let transactions = state
        .engine
        .list_transactions(&owner, query.since, query.limit)
        .await?;
    Ok(Json(transactions))
}

pub async fn income_new(
    State(state): State<ServerState>,
    Extension(user): Extension<User>,
    Json(payload): Json<RecordBody>,
) -> Result<(StatusCode, Json<Transaction>), ServerError> {
    let owner = OwnerRef::User(user.id.clone());
    let tx = state
        .engine
        .record_income(&owner, record_command(payload, user.id))
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn expense_new(
    State(state): State<ServerState>,
    Extension(user): Extension<User>,
    Json(payload): Json<RecordBody>,
) -> Result<(StatusCode, Json<Transaction>), ServerError> {
    let owner = OwnerRef::User(user.id.clone());
    let tx = state
        .engine
        .record_expense(&owner, record_command(payload, user.id))
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBody>,
) -> Result<Json<Transaction>, ServerError> {
    let owner = OwnerRef::User(user.id);
    let tx = state
        .engine
        .update_transaction(
            id,
            &owner,
            UpdateTransaction {
                asset_id: payload.asset_id,
                category: payload.category,
                amount_minor: payload.amount_minor,
                date: payload.date,
                note: payload.note,
            },
        )
        .await?;
    Ok(Json(tx))
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let owner = OwnerRef::User(user.id);
    state.engine.delete_transaction(id, &owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn record_command(payload: RecordBody, created_by: String) -> RecordTransaction {
    RecordTransaction {
        asset_id: payload.asset_id,
        category: payload.category,
        amount_minor: payload.amount_minor,
        date: payload.date,
        note: payload.note,
        created_by,
    }
}
