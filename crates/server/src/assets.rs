//! Asset routes for the web frontend.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Asset, AssetKind, Currency, NewAsset, OwnerRef, User};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

#[derive(Deserialize)]
pub struct CreateAsset {
    pub country: String,
    pub name: String,
    pub kind: AssetKind,
    pub currency: Currency,
    #[serde(default)]
    pub balance_minor: i64,
}

pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Asset>>, ServerError> {
    let owner = OwnerRef::User(user.id);
    let assets = state.engine.assets_for_owner(&owner).await?;
    Ok(Json(assets))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateAsset>,
) -> Result<(StatusCode, Json<Asset>), ServerError> {
    let asset = state
        .engine
        .new_asset(NewAsset {
            owner: OwnerRef::User(user.id),
            country: payload.country,
            name: payload.name,
            kind: payload.kind,
            currency: payload.currency,
            balance_minor: payload.balance_minor,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// Mark an asset as the user's primary wallet, the default target for chat
/// transactions that name no asset.
pub async fn set_primary(
    State(state): State<ServerState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let owner = OwnerRef::User(user.id.clone());
    state.engine.asset(id, &owner).await?;
    state.engine.set_primary_asset(&user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
