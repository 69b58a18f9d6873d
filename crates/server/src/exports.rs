//! Export downloads.
//!
//! The bot sends the user a link of the form `/exports/{token}`; the token is
//! the only credential, so the route stays outside the auth layer and expired
//! tokens 404 exactly like unknown ones.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn download(
    State(state): State<ServerState>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, ServerError> {
    let export = state.engine.take_export(token).await?;

    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    ))
}
