use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use engine::Engine;
use whatsapp_bot::Bot;

use crate::{assets, exports, transactions, webhook};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub bot: Option<Arc<Bot>>,
    /// Shared secret the WAHA webhook must echo, when configured.
    pub webhook_secret: Option<String>,
}

/// Frontend requests carry the acting user in `x-user-id`; the middleware
/// verifies the user exists and stashes it for the handlers.
async fn auth(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = request
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user = state
        .engine
        .user(user_id)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let api = Router::new()
        .route("/assets", get(assets::list).post(assets::create))
        .route("/assets/{id}/primary", axum::routing::put(assets::set_primary))
        .route("/transactions", get(transactions::list))
        .route("/income", post(transactions::income_new))
        .route("/expense", post(transactions::expense_new))
        .route(
            "/transactions/{id}",
            axum::routing::patch(transactions::update).delete(transactions::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/webhooks/whatsapp", post(webhook::receive))
        .route("/exports/{token}", get(exports::download))
        .merge(api)
        .with_state(state)
}

pub async fn run(engine: Arc<Engine>, bot: Option<Arc<Bot>>, webhook_secret: Option<String>) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, bot, webhook_secret, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Arc<Engine>,
    bot: Option<Arc<Bot>>,
    webhook_secret: Option<String>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine,
        bot,
        webhook_secret,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Arc<Engine>,
    bot: Option<Arc<Bot>>,
    webhook_secret: Option<String>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, bot, webhook_secret, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
