use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "kanemane={level},whatsapp_bot={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;
    let engine = Arc::new(engine::Engine::builder().database(db).build());

    let bot = match settings.whatsapp {
        Some(whatsapp) => {
            tracing::info!("Found whatsapp settings...");
            let bot = whatsapp_bot::Bot::builder()
                .engine(engine.clone())
                .waha(&whatsapp.url, &whatsapp.session, whatsapp.api_key.as_deref())
                .gemini(&whatsapp.gemini_api_key, None)
                .public_url(&settings.server.public_url)
                .frontend_url(&whatsapp.frontend_url)
                .build()?;
            Some(Arc::new(bot))
        }
        None => None,
    };

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::run_with_listener(engine, bot, settings.server.webhook_secret, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
