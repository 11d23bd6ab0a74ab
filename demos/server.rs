//! Example server: one Postgres-backed resource described by a scheme document
//! and a table document, mounted under `/api/v1/<table>`.
//!
//! Env: DATABASE_URL, SCHEME_CONFIG (default `demos/config/scheme.json`),
//! TABLE_CONFIG (default `demos/config/table.json`), LOCALE_PATH (optional).

use api_scheme::{load_catalog, load_scheme_config, load_table_config, resource_routes, PgRepository, ResourceController};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("api_scheme=info".parse()?))
        .init();

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/api_scheme".into());
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let scheme_path = std::env::var("SCHEME_CONFIG").unwrap_or_else(|_| "demos/config/scheme.json".into());
    let table_path = std::env::var("TABLE_CONFIG").unwrap_or_else(|_| "demos/config/table.json".into());
    let config = load_scheme_config(&scheme_path)?;
    let table = load_table_config(&table_path)?;

    let actions = config.actions.clone();
    let require_user = config.require_user;
    let mut builder = config.into_builder()?;
    if let Ok(locale_path) = std::env::var("LOCALE_PATH") {
        builder = builder.translator(load_catalog(&locale_path)?);
    }
    let scheme = Arc::new(builder.build()?);

    let path = format!("/api/v1/{}", table.name);
    let repository = Arc::new(PgRepository::new(pool, table)?);
    let mut controller = ResourceController::new(scheme, repository).compose(&actions);
    if require_user {
        controller = controller.require_user();
    }

    let app = Router::new().nest(&path, resource_routes(controller));

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {} (resource at {})", listener.local_addr()?, path);
    axum::serve(listener, app).await?;
    Ok(())
}
