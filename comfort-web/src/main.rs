use comfort_core::observability::logging::init_tracing;
use comfort_web::config::get_configuration;
use comfort_web::services::Database;
use comfort_web::startup::build_router;
use comfort_web::AppState;
use dotenvy::dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("info");

    comfort_web::services::metrics::init_metrics();

    let db = Database::new(
        &configuration.database.url,
        configuration.database.max_connections,
        configuration.database.min_connections,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to set up database: {}", e))?;

    db.run_migrations()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    let app = build_router(AppState::new(db), &configuration.session);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting comfort-web on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
