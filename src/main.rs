use dotenvy::dotenv;
use site_payroll::{
    api::{AppState, create_router},
    config::{database, seed, server},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Server settings
    let server_config = server::load_server_config()
        .inspect_err(|e| error!("Invalid server configuration: {}", e))?;

    // 4. Database and schema
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database tables ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed categories and the bootstrap admin
    let seed_config = seed::load_optional_config(&server_config.seed_config_path)?;
    let report = seed::seed_database(&db, &seed_config)
        .await
        .inspect_err(|e| error!("Failed to seed database: {}", e))?;
    info!(
        categories = report.categories_created,
        admin = ?report.admin_created,
        "Seeding finished."
    );

    // 6. Serve
    let app = create_router(AppState::new(db));
    let listener = tokio::net::TcpListener::bind(server_config.bind_addr).await?;
    info!(addr = %server_config.bind_addr, "Listening.");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received.");
}
