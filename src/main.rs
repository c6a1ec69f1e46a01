use random_picker::{
    api::{create_router, AppState},
    config::Config,
    db,
    services::RandomSource,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("random_picker=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Load the table once; it is immutable for the rest of the process
    let table = db::load_from_config(&config).await;
    if table.is_empty() && config.exit_on_empty {
        tracing::error!(
            "Loaded table is empty. Please check the data source connection or table content."
        );
        std::process::exit(1);
    }

    let rng = config
        .rng_seed
        .map(RandomSource::seeded)
        .unwrap_or_default();

    let state = AppState::new(table, rng);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
