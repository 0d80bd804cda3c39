use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use stratus::config::Config;
use stratus::router::{StratusState, stratus_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.server.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.server.database_url,
        provider = %cfg.openweather.base_url,
        proxy = %cfg.openweather.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        cache_enabled = cfg.cache.enabled,
        loglevel = %cfg.server.loglevel,
    );

    let pool = stratus::db::connect(&cfg.server.database_url).await?;
    let state = StratusState::new(pool, &cfg)?;
    let app = stratus_router(state);

    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.server.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
    }
}
