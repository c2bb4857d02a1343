//! MessMass Analytics Engine
//!
//! Serves aggregated event statistics over HTTP:
//! - hashtag, partner and date-window aggregation
//! - chart calculation from stored chart configurations
//! - benchmark distributions and composite scores
//! - rule-based insights and home/away comparisons

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState, ChartsConfig, InsightsConfig};
use stats_store::{
    health::refresh_health, schema::init_schema, ClickHouseClient, ClickHouseConfig,
    ClickHouseEventStore,
};
use telemetry::init_tracing_from_env;

/// How often the background task re-checks ClickHouse.
const HEALTH_INTERVAL: Duration = Duration::from_secs(30);

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    clickhouse: ClickHouseConfig,

    #[serde(default)]
    charts: ChartsConfig,

    #[serde(default)]
    insights: InsightsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            clickhouse: ClickHouseConfig::default(),
            charts: ChartsConfig::default(),
            insights: InsightsConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting MessMass Analytics Engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    let clickhouse = ClickHouseClient::new(config.clickhouse.clone())
        .context("Failed to create ClickHouse client")?;

    if let Err(e) = init_schema(&clickhouse).await {
        // The tables may already exist under a user without DDL rights.
        error!("Failed to initialize ClickHouse schema: {}", e);
    }

    if refresh_health(&clickhouse).await {
        info!("ClickHouse connection: healthy");
    } else {
        warn!("ClickHouse connection: unhealthy, serving anyway");
    }
    let _health_task = spawn_health_task(clickhouse.clone());

    let store = Arc::new(ClickHouseEventStore::new(clickhouse));
    let state = AppState::with_config(store, &config.charts, config.insights.clone());
    info!(
        chart_cache_ttl_secs = config.charts.cache_ttl_secs,
        insight_max_events = state.max_insight_events(),
        "Application state ready"
    );

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from defaults, `config/default.toml` and the environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // MESSMASS_PORT, MESSMASS_CLICKHOUSE__URL, MESSMASS_CHARTS__CACHE_TTL_SECS, ...
        .add_source(
            config::Environment::with_prefix("MESSMASS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Single-underscore forms used by existing deployments
    if let Ok(url) = std::env::var("MESSMASS_CLICKHOUSE_URL") {
        config.clickhouse.url = url;
    }
    if let Ok(database) = std::env::var("MESSMASS_CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("MESSMASS_CLICKHOUSE_USERNAME") {
        config.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("MESSMASS_CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }

    Ok(config)
}

/// Re-check ClickHouse periodically so readiness follows the connection.
fn spawn_health_task(client: ClickHouseClient) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEALTH_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            if !refresh_health(&client).await {
                warn!("ClickHouse health check failed");
            }
        }
    })
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
