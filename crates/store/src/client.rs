//! ClickHouse client wrapper.

use crate::config::ClickHouseConfig;
use analytics_core::Result;
use clickhouse::Client;
use tracing::info;

/// Shared ClickHouse handle; cloning is cheap.
#[derive(Clone)]
pub struct ClickHouseClient {
    inner: Client,
    config: ClickHouseConfig,
}

impl ClickHouseClient {
    /// Creates a new ClickHouse client.
    pub fn new(config: ClickHouseConfig) -> Result<Self> {
        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database)
            .with_option("max_execution_time", config.timeout_secs.to_string());

        if let Some(ref user) = config.username {
            client = client.with_user(user);
        }

        if let Some(ref pass) = config.password {
            client = client.with_password(pass);
        }

        info!(
            url = %config.url,
            database = %config.database,
            timeout_secs = config.timeout_secs,
            "Created ClickHouse client"
        );

        Ok(Self {
            inner: client,
            config,
        })
    }

    /// Returns the inner clickhouse client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Client bound to the server's `default` database, for DDL that has to
    /// run before the configured database exists.
    pub fn server(&self) -> Client {
        self.inner.clone().with_database("default")
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }
}
