//! ClickHouse client wrapper.

use crate::config::ClickHouseConfig;
use clickhouse::Client;
use stats_core::Result;
use tracing::info;

/// ClickHouse client bound to the configured database.
#[derive(Clone)]
pub struct ClickHouseClient {
    inner: Client,
    config: ClickHouseConfig,
}

impl ClickHouseClient {
    /// Creates a new ClickHouse client.
    pub fn new(config: ClickHouseConfig) -> Result<Self> {
        config.validate()?;
        let client = connect(&config).with_database(&config.database);

        info!(
            url = %config.url,
            database = %config.database,
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

    /// A client on the server's default database, for statements that
    /// must run before the configured database exists.
    pub fn server(&self) -> Client {
        connect(&self.config)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }
}

fn connect(config: &ClickHouseConfig) -> Client {
    let mut client = Client::default().with_url(&config.url);

    if let Some(ref user) = config.username {
        client = client.with_user(user);
    }

    if let Some(ref pass) = config.password {
        client = client.with_password(pass);
    }

    client
}
