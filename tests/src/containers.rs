//! ClickHouse for integration tests.
//!
//! Set `HITSTATS_TEST_CLICKHOUSE_URL` to run against an existing server
//! instead of starting a container.

use clickhouse_client::ClickHouseConfig;
use std::time::Duration;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

const IMAGE: &str = "clickhouse/clickhouse-server";
const TAG: &str = "24.3";
const HTTP_PORT: u16 = 8123;

/// A reachable ClickHouse server; the container (if any) stops on drop.
pub struct ClickHouseServer {
    #[allow(dead_code)]
    container: Option<ContainerAsync<GenericImage>>,
    config: ClickHouseConfig,
}

impl ClickHouseServer {
    /// Use the server named by the environment, or start a container.
    pub async fn start() -> Self {
        if let Some(url) = env("HITSTATS_TEST_CLICKHOUSE_URL") {
            let mut config = ClickHouseConfig::new(url)
                .with_database(env("HITSTATS_TEST_CLICKHOUSE_DB").unwrap_or_else(|| "hitstats_test".into()));
            config.username = env("HITSTATS_TEST_CLICKHOUSE_USER");
            config.password = env("HITSTATS_TEST_CLICKHOUSE_PASSWORD");
            return Self {
                container: None,
                config,
            };
        }

        let (container, url) = start_clickhouse().await;
        let mut config = ClickHouseConfig::new(url).with_database("hitstats_test");
        config.username = Some("default".to_string());

        Self {
            container: Some(container),
            config,
        }
    }

    /// Client config pointing at this server.
    pub fn config(&self) -> ClickHouseConfig {
        self.config.clone()
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Start a ClickHouse container, return it and its HTTP URL.
pub async fn start_clickhouse() -> (ContainerAsync<GenericImage>, String) {
    // CLICKHOUSE_DEFAULT_ACCESS_MANAGEMENT=1 lets `default` create databases
    let image = GenericImage::new(IMAGE, TAG)
        .with_wait_for(WaitFor::seconds(5))
        .with_exposed_port(HTTP_PORT.tcp())
        .with_env_var("CLICKHOUSE_DEFAULT_ACCESS_MANAGEMENT", "1")
        .with_env_var("CLICKHOUSE_USER", "default")
        .with_env_var("CLICKHOUSE_PASSWORD", "");

    let container = image.start().await.expect("Failed to start ClickHouse");

    let port = container
        .get_host_port_ipv4(HTTP_PORT)
        .await
        .expect("ClickHouse port not mapped");
    let url = format!("http://127.0.0.1:{}", port);

    wait_for_http(&url, Duration::from_secs(30)).await;

    (container, url)
}

/// Poll `/ping` until it answers.
async fn wait_for_http(url: &str, timeout: Duration) {
    let client = reqwest::Client::new();
    let ping = format!("{}/ping", url);
    let start = std::time::Instant::now();

    while start.elapsed() < timeout {
        if let Ok(resp) = client.get(&ping).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("ClickHouse at {} not ready after {:?}", url, timeout);
}
