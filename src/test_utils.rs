//! Test server builder with in-memory backends.

use crate::{Config, Server};

/// Test server builder for creating test instances with configurable
/// backends.
pub struct TestServerBuilder {
    config: Config,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.database.url = "sqlite::memory:".to_string();
        config.connectors.mock = true;
        config.metrics.enabled = false;
        config.jobs.enabled = false;
        config.logging.log_request = false;

        Self { config }
    }

    /// Override the full configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Mutate the configuration in place.
    pub fn configure(mut self, f: impl FnOnce(&mut Config)) -> Self {
        f(&mut self.config);
        self
    }

    /// Build the test server and run migrations.
    pub async fn build(self) -> Server {
        let server = Server::new(self.config).await.unwrap();
        server.database.migrate().await.unwrap();
        server
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
