use serde::{Deserialize, Serialize};

use crate::logic::context::SiteInfo;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub autosku: AutoSkuConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub connection_string: Option<String>,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoSkuConfig {
    /// Saves retried after a generated SKU was claimed by a concurrent save.
    pub max_conflict_retries: u32,
    pub site_name: String,
    pub site_url: String,
    pub load_seed_data: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            max_connections: Some(20),
        }
    }
}

impl Default for AutoSkuConfig {
    fn default() -> Self {
        let site = SiteInfo::default();
        Self {
            max_conflict_retries: 5,
            site_name: site.name,
            site_url: site.url,
            load_seed_data: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("config").required(false));

        // Nested keys use a double underscore, e.g. AUTOSKU_AUTOSKU__MAX_CONFLICT_RETRIES=3
        config = config.add_source(
            config::Environment::with_prefix("AUTOSKU")
                .separator("__")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Database URL from config or `DATABASE_URL`; `None` selects the in-memory store.
    pub fn database_url(&self) -> Option<String> {
        if let Some(connection_string) = &self.database.connection_string {
            return Some(connection_string.clone());
        }

        std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())
    }

    pub fn max_connections(&self) -> u32 {
        self.database.max_connections.unwrap_or(20)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn site(&self) -> SiteInfo {
        SiteInfo {
            name: self.autosku.site_name.clone(),
            url: self.autosku.site_url.clone(),
        }
    }
}
