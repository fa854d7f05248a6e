use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub graph: GraphConfig,
    pub tab: TabConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public URL Teams uses to reach this service (e.g. an ngrok tunnel).
    /// The tab configuration page points Teams at `<public_base_url>/tab`.
    pub public_base_url: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub tenant_id: Option<String>,
    /// Azure AD app (bot) registration id.
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Organizer whose online meetings are queried.
    pub user_id: Option<String>,
    pub endpoint: String,
    pub authority: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabConfig {
    pub display_name: String,
    pub entity_id: String,
    pub teams_js_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3978,
            public_base_url: "http://localhost:3978".to_string(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            client_secret: None,
            user_id: None,
            endpoint: "https://graph.microsoft.com/beta/users".to_string(),
            authority: "https://login.microsoftonline.com".to_string(),
            timeout_seconds: 30,
        }
    }
}

// Hand-written so the client secret never ends up in logs.
impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("user_id", &self.user_id)
            .field("endpoint", &self.endpoint)
            .field("authority", &self.authority)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for TabConfig {
    fn default() -> Self {
        Self {
            display_name: "Botatwork MOM".to_string(),
            entity_id: "BotMeetingTab".to_string(),
            teams_js_url: "https://res.cdn.office.net/teams-js/2.19.0/js/MicrosoftTeams.min.js"
                .to_string(),
        }
    }
}

/// Environment variables that override config file values.
pub mod env_keys {
    pub const PORT: &str = "PORT";
    pub const PORT_LOWER: &str = "port";
    pub const PUBLIC_BASE_URL: &str = "PUBLIC_BASE_URL";
    pub const APP_ID: &str = "MicrosoftAppId";
    pub const APP_PASSWORD: &str = "MicrosoftAppPassword";
    pub const TENANT_ID: &str = "MicrosoftAppTenantId";
    pub const USER_ID: &str = "UserId";
    pub const GRAPH_ENDPOINT: &str = "GraphApiEndpoint";
}

impl Config {
    /// Load the config file (creating it with defaults if missing), then
    /// apply `.env` and process environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            config
        };

        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded environment from {:?}", path),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => return Err(e).context("Failed to load .env file"),
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get(env_keys::PORT_LOWER).or_else(|| get(env_keys::PORT)) {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => debug!("Ignoring invalid port override {:?}", port),
            }
        }
        if let Some(url) = get(env_keys::PUBLIC_BASE_URL) {
            self.server.public_base_url = url;
        }
        if let Some(app_id) = get(env_keys::APP_ID) {
            self.graph.client_id = Some(app_id);
        }
        if let Some(password) = get(env_keys::APP_PASSWORD) {
            self.graph.client_secret = Some(password);
        }
        if let Some(tenant_id) = get(env_keys::TENANT_ID) {
            self.graph.tenant_id = Some(tenant_id);
        }
        if let Some(user_id) = get(env_keys::USER_ID) {
            self.graph.user_id = Some(user_id);
        }
        if let Some(endpoint) = get(env_keys::GRAPH_ENDPOINT) {
            self.graph.endpoint = endpoint;
        }
    }

    /// URL Teams loads for the tab content page.
    pub fn tab_url(&self) -> String {
        format!("{}/tab", self.server.public_base_url.trim_end_matches('/'))
    }

    pub fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
