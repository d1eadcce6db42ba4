use campusgate_egress::client::BROWSER_USER_AGENT;
use campusgate_egress::config::{DEFAULT_APP_BASE_URL, DEFAULT_IDENTITY_LOGIN_URL};
use campusgate_egress::{HttpClientConfig, PortalConfig};
use campusgate_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,

    #[serde(default)]
    pub portals: PortalSettings,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed browser origin; any origin when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSettings {
    #[serde(default = "default_identity_login_url")]
    pub identity_login_url: String,

    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
        }
    }
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            identity_login_url: default_identity_login_url(),
            app_base_url: default_app_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl PortalSettings {
    pub fn portal_config(&self) -> PortalConfig {
        let client_config = HttpClientConfig {
            timeout_secs: self.timeout_secs,
            connect_timeout_secs: self.connect_timeout_secs,
            user_agent: self.user_agent.clone(),
            ..HttpClientConfig::default()
        };

        PortalConfig::default()
            .with_identity_login_url(self.identity_login_url.clone())
            .with_app_base_url(self.app_base_url.clone())
            .with_client_config(client_config)
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        // Server settings
        if let Ok(val) = std::env::var("CAMPUSGATE_HOST") {
            self.server.host = val;
        }

        if let Ok(val) = std::env::var("CAMPUSGATE_PORT")
            && let Ok(port) = val.parse::<u16>()
        {
            self.server.port = port;
        }

        if let Ok(val) = std::env::var("CAMPUSGATE_CORS_ORIGIN") {
            self.server.cors_origin = Some(val).filter(|origin| !origin.is_empty());
        }

        // Logging settings
        if let Ok(val) = std::env::var("CAMPUSGATE_LOG_LEVEL") {
            self.logging.level = val;
        }

        // Session limits
        if let Ok(val) = std::env::var("CAMPUSGATE_MAX_SESSIONS")
            && let Ok(max) = val.parse::<usize>()
        {
            self.session.max_sessions = max;
        }

        if let Ok(val) = std::env::var("CAMPUSGATE_SESSION_TTL_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            self.session.ttl_secs = secs;
        }

        if let Ok(val) = std::env::var("CAMPUSGATE_SWEEP_INTERVAL_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            self.session.sweep_interval_secs = secs;
        }

        // Portal endpoints
        if let Ok(val) = std::env::var("CAMPUSGATE_IDENTITY_LOGIN_URL") {
            self.portals.identity_login_url = val;
        }

        if let Ok(val) = std::env::var("CAMPUSGATE_APP_BASE_URL") {
            self.portals.app_base_url = val;
        }

        if let Ok(val) = std::env::var("CAMPUSGATE_UPSTREAM_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            self.portals.timeout_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.session.validate()?;
        if self.portals.timeout_secs == 0 || self.portals.connect_timeout_secs == 0 {
            return Err("upstream timeouts must be at least 1 second".to_string());
        }
        self.portals
            .portal_config()
            .validate()
            .map_err(|e| e.to_string())
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_identity_login_url() -> String {
    DEFAULT_IDENTITY_LOGIN_URL.to_string()
}

fn default_app_base_url() -> String {
    DEFAULT_APP_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}
