// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the catalog backend
    pub api_base_url: String,

    /// Static access token sent with every backend request
    pub api_token: Option<String>,

    /// Header the access token is sent in
    pub token_header: String,

    /// Profile document holding the liked NFT ids
    pub profile_id: String,

    /// Order document holding the cart NFT ids
    pub order_id: String,

    /// Backend request timeout in seconds
    pub request_timeout_secs: u64,

    /// Local API bind address (e.g., "127.0.0.1:8080")
    pub local_api_bind: SocketAddr,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
}

impl Config {
    /// Load configuration from TOML file with environment variable overrides
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("FAKENFT_CONFIG")
            .unwrap_or_else(|_| "config.toml".to_string());

        let mut config: Config = if std::path::Path::new(&config_path).exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            toml::from_str(&contents)?
        } else {
            Config::default()
        };

        if let Ok(val) = std::env::var("FAKENFT_API_BASE_URL") {
            config.api_base_url = val;
        }
        if let Ok(val) = std::env::var("FAKENFT_API_TOKEN") {
            config.api_token = Some(val);
        }
        if let Ok(val) = std::env::var("FAKENFT_TOKEN_HEADER") {
            config.token_header = val;
        }
        if let Ok(val) = std::env::var("FAKENFT_PROFILE_ID") {
            config.profile_id = val;
        }
        if let Ok(val) = std::env::var("FAKENFT_ORDER_ID") {
            config.order_id = val;
        }
        if let Ok(val) = std::env::var("FAKENFT_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = val.parse()?;
        }
        if let Ok(val) = std::env::var("FAKENFT_LOCAL_API_BIND") {
            config.local_api_bind = SocketAddr::from_str(&val)?;
        }
        if let Ok(val) = std::env::var("FAKENFT_LOG_LEVEL") {
            config.log_level = val;
        }
        if let Ok(val) = std::env::var("FAKENFT_LOG_JSON") {
            config.log_json = val.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject base URLs the backend client could never talk to
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.base_url()?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(anyhow::anyhow!(
                    "Invalid API base URL scheme: {} (only http and https are allowed)",
                    scheme
                ));
            }
        }
        if url.host_str().is_none() {
            return Err(anyhow::anyhow!("API base URL must have a host"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than zero"));
        }
        Ok(())
    }

    /// Parsed base URL, normalized to end with a slash so relative joins keep its path
    pub fn base_url(&self) -> anyhow::Result<Url> {
        let raw = if self.api_base_url.ends_with('/') {
            self.api_base_url.clone()
        } else {
            format!("{}/", self.api_base_url)
        };
        Ok(Url::parse(&raw)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: String::from("http://localhost:3000"),
            api_token: None,
            token_header: String::from("X-Practicum-Mobile-Token"),
            profile_id: String::from("1"),
            order_id: String::from("1"),
            request_timeout_secs: 30,
            local_api_bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            log_level: String::from("info"),
            log_json: false,
        }
    }
}
