use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use gateway_registration::client::DEFAULT_ADMIN_URL;
use gateway_registration::MicroserviceConfig;
use serde::{Deserialize, Serialize};

pub static GATEWAY_URL_ENV: &str = "API_GATEWAY_URL";
pub static SERVICE_CONFIG_FILE_ENV: &str = "SERVICE_CONFIG_FILE";
pub static DEFAULT_SERVICE_CONFIG_FILE: &str =
    "/run/secrets/microservice_registration_config.json";

/// Where the gateway admin API lives and where the service config is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub admin_url: String,
    pub config_file: PathBuf,
}

impl GatewaySettings {
    pub fn from_env() -> Self {
        Self::from_values(
            env::var(GATEWAY_URL_ENV).ok(),
            env::var(SERVICE_CONFIG_FILE_ENV).ok(),
        )
    }

    pub fn from_values(admin_url: Option<String>, config_file: Option<String>) -> Self {
        let admin_url = admin_url
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_URL.to_owned());
        let config_file = config_file
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_CONFIG_FILE.to_owned());
        Self {
            admin_url,
            config_file: PathBuf::from(config_file),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Gateway self registration settings.
    pub microservice: MicroserviceConfig,
    /// Admin URL of the gateway, wins over `API_GATEWAY_URL` when set.
    pub gateway_admin_url: String,
    /// PEM file of the RSA key that signs tokens for downstream calls.
    pub system_key: String,
    /// Service name to base URL, e.g. `"user-microservice": "http://kong:8000/users"`.
    pub services: HashMap<String, String>,
    #[serde(rename = "verificationURL")]
    pub verification_url: String,
}

impl ServiceConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("can't read service config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("can't parse service config {}", path.display()))?;
        Ok(config)
    }

    pub fn admin_url<'a>(&'a self, settings: &'a GatewaySettings) -> &'a str {
        if self.gateway_admin_url.is_empty() {
            &settings.admin_url
        } else {
            &self.gateway_admin_url
        }
    }
}
