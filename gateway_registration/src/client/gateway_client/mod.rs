use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{RegistrationError, Result};

mod api;
mod api_model;
mod register;
mod request_client;
mod target;
mod upstream;

pub use api::{ApiClient, ApiOutcome};
pub use api_model::{Api, ApiWebParams, Target, TargetWebParams, Upstream, UpstreamWebParams};
pub use register::{GatewayRegister, Registration, RegistrationState};
pub use request_client::InnerGatewayRequestClient;
pub use target::TargetClient;
pub use upstream::{UpstreamClient, UpstreamOutcome};

pub(crate) static REQUEST_TIMEOUT_MILLIS: u64 = 3000u64;

/// Describes the microservice this process runs. Read once at startup and
/// never changed afterwards.
///
/// ```json
/// {
///     "name": "user-microservice",
///     "port": 8080,
///     "virtual_host": "user.api.example.org",
///     "paths": ["/users"],
///     "hosts": ["localhost", "user.api.example.org"],
///     "weight": 10,
///     "slots": 100
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroserviceConfig {
    /// Name of the gateway API for this microservice.
    pub name: String,
    /// Local port the microservice listens on.
    pub port: u16,
    /// Shared by every instance of the microservice, names the upstream.
    pub virtual_host: String,
    pub paths: Vec<String>,
    /// Accepted values of the `Host` header.
    pub hosts: Vec<String>,
    /// Load balancing weight of this instance.
    pub weight: u32,
    /// Ring size requested when the upstream is created.
    #[serde(rename = "slots")]
    pub max_slots: u32,
}

impl MicroserviceConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| RegistrationError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| RegistrationError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn upstream_url(&self) -> String {
        format!("http://{}:{}", self.virtual_host, self.port)
    }

    /// The gateway API this microservice should be routed by.
    pub fn desired_api(&self) -> Api {
        Api {
            name: self.name.clone(),
            hosts: self.hosts.clone(),
            uris: self.paths.clone(),
            upstream_url: self.upstream_url(),
            ..Api::default()
        }
    }
}
