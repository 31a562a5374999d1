use std::net::IpAddr;
use std::path::Path;
use std::{env, sync::Arc};

use super::gateway_client::{GatewayRegister, InnerGatewayRequestClient, MicroserviceConfig};
use super::identity::{FixedIpResolver, InterfaceIpResolver, ServiceIpResolver};
use super::{AdminEndpoint, RegistrationError, Result};

pub static CLIENT_IP_ENV: &str = "GATEWAY_CLIENT_IP";

#[derive(Clone)]
pub struct ClientBuilder {
    endpoint: AdminEndpoint,
    config: Option<MicroserviceConfig>,
    timeout_millis: Option<u64>,
    ip_resolver: Option<Arc<dyn ServiceIpResolver>>,
    http_client: Option<reqwest::Client>,
    admin_token: Option<String>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Starts from the default admin URL. When `GATEWAY_CLIENT_IP` holds an
    /// address it is registered instead of scanning the interfaces.
    pub fn new() -> Self {
        let ip_resolver = match env::var(CLIENT_IP_ENV) {
            Ok(v) => match v.parse::<IpAddr>() {
                Ok(ip) => Some(Arc::new(FixedIpResolver(ip)) as Arc<dyn ServiceIpResolver>),
                Err(_) => {
                    log::warn!("ignore {}, not an ip address:{}", CLIENT_IP_ENV, v);
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            endpoint: AdminEndpoint::default(),
            config: None,
            timeout_millis: None,
            ip_resolver,
            http_client: None,
            admin_token: None,
        }
    }

    pub fn set_admin_url(mut self, admin_url: &str) -> Self {
        self.endpoint = AdminEndpoint::new(admin_url);
        self
    }

    pub fn set_config(mut self, config: MicroserviceConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn set_config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let config = MicroserviceConfig::from_file(path)?;
        Ok(self.set_config(config))
    }

    /// Timeout of each outbound call.
    pub fn set_timeout_millis(mut self, timeout_millis: u64) -> Self {
        self.timeout_millis = Some(timeout_millis);
        self
    }

    pub fn set_client_ip(mut self, client_ip: IpAddr) -> Self {
        self.ip_resolver = Some(Arc::new(FixedIpResolver(client_ip)));
        self
    }

    pub fn set_ip_resolver(mut self, ip_resolver: Arc<dyn ServiceIpResolver>) -> Self {
        self.ip_resolver = Some(ip_resolver);
        self
    }

    pub fn set_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Bearer token for admin APIs that sit behind authentication.
    pub fn set_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token;
        self
    }

    pub fn build(self) -> Result<GatewayRegister> {
        let config = self.config.ok_or_else(|| {
            RegistrationError::InvalidArgument("microservice config is not set".to_owned())
        })?;
        let endpoint = Arc::new(self.endpoint);
        let mut request_client = match self.http_client {
            Some(client) => InnerGatewayRequestClient::new_with_client(client, endpoint),
            None => InnerGatewayRequestClient::new(endpoint),
        };
        if let Some(timeout_millis) = self.timeout_millis {
            request_client.set_timeout_millis(timeout_millis);
        }
        if let Some(token) = &self.admin_token {
            request_client.set_bearer_token(token);
        }
        let ip_resolver = self
            .ip_resolver
            .unwrap_or_else(|| Arc::new(InterfaceIpResolver));
        Ok(GatewayRegister::new(request_client, config, ip_resolver))
    }
}

#[cfg(test)]
mod tests {
    use super::ClientBuilder;
    use crate::client::gateway_client::{MicroserviceConfig, RegistrationState};
    use crate::RegistrationError;

    #[test]
    fn test_build_requires_config() {
        let err = ClientBuilder::new()
            .set_admin_url("http://kong:8001")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RegistrationError::InvalidArgument(_)));
    }

    #[test]
    fn test_build() {
        let config = MicroserviceConfig {
            name: "user-microservice".to_owned(),
            virtual_host: "user.api.example.org".to_owned(),
            port: 8080,
            ..Default::default()
        };
        let register = ClientBuilder::new()
            .set_admin_url("http://kong:8001/")
            .set_config(config.clone())
            .set_timeout_millis(500)
            .set_client_ip("10.0.0.7".parse().unwrap())
            .build()
            .unwrap();
        assert_eq!(register.state(), RegistrationState::Unregistered);
        assert_eq!(register.config(), &config);
    }
}
