use std::sync::Arc;

use async_trait::async_trait;

use super::api_model::Target;
use super::{
    ApiClient, ApiOutcome, InnerGatewayRequestClient, MicroserviceConfig, TargetClient,
    UpstreamClient, UpstreamOutcome,
};
use crate::client::identity::ServiceIpResolver;
use crate::client::{target_address, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationState {
    #[default]
    Unregistered,
    Registering,
    Registered,
    Deregistering,
    Withdrawn,
}

/// Lifecycle contract between a microservice and the gateway: register once at
/// startup, withdraw once at shutdown.
#[async_trait]
pub trait Registration {
    async fn self_register(&mut self) -> Result<()>;

    async fn unregister(&mut self) -> Result<()>;
}

/// Registers this instance with the gateway.
///
/// Registration ensures the upstream named after the virtual host, then
/// creates or overwrites the API named after the microservice, then appends
/// this instance as a target. The steps run strictly in that order and
/// nothing is rolled back when a later step fails; calling
/// [`Registration::self_register`] again skips what is already in place.
///
/// Withdrawal appends the same target with weight 0 instead of deleting it.
pub struct GatewayRegister {
    config: Arc<MicroserviceConfig>,
    upstream_client: UpstreamClient,
    api_client: ApiClient,
    target_client: TargetClient,
    ip_resolver: Arc<dyn ServiceIpResolver>,
    state: RegistrationState,
}

impl GatewayRegister {
    pub fn new(
        request_client: InnerGatewayRequestClient,
        config: MicroserviceConfig,
        ip_resolver: Arc<dyn ServiceIpResolver>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            upstream_client: UpstreamClient::new(request_client.clone()),
            api_client: ApiClient::new(request_client.clone()),
            target_client: TargetClient::new(request_client),
            ip_resolver,
            state: RegistrationState::Unregistered,
        }
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    pub fn config(&self) -> &MicroserviceConfig {
        &self.config
    }

    pub fn upstream_client(&self) -> &UpstreamClient {
        &self.upstream_client
    }

    pub fn api_client(&self) -> &ApiClient {
        &self.api_client
    }

    pub fn target_client(&self) -> &TargetClient {
        &self.target_client
    }

    async fn register_steps(&self) -> Result<Target> {
        let config = &self.config;
        let upstream = self
            .upstream_client
            .ensure_exists(&config.virtual_host, config.max_slots)
            .await?;
        if let UpstreamOutcome::Existing(v) = &upstream {
            log::info!("upstream {} already exists, id:{}", v.name, v.id);
        }

        let api = self
            .api_client
            .create_or_update(config.desired_api())
            .await?;
        if let ApiOutcome::Updated(v) = &api {
            log::debug!("api {} routes {:?} to {}", v.name, v.uris, v.upstream_url);
        }

        self.add_self_as_target(config.weight).await
    }

    async fn add_self_as_target(&self, weight: u32) -> Result<Target> {
        let ip = self.ip_resolver.resolve()?;
        let address = target_address(ip, self.config.port);
        self.target_client
            .add_target(&self.config.virtual_host, &address, weight)
            .await
    }
}

#[async_trait]
impl Registration for GatewayRegister {
    async fn self_register(&mut self) -> Result<()> {
        let previous = self.state;
        self.state = RegistrationState::Registering;
        match self.register_steps().await {
            Ok(target) => {
                log::info!(
                    "{} registered on {} as {}",
                    self.config.name,
                    self.config.virtual_host,
                    target.target
                );
                self.state = RegistrationState::Registered;
                Ok(())
            }
            Err(e) => {
                log::error!("self registration of {} failed:{}", self.config.name, e);
                self.state = previous;
                Err(e)
            }
        }
    }

    async fn unregister(&mut self) -> Result<()> {
        let previous = self.state;
        self.state = RegistrationState::Deregistering;
        match self.add_self_as_target(0).await {
            Ok(target) => {
                log::info!(
                    "{} withdrawn from {}, target {}",
                    self.config.name,
                    self.config.virtual_host,
                    target.target
                );
                self.state = RegistrationState::Withdrawn;
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "unregister of {} failed, instance may still receive traffic:{}",
                    self.config.name,
                    e
                );
                self.state = previous;
                Err(e)
            }
        }
    }
}
