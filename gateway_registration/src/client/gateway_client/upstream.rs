use super::api_model::{Upstream, UpstreamWebParams};
use super::InnerGatewayRequestClient;
use crate::client::{path_segment, RegistrationError, Result};

/// Result of [`UpstreamClient::ensure_exists`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamOutcome {
    /// Found on the gateway, left untouched even if its slots differ.
    Existing(Upstream),
    Created(Upstream),
}

impl UpstreamOutcome {
    pub fn upstream(&self) -> &Upstream {
        match self {
            Self::Existing(v) | Self::Created(v) => v,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[derive(Clone)]
pub struct UpstreamClient {
    request_client: InnerGatewayRequestClient,
}

impl UpstreamClient {
    pub fn new(request_client: InnerGatewayRequestClient) -> Self {
        Self { request_client }
    }

    pub async fn fetch(&self, name: &str) -> Result<Option<Upstream>> {
        if name.is_empty() {
            return Err(RegistrationError::InvalidArgument(
                "upstream name is empty".to_owned(),
            ));
        }
        self.request_client
            .fetch(&format!("upstreams/{}", path_segment(name)))
            .await
    }

    pub async fn create(&self, name: &str, slots: u32) -> Result<Upstream> {
        let params = UpstreamWebParams {
            name: name.to_owned(),
            slots,
        };
        self.request_client
            .write_form("POST", "upstreams/", &params, |resp| resp.status_is(201))
            .await
    }

    /// Creates the upstream unless one with this name is already there.
    pub async fn ensure_exists(&self, name: &str, slots: u32) -> Result<UpstreamOutcome> {
        match self.fetch(name).await? {
            Some(upstream) => {
                if upstream.slots != slots {
                    log::warn!(
                        "upstream {} has {} slots, configured {}; not resized",
                        name,
                        upstream.slots,
                        slots
                    );
                }
                Ok(UpstreamOutcome::Existing(upstream))
            }
            None => {
                let upstream = self.create(name, slots).await?;
                log::info!("upstream {} created with {} slots", name, upstream.slots);
                Ok(UpstreamOutcome::Created(upstream))
            }
        }
    }
}
