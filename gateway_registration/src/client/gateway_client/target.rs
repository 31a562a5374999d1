use super::api_model::{Target, TargetWebParams};
use super::InnerGatewayRequestClient;
use crate::client::{path_segment, RegistrationError, Result};

/// Appends targets to an upstream. Every call adds a new history entry on the
/// gateway, targets are never updated or deleted.
#[derive(Clone)]
pub struct TargetClient {
    request_client: InnerGatewayRequestClient,
}

impl TargetClient {
    pub fn new(request_client: InnerGatewayRequestClient) -> Self {
        Self { request_client }
    }

    pub async fn add_target(
        &self,
        upstream_name: &str,
        address: &str,
        weight: u32,
    ) -> Result<Target> {
        if upstream_name.is_empty() {
            return Err(RegistrationError::InvalidArgument(
                "upstream name is empty".to_owned(),
            ));
        }
        let params = TargetWebParams {
            target: address.to_owned(),
            weight,
        };
        let path = format!("upstreams/{}/targets", path_segment(upstream_name));
        let target: Target = self
            .request_client
            .write_form("POST", &path, &params, |resp| resp.status_is(201))
            .await?;
        log::info!(
            "target {} added to upstream {} with weight {}",
            address,
            upstream_name,
            weight
        );
        Ok(target)
    }
}
