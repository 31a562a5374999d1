use super::api_model::Api;
use super::InnerGatewayRequestClient;
use crate::client::utils::ResponseWrap;
use crate::client::{path_segment, RegistrationError, Result};

/// Result of [`ApiClient::create_or_update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiOutcome {
    Created(Api),
    /// An API with the same name existed and was overwritten.
    Updated(Api),
}

impl ApiOutcome {
    pub fn api(&self) -> &Api {
        match self {
            Self::Created(v) | Self::Updated(v) => v,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[derive(Clone)]
pub struct ApiClient {
    request_client: InnerGatewayRequestClient,
}

impl ApiClient {
    pub fn new(request_client: InnerGatewayRequestClient) -> Self {
        Self { request_client }
    }

    pub async fn fetch(&self, name: &str) -> Result<Option<Api>> {
        if name.is_empty() {
            return Err(RegistrationError::InvalidArgument(
                "api name is empty".to_owned(),
            ));
        }
        self.request_client
            .fetch(&format!("apis/{}", path_segment(name)))
            .await
    }

    /// Creates `desired` when it has no id, otherwise overwrites every field of
    /// the API with that id.
    pub async fn upsert(&self, desired: &Api) -> Result<Api> {
        let params = desired.to_web_params();
        let mut result: Api = match &desired.id {
            None => {
                self.request_client
                    .write_form("POST", "apis/", &params, ResponseWrap::status_is_2xx)
                    .await?
            }
            Some(id) => {
                self.request_client
                    .write_form(
                        "PATCH",
                        &format!("apis/{}", path_segment(id)),
                        &params,
                        ResponseWrap::status_is_2xx,
                    )
                    .await?
            }
        };
        // never echoed back by the gateway
        result.uris = desired.uris.clone();
        result.methods = desired.methods.clone();
        Ok(result)
    }

    pub async fn create_or_update(&self, mut desired: Api) -> Result<ApiOutcome> {
        if let Some(api) = self.fetch(&desired.name).await? {
            desired.id = api.id;
        }
        let updating = desired.id.is_some();
        let api = self.upsert(&desired).await?;
        if updating {
            log::info!("api {} updated, id:{:?}", api.name, api.id);
            Ok(ApiOutcome::Updated(api))
        } else {
            log::info!("api {} created, id:{:?}", api.name, api.id);
            Ok(ApiOutcome::Created(api))
        }
    }
}
