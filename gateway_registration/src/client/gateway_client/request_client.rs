use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::REQUEST_TIMEOUT_MILLIS;
use crate::client::utils::{ResponseWrap, Utils};
use crate::client::{AdminEndpoint, RegistrationError, Result};

/// HTTP plumbing shared by the upstream, API and target clients: form encoded
/// requests, JSON responses.
#[derive(Clone)]
pub struct InnerGatewayRequestClient {
    pub(crate) client: reqwest::Client,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) endpoint: Arc<AdminEndpoint>,
    pub(crate) timeout_millis: u64,
}

impl InnerGatewayRequestClient {
    pub fn new(endpoint: Arc<AdminEndpoint>) -> Self {
        Self::new_with_client(reqwest::Client::new(), endpoint)
    }

    pub fn new_with_client(client: reqwest::Client, endpoint: Arc<AdminEndpoint>) -> Self {
        let mut headers = HashMap::new();
        headers.insert(
            "Content-Type".to_owned(),
            "application/x-www-form-urlencoded".to_owned(),
        );
        Self {
            client,
            headers,
            endpoint,
            timeout_millis: REQUEST_TIMEOUT_MILLIS,
        }
    }

    pub fn set_timeout_millis(&mut self, timeout_millis: u64) {
        self.timeout_millis = timeout_millis;
    }

    pub fn set_bearer_token(&mut self, token: &str) {
        self.headers
            .insert("Authorization".to_owned(), format!("Bearer {}", token));
    }

    async fn send(&self, method: &'static str, url: &str, body: Vec<u8>) -> Result<ResponseWrap> {
        log::debug!("gateway request:{} {}", method, url);
        let resp = Utils::request(
            &self.client,
            method,
            url,
            body,
            Some(&self.headers),
            Some(self.timeout_millis),
        )
        .await?;
        log::debug!("gateway response:{} {} -> {}", method, url, resp.status);
        Ok(resp)
    }

    /// GET a single resource. A 404 is reported as `None`.
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.endpoint.url(path);
        let resp = self.send("GET", &url, vec![]).await?;
        if resp.status_is(404) {
            return Ok(None);
        }
        if !resp.status_is_2xx() {
            return Err(rejected("GET", url, &resp));
        }
        decode(&url, &resp).map(Some)
    }

    /// Sends `params` as a form and decodes the answer when `accept` approves
    /// its status.
    pub(crate) async fn write_form<P, T>(
        &self,
        method: &'static str,
        path: &str,
        params: &P,
        accept: fn(&ResponseWrap) -> bool,
    ) -> Result<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let url = self.endpoint.url(path);
        let body = serde_urlencoded::to_string(params)?;
        let resp = self.send(method, &url, body.into_bytes()).await?;
        if !accept(&resp) {
            return Err(rejected(method, url, &resp));
        }
        decode(&url, &resp)
    }
}

fn rejected(method: &'static str, url: String, resp: &ResponseWrap) -> RegistrationError {
    let body = resp.get_lossy_string_body().into_owned();
    log::error!("gateway rejected {} {}:{} {}", method, url, resp.status, body);
    RegistrationError::RemoteRejected {
        method,
        url,
        status: resp.status,
        body,
    }
}

fn decode<T: DeserializeOwned>(url: &str, resp: &ResponseWrap) -> Result<T> {
    serde_json::from_slice(&resp.body).map_err(|source| {
        log::error!(
            "decode gateway response error:\n\turl:{}\n\t{}",
            url,
            resp.get_lossy_string_body()
        );
        RegistrationError::Decode {
            url: url.to_owned(),
            source,
        }
    })
}
