use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use gateway_registration::client::utils::{ResponseWrap, Utils};
use lazy_static::lazy_static;
use rand::RngCore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::breaker::{BreakerConfig, Breakers};
use crate::config::ServiceConfig;

pub static USER_SERVICE: &str = "user-microservice";
pub static USER_PROFILE_SERVICE: &str = "microservice-user-profile";
pub static CREATE_USER_COMMAND: &str = "user-microservice.create_user";
pub static UPDATE_PROFILE_COMMAND: &str = "user-microservice.update_user_profile";

static VERIFICATION_TOKEN_BYTES: usize = 42;
static DOWNSTREAM_TIMEOUT_MILLIS: u64 = 10000;

lazy_static! {
    static ref FULLNAME: Regex = Regex::new(r"^[a-zA-Z0-9 ]{4,30}$").unwrap();
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ValidationErrors),

    #[error("no base url configured for service {0}")]
    MissingService(String),

    #[error("circuit of {0} is open")]
    CircuitOpen(String),

    #[error("can't obtain bearer token: {0}")]
    Token(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{service} answered {status}: {body}")]
    Downstream {
        service: String,
        status: u16,
        body: String,
    },

    #[error("can't decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("can't send verification email: {0}")]
    Mail(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[validate(regex(path = *FULLNAME))]
    pub fullname: String,
    #[validate(email)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, max = 30))]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default = "default_send_activation_mail")]
    pub send_activation_mail: bool,
    /// Email verification token, filled in by the registrar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_send_activation_mail() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub roles: Vec<String>,
    pub external_id: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
struct UserProfile<'a> {
    fullname: &'a str,
    email: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEmail {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub verification_url: String,
    pub token: String,
}

/// Supplies the bearer token attached to downstream calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn bearer_token(&self) -> anyhow::Result<String>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_verification(&self, email: &VerificationEmail) -> anyhow::Result<()>;
}

/// Logs instead of delivering, for deployments without mail.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_verification(&self, email: &VerificationEmail) -> anyhow::Result<()> {
        log::info!(
            "verification email for user {} to {} not delivered, no mail sender",
            email.user_id,
            email.email
        );
        Ok(())
    }
}

pub fn generate_token(n: usize) -> String {
    let mut rv = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut rv);
    base64::engine::general_purpose::URL_SAFE.encode(rv)
}

/// Creates a user account by calling the user service, then the user profile
/// service, then sending the verification email.
///
/// Steps run in sequence with no rollback: a profile failure leaves the user
/// created.
pub struct AccountRegistrar {
    client: reqwest::Client,
    services: HashMap<String, String>,
    verification_url: String,
    token_source: Arc<dyn TokenSource>,
    email_sender: Arc<dyn EmailSender>,
    breakers: Breakers,
    timeout_millis: u64,
}

impl AccountRegistrar {
    pub fn new(
        config: &ServiceConfig,
        token_source: Arc<dyn TokenSource>,
        email_sender: Arc<dyn EmailSender>,
    ) -> Self {
        Self::new_with_breaker(config, token_source, email_sender, BreakerConfig::default())
    }

    pub fn new_with_breaker(
        config: &ServiceConfig,
        token_source: Arc<dyn TokenSource>,
        email_sender: Arc<dyn EmailSender>,
        breaker_config: BreakerConfig,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            services: config.services.clone(),
            verification_url: config.verification_url.clone(),
            token_source,
            email_sender,
            breakers: Breakers::new(breaker_config),
            timeout_millis: DOWNSTREAM_TIMEOUT_MILLIS,
        }
    }

    pub fn set_timeout_millis(&mut self, timeout_millis: u64) {
        self.timeout_millis = timeout_millis;
    }

    pub fn breakers(&self) -> &Breakers {
        &self.breakers
    }

    fn service_url(&self, name: &str) -> Result<&str, AccountError> {
        self.services
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AccountError::MissingService(name.to_owned()))
    }

    pub async fn register(&self, mut payload: UserPayload) -> Result<User, AccountError> {
        payload.validate()?;
        let user_url = self.service_url(USER_SERVICE)?.to_owned();
        let profile_url = self
            .service_url(USER_PROFILE_SERVICE)?
            .trim_end_matches('/')
            .to_owned();

        let token = generate_token(VERIFICATION_TOKEN_BYTES);
        payload.token = Some(token.clone());

        let resp = self
            .call(CREATE_USER_COMMAND, "POST", &user_url, serde_json::to_vec(&payload)?)
            .await?;
        check_status(USER_SERVICE, &resp, &[200, 201])?;
        let mut user: User = serde_json::from_slice(&resp.body)?;
        log::info!("user {} created", user.id);

        user.fullname = payload.fullname.clone();
        let profile = UserProfile {
            fullname: &user.fullname,
            email: &user.email,
        };
        let resp = self
            .call(
                UPDATE_PROFILE_COMMAND,
                "PUT",
                &format!("{}/{}", profile_url, user.id),
                serde_json::to_vec(&profile)?,
            )
            .await?;
        check_status(USER_PROFILE_SERVICE, &resp, &[200, 204])?;

        if payload.external_id.is_none() {
            let email = VerificationEmail {
                user_id: user.id.clone(),
                name: user.fullname.clone(),
                email: user.email.clone(),
                verification_url: self.verification_url.clone(),
                token,
            };
            self.email_sender
                .send_verification(&email)
                .await
                .map_err(|e| AccountError::Mail(format!("{:#}", e)))?;
        }
        Ok(user)
    }

    async fn call(
        &self,
        command: &str,
        method: &str,
        url: &str,
        body: Vec<u8>,
    ) -> Result<ResponseWrap, AccountError> {
        if !self.breakers.allow(command) {
            return Err(AccountError::CircuitOpen(command.to_owned()));
        }
        let token = self
            .token_source
            .bearer_token()
            .await
            .map_err(|e| AccountError::Token(format!("{:#}", e)))?;
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_owned(), "application/json".to_owned());
        headers.insert("Authorization".to_owned(), format!("Bearer {}", token));

        match Utils::request(
            &self.client,
            method,
            url,
            body,
            Some(&headers),
            Some(self.timeout_millis),
        )
        .await
        {
            Ok(resp) => {
                if resp.status >= 500 {
                    self.breakers.failure(command);
                } else {
                    self.breakers.success(command);
                }
                Ok(resp)
            }
            Err(e) => {
                log::error!("{} {} failed:{}", command, url, e);
                self.breakers.failure(command);
                Err(e.into())
            }
        }
    }
}

fn check_status(
    service: &str,
    resp: &ResponseWrap,
    accepted: &[u16],
) -> Result<(), AccountError> {
    if accepted.contains(&resp.status) {
        return Ok(());
    }
    let body = resp.get_lossy_string_body().into_owned();
    if resp.status_is(400) {
        return Err(AccountError::BadRequest(body));
    }
    Err(AccountError::Downstream {
        service: service.to_owned(),
        status: resp.status,
        body,
    })
}
