use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::account::TokenSource;

pub static TOKEN_ISSUER: &str = "microservice-registration";
static TOKEN_TTL_SECONDS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemClaims {
    pub iss: String,
    pub sub: String,
    pub exp: u64,
    pub nbf: u64,
    pub jti: String,
    pub scope: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    pub roles: String,
}

impl SystemClaims {
    fn system(now: u64) -> Self {
        Self {
            iss: TOKEN_ISSUER.to_owned(),
            sub: TOKEN_ISSUER.to_owned(),
            exp: now + TOKEN_TTL_SECONDS,
            nbf: 0,
            jti: uuid::Uuid::new_v4().to_string(),
            scope: "api:read".to_owned(),
            user_id: "system".to_owned(),
            username: "system".to_owned(),
            roles: "system".to_owned(),
        }
    }
}

/// Signs a fresh RS256 token with the system private key for every call.
///
/// The key file is read per token so a rotated key is picked up without a
/// restart; a missing or unreadable key fails the call, not the startup.
pub struct SystemKeyToken {
    key_file: PathBuf,
}

impl SystemKeyToken {
    pub fn new(key_file: impl Into<PathBuf>) -> Self {
        Self {
            key_file: key_file.into(),
        }
    }
}

#[async_trait]
impl TokenSource for SystemKeyToken {
    async fn bearer_token(&self) -> anyhow::Result<String> {
        let pem = tokio::fs::read(&self.key_file)
            .await
            .with_context(|| format!("can't read system key {}", self.key_file.display()))?;
        let key = EncodingKey::from_rsa_pem(&pem)
            .with_context(|| format!("{} is not an RSA private key", self.key_file.display()))?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &SystemClaims::system(now),
            &key,
        )?;
        Ok(token)
    }
}
