#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use registration_service::account::{
    EmailSender, TokenSource, VerificationEmail, USER_PROFILE_SERVICE, USER_SERVICE,
};
use registration_service::breaker::BreakerConfig;
use registration_service::{AccountRegistrar, ServiceConfig, UserPayload};
use serde_json::{json, Value};

pub const USER_ID: &str = "59804b3c0000000000000000";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub route: String,
    pub body: Value,
    pub authorization: Option<String>,
}

#[derive(Clone, Default)]
struct MockState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    replies: Arc<Mutex<HashMap<String, (u16, Value)>>>,
}

/// Stand-in for the user and user profile services. Unscripted routes answer 404.
pub struct MockServices {
    pub url: String,
    state: MockState,
}

impl MockServices {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn reply(&self, method: &str, path: &str, status: u16, body: Value) {
        self.state
            .replies
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, path), (status, body));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn service_config(&self) -> ServiceConfig {
        let mut services = HashMap::new();
        services.insert(USER_SERVICE.to_owned(), format!("{}/users", self.url));
        services.insert(
            USER_PROFILE_SERVICE.to_owned(),
            format!("{}/profiles", self.url),
        );
        ServiceConfig {
            services,
            verification_url: "http://localhost:8000/users/verify".to_owned(),
            ..Default::default()
        }
    }

    pub fn registrar(
        &self,
        sender: Arc<RecordingEmailSender>,
        breaker: BreakerConfig,
    ) -> AccountRegistrar {
        AccountRegistrar::new_with_breaker(
            &self.service_config(),
            Arc::new(StaticToken("system-token".to_owned())),
            sender,
            breaker,
        )
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let route = format!("{} {}", method.as_str(), uri.path());
    state.calls.lock().unwrap().push(RecordedCall {
        route: route.clone(),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    });
    let reply = state.replies.lock().unwrap().get(&route).cloned();
    match reply {
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), Json(body)),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Not found"}))),
    }
}

pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn bearer_token(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct RecordingEmailSender {
    pub sent: Mutex<Vec<VerificationEmail>>,
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_verification(&self, email: &VerificationEmail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub fn payload() -> UserPayload {
    UserPayload {
        fullname: "Jane Doe".to_owned(),
        email: "jane@example.org".to_owned(),
        password: Some("secret123".to_owned()),
        send_activation_mail: true,
        ..Default::default()
    }
}

pub fn created_user() -> Value {
    json!({
        "id": USER_ID,
        "fullname": "",
        "email": "jane@example.org",
        "roles": ["user"],
        "active": false
    })
}

pub fn fast_breaker(failure_threshold: u32) -> BreakerConfig {
    BreakerConfig {
        failure_threshold,
        sleep_window: Duration::from_millis(100),
    }
}
