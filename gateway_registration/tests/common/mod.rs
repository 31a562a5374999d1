#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub form: HashMap<String, String>,
    pub authorization: Option<String>,
}

impl RecordedCall {
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Clone)]
struct Reply {
    status: u16,
    body: Value,
    delay: Duration,
}

#[derive(Clone, Default)]
struct MockState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    replies: Arc<Mutex<HashMap<String, Reply>>>,
}

/// In-process stand-in for the gateway admin API. Unscripted routes answer
/// 404 like the gateway does for unknown resources.
pub struct MockGateway {
    pub url: String,
    state: MockState,
}

impl MockGateway {
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
        self.reply_after(method, path, status, body, Duration::ZERO);
    }

    pub fn reply_after(&self, method: &str, path: &str, status: u16, body: Value, delay: Duration) {
        self.state.replies.lock().unwrap().insert(
            format!("{} {}", method, path),
            Reply {
                status,
                body,
                delay,
            },
        );
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn routes(&self) -> Vec<String> {
        self.calls().iter().map(RecordedCall::route).collect()
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let form: HashMap<String, String> = serde_urlencoded::from_str(&body).unwrap_or_default();
    let call = RecordedCall {
        method: method.as_str().to_owned(),
        path: uri.path().to_owned(),
        form,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    };
    let key = call.route();
    state.calls.lock().unwrap().push(call);
    let reply = state.replies.lock().unwrap().get(&key).cloned();
    match reply {
        Some(reply) => {
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            (StatusCode::from_u16(reply.status).unwrap(), Json(reply.body))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Not found"}))),
    }
}
