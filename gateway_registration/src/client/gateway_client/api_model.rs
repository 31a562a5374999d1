use serde::{Deserialize, Serialize};

/// Named load balancing pool, keyed by the virtual host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Upstream {
    pub id: String,
    pub name: String,
    pub orderlist: Vec<u32>,
    pub slots: u32,
    pub created_at: Option<i64>,
}

/// One weighted entry of an upstream. A weight of 0 takes the address out of
/// the pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    pub id: String,
    pub target: String,
    pub weight: u32,
    pub upstream_id: String,
    // targets carry fractional millisecond timestamps
    pub created_at: Option<f64>,
}

/// Routing rule mapping public hosts and paths onto an upstream.
///
/// `uris` and `methods` are write-only: they are sent to the gateway but never
/// read back from its responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Api {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    pub name: String,
    pub hosts: Vec<String>,
    #[serde(skip)]
    pub uris: Vec<String>,
    #[serde(skip)]
    pub methods: Vec<String>,
    pub upstream_url: String,
    pub strip_uri: bool,
    pub preserve_host: bool,
    pub https_only: bool,
    pub http_if_terminated: bool,
    pub retries: u32,
    pub upstream_connect_timeout: u64,
    pub upstream_send_timeout: u64,
    pub upstream_read_timeout: u64,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            id: None,
            created_at: None,
            name: String::new(),
            hosts: Vec::new(),
            uris: Vec::new(),
            methods: Vec::new(),
            upstream_url: String::new(),
            strip_uri: false,
            preserve_host: false,
            https_only: false,
            http_if_terminated: true,
            retries: 5,
            upstream_connect_timeout: 60000,
            upstream_send_timeout: 60000,
            upstream_read_timeout: 60000,
        }
    }
}

impl Api {
    pub fn to_web_params(&self) -> ApiWebParams {
        ApiWebParams {
            name: non_empty(&self.name),
            hosts: join_list(&self.hosts),
            uris: join_list(&self.uris),
            methods: join_list(&self.methods),
            upstream_url: non_empty(&self.upstream_url),
            retries: self.retries,
            upstream_connect_timeout: self.upstream_connect_timeout,
            upstream_send_timeout: self.upstream_send_timeout,
            upstream_read_timeout: self.upstream_read_timeout,
            strip_uri: self.strip_uri,
            preserve_host: self.preserve_host,
            https_only: self.https_only,
            http_if_terminated: self.http_if_terminated,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

fn join_list(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct UpstreamWebParams {
    pub name: String,
    pub slots: u32,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct TargetWebParams {
    pub target: String,
    pub weight: u32,
}

/// Flat form body of an API create or update. Empty fields are left out so the
/// gateway keeps its defaults, the proxy behaviour fields are always sent.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ApiWebParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_url: Option<String>,
    pub retries: u32,
    pub upstream_connect_timeout: u64,
    pub upstream_send_timeout: u64,
    pub upstream_read_timeout: u64,
    pub strip_uri: bool,
    pub preserve_host: bool,
    pub https_only: bool,
    pub http_if_terminated: bool,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{Api, Target, Upstream};

    fn form(api: &Api) -> HashMap<String, String> {
        let body = serde_urlencoded::to_string(api.to_web_params()).unwrap();
        serde_urlencoded::from_str(&body).unwrap()
    }

    #[test]
    fn test_api_form_skips_empty_fields() {
        let api = Api {
            name: "user-microservice".to_owned(),
            ..Api::default()
        };
        let form = form(&api);
        assert_eq!(form.get("name").map(String::as_str), Some("user-microservice"));
        for key in ["hosts", "uris", "methods", "upstream_url", "id"] {
            assert!(!form.contains_key(key), "{} should be left out", key);
        }
        assert_eq!(form["retries"], "5");
        assert_eq!(form["upstream_connect_timeout"], "60000");
        assert_eq!(form["upstream_send_timeout"], "60000");
        assert_eq!(form["upstream_read_timeout"], "60000");
        assert_eq!(form["strip_uri"], "false");
        assert_eq!(form["preserve_host"], "false");
        assert_eq!(form["https_only"], "false");
        assert_eq!(form["http_if_terminated"], "true");
    }

    #[test]
    fn test_api_form_joins_lists() {
        let api = Api {
            hosts: vec!["localhost".to_owned(), "user.api.example.org".to_owned()],
            uris: vec!["/users".to_owned(), "/profiles".to_owned()],
            methods: vec!["GET".to_owned(), "POST".to_owned()],
            upstream_url: "http://user.api.example.org:8080".to_owned(),
            ..Api::default()
        };
        let form = form(&api);
        assert_eq!(form["hosts"], "localhost,user.api.example.org");
        assert_eq!(form["uris"], "/users,/profiles");
        assert_eq!(form["methods"], "GET,POST");
        assert_eq!(form["upstream_url"], "http://user.api.example.org:8080");
    }

    #[test]
    fn test_api_response_ignores_uris_and_methods() {
        let api: Api = serde_json::from_str(
            r#"{
                "id": "6378122c-a0a1-438d-a5c6-efabae9fb969",
                "created_at": 1488830759000,
                "name": "user-microservice",
                "hosts": ["localhost"],
                "uris": ["/other"],
                "methods": ["DELETE"],
                "upstream_url": "http://user.api.example.org:8080",
                "retries": 3
            }"#,
        )
        .unwrap();
        assert_eq!(api.id.as_deref(), Some("6378122c-a0a1-438d-a5c6-efabae9fb969"));
        assert!(api.uris.is_empty());
        assert!(api.methods.is_empty());
        assert_eq!(api.retries, 3);
    }

    #[test]
    fn test_decode_upstream_and_target() {
        let upstream: Upstream = serde_json::from_str(
            r#"{
                "id": "13611da7-703f-44f8-b790-fc1e7bf51b3e",
                "name": "user.api.example.org",
                "orderlist": [1, 2, 7, 9, 6, 4, 5, 10, 3, 8],
                "slots": 10,
                "created_at": 1485521710265
            }"#,
        )
        .unwrap();
        assert_eq!(upstream.slots, 10);
        assert_eq!(upstream.orderlist.len(), 10);

        let target: Target = serde_json::from_str(
            r#"{
                "id": "4661f55e-95c2-4011-8fd6-c5c56df1c9db",
                "target": "172.18.0.5:8080",
                "weight": 10,
                "upstream_id": "13611da7-703f-44f8-b790-fc1e7bf51b3e",
                "created_at": 1485523507446.7
            }"#,
        )
        .unwrap();
        assert_eq!(target.target, "172.18.0.5:8080");
        assert_eq!(target.weight, 10);
    }
}
