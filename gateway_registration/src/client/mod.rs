use std::net::{IpAddr, SocketAddr};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

pub mod builder;
pub mod error;
pub mod gateway_client;
pub mod identity;
pub mod utils;

pub use self::builder::ClientBuilder;
pub use self::error::{RegistrationError, Result};
pub use self::gateway_client::GatewayRegister;

pub static DEFAULT_ADMIN_URL: &str = "http://localhost:8001";

/// Base URL of the gateway's administrative API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminEndpoint {
    base_url: String,
}

impl AdminEndpoint {
    pub fn new(base_url: &str) -> Self {
        let base_url = if base_url.is_empty() {
            DEFAULT_ADMIN_URL
        } else {
            base_url
        };
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Joins `path` onto the base URL. A trailing slash on `path` is kept,
    /// collection endpoints are addressed as `upstreams/` and `apis/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for AdminEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_URL)
    }
}

// everything outside the unreserved set
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Escapes a resource name or id for use as one segment of an admin URL path.
pub fn path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Formats the `target` value of an upstream target, `ip:port` for IPv4 and
/// `[ip]:port` for IPv6.
pub fn target_address(ip: IpAddr, port: u16) -> String {
    SocketAddr::new(ip, port).to_string()
}
