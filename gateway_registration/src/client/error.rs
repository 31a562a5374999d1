use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistrationError>;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{method} {url} rejected with status {status}: {body}")]
    RemoteRejected {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("can't decode response of {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("can't encode form: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    #[error("no non-loopback address found on any network interface")]
    NoAddressFound,

    #[error("can't list network interfaces: {0}")]
    InterfaceEnumeration(#[source] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("can't read config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("can't parse config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl RegistrationError {
    /// HTTP status of a rejected write or lookup.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// A create that lost the race against another instance.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}
