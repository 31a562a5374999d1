pub mod account;
pub mod breaker;
pub mod config;
pub mod server;
pub mod token;

pub use account::{AccountError, AccountRegistrar, User, UserPayload};
pub use config::{GatewaySettings, ServiceConfig};
pub use token::SystemKeyToken;
