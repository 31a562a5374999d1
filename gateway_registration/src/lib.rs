pub mod client;

pub use client::builder::ClientBuilder;
pub use client::error::RegistrationError;
pub use client::gateway_client::{
    Api, ApiClient, ApiOutcome, GatewayRegister, MicroserviceConfig, Registration,
    RegistrationState, Target, TargetClient, Upstream, UpstreamClient, UpstreamOutcome,
};
pub use client::identity::{
    get_service_ip, FixedIpResolver, InterfaceIpResolver, NetworkInterface, ServiceIpResolver,
};
