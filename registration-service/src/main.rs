use std::net::Ipv4Addr;
use std::sync::Arc;

use anyhow::Context;
use gateway_registration::{ClientBuilder, Registration};
use registration_service::account::LogEmailSender;
use registration_service::{
    server, AccountRegistrar, GatewaySettings, ServiceConfig, SystemKeyToken,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = GatewaySettings::from_env();
    let config = ServiceConfig::load(&settings.config_file)?;
    let registrar = AccountRegistrar::new(
        &config,
        Arc::new(SystemKeyToken::new(config.system_key.clone())),
        Arc::new(LogEmailSender),
    );

    let port = config.microservice.port;
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .with_context(|| format!("can't listen on port {}", port))?;

    let mut registration = ClientBuilder::new()
        .set_admin_url(config.admin_url(&settings))
        .set_config(config.microservice.clone())
        .build()?;

    // the service can't be reached without its route, so startup stops here
    if let Err(e) = registration.self_register().await {
        log::error!("gateway self registration failed:{}", e);
        return Err(e.into());
    }
    log::info!(
        "{} registered, serving on {}",
        config.microservice.name,
        listener.local_addr()?
    );

    let served = axum::serve(listener, server::router(Arc::new(registrar)))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = registration.unregister().await {
        log::error!(
            "unregister failed, gateway keeps a live target for this instance:{}",
            e
        );
    }
    served.context("server stopped with error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("can't listen for shutdown signal:{}", e);
        std::future::pending::<()>().await;
    }
    log::info!("shutdown signal received");
}
