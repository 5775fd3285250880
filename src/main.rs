//! Relay Gateway server
//!
//! HTTP reverse-proxy API gateway built with Rust and Actix Web. This
//! binary wires together configuration, the registry client, the liveness
//! FSM, and the per-request proxy pipeline, then serves inbound traffic
//! until a termination signal arrives.

use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use relay_gateway::config::settings::{GatewaySettings, GatewaySettingsOptions};
use relay_gateway::config::validation::ConfigValidator;
use relay_gateway::logs::logger::configure_logger;
use relay_gateway::models::credential::Credential;
use relay_gateway::models::status::GatewayStatus;
use relay_gateway::routes::dispatch;
use relay_gateway::routes::health;
use relay_gateway::services::liveness::{LivenessConfig, LivenessController};
use relay_gateway::services::load_balancer;
use relay_gateway::services::proxy::{ProxyEngine, TimeoutConfig};
use relay_gateway::services::registry_client::RegistryClient;
use relay_gateway::services::retry::RetryPolicy;
use std::sync::{Arc, RwLock};
use tokio::signal;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    configure_logger();

    let settings = GatewaySettings::load(GatewaySettingsOptions::default());
    info!("starting relay-gateway on port {}", settings.port);

    let validation_result = ConfigValidator::validate_comprehensive(&settings);
    for warning in &validation_result.warnings {
        log::warn!("{warning}");
    }
    if !validation_result.is_valid {
        for error in &validation_result.errors {
            error!("configuration error: {error}");
        }
        std::process::exit(1);
    }

    let status = Arc::new(RwLock::new(GatewayStatus::Starting));
    let credential: Arc<RwLock<Option<Credential>>> = Arc::new(RwLock::new(None));

    let registry = RegistryClient::new(
        settings.registry_url.clone(),
        settings.request_timeout,
        settings.registration_key.clone(),
    );
    let retry_policy = RetryPolicy::new(settings.retry.clone());

    let liveness = LivenessController::new(
        registry.clone(),
        retry_policy.clone(),
        LivenessConfig {
            health_checks_enabled: settings.health_checks,
            health_check_interval: settings.health_check_interval,
            health_check_fail_strategy: settings.health_check_fail_strategy,
            max_probe_retries: 3,
            max_reregister_retries: settings.retry.max_retries,
        },
        settings.port,
        status.clone(),
        credential.clone(),
    );
    let liveness_shutdown = liveness.shutdown_handle();

    let liveness_task = tokio::spawn(async move {
        if let Err(error) = liveness.run().await {
            error!("fatal: gateway registration failed: {error}");
            std::process::exit(1);
        }
    });

    let proxy_engine = Arc::new(ProxyEngine::new(
        registry,
        load_balancer::build(settings.load_balancer_strategy),
        retry_policy,
        TimeoutConfig {
            request_timeout: settings.request_timeout,
            total_request_timeout: settings.total_request_timeout,
        },
        status,
        credential,
    ));

    let bind_port = settings.port;
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new(r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#))
            .configure(health::configure_health)
            .configure({
                let engine = proxy_engine.clone();
                move |cfg: &mut web::ServiceConfig| dispatch::configure(cfg, engine.clone())
            })
    })
    .bind(("0.0.0.0", bind_port))?
    .run();

    info!("server started successfully");

    tokio::select! {
        result = server => {
            match result {
                Ok(_) => info!("server stopped gracefully"),
                Err(e) => error!("server error: {e}"),
            }
        }
        _ = signal::ctrl_c() => {
            info!("received SIGINT, shutting down");
        }
        _ = terminate_signal() => {
            info!("received SIGTERM, shutting down");
        }
    }

    liveness_shutdown.notify_waiters();
    liveness_task.abort();

    Ok(())
}

#[cfg(unix)]
async fn terminate_signal() {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to install SIGTERM handler");
    sigterm.recv().await;
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await;
}
