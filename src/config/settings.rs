//! Gateway configuration: environment variables plus constructor-supplied
//! overrides, per spec §6.
//!
//! Precedence is `option > env var > default` for every setting that has
//! both a constructor option and an environment variable (see the REDESIGN
//! note on `registryUrl` in spec §9: the source sometimes built the
//! registry URL from `String(opts.registryUrl)` unconditionally, producing
//! `"undefined"` when the option was unset; [`GatewaySettings::load`] below
//! honors the documented precedence instead).

use crate::services::load_balancer::LoadBalancerStrategy;
use crate::services::liveness::HealthCheckFailStrategy;
use crate::services::retry::RetryConfig;
use std::env;
use std::time::Duration;

const DEFAULT_REGISTRY_URL: &str = "http://localhost:3002";
const DEFAULT_PORT: u16 = 3001;

/// Constructor-supplied overrides, matching spec §6's "Configuration
/// options recognized by the gateway constructor". Every field is
/// optional; anything left `None` falls back to the matching environment
/// variable, then to a hardcoded default.
#[derive(Debug, Clone, Default)]
pub struct GatewaySettingsOptions {
    pub registry_url: Option<String>,
    pub port: Option<u16>,
    pub load_balancer_strategy: Option<LoadBalancerStrategy>,
    pub request_timeout_ms: Option<u64>,
    pub total_request_timeout_ms: Option<u64>,
    pub health_checks: Option<bool>,
    pub health_check_interval_ms: Option<u64>,
    pub health_check_fail_strategy: Option<HealthCheckFailStrategy>,
    pub retry: Option<RetryConfig>,
}

/// Fully resolved gateway configuration, ready to build the service layer
/// from.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub registry_url: String,
    pub port: u16,
    pub registration_key: Option<String>,
    pub load_balancer_strategy: LoadBalancerStrategy,
    pub request_timeout: Duration,
    pub total_request_timeout: Duration,
    pub health_checks: bool,
    pub health_check_interval: Duration,
    pub health_check_fail_strategy: HealthCheckFailStrategy,
    pub retry: RetryConfig,
    pub log_level: String,
    /// Consumed by the external CORS middleware this gateway does not
    /// itself implement (spec §1 Out of scope); carried through so it can
    /// be handed to that middleware at the call site.
    pub domain: Option<String>,
}

impl GatewaySettings {
    /// Resolves settings from `options`, then `SERVICE_REGISTRATION_KEY` /
    /// `REGISTRY_URL` / `PORT` / `LOG_LEVEL` / `DOMAIN`, then the hardcoded
    /// defaults in spec §6.
    pub fn load(options: GatewaySettingsOptions) -> Self {
        let registry_url = options
            .registry_url
            .or_else(|| env::var("REGISTRY_URL").ok())
            .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());

        let port = options
            .port
            .or_else(|| env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(DEFAULT_PORT);

        let registration_key = env::var("SERVICE_REGISTRATION_KEY").ok();

        Self {
            registry_url,
            port,
            registration_key,
            load_balancer_strategy: options.load_balancer_strategy.unwrap_or_default(),
            request_timeout: Duration::from_millis(options.request_timeout_ms.unwrap_or(5000)),
            total_request_timeout: Duration::from_millis(options.total_request_timeout_ms.unwrap_or(10_000)),
            health_checks: options.health_checks.unwrap_or(true),
            health_check_interval: Duration::from_millis(options.health_check_interval_ms.unwrap_or(10_000)),
            health_check_fail_strategy: options.health_check_fail_strategy.unwrap_or_default(),
            retry: options.retry.unwrap_or_default(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            domain: env::var("DOMAIN").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn falls_back_to_hardcoded_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("REGISTRY_URL");
        env::remove_var("PORT");
        let settings = GatewaySettings::load(GatewaySettingsOptions::default());
        assert_eq!(settings.registry_url, DEFAULT_REGISTRY_URL);
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.request_timeout, Duration::from_millis(5000));
        assert_eq!(settings.total_request_timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn env_var_overrides_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("REGISTRY_URL", "http://registry.internal:9000");
        let settings = GatewaySettings::load(GatewaySettingsOptions::default());
        assert_eq!(settings.registry_url, "http://registry.internal:9000");
        env::remove_var("REGISTRY_URL");
    }

    #[test]
    fn constructor_option_overrides_env_var() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("REGISTRY_URL", "http://env-wins-if-unset:9000");
        let settings = GatewaySettings::load(GatewaySettingsOptions {
            registry_url: Some("http://option-wins:9000".to_string()),
            ..Default::default()
        });
        assert_eq!(settings.registry_url, "http://option-wins:9000");
        env::remove_var("REGISTRY_URL");
    }
}
