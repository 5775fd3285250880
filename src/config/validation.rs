//! Configuration validation with detailed error reporting.
//!
//! Grounded on the teacher's `config::validation::ValidationResult` and
//! `ConfigValidator` shape; the checks themselves are specific to this
//! gateway's settings rather than the teacher's static route table.

use crate::config::settings::GatewaySettings;
use log::{info, warn};

/// Result of configuration validation containing errors, warnings, and
/// recommendations.
///
/// # Examples
///
/// ```
/// use relay_gateway::config::validation::ValidationResult;
///
/// let mut result = ValidationResult::new();
/// result.add_error("Missing required field".to_string());
/// result.add_warning("Using default value".to_string());
///
/// assert!(!result.is_valid);
/// assert_eq!(result.errors.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn add_recommendation(&mut self, recommendation: String) {
        self.recommendations.push(recommendation);
    }
}

/// Validates a resolved [`GatewaySettings`] before the gateway starts
/// accepting traffic.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_comprehensive(settings: &GatewaySettings) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_required(settings, &mut result);
        Self::validate_timeouts(settings, &mut result);
        Self::validate_retry(settings, &mut result);
        Self::validate_security(settings, &mut result);
        Self::log_validation_results(&result);

        result
    }

    fn validate_required(settings: &GatewaySettings, result: &mut ValidationResult) {
        if settings.registration_key.is_none() {
            result.add_error(
                "SERVICE_REGISTRATION_KEY is not set — the gateway cannot register with the registry"
                    .to_string(),
            );
        }
        if settings.registry_url.trim().is_empty() {
            result.add_error("registry URL is empty".to_string());
        }
    }

    fn validate_timeouts(settings: &GatewaySettings, result: &mut ValidationResult) {
        if settings.request_timeout >= settings.total_request_timeout {
            result.add_error(format!(
                "requestTimeout ({:?}) must be less than totalRequestTimeout ({:?})",
                settings.request_timeout, settings.total_request_timeout
            ));
        }
        if settings.health_checks && settings.health_check_interval.as_millis() < 1000 {
            result.add_warning(
                "healthCheckInterval below 1s may put excessive load on the registry".to_string(),
            );
        }
    }

    fn validate_retry(settings: &GatewaySettings, result: &mut ValidationResult) {
        let retry = &settings.retry;
        if retry.base_delay_ms > retry.max_delay_ms {
            result.add_error(format!(
                "retryStrategy.baseDelay ({}) must not exceed maxDelay ({})",
                retry.base_delay_ms, retry.max_delay_ms
            ));
        }
        if retry.max_retries == 0 {
            result.add_recommendation(
                "retryStrategy.maxRetries is 0 — transient backend failures will never be retried"
                    .to_string(),
            );
        }
        if retry.retryable_statuses.is_empty() {
            result.add_warning(
                "retryStrategy.retryableStatus is empty — no HTTP status will ever trigger a retry"
                    .to_string(),
            );
        }
    }

    fn validate_security(settings: &GatewaySettings, result: &mut ValidationResult) {
        if settings.registry_url.starts_with("http://") && !settings.registry_url.contains("localhost") {
            result.add_warning(format!(
                "registry URL {} uses plain HTTP over a non-local host",
                settings.registry_url
            ));
        }
    }

    fn log_validation_results(result: &ValidationResult) {
        if result.is_valid {
            info!("configuration validation passed");
        } else {
            for error in &result.errors {
                log::error!("configuration error: {error}");
            }
        }
        for warning in &result.warnings {
            warn!("configuration warning: {warning}");
        }
        for recommendation in &result.recommendations {
            info!("configuration recommendation: {recommendation}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::GatewaySettingsOptions;

    fn valid_settings() -> GatewaySettings {
        let mut settings = GatewaySettings::load(GatewaySettingsOptions::default());
        settings.registration_key = Some("key".to_string());
        settings
    }

    #[test]
    fn missing_registration_key_is_an_error() {
        let mut settings = valid_settings();
        settings.registration_key = None;
        let result = ConfigValidator::validate_comprehensive(&settings);
        assert!(!result.is_valid);
    }

    #[test]
    fn well_formed_settings_pass() {
        let settings = valid_settings();
        let result = ConfigValidator::validate_comprehensive(&settings);
        assert!(result.is_valid);
    }

    #[test]
    fn request_timeout_exceeding_total_is_an_error() {
        let mut settings = valid_settings();
        settings.request_timeout = settings.total_request_timeout;
        let result = ConfigValidator::validate_comprehensive(&settings);
        assert!(!result.is_valid);
    }
}
