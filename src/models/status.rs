use std::fmt;

/// The gateway's own lifecycle state.
///
/// Requests may be proxied only while the status is [`GatewayStatus::Active`].
/// Any other value causes inbound requests to be rejected with `503` and a
/// status-specific message (see [`GatewayStatus::error_code`] and
/// [`GatewayStatus::message`]). The [`crate::services::liveness::LivenessController`]
/// is the only writer of this value; [`crate::services::proxy::ProxyEngine`]
/// only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Starting,
    Active,
    HealthCheckFail,
    Reregistering,
    ShuttingDown,
}

impl GatewayStatus {
    /// The `error.code` emitted to clients while the gateway is in this state.
    ///
    /// `Active` has no error code; callers must not invoke this on the active
    /// state (the proxy gate only calls it once it has established the status
    /// is not `Active`).
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayStatus::Starting => "GATEWAY_STARTING",
            GatewayStatus::Active => "GATEWAY_ACTIVE",
            GatewayStatus::HealthCheckFail => "REGISTRY_HEALTH_CHECK_FAIL",
            GatewayStatus::Reregistering => "ATTEMPTING_REREGISTRATION",
            GatewayStatus::ShuttingDown => "SHUTTING_DOWN",
        }
    }

    /// A human-readable message describing why requests are being rejected.
    pub fn message(&self) -> &'static str {
        match self {
            GatewayStatus::Starting => "Gateway is starting. Please try again shortly",
            GatewayStatus::Active => "Gateway is active",
            GatewayStatus::HealthCheckFail => {
                "Gateway has lost contact with the service registry"
            }
            GatewayStatus::Reregistering => "Gateway is re-registering with the service registry",
            GatewayStatus::ShuttingDown => "Gateway is shutting down",
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_code())
    }
}
