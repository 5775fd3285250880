use serde::{Deserialize, Serialize};

/// The gateway's own registration with the service registry.
///
/// Obtained once at startup from [`crate::services::registry_client::RegistryClient::register`],
/// attached as `x-service-id`/`x-service-token` on every subsequent registry
/// call. Replaced wholesale on a successful re-register; never mutated
/// field-by-field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Credential {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    pub token: String,
}
