use serde::{Deserialize, Serialize};

/// A registered backend process returned by the service registry.
///
/// Instances are produced by [`crate::services::registry_client::RegistryClient`]
/// and consumed by [`crate::services::load_balancer::LoadBalancer`]. They are
/// immutable, short-lived values: a fresh list is fetched per request and never
/// mutated in place.
///
/// # Examples
///
/// ```json
/// {
///   "id": "a1b2c3",
///   "serviceType": "products",
///   "host": "10.0.4.12",
///   "port": 4001,
///   "healthy": true,
///   "created": 1732550400000,
///   "lastUpdated": 1732550460000
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Instance {
    pub id: String,
    #[serde(rename = "serviceType")]
    pub service_type: String,
    pub host: String,
    pub port: u16,
    pub healthy: bool,
    pub created: i64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
}
