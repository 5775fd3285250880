//! HTTP route configuration.
//!
//! - [`dispatch`] - the `RouteDispatcher`: catch-all proxy route for known services
//! - [`health`] - the gateway's own `/health`, `/ready`, `/live` endpoints
//!   (ambient self-health, distinct from the registry's own `/health`
//!   contract that `RegistryClient` speaks to)

pub mod dispatch;
pub mod health;
