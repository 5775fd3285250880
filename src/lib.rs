//! `relay-gateway` — an HTTP reverse-proxy API gateway fronting a
//! registry-discovered microservice fleet.
//!
//! The gateway resolves a request's service prefix to a live instance via
//! an external service registry, forwards it with retry and backoff,
//! normalizes request/response headers, and maintains its own
//! registration under a periodic health-check loop that can drive
//! re-registration or orderly shutdown.
//!
//! # Module Organization
//!
//! - [`config`] - settings loading and validation
//! - [`logs`] - structured logging setup
//! - [`models`] - domain types: `Instance`, `Credential`, `GatewayStatus`, the wire envelope, errors
//! - [`routes`] - HTTP route configuration: the catch-all dispatcher and ambient health endpoints
//! - [`services`] - the core pipeline: retry policy, load balancer, registry client, proxy engine, liveness controller
//! - [`utils`] - header filtering and target URL construction

pub mod config;
pub mod logs;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
