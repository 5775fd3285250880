//! Data models and domain types for the gateway.
//!
//! This module contains the core data structures shared across the gateway:
//! the registry's [`instance`] and [`credential`] records, the gateway's own
//! [`status`] FSM value, the wire-level [`envelope`] every response conforms
//! to, and the tagged [`error`] type the proxy pipeline raises internally.
//!
//! # Module Organization
//!
//! - [`instance`] - a registered backend returned by the service registry
//! - [`credential`] - the gateway's own registry credential
//! - [`status`] - the `GatewayStatus` lifecycle enum
//! - [`envelope`] - the `ApiResponse` wire envelope
//! - [`error`] - `GatewayError`, the tagged-variant error type

pub mod credential;
pub mod envelope;
pub mod error;
pub mod instance;
pub mod status;
