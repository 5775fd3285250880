//! Support utilities used by the service layer.
//!
//! - [`headers`] - the `HeaderFilter` pure functions
//! - [`path`] - target URL construction for outbound backend requests

pub mod headers;
pub mod path;
