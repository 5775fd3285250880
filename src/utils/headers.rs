//! Header hygiene: stripping hop-by-hop and sensitive headers at the proxy
//! boundary (RFC 7230 §6.1).
//!
//! Two pure functions operating on an ordered list of `(name, value)`
//! pairs so that repeated header names survive the round trip (a `HashMap`
//! would collapse them). Comparisons are case-insensitive; kept headers
//! retain their original casing.

/// Headers dropped from every outbound request to a backend.
const REQUEST_DROP: &[&str] = &[
    "host",
    "connection",
    "content-length",
    "transfer-encoding",
    "authorization",
];

/// Hop-by-hop headers dropped from every response relayed to the client.
const RESPONSE_DROP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Gateway-internal metadata prefix, never forwarded to a backend.
const INTERNAL_PREFIX: &str = "x-internal-";

/// Drops headers that must never reach a backend: hop-by-hop headers the
/// proxy boundary terminates, plus `authorization` so a client's own
/// credential is never leaked downstream.
pub fn filter_request(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| !REQUEST_DROP.iter().any(|drop| name.eq_ignore_ascii_case(drop)))
        .cloned()
        .collect()
}

/// Drops hop-by-hop headers and any `x-internal-*` header before a backend
/// response is relayed to the client.
pub fn filter_response(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| {
            !RESPONSE_DROP.iter().any(|drop| name.eq_ignore_ascii_case(drop))
                && !name.to_ascii_lowercase().starts_with(INTERNAL_PREFIX)
        })
        .cloned()
        .collect()
}
