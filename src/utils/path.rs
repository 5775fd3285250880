//! Target URL construction for outbound backend requests.

/// Builds the target URL for a proxied backend request under a given
/// scheme. `tail_path` is the route's remainder after the service prefix
/// and is used verbatim — it is not re-encoded, re-normalized, or
/// validated.
///
/// Production callers always pass `"https"` (the gateway forwards to
/// backends over HTTPS but does not itself terminate TLS); the scheme is
/// a parameter rather than hardcoded so tests can point the proxy engine
/// at a plain-HTTP mock backend.
///
/// # Examples
///
/// ```
/// use relay_gateway::utils::path::build_target_url;
///
/// let url = build_target_url("https", "10.0.4.12", 4001, "all");
/// assert_eq!(url, "https://10.0.4.12:4001/all");
/// ```
pub fn build_target_url(scheme: &str, host: &str, port: u16, tail_path: &str) -> String {
    format!("{scheme}://{host}:{port}/{tail_path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_url_from_scheme_host_port_and_tail() {
        assert_eq!(
            build_target_url("https", "localhost", 3001, "all"),
            "https://localhost:3001/all"
        );
    }

    #[test]
    fn tail_path_is_used_verbatim() {
        assert_eq!(
            build_target_url("https", "localhost", 3001, "search?q=a b"),
            "https://localhost:3001/search?q=a b"
        );
    }

    #[test]
    fn empty_tail_path_still_yields_trailing_slash() {
        assert_eq!(build_target_url("https", "localhost", 3001, ""), "https://localhost:3001/");
    }
}
