//! `RouteDispatcher`: matches an inbound path prefix to a known service
//! name and invokes [`ProxyEngine::handle`].
//!
//! The recognized service set is the fixed list named in spec §4.7; it is
//! a compile-time constant rather than data read from the registry —
//! adding a service requires a rebuild.

use crate::models::envelope::ApiResponse;
use crate::models::error::GatewayError;
use crate::services::proxy::{ProxyEngine, ProxyRequest};
use actix_web::http::Method as ActixMethod;
use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use reqwest::Method as ReqwestMethod;
use std::sync::Arc;
use uuid::Uuid;

/// actix-web and reqwest pin different major versions of the `http` crate,
/// so `actix_web::http::Method` and `reqwest::Method` are distinct types
/// with no `From` between them — convert explicitly instead of cloning.
fn parse_method(method: &ActixMethod) -> ReqwestMethod {
    match *method {
        ActixMethod::GET => ReqwestMethod::GET,
        ActixMethod::POST => ReqwestMethod::POST,
        ActixMethod::PUT => ReqwestMethod::PUT,
        ActixMethod::DELETE => ReqwestMethod::DELETE,
        ActixMethod::HEAD => ReqwestMethod::HEAD,
        ActixMethod::OPTIONS => ReqwestMethod::OPTIONS,
        ActixMethod::CONNECT => ReqwestMethod::CONNECT,
        ActixMethod::PATCH => ReqwestMethod::PATCH,
        ActixMethod::TRACE => ReqwestMethod::TRACE,
        _ => ReqwestMethod::GET,
    }
}

/// Finds an inbound correlation id (`x-correlation-id`, `x-request-id`)
/// or mints one, so a request can be traced through the logs across a
/// retry loop even though nothing is returned to the caller by default.
fn correlation_id(req: &HttpRequest) -> String {
    for header_name in ["x-correlation-id", "x-request-id"] {
        if let Some(value) = req.headers().get(header_name) {
            if let Ok(id) = value.to_str() {
                if !id.is_empty() {
                    return id.to_string();
                }
            }
        }
    }
    Uuid::new_v4().to_string()
}

/// The fixed set of service prefixes the gateway proxies to.
pub const KNOWN_SERVICES: &[&str] = &["products", "orders", "cart", "users"];

/// Splits `/{service}/<rest>` into `(service, rest)` if `service` is one of
/// [`KNOWN_SERVICES`]. `rest` is empty (not `"/"`) when there is nothing
/// after the service prefix.
fn match_known_service(tail: &str) -> Option<(&'static str, &str)> {
    let trimmed = tail.trim_start_matches('/');
    let (first_segment, rest) = match trimmed.split_once('/') {
        Some((first, rest)) => (first, rest),
        None => (trimmed, ""),
    };
    KNOWN_SERVICES
        .iter()
        .find(|known| **known == first_segment)
        .map(|known| (*known, rest))
}

/// Handles every inbound request the catch-all `/{tail:.*}` route
/// receives: dispatches to [`ProxyEngine::handle`] for a known service
/// prefix, or returns `404 SERVICE_NO_EXIST` otherwise.
pub async fn dispatch(
    req: HttpRequest,
    body: web::Bytes,
    tail: web::Path<String>,
    engine: web::Data<Arc<ProxyEngine>>,
) -> HttpResponse {
    let correlation_id = correlation_id(&req);

    let Some((service, rest)) = match_known_service(&tail) else {
        info!("[{correlation_id}] no known service for path {}", req.path());
        let now_ms = chrono::Utc::now().timestamp_millis();
        let envelope = ApiResponse::failure("SERVICE_NO_EXIST", None, now_ms);
        return HttpResponse::NotFound().json(envelope);
    };

    info!("[{correlation_id}] dispatching {} {} to {service}", req.method(), req.path());

    let headers = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    let proxy_request = ProxyRequest {
        method: parse_method(req.method()),
        headers,
        body: body.to_vec(),
    };

    match engine.handle(proxy_request, service, rest).await {
        Ok(response) => {
            let mut builder = HttpResponse::build(
                actix_web::http::StatusCode::from_u16(response.status)
                    .unwrap_or(actix_web::http::StatusCode::OK),
            );
            for (name, value) in &response.headers {
                builder.insert_header((name.as_str(), value.as_str()));
            }
            builder.json(response.body)
        }
        Err(error) => <GatewayError as actix_web::ResponseError>::error_response(&error),
    }
}

/// Registers the catch-all proxy route, following the teacher's
/// `routes::http::configure_route` payload-limit convention.
pub fn configure(cfg: &mut web::ServiceConfig, engine: Arc<ProxyEngine>) {
    cfg.app_data(web::Data::new(engine))
        .app_data(web::PayloadConfig::new(1024 * 1024))
        .service(web::resource("/{tail:.*}").to(dispatch));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_service_with_remainder() {
        assert_eq!(match_known_service("/products/all"), Some(("products", "all")));
        assert_eq!(match_known_service("products/all"), Some(("products", "all")));
    }

    #[test]
    fn matches_known_service_with_no_remainder() {
        assert_eq!(match_known_service("/cart"), Some(("cart", "")));
    }

    #[test]
    fn rejects_unknown_prefix() {
        assert_eq!(match_known_service("/nothing"), None);
        assert_eq!(match_known_service(""), None);
    }

    #[actix_web::test]
    async fn correlation_id_prefers_inbound_header_over_a_minted_one() {
        let req = actix_web::test::TestRequest::get()
            .insert_header(("x-correlation-id", "abc-123"))
            .to_http_request();
        assert_eq!(correlation_id(&req), "abc-123");
    }

    #[actix_web::test]
    async fn correlation_id_mints_a_uuid_when_absent() {
        let req = actix_web::test::TestRequest::get().to_http_request();
        let id = correlation_id(&req);
        assert_eq!(id.len(), 36);
    }

    #[test]
    fn parse_method_converts_known_verbs() {
        assert_eq!(parse_method(&ActixMethod::GET), ReqwestMethod::GET);
        assert_eq!(parse_method(&ActixMethod::POST), ReqwestMethod::POST);
        assert_eq!(parse_method(&ActixMethod::DELETE), ReqwestMethod::DELETE);
        assert_eq!(parse_method(&ActixMethod::PATCH), ReqwestMethod::PATCH);
    }
}
