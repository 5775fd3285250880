//! End-to-end tests for the gateway's actix-web routing layer.
//!
//! These drive the real `App` configuration (`dispatch::configure` and
//! `health::configure_health`) through `actix_web::test`, exercising the
//! parts of spec §8's scenarios that don't require a live HTTPS backend:
//! the catch-all dispatcher's gating and not-found behavior, and the
//! ambient health endpoints. Success/retry/backend-error scenarios against
//! a mock backend are covered in `services::proxy`'s own test module,
//! which has access to the crate's `#[cfg(test)]` HTTP-scheme seam.

use actix_web::{test, web, App};
use relay_gateway::models::credential::Credential;
use relay_gateway::models::status::GatewayStatus;
use relay_gateway::routes::{dispatch, health};
use relay_gateway::services::load_balancer::RandomBalancer;
use relay_gateway::services::proxy::{ProxyEngine, TimeoutConfig};
use relay_gateway::services::registry_client::RegistryClient;
use relay_gateway::services::retry::{RetryConfig, RetryPolicy};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(
    registry_uri: String,
    credential: Option<Credential>,
    status: GatewayStatus,
) -> Arc<ProxyEngine> {
    let registry = RegistryClient::new(registry_uri, Duration::from_secs(1), Some("key".to_string()));
    Arc::new(ProxyEngine::new(
        registry,
        Box::new(RandomBalancer),
        RetryPolicy::new(RetryConfig::default()),
        TimeoutConfig::default(),
        Arc::new(RwLock::new(status)),
        Arc::new(RwLock::new(credential)),
    ))
}

#[actix_web::test]
async fn unknown_prefix_returns_404_with_envelope() {
    let engine = engine("http://127.0.0.1:1".to_string(), None, GatewayStatus::Starting);
    let app = test::init_service(
        App::new().configure(|cfg| dispatch::configure(cfg, engine.clone())),
    )
    .await;

    let req = test::TestRequest::get().uri("/nothing/here").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "SERVICE_NO_EXIST");
}

#[actix_web::test]
async fn gateway_not_active_returns_503() {
    let engine = engine("http://127.0.0.1:1".to_string(), None, GatewayStatus::Starting);
    let app = test::init_service(
        App::new().configure(|cfg| dispatch::configure(cfg, engine.clone())),
    )
    .await;

    let req = test::TestRequest::get().uri("/products/all").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);
}

#[actix_web::test]
async fn no_instances_surfaces_as_gateway_error_through_the_route() {
    let registry = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true, "timestamp": 1, "data": []
        })))
        .mount(&registry)
        .await;

    let credential = Credential { service_id: "s".into(), token: "t".into() };
    let engine = engine(registry.uri(), Some(credential), GatewayStatus::Active);
    let app = test::init_service(
        App::new().configure(|cfg| dispatch::configure(cfg, engine.clone())),
    )
    .await;

    let req = test::TestRequest::get().uri("/products/all").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 502);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "GATEWAY_ERROR");
}

#[actix_web::test]
async fn health_endpoints_respond_ok() {
    let app = test::init_service(App::new().configure(health::configure_health)).await;

    for uri in ["/health", "/ready", "/live"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200, "{uri} should respond 200");
    }
}

#[actix_web::test]
async fn both_route_tables_coexist_without_shadowing_health() {
    // The catch-all `/{tail:.*}` proxy route must not swallow the ambient
    // health endpoints when both configurators are applied to the same app.
    let engine = engine("http://127.0.0.1:1".to_string(), None, GatewayStatus::Starting);
    let app = test::init_service(
        App::new()
            .configure(health::configure_health)
            .configure({
                let engine = engine.clone();
                move |cfg: &mut web::ServiceConfig| dispatch::configure(cfg, engine.clone())
            }),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get().uri("/orders/42").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);
}
