#![cfg(feature = "server")]

use axie_ledger::config::MarketplaceConfig;
use axie_ledger::{Error, ListingSource, MarketplaceClient, PageRequest};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> MarketplaceClient {
    let config = MarketplaceConfig {
        api_url: format!("http://{}/graphql", addr),
        api_key: "test-key".to_string(),
        request_timeout_secs: 5,
        ..MarketplaceConfig::default()
    };
    MarketplaceClient::new(&config).unwrap()
}

async fn listings(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "missing key" })));
    }
    let query = body["query"].as_str().unwrap_or_default();
    assert!(query.contains("size: 300"));

    (
        StatusCode::OK,
        Json(json!({
            "data": { "axies": { "results": [
                { "id": "11", "name": "One", "class": "Beast", "stage": 4,
                  "highestOffer": { "currentPriceUsd": "2.5" } },
                { "name": "No id" }
            ] } }
        })),
    )
}

#[tokio::test]
async fn test_fetch_page_decodes_listings() {
    let addr = serve(Router::new().route("/graphql", post(listings))).await;

    let page = client_for(addr).fetch_page(&PageRequest::default()).await.unwrap();

    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].external_id().unwrap(), 11);
    assert!(page.records[1].external_id().is_err());
}

#[tokio::test]
async fn test_non_success_status_is_upstream_failure() {
    let app = Router::new().route(
        "/graphql",
        post(|| async { (StatusCode::BAD_GATEWAY, "down") }),
    );
    let addr = serve(app).await;

    let err = client_for(addr).fetch_page(&PageRequest::default()).await.unwrap_err();

    assert!(matches!(err, Error::UpstreamUnavailable(_)));
    assert!(err.to_string().contains("502"));
    assert!(err.to_string().contains("down"));
}

#[tokio::test]
async fn test_non_json_body_is_upstream_failure() {
    let app = Router::new().route("/graphql", post(|| async { "<html>maintenance</html>" }));
    let addr = serve(app).await;

    let err = client_for(addr).fetch_page(&PageRequest::default()).await.unwrap_err();

    assert!(matches!(err, Error::UpstreamUnavailable(_)));
    assert!(err.to_string().contains("not JSON"));
}

#[tokio::test]
async fn test_unreachable_host_is_upstream_failure() {
    // Reserve a port, then close it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client_for(addr).fetch_page(&PageRequest::default()).await.unwrap_err();

    assert!(matches!(err, Error::UpstreamUnavailable(_)));
    assert!(err.to_string().contains("listings request failed"));
}
