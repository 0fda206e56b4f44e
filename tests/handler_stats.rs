mod common;

use serde_json::Value;

#[tokio::test]
async fn test_stats_forbidden_without_trusted_subnet() {
    let (server, _worker) = common::create_test_server(None);

    let response = server
        .get("/api/internal/stats")
        .add_header("X-Real-IP", "10.0.0.1")
        .await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_stats_forbidden_outside_subnet() {
    let (server, _worker) = common::create_test_server(Some("10.0.0.0/24"));

    let response = server
        .get("/api/internal/stats")
        .add_header("X-Real-IP", "192.168.1.1")
        .await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_stats_forbidden_without_real_ip() {
    let (server, _worker) = common::create_test_server(Some("10.0.0.0/24"));

    let response = server.get("/api/internal/stats").await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_stats_counts_urls_and_owners() {
    let (server, _worker) = common::create_test_server(Some("10.0.0.0/24"));

    let (_, token) = common::shorten_as(&server, "https://a.com", None).await;
    common::shorten_as(&server, "https://b.com", Some(&token)).await;
    common::shorten_as(&server, "https://c.com", None).await;
    // Same URL from a third identity adds neither a URL nor an owner.
    common::shorten_as(&server, "https://c.com", None).await;

    let response = server
        .get("/api/internal/stats")
        .add_header("X-Real-IP", "10.0.0.5")
        .await;

    assert_eq!(response.status_code(), 200);
    let stats = response.json::<Value>();
    assert_eq!(stats["urls"], 3);
    assert_eq!(stats["users"], 2);
}
