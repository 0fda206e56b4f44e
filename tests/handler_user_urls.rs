mod common;

use serde_json::{Value, json};

#[tokio::test]
async fn test_list_without_token_is_empty_and_issues_identity() {
    let (server, _worker) = common::create_test_server(None);

    let response = server.get("/api/user/urls").await;

    assert_eq!(response.status_code(), 204);
    assert!(common::issued_token(&response).is_some());
}

#[tokio::test]
async fn test_list_returns_only_own_links() {
    let (server, _worker) = common::create_test_server(None);

    let (mine, token) = common::shorten_as(&server, "https://mine.com", None).await;
    let (_, _other) = common::shorten_as(&server, "https://theirs.com", None).await;

    let response = server
        .get("/api/user/urls")
        .add_header("Cookie", common::cookie_header(&token))
        .await;

    assert_eq!(response.status_code(), 200);
    let links = response.json::<Vec<Value>>();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["short_url"], mine);
    assert_eq!(links[0]["original_url"], "https://mine.com");
}

#[tokio::test]
async fn test_list_with_invalid_token_is_unauthorized() {
    let (server, _worker) = common::create_test_server(None);

    let response = server
        .get("/api/user/urls")
        .add_header("Cookie", common::cookie_header("garbage"))
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_delete_without_token_is_unauthorized() {
    let (server, _worker) = common::create_test_server(None);

    let response = server
        .delete("/api/user/urls")
        .json(&json!(["abc"]))
        .await;

    assert_eq!(response.status_code(), 401);
    assert!(common::issued_token(&response).is_none());
}

#[tokio::test]
async fn test_delete_hides_own_links_only() {
    let (server, worker) = common::create_test_server(None);

    let (mine, owner_token) = common::shorten_as(&server, "https://mine.com", None).await;
    let (theirs, other_token) = common::shorten_as(&server, "https://theirs.com", None).await;

    let response = server
        .delete("/api/user/urls")
        .add_header("Cookie", common::cookie_header(&owner_token))
        .json(&json!([common::code_of(&mine), common::code_of(&theirs)]))
        .await;
    assert_eq!(response.status_code(), 202);

    worker.shutdown().await;

    let own = server
        .get("/api/user/urls")
        .add_header("Cookie", common::cookie_header(&owner_token))
        .await;
    assert_eq!(own.status_code(), 204);

    let other = server
        .get("/api/user/urls")
        .add_header("Cookie", common::cookie_header(&other_token))
        .await;
    assert_eq!(other.status_code(), 200);
    assert_eq!(other.json::<Vec<Value>>()[0]["short_url"], theirs);

    let redirect = server.get(&format!("/{}", common::code_of(&theirs))).await;
    assert_eq!(redirect.status_code(), 307);
}
