#![allow(dead_code)]

use axum_test::{TestResponse, TestServer};
use shortener::application::services::{IdentityService, ShortenerService};
use shortener::domain::delete_worker::DeleteWorker;
use shortener::domain::repositories::LinkRepository;
use shortener::infrastructure::persistence::InMemoryLinkRepository;
use shortener::routes::router;
use shortener::state::AppState;
use std::sync::Arc;

pub const BASE_URL: &str = "http://localhost:8080";
pub const AUTH_KEY: &str = "test-auth-key";

pub fn create_test_state(
    repository: Arc<dyn LinkRepository>,
    trusted_subnet: Option<&str>,
) -> (AppState, DeleteWorker) {
    let (queue, worker) = DeleteWorker::spawn(repository.clone());

    let shortener = Arc::new(ShortenerService::new(
        repository,
        BASE_URL,
        queue,
        trusted_subnet.map(|s| s.parse().unwrap()),
    ));
    let identity = Arc::new(IdentityService::new(AUTH_KEY));

    (AppState::new(shortener, identity), worker)
}

/// Full router over a fresh in-memory store without a backup log.
pub fn create_test_server(trusted_subnet: Option<&str>) -> (TestServer, DeleteWorker) {
    let repository: Arc<dyn LinkRepository> = Arc::new(InMemoryLinkRepository::new());
    create_test_server_with(repository, trusted_subnet)
}

pub fn create_test_server_with(
    repository: Arc<dyn LinkRepository>,
    trusted_subnet: Option<&str>,
) -> (TestServer, DeleteWorker) {
    let (state, worker) = create_test_state(repository, trusted_subnet);
    (TestServer::new(router(state)).unwrap(), worker)
}

/// Extracts the identity token from a `Set-Cookie` response header.
pub fn issued_token(response: &TestResponse) -> Option<String> {
    let cookie = response.maybe_header("set-cookie")?;
    let cookie = cookie.to_str().ok()?;
    cookie
        .split(';')
        .next()?
        .strip_prefix("Authorization=")
        .map(str::to_string)
}

pub fn cookie_header(token: &str) -> String {
    format!("Authorization={token}")
}

/// Creates a link through `POST /api/shorten` and returns `(short_url, token)`.
pub async fn shorten_as(server: &TestServer, url: &str, token: Option<&str>) -> (String, String) {
    let mut request = server
        .post("/api/shorten")
        .json(&serde_json::json!({ "url": url }));
    if let Some(token) = token {
        request = request.add_header("Cookie", cookie_header(token));
    }

    let response = request.await;
    let short_url = response.json::<serde_json::Value>()["result"]
        .as_str()
        .unwrap()
        .to_string();
    let token = issued_token(&response)
        .or_else(|| token.map(str::to_string))
        .unwrap();

    (short_url, token)
}

pub fn code_of(short_url: &str) -> String {
    short_url.rsplit('/').next().unwrap().to_string()
}
