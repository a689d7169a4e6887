//! HttpFetcher against a throwaway local axum server.
//!
//! Routes under `/photos/{id}`:
//! - id divisible by 10 → 500
//! - id 99 → sleeps 2s before answering
//! - id 77 → 200 only with `Authorization: Bearer letmein`, else 401
//! - id 66 → 200 with a body that is not JSON
//! - id 55 → 203 with a valid photo
//! - anything else → 200 with a photo

use axum::Router;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use photofetch::decode::JsonDecoder;
use photofetch::engine::{Engine, EngineConfig};
use photofetch::error::Error;
use photofetch::fetch::{Fetcher, HttpFetcher};
use photofetch::model::photo::Photo;
use photofetch::model::{ItemId, sequential_ids};
use secrecy::SecretString;
use std::net::SocketAddr;
use std::time::Duration;

async fn spawn_server() -> SocketAddr {
    let app = Router::new().route("/photos/{id}", get(get_photo));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn get_photo(Path(id): Path<u64>, headers: HeaderMap) -> Response {
    match id {
        99 => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            json_ok(photo(id))
        }
        77 if !has_bearer(&headers, "letmein") => StatusCode::UNAUTHORIZED.into_response(),
        66 => (StatusCode::OK, "not json at all").into_response(),
        55 => (StatusCode::NON_AUTHORITATIVE_INFORMATION, photo(id)).into_response(),
        id if id % 10 == 0 => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        id => json_ok(photo(id)),
    }
}

fn has_bearer(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|v| v == token)
}

fn json_ok(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

fn photo(id: u64) -> String {
    format!(
        r#"{{"albumId":1,"id":{id},"title":"t{id}","url":"http://img/600/{id}","thumbnailUrl":"http://img/150/{id}"}}"#
    )
}

fn fetcher(addr: SocketAddr) -> HttpFetcher {
    HttpFetcher::new(format!("http://{addr}/photos")).unwrap()
}

#[tokio::test]
async fn ok_response_returns_body() {
    let addr = spawn_server().await;
    let body = fetcher(addr)
        .fetch(ItemId(3), Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(body, photo(3).into_bytes());
}

#[tokio::test]
async fn server_error_is_a_transport_error() {
    let addr = spawn_server().await;
    let err = fetcher(addr)
        .fetch(ItemId(20), Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn only_200_counts_as_success() {
    let addr = spawn_server().await;
    let err = fetcher(addr)
        .fetch(ItemId(55), Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_response_hits_the_deadline() {
    let addr = spawn_server().await;
    let err = fetcher(addr)
        .fetch(ItemId(99), Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn bearer_token_is_sent_when_configured() {
    let addr = spawn_server().await;

    assert!(fetcher(addr)
        .fetch(ItemId(77), Duration::from_secs(2))
        .await
        .is_err());

    let authed = fetcher(addr).with_api_token(SecretString::from("letmein"));
    assert!(authed.fetch(ItemId(77), Duration::from_secs(2)).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn engine_over_http_keeps_only_good_photos() {
    let addr = spawn_server().await;
    let engine = Engine::new(
        fetcher(addr),
        JsonDecoder::<Photo>::new(),
        EngineConfig {
            retry_limit: 1,
            attempt_timeout: Duration::from_secs(2),
            concurrency: 8,
        },
    );

    let ids = sequential_ids(25).chain([ItemId(66)]);
    let output = engine.run(ids).await.unwrap();

    let stored: Vec<u64> = output.store.ids().map(|id| id.0).collect();
    let expected: Vec<u64> = (1..=25).filter(|id| id % 10 != 0).collect();
    assert_eq!(stored, expected);

    // 10 and 20 fail twice each; 66 is fetched once and fails to decode.
    assert_eq!(output.stats.exhausted, 2);
    assert_eq!(output.stats.undecodable, 1);
    assert_eq!(output.stats.spawned, 26 + 2);
    assert_eq!(
        output.store.get(ItemId(7)).unwrap().thumbnail_url,
        "http://img/150/7"
    );
}
