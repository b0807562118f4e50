use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::storage::SnapshotFile;
use crate::sync::AUTH_HEADER;

const NO_STORE: [(header::HeaderName, &str); 1] = [(header::CACHE_CONTROL, "no-store")];

/// Token presented by the client: `Authorization: Bearer <t>` or `x-auth-token: <t>`.
fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    bearer
        .or_else(|| {
            headers
                .get(AUTH_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        })
        .filter(|t| !t.is_empty())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    match presented_token(headers) {
        Some(token) if state.accepts(token) => Ok(()),
        _ => {
            warn!("Rejected snapshot request without a valid token");
            Err(ApiError::Unauthorized)
        }
    }
}

/// `GET /api/state`: the stored snapshot, or 204 when there is none.
pub async fn get_state(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    authorize(&state, &headers)?;

    match SnapshotFile::new(&state.storage).read()? {
        Some(document) => Ok((NO_STORE, Json(document)).into_response()),
        None => {
            debug!("No snapshot stored yet");
            Ok((StatusCode::NO_CONTENT, NO_STORE).into_response())
        }
    }
}

/// `POST /api/state`: replace the stored snapshot with the request body.
pub async fn put_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    authorize(&state, &headers)?;

    let document: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Invalid JSON".to_string()))?;

    let _guard = state.write_lock.lock().await;
    SnapshotFile::new(&state.storage).write(&document)?;
    info!("Stored snapshot ({} bytes)", body.len());

    Ok((StatusCode::NO_CONTENT, NO_STORE).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_router;
    use crate::models::Player;
    use crate::sync::{HttpRemoteStore, RemoteStore, SyncSnapshot};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    const TOKEN: &str = "v1.VGVhbQ.secret";

    fn app(temp_dir: &TempDir, token: Option<&str>) -> axum::Router {
        build_router(AppState::for_tests(temp_dir.path(), token))
    }

    async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, headers, json)
    }

    fn get(auth: Option<(&str, &str)>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/state");
        if let Some((name, value)) = auth {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/state")
            .header("content-type", "application/json")
            .header(AUTH_HEADER, TOKEN)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_or_wrong_token_is_unauthorized() {
        let temp_dir = TempDir::new().unwrap();

        let (status, _, json) = send(app(&temp_dir, Some(TOKEN)), get(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");

        let (status, _, _) = send(app(&temp_dir, Some(TOKEN)), get(Some((AUTH_HEADER, "nope")))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unconfigured_server_refuses_everything() {
        let temp_dir = TempDir::new().unwrap();
        let (status, _, _) = send(app(&temp_dir, None), get(Some((AUTH_HEADER, TOKEN)))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_state_is_no_content() {
        let temp_dir = TempDir::new().unwrap();
        let (status, headers, _) =
            send(app(&temp_dir, Some(TOKEN)), get(Some((AUTH_HEADER, TOKEN)))).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn test_post_then_get_returns_document() {
        let temp_dir = TempDir::new().unwrap();
        let doc = json!({"players": [{"id": "p1", "name": "Ana"}], "encounters": []});

        let (status, headers, _) = send(app(&temp_dir, Some(TOKEN)), post(&doc.to_string())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");

        let bearer = format!("Bearer {}", TOKEN);
        let (status, headers, json) = send(
            app(&temp_dir, Some(TOKEN)),
            get(Some(("authorization", bearer.as_str()))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert_eq!(json, doc);
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let temp_dir = TempDir::new().unwrap();
        let (status, _, json) = send(app(&temp_dir, Some(TOKEN)), post("{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "Bad request: Invalid JSON");
        assert!(SnapshotFile::new(&crate::storage::StorageConfig::new(temp_dir.path().to_path_buf()))
            .read()
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_health() {
        let temp_dir = TempDir::new().unwrap();
        let (status, _, json) = send(
            app(&temp_dir, None),
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_http_remote_store_against_server() {
        let temp_dir = TempDir::new().unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app(&temp_dir, Some(TOKEN));
        let server = tokio::spawn(async move { axum::serve(listener, router).await });

        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let remote = HttpRemoteStore::with_client(&format!("http://{}", addr), client).unwrap();
        assert_eq!(remote.fetch(TOKEN).await.unwrap(), None);

        let snapshot = SyncSnapshot {
            players: vec![Player::new("Ana")],
            ..Default::default()
        };
        remote.push(TOKEN, &snapshot).await.unwrap();
        assert_eq!(remote.fetch(TOKEN).await.unwrap(), Some(snapshot));

        assert!(matches!(
            remote.fetch("wrong").await,
            Err(crate::sync::SyncError::Unauthorized)
        ));
        server.abort();
    }
}
