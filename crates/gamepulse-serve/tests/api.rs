//! End-to-end tests of the HTTP surface against fake RAWG, Twitch and Google
//! servers bound to localhost.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{self, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower::ServiceExt;

use gamepulse_serve::{AppState, Config, router};

#[derive(Debug, Clone)]
struct Call {
    method: Method,
    path: String,
    query: String,
    authorization: Option<String>,
    client_id: Option<String>,
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path)
            .cloned()
            .collect()
    }

    fn total(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

fn top_rated_page() -> Value {
    json!({
        "count": 3,
        "results": [
            {
                "id": 1,
                "name": "Alpha",
                "genres": [{"id": 4, "name": "Action"}, {"id": 51, "name": "Indie"}],
                "platforms": [{"platform": {"id": 4, "name": "PC"}}]
            },
            {
                "id": 2,
                "name": "Beta",
                "genres": [{"id": 51, "name": "Indie"}],
                "platforms": [
                    {"platform": {"id": 4, "name": "PC"}},
                    {"platform": {"id": 187, "name": "PlayStation 5"}}
                ]
            },
            {"id": 3, "name": "Gamma", "genres": null}
        ]
    })
}

async fn fake_upstream(State(recorder): State<Recorder>, request: Request) -> Response {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let call = Call {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
        query: request.uri().query().unwrap_or("").to_string(),
        authorization: header(AUTHORIZATION.as_str()),
        client_id: header("client-id"),
    };
    recorder.calls.lock().unwrap().push(call.clone());

    match call.path.as_str() {
        "/rawg/games" => Json(top_rated_page()).into_response(),
        "/rawg/games/3498" => Json(json!({"id": 3498, "name": "Grand Theft Auto V"})).into_response(),
        "/rawg/genres" => Json(json!({
            "results": [{"id": 4, "name": "Action"}, {"id": 51, "name": "Indie"}]
        }))
        .into_response(),
        "/rawg/platforms" => Json(json!({
            "results": [{"id": 4, "name": "PC"}, {"id": 187, "name": "PlayStation 5"}]
        }))
        .into_response(),
        "/twitch/token" => Json(json!({
            "access_token": "app-token",
            "expires_in": 5_000_000,
            "token_type": "bearer"
        }))
        .into_response(),
        "/helix/streams" => Json(json!({
            "data": [{"id": "1", "user_name": "streamer", "viewer_count": 1200}],
            "pagination": {}
        }))
        .into_response(),
        "/google/tokeninfo" if call.query == "id_token=good-id-token" => Json(json!({
            "aud": "client-123",
            "sub": "10769150350006150715113082367",
            "email": "player@example.com",
            "email_verified": "true",
            "name": "Player One",
            "picture": "https://example.com/p.png"
        }))
        .into_response(),
        "/google/tokeninfo" => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_token", "error_description": "Invalid Value"})),
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response(),
    }
}

async fn spawn_upstream() -> (String, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .fallback(fake_upstream)
        .with_state(recorder.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (format!("http://{addr}"), recorder)
}

fn config(base: &str) -> Config {
    Config {
        rawg_api_key: Some("test-key".to_string()),
        rawg_base_url: format!("{base}/rawg"),
        twitch_client_id: Some("twitch-client".to_string()),
        twitch_client_secret: Some("twitch-secret".to_string()),
        twitch_api_url: format!("{base}/helix"),
        twitch_token_url: format!("{base}/twitch/token"),
        google_client_id: Some("client-123".to_string()),
        google_tokeninfo_url: format!("{base}/google/tokeninfo"),
        jwt_secret: "test-access-secret".to_string(),
        refresh_token_secret: "test-refresh-secret".to_string(),
        ..Config::default()
    }
}

async fn app_with(customize: impl FnOnce(&mut Config)) -> (Router, Recorder) {
    let (base, recorder) = spawn_upstream().await;
    let mut config = config(&base);
    customize(&mut config);
    (router(AppState::new(config).unwrap()), recorder)
}

async fn app() -> (Router, Recorder) {
    app_with(|_| {}).await
}

fn get(uri: &str) -> Request {
    http::Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request {
    http::Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_bearer(mut request: Request, token: &str) -> Request {
    request
        .headers_mut()
        .insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
    request
}

async fn send(app: &Router, request: Request) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, recorder) = app().await;

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
    assert!(body["timestamp"].is_string());
    assert_eq!(recorder.total(), 0);
}

#[tokio::test]
async fn missing_rawg_key_is_503_without_upstream_call() {
    let (app, recorder) = app_with(|c| c.rawg_api_key = None).await;

    for uri in ["/api/games/trending", "/api/genres/stats", "/api/games/3498"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert_eq!(body, json!({"error": "RAWG API key not configured"}));
    }
    assert_eq!(recorder.total(), 0);
}

#[tokio::test]
async fn placeholder_rawg_key_counts_as_missing() {
    let (app, recorder) =
        app_with(|c| c.rawg_api_key = Some("your_rawg_api_key_here".to_string())).await;

    let (status, body) = send(&app, get("/api/genres")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "RAWG API key not configured");
    assert_eq!(recorder.total(), 0);
}

#[tokio::test]
async fn trending_is_served_from_cache() {
    let (app, recorder) = app().await;

    let (first_status, first) = send(&app, get("/api/games/trending")).await;
    let (second_status, second) = send(&app, get("/api/games/trending")).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(first["results"][0]["name"], "Alpha");

    let calls = recorder.calls_to("/rawg/games");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].query.contains("key=test-key"));
    assert!(calls[0].query.contains("page_size=20"));
    assert!(calls[0].query.contains("ordering=-rating"));
    assert!(calls[0].query.contains("dates="));
}

#[tokio::test]
async fn reordered_search_params_share_one_entry() {
    let (app, recorder) = app().await;

    let (status, _) = send(&app, get("/api/games/search?q=zelda&platforms=7")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/api/games/search?platforms=7&genres=&q=zelda")).await;
    assert_eq!(status, StatusCode::OK);

    let calls = recorder.calls_to("/rawg/games");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].query.contains("search=zelda"));
    assert!(calls[0].query.contains("platforms=7"));
    assert!(!calls[0].query.contains("genres"));

    let (status, _) = send(&app, get("/api/games/search?q=mario")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recorder.calls_to("/rawg/games").len(), 2);
}

#[tokio::test]
async fn game_detail_is_cached_per_id() {
    let (app, recorder) = app().await;

    let (status, body) = send(&app, get("/api/games/3498")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Grand Theft Auto V");

    send(&app, get("/api/games/3498")).await;
    assert_eq!(recorder.calls_to("/rawg/games/3498").len(), 1);
}

#[tokio::test]
async fn game_id_cannot_escape_its_path_segment() {
    let (app, recorder) = app().await;

    for uri in ["/api/games/..%2Fgenres", "/api/games/x%3Fpage_size%3D40"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, json!({"error": "Invalid game id"}));
    }
    assert_eq!(recorder.total(), 0);
}

#[tokio::test]
async fn upstream_error_is_reported_and_not_cached() {
    let (app, recorder) = app().await;

    let (status, body) = send(&app, get("/api/games/unknown-slug")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "error": "Failed to fetch game details",
            "message": "upstream returned Not Found",
            "details": "Not found."
        })
    );

    send(&app, get("/api/games/unknown-slug")).await;
    assert_eq!(recorder.calls_to("/rawg/games/unknown-slug").len(), 2);
}

#[tokio::test]
async fn genre_stats_count_the_top_rated_sample() {
    let (app, recorder) = app().await;

    let (status, body) = send(&app, get("/api/genres/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["genres"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["distribution"],
        json!([
            {"id": 51, "name": "Indie", "count": 2},
            {"id": 4, "name": "Action", "count": 1}
        ])
    );

    let games = recorder.calls_to("/rawg/games");
    assert_eq!(games.len(), 1);
    assert!(games[0].query.contains("page_size=100"));
    assert_eq!(recorder.calls_to("/rawg/genres").len(), 1);

    send(&app, get("/api/genres/stats")).await;
    assert_eq!(recorder.calls_to("/rawg/games").len(), 1);
}

#[tokio::test]
async fn platform_stats_count_nested_platforms() {
    let (app, _recorder) = app().await;

    let (status, body) = send(&app, get("/api/platforms/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["platforms"][1]["name"], "PlayStation 5");
    assert_eq!(
        body["distribution"],
        json!([
            {"id": 4, "name": "PC", "count": 2},
            {"id": 187, "name": "PlayStation 5", "count": 1}
        ])
    );
}

#[tokio::test]
async fn streams_share_one_app_token() {
    let (app, recorder) = app().await;

    let (status, body) = send(&app, get("/api/twitch/streams/top")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["user_name"], "streamer");

    send(&app, get("/api/twitch/streams/top")).await;
    let (status, _) = send(&app, get("/api/twitch/streams/game/33214")).await;
    assert_eq!(status, StatusCode::OK);

    let token_calls = recorder.calls_to("/twitch/token");
    assert_eq!(token_calls.len(), 1);
    assert_eq!(token_calls[0].method, Method::POST);
    assert!(token_calls[0].query.contains("grant_type=client_credentials"));

    let streams = recorder.calls_to("/helix/streams");
    assert_eq!(streams.len(), 2);
    for call in &streams {
        assert_eq!(call.authorization.as_deref(), Some("Bearer app-token"));
        assert_eq!(call.client_id.as_deref(), Some("twitch-client"));
    }
    assert!(streams[0].query.contains("first=20"));
    assert!(streams[1].query.contains("game_id=33214"));
    assert!(streams[1].query.contains("first=5"));
}

#[tokio::test]
async fn missing_twitch_credentials_is_503() {
    let (app, recorder) = app_with(|c| c.twitch_client_secret = None).await;

    let (status, body) = send(&app, get("/api/twitch/streams/top")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "Twitch credentials not configured"}));
    assert_eq!(recorder.total(), 0);
}

#[tokio::test]
async fn api_is_rate_limited_per_client() {
    let (app, _recorder) = app_with(|c| c.rate_limit_max = 2).await;

    assert_eq!(send(&app, get("/api/genres")).await.0, StatusCode::OK);
    assert_eq!(send(&app, get("/api/genres")).await.0, StatusCode::OK);

    let (status, body) = send(&app, get("/api/genres")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body["error"],
        "Too many requests from this IP, please try again later."
    );

    // Outside /api
    assert_eq!(send(&app, get("/health")).await.0, StatusCode::OK);
}

#[tokio::test]
async fn google_sign_in_then_verify_refresh_and_logout() {
    let (app, _recorder) = app().await;

    let (status, login) = send(
        &app,
        post_json("/auth/google", json!({"token": "good-id-token"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["success"], true);
    assert_eq!(login["user"]["email"], "player@example.com");
    assert_eq!(login["user"]["id"], "10769150350006150715113082367");
    let access = login["accessToken"].as_str().unwrap().to_string();
    let refresh = login["refreshToken"].as_str().unwrap().to_string();

    let (status, session) = send(&app, with_bearer(get("/auth/verify"), &access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"]["email"], "player@example.com");
    assert_eq!(session["user"]["name"], "Player One");

    let (status, refreshed) = send(
        &app,
        post_json("/auth/refresh", json!({"refreshToken": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = refreshed["accessToken"].as_str().unwrap();

    let logout = with_bearer(post_json("/auth/logout", json!({})), new_access);
    let (status, body) = send(&app, logout).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn auth_rejects_missing_and_invalid_tokens() {
    let (app, _recorder) = app().await;

    let (status, body) = send(&app, post_json("/auth/google", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Google token is required");

    let (status, body) = send(&app, post_json("/auth/google", json!({"token": "forged"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid Google token");

    let (status, body) = send(&app, post_json("/auth/refresh", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Refresh token is required");

    let (status, body) = send(
        &app,
        post_json("/auth/refresh", json!({"refreshToken": "not.a.jwt"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid refresh token");

    let (status, body) = send(&app, get("/auth/verify")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access token required");

    let (status, body) = send(&app, with_bearer(get("/auth/verify"), "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}
