//! Local fake of the Twitch token and Helix endpoints for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Form, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

#[derive(Clone, Default)]
pub(crate) struct FakeConfig {
    /// Lowercase logins reported as live.
    pub live: Vec<String>,
    /// Stream requests with a zero-based index at or above this answer 401.
    pub unauthorized_from: Option<usize>,
    /// Every stream request answers with this status.
    pub stream_error_status: Option<u16>,
    /// Token endpoint answers with this status instead of issuing a token.
    pub token_status: Option<u16>,
    /// When set, stream requests with a different bearer answer 401.
    pub accepted_token: Option<String>,
}

#[derive(Clone)]
struct FakeState {
    config: Arc<FakeConfig>,
    stream_hits: Arc<AtomicUsize>,
    token_hits: Arc<AtomicUsize>,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    last_token_form: Arc<Mutex<Option<(String, String, String)>>>,
}

pub(crate) struct FakeTwitch {
    pub helix_base: String,
    pub token_url: String,
    state: FakeState,
}

impl FakeTwitch {
    pub fn stream_hits(&self) -> usize {
        self.state.stream_hits.load(Ordering::SeqCst)
    }

    pub fn token_hits(&self) -> usize {
        self.state.token_hits.load(Ordering::SeqCst)
    }

    /// Logins received per successful stream request, in arrival order.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.state.batches.lock().unwrap().clone()
    }

    pub fn last_token_form(&self) -> Option<(String, String, String)> {
        self.state.last_token_form.lock().unwrap().clone()
    }
}

pub(crate) async fn spawn_fake_twitch(config: FakeConfig) -> FakeTwitch {
    let state = FakeState {
        config: Arc::new(config),
        stream_hits: Arc::new(AtomicUsize::new(0)),
        token_hits: Arc::new(AtomicUsize::new(0)),
        batches: Arc::new(Mutex::new(Vec::new())),
        last_token_form: Arc::new(Mutex::new(None)),
    };

    let app = Router::new()
        .route("/oauth2/token", post(token_handler))
        .route("/helix/streams", get(streams_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeTwitch {
        helix_base: format!("http://{addr}/helix"),
        token_url: format!("http://{addr}/oauth2/token"),
        state,
    }
}

async fn token_handler(
    State(state): State<FakeState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_hits.fetch_add(1, Ordering::SeqCst);
    let field = |key: &str| form.get(key).cloned().unwrap_or_default();
    *state.last_token_form.lock().unwrap() = Some((
        field("client_id"),
        field("client_secret"),
        field("grant_type"),
    ));

    if let Some(code) = state.config.token_status {
        let status = StatusCode::from_u16(code).unwrap();
        return (
            status,
            r#"{"status":400,"message":"invalid client secret"}"#,
        )
            .into_response();
    }

    Json(json!({
        "access_token": "minted-token",
        "expires_in": 5011271,
        "token_type": "bearer",
    }))
    .into_response()
}

async fn streams_handler(
    State(state): State<FakeState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let index = state.stream_hits.fetch_add(1, Ordering::SeqCst);

    if state.config.unauthorized_from.is_some_and(|from| index >= from) {
        return unauthorized();
    }
    if let Some(expected) = &state.config.accepted_token {
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if bearer != format!("Bearer {expected}") {
            return unauthorized();
        }
    }
    if let Some(code) = state.config.stream_error_status {
        return StatusCode::from_u16(code).unwrap().into_response();
    }

    let query = query.unwrap_or_default();
    let logins: Vec<String> = url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| k == "user_login")
        .map(|(_, v)| v.into_owned())
        .collect();
    state.batches.lock().unwrap().push(logins.clone());

    let data: Vec<Value> = logins
        .iter()
        .filter(|login| state.config.live.contains(login))
        .map(|login| {
            json!({
                "id": format!("stream-{login}"),
                "user_id": format!("id-{login}"),
                "user_login": login,
                "user_name": login.to_uppercase(),
                "game_name": "Just Chatting",
                "title": format!("{login} stream"),
                "viewer_count": 1234,
                "started_at": "2026-10-18T00:00:00Z",
                "thumbnail_url": format!(
                    "https://static-cdn.jtvnw.net/previews-ttv/live_user_{login}-{{width}}x{{height}}.jpg"
                ),
                "type": "live",
            })
        })
        .collect();

    Json(json!({ "data": data, "pagination": {} })).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        r#"{"error":"Unauthorized","status":401,"message":"Invalid OAuth token"}"#,
    )
        .into_response()
}
