//! Fake downstream services served by a local axum server.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use podsum::config::ServiceSettings;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LLM_KINDS: [&str; 4] = ["summary", "keywords", "highlights", "keypoints"];

/// How the fake services respond.
#[derive(Clone, Default)]
pub struct Script {
    pub audio_status: Option<u16>,
    /// Raw audio response body; overrides the default JSON.
    pub audio_raw: Option<&'static str>,
    pub audio_body: Option<Value>,
    pub chunking_status: Option<u16>,
    pub failing_llm: Option<&'static str>,
    /// Applied to every request before answering.
    pub delay: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct Call {
    pub path: String,
    pub body: Value,
}

struct FakeState {
    script: Script,
    calls: Mutex<Vec<Call>>,
}

impl FakeState {
    async fn record(&self, path: &str, body: Value) {
        self.calls.lock().unwrap().push(Call {
            path: path.to_string(),
            body,
        });
        if let Some(delay) = self.script.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

pub fn audio_body() -> Value {
    json!({
        "results": {
            "metadata": { "title": "Ep1", "length": 1800 },
            "utterances": [
                { "speaker": 0, "start": 0.0, "end": 4.2, "text": "Welcome to episode one." }
            ]
        }
    })
}

pub fn transcript() -> Value {
    json!({
        "chunks": [
            { "text": "Welcome to episode one.", "start": 0.0, "end": 4.2 },
            { "text": "Today: Rust pipelines.", "start": 4.2, "end": 1800.0 }
        ]
    })
}

/// A running set of fake services sharing one base URL.
pub struct FakeServices {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeServices {
    pub async fn spawn(script: Script) -> Self {
        let state = Arc::new(FakeState {
            script,
            calls: Mutex::new(Vec::new()),
        });

        let mut app = Router::new()
            .route("/transcript", post(transcript_handler))
            .route("/call_chunking", post(chunking_handler));
        for kind in LLM_KINDS {
            app = app.route(
                &format!("/{}", kind),
                post(move |State(s): State<Arc<FakeState>>, Json(b): Json<Value>| {
                    llm_handler(s, kind, b)
                }),
            );
        }
        let app = app.with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn settings(&self) -> ServiceSettings {
        ServiceSettings {
            audio_url: self.base_url.clone(),
            chunking_url: self.base_url.clone(),
            llm_url: format!("{}/", self.base_url),
            timeout_secs: 5,
            connect_timeout_secs: 2,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }
}

fn status(code: Option<u16>) -> StatusCode {
    code.and_then(|c| StatusCode::from_u16(c).ok())
        .unwrap_or(StatusCode::OK)
}

async fn transcript_handler(
    State(state): State<Arc<FakeState>>,
    Json(body): Json<Value>,
) -> Response {
    state.record("/transcript", body).await;

    let code = status(state.script.audio_status);
    if !code.is_success() {
        return (code, "audio backend exploded").into_response();
    }
    if let Some(raw) = state.script.audio_raw {
        return (code, raw).into_response();
    }
    Json(state.script.audio_body.clone().unwrap_or_else(audio_body)).into_response()
}

async fn chunking_handler(
    State(state): State<Arc<FakeState>>,
    Json(body): Json<Value>,
) -> Response {
    state.record("/call_chunking", body).await;

    let code = status(state.script.chunking_status);
    if !code.is_success() {
        return (code, "chunker unavailable").into_response();
    }
    Json(transcript()).into_response()
}

async fn llm_handler(state: Arc<FakeState>, kind: &'static str, body: Value) -> Response {
    state.record(&format!("/{}", kind), body).await;

    if state.script.failing_llm == Some(kind) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "model overloaded").into_response();
    }
    Json(json!({ "kind": kind, "result": kind.to_uppercase() })).into_response()
}
