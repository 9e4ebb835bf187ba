//! HTTP API v1 — chat sessions over REST and SSE.
//!
//! Endpoints:
//!
//! - `GET    /v1/ui`                            — Sidebar text, examples and cheat sheet
//! - `GET    /v1/tools`                         — List the agent's tools
//! - `POST   /v1/sessions`                      — Start a session
//! - `GET    /v1/sessions/{id}`                 — Displayed history
//! - `DELETE /v1/sessions/{id}`                 — End a session
//! - `POST   /v1/sessions/{id}/messages`        — Ask a question, get the reply
//! - `POST   /v1/sessions/{id}/messages/stream` — Ask a question, get an SSE stream
//! - `POST   /v1/sessions/{id}/clear`           — Clear history and memory
//! - `GET    /v1/sessions/{id}/memory`          — Memory window debug view
//!
//! Every session sits behind its own async mutex, so a session answers one
//! question at a time while different sessions proceed independently.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, Sse},
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use mathwise_agent::{Agent, AgentStreamEvent, ChatSession, ReactAgent};
use mathwise_config::{AppConfig, UiConfig};
use mathwise_core::message::Message;
use mathwise_core::provider::ToolDefinition;
use mathwise_memory::MemoryDebugLine;

// ── State ─────────────────────────────────────────────────────────────────

struct SessionSlot {
    /// Tick of the last open or lookup; the smallest tick is evicted first.
    last_used: AtomicU64,
    session: Arc<Mutex<ChatSession>>,
}

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub agent: Arc<dyn Agent>,
    pub tools: Vec<ToolDefinition>,
    pub config: AppConfig,
    pub start_time: DateTime<Utc>,
    sessions: RwLock<HashMap<String, SessionSlot>>,
    clock: AtomicU64,
}

pub type SharedApiState = Arc<ApiV1State>;

impl ApiV1State {
    pub fn new(agent: Arc<dyn Agent>, tools: Vec<ToolDefinition>, config: AppConfig) -> Self {
        Self {
            agent,
            tools,
            config,
            start_time: Utc::now(),
            sessions: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
        }
    }

    /// Build the ReAct agent and its tools from config.
    pub fn from_config(config: AppConfig) -> mathwise_core::Result<Self> {
        let agent = ReactAgent::from_config(&config)?;
        let tools = agent.tools().definitions();
        Ok(Self::new(Arc::new(agent), tools, config))
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Start a session, evicting the least recently used one when the map is full.
    async fn open_session(&self) -> (String, DateTime<Utc>, Vec<Message>) {
        let session = ChatSession::from_config(self.agent.clone(), &self.config);
        let id = session.id().to_string();
        let created_at = session.created_at();
        let history = session.history().to_vec();

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.config.gateway.max_sessions
            && let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
                .map(|(k, _)| k.clone())
        {
            info!(session_id = %oldest, "Evicting least recently used session");
            sessions.remove(&oldest);
        }
        sessions.insert(
            id.clone(),
            SessionSlot {
                last_used: AtomicU64::new(self.tick()),
                session: Arc::new(Mutex::new(session)),
            },
        );
        (id, created_at, history)
    }

    /// Look a session up without holding the map lock afterwards.
    async fn session(&self, id: &str) -> Result<Arc<Mutex<ChatSession>>, ApiError> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|slot| {
                slot.last_used.store(self.tick(), Ordering::Relaxed);
                slot.session.clone()
            })
            .ok_or_else(|| not_found(id))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/ui", get(ui_handler))
        .route("/tools", get(list_tools_handler))
        .route("/sessions", post(create_session_handler))
        .route(
            "/sessions/{id}",
            get(get_session_handler).delete(delete_session_handler),
        )
        .route("/sessions/{id}/messages", post(send_message_handler))
        .route("/sessions/{id}/messages/stream", post(stream_message_handler))
        .route("/sessions/{id}/clear", post(clear_session_handler))
        .route("/sessions/{id}/memory", get(memory_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct SendMessageRequest {
    message: String,
}

#[derive(Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub session_id: String,
    pub response: String,
    pub success: bool,
}

#[derive(Serialize, Deserialize)]
pub struct MessageDto {
    pub id: String,
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

impl From<&Message> for MessageDto {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id.clone(),
            role: m.role.to_string(),
            content: m.content.clone(),
            timestamp: m.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: String,
    pub created_at: String,
    pub messages: Vec<MessageDto>,
}

#[derive(Serialize, Deserialize)]
pub struct ToolDto {
    pub name: String,
    pub description: String,
}

#[derive(Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDto>,
    pub count: usize,
}

#[derive(Serialize)]
struct MemoryResponse {
    session_id: String,
    window_size: usize,
    count: usize,
    turns: Vec<MemoryDebugLine>,
    /// The same rows pre-rendered as `✓ role: preview`.
    lines: Vec<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn not_found(id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session not found: {id}"),
        }),
    )
}

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn session_response(session: &ChatSession) -> SessionResponse {
    SessionResponse {
        id: session.id().to_string(),
        created_at: session.created_at().to_rfc3339(),
        messages: session.history().iter().map(MessageDto::from).collect(),
    }
}

/// The question text, or 400 when it is blank.
fn question(payload: &SendMessageRequest) -> Result<&str, ApiError> {
    let text = payload.message.trim();
    if text.is_empty() {
        return Err(bad_request("message must not be empty"));
    }
    Ok(text)
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn ui_handler(State(state): State<SharedApiState>) -> Json<UiConfig> {
    Json(state.config.ui.clone())
}

async fn list_tools_handler(State(state): State<SharedApiState>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: state
            .tools
            .iter()
            .map(|d| ToolDto {
                name: d.name.clone(),
                description: d.description.clone(),
            })
            .collect(),
        count: state.tools.len(),
    })
}

async fn create_session_handler(
    State(state): State<SharedApiState>,
) -> (StatusCode, Json<SessionResponse>) {
    let (id, created_at, history) = state.open_session().await;
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            id,
            created_at: created_at.to_rfc3339(),
            messages: history.iter().map(MessageDto::from).collect(),
        }),
    )
}

async fn get_session_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let slot = state.session(&id).await?;
    let session = slot.lock().await;
    Ok(Json(session_response(&session)))
}

async fn delete_session_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.sessions.write().await.remove(&id) {
        Some(_) => {
            info!(session_id = %id, "Session ended");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(not_found(&id)),
    }
}

async fn send_message_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let text = question(&payload)?;
    let slot = state.session(&id).await?;
    info!(session_id = %id, message_len = text.len(), "v1/messages request");

    let outcome = slot.lock().await.submit(text).await;
    Ok(Json(SendMessageResponse {
        session_id: id,
        success: outcome.is_success(),
        response: outcome.text().to_string(),
    }))
}

/// `POST /v1/sessions/{id}/messages/stream` — the agent's steps as SSE,
/// ending with a `done` event once the reply is recorded.
async fn stream_message_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let text = question(&payload)?.to_string();
    let slot = state.session(&id).await?;
    info!(session_id = %id, message_len = text.len(), "v1/messages/stream SSE request");

    let (tx, rx) = mpsc::channel::<AgentStreamEvent>(64);
    tokio::spawn(async move {
        let mut session = slot.lock().await;
        session.submit_with_events(&text, Some(&tx)).await;
    });

    let stream = ReceiverStream::new(rx).map(|event| {
        let event_type = event.event_type().to_string();
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event_type).data(data))
    });

    Ok(Sse::new(stream))
}

async fn clear_session_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let slot = state.session(&id).await?;
    let mut session = slot.lock().await;
    session.clear();
    Ok(Json(session_response(&session)))
}

async fn memory_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<MemoryResponse>, ApiError> {
    let slot = state.session(&id).await?;
    let session = slot.lock().await;
    let turns = session.memory_debug();
    Ok(Json(MemoryResponse {
        session_id: id,
        window_size: session.memory().capacity(),
        count: turns.len(),
        lines: turns.iter().map(|t| t.to_string()).collect(),
        turns,
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use mathwise_agent::AgentRun;
    use mathwise_core::error::{AgentError, ProviderError};
    use mathwise_core::tool::ToolRegistry;
    use mathwise_providers::{LlmClient, ScriptedProvider};
    use tower::ServiceExt;

    /// Echoes the question back, or fails when it contains "fail".
    struct EchoAgent;

    #[async_trait::async_trait]
    impl Agent for EchoAgent {
        async fn run(
            &self,
            input: &str,
            memory: &[Message],
            events: Option<&mpsc::Sender<AgentStreamEvent>>,
        ) -> Result<AgentRun, AgentError> {
            if input.contains("fail") {
                return Err(AgentError::Provider(ProviderError::Network(
                    "connection reset".into(),
                )));
            }
            if let Some(tx) = events {
                let _ = tx
                    .send(AgentStreamEvent::Thought {
                        content: format!("{} turns remembered", memory.len()),
                    })
                    .await;
            }
            Ok(AgentRun {
                answer: format!("echo: {input}"),
                trace: Vec::new(),
                iterations: 1,
                tool_calls_made: 0,
            })
        }
    }

    fn test_state_with(config: AppConfig) -> SharedApiState {
        let tools = vec![ToolDefinition {
            name: "Calculator".into(),
            description: "Evaluates arithmetic".into(),
            parameters: serde_json::json!({}),
        }];
        Arc::new(ApiV1State::new(Arc::new(EchoAgent), tools, config))
    }

    fn test_state() -> SharedApiState {
        test_state_with(AppConfig::default())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn create_session(state: &SharedApiState) -> String {
        let req = Request::builder()
            .method("POST")
            .uri("/sessions")
            .body(Body::empty())
            .unwrap();
        let response = v1_router(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn new_session_starts_with_welcome() {
        let state = test_state();
        let req = Request::builder()
            .method("POST")
            .uri("/sessions")
            .body(Body::empty())
            .unwrap();
        let response = v1_router(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "assistant");
        assert_eq!(messages[0]["content"], UiConfig::default().welcome_message);
        assert_eq!(state.session_count().await, 1);
    }

    #[tokio::test]
    async fn send_message_records_both_turns() {
        let state = test_state();
        let id = create_session(&state).await;

        let response = v1_router(state.clone())
            .oneshot(post_json(
                &format!("/sessions/{id}/messages"),
                serde_json::json!({"message": "Solve 2x+3=7"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["response"], "echo: Solve 2x+3=7");
        assert_eq!(json["success"], true);

        let response = v1_router(state.clone())
            .oneshot(get_req(&format!("/sessions/{id}")))
            .await
            .unwrap();
        let json = body_json(response).await;
        let roles: Vec<_> = json["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, vec!["assistant", "user", "assistant"]);
    }

    #[tokio::test]
    async fn agent_failure_is_a_normal_reply() {
        let state = test_state();
        let id = create_session(&state).await;

        let response = v1_router(state.clone())
            .oneshot(post_json(
                &format!("/sessions/{id}/messages"),
                serde_json::json!({"message": "please fail"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["response"], "An error occurred: Network error: connection reset");
    }

    #[tokio::test]
    async fn blank_message_rejected() {
        let state = test_state();
        let id = create_session(&state).await;
        let response = v1_router(state)
            .oneshot(post_json(
                &format!("/sessions/{id}/messages"),
                serde_json::json!({"message": "   "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let state = test_state();
        let response = v1_router(state.clone())
            .oneshot(get_req("/sessions/nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = v1_router(state)
            .oneshot(post_json("/sessions/nope/messages", serde_json::json!({"message": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn clear_resets_history_and_memory() {
        let state = test_state();
        let id = create_session(&state).await;
        v1_router(state.clone())
            .oneshot(post_json(
                &format!("/sessions/{id}/messages"),
                serde_json::json!({"message": "a = 3"}),
            ))
            .await
            .unwrap();

        let response = v1_router(state.clone())
            .oneshot(post_json(&format!("/sessions/{id}/clear"), serde_json::json!({})))
            .await
            .unwrap();
        let json = body_json(response).await;
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["content"], UiConfig::default().clear_message);

        let response = v1_router(state)
            .oneshot(get_req(&format!("/sessions/{id}/memory")))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["count"], 0);
    }

    #[tokio::test]
    async fn memory_view_lists_turns() {
        let state = test_state();
        let id = create_session(&state).await;
        v1_router(state.clone())
            .oneshot(post_json(
                &format!("/sessions/{id}/messages"),
                serde_json::json!({"message": "Find the derivative of f(x) = x³ - 4x² + 7x - 9"}),
            ))
            .await
            .unwrap();

        let response = v1_router(state)
            .oneshot(get_req(&format!("/sessions/{id}/memory")))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["window_size"], 10);
        assert_eq!(json["count"], 2);
        assert_eq!(json["turns"][0]["role"], "user");
        assert_eq!(json["turns"][0]["recent"], true);
        assert!(json["turns"][0]["preview"].as_str().unwrap().ends_with("..."));
        assert!(json["lines"][1].as_str().unwrap().starts_with("✓ assistant: echo:"));
    }

    #[tokio::test]
    async fn delete_session() {
        let state = test_state();
        let id = create_session(&state).await;

        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/sessions/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = v1_router(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.session_count().await, 0);

        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/sessions/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = v1_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn session_map_is_bounded() {
        let mut config = AppConfig::default();
        config.gateway.max_sessions = 2;
        let state = test_state_with(config);

        let first = create_session(&state).await;
        let _second = create_session(&state).await;
        let _third = create_session(&state).await;

        assert_eq!(state.session_count().await, 2);
        let response = v1_router(state)
            .oneshot(get_req(&format!("/sessions/{first}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn eviction_spares_recently_used_session() {
        let mut config = AppConfig::default();
        config.gateway.max_sessions = 2;
        let state = test_state_with(config);

        let first = create_session(&state).await;
        let second = create_session(&state).await;
        let response = v1_router(state.clone())
            .oneshot(get_req(&format!("/sessions/{first}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let _third = create_session(&state).await;

        assert_eq!(state.session_count().await, 2);
        let response = v1_router(state.clone())
            .oneshot(get_req(&format!("/sessions/{first}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let response = v1_router(state)
            .oneshot(get_req(&format!("/sessions/{second}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let state = test_state();
        let a = create_session(&state).await;
        let b = create_session(&state).await;
        v1_router(state.clone())
            .oneshot(post_json(
                &format!("/sessions/{a}/messages"),
                serde_json::json!({"message": "only in a"}),
            ))
            .await
            .unwrap();

        let response = v1_router(state)
            .oneshot(get_req(&format!("/sessions/{b}/memory")))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["count"], 0);
    }

    #[tokio::test]
    async fn stream_ends_with_done() {
        let state = test_state();
        let id = create_session(&state).await;

        let response = v1_router(state)
            .oneshot(post_json(
                &format!("/sessions/{id}/messages/stream"),
                serde_json::json!({"message": "2+2"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/event-stream"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("event: thought"));
        let done_at = text.find("event: done").unwrap();
        assert!(text[done_at..].contains(r#""success":true"#));
    }

    #[tokio::test]
    async fn ui_and_tools() {
        let state = test_state();
        let response = v1_router(state.clone()).oneshot(get_req("/ui")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["title"], "Advanced Math Problem Solver");
        assert_eq!(json["domains"].as_array().unwrap().len(), 12);
        assert_eq!(json["example_problems"].as_array().unwrap().len(), 4);

        let response = v1_router(state).oneshot(get_req("/tools")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["tools"][0]["name"], "Calculator");
    }

    #[tokio::test]
    async fn works_with_the_react_agent() {
        let provider = Arc::new(ScriptedProvider::texts([
            "Thought: compute it\nAction: Calculator\nAction Input: 2*x where x = 2",
            "Final Answer: x = 2",
        ]));
        let mut tools = ToolRegistry::new();
        tools
            .register(Box::new(mathwise_tools::CalculatorTool::new()))
            .unwrap();
        let config = AppConfig::default();
        let agent = ReactAgent::new(
            LlmClient::new(provider, "mock-model"),
            Arc::new(tools),
            config.agent_config(),
        );
        let defs = agent.tools().definitions();
        let state = Arc::new(ApiV1State::new(Arc::new(agent), defs, config));
        let id = create_session(&state).await;

        let response = v1_router(state)
            .oneshot(post_json(
                &format!("/sessions/{id}/messages"),
                serde_json::json!({"message": "Solve 2x+3=7"}),
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["response"], "x = 2");
        assert_eq!(json["success"], true);
    }
}
