//! Stateless HTTP surface. The caller owns all session state and resends
//! context, history and behavior on every request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_macros::debug_handler;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::provider::ProviderError;
use crate::store::{BehaviorStore, PromptStore, StoreError};
use crate::turn::{TurnProcessor, CUSTOMER_GREETING};

#[derive(Clone)]
pub struct AppState {
    pub prompts: Arc<PromptStore>,
    pub behaviors: Arc<BehaviorStore>,
    pub turns: Arc<TurnProcessor>,
    pub polite_call_limit: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/get_total_scenarios", get(get_total_scenarios))
        .route("/api/start_call", post(start_call))
        .route("/api/send_message", post(send_message))
        .with_state(state)
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        // Running out of unused scenarios is an expected end-of-content
        // state, not a data error.
        let status = match e {
            StoreError::ScenariosExhausted => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

#[derive(Serialize)]
struct TotalScenariosResponse {
    total: usize,
}

#[derive(Deserialize)]
struct StartCallRequest {
    #[serde(default, rename = "usedScenarios")]
    used_scenarios: Vec<String>,
}

#[derive(Debug, Serialize)]
struct StartCallResponse {
    context: String,
    #[serde(rename = "customerGreeting")]
    customer_greeting: &'static str,
    #[serde(rename = "selectedScenario")]
    selected_scenario: String,
    behavior: String,
    #[serde(rename = "behaviorType")]
    behavior_type: &'static str,
}

#[derive(Deserialize)]
struct SendMessageRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    context: String,
    #[serde(default, rename = "chatHistory")]
    chat_history: String,
    #[serde(default)]
    behavior: String,
}

#[derive(Debug, Serialize)]
struct SendMessageResponse {
    response: String,
}

#[debug_handler]
async fn get_total_scenarios(State(state): State<AppState>) -> Json<TotalScenariosResponse> {
    Json(TotalScenariosResponse {
        total: state.prompts.total(),
    })
}

#[debug_handler]
async fn start_call(
    State(state): State<AppState>,
    Json(request): Json<StartCallRequest>,
) -> Result<Json<StartCallResponse>, ApiError> {
    // The number of scenarios already played doubles as the call index.
    let call_index = request.used_scenarios.len();

    let behavior = state
        .behaviors
        .for_call(call_index, state.polite_call_limit)?;

    let title = state.prompts.select_scenario(&request.used_scenarios)?;
    let record = state
        .prompts
        .lookup(title)
        .ok_or_else(|| ApiError::from(StoreError::ScenarioNotFound(title.to_string())))?;

    info!(
        "Starting call {} with scenario '{}' as {}",
        call_index, record.title, behavior.behavior_type
    );

    Ok(Json(StartCallResponse {
        context: record.render_context(),
        customer_greeting: CUSTOMER_GREETING,
        selected_scenario: record.title.clone(),
        behavior: behavior.behavior.clone(),
        behavior_type: behavior.behavior_type.as_str(),
    }))
}

#[debug_handler]
async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let reply = state
        .turns
        .process_turn(
            &request.context,
            Some(&request.behavior),
            &request.chat_history,
            &request.message,
        )
        .await?;

    Ok(Json(SendMessageResponse { response: reply }))
}
