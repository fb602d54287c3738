use crate::agent::RelayAgent;
use crate::cli::Args;
use crate::error::RelayError;
use crate::models::response::ResponseEnvelope;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ State, Query },
    response::IntoResponse,
    http::StatusCode,
};
use serde::{ Deserialize, Serialize };
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn, error };

#[derive(Deserialize)]
pub struct ChatRequest {
    pub query: Option<String>,
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    conversation_id: String,
    response: ResponseEnvelope,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    conversations: usize,
}

#[derive(Clone)]
struct AppState {
    agent: Arc<RelayAgent>,
}

pub async fn start_http_server(
    addr: &str,
    agent: Arc<RelayAgent>,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;

    let app_state = AppState { agent };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/chat", post(chat_post_handler).get(chat_get_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(app_state);

    if args.enable_tls && args.tls_cert_path.is_some() && args.tls_key_path.is_some() {
        let cert_path = args.tls_cert_path.as_ref().unwrap();
        let key_path = args.tls_key_path.as_ref().unwrap();

        let tls_config = axum_server::tls_rustls::RustlsConfig
            ::from_pem_file(cert_path, key_path).await?;

        info!("Starting HTTPS server on: https://{}", addr);
        axum_server
            ::bind_rustls(addr, tls_config)
            .serve(app.into_make_service()).await?;
    } else {
        info!("Starting HTTP server on: http://{}", addr);
        let listener = tokio::net::TcpListener
            ::bind(addr).await
            .map_err(|e|
                format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e)
            )?;
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

async fn chat_post_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>
) -> impl IntoResponse {
    chat_exchange(&state, req).await
}

async fn chat_get_handler(
    State(state): State<AppState>,
    Query(req): Query<ChatRequest>
) -> impl IntoResponse {
    chat_exchange(&state, req).await
}

async fn chat_exchange(state: &AppState, req: ChatRequest) -> axum::response::Response {
    let query = req.query.unwrap_or_default();

    match state.agent.handle(&query, req.conversation_id.as_deref()).await {
        Ok((conversation_id, response)) =>
            (
                StatusCode::OK,
                Json(ChatResponse {
                    conversation_id,
                    response,
                }),
            ).into_response(),
        Err(e) => {
            let status = match &e {
                RelayError::InvalidInput => StatusCode::BAD_REQUEST,
                RelayError::Completion(_) => StatusCode::BAD_GATEWAY,
                RelayError::ConversationNotFound(_) | RelayError::Prompt(_) =>
                    StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!("Chat exchange failed: {}", e);
            } else {
                warn!("Chat exchange rejected: {}", e);
            }
            (status, Json(ErrorResponse { error: e.to_string() })).into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        conversations: state.agent.conversation_count().await,
    })
}
