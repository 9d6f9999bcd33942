//! Parley - multimodal conversational backend
//!
//! A Rust backend that keeps per-thread conversation history and drives a
//! tool-using reasoning engine to answer multimodal chat turns.

mod api;
mod engine;
mod message;
mod projection;
mod session;
mod store;
mod system_prompt;
mod tools;

use api::{create_router, AppState};
use engine::{AgentEngine, GeminiClient, ReasoningEngine};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use store::{MemoryStore, SqliteStore, TranscriptStore};
use tools::ToolRegistry;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("PARLEY_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);

    let static_dir =
        PathBuf::from(std::env::var("PARLEY_STATIC_DIR").unwrap_or_else(|_| "dist".to_string()));

    let model =
        std::env::var("PARLEY_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());

    // Transcript storage: durable when a path is configured, otherwise
    // process-lifetime memory.
    let store: Arc<dyn TranscriptStore> = match std::env::var("PARLEY_DB_PATH").ok() {
        Some(db_path) => {
            if let Some(parent) = PathBuf::from(&db_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(path = %db_path, "Opening transcript database");
            Arc::new(SqliteStore::open(&db_path)?)
        }
        None => {
            tracing::info!("Using in-memory transcript store");
            Arc::new(MemoryStore::new())
        }
    };

    // Reasoning engine
    let api_key = std::env::var("GOOGLE_API_KEY")
        .or_else(|_| std::env::var("GEMINI_API_KEY"))
        .unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("No Gemini API key configured. Set GOOGLE_API_KEY or GEMINI_API_KEY.");
    }
    let llm = Arc::new(GeminiClient::new(api_key, model.clone())?);
    tracing::info!(model = %model, "Reasoning engine initialized");

    let engine: Arc<dyn ReasoningEngine> =
        Arc::new(AgentEngine::new(llm, ToolRegistry::new()));

    // Create application state
    let state = AppState::new(store, engine);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state, static_dir).layer(cors).layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Parley server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
