//! Agent session - voice assistant conversation service
//!
//! A Rust backend driving one voice/text conversation with a remote
//! multi-agent assistant through a pure state machine.

mod agent;
mod api;
mod config;
mod runtime;
mod scheduler;
mod state_machine;

use agent::HttpAgentClient;
use api::{create_router, AppState};
use config::Config;
use runtime::{ConversationRuntime, InMemoryCalendar, ProductionRuntime, RelaySpeechRecognizer};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_session=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env()?;

    let agent = HttpAgentClient::new(&config.agent_endpoint, config.request_timeout)?;
    tracing::info!(endpoint = %config.agent_endpoint, "Agent client initialized");

    let calendar = match &config.calendar_events_path {
        Some(path) => {
            let calendar = InMemoryCalendar::load(path)?;
            tracing::info!(path = %path.display(), "Calendar loaded");
            calendar
        }
        None => {
            tracing::warn!("No CALENDAR_EVENTS_PATH set, requests carry no calendar events");
            InMemoryCalendar::new(Vec::new())
        }
    };

    // The UI asks for microphone access and reports the outcome
    let speech = Arc::new(RelaySpeechRecognizer::new(false));

    let (runtime, conversation): (ProductionRuntime, _) =
        ConversationRuntime::new(config.conv_context(), agent, speech.clone(), calendar);
    let runtime = runtime.with_calendar_window(config.calendar_window_days);
    let runtime_task = tokio::spawn(runtime.run());

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(conversation.clone(), speech))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Agent session server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    conversation.shutdown();
    runtime_task.await?;

    Ok(())
}
