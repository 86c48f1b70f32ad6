mod auth;
mod config;
mod db;
mod errors;
mod events;
mod llm_client;
mod matching;
mod models;
mod profile;
mod realtime;
mod requests;
mod resume;
mod routes;
mod state;
mod teams;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::SupabaseAuth;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::matching::scorer::HeuristicScorer;
use crate::realtime::listener::spawn_pg_listener;
use crate::realtime::ChangeFeed;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TeamUp API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs embedded migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.gemini_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize auth platform client
    let auth = Arc::new(SupabaseAuth::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
    )?);
    info!("Auth provider initialized ({})", config.supabase_url);

    // Change feed for the notification stream, fed by Postgres NOTIFY
    let feed = ChangeFeed::new();
    spawn_pg_listener(db.clone(), feed.clone());

    let state = AppState {
        db,
        llm,
        auth,
        config: config.clone(),
        scorer: Arc::new(HeuristicScorer),
        feed,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
