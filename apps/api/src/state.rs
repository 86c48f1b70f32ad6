use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::AuthProvider;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::matching::scorer::CompatibilityScorer;
use crate::realtime::ChangeFeed;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    /// Session verification and the signup/login proxies. Default: SupabaseAuth.
    pub auth: Arc<dyn AuthProvider>,
    pub config: Config,
    /// Pluggable compatibility scorer. Default: HeuristicScorer.
    pub scorer: Arc<dyn CompatibilityScorer>,
    /// Request inserts relayed from Postgres `NOTIFY`.
    pub feed: ChangeFeed,
}
