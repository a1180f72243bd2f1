//! HTTP boundary: the axum router, role-gate middleware and JSON endpoints.
//!
//! Two kinds of routes live here:
//!
//! - **Page routes** (`/`, `/auth/login`, `/admin/**`, `/teacher/**`,
//!   `/student/**`) sit behind [`middleware::role_gate`] and serve a minimal
//!   application shell. A redirect decision is a `303 See Other`.
//! - **API routes** (`POST /filter-translate`, `POST /navigate-translate`,
//!   `GET /healthz`) are not gated. Their inputs are request bodies, sanitised
//!   before they reach a translator.
//!
//! Every route gets a request id ([`middleware::request_id`]) that tags its
//! log lines and is echoed in the `x-request-id` response header.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use campus_gate::web::{build_router, AppState};
//! use campus_gate::{HttpNlu, HttpNluConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let nlu = HttpNlu::new(HttpNluConfig {
//!     endpoint: "http://localhost:8080/v1/chat/completions".into(),
//!     model: "local".into(),
//!     api_key: None,
//!     timeout: std::time::Duration::from_secs(5),
//! })?;
//! let app = build_router(AppState::new(Arc::new(nlu)));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};

use crate::filter::SchemaFilterTranslator;
use crate::gate::RoleGate;
use crate::identity::TokenDecoder;
use crate::navigation::RoleAwareRouteResolver;
use crate::nlu::Nlu;
use crate::sanitizer::QuerySanitizer;

pub mod extract;
pub mod handlers;
pub mod middleware;

pub use extract::{identity_token, request_id, IDENTITY_COOKIE, REQUEST_ID_HEADER, SESSION_COOKIE};
pub use handlers::{ApiError, FilterRequest, NavigateRequest};

/// Shared state behind every route.
#[derive(Clone, Debug)]
pub struct AppState {
    decoder: TokenDecoder,
    gate: RoleGate,
    filters: SchemaFilterTranslator,
    navigator: RoleAwareRouteResolver,
    queries: QuerySanitizer,
}

impl AppState {
    /// State with unsigned tokens, the default NLU timeout and the default
    /// query length limit.
    pub fn new(nlu: Arc<dyn Nlu>) -> Self {
        let decoder = TokenDecoder::default();
        Self {
            gate: RoleGate::new(decoder.clone()),
            decoder,
            filters: SchemaFilterTranslator::new(nlu.clone()),
            navigator: RoleAwareRouteResolver::new(nlu),
            queries: QuerySanitizer::default(),
        }
    }

    /// Uses `decoder` both in the gate and for identity-bound navigation.
    pub fn with_decoder(mut self, decoder: TokenDecoder) -> Self {
        self.gate = RoleGate::new(decoder.clone());
        self.decoder = decoder;
        self
    }

    /// Bounds each NLU call of both translators.
    pub fn with_nlu_timeout(mut self, timeout: Duration) -> Self {
        self.filters = self.filters.with_timeout(timeout);
        self.navigator = self.navigator.with_timeout(timeout);
        self
    }

    /// Longest accepted query, in characters.
    pub fn with_max_query_len(mut self, max_len: usize) -> Self {
        self.queries = QuerySanitizer::new(max_len);
        self
    }

    pub(crate) fn gate(&self) -> &RoleGate {
        &self.gate
    }

    pub(crate) fn decoder(&self) -> &TokenDecoder {
        &self.decoder
    }

    pub(crate) fn filters(&self) -> &SchemaFilterTranslator {
        &self.filters
    }

    pub(crate) fn navigator(&self) -> &RoleAwareRouteResolver {
        &self.navigator
    }

    pub(crate) fn queries(&self) -> &QuerySanitizer {
        &self.queries
    }
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let pages = Router::new()
        .route("/", get(handlers::shell))
        .route("/auth/login", get(handlers::shell))
        .route("/admin", get(handlers::shell))
        .route("/admin/{*rest}", get(handlers::shell))
        .route("/teacher", get(handlers::shell))
        .route("/teacher/{*rest}", get(handlers::shell))
        .route("/student", get(handlers::shell))
        .route("/student/{*rest}", get(handlers::shell))
        .route_layer(from_fn_with_state(state.clone(), middleware::role_gate));

    Router::new()
        .route("/filter-translate", post(handlers::filter_translate))
        .route("/navigate-translate", post(handlers::navigate_translate))
        .route("/healthz", get(handlers::healthz))
        .merge(pages)
        .layer(from_fn(middleware::request_id))
        .with_state(state)
}
