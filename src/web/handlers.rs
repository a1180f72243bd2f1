//! JSON endpoints and page handlers.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::Instrument;

use crate::filter::{FieldSchema, FilterCondition};
use crate::identity::{normalize_role_name, Identity};
use crate::logging::RequestLog;
use crate::navigation::{NavigationResult, SiteRoute};
use crate::sanitizer::{SanitizationErrorKind, Sanitizer};
use crate::Tainted;

use super::extract;
use super::AppState;

/// Body of `POST /filter-translate`.
#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    /// Free-text request
    pub query: String,
    /// Fields the conditions may refer to
    pub schema: FieldSchema,
}

/// Body of `POST /navigate-translate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateRequest {
    /// Free-text request
    pub query: String,
    /// The caller's full route catalog
    pub routes: Vec<SiteRoute>,
    /// Role the caller claims to hold
    pub user_role: String,
}

/// Errors surfaced to API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body is missing fields or breaks an invariant
    #[error("{0}")]
    Validation(String),
    /// The navigation NLU could not be reached
    #[error("navigation service unavailable")]
    NluUnavailable,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NluUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

fn clean_query(state: &AppState, raw: String) -> Result<String, ApiError> {
    state
        .queries()
        .sanitize(Tainted::new(raw))
        .map(|verified| verified.into_inner())
        .map_err(|err| match err.kind() {
            SanitizationErrorKind::Empty => ApiError::Validation("query is required".to_string()),
            _ => ApiError::Validation(err.message().to_string()),
        })
}

/// `POST /filter-translate`: free text to validated filter conditions.
///
/// Only body problems are errors. Every translation failure is an empty list.
pub async fn filter_translate(
    State(state): State<AppState>,
    Extension(log): Extension<RequestLog>,
    payload: Result<Json<FilterRequest>, JsonRejection>,
) -> Result<Json<Vec<FilterCondition>>, ApiError> {
    let Json(body) = payload.inspect_err(|e| log.info(format_args!("bad filter request: {e}")))?;
    let query = clean_query(&state, body.query)?;

    let conditions = state
        .filters()
        .translate(&query, &body.schema)
        .instrument(log.span("filter-translate"))
        .await;

    log.info(format_args!(
        "filter-translate over {} fields produced {} conditions",
        body.schema.fields().len(),
        conditions.len()
    ));
    Ok(Json(conditions))
}

/// `POST /navigate-translate`: free text to at most one route of the
/// caller's role.
///
/// A decodable identity token on the request outranks `userRole`.
pub async fn navigate_translate(
    State(state): State<AppState>,
    Extension(log): Extension<RequestLog>,
    headers: HeaderMap,
    payload: Result<Json<NavigateRequest>, JsonRejection>,
) -> Result<Json<NavigationResult>, ApiError> {
    let Json(body) =
        payload.inspect_err(|e| log.info(format_args!("bad navigation request: {e}")))?;
    if body.user_role.trim().is_empty() {
        return Err(ApiError::Validation("userRole is required".to_string()));
    }
    let query = clean_query(&state, body.query)?;

    let role = match bound_identity(&state, &headers) {
        Some(identity) => {
            let bound = identity.primary_role_name();
            if bound != normalize_role_name(&body.user_role) {
                log.warn(format_args!(
                    "userRole '{}' does not match token role '{bound}'; using the token",
                    body.user_role
                ));
            }
            bound
        }
        None => body.user_role,
    };

    let result = state
        .navigator()
        .try_resolve(&query, &body.routes, &role)
        .instrument(log.span("navigate-translate"))
        .await
        .map_err(|_| ApiError::NluUnavailable)?;

    log.info(format_args!(
        "navigate-translate for {role} resolved {:?}",
        result.route()
    ));
    Ok(Json(result))
}

fn bound_identity(state: &AppState, headers: &HeaderMap) -> Option<Identity> {
    let token = extract::identity_token(headers)?;
    state.decoder().decode(&token).ok()
}

/// `GET /healthz`
pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Minimal application shell for every gated page.
pub async fn shell(request: Request) -> Html<String> {
    let path = escape_html(request.uri().path());
    let who = request
        .extensions()
        .get::<Identity>()
        .map(|identity| {
            format!(
                "<p>Signed in as {} ({})</p>",
                escape_html(identity.email()),
                escape_html(&identity.primary_role_name())
            )
        })
        .unwrap_or_default();

    Html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>School dashboard</title></head>\
         <body><main data-path=\"{path}\"><h1>{path}</h1>{who}</main></body></html>\n"
    ))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
