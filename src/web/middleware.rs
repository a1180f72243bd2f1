//! Request-scoped middleware: request ids and the role gate.
//!
//! ```text
//! HTTP request
//!   -> request_id   (RequestLog into extensions, x-request-id echoed)
//!   -> role_gate    (page routes only: 303 redirect or Identity into extensions)
//!   -> handler
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::logging::RequestLog;
use crate::Verdict;

use super::extract::{self, REQUEST_ID_HEADER};
use super::AppState;

/// Tags the request with a [`RequestLog`] and echoes its id on the response.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = extract::request_id(request.headers());
    let log = RequestLog::new(id.clone());
    log.debug(format_args!("{} {}", request.method(), request.uri().path()));
    request.extensions_mut().insert(log);

    let mut response = next.run(request).await;
    if let Some(value) = extract::request_id_value(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Runs [`RoleGate`](crate::RoleGate) in front of a page route.
///
/// A redirect decision ends the request with `303 See Other`. An allowed
/// request continues with the decoded [`Identity`](crate::Identity), if any,
/// in its extensions.
pub async fn role_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = extract::identity_token(request.headers());
    let verdict = state.gate().evaluate(token.as_deref(), request.uri().path());

    let log = request
        .extensions()
        .get::<RequestLog>()
        .cloned()
        .unwrap_or_else(|| RequestLog::new(extract::request_id(request.headers())));
    log_verdict(&log, &verdict);

    let Verdict {
        decision, identity, ..
    } = verdict;

    if let Some(target) = decision.redirect_target() {
        return Redirect::to(target).into_response();
    }

    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}

fn log_verdict(log: &RequestLog, verdict: &Verdict) {
    match (&verdict.violation, verdict.decision.redirect_target()) {
        (Some(violation), Some(target)) => log.info(format_args!(
            "gate redirected {} to {target}: {violation}",
            verdict.path
        )),
        (None, Some(target)) => {
            log.info(format_args!("gate sent {} home to {target}", verdict.path))
        }
        (_, None) => log.debug(format_args!("gate allowed {}", verdict.path)),
    }
}
