//! Pulling the identity token and request id out of an HTTP request.
//!
//! Nothing here decides anything. The token comes back as the raw string the
//! client sent; [`RoleGate`](crate::RoleGate) and
//! [`TokenDecoder`](crate::TokenDecoder) judge it.

use axum::http::{header, HeaderMap, HeaderValue};
use uuid::Uuid;

/// Cookie holding the session token.
pub const SESSION_COOKIE: &str = "session";

/// Fallback cookie consulted when there is no session cookie.
pub const IDENTITY_COOKIE: &str = "identity";

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// The identity token of a request, if it carries one.
///
/// Sources, in order: the `session` cookie, the `identity` cookie, then an
/// `Authorization: Bearer` header. Cookie values are percent-decoded.
pub fn identity_token(headers: &HeaderMap) -> Option<String> {
    cookie(headers, SESSION_COOKIE)
        .or_else(|| cookie(headers, IDENTITY_COOKIE))
        .or_else(|| bearer(headers))
}

/// Value of the named cookie across all `Cookie` headers.
pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
        .map(|value| {
            urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// The client's request id if it is usable, otherwise a fresh UUID v4.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| is_sane_request_id(id))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn is_sane_request_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

/// Header value for an id produced by [`request_id`].
pub(crate) fn request_id_value(id: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(id).ok()
}
