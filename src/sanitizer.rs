use std::collections::HashSet;
use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::filter::{FieldSchema, FilterCondition, FilterOperator, FilterValue};
use crate::navigation::{NavigationResult, SiteRoute};
use crate::{Tainted, Verified};

/// Error returned when sanitization fails.
///
/// The message describes what was wrong with the shape of the input. It
/// never repeats the rejected text, so it can be logged as-is.
///
/// # Examples
///
/// ```
/// use campus_gate::{SanitizationError, SanitizationErrorKind};
///
/// let error = SanitizationError::new(SanitizationErrorKind::MalformedInput, "not JSON");
/// assert_eq!(error.kind(), SanitizationErrorKind::MalformedInput);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationError {
    kind: SanitizationErrorKind,
    message: String,
}

impl SanitizationError {
    /// Creates a new sanitization error.
    pub fn new(kind: SanitizationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SanitizationErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SanitizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sanitization failed ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for SanitizationError {}

/// Kind of sanitization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizationErrorKind {
    /// Input parsed but has the wrong shape.
    InvalidInput,
    /// Input names something outside what the caller may reach.
    ForbiddenPattern,
    /// Input is not JSON at all.
    MalformedInput,
    /// Input is empty or contains only whitespace.
    Empty,
    /// Input exceeds maximum allowed length.
    TooLong,
    /// Input contains control or non-printable characters.
    ContainsControlChars,
}

impl fmt::Display for SanitizationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid input"),
            Self::ForbiddenPattern => write!(f, "forbidden pattern"),
            Self::MalformedInput => write!(f, "malformed input"),
            Self::Empty => write!(f, "empty input"),
            Self::TooLong => write!(f, "input too long"),
            Self::ContainsControlChars => write!(f, "contains control characters"),
        }
    }
}

/// Turns tainted text into a verified value of type `Output`.
///
/// # Invariants
///
/// Implementations MUST:
/// - Validate the input completely before calling `Verified::new_unchecked`
/// - Return `Err(SanitizationError)` when nothing usable is left
/// - Not copy the rejected text into the error
pub trait Sanitizer {
    /// Type of the verified value.
    type Output;

    /// Sanitizes a tainted value, returning a verified value on success.
    ///
    /// # Errors
    ///
    /// Returns `SanitizationError` if the input fails validation.
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<Self::Output>, SanitizationError>;
}

/// Sanitizer for the free-text query a user typed or dictated.
///
/// - Collapses runs of whitespace (including newlines from dictation) to one space
/// - Rejects empty queries (after trimming)
/// - Rejects any other control or non-printable character
/// - Enforces a maximum length in characters
///
/// # Examples
///
/// ```
/// use campus_gate::{QuerySanitizer, Sanitizer, Tainted};
///
/// let sanitizer = QuerySanitizer::new(256);
/// let verified = sanitizer
///     .sanitize(Tainted::new("  students   whose\nfather is Singh ".to_string()))
///     .expect("valid query");
/// assert_eq!(verified.as_ref(), "students whose father is Singh");
///
/// assert!(sanitizer.sanitize(Tainted::new("   ".to_string())).is_err());
/// assert!(sanitizer.sanitize(Tainted::new("bell\u{7}".to_string())).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct QuerySanitizer {
    max_len: usize,
}

impl QuerySanitizer {
    /// Default maximum query length in characters.
    pub const DEFAULT_MAX_LEN: usize = 512;

    /// Creates a query sanitizer with the given maximum length.
    ///
    /// A `max_len` of zero is raised to one.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
        }
    }

    fn is_control_char(c: char) -> bool {
        c.is_control() || c == '\u{007F}'
    }
}

impl Default for QuerySanitizer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_LEN)
    }
}

impl Sanitizer for QuerySanitizer {
    type Output = String;

    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<String>, SanitizationError> {
        let raw = input.into_inner();
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

        if collapsed.is_empty() {
            return Err(SanitizationError::new(
                SanitizationErrorKind::Empty,
                "query is empty or contains only whitespace",
            ));
        }

        if collapsed.chars().any(Self::is_control_char) {
            return Err(SanitizationError::new(
                SanitizationErrorKind::ContainsControlChars,
                "query contains control or non-printable characters",
            ));
        }

        if collapsed.chars().count() > self.max_len {
            return Err(SanitizationError::new(
                SanitizationErrorKind::TooLong,
                format!("query exceeds maximum length of {}", self.max_len),
            ));
        }

        Ok(Verified::new_unchecked(collapsed))
    }
}

/// Strips a surrounding markdown code fence from an NLU reply.
///
/// Handles a leading fence with or without a language tag (```` ```json ````)
/// and an optional trailing fence. Text without a leading fence is only
/// trimmed.
///
/// # Examples
///
/// ```
/// use campus_gate::sanitizer::strip_code_fences;
///
/// assert_eq!(strip_code_fences("```json\n[]\n```"), "[]");
/// assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
/// assert_eq!(strip_code_fences("  []  "), "[]");
/// ```
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // A word glued to the opening fence is the language tag.
    let body = body.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim()
}

/// Strips fences and parses the remainder as JSON.
fn parse_reply(reply: &str) -> Result<Value, SanitizationError> {
    let body = strip_code_fences(reply);
    if body.is_empty() {
        return Err(SanitizationError::new(
            SanitizationErrorKind::Empty,
            "reply is empty",
        ));
    }
    serde_json::from_str(body).map_err(|e| {
        SanitizationError::new(
            SanitizationErrorKind::MalformedInput,
            format!("reply is not JSON (line {}, column {})", e.line(), e.column()),
        )
    })
}

/// Whitelist filter between an NLU reply and a table's query executor.
///
/// The reply must be a JSON array. Each element must be an object with a
/// `field` that is exactly one of the schema's accessor keys, an `operator`
/// of `equals` or `contains`, and a non-empty string or a number as `value`.
/// Elements that fail are dropped; the rest keep their order.
#[derive(Debug, Clone, Copy)]
pub struct FilterSanitizer<'a> {
    schema: &'a FieldSchema,
}

impl<'a> FilterSanitizer<'a> {
    /// Creates a sanitizer admitting only fields of `schema`.
    pub fn new(schema: &'a FieldSchema) -> Self {
        Self { schema }
    }

    fn condition(&self, element: &Value) -> Option<FilterCondition> {
        let object = element.as_object()?;

        let field = object.get("field")?.as_str()?;
        if !self.schema.contains(field) {
            return None;
        }

        let operator: FilterOperator = object.get("operator")?.as_str()?.parse().ok()?;

        let value = match object.get("value")? {
            Value::String(s) if !s.trim().is_empty() => FilterValue::Text(s.clone()),
            Value::Number(n) => FilterValue::Number(n.clone()),
            _ => return None,
        };

        Some(FilterCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }
}

impl Sanitizer for FilterSanitizer<'_> {
    type Output = Vec<FilterCondition>;

    fn sanitize(
        &self,
        input: Tainted<String>,
    ) -> Result<Verified<Vec<FilterCondition>>, SanitizationError> {
        let parsed = parse_reply(&input.into_inner())?;

        let Value::Array(elements) = parsed else {
            return Err(SanitizationError::new(
                SanitizationErrorKind::InvalidInput,
                "expected a JSON array of conditions",
            ));
        };

        let total = elements.len();
        let conditions: Vec<FilterCondition> =
            elements.iter().filter_map(|e| self.condition(e)).collect();

        if conditions.len() < total {
            debug!(
                dropped = total - conditions.len(),
                kept = conditions.len(),
                "dropped filter conditions outside the schema"
            );
        }

        Ok(Verified::new_unchecked(conditions))
    }
}

/// Local enforcement of the role partition on a navigation reply.
///
/// The reply must be `{}` or `{"route": "<path>"}` where the path is one of
/// the partition's paths. A `null` or blank route counts as `{}`. Any other
/// key, a non-string route, or a path outside the partition is rejected.
#[derive(Debug, Clone)]
pub struct RouteSanitizer<'a> {
    allowed: HashSet<&'a str>,
}

impl<'a> RouteSanitizer<'a> {
    /// Creates a sanitizer admitting only the paths of `partition`.
    pub fn new(partition: impl IntoIterator<Item = &'a SiteRoute>) -> Self {
        Self {
            allowed: partition.into_iter().map(|r| r.path.as_str()).collect(),
        }
    }
}

impl Sanitizer for RouteSanitizer<'_> {
    type Output = NavigationResult;

    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<NavigationResult>, SanitizationError> {
        let parsed = parse_reply(&input.into_inner())?;

        let Value::Object(object) = parsed else {
            return Err(SanitizationError::new(
                SanitizationErrorKind::InvalidInput,
                "expected a JSON object",
            ));
        };

        if object.keys().any(|k| k != "route") {
            return Err(SanitizationError::new(
                SanitizationErrorKind::InvalidInput,
                "reply has keys other than 'route'",
            ));
        }

        let path = match object.get("route") {
            None | Some(Value::Null) => return Ok(Verified::new_unchecked(NavigationResult::none())),
            Some(Value::String(path)) => path.trim(),
            Some(_) => {
                return Err(SanitizationError::new(
                    SanitizationErrorKind::InvalidInput,
                    "'route' is not a string",
                ))
            }
        };

        if path.is_empty() {
            return Ok(Verified::new_unchecked(NavigationResult::none()));
        }

        match self.allowed.get(path) {
            Some(allowed) => Ok(Verified::new_unchecked(NavigationResult::to(*allowed))),
            None => Err(SanitizationError::new(
                SanitizationErrorKind::ForbiddenPattern,
                "route is outside the caller's role partition",
            )),
        }
    }
}
