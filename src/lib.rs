//! Role-gated natural-language commands for a school dashboard.
//!
//! Two untrusted inputs meet here: an opaque identity token and the free-text
//! reply of an external natural-language (NLU) service. Neither is acted on
//! before it is checked.
//!
//! - [`RoleGate`] decodes the token and decides, per page request, whether to
//!   allow it or where to redirect. Every failure is fail-closed.
//! - [`SchemaFilterTranslator`] turns a query plus a [`FieldSchema`] into
//!   [`FilterCondition`]s. Every failure yields no filters (fail-open to a
//!   no-op).
//! - [`RoleAwareRouteResolver`] turns a query into at most one route, drawn
//!   only from the caller's role partition of the catalog.
//!
//! NLU replies arrive as [`Tainted<String>`] and only the crate's
//! [`Sanitizer`]s can turn them into [`Verified`] values.
//!
//! # Core Types
//!
//! - [`Identity`], [`Role`], [`TokenDecoder`]: who is asking
//! - [`AuthorizationDecision`]: allow, or redirect to a path
//! - [`Tainted<T>`] / [`Verified<T>`]: untrusted and validated values
//! - [`Nlu`]: the external text-in, text-out capability
//! - [`Secret<T>`]: redacting wrapper for the provider API key
//!
//! # Examples
//!
//! ```
//! use campus_gate::{AuthorizationDecision, RoleGate};
//!
//! let gate = RoleGate::default();
//!
//! // base64 of {"roles":["student"]}
//! let student = "eyJyb2xlcyI6WyJzdHVkZW50Il19";
//!
//! assert_eq!(gate.decide(Some(student), "/student/grades"), AuthorizationDecision::Allow);
//! assert_eq!(
//!     gate.decide(Some(student), "/admin"),
//!     AuthorizationDecision::RedirectTo("/student".to_string())
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod error;
mod filter;
mod gate;
mod identity;
pub mod logging;
mod navigation;
pub mod nlu;
pub mod policy;
mod prompt;
pub mod sanitizer;
mod secret;
mod state;
mod tainted;
mod verified;
pub mod web;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use error::{Error, Violation, ViolationKind};
pub use filter::{
    FieldSchema, FieldSpec, FilterCondition, FilterOperator, FilterValue, SchemaError,
    SchemaFilterTranslator,
};
pub use gate::{AuthorizationDecision, RoleGate, Verdict};
pub use identity::{DecodeError, Identity, Role, TokenDecoder, TokenVerifier, UnknownRole, UnsignedTokens};
pub use navigation::{partition_for, NavigationResult, RoleAwareRouteResolver, SiteRoute};
pub use nlu::{HttpNlu, HttpNluConfig, Nlu, NluError};
pub use sanitizer::{QuerySanitizer, SanitizationError, SanitizationErrorKind, Sanitizer};
pub use secret::Secret;
pub use tainted::Tainted;
pub use verified::Verified;
