//! Identity tokens and the roles they carry.
//!
//! A token is an opaque string lifted from a cookie or bearer header. It is
//! decoded in two attempts:
//!
//! 1. the whole string as base64-encoded JSON;
//! 2. the middle segment of a three-part `header.payload.signature` token,
//!    base64url-decoded as JSON.
//!
//! The first attempt that yields a usable payload wins.
//!
//! # Signatures
//!
//! Decoding does NOT verify any signature. Token content is trusted as-is
//! unless a [`TokenVerifier`] is installed on the [`TokenDecoder`]. The
//! default verifier, [`UnsignedTokens`], accepts everything. Deployments that
//! need authenticated identity must supply a verifier for their issuer.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);

/// Prefix some issuers put in front of role names (`ROLE_admin`).
const ROLE_PREFIX: &str = "role_";

/// Why a token could not be turned into an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No token was presented
    #[error("no identity token")]
    MissingToken,
    /// Neither the plain nor the compact format produced a JSON payload
    #[error("token is neither base64 JSON nor a compact token")]
    Malformed,
    /// The payload decoded but carries no role
    #[error("token carries no role")]
    MissingRole,
    /// A [`TokenVerifier`] refused the token
    #[error("token verification failed: {0}")]
    Rejected(String),
}

/// One of the three dashboard roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// School administrator
    Admin,
    /// Teaching staff
    Teacher,
    /// Enrolled student
    Student,
}

impl Role {
    /// All roles, in area-table order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Teacher, Role::Student];

    /// Lower-case wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Parses a role name, tolerating a `ROLE_` prefix and any letter case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = normalize_role_name(s);
        match name.as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            _ => Err(UnknownRole(name)),
        }
    }
}

/// Strips a `ROLE_` prefix (any case) and lower-cases the remainder.
///
/// Only that exact prefix is removed. Names such as `teacher_admin` keep
/// their full text and therefore never parse as a role.
pub fn normalize_role_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match lowered.strip_prefix(ROLE_PREFIX) {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}

/// Identity derived from a token for the lifetime of one request.
///
/// Construction guarantees a non-empty role sequence whose first entry is not
/// blank. The sequence is kept exactly as the token listed it, so the primary
/// role is always the first claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    email: String,
    roles: Vec<String>,
}

impl Identity {
    /// Creates an identity, rejecting an empty sequence or a blank first role.
    pub fn new(email: impl Into<String>, roles: Vec<String>) -> Result<Self, DecodeError> {
        match roles.first() {
            Some(primary) if !primary.trim().is_empty() => {}
            _ => return Err(DecodeError::MissingRole),
        }
        Ok(Self {
            email: email.into(),
            roles,
        })
    }

    /// Email claim, empty when the token did not carry one.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Raw role claims in token order.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Normalised name of the first role claim (`ROLE_admin` → `admin`).
    pub fn primary_role_name(&self) -> String {
        // `new` guarantees at least one role
        normalize_role_name(&self.roles[0])
    }

    /// The primary role, if it names one of the known roles.
    pub fn role(&self) -> Option<Role> {
        self.primary_role_name().parse().ok()
    }
}

/// Extension point for cryptographic token verification.
///
/// Runs on the raw token before its payload is decoded. Returning an error
/// makes the token undecodable, which every caller treats as unauthenticated.
pub trait TokenVerifier: Send + Sync {
    /// Checks the token's signature or claims.
    fn verify(&self, token: &str) -> Result<(), DecodeError>;
}

/// Verifier that accepts every token without checking a signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsignedTokens;

impl TokenVerifier for UnsignedTokens {
    fn verify(&self, _token: &str) -> Result<(), DecodeError> {
        Ok(())
    }
}

/// Decodes opaque identity tokens into [`Identity`] values.
///
/// Pure: no I/O, no shared mutable state. Safe to call from any task.
///
/// # Examples
///
/// ```
/// use campus_gate::{Role, TokenDecoder};
///
/// // base64 of {"email":"a@school.test","roles":["ROLE_admin"]}
/// let token = "eyJlbWFpbCI6ImFAc2Nob29sLnRlc3QiLCJyb2xlcyI6WyJST0xFX2FkbWluIl19";
/// let identity = TokenDecoder::default().decode(token).unwrap();
///
/// assert_eq!(identity.email(), "a@school.test");
/// assert_eq!(identity.role(), Some(Role::Admin));
/// ```
#[derive(Clone)]
pub struct TokenDecoder {
    verifier: Arc<dyn TokenVerifier>,
}

impl Default for TokenDecoder {
    fn default() -> Self {
        Self::with_verifier(UnsignedTokens)
    }
}

impl fmt::Debug for TokenDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenDecoder").finish_non_exhaustive()
    }
}

impl TokenDecoder {
    /// Creates a decoder that runs `verifier` before decoding.
    pub fn with_verifier(verifier: impl TokenVerifier + 'static) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    /// Decodes a token into an identity.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::MissingToken`] for an empty token
    /// - [`DecodeError::Rejected`] when the verifier refuses it
    /// - [`DecodeError::Malformed`] when neither format decodes
    /// - [`DecodeError::MissingRole`] when the payload has no role claim
    pub fn decode(&self, token: &str) -> Result<Identity, DecodeError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DecodeError::MissingToken);
        }

        self.verifier.verify(token)?;

        let claims = decode_plain(token)
            .or_else(|| decode_compact(token))
            .ok_or(DecodeError::Malformed)?;

        claims.into_identity()
    }
}

/// Token payload; tolerant of `roles` arriving as a list or a single string.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    roles: RolesClaim,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum RolesClaim {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl RolesClaim {
    fn into_vec(self) -> Vec<String> {
        match self {
            RolesClaim::None => vec![],
            RolesClaim::Single(s) => vec![s],
            RolesClaim::Multiple(v) => v,
        }
    }
}

impl TokenClaims {
    fn into_identity(self) -> Result<Identity, DecodeError> {
        let mut roles = self.roles.into_vec();
        if roles.is_empty() {
            roles.extend(self.role);
        }
        Identity::new(self.email.unwrap_or_default(), roles)
    }
}

/// Claims must be a JSON object; serde would otherwise also accept an array
/// in field order.
fn parse_claims(bytes: &[u8]) -> Option<TokenClaims> {
    match serde_json::from_slice::<Value>(bytes).ok()? {
        object @ Value::Object(_) => serde_json::from_value(object).ok(),
        _ => None,
    }
}

fn decode_plain(token: &str) -> Option<TokenClaims> {
    let bytes = STANDARD_LENIENT
        .decode(token)
        .or_else(|_| URL_SAFE_LENIENT.decode(token))
        .ok()?;
    parse_claims(&bytes)
}

fn decode_compact(token: &str) -> Option<TokenClaims> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || payload.is_empty() {
        return None;
    }
    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .ok()?;
    parse_claims(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{compact_token, plain_token};

    #[test]
    fn decodes_plain_base64_json() {
        let token = plain_token(r#"{"email":"t@school.test","roles":["teacher"]}"#);
        let identity = TokenDecoder::default().decode(&token).expect("decodes");

        assert_eq!(identity.email(), "t@school.test");
        assert_eq!(identity.roles(), ["teacher"]);
        assert_eq!(identity.role(), Some(Role::Teacher));
    }

    #[test]
    fn falls_back_to_compact_payload() {
        let token = compact_token(r#"{"email":"s@school.test","roles":["ROLE_student"]}"#);
        let identity = TokenDecoder::default().decode(&token).expect("decodes");

        assert_eq!(identity.role(), Some(Role::Student));
    }

    #[test]
    fn single_role_claim_is_accepted() {
        let token = plain_token(r#"{"email":"a@school.test","role":"ROLE_ADMIN"}"#);
        let identity = TokenDecoder::default().decode(&token).expect("decodes");

        assert_eq!(identity.primary_role_name(), "admin");
        assert_eq!(identity.role(), Some(Role::Admin));
    }

    #[test]
    fn primary_role_is_first_claim() {
        let token = plain_token(r#"{"roles":["ROLE_student","ROLE_admin"]}"#);
        let identity = TokenDecoder::default().decode(&token).expect("decodes");

        assert_eq!(identity.role(), Some(Role::Student));
        assert_eq!(identity.email(), "");
    }

    #[test]
    fn empty_roles_are_rejected() {
        let token = plain_token(r#"{"email":"x@school.test","roles":[]}"#);
        assert_eq!(
            TokenDecoder::default().decode(&token),
            Err(DecodeError::MissingRole)
        );

        let token = plain_token(r#"{"email":"x@school.test","roles":["  "]}"#);
        assert_eq!(
            TokenDecoder::default().decode(&token),
            Err(DecodeError::MissingRole)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let decoder = TokenDecoder::default();
        assert_eq!(decoder.decode("not a token"), Err(DecodeError::Malformed));
        assert_eq!(decoder.decode("a.b.c"), Err(DecodeError::Malformed));
        assert_eq!(decoder.decode("a.b.c.d"), Err(DecodeError::Malformed));
        assert_eq!(decoder.decode("   "), Err(DecodeError::MissingToken));
    }

    #[test]
    fn non_object_json_is_malformed() {
        let decoder = TokenDecoder::default();
        for payload in [
            r#"["admin"]"#,
            r#"["x@school.test", ["admin"]]"#,
            r#"["x@school.test", "admin", null]"#,
            r#""admin""#,
            "42",
        ] {
            assert_eq!(
                decoder.decode(&plain_token(payload)),
                Err(DecodeError::Malformed),
                "{payload}"
            );
            assert_eq!(
                decoder.decode(&compact_token(payload)),
                Err(DecodeError::Malformed),
                "{payload}"
            );
        }
    }

    #[test]
    fn blank_first_role_is_not_skipped() {
        let decoder = TokenDecoder::default();
        for claims in [
            r#"{"email":"x@school.test","roles":["", "admin"]}"#,
            r#"{"email":"x@school.test","roles":[" ", "student"]}"#,
        ] {
            assert_eq!(
                decoder.decode(&plain_token(claims)),
                Err(DecodeError::MissingRole),
                "{claims}"
            );
        }
    }

    #[test]
    fn role_sequence_is_kept_as_given() {
        let token = plain_token(r#"{"roles":["janitor","admin"]}"#);
        let identity = TokenDecoder::default().decode(&token).expect("decodes");

        assert_eq!(identity.roles(), ["janitor", "admin"]);
        assert_eq!(identity.role(), None);
    }

    #[test]
    fn verifier_rejection_blocks_decoding() {
        struct DenyAll;
        impl TokenVerifier for DenyAll {
            fn verify(&self, _token: &str) -> Result<(), DecodeError> {
                Err(DecodeError::Rejected("bad signature".to_string()))
            }
        }

        let token = plain_token(r#"{"roles":["admin"]}"#);
        let result = TokenDecoder::with_verifier(DenyAll).decode(&token);
        assert_eq!(
            result,
            Err(DecodeError::Rejected("bad signature".to_string()))
        );
    }

    #[test]
    fn role_parsing_strips_only_the_role_prefix() {
        assert_eq!("ROLE_teacher".parse::<Role>(), Ok(Role::Teacher));
        assert_eq!(" Student ".parse::<Role>(), Ok(Role::Student));
        assert!("teacher_admin".parse::<Role>().is_err());
        assert!("superadmin".parse::<Role>().is_err());
    }
}
