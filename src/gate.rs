use serde::Serialize;

use crate::{
    error::{Violation, ViolationKind},
    identity::{Identity, Role, TokenDecoder},
    policy::{self, LOGIN_PATH, ROOT_PATH},
    state::{RoleDerived, Start, TokenDecoded},
};

/// Outcome of gating one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "path")]
pub enum AuthorizationDecision {
    /// The request may reach the application shell
    Allow,
    /// The request must be redirected to the given path
    RedirectTo(String),
}

impl AuthorizationDecision {
    /// Returns `true` for [`AuthorizationDecision::Allow`].
    pub fn is_allow(&self) -> bool {
        matches!(self, AuthorizationDecision::Allow)
    }

    /// Redirect target, if the request was turned away.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            AuthorizationDecision::Allow => None,
            AuthorizationDecision::RedirectTo(path) => Some(path),
        }
    }

    fn redirect(path: &str) -> Self {
        AuthorizationDecision::RedirectTo(path.to_string())
    }
}

/// Full result of a gate evaluation.
///
/// Carries the decision plus what the gate learned on the way, so the web
/// layer can log the violation and hand the identity to downstream handlers.
#[derive(Debug, Clone)]
pub struct Verdict {
    /// What to do with the request
    pub decision: AuthorizationDecision,
    /// Why the request was redirected, if it was
    pub violation: Option<Violation>,
    /// The decoded identity, if the token decoded
    pub identity: Option<Identity>,
    /// The normalised path the decision was made on
    pub path: String,
}

/// The role gate in front of the dashboard's page routes.
///
/// `RoleGate` decides, per request, whether the caller may reach the requested
/// page or must be redirected. Every failure is fail-closed: a missing or
/// undecodable token sends the caller to the login page, an unknown role to
/// the landing page, and a foreign role area to the caller's own home.
///
/// # Examples
///
/// ```
/// use campus_gate::{AuthorizationDecision, RoleGate};
///
/// let gate = RoleGate::default();
///
/// // No token: protected pages redirect to login, public pages pass.
/// assert_eq!(
///     gate.decide(None, "/admin/settings"),
///     AuthorizationDecision::RedirectTo("/auth/login".to_string())
/// );
/// assert_eq!(gate.decide(None, "/"), AuthorizationDecision::Allow);
///
/// // base64 of {"roles":["teacher"]}
/// let teacher = "eyJyb2xlcyI6WyJ0ZWFjaGVyIl19";
/// assert_eq!(
///     gate.decide(Some(teacher), "/admin/settings"),
///     AuthorizationDecision::RedirectTo("/teacher".to_string())
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoleGate {
    decoder: TokenDecoder,
}

impl RoleGate {
    /// Creates a gate that decodes tokens with `decoder`.
    pub fn new(decoder: TokenDecoder) -> Self {
        Self { decoder }
    }

    /// Decides whether a request for `requested_path` may proceed.
    pub fn decide(&self, token: Option<&str>, requested_path: &str) -> AuthorizationDecision {
        self.evaluate(token, requested_path).decision
    }

    /// Runs the full evaluation and returns the decision with its context.
    pub fn evaluate(&self, token: Option<&str>, requested_path: &str) -> Verdict {
        let start = Evaluation::start(requested_path);

        let decoded = match start.decode(&self.decoder, token) {
            Ok(next) => next,
            Err(verdict) => return verdict,
        };
        let derived = match decoded.derive_role() {
            Ok(next) => next,
            Err(verdict) => return verdict,
        };
        derived.decide()
    }
}

/// One in-flight evaluation, parameterised by how far it has progressed.
struct Evaluation<S> {
    path: String,
    identity: Option<Identity>,
    role: Option<Role>,
    _state: S,
}

impl Evaluation<Start> {
    fn start(requested_path: &str) -> Self {
        Self {
            path: policy::normalize_path(requested_path),
            identity: None,
            role: None,
            _state: Start::new(),
        }
    }

    /// Step 1: no token or an undecodable token is unauthenticated.
    fn decode(
        self,
        decoder: &TokenDecoder,
        token: Option<&str>,
    ) -> Result<Evaluation<TokenDecoded>, Verdict> {
        let decoded = match token {
            Some(raw) => decoder.decode(raw),
            None => Err(crate::identity::DecodeError::MissingToken),
        };

        match decoded {
            Ok(identity) => Ok(Evaluation {
                path: self.path,
                identity: Some(identity),
                role: None,
                _state: TokenDecoded::new(),
            }),
            Err(err) => {
                if policy::is_public(&self.path) {
                    return Err(self.allow());
                }
                let violation = Violation::new(ViolationKind::Unauthenticated, err.to_string());
                Err(self.redirect(LOGIN_PATH, violation))
            }
        }
    }
}

impl Evaluation<TokenDecoded> {
    /// Step 2: the primary role must be a known role.
    fn derive_role(self) -> Result<Evaluation<RoleDerived>, Verdict> {
        let role = self.identity.as_ref().and_then(Identity::role);

        match role {
            Some(role) => Ok(Evaluation {
                path: self.path,
                identity: self.identity,
                role: Some(role),
                _state: RoleDerived::new(),
            }),
            None => {
                // The landing page is the fail-closed target; sending it to
                // itself would loop.
                if self.path == ROOT_PATH {
                    return Err(self.allow());
                }
                let name = self
                    .identity
                    .as_ref()
                    .map(Identity::primary_role_name)
                    .unwrap_or_default();
                let violation = Violation::new(
                    ViolationKind::UnknownRole,
                    format!("role '{name}' is not a dashboard role"),
                );
                Err(self.redirect(ROOT_PATH, violation))
            }
        }
    }
}

impl Evaluation<RoleDerived> {
    /// Steps 3 to 5: root goes home, foreign areas go home, the rest passes.
    fn decide(self) -> Verdict {
        let Some(role) = self.role else {
            // Unreachable through `derive_role`; stay closed regardless.
            let violation = Violation::new(ViolationKind::UnknownRole, "role missing");
            return self.redirect(ROOT_PATH, violation);
        };

        if self.path == ROOT_PATH {
            return self.redirect_home(role, None);
        }

        if let Some(area) = policy::area_for(&self.path) {
            if area.role != role {
                let violation = Violation::new(
                    ViolationKind::WrongArea { area: area.role },
                    format!("{role} requested {}", self.path),
                );
                return self.redirect_home(role, Some(violation));
            }
        }

        self.allow()
    }

    fn redirect_home(self, role: Role, violation: Option<Violation>) -> Verdict {
        Verdict {
            decision: AuthorizationDecision::redirect(role.home()),
            violation,
            identity: self.identity,
            path: self.path,
        }
    }
}

impl<S> Evaluation<S> {
    fn allow(self) -> Verdict {
        Verdict {
            decision: AuthorizationDecision::Allow,
            violation: None,
            identity: self.identity,
            path: self.path,
        }
    }

    fn redirect(self, target: &str, violation: Violation) -> Verdict {
        Verdict {
            decision: AuthorizationDecision::redirect(target),
            violation: Some(violation),
            identity: self.identity,
            path: self.path,
        }
    }
}
