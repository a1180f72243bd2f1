//! Free text to a single page, restricted to the caller's role.
//!
//! Role containment is enforced twice. The NLU only ever sees the routes of
//! the caller's role, and whatever path it answers with is checked again
//! against that same partition before it is returned. A reply naming a route
//! from another role's area is discarded even if the NLU ignored its
//! instructions or the query tried to talk it into something else.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::identity::Role;
use crate::nlu::{self, Nlu, NluError};
use crate::prompt;
use crate::sanitizer::{RouteSanitizer, Sanitizer};

/// One page of the dashboard, as listed in the caller's route catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRoute {
    /// Path to navigate to
    pub path: String,
    /// Short page name
    pub name: String,
    /// What the page is for
    #[serde(default)]
    pub description: String,
    /// Role whose area the page belongs to
    pub role: Role,
}

impl SiteRoute {
    /// Creates a route entry.
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            description: description.into(),
            role,
        }
    }
}

/// Either exactly one resolved path or nothing.
///
/// Serialises as `{"route": "<path>"}` or `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    route: Option<String>,
}

impl NavigationResult {
    /// The empty result: no navigation happens.
    pub fn none() -> Self {
        Self { route: None }
    }

    pub(crate) fn to(path: impl Into<String>) -> Self {
        Self {
            route: Some(path.into()),
        }
    }

    /// The resolved path, if any.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Returns `true` if no route was resolved.
    pub fn is_none(&self) -> bool {
        self.route.is_none()
    }
}

/// Routes of `routes` that belong to `role`, in catalog order.
pub fn partition_for(routes: &[SiteRoute], role: Role) -> Vec<&SiteRoute> {
    routes.iter().filter(|r| r.role == role).collect()
}

/// Resolves navigation queries to a route inside the caller's role partition.
#[derive(Clone)]
pub struct RoleAwareRouteResolver {
    nlu: Arc<dyn Nlu>,
    timeout: Duration,
}

impl fmt::Debug for RoleAwareRouteResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleAwareRouteResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RoleAwareRouteResolver {
    /// Creates a resolver using the default NLU timeout.
    pub fn new(nlu: Arc<dyn Nlu>) -> Self {
        Self {
            nlu,
            timeout: nlu::DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the bound on each NLU call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolves `query` for a caller holding `role`.
    ///
    /// Any failure, including an unreachable NLU, yields the empty result;
    /// callers treat it as "stay where you are".
    pub async fn resolve(&self, query: &str, routes: &[SiteRoute], role: &str) -> NavigationResult {
        self.try_resolve(query, routes, role)
            .await
            .unwrap_or_default()
    }

    /// Like [`resolve`](Self::resolve), but reports transport failures.
    ///
    /// Only a failure to reach the NLU is an error. Unknown roles, empty
    /// partitions, malformed replies and out-of-partition paths all resolve to
    /// the empty result.
    ///
    /// # Errors
    ///
    /// Returns [`NluError`] when the NLU call fails or times out.
    pub async fn try_resolve(
        &self,
        query: &str,
        routes: &[SiteRoute],
        role: &str,
    ) -> Result<NavigationResult, NluError> {
        let role: Role = match role.parse() {
            Ok(role) => role,
            Err(err) => {
                debug!(error = %err, "no routes for an unknown role");
                return Ok(NavigationResult::none());
            }
        };

        let partition = partition_for(routes, role);
        if partition.is_empty() || query.trim().is_empty() {
            debug!(%role, "nothing to resolve against; no navigation");
            return Ok(NavigationResult::none());
        }

        let request = prompt::navigation_prompt(query, &partition);
        let reply = nlu::call_bounded(self.nlu.as_ref(), &request, self.timeout)
            .await
            .inspect_err(|err| error!(error = %err, %role, "navigation translation unavailable"))?;

        match RouteSanitizer::new(partition.iter().copied()).sanitize(reply) {
            Ok(result) => {
                let result = result.into_inner();
                debug!(%role, route = ?result.route(), "navigation resolved");
                Ok(result)
            }
            Err(err) => {
                warn!(error = %err, %role, "navigation reply discarded");
                Ok(NavigationResult::none())
            }
        }
    }
}
