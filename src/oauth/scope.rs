//! Scope requirements and the per-route scope policy.
//!
//! [`ScopeRequirement`] expresses the scopes an operation needs;
//! [`ScopePolicy`] maps protected routes to requirements, with a default
//! applied to every guarded request.

use std::collections::{HashMap, HashSet};

use super::error::AuthError;
use super::token::AccessTokenContext;

/// A set of required scopes for an operation.
///
/// All scopes in the requirement must be present in the token for access
/// to be granted (AND semantics).
#[derive(Debug, Clone, Default)]
pub struct ScopeRequirement {
    required: HashSet<String>,
}

impl ScopeRequirement {
    /// Create an empty scope requirement (no scopes needed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope requirement from a single scope.
    pub fn one(scope: impl Into<String>) -> Self {
        let mut required = HashSet::new();
        required.insert(scope.into());
        Self { required }
    }

    /// Create a scope requirement from multiple scopes.
    pub fn all(scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            required: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a required scope to this requirement.
    pub fn require(mut self, scope: impl Into<String>) -> Self {
        self.required.insert(scope.into());
        self
    }

    /// Check if the given token context satisfies this requirement.
    ///
    /// Returns `Err(AuthError::InsufficientScope)` listing the full
    /// requirement when any scope is missing.
    pub fn check(&self, context: &AccessTokenContext) -> Result<(), AuthError> {
        if self.required.is_empty() {
            return Ok(());
        }

        if self.required.is_subset(&context.scopes) {
            Ok(())
        } else {
            Err(AuthError::InsufficientScope {
                required: self.required.iter().cloned().collect(),
            })
        }
    }

    /// Returns true if no scopes are required.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}

/// Policy mapping protected routes to their required scopes.
///
/// The default requirement applies to every guarded request; per-route
/// requirements are checked in addition for matching paths.
///
/// # Example
///
/// ```rust
/// use mcp_gateway::oauth::ScopePolicy;
///
/// let policy = ScopePolicy::new()
///     .default_scope("mcp:read")
///     .route_scope("/mcp/admin", "mcp:admin");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScopePolicy {
    default_scopes: ScopeRequirement,
    route_scopes: HashMap<String, ScopeRequirement>,
}

impl ScopePolicy {
    /// Create an empty scope policy (no scopes required for anything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default scope required for all guarded requests.
    pub fn default_scope(mut self, scope: impl Into<String>) -> Self {
        self.default_scopes = self.default_scopes.require(scope);
        self
    }

    /// Replace the default requirement wholesale.
    pub fn default_scopes(mut self, requirement: ScopeRequirement) -> Self {
        self.default_scopes = requirement;
        self
    }

    /// Add a scope requirement for a specific route path.
    ///
    /// The route requirement is checked *in addition* to the default.
    pub fn route_scope(mut self, path: impl Into<String>, scope: impl Into<String>) -> Self {
        let entry = self.route_scopes.entry(path.into()).or_default();
        entry.required.insert(scope.into());
        self
    }

    /// Check the given token context against the requirement for `path`.
    pub fn check(&self, path: &str, context: &AccessTokenContext) -> Result<(), AuthError> {
        self.default_scopes.check(context)?;
        if let Some(req) = self.route_scopes.get(path) {
            req.check(context)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with_scopes(scopes: &str) -> AccessTokenContext {
        AccessTokenContext::new("user", scopes.split_whitespace(), None, "tok")
    }

    fn context_no_scopes() -> AccessTokenContext {
        AccessTokenContext::new("user", Vec::<String>::new(), None, "tok")
    }

    #[test]
    fn test_requirement_empty() {
        let req = ScopeRequirement::new();
        assert!(req.is_empty());
        assert!(req.check(&context_no_scopes()).is_ok());
    }

    #[test]
    fn test_requirement_one() {
        let req = ScopeRequirement::one("mcp:read");
        assert!(!req.is_empty());
        assert!(req.check(&context_with_scopes("mcp:read mcp:write")).is_ok());
        assert!(req.check(&context_no_scopes()).is_err());
    }

    #[test]
    fn test_requirement_all() {
        let req = ScopeRequirement::all(["mcp:read", "mcp:write"]);
        assert!(req.check(&context_with_scopes("mcp:read mcp:write")).is_ok());
        assert!(req.check(&context_with_scopes("mcp:read")).is_err());
    }

    #[test]
    fn test_requirement_reports_required_scopes() {
        let req = ScopeRequirement::one("mcp:write");
        let result = req.check(&context_with_scopes("mcp:read"));

        match result {
            Err(AuthError::InsufficientScope { required }) => {
                assert_eq!(required, vec!["mcp:write".to_string()]);
            }
            other => panic!("expected InsufficientScope, got {:?}", other),
        }
    }

    #[test]
    fn test_policy_default() {
        let policy = ScopePolicy::new().default_scope("mcp:read");

        assert!(policy.check("/mcp", &context_with_scopes("mcp:read")).is_ok());
        assert!(policy.check("/mcp", &context_no_scopes()).is_err());
    }

    #[test]
    fn test_policy_route_scope_adds_to_default() {
        let policy = ScopePolicy::new()
            .default_scope("mcp:read")
            .route_scope("/mcp/admin", "mcp:admin");

        let reader = context_with_scopes("mcp:read");
        let admin = context_with_scopes("mcp:read mcp:admin");

        assert!(policy.check("/mcp", &reader).is_ok());
        assert!(policy.check("/mcp/admin", &reader).is_err());
        assert!(policy.check("/mcp/admin", &admin).is_ok());
    }

    #[test]
    fn test_policy_empty_allows_everything() {
        let policy = ScopePolicy::new();
        assert!(policy.check("/mcp", &context_no_scopes()).is_ok());
    }
}
