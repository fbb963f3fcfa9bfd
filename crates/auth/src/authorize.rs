use thiserror::Error;

use tollgate_core::{AuthError, PrincipalId};

use crate::{Action, Claims, Decision, PermissionTable, Scope, TokenService};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No token, or a token that does not verify.
    #[error("authentication required")]
    Unauthenticated,

    #[error("insufficient permissions")]
    Unauthorized,
}

impl From<AuthzError> for AuthError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Unauthenticated => AuthError::Unauthenticated,
            AuthzError::Unauthorized => AuthError::Unauthorized,
        }
    }
}

/// Token from an `Authorization` header value of the form `Bearer <token>`.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Token verification composed with the permission table.
///
/// - No IO
/// - No state between calls
#[derive(Debug, Clone)]
pub struct Authorizer {
    tokens: TokenService,
    permissions: PermissionTable,
}

impl Authorizer {
    pub fn new(tokens: TokenService, permissions: PermissionTable) -> Self {
        Self { tokens, permissions }
    }

    pub fn permissions(&self) -> &PermissionTable {
        &self.permissions
    }

    /// Authorize `action` on a resource owned by `owner` (`None` for
    /// collections). Scope is derived from the token's subject.
    pub fn authorize(
        &self,
        token: Option<&str>,
        action: Action,
        owner: Option<&PrincipalId>,
    ) -> Result<Claims, AuthzError> {
        let claims = self.verify(token)?;
        let scope = Scope::for_target(&claims.subject_id, owner);
        self.check(&claims, action, scope)?;
        Ok(claims)
    }

    /// Authorize with a caller-computed scope.
    pub fn authorize_scope(&self, token: Option<&str>, action: Action, scope: Scope) -> Result<Claims, AuthzError> {
        let claims = self.verify(token)?;
        self.check(&claims, action, scope)?;
        Ok(claims)
    }

    /// Permission half of the check, for claims that are already verified.
    pub fn check(&self, claims: &Claims, action: Action, scope: Scope) -> Result<(), AuthzError> {
        let Some(role) = claims.role() else {
            tracing::info!(
                principal_id = %claims.subject_id,
                role = %claims.role,
                action = %action,
                scope = %scope,
                "authorization denied: unknown role"
            );
            return Err(AuthzError::Unauthorized);
        };

        let decision: Decision = self.permissions.explain(role, action, scope);
        if decision.granted {
            tracing::debug!(
                principal_id = %claims.subject_id,
                role = %role,
                action = %action,
                scope = %scope,
                matched = decision.matched.as_deref().unwrap_or_default(),
                "authorization granted"
            );
            Ok(())
        } else {
            tracing::info!(
                principal_id = %claims.subject_id,
                role = %role,
                action = %action,
                scope = %scope,
                "authorization denied"
            );
            Err(AuthzError::Unauthorized)
        }
    }

    fn verify(&self, token: Option<&str>) -> Result<Claims, AuthzError> {
        let token = token.ok_or(AuthzError::Unauthenticated)?;
        self.tokens.verify(token).map_err(|_| AuthzError::Unauthenticated)
    }
}
