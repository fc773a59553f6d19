use serde::Serialize;
use tokio::sync::broadcast;

use super::domain::UserId;

/// Bearer credential presented by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(pub String);

impl SessionToken {
    /// Pull a token out of an `Authorization: Bearer ...` header value.
    pub fn from_bearer(header: &str) -> Option<Self> {
        let (scheme, token) = header.trim().split_once(' ')?;
        let token = token.trim();
        if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            Some(Self(token.to_string()))
        } else {
            None
        }
    }
}

/// Authenticated identity as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identity {
    pub user_id: UserId,
}

/// Session state handed explicitly to every flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub token: Option<SessionToken>,
    pub identity: Option<Identity>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: SessionToken, identity: Identity) -> Self {
        Self {
            token: Some(token),
            identity: Some(identity),
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.identity.as_ref().map(|identity| &identity.user_id)
    }
}

/// Proof that the caller passed the administrator gate for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    pub admin: Identity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut(Identity),
}

/// Identity and role-assignment collaborator.
#[async_trait::async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn current_session(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Identity>, DirectoryError>;

    async fn is_administrator(&self, identity: &Identity) -> Result<bool, DirectoryError>;

    async fn sign_out(&self, token: &SessionToken) -> Result<(), DirectoryError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("identity directory unavailable: {0}")]
    Unavailable(String),
}

/// Why the admin dashboard refused a caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationDenied {
    #[error("sign in required")]
    NoSession,
    #[error("administrator role required")]
    NotAdministrator,
}

impl AuthorizationDenied {
    pub const fn redirect_to(&self) -> &'static str {
        match self {
            AuthorizationDenied::NoSession => "/auth",
            AuthorizationDenied::NotAdministrator => "/",
        }
    }

    pub const fn notice(&self) -> &'static str {
        match self {
            AuthorizationDenied::NoSession => "Please sign in to access the admin dashboard.",
            AuthorizationDenied::NotAdministrator => "Access denied. Admin privileges required.",
        }
    }
}
