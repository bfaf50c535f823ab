use tracing::{debug, warn};

use crate::role::RoleStore;
use crate::route::{
    classify, RouteClass, ADMIN_SIGN_IN, CLIENT_SIGN_IN, UNAUTHORIZED_PAGE,
};
use crate::session::SessionVerifier;

/// Why a request was turned away. Carried on the decision for logging; the
/// redirect target is the only thing the caller ever sees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    NoSession,
    RoleMissing,
    RoleForbidden,
    DependencyFailure,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenyReason::NoSession => "no_session",
            DenyReason::RoleMissing => "role_missing",
            DenyReason::RoleForbidden => "role_forbidden",
            DenyReason::DependencyFailure => "dependency_failure",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Forward,
    Redirect {
        location: String,
        reason: DenyReason,
    },
}

impl GateDecision {
    fn deny(location: &str, reason: DenyReason) -> Self {
        GateDecision::Redirect {
            location: location.to_string(),
            reason,
        }
    }
}

/// The per-request authorization gate. Owns its dependency clients; holds
/// no per-request state, so the decision is a pure function of the path,
/// the session outcome and the role record at call time.
pub struct AccessGate {
    sessions: Box<dyn SessionVerifier>,
    roles: Box<dyn RoleStore>,
}

impl AccessGate {
    pub fn new(sessions: Box<dyn SessionVerifier>, roles: Box<dyn RoleStore>) -> Self {
        Self { sessions, roles }
    }

    /// Decide what to do with a request. Every in-scope request gets an
    /// explicit decision; dependency failures deny, never allow.
    pub async fn decide(&self, path: &str, cookie_header: Option<&str>) -> GateDecision {
        match classify(path) {
            RouteClass::Public => GateDecision::Forward,
            RouteClass::AdminProtected => self.decide_admin(path, cookie_header).await,
            RouteClass::ClientProtected => self.decide_client(path, cookie_header).await,
        }
    }

    pub async fn healthcheck(&self) -> bool {
        self.sessions.healthcheck().await.is_ok()
    }

    async fn decide_admin(&self, path: &str, cookie_header: Option<&str>) -> GateDecision {
        let subject = match self.sessions.verify(cookie_header.unwrap_or("")).await {
            Ok(Some(subject)) => subject,
            Ok(None) => {
                debug!(path, "admin request without session");
                return GateDecision::deny(ADMIN_SIGN_IN, DenyReason::NoSession);
            }
            Err(err) => {
                warn!(path, error = %err.to_public().message, "session verify failed, denying");
                return GateDecision::deny(ADMIN_SIGN_IN, DenyReason::DependencyFailure);
            }
        };

        let sign_in_with_error = format!("{ADMIN_SIGN_IN}?error=role");
        match self.roles.role_for(&subject.subject_id).await {
            Ok(Some(role)) if role.permits_admin() => GateDecision::Forward,
            Ok(Some(role)) => {
                warn!(
                    path,
                    subject = %subject.subject_id,
                    role = role.as_label(),
                    "admin request with unauthorized role"
                );
                GateDecision::deny(UNAUTHORIZED_PAGE, DenyReason::RoleForbidden)
            }
            Ok(None) => {
                warn!(path, subject = %subject.subject_id, "no role record for subject");
                GateDecision::Redirect {
                    location: sign_in_with_error,
                    reason: DenyReason::RoleMissing,
                }
            }
            Err(err) => {
                warn!(
                    path,
                    subject = %subject.subject_id,
                    error = %err.to_public().message,
                    "role lookup failed, denying"
                );
                GateDecision::Redirect {
                    location: sign_in_with_error,
                    reason: DenyReason::DependencyFailure,
                }
            }
        }
    }

    async fn decide_client(&self, path: &str, cookie_header: Option<&str>) -> GateDecision {
        match self.sessions.verify(cookie_header.unwrap_or("")).await {
            Ok(Some(_)) => GateDecision::Forward,
            Ok(None) => {
                debug!(path, "client request without session");
                GateDecision::deny(CLIENT_SIGN_IN, DenyReason::NoSession)
            }
            Err(err) => {
                warn!(path, error = %err.to_public().message, "session verify failed, denying");
                GateDecision::deny(CLIENT_SIGN_IN, DenyReason::DependencyFailure)
            }
        }
    }
}
