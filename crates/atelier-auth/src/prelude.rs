pub use crate::errors::AuthError;
pub use crate::gate::{AccessGate, DenyReason, GateDecision};
pub use crate::role::{
    HttpRoleStore, HttpRoleStoreConfig, MemoryRoleStore, Role, RoleStore,
};
pub use crate::route::{
    classify, RouteClass, ADMIN_DIAGNOSTICS, ADMIN_PREFIX, ADMIN_SIGN_IN, CLIENT_PREFIX,
    CLIENT_SIGN_IN, UNAUTHORIZED_PAGE,
};
pub use crate::session::{HttpSessionVerifier, HttpSessionVerifierConfig, SessionVerifier};
