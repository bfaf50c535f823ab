/// Route prefixes and carve-outs the gate operates on. Everything outside
/// the admin and client areas is forwarded without any decision logic.
pub const ADMIN_PREFIX: &str = "/admin";
pub const CLIENT_PREFIX: &str = "/client";

pub const ADMIN_SIGN_IN: &str = "/admin/login";
pub const ADMIN_DIAGNOSTICS: &str = "/admin/diagnostics";
/// Client sign-in lives on the public site, outside the gated prefix, so an
/// unauthenticated visitor can always reach it.
pub const CLIENT_SIGN_IN: &str = "/login";
pub const UNAUTHORIZED_PAGE: &str = "/unauthorized";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    AdminProtected,
    ClientProtected,
}

/// Classify a request path. The sign-in and diagnostics pages under the
/// admin prefix stay public so an operator can authenticate or debug
/// connectivity without already holding a session.
pub fn classify(path: &str) -> RouteClass {
    if matches_prefix(path, ADMIN_PREFIX) {
        if matches_prefix(path, ADMIN_SIGN_IN) || matches_prefix(path, ADMIN_DIAGNOSTICS) {
            return RouteClass::Public;
        }
        return RouteClass::AdminProtected;
    }
    if matches_prefix(path, CLIENT_PREFIX) {
        return RouteClass::ClientProtected;
    }
    RouteClass::Public
}

// Prefix match on whole path segments: "/admin" covers "/admin" and
// "/admin/clients" but not "/administrator".
fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
