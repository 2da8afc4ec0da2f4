//! Access decisions — who may see which page.
//!
//! DESIGN
//! ======
//! `decide` is a pure function of (session presence, request path). It is
//! evaluated once per request by the gate middleware before any handler
//! runs. Rules are checked in a fixed order and the first match wins:
//!
//! 1. session + `/login`               -> `/dashboard`
//! 2. no session + `/dashboard...`     -> `/login`
//! 3. `/`                              -> `/dashboard` or `/login`
//! 4. anything else                    -> pass
//!
//! The route classes are disjoint, so rule 3 never shadows rules 1 and 2.

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Classification of a request path. Exactly one class per path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// `/`
    PublicEntry,
    /// `/login`
    AuthPage,
    /// Any path starting with `/dashboard`.
    Protected,
    Unclassified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Pass,
    RedirectTo(&'static str),
}

#[must_use]
pub fn classify(path: &str) -> RouteClass {
    if path == ROOT_PATH {
        RouteClass::PublicEntry
    } else if path == LOGIN_PATH {
        RouteClass::AuthPage
    } else if path.starts_with(DASHBOARD_PATH) {
        RouteClass::Protected
    } else {
        RouteClass::Unclassified
    }
}

/// Decide whether a request passes or is redirected.
#[must_use]
pub fn decide(has_session: bool, path: &str) -> Decision {
    let class = classify(path);

    if has_session && class == RouteClass::AuthPage {
        return Decision::RedirectTo(DASHBOARD_PATH);
    }
    if !has_session && class == RouteClass::Protected {
        return Decision::RedirectTo(LOGIN_PATH);
    }
    if class == RouteClass::PublicEntry {
        return Decision::RedirectTo(if has_session { DASHBOARD_PATH } else { LOGIN_PATH });
    }

    Decision::Pass
}

#[cfg(test)]
#[path = "access_test.rs"]
mod tests;
