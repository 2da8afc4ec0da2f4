use super::*;

// =============================================================================
// classify
// =============================================================================

#[test]
fn classify_known_paths() {
    assert_eq!(classify("/"), RouteClass::PublicEntry);
    assert_eq!(classify("/login"), RouteClass::AuthPage);
    assert_eq!(classify("/dashboard"), RouteClass::Protected);
    assert_eq!(classify("/dashboard/42"), RouteClass::Protected);
    assert_eq!(classify("/dashboard/views/abc/columns/done/tasks"), RouteClass::Protected);
}

#[test]
fn classify_is_exact_for_login_and_root() {
    assert_eq!(classify("/login/"), RouteClass::Unclassified);
    assert_eq!(classify("/loginx"), RouteClass::Unclassified);
    assert_eq!(classify(""), RouteClass::Unclassified);
    assert_eq!(classify("//"), RouteClass::Unclassified);
}

#[test]
fn classify_protected_is_plain_prefix() {
    assert_eq!(classify("/dashboards"), RouteClass::Protected);
    assert_eq!(classify("/api/dashboard"), RouteClass::Unclassified);
}

// =============================================================================
// decide
// =============================================================================

#[test]
fn login_with_session_redirects_to_dashboard() {
    assert_eq!(decide(true, "/login"), Decision::RedirectTo("/dashboard"));
}

#[test]
fn login_without_session_passes() {
    assert_eq!(decide(false, "/login"), Decision::Pass);
}

#[test]
fn dashboard_without_session_redirects_to_login() {
    assert_eq!(decide(false, "/dashboard"), Decision::RedirectTo("/login"));
    assert_eq!(decide(false, "/dashboard/42"), Decision::RedirectTo("/login"));
}

#[test]
fn dashboard_with_session_passes() {
    assert_eq!(decide(true, "/dashboard"), Decision::Pass);
    assert_eq!(decide(true, "/dashboard/42"), Decision::Pass);
}

#[test]
fn root_redirects_by_session() {
    assert_eq!(decide(true, "/"), Decision::RedirectTo("/dashboard"));
    assert_eq!(decide(false, "/"), Decision::RedirectTo("/login"));
}

#[test]
fn unclassified_paths_always_pass() {
    let paths = [
        "/healthz",
        "/api/auth/session",
        "/api/auth/logout",
        "/auth/google/callback",
        "/login/extra",
        "/favicon.ico",
        "",
        "/Dashboard",
    ];
    for path in paths {
        for has_session in [true, false] {
            assert_eq!(decide(has_session, path), Decision::Pass, "path {path:?} session {has_session}");
        }
    }
}

#[test]
fn decide_is_deterministic() {
    for _ in 0..3 {
        assert_eq!(decide(false, "/dashboard/1"), decide(false, "/dashboard/1"));
    }
}
