use super::*;

#[test]
fn escape_html_handles_markup() {
    assert_eq!(escape_html(r#"<b a="x">&'"#), "&lt;b a=&quot;x&quot;&gt;&amp;&#39;");
    assert_eq!(escape_html("plain"), "plain");
}

#[test]
fn login_without_error_has_empty_alert() {
    let html = render_login(None);
    assert!(html.contains(r#"<p id="error" role="alert"></p>"#));
    assert!(!html.contains("{{ERROR}}"));
}

#[test]
fn login_maps_known_error_slug() {
    let html = render_login(Some("invalid-credential"));
    assert!(html.contains("Invalid credentials. Please check your email and password."));
}

#[test]
fn login_humanizes_unknown_slug_and_escapes_it() {
    assert!(render_login(Some("user-disabled")).contains("User disabled"));

    let html = render_login(Some("<script>"));
    assert!(!html.contains("<script>alert"));
    assert!(html.contains("&lt;script&gt;"));
}

#[test]
fn dashboard_renders_all_seed_columns_and_tasks() {
    let view_id = Uuid::nil();
    let html = render_dashboard(view_id, &Board::seeded());

    assert!(html.contains(r#"data-view-id="00000000-0000-0000-0000-000000000000""#));
    for column in ["backlog", "in-progress", "in-review", "done"] {
        assert!(html.contains(&format!(r#"data-column="{column}""#)), "missing column {column}");
    }
    assert!(html.contains("Setup Firebase Auth"));
    assert!(html.contains("Define Color Palette &amp; Fonts"));
    assert!(!html.contains("{{COLUMNS}}"));
}

#[test]
fn dashboard_escapes_task_text() {
    let mut board = Board::seeded();
    board.add_task("done", "<img src=x>", Some("a & b")).unwrap();
    let html = render_dashboard(Uuid::nil(), &board);
    assert!(html.contains("&lt;img src=x&gt;"));
    assert!(html.contains("<p>a &amp; b</p>"));
}
