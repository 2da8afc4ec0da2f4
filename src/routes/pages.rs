//! HTML pages — sign-in screen and the board.
//!
//! Templates are embedded at build time and filled by plain placeholder
//! replacement. Every interpolated value goes through [`escape_html`].

use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;
use uuid::Uuid;

use crate::services::board::{Board, Column, Task};
use crate::services::identity::ProviderError;
use crate::services::views;
use crate::state::AppState;

const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.html");
const DASHBOARD_TEMPLATE: &str = include_str!("../../templates/dashboard.html");

#[derive(Deserialize)]
pub struct LoginQuery {
    error: Option<String>,
}

#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Sign-in page, with the message for `error` when a sign-in bounced back.
#[must_use]
pub fn render_login(error: Option<&str>) -> String {
    let message = error
        .filter(|slug| !slug.trim().is_empty())
        .map(|slug| ProviderError::from_code(&format!("auth/{}", slug.trim())).user_message())
        .unwrap_or_default();
    LOGIN_TEMPLATE.replace("{{ERROR}}", &escape_html(&message))
}

fn render_task(out: &mut String, task: &Task) {
    out.push_str(&format!(
        "        <article class=\"task\" data-task-id=\"{}\"><h4>{}</h4>",
        escape_html(&task.id),
        escape_html(&task.title)
    ));
    if let Some(description) = &task.description {
        out.push_str(&format!("<p>{}</p>", escape_html(description)));
    }
    out.push_str("</article>\n");
}

fn render_column(out: &mut String, column: &Column) {
    let id = escape_html(&column.id);
    out.push_str(&format!("    <section class=\"column\" data-column=\"{id}\">\n"));
    out.push_str(&format!("      <h3>{}</h3>\n", escape_html(&column.title)));
    out.push_str("      <div class=\"tasks\">\n");
    for task in &column.tasks {
        render_task(out, task);
    }
    out.push_str("      </div>\n");
    out.push_str(&format!("      <form class=\"add-task\" data-column=\"{id}\">\n"));
    out.push_str("        <input name=\"task_title\" placeholder=\"e.g., Finalize project report\" required>\n");
    out.push_str("        <textarea name=\"task_description\" placeholder=\"Add more details about the task...\"></textarea>\n");
    out.push_str("        <button type=\"submit\">Add Task</button>\n");
    out.push_str("      </form>\n");
    out.push_str("    </section>\n");
}

/// Board page bound to one page view.
#[must_use]
pub fn render_dashboard(view_id: Uuid, board: &Board) -> String {
    let mut columns = String::new();
    for column in board.columns() {
        render_column(&mut columns, column);
    }
    DASHBOARD_TEMPLATE
        .replace("{{VIEW_ID}}", &view_id.to_string())
        .replace("{{COLUMNS}}", &columns)
}

/// `GET /login`
pub async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(render_login(query.error.as_deref()))
}

/// `GET /dashboard`: every render opens a fresh page view.
pub async fn dashboard_page(State(state): State<AppState>) -> Html<String> {
    let (view_id, board) = views::open_view(&state).await;
    Html(render_dashboard(view_id, &board))
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
