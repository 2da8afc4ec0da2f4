//! Board routes — JSON access to a page view's board.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::board::{Board, BoardError, Task};
use crate::services::views::{self, ViewError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddTaskBody {
    title: String,
    #[serde(default)]
    description: Option<String>,
}

pub(crate) fn view_error_to_status(err: &ViewError) -> StatusCode {
    match err {
        ViewError::NotFound(_) | ViewError::Board(BoardError::NotFound(_)) => StatusCode::NOT_FOUND,
        ViewError::Board(BoardError::EmptyTitle | BoardError::TitleTooLong | BoardError::DescriptionTooLong) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ViewError::Board(BoardError::Full) => StatusCode::CONFLICT,
    }
}

fn view_error(err: &ViewError) -> ApiError {
    ApiError::from_err(view_error_to_status(err), err)
}

/// `GET /dashboard/views/{view_id}`
pub async fn get_view(State(state): State<AppState>, Path(view_id): Path<Uuid>) -> Result<Json<Board>, ApiError> {
    views::snapshot(&state, view_id)
        .await
        .map(Json)
        .map_err(|e| view_error(&e))
}

/// `POST /dashboard/views/{view_id}/columns/{column_id}/tasks`
pub async fn add_task(
    State(state): State<AppState>,
    Path((view_id, column_id)): Path<(Uuid, String)>,
    Json(body): Json<AddTaskBody>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = views::add_task(&state, view_id, &column_id, &body.title, body.description.as_deref())
        .await
        .map_err(|e| view_error(&e))?;
    Ok((StatusCode::CREATED, Json(task)))
}
