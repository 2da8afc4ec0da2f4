//! Board store — in-memory Kanban columns and tasks.
//!
//! DESIGN
//! ======
//! A board is an ordered list of columns fixed at construction. The only
//! mutation is appending a task to a column. Task ids are drawn from a
//! per-board sequence and recorded in an issued set, so an id is never
//! handed out twice even when seed data uses the same `task-N` shape.
//!
//! ERROR HANDLING
//! ==============
//! Every failure (blank or oversized input, unknown column, full board) is a
//! caller mistake, not a fault. Failures are returned as values and leave the
//! board untouched.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::ErrorCode;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    pub tasks: Vec<Task>,
}

/// Longest accepted task title, in characters.
pub const MAX_TITLE_CHARS: usize = 200;
/// Longest accepted task description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2_000;
/// Most tasks one board holds, seed tasks included.
pub const MAX_TASKS: usize = 500;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("column not found: {0}")]
    NotFound(String),
    #[error("task title must not be empty")]
    EmptyTitle,
    #[error("task title longer than {MAX_TITLE_CHARS} characters")]
    TitleTooLong,
    #[error("task description longer than {MAX_DESCRIPTION_CHARS} characters")]
    DescriptionTooLong,
    #[error("board already holds {MAX_TASKS} tasks")]
    Full,
}

impl ErrorCode for BoardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_COLUMN_NOT_FOUND",
            Self::EmptyTitle => "E_EMPTY_TITLE",
            Self::TitleTooLong | Self::DescriptionTooLong => "E_TOO_LONG",
            Self::Full => "E_BOARD_FULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    columns: Vec<Column>,
    #[serde(skip)]
    next_seq: u64,
    #[serde(skip)]
    issued: HashSet<String>,
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl Board {
    /// Build a board from fixed columns. Existing task ids count as issued.
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        let issued: HashSet<String> = columns
            .iter()
            .flat_map(|c| c.tasks.iter().map(|t| t.id.clone()))
            .collect();
        let next_seq = u64::try_from(issued.len()).unwrap_or(u64::MAX).saturating_add(1);
        Self { columns, next_seq, issued }
    }

    /// The board every page view starts from.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(vec![
            seed_column(
                "backlog",
                "Backlog",
                &[
                    ("task-1", "Setup Firebase Auth", "Implement all required authentication providers."),
                    ("task-2", "Design Login Page", "Create a visually appealing and user-friendly login UI."),
                ],
            ),
            seed_column(
                "in-progress",
                "In Progress",
                &[
                    ("task-3", "Build Kanban Board UI", "Develop the main task board with columns and cards."),
                    ("task-4", "Integrate OIDC with FusionAuth", "Set up the OIDC flow for enterprise users."),
                ],
            ),
            seed_column(
                "in-review",
                "In Review",
                &[("task-5", "Implement Protected Routes", "Use middleware to secure dashboard access.")],
            ),
            seed_column(
                "done",
                "Done",
                &[(
                    "task-6",
                    "Define Color Palette & Fonts",
                    "Update globals.css and tailwind.config.ts with the new design system.",
                )],
            ),
        ])
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Append a new task to the end of `column_id`.
    ///
    /// The title is trimmed; a blank description is stored as `None`.
    ///
    /// # Errors
    ///
    /// - `EmptyTitle` if the trimmed title is empty.
    /// - `TitleTooLong` / `DescriptionTooLong` past the character limits.
    /// - `NotFound` if no column has `column_id`.
    /// - `Full` once the board holds [`MAX_TASKS`].
    ///
    /// The board is unchanged on error.
    pub fn add_task(&mut self, column_id: &str, title: &str, description: Option<&str>) -> Result<Task, BoardError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BoardError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(BoardError::TitleTooLong);
        }
        let description = description.map(str::trim).filter(|d| !d.is_empty());
        if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_CHARS) {
            return Err(BoardError::DescriptionTooLong);
        }
        let index = self
            .columns
            .iter()
            .position(|c| c.id == column_id)
            .ok_or_else(|| BoardError::NotFound(column_id.to_owned()))?;
        if self.task_count() >= MAX_TASKS {
            return Err(BoardError::Full);
        }

        let task = Task {
            id: self.next_task_id(),
            title: title.to_owned(),
            description: description.map(str::to_owned),
        };
        self.columns[index].tasks.push(task.clone());
        Ok(task)
    }

    #[must_use]
    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    fn next_task_id(&mut self) -> String {
        loop {
            let id = format!("task-{}", self.next_seq);
            self.next_seq += 1;
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }
}

fn seed_column(id: &str, title: &str, tasks: &[(&str, &str, &str)]) -> Column {
    Column {
        id: id.to_owned(),
        title: title.to_owned(),
        tasks: tasks
            .iter()
            .map(|(id, title, description)| Task {
                id: (*id).to_owned(),
                title: (*title).to_owned(),
                description: Some((*description).to_owned()),
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
