//! Service layer.
//!
//! Route handlers stay thin and delegate to these modules: access decisions,
//! session cookies, the identity provider seam, and the in-memory boards.

pub mod access;
pub mod board;
pub mod firebase;
pub mod identity;
pub mod session;
pub mod views;
