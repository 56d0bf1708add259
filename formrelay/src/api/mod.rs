//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Response data structures
//!
//! # API Structure
//!
//! - **Submissions** (`POST /submit-contact`): Accepts the repair request form
//! - **Preflight** (`OPTIONS /submit-contact`): CORS preflight for browsers
//!
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
