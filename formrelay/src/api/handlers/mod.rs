//! HTTP request handlers.
//!
//! - [`submissions`]: Contact form submission and its CORS preflight
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which converts to the same JSON shape as a
//! successful [`crate::api::models::submissions::SubmissionOutcome`], with `success: false`.

pub mod submissions;
