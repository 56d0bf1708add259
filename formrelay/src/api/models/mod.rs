//! API request and response data models.
//!
//! These models define the public JSON contract of the relay and are annotated with
//! `utoipa` for the generated API docs.
//!
//! - [`submissions`]: Outcome of a contact form submission

pub mod submissions;
