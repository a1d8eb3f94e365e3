//! HTTP/REST API adapter.
//!
//! Inbound adapter exposing the splitter over JSON: request DTOs, their
//! validation into domain orders, and response rendering.

mod controller;
mod request;
mod response;
mod validation;

pub use controller::{AppState, create_app, create_router};
pub use request::*;
pub use response::*;
pub use validation::{ParsedSplitRequest, ValidationError, parse_split_request};
