//! HTTP API server for the chat front-end
//!
//! This module provides a REST API over chat history:
//! - POST /chat - Send a message and receive a reply
//! - GET /users/:id/sessions - List conversation sessions
//! - GET /users/:id/sessions/:session_id - Messages of one session
//! - DELETE /users/:id/sessions/:session_id - Delete one session
//! - DELETE /users/:id/history - Clear all history
//! - GET /users/:id/stats - History statistics
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ChatRequest, ChatResponse, DeleteResponse};
pub use routes::create_router;
pub use state::AppState;
