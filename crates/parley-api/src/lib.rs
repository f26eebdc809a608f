//! Parley API crate - axum HTTP server hosting the chat endpoint and the
//! single-page client.
//!
//! `POST /chat` turns `{ text, history }` into one upstream chat-completions
//! call and answers `{ reply }`. Everything else is served from the static
//! bundle directory.

pub mod error;
pub mod handlers;
pub mod provider;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use provider::{CompletionProvider, OpenRouterProvider, ProviderError};
pub use routes::{create_router, start_server};
pub use state::AppState;
