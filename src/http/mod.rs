//! Client-facing HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, composition root)
//!     → request.rs (caller identity from X-User-Name)
//!     → handlers.rs (query/body parsing, Orchestrator use case)
//!     → response.rs (GatewayError → {"message": ...})
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::CallerIdentity;
pub use response::ApiError;
pub use server::{AppState, HttpServer, ServerError};
