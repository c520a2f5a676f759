//! Screentask Gateway HTTP API Server
//!
//! Authenticates the caller and exposes the screenshot listing and
//! screenshots-to-tasks endpoints.

pub mod auth;
pub mod health_api;
pub mod routes;
pub mod server;

pub use auth::{AuthenticatedUser, Authenticator, StaticAuthenticator, SupabaseAuthenticator};
pub use server::{build_router, serve, start_server, GatewayState};
