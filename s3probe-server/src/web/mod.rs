//! The HTTP server exposing metrics and health checks.
//!
//! The application is implemented in the [`App`] struct, which sets up routing and middleware.
//! Use [`listen`] to open the TCP listener it is served on.

mod app;
mod middleware;
mod server;

pub use app::App;
pub use server::listen;
