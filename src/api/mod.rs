//! HTTP API for the task store.

pub mod server;

pub use server::{ApiServer, build_router, serve};
