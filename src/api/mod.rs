//! HTTP serving surface.
//!
//! Every request entering the axum app is funneled through the crate's
//! own dispatcher via a fallback service; axum's router is only the
//! transport shell. Dispatch failures map to the HTTP status surface
//! here (404/405/406/415, 500 for fatal classes).

mod error;
pub mod endpoints;
pub mod models;
mod server;
pub mod state;

pub use server::{build_app, run};
