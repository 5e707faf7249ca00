//! Thin HTTP surface over the vocabulary engine

pub mod handler;
pub mod server;

pub use server::{router, AppState, HttpServer};
