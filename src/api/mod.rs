//! Wagering API Service
//!
//! HTTP surface of the engine: the action endpoint, user-record
//! passthroughs, and operational endpoints.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
