//! # neighbourpro
//!
//! Work-order lifecycle and worker ranking core for a neighbourhood services
//! marketplace.
//!
//! Clients rank workers for a profession, book one, and drive the order
//! through acceptance, execution and a two-party payment handshake. Closed
//! orders take one review each, folded into the worker's reputation.
//! Storage is Postgres via sqlx ([`db::Db`]) or in-process
//! ([`store::MemoryStore`]); observability is tracing + OpenTelemetry.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod geo;
pub mod lifecycle;
pub mod model;
pub mod ranking;
pub mod recommend;
pub mod reputation;
pub mod store;
pub mod telemetry;
