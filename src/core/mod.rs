//! Authorization engine internals
//!
//! - [`iam`] - policy model, matchers, evaluators and the engine
//! - [`request`] - requests, sessions and per-operation field schemas
//! - [`store`] - policy store access and the in-memory snapshot store
//! - [`config`] - engine configuration loaded from TOML
//! - [`validation`] - checks for serialized statement pieces
//! - [`error`] - error taxonomy

pub mod config;
pub mod error;
pub mod iam;
pub mod request;
pub mod store;
pub mod validation;
