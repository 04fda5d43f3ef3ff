//! Ticker Common - Shared configuration, logging, and error types for the
//! ticker dashboard service.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Logging setup with noise filtering
//! - The shared error type

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, DataConfig, DataSourceMode, ObservabilityConfig, ServerConfig};
pub use error::{Error, Result};
pub use logging::init_logging;
