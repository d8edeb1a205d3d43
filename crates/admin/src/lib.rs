//! Ops Console order pipeline.
//!
//! Talks to the orders API with operator-supplied credentials and turns its
//! loosely-shaped responses into a filtered, paged, expandable order view.
//!
//! # Modules
//!
//! - [`config`] - environment-driven configuration
//! - [`orders_api`] - authenticated HTTP transport
//! - [`orders`] - normalization, detail cache, view state and export

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod orders;
pub mod orders_api;

pub use config::ConsoleConfig;
pub use error::ConsoleError;
pub use orders::OrderBoard;
pub use orders_api::{OrderSource, OrdersClient};
