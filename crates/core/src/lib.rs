//! Ops Console Core - Shared order types.
//!
//! This crate provides the strict record types used across the Ops Console:
//! - `admin` - Order data pipeline (transport, normalization, caching, views)
//! - `cli` - Command-line access to the order console
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Raw upstream
//! payloads are converted into these types by the admin crate's normalizer, so
//! downstream code never has to re-check optionality.
//!
//! # Modules
//!
//! - [`types`] - String-backed IDs, orders, order details, status filters and timestamps

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
