//! Core types for the Ops Console.
//!
//! This module provides type-safe wrappers for order domain concepts.

pub mod id;
pub mod order;
pub mod status;
pub mod timestamp;

pub use id::*;
pub use order::{Order, OrderDetails, OrderItem, Product};
pub use status::*;
pub use timestamp::Timestamp;
