//! Unified error handling for the console.

use thiserror::Error;

use crate::config::ConfigError;
use crate::orders_api::OrdersApiError;

/// Console-level error type.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Orders API operation failed.
    #[error("Orders API error: {0}")]
    Api(#[from] OrdersApiError),

    /// Writing an export failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rendering output as JSON failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the operator.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ConsoleError {
    /// Log the error, sending upstream and I/O failures to Sentry.
    pub fn report(&self) {
        if matches!(self, Self::Api(_) | Self::Io(_)) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Console command error"
            );
        } else {
            tracing::error!(error = %self, "Console command error");
        }
    }

    /// Message safe to show an operator.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(OrdersApiError::Unauthorized) => {
                "Session expired or credentials rejected; sign in again".to_string()
            }
            Self::Api(OrdersApiError::RateLimited(secs)) => {
                format!("Orders API is busy; retry in {secs} seconds")
            }
            // Don't expose upstream response bodies
            Self::Api(_) => "Orders API request failed".to_string(),
            _ => self.to_string(),
        }
    }
}
