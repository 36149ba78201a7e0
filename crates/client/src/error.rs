//! Unified error handling with Sentry integration.
//!
//! Each component has its own error type ([`StorageError`], [`ApiError`],
//! [`ChannelError`], [`ConfigError`]); [`ClientError`] wraps them for callers
//! that drive several components at once, such as the [`Runtime`] flows.
//!
//! [`Runtime`]: crate::Runtime

use thiserror::Error;

use crate::cart::CartError;
use crate::config::ConfigError;
use crate::gateway::ApiError;
use crate::storage::StorageError;
use crate::stream::ChannelError;

/// Runtime-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Persistent storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A live channel failed.
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// A cart operation was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ClientError {
    /// Message suitable for a transient user notification.
    ///
    /// Server-provided text is passed through; internal details are not.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Request { message, .. }) => message.clone(),
            Self::Api(ApiError::Transport(_)) => "Could not reach the server".to_string(),
            Self::Api(ApiError::Protocol { .. } | ApiError::Encode(_)) => {
                "Unexpected response from the server".to_string()
            }
            Self::Cart(err) => err.to_string(),
            Self::Storage(_) => "Could not save local data".to_string(),
            Self::Config(_) | Self::Channel(_) | Self::HttpClient(_) => self.to_string(),
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context from a user ID.
///
/// Called after a session is saved to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Called on session teardown to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_passes_server_text() {
        let err = ClientError::Api(ApiError::Request {
            status: reqwest::StatusCode::BAD_REQUEST,
            message: "Producto no encontrado: 9".to_string(),
        });
        assert_eq!(err.user_message(), "Producto no encontrado: 9");
    }

    #[test]
    fn test_user_message_hides_protocol_details() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ClientError::Api(ApiError::Protocol {
            endpoint: "/products".to_string(),
            source,
        });
        assert_eq!(err.user_message(), "Unexpected response from the server");
    }

    #[test]
    fn test_display_prefixes_component() {
        let err = ClientError::Cart(CartError::Empty);
        assert!(err.to_string().starts_with("Cart error:"));
    }
}
