use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// Network unreachable, connection reset or timed out. Never carries an HTTP status.
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Provisioning failed for '{url}': {message}")]
    Provisioning { url: String, message: String },

    #[error("Lifecycle error: {message}")]
    Lifecycle { message: String },

    #[error("Malformed push payload: {message}")]
    MalformedPayload { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Host error: {message}")]
    Host { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn provisioning(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provisioning {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::Lifecycle {
            message: message.into(),
        }
    }

    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error() {
        let error = DomainError::transport("connection refused");
        assert_eq!(error.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn test_provisioning_error() {
        let error = DomainError::provisioning("/static/logo.png", "HTTP 404");
        assert_eq!(
            error.to_string(),
            "Provisioning failed for '/static/logo.png': HTTP 404"
        );
    }

    #[test]
    fn test_storage_error() {
        let error = DomainError::storage("quota exceeded");
        assert_eq!(error.to_string(), "Storage error: quota exceeded");
    }
}
