//! Error taxonomy for registry resolution, app loading, and persisted session state.

use desktop_app_contract::ApplicationId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Failures returned to callers of the registry client and module loader.
///
/// Errors are `Clone` so every waiter on a deduplicated load observes the same value.
pub enum RuntimeError {
    /// Both the primary catalog and the fallback listing failed.
    #[error("registry unavailable (primary: {primary}; fallback: {fallback})")]
    RegistryUnavailable {
        /// Failure reported by the primary endpoint.
        primary: String,
        /// Failure reported by the fallback listing.
        fallback: String,
    },
    /// The identifier is absent from a successfully fetched registry.
    #[error("app `{0}` was not found in the registry")]
    AppNotFound(ApplicationId),
    /// The bundle could not be imported from any host, or exposed no default export.
    #[error("failed to load app `{identifier}`: {reason}")]
    AppLoadFailed {
        /// App whose bundle failed.
        identifier: ApplicationId,
        /// Import or export failure detail.
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Persisted-state failures. These are recovered locally and never surfaced to the user.
pub enum PersistenceError {
    /// The backing store could not be read.
    #[error("persisted value `{key}` could not be read: {reason}")]
    Read {
        /// Storage key.
        key: String,
        /// Host error.
        reason: String,
    },
    /// The stored value is not valid JSON for the expected shape.
    #[error("persisted value `{key}` is corrupt: {reason}")]
    Corrupt {
        /// Storage key.
        key: String,
        /// Decode error.
        reason: String,
    },
    /// The value could not be written.
    #[error("persisted value `{key}` could not be written: {reason}")]
    Write {
        /// Storage key.
        key: String,
        /// Encode or host error.
        reason: String,
    },
}

impl PersistenceError {
    /// Storage key the failure relates to.
    pub fn key(&self) -> &str {
        match self {
            Self::Read { key, .. } | Self::Corrupt { key, .. } | Self::Write { key, .. } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_unavailable_mentions_both_sources() {
        let err = RuntimeError::RegistryUnavailable {
            primary: "HTTP 503".to_string(),
            fallback: "rate limited".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("HTTP 503"));
        assert!(message.contains("rate limited"));
    }

    #[test]
    fn persistence_error_exposes_key() {
        let err = PersistenceError::Corrupt {
            key: "desktop.dock.v1".to_string(),
            reason: "expected value".to_string(),
        };
        assert_eq!(err.key(), "desktop.dock.v1");
    }
}
