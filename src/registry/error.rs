//! Registry error taxonomy
//!
//! Three failure classes reach callers of the registry layer:
//!
//! - [`RegistryError::UnknownStage`]: the caller asked for a stage that is not
//!   configured. Always propagated.
//! - [`RegistryError::Transport`]: the registry could not be reached or returned
//!   something unusable. Swallowed by the aggregation service, which degrades to
//!   an empty result set.
//! - [`RegistryError::MalformedDocument`]: the registry answered, but the payload
//!   violates the expected structure. Always propagated.

use thiserror::Error;

/// Errors produced while resolving, fetching, or normalizing registry content
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Stage name is not present in the configured stage mapping
    #[error("Invalid stage name \"{stage}\"")]
    UnknownStage { stage: String },

    /// Network failure, non-2xx status, timeout, or undecodable body
    #[error("Registry request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Registry payload is structurally broken
    #[error("Malformed registry document: {message}")]
    MalformedDocument { message: String },
}

impl RegistryError {
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        RegistryError::MalformedDocument {
            message: message.into(),
        }
    }

    /// Whether the failure is transient registry unavailability
    pub fn is_transport(&self) -> bool {
        matches!(self, RegistryError::Transport { .. })
    }

    /// Returns a user-friendly error message with troubleshooting hints
    pub fn help_message(&self) -> String {
        match self {
            RegistryError::UnknownStage { stage } => {
                format!(
                    "Error: Unknown stage \"{}\"\n\n\
                    Help: The stage is not configured. Try:\n\
                    - List configured stages: svcatlas stages\n\
                    - Add it to SVCATLAS_STAGES (e.g. {}=http://registry/eureka/apps)\n\
                    - Add it to the [stages] table of your config file",
                    stage, stage
                )
            }
            RegistryError::Transport { url, message } => {
                format!(
                    "Error: Registry unavailable\nURL: {}\n\n\
                    Help: Cannot read from the registry. Try:\n\
                    - Check network connectivity\n\
                    - Verify the registry is running\n\
                    - Increase timeout: --timeout 60\n\n\
                    Details: {}",
                    url, message
                )
            }
            RegistryError::MalformedDocument { message } => {
                format!(
                    "Error: Malformed registry document\n\n\
                    Help: The registry answered with content that does not match the\n\
                    expected application/instance structure. This may indicate a\n\
                    registry schema change; please report it.\n\n\
                    Details: {}",
                    message
                )
            }
        }
    }
}
