use thiserror::Error;

/// Errors produced while validating, storing or consuming an SMTP configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential (username or password) is empty
    #[error("{0}")]
    MissingCredential(&'static str),

    /// The configured auth method has no lettre mechanism
    #[error("unsupported auth method: {0}")]
    UnsupportedAuthMethod(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("failed to (de)serialize configuration: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration storage error: {0}")]
    Storage(#[from] keyring::Error),

    #[error("failed to build SMTP transport: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Returns true for the credential errors raised by `SmtpConfig::validate`
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, ConfigError::MissingCredential(_))
    }
}
