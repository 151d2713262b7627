// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{email, utils};

// Re-export commonly used types
pub use modules::email::config::{
    DEFAULT_AUTH_METHOD, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT,
};
pub use modules::email::{ConfigError, ConfigOption, ConfigStore, SmtpConfig};
