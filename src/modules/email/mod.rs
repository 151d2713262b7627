pub mod config;
pub mod error;
pub mod store;
pub mod transport;

pub use config::{
    with_auth_method, with_from, with_from_name, with_host, with_insecure_skip_verify,
    with_keep_alive, with_password, with_port, with_timeout, with_username, ConfigOption,
    SmtpConfig,
};
pub use error::ConfigError;
pub use store::ConfigStore;
pub use transport::{auth_mechanism, build_transport, sender_mailbox};
