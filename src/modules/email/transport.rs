use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::PoolConfig;
use lettre::{Address, SmtpTransport};
use log::debug;

use super::config::SmtpConfig;
use super::error::ConfigError;

/// Port on which the server expects TLS from the first byte
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Map a configured auth method name onto a lettre mechanism
pub fn auth_mechanism(auth_method: &str) -> Result<Mechanism, ConfigError> {
    match auth_method.to_ascii_uppercase().as_str() {
        "PLAIN" => Ok(Mechanism::Plain),
        "LOGIN" => Ok(Mechanism::Login),
        "XOAUTH2" => Ok(Mechanism::Xoauth2),
        _ => Err(ConfigError::UnsupportedAuthMethod(auth_method.to_string())),
    }
}

/// Sender mailbox built from `from_name` and `from`, falling back to the username
pub fn sender_mailbox(config: &SmtpConfig) -> Result<Mailbox, ConfigError> {
    let address = if config.from.is_empty() {
        &config.username
    } else {
        &config.from
    };

    let email: Address = address
        .parse()
        .map_err(|e| ConfigError::InvalidAddress(format!("{}: {}", address, e)))?;

    let name = if config.from_name.is_empty() {
        None
    } else {
        Some(config.from_name.clone())
    };

    Ok(Mailbox::new(name, email))
}

/// Build a lettre SMTP transport from a validated configuration.
///
/// No connection is opened here; lettre connects on the first send.
pub fn build_transport(config: &SmtpConfig) -> Result<SmtpTransport, ConfigError> {
    config.validate()?;

    let mechanism = auth_mechanism(&config.auth_method)?;

    // Configure TLS parameters
    let tls_parameters = TlsParameters::builder(config.host.clone())
        .dangerous_accept_invalid_certs(config.insecure_skip_verify)
        .dangerous_accept_invalid_hostnames(config.insecure_skip_verify)
        .build()?;

    let tls = if config.port == IMPLICIT_TLS_PORT {
        Tls::Wrapper(tls_parameters)
    } else {
        Tls::Required(tls_parameters)
    };

    debug!(
        "Building SMTP transport: host={}, port={}, auth={:?}, keep_alive={}",
        config.host, config.port, mechanism, config.keep_alive
    );

    Ok(SmtpTransport::builder_dangerous(config.host.as_str())
        .port(config.port)
        .tls(tls)
        .credentials(Credentials::new(
            config.username.clone(),
            config.password.clone(),
        ))
        .authentication(vec![mechanism])
        .pool_config(pool_config(config.keep_alive))
        .timeout(Some(config.timeout))
        .build())
}

fn pool_config(keep_alive: bool) -> PoolConfig {
    if keep_alive {
        PoolConfig::new().min_idle(1)
    } else {
        PoolConfig::new().min_idle(0).max_size(1)
    }
}
