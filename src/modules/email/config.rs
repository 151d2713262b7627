use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::error::ConfigError;
use crate::utils::logging::log_config_event;

/// Default SMTP relay host
pub const DEFAULT_HOST: &str = "smtp.gmail.com";
/// Default submission port (STARTTLS)
pub const DEFAULT_PORT: u16 = 587;
/// Default timeout for SMTP commands
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default SASL mechanism name
pub const DEFAULT_AUTH_METHOD: &str = "PLAIN";

/// A single adjustment applied to an `SmtpConfig` during construction.
///
/// Options are applied in sequence, so a later option wins over an earlier
/// one that sets the same field.
pub type ConfigOption = Box<dyn FnOnce(&mut SmtpConfig) + Send>;

/// Settings consumed by an SMTP client
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    // SMTP server hostname (e.g., smtp.gmail.com)
    pub host: String,
    // SMTP server port (587 for STARTTLS, 465 for implicit TLS)
    pub port: u16,
    // Username for SMTP authentication
    pub username: String,
    // Password or app-specific password
    pub password: String,
    // Sender address; empty means "use the username"
    pub from: String,
    // Display name shown next to the sender address
    pub from_name: String,
    // Accept invalid certificates and hostnames
    pub insecure_skip_verify: bool,
    // Stored as milliseconds so it survives a JSON round trip
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    // Keep idle connections open between sends
    pub keep_alive: bool,
    // SASL mechanism name, e.g. PLAIN or LOGIN
    pub auth_method: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            from_name: String::new(),
            insecure_skip_verify: false,
            timeout: DEFAULT_TIMEOUT,
            keep_alive: false,
            auth_method: DEFAULT_AUTH_METHOD.to_string(),
        }
    }
}

impl SmtpConfig {
    /// Build a configuration from the defaults plus the given options.
    ///
    /// This never fails, even when credentials are missing. Call
    /// [`SmtpConfig::validate`] (or use [`SmtpConfig::new_validated`]) to
    /// check them.
    pub fn new<I>(options: I) -> Self
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        let mut config = Self::default();
        config.apply(options);
        config
    }

    /// Build a configuration and validate it in one step
    pub fn new_validated<I>(options: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        let config = Self::new(options);
        config.validate()?;
        Ok(config)
    }

    /// Apply further options, in order, to an existing configuration
    pub fn apply<I>(&mut self, options: I)
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        for option in options {
            option(self);
        }
    }

    /// Check that the credentials required for authentication are present.
    ///
    /// The username is checked before the password, so a configuration
    /// missing both reports the username.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = if self.username.is_empty() {
            Err(ConfigError::MissingCredential("username is empty"))
        } else if self.password.is_empty() {
            Err(ConfigError::MissingCredential("password is empty"))
        } else {
            Ok(())
        };

        match &result {
            Ok(()) => log_config_event("validate", &self.username, &self.host, true, None),
            Err(e) => log_config_event(
                "validate",
                &self.username,
                &self.host,
                false,
                Some(&e.to_string()),
            ),
        }

        result
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "********" };
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &password)
            .field("from", &self.from)
            .field("from_name", &self.from_name)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("timeout", &self.timeout)
            .field("keep_alive", &self.keep_alive)
            .field("auth_method", &self.auth_method)
            .finish()
    }
}

pub fn with_host(host: impl Into<String>) -> ConfigOption {
    let host = host.into();
    Box::new(move |cfg| cfg.host = host)
}

pub fn with_port(port: u16) -> ConfigOption {
    Box::new(move |cfg| cfg.port = port)
}

pub fn with_username(username: impl Into<String>) -> ConfigOption {
    let username = username.into();
    Box::new(move |cfg| cfg.username = username)
}

pub fn with_password(password: impl Into<String>) -> ConfigOption {
    let password = password.into();
    Box::new(move |cfg| cfg.password = password)
}

pub fn with_from(from: impl Into<String>) -> ConfigOption {
    let from = from.into();
    Box::new(move |cfg| cfg.from = from)
}

pub fn with_from_name(from_name: impl Into<String>) -> ConfigOption {
    let from_name = from_name.into();
    Box::new(move |cfg| cfg.from_name = from_name)
}

pub fn with_insecure_skip_verify(insecure_skip_verify: bool) -> ConfigOption {
    Box::new(move |cfg| cfg.insecure_skip_verify = insecure_skip_verify)
}

pub fn with_timeout(timeout: Duration) -> ConfigOption {
    Box::new(move |cfg| cfg.timeout = timeout)
}

pub fn with_keep_alive(keep_alive: bool) -> ConfigOption {
    Box::new(move |cfg| cfg.keep_alive = keep_alive)
}

pub fn with_auth_method(auth_method: impl Into<String>) -> ConfigOption {
    let auth_method = auth_method.into();
    Box::new(move |cfg| cfg.auth_method = auth_method)
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_options() -> Vec<ConfigOption> {
        Vec::new()
    }

    #[test]
    fn test_default_values() {
        let cfg = SmtpConfig::new(vec![with_username("testuser"), with_password("testpass")]);

        assert_eq!(cfg.host, "smtp.gmail.com");
        assert_eq!(cfg.port, 587);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.auth_method, "PLAIN");
        assert_eq!(cfg.username, "testuser");
        assert_eq!(cfg.password, "testpass");

        // Everything else stays zero-valued
        assert_eq!(cfg.from, "");
        assert_eq!(cfg.from_name, "");
        assert!(!cfg.insecure_skip_verify);
        assert!(!cfg.keep_alive);

        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_all_options_override_defaults() {
        let cfg = SmtpConfig::new(vec![
            with_host("mail.example.com"),
            with_port(465),
            with_username("user"),
            with_password("pass"),
            with_from("sender@example.com"),
            with_from_name("Sender Name"),
            with_insecure_skip_verify(true),
            with_timeout(Duration::from_secs(15)),
            with_keep_alive(true),
            with_auth_method("CRAM-MD5"),
        ]);

        let expected = SmtpConfig {
            host: "mail.example.com".to_string(),
            port: 465,
            username: "user".to_string(),
            password: "pass".to_string(),
            from: "sender@example.com".to_string(),
            from_name: "Sender Name".to_string(),
            insecure_skip_verify: true,
            timeout: Duration::from_secs(15),
            keep_alive: true,
            auth_method: "CRAM-MD5".to_string(),
        };
        assert_eq!(cfg, expected);
    }

    #[test]
    fn test_later_options_win() {
        let cfg = SmtpConfig::new(vec![
            with_host("a"),
            with_port(25),
            with_host("b"),
            with_keep_alive(true),
            with_keep_alive(false),
        ]);

        assert_eq!(cfg.host, "b");
        assert_eq!(cfg.port, 25);
        assert!(!cfg.keep_alive);
    }

    #[test]
    fn test_construction_never_fails_without_credentials() {
        let cfg = SmtpConfig::new(no_options());
        assert_eq!(cfg, SmtpConfig::default());
    }

    #[test]
    fn test_validation_through_constructor() {
        let cases: Vec<(&str, Vec<ConfigOption>, Option<&str>)> = vec![
            (
                "Missing username",
                vec![with_password("password")],
                Some("username is empty"),
            ),
            (
                "Missing password",
                vec![with_username("username")],
                Some("password is empty"),
            ),
            ("Missing both username and password", no_options(), Some("username is empty")),
            (
                "Valid config with required fields",
                vec![with_username("username"), with_password("password")],
                None,
            ),
        ];

        for (name, options, expected) in cases {
            let result = SmtpConfig::new_validated(options);
            match expected {
                Some(message) => {
                    let err = result.expect_err(name);
                    assert!(err.is_missing_credential(), "{}", name);
                    assert_eq!(err.to_string(), message, "{}", name);
                }
                None => assert!(result.is_ok(), "{}", name),
            }
        }
    }

    #[test]
    fn test_validate_directly() {
        let valid = SmtpConfig {
            username: "user".to_string(),
            password: "password".to_string(),
            ..SmtpConfig::default()
        };
        assert!(valid.validate().is_ok());

        let missing_username = SmtpConfig {
            password: "password".to_string(),
            ..SmtpConfig::default()
        };
        assert_eq!(
            missing_username.validate().unwrap_err().to_string(),
            "username is empty"
        );

        let missing_password = SmtpConfig {
            username: "user".to_string(),
            ..SmtpConfig::default()
        };
        assert_eq!(
            missing_password.validate().unwrap_err().to_string(),
            "password is empty"
        );
    }

    #[test]
    fn test_validate_ignores_other_fields() {
        // Zero-valued everything except credentials still passes
        let cfg = SmtpConfig {
            host: String::new(),
            port: 0,
            username: "u".to_string(),
            password: "p".to_string(),
            from: String::new(),
            from_name: String::new(),
            insecure_skip_verify: true,
            timeout: Duration::ZERO,
            keep_alive: true,
            auth_method: "BOGUS".to_string(),
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_is_repeatable_and_sees_later_mutation() {
        let mut cfg = SmtpConfig::new(vec![with_username("user")]);

        for _ in 0..3 {
            assert_eq!(cfg.validate().unwrap_err().to_string(), "password is empty");
        }

        cfg.password = "secret".to_string();
        assert!(cfg.validate().is_ok());
        assert!(cfg.validate().is_ok());

        cfg.username.clear();
        assert_eq!(cfg.validate().unwrap_err().to_string(), "username is empty");
    }

    #[test]
    fn test_apply_on_existing_config() {
        let mut cfg = SmtpConfig::new(vec![with_host("first.example.com")]);
        cfg.apply(vec![with_port(2525), with_host("second.example.com")]);

        assert_eq!(cfg.host, "second.example.com");
        assert_eq!(cfg.port, 2525);
        assert_eq!(cfg.auth_method, DEFAULT_AUTH_METHOD);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = SmtpConfig::from_json(r#"{"username":"user","password":"pass","port":465}"#)
            .unwrap();

        assert_eq!(cfg.host, DEFAULT_HOST);
        assert_eq!(cfg.port, 465);
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
        assert_eq!(cfg.auth_method, DEFAULT_AUTH_METHOD);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_json_stores_timeout_in_millis() {
        let cfg = SmtpConfig::new(vec![with_timeout(Duration::from_millis(1500))]);
        let json = cfg.to_json().unwrap();
        assert!(json.contains(r#""timeout_ms":1500"#));

        let parsed = SmtpConfig::from_json(&json).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let result = SmtpConfig::from_json(r#"{"port":"not a number"}"#);
        assert!(matches!(result, Err(ConfigError::Serialization(_))));
    }

    #[test]
    fn test_debug_masks_password() {
        let cfg = SmtpConfig::new(vec![with_username("user"), with_password("hunter22")]);
        let debug = format!("{:?}", cfg);
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("********"));
        assert!(debug.contains("user"));
    }

    #[test]
    fn test_options_are_independent_across_threads() {
        let handles: Vec<_> = (0..4u16)
            .map(|i| {
                std::thread::spawn(move || {
                    SmtpConfig::new(vec![with_port(1000 + i), with_username(format!("user{}", i))])
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let cfg = handle.join().unwrap();
            assert_eq!(cfg.port, 1000 + i as u16);
            assert_eq!(cfg.username, format!("user{}", i));
        }
    }
}
