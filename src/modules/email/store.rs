use keyring::Entry;
use log::info;

use super::config::SmtpConfig;
use super::error::ConfigError;

/// Keyring service under which the configuration is stored
pub const KEYRING_SERVICE: &str = "smtp-config";
/// Keyring entry name for the serialized configuration
pub const KEYRING_ENTRY: &str = "smtp-settings";

/// Persists an `SmtpConfig` in the system keyring as JSON
pub struct ConfigStore {
    keyring: Entry,
}

impl ConfigStore {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            keyring: Entry::new(KEYRING_SERVICE, KEYRING_ENTRY)?,
        })
    }

    /// Store the configuration, replacing any previous one
    pub fn save(&self, config: &SmtpConfig) -> Result<(), ConfigError> {
        let json = config.to_json()?;
        self.keyring.set_password(&json)?;
        info!("Stored SMTP configuration for host {}", config.host);
        Ok(())
    }

    /// Load the stored configuration. The result is not validated.
    pub fn load(&self) -> Result<SmtpConfig, ConfigError> {
        let json = self.keyring.get_password()?;
        SmtpConfig::from_json(&json)
    }

    /// Remove the stored configuration
    pub fn delete(&self) -> Result<(), ConfigError> {
        self.keyring.delete_password()?;
        info!("Deleted stored SMTP configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::config::{with_host, with_password, with_port, with_username};

    // Keyring access is not available in CI, so the store logic is
    // exercised against an in-memory slot holding the same JSON.
    struct MockConfigStore {
        stored: Option<String>,
    }

    impl MockConfigStore {
        fn new() -> Self {
            Self { stored: None }
        }

        fn save(&mut self, config: &SmtpConfig) -> Result<(), ConfigError> {
            self.stored = Some(config.to_json()?);
            Ok(())
        }

        fn load(&self) -> Result<SmtpConfig, ConfigError> {
            match &self.stored {
                Some(json) => SmtpConfig::from_json(json),
                None => Err(ConfigError::Storage(keyring::Error::NoEntry)),
            }
        }

        fn delete(&mut self) -> Result<(), ConfigError> {
            match self.stored.take() {
                Some(_) => Ok(()),
                None => Err(ConfigError::Storage(keyring::Error::NoEntry)),
            }
        }
    }

    #[test]
    fn test_config_store() {
        let mut store = MockConfigStore::new();

        // Initially, nothing stored
        assert!(store.load().is_err());

        let config = SmtpConfig::new(vec![
            with_host("smtp.example.com"),
            with_port(2525),
            with_username("test@example.com"),
            with_password("password123"),
        ]);
        assert!(store.save(&config).is_ok());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.validate().is_ok());

        assert!(store.delete().is_ok());
        assert!(store.load().is_err());
        assert!(store.delete().is_err());
    }

    #[test]
    fn test_load_does_not_validate() {
        let mut store = MockConfigStore::new();
        store.save(&SmtpConfig::default()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, SmtpConfig::default());
        assert_eq!(loaded.validate().unwrap_err().to_string(), "username is empty");
    }
}
