//! Connection options for the SMTP transport

use crate::transport::error::{FactoryError, SmtpLimits};
use crate::transport::spec::options_mapping;

use serde::Deserialize;
use serde_json::Value;

use std::time::Duration;

/// Options for [`SmtpTransport`](super::SmtpTransport)
///
/// Recognized keys: `name`, `host`, `port`, `timeout` and
/// `connection_time_limit` (both in seconds). Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmtpOptions {
    /// Name the client announces in HELO/EHLO
    pub name: String,

    /// Server host name or address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Connect, read and write timeout in seconds; `None` blocks indefinitely
    pub timeout: Option<u64>,

    /// Reconnect before sending once a connection is older than this many seconds
    pub connection_time_limit: Option<u64>,
}

impl Default for SmtpOptions {
    fn default() -> Self {
        Self {
            name: "localhost".to_string(),
            host: "127.0.0.1".to_string(),
            port: 25,
            timeout: Some(30),
            connection_time_limit: None,
        }
    }
}

impl SmtpOptions {
    /// Build and validate options from a spec's `options` value
    pub fn from_value(options: &Value) -> Result<Self, FactoryError> {
        let mapping = options_mapping(options).ok_or_else(|| {
            FactoryError::invalid_argument("smtp transport options must be a mapping")
        })?;
        let options: Self = serde_json::from_value(Value::Object(mapping)).map_err(|e| {
            FactoryError::invalid_argument(format!("invalid smtp transport options: {e}"))
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Check the option values
    pub fn validate(&self) -> Result<(), FactoryError> {
        if self.host.trim().is_empty() {
            return Err(FactoryError::invalid_argument("smtp host must not be empty"));
        }

        if self.port == 0 {
            return Err(FactoryError::invalid_argument(
                "smtp port must be between 1 and 65535",
            ));
        }

        if !is_hostname(&self.name) {
            return Err(FactoryError::invalid_argument(format!(
                "smtp name {:?} is not a valid host name",
                self.name
            )));
        }

        if self.timeout == Some(0) {
            return Err(FactoryError::invalid_argument("smtp timeout must be positive"));
        }

        Ok(())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    pub fn connection_time_limit(&self) -> Option<Duration> {
        self.connection_time_limit.map(Duration::from_secs)
    }
}

fn is_hostname(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= SmtpLimits::DOMAIN_MAX_LENGTH
        && name
            .split('.')
            .all(|label| {
                !label.is_empty()
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
            })
}
