//! Facade configuration.
//!
//! Durations are serialized as whole milliseconds so configuration files stay
//! readable:
//!
//! ```json
//! {
//!     "connect_timeout": 5000,
//!     "scheme": "srv",
//!     "retry": { "max_retries": 2, "initial_backoff": 50, "max_backoff": 500 }
//! }
//! ```

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    error::{FacadeError, FacadeResult},
    retry::RetryPolicy,
};


/// URI scheme used when building the connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionScheme {
    /// `mongodb+srv://`, resolved through DNS seed lists.
    #[default]
    Srv,
    /// `mongodb://`, for directly addressed hosts.
    Standard,
}

impl ConnectionScheme {
    pub fn prefix(&self) -> &'static str {
        match self {
            ConnectionScheme::Srv => "mongodb+srv://",
            ConnectionScheme::Standard => "mongodb://",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacadeConfig {
    /// Upper bound for establishing a connection.
    #[serde(with = "duration_ms")]
    pub connect_timeout: Duration,
    pub scheme: ConnectionScheme,
    /// Retry policy applied to mutating operations.
    pub retry: RetryPolicy,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            scheme: ConnectionScheme::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl FacadeConfig {
    /// Parses and validates a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(input: &str) -> FacadeResult<Self> {
        let config: FacadeConfig = serde_json::from_str(input)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> FacadeResult<()> {
        if self.connect_timeout.is_zero() {
            return Err(FacadeError::Configuration("connect_timeout must be greater than zero".into()));
        }
        if self.retry.initial_backoff > self.retry.max_backoff {
            return Err(FacadeError::Configuration(
                "retry.initial_backoff must not exceed retry.max_backoff".into(),
            ));
        }

        Ok(())
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_scheme(mut self, scheme: ConnectionScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Serde adapter storing a [`Duration`] as integer milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
