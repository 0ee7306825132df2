//! Provider configuration.
//!
//! How long to wait for each kind of operation, and how to pace the polling
//! while waiting. Remote-service SLAs vary with resource size, so none of
//! these are constants. Durations are written the human way (`"20m"`, `"3s"`).
//!
//! ```toml
//! [beanstalk]
//! create = "30m"
//! update = "30m"
//! delete = "20m"
//!
//! [beanstalk.polling]
//! delay = "10s"
//! min_interval = "3s"
//! interval = "10s"
//! max_interval = "1m"
//! backoff = 1.5
//!
//! [iam]
//! create = "2m"
//! delete = "2m"
//! ```
use std::time::Duration;

use snafu::prelude::*;

use crate::{Error, ParseConfigSnafu, ReadConfigSnafu};

/// Pacing of the polls within a wait.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Polling {
    /// Wait before the first poll.
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    /// The interval never shrinks below this.
    #[serde(with = "humantime_serde")]
    pub min_interval: Duration,
    /// The first sleep between polls.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// The interval never grows past this.
    #[serde(with = "humantime_serde")]
    pub max_interval: Duration,
    /// Multiplier applied to the interval after each sleep.
    pub backoff: f64,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            min_interval: Duration::from_secs(3),
            interval: Duration::from_secs(10),
            max_interval: Duration::from_secs(60),
            backoff: 1.5,
        }
    }
}

/// Timeouts and polling for one resource type.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ResourceWaits {
    #[serde(with = "humantime_serde")]
    pub create: Duration,
    #[serde(with = "humantime_serde")]
    pub update: Duration,
    #[serde(with = "humantime_serde")]
    pub delete: Duration,
    pub polling: Polling,
}

impl Default for ResourceWaits {
    fn default() -> Self {
        Self::beanstalk()
    }
}

impl ResourceWaits {
    /// Elastic Beanstalk environments take minutes to launch or terminate.
    pub fn beanstalk() -> Self {
        let twenty_minutes = Duration::from_secs(20 * 60);
        Self {
            create: twenty_minutes,
            update: twenty_minutes,
            delete: twenty_minutes,
            polling: Polling {
                delay: Duration::from_secs(10),
                ..Default::default()
            },
        }
    }

    /// IAM changes only need to propagate.
    pub fn iam() -> Self {
        let two_minutes = Duration::from_secs(2 * 60);
        Self {
            create: two_minutes,
            update: two_minutes,
            delete: two_minutes,
            polling: Polling {
                delay: Duration::ZERO,
                min_interval: Duration::from_secs(1),
                interval: Duration::from_secs(1),
                max_interval: Duration::from_secs(10),
                backoff: 2.0,
            },
        }
    }

    /// These waits, with the timeouts and poll interval of one resource
    /// overriding them where given.
    ///
    /// A poll interval override polls at that fixed pace, without backoff.
    pub fn overridden(&self, timeout: Option<Duration>, poll_interval: Option<Duration>) -> Self {
        let mut waits = self.clone();
        if let Some(timeout) = timeout {
            waits.create = timeout;
            waits.update = timeout;
            waits.delete = timeout;
        }
        if let Some(interval) = poll_interval {
            waits.polling = Polling {
                delay: self.polling.delay,
                min_interval: interval,
                interval,
                max_interval: interval,
                backoff: 1.0,
            };
        }
        waits
    }
}

/// Waits for every resource type the provider handles.
///
/// Keys missing from a table fall back to the general defaults of
/// [`ResourceWaits::default`], missing tables to the per-resource ones.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "ResourceWaits::beanstalk")]
    pub beanstalk: ResourceWaits,
    #[serde(default = "ResourceWaits::iam")]
    pub iam: ResourceWaits,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            beanstalk: ResourceWaits::beanstalk(),
            iam: ResourceWaits::iam(),
        }
    }
}

impl ProviderConfig {
    pub fn from_toml_str(contents: &str, path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        toml::from_str(contents).context(ParseConfigSnafu {
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Read the configuration from a TOML file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        log::debug!("reading provider config from {path:?}");
        let contents = std::fs::read_to_string(path).context(ReadConfigSnafu { path })?;
        Self::from_toml_str(&contents, path)
    }
}
