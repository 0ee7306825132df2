//! Teleform for AWS.
pub use aws_config::SdkConfig;
use tokio_util::sync::CancellationToken;

use crate::config::ProviderConfig;

pub mod beanstalk;
pub mod iam;
#[cfg(test)]
mod test;

/// The AWS provider.
///
/// Holds the service clients, the wait configuration and a cancellation
/// token. Cancelling the token interrupts every wait in progress at its next
/// poll boundary.
#[derive(Clone, Debug)]
pub struct Aws {
    pub beanstalk: aws_sdk_elasticbeanstalk::Client,
    pub iam: aws_sdk_iam::Client,
    pub config: ProviderConfig,
    pub cancel: CancellationToken,
}

impl Aws {
    pub fn new(sdk_config: &SdkConfig, config: ProviderConfig) -> Self {
        Self {
            beanstalk: aws_sdk_elasticbeanstalk::Client::new(sdk_config),
            iam: aws_sdk_iam::Client::new(sdk_config),
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
