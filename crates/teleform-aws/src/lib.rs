//! # Teleform AWS
//!
//! Resource handlers for AWS infrastructure, built around one generic
//! state-convergence engine.
//!
//! AWS mutations are asynchronous: creating an Elastic Beanstalk environment
//! returns long before the environment is usable, and IAM changes take a
//! while to propagate. Every handler in this crate issues its mutating call
//! and then hands off to [`converge::await_state`], which polls the resource
//! until it reaches a target status, fails, or runs out of time.
//!
//! ## Concepts
//!
//! - **Local definition**: the desired state of a resource, as written in
//!   your Rust code (or deserialized from a state file). This is the type
//!   implementing [`Resource`].
//! - **Remote output**: the state of the resource as it exists on AWS, as
//!   returned by the handlers ([`Resource::Output`]).
//!
//! Handlers are run through [`apply`], which logs each action, skips updates
//! to definitions that have not changed, and wraps failures in [`Error`] with
//! the resource's id. Existing infrastructure can be brought under management
//! with [`import`].
//!
//! The provider value ([`aws::Aws`]) is constructed explicitly and threaded
//! through every call. It owns the SDK clients, the wait configuration
//! ([`config::ProviderConfig`]) and a cancellation token that interrupts any
//! wait in progress.
//!
//! ## Error Handling
//!
//! Runner and configuration failures are reported as [`Error`]. Handlers
//! return `anyhow` errors with context naming the operation and resource.
//! Wait failures ([`converge::WaitError`]) always carry the resource id, the
//! last observed status and the elapsed time.

use std::future::Future;

use snafu::prelude::*;

pub mod aws;
pub mod config;
pub mod converge;
pub mod probe;
pub mod settings;
pub mod utils;

/// Marker trait for userland errors.
pub trait UserError: core::fmt::Display + core::fmt::Debug + Send + Sync + 'static {}
impl<T: core::fmt::Display + core::fmt::Debug + Send + Sync + 'static> UserError for T {}

/// Top-level error enum that encompasses all errors.
#[derive(snafu::Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{source}:\n{}",
                source.chain()
                    .map(|e| format!("{e}"))
                    .collect::<Vec<_>>()
                    .join("\n -> ")))]
    Tele { source: anyhow::Error },

    #[snafu(display("Error during '{name}' creation: {error}"))]
    Create {
        name: String,
        error: Box<dyn UserError>,
    },

    #[snafu(display("Error during '{name}' read: {error}"))]
    Read {
        name: String,
        error: Box<dyn UserError>,
    },

    #[snafu(display("Error during '{name}' update: {error}"))]
    Update {
        name: String,
        error: Box<dyn UserError>,
    },

    #[snafu(display("Error during '{name}' destruction: {error}"))]
    Destroy {
        name: String,
        error: Box<dyn UserError>,
    },

    #[snafu(display("Error during import of '{name}': {error}"))]
    Import {
        name: String,
        error: Box<dyn UserError>,
    },

    #[snafu(display("Could not read config file {path:?}: {source}"))]
    ReadConfig {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not parse config file {path:?}: {source}"))]
    ParseConfig {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },
}

impl From<anyhow::Error> for Error {
    fn from(source: anyhow::Error) -> Self {
        Error::Tele { source }
    }
}

type Result<T, E = Error> = core::result::Result<T, E>;

/// IaC resources.
///
/// Represents a resource created on a platform, described by its local
/// definition.
pub trait Resource:
    core::fmt::Debug + Clone + PartialEq + serde::Serialize + serde::de::DeserializeOwned + 'static
{
    /// Type of the platform/resource provider.
    ///
    /// For example [`aws::Aws`] in the case of amazon web services.
    type Provider;

    /// Errors that may occur interacting with the provider.
    type Error: UserError;

    /// The remote type of this resource.
    type Output: core::fmt::Debug
        + Clone
        + PartialEq
        + serde::Serialize
        + serde::de::DeserializeOwned
        + 'static;

    /// Creates a new resource on the platform, returning once it is usable.
    fn create(
        &self,
        provider: &Self::Provider,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>>;

    /// Reads the current state of a previously created resource.
    ///
    /// Returns `Ok(None)` if the resource no longer exists.
    fn read(
        &self,
        provider: &Self::Provider,
        previous_remote: &Self::Output,
    ) -> impl Future<Output = Result<Option<Self::Output>, Self::Error>>;

    /// Updates an existing resource on the platform.
    ///
    /// Takes the previous local and remote states of the resource.
    fn update(
        &self,
        provider: &Self::Provider,
        previous_local: &Self,
        previous_remote: &Self::Output,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>>;

    /// Deletes a resource from the platform, returning once it is gone.
    fn delete(
        &self,
        provider: &Self::Provider,
        previous_remote: &Self::Output,
    ) -> impl Future<Output = Result<(), Self::Error>>;
}

/// A configuration record synthesized from existing remote state.
///
/// These are handed back to the caller to merge into its own configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Imported<T> {
    /// Generated, unique identifier of the record.
    pub id: String,
    /// Name of the resource type, as the host knows it.
    pub type_name: String,
    /// The local definition, with only its identifying fields filled in.
    pub local: T,
}

/// Resources that can be brought under management from existing remote state.
pub trait Import: Resource {
    /// Name of the resource type, as the host knows it.
    const TYPE_NAME: &'static str;

    /// Synthesize records for everything found under `external_id`.
    ///
    /// A missing resource yields no records rather than an error.
    fn import(
        provider: &Self::Provider,
        external_id: &str,
    ) -> impl Future<Output = Result<Vec<Imported<Self>>, Self::Error>>;
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Action {
    Create,
    Read,
    Update,
    Destroy,
    Import,
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Destroy => "destroy",
            Action::Import => "import",
        })
    }
}

/// A change to apply to one resource.
#[derive(Debug)]
pub enum Change<'a, T: Resource> {
    Create(&'a T),
    Read {
        local: &'a T,
        remote: &'a T::Output,
    },
    Update {
        local: &'a T,
        previous_local: &'a T,
        previous_remote: &'a T::Output,
    },
    Destroy {
        local: &'a T,
        remote: &'a T::Output,
    },
}

impl<T: Resource> Change<'_, T> {
    pub fn action(&self) -> Action {
        match self {
            Change::Create(_) => Action::Create,
            Change::Read { .. } => Action::Read,
            Change::Update { .. } => Action::Update,
            Change::Destroy { .. } => Action::Destroy,
        }
    }
}

/// Run one change against the provider.
///
/// Returns the resource's remote output afterwards, or `None` if the resource
/// does not exist anymore (it was destroyed, or a read found it missing).
pub async fn apply<T: Resource>(
    provider: &T::Provider,
    resource_id: &str,
    change: Change<'_, T>,
) -> Result<Option<T::Output>> {
    let action = change.action();
    log::info!("{action} '{resource_id}':");

    let output = match change {
        Change::Create(local) => {
            let output = local.create(provider).await.map_err(|error| Error::Create {
                name: resource_id.to_owned(),
                error: Box::new(error),
            })?;
            Some(output)
        }
        Change::Read { local, remote } => {
            let output = local
                .read(provider, remote)
                .await
                .map_err(|error| Error::Read {
                    name: resource_id.to_owned(),
                    error: Box::new(error),
                })?;
            if output.is_none() {
                log::warn!("  '{resource_id}' no longer exists");
            }
            output
        }
        Change::Update {
            local,
            previous_local,
            previous_remote,
        } => {
            if previous_local == local {
                log::warn!(
                    "Skipping '{resource_id}' update as the local value has not changed.\n\
                    If you require an update, consider adding a sentinel value."
                );
                return Ok(Some(previous_remote.clone()));
            }
            let cmp = pretty_assertions::Comparison::new(previous_local, local);
            let change_string = format!("{cmp}")
                .lines()
                .map(|line| format!("  {line}"))
                .collect::<Vec<_>>()
                .join("\n");
            log::info!("updating '{resource_id}':\n{change_string}");
            let output = local
                .update(provider, previous_local, previous_remote)
                .await
                .map_err(|error| Error::Update {
                    name: resource_id.to_owned(),
                    error: Box::new(error),
                })?;
            Some(output)
        }
        Change::Destroy { local, remote } => {
            log::debug!("running destroy action on {resource_id}");
            local
                .delete(provider, remote)
                .await
                .map_err(|error| Error::Destroy {
                    name: resource_id.to_owned(),
                    error: Box::new(error),
                })?;
            log::info!("  {resource_id} is destroyed");
            None
        }
    };

    log::info!("  success!");
    Ok(output)
}

/// Synthesize configuration records for existing remote state.
pub async fn import<T: Import>(
    provider: &T::Provider,
    external_id: &str,
) -> Result<Vec<Imported<T>>> {
    log::info!("{} '{external_id}' as {}:", Action::Import, T::TYPE_NAME);
    let records = T::import(provider, external_id)
        .await
        .map_err(|error| Error::Import {
            name: external_id.to_owned(),
            error: Box::new(error),
        })?;
    if records.is_empty() {
        log::warn!("  nothing to import for '{external_id}'");
    }
    for record in records.iter() {
        log::debug!("  imported '{}'", record.id);
    }
    log::info!("  success!");
    Ok(records)
}
