//! Example: managing an Elastic Beanstalk environment and IAM policy
//! attachments from the command line.
//!
//! The state of each managed resource (its local definition and last known
//! remote output) is kept in a JSON file under `--state-dir`. Run with
//! `RUST_LOG=info` to see what the handlers do under the hood.
//!
//! ```sh
//! cargo run -p teleform-aws-example -- env apply web --definition web.json
//! cargo run -p teleform-aws-example -- env read web
//! cargo run -p teleform-aws-example -- env destroy web --force
//! cargo run -p teleform-aws-example -- attachment import app-role
//! ```
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tele_aws::{
    aws::{beanstalk::Environment, iam::RolePolicyAttachment, Aws},
    config::ProviderConfig,
    Change, Resource,
};

#[derive(Parser)]
#[command(name = "infra", about = "Manage Elastic Beanstalk and IAM infrastructure")]
struct Cli {
    /// Directory for resource state files.
    #[arg(long, default_value = "state")]
    state_dir: PathBuf,

    /// TOML file with wait timeouts and polling.
    #[arg(long, env = "INFRA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Elastic Beanstalk environments.
    Env {
        #[command(subcommand)]
        action: EnvAction,
    },
    /// IAM role policy attachments.
    Attachment {
        #[command(subcommand)]
        action: AttachmentAction,
    },
}

#[derive(Subcommand)]
enum EnvAction {
    /// Create the environment, or update it to match its definition.
    Apply {
        id: String,
        /// JSON file with the environment definition.
        #[arg(long)]
        definition: PathBuf,
    },
    /// Refresh the stored state of the environment.
    Read { id: String },
    /// Terminate the environment.
    Destroy {
        id: String,
        #[clap(long, short, default_value = "false")]
        force: bool,
    },
}

#[derive(Subcommand)]
enum AttachmentAction {
    /// Attach a policy to a role.
    Apply {
        id: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        policy_arn: String,
    },
    /// Refresh the stored state of the attachment.
    Read { id: String },
    /// Detach the policy.
    Destroy {
        id: String,
        #[clap(long, short, default_value = "false")]
        force: bool,
    },
    /// Print an attachment record for every policy attached to a role.
    Import { role: String },
}

/// What we know about one resource between runs.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(bound = "")]
struct State<T: Resource> {
    local: T,
    remote: T::Output,
}

fn state_path(state_dir: &Path, id: &str) -> PathBuf {
    state_dir.join(format!("{id}.json"))
}

async fn load<T: Resource>(state_dir: &Path, id: &str) -> anyhow::Result<Option<State<T>>> {
    let path = state_path(state_dir, id);
    if !path.exists() {
        log::debug!("no state file for '{id}' at {path:?}");
        return Ok(None);
    }
    let contents = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("could not read state file {path:?}"))?;
    let state = serde_json::from_str(&contents)
        .with_context(|| format!("could not deserialize state file {path:?}"))?;
    Ok(Some(state))
}

async fn save<T: Resource>(state_dir: &Path, id: &str, state: &State<T>) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(state_dir)
        .await
        .with_context(|| format!("could not create state dir {state_dir:?}"))?;
    let path = state_path(state_dir, id);
    log::info!("storing {id} to {path:?}");
    let contents = serde_json::to_string_pretty(state)
        .with_context(|| format!("could not serialize state of '{id}'"))?;
    tokio::fs::write(&path, contents)
        .await
        .with_context(|| format!("could not write state file {path:?}"))
}

async fn forget(state_dir: &Path, id: &str) -> anyhow::Result<()> {
    let path = state_path(state_dir, id);
    log::info!("  removing {id} state file {path:?}");
    tokio::fs::remove_file(&path)
        .await
        .with_context(|| format!("could not delete state file {path:?}"))
}

async fn apply_resource<T: Resource<Provider = Aws>>(
    aws: &Aws,
    state_dir: &Path,
    id: &str,
    local: T,
) -> anyhow::Result<()> {
    let change = match load::<T>(state_dir, id).await? {
        None => tele_aws::apply(aws, id, Change::Create(&local)).await?,
        Some(previous) => {
            tele_aws::apply(
                aws,
                id,
                Change::Update {
                    local: &local,
                    previous_local: &previous.local,
                    previous_remote: &previous.remote,
                },
            )
            .await?
        }
    };
    let remote = change.with_context(|| format!("'{id}' has no remote state after applying"))?;
    println!("{}", serde_json::to_string_pretty(&remote)?);
    save(state_dir, id, &State { local, remote }).await
}

async fn read_resource<T: Resource<Provider = Aws>>(
    aws: &Aws,
    state_dir: &Path,
    id: &str,
) -> anyhow::Result<()> {
    let state = load::<T>(state_dir, id)
        .await?
        .with_context(|| format!("'{id}' is not managed here"))?;
    let read = tele_aws::apply(
        aws,
        id,
        Change::Read {
            local: &state.local,
            remote: &state.remote,
        },
    )
    .await?;
    match read {
        Some(remote) => {
            println!("{}", serde_json::to_string_pretty(&remote)?);
            save(
                state_dir,
                id,
                &State {
                    local: state.local,
                    remote,
                },
            )
            .await
        }
        None => {
            println!("'{id}' no longer exists");
            forget(state_dir, id).await
        }
    }
}

async fn destroy_resource<T: Resource<Provider = Aws>>(
    aws: &Aws,
    state_dir: &Path,
    id: &str,
    force: bool,
) -> anyhow::Result<()> {
    let state = load::<T>(state_dir, id)
        .await?
        .with_context(|| format!("'{id}' is not managed here"))?;
    if !force {
        println!("Would destroy '{id}':\n{:#?}", state.remote);
        println!();
        println!("Please call `destroy --force` to delete it.");
        return Ok(());
    }
    tele_aws::apply(
        aws,
        id,
        Change::Destroy {
            local: &state.local,
            remote: &state.remote,
        },
    )
    .await?;
    forget(state_dir, id).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match cli.config.as_ref() {
        Some(path) => ProviderConfig::load(path)?,
        None => ProviderConfig::default(),
    };
    log::debug!("using {config:#?}");
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let aws = Aws::new(&sdk_config, config);

    let cancel = aws.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupted, stopping at the next poll");
            cancel.cancel();
        }
    });

    let state_dir = cli.state_dir.as_path();
    match cli.command {
        Command::Env { action } => match action {
            EnvAction::Apply { id, definition } => {
                let contents = tokio::fs::read_to_string(&definition)
                    .await
                    .with_context(|| format!("could not read definition {definition:?}"))?;
                let env: Environment = serde_json::from_str(&contents)
                    .with_context(|| format!("invalid environment definition {definition:?}"))?;
                apply_resource(&aws, state_dir, &id, env).await?;
            }
            EnvAction::Read { id } => read_resource::<Environment>(&aws, state_dir, &id).await?,
            EnvAction::Destroy { id, force } => {
                destroy_resource::<Environment>(&aws, state_dir, &id, force).await?
            }
        },
        Command::Attachment { action } => match action {
            AttachmentAction::Apply {
                id,
                role,
                policy_arn,
            } => {
                apply_resource(&aws, state_dir, &id, RolePolicyAttachment { role, policy_arn })
                    .await?;
            }
            AttachmentAction::Read { id } => {
                read_resource::<RolePolicyAttachment>(&aws, state_dir, &id).await?
            }
            AttachmentAction::Destroy { id, force } => {
                destroy_resource::<RolePolicyAttachment>(&aws, state_dir, &id, force).await?
            }
            AttachmentAction::Import { role } => {
                let records = tele_aws::import::<RolePolicyAttachment>(&aws, &role).await?;
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
        },
    }
    Ok(())
}
