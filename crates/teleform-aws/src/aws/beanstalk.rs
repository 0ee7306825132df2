//! Elastic Beanstalk environments.
//!
//! Environments take minutes to launch, update or terminate. Each handler
//! issues its call and then waits on the environment's status with
//! [`EnvironmentProbe`]. The probe also watches the environment's ERROR
//! events, so a failed launch aborts the wait instead of running out the
//! clock.
use std::{
    collections::BTreeMap,
    future::Future,
    time::{Duration, SystemTime},
};

use anyhow::Context;
use aws_sdk_elasticbeanstalk::{
    primitives::DateTime,
    types::{self, EventSeverity},
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ResourceWaits,
    converge::{await_state, ConvergenceSpec, NotFound},
    probe::{ErrorCodes, Probe, Refresh, RemoteError, StatusObservation},
    settings::{reconcile, OptionSetting, OptionSettings, ReconciliationPlan},
    Resource,
};

use super::Aws;

pub const LAUNCHING: &str = "Launching";
pub const UPDATING: &str = "Updating";
pub const READY: &str = "Ready";
pub const TERMINATING: &str = "Terminating";
pub const TERMINATED: &str = "Terminated";

pub const ERROR_CODES: ErrorCodes =
    ErrorCodes::new(&["InvalidBeanstalkEnvID.NotFound", "InvalidConfiguration.NotFound"])
        .with_transient(&["OperationInProgressFailure"]);

/// Terminating an environment that is already gone fails validation.
///
/// `ValidationError` is not specific to missing environments, so
/// [`delete_environment`] confirms a "not found" with a describe.
pub const TERMINATE_ERROR_CODES: ErrorCodes = ErrorCodes::new(&[
    "InvalidBeanstalkEnvID.NotFound",
    "InvalidConfiguration.NotFound",
    "ValidationError",
])
.with_transient(&["OperationInProgressFailure"]);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Tier {
    #[default]
    WebServer,
    Worker,
}

impl Tier {
    fn to_sdk(self) -> types::EnvironmentTier {
        let (name, ty) = match self {
            Tier::WebServer => ("WebServer", "Standard"),
            Tier::Worker => ("Worker", "SQS/HTTP"),
        };
        types::EnvironmentTier::builder()
            .name(name)
            .r#type(ty)
            .version("1.0")
            .build()
    }

    fn from_sdk(tier: &types::EnvironmentTier) -> Option<Self> {
        match tier.name.as_deref()? {
            "WebServer" => Some(Tier::WebServer),
            "Worker" => Some(Tier::Worker),
            _ => None,
        }
    }
}

/// Local definition of an Elastic Beanstalk environment.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Environment {
    pub name: String,
    pub application: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname_prefix: Option<String>,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_stack_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_label: Option<String>,
    #[serde(default)]
    pub settings: OptionSettings,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// How long to wait for this environment to launch, update or terminate,
    /// instead of the provider's timeouts.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub wait_for_ready_timeout: Option<Duration>,
    /// Fixed pace for polling this environment, instead of the provider's.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<Duration>,
}

impl Environment {
    /// The provider's waits, with this environment's overrides applied.
    pub fn waits(&self, provider: &ResourceWaits) -> ResourceWaits {
        provider.overridden(self.wait_for_ready_timeout, self.poll_interval)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.solution_stack_name.is_some() != self.template_name.is_some(),
            "environment '{}' needs exactly one of a solution stack name or a template name",
            self.name
        );
        anyhow::ensure!(
            !(self.tier == Tier::Worker && self.cname_prefix.is_some()),
            "environment '{}' is a worker, which cannot have a cname prefix",
            self.name
        );
        Ok(())
    }
}

/// An environment as described by the service.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentDescription {
    pub id: String,
    pub arn: Option<String>,
    pub name: String,
    pub application: String,
    pub status: String,
    pub health: Option<String>,
    pub cname: Option<String>,
    pub endpoint_url: Option<String>,
    pub version_label: Option<String>,
    pub solution_stack_name: Option<String>,
    pub template_name: Option<String>,
    pub description: Option<String>,
    pub tier: Option<Tier>,
}

impl From<types::EnvironmentDescription> for EnvironmentDescription {
    fn from(env: types::EnvironmentDescription) -> Self {
        let tier = env.tier.as_ref().and_then(Tier::from_sdk);
        Self {
            id: env.environment_id.unwrap_or_default(),
            arn: env.environment_arn,
            name: env.environment_name.unwrap_or_default(),
            application: env.application_name.unwrap_or_default(),
            status: env
                .status
                .map(|status| status.as_str().to_owned())
                .unwrap_or_default(),
            health: env.health.map(|health| health.as_str().to_owned()),
            cname: env.cname,
            endpoint_url: env.endpoint_url,
            version_label: env.version_label,
            solution_stack_name: env.solution_stack_name,
            template_name: env.template_name,
            description: env.description,
            tier,
        }
    }
}

/// AWS resources backing an environment.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentResources {
    pub autoscaling_groups: Vec<String>,
    pub instances: Vec<String>,
    pub launch_configurations: Vec<String>,
    pub load_balancers: Vec<String>,
    pub queues: Vec<String>,
    pub triggers: Vec<String>,
}

fn names<T>(items: Option<Vec<T>>, name: impl Fn(T) -> Option<String>) -> Vec<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .filter_map(name)
        .collect()
}

impl From<types::EnvironmentResourceDescription> for EnvironmentResources {
    fn from(resources: types::EnvironmentResourceDescription) -> Self {
        Self {
            autoscaling_groups: names(resources.auto_scaling_groups, |group| group.name),
            instances: names(resources.instances, |instance| instance.id),
            launch_configurations: names(resources.launch_configurations, |config| config.name),
            load_balancers: names(resources.load_balancers, |lb| lb.name),
            queues: names(resources.queues, |queue| queue.url),
            triggers: names(resources.triggers, |trigger| trigger.name),
        }
    }
}

/// Remote state of an environment.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentOutput {
    pub id: String,
    pub arn: Option<String>,
    pub name: String,
    pub application: String,
    pub cname: Option<String>,
    pub endpoint_url: Option<String>,
    pub status: String,
    pub health: Option<String>,
    pub version_label: Option<String>,
    /// Server values of the settings the local definition manages.
    pub settings: Vec<OptionSetting>,
    pub all_settings: Vec<OptionSetting>,
    pub resources: EnvironmentResources,
}

/// The parts of an environment an update changes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnvironmentUpdate {
    pub description: Option<String>,
    pub solution_stack_name: Option<String>,
    pub template_name: Option<String>,
    pub version_label: Option<String>,
    pub settings: ReconciliationPlan,
}

fn changed(previous: &Option<String>, desired: &Option<String>) -> Option<String> {
    if previous == desired {
        None
    } else {
        desired.clone()
    }
}

impl EnvironmentUpdate {
    /// The update moving `previous` to `desired`, given the current server
    /// values of the managed settings.
    pub fn between(
        previous: &Environment,
        desired: &Environment,
        current_settings: &[OptionSetting],
    ) -> Self {
        let description = if previous.description == desired.description {
            None
        } else {
            Some(desired.description.clone().unwrap_or_default())
        };
        Self {
            description,
            solution_stack_name: changed(
                &previous.solution_stack_name,
                &desired.solution_stack_name,
            ),
            template_name: changed(&previous.template_name, &desired.template_name),
            version_label: changed(&previous.version_label, &desired.version_label),
            settings: reconcile(current_settings, &desired.settings),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.solution_stack_name.is_none()
            && self.template_name.is_none()
            && self.version_label.is_none()
            && self.settings.is_empty()
    }
}

/// The Elastic Beanstalk calls environment handlers make.
pub trait EnvironmentApi {
    /// Start creating the environment, returning its id.
    fn create(&self, env: &Environment) -> impl Future<Output = Result<String, RemoteError>>;

    /// Describe the environment with the given id.
    fn describe(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Vec<EnvironmentDescription>, RemoteError>>;

    /// Messages of ERROR events emitted for the environment since `since`.
    fn error_events(
        &self,
        id: &str,
        since: SystemTime,
    ) -> impl Future<Output = Result<Vec<String>, RemoteError>>;

    /// Every configuration option setting of the environment.
    fn settings(
        &self,
        application: &str,
        name: &str,
    ) -> impl Future<Output = Result<Vec<OptionSetting>, RemoteError>>;

    fn resources(&self, id: &str)
        -> impl Future<Output = Result<EnvironmentResources, RemoteError>>;

    fn update(
        &self,
        id: &str,
        update: &EnvironmentUpdate,
    ) -> impl Future<Output = Result<(), RemoteError>>;

    fn update_tags(
        &self,
        arn: &str,
        add: &BTreeMap<String, String>,
        remove: &[String],
    ) -> impl Future<Output = Result<(), RemoteError>>;

    fn terminate(&self, id: &str) -> impl Future<Output = Result<(), RemoteError>>;
}

fn sdk_setting(setting: &OptionSetting) -> types::ConfigurationOptionSetting {
    types::ConfigurationOptionSetting::builder()
        .namespace(&setting.namespace)
        .set_resource_name(setting.resource.clone())
        .option_name(&setting.name)
        .value(&setting.value)
        .build()
}

fn from_sdk_setting(setting: types::ConfigurationOptionSetting) -> Option<OptionSetting> {
    Some(OptionSetting {
        namespace: setting.namespace?,
        resource: setting.resource_name,
        name: setting.option_name?,
        value: setting.value.unwrap_or_default(),
    })
}

fn sdk_tags(tags: &BTreeMap<String, String>) -> Vec<types::Tag> {
    tags.iter()
        .map(|(key, value)| types::Tag::builder().key(key).value(value).build())
        .collect()
}

impl EnvironmentApi for aws_sdk_elasticbeanstalk::Client {
    async fn create(&self, env: &Environment) -> Result<String, RemoteError> {
        let out = self
            .create_environment()
            .application_name(&env.application)
            .environment_name(&env.name)
            .set_description(env.description.clone())
            .set_cname_prefix(env.cname_prefix.clone())
            .tier(env.tier.to_sdk())
            .set_solution_stack_name(env.solution_stack_name.clone())
            .set_template_name(env.template_name.clone())
            .set_version_label(env.version_label.clone())
            .set_option_settings(Some(env.settings.iter().map(sdk_setting).collect()))
            .set_tags(Some(sdk_tags(&env.tags)))
            .send()
            .await
            .map_err(|e| ERROR_CODES.classify(e))?;
        log::trace!("create environment output: {out:#?}");
        out.environment_id
            .ok_or_else(|| RemoteError::permanent("CreateEnvironment returned no environment id"))
    }

    async fn describe(&self, id: &str) -> Result<Vec<EnvironmentDescription>, RemoteError> {
        let out = self
            .describe_environments()
            .environment_ids(id)
            .include_deleted(false)
            .send()
            .await
            .map_err(|e| ERROR_CODES.classify(e))?;
        Ok(out
            .environments
            .unwrap_or_default()
            .into_iter()
            .map(EnvironmentDescription::from)
            .collect())
    }

    async fn error_events(&self, id: &str, since: SystemTime) -> Result<Vec<String>, RemoteError> {
        let out = self
            .describe_events()
            .environment_id(id)
            .severity(EventSeverity::Error)
            .start_time(DateTime::from(since))
            .send()
            .await
            .map_err(|e| ERROR_CODES.classify(e))?;
        Ok(names(out.events, |event| event.message))
    }

    async fn settings(
        &self,
        application: &str,
        name: &str,
    ) -> Result<Vec<OptionSetting>, RemoteError> {
        let out = self
            .describe_configuration_settings()
            .application_name(application)
            .environment_name(name)
            .send()
            .await
            .map_err(|e| ERROR_CODES.classify(e))?;
        let mut descriptions = out.configuration_settings.unwrap_or_default();
        if descriptions.len() != 1 {
            return Err(RemoteError::permanent(format!(
                "expected one set of configuration settings for environment '{name}', got {}",
                descriptions.len()
            )));
        }
        let description = descriptions.remove(0);
        Ok(description
            .option_settings
            .unwrap_or_default()
            .into_iter()
            .filter_map(from_sdk_setting)
            .collect())
    }

    async fn resources(&self, id: &str) -> Result<EnvironmentResources, RemoteError> {
        let out = self
            .describe_environment_resources()
            .environment_id(id)
            .send()
            .await
            .map_err(|e| ERROR_CODES.classify(e))?;
        Ok(out
            .environment_resources
            .map(EnvironmentResources::from)
            .unwrap_or_default())
    }

    async fn update(&self, id: &str, update: &EnvironmentUpdate) -> Result<(), RemoteError> {
        let ReconciliationPlan {
            removals,
            applications,
        } = &update.settings;
        let options_to_remove = removals
            .iter()
            .map(|key| {
                types::OptionSpecification::builder()
                    .namespace(&key.namespace)
                    .set_resource_name(key.resource.clone())
                    .option_name(&key.name)
                    .build()
            })
            .collect::<Vec<_>>();
        let _ = self
            .update_environment()
            .environment_id(id)
            .set_description(update.description.clone())
            .set_solution_stack_name(update.solution_stack_name.clone())
            .set_template_name(update.template_name.clone())
            .set_version_label(update.version_label.clone())
            .set_option_settings(
                (!applications.is_empty()).then(|| applications.iter().map(sdk_setting).collect()),
            )
            .set_options_to_remove((!options_to_remove.is_empty()).then_some(options_to_remove))
            .send()
            .await
            .map_err(|e| ERROR_CODES.classify(e))?;
        Ok(())
    }

    async fn update_tags(
        &self,
        arn: &str,
        add: &BTreeMap<String, String>,
        remove: &[String],
    ) -> Result<(), RemoteError> {
        let _ = self
            .update_tags_for_resource()
            .resource_arn(arn)
            .set_tags_to_add((!add.is_empty()).then(|| sdk_tags(add)))
            .set_tags_to_remove((!remove.is_empty()).then(|| remove.to_vec()))
            .send()
            .await
            .map_err(|e| ERROR_CODES.classify(e))?;
        Ok(())
    }

    async fn terminate(&self, id: &str) -> Result<(), RemoteError> {
        let _ = self
            .terminate_environment()
            .environment_id(id)
            .terminate_resources(true)
            .send()
            .await
            .map_err(|e| TERMINATE_ERROR_CODES.classify(e))?;
        Ok(())
    }
}

/// Probes an environment's status by id.
pub struct EnvironmentProbe<'a, A> {
    api: &'a A,
}

impl<'a, A: EnvironmentApi> EnvironmentProbe<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }
}

impl<A: EnvironmentApi> Probe for EnvironmentProbe<'_, A> {
    type Detail = EnvironmentDescription;

    async fn probe(
        &self,
        id: &str,
        since: SystemTime,
    ) -> Result<StatusObservation<EnvironmentDescription>, RemoteError> {
        let mut environments = self.api.describe(id).await?;
        match environments.len() {
            0 => return Err(RemoteError::not_found(format!("environment '{id}' not found"))),
            1 => {}
            n => {
                return Err(RemoteError::permanent(format!(
                    "{n} environments match '{id}', expected 1"
                )))
            }
        }
        let env = environments.remove(0);
        if env.id != id {
            return Err(RemoteError::permanent(format!(
                "looked for environment '{id}' but got '{}'",
                env.id
            )));
        }

        let errors = self.api.error_events(id, since).await?;
        if !errors.is_empty() {
            return Err(RemoteError::permanent(format!(
                "environment '{id}' reported errors:\n{}",
                errors.join("\n")
            )));
        }

        Ok(StatusObservation::new(env.status.clone()).with_detail(env))
    }
}

async fn read_back<A: EnvironmentApi>(
    api: &A,
    env: &Environment,
    description: EnvironmentDescription,
) -> anyhow::Result<EnvironmentOutput> {
    let id = description.id;
    let all_settings = api
        .settings(&description.application, &description.name)
        .await
        .with_context(|| format!("could not read settings of environment '{id}'"))?;
    let managed = env.settings.keys().collect::<std::collections::HashSet<_>>();
    let settings = all_settings
        .iter()
        .filter(|setting| managed.contains(&setting.key()))
        .cloned()
        .collect();
    let resources = api
        .resources(&id)
        .await
        .with_context(|| format!("could not read resources of environment '{id}'"))?;
    Ok(EnvironmentOutput {
        id,
        arn: description.arn,
        name: description.name,
        application: description.application,
        cname: description.cname,
        endpoint_url: description.endpoint_url,
        status: description.status,
        health: description.health,
        version_label: description.version_label,
        settings,
        all_settings,
        resources,
    })
}

async fn wait_for<A: EnvironmentApi>(
    api: &A,
    spec: ConvergenceSpec,
    cancel: &CancellationToken,
) -> anyhow::Result<Option<EnvironmentDescription>> {
    let outcome = await_state(&spec, &EnvironmentProbe::new(api), cancel).await?;
    Ok(outcome
        .into_observation()
        .and_then(|observation| observation.detail))
}

async fn wait_until_ready<A: EnvironmentApi>(
    api: &A,
    id: &str,
    pending: &str,
    timeout: Duration,
    waits: &ResourceWaits,
    cancel: &CancellationToken,
) -> anyhow::Result<EnvironmentDescription> {
    let spec = ConvergenceSpec::new(id, timeout)
        .pending([pending])
        .target([READY])
        .polling(waits.polling.clone());
    wait_for(api, spec, cancel)
        .await?
        .with_context(|| format!("environment '{id}' became ready without a description"))
}

pub async fn create_environment<A: EnvironmentApi>(
    api: &A,
    waits: &ResourceWaits,
    cancel: &CancellationToken,
    env: &Environment,
) -> anyhow::Result<EnvironmentOutput> {
    env.validate()?;
    let id = api
        .create(env)
        .await
        .with_context(|| format!("could not create environment '{}'", env.name))?;
    log::info!("  launching environment '{}' as {id}", env.name);
    let description = wait_until_ready(api, &id, LAUNCHING, waits.create, waits, cancel)
        .await
        .with_context(|| format!("environment '{}' ({id}) did not launch", env.name))?;
    read_back(api, env, description).await
}

pub async fn read_environment<A: EnvironmentApi>(
    api: &A,
    env: &Environment,
    previous_remote: &EnvironmentOutput,
) -> anyhow::Result<Option<EnvironmentOutput>> {
    let id = previous_remote.id.as_str();
    let refresh = Refresh::new(EnvironmentProbe::new(api), id);
    let observation = refresh
        .refresh()
        .await
        .with_context(|| format!("could not read environment '{id}'"))?;
    match observation {
        None => Ok(None),
        Some(observation) if observation.status == TERMINATED => Ok(None),
        Some(observation) => {
            let description = observation
                .detail
                .with_context(|| format!("missing description of environment '{id}'"))?;
            Ok(Some(read_back(api, env, description).await?))
        }
    }
}

pub async fn update_environment<A: EnvironmentApi>(
    api: &A,
    waits: &ResourceWaits,
    cancel: &CancellationToken,
    env: &Environment,
    previous_local: &Environment,
    previous_remote: &EnvironmentOutput,
) -> anyhow::Result<EnvironmentOutput> {
    env.validate()?;
    let id = previous_remote.id.as_str();
    for (field, unchanged) in [
        ("name", env.name == previous_local.name),
        ("application", env.application == previous_local.application),
        ("tier", env.tier == previous_local.tier),
        ("cname prefix", env.cname_prefix == previous_local.cname_prefix),
    ] {
        anyhow::ensure!(
            unchanged,
            "changing the {field} of environment '{id}' requires replacing it"
        );
    }
    // UpdateEnvironment has no way to undeploy a version.
    anyhow::ensure!(
        env.version_label.is_some() || previous_local.version_label.is_none(),
        "environment '{id}' cannot drop its version label {:?}, deploy another version instead",
        previous_local.version_label.as_deref().unwrap_or_default()
    );

    let mut description = None;
    let update = EnvironmentUpdate::between(previous_local, env, &previous_remote.settings);
    if update.is_empty() {
        log::debug!("  environment '{id}' needs no configuration update");
    } else {
        log::debug!("  updating environment '{id}' with {update:#?}");
        api.update(id, &update)
            .await
            .with_context(|| format!("could not update environment '{id}'"))?;
        description = Some(
            wait_until_ready(api, id, UPDATING, waits.update, waits, cancel)
                .await
                .with_context(|| format!("environment '{id}' did not finish updating"))?,
        );
    }

    if env.tags != previous_local.tags {
        let add = env
            .tags
            .iter()
            .filter(|(key, value)| previous_local.tags.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<BTreeMap<_, _>>();
        let remove = previous_local
            .tags
            .keys()
            .filter(|key| !env.tags.contains_key(*key))
            .cloned()
            .collect::<Vec<_>>();
        let arn = previous_remote
            .arn
            .as_deref()
            .with_context(|| format!("cannot update tags of environment '{id}' - missing arn"))?;
        log::debug!("  tagging environment '{id}': add {add:?}, remove {remove:?}");
        api.update_tags(arn, &add, &remove)
            .await
            .with_context(|| format!("could not update tags of environment '{id}'"))?;
        description = Some(
            wait_until_ready(api, id, UPDATING, waits.update, waits, cancel)
                .await
                .with_context(|| format!("environment '{id}' did not finish tagging"))?,
        );
    }

    let description = match description {
        Some(description) => description,
        None => Refresh::new(EnvironmentProbe::new(api), id)
            .refresh()
            .await?
            .and_then(|observation| observation.detail)
            .with_context(|| format!("environment '{id}' no longer exists"))?,
    };
    read_back(api, env, description).await
}

pub async fn delete_environment<A: EnvironmentApi>(
    api: &A,
    waits: &ResourceWaits,
    cancel: &CancellationToken,
    previous_remote: &EnvironmentOutput,
) -> anyhow::Result<()> {
    let id = previous_remote.id.as_str();
    match api.terminate(id).await {
        Err(e) if e.is_not_found() => {
            log::warn!("  environment '{id}' may already be gone, checking: {e}");
        }
        result => result.with_context(|| format!("could not terminate environment '{id}'"))?,
    }
    let spec = ConvergenceSpec::new(id, waits.delete)
        .pending([TERMINATING])
        .target([TERMINATED])
        .not_found(NotFound::Gone)
        .polling(waits.polling.clone());
    wait_for(api, spec, cancel)
        .await
        .with_context(|| format!("environment '{id}' did not terminate"))?;
    Ok(())
}

impl Resource for Environment {
    type Provider = Aws;
    type Error = anyhow::Error;
    type Output = EnvironmentOutput;

    async fn create(&self, aws: &Aws) -> Result<Self::Output, Self::Error> {
        let waits = self.waits(&aws.config.beanstalk);
        create_environment(&aws.beanstalk, &waits, &aws.cancel, self).await
    }

    async fn read(
        &self,
        aws: &Aws,
        previous_remote: &Self::Output,
    ) -> Result<Option<Self::Output>, Self::Error> {
        read_environment(&aws.beanstalk, self, previous_remote).await
    }

    async fn update(
        &self,
        aws: &Aws,
        previous_local: &Self,
        previous_remote: &Self::Output,
    ) -> Result<Self::Output, Self::Error> {
        update_environment(
            &aws.beanstalk,
            &self.waits(&aws.config.beanstalk),
            &aws.cancel,
            self,
            previous_local,
            previous_remote,
        )
        .await
    }

    async fn delete(&self, aws: &Aws, previous_remote: &Self::Output) -> Result<(), Self::Error> {
        let waits = self.waits(&aws.config.beanstalk);
        delete_environment(&aws.beanstalk, &waits, &aws.cancel, previous_remote).await
    }
}
