//! IAM infrastructure.
//!
//! Attaching a managed policy to a role is immediate on the API, but takes a
//! while to be visible everywhere, so handlers wait for the attachment to show
//! up (or disappear) before returning.
use std::{future::Future, time::SystemTime};

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use crate::{
    config::ResourceWaits,
    converge::{await_state, ConvergenceSpec, NotFound},
    probe::{ErrorCodes, Probe, Refresh, RemoteError, StatusObservation},
    utils::prefixed_unique_id,
    Import, Imported, Resource,
};

use super::Aws;

pub const ATTACHED: &str = "Attached";
pub const EXISTS: &str = "Exists";

pub const ERROR_CODES: ErrorCodes = ErrorCodes::new(&["NoSuchEntity"]);

/// A managed policy attached to a role.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RolePolicyAttachment {
    pub role: String,
    pub policy_arn: String,
}

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttachmentOutput {
    pub role: String,
    pub role_arn: String,
    pub policy_arn: String,
}

/// The IAM calls attachment handlers make.
pub trait RolePolicyApi {
    /// Returns the arn of the role.
    fn get_role(&self, role: &str) -> impl Future<Output = Result<String, RemoteError>>;

    /// Arns of every policy attached to the role, across all pages.
    fn attached_policies(&self, role: &str)
        -> impl Future<Output = Result<Vec<String>, RemoteError>>;

    fn attach(&self, role: &str, policy_arn: &str)
        -> impl Future<Output = Result<(), RemoteError>>;

    fn detach(&self, role: &str, policy_arn: &str)
        -> impl Future<Output = Result<(), RemoteError>>;
}

impl RolePolicyApi for aws_sdk_iam::Client {
    async fn get_role(&self, role: &str) -> Result<String, RemoteError> {
        let out = self
            .get_role()
            .role_name(role)
            .send()
            .await
            .map_err(|e| ERROR_CODES.classify(e))?;
        out.role
            .map(|role| role.arn)
            .ok_or_else(|| RemoteError::permanent(format!("GetRole returned no role for '{role}'")))
    }

    async fn attached_policies(&self, role: &str) -> Result<Vec<String>, RemoteError> {
        let mut arns = vec![];
        let mut marker = None;
        loop {
            let out = self
                .list_attached_role_policies()
                .role_name(role)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| ERROR_CODES.classify(e))?;
            arns.extend(
                out.attached_policies
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|policy| policy.policy_arn),
            );
            if !out.is_truncated || out.marker.is_none() {
                break;
            }
            log::trace!("fetching next page of policies attached to '{role}'");
            marker = out.marker;
        }
        Ok(arns)
    }

    async fn attach(&self, role: &str, policy_arn: &str) -> Result<(), RemoteError> {
        let _ = self
            .attach_role_policy()
            .role_name(role)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| ERROR_CODES.classify(e))?;
        Ok(())
    }

    async fn detach(&self, role: &str, policy_arn: &str) -> Result<(), RemoteError> {
        let _ = self
            .detach_role_policy()
            .role_name(role)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| ERROR_CODES.classify(e))?;
        Ok(())
    }
}

/// Reports [`ATTACHED`] while the policy is attached to the role given as id.
pub struct AttachmentProbe<'a, A> {
    api: &'a A,
    policy_arn: &'a str,
}

impl<'a, A: RolePolicyApi> AttachmentProbe<'a, A> {
    pub fn new(api: &'a A, policy_arn: &'a str) -> Self {
        Self { api, policy_arn }
    }
}

impl<A: RolePolicyApi> Probe for AttachmentProbe<'_, A> {
    type Detail = ();

    async fn probe(&self, role: &str, _since: SystemTime) -> Result<StatusObservation<()>, RemoteError> {
        let policies = self.api.attached_policies(role).await?;
        if policies.iter().any(|arn| arn == self.policy_arn) {
            Ok(StatusObservation::new(ATTACHED))
        } else {
            Err(RemoteError::not_found(format!(
                "policy '{}' is not attached to role '{role}'",
                self.policy_arn
            )))
        }
    }
}

/// Reports [`EXISTS`] with the role's arn while the role given as id exists.
pub struct RoleProbe<'a, A> {
    api: &'a A,
}

impl<'a, A: RolePolicyApi> RoleProbe<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }
}

impl<A: RolePolicyApi> Probe for RoleProbe<'_, A> {
    type Detail = String;

    async fn probe(
        &self,
        role: &str,
        _since: SystemTime,
    ) -> Result<StatusObservation<String>, RemoteError> {
        let arn = self.api.get_role(role).await?;
        Ok(StatusObservation::new(EXISTS).with_detail(arn))
    }
}

async fn role_arn<A: RolePolicyApi>(api: &A, role: &str) -> anyhow::Result<String> {
    api.get_role(role)
        .await
        .with_context(|| format!("could not read role '{role}'"))
}

pub async fn create_attachment<A: RolePolicyApi>(
    api: &A,
    waits: &ResourceWaits,
    cancel: &CancellationToken,
    attachment: &RolePolicyAttachment,
) -> anyhow::Result<AttachmentOutput> {
    let RolePolicyAttachment { role, policy_arn } = attachment;
    api.attach(role, policy_arn)
        .await
        .with_context(|| format!("could not attach policy '{policy_arn}' to role '{role}'"))?;
    log::info!("  attached policy {policy_arn} to role {role}");
    let spec = ConvergenceSpec::new(role, waits.create)
        .target([ATTACHED])
        .polling(waits.polling.clone());
    await_state(&spec, &AttachmentProbe::new(api, policy_arn), cancel)
        .await
        .with_context(|| format!("policy '{policy_arn}' never showed up on role '{role}'"))?;
    Ok(AttachmentOutput {
        role: role.clone(),
        role_arn: role_arn(api, role).await?,
        policy_arn: policy_arn.clone(),
    })
}

pub async fn read_attachment<A: RolePolicyApi>(
    api: &A,
    attachment: &RolePolicyAttachment,
) -> anyhow::Result<Option<AttachmentOutput>> {
    let RolePolicyAttachment { role, policy_arn } = attachment;
    let attached = Refresh::new(AttachmentProbe::new(api, policy_arn), role)
        .refresh()
        .await
        .with_context(|| format!("could not read policies attached to role '{role}'"))?;
    if attached.is_none() {
        return Ok(None);
    }
    let Some(role_arn) = Refresh::new(RoleProbe::new(api), role)
        .refresh()
        .await?
        .and_then(|observation| observation.detail)
    else {
        return Ok(None);
    };
    Ok(Some(AttachmentOutput {
        role: role.clone(),
        role_arn,
        policy_arn: policy_arn.clone(),
    }))
}

pub async fn update_attachment<A: RolePolicyApi>(
    api: &A,
    waits: &ResourceWaits,
    cancel: &CancellationToken,
    attachment: &RolePolicyAttachment,
    previous_remote: &AttachmentOutput,
) -> anyhow::Result<AttachmentOutput> {
    log::info!(
        "detaching previous policy {} from role {}",
        previous_remote.policy_arn,
        previous_remote.role
    );
    delete_attachment(api, waits, cancel, previous_remote).await?;
    log::info!(
        "attaching new policy {} to role {}",
        attachment.policy_arn,
        attachment.role
    );
    create_attachment(api, waits, cancel, attachment).await
}

pub async fn delete_attachment<A: RolePolicyApi>(
    api: &A,
    waits: &ResourceWaits,
    cancel: &CancellationToken,
    previous_remote: &AttachmentOutput,
) -> anyhow::Result<()> {
    let AttachmentOutput {
        role, policy_arn, ..
    } = previous_remote;
    match api.detach(role, policy_arn).await {
        Err(e) if e.is_not_found() => {
            log::warn!("  policy {policy_arn} is already detached from role {role}: {e}");
            return Ok(());
        }
        result => result
            .with_context(|| format!("could not detach policy '{policy_arn}' from role '{role}'"))?,
    }
    let spec = ConvergenceSpec::new(role, waits.delete)
        .pending([ATTACHED])
        .not_found(NotFound::Gone)
        .polling(waits.polling.clone());
    await_state(&spec, &AttachmentProbe::new(api, policy_arn), cancel)
        .await
        .with_context(|| format!("policy '{policy_arn}' is still attached to role '{role}'"))?;
    Ok(())
}

/// Synthesize one attachment record per policy attached to `role`.
///
/// A missing role has nothing to import.
pub async fn import_attachments<A: RolePolicyApi>(
    api: &A,
    role: &str,
) -> anyhow::Result<Vec<Imported<RolePolicyAttachment>>> {
    let exists = Refresh::new(RoleProbe::new(api), role)
        .refresh()
        .await
        .with_context(|| format!("could not read role '{role}'"))?;
    if exists.is_none() {
        log::warn!("no such entity found for policy attachment ({role})");
        return Ok(vec![]);
    }
    let policies = api
        .attached_policies(role)
        .await
        .with_context(|| format!("could not list policies attached to role '{role}'"))?;
    policies
        .into_iter()
        .map(|policy_arn| -> anyhow::Result<_> {
            Ok(Imported {
                id: prefixed_unique_id(role)?,
                type_name: RolePolicyAttachment::TYPE_NAME.to_owned(),
                local: RolePolicyAttachment {
                    role: role.to_owned(),
                    policy_arn,
                },
            })
        })
        .collect()
}

impl Resource for RolePolicyAttachment {
    type Provider = Aws;
    type Error = anyhow::Error;
    type Output = AttachmentOutput;

    async fn create(&self, aws: &Aws) -> Result<Self::Output, Self::Error> {
        create_attachment(&aws.iam, &aws.config.iam, &aws.cancel, self).await
    }

    async fn read(
        &self,
        aws: &Aws,
        _previous_remote: &Self::Output,
    ) -> Result<Option<Self::Output>, Self::Error> {
        read_attachment(&aws.iam, self).await
    }

    async fn update(
        &self,
        aws: &Aws,
        _previous_local: &Self,
        previous_remote: &Self::Output,
    ) -> Result<Self::Output, Self::Error> {
        update_attachment(&aws.iam, &aws.config.iam, &aws.cancel, self, previous_remote).await
    }

    async fn delete(&self, aws: &Aws, previous_remote: &Self::Output) -> Result<(), Self::Error> {
        delete_attachment(&aws.iam, &aws.config.iam, &aws.cancel, previous_remote).await
    }
}

impl Import for RolePolicyAttachment {
    const TYPE_NAME: &'static str = "aws_iam_role_policy_attachment";

    async fn import(aws: &Aws, external_id: &str) -> Result<Vec<Imported<Self>>, Self::Error> {
        import_attachments(&aws.iam, external_id).await
    }
}
