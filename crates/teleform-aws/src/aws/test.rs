//! Handler tests against in-memory fakes of the AWS APIs.
use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
    time::{Duration, SystemTime},
};

use pretty_assertions::assert_eq;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    config::{Polling, ResourceWaits},
    converge::{Seen, WaitError},
    probe::RemoteError,
    settings::{OptionSetting, OptionSettings, ReconciliationPlan},
};

use super::{beanstalk::*, iam::*};
use super::iam::ERROR_CODES;

const ENV_ID: &str = "e-fake";

fn waits(timeout_secs: u64) -> ResourceWaits {
    let timeout = Duration::from_secs(timeout_secs);
    ResourceWaits {
        create: timeout,
        update: timeout,
        delete: timeout,
        polling: Polling {
            delay: Duration::ZERO,
            min_interval: Duration::from_secs(1),
            interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(1),
            backoff: 1.0,
        },
    }
}

fn wait_error(err: &anyhow::Error) -> &WaitError {
    err.downcast_ref::<WaitError>()
        .unwrap_or_else(|| panic!("not a wait error: {err:#}"))
}

fn setting(name: &str, value: &str) -> OptionSetting {
    OptionSetting::new("aws:elasticbeanstalk:application:environment", name, value)
}

fn web_env(settings: Vec<OptionSetting>) -> Environment {
    Environment {
        name: "web".into(),
        application: "app".into(),
        solution_stack_name: Some("64bit Amazon Linux 2023 v4.0.0 running Docker".into()),
        settings: OptionSettings::new(settings).unwrap(),
        ..Default::default()
    }
}

#[derive(Default)]
struct BeanstalkState {
    /// Status reported by each describe call, `None` meaning not found.
    /// The last entry repeats.
    script: Vec<Option<&'static str>>,
    describes: usize,
    events: Vec<String>,
    settings: Vec<OptionSetting>,
    terminate_error: Option<RemoteError>,
    created: Vec<Environment>,
    updates: Vec<EnvironmentUpdate>,
    tag_updates: Vec<(BTreeMap<String, String>, Vec<String>)>,
    terminated: Vec<String>,
}

#[derive(Default)]
struct FakeBeanstalk {
    state: Mutex<BeanstalkState>,
}

impl FakeBeanstalk {
    fn scripted(script: &[Option<&'static str>]) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().script = script.to_vec();
        fake
    }

    fn with_settings(self, settings: Vec<OptionSetting>) -> Self {
        self.state.lock().unwrap().settings = settings;
        self
    }
}

impl EnvironmentApi for FakeBeanstalk {
    async fn create(&self, env: &Environment) -> Result<String, RemoteError> {
        self.state.lock().unwrap().created.push(env.clone());
        Ok(ENV_ID.to_owned())
    }

    async fn describe(&self, id: &str) -> Result<Vec<EnvironmentDescription>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        let Some(last) = state.script.len().checked_sub(1) else {
            return Ok(vec![]);
        };
        let status = state.script[state.describes.min(last)];
        state.describes += 1;
        Ok(status
            .map(|status| EnvironmentDescription {
                id: id.to_owned(),
                arn: Some("arn:aws:elasticbeanstalk:us-east-1:123:environment/app/web".into()),
                name: "web".into(),
                application: "app".into(),
                status: status.to_owned(),
                cname: Some("web.us-east-1.elasticbeanstalk.com".into()),
                ..Default::default()
            })
            .into_iter()
            .collect())
    }

    async fn error_events(&self, _id: &str, _since: SystemTime) -> Result<Vec<String>, RemoteError> {
        Ok(self.state.lock().unwrap().events.clone())
    }

    async fn settings(
        &self,
        _application: &str,
        _name: &str,
    ) -> Result<Vec<OptionSetting>, RemoteError> {
        Ok(self.state.lock().unwrap().settings.clone())
    }

    async fn resources(&self, _id: &str) -> Result<EnvironmentResources, RemoteError> {
        Ok(EnvironmentResources {
            instances: vec!["i-0123".into()],
            ..Default::default()
        })
    }

    async fn update(&self, _id: &str, update: &EnvironmentUpdate) -> Result<(), RemoteError> {
        self.state.lock().unwrap().updates.push(update.clone());
        Ok(())
    }

    async fn update_tags(
        &self,
        _arn: &str,
        add: &BTreeMap<String, String>,
        remove: &[String],
    ) -> Result<(), RemoteError> {
        self.state
            .lock()
            .unwrap()
            .tag_updates
            .push((add.clone(), remove.to_vec()));
        Ok(())
    }

    async fn terminate(&self, id: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = state.terminate_error.clone() {
            return Err(e);
        }
        state.terminated.push(id.to_owned());
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn environment_create_waits_until_ready() {
    let _ = env_logger::builder().is_test(true).try_init();
    let managed = setting("PORT", "8080");
    let api = FakeBeanstalk::scripted(&[Some(LAUNCHING), Some(LAUNCHING), Some(READY)])
        .with_settings(vec![managed.clone(), setting("OTHER", "x")]);
    let env = web_env(vec![managed.clone()]);

    let start = Instant::now();
    let output = create_environment(&api, &waits(60), &CancellationToken::new(), &env)
        .await
        .unwrap();
    assert_eq!(Duration::from_secs(2), start.elapsed());
    assert_eq!(ENV_ID, output.id);
    assert_eq!(READY, output.status);
    assert_eq!(vec![managed], output.settings);
    assert_eq!(2, output.all_settings.len());
    assert_eq!(vec!["i-0123".to_owned()], output.resources.instances);
    assert_eq!(vec![env], api.state.lock().unwrap().created);
}

#[tokio::test(start_paused = true)]
async fn environment_create_timeout_leaves_it_alone() {
    let api = FakeBeanstalk::scripted(&[Some(LAUNCHING)]);
    let err = create_environment(&api, &waits(5), &CancellationToken::new(), &web_env(vec![]))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains(ENV_ID), "{err:#}");
    match wait_error(&err) {
        WaitError::Timeout {
            id,
            last_seen,
            elapsed,
            ..
        } => {
            assert_eq!(ENV_ID, id);
            assert_eq!(&Seen::Status(LAUNCHING.into()), last_seen);
            assert_eq!(&Duration::from_secs(5), elapsed);
        }
        other => panic!("unexpected {other}"),
    }
    assert!(api.state.lock().unwrap().terminated.is_empty());
}

#[tokio::test(start_paused = true)]
async fn environment_create_aborts_on_error_events() {
    let api = FakeBeanstalk::scripted(&[Some(LAUNCHING)]);
    api.state.lock().unwrap().events = vec!["Stack named 'awseb-e-fake' aborted".into()];
    let start = Instant::now();
    let err = create_environment(&api, &waits(600), &CancellationToken::new(), &web_env(vec![]))
        .await
        .unwrap_err();
    assert_eq!(Duration::ZERO, start.elapsed());
    match wait_error(&err) {
        WaitError::Probe { source, .. } => {
            assert!(matches!(source, RemoteError::Permanent { .. }));
            assert!(source.to_string().contains("aborted"), "{source}");
        }
        other => panic!("unexpected {other}"),
    }
}

#[tokio::test]
async fn environment_create_rejects_ambiguous_platform() {
    let api = FakeBeanstalk::scripted(&[Some(READY)]);
    let env = Environment {
        template_name: Some("base".into()),
        ..web_env(vec![])
    };
    let err = create_environment(&api, &waits(60), &CancellationToken::new(), &env)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("exactly one"), "{err}");
    assert!(api.state.lock().unwrap().created.is_empty());
}

#[tokio::test(start_paused = true)]
async fn environment_update_sends_only_the_delta() {
    let _ = env_logger::builder().is_test(true).try_init();
    let previous_local = web_env(vec![setting("X", "1"), setting("Y", "2")]);
    let env = web_env(vec![setting("X", "1"), setting("Z", "3")]);
    let previous_remote = EnvironmentOutput {
        id: ENV_ID.into(),
        settings: vec![setting("X", "1"), setting("Y", "2")],
        ..Default::default()
    };
    let api = FakeBeanstalk::scripted(&[Some(UPDATING), Some(READY)])
        .with_settings(vec![setting("X", "1"), setting("Z", "3")]);

    let output = update_environment(
        &api,
        &waits(60),
        &CancellationToken::new(),
        &env,
        &previous_local,
        &previous_remote,
    )
    .await
    .unwrap();

    let state = api.state.lock().unwrap();
    assert_eq!(
        vec![EnvironmentUpdate {
            settings: ReconciliationPlan {
                removals: vec![setting("Y", "2").key()],
                applications: vec![setting("Z", "3")],
            },
            ..Default::default()
        }],
        state.updates
    );
    assert!(state.tag_updates.is_empty());
    assert_eq!(vec![setting("X", "1"), setting("Z", "3")], output.settings);
}

#[tokio::test(start_paused = true)]
async fn environment_update_of_tags_only() {
    let previous_local = web_env(vec![]);
    let env = Environment {
        tags: BTreeMap::from([("team".to_owned(), "infra".to_owned())]),
        ..previous_local.clone()
    };
    let previous_remote = EnvironmentOutput {
        id: ENV_ID.into(),
        arn: Some("arn:env".into()),
        ..Default::default()
    };
    let api = FakeBeanstalk::scripted(&[Some(UPDATING), Some(READY)]);
    update_environment(
        &api,
        &waits(60),
        &CancellationToken::new(),
        &env,
        &previous_local,
        &previous_remote,
    )
    .await
    .unwrap();
    let state = api.state.lock().unwrap();
    assert!(state.updates.is_empty());
    assert_eq!(vec![(env.tags.clone(), vec![])], state.tag_updates);
}

#[tokio::test]
async fn environment_update_rejects_replacement() {
    let previous_local = web_env(vec![]);
    let env = Environment {
        name: "web-2".into(),
        ..previous_local.clone()
    };
    let previous_remote = EnvironmentOutput {
        id: ENV_ID.into(),
        ..Default::default()
    };
    let api = FakeBeanstalk::scripted(&[Some(READY)]);
    let err = update_environment(
        &api,
        &waits(60),
        &CancellationToken::new(),
        &env,
        &previous_local,
        &previous_remote,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("name"), "{err}");
    assert!(api.state.lock().unwrap().updates.is_empty());
}

#[tokio::test]
async fn environment_update_rejects_dropping_the_version_label() {
    let previous_local = Environment {
        version_label: Some("v1".into()),
        ..web_env(vec![])
    };
    let env = web_env(vec![]);
    let previous_remote = EnvironmentOutput {
        id: ENV_ID.into(),
        ..Default::default()
    };
    let api = FakeBeanstalk::scripted(&[Some(READY)]);
    let err = update_environment(
        &api,
        &waits(60),
        &CancellationToken::new(),
        &env,
        &previous_local,
        &previous_remote,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("version label"), "{err}");
    assert!(api.state.lock().unwrap().updates.is_empty());
}

#[test]
fn update_between_unchanged_definitions_is_empty() {
    let env = Environment {
        description: Some("web tier".into()),
        version_label: Some("v1".into()),
        ..web_env(vec![setting("X", "1")])
    };
    let update = EnvironmentUpdate::between(&env, &env.clone(), &[setting("X", "1")]);
    assert!(update.is_empty(), "{update:#?}");
}

#[test]
fn update_between_descriptions() {
    let previous = Environment {
        description: Some("old".into()),
        ..web_env(vec![])
    };
    let changed = Environment {
        description: Some("new".into()),
        ..previous.clone()
    };
    assert_eq!(
        EnvironmentUpdate {
            description: Some("new".into()),
            ..Default::default()
        },
        EnvironmentUpdate::between(&previous, &changed, &[])
    );

    // Dropping the description or emptying it both clear it remotely.
    let cleared = EnvironmentUpdate {
        description: Some(String::new()),
        ..Default::default()
    };
    for description in [None, Some(String::new())] {
        let desired = Environment {
            description,
            ..previous.clone()
        };
        assert_eq!(cleared, EnvironmentUpdate::between(&previous, &desired, &[]));
    }
}

#[test]
fn update_between_stack_and_template() {
    let on_stack = web_env(vec![]);
    let on_template = Environment {
        solution_stack_name: None,
        template_name: Some("base".into()),
        ..on_stack.clone()
    };
    assert_eq!(
        EnvironmentUpdate {
            template_name: Some("base".into()),
            ..Default::default()
        },
        EnvironmentUpdate::between(&on_stack, &on_template, &[])
    );
    assert_eq!(
        EnvironmentUpdate {
            solution_stack_name: on_stack.solution_stack_name.clone(),
            ..Default::default()
        },
        EnvironmentUpdate::between(&on_template, &on_stack, &[])
    );
}

#[test]
fn update_between_version_labels() {
    let first = web_env(vec![]);
    let v1 = Environment {
        version_label: Some("v1".into()),
        ..first.clone()
    };
    let v2 = Environment {
        version_label: Some("v2".into()),
        ..first.clone()
    };
    for (previous, desired, label) in [(&first, &v1, "v1"), (&v1, &v2, "v2")] {
        assert_eq!(
            EnvironmentUpdate {
                version_label: Some(label.into()),
                ..Default::default()
            },
            EnvironmentUpdate::between(previous, desired, &[])
        );
    }
}

#[tokio::test(start_paused = true)]
async fn environment_waits_can_be_overridden() {
    let env: Environment = serde_json::from_str(
        r#"{
            "name": "web",
            "application": "app",
            "solution_stack_name": "64bit Amazon Linux 2023 v4.0.0 running Docker",
            "wait_for_ready_timeout": "15m",
            "poll_interval": "5s"
        }"#,
    )
    .unwrap();
    assert_eq!(Some(Duration::from_secs(15 * 60)), env.wait_for_ready_timeout);
    assert_eq!(Some(Duration::from_secs(5)), env.poll_interval);

    let api = FakeBeanstalk::scripted(&[Some(LAUNCHING), Some(LAUNCHING), Some(READY)]);
    let start = Instant::now();
    create_environment(&api, &env.waits(&waits(60)), &CancellationToken::new(), &env)
        .await
        .unwrap();
    assert_eq!(Duration::from_secs(10), start.elapsed());

    let impatient = Environment {
        wait_for_ready_timeout: Some(Duration::from_secs(3)),
        poll_interval: None,
        ..env
    };
    let api = FakeBeanstalk::scripted(&[Some(LAUNCHING)]);
    let err = create_environment(
        &api,
        &impatient.waits(&waits(60)),
        &CancellationToken::new(),
        &impatient,
    )
    .await
    .unwrap_err();
    match wait_error(&err) {
        WaitError::Timeout { elapsed, .. } => assert_eq!(&Duration::from_secs(3), elapsed),
        other => panic!("unexpected {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn environment_delete_waits_for_termination() {
    let previous_remote = EnvironmentOutput {
        id: ENV_ID.into(),
        ..Default::default()
    };
    for script in [
        vec![Some(TERMINATING), Some(TERMINATING), Some(TERMINATED)],
        vec![Some(TERMINATING), None],
    ] {
        let api = FakeBeanstalk::scripted(&script);
        delete_environment(&api, &waits(60), &CancellationToken::new(), &previous_remote)
            .await
            .unwrap();
        assert_eq!(vec![ENV_ID.to_owned()], api.state.lock().unwrap().terminated);
    }
}

fn failing_terminate(script: &[Option<&'static str>], message: &str) -> FakeBeanstalk {
    let api = FakeBeanstalk::scripted(script);
    api.state.lock().unwrap().terminate_error =
        Some(TERMINATE_ERROR_CODES.classify_code(Some("ValidationError"), message));
    api
}

#[tokio::test(start_paused = true)]
async fn environment_delete_of_missing_environment() {
    let api = failing_terminate(&[None], "No Environment found for EnvironmentId = 'e-fake'.");
    let previous_remote = EnvironmentOutput {
        id: ENV_ID.into(),
        ..Default::default()
    };
    delete_environment(&api, &waits(60), &CancellationToken::new(), &previous_remote)
        .await
        .unwrap();
    let state = api.state.lock().unwrap();
    assert_eq!(1, state.describes);
    assert!(state.terminated.is_empty());
}

#[tokio::test(start_paused = true)]
async fn environment_delete_fails_if_terminate_was_rejected_but_it_still_runs() {
    let api = failing_terminate(
        &[Some(READY)],
        "1 validation error detected: Value at 'environmentId' failed to satisfy constraint",
    );
    let previous_remote = EnvironmentOutput {
        id: ENV_ID.into(),
        ..Default::default()
    };
    let start = Instant::now();
    let err = delete_environment(&api, &waits(60), &CancellationToken::new(), &previous_remote)
        .await
        .unwrap_err();
    assert_eq!(Duration::ZERO, start.elapsed());
    match wait_error(&err) {
        WaitError::Unrecognized { status, .. } => assert_eq!(READY, status.as_str()),
        other => panic!("unexpected {other}"),
    }
    assert_eq!(1, api.state.lock().unwrap().describes);
}

#[tokio::test]
async fn environment_read() {
    let env = web_env(vec![]);
    let previous_remote = EnvironmentOutput {
        id: ENV_ID.into(),
        ..Default::default()
    };
    for (script, exists) in [(None, false), (Some(TERMINATED), false), (Some(READY), true)] {
        let api = FakeBeanstalk::scripted(&[script]);
        let output = read_environment(&api, &env, &previous_remote).await.unwrap();
        assert_eq!(exists, output.is_some(), "{script:?}");
    }
}

#[derive(Default)]
struct IamState {
    /// Policies visible on each role.
    roles: HashMap<String, Vec<String>>,
    /// Attachments not visible yet, with the number of list calls left
    /// before they are.
    propagating: Vec<(String, String, usize)>,
    /// List calls an attachment stays invisible for.
    lag: usize,
    detached: Vec<(String, String)>,
}

#[derive(Default)]
struct FakeIam {
    state: Mutex<IamState>,
}

impl FakeIam {
    fn with_role(self, role: &str, policies: &[&str]) -> Self {
        self.state.lock().unwrap().roles.insert(
            role.to_owned(),
            policies.iter().map(|arn| arn.to_string()).collect(),
        );
        self
    }

    fn with_lag(self, lag: usize) -> Self {
        self.state.lock().unwrap().lag = lag;
        self
    }
}

fn no_such_entity(role: &str) -> RemoteError {
    ERROR_CODES.classify_code(
        Some("NoSuchEntity"),
        format!("The role with name {role} cannot be found."),
    )
}

impl RolePolicyApi for FakeIam {
    async fn get_role(&self, role: &str) -> Result<String, RemoteError> {
        if self.state.lock().unwrap().roles.contains_key(role) {
            Ok(format!("arn:aws:iam::123:role/{role}"))
        } else {
            Err(no_such_entity(role))
        }
    }

    async fn attached_policies(&self, role: &str) -> Result<Vec<String>, RemoteError> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let mut visible = vec![];
        state.propagating.retain_mut(|(r, arn, left)| {
            if *left == 0 {
                visible.push((r.clone(), arn.clone()));
                false
            } else {
                *left -= 1;
                true
            }
        });
        for (r, arn) in visible {
            state.roles.entry(r).or_default().push(arn);
        }
        state
            .roles
            .get(role)
            .cloned()
            .ok_or_else(|| no_such_entity(role))
    }

    async fn attach(&self, role: &str, policy_arn: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        if !state.roles.contains_key(role) {
            return Err(no_such_entity(role));
        }
        let lag = state.lag;
        state
            .propagating
            .push((role.to_owned(), policy_arn.to_owned(), lag));
        Ok(())
    }

    async fn detach(&self, role: &str, policy_arn: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        let policies = state.roles.get_mut(role).ok_or_else(|| no_such_entity(role))?;
        let before = policies.len();
        policies.retain(|arn| arn != policy_arn);
        if policies.len() == before {
            return Err(ERROR_CODES.classify_code(
                Some("NoSuchEntity"),
                format!("Policy {policy_arn} was not found."),
            ));
        }
        state
            .detached
            .push((role.to_owned(), policy_arn.to_owned()));
        Ok(())
    }
}

const READ_ONLY: &str = "arn:aws:iam::aws:policy/ReadOnlyAccess";

#[tokio::test(start_paused = true)]
async fn attachment_create_waits_for_propagation() {
    let _ = env_logger::builder().is_test(true).try_init();
    let api = FakeIam::default().with_role("app-role", &[]).with_lag(2);
    let attachment = RolePolicyAttachment {
        role: "app-role".into(),
        policy_arn: READ_ONLY.into(),
    };
    let start = Instant::now();
    let output = create_attachment(&api, &waits(60), &CancellationToken::new(), &attachment)
        .await
        .unwrap();
    assert_eq!(Duration::from_secs(2), start.elapsed());
    assert_eq!(
        AttachmentOutput {
            role: "app-role".into(),
            role_arn: "arn:aws:iam::123:role/app-role".into(),
            policy_arn: READ_ONLY.into(),
        },
        output
    );
    assert_eq!(
        Some(output),
        read_attachment(&api, &attachment).await.unwrap()
    );
}

#[tokio::test]
async fn attachment_create_on_missing_role_fails() {
    let api = FakeIam::default();
    let attachment = RolePolicyAttachment {
        role: "nobody".into(),
        policy_arn: READ_ONLY.into(),
    };
    let err = create_attachment(&api, &waits(60), &CancellationToken::new(), &attachment)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("nobody"), "{err}");
    assert_eq!(None, read_attachment(&api, &attachment).await.unwrap());
}

#[tokio::test]
async fn attachment_delete_is_idempotent() {
    let api = FakeIam::default().with_role("app-role", &[READ_ONLY]);
    let previous_remote = AttachmentOutput {
        role: "app-role".into(),
        role_arn: "arn:aws:iam::123:role/app-role".into(),
        policy_arn: READ_ONLY.into(),
    };
    for _ in 0..2 {
        delete_attachment(&api, &waits(60), &CancellationToken::new(), &previous_remote)
            .await
            .unwrap();
    }
    assert_eq!(
        vec![("app-role".to_owned(), READ_ONLY.to_owned())],
        api.state.lock().unwrap().detached
    );
}

#[tokio::test]
async fn attachment_update_moves_the_policy() {
    let admin = "arn:aws:iam::aws:policy/AdministratorAccess";
    let api = FakeIam::default().with_role("app-role", &[READ_ONLY]);
    let previous_remote = AttachmentOutput {
        role: "app-role".into(),
        role_arn: "arn:aws:iam::123:role/app-role".into(),
        policy_arn: READ_ONLY.into(),
    };
    let attachment = RolePolicyAttachment {
        role: "app-role".into(),
        policy_arn: admin.into(),
    };
    let output = update_attachment(
        &api,
        &waits(60),
        &CancellationToken::new(),
        &attachment,
        &previous_remote,
    )
    .await
    .unwrap();
    assert_eq!(admin, output.policy_arn);
    assert_eq!(
        vec![admin.to_owned()],
        api.attached_policies("app-role").await.unwrap()
    );
}

#[tokio::test]
async fn import_of_missing_role_is_empty() {
    let api = FakeIam::default();
    assert!(import_attachments(&api, "nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn import_synthesizes_one_record_per_policy() {
    let policies = [
        READ_ONLY,
        "arn:aws:iam::aws:policy/AWSElasticBeanstalkWebTier",
        "arn:aws:iam::123:policy/app-logs",
    ];
    let api = FakeIam::default().with_role("app-role", &policies);
    let records = import_attachments(&api, "app-role").await.unwrap();

    assert_eq!(
        policies.to_vec(),
        records
            .iter()
            .map(|record| record.local.policy_arn.as_str())
            .collect::<Vec<_>>()
    );
    let ids = records
        .iter()
        .map(|record| record.id.clone())
        .collect::<std::collections::HashSet<_>>();
    assert_eq!(3, ids.len());
    for record in records {
        assert!(record.id.starts_with("app-role-"), "{}", record.id);
        assert_eq!("aws_iam_role_policy_attachment", record.type_name);
        assert_eq!("app-role", record.local.role);
    }
}
