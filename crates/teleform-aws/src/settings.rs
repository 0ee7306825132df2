//! Option settings and their reconciliation.
//!
//! Elastic Beanstalk configures environments through named option settings,
//! each identified by a namespace, an optional resource qualifier and a name.
//! An update carries only what changed: [`reconcile`] computes which keys to
//! remove and which settings to (re)apply.
use std::collections::HashMap;

use snafu::prelude::*;

/// Identifies one option setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct SettingKey {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub name: String,
}

impl core::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.namespace)?;
        if let Some(resource) = &self.resource {
            write!(f, "[{resource}]")?;
        }
        write!(f, ":{}", self.name)
    }
}

/// One configurable knob on a remote resource.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OptionSetting {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub name: String,
    pub value: String,
}

impl OptionSetting {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            resource: None,
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn key(&self) -> SettingKey {
        SettingKey {
            namespace: self.namespace.clone(),
            resource: self.resource.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Option setting '{key}' is given more than once"))]
pub struct DuplicateSetting {
    pub key: SettingKey,
}

/// A sequence of option settings with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<OptionSetting>", into = "Vec<OptionSetting>")]
pub struct OptionSettings(Vec<OptionSetting>);

impl TryFrom<Vec<OptionSetting>> for OptionSettings {
    type Error = DuplicateSetting;

    fn try_from(settings: Vec<OptionSetting>) -> Result<Self, Self::Error> {
        let mut seen = std::collections::HashSet::new();
        for setting in settings.iter() {
            let key = setting.key();
            ensure!(!seen.contains(&key), DuplicateSettingSnafu { key });
            seen.insert(key);
        }
        Ok(Self(settings))
    }
}

impl From<OptionSettings> for Vec<OptionSetting> {
    fn from(settings: OptionSettings) -> Self {
        settings.0
    }
}

impl std::ops::Deref for OptionSettings {
    type Target = [OptionSetting];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl OptionSettings {
    pub fn new(settings: impl IntoIterator<Item = OptionSetting>) -> Result<Self, DuplicateSetting> {
        Self::try_from(settings.into_iter().collect::<Vec<_>>())
    }

    /// The value of the setting at `key`, if present.
    pub fn get(&self, key: &SettingKey) -> Option<&str> {
        self.0
            .iter()
            .find(|setting| &setting.key() == key)
            .map(|setting| setting.value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = SettingKey> + '_ {
        self.0.iter().map(OptionSetting::key)
    }
}

/// The delta that moves settings from their current to their desired values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Keys to remove, in the order of the current settings.
    pub removals: Vec<SettingKey>,
    /// Settings to apply, in the order of the desired settings.
    pub applications: Vec<OptionSetting>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.applications.is_empty()
    }
}

/// Compute the minimal plan moving `current` to `desired`.
///
/// Keys only in `current` are removed. Settings in `desired` that are missing
/// from `current` or carry a different value there are applied. If a key occurs
/// more than once in one sequence, its last occurrence wins.
pub fn reconcile(current: &[OptionSetting], desired: &[OptionSetting]) -> ReconciliationPlan {
    let current_values: HashMap<SettingKey, &str> = current
        .iter()
        .map(|setting| (setting.key(), setting.value.as_str()))
        .collect();
    let desired_values: HashMap<SettingKey, &str> = desired
        .iter()
        .map(|setting| (setting.key(), setting.value.as_str()))
        .collect();

    let mut plan = ReconciliationPlan::default();
    for setting in current.iter() {
        let key = setting.key();
        if !desired_values.contains_key(&key) && !plan.removals.contains(&key) {
            plan.removals.push(key);
        }
    }
    for (i, setting) in desired.iter().enumerate() {
        let key = setting.key();
        let superseded = desired[i + 1..].iter().any(|later| later.key() == key);
        if superseded {
            continue;
        }
        if current_values.get(&key) != Some(&setting.value.as_str()) {
            plan.applications.push(setting.clone());
        }
    }
    log::trace!("reconciled settings: {plan:#?}");
    plan
}
