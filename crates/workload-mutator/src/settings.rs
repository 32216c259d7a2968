use serde::Deserialize;
use std::{fmt, str::FromStr};

use crate::errors::SettingsError;

pub const DEFAULT_NODE_SELECTOR_KEY: &str = "workload";
pub const DEFAULT_NODE_SELECTOR_VALUE: &str = "true";
pub const DEFAULT_TOLERATION_KEY: &str = "workload";
pub const DEFAULT_TOLERATION_VALUE: &str = "true";

/// How the placement constraints are written into the pod template.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatchStrategy {
    /// Unconditionally `add` the node selector and the toleration list.
    /// Any node selector or toleration already set on the object is discarded.
    #[default]
    Overwrite,
    /// Read the current values and only patch what is missing or different,
    /// keeping everything else the object already declares.
    Merge,
}

impl FromStr for PatchStrategy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overwrite" => Ok(PatchStrategy::Overwrite),
            "merge" => Ok(PatchStrategy::Merge),
            other => Err(SettingsError::UnknownVariant {
                kind: "patch strategy",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for PatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PatchStrategy::Overwrite => write!(f, "overwrite"),
            PatchStrategy::Merge => write!(f, "merge"),
        }
    }
}

/// What to answer when a review cannot be processed but its uid is known.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Reject the request, reporting the reason in the response status.
    #[default]
    Deny,
    /// Admit the request unchanged, reporting the reason as a warning.
    Allow,
}

impl FromStr for FailurePolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deny" => Ok(FailurePolicy::Deny),
            "allow" => Ok(FailurePolicy::Allow),
            other => Err(SettingsError::UnknownVariant {
                kind: "failure policy",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailurePolicy::Deny => write!(f, "deny"),
            FailurePolicy::Allow => write!(f, "allow"),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct MutationSettings {
    pub node_selector_key: String,
    pub node_selector_value: String,
    pub toleration_key: String,
    pub toleration_value: String,
    pub strategy: PatchStrategy,
}

impl Default for MutationSettings {
    fn default() -> Self {
        MutationSettings {
            node_selector_key: DEFAULT_NODE_SELECTOR_KEY.to_owned(),
            node_selector_value: DEFAULT_NODE_SELECTOR_VALUE.to_owned(),
            toleration_key: DEFAULT_TOLERATION_KEY.to_owned(),
            toleration_value: DEFAULT_TOLERATION_VALUE.to_owned(),
            strategy: PatchStrategy::default(),
        }
    }
}

impl MutationSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.node_selector_key.is_empty() {
            return Err(SettingsError::EmptyField("node selector key"));
        }
        if self.toleration_key.is_empty() {
            return Err(SettingsError::EmptyField("toleration key"));
        }
        Ok(())
    }
}
