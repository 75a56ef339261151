//! Per-run options: the environment-variable group and the ambient base
//! credentials used for the role exchange.
//!
//! Interactive sessions may name the group with `--environment`, through
//! `ENVIRONMENT`, or leave it out when the config has a single group. Under
//! CI (`--ci` or `CI` set) every value must come from flags or the
//! environment and all missing variables are reported together.

use std::collections::BTreeMap;
use std::ffi::OsString;

use spectrum_aws::BaseCredentials;
use spectrum_aws::credentials::{ACCESS_KEY_ID_VAR, SECRET_ACCESS_KEY_VAR};
use spectrum_core::DeploymentConfig;

pub const CI_VAR: &str = "CI";
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// Process environment captured once at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Every variable of the current process with a UTF-8 name and value.
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    fn from_os_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        Self {
            vars: vars
                .into_iter()
                .filter_map(|(k, v)| match (k.into_string(), v.into_string()) {
                    (Ok(k), Ok(v)) => Some((k, v)),
                    (k, _) => {
                        tracing::debug!(name = ?k, "skipping non-UTF-8 environment variable");
                        None
                    }
                })
                .collect(),
        }
    }

    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `key` when set and not blank.
    pub fn get(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }

    pub fn is_ci(&self) -> bool {
        self.get(CI_VAR).is_some_and(|v| v != "0" && v != "false")
    }
}

/// Option-related flags of the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionInputs {
    pub ci: bool,
    pub environment: Option<String>,
}

#[derive(Debug)]
pub struct ResolvedOptions {
    /// Selected group name, `None` when the config defines no groups.
    pub environment: Option<String>,
    /// Variables of the selected group.
    pub variables: BTreeMap<String, String>,
    pub credentials: BaseCredentials,
}

/// Resolve the environment group and base credentials for a deploy.
pub fn resolve_options(
    inputs: &OptionInputs,
    config: &DeploymentConfig,
    env: &EnvSnapshot,
) -> Result<ResolvedOptions, OptionsError> {
    let ci = inputs.ci || env.is_ci();
    let named = inputs
        .environment
        .clone()
        .filter(|e| !e.trim().is_empty())
        .or_else(|| env.get(ENVIRONMENT_VAR));

    if ci {
        let mut missing = Vec::new();
        if named.is_none() {
            missing.push(ENVIRONMENT_VAR);
        }
        for var in [ACCESS_KEY_ID_VAR, SECRET_ACCESS_KEY_VAR] {
            if env.get(var).is_none() {
                missing.push(var);
            }
        }
        if !missing.is_empty() {
            return Err(OptionsError::MissingCiVariables { missing });
        }
    }

    let credentials = base_credentials(env)?;
    let (environment, variables) = select_group(config, named)?;

    Ok(ResolvedOptions {
        environment,
        variables,
        credentials,
    })
}

/// Base credentials alone, for pipelines that need no environment group.
pub fn resolve_credentials(
    inputs: &OptionInputs,
    env: &EnvSnapshot,
) -> Result<BaseCredentials, OptionsError> {
    if inputs.ci || env.is_ci() {
        let missing: Vec<_> = [ACCESS_KEY_ID_VAR, SECRET_ACCESS_KEY_VAR]
            .into_iter()
            .filter(|var| env.get(var).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(OptionsError::MissingCiVariables { missing });
        }
    }
    base_credentials(env)
}

fn base_credentials(env: &EnvSnapshot) -> Result<BaseCredentials, OptionsError> {
    BaseCredentials::from_lookup(|key| env.get(key)).ok_or(OptionsError::MissingCredentials)
}

fn select_group(
    config: &DeploymentConfig,
    named: Option<String>,
) -> Result<(Option<String>, BTreeMap<String, String>), OptionsError> {
    let groups = &config.environment_variables;

    match named {
        Some(name) => match groups.get(&name) {
            Some(vars) => Ok((Some(name), vars.clone())),
            None if groups.is_empty() => {
                tracing::warn!(environment = %name, "no environment groups configured");
                Ok((Some(name), BTreeMap::new()))
            }
            None => Err(OptionsError::UnknownEnvironment {
                name,
                choices: groups.keys().cloned().collect(),
            }),
        },
        None => {
            let mut iter = groups.iter();
            match (iter.next(), iter.next()) {
                (None, _) => Ok((None, BTreeMap::new())),
                (Some((name, vars)), None) => Ok((Some(name.clone()), vars.clone())),
                (Some(_), Some(_)) => Err(OptionsError::EnvironmentRequired {
                    choices: groups.keys().cloned().collect(),
                }),
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error(
        "--ci was set but required environment variables are missing: {}",
        missing.join(", ")
    )]
    MissingCiVariables { missing: Vec<&'static str> },

    #[error(
        "AWS credentials required in environment — set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY"
    )]
    MissingCredentials,

    #[error("environment '{name}' not found in config; choose one of: {}", choices.join(", "))]
    UnknownEnvironment { name: String, choices: Vec<String> },

    #[error(
        "several environment groups are configured; pass --environment or set ENVIRONMENT to one of: {}",
        choices.join(", ")
    )]
    EnvironmentRequired { choices: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_skips_non_utf8_entries() {
        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStringExt;
            let snapshot = EnvSnapshot::from_os_vars([
                (OsString::from("GOOD"), OsString::from("yes")),
                (OsString::from("BAD"), OsString::from_vec(vec![0xff, 0xfe])),
            ]);
            assert_eq!(snapshot.get("GOOD").as_deref(), Some("yes"));
            assert_eq!(snapshot.get("BAD"), None);
        }
    }

    #[test]
    fn blank_values_count_as_unset() {
        let env = EnvSnapshot::from_pairs([("CI", "  ")]);
        assert!(!env.is_ci());
        assert!(EnvSnapshot::from_pairs([("CI", "true")]).is_ci());
        assert!(!EnvSnapshot::from_pairs([("CI", "false")]).is_ci());
    }
}
