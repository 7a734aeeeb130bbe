#![forbid(unsafe_code)]

use sb_core::calendar::DEFAULT_WINDOW_DAYS;
use sb_core::ids::{IdError, OrganizationId, UserId};
use std::path::PathBuf;

const DEFAULT_STORAGE_DIR: &str = ".salesboard";
const DEFAULT_ORG: &str = "default";
const DEFAULT_USER: &str = "team";
pub(crate) const MAX_WINDOW_DAYS: usize = 62;

#[derive(Debug)]
pub(crate) enum ConfigError {
    Organization(IdError),
    User(IdError),
    WindowDays(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Organization(err) => write!(f, "invalid organization: {}", err.message()),
            Self::User(err) => write!(f, "invalid user: {}", err.message()),
            Self::WindowDays(raw) => {
                write!(f, "window days must be an integer in 1..={MAX_WINDOW_DAYS} (got {raw:?})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RuntimeConfig {
    pub(crate) storage_dir: PathBuf,
    pub(crate) organization: OrganizationId,
    pub(crate) user: UserId,
    pub(crate) window_days: usize,
}

impl RuntimeConfig {
    /// Flags win over environment variables, which win over defaults.
    pub(crate) fn from_args(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let pick = |flag: &str, key: &str| {
            flag_value(args, flag).or_else(|| env(key).filter(|v| !v.trim().is_empty()))
        };

        let storage_dir = pick("--storage-dir", "SALESBOARD_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));
        let organization = OrganizationId::try_new(
            pick("--org", "SALESBOARD_ORG").unwrap_or_else(|| DEFAULT_ORG.to_string()),
        )
        .map_err(ConfigError::Organization)?;
        let user = UserId::try_new(
            pick("--user", "SALESBOARD_USER").unwrap_or_else(|| DEFAULT_USER.to_string()),
        )
        .map_err(ConfigError::User)?;
        let window_days = match pick("--window-days", "SALESBOARD_WINDOW_DAYS") {
            None => DEFAULT_WINDOW_DAYS,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(days) if (1..=MAX_WINDOW_DAYS).contains(&days) => days,
                _ => return Err(ConfigError::WindowDays(raw)),
            },
        };

        Ok(Self {
            storage_dir,
            organization,
            user,
            window_days,
        })
    }
}

/// Last occurrence wins, like repeated flags in most CLIs.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let mut out = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            if let Some(value) = iter.next() {
                out = Some(value.clone());
            }
        } else if let Some(value) = arg
            .strip_prefix(flag)
            .and_then(|rest| rest.strip_prefix('='))
        {
            out = Some(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn defaults_apply_without_flags_or_env() {
        let config = RuntimeConfig::from_args(&[], |_| None).expect("config");
        assert_eq!(config.storage_dir, PathBuf::from(".salesboard"));
        assert_eq!(config.organization.as_str(), "default");
        assert_eq!(config.user.as_str(), "team");
        assert_eq!(config.window_days, DEFAULT_WINDOW_DAYS);
    }

    #[test]
    fn flags_override_environment() {
        let env = |key: &str| match key {
            "SALESBOARD_ORG" => Some("77-football".to_string()),
            "SALESBOARD_USER" => Some("ilari".to_string()),
            "SALESBOARD_WINDOW_DAYS" => Some("14".to_string()),
            _ => None,
        };
        let config = RuntimeConfig::from_args(
            &args(&["--org", "funect", "--storage-dir=/tmp/sb", "--window-days", "3"]),
            env,
        )
        .expect("config");
        assert_eq!(config.organization.as_str(), "funect");
        assert_eq!(config.user.as_str(), "ilari");
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/sb"));
        assert_eq!(config.window_days, 3);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = RuntimeConfig::from_args(&args(&["--org", "no spaces"]), |_| None)
            .expect_err("bad org");
        assert!(matches!(err, ConfigError::Organization(_)));

        let err = RuntimeConfig::from_args(&args(&["--window-days", "0"]), |_| None)
            .expect_err("zero days");
        assert!(matches!(err, ConfigError::WindowDays(_)));
    }
}
