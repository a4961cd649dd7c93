// Typed view of the `RUNNER_*` configuration surface.

use crate::constants::{variables, DEFAULT_RUNNER_HOME, ENVIRONMENT_VARIABLES};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors raised while reading settings from the environment.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{variable} must be an integer, got '{value}'")]
    InvalidInteger { variable: &'static str, value: String },

    #[error("{variable} is not valid UTF-8")]
    NotUnicode { variable: &'static str },
}

/// Settings read once from the environment at startup.
///
/// Empty strings mean "not set". `app_id` and `app_installation_id` are `0`
/// when unset.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RunnerSettings {
    pub name: String,
    pub home: PathBuf,
    pub owner: String,
    pub repo: String,
    pub org: String,
    pub access_token: String,
    pub app_id: i64,
    pub app_installation_id: i64,
    pub app_private_key: String,
    pub app_private_key_path: String,
}

impl RunnerSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_os_lookup(|key| std::env::var_os(key))
    }

    /// Like `from_lookup`, but rejects values that are not valid UTF-8
    /// instead of treating them as unset.
    fn from_os_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        for &variable in ENVIRONMENT_VARIABLES {
            if lookup(variable).is_some_and(|value| value.to_str().is_none()) {
                return Err(SettingsError::NotUnicode { variable });
            }
        }
        Self::from_lookup(|key| lookup(key).and_then(|value| value.into_string().ok()))
    }

    /// Read settings through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str| lookup(key).unwrap_or_default();
        let integer = |key: &'static str| -> Result<i64, SettingsError> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => {
                    value
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| SettingsError::InvalidInteger {
                            variable: key,
                            value,
                        })
                }
                _ => Ok(0),
            }
        };

        let home = match lookup(variables::HOME) {
            Some(home) if !home.is_empty() => PathBuf::from(home),
            _ => PathBuf::from(DEFAULT_RUNNER_HOME),
        };

        Ok(Self {
            name: string(variables::NAME),
            home,
            owner: string(variables::OWNER),
            repo: string(variables::REPO),
            org: string(variables::ORG),
            access_token: string(variables::ACCESS_TOKEN),
            app_id: integer(variables::APP_ID)?,
            app_installation_id: integer(variables::APP_INSTALLATION_ID)?,
            app_private_key: string(variables::APP_PRIVATE_KEY),
            app_private_key_path: string(variables::APP_PRIVATE_KEY_PATH),
        })
    }

    /// Resolve the runner identity, falling back to the host name.
    ///
    /// A relative home is made absolute against the current directory, since
    /// the toolchain scripts run with the home as their working directory.
    pub fn identity(&self) -> RunnerIdentity {
        let name = if self.name.is_empty() {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_default()
        } else {
            self.name.clone()
        };

        RunnerIdentity {
            name,
            home: absolute_home(&self.home),
        }
    }
}

fn absolute_home(home: &Path) -> PathBuf {
    if home.is_absolute() {
        return home.to_path_buf();
    }
    match std::path::absolute(home) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("Cannot resolve runner home '{}': {}", home.display(), e);
            home.to_path_buf()
        }
    }
}

impl fmt::Debug for RunnerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerSettings")
            .field("name", &self.name)
            .field("home", &self.home)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("org", &self.org)
            .field("access_token", &redact(&self.access_token))
            .field("app_id", &self.app_id)
            .field("app_installation_id", &self.app_installation_id)
            .field("app_private_key", &redact(&self.app_private_key))
            .field("app_private_key_path", &self.app_private_key_path)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "***"
    }
}

/// Who the runner registers as and where its toolchain lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerIdentity {
    pub name: String,
    pub home: PathBuf,
}
