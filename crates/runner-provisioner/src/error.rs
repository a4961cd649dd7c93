// Error taxonomy of a provisioning run. Every variant is fatal.

use crate::api::ApiError;
use crate::orchestrator::LifecycleState;
use provisioner_common::SettingsError;
use provisioner_sdk::ProcessError;
use std::fmt;

/// The three external invocations of a runner lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    Unregister,
    Register,
    Run,
}

impl LifecycleStage {
    /// Message an invocation failure in this stage is wrapped with.
    pub fn failure_message(&self) -> &'static str {
        match self {
            LifecycleStage::Unregister => "failed to unregister runner",
            LifecycleStage::Register => "failed to register runner",
            LifecycleStage::Run => "runner failed",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleStage::Unregister => write!(f, "unregister"),
            LifecycleStage::Register => write!(f, "register"),
            LifecycleStage::Run => write!(f, "run"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Missing, contradictory or malformed configuration.
    #[error("{0}")]
    Config(String),

    /// Reading private key material failed.
    #[error("{context}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("client initialization error")]
    ClientInit(#[source] ApiError),

    #[error("failed to create registration token")]
    Registration(#[source] ApiError),

    /// `RunnerLifecycle::execute` called on a lifecycle that already ran.
    #[error("runner lifecycle already ran (state {state:?})")]
    LifecycleReused { state: LifecycleState },

    #[error("{}", stage.failure_message())]
    Exec {
        stage: LifecycleStage,
        #[source]
        source: ProcessError,
    },
}

impl ProvisionError {
    pub fn config(message: impl Into<String>) -> Self {
        ProvisionError::Config(message.into())
    }

    /// The lifecycle stage that failed, for `Exec` errors.
    pub fn stage(&self) -> Option<LifecycleStage> {
        match self {
            ProvisionError::Exec { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<SettingsError> for ProvisionError {
    fn from(err: SettingsError) -> Self {
        ProvisionError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn exec_error_names_the_stage() {
        let err = ProvisionError::Exec {
            stage: LifecycleStage::Unregister,
            source: ProcessError::ExitCode {
                file_name: "/opt/runner/config.sh".into(),
                exit_code: 2,
            },
        };
        assert_eq!(err.to_string(), "failed to unregister runner");
        assert_eq!(err.stage(), Some(LifecycleStage::Unregister));
        assert!(err.source().unwrap().to_string().contains("exit code 2"));
    }

    #[test]
    fn stage_messages() {
        assert_eq!(LifecycleStage::Register.failure_message(), "failed to register runner");
        assert_eq!(LifecycleStage::Run.failure_message(), "runner failed");
        assert_eq!(LifecycleStage::Run.to_string(), "run");
    }

    #[test]
    fn settings_errors_become_config_errors() {
        let err: ProvisionError = SettingsError::InvalidInteger {
            variable: "RUNNER_APP_ID",
            value: "x".into(),
        }
        .into();
        assert!(matches!(err, ProvisionError::Config(_)));
        assert!(err.stage().is_none());
    }
}
