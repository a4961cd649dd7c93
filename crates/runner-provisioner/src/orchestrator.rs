// Drives the runner toolchain through unregister → register → run-once.
//
// Strictly sequential and fail-fast: each stage either succeeds and moves to
// the next, or fails and ends the lifecycle. Nothing is skipped or retried.

use crate::error::{LifecycleStage, ProvisionError};
use crate::registration::RegistrationToken;
use async_trait::async_trait;
use provisioner_common::constants::scripts;
use provisioner_common::{RunnerIdentity, Tracing};
use provisioner_sdk::{ProcessError, ProcessInvoker, TraceWriter};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Where a lifecycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Unregistering,
    Registering,
    Running,
    Done,
    Failed,
}

impl LifecycleState {
    fn for_stage(stage: LifecycleStage) -> Self {
        match stage {
            LifecycleStage::Unregister => LifecycleState::Unregistering,
            LifecycleStage::Register => LifecycleState::Registering,
            LifecycleStage::Run => LifecycleState::Running,
        }
    }
}

/// Runs one external program to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        working_directory: &Path,
        program: &Path,
        arguments: &[String],
        cancellation_token: CancellationToken,
    ) -> Result<(), ProcessError>;
}

#[async_trait]
impl CommandRunner for ProcessInvoker {
    async fn run(
        &self,
        working_directory: &Path,
        program: &Path,
        arguments: &[String],
        cancellation_token: CancellationToken,
    ) -> Result<(), ProcessError> {
        self.execute(working_directory, program, arguments, cancellation_token)
            .await
    }
}

/// One planned external invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage: LifecycleStage,
    pub program: PathBuf,
    pub arguments: Vec<String>,
}

/// The unregister/register/run sequence for one runner identity.
pub struct RunnerLifecycle<R: CommandRunner> {
    runner: R,
    identity: RunnerIdentity,
    state: LifecycleState,
    trace: Tracing,
}

impl<R: CommandRunner> RunnerLifecycle<R> {
    pub fn new(runner: R, identity: RunnerIdentity, trace: Tracing) -> Self {
        Self {
            runner,
            identity,
            state: LifecycleState::Idle,
            trace,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The three invocations, in the order they run.
    pub fn plan(&self, token: &RegistrationToken) -> Vec<Invocation> {
        let home = &self.identity.home;
        let identity_args = [
            "--name".to_string(),
            self.identity.name.clone(),
            "--url".to_string(),
            token.target_url().to_string(),
            "--token".to_string(),
            token.value().to_string(),
        ];

        let mut unregister = vec!["remove".to_string()];
        unregister.extend(identity_args.iter().cloned());

        let mut register = vec!["--unattended".to_string(), "--replace".to_string()];
        register.extend(identity_args.iter().cloned());

        vec![
            Invocation {
                stage: LifecycleStage::Unregister,
                program: home.join(scripts::CONFIG),
                arguments: unregister,
            },
            Invocation {
                stage: LifecycleStage::Register,
                program: home.join(scripts::CONFIG),
                arguments: register,
            },
            Invocation {
                stage: LifecycleStage::Run,
                program: home.join(scripts::RUN),
                arguments: vec!["--once".to_string()],
            },
        ]
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// Cancelling `cancellation_token` terminates whichever child is running
    /// and fails the lifecycle at that stage.
    pub async fn execute(
        &mut self,
        token: &RegistrationToken,
        cancellation_token: CancellationToken,
    ) -> Result<(), ProvisionError> {
        if self.state != LifecycleState::Idle {
            return Err(ProvisionError::LifecycleReused { state: self.state });
        }

        for invocation in self.plan(token) {
            self.state = LifecycleState::for_stage(invocation.stage);
            self.trace.info(&format!(
                "{:?}: runner '{}' at {}",
                self.state,
                self.identity.name,
                token.target_url()
            ));

            let result = self
                .runner
                .run(
                    &self.identity.home,
                    &invocation.program,
                    &invocation.arguments,
                    cancellation_token.clone(),
                )
                .await;

            if let Err(source) = result {
                self.state = LifecycleState::Failed;
                return Err(ProvisionError::Exec {
                    stage: invocation.stage,
                    source,
                });
            }
        }

        self.state = LifecycleState::Done;
        self.trace.info("Runner lifecycle finished");
        Ok(())
    }
}
