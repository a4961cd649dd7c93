// The linear provisioning pipeline: client → token → lifecycle.

use crate::api::RegistrationApi;
use crate::credentials;
use crate::error::ProvisionError;
use crate::orchestrator::{CommandRunner, RunnerLifecycle};
use crate::registration::{self, RegistrationScope};
use provisioner_common::{RunnerSettings, TraceManager};
use provisioner_sdk::{ProcessInvoker, TraceWriter};
use tokio_util::sync::CancellationToken;

/// Run one full provisioning cycle against GitHub with the real toolchain.
pub async fn provision(
    settings: &RunnerSettings,
    traces: &TraceManager,
    cancellation_token: CancellationToken,
) -> Result<(), ProvisionError> {
    let client = credentials::resolve(settings, traces)?;
    let invoker = ProcessInvoker::new(traces.get_writer("ProcessInvoker"));
    provision_with(&client, invoker, settings, traces, cancellation_token).await
}

/// The pipeline after client construction, with the API and the command
/// runner supplied by the caller.
pub async fn provision_with<R: CommandRunner>(
    api: &dyn RegistrationApi,
    runner: R,
    settings: &RunnerSettings,
    traces: &TraceManager,
    cancellation_token: CancellationToken,
) -> Result<(), ProvisionError> {
    let trace = traces.get("Provisioner");

    let scope = RegistrationScope::from_settings(settings)?;
    trace.info(&format!("Creating registration token for {scope}"));

    let token = registration::acquire(api, &scope, cancellation_token.clone()).await?;
    traces.secret_masker().add_value(token.value());
    if let Some(expires_at) = token.expires_at() {
        trace.info(&format!("Registration token expires at {expires_at}"));
    }

    let identity = settings.identity();
    trace.info(&format!(
        "Provisioning runner '{}' from {} for {}",
        identity.name,
        identity.home.display(),
        token.target_url()
    ));

    let mut lifecycle = RunnerLifecycle::new(runner, identity, traces.get("RunnerLifecycle"));
    lifecycle.execute(&token, cancellation_token).await
}
