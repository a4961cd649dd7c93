// Entry point: read settings, scrub them from the environment, then run one
// provisioning cycle and exit with its outcome.

use anyhow::Context;
use provisioner_common::constants::return_code;
use provisioner_common::{scrub_environment, RunnerSettings, TraceManager};
use provisioner_sdk::build_constants::{ProvisionerPackage, Source};
use tokio_util::sync::CancellationToken;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Settings are read and scrubbed before the runtime starts any threads.
    let settings = RunnerSettings::from_env();
    scrub_environment();

    let exit_code = match settings {
        Ok(settings) => match build_runtime() {
            Ok(runtime) => runtime.block_on(run(settings)),
            Err(e) => {
                tracing::error!("{:#}", e);
                return_code::TERMINATED_ERROR
            }
        },
        Err(e) => {
            tracing::error!("{}", e);
            return_code::TERMINATED_ERROR
        }
    };

    std::process::exit(exit_code);
}

fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")
}

async fn run(settings: RunnerSettings) -> i32 {
    tracing::info!(
        version = ProvisionerPackage::VERSION,
        commit = Source::COMMIT_HASH,
        "Runner provisioner starting"
    );

    let cancellation_token = CancellationToken::new();
    watch_shutdown_signals(cancellation_token.clone());

    let traces = TraceManager::default();
    match runner_provisioner::provision(&settings, &traces, cancellation_token).await {
        Ok(()) => {
            tracing::info!("Runner provisioner exiting with code {}", return_code::SUCCESS);
            return_code::SUCCESS
        }
        Err(e) => {
            let e = anyhow::Error::new(e);
            tracing::error!("{}", traces.secret_masker().mask_secrets(&format!("{e:#}")));
            return_code::TERMINATED_ERROR
        }
    }
}

/// Cancel the run on Ctrl-C or SIGTERM so the running child is torn down.
fn watch_shutdown_signals(cancellation_token: CancellationToken) {
    let on_ctrl_c = cancellation_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received, cancelling");
                on_ctrl_c.cancel();
            }
            Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("SIGTERM received, cancelling");
                cancellation_token.cancel();
            }
            Err(e) => tracing::warn!("Failed to listen for SIGTERM: {}", e),
        }
    });
}
