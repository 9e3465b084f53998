// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gafferd: run the orchestration engine until interrupted.

use gaffer_daemon::{bootstrap, env};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    gaffer_daemon::bootstrap::init_tracing();

    let _api = match bootstrap().await {
        Ok(api) => api,
        Err(e) => {
            tracing::error!(error = %e, "failed to start engine");
            return std::process::ExitCode::FAILURE;
        }
    };

    tracing::info!(
        host = env::host(),
        port = env::port(),
        data_dir = %env::data_dir().display(),
        "engine ready"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "signal handler failed");
        return std::process::ExitCode::FAILURE;
    }
    tracing::info!("shutting down");
    std::process::ExitCode::SUCCESS
}
