// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Campaign Management Head (cm-head)
//!
//! Drives campaigns: sends directives to the factories and folds their feedbacks.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod lifecycle;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::config::HeadConfig;
use crate::lifecycle::LifecycleError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = HeadConfig::load()?;

    // Set up logging
    let log_guard = setup_logging(&config)?;

    info!(pid = std::process::id(), clustered = config.is_clustered(), "Starting cm-head");

    // Start head
    let mut head = match lifecycle::startup(&config).await {
        Ok(head) => head,
        Err(e) => {
            error!("Failed to start head: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("Head ready");

    // Main event loop
    loop {
        tokio::select! {
            inbound = head.next_inbound() => {
                match inbound {
                    Some(Ok(inbound)) => {
                        if let Err(e) = head.handle(inbound).await {
                            error!("Error handling message: {}", e);
                        }
                    }
                    Some(Err(e)) => {
                        error!("Error reading message: {}", e);
                    }
                    None => {
                        info!("No more messages, shutting down...");
                        head.shutdown().await;
                        break;
                    }
                }
            }

            // Graceful shutdown on SIGTERM
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                head.shutdown().await;
                break;
            }

            // Graceful shutdown on SIGINT
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                head.shutdown().await;
                break;
            }
        }
    }

    info!("Head stopped");
    Ok(())
}

fn setup_logging(
    config: &HeadConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Create log directory if needed
    let log_dir = config.log_path.parent().ok_or(LifecycleError::NoLogDir)?;
    std::fs::create_dir_all(log_dir)?;

    // Set up file appender
    let file_appender = tracing_appender::rolling::never(
        log_dir,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoLogDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Set up subscriber with env filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
