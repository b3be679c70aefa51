//! # autolightd — light controller daemon
//!
//! Composition root that wires the controller to a JSON-lines platform
//! bridge on stdin/stdout.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the `tracing` subscriber, logging to stderr
//! - Construct the bridge and inject it into the controller as both
//!   actuator gateway and status source
//! - Pump stdin into the controller and commands out to stdout
//! - On stdin EOF, let armed timers run out (a pending switch-off still
//!   happens) and then stop; Ctrl-C stops at once, leaving the relay as is
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no controller logic belongs here.

mod bridge;
mod config;

use std::sync::Arc;

use anyhow::Context;
use autolight_app::controller::Controller;
use tokio::io::{self, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::bridge::StdioBridge;
use crate::config::Config;

fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(run(config));
    // a pending stdin read holds a blocking thread until the next line
    runtime.shutdown_background();
    result
}

async fn run(config: Config) -> anyhow::Result<()> {
    let (commands, command_rx) = mpsc::unbounded_channel();
    let bridge = Arc::new(StdioBridge::new(commands, config.bridge.status_timeout));

    let (controller, handle) = Controller::new(config.controller, Arc::clone(&bridge));
    let mut controller = tokio::spawn(controller.with_status_source(Arc::clone(&bridge)).run());
    let writer = tokio::spawn(bridge::write_commands(command_rx, io::stdout()));
    let mut reader = tokio::spawn({
        let bridge = Arc::clone(&bridge);
        let handle = handle.clone();
        async move {
            bridge::read_lines(BufReader::new(io::stdin()), &bridge, |event| {
                handle.submit(event)
            })
            .await
        }
    });

    tokio::select! {
        result = &mut reader => {
            match result {
                Ok(Ok(())) => info!("input closed"),
                Ok(Err(err)) => warn!(%err, "failed to read input"),
                Err(err) => warn!(%err, "input task failed"),
            }
            handle.shutdown_when_idle();
            tokio::select! {
                result = &mut controller => result.context("controller task failed")?,
                () = interrupted() => {
                    handle.shutdown();
                    controller.await.context("controller task failed")?;
                }
            }
        },
        () = interrupted() => {
            reader.abort();
            handle.shutdown();
            controller.await.context("controller task failed")?;
        }
    }

    drop(bridge);
    writer
        .await
        .context("output task failed")?
        .context("failed to write commands")?;
    Ok(())
}

async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for ctrl-c");
        // without a signal handler only EOF can stop the daemon
        std::future::pending::<()>().await;
    }
    info!("interrupted");
}
