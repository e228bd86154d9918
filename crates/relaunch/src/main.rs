//! relaunch: bring an application up to date from its deployment and run it.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use relaunch_core::{LaunchParams, LaunchRequest, Orchestrator, RunningApp};
use relaunch_fetch::{Fetcher, ReqwestClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::LauncherConfig;
use crate::console::ConsoleSink;
use crate::process::ProcessLoader;

mod cli;
mod config;
mod console;
mod process;

/// Another instance already holds the cache root.
const EXIT_ALREADY_RUNNING: u8 = 3;
const EXIT_INTERRUPTED: u8 = 130;
const EXIT_TERMINATED: u8 = 143;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("relaunch: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let launcher_dir = launcher_dir()?;
    let config = LauncherConfig::load(&cli, &launcher_dir).context("invalid launcher configuration")?;
    init_tracing(&config.log);

    let client = ReqwestClient::new(config.timeouts()).context("failed to build the HTTP client")?;
    let mut orchestrator = Orchestrator::new(
        Fetcher::new(client),
        ProcessLoader,
        ConsoleSink::new(config.progress),
    );
    let request = LaunchRequest::new(
        config.embedded_manifest(&launcher_dir),
        LaunchParams::parse(cli.args),
        launcher_dir,
    );

    match orchestrator.run(request) {
        Ok(app) => supervise(app),
        Err(failure) if failure.is_silent() => Ok(ExitCode::from(EXIT_ALREADY_RUNNING)),
        // Already reported through the console sink.
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

/// Wait for the application to exit, stopping it on Ctrl-C.
fn supervise(app: RunningApp) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(wait_or_interrupt(app))
}

async fn wait_or_interrupt(mut app: RunningApp) -> Result<ExitCode> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut terminate = Terminate::new()?;

    loop {
        if let Some(code) = app.try_wait()? {
            tracing::info!(code, "application exited");
            return Ok(exit_code(code));
        }

        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            signal = &mut ctrl_c => {
                signal.context("failed to listen for Ctrl-C")?;
                tracing::info!("interrupted, stopping application");
                app.stop()?;
                return Ok(ExitCode::from(EXIT_INTERRUPTED));
            }
            _ = terminate.recv() => {
                tracing::info!("terminated, stopping application");
                app.stop()?;
                return Ok(ExitCode::from(EXIT_TERMINATED));
            }
        }
    }
}

/// SIGTERM; never fires where the platform has no such signal.
#[cfg(unix)]
struct Terminate(tokio::signal::unix::Signal);

#[cfg(unix)]
impl Terminate {
    fn new() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let signal = signal(SignalKind::terminate()).context("failed to listen for SIGTERM")?;
        Ok(Self(signal))
    }

    async fn recv(&mut self) {
        if self.0.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
struct Terminate;

#[cfg(not(unix))]
impl Terminate {
    fn new() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) {
        std::future::pending::<()>().await
    }
}

fn exit_code(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}

fn launcher_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("failed to locate the launcher executable")?;
    exe.parent()
        .map(PathBuf::from)
        .context("launcher executable has no parent directory")
}

fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_new(filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sigterm_is_observed() {
        let mut terminate = Terminate::new().unwrap();
        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), terminate.recv())
            .await
            .unwrap();
    }
}
