use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use engine_logging::{engine_info, engine_warn};
use tracker_core::{LifecycleState, OperationHandle};
use tracker_engine::{ReqwestTransport, SolverClient, TrackerHandle};

use super::cli::{Cli, Command, SolveArgs};
use super::config::{load_config, TrackerConfig};
use super::logging;
use super::render::TerminalSink;

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    cli.apply_overrides(&mut config);
    logging::initialize(config.log_destination, &config.log_file, cli.verbose);
    engine_info!("Using solver at {}", config.base_url);

    let transport = ReqwestTransport::new(&config.transport_settings())
        .with_context(|| format!("configuring transport for {}", config.base_url))?;
    let client = SolverClient::new(Arc::new(transport), config.capabilities);

    match &cli.command {
        Command::Solve(args) => solve(client, &config, args).await,
        Command::Attach { id } => {
            let tracker = spawn_tracker(client, &config);
            tracker.attach(OperationHandle::new(id.clone()));
            follow(tracker).await
        }
        Command::List => list(&client).await,
        Command::Info => info(&client).await,
    }
}

fn spawn_tracker(client: SolverClient, config: &TrackerConfig) -> TrackerHandle {
    TrackerHandle::spawn(
        client,
        config.tracker_settings(),
        Arc::new(TerminalSink::new()),
    )
}

async fn solve(client: SolverClient, config: &TrackerConfig, args: &SolveArgs) -> Result<()> {
    let form = args.to_form();
    // An invalid form never leaves Idle, so there would be nothing to wait for.
    form.validate(config.policy.require_input)
        .context("invalid solve parameters")?;

    let tracker = spawn_tracker(client, config);
    tracker.submit(form);
    follow(tracker).await
}

/// Waits for the operation to settle. The first Ctrl-C asks the server to
/// cancel; a second one stops tracking without waiting for the server.
async fn follow(mut tracker: TrackerHandle) -> Result<()> {
    let mut cancel_sent = false;
    let view = loop {
        tokio::select! {
            view = tracker.settled() => break view,
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for Ctrl-C")?;
                if cancel_sent {
                    engine_warn!("Second interrupt; abandoning operation");
                    tracker.reset();
                    break tracker.view();
                }
                eprintln!("Requesting cancellation (press Ctrl-C again to stop tracking)");
                tracker.cancel();
                cancel_sent = true;
            }
        }
    };
    tracker.shutdown().await;

    match view.lifecycle {
        LifecycleState::Failed(reason) => bail!("operation failed: {reason}"),
        lifecycle => {
            engine_info!("Tracking finished in state {:?}", lifecycle);
            Ok(())
        }
    }
}

async fn list(client: &SolverClient) -> Result<()> {
    let operations = client
        .running_operations()
        .await
        .context("listing running operations")?;
    if operations.is_empty() {
        println!("No operations currently running.");
        return Ok(());
    }
    for (id, label) in &operations {
        println!("{id}  {label}");
    }
    Ok(())
}

async fn info(client: &SolverClient) -> Result<()> {
    let info = client
        .environment_info()
        .await
        .context("fetching server environment")?;
    for line in info.lines() {
        println!("{line}");
    }
    Ok(())
}
