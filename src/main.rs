use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use attention_agent::ledger::LedgerReport;
use attention_agent::replay::{demo_script, ReplayDetector, ReplayScript};
use attention_agent::sink::{EventLog, JsonlEventLog, TracingEventLog, TracingNotifier};
use attention_agent::{
    Clock, ManualClock, MonitorAgent, MonitorConfig, MonitorError, MonitorSession, Scheduler,
    StopSignal,
};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;

/// Replay a scripted camera session through the alert pipeline.
#[derive(Parser, Debug)]
#[command(name = "attention-agent", version)]
struct Args {
    /// JSON monitor configuration. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON replay script. A built-in demo runs when omitted.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Append every logged event as JSON lines to this file.
    #[arg(long)]
    event_log: Option<PathBuf>,

    /// One of off, error, warn, info, debug, trace.
    #[arg(long, default_value = "info", value_parser = clap::value_parser!(LevelFilter))]
    log_level: LevelFilter,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "monitoring failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), MonitorError> {
    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            MonitorConfig::from_json_file(path)?
        }
        None => MonitorConfig::default(),
    };

    let script = match &args.script {
        Some(path) => ReplayScript::from_json_file(path)?,
        None => demo_script(config.landmark_count),
    };

    let clock = Arc::new(ManualClock::at_epoch());
    let log: Arc<dyn EventLog> = match &args.event_log {
        Some(path) => Arc::new(JsonlEventLog::open(path, clock.clone() as Arc<dyn Clock>)?),
        None => Arc::new(TracingEventLog),
    };

    let session = Arc::new(MonitorSession::new(
        config,
        clock.clone(),
        log,
        Arc::new(TracingNotifier),
    )?);

    let classifier = script.classifier();
    let agent = MonitorAgent::new(Arc::clone(&session), ReplayDetector, classifier);
    let mut scheduler = Scheduler::new(agent);

    let stop = StopSignal::new();
    let summary = scheduler.run(|| Ok(script.camera(clock, stop.clone())), &stop)?;

    info!(
        frames = summary.frames,
        admitted = summary.admitted_alerts,
        worst_case_ms = scheduler.worst_case().as_millis() as u64,
        "replay finished"
    );

    for warning in session.drain_warnings() {
        println!("[{}] {}", warning.event, warning.message);
    }
    println!();
    print!("{}", LedgerReport::new(&session.ledger_snapshot()));
    Ok(())
}
