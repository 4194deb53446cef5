use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info};
use pivot_detector::config::{Config, ReportFormat};
use pivot_detector::{FlowTable, PcapEngine, PivotPipeline, Reporter, WindowScheduler};
use std::io;
use std::process;
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;

#[derive(Parser)]
#[command(name = "pivot-detector")]
#[command(about = "Passive stepping-stone (pivot) detector")]
struct Cli {
    #[arg(help = "Network interface to capture from")]
    interface: String,

    #[arg(short, long, help = "Configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Enable debug logging")]
    debug: bool,

    #[arg(long, help = "Report pivots as JSON lines")]
    json: bool,

    #[arg(long, help = "BPF filter applied to the capture")]
    filter: Option<String>,

    #[arg(long, help = "Analysis window length in seconds")]
    window: Option<u64>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let mut engine = match PcapEngine::open(&cli.interface, &config.capture) {
        Ok(engine) => engine,
        Err(e) => {
            if let Ok(devices) = PcapEngine::list_devices() {
                info!("Available interfaces: {:?}", devices);
            }
            return Err(e).context("Packet capture initialization failed");
        }
    };

    let table = Arc::new(FlowTable::new());

    // Capture blocks in libpcap, so it gets its own thread; the scheduler
    // only needs a timer.
    let (done_tx, done_rx) = oneshot::channel();
    let capture_table = Arc::clone(&table);
    thread::Builder::new()
        .name("packet-capture".into())
        .spawn(move || {
            let result = engine.run(capture_table);
            info!("Capture thread terminated: {}", engine.get_statistics().summary());
            let _ = done_tx.send(result);
        })
        .context("Failed to spawn capture thread")?;

    let reporter = Reporter::new(io::stdout(), config.report.format);
    let scheduler = WindowScheduler::new(table, PivotPipeline::new(config.detection), reporter);

    tokio::select! {
        finished = done_rx => match finished {
            Ok(result) => result.context("Packet capture stopped"),
            Err(_) => Err(anyhow!("Capture thread exited unexpectedly")),
        },
        result = scheduler.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    if cli.json {
        config.report.format = ReportFormat::Json;
    }
    if let Some(filter) = &cli.filter {
        config.capture.filter = Some(filter.clone());
    }
    if let Some(window) = cli.window {
        config.detection.window_secs = window;
    }

    config.validate()?;
    Ok(config)
}
