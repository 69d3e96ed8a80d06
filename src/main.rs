// portprobe - concurrent port prober
//
// Parses arguments, runs one scan and prints the report. Everything that
// does real work lives in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use portprobe::cli::{Args, OutputFormat};
use portprobe::config::Settings;
use portprobe::output::{self, ScanHeader, ScanReport};
use portprobe::scanner::{ProbeTask, ScanManager, ScanObserver, WorkerPool};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Prints open ports above the progress bar as they are found.
struct ProgressObserver {
    bar: ProgressBar,
}

impl ScanObserver for ProgressObserver {
    fn port_open(&self, port: u16) {
        self.bar.println(output::open_line(port));
    }

    fn probe_finished(&self, _port: u16) {
        self.bar.inc(1);
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn progress_bar(len: usize, format: OutputFormat) -> ProgressBar {
    if format != OutputFormat::Plain {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}

async fn run(args: Args) -> Result<()> {
    let settings = match &args.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::load().context("failed to load settings")?,
    };

    let ports = args.port_set(&settings).context("invalid port specification")?;
    let config = args.scan_config(&settings);

    if args.output == OutputFormat::Plain {
        output::print_scan_header(&ScanHeader {
            target: &config.target,
            ports: ports.as_slice(),
            protocol: &config.protocol,
            threads: WorkerPool::<ProbeTask>::clamp_threads(config.threads, ports.len()),
            timeout: config.timeout,
            verbosity: args.verbose,
        });
    }

    let bar = progress_bar(ports.len(), args.output);
    let mut manager = ScanManager::new(config.clone())
        .context("failed to set up prober")?
        .observe(Arc::new(ProgressObserver { bar: bar.clone() }));

    let cancel = manager.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            output::print_warning("interrupted, finishing in-flight probes");
            cancel.cancel();
        }
    });

    let result = manager.run(ports.as_slice()).await?;
    bar.finish_and_clear();

    let report = ScanReport {
        target: &config.target,
        protocol: &config.protocol,
        ports_scanned: ports.len(),
        result,
    };
    output::print_results(&report, args.output, args.verbose).context("failed to write results")?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
