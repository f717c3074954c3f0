#![deny(unsafe_code)]

mod config;
mod constants;
mod daemon;
mod input;
mod keymap;
mod keysym;
#[cfg(test)]
mod testing;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::{LoadReport, RegistryDump};
use daemon::{DispatchEngine, ProcessSupervisor};
use input::X11Session;

#[derive(Parser)]
#[command(name = "xhd")]
#[command(version)]
#[command(about = "X11 hotkey daemon", long_about = None)]
struct Cli {
    /// Config file to read instead of $XDG_CONFIG_HOME/xhd/config
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Load the config against the current keyboard layout, print a summary and exit
    #[arg(long)]
    check: bool,

    /// Print the resolved bindings as JSON and exit
    #[arg(long, conflicts_with = "check")]
    dump: bool,

    /// Mode to activate at startup (defaults to the first mode in the file)
    #[arg(short, long, value_name = "NAME")]
    mode: Option<String>,

    /// Log debug output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// `-v`/`-q` win over `RUST_LOG`, which wins over the `info` default
fn init_logging(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn print_report(path: &Path, report: &LoadReport) {
    println!(
        "{}: {} modes, {} bindings ({} key slots)",
        path.display(),
        report.modes,
        report.bindings,
        report.registrations
    );
    for skipped in &report.skipped {
        println!(
            "  line {}: mode '{}': skipped '{}': {}",
            skipped.line, skipped.mode, skipped.key, skipped.reason
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let path = config::config_path(cli.config.as_deref())?;
    info!(path = %path.display(), "Using config file");

    let session = X11Session::connect()?;
    let layout = session.layout()?;
    let (mut modes, report) = config::load_file(&path, &layout)?;

    if let Some(name) = &cli.mode {
        let index = modes
            .position(name)
            .with_context(|| format!("No mode named '{}' in {}", name, path.display()))?;
        modes.switch_mode(index)?;
    }

    if cli.dump {
        let json = serde_json::to_string_pretty(&RegistryDump::new(&modes))
            .context("Failed to serialize bindings")?;
        println!("{}", json);
        return Ok(());
    }

    if cli.check {
        print_report(&path, &report);
        return Ok(());
    }

    if modes.is_empty() {
        warn!("Config defines no modes, nothing will be grabbed");
    }

    let shutdown = daemon::shutdown_flag()?;
    let mut engine = DispatchEngine::new(modes, session.grabber(), ProcessSupervisor::new());
    engine.set_initial_group(session.current_group()?);
    engine.grab_current()?;

    daemon::run(&session, &mut engine, &shutdown)?;

    let running = engine.spawner().pending();
    if running > 0 {
        info!(running = running, "Exiting, running commands stay detached");
    }
    Ok(())
}
