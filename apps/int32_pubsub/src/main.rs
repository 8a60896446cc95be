use anyhow::Context as _;
use clap::Parser;
use int32_pubsub::{app_main, AppConfig, TaskArgs};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uros_core::rtos::{self, TaskAttributes, TaskPriority};
use uros_core::InitOptions;

#[derive(Parser)]
#[command(name = "int32_pubsub")]
#[command(about = "Publish a counter and log received integers", long_about = None)]
struct Cli {
    /// TOML file overriding the built-in settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "int32_pubsub=debug,uros_core=trace".
    /// RUST_LOG takes precedence when set.
    #[arg(long, value_name = "FILTER", default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::default(),
    };

    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    ctrlc::set_handler(move || {
        if !flag.swap(true, Ordering::AcqRel) {
            tracing::info!("Ctrl-C received, stopping");
        }
    })
    .context("installing Ctrl-C handler")?;

    let attrs = TaskAttributes {
        name: config.task.name.clone(),
        priority: TaskPriority::Normal,
        stack_size: config.task.stack_size,
    };

    let (done_tx, done_rx) = mpsc::channel();
    let task = rtos::spawn_task(attrs, move || {
        let _ = done_tx.send(app_main(TaskArgs {
            config,
            options: InitOptions::new(),
            stop: Some(stop),
        }));
    })?;
    task.join()?;

    match done_rx.recv() {
        Ok(result) => result.context("application setup failed"),
        Err(_) => anyhow::bail!("application task ended without reporting"),
    }
}
