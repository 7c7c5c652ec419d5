use std::process::exit;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use acp_bench::{BenchConfig, Cli, LogFormat};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("acp_bench=info,info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}

fn main() {
    let config = BenchConfig::from(Cli::parse());
    init_tracing(config.log_format);

    let Err(err) = acp_bench::run(&config);
    error!(error = %err, "Benchmark aborted");
    exit(1);
}
