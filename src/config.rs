//! Command-line flags and the run configuration derived from them.

use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::error::BenchError;
use crate::types::Flavor;

pub const DEFAULT_AMOUNT: usize = 30_000;
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Measure exact and glob ACP evaluation latency on a Rego engine.
#[derive(Parser, Debug, Clone)]
#[command(name = "acp-bench", version, about, long_about = None)]
pub struct Cli {
    /// Policy flavor to generate and evaluate (exact, glob)
    #[arg(long, env = "ACP_BENCH_FLAVOR", default_value = "exact")]
    pub flavor: Flavor,

    /// Number of policies to generate
    #[arg(long, env = "ACP_BENCH_AMOUNT", default_value_t = DEFAULT_AMOUNT)]
    pub amount: usize,

    /// Collect per-phase timings while preparing and evaluating
    #[arg(long, env = "ACP_BENCH_INSTRUMENT")]
    pub instrument: bool,

    /// Specialize the module against the store before evaluating
    #[arg(long, env = "ACP_BENCH_PARTIAL")]
    pub partial: bool,

    /// Seconds between latency reports
    #[arg(long, env = "ACP_BENCH_REPORT_INTERVAL_SECS", default_value_t = 5)]
    pub report_interval_secs: u64,

    /// Log output format (text, json)
    #[arg(long, env = "ACP_BENCH_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

/// Everything a run needs, fixed at startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchConfig {
    pub flavor: Flavor,
    pub amount: usize,
    pub instrument: bool,
    pub partial: bool,
    pub report_interval: Duration,
    pub log_format: LogFormat,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            flavor: Flavor::Exact,
            amount: DEFAULT_AMOUNT,
            instrument: false,
            partial: false,
            report_interval: DEFAULT_REPORT_INTERVAL,
            log_format: LogFormat::Text,
        }
    }
}

impl From<Cli> for BenchConfig {
    fn from(cli: Cli) -> Self {
        BenchConfig {
            flavor: cli.flavor,
            amount: cli.amount,
            instrument: cli.instrument,
            partial: cli.partial,
            report_interval: Duration::from_secs(cli.report_interval_secs),
            log_format: cli.log_format,
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.report_interval.is_zero() {
            return Err(BenchError::InvalidConfig(
                "report interval must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}
