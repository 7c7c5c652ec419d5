//! Latency benchmark for exact and glob ACP evaluation on a Rego engine.
//!
//! A run generates a synthetic store of access-control policies, prepares
//! the flavor's Rego module against it (optionally specialized ahead of
//! time), and evaluates one fixed request in a loop while reporting latency
//! percentiles.

pub use config::{BenchConfig, Cli, LogFormat};
pub use driver::run;
pub use engine::{PolicyEvaluator, PrepareParams, Prepared, PreparedQuery, RegoEvaluator};
pub use error::BenchError;
pub use generator::generate;
pub use histogram::{HistogramSnapshot, LatencyHistogram};
pub use measure::{LoopState, MeasurementLoop};
pub use metrics::{LatencyReport, LogSink, PrepareMetrics, ReportSink};
pub use policies::FlavorProfile;
pub use types::{
    AccessPolicy, AcpStore, Decision, Effect, Flavor, QueryResult, RequestInput, ResultSet, Role,
};

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod generator;
pub mod histogram;
pub mod measure;
pub mod metrics;
pub mod policies;
pub mod timers;
pub mod types;
