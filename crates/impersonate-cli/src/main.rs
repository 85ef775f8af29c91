//! `impersonate` - run one query as another identity.
//!
//! Builds an in-memory host from a JSON fixture, opens a caller session on
//! the chosen target and executes the query as `--user`. Rows are printed
//! to stdout as JSON lines; logs go to stderr.
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`IMPERSONATE_*`)
//! 3. Config file given with `--config`
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```text
//! impersonate --fixture people.json --user joe \
//!     --param name=John "MATCH (p:Person{name:\$name}) RETURN p"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use impersonate_runtime::memory::{HostFixture, MemorySession};
use impersonate_runtime::{
    ConfigLoader, ImpersonateConfig, Impersonator, Session, SessionSupervisor, TerminationReason,
};
use impersonate_types::{Params, Value};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Run a query as another identity
#[derive(Parser, Debug)]
#[command(name = "impersonate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Log filter directive (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// TOML config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON host fixture (users, roles, graph)
    #[arg(short, long, value_name = "PATH")]
    fixture: PathBuf,

    /// Identity to run the query as
    #[arg(short, long)]
    user: String,

    /// Target to run against (defaults to the fixture's default target)
    #[arg(short, long)]
    target: Option<String>,

    /// Query parameter as KEY=VALUE; VALUE is read as JSON, else as a string
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, Value)>,

    /// Keep entities bound to the impersonated session
    #[arg(long)]
    no_rebind: bool,

    /// Supervisor sweep interval in milliseconds
    #[arg(long, value_name = "MS")]
    sweep_interval_ms: Option<u64>,

    /// Query to execute
    #[arg(trailing_var_arg = true, required = true)]
    query: Vec<String>,
}

/// Merges file/env config via [`ConfigLoader`] and applies CLI overrides
/// as the highest-priority layer.
struct CliConfigResolver {
    config_path: Option<PathBuf>,
    no_rebind: bool,
    sweep_interval_ms: Option<u64>,
    skip_env: bool,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        Self {
            config_path: args.config.clone(),
            no_rebind: args.no_rebind,
            sweep_interval_ms: args.sweep_interval_ms,
            skip_env: false,
        }
    }

    fn resolve(&self) -> Result<ImpersonateConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(ref path) = self.config_path {
            loader = loader.with_config_file(path);
        }
        if self.skip_env {
            loader = loader.skip_env_vars();
        }
        let mut config = loader.load().context("Config error")?;

        if self.no_rebind {
            config.rebind_entities = false;
        }
        if let Some(ms) = self.sweep_interval_ms {
            config.supervisor.sweep_interval_ms = ms;
        }
        config.validate().context("Config error")?;

        Ok(config)
    }
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    let value = serde_json::from_str::<serde_json::Value>(value)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(value));
    Ok((key.to_string(), value))
}

fn init_tracing(args: &Args) {
    // --log-level > --debug > RUST_LOG > "warn"
    let filter = match (&args.log_level, args.debug) {
        (Some(level), _) => EnvFilter::new(level),
        (None, true) => EnvFilter::new("debug"),
        (None, false) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let config = CliConfigResolver::from_args(&args).resolve()?;
    let fixture = HostFixture::from_path(&args.fixture)?;
    let host = fixture.build()?;
    let target = args.target.clone().unwrap_or_else(|| fixture.default_target.clone());
    let params: Params = args.params.iter().cloned().collect();
    let query = args.query.join(" ");

    let supervisor = Arc::new(SessionSupervisor::start(&config.supervisor));
    let impersonator = Impersonator::new(host.host(), Arc::clone(&supervisor), &config);
    let outer = host.sessions.open_caller_session(&target);

    info!(user = %args.user, target_name = %target, "running impersonated query");
    let outcome = run(&impersonator, &outer, &args.user, &query, &params);

    match &outcome {
        Ok(count) => {
            debug!(rows = count, "query finished");
            outer.close()?;
        }
        Err(e) => outer.terminate(TerminationReason::Failed(e.to_string())),
    }

    let abandoned = supervisor.stop().await;
    if abandoned > 0 {
        anyhow::bail!("{abandoned} impersonated session(s) were not finalized");
    }

    outcome.map(|_| ())
}

/// Runs the query and prints each row; returns the row count.
fn run(
    impersonator: &Impersonator,
    outer: &Arc<MemorySession>,
    username: &str,
    query: &str,
    params: &Params,
) -> Result<usize> {
    let outer_session: Arc<dyn Session> = Arc::clone(outer) as Arc<dyn Session>;
    let rows = impersonator.impersonate(&outer_session, username, query, params)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut count = 0;
    for row in rows {
        let row = row?;
        writeln!(out, "{}", serde_json::to_string(&row)?)?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_values_are_json_or_string() {
        assert_eq!(
            parse_param("name=John").expect("parse"),
            ("name".to_string(), Value::from("John"))
        );
        assert_eq!(
            parse_param("age=42").expect("parse"),
            ("age".to_string(), Value::Int(42))
        );
        assert_eq!(
            parse_param("name=\"42\"").expect("parse"),
            ("name".to_string(), Value::from("42"))
        );
        assert_eq!(
            parse_param("expr=a=b").expect("parse"),
            ("expr".to_string(), Value::from("a=b"))
        );
    }

    #[test]
    fn malformed_params_are_rejected() {
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn cli_overrides_apply() {
        let args = Args::parse_from([
            "impersonate",
            "--fixture",
            "f.json",
            "--user",
            "joe",
            "--no-rebind",
            "--sweep-interval-ms",
            "25",
            "MATCH (p) RETURN p",
        ]);
        let resolver = CliConfigResolver::from_args(&args);
        assert!(resolver.no_rebind);
        assert_eq!(resolver.sweep_interval_ms, Some(25));
        assert_eq!(args.query, vec!["MATCH (p) RETURN p"]);
    }

    #[test]
    fn config_file_is_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("impersonate.toml");
        std::fs::write(&path, "rebind_entities = false\n[supervisor]\nsweep_interval_ms = 50\n")
            .expect("write");

        let resolver = CliConfigResolver {
            config_path: Some(path),
            no_rebind: false,
            sweep_interval_ms: None,
            skip_env: true,
        };
        let config = resolver.resolve().expect("resolve");
        assert!(!config.rebind_entities);
        assert_eq!(config.supervisor.sweep_interval_ms, 50);
    }

    #[test]
    fn zero_sweep_interval_is_invalid() {
        let resolver = CliConfigResolver {
            config_path: None,
            no_rebind: false,
            sweep_interval_ms: Some(0),
            skip_env: true,
        };
        assert!(resolver.resolve().is_err());
    }

    #[test]
    fn skip_env_ignores_impersonate_vars() {
        std::env::set_var("IMPERSONATE_ROLE_CAPACITY", "0");
        let resolver = CliConfigResolver {
            config_path: None,
            no_rebind: false,
            sweep_interval_ms: None,
            skip_env: true,
        };
        let result = resolver.resolve();
        std::env::remove_var("IMPERSONATE_ROLE_CAPACITY");

        let config = result.expect("env is not read");
        assert_eq!(config.cache.role_capacity, 100);
    }
}
