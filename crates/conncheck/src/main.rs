//! Chipper connection check.
//!
//! Runs one connection attempt against the configured chipper platform and
//! prints which phase, if any, failed.
//!
//! Usage:
//!   chipper-conncheck --config chipper.toml --mode intent --token "$JWT"
//!
//! Logging follows `RUST_LOG` (default `info`).

mod report;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chipper_voice::{
    ChipperConfig, ConnectContext, ConnectionCheckOptions, IntentOptions, KnowledgeGraphOptions,
    StaticTokenProvider, StreamOptions, StreamerBuilder, TracingReceiver,
};
use clap::{Parser, ValueEnum};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use report::{checks, config_status, print_check, Status};

const BOOT_ID_PATH: &str = "/proc/sys/kernel/random/boot_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Check,
    KnowledgeGraph,
    Intent,
}

impl Mode {
    fn options(self) -> StreamOptions {
        match self {
            Mode::Check => StreamOptions::ConnectionCheck(ConnectionCheckOptions::default()),
            Mode::KnowledgeGraph => StreamOptions::KnowledgeGraph(KnowledgeGraphOptions::default()),
            Mode::Intent => StreamOptions::Intent(IntentOptions::default()),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "chipper-conncheck", version, about)]
struct Cli {
    /// TOML config file.  Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "check")]
    mode: Mode,
    /// Overall deadline for the attempt.
    #[arg(long, default_value = "8")]
    timeout_secs: u64,
    /// Bearer token sent with the transport open.
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    require_token: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ChipperConfig::load(path)?,
        None => ChipperConfig::default(),
    };
    if cli.require_token {
        config.require_token = true;
    }
    if config.device.boot_id.is_empty() {
        config.device.boot_id = read_boot_id();
    }

    println!("chipper conncheck");
    println!("=================\n");

    let issues = config.validate();
    print_check(
        "Config",
        config_status(&issues),
        &if issues.is_empty() {
            "no issues".to_string()
        } else {
            format!("{} warning(s)", issues.len())
        },
    );
    for issue in &issues {
        println!("      {issue}");
    }

    let options = cli.mode.options();
    let mode = options.kind();
    let mut builder = StreamerBuilder::from_config(&config)
        .options(options)
        .receiver(Arc::new(TracingReceiver));
    let token_configured = cli.token.is_some();
    if let Some(token) = cli.token {
        builder = builder.token_provider(Arc::new(StaticTokenProvider::new(token)));
    }
    let streamer = builder.build()?;

    tracing::info!(url = %config.url, mode = %mode, "starting connection attempt");

    let shutdown = CancellationToken::new();
    let on_interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let ctx = ConnectContext::with_cancel(shutdown)
        .deadline(Instant::now() + Duration::from_secs(cli.timeout_secs));
    let result = streamer.connect(&ctx).await;

    let failed = result.as_ref().err().map(|e| e.kind());
    for check in checks(mode, failed, token_configured) {
        let detail = match (&result, check.status) {
            (Err(e), Status::Fail) => format!("{:#}", e.cause()),
            _ => String::new(),
        };
        print_check(check.name, check.status, &detail);
    }

    println!();
    match result {
        Ok(conn) => {
            let timings = conn.timings();
            println!(
                "Connected: session {} ({} ms)",
                conn.session_id(),
                timings.connect.as_millis()
            );
            conn.close().await;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("Connection failed: {}", e.kind());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Kernel boot id, or empty when unavailable (non-Linux hosts).
fn read_boot_id() -> String {
    match std::fs::read_to_string(BOOT_ID_PATH) {
        Ok(raw) => raw.trim().to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "boot id unavailable");
            String::new()
        }
    }
}
