mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use harness_common::config::HarnessConfig;
use harness_common::types::Language;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "harness")]
#[command(about = "Load and correctness harness for the remote job runner", long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for values otherwise read from `HARNESS_*` variables
#[derive(Args)]
struct ConnectionArgs {
    /// Service root (e.g., http://localhost:8080)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Sent as X-API-Key
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Sent as Authorization: Bearer
    #[arg(long, global = true)]
    bearer_token: Option<String>,

    /// Per HTTP call timeout in milliseconds
    #[arg(long, global = true)]
    request_timeout_ms: Option<u64>,

    /// Cap on concurrent submissions and pollers
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    max_in_flight: Option<u64>,

    /// Give up on a job after this many milliseconds of polling
    #[arg(long, global = true)]
    poll_deadline_ms: Option<u64>,
}

impl ConnectionArgs {
    fn apply(self, mut config: HarnessConfig) -> HarnessConfig {
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if self.api_key.is_some() {
            config.api_key = self.api_key;
        }
        if self.bearer_token.is_some() {
            config.bearer_token = self.bearer_token;
        }
        if let Some(ms) = self.request_timeout_ms {
            config.request_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(n) = self.max_in_flight {
            config.max_in_flight = Some(n as usize);
        }
        if let Some(ms) = self.poll_deadline_ms {
            config.poll_deadline = Some(Duration::from_millis(ms));
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fire a batch of jobs at once and summarize completion times
    Load {
        /// Number of jobs to submit
        #[arg(short, long, default_value = "50")]
        jobs: usize,

        /// Language of the repeated job (e.g., python, cpp, js)
        #[arg(short, long, default_value = "python", value_parser = parse_language)]
        language: Language,

        /// Source of the repeated job
        #[arg(short, long, default_value = "print(1)")]
        code: String,

        /// Stdin of the repeated job
        #[arg(short, long, default_value = "")]
        input: String,

        /// Cycle through the built-in suite programs instead
        #[arg(long, default_value = "false")]
        mix: bool,

        /// Report path
        #[arg(short, long, default_value = "stress.json")]
        output: PathBuf,
    },

    /// Run correctness cases one at a time and judge each result
    Verify {
        /// JSON array of cases (defaults to the built-in suite)
        #[arg(long)]
        cases: Option<PathBuf>,

        /// Report path
        #[arg(short, long, default_value = "test/results.json")]
        output: PathBuf,
    },
}

fn parse_language(s: &str) -> Result<Language, String> {
    s.parse()
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = cli.connection.apply(HarnessConfig::from_env());

    match cli.command {
        Commands::Load {
            jobs,
            language,
            code,
            input,
            mix,
            output,
        } => {
            let profile = if mix {
                commands::LoadProfile::Mixed
            } else {
                commands::LoadProfile::Repeated { language, code, input }
            };
            commands::run_load(&config, profile, jobs, &output).await?;
        }
        Commands::Verify { cases, output } => {
            commands::run_verify(&config, cases.as_deref(), &output).await?;
        }
    }

    Ok(())
}
