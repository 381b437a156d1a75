//! jenq: list and filter Jenkins builds from the terminal.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod render;

/// Environment variable holding a tracing filter directive.
const ENV_LOG: &str = "JENQ_LOG";

#[derive(Parser)]
#[command(name = "jenq")]
#[command(about = "jenq - list and filter Jenkins builds")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a job's builds, newest first
    #[command(visible_alias = "b")]
    Builds {
        /// Job name; folders are separated by '/' (default: configured job)
        job: Option<String>,

        /// Filter expression, e.g. "status=FAILURE & worker!=agent-1"
        #[arg(short = 'f', long = "filter", default_value = "")]
        filter: String,

        /// Output format: compact, table, json
        #[arg(short = 'F', long = "format", default_value = "compact", value_parser = ["compact", "table", "json"])]
        format: String,

        /// Number of concurrent fetches (overrides config)
        #[arg(short = 'w', long = "workers")]
        workers: Option<usize>,
    },

    /// Parse a filter expression and print how it groups
    Parse {
        /// Filter expression
        expr: String,

        /// Also print the tokens with their byte offsets
        #[arg(short = 't', long = "tokens")]
        tokens: bool,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Set the Jenkins host URL
    SetHost {
        /// Host URL, e.g. https://ci.example.com
        url: String,
    },

    /// Set the job used when none is given
    SetJob {
        /// Job name
        name: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "jenq=debug,jenkins=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Builds { job, filter, format, workers } => {
            commands::builds(job.as_deref(), &filter, &format, workers)
        }
        Commands::Parse { expr, tokens } => commands::parse(&expr, tokens),
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config_show(),
            ConfigAction::SetHost { url } => commands::config_set_host(&url),
            ConfigAction::SetJob { name } => commands::config_set_job(&name),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
