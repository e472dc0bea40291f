use clap::{Parser, Subcommand};

// Display order for token option (placed at top of help text)
const TOKEN_DISPLAY_ORDER: usize = 0;
// Display order for log level option (placed at end of help text)
const LOG_LEVEL_DISPLAY_ORDER: usize = 100;

/// CLI arguments
#[derive(Parser)]
#[command(name = "linekeeper", version, about = "Keeps Vale alerts on lines added by the commits under review", long_about = None)]
pub struct Cli {
    /// Log level (see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
    /// [env: LINEKEEPER_LOG=] [default: info]
    #[arg(
        long,
        env = "LINEKEEPER_LOG",
        default_value = "info",
        global = true,
        hide_default_value = true,
        hide_env = true,
        display_order = LOG_LEVEL_DISPLAY_ORDER,
        verbatim_doc_comment
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a default linekeeper.toml config file
    Init(InitArgs),
    /// Filter a Vale JSON report down to lines added by the review
    Filter(FilterArgs),
    /// Print the line numbers a local patch file adds
    Lines(LinesArgs),
}

/// Arguments for the init command
#[derive(Parser)]
pub struct InitArgs {
    /// Path to config file
    #[arg(long, default_value = "linekeeper.toml")]
    pub config: String,

    /// Override existing config file
    #[arg(long)]
    pub r#override: bool,
}

/// Arguments for the filter command
#[derive(Parser, Debug)]
pub struct FilterArgs {
    /// Vale report produced with `vale --output=JSON`
    #[arg(long)]
    pub alerts: String,

    /// Name of the triggering event (push, pull_request, pull_request_target)
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    pub event_name: String,

    /// Path to the JSON payload of the triggering event
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: String,

    /// Path to config file (initialize with `linekeeper init`)
    #[arg(long, default_value = "linekeeper.toml")]
    pub config: String,

    /// Override config values using dot notation (e.g. fetch.max_parallel_fetches=4)
    #[arg(long = "config-override")]
    pub config_overrides: Vec<String>,

    /// GitHub token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, display_order = TOKEN_DISPLAY_ORDER)]
    pub token: String,

    /// Output file path (.json); prints to stdout when omitted
    #[arg(long)]
    pub output: Option<String>,
}

/// Arguments for the lines command
#[derive(Parser, Debug)]
pub struct LinesArgs {
    /// Unified diff file to parse
    pub patch: String,
}
