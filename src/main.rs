mod alerts;
mod attribution;
mod cache;
mod changeset;
mod cli;
mod config;
mod event;
mod github;
mod patch;
mod resolver;
mod review;
#[cfg(test)]
mod test_support;

use anyhow::{Context, bail};
use clap::Parser;
use cli::{Cli, Commands, FilterArgs, InitArgs, LinesArgs};
use config::Config;
use event::ReviewEvent;
use github::GitHubClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: i32 = 1;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log_level))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init(args) => init(&args),
        Commands::Filter(args) => filter(&args).await,
        Commands::Lines(args) => lines(&args),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(EXIT_FAILURE);
    }
}

fn init(args: &InitArgs) -> anyhow::Result<()> {
    if std::path::Path::new(&args.config).exists() && !args.r#override {
        bail!(
            "Config file {} already exists (use --override to replace it)",
            args.config
        );
    }
    std::fs::write(&args.config, Config::default().to_toml()?)
        .with_context(|| format!("Failed to write {}", args.config))?;
    info!("Config written to {}", args.config);
    Ok(())
}

fn check_output_path(output: Option<&str>) -> anyhow::Result<()> {
    match output {
        Some(path) if !path.ends_with(".json") => bail!("Output file must end with .json"),
        _ => Ok(()),
    }
}

async fn filter(args: &FilterArgs) -> anyhow::Result<()> {
    check_output_path(args.output.as_deref())?;
    let config = Config::load(&args.config, &args.config_overrides)?;

    let payload = std::fs::read_to_string(&args.event_path)
        .with_context(|| format!("Failed to read event payload {}", args.event_path))?;
    let payload = serde_json::from_str(&payload)
        .with_context(|| format!("Event payload {} is not JSON", args.event_path))?;
    let event = ReviewEvent::from_payload(&args.event_name, payload)
        .with_context(|| format!("Unexpected {} payload", args.event_name))?;

    let report = std::fs::read_to_string(&args.alerts)
        .with_context(|| format!("Failed to read Vale report {}", args.alerts))?;
    let report = alerts::parse_report(&report)?;

    let client = GitHubClient::new(&config.github, &args.token)?;
    let kept = review::run(&event, &client, &config, report).await?;

    let rendered = serde_json::to_string_pretty(&kept)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("Failed to write {}", path))?;
            info!("Results written to {}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn lines(args: &LinesArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.patch)
        .with_context(|| format!("Failed to read {}", args.patch))?;
    let added = patch::parse_patch(&text)?;
    if added.is_empty() {
        info!("{} adds no lines", args.patch);
    }
    for line in added.iter() {
        println!("{}", line);
    }
    Ok(())
}
