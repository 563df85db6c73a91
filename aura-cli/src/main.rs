//! AURA CLI - business assistant in the terminal
//!
//! Chat with the assistant, analyze business data, watch markets and send
//! meeting invitations through the hosted functions.

#![allow(clippy::print_stdout, clippy::print_stderr)] // CLI program intentionally uses stdout

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use aura::prelude::*;
use aura_cli::config::{CliConfig, ConfigError, config_path, load_config, save_config_to};
use aura_cli::error::{CliError, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// AURA - AI business assistant
#[derive(Parser)]
#[command(name = "aura")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "AURA_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat(ChatArgs),

    /// Analyze business data
    Analyze(AnalyzeArgs),

    /// Turn business data into spreadsheet rows (JSON or .xlsx)
    Spreadsheet(SpreadsheetArgs),

    /// Show market indices and commodity prices
    Market(MarketArgs),

    /// Send a meeting invitation by e-mail
    Meeting(MeetingArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the chat command
#[derive(Args)]
struct ChatArgs {
    /// Initial message to send
    #[arg(short, long)]
    message: Option<String>,

    /// Prompt shown before each input line
    #[arg(short, long, default_value = "You: ")]
    prompt: String,
}

/// Arguments for the analyze command
#[derive(Args)]
struct AnalyzeArgs {
    /// Analysis focus
    #[arg(short, long)]
    focus: Option<AnalysisFocus>,

    /// Input file, or `-` for stdin
    input: PathBuf,
}

/// Arguments for the spreadsheet command
#[derive(Args)]
struct SpreadsheetArgs {
    /// Input file, or `-` for stdin
    input: PathBuf,

    /// Write rows to this file instead of stdout; `.xlsx` writes a workbook, anything else JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Arguments for the market command
#[derive(Args)]
struct MarketArgs {
    /// Keep refreshing; optional interval in seconds
    #[arg(short, long, num_args = 0..=1, value_name = "SECS")]
    watch: Option<Option<u64>>,
}

/// Arguments for the meeting command
#[derive(Args)]
struct MeetingArgs {
    /// Meeting title
    #[arg(short, long)]
    title: String,

    /// Date (YYYY-MM-DD)
    #[arg(short, long, value_parser = parse_date)]
    date: NaiveDate,

    /// Start time (HH:MM)
    #[arg(long, value_parser = parse_time)]
    time: NaiveTime,

    /// Duration in minutes
    #[arg(long, default_value_t = 30)]
    duration: u32,

    /// Agenda or notes
    #[arg(long, default_value = "")]
    description: String,

    /// Comma-separated attendee e-mails
    #[arg(short, long)]
    attendees: String,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_time(s: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "aura_cli={level},aura={level},{}",
            if verbosity >= 3 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.as_deref();
    match cli.command {
        Commands::Chat(args) => cmd_chat(args, path).await,
        Commands::Analyze(args) => cmd_analyze(args, path).await,
        Commands::Spreadsheet(args) => cmd_spreadsheet(args, path).await,
        Commands::Market(args) => cmd_market(args, path).await,
        Commands::Meeting(args) => cmd_meeting(args, path).await,
        Commands::Config(args) => cmd_config(args, path).await,
    }
}

async fn client(path: Option<&Path>) -> Result<(Aura, CliConfig)> {
    let config = load_config(path).await?;
    for issue in config.validate() {
        tracing::warn!("{issue}");
    }
    let aura = Aura::new(config.to_aura_config()?)?;
    Ok((aura, config))
}

/// Read a whole input file, `-` meaning stdin.
async fn read_input(input: &Path) -> Result<String> {
    let data = if input == Path::new("-") {
        let mut data = String::new();
        tokio::io::stdin().read_to_string(&mut data).await?;
        data
    } else {
        tokio::fs::read_to_string(input).await?
    };
    if data.trim().is_empty() {
        return Err(CliError::input(format!("{} contains no data", input.display())));
    }
    Ok(data)
}

/// Interactive chat.
async fn cmd_chat(args: ChatArgs, path: Option<&Path>) -> Result<()> {
    let (aura, _) = client(path).await?;
    let session = ChatSession::new(aura);

    println!("AURA Chat | type 'exit' to quit, Ctrl+C cancels a reply\n");
    if let Some(greeting) = session.snapshot().first() {
        println!("AURA: {}\n", greeting.content);
    }

    if let Some(message) = args.message {
        println!("{}{message}", args.prompt);
        chat_turn(&session, &message).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", args.prompt);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }
        chat_turn(&session, line).await;
    }

    Ok(())
}

/// Stream one reply to stdout. Failures are reported and the REPL goes on.
async fn chat_turn(session: &ChatSession, message: &str) {
    print!("AURA: ");
    let _ = std::io::stdout().flush();

    let reply = session.send_with(message, |delta| {
        print!("{delta}");
        let _ = std::io::stdout().flush();
    });

    tokio::select! {
        result = reply => match result {
            Ok(outcome) => {
                if outcome.finish == FinishReason::Malformed {
                    print!("\n[reply cut short: the stream was corrupt]");
                }
                println!("\n");
            }
            Err(e) => {
                println!();
                eprintln!("error: {}\n", e.user_message());
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\n[cancelled]\n");
        }
    }
}

async fn cmd_analyze(args: AnalyzeArgs, path: Option<&Path>) -> Result<()> {
    let data = read_input(&args.input).await?;
    let (aura, _) = client(path).await?;
    let analysis = aura.analyze(&data, args.focus).await?;
    println!("{analysis}");
    Ok(())
}

async fn cmd_spreadsheet(args: SpreadsheetArgs, path: Option<&Path>) -> Result<()> {
    let data = read_input(&args.input).await?;
    let (aura, _) = client(path).await?;
    let rows = aura.generate_spreadsheet(&data).await?;

    match args.output {
        Some(out) if is_xlsx(&out) => {
            SheetData::from_rows(&rows).save(&out)?;
            eprintln!("{} rows written to {}", rows.len(), out.display());
        }
        Some(out) => {
            tokio::fs::write(&out, serde_json::to_string_pretty(&rows)?).await?;
            eprintln!("{} rows written to {}", rows.len(), out.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}

fn is_xlsx(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
}

async fn cmd_market(args: MarketArgs, path: Option<&Path>) -> Result<()> {
    let (aura, config) = client(path).await?;

    let Some(every) = args.watch else {
        print_market(&aura.market_data().await?);
        return Ok(());
    };

    let every = Duration::from_secs(every.unwrap_or(config.market.refresh_secs));
    let mut updates = Box::pin(aura.watch_market(every));
    loop {
        tokio::select! {
            update = updates.next() => match update {
                Some(Ok(snapshot)) => print_market(&snapshot),
                Some(Err(e)) => eprintln!("error: {}", e.user_message()),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn print_market(snapshot: &MarketSnapshot) {
    let age = snapshot.age(Utc::now()).num_seconds().max(0);
    println!(
        "Market data as of {} ({age}s ago)",
        snapshot.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for (heading, quotes) in [("Indices", &snapshot.indices), ("Commodities", &snapshot.commodities)] {
        if quotes.is_empty() {
            continue;
        }
        println!("\n{heading}:");
        for quote in quotes {
            let sign = if quote.is_positive { "+" } else { "" };
            println!(
                "  {:<14} {:>12}{:<5} {sign}{}%",
                quote.name,
                quote.value,
                quote.unit.as_deref().unwrap_or(""),
                quote.change.trim_start_matches('+'),
            );
        }
    }
    println!();
}

async fn cmd_meeting(args: MeetingArgs, path: Option<&Path>) -> Result<()> {
    let invite = MeetingInvite::builder(args.title)
        .date(args.date)
        .time(args.time)
        .duration_minutes(args.duration)
        .description(args.description)
        .attendees_csv(&args.attendees)
        .build()?;

    let (aura, _) = client(path).await?;
    let delivery = aura.send_meeting_invite(&invite).await?;
    println!("{}", delivery.message);
    if !delivery.is_complete() {
        eprintln!(
            "warning: {} of {} invitations failed",
            delivery.failed,
            delivery.sent + delivery.failed
        );
    }
    Ok(())
}

async fn cmd_config(args: ConfigArgs, path: Option<&Path>) -> Result<()> {
    let config_file = path.map_or_else(config_path, Path::to_path_buf);

    match args.command {
        ConfigCommands::Path => {
            println!("{}", config_file.display());
        }
        ConfigCommands::Show => {
            let config = load_config(path).await?;
            let shown = toml::to_string_pretty(&config.redacted()).map_err(ConfigError::from)?;
            print!("{shown}");
            let issues = config.validate();
            if !issues.is_empty() {
                println!();
                for issue in issues {
                    println!("{issue}");
                }
            }
        }
        ConfigCommands::Init { force } => {
            if config_file.exists() && !force {
                println!("Configuration already exists at: {}", config_file.display());
                println!("Use --force to overwrite.");
                return Ok(());
            }

            save_config_to(&CliConfig::default(), &config_file).await?;

            println!("Configuration created: {}", config_file.display());
            println!();
            println!("Next steps:");
            println!("  1. set api.functionsUrl in the file");
            println!("  2. export AURA_API_KEY=<key>");
            println!("  3. aura chat");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xlsx_output_detection() {
        assert!(is_xlsx(Path::new("out/Report.XLSX")));
        assert!(is_xlsx(Path::new(aura::workbook::DEFAULT_FILE_NAME)));
        assert!(!is_xlsx(Path::new("rows.json")));
        assert!(!is_xlsx(Path::new("xlsx")));
    }

    #[test]
    fn test_spreadsheet_args() {
        let cli = Cli::try_parse_from(["aura", "spreadsheet", "-", "-o", "business_analysis.xlsx"])
            .expect("parse");
        let Commands::Spreadsheet(args) = cli.command else {
            panic!("expected spreadsheet command");
        };
        assert_eq!(args.input, PathBuf::from("-"));
        assert!(args.output.as_deref().is_some_and(is_xlsx));
    }
}
