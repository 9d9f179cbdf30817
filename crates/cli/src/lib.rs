pub mod commands;

use clap::{Parser, Subcommand};
use procura_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use procura_core::workflow::RequestState;
use std::process::ExitCode;

use crate::commands::advance::{ActionArg, AdvanceArgs};

#[derive(Debug, Parser)]
#[command(
    name = "procura",
    about = "Procura purchase-request approval CLI",
    long_about = "Build and inspect eligibility conditions and drive purchase requests through the A1-A8 approval chain.",
    after_help = "Examples:\n  procura build --clauses '[{\"type\":\"employee\",\"employee_ids\":[\"e1\"]}]'\n  procura check --condition '(department = \"KTh\" && role = \"4\")' --actor e-kth-staff\n  procura advance --request PR-1002 --action forward --to A3 --actor e-kth-head\n  procura routes --state A2"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Build canonical condition text from a JSON array of clause drafts")]
    Build {
        #[arg(long, help = "JSON array of {\"type\": \"department\"|\"employee\", ...} drafts")]
        clauses: String,
    },
    #[command(about = "Split condition text into sub-conditions with directory names")]
    Decompose {
        #[arg(help = "Condition text as stored on a request")]
        condition: String,
    },
    #[command(about = "Check whether an employee satisfies condition text")]
    Check {
        #[arg(long)]
        condition: String,
        #[arg(long, help = "Employee id from the directory")]
        actor: String,
    },
    #[command(about = "Apply one forward or return action to a request")]
    Advance {
        #[arg(long)]
        request: String,
        #[arg(long, value_enum)]
        action: ActionArg,
        #[arg(long, help = "Forward target at branch points (A2, A7)")]
        to: Option<RequestState>,
        #[arg(long, help = "Employee id performing the action")]
        actor: String,
        #[arg(long)]
        note: Option<String>,
    },
    #[command(about = "List transitions and who is eligible for each")]
    Routes {
        #[arg(long, help = "Only show transitions leaving this state")]
        state: Option<RequestState>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

fn init_logging(logging: &LoggingConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let logging = AppConfig::load(LoadOptions::default())
        .map(|config| config.logging)
        .unwrap_or_default();
    init_logging(&logging);

    let result = match cli.command {
        Command::Build { clauses } => commands::build::run(&clauses),
        Command::Decompose { condition } => commands::decompose::run(&condition),
        Command::Check { condition, actor } => commands::check::run(&condition, &actor),
        Command::Advance { request, action, to, actor, note } => {
            commands::advance::run(AdvanceArgs { request, action, to, actor, note })
        }
        Command::Routes { state } => commands::routes::run(state),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
