//! Car rental CLI - the rental desk in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use carrental_core::services::{LogEvent, LoggingService};
use commands::{car, customer, logs, rental, status, user};

/// Car rental desk - cars, customers and rentals
#[derive(Parser)]
#[command(name = "carrental", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage cars
    Car {
        #[command(subcommand)]
        command: car::CarCommands,
    },

    /// Manage customers
    Customer {
        #[command(subcommand)]
        command: customer::CustomerCommands,
    },

    /// Book, edit and return rentals
    Rental {
        #[command(subcommand)]
        command: rental::RentalCommands,
    },

    /// Manage desk users
    User {
        #[command(subcommand)]
        command: user::UserCommands,
    },

    /// Check a username and password
    Login {
        username: String,
        /// Password; prompted for when omitted
        #[arg(long, env = "CARRENTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show fleet and rental summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Car { command } => command.name(),
            Commands::Customer { command } => command.name(),
            Commands::Rental { command } => command.name(),
            Commands::User { command } => command.name(),
            Commands::Login { .. } => "login",
            Commands::Status { .. } => "status",
            Commands::Logs { command } => command.name(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command_name = cli.command.name();
    // The logs command opens logs.duckdb itself
    let logger = match cli.command {
        Commands::Logs { .. } => None,
        _ => commands::get_logger(),
    };

    let result = run(cli);
    if let Some(logger) = &logger {
        record_outcome(logger, command_name, &result);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Log how a command ended, ignoring logging errors
fn record_outcome(logger: &LoggingService, command_name: &str, result: &Result<()>) {
    let _ = match result {
        Ok(()) => logger.log_command(command_name),
        Err(e) => match e.downcast_ref::<carrental_core::Error>() {
            Some(core_error) => logger.log_failure(command_name, core_error),
            None => logger.log(
                LogEvent::new("command_failed")
                    .with_command(command_name)
                    .with_error_message(format!("{:#}", e)),
            ),
        },
    };
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Car { command } => car::run(command),
        Commands::Customer { command } => customer::run(command),
        Commands::Rental { command } => rental::run(command),
        Commands::User { command } => user::run(command),
        Commands::Login {
            username,
            password,
            json,
        } => user::run_login(&username, password, json),
        Commands::Status { json } => status::run(json),
        Commands::Logs { command } => logs::run(command),
    }
}
