//! User and login commands - desk accounts behind the login gate

use anyhow::Result;
use clap::Subcommand;
use dialoguer::Password;

use super::get_context;
use crate::output::{print_json, success};

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a desk user
    Add {
        username: String,
        /// Password; prompted for when omitted
        #[arg(long, env = "CARRENTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl UserCommands {
    pub fn name(&self) -> &'static str {
        match self {
            UserCommands::Add { .. } => "user add",
        }
    }
}

pub fn run(command: UserCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        UserCommands::Add {
            username,
            password,
            json,
        } => {
            let password = match password {
                Some(p) => p,
                None => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()?,
            };
            let user = ctx.auth_service.register(&username, &password)?;

            if json {
                return print_json(&user);
            }
            success(&format!("Created user {}", user.username));
        }
    }

    Ok(())
}

/// Verify credentials against the stored digest
pub fn run_login(username: &str, password: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;

    let password = match password {
        Some(p) => p,
        None => Password::new().with_prompt("Password").interact()?,
    };
    let user = ctx.auth_service.login(username, &password)?;

    if json {
        return print_json(&serde_json::json!({ "authenticated": true, "user": user }));
    }
    success(&format!("Welcome, {}", user.username));
    Ok(())
}
