// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hk - hooks daemon CLI
//!
//! Control plane for the hooks daemon plus the hook forwarder the host
//! tool's committed hook scripts invoke.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod daemon_process;
mod env;
mod exit_error;
mod output;
mod paths;

use anyhow::Result;
use clap::{Parser, Subcommand};
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "hk",
    version,
    about = "Hooks daemon - low-latency hook handling for the host tool"
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daemon management
    Daemon(commands::daemon::DaemonArgs),
    /// Forward one hook event from stdin to the daemon (used by hook scripts)
    Forward(commands::forward::ForwardArgs),
    /// Validate the project's hooks-daemon.yaml
    ValidateConfig,
    /// Emit the acceptance-test playbook for all registered handlers
    GeneratePlaybook,
    /// Check registry invariants and response schemas without a daemon
    SelfTest,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = e.to_string();
        if !msg.is_empty() {
            eprintln!("Error: {msg}");
        }
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Daemon(args) => commands::daemon::daemon(args, cli.output).await,
        Commands::Forward(args) => commands::forward::forward(args).await,
        Commands::ValidateConfig => commands::validate::validate_config(cli.output),
        Commands::GeneratePlaybook => commands::playbook::generate_playbook(),
        Commands::SelfTest => commands::selftest::self_test(),
    }
}
