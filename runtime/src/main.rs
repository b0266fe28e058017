// Copyright 2026 Mediascout Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use mediascout_runtime::cli;
use mediascout_runtime::cli::serve::ServeOptions;
use std::net::IpAddr;

#[derive(Parser)]
#[command(
    name = "mediascout",
    about = "Mediascout: find the images and videos on a web page",
    version,
    after_help = "Run 'mediascout <command> --help' for details on each command.\nRun 'mediascout' with no command to start the HTTP service."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service in the foreground
    Serve {
        /// Address to bind (overrides MEDIASCOUT_HOST)
        #[arg(long)]
        host: Option<IpAddr>,
        /// Port to bind (overrides MEDIASCOUT_PORT)
        #[arg(long, short)]
        port: Option<u16>,
        /// Self-update yt-dlp before serving
        #[arg(long)]
        update_ytdlp: bool,
    },
    /// Extract media from one or more pages and print the records as JSON
    Extract {
        /// Page URLs to inspect
        #[arg(required = true)]
        sources: Vec<String>,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !matches!(cli.command, Some(Commands::Completions { .. })) {
        cli::init_tracing(cli.verbose, cli.log_json);
    }

    let result = match cli.command {
        None => cli::serve::run(ServeOptions::default()).await,
        Some(Commands::Serve {
            host,
            port,
            update_ytdlp,
        }) => {
            cli::serve::run(ServeOptions {
                host,
                port,
                update_ytdlp,
            })
            .await
        }
        Some(Commands::Extract { sources }) => cli::extract_cmd::run(sources).await,
        Some(Commands::Doctor) => cli::doctor::run().await,
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "mediascout", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
