use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, CommandReport};

#[derive(Debug, Parser)]
#[command(name = "docflow", version, about = "Automated document intake pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Watch the inbox and process documents as they appear.
    Watch {
        /// Run a single scan-and-process cycle, then exit.
        #[arg(long)]
        once: bool,
    },
    /// Show resolved storage layout and document counts.
    Status,
    /// Stop a running watcher.
    Stop,
}

fn render(report: &CommandReport) {
    for detail in &report.details {
        println!("[{}] {}", report.command, detail);
    }
    for issue in &report.issues {
        eprintln!("[{}] issue: {}", report.command, issue);
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Watch { once } => {
            commands::watch::run(&commands::watch::WatchOptions { once })?
        }
        Commands::Status => commands::status::run()?,
        Commands::Stop => commands::stop::run()?,
    };

    render(&report);
    if !report.ok {
        anyhow::bail!("{} finished with issues", report.command);
    }
    Ok(())
}
