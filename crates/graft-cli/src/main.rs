use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "Offline strategy tooling for the graft interception engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dry-run resolution strategies against a captured metadata dump
    Resolve {
        /// Metadata dump file (JSON)
        #[arg(short, long)]
        dump: PathBuf,

        /// Strategy set file (JSON)
        #[arg(short, long)]
        strategies: PathBuf,

        /// Only resolve the named strategy
        #[arg(short, long)]
        name: Option<String>,

        /// Owning type(s) to try, overriding the ones recorded in the file
        #[arg(short, long)]
        owner: Vec<String>,

        /// Record successful lookups too and print the probe summary
        #[arg(long)]
        probe: bool,

        /// Fail when the dump and strategy versions disagree
        #[arg(long)]
        strict_version: bool,
    },
    /// Lint a strategy file for empty or misordered fallback chains
    Validate {
        /// Strategy set file (JSON)
        #[arg(short, long)]
        strategies: PathBuf,
    },
    /// List the types or routines captured in a metadata dump
    Routines {
        /// Metadata dump file (JSON)
        #[arg(short, long)]
        dump: PathBuf,

        /// Type to list routines for; omit to list all types
        type_name: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("graft_core=info".parse()?)
                .add_directive("graft_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Resolve {
            dump,
            strategies,
            name,
            owner,
            probe,
            strict_version,
        } => commands::resolve::run(
            &dump,
            &strategies,
            name.as_deref(),
            &owner,
            probe,
            strict_version,
        ),
        Command::Validate { strategies } => commands::validate::run(&strategies),
        Command::Routines { dump, type_name } => {
            commands::routines::run(&dump, type_name.as_deref())
        }
    }
}
