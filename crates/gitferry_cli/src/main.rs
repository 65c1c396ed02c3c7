//! Gitferry CLI - command-line interface for the transfer engine.

mod commands;
mod config;
mod progress;

use clap::{CommandFactory, Parser, Subcommand};
use console::Term;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gitferry")]
#[command(version)]
#[command(about = "Move files between GitHub repositories reliably")]
#[command(
    long_about = "Gitferry transfers file sets between GitHub repositories despite API size \
and rate limits: oversized files are committed in growing chunks, whole-repository \
copies land as batched tree commits, and every write is retried with classified backoff."
)]
#[command(after_long_help = r#"EXAMPLES
    Configure the destination repository:
        $ gitferry configure acme/firmware-mirror --token ghp_...

    Push local files as one logical change:
        $ gitferry push src/ docs/README.md -m "Sync sources"

    Mirror a whole repository:
        $ gitferry mirror acme/firmware

    Transfer only changed files, with full-copy fallback:
        $ gitferry mirror acme/firmware --smart

    See what differs before transferring:
        $ gitferry diff acme/firmware

CONFIGURATION
    Gitferry reads configuration from:
      1. ~/.config/gitferry/config.toml (or $XDG_CONFIG_HOME/gitferry/config.toml)
      2. ./gitferry.toml
      3. Environment variables (GITFERRY_* prefix)

ENVIRONMENT VARIABLES
    GITFERRY_GITHUB_TOKEN             GitHub personal access token
    GITFERRY_TRANSFER_REQUESTS_PER_SECOND
                                      Proactive API rate limit (default: 10)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the destination repository
    Configure {
        /// Repository as owner/repo
        repository: String,

        /// GitHub personal access token (or GITFERRY_GITHUB_TOKEN)
        #[arg(short, long)]
        token: Option<String>,

        /// Target branch (default: main)
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// Show the active configuration
    Status,
    /// Clear the persisted configuration
    Disconnect,
    /// Upload local files to the configured repository
    Push {
        /// Files or directories to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Commit message
        #[arg(short, long)]
        message: String,
    },
    /// Copy a source repository into the configured one
    Mirror {
        /// Source repository as owner/repo
        source: String,

        /// Source branch (default: the source's default branch config)
        #[arg(short, long)]
        branch: Option<String>,

        /// Commit message (default: "Mirror owner/repo")
        #[arg(short, long)]
        message: Option<String>,

        /// Clear the destination branch before transferring
        #[arg(long)]
        replace: bool,

        /// Compare first and transfer only changed files
        #[arg(long)]
        smart: bool,

        /// Plan and report without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Only transfer paths under this prefix
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Compare a source repository against the configured one
    Diff {
        /// Source repository as owner/repo
        source: String,

        /// Source branch
        #[arg(short, long)]
        branch: Option<String>,

        /// Also list unchanged paths
        #[arg(short = 'u', long)]
        unchanged: bool,
    },
    /// List recent commits on the configured branch
    History {
        /// Number of commits to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging when not connected to a TTY; the interactive
    // progress bar owns the terminal otherwise.
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("gitferry=info,gitferry_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();
    let cli = Cli::parse();

    match cli.command {
        Commands::Configure {
            repository,
            token,
            branch,
        } => {
            commands::configure::handle_configure(&repository, token, branch, &config)?;
        }
        Commands::Status => {
            commands::configure::handle_status(&config)?;
        }
        Commands::Disconnect => {
            commands::configure::handle_disconnect(&config)?;
        }
        Commands::Push { paths, message } => {
            commands::push::handle_push(paths, message, &config).await?;
        }
        Commands::Mirror {
            source,
            branch,
            message,
            replace,
            smart,
            dry_run,
            prefix,
        } => {
            commands::mirror::handle_mirror(
                source, branch, message, replace, smart, dry_run, prefix, &config,
            )
            .await?;
        }
        Commands::Diff {
            source,
            branch,
            unchanged,
        } => {
            commands::diff::handle_diff(source, branch, unchanged, &config).await?;
        }
        Commands::History { limit } => {
            commands::history::handle_history(limit, &config).await?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}
