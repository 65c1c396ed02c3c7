//! `gitferry configure` / `gitferry disconnect`.

use console::style;

use crate::config::Config;
use crate::commands::{build_ferry, parse_repo_ref};

/// Persist and activate a destination repository.
pub fn handle_configure(
    repository: &str,
    token: Option<String>,
    branch: Option<String>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (owner, repo) = parse_repo_ref(repository)?;

    let token = token.or_else(|| config.github_token()).ok_or(
        "no token given: pass --token, set GITFERRY_GITHUB_TOKEN, or add [github] token to the config file",
    )?;

    let mut ferry = build_ferry(config)?;
    ferry.configure(&token, &owner, &repo, branch.as_deref())?;

    println!(
        "{} configured {}",
        style("✓").green().bold(),
        style(format!("{owner}/{repo}")).bold()
    );
    Ok(())
}

/// Clear the persisted repository configuration.
pub fn handle_disconnect(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut ferry = build_ferry(config)?;
    if !ferry.is_configured() {
        println!("Nothing configured.");
        return Ok(());
    }
    ferry.disconnect()?;
    println!("{} configuration cleared", style("✓").green().bold());
    Ok(())
}

/// Show the active configuration, token redacted.
pub fn handle_status(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let ferry = build_ferry(config)?;
    match ferry.active_config() {
        Some(active) => {
            println!(
                "Configured: {} (branch {})",
                style(active.full_name()).bold(),
                active.branch
            );
        }
        None => println!("Not configured. Run `gitferry configure <owner/repo> --token <token>`."),
    }
    Ok(())
}
