//! `gitferry history` - list recent commits on the configured branch.

use console::style;

use crate::commands::build_ferry;
use crate::config::Config;

pub async fn handle_history(
    limit: usize,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let ferry = build_ferry(config)?;
    let commits = ferry.get_commit_history(limit).await?;

    if commits.is_empty() {
        println!("No commits found.");
        return Ok(());
    }

    for commit in commits {
        let short_sha = commit.sha.get(..7).unwrap_or(&commit.sha).to_string();
        let first_line = commit.message.lines().next().unwrap_or("").to_string();
        let date = commit
            .date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        println!(
            "{} {} {} {}",
            style(short_sha).yellow(),
            style(date).dim(),
            first_line,
            style(commit.author.unwrap_or_default()).dim()
        );
    }

    Ok(())
}
