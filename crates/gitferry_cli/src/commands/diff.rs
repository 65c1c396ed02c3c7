//! `gitferry diff` - compare a source repository against the configured one.

use console::style;
use gitferry::transfer::ComparisonStatus;

use crate::commands::{build_ferry, parse_repo_ref};
use crate::config::Config;

pub async fn handle_diff(
    source: String,
    branch: Option<String>,
    show_unchanged: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (owner, repo) = parse_repo_ref(&source)?;
    let ferry = build_ferry(config)?;

    let comparisons = ferry
        .compare_repositories(&owner, &repo, branch.as_deref())
        .await?;

    let mut new = 0usize;
    let mut modified = 0usize;
    let mut deleted = 0usize;
    let mut unchanged = 0usize;

    for comparison in &comparisons {
        match comparison.status {
            ComparisonStatus::New => {
                new += 1;
                println!("{} {}", style("+").green().bold(), comparison.path);
            }
            ComparisonStatus::Modified => {
                modified += 1;
                let delta = comparison
                    .size_diff
                    .map(|d| format!(" ({d:+} bytes)"))
                    .unwrap_or_default();
                println!(
                    "{} {}{}",
                    style("~").yellow().bold(),
                    comparison.path,
                    style(delta).dim()
                );
            }
            ComparisonStatus::Deleted => {
                deleted += 1;
                println!("{} {}", style("-").red().bold(), comparison.path);
            }
            ComparisonStatus::Unchanged => {
                unchanged += 1;
                if show_unchanged {
                    println!("{} {}", style("=").dim(), comparison.path);
                }
            }
        }
    }

    println!(
        "\n{new} new, {modified} modified, {deleted} deleted, {unchanged} unchanged"
    );
    Ok(())
}
