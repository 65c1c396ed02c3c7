//! `gitferry mirror` - copy a source repository into the configured one.

use console::style;
use gitferry::transfer::{MirrorOptions, TransferOptions};

use crate::commands::{build_ferry, parse_repo_ref};
use crate::config::Config;
use crate::progress;

#[allow(clippy::too_many_arguments)]
pub async fn handle_mirror(
    source: String,
    branch: Option<String>,
    message: Option<String>,
    replace: bool,
    smart: bool,
    dry_run: bool,
    prefix: Option<String>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (owner, repo) = parse_repo_ref(&source)?;
    let ferry = build_ferry(config)?;
    let message = message.unwrap_or_else(|| format!("Mirror {owner}/{repo}"));

    if smart {
        // Selective mode: compare first, transfer only changed paths.
        // A comparison failure falls back to the full transfer so the
        // user is never left without a path forward.
        match ferry
            .compare_repositories(&owner, &repo, branch.as_deref())
            .await
        {
            Ok(comparisons) => {
                let callback = progress::make_callback();
                let transferred = ferry
                    .transfer_modified_files(
                        &comparisons,
                        &owner,
                        &repo,
                        branch.as_deref(),
                        &message,
                        TransferOptions::default(),
                        Some(&callback),
                    )
                    .await?;

                if transferred {
                    println!("{} selective transfer complete", style("✓").green().bold());
                } else {
                    println!("{} nothing to transfer, repositories match", style("✓").green());
                }
                return Ok(());
            }
            Err(err) => {
                tracing::warn!("comparison failed, falling back to full transfer: {err}");
                println!(
                    "{} comparison failed ({err}), falling back to full transfer",
                    style("!").yellow().bold()
                );
            }
        }
    }

    let options = MirrorOptions {
        replace,
        path_prefix: prefix,
        dry_run,
    };

    let callback = progress::make_callback();
    let report = ferry
        .transfer_repository(
            &owner,
            &repo,
            branch.as_deref(),
            &message,
            &options,
            Some(&callback),
        )
        .await?;

    if dry_run {
        println!(
            "{} dry run: {} file(s) in {} batch(es), {} ignored",
            style("✓").green().bold(),
            report.files_committed,
            report.batches,
            report.ignored
        );
    } else {
        println!(
            "{} transferred {} file(s) in {} batch(es){}",
            style("✓").green().bold(),
            report.files_committed,
            report.batches,
            if report.download_failures > 0 {
                format!(", {} download failure(s) skipped", report.download_failures)
            } else {
                String::new()
            }
        );
    }

    Ok(())
}
