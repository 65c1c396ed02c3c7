//! `gitferry push` - upload local files to the configured repository.

use std::path::{Path, PathBuf};

use console::style;
use gitferry::transfer::UploadFile;

use crate::commands::build_ferry;
use crate::config::Config;
use crate::progress;

/// Upload the given files, preserving their relative paths.
pub async fn handle_push(
    paths: Vec<PathBuf>,
    message: String,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for path in &paths {
        collect_files(path, &mut files)?;
    }

    if files.is_empty() {
        println!("No files to push.");
        return Ok(());
    }

    let ferry = build_ferry(config)?;
    let callback = progress::make_callback();
    let outcome = ferry
        .upload_multiple_files(files, &message, Some(&callback))
        .await?;

    let skipped = outcome.results.iter().filter(|r| r.skipped).count();
    let failed = outcome.failed_count();
    let uploaded = outcome.results.len() - skipped - failed;

    if outcome.success {
        println!(
            "{} pushed {} file(s){}",
            style("✓").green().bold(),
            uploaded,
            if skipped > 0 {
                format!(", skipped {skipped}")
            } else {
                String::new()
            }
        );
    } else {
        println!(
            "{} {} file(s) failed:",
            style("✗").red().bold(),
            failed
        );
        for result in outcome.results.iter().filter(|r| !r.success) {
            println!(
                "  {} {}: {}",
                style("-").red(),
                result.path,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        return Err(format!("{failed} file(s) failed to upload").into());
    }

    Ok(())
}

/// Walk a path, collecting files as repo-relative uploads.
fn collect_files(path: &Path, files: &mut Vec<UploadFile>) -> Result<(), std::io::Error> {
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            collect_files(&entry?.path(), files)?;
        }
        return Ok(());
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!("skipping {}: {}", path.display(), err);
            return Ok(());
        }
    };

    // Normalize to forward slashes and strip any leading ./
    let repo_path = path
        .to_string_lossy()
        .replace('\\', "/")
        .trim_start_matches("./")
        .to_string();

    files.push(UploadFile::new(repo_path, content));
    Ok(())
}
