//! CLI mode implementation for command-line operation
//!
//! This module provides functions for running the application without a TUI,
//! suitable for automation and scripting.

use crate::api::{self, CatalogClient};
use crate::models::*;
use crate::utils::format_size;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Error type for CLI operations
#[derive(Debug)]
pub enum HeadlessError {
    ApiError(String),
    DownloadError(String),
    IoError(std::io::Error),
    InvalidArgs(String),
}

impl std::fmt::Display for HeadlessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeadlessError::ApiError(msg) => write!(f, "API error: {}", msg),
            HeadlessError::DownloadError(msg) => write!(f, "Download error: {}", msg),
            HeadlessError::IoError(err) => write!(f, "IO error: {}", err),
            HeadlessError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
        }
    }
}

impl std::error::Error for HeadlessError {}

impl From<reqwest::Error> for HeadlessError {
    fn from(err: reqwest::Error) -> Self {
        HeadlessError::ApiError(err.to_string())
    }
}

impl From<std::io::Error> for HeadlessError {
    fn from(err: std::io::Error) -> Self {
        HeadlessError::IoError(err)
    }
}

/// Type for download messages sent to the download manager
pub type DownloadMessage = (
    String,         // slug
    String,         // filename
    String,         // url
    PathBuf,        // output path
    Option<String>, // sha512
);

/// Exit code constants
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_INVALID_ARGS: i32 = 3;

impl HeadlessError {
    pub fn exit_code(&self) -> i32 {
        match self {
            HeadlessError::InvalidArgs(_) => EXIT_INVALID_ARGS,
            HeadlessError::ApiError(_)
            | HeadlessError::DownloadError(_)
            | HeadlessError::IoError(_) => EXIT_ERROR,
        }
    }
}

/// Validate a project slug before hitting the detail endpoints
pub fn validate_slug(slug: &str) -> Result<(), HeadlessError> {
    if slug.trim().is_empty() {
        return Err(HeadlessError::InvalidArgs(
            "Project slug must not be empty".to_string(),
        ));
    }
    if slug.contains('/') || slug.contains(char::is_whitespace) {
        return Err(HeadlessError::InvalidArgs(format!(
            "Invalid project slug: '{}'",
            slug
        )));
    }
    Ok(())
}

/// Run search command with formatted output
pub async fn run_search(
    client: &CatalogClient,
    query: &str,
    limit: u32,
    reporter: &ProgressReporter,
) -> Result<(), HeadlessError> {
    let start = std::time::Instant::now();

    let hits = client.search_projects(query, limit).await?;

    reporter.report_search(&hits, start.elapsed());

    Ok(())
}

/// Run info command: project detail plus icon availability
pub async fn run_info(
    client: &CatalogClient,
    slug: &str,
    reporter: &ProgressReporter,
) -> Result<(), HeadlessError> {
    validate_slug(slug)?;

    let project = client.fetch_project(slug).await?;

    // The icon is fetched for real; a missing or broken icon is reported
    // but never fails the command
    let icon_bytes = match &project.icon_url {
        Some(url) => match client.fetch_icon(url).await {
            Ok(bytes) => Some(bytes.len() as u64),
            Err(e) => {
                eprintln!("Error loading icon: {}", e);
                None
            }
        },
        None => None,
    };

    reporter.report_project(&project, icon_bytes);

    Ok(())
}

/// Fetch a project's version list. A non-200 response or transport error
/// reads as an empty catalog entry, the same way the versions pane in the
/// TUI treats it, rather than a hard failure.
pub async fn list_versions(client: &CatalogClient, slug: &str) -> Vec<Version> {
    client.fetch_versions(slug).await.unwrap_or_default()
}

/// Run versions command with formatted output
pub async fn run_versions(
    client: &CatalogClient,
    slug: &str,
    reporter: &ProgressReporter,
) -> Result<(), HeadlessError> {
    validate_slug(slug)?;

    let versions = list_versions(client, slug).await;

    reporter.report_versions(slug, &versions);

    Ok(())
}

/// Run download command: resolve the version, queue its primary file and
/// wait for download plus verification to finish
#[allow(clippy::too_many_arguments)]
pub async fn run_download(
    client: &CatalogClient,
    slug: &str,
    version_selector: Option<&str>,
    output_dir: &str,
    reporter: &ProgressReporter,
    download_tx: mpsc::UnboundedSender<DownloadMessage>,
    download_queue_size: Arc<Mutex<usize>>,
    download_progress: Arc<Mutex<Option<DownloadProgress>>>,
    verification_queue_size: Arc<Mutex<usize>>,
    verification_progress: Arc<Mutex<Vec<VerificationProgress>>>,
) -> Result<(), HeadlessError> {
    validate_slug(slug)?;

    let versions = list_versions(client, slug).await;
    if versions.is_empty() {
        return Err(HeadlessError::DownloadError(format!(
            "No versions available for '{}'",
            slug
        )));
    }

    let version = api::resolve_version(&versions, version_selector).ok_or_else(|| {
        let available: Vec<&str> = versions
            .iter()
            .take(10)
            .map(|v| v.version_number.as_str())
            .collect();
        HeadlessError::DownloadError(format!(
            "Version '{}' not found\n\nAvailable versions:\n  {}",
            version_selector.unwrap_or(""),
            available.join("\n  ")
        ))
    })?;

    let file = api::select_primary_file(version).ok_or_else(|| {
        HeadlessError::DownloadError(format!(
            "Version {} of '{}' has no downloadable files",
            version.version_number, slug
        ))
    })?;

    // Local name is the remote basename
    let filename = if file.filename.is_empty() {
        api::filename_from_url(&file.url)
    } else {
        file.filename.clone()
    };

    reporter.report_download_summary(&version.version_number, &filename, file.size);

    {
        let mut queue_size = download_queue_size.lock().await;
        *queue_size += 1;
    }

    download_tx
        .send((
            slug.to_string(),
            filename.clone(),
            file.url.clone(),
            PathBuf::from(output_dir),
            file.hashes.sha512.clone(),
        ))
        .map_err(|e| HeadlessError::DownloadError(e.to_string()))?;

    wait_for_downloads(download_queue_size, download_progress, reporter).await?;
    wait_for_verification(verification_queue_size, verification_progress, reporter).await?;

    // The worker reports failures over the status channel; the file on disk
    // is the ground truth for the exit code
    let final_path = PathBuf::from(output_dir).join(&filename);
    if !final_path.exists() {
        return Err(HeadlessError::DownloadError(format!(
            "Download of {} did not complete",
            filename
        )));
    }

    Ok(())
}

/// Wait for the download queue to drain and report progress
pub async fn wait_for_downloads(
    download_queue_size: Arc<Mutex<usize>>,
    download_progress: Arc<Mutex<Option<DownloadProgress>>>,
    reporter: &ProgressReporter,
) -> Result<(), HeadlessError> {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(200));
    let mut last_progress: Option<DownloadProgress> = None;
    let mut had_active_download = false;

    loop {
        interval.tick().await;

        let progress_guard = download_progress.try_lock();
        if let Ok(ref progress_opt) = progress_guard {
            if let Some(progress) = progress_opt.as_ref() {
                had_active_download = true;
                // Only report if progress changed significantly (>1% or new file)
                let should_report = match &last_progress {
                    None => true,
                    Some(last) => {
                        progress.filename != last.filename
                            || (progress.downloaded as f64 - last.downloaded as f64)
                                > progress.total as f64 * 0.01
                    }
                };

                if should_report {
                    reporter.report_download_progress(
                        &progress.filename,
                        progress.downloaded,
                        progress.total,
                        progress.speed_mbps,
                    );
                    last_progress = Some(progress.clone());
                }
            }
        }
        drop(progress_guard);

        let queue_size = *download_queue_size.lock().await;
        let has_progress = download_progress
            .try_lock()
            .map(|p| p.is_some())
            .unwrap_or(true);

        if queue_size == 0 && !has_progress {
            // Newline to clear the progress bar line
            if had_active_download && !reporter.is_json() {
                println!();
            }
            break;
        }
    }

    Ok(())
}

/// Wait for queued verifications to finish and report progress
pub async fn wait_for_verification(
    verification_queue_size: Arc<Mutex<usize>>,
    verification_progress: Arc<Mutex<Vec<VerificationProgress>>>,
    reporter: &ProgressReporter,
) -> Result<(), HeadlessError> {
    // Give the verification worker a moment to pick up queued items
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    {
        let queue_size = *verification_queue_size.lock().await;
        let has_progress = !verification_progress.lock().await.is_empty();
        if queue_size == 0 && !has_progress {
            return Ok(());
        }
    }

    let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(200));
    let mut shown_any = false;
    let mut consecutive_idle_checks = 0;

    loop {
        interval.tick().await;

        let progress_guard = verification_progress.try_lock();
        if let Ok(ref progress_vec) = progress_guard {
            if let Some(progress) = progress_vec.first() {
                consecutive_idle_checks = 0;
                reporter.report_verification_progress(
                    &progress.filename,
                    progress.verified_bytes,
                    progress.total_bytes,
                );
                shown_any = true;
            }
        }
        drop(progress_guard);

        let queue_size = *verification_queue_size.lock().await;
        let has_active = verification_progress
            .try_lock()
            .map(|p| !p.is_empty())
            .unwrap_or(true);

        if queue_size == 0 && !has_active {
            consecutive_idle_checks += 1;
            if consecutive_idle_checks >= 3 {
                if shown_any && !reporter.is_json() {
                    println!();
                }
                break;
            }
        } else {
            consecutive_idle_checks = 0;
        }
    }

    Ok(())
}

/// Progress reporter for console output (text and JSON modes)
pub struct ProgressReporter {
    json_mode: bool,
}

impl ProgressReporter {
    pub fn new(json_mode: bool) -> Self {
        Self { json_mode }
    }

    pub fn is_json(&self) -> bool {
        self.json_mode
    }

    pub fn report_search(&self, hits: &[SearchHit], elapsed: std::time::Duration) {
        if self.json_mode {
            let json = serde_json::json!({
                "count": hits.len(),
                "query_time_seconds": elapsed.as_secs_f64(),
                "results": hits
            });
            println!("{}", serde_json::to_string_pretty(&json).unwrap());
        } else {
            println!("Found {} projects in {:.2}s:", hits.len(), elapsed.as_secs_f64());
            println!();

            if hits.is_empty() {
                println!("No projects found matching your query.");
                return;
            }

            let max_slug_width = hits.iter().map(|h| h.slug.len()).max().unwrap_or(20).min(40);

            println!(
                "{:<width$} | {:>12} | {:<20} | Description",
                "Slug",
                "Downloads",
                "Author",
                width = max_slug_width
            );
            println!(
                "{:-<width$}-+-{:-<12}-+-{:-<20}-+------------",
                "----",
                "------------",
                "------",
                width = max_slug_width
            );

            for hit in hits {
                // Keep the table readable; ellipsize on a char boundary
                let cleaned = hit.description.replace('\n', " ");
                let description: String = if cleaned.chars().count() > 60 {
                    cleaned.chars().take(57).collect::<String>() + "..."
                } else {
                    cleaned
                };
                println!(
                    "{:<width$} | {:>12} | {:<20} | {}",
                    hit.slug,
                    hit.downloads,
                    hit.author,
                    description,
                    width = max_slug_width
                );
            }
        }
    }

    pub fn report_project(&self, project: &Project, icon_bytes: Option<u64>) {
        if self.json_mode {
            let json = serde_json::json!({
                "project": project,
                "icon_bytes": icon_bytes,
            });
            println!("{}", serde_json::to_string_pretty(&json).unwrap());
        } else {
            println!("Project: {} ({})", project.title, project.slug);
            println!("  Downloads: {}", project.downloads);
            println!("  Followers: {}", project.followers);
            if !project.categories.is_empty() {
                println!("  Categories: {}", project.categories.join(", "));
            }
            if !project.game_versions.is_empty() {
                let shown: Vec<&str> = project
                    .game_versions
                    .iter()
                    .rev()
                    .take(8)
                    .map(|s| s.as_str())
                    .collect();
                println!("  Game versions: {}", shown.join(", "));
            }
            match (&project.icon_url, icon_bytes) {
                (Some(url), Some(bytes)) => {
                    println!("  Icon: {} ({})", url, format_size(bytes))
                }
                (Some(url), None) => println!("  Icon: {} (not available)", url),
                (None, _) => println!("  Icon: none"),
            }
            println!();
            println!("{}", project.description);
        }
    }

    pub fn report_versions(&self, slug: &str, versions: &[Version]) {
        if self.json_mode {
            let json = serde_json::json!({
                "slug": slug,
                "count": versions.len(),
                "versions": versions
            });
            println!("{}", serde_json::to_string_pretty(&json).unwrap());
        } else {
            println!("Versions of {}:", slug);
            println!();

            if versions.is_empty() {
                println!("No versions published.");
                return;
            }

            for version in versions {
                let file_info = match api::select_primary_file(version) {
                    Some(file) => format!("{} ({})", file.filename, format_size(file.size)),
                    None => "no files".to_string(),
                };
                println!(
                    "  {} [{}] - {} | {} | {}",
                    version.version_number,
                    version.version_type.as_deref().unwrap_or("release"),
                    version.name,
                    version.game_versions.join(", "),
                    file_info
                );
            }
        }
    }

    pub fn report_download_summary(&self, version_number: &str, filename: &str, size: u64) {
        if self.json_mode {
            let json = serde_json::json!({
                "status": "queued",
                "version": version_number,
                "filename": filename,
                "size_bytes": size,
            });
            println!("{}", serde_json::to_string_pretty(&json).unwrap());
        } else {
            println!("Download Summary:");
            println!("  Version: {}", version_number);
            println!("  File: {}", filename);
            println!("  Size: {}", format_size(size));
            println!();
        }
    }

    pub fn report_download_progress(
        &self,
        filename: &str,
        downloaded: u64,
        total: u64,
        speed_mbps: f64,
    ) {
        if self.json_mode {
            let json = serde_json::json!({
                "status": "downloading",
                "filename": filename,
                "progress": if total > 0 { downloaded as f64 / total as f64 * 100.0 } else { 0.0 },
                "speed_mbps": speed_mbps
            });
            println!("{}", json);
        } else {
            let percent = if total > 0 {
                (downloaded as f64 / total as f64 * 100.0) as u32
            } else {
                0
            };
            let bar_width = 40;
            let filled = (percent as f32 / 100.0 * bar_width as f32) as usize;
            let bar: String = "=".repeat(filled) + &" ".repeat(bar_width - filled);
            print!(
                "\r[{}] {}% ({:.2} MB/s) - {}",
                bar, percent, speed_mbps, filename
            );
            let _ = std::io::stdout().flush();
        }
    }

    pub fn report_verification_progress(&self, filename: &str, verified: u64, total: u64) {
        if self.json_mode {
            let json = serde_json::json!({
                "status": "verifying",
                "filename": filename,
                "progress": if total > 0 { verified as f64 / total as f64 * 100.0 } else { 0.0 },
            });
            println!("{}", json);
        } else {
            let percent = if total > 0 {
                (verified as f64 / total as f64 * 100.0) as u32
            } else {
                0
            };
            let bar_width = 40;
            let filled = (percent as f32 / 100.0 * bar_width as f32) as usize;
            let bar: String = "=".repeat(filled) + &" ".repeat(bar_width - filled);
            print!("\r[{}] {}% verifying - {}", bar, percent, filename);
            let _ = std::io::stdout().flush();
        }
    }

    pub fn report_error(&self, error: &str) {
        if self.json_mode {
            let json = serde_json::json!({
                "status": "error",
                "error": error
            });
            eprintln!("{}", json);
        } else {
            eprintln!("Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("sodium").is_ok());
        assert!(validate_slug("fabric-api").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("   ").is_err());
        assert!(validate_slug("a/b").is_err());
        assert!(validate_slug("has space").is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            HeadlessError::InvalidArgs("x".into()).exit_code(),
            EXIT_INVALID_ARGS
        );
        assert_eq!(HeadlessError::ApiError("x".into()).exit_code(), EXIT_ERROR);
        assert_eq!(
            HeadlessError::DownloadError("x".into()).exit_code(),
            EXIT_ERROR
        );
    }

    #[tokio::test]
    async fn test_versions_non_200_reads_as_empty_list() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/project/sodium/version");
            then.status(500).body("internal error");
        });

        let client = CatalogClient::with_base_url(&server.base_url()).unwrap();

        // A failed version-list request is an empty catalog entry, not an
        // error; the versions command still succeeds
        assert!(list_versions(&client, "sodium").await.is_empty());

        let reporter = ProgressReporter::new(false);
        assert!(run_versions(&client, "sodium", &reporter).await.is_ok());
    }

    #[tokio::test]
    async fn test_download_with_unavailable_version_list_fails() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/project/sodium/version");
            then.status(500).body("internal error");
        });

        let client = CatalogClient::with_base_url(&server.base_url()).unwrap();
        let reporter = ProgressReporter::new(false);
        let (download_tx, _download_rx) = mpsc::unbounded_channel();

        // With no versions to resolve, the download fails before anything
        // is queued
        let result = run_download(
            &client,
            "sodium",
            None,
            ".",
            &reporter,
            download_tx,
            Arc::new(Mutex::new(0)),
            Arc::new(Mutex::new(None)),
            Arc::new(Mutex::new(0)),
            Arc::new(Mutex::new(Vec::new())),
        )
        .await;

        assert!(matches!(result, Err(HeadlessError::DownloadError(_))));
    }
}
