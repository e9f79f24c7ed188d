use crate::models::{
    CompleteDownloads, DownloadMetadata, DownloadProgress, DownloadStatus, VerificationQueueItem,
};
use crate::registry;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};

/// Parameters for starting a download
pub struct DownloadParams {
    pub slug: String,
    pub filename: String,
    pub url: String,
    pub base_path: PathBuf,
    pub progress: Arc<Mutex<Option<DownloadProgress>>>,
    pub status_tx: mpsc::UnboundedSender<String>,
    pub complete_downloads: Arc<Mutex<CompleteDownloads>>,
    pub expected_sha512: Option<String>,
    pub verification_queue: Arc<Mutex<Vec<VerificationQueueItem>>>,
    pub verification_queue_size: Arc<Mutex<usize>>,
}

pub fn sanitize_path_component(component: &str) -> Option<String> {
    // Reject path components that contain path traversal or are invalid
    if component.is_empty()
        || component == "."
        || component == ".."
        || component.contains('/')
        || component.contains('\\')
        || component.contains('\0')
    {
        return None;
    }

    // Only trim trailing dots (can cause issues on Windows); leading dots
    // stay so dotfiles survive
    let trimmed = component.trim().trim_end_matches('.');

    if trimmed.is_empty() {
        return None;
    }

    Some(trimmed.to_string())
}

pub async fn start_download(params: DownloadParams) {
    let DownloadParams {
        slug,
        filename,
        url,
        base_path,
        progress,
        status_tx,
        complete_downloads,
        expected_sha512,
        verification_queue,
        verification_queue_size,
    } = params;

    let _ = status_tx.send(format!("Starting download: {}", filename));

    // Validate filename to prevent path traversal
    let sanitized_filename = match sanitize_path_component(&filename) {
        Some(f) => f,
        None => {
            let _ = status_tx.send(format!("Error: Invalid filename: {}", filename));
            return;
        }
    };

    // Create directory if it doesn't exist
    if let Err(e) = tokio::fs::create_dir_all(&base_path).await {
        let _ = status_tx.send(format!("Error: Failed to create directory: {}", e));
        return;
    }

    let canonical_base = match base_path.canonicalize() {
        Ok(path) => path,
        Err(e) => {
            let _ = status_tx.send(format!("Error: Cannot canonicalize base path: {}", e));
            return;
        }
    };

    let final_path = canonical_base.join(&sanitized_filename);
    let incomplete_path = canonical_base.join(format!("{}.incomplete", sanitized_filename));

    // A stale partial file means a previous run died; restart from scratch
    if incomplete_path.exists() {
        let _ = status_tx.send(format!(
            "Found incomplete download for {}, restarting from beginning",
            filename
        ));
        if let Err(e) = tokio::fs::remove_file(&incomplete_path).await {
            let _ = status_tx.send(format!("Warning: Failed to delete incomplete file: {}", e));
        }
    }

    let mut retries = DOWNLOAD_CONFIG.max_retries.load(Ordering::Relaxed);

    loop {
        match download_stream(
            &url,
            &slug,
            &filename,
            &incomplete_path,
            &final_path,
            &expected_sha512,
            &progress,
        )
        .await
        {
            Ok(total_size) => {
                // Update registry: mark as complete
                let mut reg = registry::load_registry();
                if let Some(entry) = reg.downloads.iter_mut().find(|d| d.url == url) {
                    entry.status = DownloadStatus::Complete;
                    entry.total_size = total_size;

                    let mut complete = complete_downloads.lock().await;
                    complete.insert(filename.clone(), entry.clone());
                }
                registry::save_registry(&reg);

                // Queue verification if enabled AND hash is available
                let verification_enabled =
                    DOWNLOAD_CONFIG.enable_verification.load(Ordering::Relaxed);
                match &expected_sha512 {
                    Some(expected_hash) if verification_enabled => {
                        let item = VerificationQueueItem {
                            filename: filename.clone(),
                            local_path: final_path.to_string_lossy().to_string(),
                            expected_sha512: expected_hash.clone(),
                            total_size,
                        };
                        crate::verification::queue_verification(
                            verification_queue,
                            verification_queue_size,
                            item,
                        )
                        .await;
                        let _ = status_tx.send(format!(
                            "Download complete, queued for verification: {}",
                            filename
                        ));
                    }
                    _ => {
                        let _ = status_tx.send(format!("Download complete: {}", filename));
                    }
                }
                break;
            }
            Err(e) if retries > 0 && is_transient_error(&e) => {
                retries -= 1;
                let _ = status_tx.send(format!(
                    "Download interrupted: {}. Retrying ({} left)...",
                    e, retries
                ));
                let retry_delay = DOWNLOAD_CONFIG.retry_delay_secs.load(Ordering::Relaxed);
                tokio::time::sleep(tokio::time::Duration::from_secs(retry_delay)).await;

                if incomplete_path.exists() {
                    let _ = tokio::fs::remove_file(&incomplete_path).await;
                }
                continue;
            }
            Err(e) => {
                let _ = status_tx.send(format!("Error: Download failed: {}", e));

                // No partial file may survive a failed download
                if incomplete_path.exists() {
                    let _ = tokio::fs::remove_file(&incomplete_path).await;
                }

                let mut reg = registry::load_registry();
                if let Some(entry) = reg.downloads.iter_mut().find(|d| d.url == url) {
                    entry.status = DownloadStatus::Incomplete;
                }
                registry::save_registry(&reg);

                let mut prog = progress.lock().await;
                *prog = None;
                return;
            }
        }
    }

    // Clear progress when done
    let mut prog = progress.lock().await;
    *prog = None;
}

#[allow(clippy::borrowed_box)]
fn is_transient_error(e: &Box<dyn std::error::Error + Send + Sync>) -> bool {
    if let Some(reqwest_err) = e.downcast_ref::<reqwest::Error>() {
        return reqwest_err.is_timeout() || reqwest_err.is_connect();
    }
    false
}

// Global download configuration (thread-safe, runtime-modifiable)
pub struct DownloadConfig {
    pub enable_verification: AtomicBool,
    pub max_retries: AtomicU32,
    pub download_timeout_secs: AtomicU64,
    pub retry_delay_secs: AtomicU64,
    pub progress_update_interval_ms: AtomicU64,
}

impl DownloadConfig {
    pub const fn new() -> Self {
        Self {
            enable_verification: AtomicBool::new(true),
            max_retries: AtomicU32::new(3),
            download_timeout_secs: AtomicU64::new(120),
            retry_delay_secs: AtomicU64::new(1),
            progress_update_interval_ms: AtomicU64::new(200),
        }
    }
}

// Global static configuration
pub static DOWNLOAD_CONFIG: DownloadConfig = DownloadConfig::new();

/// Stream the file to `<filename>.incomplete`, renaming into place on
/// success; the final path overwrites any existing file of the same name.
async fn download_stream(
    url: &str,
    slug: &str,
    filename: &str,
    incomplete_path: &PathBuf,
    final_path: &PathBuf,
    expected_sha512: &Option<String>,
    progress: &Arc<Mutex<Option<DownloadProgress>>>,
) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
    let timeout_secs = DOWNLOAD_CONFIG.download_timeout_secs.load(Ordering::Relaxed);
    let client =
        crate::http_client::build_client(Some(std::time::Duration::from_secs(timeout_secs)))?;

    let response = client.get(url).send().await?.error_for_status()?;
    let total_size = response.content_length().unwrap_or(0);

    // Record the attempt in the registry before any bytes land
    let mut reg = registry::load_registry();
    if let Some(entry) = reg.downloads.iter_mut().find(|d| d.url == url) {
        entry.total_size = total_size;
        entry.status = DownloadStatus::Incomplete;
    } else {
        reg.downloads.push(DownloadMetadata {
            slug: slug.to_string(),
            filename: filename.to_string(),
            url: url.to_string(),
            local_path: final_path.to_string_lossy().to_string(),
            total_size,
            status: DownloadStatus::Incomplete,
            expected_sha512: expected_sha512.clone(),
        });
    }
    registry::save_registry(&reg);

    {
        let mut prog = progress.lock().await;
        *prog = Some(DownloadProgress {
            slug: slug.to_string(),
            filename: filename.to_string(),
            downloaded: 0,
            total: total_size,
            speed_mbps: 0.0,
        });
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(incomplete_path)
        .await?;

    let mut downloaded = 0u64;
    let mut last_update = std::time::Instant::now();
    let mut last_bytes = 0u64;

    use futures::StreamExt;
    let mut stream = response.bytes_stream();

    while let Some(item) = stream.next().await {
        let bytes = item?;
        file.write_all(&bytes).await?;
        downloaded += bytes.len() as u64;

        let now = std::time::Instant::now();
        let elapsed = now.duration_since(last_update).as_secs_f64();
        let interval_secs = DOWNLOAD_CONFIG
            .progress_update_interval_ms
            .load(Ordering::Relaxed) as f64
            / 1000.0;

        if elapsed >= interval_secs {
            let bytes_since_last = downloaded - last_bytes;
            let speed_mbps = (bytes_since_last as f64 / elapsed) / 1_048_576.0;

            let mut prog = progress.lock().await;
            if let Some(p) = prog.as_mut() {
                p.downloaded = downloaded;
                p.speed_mbps = speed_mbps;
            }

            last_update = now;
            last_bytes = downloaded;
        }
    }

    file.flush().await?;
    drop(file);

    // Rename to final path, clobbering any previous copy of the file
    tokio::fs::rename(incomplete_path, final_path).await?;

    {
        let mut prog = progress.lock().await;
        if let Some(p) = prog.as_mut() {
            p.downloaded = downloaded;
        }
    }

    Ok(if total_size > 0 { total_size } else { downloaded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    fn worker_state() -> (
        Arc<Mutex<Option<DownloadProgress>>>,
        mpsc::UnboundedSender<String>,
        mpsc::UnboundedReceiver<String>,
        Arc<Mutex<CompleteDownloads>>,
        Arc<Mutex<Vec<VerificationQueueItem>>>,
        Arc<Mutex<usize>>,
    ) {
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Mutex::new(None)),
            status_tx,
            status_rx,
            Arc::new(Mutex::new(HashMap::new())),
            Arc::new(Mutex::new(Vec::new())),
            Arc::new(Mutex::new(0)),
        )
    }

    #[tokio::test]
    async fn test_download_lifecycle() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files/mod-1.0.0.jar");
            then.status(200).body("jar bytes here");
        });
        server.mock(|when, then| {
            when.method(GET).path("/files/broken.jar");
            then.status(500).body("boom");
        });

        // Sandbox the registry under a throwaway home
        let home = tempfile::tempdir().unwrap();
        std::env::set_var("HOME", home.path());

        let out_dir = home.path().join("mods");
        let final_path = out_dir.join("mod-1.0.0.jar");

        // A successful download writes the file under its remote basename
        let (progress, status_tx, _status_rx, complete, vq, vqs) = worker_state();
        start_download(DownloadParams {
            slug: "sodium".to_string(),
            filename: "mod-1.0.0.jar".to_string(),
            url: server.url("/files/mod-1.0.0.jar"),
            base_path: out_dir.clone(),
            progress: progress.clone(),
            status_tx,
            complete_downloads: complete.clone(),
            expected_sha512: None,
            verification_queue: vq.clone(),
            verification_queue_size: vqs.clone(),
        })
        .await;

        let content = tokio::fs::read_to_string(&final_path).await.unwrap();
        assert_eq!(content, "jar bytes here");
        assert!(!out_dir.join("mod-1.0.0.jar.incomplete").exists());
        assert!(progress.lock().await.is_none());
        assert!(complete.lock().await.contains_key("mod-1.0.0.jar"));
        // No hash was provided, so nothing is queued for verification
        assert!(vq.lock().await.is_empty());

        // A repeated download overwrites the existing file
        tokio::fs::write(&final_path, "stale contents").await.unwrap();
        let (progress, status_tx, _status_rx, complete, vq, vqs) = worker_state();
        start_download(DownloadParams {
            slug: "sodium".to_string(),
            filename: "mod-1.0.0.jar".to_string(),
            url: server.url("/files/mod-1.0.0.jar"),
            base_path: out_dir.clone(),
            progress,
            status_tx,
            complete_downloads: complete,
            expected_sha512: None,
            verification_queue: vq,
            verification_queue_size: vqs,
        })
        .await;
        let content = tokio::fs::read_to_string(&final_path).await.unwrap();
        assert_eq!(content, "jar bytes here");

        // A failed download leaves no file behind, neither final nor partial
        let (progress, status_tx, mut status_rx, complete, vq, vqs) = worker_state();
        start_download(DownloadParams {
            slug: "sodium".to_string(),
            filename: "broken.jar".to_string(),
            url: server.url("/files/broken.jar"),
            base_path: out_dir.clone(),
            progress,
            status_tx,
            complete_downloads: complete.clone(),
            expected_sha512: None,
            verification_queue: vq,
            verification_queue_size: vqs,
        })
        .await;

        assert!(!out_dir.join("broken.jar").exists());
        assert!(!out_dir.join("broken.jar.incomplete").exists());
        assert!(!complete.lock().await.contains_key("broken.jar"));

        let mut saw_error = false;
        while let Ok(msg) = status_rx.try_recv() {
            if msg.starts_with("Error:") {
                saw_error = true;
            }
        }
        assert!(saw_error);

        // A download with an advertised hash lands in the verification queue
        server.mock(|when, then| {
            when.method(GET).path("/files/hashed.jar");
            then.status(200).body("abc");
        });

        let (progress, status_tx, _status_rx, complete, vq, vqs) = worker_state();
        start_download(DownloadParams {
            slug: "sodium".to_string(),
            filename: "hashed.jar".to_string(),
            url: server.url("/files/hashed.jar"),
            base_path: out_dir.clone(),
            progress,
            status_tx,
            complete_downloads: complete,
            expected_sha512: Some("00".repeat(64)),
            verification_queue: vq.clone(),
            verification_queue_size: vqs.clone(),
        })
        .await;

        let queue = vq.lock().await;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].filename, "hashed.jar");
        assert_eq!(*vqs.lock().await, 1);
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(sanitize_path_component("..").is_none());
        assert!(sanitize_path_component(".").is_none());
        assert!(sanitize_path_component("a/b").is_none());
        assert!(sanitize_path_component("a\\b").is_none());
        assert!(sanitize_path_component("").is_none());
    }

    #[test]
    fn test_sanitize_keeps_ordinary_names() {
        assert_eq!(
            sanitize_path_component("sodium-fabric-0.5.8.jar").as_deref(),
            Some("sodium-fabric-0.5.8.jar")
        );
        // Leading dots survive, trailing dots are trimmed
        assert_eq!(
            sanitize_path_component(".hidden").as_deref(),
            Some(".hidden")
        );
        assert_eq!(sanitize_path_component("name..").as_deref(), Some("name"));
    }
}
