use crate::models::{DownloadStatus, VerificationProgress, VerificationQueueItem};
use sha2::{Digest, Sha512};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, Mutex, Semaphore};

/// Global verification configuration (thread-safe, runtime-modifiable)
pub struct VerificationConfig {
    pub concurrent_verifications: AtomicUsize,
    pub buffer_size: AtomicUsize,
}

impl VerificationConfig {
    pub const fn new() -> Self {
        Self {
            concurrent_verifications: AtomicUsize::new(2),
            buffer_size: AtomicUsize::new(128 * 1024),
        }
    }
}

pub static VERIFICATION_CONFIG: VerificationConfig = VerificationConfig::new();

/// Main verification worker that processes the verification queue
/// Runs continuously in the background, processing items as they arrive
pub async fn verification_worker(
    verification_queue: Arc<Mutex<Vec<VerificationQueueItem>>>,
    verification_progress: Arc<Mutex<Vec<VerificationProgress>>>,
    verification_queue_size: Arc<Mutex<usize>>,
    status_tx: mpsc::UnboundedSender<String>,
) {
    let max_concurrent = VERIFICATION_CONFIG
        .concurrent_verifications
        .load(Ordering::Relaxed);
    let semaphore = Arc::new(Semaphore::new(max_concurrent));

    loop {
        let item = {
            let mut queue = verification_queue.lock().await;
            if queue.is_empty() {
                None
            } else {
                Some(queue.remove(0))
            }
        };

        if let Some(item) = item {
            {
                let mut queue_size = verification_queue_size.lock().await;
                *queue_size = queue_size.saturating_sub(1);
            }

            let permit = semaphore.clone().acquire_owned().await.unwrap();
            let verification_progress = verification_progress.clone();
            let status_tx = status_tx.clone();

            tokio::spawn(async move {
                verify_file(item, verification_progress, status_tx).await;
                drop(permit);
            });
        } else {
            // No work, sleep briefly
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }
}

/// Verify a single file against the sha512 the catalog advertises
async fn verify_file(
    item: VerificationQueueItem,
    verification_progress: Arc<Mutex<Vec<VerificationProgress>>>,
    status_tx: mpsc::UnboundedSender<String>,
) {
    let local_path = PathBuf::from(&item.local_path);

    if !local_path.exists() {
        let _ = status_tx.send(format!(
            "Error: Cannot verify {}, file not found",
            item.filename
        ));
        return;
    }

    {
        let mut progress = verification_progress.lock().await;
        progress.push(VerificationProgress {
            filename: item.filename.clone(),
            verified_bytes: 0,
            total_bytes: item.total_size,
        });
    }

    let _ = status_tx.send(format!("Verifying integrity of {}...", item.filename));

    match calculate_sha512_with_progress(
        &local_path,
        &verification_progress,
        &item.filename,
        item.total_size,
    )
    .await
    {
        Ok(calculated_hash) => {
            if calculated_hash == item.expected_sha512 {
                let _ = status_tx.send(format!("✓ Hash verified for {}", item.filename));
            } else {
                let expected_prefix: String = item.expected_sha512.chars().take(16).collect();
                let got_prefix: String = calculated_hash.chars().take(16).collect();
                let _ = status_tx.send(format!(
                    "✗ Hash mismatch for {}: expected {}..., got {}...",
                    item.filename, expected_prefix, got_prefix
                ));

                let mut reg = crate::registry::load_registry();
                if let Some(entry) = reg
                    .downloads
                    .iter_mut()
                    .find(|d| d.local_path == item.local_path)
                {
                    entry.status = DownloadStatus::HashMismatch;
                }
                crate::registry::save_registry(&reg);
            }
        }
        Err(e) => {
            let _ = status_tx.send(format!("Warning: Failed to verify {}: {}", item.filename, e));
        }
    }

    {
        let mut progress = verification_progress.lock().await;
        progress.retain(|p| p.filename != item.filename);
    }
}

/// Calculate sha512 of a file with progress tracking
async fn calculate_sha512_with_progress(
    file_path: &Path,
    verification_progress: &Arc<Mutex<Vec<VerificationProgress>>>,
    filename: &str,
    total_size: u64,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let mut file = tokio::fs::File::open(file_path).await?;
    let mut hasher = Sha512::new();
    let buffer_size = VERIFICATION_CONFIG.buffer_size.load(Ordering::Relaxed);
    let mut buffer = vec![0u8; buffer_size];

    let mut bytes_verified = 0u64;

    loop {
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        bytes_verified += bytes_read as u64;

        let mut progress = verification_progress.lock().await;
        if let Some(entry) = progress.iter_mut().find(|p| p.filename == filename) {
            entry.verified_bytes = bytes_verified;
        }
    }

    // Final progress update to ensure 100%
    {
        let mut progress = verification_progress.lock().await;
        if let Some(entry) = progress.iter_mut().find(|p| p.filename == filename) {
            entry.verified_bytes = total_size;
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Queue a file for verification
pub async fn queue_verification(
    verification_queue: Arc<Mutex<Vec<VerificationQueueItem>>>,
    verification_queue_size: Arc<Mutex<usize>>,
    item: VerificationQueueItem,
) {
    let mut queue = verification_queue.lock().await;
    queue.push(item);

    let mut queue_size = verification_queue_size.lock().await;
    *queue_size += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sha512_of_known_content() {
        let dir = std::env::temp_dir().join("rmd-verify-test");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("known.bin");
        tokio::fs::write(&path, b"abc").await.unwrap();

        let progress = Arc::new(Mutex::new(Vec::new()));
        let hash = calculate_sha512_with_progress(&path, &progress, "known.bin", 3)
            .await
            .unwrap();

        // sha512("abc")
        assert_eq!(
            hash,
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_queue_verification_increments_size() {
        let queue = Arc::new(Mutex::new(Vec::new()));
        let queue_size = Arc::new(Mutex::new(0usize));

        queue_verification(
            queue.clone(),
            queue_size.clone(),
            VerificationQueueItem {
                filename: "a.jar".to_string(),
                local_path: "/tmp/a.jar".to_string(),
                expected_sha512: "00".repeat(64),
                total_size: 10,
            },
        )
        .await;

        assert_eq!(queue.lock().await.len(), 1);
        assert_eq!(*queue_size.lock().await, 1);
    }
}
