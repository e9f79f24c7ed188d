use crate::models::{DownloadMetadata, DownloadRegistry, DownloadStatus};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

pub fn get_registry_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(format!("{}/.config/rust-modrinth-downloader/downloads.toml", home))
}

pub fn load_registry() -> DownloadRegistry {
    let path = get_registry_path();
    if !path.exists() {
        return DownloadRegistry::default();
    }

    match fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content).unwrap_or_default(),
        Err(_) => DownloadRegistry::default(),
    }
}

pub fn save_registry(registry: &DownloadRegistry) {
    let path = get_registry_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    if let Ok(toml_string) = toml::to_string_pretty(registry) {
        if let Ok(mut file) = fs::File::create(&path) {
            let _ = file.write_all(toml_string.as_bytes());
        }
    }
}

pub fn get_incomplete_downloads(registry: &DownloadRegistry) -> Vec<DownloadMetadata> {
    registry
        .downloads
        .iter()
        .filter(|d| d.status == DownloadStatus::Incomplete)
        .cloned()
        .collect()
}

pub fn get_complete_downloads(
    registry: &DownloadRegistry,
) -> std::collections::HashMap<String, DownloadMetadata> {
    registry
        .downloads
        .iter()
        .filter(|d| d.status == DownloadStatus::Complete)
        .map(|d| (d.filename.clone(), d.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(filename: &str, status: DownloadStatus) -> DownloadMetadata {
        DownloadMetadata {
            slug: "sodium".to_string(),
            filename: filename.to_string(),
            url: format!("https://cdn.example/{}", filename),
            local_path: format!("/tmp/{}", filename),
            total_size: 1024,
            status,
            expected_sha512: None,
        }
    }

    #[test]
    fn test_incomplete_filter() {
        let registry = DownloadRegistry {
            downloads: vec![
                entry("a.jar", DownloadStatus::Complete),
                entry("b.jar", DownloadStatus::Incomplete),
                entry("c.jar", DownloadStatus::HashMismatch),
            ],
        };
        let incomplete = get_incomplete_downloads(&registry);
        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].filename, "b.jar");
    }

    #[test]
    fn test_complete_map_keyed_by_filename() {
        let registry = DownloadRegistry {
            downloads: vec![
                entry("a.jar", DownloadStatus::Complete),
                entry("b.jar", DownloadStatus::Incomplete),
            ],
        };
        let complete = get_complete_downloads(&registry);
        assert!(complete.contains_key("a.jar"));
        assert!(!complete.contains_key("b.jar"));
    }
}
