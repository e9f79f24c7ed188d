use super::state::App;
use crate::api;
use crate::models::PopupMode;
use crate::registry;
use std::path::PathBuf;
use tui_input::Input;

impl App {
    /// Load previously completed downloads so finished files are marked
    pub async fn scan_complete_downloads(&mut self) {
        let reg = registry::load_registry();
        let complete_map = registry::get_complete_downloads(&reg);

        let mut complete = self.complete_downloads.lock().await;
        *complete = complete_map;
    }

    /// Initiate download flow - show download path popup
    pub fn trigger_download(&mut self) {
        let versions = futures::executor::block_on(async { self.versions.lock().await.clone() });

        if let Some(selected) = self.version_list_state.selected() {
            if selected < versions.len() {
                self.download_path_input =
                    Input::default().with_value(self.options.default_directory.clone());
                self.popup_mode = PopupMode::DownloadPath;
                self.status = "Enter download path and press Enter".to_string();
            }
        }
    }

    /// Queue the selected version's primary file for download
    pub async fn confirm_download(&mut self) {
        let hits = self.hits.lock().await.clone();
        let versions = self.versions.lock().await.clone();

        let hit = match self.list_state.selected().and_then(|i| hits.get(i)) {
            Some(hit) => hit,
            None => return,
        };
        let version = match self.version_list_state.selected().and_then(|i| versions.get(i)) {
            Some(version) => version,
            None => return,
        };

        let file = match api::select_primary_file(version) {
            Some(file) => file,
            None => {
                self.popup_mode = PopupMode::Error {
                    message: "Failed to download the mod.".to_string(),
                };
                return;
            }
        };

        // Local name is the remote basename
        let filename = if file.filename.is_empty() {
            api::filename_from_url(&file.url)
        } else {
            file.filename.clone()
        };

        let base_path = PathBuf::from(self.download_path_input.value());

        {
            let mut queue_size = self.download_queue_size.lock().await;
            *queue_size += 1;
        }

        if self
            .download_tx
            .send((
                hit.slug.clone(),
                filename.clone(),
                file.url.clone(),
                base_path.clone(),
                file.hashes.sha512.clone(),
            ))
            .is_ok()
        {
            self.status = format!(
                "Starting download of {} to {}",
                filename,
                base_path.display()
            );
        } else {
            self.error = Some("Failed to start download".to_string());
            let mut queue_size = self.download_queue_size.lock().await;
            *queue_size = queue_size.saturating_sub(1);
        }
    }
}
