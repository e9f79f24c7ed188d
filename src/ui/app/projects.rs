use super::state::App;
use crate::api;
use crate::models::PopupMode;

impl App {
    /// Execute search query and load results
    pub async fn search_projects(&mut self) {
        let query = self.input.value().to_string();

        if query.is_empty() {
            return;
        }

        self.loading = true;
        self.error = None;

        let hits = self.hits.clone();
        let limit = self.options.search_limit;

        match self.client.search_projects(&query, limit).await {
            Ok(results) => {
                let mut hits_lock = hits.lock().await;
                *hits_lock = results;
                self.loading = false;
                self.list_state.select(Some(0));
                self.status = format!("Found {} mods", hits_lock.len());
                drop(hits_lock);

                // Load details for first result
                self.load_project_details().await;
            }
            Err(e) => {
                self.loading = false;
                self.error = Some(format!("Failed to fetch mods: {}", e));
                self.status = "Search failed".to_string();
                self.popup_mode = PopupMode::Error {
                    message: "Failed to fetch mods. Please try again later.".to_string(),
                };
            }
        }
    }

    /// Clear project details when the selection changes
    pub async fn clear_project_details(&mut self) {
        let mut project = self.project.lock().await;
        *project = None;
        let mut versions = self.versions.lock().await;
        versions.clear();
        self.version_list_state.select(None);
        self.selection_info.clear();
    }

    /// Load detail record and version list for the selected search hit
    pub async fn load_project_details(&mut self) {
        let hits = self.hits.lock().await;
        let hit = match self.list_state.selected().and_then(|i| hits.get(i)) {
            Some(hit) => hit.clone(),
            None => return,
        };
        drop(hits);

        // Further detail needs a slug
        if hit.slug.is_empty() {
            self.popup_mode = PopupMode::Error {
                message: "Selected mod has no slug.".to_string(),
            };
            return;
        }

        self.selection_info = format!(
            "Selected: {} | URL: https://modrinth.com/mod/{}",
            hit.title, hit.slug
        );

        self.loading_versions = true;

        match self.client.fetch_project(&hit.slug).await {
            Ok(detail) => {
                let mut project = self.project.lock().await;
                *project = Some(detail);
            }
            Err(e) => {
                self.loading_versions = false;
                self.status = "Failed to fetch mod details".to_string();
                self.popup_mode = PopupMode::Error {
                    message: format!("Failed to fetch mod details: {}", e),
                };
                return;
            }
        }

        // Version list is cached per slug for the session
        {
            let cache = self.version_cache.lock().await;
            if let Some(cached) = cache.get(&hit.slug) {
                let mut versions = self.versions.lock().await;
                *versions = cached.clone();
                self.version_list_state.select(Some(0));
                self.loading_versions = false;
                return;
            }
        }

        match self.client.fetch_versions(&hit.slug).await {
            Ok(list) => {
                {
                    let mut cache = self.version_cache.lock().await;
                    cache.insert(hit.slug.clone(), list.clone());
                }
                let mut versions = self.versions.lock().await;
                *versions = list;
                self.version_list_state
                    .select(if versions.is_empty() { None } else { Some(0) });
                self.loading_versions = false;
            }
            Err(_) => {
                // Detail view still opens; the version pane just stays empty
                let mut versions = self.versions.lock().await;
                versions.clear();
                self.version_list_state.select(None);
                self.loading_versions = false;
            }
        }
    }

    /// Display selected version's primary file in the status bar
    pub async fn show_version_details(&mut self) {
        let versions = self.versions.lock().await;
        if let Some(version) = self.version_list_state.selected().and_then(|i| versions.get(i)) {
            match api::select_primary_file(version) {
                Some(file) => {
                    self.status = format!(
                        "Version: {} | File: {} ({})",
                        version.version_number,
                        file.filename,
                        crate::utils::format_size(file.size)
                    );
                }
                None => {
                    self.status = format!("Version: {} | No files", version.version_number);
                }
            }
        }
    }
}
