use super::state::App;
use crate::models::*;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tui_input::backend::crossterm::EventHandler;

impl App {
    /// Main keyboard event dispatcher
    pub async fn on_key_event(&mut self, key: KeyEvent) {
        self.error = None;

        // Handle popup input separately
        match self.popup_mode {
            PopupMode::SearchPopup => {
                self.handle_search_popup_input(key).await;
                return;
            }
            PopupMode::DownloadPath => {
                self.handle_download_path_popup_input(key).await;
                return;
            }
            PopupMode::Error { .. } => {
                self.handle_error_popup_input(key);
                return;
            }
            PopupMode::None => {}
        }

        match self.input_mode {
            InputMode::Normal => self.handle_normal_mode_input(key).await,
            InputMode::Editing => self.handle_editing_mode_input(key).await,
        }
    }

    /// Handle keyboard input in Normal mode
    async fn handle_normal_mode_input(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Char('/')) => {
                self.popup_mode = PopupMode::SearchPopup;
                self.input.reset(); // Clear previous search
                self.status = "Search Mods".to_string();
            }
            (_, KeyCode::Char('d')) => {
                if self.focused_pane == FocusedPane::Versions {
                    self.trigger_download();
                }
            }
            (_, KeyCode::Tab) => {
                self.toggle_focus();
            }
            (_, KeyCode::Down | KeyCode::Char('j')) => match self.focused_pane {
                FocusedPane::Projects => {
                    self.next();
                    // Clear details immediately to show selection change
                    self.clear_project_details().await;
                    // Set flag to load on next iteration (allows UI to render first)
                    self.needs_load_project = true;
                }
                FocusedPane::Versions => {
                    self.next_version();
                }
            },
            (_, KeyCode::Up | KeyCode::Char('k')) => match self.focused_pane {
                FocusedPane::Projects => {
                    self.previous();
                    self.clear_project_details().await;
                    self.needs_load_project = true;
                }
                FocusedPane::Versions => {
                    self.previous_version();
                }
            },
            (_, KeyCode::Enter) => match self.focused_pane {
                FocusedPane::Projects => {
                    self.toggle_focus();
                }
                FocusedPane::Versions => {
                    self.show_version_details().await;
                }
            },
            _ => {}
        }
    }

    /// Handle keyboard input in Search popup
    async fn handle_search_popup_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                self.popup_mode = PopupMode::None;
                // Clear results immediately before searching
                self.clear_search_results().await;
                self.needs_search = true;
            }
            KeyCode::Esc => {
                self.popup_mode = PopupMode::None;
                self.input_mode = InputMode::Normal;
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
            }
        }
    }

    /// Handle keyboard input in Editing mode
    async fn handle_editing_mode_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                self.clear_search_results().await;
                self.needs_search = true;
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
            }
        }
    }

    /// Handle keyboard input in Download Path popup
    async fn handle_download_path_popup_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                // Close the popup first; confirm_download may raise a warning
                self.popup_mode = PopupMode::None;
                self.confirm_download().await;
            }
            KeyCode::Esc => {
                self.popup_mode = PopupMode::None;
                self.status = "Download cancelled".to_string();
            }
            _ => {
                self.download_path_input.handle_event(&Event::Key(key));
            }
        }
    }

    /// Handle keyboard input in the modal warning popup
    fn handle_error_popup_input(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            self.popup_mode = PopupMode::None;
        }
    }

    /// Drop current results before a fresh search
    async fn clear_search_results(&mut self) {
        let mut hits = self.hits.lock().await;
        hits.clear();
        drop(hits);
        self.list_state.select(Some(0));
        self.clear_project_details().await;
    }

    /// Navigate to next project in list
    pub fn next(&mut self) {
        let hits_len = futures::executor::block_on(async { self.hits.lock().await.len() });

        if hits_len == 0 {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => {
                if i >= hits_len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Navigate to previous project in list
    pub fn previous(&mut self) {
        let hits_len = futures::executor::block_on(async { self.hits.lock().await.len() });

        if hits_len == 0 {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => {
                if i == 0 {
                    hits_len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Toggle focus between projects and versions panes
    pub fn toggle_focus(&mut self) {
        self.focused_pane = match self.focused_pane {
            FocusedPane::Projects => {
                // When switching to versions, select first item if available
                let versions_len =
                    futures::executor::block_on(async { self.versions.lock().await.len() });
                if versions_len > 0 {
                    self.version_list_state.select(Some(0));
                }
                FocusedPane::Versions
            }
            FocusedPane::Versions => FocusedPane::Projects,
        };
    }

    /// Navigate to next version in list
    pub fn next_version(&mut self) {
        let versions_len = futures::executor::block_on(async { self.versions.lock().await.len() });

        if versions_len == 0 {
            return;
        }

        let i = match self.version_list_state.selected() {
            Some(i) => {
                if i >= versions_len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.version_list_state.select(Some(i));
    }

    /// Navigate to previous version in list
    pub fn previous_version(&mut self) {
        let versions_len = futures::executor::block_on(async { self.versions.lock().await.len() });

        if versions_len == 0 {
            return;
        }

        let i = match self.version_list_state.selected() {
            Some(i) => {
                if i == 0 {
                    versions_len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.version_list_state.select(Some(i));
    }
}
