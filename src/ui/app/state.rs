use crate::models::*;
use crossterm::event::EventStream;
use ratatui::widgets::ListState;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tui_input::Input;

/// Type alias for download message tuple
/// Tuple: (slug, filename, url, path, sha512)
pub type DownloadMessage = (String, String, String, PathBuf, Option<String>);

/// Type alias for download receiver to reduce complexity
pub type DownloadReceiver = Arc<Mutex<mpsc::UnboundedReceiver<DownloadMessage>>>;

/// Main application state container
#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub event_stream: EventStream,
    pub input: Input,
    pub input_mode: InputMode,
    pub focused_pane: FocusedPane,
    pub client: crate::api::CatalogClient,
    pub hits: Arc<Mutex<Vec<SearchHit>>>,
    pub list_state: ListState,
    pub loading: bool,
    pub error: Option<String>,
    pub status: String,
    pub selection_info: String,
    pub project: Arc<Mutex<Option<Project>>>,
    pub versions: Arc<Mutex<Vec<Version>>>,
    pub version_list_state: ListState,
    pub loading_versions: bool,
    pub version_cache: Arc<Mutex<VersionCache>>,
    pub popup_mode: PopupMode,
    pub download_path_input: Input,
    pub download_progress: Arc<Mutex<Option<DownloadProgress>>>,
    pub download_tx: mpsc::UnboundedSender<DownloadMessage>,
    pub download_rx: DownloadReceiver,
    pub download_queue_size: Arc<Mutex<usize>>,
    pub status_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    pub status_tx: mpsc::UnboundedSender<String>,
    pub complete_downloads: Arc<Mutex<CompleteDownloads>>,
    pub verification_progress: Arc<Mutex<Vec<VerificationProgress>>>,
    pub verification_queue: Arc<Mutex<Vec<VerificationQueueItem>>>,
    pub verification_queue_size: Arc<Mutex<usize>>,
    pub options: AppOptions,
    // Flags to trigger deferred loading on next loop iteration
    pub needs_search: bool,
    pub needs_load_project: bool,
}

impl App {
    /// Create new application instance with default state
    pub fn new() -> color_eyre::Result<Self> {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        let version_list_state = ListState::default();

        let (download_tx, download_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = mpsc::unbounded_channel();

        // Load options from config file (or use defaults)
        let options = crate::config::load_config();
        let download_path_input = Input::default().with_value(options.default_directory.clone());

        let client = crate::api::CatalogClient::new()?;

        Ok(Self {
            running: false,
            event_stream: EventStream::default(),
            input: Input::default(),
            input_mode: InputMode::Normal,
            focused_pane: FocusedPane::Projects,
            client,
            hits: Arc::new(Mutex::new(Vec::new())),
            list_state,
            loading: false,
            error: None,
            status: "Press '/' to search, Tab to switch panes, 'd' to download, 'q' to quit"
                .to_string(),
            selection_info: String::new(),
            project: Arc::new(Mutex::new(None)),
            versions: Arc::new(Mutex::new(Vec::new())),
            version_list_state,
            loading_versions: false,
            version_cache: Arc::new(Mutex::new(HashMap::new())),
            popup_mode: PopupMode::None,
            download_path_input,
            download_progress: Arc::new(Mutex::new(None)),
            download_tx,
            download_rx: Arc::new(Mutex::new(download_rx)),
            download_queue_size: Arc::new(Mutex::new(0)),
            status_rx: Arc::new(Mutex::new(status_rx)),
            status_tx,
            complete_downloads: Arc::new(Mutex::new(HashMap::new())),
            verification_progress: Arc::new(Mutex::new(Vec::new())),
            verification_queue: Arc::new(Mutex::new(Vec::new())),
            verification_queue_size: Arc::new(Mutex::new(0)),
            options,
            needs_search: false,
            needs_load_project: false,
        })
    }

    /// Synchronize options to global worker configuration
    pub fn sync_options_to_config(&self) {
        crate::sync_options_to_config(&self.options);
    }

    /// Terminate application
    pub fn quit(&mut self) {
        self.running = false;
    }
}
