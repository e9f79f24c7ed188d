// Declare submodules
mod downloads;
mod events;
mod projects;
mod state;

// Re-export App struct
pub use state::App;

use crate::download::start_download;
use crate::models::PopupMode;
use color_eyre::Result;
use crossterm::event::{Event, KeyEventKind};
use futures::{FutureExt, StreamExt};
use ratatui::{DefaultTerminal, Frame};

impl App {
    /// Main application run loop
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.running = true;

        // Push loaded options into the global worker config
        self.sync_options_to_config();

        // Mark files downloaded in earlier sessions
        self.scan_complete_downloads().await;

        // Spawn verification worker
        let verification_queue = self.verification_queue.clone();
        let verification_progress = self.verification_progress.clone();
        let verification_queue_size = self.verification_queue_size.clone();
        let status_tx_verify = self.status_tx.clone();

        tokio::spawn(async move {
            crate::verification::verification_worker(
                verification_queue,
                verification_progress,
                verification_queue_size,
                status_tx_verify,
            )
            .await;
        });

        // Spawn download manager task
        let download_rx = self.download_rx.clone();
        let download_progress = self.download_progress.clone();
        let download_queue_size = self.download_queue_size.clone();
        let status_tx = self.status_tx.clone();
        let complete_downloads = self.complete_downloads.clone();
        let verification_queue = self.verification_queue.clone();
        let verification_queue_size = self.verification_queue_size.clone();
        tokio::spawn(async move {
            let mut rx = download_rx.lock().await;
            while let Some((slug, filename, url, path, sha512)) = rx.recv().await {
                // Decrement queue size when we start processing
                {
                    let mut queue_size = download_queue_size.lock().await;
                    *queue_size = queue_size.saturating_sub(1);
                }
                start_download(crate::download::DownloadParams {
                    slug,
                    filename,
                    url,
                    base_path: path,
                    progress: download_progress.clone(),
                    status_tx: status_tx.clone(),
                    complete_downloads: complete_downloads.clone(),
                    expected_sha512: sha512,
                    verification_queue: verification_queue.clone(),
                    verification_queue_size: verification_queue_size.clone(),
                })
                .await;
            }
        });

        while self.running {
            terminal.draw(|frame| self.draw(frame))?;

            // Deferred work queued by key handlers so the UI renders first
            if self.needs_search {
                self.needs_search = false;
                self.search_projects().await;
            }

            if self.needs_load_project {
                self.needs_load_project = false;
                self.load_project_details().await;
            }

            self.handle_crossterm_events().await?;
        }
        Ok(())
    }

    /// Draw UI components
    fn draw(&mut self, frame: &mut Frame) {
        let hits = futures::executor::block_on(async { self.hits.lock().await.clone() });

        let project = futures::executor::block_on(async { self.project.lock().await.clone() });

        let versions = futures::executor::block_on(async { self.versions.lock().await.clone() });

        let complete_downloads =
            futures::executor::block_on(async { self.complete_downloads.lock().await.clone() });

        crate::ui::render::render_ui(
            frame,
            crate::ui::render::RenderParams {
                input: &self.input,
                input_mode: self.input_mode,
                hits: &hits,
                list_state: &mut self.list_state,
                loading: self.loading,
                project: &project,
                versions: &versions,
                version_list_state: &mut self.version_list_state,
                loading_versions: self.loading_versions,
                focused_pane: self.focused_pane,
                error: &self.error,
                status: &self.status,
                selection_info: &self.selection_info,
                complete_downloads: &complete_downloads,
            },
        );

        // Render download and verification progress bars
        let (download_progress, download_queue_size, verification_progress, verification_queue_size) =
            futures::executor::block_on(async {
                let dl_prog = self.download_progress.lock().await.clone();
                let dl_queue = *self.download_queue_size.lock().await;
                let ver_prog = self.verification_progress.lock().await.clone();
                let ver_queue = *self.verification_queue_size.lock().await;
                (dl_prog, dl_queue, ver_prog, ver_queue)
            });

        crate::ui::render::render_progress_bars(
            frame,
            &download_progress,
            download_queue_size,
            &verification_progress,
            verification_queue_size,
        );

        // Render popups (must be last to appear on top)
        match self.popup_mode {
            PopupMode::SearchPopup => {
                crate::ui::render::render_search_popup(frame, &self.input);
            }
            PopupMode::DownloadPath => {
                crate::ui::render::render_download_path_popup(frame, &self.download_path_input);
            }
            PopupMode::Error { ref message } => {
                crate::ui::render::render_error_popup(frame, message);
            }
            PopupMode::None => {}
        }
    }

    /// Handle crossterm events (keyboard input, status updates)
    async fn handle_crossterm_events(&mut self) -> Result<()> {
        // Check for status messages from download and verification tasks
        {
            let mut rx = self.status_rx.lock().await;
            while let Ok(msg) = rx.try_recv() {
                // Worker failures become modal warnings, everything else is
                // status-bar traffic
                if let Some(detail) = msg.strip_prefix("Error: ") {
                    self.popup_mode = PopupMode::Error {
                        message: detail.to_string(),
                    };
                    self.status = msg.clone();
                } else {
                    self.status = msg;
                }
            }
        }

        let delay = tokio::time::sleep(tokio::time::Duration::from_millis(100));
        tokio::select! {
            maybe_event = self.event_stream.next().fuse() => {
                if let Some(Ok(Event::Key(key))) = maybe_event {
                    if key.kind == KeyEventKind::Press {
                        self.on_key_event(key).await;
                    }
                }
            }
            _ = delay => {
                // Timeout - just redraw
            }
        }
        Ok(())
    }
}
