mod api;
mod cli;
mod config;
mod download;
mod headless;
mod http_client;
mod models;
mod registry;
mod ui;
mod utils;
mod verification;

use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Parse CLI arguments
    use clap::Parser;
    let cli_args = cli::Cli::parse();

    // If --headless flag is present, run in headless mode
    if cli_args.headless {
        let options = config::load_config();
        sync_options_to_config(&options);

        let reporter = headless::ProgressReporter::new(cli_args.json);

        let client = match api::CatalogClient::new() {
            Ok(client) => client,
            Err(e) => {
                reporter.report_error(&format!("Failed to build HTTP client: {}", e));
                std::process::exit(headless::EXIT_ERROR);
            }
        };

        // Channels for the download manager and status output
        let (download_tx, mut download_rx) =
            tokio::sync::mpsc::unbounded_channel::<headless::DownloadMessage>();
        let (status_tx, mut status_rx) = tokio::sync::mpsc::unbounded_channel::<String>();

        let download_progress = Arc::new(Mutex::new(None));
        let download_queue_size = Arc::new(Mutex::new(0usize));
        let complete_downloads = Arc::new(Mutex::new(std::collections::HashMap::new()));
        let verification_queue = Arc::new(Mutex::new(Vec::new()));
        let verification_queue_size = Arc::new(Mutex::new(0usize));
        let verification_progress = Arc::new(Mutex::new(Vec::new()));

        // Spawn verification worker
        {
            let verification_queue = verification_queue.clone();
            let verification_progress = verification_progress.clone();
            let verification_queue_size = verification_queue_size.clone();
            let status_tx = status_tx.clone();
            tokio::spawn(async move {
                verification::verification_worker(
                    verification_queue,
                    verification_progress,
                    verification_queue_size,
                    status_tx,
                )
                .await;
            });
        }

        // Spawn download manager task; downloads run one at a time and the
        // queue counter only drops once a download has finished
        {
            let download_progress = download_progress.clone();
            let download_queue_size = download_queue_size.clone();
            let complete_downloads = complete_downloads.clone();
            let verification_queue = verification_queue.clone();
            let verification_queue_size = verification_queue_size.clone();
            let status_tx = status_tx.clone();
            tokio::spawn(async move {
                while let Some((slug, filename, url, path, sha512)) = download_rx.recv().await {
                    download::start_download(download::DownloadParams {
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

                    let mut queue_size = download_queue_size.lock().await;
                    *queue_size = queue_size.saturating_sub(1);
                }
            });
        }

        // Spawn status reporter task
        tokio::spawn(async move {
            while let Some(msg) = status_rx.recv().await {
                eprintln!("{}", msg);
            }
        });

        // Execute command
        let result = match cli_args.command {
            Some(cli::Commands::Search { query, limit }) => {
                let limit = limit.unwrap_or(options.search_limit);
                headless::run_search(&client, &query, limit, &reporter).await
            }
            Some(cli::Commands::Info { slug }) => {
                headless::run_info(&client, &slug, &reporter).await
            }
            Some(cli::Commands::Versions { slug }) => {
                headless::run_versions(&client, &slug, &reporter).await
            }
            Some(cli::Commands::Download {
                slug,
                version,
                output,
            }) => {
                let output_dir = output.unwrap_or_else(|| options.default_directory.clone());
                headless::run_download(
                    &client,
                    &slug,
                    version.as_deref(),
                    &output_dir,
                    &reporter,
                    download_tx,
                    download_queue_size,
                    download_progress,
                    verification_queue_size,
                    verification_progress,
                )
                .await
            }
            None => {
                eprintln!("Error: No command specified");
                std::process::exit(headless::EXIT_INVALID_ARGS);
            }
        };

        match result {
            Ok(_) => std::process::exit(headless::EXIT_SUCCESS),
            Err(e) => {
                reporter.report_error(&e.to_string());
                std::process::exit(e.exit_code());
            }
        }
    }

    // TUI flow
    let terminal = ratatui::init();
    let result = match ui::App::new() {
        Ok(app) => app.run(terminal).await,
        Err(e) => Err(e),
    };
    ratatui::restore();

    result
}

/// Synchronize loaded options into the global worker configuration
fn sync_options_to_config(options: &models::AppOptions) {
    use std::sync::atomic::Ordering;

    download::DOWNLOAD_CONFIG
        .max_retries
        .store(options.max_retries, Ordering::Relaxed);
    download::DOWNLOAD_CONFIG
        .download_timeout_secs
        .store(options.download_timeout_secs, Ordering::Relaxed);
    download::DOWNLOAD_CONFIG
        .retry_delay_secs
        .store(options.retry_delay_secs, Ordering::Relaxed);
    download::DOWNLOAD_CONFIG
        .enable_verification
        .store(options.verification_on_completion, Ordering::Relaxed);
}
