use crate::state::messages::{LoadRequest, LoadResponse};
use anyhow::Context;
use log::{debug, error, info};
use passmap_core::loader::{Encoding, load_path};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Reads and parses CSV files off the UI loop.
pub struct LoaderWorker {
    encodings: Vec<Encoding>,
    requests: mpsc::Receiver<LoadRequest>,
    responses: mpsc::Sender<LoadResponse>,
    is_loading: Arc<AtomicBool>,
}

impl LoaderWorker {
    pub fn new(
        encodings: Vec<Encoding>,
        requests: mpsc::Receiver<LoadRequest>,
        responses: mpsc::Sender<LoadResponse>,
    ) -> Self {
        Self {
            encodings,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let result = match request {
                LoadRequest::Open { path } => self.handle_open(path).await,
            };

            self.stop_loading_animation(result.is_ok()).await;

            let response = result.unwrap_or_else(|err| {
                error!("load failed: {err:#}");
                LoadResponse::Error { message: format!("{err:#}") }
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send load response: {e}");
                break;
            }
        }
    }

    async fn handle_open(&self, path: PathBuf) -> anyhow::Result<LoadResponse> {
        debug!("loading {}", path.display());
        let encodings = self.encodings.clone();
        let read_path = path.clone();
        let table = tokio::task::spawn_blocking(move || load_path(&read_path, &encodings))
            .await
            .context("loader task stopped")??;
        info!(
            "loaded {} ({} rows, {} columns)",
            path.display(),
            table.len(),
            table.columns.len()
        );
        Ok(LoadResponse::TableLoaded { path, table })
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state = LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(LoadResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(LoadResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(LoadResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}
