use crate::state::loader::LoadingState;
use crossterm::event::KeyEvent;
use passmap_core::EventTable;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum LoadRequest {
    Open { path: PathBuf },
}

#[derive(Debug)]
pub enum LoadResponse {
    LoadingStateChanged { loading_state: LoadingState },
    TableLoaded { path: PathBuf, table: EventTable },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
