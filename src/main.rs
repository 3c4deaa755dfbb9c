mod app;
mod components;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::keys::KeyOutcome;
use crate::state::app_settings::AppSettings;
use crate::state::loader::{LoaderWorker, LoadingState};
use crate::state::messages::{LoadRequest, LoadResponse, UiEvent};
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::{LevelFilter, error, info};
use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, PartialEq)]
enum CliAction {
    Run { file: Option<PathBuf> },
    Exit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let file = match parse_cli_args(std::env::args().skip(1)) {
        Ok(CliAction::Run { file }) => file,
        Ok(CliAction::Exit) => return Ok(()),
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            std::process::exit(2);
        }
    };

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    tui_logger::init_logger(LevelFilter::Trace)?;
    tui_logger::set_default_level(LevelFilter::Info);

    let settings = AppSettings::load();
    let level = settings.level_filter();
    log::set_max_level(level);
    tui_logger::set_default_level(level);
    info!("passmap {} starting", env!("CARGO_PKG_VERSION"));

    let encodings = settings.encodings.clone();
    let app = Arc::new(Mutex::new(App::new(settings)));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (load_req_tx, load_req_rx) = mpsc::channel::<LoadRequest>(100);
    let (load_resp_tx, load_resp_rx) = mpsc::channel::<LoadResponse>(100);

    // Input handler thread
    let input_tx = ui_event_tx.clone();
    let input_handler = tokio::task::spawn_blocking(move || input_handler_task(input_tx));

    // Loader thread
    let loader = LoaderWorker::new(encodings, load_req_rx, load_resp_tx);
    let loader_task = tokio::spawn(loader.run());

    if let Some(path) = file {
        let _ = load_req_tx.send(LoadRequest::Open { path }).await;
    }
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, load_req_tx, load_resp_rx).await;

    loader_task.abort();
    let _ = input_handler.await;
    cleanup_terminal()?;

    Ok(())
}

fn parse_cli_args(args: impl IntoIterator<Item = String>) -> Result<CliAction, String> {
    let mut file = None;
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", usage_text());
                return Ok(CliAction::Exit);
            }
            "-V" | "--version" => {
                println!("passmap {}", env!("CARGO_PKG_VERSION"));
                return Ok(CliAction::Exit);
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("Unknown argument: {flag}"));
            }
            _ if file.is_some() => return Err(format!("Unexpected argument: {arg}")),
            _ => file = Some(PathBuf::from(&arg)),
        }
    }
    Ok(CliAction::Run { file })
}

fn usage_text() -> &'static str {
    "passmap - pass map viewer for event coordinate CSV files

Usage:
  passmap [FILE]
  passmap --help
  passmap --version

The CSV needs X and Y columns; X2 and Y2 (end position) are optional.
Press ? inside the app for key bindings.

Environment:
  PASSMAP_CONFIG   Path to settings JSON
                   (default $XDG_CONFIG_HOME/passmap/settings.json
                    or ~/.config/passmap/settings.json)"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    load_requests: mpsc::Sender<LoadRequest>,
    mut load_responses: mpsc::Receiver<LoadResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let (outcome, should_redraw) = handle_ui_event(ui_event, &app, &load_requests).await;
                if outcome == KeyOutcome::Quit {
                    break;
                }
                if should_redraw && !loading.is_loading {
                    redraw(&mut terminal, &app, loading).await;
                }
            }

            Some(response) = load_responses.recv() => {
                if handle_load_response(response, &app, &mut loading).await {
                    redraw(&mut terminal, &app, loading).await;
                }
            }

            else => break,
        }
    }
}

async fn redraw(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &Arc<Mutex<App>>,
    loading: LoadingState,
) {
    let app_guard = app.lock().await;
    if let Err(e) = draw::draw(terminal, &app_guard, loading) {
        error!("draw failed: {e}");
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    load_requests: &mpsc::Sender<LoadRequest>,
) -> (KeyOutcome, bool) {
    match ui_event {
        UiEvent::AppStarted | UiEvent::Resize => (KeyOutcome::Continue, true),
        UiEvent::KeyPressed(key_event) => {
            (keys::handle_key_bindings(key_event, app, load_requests).await, true)
        }
    }
}

async fn handle_load_response(
    response: LoadResponse,
    app: &Arc<Mutex<App>>,
    loading: &mut LoadingState,
) -> bool {
    match response {
        LoadResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        LoadResponse::TableLoaded { path, table } => {
            let mut guard = app.lock().await;
            guard.on_table_loaded(path, table);
        }
        LoadResponse::Error { message } => {
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
    !loading.is_loading
}

/// Runs on a blocking thread; ends once the UI loop drops its receiver.
fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    while !ui_events.is_closed() {
        match crossterm_event::poll(INPUT_POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                error!("terminal input failed: {e}");
                break;
            }
        }
        let Ok(event) = crossterm_event::read() else {
            continue;
        };
        let ui_event = match event {
            Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
            Event::Resize(_, _) => Some(UiEvent::Resize),
            _ => None,
        };

        if let Some(ui_event) = ui_event
            && ui_events.blocking_send(ui_event).is_err()
        {
            break;
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

fn cleanup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::MoveTo(0, 0))?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    execute!(stdout, terminal::LeaveAlternateScreen)?;
    execute!(stdout, cursor::Show)?;
    terminal::disable_raw_mode()
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        let _ = cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_args_runs_without_file() {
        assert_eq!(parse_cli_args(args(&[])), Ok(CliAction::Run { file: None }));
    }

    #[test]
    fn positional_file() {
        assert_eq!(
            parse_cli_args(args(&["events.csv"])),
            Ok(CliAction::Run { file: Some(PathBuf::from("events.csv")) })
        );
    }

    #[test]
    fn rejects_unknown_flags_and_extra_files() {
        assert!(parse_cli_args(args(&["--colour"])).is_err());
        assert!(parse_cli_args(args(&["a.csv", "b.csv"])).is_err());
    }

    #[test]
    fn help_and_version_exit() {
        assert_eq!(parse_cli_args(args(&["--help"])), Ok(CliAction::Exit));
        assert_eq!(parse_cli_args(args(&["-V"])), Ok(CliAction::Exit));
    }
}
