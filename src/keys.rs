use crate::app::{App, MenuItem};
use crate::state::messages::LoadRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::error;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// What the main loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    load_requests: &mpsc::Sender<LoadRequest>,
) -> KeyOutcome {
    if key_event.kind == KeyEventKind::Release {
        return KeyOutcome::Continue;
    }

    let mut guard = app.lock().await;

    if let (Char('c'), KeyModifiers::CONTROL) = (key_event.code, key_event.modifiers) {
        return KeyOutcome::Quit;
    }

    if guard.state.input.is_active() {
        let path = handle_input_key(&mut guard, key_event);
        drop(guard);
        if let Some(path) = path {
            request_load(load_requests, path).await;
        }
        return KeyOutcome::Continue;
    }

    let mut load: Option<PathBuf> = None;

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        (_, Char('q'), _) => return KeyOutcome::Quit,

        // Tab switching
        (_, Char('1'), _) => guard.update_tab(MenuItem::Pitch),
        (_, Char('2'), _) => guard.update_tab(MenuItem::Statistics),
        (_, Char('3'), _) => guard.update_tab(MenuItem::Data),
        (_, Char('?'), _) => guard.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Files
        (_, Char('o'), _) => guard.begin_open_prompt(),
        (_, Char('r'), _) => load = guard.reload_path(),

        // Pitch sidebar
        (MenuItem::Pitch, KeyCode::Tab, _) => guard.sidebar_toggle_focus(),
        (MenuItem::Pitch, Char('j') | KeyCode::Down, _) => guard.sidebar_down(),
        (MenuItem::Pitch, Char('k') | KeyCode::Up, _) => guard.sidebar_up(),
        (MenuItem::Pitch, Char(' ') | KeyCode::Enter, _) => guard.sidebar_toggle(),
        (MenuItem::Pitch, Char('l') | KeyCode::Right, _) => guard.sidebar_cycle(true),
        (MenuItem::Pitch, Char('h') | KeyCode::Left, _) => guard.sidebar_cycle(false),
        (MenuItem::Pitch, Char('a'), _) => guard.select_all(),
        (MenuItem::Pitch, Char('n'), _) => guard.select_none(),
        (MenuItem::Pitch, Char('c'), _) => guard.cycle_palette(),
        (MenuItem::Pitch, Char('#'), _) => guard.begin_hex_entry(),

        // Rendering variant, any tab
        (_, Char('p'), _) => guard.toggle_responsive(),
        (_, Char('s'), _) => guard.toggle_color_scheme(),

        // Global
        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),

        _ => {}
    }

    drop(guard);
    if let Some(path) = load {
        request_load(load_requests, path).await;
    }
    KeyOutcome::Continue
}

/// Edit the active prompt. Returns a path once an open prompt is submitted.
fn handle_input_key(app: &mut App, key_event: KeyEvent) -> Option<PathBuf> {
    match key_event.code {
        KeyCode::Esc => app.state.input.cancel(),
        KeyCode::Enter => return app.submit_input(),
        KeyCode::Backspace => {
            app.state.input.buffer.pop();
        }
        Char(c) => app.state.input.buffer.push(c),
        _ => {}
    }
    None
}

async fn request_load(load_requests: &mpsc::Sender<LoadRequest>, path: PathBuf) {
    if let Err(e) = load_requests.send(LoadRequest::Open { path }).await {
        error!("loader is gone: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::app_settings::AppSettings;
    use crate::state::app_state::{InputMode, SidebarFocus};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup() -> (Arc<Mutex<App>>, mpsc::Sender<LoadRequest>, mpsc::Receiver<LoadRequest>) {
        let app = Arc::new(Mutex::new(App::new(AppSettings::default())));
        let (tx, rx) = mpsc::channel(4);
        (app, tx, rx)
    }

    #[tokio::test]
    async fn quit_keys() {
        let (app, tx, _rx) = setup();
        assert_eq!(handle_key_bindings(key(Char('q')), &app, &tx).await, KeyOutcome::Quit);
        let ctrl_c = KeyEvent::new(Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_bindings(ctrl_c, &app, &tx).await, KeyOutcome::Quit);
    }

    #[tokio::test]
    async fn tabs_and_sidebar_focus() {
        let (app, tx, _rx) = setup();
        handle_key_bindings(key(KeyCode::Tab), &app, &tx).await;
        assert_eq!(app.lock().await.state.sidebar, SidebarFocus::Colors);
        handle_key_bindings(key(Char('3')), &app, &tx).await;
        assert_eq!(app.lock().await.state.active_tab, MenuItem::Data);
        // Tab does nothing outside the pitch view.
        handle_key_bindings(key(KeyCode::Tab), &app, &tx).await;
        assert_eq!(app.lock().await.state.sidebar, SidebarFocus::Colors);
    }

    #[tokio::test]
    async fn open_prompt_sends_load_request() {
        let (app, tx, mut rx) = setup();
        handle_key_bindings(key(Char('o')), &app, &tx).await;
        assert_eq!(app.lock().await.state.input.mode, InputMode::OpenPath);
        for c in "a.csv".chars() {
            // 'q' and friends are text while the prompt is open.
            handle_key_bindings(key(Char(c)), &app, &tx).await;
        }
        handle_key_bindings(key(KeyCode::Backspace), &app, &tx).await;
        handle_key_bindings(key(Char('q')), &app, &tx).await;
        assert_eq!(
            handle_key_bindings(key(KeyCode::Enter), &app, &tx).await,
            KeyOutcome::Continue
        );
        let Ok(LoadRequest::Open { path }) = rx.try_recv() else {
            panic!("expected a load request");
        };
        assert_eq!(path, PathBuf::from("a.csq"));
    }

    #[tokio::test]
    async fn escape_cancels_prompt() {
        let (app, tx, mut rx) = setup();
        handle_key_bindings(key(Char('o')), &app, &tx).await;
        handle_key_bindings(key(Char('x')), &app, &tx).await;
        handle_key_bindings(key(KeyCode::Esc), &app, &tx).await;
        assert!(!app.lock().await.state.input.is_active());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reload_without_file_is_a_no_op() {
        let (app, tx, mut rx) = setup();
        handle_key_bindings(key(Char('r')), &app, &tx).await;
        assert!(rx.try_recv().is_err());
    }
}
