use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, FilterItem, InputMode, LoadedFile, SidebarFocus};
use chrono::Local;
use log::{info, warn};
use passmap_core::colors::Rgb;
use passmap_core::session::{RenderOutput, VizState, render};
use passmap_core::{EventTable, Value};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Pitch,
    Statistics,
    Data,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let viz = VizState::new(settings.viz_config());
        Self { state: AppState::new(viz), settings }
    }

    /// Everything drawn for the current frame.
    pub fn render_output(&self) -> RenderOutput {
        render(&self.state.viz)
    }

    // -----------------------------------------------------------------------
    // Loader response handlers — called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_table_loaded(&mut self, path: PathBuf, table: EventTable) {
        self.state.last_error = None;
        self.state.status = None;
        self.state.viz.load_table(table);
        self.state.filter_cursor = 0;
        self.state.color_cursor = 0;
        self.state.file = Some(LoadedFile {
            path,
            loaded_at: Local::now().format("%H:%M:%S").to_string(),
        });
    }

    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Sidebar navigation
    // -----------------------------------------------------------------------

    pub fn sidebar_toggle_focus(&mut self) {
        self.state.sidebar = self.state.sidebar.toggle();
    }

    pub fn sidebar_down(&mut self) {
        let max = self.state.cursor_len().saturating_sub(1);
        let cursor = self.sidebar_cursor_mut();
        if *cursor < max {
            *cursor += 1;
        }
    }

    pub fn sidebar_up(&mut self) {
        let cursor = self.sidebar_cursor_mut();
        *cursor = cursor.saturating_sub(1);
    }

    fn sidebar_cursor_mut(&mut self) -> &mut usize {
        match self.state.sidebar {
            SidebarFocus::Filters => &mut self.state.filter_cursor,
            SidebarFocus::Colors => &mut self.state.color_cursor,
        }
    }

    /// Space/Enter on the filter list.
    pub fn sidebar_toggle(&mut self) {
        if self.state.sidebar != SidebarFocus::Filters {
            return;
        }
        let Some(row) = self.state.current_filter_row() else {
            return;
        };
        let Some((spec, selection)) = self.state.viz.selection_mut(row.filter) else {
            return;
        };
        match row.item {
            FilterItem::Option(i) => {
                if let Some(option) = spec.options.get(i) {
                    selection.toggle(option);
                }
            }
            FilterItem::Missing => selection.toggle_missing(),
            FilterItem::Single => selection.cycle(spec, true),
        }
    }

    /// h/l: step a single-select value, or the color column.
    pub fn sidebar_cycle(&mut self, forward: bool) {
        match self.state.sidebar {
            SidebarFocus::Filters => {
                let Some(row) = self.state.current_filter_row() else {
                    return;
                };
                if let Some((spec, selection)) = self.state.viz.selection_mut(row.filter) {
                    selection.cycle(spec, forward);
                }
            }
            SidebarFocus::Colors => {
                self.state.viz.cycle_color_column(forward);
                self.state.color_cursor = 0;
            }
        }
    }

    pub fn select_all(&mut self) {
        if let Some(row) = self.current_filter_row_in_focus()
            && let Some((spec, selection)) = self.state.viz.selection_mut(row)
        {
            selection.select_all(spec);
        }
    }

    pub fn select_none(&mut self) {
        if let Some(row) = self.current_filter_row_in_focus()
            && let Some((_, selection)) = self.state.viz.selection_mut(row)
        {
            selection.select_none();
        }
    }

    fn current_filter_row_in_focus(&self) -> Option<usize> {
        if self.state.sidebar != SidebarFocus::Filters {
            return None;
        }
        self.state.current_filter_row().map(|r| r.filter)
    }

    // -----------------------------------------------------------------------
    // Color mapping
    // -----------------------------------------------------------------------

    pub fn selected_color_value(&self) -> Option<Value> {
        if self.state.sidebar != SidebarFocus::Colors {
            return None;
        }
        self.state
            .viz
            .color
            .values()
            .nth(self.state.color_cursor)
            .map(|(value, _)| value.clone())
    }

    pub fn cycle_palette(&mut self) {
        if let Some(value) = self.selected_color_value() {
            self.state.viz.color.cycle(&value);
        }
    }

    pub fn begin_hex_entry(&mut self) {
        let Some(value) = self.selected_color_value() else {
            return;
        };
        let current = self.state.viz.color.get(&value).map(|c| c.to_string()).unwrap_or_default();
        self.state.input.begin(InputMode::HexColor, current);
    }

    fn apply_hex(&mut self, text: &str) {
        let Some(value) = self.selected_color_value() else {
            return;
        };
        match text.parse::<Rgb>() {
            Ok(color) => {
                self.state.viz.set_color(&value, color);
                self.state.status = Some(format!("{value} -> {color}"));
            }
            Err(e) => {
                warn!("{e}");
                self.state.status = Some(e.to_string());
            }
        }
    }

    pub fn toggle_responsive(&mut self) {
        let responsive = !self.state.viz.config.responsive;
        self.state.viz.set_responsive(responsive);
        self.state.status =
            Some(if responsive { "responsive sizing" } else { "fixed sizing" }.to_string());
    }

    pub fn toggle_color_scheme(&mut self) {
        let scheme = self.state.viz.config.color_scheme.toggle();
        self.state.viz.set_color_scheme(scheme);
        self.state.status = Some(format!("{} colors", scheme.label()));
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    pub fn begin_open_prompt(&mut self) {
        let initial = self
            .state
            .file
            .as_ref()
            .map(|f| f.path.display().to_string())
            .unwrap_or_default();
        self.state.input.begin(InputMode::OpenPath, initial);
    }

    pub fn reload_path(&self) -> Option<PathBuf> {
        self.state.file.as_ref().map(|f| f.path.clone())
    }

    /// Finish the active prompt. Returns a path when one should be loaded.
    pub fn submit_input(&mut self) -> Option<PathBuf> {
        let (mode, text) = self.state.input.finish();
        match mode {
            InputMode::OpenPath => {
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                info!("opening {text}");
                Some(PathBuf::from(text))
            }
            InputMode::HexColor => {
                self.apply_hex(&text);
                None
            }
            InputMode::Normal => None,
        }
    }
}
