use crate::app::MenuItem;
use passmap_core::filter::{FilterKind, FilterSpec};
use passmap_core::session::VizState;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Sidebar
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum SidebarFocus {
    #[default]
    Filters,
    Colors,
}

impl SidebarFocus {
    pub fn toggle(self) -> Self {
        match self {
            SidebarFocus::Filters => SidebarFocus::Colors,
            SidebarFocus::Colors => SidebarFocus::Filters,
        }
    }
}

/// One selectable line of the filter list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterItem {
    /// Index into the filter's options.
    Option(usize),
    /// The "(missing)" toggle of a multi-select.
    Missing,
    /// The current value of a single-select.
    Single,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FilterRow {
    pub filter: usize,
    pub item: FilterItem,
}

/// Flatten the filters into the rows the cursor moves over.
pub fn filter_rows(filters: &[FilterSpec]) -> Vec<FilterRow> {
    let mut rows = Vec::new();
    for (filter, spec) in filters.iter().enumerate() {
        match spec.kind {
            FilterKind::MultiSelect => {
                rows.extend((0..spec.options.len()).map(|i| FilterRow {
                    filter,
                    item: FilterItem::Option(i),
                }));
                if spec.has_missing {
                    rows.push(FilterRow { filter, item: FilterItem::Missing });
                }
            }
            FilterKind::SingleSelect => rows.push(FilterRow { filter, item: FilterItem::Single }),
        }
    }
    rows
}

// ---------------------------------------------------------------------------
// Text input (path prompt, hex entry)
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum InputMode {
    #[default]
    Normal,
    OpenPath,
    HexColor,
}

impl InputMode {
    pub fn prompt(&self) -> &'static str {
        match self {
            InputMode::Normal => "",
            InputMode::OpenPath => "Open CSV: ",
            InputMode::HexColor => "Color (#RRGGBB): ",
        }
    }
}

#[derive(Debug, Default)]
pub struct InputState {
    pub mode: InputMode,
    pub buffer: String,
}

impl InputState {
    pub fn begin(&mut self, mode: InputMode, initial: impl Into<String>) {
        self.mode = mode;
        self.buffer = initial.into();
    }

    pub fn is_active(&self) -> bool {
        self.mode != InputMode::Normal
    }

    pub fn cancel(&mut self) {
        self.mode = InputMode::Normal;
        self.buffer.clear();
    }

    /// End input, returning what was typed and for which prompt.
    pub fn finish(&mut self) -> (InputMode, String) {
        let mode = std::mem::take(&mut self.mode);
        (mode, std::mem::take(&mut self.buffer))
    }
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub loaded_at: String,
}

impl LoadedFile {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub sidebar: SidebarFocus,
    pub filter_cursor: usize,
    pub color_cursor: usize,
    pub input: InputState,
    pub viz: VizState,
    pub file: Option<LoadedFile>,
    pub last_error: Option<String>,
    /// Transient feedback shown in the status line.
    pub status: Option<String>,
}

impl AppState {
    pub fn new(viz: VizState) -> Self {
        Self {
            active_tab: MenuItem::default(),
            previous_tab: MenuItem::default(),
            show_logs: false,
            sidebar: SidebarFocus::default(),
            filter_cursor: 0,
            color_cursor: 0,
            input: InputState::default(),
            viz,
            file: None,
            last_error: None,
            status: None,
        }
    }

    pub fn current_filter_row(&self) -> Option<FilterRow> {
        filter_rows(&self.viz.filters).get(self.filter_cursor).copied()
    }

    pub fn cursor_len(&self) -> usize {
        match self.sidebar {
            SidebarFocus::Filters => filter_rows(&self.viz.filters).len(),
            SidebarFocus::Colors => self.viz.color.entries.len(),
        }
    }
}
