use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Bar, BarChart, BarGroup, Block, BorderType, Borders, Paragraph, Row, Table, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::pitch::{PitchView, to_color};
use crate::state::app_state::{FilterItem, SidebarFocus, filter_rows};
use crate::state::loader::{ERROR_CHAR, LoadingState};
use crate::ui::layout::{LayoutAreas, split_pitch_view};
use passmap_core::Value;
use passmap_core::colors::DEFAULT_EVENT_COLOR;
use passmap_core::filter::{FilterKind, FilterSelection};
use passmap_core::session::RenderOutput;
use passmap_core::stats::ValueCounts;

static TABS: &[&str; 3] = &["Pitch", "Statistics", "Data"];

/// Rows shown on the Data tab.
pub const PREVIEW_ROWS: usize = 5;

const HELP_TEXT: &[(&str, &str)] = &[
    ("1 / 2 / 3", "Pitch, Statistics, Data"),
    ("?", "this help (Esc to close)"),
    ("o", "open a CSV file"),
    ("r", "reload the current file"),
    ("f", "toggle full screen"),
    ("\"", "toggle the log pane"),
    ("p", "toggle responsive / fixed sizing"),
    ("s", "toggle color scheme"),
    ("q, Ctrl-C", "quit"),
    ("", ""),
    ("Tab", "switch Filters / Colors"),
    ("j / k", "move"),
    ("Space, Enter", "toggle option"),
    ("h / l", "cycle single-select value or color column"),
    ("a / n", "select all / none"),
    ("c", "next palette color"),
    ("#", "enter a hex color"),
];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &App, loading: LoadingState) -> Result<(), B::Error>
where
    B: Backend,
{
    let current_size = terminal.size()?;
    if current_size.width <= 10 || current_size.height <= 10 {
        return Ok(());
    }

    let mut layout = LayoutAreas::new(current_size);
    let output = app.render_output();

    terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Pitch => draw_pitch_tab(f, layout.main, app, &output),
            MenuItem::Statistics => draw_statistics(f, layout.main, app, &output),
            MenuItem::Data => draw_data(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_status(f, layout.status, app, &output);
        draw_loading_spinner(f, layout.status, loading);
    })?;
    Ok(())
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Pitch => 0,
        MenuItem::Statistics => 1,
        MenuItem::Data => 2,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

// ---------------------------------------------------------------------------
// Pitch tab
// ---------------------------------------------------------------------------

fn draw_pitch_tab(f: &mut Frame, area: Rect, app: &App, output: &RenderOutput) {
    let (pitch_area, sidebar_area) = split_pitch_view(area);
    let config = &app.state.viz.config;
    let title = format!(
        " Pitch | {} sizing | {} colors ",
        if config.responsive { "responsive" } else { "fixed" },
        config.color_scheme.label()
    );
    f.render_widget(
        PitchView::new(output).block(default_border(Color::White).title(title)),
        pitch_area,
    );

    let [filters_area, colors_area] =
        Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)])
            .areas(sidebar_area);
    draw_filters(f, filters_area, app);
    draw_colors(f, colors_area, app);
}

fn focus_border<'a>(app: &App, focus: SidebarFocus) -> Block<'a> {
    default_border(if app.state.sidebar == focus { Color::Yellow } else { Color::DarkGray })
}

fn cursor_style(active: bool) -> Style {
    if active {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}

/// Lines of the filter list plus the line index of the cursor.
pub fn filter_lines(app: &App, width: usize) -> (Vec<Line<'static>>, usize) {
    let viz = &app.state.viz;
    let focused = app.state.sidebar == SidebarFocus::Filters;
    let mut lines = Vec::new();
    let mut cursor_line = 0;
    let mut current_filter = None;

    for (idx, row) in filter_rows(&viz.filters).into_iter().enumerate() {
        let (Some(spec), Some(selection)) = (viz.filters.get(row.filter), viz.selections.get(row.filter))
        else {
            continue;
        };
        if current_filter != Some(row.filter) {
            current_filter = Some(row.filter);
            let kind = match spec.kind {
                FilterKind::MultiSelect => "",
                FilterKind::SingleSelect => " (one of)",
            };
            lines.push(Line::from(Span::styled(
                truncate(&format!("{}{kind}", spec.column), width),
                Style::default().add_modifier(Modifier::BOLD),
            )));
        }

        let text = match row.item {
            FilterItem::Option(i) => {
                let option = spec.options.get(i).cloned().unwrap_or_default();
                format!("{} {option}", check(selection.is_selected(&option)))
            }
            FilterItem::Missing => {
                let included = matches!(
                    selection,
                    FilterSelection::Multi { include_missing: true, .. }
                );
                format!("{} (missing)", check(included))
            }
            FilterItem::Single => match selection {
                FilterSelection::Single { value } => format!("< {value} >"),
                FilterSelection::Multi { .. } => String::new(),
            },
        };
        let active = focused && idx == app.state.filter_cursor;
        if active {
            cursor_line = lines.len();
        }
        lines.push(Line::from(Span::styled(
            truncate(&format!("  {text}"), width),
            cursor_style(active),
        )));
    }
    (lines, cursor_line)
}

fn check(selected: bool) -> &'static str {
    if selected { "[x]" } else { "[ ]" }
}

fn draw_filters(f: &mut Frame, area: Rect, app: &App) {
    let block = focus_border(app, SidebarFocus::Filters).title(" Filters ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.state.viz.table.is_none() {
        draw_placeholder(f, inner, "No data loaded");
        return;
    }
    let (lines, cursor_line) = filter_lines(app, inner.width as usize);
    if lines.is_empty() {
        draw_placeholder(f, inner, "No filterable columns");
        return;
    }
    let offset = cursor_line.saturating_sub(inner.height.saturating_sub(1) as usize);
    f.render_widget(Paragraph::new(lines).scroll((offset as u16, 0)), inner);
}

fn draw_colors(f: &mut Frame, area: Rect, app: &App) {
    let block = focus_border(app, SidebarFocus::Colors).title(" Colors ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mapping = &app.state.viz.color;
    let Some(column) = mapping.column.as_deref() else {
        draw_placeholder(f, inner, "No color column");
        return;
    };
    let width = inner.width as usize;
    let focused = app.state.sidebar == SidebarFocus::Colors;

    let mut lines = vec![Line::from(vec![
        Span::raw("Column: "),
        Span::styled(
            truncate(&format!("< {column} >"), width.saturating_sub(8)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ])];
    for (idx, (value, color)) in mapping.values().enumerate() {
        let active = focused && idx == app.state.color_cursor;
        lines.push(Line::from(vec![
            Span::styled("██ ", Style::default().fg(to_color(*color))),
            Span::styled(truncate(&value.to_string(), width.saturating_sub(12)), cursor_style(active)),
            Span::styled(format!(" {color}"), Style::default().fg(Color::DarkGray)),
        ]));
    }
    let offset = (app.state.color_cursor + 1).saturating_sub(inner.height.saturating_sub(1) as usize);
    f.render_widget(Paragraph::new(lines).scroll((offset as u16, 0)), inner);
}

// ---------------------------------------------------------------------------
// Statistics tab
// ---------------------------------------------------------------------------

fn draw_statistics(f: &mut Frame, area: Rect, app: &App, output: &RenderOutput) {
    let block = default_border(Color::White).title(" Statistics ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.state.viz.table.is_none() {
        draw_placeholder(f, inner, "Open a CSV file with o");
        return;
    }

    let stats = &output.stats;
    let [summary, charts_area] =
        Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(inner);
    f.render_widget(
        Paragraph::new(vec![
            Line::from(vec![
                Span::raw("Average pass length: "),
                Span::styled(
                    stats.mean_pass_length_label(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                format!("{} of {} events after filtering", stats.filtered_rows, stats.total_rows),
                Style::default().fg(Color::DarkGray),
            )),
        ]),
        summary,
    );

    let charts: Vec<_> = stats.charts().collect();
    if charts.is_empty() {
        draw_placeholder(f, charts_area, "No pass height, outcome or pressure column");
        return;
    }
    let areas = Layout::horizontal(vec![Constraint::Fill(1); charts.len()]).split(charts_area);
    for ((title, counts), chart_area) in charts.into_iter().zip(areas.iter()) {
        draw_value_counts(f, *chart_area, app, title, counts);
    }
}

fn draw_value_counts(f: &mut Frame, area: Rect, app: &App, title: &str, counts: &ValueCounts) {
    let block = default_border(Color::DarkGray).title(format!(" {title} "));
    if counts.counts.is_empty() {
        let inner = block.inner(area);
        f.render_widget(block, area);
        draw_placeholder(f, inner, "No values");
        return;
    }

    let mapping = &app.state.viz.color;
    let colored_by_mapping = mapping.column.as_deref() == Some(counts.column.as_str());
    let bars: Vec<Bar> = counts
        .counts
        .iter()
        .map(|(value, n)| {
            let color = colored_by_mapping
                .then(|| mapping.get(value))
                .flatten()
                .unwrap_or(DEFAULT_EVENT_COLOR);
            Bar::default()
                .value(*n)
                .label(Line::from(value.to_string()))
                .text_value(n.to_string())
                .style(Style::default().fg(to_color(color)))
                .value_style(Style::default().fg(Color::Black).bg(to_color(color)))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .max(counts.max())
        .bar_width(1)
        .bar_gap(0);
    f.render_widget(chart, area);
}

// ---------------------------------------------------------------------------
// Data tab
// ---------------------------------------------------------------------------

fn draw_data(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Data ");
    let Some(table) = app.state.viz.table.as_ref() else {
        let inner = block.inner(area);
        f.render_widget(block, area);
        draw_placeholder(f, inner, "Open a CSV file with o");
        return;
    };

    let header = Row::new(table.columns.iter().map(|c| c.to_string()))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = table
        .head(PREVIEW_ROWS)
        .iter()
        .map(|row| Row::new(row.iter().map(Value::to_string)));
    let widths = vec![Constraint::Fill(1); table.columns.len().max(1)];
    let title = format!(
        " Data | first {} of {} rows, {} columns ",
        table.len().min(PREVIEW_ROWS),
        table.len(),
        table.columns.len()
    );
    f.render_widget(Table::new(rows, widths).header(header).block(block.title(title)), area);
}

// ---------------------------------------------------------------------------
// Help, logs, status
// ---------------------------------------------------------------------------

fn draw_help(f: &mut Frame, area: Rect) {
    let lines: Vec<Line> = HELP_TEXT
        .iter()
        .map(|(keys, action)| {
            Line::from(vec![
                Span::styled(format!("{keys:>14}  "), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(default_border(Color::White).title(" Help ")),
        area,
    );
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Log "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .output_target(false)
        .output_file(false)
        .output_line(false);
    f.render_widget(logs, area);
}

pub fn status_line(app: &App, output: &RenderOutput) -> Line<'static> {
    let input = &app.state.input;
    if input.is_active() {
        return Line::from(vec![
            Span::styled(input.mode.prompt(), Style::default().fg(Color::Yellow)),
            Span::raw(format!("{}█", input.buffer)),
        ]);
    }

    let mut spans = match app.state.file.as_ref() {
        Some(file) => vec![
            Span::styled(file.name(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(
                " | {} / {} events | loaded {}",
                output.stats.filtered_rows, output.stats.total_rows, file.loaded_at
            )),
        ],
        None => vec![Span::styled(
            "No file loaded, press o to open a CSV",
            Style::default().fg(Color::DarkGray),
        )],
    };
    if let Some(err) = app.state.last_error.as_deref() {
        spans.push(Span::styled(format!(" | {err}"), Style::default().fg(Color::Red)));
    } else if let Some(status) = app.state.status.as_deref() {
        spans.push(Span::styled(format!(" | {status}"), Style::default().fg(Color::Gray)));
    }
    Line::from(spans)
}

fn draw_status(f: &mut Frame, area: Rect, app: &App, output: &RenderOutput) {
    f.render_widget(Paragraph::new(status_line(app, output)), area);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    f.render_widget(
        Paragraph::new(msg.to_string())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_loading_spinner(f: &mut Frame, status: Rect, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = Rect::new(
        status.x + status.width.saturating_sub(2),
        status.y,
        1.min(status.width),
        status.height.min(1),
    );
    f.render_widget(spinner, area);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut s: String = text.chars().take(max.saturating_sub(1)).collect();
    s.push('…');
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::app_settings::AppSettings;
    use passmap_core::loader::{Encoding, load_bytes};
    use std::path::PathBuf;
    use tui::backend::TestBackend;

    const CSV: &str = "X,Y,X2,Y2,Outcome,Passhöhe,Gegnerdruck\n\
                       0,0,10,0,Erfolgreich,flach,niedrig\n\
                       5,5,,,Nicht erfolgreich,hoch,\n";

    fn loaded_app() -> App {
        let mut app = App::new(AppSettings::default());
        let table = load_bytes(CSV.as_bytes(), &[Encoding::Utf8]).unwrap();
        app.on_table_loaded(PathBuf::from("/tmp/events.csv"), table);
        app
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        draw(&mut terminal, app, LoadingState::default()).unwrap();
        let buf = terminal.backend().buffer();
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("Gegnerdruck", 20), "Gegnerdruck");
        assert_eq!(truncate("Gegnerdruck", 5), "Gegn…");
    }

    #[test]
    fn filter_lines_group_options_under_headers() {
        let app = loaded_app();
        let (lines, cursor) = filter_lines(&app, 40);
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(
            text,
            vec![
                "Outcome",
                "  [x] Erfolgreich",
                "  [x] Nicht erfolgreich",
                "Passhöhe",
                "  [x] flach",
                "  [x] hoch",
                "Gegnerdruck",
                "  [x] niedrig",
                "  [x] (missing)",
            ]
        );
        assert_eq!(cursor, 1);
    }

    #[test]
    fn status_line_reports_counts_and_errors() {
        let mut app = loaded_app();
        let output = app.render_output();
        assert_eq!(
            status_line(&app, &output).to_string(),
            format!("events.csv | 2 / 2 events | loaded {}", app.state.file.as_ref().unwrap().loaded_at)
        );
        app.on_error("Required column 'X' not found".into());
        assert!(status_line(&app, &output).to_string().ends_with("| Required column 'X' not found"));
    }

    #[test]
    fn empty_app_prompts_for_a_file() {
        let app = App::new(AppSettings::default());
        let screen = screen(&app);
        assert!(screen.contains("No file loaded, press o to open a CSV"));
        assert!(screen.contains("No data loaded"));
    }

    #[test]
    fn statistics_tab_shows_mean_and_charts() {
        let mut app = loaded_app();
        app.update_tab(MenuItem::Statistics);
        let screen = screen(&app);
        assert!(screen.contains("Average pass length: 10.00"));
        assert!(screen.contains("Pass height"));
        assert!(screen.contains("Outcome"));
        assert!(screen.contains("Pressure"));
    }

    #[test]
    fn data_tab_previews_rows() {
        let mut app = loaded_app();
        app.update_tab(MenuItem::Data);
        let screen = screen(&app);
        assert!(screen.contains("first 2 of 2 rows, 7 columns"));
        assert!(screen.contains("Erfolgreich"));
    }
}
