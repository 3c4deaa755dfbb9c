use tui::layout::{Constraint, Layout, Rect, Size};

pub const TAB_BAR_HEIGHT: u16 = 3;
pub const STATUS_HEIGHT: u16 = 1;
pub const LOG_PANE_HEIGHT: u16 = 8;
pub const SIDEBAR_WIDTH: u16 = 36;

/// Pre-computed layout areas for the main draw loop.
#[derive(Debug, Default, PartialEq)]
pub struct LayoutAreas {
    pub tab_bar: [Rect; 2],
    pub main: Rect,
    pub logs: Option<Rect>,
    pub status: Rect,
}

impl LayoutAreas {
    pub fn new(size: Size) -> Self {
        let rect = Rect::new(0, 0, size.width, size.height);
        Self::from_rect(rect, false, false)
    }

    pub fn update(&mut self, area: Rect, full_screen: bool, show_logs: bool) {
        *self = Self::from_rect(area, full_screen, show_logs);
    }

    fn from_rect(area: Rect, full_screen: bool, show_logs: bool) -> Self {
        let [body, status] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(STATUS_HEIGHT)]).areas(area);

        let (tab_bar, body) = if full_screen {
            ([Rect::ZERO, Rect::ZERO], body)
        } else {
            let [tab, rest] =
                Layout::vertical([Constraint::Length(TAB_BAR_HEIGHT), Constraint::Fill(1)])
                    .areas(body);
            (Self::split_tab_bar(tab), rest)
        };

        let (main, logs) = if show_logs {
            let [main, logs] =
                Layout::vertical([Constraint::Fill(1), Constraint::Length(LOG_PANE_HEIGHT)])
                    .areas(body);
            (main, Some(logs))
        } else {
            (body, None)
        };

        LayoutAreas { tab_bar, main, logs, status }
    }

    fn split_tab_bar(area: Rect) -> [Rect; 2] {
        Layout::horizontal([Constraint::Percentage(80), Constraint::Percentage(20)]).areas(area)
    }
}

/// Split the pitch tab into the canvas and the sidebar. Narrow terminals get
/// the sidebar underneath instead.
pub fn split_pitch_view(area: Rect) -> (Rect, Rect) {
    if area.width >= SIDEBAR_WIDTH * 2 {
        let [pitch, sidebar] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(SIDEBAR_WIDTH)])
                .areas(area);
        (pitch, sidebar)
    } else {
        let [pitch, sidebar] =
            Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);
        (pitch, sidebar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_screen_drops_tab_bar() {
        let area = Rect::new(0, 0, 100, 40);
        let mut layout = LayoutAreas::new(Size::new(100, 40));
        assert_eq!(layout.main.y, TAB_BAR_HEIGHT);

        layout.update(area, true, false);
        assert_eq!(layout.tab_bar, [Rect::ZERO, Rect::ZERO]);
        assert_eq!(layout.main, Rect::new(0, 0, 100, 39));
        assert_eq!(layout.status, Rect::new(0, 39, 100, 1));
    }

    #[test]
    fn log_pane_sits_above_status() {
        let mut layout = LayoutAreas::default();
        layout.update(Rect::new(0, 0, 100, 40), false, true);
        let logs = layout.logs.unwrap();
        assert_eq!(logs.height, LOG_PANE_HEIGHT);
        assert_eq!(logs.bottom(), layout.status.y);
        assert_eq!(layout.main.bottom(), logs.y);
    }

    #[test]
    fn narrow_pitch_view_stacks() {
        let (pitch, sidebar) = split_pitch_view(Rect::new(0, 0, 120, 30));
        assert_eq!(sidebar.width, SIDEBAR_WIDTH);
        assert_eq!(pitch.width, 120 - SIDEBAR_WIDTH);

        let (pitch, sidebar) = split_pitch_view(Rect::new(0, 0, 50, 30));
        assert_eq!(pitch.width, 50);
        assert_eq!(sidebar.y, pitch.bottom());
    }
}
