//! Explicit visualization state and the pure render step.
//!
//! Every interaction mutates a [`VizState`]; the shell then calls [`render`]
//! and draws whatever comes back. Nothing here knows about terminals.

use crate::colors::{ColorLabels, ColorMapping, ColorScheme, Rgb};
use crate::filter::{FilterSelection, FilterSpec, apply_filters, derive_filter_specs};
use crate::pitch::{DEFAULT_FIELD_HEIGHT, DEFAULT_FIELD_WIDTH, PitchGeometry, Shape, pitch_shapes};
use crate::scene::{EventColumns, EventGlyphs, GlyphSizes, SceneContext, build_event_glyphs};
use crate::stats::{Statistics, compute_statistics};
use crate::{COL_TIME, COORDINATE_COLUMNS, EventTable, Value};
use log::debug;

/// Rendering variant. The two observed variants differ only in these knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct VizConfig {
    /// Scale markings and glyphs with the field width instead of fixed sizes.
    pub responsive: bool,
    pub color_scheme: ColorScheme,
    /// Treat `Time` as a reserved column (no filter, no color dimension).
    pub exclude_time: bool,
    pub field_width: f64,
    pub field_height: f64,
    pub columns: EventColumns,
    pub labels: ColorLabels,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            responsive: true,
            color_scheme: ColorScheme::Coordinates,
            exclude_time: true,
            field_width: DEFAULT_FIELD_WIDTH,
            field_height: DEFAULT_FIELD_HEIGHT,
            columns: EventColumns::default(),
            labels: ColorLabels::default(),
        }
    }
}

impl VizConfig {
    pub fn excluded_columns(&self) -> Vec<&'static str> {
        let mut excluded = COORDINATE_COLUMNS.to_vec();
        if self.exclude_time {
            excluded.push(COL_TIME);
        }
        excluded
    }

    pub fn geometry(&self) -> PitchGeometry {
        PitchGeometry::for_mode(self.responsive, self.field_width, self.field_height)
    }

    pub fn glyph_sizes(&self) -> GlyphSizes {
        GlyphSizes::for_mode(self.responsive, self.field_width)
    }
}

/// Loaded table plus everything the user has chosen about it.
#[derive(Debug, Clone, Default)]
pub struct VizState {
    pub config: VizConfig,
    pub table: Option<EventTable>,
    pub filters: Vec<FilterSpec>,
    pub selections: Vec<FilterSelection>,
    pub color: ColorMapping,
}

impl VizState {
    pub fn new(config: VizConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Replace the table and reset filters and colors to their defaults.
    pub fn load_table(&mut self, table: EventTable) {
        self.filters = derive_filter_specs(&table, &self.config.excluded_columns());
        self.selections = self.filters.iter().map(FilterSpec::default_selection).collect();
        let first = self.color_candidates_of(&table).first().cloned();
        self.table = Some(table);
        self.color = ColorMapping::default();
        if let Some(column) = first {
            self.set_color_column(&column);
        }
        debug!(
            "table loaded: {} filters, color column {:?}",
            self.filters.len(),
            self.color.column
        );
    }

    fn color_candidates_of(&self, table: &EventTable) -> Vec<String> {
        let excluded = self.config.excluded_columns();
        table
            .columns
            .iter()
            .filter(|c| !excluded.contains(&c.as_str()))
            .cloned()
            .collect()
    }

    /// Columns that may be chosen as the color dimension.
    pub fn color_candidates(&self) -> Vec<String> {
        self.table
            .as_ref()
            .map(|t| self.color_candidates_of(t))
            .unwrap_or_default()
    }

    /// Choose the color column; the mapping is rebuilt from defaults.
    pub fn set_color_column(&mut self, column: &str) {
        let Some(table) = self.table.as_ref() else {
            return;
        };
        self.color =
            ColorMapping::build(table, column, self.config.color_scheme, &self.config.labels);
    }

    /// Step the color column through the candidates, wrapping.
    pub fn cycle_color_column(&mut self, forward: bool) {
        let candidates = self.color_candidates();
        if candidates.is_empty() {
            return;
        }
        let len = candidates.len();
        let idx = self
            .color
            .column
            .as_ref()
            .and_then(|c| candidates.iter().position(|x| x == c))
            .unwrap_or(0);
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        self.set_color_column(&candidates[next]);
    }

    pub fn set_color(&mut self, value: &Value, color: Rgb) -> bool {
        self.color.set(value, color)
    }

    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.config.color_scheme = scheme;
        if let Some(column) = self.color.column.clone() {
            self.set_color_column(&column);
        }
    }

    pub fn set_responsive(&mut self, responsive: bool) {
        self.config.responsive = responsive;
    }

    pub fn selection_mut(&mut self, filter: usize) -> Option<(&FilterSpec, &mut FilterSelection)> {
        let spec = self.filters.get(filter)?;
        let sel = self.selections.get_mut(filter)?;
        Some((spec, sel))
    }

    pub fn filtered_rows(&self) -> Vec<usize> {
        self.table
            .as_ref()
            .map(|t| apply_filters(t, &self.filters, &self.selections))
            .unwrap_or_default()
    }
}

/// Everything the shell needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub geometry: PitchGeometry,
    pub pitch: Vec<Shape>,
    pub events: Vec<EventGlyphs>,
    pub stats: Statistics,
}

/// Recompute the whole pipeline from the loaded table forward.
pub fn render(state: &VizState) -> RenderOutput {
    let geometry = state.config.geometry();
    let pitch = pitch_shapes(&geometry);

    let Some(table) = state.table.as_ref() else {
        return RenderOutput { geometry, pitch, events: Vec::new(), stats: Statistics::default() };
    };

    let rows = state.filtered_rows();
    let ctx = SceneContext {
        columns: &state.config.columns,
        labels: &state.config.labels,
        mapping: &state.color,
        sizes: state.config.glyph_sizes(),
    };
    let events = build_event_glyphs(table, &rows, &ctx);
    let stats = compute_statistics(table, &rows, &state.config.columns);

    RenderOutput { geometry, pitch, events, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLUE, GREEN, RED, YELLOW};
    use crate::filter::FilterKind;
    use crate::loader::{DEFAULT_ENCODINGS, load_bytes};

    const CSV: &str = "X,Y,X2,Y2,Outcome,Passhöhe,Gegnerdruck,Time\n\
                       0,0,10,0,Erfolgreich,flach,niedrig,1\n\
                       5,5,,,Nicht erfolgreich,,hoch,2\n\
                       -20,10,-5,10,Erfolgreich,hoch,niedrig,3\n";

    fn loaded(config: VizConfig) -> VizState {
        let mut state = VizState::new(config);
        let table = load_bytes(CSV.as_bytes(), &[crate::loader::Encoding::Utf8]).unwrap();
        state.load_table(table);
        state
    }

    #[test]
    fn render_without_table_draws_only_the_pitch() {
        let out = render(&VizState::default());
        assert!(!out.pitch.is_empty());
        assert!(out.events.is_empty());
        assert_eq!(out.stats.total_rows, 0);
    }

    #[test]
    fn loading_derives_filters_and_first_color_column() {
        let state = loaded(VizConfig::default());
        let names: Vec<_> = state.filters.iter().map(|f| f.column.as_str()).collect();
        assert_eq!(names, vec!["Outcome", "Passhöhe", "Gegnerdruck"]);
        assert!(state.filters.iter().all(|f| f.kind == FilterKind::MultiSelect));
        assert_eq!(state.color.column.as_deref(), Some("Outcome"));
        assert_eq!(state.color_candidates(), vec!["Outcome", "Passhöhe", "Gegnerdruck"]);
    }

    #[test]
    fn time_is_a_filter_when_not_excluded() {
        let state = loaded(VizConfig { exclude_time: false, ..VizConfig::default() });
        assert!(state.filters.iter().any(|f| f.column == "Time"));
        assert!(state.color_candidates().contains(&"Time".to_string()));
    }

    #[test]
    fn default_render_keeps_every_row() {
        let out = render(&loaded(VizConfig::default()));
        assert_eq!(out.events.len(), 3);
        assert_eq!(out.stats.filtered_rows, 3);
        assert_eq!(out.stats.mean_pass_length_label(), "12.50");
        assert_eq!(out.events[0].color, GREEN);
        assert_eq!(out.events[1].color, RED);
        assert_eq!(out.events[2].color, YELLOW);
    }

    #[test]
    fn deselecting_an_outcome_narrows_every_output() {
        let mut state = loaded(VizConfig::default());
        let (_, sel) = state.selection_mut(0).unwrap();
        sel.toggle(&Value::from("Nicht erfolgreich"));
        let out = render(&state);
        assert_eq!(out.events.iter().map(|e| e.row).collect::<Vec<_>>(), vec![0, 2]);
        let outcome = out.stats.outcome.unwrap();
        assert_eq!(outcome.counts, vec![(Value::from("Erfolgreich"), 2)]);
    }

    #[test]
    fn scheme_change_rebuilds_mapping() {
        let mut state = loaded(VizConfig::default());
        state.set_color(&Value::from("Erfolgreich"), RED);
        state.set_color_scheme(ColorScheme::Classic);
        assert_eq!(state.color.get(&Value::from("Erfolgreich")), Some(BLUE));
        assert_eq!(render(&state).events[0].color, BLUE);
    }

    #[test]
    fn cycling_color_column_wraps() {
        let mut state = loaded(VizConfig::default());
        state.cycle_color_column(false);
        assert_eq!(state.color.column.as_deref(), Some("Gegnerdruck"));
        state.cycle_color_column(true);
        assert_eq!(state.color.column.as_deref(), Some("Outcome"));
    }

    #[test]
    fn responsive_toggle_changes_geometry() {
        let mut state = loaded(VizConfig::default());
        let relative = render(&state).geometry;
        state.set_responsive(false);
        let absolute = render(&state).geometry;
        assert!((relative.penalty_area_width - 105.0 * 0.157).abs() < 1e-9);
        assert_eq!(absolute.penalty_area_width, 16.5);
    }

    #[test]
    fn latin1_default_still_loads_ascii_columns() {
        let mut state = VizState::default();
        state.load_table(load_bytes(b"X,Y,Outcome\n1,2,ok\n", &DEFAULT_ENCODINGS).unwrap());
        assert_eq!(render(&state).events.len(), 1);
    }
}
